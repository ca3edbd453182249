/// Persistence module for artifact files
///
/// One file per artifact under the storage root:
/// - frames: header (magic, compression tag, CRC32) + bincode body
/// - objects: pretty-printed JSON
///
/// Files are replaced atomically through a temp file in the same directory.
pub mod disk_store;
pub mod types;

pub use disk_store::DiskStore;
pub use types::DiskEntry;
