use std::time::SystemTime;

/// Magic bytes at the start of every frame file
pub const FRAME_MAGIC: &[u8; 8] = b"FCFRAME1";

/// Magic + compression tag + CRC32
pub const FRAME_HEADER_LEN: usize = FRAME_MAGIC.len() + 1 + 4;

/// One artifact file found in the storage root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskEntry {
    /// Artifact name with the kind suffix stripped
    pub name: String,
    pub modified: SystemTime,
    pub size_bytes: u64,
}
