pub mod compressor;

pub use compressor::{CompressionAlgorithm, CompressionConfig, Compressor};
