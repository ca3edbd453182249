use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use tracing::debug;

/// Compression algorithm selection
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CompressionAlgorithm {
    /// Stored as-is
    None,
    /// LZ4 - Fast compression/decompression (default)
    #[default]
    Lz4,
    /// Zstandard - Better compression ratio
    Zstd,
}

impl CompressionAlgorithm {
    /// One-byte tag written into frame file headers
    pub fn tag(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Lz4 => 1,
            Self::Zstd => 2,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::None),
            1 => Some(Self::Lz4),
            2 => Some(Self::Zstd),
            _ => None,
        }
    }
}

/// Compression configuration for frame files
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionConfig {
    /// Enable compression of frame files
    pub enabled: bool,
    /// Minimum encoded size to compress (bytes)
    pub min_payload_size: usize,
    /// Default algorithm
    pub default_algorithm: CompressionAlgorithm,
    /// Zstd compression level (1-22)
    pub zstd_level: i32,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            min_payload_size: 1024, // Don't compress < 1KB
            default_algorithm: CompressionAlgorithm::Lz4,
            zstd_level: 3, // Balanced compression
        }
    }
}

/// Compresses encoded frames before they hit the disk
#[derive(Debug, Clone, Default)]
pub struct Compressor {
    config: CompressionConfig,
}

impl Compressor {
    /// Create new compressor with configuration
    pub fn new(config: CompressionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CompressionConfig {
        &self.config
    }

    /// Compress `data`, returning the algorithm actually applied
    pub fn compress(&self, data: &[u8]) -> Result<(CompressionAlgorithm, Vec<u8>), std::io::Error> {
        if !self.should_compress(data) {
            debug!("Skipping compression: size={} bytes", data.len());
            return Ok((CompressionAlgorithm::None, data.to_vec()));
        }

        let algo = self.config.default_algorithm;
        let compressed = match algo {
            CompressionAlgorithm::None => data.to_vec(),
            CompressionAlgorithm::Lz4 => self.compress_lz4(data)?,
            CompressionAlgorithm::Zstd => self.compress_zstd(data)?,
        };
        Ok((algo, compressed))
    }

    /// Decompress data using the algorithm recorded alongside it
    pub fn decompress(
        &self,
        data: &[u8],
        algorithm: CompressionAlgorithm,
    ) -> Result<Vec<u8>, std::io::Error> {
        match algorithm {
            CompressionAlgorithm::None => Ok(data.to_vec()),
            CompressionAlgorithm::Lz4 => self.decompress_lz4(data),
            CompressionAlgorithm::Zstd => self.decompress_zstd(data),
        }
    }

    fn compress_lz4(&self, data: &[u8]) -> Result<Vec<u8>, std::io::Error> {
        let mut encoder = lz4::EncoderBuilder::new()
            .level(4) // Fast compression
            .build(Vec::new())?;

        encoder.write_all(data)?;
        let (compressed, result) = encoder.finish();
        result?;

        debug!(
            "LZ4 compressed frame: {} → {} bytes (ratio: {:.2}x)",
            data.len(),
            compressed.len(),
            compression_ratio(data.len(), compressed.len())
        );

        Ok(compressed)
    }

    fn decompress_lz4(&self, data: &[u8]) -> Result<Vec<u8>, std::io::Error> {
        let mut decoder = lz4::Decoder::new(data)?;
        let mut decompressed = Vec::new();
        decoder.read_to_end(&mut decompressed)?;
        Ok(decompressed)
    }

    fn compress_zstd(&self, data: &[u8]) -> Result<Vec<u8>, std::io::Error> {
        let compressed = zstd::encode_all(data, self.config.zstd_level)?;

        debug!(
            "Zstd compressed frame: {} → {} bytes (ratio: {:.2}x)",
            data.len(),
            compressed.len(),
            compression_ratio(data.len(), compressed.len())
        );

        Ok(compressed)
    }

    fn decompress_zstd(&self, data: &[u8]) -> Result<Vec<u8>, std::io::Error> {
        zstd::decode_all(data)
    }

    /// Whether `data` is large enough to be worth compressing
    pub fn should_compress(&self, data: &[u8]) -> bool {
        self.config.enabled
            && self.config.default_algorithm != CompressionAlgorithm::None
            && data.len() >= self.config.min_payload_size
    }
}

fn compression_ratio(original: usize, compressed: usize) -> f64 {
    if compressed == 0 {
        return 1.0;
    }
    original as f64 / compressed as f64
}
