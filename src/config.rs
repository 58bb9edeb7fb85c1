use crate::processing::ChunkingError;
use serde::{Deserialize, Serialize};
use std::env;
use std::sync::OnceLock;
use thiserror::Error;

/// Default upper bound on chunk length, in characters.
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 1000;
/// Default lower bound on chunk length, in characters (accepted but not enforced by packing).
pub const DEFAULT_MIN_CHUNK_SIZE: usize = 100;
/// Default overlap carried between adjacent chunks, in characters.
pub const DEFAULT_OVERLAP_SIZE: usize = 100;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
    /// Chunk sizes parsed correctly but describe an impossible envelope.
    #[error("Invalid chunking configuration: {0}")]
    Chunking(#[from] ChunkingError),
}

/// Size envelope used by the chunk packer.
///
/// All sizes are measured in characters. `min_chunk_size` is carried for callers that want to
/// record it, but the packer never merges undersized chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Hard upper bound for a chunk, except for single lines that exceed it on their own.
    pub max_chunk_size: usize,
    /// Advisory lower bound; small trailing chunks are still emitted.
    pub min_chunk_size: usize,
    /// Maximum number of characters re-used from the previous chunk. `0` disables overlap.
    pub overlap_size: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            min_chunk_size: DEFAULT_MIN_CHUNK_SIZE,
            overlap_size: DEFAULT_OVERLAP_SIZE,
        }
    }
}

impl ChunkingConfig {
    /// Reject envelopes that cannot produce bounded chunks.
    pub fn validate(&self) -> Result<(), ChunkingError> {
        if self.max_chunk_size == 0 {
            return Err(ChunkingError::InvalidMaxChunkSize);
        }
        if self.overlap_size > 0 && self.overlap_size >= self.max_chunk_size {
            return Err(ChunkingError::OverlapTooLarge {
                overlap_size: self.overlap_size,
                max_chunk_size: self.max_chunk_size,
            });
        }
        if self.min_chunk_size > self.max_chunk_size {
            return Err(ChunkingError::MinAboveMax {
                min_chunk_size: self.min_chunk_size,
                max_chunk_size: self.max_chunk_size,
            });
        }
        Ok(())
    }

    /// Apply per-request overrides on top of these defaults.
    pub fn with_overrides(
        self,
        max_chunk_size: Option<usize>,
        min_chunk_size: Option<usize>,
        overlap_size: Option<usize>,
    ) -> Self {
        Self {
            max_chunk_size: max_chunk_size.unwrap_or(self.max_chunk_size),
            min_chunk_size: min_chunk_size.unwrap_or(self.min_chunk_size),
            overlap_size: overlap_size.unwrap_or(self.overlap_size),
        }
    }
}

/// Runtime configuration for the Rusty Chunk server and CLI.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Default chunk size envelope applied when requests omit their own.
    pub chunking: ChunkingConfig,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        let chunking = ChunkingConfig {
            max_chunk_size: load_env_usize("CHUNK_MAX_SIZE")?.unwrap_or(DEFAULT_MAX_CHUNK_SIZE),
            min_chunk_size: load_env_usize("CHUNK_MIN_SIZE")?.unwrap_or(DEFAULT_MIN_CHUNK_SIZE),
            overlap_size: load_env_usize("CHUNK_OVERLAP_SIZE")?.unwrap_or(DEFAULT_OVERLAP_SIZE),
        };
        chunking.validate()?;

        Ok(Self {
            chunking,
            server_port: load_env_optional("SERVER_PORT")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("SERVER_PORT".into()))
                })
                .transpose()?,
        })
    }
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn load_env_usize(key: &str) -> Result<Option<usize>, ConfigError> {
    load_env_optional(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, if [`init_config`] has run.
pub fn get_config() -> Option<&'static Config> {
    CONFIG.get()
}

/// Load configuration from the environment (and `.env`) and install it in the global cache.
///
/// Calling this more than once returns the configuration installed by the first call.
pub fn init_config() -> Result<&'static Config, ConfigError> {
    dotenvy::dotenv().ok();
    if let Some(existing) = CONFIG.get() {
        return Ok(existing);
    }
    let config = Config::from_env()?;
    tracing::debug!(
        max_chunk_size = config.chunking.max_chunk_size,
        min_chunk_size = config.chunking.min_chunk_size,
        overlap_size = config.chunking.overlap_size,
        server_port = ?config.server_port,
        "Loaded configuration"
    );
    Ok(CONFIG.get_or_init(|| config))
}
