use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read cartridge image: {0}")]
    Io(#[from] std::io::Error),
    #[error("not an iNES image (bad magic)")]
    BadMagic,
    #[error("iNES header declares no PRG-ROM banks")]
    NoPrgBanks,
    #[error("image truncated: expected {expected} bytes, found {actual}")]
    Truncated { expected: usize, actual: usize },
    #[error("images with a trainer are not supported")]
    TrainerUnsupported,
    #[error("mapper {0} is not supported")]
    UnsupportedMapper(u8),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}
