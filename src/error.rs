use thiserror::Error;

/// Why the microphone could not be opened.
///
/// These never escape [`crate::audio::Microphone::open`]; they are logged and
/// kept as the source's status while it stays silent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AudioError {
    #[error("microphone access denied: {0}")]
    PermissionDenied(String),

    #[error("no usable input device: {0}")]
    DeviceUnavailable(String),

    #[error("unsupported input sample format: {0}")]
    UnsupportedFormat(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
