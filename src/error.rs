use std::path::PathBuf;

/// Invalid extraction settings, reported once at startup before any image is read.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("color range is inverted on the {channel} channel: lower {lower} > upper {upper}")]
    InvertedColorRange {
        channel: &'static str,
        lower: u8,
        upper: u8,
    },

    #[error("hue bound {value} is outside 0..=179")]
    HueOutOfRange { value: u8 },

    #[error("kernel '{name}' must be at least 1x1, got {width}x{height}")]
    EmptyKernel {
        name: &'static str,
        width: u8,
        height: u8,
    },

    #[error("parameter '{name}' must be positive")]
    NotPositive { name: &'static str },

    #[error("digit whitelist must not be empty")]
    EmptyWhitelist,

    #[error("digit whitelist may only contain 0-9, found {found:?}")]
    NonDigitWhitelist { found: char },

    #[error("failed to read config file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
