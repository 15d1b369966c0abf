use mosbius_bitstream::WriteError;
use mosbius_types::AddressError;

/// A connection, size or pin-map document that cannot be turned into a canonical configuration.
///
/// Paths name the offending entry the way a user would look it up in the document, e.g.
/// `connections.SBUS1a[2]`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ConfigError {
    MalformedInput(String),
    UnknownTerminal { path: String, terminal: String },
    UnknownBusName(String),
    UnknownDevice(String),
    InvalidMode { path: String, mode: String },
    InvalidSize { path: String, value: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MalformedInput(msg) => write!(f, "{msg}"),
            ConfigError::UnknownTerminal { path, terminal } => {
                write!(f, "{path}: unknown terminal {terminal:?}")
            }
            ConfigError::UnknownBusName(bus) => {
                write!(f, "unknown bus {bus:?} (expected RBUS1..8, SBUS1..6, SBUS1a..SBUS6b)")
            }
            ConfigError::UnknownDevice(dev) => write!(f, "unknown sizing device {dev:?}"),
            ConfigError::InvalidMode { path, mode } => write!(
                f,
                "{path}: invalid connection mode {mode:?} (expected ON/OFF/PHI1/PHI2)"
            ),
            ConfigError::InvalidSize { path, value } => {
                write!(f, "{path}: size {value} is not an integer in 0..31")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    Json(jzon::Error),
    Config(ConfigError),
    Address(AddressError),
    Write(WriteError),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(error) => write!(f, "{error}"),
            Error::Json(error) => write!(f, "malformed JSON: {error}"),
            Error::Config(error) => write!(f, "{error}"),
            Error::Address(error) => write!(f, "{error}"),
            Error::Write(error) => write!(f, "{error}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<jzon::Error> for Error {
    fn from(value: jzon::Error) -> Self {
        Self::Json(value)
    }
}

impl From<ConfigError> for Error {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<AddressError> for Error {
    fn from(value: AddressError) -> Self {
        Self::Address(value)
    }
}

impl From<WriteError> for Error {
    fn from(value: WriteError) -> Self {
        Self::Write(value)
    }
}
