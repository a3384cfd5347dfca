use std::error::Error;
use std::fmt;

pub type Result<T> = std::result::Result<T, NewChunksError>;

#[derive(Debug)]
pub enum NewChunksError {
    IoError(std::io::Error),
    JsonError(serde_json::Error),
    /// Malformed packet or frame.
    ProtocolError(String),
    /// Section data whose palette or storage cannot be inspected.
    PaletteError(String),
    PersistenceError(String),
    ConfigError(String),
}

impl fmt::Display for NewChunksError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NewChunksError::IoError(err) => write!(f, "IO error: {}", err),
            NewChunksError::JsonError(err) => write!(f, "JSON error: {}", err),
            NewChunksError::ProtocolError(msg) => write!(f, "Protocol error: {}", msg),
            NewChunksError::PaletteError(msg) => write!(f, "Palette error: {}", msg),
            NewChunksError::PersistenceError(msg) => write!(f, "Persistence error: {}", msg),
            NewChunksError::ConfigError(msg) => write!(f, "Config error: {}", msg),
        }
    }
}

impl Error for NewChunksError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            NewChunksError::IoError(err) => Some(err),
            NewChunksError::JsonError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for NewChunksError {
    fn from(err: std::io::Error) -> Self {
        NewChunksError::IoError(err)
    }
}

impl From<serde_json::Error> for NewChunksError {
    fn from(err: serde_json::Error) -> Self {
        NewChunksError::JsonError(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_display() {
        let err = NewChunksError::PaletteError("index 3 out of range".to_owned());
        assert_eq!(format!("{}", err), "Palette error: index 3 out of range");
    }

    #[test]
    fn test_from_io_error_keeps_source() {
        let err: NewChunksError =
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing").into();
        assert_matches!(err, NewChunksError::IoError(_));
        assert!(err.source().is_some());
    }
}
