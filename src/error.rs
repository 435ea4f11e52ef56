use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Remote API errors
    #[error("Request to '{path}' failed before a response was received: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Invalid request URI '{uri}': {message}")]
    InvalidUri { uri: String, message: String },

    #[error("Unexpected value for '{field}' in response from '{path}': {value}")]
    Decode {
        path: String,
        field: String,
        value: String,
    },

    // Configuration errors
    #[error("Failed to load properties file '{path}': {source}")]
    ConfigLoad {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse properties file '{path}': {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to save properties to '{path}': {source}")]
    ConfigSave {
        path: String,
        #[source]
        source: std::io::Error,
    },

    // Datastore errors
    #[error("Datastore error: {message}")]
    Store { message: String },

    #[error("Datastore has been disposed")]
    StoreDisposed,

    // Generic errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Coarse failure category, shared by every layer that reports an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    Decode,
    Config,
    Store,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Transport => "transport",
            ErrorKind::Decode => "decode",
            ErrorKind::Config => "config",
            ErrorKind::Store => "store",
            ErrorKind::Internal => "internal",
        }
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Transport { .. } | Error::InvalidUri { .. } => ErrorKind::Transport,
            Error::Decode { .. } => ErrorKind::Decode,
            Error::ConfigLoad { .. } | Error::ConfigParse { .. } | Error::ConfigSave { .. } => {
                ErrorKind::Config
            }
            Error::Store { .. } | Error::StoreDisposed => ErrorKind::Store,
            Error::Internal { .. } => ErrorKind::Internal,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Internal {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Internal {
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
