use std::fmt;

#[derive(Debug)]
pub enum PaperChatError {
    ApiError {
        status: u16,
        message: String,
    },
    ConfigError(String),
    ToolError(String),
    SessionError(String),
    NetworkError(reqwest::Error),
    Cancelled,
    RoundLimit(u32),
    IoError(std::io::Error),
    JsonError(serde_json::Error),
    Other(String),
}

impl fmt::Display for PaperChatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaperChatError::ApiError { status, message } => {
                write!(f, "API error (status {}): {}", status, message)
            }
            PaperChatError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            PaperChatError::ToolError(msg) => write!(f, "Tool error: {}", msg),
            PaperChatError::SessionError(msg) => write!(f, "Session error: {}", msg),
            PaperChatError::NetworkError(e) => write!(f, "Network error: {}", e),
            PaperChatError::Cancelled => write!(f, "Query cancelled"),
            PaperChatError::RoundLimit(max) => {
                write!(f, "Tool-call round limit reached ({} rounds)", max)
            }
            PaperChatError::IoError(e) => write!(f, "IO error: {}", e),
            PaperChatError::JsonError(e) => write!(f, "JSON error: {}", e),
            PaperChatError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for PaperChatError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PaperChatError::NetworkError(e) => Some(e),
            PaperChatError::IoError(e) => Some(e),
            PaperChatError::JsonError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for PaperChatError {
    fn from(err: reqwest::Error) -> Self {
        PaperChatError::NetworkError(err)
    }
}

impl From<std::io::Error> for PaperChatError {
    fn from(err: std::io::Error) -> Self {
        PaperChatError::IoError(err)
    }
}

impl From<serde_json::Error> for PaperChatError {
    fn from(err: serde_json::Error) -> Self {
        PaperChatError::JsonError(err)
    }
}

impl From<anyhow::Error> for PaperChatError {
    fn from(err: anyhow::Error) -> Self {
        PaperChatError::Other(err.to_string())
    }
}

impl From<String> for PaperChatError {
    fn from(msg: String) -> Self {
        PaperChatError::Other(msg)
    }
}

impl From<&str> for PaperChatError {
    fn from(msg: &str) -> Self {
        PaperChatError::Other(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PaperChatError>;
