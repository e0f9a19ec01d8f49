use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid response to {method}: {reason}")]
    InvalidResponse { method: String, reason: String },

    #[error("API error in {method}: {message}{}", detail(.data))]
    Api {
        method: String,
        code: i64,
        message: String,
        data: Option<String>,
    },

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("host '{0}' not found")]
    UnknownHost(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn invalid_response(method: &str, reason: impl Into<String>) -> Self {
        Error::InvalidResponse {
            method: method.to_string(),
            reason: reason.into(),
        }
    }
}

fn detail(data: &Option<String>) -> String {
    match data {
        Some(d) if !d.is_empty() => format!(" ({d})"),
        _ => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, Error>;
