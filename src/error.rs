use thiserror::Error;

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("cannot read configuration {path}: {source}")]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse configuration: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    #[error("invalid setting {key}: {reason}")]
    InvalidSetting { key: &'static str, reason: String },

    #[error("cannot find DEF node `{0}` in the scene")]
    MissingNode(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("cannot decode simulator bridge reply: {0}")]
    BridgeDecode(#[from] serde_json::Error),

    #[error("invalid simulator URL {url}: {reason}")]
    BridgeUrl { url: String, reason: String },

    #[error("simulator bridge returned {status} for {url}")]
    BridgeStatus { url: String, status: u16 },

    #[error("cannot install CTRL-C handler: {0}")]
    Signal(#[from] ctrlc::Error),
}

pub type Result<T> = std::result::Result<T, ControllerError>;
