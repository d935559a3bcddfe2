extern crate anyhow;
extern crate reqwest;
extern crate serde_json;
extern crate std;

pub type BartDashResult<T> = std::result::Result<T, BartDashError>;

#[derive(Debug)]
pub enum BartDashError {
    HttpError(reqwest::Error),
    // Non-success HTTP status from the feed, status code preserved.
    FetchStatusError(u16),
    JsonError(serde_json::Error),
    // The feed returned an envelope with no stations at all.
    EmptyFeedError,
    InvalidLocationError(String),
    IoError(std::io::Error),
    MiscError(String),
}

pub fn make_error(msg: &str) -> BartDashError {
    return BartDashError::MiscError(msg.to_string());
}

impl std::fmt::Display for BartDashError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            BartDashError::HttpError(ref err) => {
                return write!(f, "HTTP Error: {}", err);
            },
            BartDashError::FetchStatusError(status) => {
                return write!(f, "Fetch Error: HTTP status {}", status);
            },
            BartDashError::JsonError(ref err) => {
                return write!(f, "JSON Error: {}", err);
            },
            BartDashError::EmptyFeedError => {
                return write!(f, "Empty Feed Error: no stations in response");
            },
            BartDashError::InvalidLocationError(ref what) => {
                return write!(f, "Invalid Location Error: {}", what);
            },
            BartDashError::IoError(ref err) => {
                return write!(f, "IO Error: {}", err);
            },
            BartDashError::MiscError(ref msg) => {
                return write!(f, "Error: {}", msg);
            },
        }
    }
}

impl std::error::Error for BartDashError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            BartDashError::HttpError(ref err) => Some(err),
            BartDashError::JsonError(ref err) => Some(err),
            BartDashError::IoError(ref err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for BartDashError {
    fn from(err: reqwest::Error) -> BartDashError {
        return BartDashError::HttpError(err);
    }
}

impl From<serde_json::Error> for BartDashError {
    fn from(err: serde_json::Error) -> BartDashError {
        return BartDashError::JsonError(err);
    }
}

impl From<std::io::Error> for BartDashError {
    fn from(err: std::io::Error) -> BartDashError {
        return BartDashError::IoError(err);
    }
}

impl From<anyhow::Error> for BartDashError {
    fn from(err: anyhow::Error) -> BartDashError {
        return BartDashError::MiscError(format!("{:#}", err));
    }
}
