use evfleet_primitives::ErrorReport;
use thiserror::Error;

/// Why a pull request failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
	/// The server answered with a non-success status.
	#[error("{status} {name}: {message}")]
	Http { status: u16, name: String, message: String },
	/// The request never produced a response.
	#[error("network error: {0}")]
	Network(String),
	/// The response body did not have the expected shape.
	#[error("invalid response: {0}")]
	Decode(String),
	#[error("invalid request url: {0}")]
	InvalidUrl(#[from] url::ParseError),
}

pub type Result<T> = std::result::Result<T, FetchError>;

impl FetchError {
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Http { status, .. } => Some(*status),
			_ => None,
		}
	}

	/// Converts the failure into the record shown by the error surface.
	pub fn to_report(&self) -> ErrorReport {
		match self {
			Self::Http { status, name, message } => ErrorReport::new(Some(*status), name.clone(), message.clone()),
			Self::Network(message) => ErrorReport::new(None, "NetworkError", message.clone()),
			Self::Decode(message) => ErrorReport::new(None, "DecodeError", message.clone()),
			Self::InvalidUrl(err) => ErrorReport::new(None, "InvalidUrl", err.to_string()),
		}
	}
}
