use thiserror::Error;

/// A persisted view-state parameter group that could not be used.
///
/// Never fatal: the affected group is treated as absent.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecodeError {
	#[error("map parameter `{key}` is missing")]
	MissingMapPart { key: &'static str },
	#[error("map parameter `{key}` is not a finite number: {value:?}")]
	InvalidNumber { key: &'static str, value: String },
	#[error("map center {lat},{lng} is out of range")]
	OutOfRange { lat: String, lng: String },
	#[error("unknown view mode {0:?}")]
	UnknownView(String),
}

pub type Result<T> = std::result::Result<T, DecodeError>;
