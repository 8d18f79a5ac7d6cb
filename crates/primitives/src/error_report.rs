use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Message used when neither the server nor the transport supplied one.
pub const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error occurred";

/// HTTP status that ends the authenticated session.
const UNAUTHORIZED: u16 = 401;

/// A failure as presented to the user-facing error surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
	/// HTTP status when the failure came from the pull API.
	pub status: Option<u16>,
	pub name: String,
	pub message: String,
}

impl ErrorReport {
	/// Builds a report, substituting the generic message for an empty one.
	pub fn new(status: Option<u16>, name: impl Into<String>, message: impl Into<String>) -> Self {
		let message = message.into();
		Self {
			status,
			name: name.into(),
			message: if message.is_empty() { UNKNOWN_ERROR_MESSAGE.to_string() } else { message },
		}
	}

	pub fn is_unauthorized(&self) -> bool {
		self.status == Some(UNAUTHORIZED)
	}
}

/// Receives failures that must not propagate to the caller.
pub trait ErrorSink: Send + Sync {
	fn report(&self, report: ErrorReport);
}

/// Shared error sink handle.
pub type SharedErrorSink = Arc<dyn ErrorSink>;

/// Sink that drops every report.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpErrorSink;

impl ErrorSink for NoOpErrorSink {
	fn report(&self, _report: ErrorReport) {}
}

impl<F> ErrorSink for F
where
	F: Fn(ErrorReport) + Send + Sync,
{
	fn report(&self, report: ErrorReport) {
		self(report)
	}
}

#[cfg(test)]
mod tests;
