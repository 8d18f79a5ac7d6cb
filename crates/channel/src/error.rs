use thiserror::Error;

/// Errors raised while establishing or using a push channel.
#[derive(Debug, Error)]
pub enum ChannelError {
	#[error("invalid channel endpoint `{endpoint}`: {source}")]
	InvalidEndpoint {
		endpoint: String,
		#[source]
		source: url::ParseError,
	},

	#[error("failed to open channel to {endpoint}: {reason}")]
	Open { endpoint: String, reason: String },

	#[error("failed to encode outbound message: {0}")]
	Encode(#[from] serde_json::Error),
}

/// Result alias for channel operations.
pub type Result<T> = std::result::Result<T, ChannelError>;
