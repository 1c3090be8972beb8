pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Store unavailable: {message}")]
	StoreUnavailable { message: String },
	#[error("Store call {operation} timed out after {timeout_ms} ms.")]
	Timeout { operation: &'static str, timeout_ms: u64 },
	#[error("Invalid document: {message}")]
	InvalidDocument { message: String },
}
impl Error {
	/// Whether the failure is the store's and may clear up on retry.
	pub fn is_transient(&self) -> bool {
		matches!(self, Self::StoreUnavailable { .. } | Self::Timeout { .. })
	}
}

impl From<brawl_storage::Error> for Error {
	fn from(err: brawl_storage::Error) -> Self {
		match err {
			brawl_storage::Error::Sqlx(inner) => Self::StoreUnavailable { message: inner.to_string() },
			brawl_storage::Error::InvalidPipeline(message) => Self::InvalidDocument { message },
		}
	}
}

impl From<serde_json::Error> for Error {
	fn from(err: serde_json::Error) -> Self {
		Self::InvalidDocument { message: err.to_string() }
	}
}
