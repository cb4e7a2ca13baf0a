pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
	#[error("Deadline of {timeout_ms} ms exceeded during {stage}.")]
	Timeout { stage: &'static str, timeout_ms: u64 },
}
impl From<argus_storage::Error> for Error {
	fn from(err: argus_storage::Error) -> Self {
		match err {
			argus_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			argus_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
		}
	}
}

impl From<argus_config::Error> for Error {
	fn from(err: argus_config::Error) -> Self {
		Self::InvalidRequest { message: err.to_string() }
	}
}
