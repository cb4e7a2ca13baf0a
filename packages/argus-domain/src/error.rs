pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
	#[error("Vector length mismatch: {left} vs {right}.")]
	VectorLengthMismatch { left: usize, right: usize },
}
