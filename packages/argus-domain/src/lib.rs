pub mod candidate;
pub mod color;
pub mod plate;
pub mod query;
pub mod score;
pub mod vector;

mod error;

pub use error::{Error, Result};
