pub mod error;
pub mod indexed;
pub mod range;

pub use error::*;
pub use indexed::*;
pub use range::*;
