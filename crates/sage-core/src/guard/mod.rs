//! Guards on both sides of the model: input screening before any call,
//! schema-validating output recovery after.

pub mod input;
pub mod output;

pub use input::InputRejection;
pub use output::{DecodeError, OutputGuard, ParseFailure, Recovery, StructuredOutput};
