//! Resize worker stages.
//!
//! - **validate**: size limit and magic-byte check on the source bytes
//! - **decode**: content-sniffed decode with timeout
//! - **resizer**: exact-size resize and deterministic re-encode
//! - **dead_letter**: records for events that fail for good
//! - **worker**: the event handler tying the stages to the store

pub mod dead_letter;
pub mod decode;
pub mod resizer;
pub mod validate;
pub mod worker;

pub use dead_letter::{DeadLetter, DeadLetterPolicy};
pub use decode::{DecodedImage, ImageDecoder};
pub use resizer::Resizer;
pub use validate::Validator;
pub use worker::{HandleOutcome, ResizeJob, ResizeWorker, WORKER_PRINCIPAL};
