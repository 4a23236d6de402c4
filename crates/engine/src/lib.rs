//! Iterative map-reduce distillation of long texts into a token budget.
//!
//! [`Distiller`] splits a text, summarizes every chunk independently, joins the
//! summaries and repeats until the result fits `target_token_size` or the loop
//! limit is reached, with one optional word-limited pass at the end.

pub mod distiller;
pub mod error;
pub mod payload;
pub mod prompt;
pub mod report;

pub use distiller::Distiller;
pub use error::{DistillError, SummaryError};
pub use payload::{parse_summary_payload, PayloadError};
pub use report::DistillReport;
