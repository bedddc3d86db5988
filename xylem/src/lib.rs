#![warn(clippy::pedantic)]
#![warn(missing_docs)]
#![warn(unreachable_pub)]
#![doc = include_str!("../README.md")]
//!
//! # Threading Notes
//!
//! Jobs submitted to one runtime instance run one at a time and in submission order,
//! but on whichever thread happens to drain the queue.
//! Don't rely on thread-locals inside jobs.

mod error;
pub use error::SerialError;

pub mod runtime;

#[doc = include_str!("../README.md")]
mod readme {}
