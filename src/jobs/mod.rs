//! Scheduled background jobs.

pub mod reprocess;

pub use reprocess::QuarantineReprocessor;
