//! Turning guide positions into image strips and writing them to disk.
//!
//! [`compute_slices`] is pure; [`export_slices`] does the encode/write loop on the
//! calling thread; [`ExportJob`] runs that loop on a worker thread and reports back
//! over a channel.

mod format;
mod slicing;
mod worker;
mod writer;

pub use format::{DEFAULT_JPEG_QUALITY, Encoding, ExportFormat, ExportTarget, Naming};
pub use slicing::{Slice, SlicePlan, compute_slices};
pub use worker::{ExportJob, ExportMessage};
pub use writer::{ExportReport, SliceFailure, WrittenFile, export_slices};
