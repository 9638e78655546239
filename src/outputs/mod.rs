//! Output generation for collected content.
//!
//! - [`json`]: writes a [`FetchReport`](crate::models::FetchReport) to stdout or a file

pub mod json;
