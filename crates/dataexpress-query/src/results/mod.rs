//! Result materialization
//!
//! Reads cursors into [`TableData`](dataexpress_core::TableData), choosing
//! an accessor per column type and applying output filters.

mod extractor;
mod materializer;

pub use extractor::extract_value;
pub use materializer::materialize;
