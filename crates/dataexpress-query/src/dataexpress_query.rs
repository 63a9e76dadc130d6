//! DataExpress Query - statement parsing, binding and materialization
//!
//! This crate turns statement text into bound parameters and cursors into
//! tables. It knows nothing about processors or caches; those live in
//! `dataexpress-services`.

pub mod parameters;
pub mod results;
pub mod rewrite;

pub use parameters::{DirectCatalog, StatementParser, TableCatalog, bind_value, to_executable};
pub use results::{extract_value, materialize};
pub use rewrite::{auto_replace, autofill_input_key, autofill_keys, check_replacements, should_paginate};
