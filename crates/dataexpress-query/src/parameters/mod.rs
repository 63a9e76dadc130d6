//! Statement parameters
//!
//! This module turns statement text into bound values:
//!
//! - `placeholders` - placeholder tokens and the driver-ready executable text
//! - `parser` - the ordered parameter list, with SQL types read from the catalog
//! - `binder` - coercion of untyped inputs to each parameter's SQL type
//!
//! # Example
//!
//! ```
//! use dataexpress_query::parameters::{placeholder_name, to_executable};
//!
//! let sql = "SELECT * FROM posts WHERE id = ?id AND author = ?";
//! assert_eq!(to_executable(sql), "SELECT * FROM posts WHERE id = ? AND author = ?");
//! assert_eq!(placeholder_name(2, "?"), "2");
//! ```

pub mod binder;
mod parser;
mod placeholders;

pub use binder::{bind_value, parse_date_time};
pub use parser::{DirectCatalog, StatementParser, TableCatalog};
pub use placeholders::{
    STOPPERS, dotted_column, has_placeholders, inline_type, mask_literals, placeholder_name,
    split_tokens, to_executable,
};

#[cfg(test)]
mod tests;
