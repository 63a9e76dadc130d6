//! Output column filters

use std::collections::HashMap;

/// Allow-list key in a filter map
pub const ONLY: &str = "SCOOTER.ONLY";
/// Deny-list key in a filter map
pub const EXCEPT: &str = "SCOOTER.EXCEPT";

/// Column restriction applied while materializing a result
///
/// Names are stored upper-cased and matched against upper-cased column
/// names. An `only` list also fixes the output column order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputFilter {
    only: Vec<String>,
    except: Vec<String>,
}

impl OutputFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn only(columns: &str) -> Self {
        Self {
            only: split_names(columns),
            except: Vec::new(),
        }
    }

    pub fn except(columns: &str) -> Self {
        Self {
            only: Vec::new(),
            except: split_names(columns),
        }
    }

    /// Read `only`/`except` entries from a string map. Both the short keys
    /// and the `SCOOTER.` prefixed forms are recognized, case-insensitively.
    pub fn from_map(map: &HashMap<String, String>) -> Self {
        let mut filter = Self::default();
        for (key, value) in map {
            match key.trim().to_ascii_uppercase().as_str() {
                "ONLY" | ONLY => filter.only.extend(split_names(value)),
                "EXCEPT" | EXCEPT => filter.except.extend(split_names(value)),
                other => tracing::trace!(key = other, "ignoring unknown output filter key"),
            }
        }
        filter
    }

    pub fn is_empty(&self) -> bool {
        self.only.is_empty() && self.except.is_empty()
    }

    pub fn only_columns(&self) -> &[String] {
        &self.only
    }

    pub fn except_columns(&self) -> &[String] {
        &self.except
    }

    /// Add a column to the deny-list, as pagination wrappers do for their
    /// synthetic row-number columns.
    pub fn add_except(&mut self, column: &str) {
        let upper = column.trim().to_ascii_uppercase();
        if !upper.is_empty() && !self.except.contains(&upper) {
            self.except.push(upper);
        }
    }

    /// Whether a column with this name survives the filter
    pub fn allows(&self, column: &str) -> bool {
        let upper = column.to_ascii_uppercase();
        if self.except.contains(&upper) {
            return false;
        }
        self.only.is_empty() || self.only.contains(&upper)
    }
}

fn split_names(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_ascii_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}
