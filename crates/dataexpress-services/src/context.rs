//! Auto-fill recursion guard

use dataexpress_core::{DataExpressError, Result};

/// The chain of named statements an execution is nested in
///
/// Every auto-fill lookup runs one level deeper than its caller. Entering a
/// level checks both the depth limit and the chain before anything touches
/// the database.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    chain: Vec<String>,
    max_depth: usize,
}

impl ExecutionContext {
    /// Context of a top-level call for `processor_name`
    pub fn root(processor_name: &str, max_depth: usize) -> Self {
        Self {
            chain: vec![processor_name.to_ascii_uppercase()],
            max_depth,
        }
    }

    /// Number of auto-fill levels above the top-level call
    pub fn depth(&self) -> usize {
        self.chain.len().saturating_sub(1)
    }

    pub fn is_root(&self) -> bool {
        self.chain.len() <= 1
    }

    pub fn chain(&self) -> &[String] {
        &self.chain
    }

    /// Context for running the named statement `key` one level down
    pub fn enter(&self, key: &str) -> Result<Self> {
        let key = key.to_ascii_uppercase();
        if self.chain.contains(&key) {
            let mut chain = self.chain.clone();
            chain.push(key);
            return Err(DataExpressError::AutoFillCycle { chain });
        }

        let depth = self.depth() + 1;
        if depth > self.max_depth {
            return Err(DataExpressError::AutoFillDepthExceeded {
                depth,
                max: self.max_depth,
            });
        }

        let mut chain = self.chain.clone();
        chain.push(key);
        Ok(Self {
            chain,
            max_depth: self.max_depth,
        })
    }
}
