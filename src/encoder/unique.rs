use std::collections::{HashMap, HashSet};

use crate::common::{Error, Result};

/// Values already seen for each unique-constrained field of one artifact.
#[derive(Debug, Default)]
pub struct UniqueIndex {
    seen: HashMap<String, HashSet<String>>,
}

impl UniqueIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `value` for `field`, failing if it was recorded before.
    pub fn check(&mut self, field: &str, value: &str) -> Result<()> {
        let values = self.seen.entry(field.to_string()).or_default();
        if values.insert(value.to_string()) {
            Ok(())
        } else {
            Err(Error::DuplicateUniqueValue {
                field: field.to_string(),
                value: value.to_string(),
            })
        }
    }

    /// Number of distinct values recorded for `field`.
    pub fn count(&self, field: &str) -> usize {
        self.seen.get(field).map_or(0, HashSet::len)
    }
}
