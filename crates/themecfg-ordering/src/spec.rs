//! Ordering specification: a chain of group names.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{OrderingError, OrderingResult};

/// User-declared chain of group names.
///
/// Each name must end up immediately after the one before it. An empty chain
/// means "leave the order alone"; a single name is rejected since it states
/// no relationship.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct OrderingSpec {
    names: Vec<String>,
}

impl OrderingSpec {
    /// Validate a list of group names.
    pub fn new(names: Vec<String>) -> OrderingResult<Self> {
        if names.len() == 1 {
            return Err(OrderingError::InvalidSpec(names.len()));
        }
        Ok(Self { names })
    }

    /// Empty specification (no reordering).
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Group names in declared order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Adjacent `(before, after)` pairs, left to right.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.names
            .windows(2)
            .map(|pair| (pair[0].as_str(), pair[1].as_str()))
    }
}

impl<'de> Deserialize<'de> for OrderingSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let names = Vec::<String>::deserialize(deserializer)?;
        OrderingSpec::new(names).map_err(serde::de::Error::custom)
    }
}
