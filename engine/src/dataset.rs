//! The fixed set of synchronized datasets.
//!
//! Both stores key their entries by dataset name. The set is closed: a name
//! that is not listed here is rejected, never created on the fly.

use crate::{error::Result, Error};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A named, independently synchronized slice of user data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetName {
    /// Daily condition log entries
    Conditions,
    /// Projects and their milestones
    Projects,
    /// To-do items
    Todos,
    /// User preferences (usually a single object, not an array)
    Settings,
}

impl DatasetName {
    /// Every dataset, in the order sync operations visit them.
    pub const ALL: [DatasetName; 4] = [
        DatasetName::Conditions,
        DatasetName::Projects,
        DatasetName::Todos,
        DatasetName::Settings,
    ];

    /// The wire/storage key for this dataset.
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetName::Conditions => "conditions",
            DatasetName::Projects => "projects",
            DatasetName::Todos => "todos",
            DatasetName::Settings => "settings",
        }
    }
}

impl fmt::Display for DatasetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatasetName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        DatasetName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| Error::UnknownDataset(s.to_string()))
    }
}
