use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a destination table in the warehouse.
///
/// The conversion core never inspects the parts of a [`TableId`]; it is only used as the lookup
/// key for the batch registry and the merge trigger. In upsert/delete mode this is the
/// intermediate table that staged entries are written to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableId {
    /// Project owning the dataset, if it differs from the client default.
    pub project: Option<String>,
    /// Dataset containing the table.
    pub dataset: String,
    /// Name of the table.
    pub table: String,
}

impl TableId {
    /// Creates a [`TableId`] in the default project of the client.
    pub fn new(dataset: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            project: None,
            dataset: dataset.into(),
            table: table.into(),
        }
    }

    /// Creates a [`TableId`] in an explicit project.
    pub fn with_project(
        project: impl Into<String>,
        dataset: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            project: Some(project.into()),
            dataset: dataset.into(),
            table: table.into(),
        }
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.project {
            Some(project) => write!(f, "{project}.{}.{}", self.dataset, self.table),
            None => write!(f, "{}.{}", self.dataset, self.table),
        }
    }
}
