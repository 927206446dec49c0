//! Calendar users.

use crate::id::UserId;
use serde::{Deserialize, Serialize};

/// A person events can be assigned to. Sourced externally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Stable identifier
    pub id: UserId,

    /// Display name
    pub name: String,

    /// Optional avatar path
    #[serde(default)]
    pub picture_path: Option<String>,
}

impl User {
    /// Create a user without a picture.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: UserId::new(id),
            name: name.into(),
            picture_path: None,
        }
    }

    /// Attach a picture path.
    pub fn with_picture(mut self, path: impl Into<String>) -> Self {
        self.picture_path = Some(path.into());
        self
    }

    /// Whether the user has a picture.
    pub fn has_picture(&self) -> bool {
        self.picture_path.as_deref().is_some_and(|p| !p.is_empty())
    }

    /// `Name (id)` label used in error messages.
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.id)
    }
}
