//! Parameter grouping for hierarchical organization.
//!
//! Groups organize parameters into folders in the host's parameter list.
//! They form a forest: each group names its parent by index into the
//! registry's group list, and a parent always precedes its children, so a
//! cycle cannot be expressed.
//!
//! # Example
//!
//! ```ignore
//! // Filter (group 0)
//! // ├── cutoff
//! // └── Envelope (group 1, parent 0)
//! //     └── attack
//! ```

use crate::types::{MAX_STRING_LENGTH, PATH_SEPARATOR};

/// Index of a group in the registry's group list.
pub type GroupIndex = usize;

/// Information about a parameter group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupInfo {
    /// Stable identifier, unique among the children of the same parent.
    pub identifier: &'static str,
    /// Display name shown in the DAW (e.g., "Filter", "Amp Envelope").
    pub name: &'static str,
    /// Parent group, `None` for a root group.
    pub parent: Option<GroupIndex>,
}

impl GroupInfo {
    /// Create a root group.
    pub const fn new(identifier: &'static str, name: &'static str) -> Self {
        Self {
            identifier,
            name,
            parent: None,
        }
    }

    /// Nest this group inside `parent`.
    pub const fn with_parent(mut self, parent: GroupIndex) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Parent index in host form: `-1` marks a root.
    pub fn parent_index(&self) -> i64 {
        self.parent.map(|index| index as i64).unwrap_or(-1)
    }

    /// Validate this group as entry `index` of a group list.
    pub(crate) fn validate(&self, index: GroupIndex) -> Result<(), String> {
        if self.identifier.is_empty() {
            return Err(format!("group {} has an empty identifier", index));
        }
        if self.identifier.contains(PATH_SEPARATOR) {
            return Err(format!(
                "group identifier '{}' contains '{}'",
                self.identifier, PATH_SEPARATOR
            ));
        }
        if self.identifier.len() >= MAX_STRING_LENGTH || self.name.len() >= MAX_STRING_LENGTH {
            return Err(format!(
                "group '{}' identifier or name exceeds {} bytes",
                self.identifier,
                MAX_STRING_LENGTH - 1
            ));
        }
        match self.parent {
            Some(parent) if parent >= index => Err(format!(
                "group '{}' (index {}) must come after its parent (index {})",
                self.identifier, index, parent
            )),
            _ => Ok(()),
        }
    }
}
