//! Group holders.

use warden_core::NodeKind;

use crate::holder::PermissionHolder;

/// A group: identified by a unique name, long-lived for the process
/// lifetime once loaded.
#[derive(Debug, Clone)]
pub struct Group {
    name: String,
    holder: PermissionHolder,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            holder: PermissionHolder::new(),
        }
    }

    pub fn with_holder(name: impl Into<String>, holder: PermissionHolder) -> Self {
        Self {
            name: name.into(),
            holder,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The group's weight, if it holds a weight node. Used to order
    /// groups of otherwise equal rank.
    pub fn weight(&self) -> Option<i64> {
        self.holder
            .entries()
            .iter()
            .filter_map(|e| match e.node.kind() {
                NodeKind::Weight(w) => Some(*w),
                _ => None,
            })
            .max()
    }

    pub fn holder(&self) -> &PermissionHolder {
        &self.holder
    }

    pub fn holder_mut(&mut self) -> &mut PermissionHolder {
        &mut self.holder
    }
}
