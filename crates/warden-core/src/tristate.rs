//! Three-valued permission check results.

use serde::{Deserialize, Serialize};

/// The outcome of a permission check.
///
/// `Undefined` means the permission was never mentioned anywhere in the
/// holder's inheritance closure. Callers use it to fall back to a
/// platform-default decision; it is distinct from an explicit `False`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tristate {
    True,
    False,
    Undefined,
}

impl Tristate {
    /// Convert a boolean node value into a tristate.
    pub fn from_bool(b: bool) -> Self {
        if b {
            Tristate::True
        } else {
            Tristate::False
        }
    }

    /// The defined boolean value, if any.
    pub fn as_bool(self) -> Option<bool> {
        match self {
            Tristate::True => Some(true),
            Tristate::False => Some(false),
            Tristate::Undefined => None,
        }
    }

    /// Collapse to a boolean, treating `Undefined` as false.
    pub fn as_bool_or_false(self) -> bool {
        matches!(self, Tristate::True)
    }

    /// Whether a value is defined at all.
    pub fn is_defined(self) -> bool {
        self != Tristate::Undefined
    }
}

impl From<bool> for Tristate {
    fn from(b: bool) -> Self {
        Tristate::from_bool(b)
    }
}

impl From<Option<bool>> for Tristate {
    fn from(b: Option<bool>) -> Self {
        match b {
            Some(b) => Tristate::from_bool(b),
            None => Tristate::Undefined,
        }
    }
}
