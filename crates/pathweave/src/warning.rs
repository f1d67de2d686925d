//! Non-fatal conversion diagnostics.
//!
//! Warning codes:
//! - `W001` - Unresolved reference
//! - `W002` - Duplicate element id
//! - `W003` - Invalid group topology
//!
//! A conversion always completes; every recovered problem is recorded as a
//! [`ConversionWarning`] in the conversion result.

use std::fmt;

use thiserror::Error;

use pathweave_core::identifier::Id;

/// Codes for categorizing conversion warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningCode {
    /// Unresolved reference.
    ///
    /// A line end, an anchor owner or a group reference names an element that
    /// does not exist (or, for groups, is not a group). The referring element
    /// is kept as an annotation.
    W001,

    /// Duplicate element id.
    ///
    /// Two elements of one document share an id. The later element received
    /// a fresh id; references keep resolving to the first holder.
    W002,

    /// Invalid group topology.
    ///
    /// A membership edge would close a group containment cycle and was
    /// omitted from the graph.
    W003,
}

impl WarningCode {
    /// Returns the code as a string (e.g., "W001").
    pub fn as_str(&self) -> &'static str {
        match self {
            WarningCode::W001 => "W001",
            WarningCode::W002 => "W002",
            WarningCode::W003 => "W003",
        }
    }

    /// Returns a short description of what this warning code means.
    pub fn description(&self) -> &'static str {
        match self {
            WarningCode::W001 => "unresolved reference",
            WarningCode::W002 => "duplicate element id",
            WarningCode::W003 => "invalid group topology",
        }
    }
}

impl fmt::Display for WarningCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Reference field of an element that failed to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceField {
    StartRef,
    EndRef,
    GroupRef,
    /// Owning line of an anchor
    Owner,
}

impl fmt::Display for ReferenceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceField::StartRef => write!(f, "startRef"),
            ReferenceField::EndRef => write!(f, "endRef"),
            ReferenceField::GroupRef => write!(f, "groupRef"),
            ReferenceField::Owner => write!(f, "owner"),
        }
    }
}

/// A recovered problem found while converting a document.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionWarning {
    #[error("`{element}` {field} refers to unknown element `{target}`")]
    UnresolvedReference {
        element: Id,
        field: ReferenceField,
        target: Id,
    },

    #[error("duplicate element id `{original}`, reassigned to `{reassigned}`")]
    DuplicateId { original: Id, reassigned: Id },

    #[error("membership of `{member}` in group `{group}` would form a containment cycle")]
    InvalidGroupTopology { group: Id, member: Id },
}

impl ConversionWarning {
    pub fn code(&self) -> WarningCode {
        match self {
            ConversionWarning::UnresolvedReference { .. } => WarningCode::W001,
            ConversionWarning::DuplicateId { .. } => WarningCode::W002,
            ConversionWarning::InvalidGroupTopology { .. } => WarningCode::W003,
        }
    }

    /// Returns the element the warning is about
    pub fn element(&self) -> Id {
        match self {
            ConversionWarning::UnresolvedReference { element, .. } => *element,
            ConversionWarning::DuplicateId { reassigned, .. } => *reassigned,
            ConversionWarning::InvalidGroupTopology { member, .. } => *member,
        }
    }

    /// Returns a hint on how to fix the underlying document.
    pub fn help(&self) -> String {
        match self {
            ConversionWarning::UnresolvedReference { field, .. } => match field {
                ReferenceField::GroupRef => {
                    "the element is kept but gets no membership edge; point groupRef at an existing group".to_string()
                }
                _ => "the element is kept as an annotation; point the reference at an existing element".to_string(),
            },
            ConversionWarning::DuplicateId { original, .. } => {
                format!("references to `{original}` resolve to its first holder")
            }
            ConversionWarning::InvalidGroupTopology { .. } => {
                "the membership edge is omitted; the element keeps its groupRef".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_code_display() {
        assert_eq!(WarningCode::W001.to_string(), "W001");
        assert_eq!(WarningCode::W003.as_str(), "W003");
        assert_eq!(WarningCode::W002.description(), "duplicate element id");
    }

    #[test]
    fn test_warning_message() {
        let warning = ConversionWarning::UnresolvedReference {
            element: Id::new("l1"),
            field: ReferenceField::EndRef,
            target: Id::new("ghost"),
        };

        assert_eq!(warning.code(), WarningCode::W001);
        assert_eq!(warning.element(), Id::new("l1"));
        assert_eq!(
            warning.to_string(),
            "`l1` endRef refers to unknown element `ghost`"
        );
        assert!(warning.help().contains("annotation"));
    }
}
