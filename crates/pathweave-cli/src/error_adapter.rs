//! Adapters for rendering Pathweave errors and warnings with miette.
//!
//! This module provides the bridge between the library's error and warning
//! types and miette's rich diagnostic formatting used in the CLI.
//!
//! # Multi-Warning Support
//!
//! A conversion may report several [`ConversionWarning`]s. Each warning is
//! rendered independently, labelled at the element it is about in the input
//! document.

use std::{error::Error as StdError, fmt};

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan, Severity, SourceSpan};

use pathweave::{PathweaveError, warning::ConversionWarning};

/// Adapter for a single conversion warning.
///
/// This adapter wraps a [`ConversionWarning`] and implements
/// [`MietteDiagnostic`] so the warning can be shown against the input
/// document.
pub struct WarningAdapter<'a> {
    warning: &'a ConversionWarning,
    /// Input document for displaying snippets
    src: &'a str,
}

impl<'a> WarningAdapter<'a> {
    pub fn new(warning: &'a ConversionWarning, src: &'a str) -> Self {
        Self { warning, src }
    }

    /// Span of the element id the warning refers to.
    ///
    /// A reassigned duplicate id does not occur in the source; the original
    /// id is looked up instead.
    fn span(&self) -> Option<SourceSpan> {
        let id = match self.warning {
            ConversionWarning::DuplicateId { original, .. } => *original,
            warning => warning.element(),
        };
        let needle = format!("\"{id}\"");
        self.src
            .find(&needle)
            .map(|offset| SourceSpan::new(offset.into(), needle.len()))
    }
}

impl fmt::Debug for WarningAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WarningAdapter")
            .field("warning", &self.warning)
            .finish()
    }
}

impl fmt::Display for WarningAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.warning, f)
    }
}

impl StdError for WarningAdapter<'_> {}

impl MietteDiagnostic for WarningAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(self.warning.code()))
    }

    fn severity(&self) -> Option<Severity> {
        Some(Severity::Warning)
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(self.warning.help()))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.src as &dyn miette::SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let span = self.span()?;
        let message = Some(self.warning.code().description().to_string());
        Some(Box::new(std::iter::once(LabeledSpan::new_primary_with_span(
            message, span,
        ))))
    }
}

/// Adapter for [`PathweaveError`].
///
/// Errors carry no source location; only a code and the message are shown.
pub struct ErrorAdapter<'a>(pub &'a PathweaveError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl StdError for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        StdError::source(self.0)
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match &self.0 {
            PathweaveError::Io(_) => "pathweave::io",
            PathweaveError::UnknownElement(_) => "pathweave::unknown_element",
            PathweaveError::Unbound(_) | PathweaveError::AlreadyBound(_) => "pathweave::binding",
            PathweaveError::Document(_) => "pathweave::document",
            PathweaveError::BrokenChain { .. } => "pathweave::broken_chain",
            PathweaveError::Host(_) => "pathweave::host",
            PathweaveError::InvalidScale(_) => "pathweave::view",
            PathweaveError::Config(_) => "pathweave::config",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match &self.0 {
            PathweaveError::InvalidScale(_) => Some(Box::new(
                "set view.zoom and view.model_units_per_pixel to positive numbers",
            )),
            _ => None,
        }
    }
}

/// A reportable error or warning that can be rendered by miette.
#[derive(Debug)]
pub enum Reportable<'a> {
    /// A conversion warning located in the input document.
    Warning(WarningAdapter<'a>),
    /// An error without source location.
    Error(ErrorAdapter<'a>),
}

impl fmt::Display for Reportable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reportable::Warning(w) => fmt::Display::fmt(w, f),
            Reportable::Error(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl StdError for Reportable<'_> {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Reportable::Warning(_) => None,
            Reportable::Error(e) => StdError::source(e),
        }
    }
}

impl MietteDiagnostic for Reportable<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Warning(w) => w.code(),
            Reportable::Error(e) => e.code(),
        }
    }

    fn severity(&self) -> Option<Severity> {
        match self {
            Reportable::Warning(w) => w.severity(),
            Reportable::Error(e) => e.severity(),
        }
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Warning(w) => w.help(),
            Reportable::Error(e) => e.help(),
        }
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        match self {
            Reportable::Warning(w) => w.source_code(),
            Reportable::Error(e) => e.source_code(),
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        match self {
            Reportable::Warning(w) => w.labels(),
            Reportable::Error(e) => e.labels(),
        }
    }
}

/// Convert a [`PathweaveError`] into a reportable error.
pub fn to_reportable(err: &PathweaveError) -> Reportable<'_> {
    Reportable::Error(ErrorAdapter(err))
}

/// Convert conversion warnings into reportables against the input `src`.
pub fn warnings_to_reportables<'a>(
    warnings: &'a [ConversionWarning],
    src: &'a str,
) -> Vec<Reportable<'a>> {
    warnings
        .iter()
        .map(|warning| Reportable::Warning(WarningAdapter::new(warning, src)))
        .collect()
}

#[cfg(test)]
mod tests {
    use pathweave::{identifier::Id, warning::ReferenceField};

    use super::*;

    const SRC: &str = r#"[{"id":"A"},{"id":"L"}]"#;

    #[test]
    fn test_warning_labelled_at_element() {
        let warning = ConversionWarning::UnresolvedReference {
            element: Id::new("L"),
            field: ReferenceField::EndRef,
            target: Id::new("Z"),
        };
        let warnings = [warning];
        let reportables = warnings_to_reportables(&warnings, SRC);
        assert_eq!(reportables.len(), 1);

        let reportable = &reportables[0];
        assert_eq!(reportable.severity(), Some(Severity::Warning));
        assert_eq!(reportable.code().unwrap().to_string(), "W001");

        let labels: Vec<_> = reportable.labels().unwrap().collect();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].offset(), SRC.find("\"L\"").unwrap());
        assert!(labels[0].primary());
    }

    #[test]
    fn test_duplicate_labelled_at_original() {
        let warning = ConversionWarning::DuplicateId {
            original: Id::new("A"),
            reassigned: Id::new("id1a2b3c"),
        };
        let adapter = WarningAdapter::new(&warning, SRC);
        let labels: Vec<_> = adapter.labels().unwrap().collect();
        assert_eq!(labels[0].offset(), SRC.find("\"A\"").unwrap());
    }

    #[test]
    fn test_warning_without_location() {
        let warning = ConversionWarning::InvalidGroupTopology {
            group: Id::new("G"),
            member: Id::new("absent"),
        };
        let adapter = WarningAdapter::new(&warning, SRC);
        assert!(adapter.labels().is_none());
        assert!(adapter.help().is_some());
    }

    #[test]
    fn test_error_reportable() {
        let err = PathweaveError::InvalidScale(0.0);
        let reportable = to_reportable(&err);

        assert_eq!(reportable.code().unwrap().to_string(), "pathweave::view");
        assert!(reportable.help().is_some());
        assert!(reportable.labels().is_none());
    }
}
