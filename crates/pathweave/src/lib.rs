//! Pathweave - Synchronization between pathway diagrams and node/edge graphs.
//!
//! A pathway diagram is converted into the nodes and edges of a graph host.
//! Elements without a graph counterpart are kept as annotations and drawn on
//! top of the host view. Edits on either side flow through per-element
//! wrappers, and the diagram can be reconstituted from the session at any
//! time.

pub mod attributes;
pub mod config;
pub mod convert;
pub mod duplicate;
pub mod host;
pub mod overlay;
pub mod queue;
pub mod registry;
pub mod session;
pub mod transform;
pub mod warning;
pub mod wrapper;

mod error;

pub use pathweave_core::{color, geometry, identifier, model};

pub use error::PathweaveError;

use log::{debug, info, trace};

use config::AppConfig;
use host::HostGraph;
use model::DiagramDocument;
use session::SyncSession;
use warning::ConversionWarning;

/// Builder for synchronization sessions.
///
/// Holds the configuration shared by the sessions it creates. Every session
/// is independent of the others.
///
/// # Examples
///
/// ```
/// use pathweave::{
///     SyncBuilder,
///     config::AppConfig,
///     geometry::{Point, Size},
///     host::{HostGraph, MemoryGraph},
///     identifier::Id,
///     model::{DiagramDocument, DiagramElement},
/// };
///
/// let document: DiagramDocument = [
///     DiagramElement::data_node(Id::new("A"), Point::new(0.0, 0.0), Size::new(20.0, 10.0)),
///     DiagramElement::data_node(Id::new("B"), Point::new(100.0, 0.0), Size::new(20.0, 10.0)),
///     DiagramElement::line(Id::new("L"), Point::new(0.0, 0.0), Point::new(100.0, 0.0), Some(Id::new("A")), Some(Id::new("B"))),
/// ]
/// .into_iter()
/// .collect();
///
/// let builder = SyncBuilder::new(AppConfig::default());
/// let mut host = MemoryGraph::new();
/// let (session, warnings) = builder.load(&document, &mut host).unwrap();
///
/// assert!(warnings.is_empty());
/// assert_eq!(host.edge_endpoints(Id::new("L")), Some((Id::new("A"), Id::new("B"))));
/// assert_eq!(session.export().unwrap(), document);
/// ```
#[derive(Debug, Default)]
pub struct SyncBuilder {
    config: AppConfig,
    seed: Option<u64>,
}

impl SyncBuilder {
    /// Create a new builder with the given configuration.
    ///
    /// # Arguments
    ///
    /// * `config` - Conversion, view and attribute settings
    pub fn new(config: AppConfig) -> Self {
        Self { config, seed: None }
    }

    /// Makes generated ids of the built sessions deterministic.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Create an empty session.
    ///
    /// # Errors
    ///
    /// Returns `PathweaveError::Config` when the attribute section is
    /// unusable, or `PathweaveError::InvalidScale` for a bad view scale.
    pub fn session(&self) -> Result<SyncSession, PathweaveError> {
        debug!(seeded = self.seed.is_some(); "Creating session");
        match self.seed {
            Some(seed) => SyncSession::with_seed(&self.config, seed),
            None => SyncSession::new(&self.config),
        }
    }

    /// Create a session holding `document`, with its graph items created in
    /// `host`.
    ///
    /// Problems found in the document do not fail the load; they are
    /// returned as warnings.
    ///
    /// # Errors
    ///
    /// Returns `PathweaveError` when the session cannot be created or the
    /// host refuses an item.
    pub fn load(
        &self,
        document: &DiagramDocument,
        host: &mut impl HostGraph,
    ) -> Result<(SyncSession, Vec<ConversionWarning>), PathweaveError> {
        info!(elements = document.len(); "Converting document");
        let mut session = self.session()?;
        let warnings = session.load(document, host)?;

        info!(
            wrappers = session.wrappers().len(),
            annotations = session.wrappers().annotation_count(),
            warnings = warnings.len();
            "Document converted"
        );
        trace!(warnings:?; "Conversion warnings");
        Ok((session, warnings))
    }
}
