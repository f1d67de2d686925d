//! Conversion of diagram documents into graph items.
//!
//! The [`Converter`] classifies every element of a document and produces the
//! nodes and edges a graph host should display, together with one
//! [`ElementWrapper`] per element. Classification runs in phases:
//!
//! 1. Every element gets an id from the [`IdentityRegistry`], preferring its
//!    own. Later holders of a duplicate id are reassigned.
//! 2. Data nodes (and labels, when configured) become nodes.
//! 3. Lines become edges when both ends reach node elements, directly or
//!    through anchors of other edge lines. Anchored lines are split into
//!    anchor nodes and segments.
//! 4. Groups become nodes and gain membership edges to their members.
//!
//! Everything else is annotation-only. Conversion never fails; problems are
//! collected as [`ConversionWarning`]s.

pub mod anchors;
mod export;
mod groups;

pub use export::export;
pub use groups::Membership;

use std::collections::{BTreeSet, HashMap, HashSet};

use log::{debug, info, trace, warn};

use pathweave_core::{
    geometry::Point,
    identifier::Id,
    model::{DiagramDocument, DiagramElement, ElementKind, Geometry},
};

use crate::{
    attributes::{AttributeBag, AttributeMapper},
    config::ConversionConfig,
    duplicate::rewrite_references,
    registry::IdentityRegistry,
    warning::{ConversionWarning, ReferenceField},
    wrapper::{Binding, ElementWrapper, WrapperSet},
};

/// What a graph node stands for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeRole {
    /// A data node or label
    Element,
    /// A synthetic node for an anchor of a split line
    Anchor { line: Id, position: f32 },
    /// A group node; `reused` when the host already holds it
    Group { reused: bool },
}

/// A node to create in the host.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    pub id: Id,
    /// The element bound to the node
    pub element: Id,
    pub role: NodeRole,
    /// Position in model units
    pub position: Point,
    pub attributes: AttributeBag,
}

/// What a graph edge stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeRole {
    /// A whole line without anchors
    Line,
    /// One segment of a split line
    Segment { line: Id, index: usize },
    /// Group membership
    Membership { group: Id },
}

/// An edge to create in the host.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphEdge {
    pub id: Id,
    pub source: Id,
    pub target: Id,
    pub role: EdgeRole,
    pub attributes: AttributeBag,
}

/// Output of one conversion pass.
#[derive(Debug, Default)]
pub struct Conversion {
    /// Element nodes, then anchor nodes, then group nodes
    pub nodes: Vec<GraphNode>,
    /// Line edges and segments, then membership edges
    pub edges: Vec<GraphEdge>,
    /// One wrapper per input element, in document order
    pub wrappers: WrapperSet,
    pub memberships: Vec<Membership>,
    pub warnings: Vec<ConversionWarning>,
}

impl Conversion {
    pub fn node(&self, id: Id) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn edge(&self, id: Id) -> Option<&GraphEdge> {
        self.edges.iter().find(|edge| edge.id == id)
    }

    /// Counts the wrappers without graph representation
    pub fn annotation_count(&self) -> usize {
        self.wrappers.annotation_count()
    }
}

/// Classification of an element that exists outside the converted batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KnownKind {
    Node,
    Group,
    Other,
}

/// Where a reference points.
#[derive(Debug, Clone, Copy)]
enum Target {
    Batch(usize),
    Known(KnownKind),
}

/// The converted elements with their final ids and rewritten references.
struct Batch {
    elements: Vec<DiagramElement>,
    index: HashMap<Id, usize>,
}

/// Converts documents, or batches of elements joining a live session.
///
/// # Examples
///
/// ```
/// # use pathweave::{attributes::AttributeMapper, config::ConversionConfig, convert::Converter, registry::IdentityRegistry};
/// # use pathweave_core::{geometry::{Point, Size}, identifier::Id, model::{DiagramDocument, DiagramElement}};
/// let document: DiagramDocument = [
///     DiagramElement::data_node(Id::new("A"), Point::new(0.0, 0.0), Size::new(20.0, 10.0)),
///     DiagramElement::data_node(Id::new("B"), Point::new(100.0, 0.0), Size::new(20.0, 10.0)),
///     DiagramElement::line(
///         Id::new("L"),
///         Point::new(0.0, 0.0),
///         Point::new(100.0, 0.0),
///         Some(Id::new("A")),
///         Some(Id::new("B")),
///     ),
/// ]
/// .into_iter()
/// .collect();
///
/// let config = ConversionConfig::default();
/// let mapper = AttributeMapper::new();
/// let mut registry = IdentityRegistry::with_seed(1);
/// let conversion = Converter::new(&config, &mapper).convert(&document, &mut registry);
///
/// assert_eq!(conversion.nodes.len(), 2);
/// assert_eq!(conversion.edges.len(), 1);
/// assert_eq!(conversion.annotation_count(), 0);
/// ```
pub struct Converter<'a> {
    config: &'a ConversionConfig,
    mapper: &'a AttributeMapper,
    known: HashMap<Id, KnownKind>,
    existing_host_nodes: HashSet<Id>,
    existing_memberships: Vec<(Id, Id)>,
    reserved: HashSet<Id>,
}

impl<'a> Converter<'a> {
    pub fn new(config: &'a ConversionConfig, mapper: &'a AttributeMapper) -> Self {
        Self {
            config,
            mapper,
            known: HashMap::new(),
            existing_host_nodes: HashSet::new(),
            existing_memberships: Vec::new(),
            reserved: HashSet::new(),
        }
    }

    /// Lets references resolve to the elements of a live session.
    ///
    /// Node-bound session elements can be line ends and group members;
    /// session groups can be named by `group_ref`.
    pub fn with_known_elements(mut self, wrappers: &WrapperSet) -> Self {
        for wrapper in wrappers.iter() {
            let kind = match (wrapper.binding(), wrapper.live().kind()) {
                (Binding::Node(_), ElementKind::Group) => KnownKind::Group,
                (Binding::Node(_), _) => KnownKind::Node,
                _ => KnownKind::Other,
            };
            self.known.insert(wrapper.id(), kind);
        }
        self
    }

    /// Group nodes already present in the host, reused instead of created.
    pub fn with_existing_host_nodes(mut self, nodes: impl IntoIterator<Item = Id>) -> Self {
        self.existing_host_nodes.extend(nodes);
        self
    }

    /// Session memberships as `(group, member)`, taken into account when
    /// checking for containment cycles.
    pub fn with_existing_memberships(mut self, memberships: impl IntoIterator<Item = (Id, Id)>) -> Self {
        self.existing_memberships.extend(memberships);
        self
    }

    /// Ids already allocated for this batch, e.g. by a remap. Each one is
    /// claimed by its first holder instead of being reassigned.
    pub fn with_reserved(mut self, ids: impl IntoIterator<Item = Id>) -> Self {
        self.reserved.extend(ids);
        self
    }

    /// Converts `document`, allocating every id in `registry`.
    pub fn convert(&self, document: &DiagramDocument, registry: &mut IdentityRegistry) -> Conversion {
        info!(elements = document.len(); "Converting document");
        let mut conversion = Conversion::default();

        let batch = self.assign_ids(document, registry, &mut conversion.warnings);
        self.check_references(&batch, &mut conversion.warnings);
        let edge_lines = self.classify_lines(&batch);

        for element in &batch.elements {
            conversion.wrappers.insert(ElementWrapper::new(element.clone()));
        }

        self.emit_nodes(&batch, &mut conversion);
        self.emit_lines(&batch, &edge_lines, registry, &mut conversion);
        self.expand_groups(&batch, registry, &mut conversion);

        for wrapper in conversion.wrappers.iter_mut() {
            if !wrapper.binding().is_bound() {
                trace!(element = wrapper.id().to_string(); "Annotation-only element");
                *wrapper.binding_mut() = Binding::Annotation;
            }
        }

        info!(
            nodes = conversion.nodes.len(),
            edges = conversion.edges.len(),
            annotations = conversion.annotation_count(),
            warnings = conversion.warnings.len();
            "Conversion complete"
        );
        conversion
    }

    /// Reserves the final id of every element and points references at the
    /// first holder of each id.
    fn assign_ids(
        &self,
        document: &DiagramDocument,
        registry: &mut IdentityRegistry,
        warnings: &mut Vec<ConversionWarning>,
    ) -> Batch {
        let mut reserved = self.reserved.clone();
        let mut first_holders: HashMap<Id, Id> = HashMap::new();
        let mut elements = Vec::with_capacity(document.len());

        for element in document.elements() {
            let original = element.id();
            let id = if original.is_empty() || first_holders.contains_key(&original) {
                registry.allocate()
            } else if reserved.remove(&original) {
                original
            } else {
                registry.reserve(original)
            };

            if !original.is_empty() {
                if id != original {
                    warn!(original = original.to_string(), reassigned = id.to_string(); "Duplicate element id");
                    warnings.push(ConversionWarning::DuplicateId {
                        original,
                        reassigned: id,
                    });
                }
                first_holders.entry(original).or_insert(id);
            }

            let mut element = element.clone();
            element.set_id(id);
            elements.push(element);
        }

        for element in &mut elements {
            rewrite_references(element, |target| {
                Some(first_holders.get(&target).copied().unwrap_or(target))
            });
        }

        let index = elements
            .iter()
            .enumerate()
            .map(|(position, element)| (element.id(), position))
            .collect();
        Batch { elements, index }
    }

    fn target(&self, batch: &Batch, id: Id) -> Option<Target> {
        if let Some(index) = batch.index.get(&id) {
            return Some(Target::Batch(*index));
        }
        self.known.get(&id).map(|kind| Target::Known(*kind))
    }

    /// Reports line ends and anchor owners naming no element.
    fn check_references(&self, batch: &Batch, warnings: &mut Vec<ConversionWarning>) {
        for element in &batch.elements {
            let references: Vec<(ReferenceField, Id)> = match *element.kind() {
                ElementKind::Line { start_ref, end_ref } => {
                    let start = start_ref.map(|target| (ReferenceField::StartRef, target));
                    let end = end_ref.map(|target| (ReferenceField::EndRef, target));
                    start.into_iter().chain(end).collect()
                }
                ElementKind::Anchor { owner, .. } => vec![(ReferenceField::Owner, owner)],
                _ => continue,
            };

            for (field, target) in references {
                if self.target(batch, target).is_none() {
                    warn!(element = element.id().to_string(), target = target.to_string(); "Unresolved {field}");
                    warnings.push(ConversionWarning::UnresolvedReference {
                        element: element.id(),
                        field,
                        target,
                    });
                }
            }
        }
    }

    /// Returns the batch indices of lines that become edges.
    ///
    /// This is the greatest fixpoint: every attached line starts as an edge,
    /// and lines ending on an anchor of a demoted line are demoted until
    /// nothing changes. The result does not depend on document order.
    fn classify_lines(&self, batch: &Batch) -> BTreeSet<usize> {
        let mut edges: BTreeSet<usize> = batch
            .elements
            .iter()
            .enumerate()
            .filter(|(_, element)| matches!(element.line_refs(), Some((Some(_), Some(_)))))
            .map(|(index, _)| index)
            .collect();

        loop {
            let demoted: Vec<usize> = edges
                .iter()
                .copied()
                .filter(|&index| !self.ends_resolve(batch, index, &edges))
                .collect();
            if demoted.is_empty() {
                break;
            }
            for index in demoted {
                trace!(line = batch.elements[index].id().to_string(); "Line demoted");
                edges.remove(&index);
            }
        }
        edges
    }

    fn ends_resolve(&self, batch: &Batch, line: usize, edges: &BTreeSet<usize>) -> bool {
        let Some((Some(start), Some(end))) = batch.elements[line].line_refs() else {
            return false;
        };
        self.is_node(batch, start, edges) && self.is_node(batch, end, edges)
    }

    fn is_node(&self, batch: &Batch, id: Id, edges: &BTreeSet<usize>) -> bool {
        match self.target(batch, id) {
            Some(Target::Batch(index)) => match batch.elements[index].kind() {
                ElementKind::DataNode | ElementKind::Group => true,
                ElementKind::Label => self.config.label_as_node(),
                ElementKind::Anchor { owner, .. } => batch
                    .index
                    .get(owner)
                    .is_some_and(|owner| edges.contains(owner)),
                ElementKind::Shape | ElementKind::InfoBox | ElementKind::Line { .. } => false,
            },
            Some(Target::Known(kind)) => kind != KnownKind::Other,
            None => false,
        }
    }

    /// Binds `id` to a node of the same id and records the graph node.
    fn bind_node(&self, conversion: &mut Conversion, id: Id, role: NodeRole, position: Point) {
        let Some(wrapper) = conversion.wrappers.get_mut(id) else {
            return;
        };
        *wrapper.binding_mut() = Binding::Node(id);
        let attributes = wrapper
            .host_attributes(self.mapper)
            .into_iter()
            .next()
            .map(|(_, bag)| bag)
            .unwrap_or_default();
        conversion.nodes.push(GraphNode {
            id,
            element: id,
            role,
            position,
            attributes,
        });
    }

    fn emit_nodes(&self, batch: &Batch, conversion: &mut Conversion) {
        for element in &batch.elements {
            let is_node = match element.kind() {
                ElementKind::DataNode => true,
                ElementKind::Label => self.config.label_as_node(),
                _ => false,
            };
            if is_node {
                let center = element.geometry().center().unwrap_or_default();
                self.bind_node(conversion, element.id(), NodeRole::Element, center);
            }
        }
    }

    fn emit_lines(
        &self,
        batch: &Batch,
        edge_lines: &BTreeSet<usize>,
        registry: &mut IdentityRegistry,
        conversion: &mut Conversion,
    ) {
        for (index, line) in batch.elements.iter().enumerate() {
            if !line.is_line() {
                continue;
            }
            if !edge_lines.contains(&index) {
                debug!(line = line.id().to_string(); "Line kept as annotation");
                continue;
            }

            let line_id = line.id();
            let anchors: Vec<&DiagramElement> = batch
                .elements
                .iter()
                .filter(|element| element.anchor_of().is_some_and(|(owner, _)| owner == line_id))
                .collect();

            if anchors.is_empty() {
                self.emit_line_edge(line, conversion);
            } else {
                match anchors::split(line, &anchors, registry) {
                    Ok(split) => self.emit_split_line(line, split, conversion),
                    Err(err) => warn!(line = line_id.to_string(); "Cannot split line: {err}"),
                }
            }
        }
    }

    fn emit_line_edge(&self, line: &DiagramElement, conversion: &mut Conversion) {
        let Some((Some(source), Some(target))) = line.line_refs() else {
            return;
        };
        let Some(wrapper) = conversion.wrappers.get_mut(line.id()) else {
            return;
        };
        *wrapper.binding_mut() = Binding::Edge(line.id());
        for (id, attributes) in wrapper.host_attributes(self.mapper) {
            conversion.edges.push(GraphEdge {
                id,
                source,
                target,
                role: EdgeRole::Line,
                attributes,
            });
        }
    }

    fn emit_split_line(&self, line: &DiagramElement, split: anchors::SplitLine, conversion: &mut Conversion) {
        let (start, end) = match *line.geometry() {
            Geometry::Path { start, end } => (start, end),
            _ => (Point::default(), Point::default()),
        };
        for node in split.anchors() {
            let role = NodeRole::Anchor {
                line: line.id(),
                position: node.position,
            };
            self.bind_node(conversion, node.id, role, start.lerp(end, node.position));
        }

        let segments: Vec<(Id, Id, usize)> = split
            .segments()
            .iter()
            .map(|segment| (segment.source, segment.target, segment.index))
            .collect();
        let Some(wrapper) = conversion.wrappers.get_mut(line.id()) else {
            return;
        };
        *wrapper.binding_mut() = Binding::Chain(split);

        for ((source, target, index), (id, attributes)) in
            segments.into_iter().zip(wrapper.host_attributes(self.mapper))
        {
            conversion.edges.push(GraphEdge {
                id,
                source,
                target,
                role: EdgeRole::Segment {
                    line: line.id(),
                    index,
                },
                attributes,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use pathweave_core::{
        geometry::Size,
        model::{LineType, PropertyKey, PropertyValue},
    };

    use super::*;
    use crate::warning::WarningCode;

    fn node(id: &str, x: f32) -> DiagramElement {
        DiagramElement::data_node(Id::new(id), Point::new(x, 0.0), Size::new(20.0, 10.0))
    }

    fn line(id: &str, start: Option<&str>, end: Option<&str>) -> DiagramElement {
        DiagramElement::line(
            Id::new(id),
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            start.map(Id::new),
            end.map(Id::new),
        )
    }

    fn convert_with(config: &ConversionConfig, elements: Vec<DiagramElement>) -> Conversion {
        let mapper = AttributeMapper::new();
        let mut registry = IdentityRegistry::with_seed(11);
        let document: DiagramDocument = elements.into_iter().collect();
        Converter::new(config, &mapper).convert(&document, &mut registry)
    }

    fn convert(elements: Vec<DiagramElement>) -> Conversion {
        convert_with(&ConversionConfig::default(), elements)
    }

    #[test]
    fn test_line_between_nodes_is_edge() {
        let conversion = convert(vec![node("A", 0.0), node("B", 100.0), line("L", Some("A"), Some("B"))]);

        assert_eq!(conversion.nodes.len(), 2);
        let edge = conversion.edge(Id::new("L")).unwrap();
        assert_eq!((edge.source, edge.target), (Id::new("A"), Id::new("B")));
        assert_eq!(edge.role, EdgeRole::Line);
        assert_eq!(conversion.annotation_count(), 0);
        assert!(conversion.warnings.is_empty());
    }

    #[test]
    fn test_bare_line_is_annotation_without_warning() {
        let conversion = convert(vec![node("A", 0.0), line("L", Some("A"), None)]);

        assert!(conversion.edges.is_empty());
        assert_eq!(conversion.annotation_count(), 1);
        assert!(conversion.warnings.is_empty());
    }

    #[test]
    fn test_line_to_shape_is_annotation() {
        let shape = DiagramElement::shape(Id::new("S"), Point::default(), Size::new(5.0, 5.0));
        let conversion = convert(vec![node("A", 0.0), shape, line("L", Some("A"), Some("S"))]);

        assert!(conversion.edges.is_empty());
        assert_eq!(conversion.annotation_count(), 2);
        assert!(conversion.warnings.is_empty());
    }

    #[test]
    fn test_label_as_node_option() {
        let label = DiagramElement::label(Id::new("T"), Point::default(), Size::new(5.0, 5.0));
        let elements = vec![node("A", 0.0), label, line("L", Some("A"), Some("T"))];

        let default = convert(elements.clone());
        assert_eq!(default.nodes.len(), 1);
        assert!(default.edges.is_empty());

        let config = ConversionConfig::new(true, true);
        let as_node = convert_with(&config, elements);
        assert_eq!(as_node.nodes.len(), 2);
        assert_eq!(as_node.edges.len(), 1);
    }

    #[test]
    fn test_duplicate_id_reassigned() {
        let conversion = convert(vec![node("A", 0.0), node("A", 50.0), node("B", 100.0), line("L", Some("A"), Some("B"))]);

        assert_eq!(conversion.warnings.len(), 1);
        let warning = &conversion.warnings[0];
        assert_eq!(warning.code(), WarningCode::W002);
        assert_ne!(warning.element(), Id::new("A"));

        // The line still attaches to the first holder
        let edge = conversion.edge(Id::new("L")).unwrap();
        assert_eq!(edge.source, Id::new("A"));
        assert_eq!(conversion.node(Id::new("A")).unwrap().position, Point::new(0.0, 0.0));
        assert_eq!(conversion.wrappers.len(), 4);
    }

    #[test]
    fn test_split_line_markers() {
        let arrowed = line("L", Some("A"), Some("B"))
            .with_property(PropertyKey::StartLineType, PropertyValue::from(LineType::TBar))
            .with_property(PropertyKey::EndLineType, PropertyValue::from(LineType::Arrow));
        let conversion = convert(vec![
            node("A", 0.0),
            node("B", 100.0),
            arrowed,
            DiagramElement::anchor(Id::new("m2"), Id::new("L"), 0.75),
            DiagramElement::anchor(Id::new("m1"), Id::new("L"), 0.25),
        ]);

        assert_eq!(conversion.nodes.len(), 4);
        assert_eq!(conversion.edges.len(), 3);
        let anchor = conversion.node(Id::new("m1")).unwrap();
        assert_eq!(anchor.position, Point::new(25.0, 0.0));

        let first = &conversion.edges[0];
        let last = &conversion.edges[2];
        assert_eq!((first.source, first.target), (Id::new("A"), Id::new("m1")));
        assert_eq!((last.source, last.target), (Id::new("m2"), Id::new("B")));
        assert!(first.attributes.contains_key("StartLineType"));
        assert!(!first.attributes.contains_key("EndLineType"));
        assert!(last.attributes.contains_key("EndLineType"));
        assert!(!last.attributes.contains_key("StartLineType"));
    }

    #[test]
    fn test_line_through_anchor_of_edge_line() {
        let conversion = convert(vec![
            node("A", 0.0),
            node("B", 100.0),
            node("C", 50.0),
            line("L1", Some("A"), Some("B")),
            DiagramElement::anchor(Id::new("m"), Id::new("L1"), 0.5),
            line("L2", Some("C"), Some("m")),
        ]);

        let edge = conversion.edge(Id::new("L2")).unwrap();
        assert_eq!(edge.target, Id::new("m"));
        assert_eq!(conversion.annotation_count(), 0);
    }

    #[test]
    fn test_mutually_anchored_lines_terminate() {
        // Each line ends on an anchor of the other and both stay edges
        let conversion = convert(vec![
            node("A", 0.0),
            line("L1", Some("A"), Some("m2")),
            line("L2", Some("A"), Some("m1")),
            DiagramElement::anchor(Id::new("m1"), Id::new("L1"), 0.5),
            DiagramElement::anchor(Id::new("m2"), Id::new("L2"), 0.5),
        ]);

        assert_eq!(conversion.nodes.len(), 3);
        assert_eq!(conversion.edges.len(), 4);
        assert_eq!(conversion.annotation_count(), 0);
    }

    #[test]
    fn test_demotion_cascades_independent_of_order() {
        let elements = vec![
            node("A", 0.0),
            node("B", 100.0),
            line("L1", Some("A"), Some("missing")),
            DiagramElement::anchor(Id::new("m"), Id::new("L1"), 0.5),
            line("L2", Some("B"), Some("m")),
        ];
        let mut reversed = elements.clone();
        reversed.reverse();

        for conversion in [convert(elements), convert(reversed)] {
            assert!(conversion.edges.is_empty());
            assert_eq!(conversion.annotation_count(), 3);
            assert_eq!(conversion.warnings.len(), 1);
        }
    }

    #[test]
    fn test_anchor_with_missing_owner() {
        let conversion = convert(vec![DiagramElement::anchor(Id::new("m"), Id::new("gone"), 0.5)]);

        assert_eq!(conversion.annotation_count(), 1);
        assert!(matches!(
            conversion.warnings[0],
            ConversionWarning::UnresolvedReference {
                field: ReferenceField::Owner,
                ..
            }
        ));
    }

    #[test]
    fn test_known_elements_connect_batch() {
        let mapper = AttributeMapper::new();
        let config = ConversionConfig::default();
        let mut registry = IdentityRegistry::with_seed(3);

        let first: DiagramDocument = [node("A", 0.0), node("B", 100.0)].into_iter().collect();
        let session = Converter::new(&config, &mapper).convert(&first, &mut registry);

        let batch: DiagramDocument = [line("L", Some("A"), Some("B"))].into_iter().collect();
        let conversion = Converter::new(&config, &mapper)
            .with_known_elements(&session.wrappers)
            .convert(&batch, &mut registry);

        assert_eq!(conversion.edges.len(), 1);
        assert!(conversion.nodes.is_empty());
        assert!(conversion.warnings.is_empty());
    }

    #[test]
    fn test_reserved_ids_are_claimed() {
        let mapper = AttributeMapper::new();
        let config = ConversionConfig::default();
        let mut registry = IdentityRegistry::with_seed(3);
        let fresh = registry.allocate();

        let batch: DiagramDocument = [DiagramElement::data_node(fresh, Point::default(), Size::default())]
            .into_iter()
            .collect();
        let conversion = Converter::new(&config, &mapper)
            .with_reserved([fresh])
            .convert(&batch, &mut registry);

        assert!(conversion.warnings.is_empty());
        assert!(conversion.wrappers.contains(fresh));
    }
}
