//! Integration tests for the SyncBuilder and SyncSession API
//!
//! Each test drives a session against the in-memory host the way a graph
//! application would.

use float_cmp::assert_approx_eq;

use pathweave::{
    SyncBuilder,
    attributes::{HostAttribute, HostValue},
    config::{AppConfig, AttributeConfig, ConversionConfig, ViewConfig},
    geometry::{Point, Size},
    host::{HostGraph, MemoryGraph},
    identifier::Id,
    model::{DiagramDocument, DiagramElement, ElementKind, PropertyKey, PropertyValue},
    overlay::{AnnotationSink, Outline, Overlay},
    warning::{ConversionWarning, ReferenceField},
};

fn node(id: &str, x: f32) -> DiagramElement {
    DiagramElement::data_node(Id::new(id), Point::new(x, 0.0), Size::new(20.0, 10.0))
}

fn line(id: &str, start: &str, end: &str) -> DiagramElement {
    DiagramElement::line(
        Id::new(id),
        Point::new(0.0, 0.0),
        Point::new(100.0, 0.0),
        Some(Id::new(start)),
        Some(Id::new(end)),
    )
}

fn two_nodes_and_line() -> DiagramDocument {
    [node("A", 0.0), node("B", 100.0), line("L", "A", "B")]
        .into_iter()
        .collect()
}

fn anchored_with_spare_node() -> DiagramDocument {
    [
        node("A", 0.0),
        node("B", 100.0),
        node("C", 200.0),
        line("L", "A", "B"),
        DiagramElement::anchor(Id::new("m"), Id::new("L"), 0.5),
    ]
    .into_iter()
    .collect()
}

fn set_anchor_position(live: &mut DiagramElement, to: f32) {
    if let ElementKind::Anchor { position, .. } = live.kind_mut() {
        *position = to;
    }
}

fn load(document: &DiagramDocument) -> (pathweave::session::SyncSession, MemoryGraph, Vec<ConversionWarning>) {
    let mut host = MemoryGraph::new();
    let (session, warnings) = SyncBuilder::default()
        .with_seed(5)
        .load(document, &mut host)
        .expect("Failed to load document");
    (session, host, warnings)
}

#[derive(Default)]
struct Collected(Vec<Overlay>);

impl AnnotationSink for Collected {
    fn draw(&mut self, overlay: &Overlay) {
        self.0.push(overlay.clone());
    }

    fn clear(&mut self) {
        self.0.clear();
    }
}

#[test]
fn test_line_between_two_nodes() {
    let (session, host, warnings) = load(&two_nodes_and_line());

    assert_eq!(host.node_count(), 2);
    assert_eq!(host.edge_count(), 1);
    assert_eq!(session.wrappers().annotation_count(), 0);
    assert!(warnings.is_empty());
}

#[test]
fn test_anchored_line_split_into_segments() {
    let mut document = two_nodes_and_line();
    document.push(DiagramElement::anchor(Id::new("m"), Id::new("L"), 0.5));

    let (_session, host, warnings) = load(&document);

    assert!(warnings.is_empty());
    assert_eq!(host.node_count(), 3);
    assert_eq!(host.edge_count(), 2);

    let first = Id::new("L").create_nested(Id::new("seg0"));
    let second = Id::new("L").create_nested(Id::new("seg1"));
    assert_eq!(host.edge_endpoints(first), Some((Id::new("A"), Id::new("m"))));
    assert_eq!(host.edge_endpoints(second), Some((Id::new("m"), Id::new("B"))));
    assert_eq!(host.position(Id::new("m")), Some(Point::new(50.0, 0.0)));
}

#[test]
fn test_shape_becomes_positioned_annotation() {
    let document: DiagramDocument = [DiagramElement::shape(
        Id::new("S"),
        Point::new(40.0, 20.0),
        Size::new(10.0, 6.0),
    )]
    .into_iter()
    .collect();
    let config = AppConfig::new(
        ConversionConfig::default(),
        ViewConfig::new(2.0, 1.0, true),
        AttributeConfig::default(),
    );

    let mut host = MemoryGraph::new();
    let (session, _) = SyncBuilder::new(config)
        .load(&document, &mut host)
        .expect("Failed to load document");

    assert_eq!(host.node_count(), 0);
    assert_eq!(session.wrappers().annotation_count(), 1);

    let mut sink = Collected::default();
    session.render_annotations(&mut sink);
    assert_eq!(sink.0.len(), 1);
    let Outline::Rect(bounds) = sink.0[0].outline else {
        panic!("shape overlay should be a rectangle");
    };
    assert_approx_eq!(f32, bounds.center().x(), 80.0);
    assert_approx_eq!(f32, bounds.center().y(), 40.0);
    assert_approx_eq!(f32, bounds.width(), 20.0);
}

#[test]
fn test_dangling_line_reported_and_kept() {
    let document: DiagramDocument = [node("A", 0.0), line("L", "A", "nowhere")]
        .into_iter()
        .collect();

    let (session, host, warnings) = load(&document);

    assert_eq!(host.edge_count(), 0);
    assert_eq!(session.wrappers().annotation_count(), 1);
    assert_eq!(
        warnings,
        vec![ConversionWarning::UnresolvedReference {
            element: Id::new("L"),
            field: ReferenceField::EndRef,
            target: Id::new("nowhere"),
        }]
    );
    assert_eq!(session.export().unwrap(), document);
}

#[test]
fn test_group_members_get_membership_edges() {
    let document: DiagramDocument = [
        DiagramElement::group(Id::new("G"), Point::new(50.0, 0.0), Size::new(200.0, 40.0)),
        node("A", 0.0).with_group(Id::new("G")),
        node("B", 100.0).with_group(Id::new("G")),
    ]
    .into_iter()
    .collect();

    let (session, host, warnings) = load(&document);

    assert!(warnings.is_empty());
    assert_eq!(host.node_count(), 3);
    assert_eq!(host.edge_count(), 2);
    assert_eq!(host.outgoing(Id::new("G")).len(), 2);
    assert_eq!(session.memberships().count(), 2);
}

#[test]
fn test_duplicate_document_remaps_references() {
    let document = two_nodes_and_line();
    let (mut session, mut host, _) = load(&document);
    let elements: Vec<DiagramElement> = document.elements().cloned().collect();

    let pasted = session
        .paste(&elements, &mut host)
        .expect("Failed to paste elements");

    assert_eq!(pasted.len(), 3);
    for id in &pasted {
        assert!(!document.contains(*id), "pasted id {id} collides");
    }
    let exported = session.export().unwrap();
    let copy = exported.resolve(pasted[2]).unwrap();
    assert_eq!(copy.line_refs(), Some((Some(pasted[0]), Some(pasted[1]))));
}

#[test]
fn test_export_after_load_returns_document() {
    let mut document = two_nodes_and_line();
    document.push(DiagramElement::anchor(Id::new("m"), Id::new("L"), 0.25));
    document.push(DiagramElement::label(Id::new("T"), Point::new(5.0, 5.0), Size::new(8.0, 4.0)));

    let (session, _, _) = load(&document);

    assert_eq!(session.export().unwrap(), document);
}

#[test]
fn test_one_wrapper_per_element() {
    let mut document = two_nodes_and_line();
    document.push(DiagramElement::anchor(Id::new("m"), Id::new("L"), 0.5));
    document.push(DiagramElement::shape(Id::new("S"), Point::default(), Size::default()));
    document.push(line("X", "A", "missing"));

    let (session, _, _) = load(&document);

    assert_eq!(session.wrappers().len(), document.len());
}

#[test]
fn test_protected_property_survives_host_edit() {
    let document: DiagramDocument = [node("A", 0.0)
        .with_property(PropertyKey::Comments, PropertyValue::Text("curated".to_string()))]
    .into_iter()
    .collect();
    let (mut session, mut host, _) = load(&document);

    let name = session.mapper().attribute_name(PropertyKey::Comments).to_string();
    host.set_attribute(Id::new("A"), &name, HostAttribute::visible("overwritten"))
        .unwrap();
    let changes = session.sync_from_host(Id::new("A"), &mut host).unwrap();

    assert!(changes.protected.contains(&PropertyKey::Comments));
    assert!(changes.changed.is_empty());
    assert_eq!(
        session.wrapper(Id::new("A")).unwrap().live().property(PropertyKey::Comments),
        Some(PropertyValue::Text("curated".to_string()))
    );
}

#[test]
fn test_host_edit_reaches_export() {
    let (mut session, mut host, _) = load(&two_nodes_and_line());

    let name = session.mapper().attribute_name(PropertyKey::TextLabel).to_string();
    host.set_attribute(Id::new("B"), &name, HostAttribute::visible("Pyruvate"))
        .unwrap();
    let changes = session.sync_from_host(Id::new("B"), &mut host).unwrap();
    assert_eq!(changes.changed, vec![PropertyKey::TextLabel]);
    assert_eq!(changes.defaulted, vec![PropertyKey::DataSource]);

    // Only the defaulted property goes back, once
    let update = session.sync_to_host(Id::new("B"), &mut host).unwrap();
    assert_eq!(update.items.len(), 1);
    assert_eq!(update.items[0].changed.len(), 1);
    assert!(session.sync_to_host(Id::new("B"), &mut host).unwrap().is_unchanged());

    let exported = session.export().unwrap();
    assert_eq!(
        exported.resolve(Id::new("B")).unwrap().property(PropertyKey::TextLabel),
        Some(PropertyValue::Text("Pyruvate".to_string()))
    );
    assert_eq!(
        host.attribute(Id::new("B"), &name).map(|attribute| &attribute.value),
        Some(&HostValue::Str("Pyruvate".to_string()))
    );
}

#[test]
fn test_sessions_are_independent() {
    let document = two_nodes_and_line();
    let (mut first, mut first_host, _) = load(&document);
    let (second, second_host, _) = load(&document);

    first.remove_from_host(Id::new("L"), &mut first_host).unwrap();

    assert!(!first.registry().is_allocated(Id::new("L")));
    assert!(second.registry().is_allocated(Id::new("L")));
    assert_eq!(second_host.edge_count(), 1);
    assert_eq!(second.export().unwrap(), document);
}

#[test]
fn test_retargeted_split_line_reaches_export_and_host() {
    let (mut session, mut host, _) = load(&anchored_with_spare_node());

    session
        .edit(Id::new("L"), |live| {
            if let ElementKind::Line { end_ref, .. } = live.kind_mut() {
                *end_ref = Some(Id::new("C"));
            }
        })
        .unwrap();

    let exported = session.export().unwrap();
    assert_eq!(
        exported.resolve(Id::new("L")).unwrap().line_refs(),
        Some((Some(Id::new("A")), Some(Id::new("C"))))
    );

    session.sync_to_host(Id::new("L"), &mut host).unwrap();
    let first = Id::new("L").create_nested(Id::new("seg0"));
    let last = Id::new("L").create_nested(Id::new("seg1"));
    assert_eq!(host.edge_endpoints(first), Some((Id::new("A"), Id::new("m"))));
    assert_eq!(host.edge_endpoints(last), Some((Id::new("m"), Id::new("C"))));
    assert_eq!(host.edge_count(), 2);
    assert!(host.incoming(Id::new("B")).is_empty());
}

#[test]
fn test_retargeted_line_reconnects_host_edge() {
    let mut document = two_nodes_and_line();
    document.push(node("C", 200.0));
    let (mut session, mut host, _) = load(&document);

    session
        .edit(Id::new("L"), |live| {
            if let ElementKind::Line { start_ref, .. } = live.kind_mut() {
                *start_ref = Some(Id::new("C"));
            }
        })
        .unwrap();
    session.sync_to_host(Id::new("L"), &mut host).unwrap();

    assert_eq!(host.edge_endpoints(Id::new("L")), Some((Id::new("C"), Id::new("B"))));
    assert_eq!(
        session.export().unwrap().resolve(Id::new("L")).unwrap().line_refs(),
        Some((Some(Id::new("C")), Some(Id::new("B"))))
    );
}

#[test]
fn test_anchor_edit_reaches_export_and_host() {
    let (mut session, mut host, _) = load(&anchored_with_spare_node());

    session
        .edit(Id::new("m"), |live| set_anchor_position(live, 0.8))
        .unwrap();

    let exported = session.export().unwrap();
    assert_eq!(
        exported.resolve(Id::new("m")).unwrap().anchor_of(),
        Some((Id::new("L"), 0.8))
    );

    session.sync_to_host(Id::new("m"), &mut host).unwrap();
    let placed = host.position(Id::new("m")).unwrap();
    assert_approx_eq!(f32, placed.x(), 80.0);
    assert_approx_eq!(f32, placed.y(), 0.0);
}

#[test]
fn test_anchor_edit_clamped_between_neighbours() {
    let mut document = anchored_with_spare_node();
    document.push(DiagramElement::anchor(Id::new("n"), Id::new("L"), 0.6));
    let (mut session, _host, _) = load(&document);

    session
        .edit(Id::new("m"), |live| set_anchor_position(live, 0.9))
        .unwrap();

    assert_eq!(
        session.wrapper(Id::new("m")).unwrap().live().anchor_of(),
        Some((Id::new("L"), 0.6))
    );
    let exported = session.export().unwrap();
    assert_eq!(
        exported.resolve(Id::new("m")).unwrap().anchor_of(),
        Some((Id::new("L"), 0.6))
    );
}
