//! The synchronization context of one document.
//!
//! A [`SyncSession`] owns everything that belongs to one open document: the
//! identity registry, the wrapper set, membership edges, the coordinate
//! transform, the overlays and the message queue. Sessions share nothing, and
//! every operation that touches the graph takes the host explicitly.

use std::{collections::HashSet, sync::mpsc::Sender};

use indexmap::IndexMap;
use log::{debug, info, trace, warn};

use pathweave_core::{
    geometry::Point,
    identifier::Id,
    model::{DiagramDocument, DiagramElement, ElementKind, Geometry},
};

use crate::{
    attributes::{AttributeBag, AttributeMapper},
    config::{AppConfig, ConversionConfig},
    convert::{
        self, Conversion, Converter, GraphEdge, GraphNode, Membership, NodeRole,
        anchors::merge_host_attributes,
    },
    duplicate::{remap_colliding, remap_for_duplication, rewrite_references},
    error::PathweaveError,
    host::HostGraph,
    overlay::{AnnotationSink, OverlayManager},
    queue::{SyncMessage, SyncQueue},
    registry::IdentityRegistry,
    transform::CoordinateTransform,
    warning::ConversionWarning,
    wrapper::{Binding, ElementWrapper, HostUpdate, PropertyChanges, WrapperSet},
};

/// Synchronization state of one document.
///
/// # Examples
///
/// ```
/// # use pathweave::{config::AppConfig, host::{HostGraph, MemoryGraph}, session::SyncSession};
/// # use pathweave_core::{geometry::{Point, Size}, identifier::Id, model::{DiagramDocument, DiagramElement}};
/// let document: DiagramDocument = [
///     DiagramElement::data_node(Id::new("A"), Point::new(0.0, 0.0), Size::new(20.0, 10.0)),
///     DiagramElement::shape(Id::new("S"), Point::new(40.0, 40.0), Size::new(10.0, 10.0)),
/// ]
/// .into_iter()
/// .collect();
///
/// let mut host = MemoryGraph::new();
/// let mut session = SyncSession::new(&AppConfig::default()).unwrap();
/// let warnings = session.load(&document, &mut host).unwrap();
///
/// assert!(warnings.is_empty());
/// assert_eq!(host.node_count(), 1);
/// assert_eq!(session.overlays().len(), 1);
/// assert_eq!(session.export().unwrap(), document);
/// ```
#[derive(Debug)]
pub struct SyncSession {
    conversion: ConversionConfig,
    mapper: AttributeMapper,
    seed: Option<u64>,
    registry: IdentityRegistry,
    wrappers: WrapperSet,
    memberships: IndexMap<Id, Membership>,
    transform: CoordinateTransform,
    overlays: OverlayManager,
    queue: SyncQueue,
    warnings: Vec<ConversionWarning>,
    pending: IndexMap<Id, DiagramElement>,
}

fn fresh_registry(seed: Option<u64>) -> IdentityRegistry {
    seed.map_or_else(IdentityRegistry::new, IdentityRegistry::with_seed)
}

impl SyncSession {
    /// Creates an empty session.
    ///
    /// # Errors
    ///
    /// Fails when the attribute section names unknown properties or holds
    /// unusable defaults, or when the view scale is invalid.
    pub fn new(config: &AppConfig) -> Result<Self, PathweaveError> {
        Self::build(config, None)
    }

    /// Creates an empty session whose generated ids are deterministic.
    pub fn with_seed(config: &AppConfig, seed: u64) -> Result<Self, PathweaveError> {
        Self::build(config, Some(seed))
    }

    fn build(config: &AppConfig, seed: Option<u64>) -> Result<Self, PathweaveError> {
        let view = config.view();
        Ok(Self {
            conversion: config.conversion().clone(),
            mapper: AttributeMapper::from_config(config.attributes())?,
            seed,
            registry: fresh_registry(seed),
            wrappers: WrapperSet::new(),
            memberships: IndexMap::new(),
            transform: CoordinateTransform::new(view.zoom(), view.model_units_per_pixel())?,
            overlays: OverlayManager::new(view.show_annotations()),
            queue: SyncQueue::new(),
            warnings: Vec::new(),
            pending: IndexMap::new(),
        })
    }

    pub fn mapper(&self) -> &AttributeMapper {
        &self.mapper
    }

    /// Gives access to the attribute policies of this session
    pub fn mapper_mut(&mut self) -> &mut AttributeMapper {
        &mut self.mapper
    }

    pub fn registry(&self) -> &IdentityRegistry {
        &self.registry
    }

    pub fn wrappers(&self) -> &WrapperSet {
        &self.wrappers
    }

    pub fn wrapper(&self, element: Id) -> Option<&ElementWrapper> {
        self.wrappers.get(element)
    }

    pub fn memberships(&self) -> impl Iterator<Item = &Membership> {
        self.memberships.values()
    }

    pub fn transform(&self) -> &CoordinateTransform {
        &self.transform
    }

    pub fn overlays(&self) -> &OverlayManager {
        &self.overlays
    }

    /// Warnings of every conversion since the last load
    pub fn warnings(&self) -> &[ConversionWarning] {
        &self.warnings
    }

    /// Returns `true` for an inserted element still waiting for its wrapper.
    pub fn is_pending(&self, element: Id) -> bool {
        self.pending.contains_key(&element)
    }

    /// Replaces the session content with `document`.
    ///
    /// Every host item the session created is removed first. Returns the
    /// warnings of the conversion.
    pub fn load(
        &mut self,
        document: &DiagramDocument,
        host: &mut impl HostGraph,
    ) -> Result<Vec<ConversionWarning>, PathweaveError> {
        info!(elements = document.len(); "Loading document");
        self.teardown(host, &HashSet::new())?;
        let conversion =
            Converter::new(&self.conversion, &self.mapper).convert(document, &mut self.registry);
        self.apply(conversion, host)
    }

    /// Rebuilds the session from `document`, keeping the host nodes of
    /// groups that are still present so the host can reuse them.
    pub fn reload(
        &mut self,
        document: &DiagramDocument,
        host: &mut impl HostGraph,
    ) -> Result<Vec<ConversionWarning>, PathweaveError> {
        let keep: HashSet<Id> = self
            .wrappers
            .iter()
            .filter(|wrapper| matches!(wrapper.live().kind(), ElementKind::Group))
            .filter_map(|wrapper| self.wrappers.node_of(wrapper.id()))
            .filter(|node| {
                document
                    .resolve(*node)
                    .is_some_and(|element| matches!(element.kind(), ElementKind::Group))
            })
            .collect();
        info!(elements = document.len(), reused_groups = keep.len(); "Reloading document");

        self.teardown(host, &keep)?;
        let conversion = Converter::new(&self.conversion, &self.mapper)
            .with_existing_host_nodes(keep)
            .convert(document, &mut self.registry);
        self.apply(conversion, host)
    }

    /// Adds the elements of `document` to the session.
    ///
    /// Ids already used in the session are remapped. References that name
    /// no element of `document` resolve against the session.
    pub fn merge(
        &mut self,
        document: &DiagramDocument,
        host: &mut impl HostGraph,
    ) -> Result<Vec<ConversionWarning>, PathweaveError> {
        let elements: Vec<DiagramElement> = document.elements().cloned().collect();
        let (elements, reserved) = remap_colliding(&mut self.registry, &elements);
        info!(elements = elements.len(), remapped = reserved.len(); "Merging document");
        self.convert_batch(elements, reserved, host)
    }

    /// Pastes copies of `elements` under fresh ids and returns the new ids.
    pub fn paste(
        &mut self,
        elements: &[DiagramElement],
        host: &mut impl HostGraph,
    ) -> Result<Vec<Id>, PathweaveError> {
        let copies = remap_for_duplication(&mut self.registry, elements);
        let ids: Vec<Id> = copies.iter().map(DiagramElement::id).collect();
        info!(elements = ids.len(); "Pasting elements");
        self.convert_batch(copies, ids.clone(), host)?;
        Ok(ids)
    }

    /// Adds an element without creating its wrapper yet.
    ///
    /// The element keeps its id when free. The wrapper and graph item are
    /// created on the first [`sync_to_host`](Self::sync_to_host) of the
    /// element. Returns the final id.
    pub fn insert_element(&mut self, mut element: DiagramElement) -> Id {
        let id = self.registry.reserve(element.id());
        element.set_id(id);
        trace!(element = id.to_string(); "Element pending");
        self.pending.insert(id, element);
        id
    }

    /// Applies a diagram-side edit to the live copy of `element`.
    ///
    /// An anchor of a split line is moved within its line's chain, clamped
    /// between its neighbouring anchors. The host follows on the next
    /// [`sync_to_host`](Self::sync_to_host).
    pub fn edit<R>(
        &mut self,
        element: Id,
        f: impl FnOnce(&mut DiagramElement) -> R,
    ) -> Result<R, PathweaveError> {
        if let Some(pending) = self.pending.get_mut(&element) {
            return Ok(f(pending));
        }
        let wrapper = self.wrappers.require_mut(element)?;
        let result = wrapper.edit(f);
        if let Some((owner, position)) = wrapper.live().anchor_of() {
            self.follow_anchor(element, owner, position);
        }
        Ok(result)
    }

    /// Pulls the host attributes of `element` into its live copy.
    pub fn sync_from_host(
        &mut self,
        element: Id,
        host: &mut impl HostGraph,
    ) -> Result<PropertyChanges, PathweaveError> {
        let bag = {
            let wrapper = self.wrappers.require(element)?;
            host_bag(wrapper.binding(), &self.mapper, &*host)?
        };
        let wrapper = self.wrappers.require_mut(element)?;
        let changes = wrapper.sync_from_host(&self.mapper, &bag)?;

        // Keep every segment of a split line in step with the edited one
        if matches!(wrapper.binding(), Binding::Chain(_)) {
            wrapper.sync_to_host(&self.mapper, &*host)?.apply(host)?;
        }
        debug!(element = element.to_string(), changed = changes.changed.len(); "Synced from host");
        self.refresh_overlays(&*host);
        Ok(changes)
    }

    /// Pushes the live copy of `element` to the host.
    ///
    /// A pending element is converted first, together with the pending
    /// elements it refers to and the anchors it owns.
    pub fn sync_to_host(
        &mut self,
        element: Id,
        host: &mut impl HostGraph,
    ) -> Result<HostUpdate, PathweaveError> {
        if self.pending.contains_key(&element) {
            self.flush_pending(element, host)?;
        }
        self.reconnect(element, host)?;
        let update = self
            .wrappers
            .require(element)?
            .sync_to_host(&self.mapper, &*host)?;
        update.apply(host)?;

        let anchor = self.wrappers.require(element)?.live().anchor_of();
        if let (Some((owner, position)), Some(_)) = (anchor, self.wrappers.node_of(element)) {
            self.place_anchor(element, owner, position, host)?;
        }
        debug!(element = element.to_string(), items = update.items.len(); "Synced to host");
        self.refresh_overlays(&*host);
        Ok(update)
    }

    /// Discards the live edits of `element` and restores it in the host.
    pub fn reset_to_origin(
        &mut self,
        element: Id,
        host: &mut impl HostGraph,
    ) -> Result<HostUpdate, PathweaveError> {
        let wrapper = self.wrappers.require_mut(element)?;
        let update = wrapper.reset_to_origin(&self.mapper, &*host)?;
        update.apply(host)?;

        let node = self.wrappers.node_of(element);
        let live = self.wrappers.require(element)?.live();
        match (node, *live.geometry(), *live.kind()) {
            (Some(node), Geometry::Rect { center, .. }, _) => {
                host.set_position(node, self.transform.to_view(center))?;
                self.follow_node(element, center, host)?;
            }
            (Some(_), _, ElementKind::Anchor { owner, position }) => {
                self.place_anchor(element, owner, position, host)?;
            }
            _ => {}
        }
        self.refresh_overlays(&*host);
        Ok(update)
    }

    /// Makes the live copy of `element` its new origin.
    pub fn rebaseline(&mut self, element: Id) -> Result<(), PathweaveError> {
        self.wrappers.require_mut(element)?.rebaseline();
        Ok(())
    }

    pub fn rebaseline_all(&mut self) {
        for wrapper in self.wrappers.iter_mut() {
            wrapper.rebaseline();
        }
    }

    /// Applies a host layout change of `node`, given in view units.
    ///
    /// A moved anchor node slides along its line; its new position is
    /// written back to the host.
    pub fn node_moved(
        &mut self,
        node: Id,
        position: Point,
        host: &mut impl HostGraph,
    ) -> Result<(), PathweaveError> {
        let element = self
            .wrappers
            .owner_of(node)
            .ok_or(PathweaveError::UnknownElement(node))?;
        let model = self.transform.to_model(position);
        trace!(node = node.to_string(), position:? = model; "Node moved");

        match self.wrappers.require(element)?.live().anchor_of() {
            Some((line, _)) => {
                let fraction = self.project_on_line(line, model)?;
                self.place_anchor(element, line, fraction, host)?;
            }
            None => {
                let wrapper = self.wrappers.require_mut(element)?;
                wrapper.edit(|live| {
                    if let Geometry::Rect { center, .. } = live.geometry_mut() {
                        *center = model;
                    }
                });
                wrapper.sync_to_host(&self.mapper, &*host)?.apply(host)?;
                self.follow_node(element, model, host)?;
            }
        }
        self.refresh_overlays(&*host);
        Ok(())
    }

    /// Handles the removal of a host item.
    ///
    /// The wrapper of the owning element is destroyed and its ids released.
    /// Removing a segment or anchor node dissolves the whole split line;
    /// removing a node also destroys the lines whose edges went with it.
    /// Removing a membership edge only ungroups the member. Returns the
    /// destroyed elements.
    pub fn remove_from_host(
        &mut self,
        item: Id,
        host: &mut impl HostGraph,
    ) -> Result<Vec<Id>, PathweaveError> {
        if let Some(membership) = self.memberships.shift_remove(&item) {
            if host.contains_edge(item) {
                host.remove_edge(item)?;
            }
            self.registry.release(item);
            if let Some(member) = self.wrappers.get_mut(membership.member) {
                member.edit(|live| {
                    if live.group_ref() == Some(membership.group) {
                        live.set_group_ref(None);
                    }
                });
            }
            info!(group = membership.group.to_string(), member = membership.member.to_string(); "Ungrouped element");
            self.refresh_overlays(&*host);
            return Ok(Vec::new());
        }

        let first = self
            .wrappers
            .owner_of(item)
            .ok_or(PathweaveError::UnknownElement(item))?;
        let mut removed = Vec::new();
        let mut queue = vec![first];

        while let Some(element) = queue.pop() {
            let Some(wrapper) = self.wrappers.remove(element) else {
                continue;
            };
            for id in wrapper.binding().items() {
                if host.contains_edge(id) {
                    host.remove_edge(id)?;
                }
                if host.contains_node(id) {
                    host.remove_node(id)?;
                }
            }

            queue.extend(
                self.wrappers
                    .iter()
                    .filter(|other| other.live().anchor_of().is_some_and(|(owner, _)| owner == element))
                    .map(ElementWrapper::id),
            );
            if let Binding::Chain(split) = wrapper.binding() {
                for segment in split.segments().iter().filter(|segment| segment.id != element) {
                    self.registry.release(segment.id);
                }
            }
            if let Some((owner, _)) = wrapper.live().anchor_of() {
                if matches!(self.wrappers.get(owner).map(ElementWrapper::binding), Some(Binding::Chain(_))) {
                    queue.push(owner);
                }
            }

            let touching: Vec<Id> = self
                .memberships
                .values()
                .filter(|membership| membership.group == element || membership.member == element)
                .map(|membership| membership.id)
                .collect();
            for id in touching {
                self.memberships.shift_remove(&id);
                self.registry.release(id);
                if host.contains_edge(id) {
                    host.remove_edge(id)?;
                }
            }

            for other in self.wrappers.iter_mut() {
                other.edit(|live| rewrite_references(live, |target| (target != element).then_some(target)));
            }
            for other in self.wrappers.iter() {
                if !is_present(other.binding(), &*host) && !queue.contains(&other.id()) {
                    queue.push(other.id());
                }
            }

            self.registry.release(element);
            removed.push(element);
        }

        info!(item = item.to_string(), removed = removed.len(); "Removed elements");
        self.refresh_overlays(&*host);
        Ok(removed)
    }

    /// Changes the zoom and repositions every host node.
    pub fn set_zoom(&mut self, zoom: f64, host: &mut impl HostGraph) -> Result<(), PathweaveError> {
        self.transform.set_zoom(zoom)?;
        let positions: Vec<(Id, Point)> = self
            .wrappers
            .iter()
            .filter_map(|wrapper| match wrapper.binding() {
                Binding::Node(node) => self.model_position(wrapper).map(|point| (*node, point)),
                _ => None,
            })
            .collect();
        for (node, point) in positions {
            host.set_position(node, self.transform.to_view(point))?;
        }
        debug!(zoom = zoom, nodes = self.wrappers.len(); "Zoom changed");
        self.refresh_overlays(&*host);
        Ok(())
    }

    pub fn set_annotations_visible(&mut self, visible: bool) {
        self.overlays.set_visible(visible);
    }

    pub fn render_annotations(&self, sink: &mut impl AnnotationSink) {
        self.overlays.render(sink);
    }

    /// Reconstitutes the document from the wrappers, followed by the
    /// elements still pending.
    pub fn export(&self) -> Result<DiagramDocument, PathweaveError> {
        let mut document = convert::export(&self.wrappers)?;
        for element in self.pending.values() {
            document.push(element.clone());
        }
        Ok(document)
    }

    /// Returns a producer handle of the session queue.
    pub fn sender(&self) -> Sender<SyncMessage> {
        self.queue.sender()
    }

    /// Applies every queued message in order and returns how many applied.
    ///
    /// A message that fails is logged and dropped.
    pub fn process_queue(&mut self, host: &mut impl HostGraph) -> usize {
        let mut applied = 0;
        for message in self.queue.drain() {
            match self.apply_message(message, host) {
                Ok(()) => applied += 1,
                Err(err) => warn!("Dropping queued message: {err}"),
            }
        }
        applied
    }

    fn apply_message(&mut self, message: SyncMessage, host: &mut impl HostGraph) -> Result<(), PathweaveError> {
        match message {
            SyncMessage::SetProperty { element, key, value } => {
                self.edit(element, |live| live.set_property(key, value))??;
                self.sync_to_host(element, host)?;
            }
            SyncMessage::HostEdited { element } => {
                self.sync_from_host(element, host)?;
            }
        }
        Ok(())
    }

    fn refresh_overlays(&mut self, host: &impl HostGraph) {
        self.overlays.recompute(&self.wrappers, &self.transform, host);
    }

    /// Removes every host item of the session and resets its state.
    fn teardown(&mut self, host: &mut impl HostGraph, keep: &HashSet<Id>) -> Result<(), PathweaveError> {
        for membership in self.memberships.values() {
            if host.contains_edge(membership.id) {
                host.remove_edge(membership.id)?;
            }
        }
        for wrapper in self.wrappers.iter() {
            if !matches!(wrapper.binding(), Binding::Node(_)) {
                for id in wrapper.binding().items() {
                    if host.contains_edge(id) {
                        host.remove_edge(id)?;
                    }
                }
            }
        }
        for wrapper in self.wrappers.iter() {
            if let Binding::Node(node) = wrapper.binding() {
                if !keep.contains(node) && host.contains_node(*node) {
                    host.remove_node(*node)?;
                }
            }
        }

        self.wrappers = WrapperSet::new();
        self.memberships.clear();
        self.pending.clear();
        self.warnings.clear();
        self.registry = fresh_registry(self.seed);
        Ok(())
    }

    /// Creates the graph items of a conversion and adopts its wrappers.
    fn apply(
        &mut self,
        conversion: Conversion,
        host: &mut impl HostGraph,
    ) -> Result<Vec<ConversionWarning>, PathweaveError> {
        let Conversion {
            nodes,
            edges,
            wrappers,
            memberships,
            warnings,
        } = conversion;

        let mut created = CreatedItems::default();
        if let Err(err) = self.create_items(&nodes, &edges, host, &mut created) {
            warn!(nodes = created.nodes.len(), edges = created.edges.len(); "Rolling back conversion: {err}");
            created.remove_from(host);
            for wrapper in wrappers.iter() {
                for item in wrapper.binding().items() {
                    self.registry.release(item);
                }
                self.registry.release(wrapper.id());
            }
            for membership in &memberships {
                self.registry.release(membership.id);
            }
            self.refresh_overlays(&*host);
            return Err(err);
        }

        debug!(nodes = nodes.len(), edges = edges.len(), wrappers = wrappers.len(); "Applied conversion");
        self.wrappers.extend(wrappers);
        self.memberships
            .extend(memberships.into_iter().map(|membership| (membership.id, membership)));
        self.warnings.extend(warnings.iter().cloned());
        self.refresh_overlays(&*host);
        Ok(warnings)
    }

    /// Creates the host items of a conversion, recording each one in
    /// `created` as it goes.
    fn create_items(
        &self,
        nodes: &[GraphNode],
        edges: &[GraphEdge],
        host: &mut impl HostGraph,
        created: &mut CreatedItems,
    ) -> Result<(), PathweaveError> {
        for node in nodes {
            let reused = matches!(node.role, NodeRole::Group { reused: true }) && host.contains_node(node.id);
            if !reused {
                host.create_node(node.id, self.transform.to_view(node.position))?;
                created.nodes.push(node.id);
            }
            set_attributes(host, node.id, &node.attributes)?;
        }
        for edge in edges {
            host.create_edge(edge.id, edge.source, edge.target)?;
            created.edges.push(edge.id);
            set_attributes(host, edge.id, &edge.attributes)?;
        }
        Ok(())
    }

    /// Converts elements joining the live session.
    fn convert_batch(
        &mut self,
        elements: Vec<DiagramElement>,
        reserved: Vec<Id>,
        host: &mut impl HostGraph,
    ) -> Result<Vec<ConversionWarning>, PathweaveError> {
        let document: DiagramDocument = elements.into_iter().collect();
        let conversion = Converter::new(&self.conversion, &self.mapper)
            .with_known_elements(&self.wrappers)
            .with_existing_memberships(
                self.memberships
                    .values()
                    .map(|membership| (membership.group, membership.member)),
            )
            .with_reserved(reserved)
            .convert(&document, &mut self.registry);
        self.apply(conversion, host)
    }

    /// Converts `element` with the pending elements it depends on.
    fn flush_pending(&mut self, element: Id, host: &mut impl HostGraph) -> Result<(), PathweaveError> {
        let mut selected = HashSet::new();
        let mut stack = vec![element];
        while let Some(id) = stack.pop() {
            let Some(pending) = self.pending.get(&id) else {
                continue;
            };
            if !selected.insert(id) {
                continue;
            }
            if let Some((start, end)) = pending.line_refs() {
                stack.extend(start.into_iter().chain(end));
            }
            if let Some((owner, _)) = pending.anchor_of() {
                stack.push(owner);
            }
            stack.extend(pending.group_ref());
            stack.extend(
                self.pending
                    .values()
                    .filter(|other| other.anchor_of().is_some_and(|(owner, _)| owner == id))
                    .map(DiagramElement::id),
            );
        }

        let ids: Vec<Id> = self
            .pending
            .keys()
            .copied()
            .filter(|id| selected.contains(id))
            .collect();
        let elements: Vec<DiagramElement> = ids
            .iter()
            .filter_map(|id| self.pending.shift_remove(id))
            .collect();
        debug!(element = element.to_string(), batch = ids.len(); "Creating wrappers for pending elements");
        if let Err(err) = self.convert_batch(elements.clone(), ids, host) {
            // Back to pending under the same ids
            for element in elements {
                let id = self.registry.reserve(element.id());
                self.pending.insert(id, element);
            }
            return Err(err);
        }
        Ok(())
    }

    /// Model position of a node-bound element.
    fn model_position(&self, wrapper: &ElementWrapper) -> Option<Point> {
        match *wrapper.live().kind() {
            ElementKind::Anchor { owner, position } => match *self.wrappers.get(owner)?.live().geometry() {
                Geometry::Path { start, end } => Some(start.lerp(end, position)),
                _ => None,
            },
            _ => wrapper.live().geometry().center(),
        }
    }

    /// Fraction along `line` of the point closest to `point`.
    fn project_on_line(&self, line: Id, point: Point) -> Result<f32, PathweaveError> {
        let Geometry::Path { start, end } = *self.wrappers.require(line)?.live().geometry() else {
            return Ok(0.0);
        };
        let direction = end.sub_point(start);
        let length_sq = direction.x() * direction.x() + direction.y() * direction.y();
        if length_sq <= f32::EPSILON {
            return Ok(0.0);
        }
        let offset = point.sub_point(start);
        let fraction = (offset.x() * direction.x() + offset.y() * direction.y()) / length_sq;
        Ok(fraction.clamp(0.0, 1.0))
    }

    /// Moves `anchor` within the chain of its split line `owner`.
    ///
    /// The clamped position is written back to the anchor's live copy.
    fn follow_anchor(&mut self, anchor: Id, owner: Id, position: f32) {
        let Some(clamped) = self
            .wrappers
            .get_mut(owner)
            .and_then(|line| line.move_anchor(anchor, position))
        else {
            return;
        };
        if clamped != position {
            if let Some(wrapper) = self.wrappers.get_mut(anchor) {
                wrapper.edit(|live| {
                    if let ElementKind::Anchor { position: current, .. } = live.kind_mut() {
                        *current = clamped;
                    }
                });
            }
        }
        trace!(anchor = anchor.to_string(), position = clamped; "Anchor moved in chain");
    }

    /// Re-creates the host edges of `element` whose endpoints no longer
    /// match its live copy.
    fn reconnect(&mut self, element: Id, host: &mut impl HostGraph) -> Result<(), PathweaveError> {
        for (edge, source, target) in self.wrappers.require(element)?.host_edges() {
            let Some(current) = host.edge_endpoints(edge) else {
                continue;
            };
            if current == (source, target) {
                continue;
            }
            for endpoint in [source, target] {
                if !host.contains_node(endpoint) {
                    return Err(PathweaveError::Host(format!(
                        "edge `{edge}`: `{endpoint}` is not a graph node"
                    )));
                }
            }
            host.remove_edge(edge)?;
            host.create_edge(edge, source, target)?;
            debug!(edge = edge.to_string(), source = source.to_string(), target = target.to_string(); "Reconnected edge");
        }
        Ok(())
    }

    /// Moves an anchor of a split line and updates the host to match.
    fn place_anchor(
        &mut self,
        anchor: Id,
        line: Id,
        fraction: f32,
        host: &mut impl HostGraph,
    ) -> Result<(), PathweaveError> {
        let line_wrapper = self.wrappers.require_mut(line)?;
        let Some(position) = line_wrapper.move_anchor(anchor, fraction) else {
            return Ok(());
        };
        let Geometry::Path { start, end } = *line_wrapper.live().geometry() else {
            return Ok(());
        };
        line_wrapper.sync_to_host(&self.mapper, &*host)?.apply(host)?;

        let point = start.lerp(end, position);
        let anchor_wrapper = self.wrappers.require_mut(anchor)?;
        anchor_wrapper.edit(|live| {
            if let ElementKind::Anchor { position: current, .. } = live.kind_mut() {
                *current = position;
            }
        });
        anchor_wrapper.sync_to_host(&self.mapper, &*host)?.apply(host)?;
        if host.contains_node(anchor) {
            host.set_position(anchor, self.transform.to_view(point))?;
        }
        self.follow_node(anchor, point, host)
    }

    /// Moves the ends of lines attached to `element` to `point`.
    ///
    /// Anchor nodes of those lines are repositioned in the host; lines
    /// attached to them are left alone.
    fn follow_node(&mut self, element: Id, point: Point, host: &mut impl HostGraph) -> Result<(), PathweaveError> {
        let attached: Vec<(Id, bool, bool)> = self
            .wrappers
            .iter()
            .filter_map(|wrapper| {
                let (start, end) = wrapper.live().line_refs()?;
                let (at_start, at_end) = (start == Some(element), end == Some(element));
                (at_start || at_end).then_some((wrapper.id(), at_start, at_end))
            })
            .collect();

        for (line, at_start, at_end) in attached {
            let wrapper = self.wrappers.require_mut(line)?;
            wrapper.edit(|live| {
                if let Geometry::Path { start, end } = live.geometry_mut() {
                    if at_start {
                        *start = point;
                    }
                    if at_end {
                        *end = point;
                    }
                }
            });
            if !wrapper.binding().is_bound() || wrapper.is_annotation() {
                continue;
            }
            wrapper.sync_to_host(&self.mapper, &*host)?.apply(host)?;

            if let (Binding::Chain(split), Geometry::Path { start, end }) =
                (wrapper.binding(), *wrapper.live().geometry())
            {
                for anchor in split.anchors() {
                    if host.contains_node(anchor.id) {
                        host.set_position(anchor.id, self.transform.to_view(start.lerp(end, anchor.position)))?;
                    }
                }
            }
        }
        Ok(())
    }
}

/// Host items created while applying a conversion.
#[derive(Debug, Default)]
struct CreatedItems {
    nodes: Vec<Id>,
    edges: Vec<Id>,
}

impl CreatedItems {
    /// Removes the recorded items, edges first. Failures are logged; the
    /// error that caused the rollback is the one reported.
    fn remove_from(self, host: &mut impl HostGraph) {
        for edge in self.edges.into_iter().rev() {
            if host.contains_edge(edge) {
                if let Err(err) = host.remove_edge(edge) {
                    warn!(edge = edge.to_string(); "Cannot roll back edge: {err}");
                }
            }
        }
        for node in self.nodes.into_iter().rev() {
            if host.contains_node(node) {
                if let Err(err) = host.remove_node(node) {
                    warn!(node = node.to_string(); "Cannot roll back node: {err}");
                }
            }
        }
    }
}

/// Current host attributes of a binding, folded into one bag.
fn host_bag(binding: &Binding, mapper: &AttributeMapper, host: &impl HostGraph) -> Result<AttributeBag, PathweaveError> {
    let missing = |id: Id| PathweaveError::Host(format!("host has no item `{id}`"));
    match binding {
        Binding::Node(id) | Binding::Edge(id) => host.attributes(*id).ok_or_else(|| missing(*id)),
        Binding::Chain(split) => {
            let bags = split
                .segments()
                .iter()
                .map(|segment| host.attributes(segment.id).ok_or_else(|| missing(segment.id)))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(merge_host_attributes(&bags, mapper))
        }
        Binding::Annotation | Binding::Unbound => Ok(AttributeBag::new()),
    }
}

fn is_present(binding: &Binding, host: &impl HostGraph) -> bool {
    match binding {
        Binding::Node(id) => host.contains_node(*id),
        Binding::Edge(id) => host.contains_edge(*id),
        Binding::Chain(split) => split
            .segments()
            .iter()
            .all(|segment| host.contains_edge(segment.id)),
        Binding::Annotation | Binding::Unbound => true,
    }
}

fn set_attributes(host: &mut impl HostGraph, id: Id, attributes: &AttributeBag) -> Result<(), PathweaveError> {
    for (name, attribute) in attributes {
        host.set_attribute(id, name, attribute.clone())?;
    }
    Ok(())
}
