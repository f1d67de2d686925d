//! Element wrappers: the unit of synchronization.
//!
//! An [`ElementWrapper`] pairs an immutable *origin* snapshot of a diagram
//! element with a mutable *live* copy, and records which host item the
//! element is bound to. The two sync directions return change sets instead
//! of mutating silently:
//!
//! ```text
//!            sync_from_host                 sync_to_host
//!   host bag ─────────────▶ live copy ─────────────────▶ host bag
//!                              ▲
//!                   reset_to_origin │ rebaseline
//!                              ▼
//!                           origin
//! ```

use indexmap::IndexMap;
use log::{debug, trace};

use pathweave_core::{
    identifier::Id,
    model::{DiagramElement, ElementKind, PropertyKey},
};

use crate::{
    attributes::{
        ANCHOR_POSITION, AttributeBag, AttributeMapper, HostAttribute, HostValue, INTERACTION,
        LINEAGE_INDEX, LINEAGE_LINE, is_reserved,
    },
    convert::anchors::SplitLine,
    error::PathweaveError,
    host::HostGraph,
};

/// Host `interaction` value of an edge standing for a whole line.
pub const LINE_EDGE_TYPE: &str = "line";
/// Host `interaction` value of a segment of a split line.
pub const ANCHOR_EDGE_TYPE: &str = "anchor-connection";
/// Host `interaction` value of a group membership edge.
pub const GROUP_EDGE_TYPE: &str = "group-connection";

/// What an element is bound to.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Binding {
    #[default]
    Unbound,
    /// A graph node
    Node(Id),
    /// A single graph edge
    Edge(Id),
    /// The segments of a line split at its anchors
    Chain(SplitLine),
    /// Overlay-only, no graph item
    Annotation,
}

impl Binding {
    pub fn is_bound(&self) -> bool {
        !matches!(self, Binding::Unbound)
    }

    /// Returns the host items this binding covers.
    pub fn items(&self) -> Vec<Id> {
        match self {
            Binding::Node(id) | Binding::Edge(id) => vec![*id],
            Binding::Chain(split) => split.segments().iter().map(|segment| segment.id).collect(),
            Binding::Unbound | Binding::Annotation => Vec::new(),
        }
    }

    pub fn covers(&self, item: Id) -> bool {
        match self {
            Binding::Node(id) | Binding::Edge(id) => *id == item,
            Binding::Chain(split) => split.segment(item).is_some(),
            Binding::Unbound | Binding::Annotation => false,
        }
    }
}

/// Result of [`ElementWrapper::sync_from_host`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyChanges {
    /// Properties whose live value changed
    pub changed: Vec<PropertyKey>,
    /// Properties present in the host bag but skipped as protected
    pub protected: Vec<PropertyKey>,
    /// Absent properties filled from defaults
    pub defaulted: Vec<PropertyKey>,
    /// Host attributes that map to no applicable property or hold an
    /// unusable value
    pub unmapped: Vec<String>,
}

impl PropertyChanges {
    /// Returns `true` when the live copy was not modified.
    pub fn is_unchanged(&self) -> bool {
        self.changed.is_empty() && self.defaulted.is_empty()
    }
}

/// Attributes for one host item.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemUpdate {
    pub item: Id,
    /// The full attribute bag the item should carry
    pub attributes: AttributeBag,
    /// Names of attributes that differ from the host's current bag
    pub changed: Vec<String>,
}

/// Result of [`ElementWrapper::sync_to_host`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HostUpdate {
    pub items: Vec<ItemUpdate>,
}

impl HostUpdate {
    /// Returns `true` when no host attribute needs to change.
    pub fn is_unchanged(&self) -> bool {
        self.items.iter().all(|item| item.changed.is_empty())
    }

    /// Writes the changed attributes into the host.
    pub fn apply(&self, host: &mut impl HostGraph) -> Result<(), PathweaveError> {
        for item in &self.items {
            for name in &item.changed {
                if let Some(attribute) = item.attributes.get(name) {
                    host.set_attribute(item.item, name, attribute.clone())?;
                }
            }
        }
        Ok(())
    }
}

/// Origin and live copy of one diagram element.
///
/// # Examples
///
/// ```
/// # use pathweave::{attributes::{AttributeBag, AttributeMapper, HostAttribute}, wrapper::{Binding, ElementWrapper}};
/// # use pathweave_core::{geometry::{Point, Size}, identifier::Id, model::{DiagramElement, PropertyKey, PropertyValue}};
/// let mapper = AttributeMapper::new();
/// let node = DiagramElement::data_node(Id::new("n1"), Point::new(0.0, 0.0), Size::new(10.0, 10.0));
/// let mut wrapper = ElementWrapper::new(node);
/// wrapper.bind(Binding::Node(Id::new("n1"))).unwrap();
///
/// let mut bag = AttributeBag::new();
/// bag.insert("canonicalName".to_string(), HostAttribute::visible("ATP"));
/// let changes = wrapper.sync_from_host(&mapper, &bag).unwrap();
///
/// assert_eq!(changes.changed, vec![PropertyKey::TextLabel]);
/// assert_eq!(wrapper.live().property(PropertyKey::TextLabel), Some(PropertyValue::from("ATP")));
/// assert_eq!(wrapper.origin().property(PropertyKey::TextLabel), None);
/// ```
#[derive(Debug, Clone)]
pub struct ElementWrapper {
    origin: DiagramElement,
    live: DiagramElement,
    binding: Binding,
}

impl ElementWrapper {
    /// Creates an unbound wrapper whose origin and live copy are `element`.
    pub fn new(element: DiagramElement) -> Self {
        Self {
            origin: element.clone(),
            live: element,
            binding: Binding::Unbound,
        }
    }

    pub fn id(&self) -> Id {
        self.live.id()
    }

    pub fn origin(&self) -> &DiagramElement {
        &self.origin
    }

    pub fn live(&self) -> &DiagramElement {
        &self.live
    }

    pub fn binding(&self) -> &Binding {
        &self.binding
    }

    pub(crate) fn binding_mut(&mut self) -> &mut Binding {
        &mut self.binding
    }

    pub fn is_annotation(&self) -> bool {
        matches!(self.binding, Binding::Annotation)
    }

    /// Binds the wrapper to its host representation.
    ///
    /// # Errors
    ///
    /// Returns [`PathweaveError::AlreadyBound`] if the wrapper is bound.
    pub fn bind(&mut self, binding: Binding) -> Result<(), PathweaveError> {
        if self.binding.is_bound() {
            return Err(PathweaveError::AlreadyBound(self.id()));
        }
        trace!(element = self.id().to_string(), binding:? = binding; "Binding wrapper");
        self.binding = binding;
        Ok(())
    }

    fn ensure_bound(&self) -> Result<(), PathweaveError> {
        if self.binding.is_bound() {
            Ok(())
        } else {
            Err(PathweaveError::Unbound(self.id()))
        }
    }

    /// Applies host attributes onto the live copy.
    ///
    /// Protected properties are skipped. Defaults fill applicable properties
    /// absent from both `bag` and the live copy. The origin is untouched.
    pub fn sync_from_host(
        &mut self,
        mapper: &AttributeMapper,
        bag: &AttributeBag,
    ) -> Result<PropertyChanges, PathweaveError> {
        self.ensure_bound()?;
        let mut changes = PropertyChanges::default();

        for (name, attribute) in bag {
            if is_reserved(name) {
                continue;
            }
            let Some(key) = mapper.property_for(name) else {
                changes.unmapped.push(name.clone());
                continue;
            };
            if mapper.is_protected(key) {
                changes.protected.push(key);
                continue;
            }
            if !self.live.kind().accepts(key) {
                changes.unmapped.push(name.clone());
                continue;
            }
            let Some((key, value)) = mapper.from_host(name, &attribute.value) else {
                debug!(element = self.id().to_string(), attribute = name.as_str(); "Host value does not fit property");
                changes.unmapped.push(name.clone());
                continue;
            };
            if self.live.property(key).as_ref() == Some(&value) {
                continue;
            }
            match self.live.set_property(key, value) {
                Ok(_) => changes.changed.push(key),
                Err(err) => {
                    debug!(element = self.id().to_string(); "Refused host value: {err}");
                    changes.unmapped.push(name.clone());
                }
            }
        }

        for (key, value) in mapper.defaults() {
            if !self.live.kind().accepts(key)
                || bag.contains_key(mapper.attribute_name(key))
                || self.live.property(key).is_some()
            {
                continue;
            }
            if self.live.set_property(key, value.clone()).is_ok() {
                changes.defaulted.push(key);
            }
        }

        self.reproject();
        Ok(changes)
    }

    /// Computes the attributes every covered host item should carry.
    ///
    /// Engine attributes (edge `interaction`, lineage of segments and anchor
    /// nodes) are included.
    pub fn host_attributes(&self, mapper: &AttributeMapper) -> Vec<(Id, AttributeBag)> {
        match &self.binding {
            Binding::Node(id) => {
                let mut bag = mapper.properties_to_host(&self.live);
                if let ElementKind::Anchor { owner, position } = *self.live.kind() {
                    bag.insert(LINEAGE_LINE.to_string(), HostAttribute::hidden(owner.to_string().as_str()));
                    bag.insert(
                        ANCHOR_POSITION.to_string(),
                        HostAttribute::hidden(HostValue::Float(f64::from(position))),
                    );
                }
                vec![(*id, bag)]
            }
            Binding::Edge(id) => {
                let mut bag = mapper.properties_to_host(&self.live);
                bag.insert(INTERACTION.to_string(), HostAttribute::visible(LINE_EDGE_TYPE));
                vec![(*id, bag)]
            }
            Binding::Chain(split) => split
                .segments()
                .iter()
                .map(|segment| {
                    let mut bag = mapper.properties_to_host(&segment.element);
                    bag.insert(INTERACTION.to_string(), HostAttribute::visible(ANCHOR_EDGE_TYPE));
                    bag.insert(
                        LINEAGE_LINE.to_string(),
                        HostAttribute::hidden(segment.line.to_string().as_str()),
                    );
                    bag.insert(
                        LINEAGE_INDEX.to_string(),
                        HostAttribute::hidden(HostValue::Int(segment.index as i64)),
                    );
                    (segment.id, bag)
                })
                .collect(),
            Binding::Unbound | Binding::Annotation => Vec::new(),
        }
    }

    /// Translates the live copy into host attributes.
    ///
    /// Hidden properties are tagged not visible. Each item update lists the
    /// attributes whose value differs from what `host` currently holds.
    pub fn sync_to_host(
        &self,
        mapper: &AttributeMapper,
        host: &impl HostGraph,
    ) -> Result<HostUpdate, PathweaveError> {
        self.ensure_bound()?;
        let items = self
            .host_attributes(mapper)
            .into_iter()
            .map(|(item, attributes)| {
                let current = host.attributes(item).unwrap_or_default();
                let changed = attributes
                    .iter()
                    .filter(|(name, attribute)| current.get(*name) != Some(*attribute))
                    .map(|(name, _)| name.clone())
                    .collect();
                ItemUpdate {
                    item,
                    attributes,
                    changed,
                }
            })
            .collect();
        Ok(HostUpdate { items })
    }

    /// Discards live edits and returns the attributes to push back.
    pub fn reset_to_origin(
        &mut self,
        mapper: &AttributeMapper,
        host: &impl HostGraph,
    ) -> Result<HostUpdate, PathweaveError> {
        self.live = self.origin.clone();
        self.reproject();
        self.sync_to_host(mapper, host)
    }

    /// Promotes the live copy to be the new origin.
    pub fn rebaseline(&mut self) {
        self.origin = self.live.clone();
    }

    /// Applies a diagram-side edit to the live copy.
    ///
    /// A split line's segments follow the edited line.
    pub fn edit<R>(&mut self, f: impl FnOnce(&mut DiagramElement) -> R) -> R {
        let result = f(&mut self.live);
        self.reproject();
        result
    }

    /// Host edges of the binding as `(edge, source, target)`, with the
    /// endpoints the live copy attaches them to.
    pub(crate) fn host_edges(&self) -> Vec<(Id, Id, Id)> {
        match &self.binding {
            Binding::Edge(id) => match self.live.line_refs() {
                Some((Some(source), Some(target))) => vec![(*id, source, target)],
                _ => Vec::new(),
            },
            Binding::Chain(split) => split
                .segments()
                .iter()
                .map(|segment| (segment.id, segment.source, segment.target))
                .collect(),
            Binding::Unbound | Binding::Node(_) | Binding::Annotation => Vec::new(),
        }
    }

    /// Moves an anchor of a split line, returning its clamped position.
    pub(crate) fn move_anchor(&mut self, anchor: Id, position: f32) -> Option<f32> {
        match &mut self.binding {
            Binding::Chain(split) => split.move_anchor(anchor, position, &self.live),
            _ => None,
        }
    }

    fn reproject(&mut self) {
        if let Binding::Chain(split) = &mut self.binding {
            split.reproject(&self.live);
        }
    }
}

/// Wrappers of a session, in document order, keyed by element id.
#[derive(Debug, Clone, Default)]
pub struct WrapperSet {
    wrappers: IndexMap<Id, ElementWrapper>,
}

impl WrapperSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a wrapper, replacing one with the same element id.
    pub fn insert(&mut self, wrapper: ElementWrapper) -> Option<ElementWrapper> {
        self.wrappers.insert(wrapper.id(), wrapper)
    }

    pub fn get(&self, element: Id) -> Option<&ElementWrapper> {
        self.wrappers.get(&element)
    }

    pub fn get_mut(&mut self, element: Id) -> Option<&mut ElementWrapper> {
        self.wrappers.get_mut(&element)
    }

    /// Returns the wrapper of `element` or [`PathweaveError::UnknownElement`].
    pub fn require(&self, element: Id) -> Result<&ElementWrapper, PathweaveError> {
        self.get(element)
            .ok_or(PathweaveError::UnknownElement(element))
    }

    pub fn require_mut(&mut self, element: Id) -> Result<&mut ElementWrapper, PathweaveError> {
        self.get_mut(element)
            .ok_or(PathweaveError::UnknownElement(element))
    }

    /// Removes a wrapper, keeping the order of the others.
    pub fn remove(&mut self, element: Id) -> Option<ElementWrapper> {
        self.wrappers.shift_remove(&element)
    }

    pub fn contains(&self, element: Id) -> bool {
        self.wrappers.contains_key(&element)
    }

    /// Returns the element bound to host item `item`
    pub fn owner_of(&self, item: Id) -> Option<Id> {
        self.wrappers
            .values()
            .find(|wrapper| wrapper.binding().covers(item))
            .map(ElementWrapper::id)
    }

    /// Returns the host node id of `element`, if it is bound to a node
    pub fn node_of(&self, element: Id) -> Option<Id> {
        match self.get(element)?.binding() {
            Binding::Node(node) => Some(*node),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ElementWrapper> {
        self.wrappers.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ElementWrapper> {
        self.wrappers.values_mut()
    }

    pub fn len(&self) -> usize {
        self.wrappers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wrappers.is_empty()
    }

    /// Counts the overlay-only wrappers
    pub fn annotation_count(&self) -> usize {
        self.iter().filter(|wrapper| wrapper.is_annotation()).count()
    }

    /// Appends every wrapper of `other`.
    pub fn extend(&mut self, other: WrapperSet) {
        self.wrappers.extend(other.wrappers);
    }
}
