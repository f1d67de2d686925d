//! Element arena of a diagram document.
//!
//! [`DiagramDocument`] owns the elements of one diagram in document order.
//! Elements are addressed by a generation-checked [`ElementHandle`]: removing
//! an element bumps the generation of its slot, so an old handle reports
//! [`DocumentError::StaleHandle`] instead of silently resolving to whatever
//! element reuses the slot.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::{
    geometry::Point,
    identifier::Id,
    model::{
        element::{DiagramElement, Geometry},
        property::{PropertyKey, PropertyType},
    },
};

/// Errors raised by the document model.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("stale element handle {0:?}")]
    StaleHandle(ElementHandle),

    #[error("property `{key}` does not apply to {kind} elements")]
    InapplicableProperty { key: PropertyKey, kind: &'static str },

    #[error("property `{key}` expects a {expected} value, got {found}")]
    PropertyTypeMismatch {
        key: PropertyKey,
        expected: PropertyType,
        found: PropertyType,
    },
}

/// Generation-checked reference to an element slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementHandle {
    index: u32,
    generation: u32,
}

#[derive(Debug, Clone, Default)]
struct Slot {
    generation: u32,
    element: Option<DiagramElement>,
}

/// Ordered arena of diagram elements.
///
/// Element ids are expected to be unique; when they are not, id lookups
/// resolve to the first holder in document order.
///
/// # Examples
///
/// ```
/// use pathweave_core::{
///     geometry::{Point, Size},
///     identifier::Id,
///     model::{DiagramDocument, DiagramElement},
/// };
///
/// let mut document = DiagramDocument::new();
/// let handle = document.push(DiagramElement::data_node(
///     Id::new("n1"),
///     Point::new(10.0, 10.0),
///     Size::new(40.0, 20.0),
/// ));
///
/// assert_eq!(document.handle_of(Id::new("n1")), Some(handle));
///
/// document.remove(handle).unwrap();
/// assert!(document.get(handle).is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct DiagramDocument {
    slots: Vec<Slot>,
    free: Vec<u32>,
    order: Vec<ElementHandle>,
    index: HashMap<Id, ElementHandle>,
}

impl DiagramDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an element and returns its handle.
    pub fn push(&mut self, element: DiagramElement) -> ElementHandle {
        let id = element.id();
        let handle = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.element = Some(element);
                ElementHandle {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    element: Some(element),
                });
                ElementHandle {
                    index,
                    generation: 0,
                }
            }
        };
        self.order.push(handle);
        self.index.entry(id).or_insert(handle);
        handle
    }

    fn slot(&self, handle: ElementHandle) -> Option<&Slot> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation && slot.element.is_some())
    }

    /// Returns the element behind `handle`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::StaleHandle`] when the element was removed.
    pub fn get(&self, handle: ElementHandle) -> Result<&DiagramElement, DocumentError> {
        self.slot(handle)
            .and_then(|slot| slot.element.as_ref())
            .ok_or(DocumentError::StaleHandle(handle))
    }

    /// Mutable access to the element behind `handle`.
    ///
    /// Changing the element id through this reference bypasses the id index;
    /// use [`rename`](Self::rename) for that.
    pub fn get_mut(&mut self, handle: ElementHandle) -> Result<&mut DiagramElement, DocumentError> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.element.as_mut())
            .ok_or(DocumentError::StaleHandle(handle))
    }

    /// Removes an element, invalidating its handle.
    pub fn remove(&mut self, handle: ElementHandle) -> Result<DiagramElement, DocumentError> {
        let slot = self
            .slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .ok_or(DocumentError::StaleHandle(handle))?;
        let element = slot
            .element
            .take()
            .ok_or(DocumentError::StaleHandle(handle))?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.order.retain(|held| *held != handle);
        self.unindex(element.id(), handle);
        Ok(element)
    }

    /// Changes the id of an element and updates the id index.
    pub fn rename(&mut self, handle: ElementHandle, id: Id) -> Result<(), DocumentError> {
        let element = self.get_mut(handle)?;
        let old_id = element.id();
        element.set_id(id);
        self.unindex(old_id, handle);
        self.index.entry(id).or_insert(handle);
        Ok(())
    }

    fn unindex(&mut self, id: Id, handle: ElementHandle) {
        if self.index.get(&id) != Some(&handle) {
            return;
        }
        self.index.remove(&id);
        // Another element sharing the id takes over as first holder
        let next = self.order.iter().copied().find(|held| {
            *held != handle && self.get(*held).is_ok_and(|element| element.id() == id)
        });
        if let Some(next) = next {
            self.index.insert(id, next);
        }
    }

    /// Returns the handle of the first element with `id`
    pub fn handle_of(&self, id: Id) -> Option<ElementHandle> {
        self.index.get(&id).copied()
    }

    /// Returns the first element with `id`
    pub fn resolve(&self, id: Id) -> Option<&DiagramElement> {
        self.handle_of(id).and_then(|handle| self.get(handle).ok())
    }

    pub fn contains(&self, id: Id) -> bool {
        self.index.contains_key(&id)
    }

    /// Iterates over handles and elements in document order
    pub fn iter(&self) -> impl Iterator<Item = (ElementHandle, &DiagramElement)> {
        self.order
            .iter()
            .filter_map(|handle| self.get(*handle).ok().map(|element| (*handle, element)))
    }

    /// Iterates over elements in document order
    pub fn elements(&self) -> impl Iterator<Item = &DiagramElement> {
        self.iter().map(|(_, element)| element)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Returns the anchors owned by `line`, sorted by position.
    ///
    /// Anchors at equal positions keep their document order.
    pub fn anchors_of(&self, line: Id) -> Vec<&DiagramElement> {
        let mut anchors: Vec<_> = self
            .elements()
            .filter(|element| element.anchor_of().is_some_and(|(owner, _)| owner == line))
            .collect();
        anchors.sort_by(|a, b| {
            let a = a.anchor_of().map(|(_, position)| position).unwrap_or_default();
            let b = b.anchor_of().map(|(_, position)| position).unwrap_or_default();
            a.total_cmp(&b)
        });
        anchors
    }

    /// Returns the elements whose `group_ref` names `group`, in document order
    pub fn members_of(&self, group: Id) -> Vec<&DiagramElement> {
        self.elements()
            .filter(|element| element.group_ref() == Some(group))
            .collect()
    }

    /// Computes the model-space point of an anchor from its owning line.
    pub fn anchor_point(&self, anchor: &DiagramElement) -> Option<Point> {
        let (owner, position) = anchor.anchor_of()?;
        match self.resolve(owner)?.geometry() {
            Geometry::Path { start, end } => Some(start.lerp(*end, position)),
            _ => None,
        }
    }
}

impl FromIterator<DiagramElement> for DiagramDocument {
    fn from_iter<T: IntoIterator<Item = DiagramElement>>(iter: T) -> Self {
        let mut document = Self::new();
        for element in iter {
            document.push(element);
        }
        document
    }
}

impl PartialEq for DiagramDocument {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.elements().eq(other.elements())
    }
}

impl Serialize for DiagramDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.elements())
    }
}

impl<'de> Deserialize<'de> for DiagramDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let elements = Vec::<DiagramElement>::deserialize(deserializer)?;
        Ok(elements.into_iter().collect())
    }
}
