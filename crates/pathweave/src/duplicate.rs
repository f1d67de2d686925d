//! Id remapping for copy/paste and document merge.

use std::collections::HashSet;

use indexmap::IndexMap;
use log::debug;

use pathweave_core::{
    identifier::Id,
    model::{DiagramElement, ElementKind},
};

use crate::registry::IdentityRegistry;

/// Rewrites the reference fields of an element through `map`.
///
/// `map` returns the new target, or `None` to clear the reference. An
/// anchor's owner is only replaced, never cleared.
pub(crate) fn rewrite_references(element: &mut DiagramElement, mut map: impl FnMut(Id) -> Option<Id>) {
    match element.kind_mut() {
        ElementKind::Line { start_ref, end_ref } => {
            *start_ref = start_ref.and_then(&mut map);
            *end_ref = end_ref.and_then(&mut map);
        }
        ElementKind::Anchor { owner, .. } => {
            if let Some(target) = map(*owner) {
                *owner = target;
            }
        }
        _ => {}
    }
    let group_ref = element.group_ref().and_then(&mut map);
    element.set_group_ref(group_ref);
}

/// Copies `elements` under fresh ids, disjoint from every id of the scope.
///
/// References between copied elements are rewritten to the new ids;
/// references to elements outside the subset are cleared, and anchors whose
/// owning line is not copied are dropped. Later holders of an id repeated in
/// the subset get their own fresh id.
///
/// # Examples
///
/// ```
/// # use pathweave::{duplicate::remap_for_duplication, registry::IdentityRegistry};
/// # use pathweave_core::{geometry::{Point, Size}, identifier::Id, model::DiagramElement};
/// let mut registry = IdentityRegistry::with_seed(3);
/// registry.reserve(Id::new("A"));
/// registry.reserve(Id::new("L"));
///
/// let copies = remap_for_duplication(
///     &mut registry,
///     &[
///         DiagramElement::data_node(Id::new("A"), Point::new(0.0, 0.0), Size::new(10.0, 10.0)),
///         DiagramElement::line(Id::new("L"), Point::new(0.0, 0.0), Point::new(9.0, 0.0), Some(Id::new("A")), Some(Id::new("Z"))),
///     ],
/// );
///
/// let node = copies[0].id();
/// assert_ne!(node, "A");
/// assert_eq!(copies[1].line_refs(), Some((Some(node), None)));
/// ```
pub fn remap_for_duplication(registry: &mut IdentityRegistry, elements: &[DiagramElement]) -> Vec<DiagramElement> {
    let subset: HashSet<Id> = elements.iter().map(DiagramElement::id).collect();
    let kept: Vec<&DiagramElement> = elements
        .iter()
        .filter(|element| {
            element
                .anchor_of()
                .is_none_or(|(owner, _)| subset.contains(&owner))
        })
        .collect();

    let mapping = registry.remap(
        kept.iter()
            .map(|element| element.id())
            .filter(|id| !id.is_empty()),
    );

    let mut claimed = HashSet::new();
    let copies: Vec<DiagramElement> = kept
        .into_iter()
        .map(|element| {
            let mut copy = element.clone();
            let id = match mapping.get(&element.id()) {
                Some(fresh) if claimed.insert(*fresh) => *fresh,
                _ => registry.allocate(),
            };
            copy.set_id(id);
            rewrite_references(&mut copy, |target| mapping.get(&target).copied());
            copy
        })
        .collect();

    debug!(requested = elements.len(), copied = copies.len(); "Remapped elements for duplication");
    copies
}

/// Remaps the ids of `elements` that are already allocated in `registry`.
///
/// References inside the batch follow the remapped ids; references to other
/// ids are left alone so they can resolve to elements of the scope. Returns
/// the elements and the ids allocated by the remap.
pub(crate) fn remap_colliding(
    registry: &mut IdentityRegistry,
    elements: &[DiagramElement],
) -> (Vec<DiagramElement>, Vec<Id>) {
    let mapping: IndexMap<Id, Id> = registry.remap(
        elements
            .iter()
            .map(DiagramElement::id)
            .filter(|id| !id.is_empty() && registry.is_allocated(*id))
            .collect::<Vec<_>>(),
    );

    let remapped = elements
        .iter()
        .map(|element| {
            let mut element = element.clone();
            if let Some(fresh) = mapping.get(&element.id()) {
                element.set_id(*fresh);
            }
            rewrite_references(&mut element, |target| {
                Some(mapping.get(&target).copied().unwrap_or(target))
            });
            element
        })
        .collect();

    if !mapping.is_empty() {
        debug!(remapped = mapping.len(); "Remapped colliding ids");
    }
    (remapped, mapping.into_values().collect())
}
