//! Screen-space overlays for annotation-only elements.
//!
//! Elements without a graph item are still drawn on top of the host view.
//! The [`OverlayManager`] computes one [`Overlay`] per annotation wrapper
//! and hands them to an [`AnnotationSink`] that does the actual drawing.

use indexmap::IndexMap;
use log::trace;

use pathweave_core::{
    geometry::{Bounds, Point},
    identifier::Id,
    model::{ElementKind, Geometry, Properties},
};

use crate::{
    host::HostGraph,
    transform::CoordinateTransform,
    wrapper::{ElementWrapper, WrapperSet},
};

/// Screen-space shape of an overlay, in view units.
#[derive(Debug, Clone, PartialEq)]
pub enum Outline {
    Rect(Bounds),
    Segment { start: Point, end: Point },
    Points(Vec<Point>),
}

/// An annotation to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub element: Id,
    pub outline: Outline,
    /// Live style properties of the element
    pub style: Properties,
}

/// Render callback for overlays.
pub trait AnnotationSink {
    fn draw(&mut self, overlay: &Overlay);

    /// Called before a full redraw.
    fn clear(&mut self) {}
}

/// Overlays of one session.
#[derive(Debug, Clone)]
pub struct OverlayManager {
    visible: bool,
    overlays: IndexMap<Id, Overlay>,
}

impl Default for OverlayManager {
    fn default() -> Self {
        Self::new(true)
    }
}

impl OverlayManager {
    pub fn new(visible: bool) -> Self {
        Self {
            visible,
            overlays: IndexMap::new(),
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn get(&self, element: Id) -> Option<&Overlay> {
        self.overlays.get(&element)
    }

    pub fn overlays(&self) -> impl Iterator<Item = &Overlay> {
        self.overlays.values()
    }

    pub fn len(&self) -> usize {
        self.overlays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overlays.is_empty()
    }

    /// Recomputes every overlay from the annotation wrappers.
    ///
    /// Line ends attached to node-bound elements follow the host's current
    /// node positions.
    pub fn recompute(&mut self, wrappers: &WrapperSet, transform: &CoordinateTransform, host: &impl HostGraph) {
        self.overlays = wrappers
            .iter()
            .filter(|wrapper| wrapper.is_annotation())
            .map(|wrapper| {
                let overlay = Overlay {
                    element: wrapper.id(),
                    outline: outline(wrapper, wrappers, transform, host),
                    style: wrapper.live().properties().clone(),
                };
                (wrapper.id(), overlay)
            })
            .collect();
        trace!(overlays = self.overlays.len(); "Recomputed overlays");
    }

    /// Draws the overlays into `sink`, or only clears it when hidden.
    pub fn render(&self, sink: &mut impl AnnotationSink) {
        sink.clear();
        if !self.visible {
            return;
        }
        for overlay in self.overlays.values() {
            sink.draw(overlay);
        }
    }
}

/// View position of the node bound to `element`, if any.
fn attached_point(element: Option<Id>, wrappers: &WrapperSet, host: &impl HostGraph) -> Option<Point> {
    let node = wrappers.node_of(element?)?;
    host.position(node)
}

fn outline(
    wrapper: &ElementWrapper,
    wrappers: &WrapperSet,
    transform: &CoordinateTransform,
    host: &impl HostGraph,
) -> Outline {
    let live = wrapper.live();
    match *live.geometry() {
        Geometry::Rect { center, size } => Outline::Rect(transform.to_view_bounds(center, size)),
        Geometry::Path { start, end } => {
            let (start_ref, end_ref) = live.line_refs().unwrap_or_default();
            Outline::Segment {
                start: attached_point(start_ref, wrappers, host)
                    .unwrap_or_else(|| transform.to_view(start)),
                end: attached_point(end_ref, wrappers, host)
                    .unwrap_or_else(|| transform.to_view(end)),
            }
        }
        Geometry::Anchored => {
            let point = match *live.kind() {
                ElementKind::Anchor { owner, position } => wrappers
                    .get(owner)
                    .and_then(|line| match *line.live().geometry() {
                        Geometry::Path { start, end } => Some(start.lerp(end, position)),
                        _ => None,
                    }),
                _ => None,
            };
            Outline::Points(point.map(|point| transform.to_view(point)).into_iter().collect())
        }
    }
}
