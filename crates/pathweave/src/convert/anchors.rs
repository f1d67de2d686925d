//! Splitting anchored lines into graph segments, and merging them back.
//!
//! A line passing through N anchors becomes N synthetic anchor nodes joined by
//! N + 1 segment edges:
//!
//! ```text
//!   start ──seg0──▶ anchor0 ──seg1──▶ anchor1 ──seg2──▶ end
//! ```
//!
//! Every segment keeps the style of the line, except that the start marker
//! only survives on the first segment and the end marker only on the last.
//! Segments record their lineage (line id and index) so a chain can be
//! collapsed into the original line.

use log::trace;

use pathweave_core::{
    geometry::Point,
    identifier::Id,
    model::{DiagramElement, ElementKind, Geometry, Properties, PropertyKey},
};

use crate::{
    attributes::{AttributeBag, AttributeMapper, is_reserved},
    error::PathweaveError,
    registry::IdentityRegistry,
};

/// A synthetic node standing for one anchor of a split line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorNode {
    /// Id of the anchor element, also used as the graph node id
    pub id: Id,
    pub position: f32,
}

/// One graph edge of a split line.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub id: Id,
    /// Line this segment was cut from
    pub line: Id,
    pub index: usize,
    pub source: Id,
    pub target: Id,
    /// The segment as a line element: sub-path geometry and the line's style
    pub element: DiagramElement,
}

/// A line expanded into anchor nodes and segments.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitLine {
    line: Id,
    anchors: Vec<AnchorNode>,
    segments: Vec<Segment>,
}

/// A line reassembled from its segments.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedLine {
    pub line: DiagramElement,
    pub anchors: Vec<AnchorNode>,
}

impl SplitLine {
    pub fn line(&self) -> Id {
        self.line
    }

    pub fn anchors(&self) -> &[AnchorNode] {
        &self.anchors
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns the segment with host edge id `id`
    pub fn segment(&self, id: Id) -> Option<&Segment> {
        self.segments.iter().find(|segment| segment.id == id)
    }

    /// Moves an anchor to a new position and reprojects the segments.
    ///
    /// The position is clamped between the neighbouring anchors so the
    /// anchor order never changes.
    pub fn move_anchor(&mut self, anchor: Id, position: f32, line: &DiagramElement) -> Option<f32> {
        let index = self.anchors.iter().position(|node| node.id == anchor)?;
        let low = index
            .checked_sub(1)
            .map_or(0.0, |prev| self.anchors[prev].position);
        let high = self
            .anchors
            .get(index + 1)
            .map_or(1.0, |next| next.position);
        let position = position.clamp(low, high);
        self.anchors[index].position = position;
        self.reproject(line);
        Some(position)
    }

    /// Recomputes the segments from the live line.
    ///
    /// Segment ids are kept. The path, the properties and the outer
    /// endpoints follow the line; an end detached from the line keeps the
    /// last element it was attached to.
    pub fn reproject(&mut self, line: &DiagramElement) {
        let Geometry::Path { start, end } = *line.geometry() else {
            return;
        };
        if let Some((start_ref, end_ref)) = line.line_refs() {
            if let (Some(source), Some(first)) = (start_ref, self.segments.first_mut()) {
                first.source = source;
            }
            if let (Some(target), Some(last)) = (end_ref, self.segments.last_mut()) {
                last.target = target;
            }
        }

        let count = self.segments.len();
        for (index, segment) in self.segments.iter_mut().enumerate() {
            let (from, to) = segment_points(start, end, &self.anchors, index);
            *segment.element.geometry_mut() = Geometry::Path { start: from, end: to };
            *segment.element.kind_mut() = ElementKind::Line {
                start_ref: Some(segment.source),
                end_ref: Some(segment.target),
            };
            let properties = segment_properties(line.properties(), index, count);
            replace_properties(&mut segment.element, properties);
        }
    }
}

fn segment_points(start: Point, end: Point, anchors: &[AnchorNode], index: usize) -> (Point, Point) {
    let from = match index {
        0 => start,
        i => start.lerp(end, anchors[i - 1].position),
    };
    let to = match anchors.get(index) {
        Some(anchor) => start.lerp(end, anchor.position),
        None => end,
    };
    (from, to)
}

fn segment_properties(line: &Properties, index: usize, count: usize) -> Properties {
    let mut properties = line.clone();
    if index != 0 {
        properties.shift_remove(&PropertyKey::StartLineType);
    }
    if index + 1 != count {
        properties.shift_remove(&PropertyKey::EndLineType);
    }
    properties
}

fn replace_properties(element: &mut DiagramElement, properties: Properties) {
    let stale: Vec<_> = element
        .properties()
        .keys()
        .filter(|key| !properties.contains_key(*key))
        .copied()
        .collect();
    for key in stale {
        element.remove_property(key);
    }
    for (key, value) in properties {
        // Segment elements are lines, so every line property applies
        let _ = element.set_property(key, value);
    }
}

/// Splits an anchored line into anchor nodes and segments.
///
/// `anchors` are the anchor elements owned by `line`; they are ordered by
/// position here. Segment ids are the line id for a line without anchors and
/// `line::seg<i>` otherwise, reserved in `registry`.
///
/// # Errors
///
/// Returns [`PathweaveError::BrokenChain`] when `line` is not a line with both
/// ends attached, or an anchor belongs to another line.
pub fn split(
    line: &DiagramElement,
    anchors: &[&DiagramElement],
    registry: &mut IdentityRegistry,
) -> Result<SplitLine, PathweaveError> {
    let line_id = line.id();
    let Some((Some(source), Some(target))) = line.line_refs() else {
        return Err(PathweaveError::broken_chain(line_id, "line ends are not attached"));
    };
    let Geometry::Path { start, end } = *line.geometry() else {
        return Err(PathweaveError::broken_chain(line_id, "line has no path geometry"));
    };

    let mut nodes = Vec::with_capacity(anchors.len());
    for anchor in anchors {
        match anchor.anchor_of() {
            Some((owner, position)) if owner == line_id => nodes.push(AnchorNode {
                id: anchor.id(),
                position,
            }),
            _ => {
                return Err(PathweaveError::broken_chain(
                    line_id,
                    format!("`{}` is not an anchor of this line", anchor.id()),
                ));
            }
        }
    }
    nodes.sort_by(|a, b| a.position.total_cmp(&b.position));

    let count = nodes.len() + 1;
    let mut segments = Vec::with_capacity(count);
    for index in 0..count {
        let id = if nodes.is_empty() {
            line_id
        } else {
            registry.reserve(line_id.create_nested(Id::new(&format!("seg{index}"))))
        };
        let from = index.checked_sub(1).map_or(source, |prev| nodes[prev].id);
        let to = nodes.get(index).map_or(target, |node| node.id);
        let (start_point, end_point) = segment_points(start, end, &nodes, index);

        let mut element = DiagramElement::line(id, start_point, end_point, Some(from), Some(to));
        replace_properties(&mut element, segment_properties(line.properties(), index, count));

        segments.push(Segment {
            id,
            line: line_id,
            index,
            source: from,
            target: to,
            element,
        });
    }
    trace!(line = line_id.to_string(), segments = count; "Split line");

    Ok(SplitLine {
        line: line_id,
        anchors: nodes,
        segments,
    })
}

/// Collapses a chain of segments into the line they were cut from.
///
/// `segments` may come in any order; `anchors` are the recorded anchor nodes
/// in position order.
///
/// # Errors
///
/// Returns [`PathweaveError::BrokenChain`] when the segments do not share one
/// lineage, indices are missing or repeated, or consecutive segments do not
/// meet at the recorded anchors.
pub fn merge_chain(segments: &[Segment], anchors: &[AnchorNode]) -> Result<MergedLine, PathweaveError> {
    let Some(first) = segments.first() else {
        return Err(PathweaveError::broken_chain(Id::new(""), "empty chain"));
    };
    let line_id = first.line;

    let mut ordered: Vec<&Segment> = segments.iter().collect();
    ordered.sort_by_key(|segment| segment.index);

    if ordered.len() != anchors.len() + 1 {
        return Err(PathweaveError::broken_chain(
            line_id,
            format!("{} segments for {} anchors", ordered.len(), anchors.len()),
        ));
    }
    for (expected, segment) in ordered.iter().enumerate() {
        if segment.line != line_id {
            return Err(PathweaveError::broken_chain(
                line_id,
                format!("segment `{}` belongs to line `{}`", segment.id, segment.line),
            ));
        }
        if segment.index != expected {
            return Err(PathweaveError::broken_chain(
                line_id,
                format!("missing or repeated segment index {expected}"),
            ));
        }
    }
    for (anchor, pair) in anchors.iter().zip(ordered.windows(2)) {
        if pair[0].target != anchor.id || pair[1].source != anchor.id {
            return Err(PathweaveError::broken_chain(
                line_id,
                format!("segments do not meet at anchor `{}`", anchor.id),
            ));
        }
    }

    let head = ordered[0];
    let tail = ordered[ordered.len() - 1];
    let (Geometry::Path { start, .. }, Geometry::Path { end, .. }) =
        (*head.element.geometry(), *tail.element.geometry())
    else {
        return Err(PathweaveError::broken_chain(line_id, "segment without path geometry"));
    };

    let mut line = DiagramElement::line(line_id, start, end, Some(head.source), Some(tail.target));
    let mut properties = head.element.properties().clone();
    properties.shift_remove(&PropertyKey::EndLineType);
    if let Some(end_type) = tail.element.properties().get(&PropertyKey::EndLineType) {
        properties.insert(PropertyKey::EndLineType, end_type.clone());
    }
    replace_properties(&mut line, properties);

    Ok(MergedLine {
        line,
        anchors: anchors.to_vec(),
    })
}

/// Folds the host attribute bags of a chain's segments into one bag.
///
/// Style comes from the first segment; the end marker from the last one.
/// Engine attributes are dropped.
pub fn merge_host_attributes(bags: &[AttributeBag], mapper: &AttributeMapper) -> AttributeBag {
    let mut merged: AttributeBag = bags
        .first()
        .map(|bag| {
            bag.iter()
                .filter(|(name, _)| !is_reserved(name))
                .map(|(name, attribute)| (name.clone(), attribute.clone()))
                .collect()
        })
        .unwrap_or_default();

    if bags.len() > 1 {
        let end_name = mapper.attribute_name(PropertyKey::EndLineType);
        merged.shift_remove(end_name);
        if let Some(end) = bags.last().and_then(|bag| bag.get(end_name)) {
            merged.insert(end_name.to_string(), end.clone());
        }
    }
    merged
}


#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use pathweave_core::model::{LineStyle, LineType, PropertyValue};

    use super::*;

    // ===================
    // Strategies
    // ===================

    fn line_type_strategy() -> impl Strategy<Value = LineType> {
        prop::sample::select(LineType::ALL.to_vec())
    }

    fn line_strategy() -> impl Strategy<Value = DiagramElement> {
        (
            (-500.0f32..500.0, -500.0f32..500.0),
            (-500.0f32..500.0, -500.0f32..500.0),
            prop::option::of(line_type_strategy()),
            prop::option::of(line_type_strategy()),
            prop::bool::ANY,
        )
            .prop_map(|((sx, sy), (ex, ey), start_type, end_type, dashed)| {
                let mut line = DiagramElement::line(
                    Id::new("line"),
                    Point::new(sx, sy),
                    Point::new(ex, ey),
                    Some(Id::new("from")),
                    Some(Id::new("to")),
                );
                if let Some(start_type) = start_type {
                    line = line.with_property(PropertyKey::StartLineType, PropertyValue::from(start_type));
                }
                if let Some(end_type) = end_type {
                    line = line.with_property(PropertyKey::EndLineType, PropertyValue::from(end_type));
                }
                if dashed {
                    line = line.with_property(
                        PropertyKey::LineStyle,
                        PropertyValue::LineStyle(LineStyle::Dashed),
                    );
                }
                line
            })
    }

    fn positions_strategy() -> impl Strategy<Value = Vec<f32>> {
        prop::collection::vec(0.0f32..=1.0, 0..=5)
    }

    // ===================
    // Property Test Functions
    // ===================

    /// merge(split(line)) reproduces the line and its anchor positions.
    fn check_split_merge_inverse(
        line: DiagramElement,
        positions: Vec<f32>,
    ) -> Result<(), TestCaseError> {
        let mut registry = IdentityRegistry::with_seed(11);
        let anchors: Vec<_> = positions
            .iter()
            .enumerate()
            .map(|(i, position)| {
                DiagramElement::anchor(Id::new(&format!("anchor{i}")), line.id(), *position)
            })
            .collect();
        let anchor_refs: Vec<_> = anchors.iter().collect();

        let split = split(&line, &anchor_refs, &mut registry).unwrap();
        prop_assert_eq!(split.segments().len(), positions.len() + 1);
        prop_assert_eq!(split.anchors().len(), positions.len());

        let merged = merge_chain(split.segments(), split.anchors()).unwrap();
        prop_assert_eq!(&merged.line, &line);

        let mut expected = positions.clone();
        expected.sort_by(f32::total_cmp);
        let recorded: Vec<_> = merged.anchors.iter().map(|anchor| anchor.position).collect();
        prop_assert_eq!(recorded, expected);
        Ok(())
    }

    /// Consecutive segments meet at the same point.
    fn check_segments_connected(line: DiagramElement, positions: Vec<f32>) -> Result<(), TestCaseError> {
        let mut registry = IdentityRegistry::with_seed(3);
        let anchors: Vec<_> = positions
            .iter()
            .enumerate()
            .map(|(i, position)| DiagramElement::anchor(Id::new(&format!("p{i}")), line.id(), *position))
            .collect();
        let anchor_refs: Vec<_> = anchors.iter().collect();
        let split = split(&line, &anchor_refs, &mut registry).unwrap();

        for pair in split.segments().windows(2) {
            let (Geometry::Path { end, .. }, Geometry::Path { start, .. }) =
                (pair[0].element.geometry(), pair[1].element.geometry())
            else {
                return Err(TestCaseError::fail("segment without path"));
            };
            prop_assert_eq!(end, start);
            prop_assert_eq!(pair[0].target, pair[1].source);
        }
        Ok(())
    }

    // ===================
    // Proptest Wrappers
    // ===================

    proptest! {
        #[test]
        fn split_merge_inverse(line in line_strategy(), positions in positions_strategy()) {
            check_split_merge_inverse(line, positions)?;
        }

        #[test]
        fn segments_connected(line in line_strategy(), positions in positions_strategy()) {
            check_segments_connected(line, positions)?;
        }
    }
}
