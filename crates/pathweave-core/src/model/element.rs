//! Diagram elements.
//!
//! A [`DiagramElement`] is one object of a pathway diagram: a data node, a
//! label, a shape, an info box, a group, a line or an anchor on a line. The
//! [`ElementKind`] carries the kind-specific references, [`Geometry`] the
//! placement in model units, and the property map everything else.

use log::warn;
use serde::{Deserialize, Deserializer, Serialize};

use crate::{
    geometry::{Point, Size},
    identifier::Id,
    model::{
        document::DocumentError,
        property::{Properties, PropertyKey, PropertyValue},
    },
};

/// Closed set of element kinds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ElementKind {
    DataNode,
    Label,
    Shape,
    InfoBox,
    Group,
    /// A connector, optionally attached to other elements at either end
    Line {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        start_ref: Option<Id>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        end_ref: Option<Id>,
    },
    /// A waypoint on its owning line, at a fraction of the line's length
    Anchor {
        owner: Id,
        #[serde(deserialize_with = "deserialize_fraction")]
        position: f32,
    },
}

fn deserialize_fraction<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f32, D::Error> {
    let position = f32::deserialize(deserializer)?;
    Ok(clamp_fraction(position))
}

fn clamp_fraction(position: f32) -> f32 {
    if position.is_nan() {
        0.0
    } else {
        position.clamp(0.0, 1.0)
    }
}

const DATA_NODE_KEYS: &[PropertyKey] = &[
    PropertyKey::TextLabel,
    PropertyKey::Color,
    PropertyKey::FillColor,
    PropertyKey::FontSize,
    PropertyKey::LineThickness,
    PropertyKey::LineStyle,
    PropertyKey::ShapeType,
    PropertyKey::DataNodeType,
    PropertyKey::DataSource,
    PropertyKey::Identifier,
    PropertyKey::Comments,
    PropertyKey::ZOrder,
    PropertyKey::Transparent,
    PropertyKey::CenterX,
    PropertyKey::CenterY,
    PropertyKey::Width,
    PropertyKey::Height,
];

const LABEL_KEYS: &[PropertyKey] = &[
    PropertyKey::TextLabel,
    PropertyKey::Color,
    PropertyKey::FillColor,
    PropertyKey::FontSize,
    PropertyKey::LineThickness,
    PropertyKey::LineStyle,
    PropertyKey::ShapeType,
    PropertyKey::Comments,
    PropertyKey::ZOrder,
    PropertyKey::Transparent,
    PropertyKey::CenterX,
    PropertyKey::CenterY,
    PropertyKey::Width,
    PropertyKey::Height,
];

const SHAPE_KEYS: &[PropertyKey] = &[
    PropertyKey::TextLabel,
    PropertyKey::Color,
    PropertyKey::FillColor,
    PropertyKey::FontSize,
    PropertyKey::LineThickness,
    PropertyKey::LineStyle,
    PropertyKey::ShapeType,
    PropertyKey::Comments,
    PropertyKey::ZOrder,
    PropertyKey::Rotation,
    PropertyKey::Transparent,
    PropertyKey::CenterX,
    PropertyKey::CenterY,
    PropertyKey::Width,
    PropertyKey::Height,
];

const INFO_BOX_KEYS: &[PropertyKey] = &[
    PropertyKey::ZOrder,
    PropertyKey::CenterX,
    PropertyKey::CenterY,
    PropertyKey::Width,
    PropertyKey::Height,
];

const GROUP_KEYS: &[PropertyKey] = &[
    PropertyKey::TextLabel,
    PropertyKey::Color,
    PropertyKey::FillColor,
    PropertyKey::LineStyle,
    PropertyKey::Comments,
    PropertyKey::ZOrder,
    PropertyKey::CenterX,
    PropertyKey::CenterY,
    PropertyKey::Width,
    PropertyKey::Height,
];

const LINE_KEYS: &[PropertyKey] = &[
    PropertyKey::Color,
    PropertyKey::LineThickness,
    PropertyKey::LineStyle,
    PropertyKey::StartLineType,
    PropertyKey::EndLineType,
    PropertyKey::Comments,
    PropertyKey::ZOrder,
    PropertyKey::StartX,
    PropertyKey::StartY,
    PropertyKey::EndX,
    PropertyKey::EndY,
];

const ANCHOR_KEYS: &[PropertyKey] = &[PropertyKey::ShapeType, PropertyKey::Comments];

impl ElementKind {
    /// Creates an anchor kind with its position clamped into `[0, 1]`.
    pub fn anchor(owner: Id, position: f32) -> Self {
        Self::Anchor {
            owner,
            position: clamp_fraction(position),
        }
    }

    /// Returns the keys an element of this kind accepts
    pub fn applicable_keys(&self) -> &'static [PropertyKey] {
        match self {
            Self::DataNode => DATA_NODE_KEYS,
            Self::Label => LABEL_KEYS,
            Self::Shape => SHAPE_KEYS,
            Self::InfoBox => INFO_BOX_KEYS,
            Self::Group => GROUP_KEYS,
            Self::Line { .. } => LINE_KEYS,
            Self::Anchor { .. } => ANCHOR_KEYS,
        }
    }

    pub fn accepts(&self, key: PropertyKey) -> bool {
        self.applicable_keys().contains(&key)
    }

    /// Returns the kind name used in logs and diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            Self::DataNode => "DataNode",
            Self::Label => "Label",
            Self::Shape => "Shape",
            Self::InfoBox => "InfoBox",
            Self::Group => "Group",
            Self::Line { .. } => "Line",
            Self::Anchor { .. } => "Anchor",
        }
    }
}

/// Placement of an element in model units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    /// Box-shaped elements, positioned by their center
    Rect { center: Point, size: Size },
    /// Lines, from start to end point
    Path { start: Point, end: Point },
    /// Anchors; the point is derived from the owning line
    Anchored,
}

impl Geometry {
    fn read(&self, key: PropertyKey) -> Option<f64> {
        let value = match (self, key) {
            (Self::Rect { center, .. }, PropertyKey::CenterX) => center.x(),
            (Self::Rect { center, .. }, PropertyKey::CenterY) => center.y(),
            (Self::Rect { size, .. }, PropertyKey::Width) => size.width(),
            (Self::Rect { size, .. }, PropertyKey::Height) => size.height(),
            (Self::Path { start, .. }, PropertyKey::StartX) => start.x(),
            (Self::Path { start, .. }, PropertyKey::StartY) => start.y(),
            (Self::Path { end, .. }, PropertyKey::EndX) => end.x(),
            (Self::Path { end, .. }, PropertyKey::EndY) => end.y(),
            _ => return None,
        };
        Some(f64::from(value))
    }

    fn write(&mut self, key: PropertyKey, value: f64) -> bool {
        let value = value as f32;
        match (self, key) {
            (Self::Rect { center, .. }, PropertyKey::CenterX) => *center = center.with_x(value),
            (Self::Rect { center, .. }, PropertyKey::CenterY) => *center = center.with_y(value),
            (Self::Rect { size, .. }, PropertyKey::Width) => *size = size.with_width(value),
            (Self::Rect { size, .. }, PropertyKey::Height) => *size = size.with_height(value),
            (Self::Path { start, .. }, PropertyKey::StartX) => *start = start.with_x(value),
            (Self::Path { start, .. }, PropertyKey::StartY) => *start = start.with_y(value),
            (Self::Path { end, .. }, PropertyKey::EndX) => *end = end.with_x(value),
            (Self::Path { end, .. }, PropertyKey::EndY) => *end = end.with_y(value),
            _ => return false,
        }
        true
    }

    /// Returns the center of a rectangle or the midpoint of a path
    pub fn center(&self) -> Option<Point> {
        match self {
            Self::Rect { center, .. } => Some(*center),
            Self::Path { start, end } => Some(start.lerp(*end, 0.5)),
            Self::Anchored => None,
        }
    }
}

/// One object of a pathway diagram.
///
/// # Examples
///
/// ```
/// use pathweave_core::{
///     geometry::{Point, Size},
///     identifier::Id,
///     model::{DiagramElement, PropertyKey, PropertyValue},
/// };
///
/// let node = DiagramElement::data_node(Id::new("n1"), Point::new(100.0, 50.0), Size::new(80.0, 20.0))
///     .with_property(PropertyKey::TextLabel, PropertyValue::from("ATP"));
///
/// assert_eq!(node.property(PropertyKey::TextLabel), Some(PropertyValue::from("ATP")));
/// assert_eq!(node.property(PropertyKey::CenterX), Some(PropertyValue::Double(100.0)));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagramElement {
    id: Id,
    kind: ElementKind,
    geometry: Geometry,
    #[serde(default, skip_serializing_if = "Properties::is_empty")]
    properties: Properties,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    group_ref: Option<Id>,
}

impl DiagramElement {
    pub fn new(id: Id, kind: ElementKind, geometry: Geometry) -> Self {
        Self {
            id,
            kind,
            geometry,
            properties: Properties::new(),
            group_ref: None,
        }
    }

    /// Creates a data node centered at `center`
    pub fn data_node(id: Id, center: Point, size: Size) -> Self {
        Self::new(id, ElementKind::DataNode, Geometry::Rect { center, size })
    }

    /// Creates a free-floating label centered at `center`
    pub fn label(id: Id, center: Point, size: Size) -> Self {
        Self::new(id, ElementKind::Label, Geometry::Rect { center, size })
    }

    /// Creates a shape centered at `center`
    pub fn shape(id: Id, center: Point, size: Size) -> Self {
        Self::new(id, ElementKind::Shape, Geometry::Rect { center, size })
    }

    /// Creates a group whose bounds are centered at `center`
    pub fn group(id: Id, center: Point, size: Size) -> Self {
        Self::new(id, ElementKind::Group, Geometry::Rect { center, size })
    }

    /// Creates the info box of a diagram
    pub fn info_box(id: Id, center: Point) -> Self {
        Self::new(
            id,
            ElementKind::InfoBox,
            Geometry::Rect {
                center,
                size: Size::default(),
            },
        )
    }

    /// Creates a line from `start` to `end` attached to the given elements
    pub fn line(
        id: Id,
        start: Point,
        end: Point,
        start_ref: Option<Id>,
        end_ref: Option<Id>,
    ) -> Self {
        Self::new(
            id,
            ElementKind::Line { start_ref, end_ref },
            Geometry::Path { start, end },
        )
    }

    /// Creates an anchor on line `owner` at fraction `position` of its length
    pub fn anchor(id: Id, owner: Id, position: f32) -> Self {
        Self::new(id, ElementKind::anchor(owner, position), Geometry::Anchored)
    }

    /// Sets a property, logging and ignoring a refused one.
    pub fn with_property(mut self, key: PropertyKey, value: PropertyValue) -> Self {
        if let Err(err) = self.set_property(key, value) {
            warn!(id = self.id.to_string(); "Ignoring property: {err}");
        }
        self
    }

    pub fn with_group(mut self, group_ref: Id) -> Self {
        self.group_ref = Some(group_ref);
        self
    }

    pub fn id(&self) -> Id {
        self.id
    }

    /// Changes the element id.
    ///
    /// A document indexes its elements by id; use
    /// [`DiagramDocument::rename`](crate::model::DiagramDocument::rename) for
    /// elements that already live in one.
    pub fn set_id(&mut self, id: Id) {
        self.id = id;
    }

    pub fn kind(&self) -> &ElementKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut ElementKind {
        &mut self.kind
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn geometry_mut(&mut self) -> &mut Geometry {
        &mut self.geometry
    }

    pub fn group_ref(&self) -> Option<Id> {
        self.group_ref
    }

    pub fn set_group_ref(&mut self, group_ref: Option<Id>) {
        self.group_ref = group_ref;
    }

    pub fn is_line(&self) -> bool {
        matches!(self.kind, ElementKind::Line { .. })
    }

    /// Returns the `(start_ref, end_ref)` pair of a line
    pub fn line_refs(&self) -> Option<(Option<Id>, Option<Id>)> {
        match self.kind {
            ElementKind::Line { start_ref, end_ref } => Some((start_ref, end_ref)),
            _ => None,
        }
    }

    /// Returns the owning line and position of an anchor
    pub fn anchor_of(&self) -> Option<(Id, f32)> {
        match self.kind {
            ElementKind::Anchor { owner, position } => Some((owner, position)),
            _ => None,
        }
    }

    /// Reads a property.
    ///
    /// Geometry-derived keys are computed from the geometry; all other keys
    /// come from the stored properties.
    pub fn property(&self, key: PropertyKey) -> Option<PropertyValue> {
        if key.is_geometric() {
            return self.geometry.read(key).map(PropertyValue::Double);
        }
        self.properties.get(&key).cloned()
    }

    /// Sets a property, returning the previous value.
    ///
    /// # Errors
    ///
    /// Refuses keys the element kind does not accept and values of the wrong
    /// type. The element is unchanged on error.
    pub fn set_property(
        &mut self,
        key: PropertyKey,
        value: PropertyValue,
    ) -> Result<Option<PropertyValue>, DocumentError> {
        if !self.kind.accepts(key) {
            return Err(DocumentError::InapplicableProperty {
                key,
                kind: self.kind.name(),
            });
        }
        if value.property_type() != key.property_type() {
            return Err(DocumentError::PropertyTypeMismatch {
                key,
                expected: key.property_type(),
                found: value.property_type(),
            });
        }

        if key.is_geometric() {
            let previous = self.property(key);
            let number = value.as_f64().unwrap_or_default();
            if !self.geometry.write(key, number) {
                return Err(DocumentError::InapplicableProperty {
                    key,
                    kind: self.kind.name(),
                });
            }
            return Ok(previous);
        }
        Ok(self.properties.insert(key, value))
    }

    /// Removes a stored property. Geometry-derived keys cannot be removed.
    pub fn remove_property(&mut self, key: PropertyKey) -> Option<PropertyValue> {
        self.properties.shift_remove(&key)
    }

    /// Returns the stored (non-geometric) properties
    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    /// Returns every key that currently has a value, in canonical key order.
    pub fn property_keys(&self) -> impl Iterator<Item = PropertyKey> + '_ {
        PropertyKey::ALL
            .into_iter()
            .filter(|key| self.kind.accepts(*key))
            .filter(|key| {
                if key.is_geometric() {
                    self.geometry.read(*key).is_some()
                } else {
                    self.properties.contains_key(key)
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{property::PropertyType, style::LineType};

    fn sample_line() -> DiagramElement {
        DiagramElement::line(
            Id::new("l1"),
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Some(Id::new("a")),
            Some(Id::new("b")),
        )
    }

    #[test]
    fn test_anchor_position_clamped() {
        let anchor = DiagramElement::anchor(Id::new("x"), Id::new("l1"), 1.7);
        assert_eq!(anchor.anchor_of(), Some((Id::new("l1"), 1.0)));

        let anchor = DiagramElement::anchor(Id::new("y"), Id::new("l1"), -0.2);
        assert_eq!(anchor.anchor_of(), Some((Id::new("l1"), 0.0)));
    }

    #[test]
    fn test_anchor_position_clamped_on_deserialize() {
        let json = r#"{"id":"x","kind":{"type":"Anchor","owner":"l1","position":3.0},"geometry":{"type":"Anchored"}}"#;
        let anchor: DiagramElement = serde_json::from_str(json).unwrap();
        assert_eq!(anchor.anchor_of(), Some((Id::new("l1"), 1.0)));
    }

    #[test]
    fn test_geometric_property_reads_geometry() {
        let line = sample_line();
        assert_eq!(
            line.property(PropertyKey::EndX),
            Some(PropertyValue::Double(100.0))
        );
        assert_eq!(line.property(PropertyKey::CenterX), None);
    }

    #[test]
    fn test_geometric_property_writes_geometry() {
        let mut line = sample_line();
        let previous = line
            .set_property(PropertyKey::StartY, PropertyValue::Double(25.0))
            .unwrap();

        assert_eq!(previous, Some(PropertyValue::Double(0.0)));
        assert_eq!(
            line.geometry(),
            &Geometry::Path {
                start: Point::new(0.0, 25.0),
                end: Point::new(100.0, 0.0)
            }
        );
        assert!(line.properties().is_empty());
    }

    #[test]
    fn test_set_property_refuses_inapplicable_key() {
        let mut line = sample_line();
        let err = line
            .set_property(PropertyKey::DataSource, PropertyValue::from("Ensembl"))
            .unwrap_err();

        assert!(matches!(
            err,
            DocumentError::InapplicableProperty {
                key: PropertyKey::DataSource,
                kind: "Line"
            }
        ));
    }

    #[test]
    fn test_set_property_refuses_wrong_type() {
        let mut line = sample_line();
        let err = line
            .set_property(PropertyKey::EndLineType, PropertyValue::from("Arrow"))
            .unwrap_err();

        assert!(matches!(
            err,
            DocumentError::PropertyTypeMismatch {
                expected: PropertyType::LineType,
                found: PropertyType::String,
                ..
            }
        ));
        assert_eq!(line.property(PropertyKey::EndLineType), None);
    }

    #[test]
    fn test_property_keys_canonical_order() {
        let line = sample_line()
            .with_property(PropertyKey::EndLineType, PropertyValue::from(LineType::Arrow))
            .with_property(PropertyKey::Comments, PropertyValue::from("x"));

        let keys: Vec<_> = line.property_keys().collect();
        assert_eq!(
            keys,
            vec![
                PropertyKey::EndLineType,
                PropertyKey::Comments,
                PropertyKey::StartX,
                PropertyKey::StartY,
                PropertyKey::EndX,
                PropertyKey::EndY,
            ]
        );
    }

    #[test]
    fn test_serde_shape() {
        let node = DiagramElement::data_node(Id::new("n1"), Point::new(1.0, 2.0), Size::new(3.0, 4.0))
            .with_group(Id::new("g1"));

        let json = serde_json::to_string(&node).unwrap();
        assert_eq!(
            json,
            r#"{"id":"n1","kind":{"type":"DataNode"},"geometry":{"type":"Rect","center":{"x":1.0,"y":2.0},"size":{"width":3.0,"height":4.0}},"group_ref":"g1"}"#
        );

        let back: DiagramElement = serde_json::from_str(&json).unwrap();
        assert_eq!(back, node);
    }
}
