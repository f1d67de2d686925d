//! Typed element properties.
//!
//! A [`PropertyKey`] names a property by its pathway-file tag and fixes its
//! [`PropertyType`]. Values are stored as [`PropertyValue`]s in an ordered
//! [`Properties`] map. Geometry-derived keys (`CenterX`, `Width`, `StartX`,
//! ...) are never stored; they read and write the element geometry instead.

use std::{fmt, str::FromStr};

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{
    color::Color,
    model::style::{LineStyle, LineType, ShapeType},
};

/// Ordered property storage of an element.
pub type Properties = IndexMap<PropertyKey, PropertyValue>;

/// Value type a property accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyType {
    String,
    Double,
    Integer,
    Boolean,
    Color,
    LineType,
    LineStyle,
    ShapeType,
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "string",
            Self::Double => "double",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Color => "color",
            Self::LineType => "line type",
            Self::LineStyle => "line style",
            Self::ShapeType => "shape type",
        };
        f.write_str(name)
    }
}

/// A typed property of a diagram element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PropertyKey {
    TextLabel,
    Color,
    FillColor,
    FontSize,
    LineThickness,
    LineStyle,
    StartLineType,
    EndLineType,
    ShapeType,
    /// Biological type of a data node (`GeneProduct`, `Metabolite`, ...)
    DataNodeType,
    /// Database an identifier refers into
    DataSource,
    /// Database identifier
    Identifier,
    Comments,
    ZOrder,
    Rotation,
    Transparent,
    CenterX,
    CenterY,
    Width,
    Height,
    StartX,
    StartY,
    EndX,
    EndY,
}

impl PropertyKey {
    /// Every key, in canonical order.
    pub const ALL: [PropertyKey; 24] = [
        Self::TextLabel,
        Self::Color,
        Self::FillColor,
        Self::FontSize,
        Self::LineThickness,
        Self::LineStyle,
        Self::StartLineType,
        Self::EndLineType,
        Self::ShapeType,
        Self::DataNodeType,
        Self::DataSource,
        Self::Identifier,
        Self::Comments,
        Self::ZOrder,
        Self::Rotation,
        Self::Transparent,
        Self::CenterX,
        Self::CenterY,
        Self::Width,
        Self::Height,
        Self::StartX,
        Self::StartY,
        Self::EndX,
        Self::EndY,
    ];

    /// Returns the pathway-file tag of this key.
    ///
    /// Graph hosts see the same name unless the attribute mapper declares an
    /// explicit mapping for the key.
    pub fn tag(self) -> &'static str {
        match self {
            Self::TextLabel => "TextLabel",
            Self::Color => "Color",
            Self::FillColor => "FillColor",
            Self::FontSize => "FontSize",
            Self::LineThickness => "LineThickness",
            Self::LineStyle => "LineStyle",
            Self::StartLineType => "StartLineType",
            Self::EndLineType => "EndLineType",
            Self::ShapeType => "ShapeType",
            Self::DataNodeType => "Type",
            Self::DataSource => "Database",
            Self::Identifier => "ID",
            Self::Comments => "Comments",
            Self::ZOrder => "ZOrder",
            Self::Rotation => "Rotation",
            Self::Transparent => "Transparent",
            Self::CenterX => "CenterX",
            Self::CenterY => "CenterY",
            Self::Width => "Width",
            Self::Height => "Height",
            Self::StartX => "StartX",
            Self::StartY => "StartY",
            Self::EndX => "EndX",
            Self::EndY => "EndY",
        }
    }

    /// Returns the value type this key accepts
    pub fn property_type(self) -> PropertyType {
        match self {
            Self::TextLabel
            | Self::DataNodeType
            | Self::DataSource
            | Self::Identifier
            | Self::Comments => PropertyType::String,
            Self::Color | Self::FillColor => PropertyType::Color,
            Self::LineStyle => PropertyType::LineStyle,
            Self::StartLineType | Self::EndLineType => PropertyType::LineType,
            Self::ShapeType => PropertyType::ShapeType,
            Self::ZOrder => PropertyType::Integer,
            Self::Transparent => PropertyType::Boolean,
            Self::FontSize
            | Self::LineThickness
            | Self::Rotation
            | Self::CenterX
            | Self::CenterY
            | Self::Width
            | Self::Height
            | Self::StartX
            | Self::StartY
            | Self::EndX
            | Self::EndY => PropertyType::Double,
        }
    }

    /// Returns `true` for keys backed by element geometry rather than storage.
    pub fn is_geometric(self) -> bool {
        matches!(
            self,
            Self::CenterX
                | Self::CenterY
                | Self::Width
                | Self::Height
                | Self::StartX
                | Self::StartY
                | Self::EndX
                | Self::EndY
        )
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for PropertyKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.tag() == s)
            .ok_or_else(|| format!("unknown property `{s}`"))
    }
}

impl Serialize for PropertyKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.tag())
    }
}

impl<'de> Deserialize<'de> for PropertyKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        tag.parse().map_err(serde::de::Error::custom)
    }
}

/// A typed property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    Text(String),
    Double(f64),
    Integer(i32),
    Boolean(bool),
    Color(Color),
    LineType(LineType),
    LineStyle(LineStyle),
    ShapeType(ShapeType),
}

impl PropertyValue {
    /// Returns the type of this value
    pub fn property_type(&self) -> PropertyType {
        match self {
            Self::Text(_) => PropertyType::String,
            Self::Double(_) => PropertyType::Double,
            Self::Integer(_) => PropertyType::Integer,
            Self::Boolean(_) => PropertyType::Boolean,
            Self::Color(_) => PropertyType::Color,
            Self::LineType(_) => PropertyType::LineType,
            Self::LineStyle(_) => PropertyType::LineStyle,
            Self::ShapeType(_) => PropertyType::ShapeType,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Double(value) => Some(*value),
            Self::Integer(value) => Some(f64::from(*value)),
            _ => None,
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<Color> for PropertyValue {
    fn from(color: Color) -> Self {
        Self::Color(color)
    }
}

impl From<LineType> for PropertyValue {
    fn from(line_type: LineType) -> Self {
        Self::LineType(line_type)
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Double(value) => write!(f, "{value}"),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Boolean(value) => write!(f, "{value}"),
            Self::Color(color) => write!(f, "{color}"),
            Self::LineType(line_type) => write!(f, "{line_type}"),
            Self::LineStyle(style) => write!(f, "{style}"),
            Self::ShapeType(shape) => write!(f, "{shape}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_tags_are_unique() {
        let mut tags: Vec<_> = PropertyKey::ALL.iter().map(|key| key.tag()).collect();
        tags.sort_unstable();
        tags.dedup();
        assert_eq!(tags.len(), PropertyKey::ALL.len());
    }

    #[test]
    fn test_key_parse_by_tag() {
        assert_eq!("Database".parse(), Ok(PropertyKey::DataSource));
        assert_eq!("ID".parse(), Ok(PropertyKey::Identifier));
        assert!("DataSource".parse::<PropertyKey>().is_err());
    }

    #[test]
    fn test_geometric_keys_are_doubles() {
        for key in PropertyKey::ALL.into_iter().filter(|key| key.is_geometric()) {
            assert_eq!(key.property_type(), PropertyType::Double, "{key}");
        }
    }

    #[test]
    fn test_value_types() {
        assert_eq!(
            PropertyValue::from("ATP").property_type(),
            PropertyType::String
        );
        assert_eq!(
            PropertyValue::from(LineType::Arrow).property_type(),
            PropertyType::LineType
        );
        assert_eq!(PropertyValue::Integer(3).as_f64(), Some(3.0));
        assert_eq!(PropertyValue::Boolean(true).as_f64(), None);
    }

    #[test]
    fn test_properties_serde_uses_tags() {
        let mut properties = Properties::new();
        properties.insert(PropertyKey::DataSource, PropertyValue::from("Ensembl"));
        properties.insert(PropertyKey::EndLineType, PropertyValue::from(LineType::TBar));

        let json = serde_json::to_string(&properties).unwrap();
        assert_eq!(
            json,
            r#"{"Database":{"Text":"Ensembl"},"EndLineType":{"LineType":"TBar"}}"#
        );

        let back: Properties = serde_json::from_str(&json).unwrap();
        assert_eq!(back, properties);
    }
}
