//! Translation between typed element properties and generic host attributes.
//!
//! Graph hosts store a flat bag of named attributes per node and edge. The
//! [`AttributeMapper`] names each [`PropertyKey`] on the host side (an explicit
//! mapping, or the property tag as fallback), converts values both ways,
//! supplies default values for absent properties and applies two policies:
//!
//! - **protected** properties are never written from host attributes
//! - **hidden** properties are sent to the host tagged as not visible
//!
//! The two sets are kept disjoint.

use std::{collections::HashSet, fmt};

use indexmap::IndexMap;
use log::trace;
use serde::{Deserialize, Serialize};

use pathweave_core::{
    color::Color,
    model::{DiagramElement, PropertyKey, PropertyType, PropertyValue},
};

use crate::{config::AttributeConfig, error::PathweaveError};

/// Host attribute carrying the role of an edge (`line`, `anchor-connection`,
/// `group-connection`).
pub const INTERACTION: &str = "interaction";
/// Hidden host attribute naming the line a segment or anchor node came from.
pub const LINEAGE_LINE: &str = "lineage.line";
/// Hidden host attribute with the index of a segment within its line.
pub const LINEAGE_INDEX: &str = "lineage.index";
/// Hidden host attribute with the position of an anchor node on its line.
pub const ANCHOR_POSITION: &str = "anchor.position";

const RESERVED: [&str; 4] = [INTERACTION, LINEAGE_LINE, LINEAGE_INDEX, ANCHOR_POSITION];

/// Returns `true` for attribute names the engine itself maintains.
pub fn is_reserved(name: &str) -> bool {
    RESERVED.contains(&name)
}

/// A generic attribute value as graph hosts store it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HostValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl fmt::Display for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostValue::Bool(value) => write!(f, "{value}"),
            HostValue::Int(value) => write!(f, "{value}"),
            HostValue::Float(value) => write!(f, "{value}"),
            HostValue::Str(value) => f.write_str(value),
        }
    }
}

impl From<&str> for HostValue {
    fn from(value: &str) -> Self {
        HostValue::Str(value.to_string())
    }
}

impl From<f64> for HostValue {
    fn from(value: f64) -> Self {
        HostValue::Float(value)
    }
}

/// A host attribute value with its visibility in the host's own UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostAttribute {
    pub value: HostValue,
    pub visible: bool,
}

impl HostAttribute {
    pub fn visible(value: impl Into<HostValue>) -> Self {
        Self {
            value: value.into(),
            visible: true,
        }
    }

    pub fn hidden(value: impl Into<HostValue>) -> Self {
        Self {
            value: value.into(),
            visible: false,
        }
    }
}

/// Ordered attribute bag of one host node or edge.
pub type AttributeBag = IndexMap<String, HostAttribute>;

fn to_host_value(value: &PropertyValue) -> HostValue {
    match value {
        PropertyValue::Text(text) => HostValue::Str(text.clone()),
        PropertyValue::Double(number) => HostValue::Float(*number),
        PropertyValue::Integer(number) => HostValue::Int(i64::from(*number)),
        PropertyValue::Boolean(flag) => HostValue::Bool(*flag),
        PropertyValue::Color(color) => HostValue::Str(color.to_string()),
        PropertyValue::LineType(line_type) => HostValue::Str(line_type.to_string()),
        PropertyValue::LineStyle(style) => HostValue::Str(style.to_string()),
        PropertyValue::ShapeType(shape) => HostValue::Str(shape.to_string()),
    }
}

/// Coerces a host value to a property type, `None` if it does not fit.
fn coerce(value: &HostValue, property_type: PropertyType) -> Option<PropertyValue> {
    match (property_type, value) {
        (PropertyType::String, HostValue::Str(text)) => Some(PropertyValue::Text(text.clone())),
        (PropertyType::String, other) => Some(PropertyValue::Text(other.to_string())),

        (PropertyType::Double, HostValue::Float(number)) => Some(PropertyValue::Double(*number)),
        (PropertyType::Double, HostValue::Int(number)) => {
            Some(PropertyValue::Double(*number as f64))
        }
        (PropertyType::Double, HostValue::Str(text)) => {
            text.trim().parse().ok().map(PropertyValue::Double)
        }

        (PropertyType::Integer, HostValue::Int(number)) => {
            i32::try_from(*number).ok().map(PropertyValue::Integer)
        }
        (PropertyType::Integer, HostValue::Float(number)) if number.fract() == 0.0 => {
            i32::try_from(*number as i64).ok().map(PropertyValue::Integer)
        }
        (PropertyType::Integer, HostValue::Str(text)) => {
            text.trim().parse().ok().map(PropertyValue::Integer)
        }

        (PropertyType::Boolean, HostValue::Bool(flag)) => Some(PropertyValue::Boolean(*flag)),
        (PropertyType::Boolean, HostValue::Str(text)) => {
            text.trim().parse().ok().map(PropertyValue::Boolean)
        }

        (PropertyType::Color, HostValue::Str(text)) => Color::new(text).ok().map(PropertyValue::Color),
        (PropertyType::Color, HostValue::Int(rgb)) => {
            Color::from_rgb_int(*rgb).ok().map(PropertyValue::Color)
        }

        (PropertyType::LineType, HostValue::Str(text)) => {
            text.parse().ok().map(PropertyValue::LineType)
        }
        (PropertyType::LineStyle, HostValue::Str(text)) => {
            text.parse().ok().map(PropertyValue::LineStyle)
        }
        (PropertyType::ShapeType, HostValue::Str(text)) => {
            text.parse().ok().map(PropertyValue::ShapeType)
        }

        _ => None,
    }
}

/// Bidirectional property ↔ host attribute translation.
///
/// # Examples
///
/// ```
/// # use pathweave::attributes::{AttributeMapper, HostValue};
/// # use pathweave_core::model::{PropertyKey, PropertyValue};
/// let mapper = AttributeMapper::new();
///
/// // Explicit mapping
/// let (name, attribute) = mapper.to_host(PropertyKey::TextLabel, &PropertyValue::from("ATP"));
/// assert_eq!(name, "canonicalName");
/// assert!(attribute.visible);
///
/// // Tag fallback
/// assert_eq!(
///     mapper.from_host("Database", &HostValue::from("Ensembl")),
///     Some((PropertyKey::DataSource, PropertyValue::from("Ensembl")))
/// );
///
/// // Protected properties never come back from the host
/// assert_eq!(mapper.from_host("CenterX", &HostValue::Float(10.0)), None);
/// ```
#[derive(Debug, Clone)]
pub struct AttributeMapper {
    prop_to_attr: IndexMap<PropertyKey, String>,
    attr_to_prop: IndexMap<String, PropertyKey>,
    defaults: IndexMap<PropertyKey, PropertyValue>,
    protected: HashSet<PropertyKey>,
    hidden: HashSet<PropertyKey>,
}

impl Default for AttributeMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl AttributeMapper {
    /// Creates a mapper with the built-in mappings, defaults and policies.
    pub fn new() -> Self {
        let mut mapper = Self::empty();
        mapper.set_mapping("canonicalName", PropertyKey::TextLabel);
        mapper.set_default(PropertyKey::DataSource, PropertyValue::from("Uniprot"));
        for key in [
            PropertyKey::CenterX,
            PropertyKey::CenterY,
            PropertyKey::StartX,
            PropertyKey::StartY,
            PropertyKey::EndX,
            PropertyKey::EndY,
            PropertyKey::Comments,
        ] {
            mapper.protect(key);
        }
        mapper.hide(PropertyKey::ZOrder);
        mapper
    }

    /// Creates a mapper with no mappings, defaults or policies.
    pub fn empty() -> Self {
        Self {
            prop_to_attr: IndexMap::new(),
            attr_to_prop: IndexMap::new(),
            defaults: IndexMap::new(),
            protected: HashSet::new(),
            hidden: HashSet::new(),
        }
    }

    /// Creates a mapper from the built-in one with configured overrides.
    ///
    /// # Errors
    ///
    /// Returns [`PathweaveError::Config`] for unknown property tags, default
    /// values that do not fit their property, and properties listed as both
    /// protected and hidden.
    pub fn from_config(config: &AttributeConfig) -> Result<Self, PathweaveError> {
        fn parse_key(tag: &str) -> Result<PropertyKey, PathweaveError> {
            tag.parse()
                .map_err(|err| PathweaveError::Config(format!("attributes: {err}")))
        }

        let mut mapper = Self::new();
        for (tag, attr) in config.mappings() {
            mapper.set_mapping(attr, parse_key(tag)?);
        }
        for (tag, value) in config.defaults() {
            let key = parse_key(tag)?;
            let value = coerce(value, key.property_type()).ok_or_else(|| {
                PathweaveError::Config(format!(
                    "attributes: default `{value}` is not a valid {} for `{key}`",
                    key.property_type()
                ))
            })?;
            mapper.set_default(key, value);
        }
        if let Some(protected) = config.protected() {
            mapper.protected = protected
                .iter()
                .map(|tag| parse_key(tag))
                .collect::<Result<_, _>>()?;
        }
        if let Some(hidden) = config.hidden() {
            mapper.hidden = hidden
                .iter()
                .map(|tag| parse_key(tag))
                .collect::<Result<_, _>>()?;
        }
        if let Some(key) = mapper.protected.intersection(&mapper.hidden).next() {
            return Err(PathweaveError::Config(format!(
                "attributes: `{key}` is both protected and hidden"
            )));
        }
        Ok(mapper)
    }

    /// Maps host attribute `attr` to `key` in both directions.
    pub fn set_mapping(&mut self, attr: &str, key: PropertyKey) {
        if let Some(previous) = self.prop_to_attr.insert(key, attr.to_string()) {
            self.attr_to_prop.shift_remove(&previous);
        }
        self.attr_to_prop.insert(attr.to_string(), key);
    }

    /// Returns the host attribute name of a property.
    pub fn attribute_name(&self, key: PropertyKey) -> &str {
        self.prop_to_attr
            .get(&key)
            .map_or(key.tag(), String::as_str)
    }

    /// Returns the property a host attribute maps to, if any.
    pub fn property_for(&self, attr: &str) -> Option<PropertyKey> {
        if let Some(key) = self.attr_to_prop.get(attr) {
            return Some(*key);
        }
        let key: PropertyKey = attr.parse().ok()?;
        // A tag that is explicitly mapped elsewhere no longer names the property
        (!self.prop_to_attr.contains_key(&key)).then_some(key)
    }

    pub fn set_default(&mut self, key: PropertyKey, value: PropertyValue) {
        self.defaults.insert(key, value);
    }

    pub fn default_value(&self, key: PropertyKey) -> Option<&PropertyValue> {
        self.defaults.get(&key)
    }

    /// Iterates over the configured defaults
    pub fn defaults(&self) -> impl Iterator<Item = (PropertyKey, &PropertyValue)> {
        self.defaults.iter().map(|(key, value)| (*key, value))
    }

    /// Marks a property protected, removing it from the hidden set.
    pub fn protect(&mut self, key: PropertyKey) {
        self.hidden.remove(&key);
        self.protected.insert(key);
    }

    pub fn unprotect(&mut self, key: PropertyKey) {
        self.protected.remove(&key);
    }

    /// Marks a property hidden, removing it from the protected set.
    pub fn hide(&mut self, key: PropertyKey) {
        self.protected.remove(&key);
        self.hidden.insert(key);
    }

    pub fn unhide(&mut self, key: PropertyKey) {
        self.hidden.remove(&key);
    }

    pub fn is_protected(&self, key: PropertyKey) -> bool {
        self.protected.contains(&key)
    }

    pub fn is_hidden(&self, key: PropertyKey) -> bool {
        self.hidden.contains(&key)
    }

    /// Translates a property value into a named host attribute.
    pub fn to_host(&self, key: PropertyKey, value: &PropertyValue) -> (String, HostAttribute) {
        let attribute = HostAttribute {
            value: to_host_value(value),
            visible: !self.is_hidden(key),
        };
        (self.attribute_name(key).to_string(), attribute)
    }

    /// Translates a host attribute into a property value.
    ///
    /// Returns `None` when the attribute maps to no property, when the property
    /// is protected, or when the value cannot be coerced to the property type.
    pub fn from_host(&self, attr: &str, value: &HostValue) -> Option<(PropertyKey, PropertyValue)> {
        let key = self.property_for(attr)?;
        if self.is_protected(key) {
            trace!(attribute = attr; "Skipping protected property");
            return None;
        }
        coerce(value, key.property_type()).map(|value| (key, value))
    }

    /// Translates every property of an element into host attributes.
    pub fn properties_to_host(&self, element: &DiagramElement) -> AttributeBag {
        element
            .property_keys()
            .filter_map(|key| element.property(key).map(|value| self.to_host(key, &value)))
            .collect()
    }
}
