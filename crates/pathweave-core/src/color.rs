//! Style colors of diagram elements.
//!
//! The `Color` and `FillColor` properties of a pathway element hold a
//! [`Color`]. Graph hosts exchange colors in two forms: CSS strings such as
//! `"#a0a0ff"`, which [`Color::new`] parses and [`Display`](std::fmt::Display)
//! prints back, and packed `0xRRGGBB` integers, read with
//! [`Color::from_rgb_int`]. The attribute mapper always writes the string
//! form.

use std::{
    hash::{Hash, Hasher},
    str::FromStr,
};

use color::DynamicColor;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Line or fill color of a diagram element.
///
/// Equality compares the parsed value and how it was written: a named color
/// such as `"blue"` is not equal to its hex spelling.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Color {
    color: DynamicColor,
}

impl Eq for Color {}

impl Hash for Color {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_string().hash(state);
    }
}

impl Color {
    /// Parses a color as it appears in a pathway file or a host attribute.
    ///
    /// Accepts hex notation, `rgb()` functions and named CSS colors.
    ///
    /// # Errors
    ///
    /// Returns a message naming the rejected text when it is not a color.
    ///
    /// # Examples
    ///
    /// ```
    /// use pathweave_core::color::Color;
    ///
    /// let fill = Color::new("#a0a0ff").unwrap();
    /// assert_eq!(fill, Color::new("#A0A0FF").unwrap());
    ///
    /// assert!(Color::new("rgb(0, 0, 255)").is_ok());
    /// assert!(Color::new("transparentish").is_err());
    /// ```
    pub fn new(color_str: &str) -> Result<Self, String> {
        match DynamicColor::from_str(color_str) {
            Ok(color) => Ok(Self { color }),
            Err(err) => Err(format!("invalid color `{color_str}`: {err}")),
        }
    }

    /// Reads a color a graph host stored as a packed `0xRRGGBB` integer.
    ///
    /// Bits above the low 24 are ignored.
    ///
    /// # Examples
    ///
    /// ```
    /// use pathweave_core::color::Color;
    ///
    /// let from_host = Color::from_rgb_int(0xa0a0ff).unwrap();
    /// assert_eq!(from_host, Color::new("#a0a0ff").unwrap());
    /// ```
    pub fn from_rgb_int(rgb: i64) -> Result<Self, String> {
        Self::new(&format!("#{:06x}", rgb & 0x00ff_ffff))
    }
}

impl Default for Color {
    /// Black, the color pathway elements are drawn with when none is given.
    fn default() -> Self {
        Self::new("black").expect("'black' is a valid CSS color")
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.color)
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let color_str = String::deserialize(deserializer)?;
        Color::new(&color_str).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pathway_color_forms() {
        assert!(Color::new("#a0a0ff").is_ok());
        assert!(Color::new("rgb(160, 160, 255)").is_ok());
        assert!(Color::new("steelblue").is_ok());

        let err = Color::new("not-a-color").unwrap_err();
        assert!(err.contains("not-a-color"));
    }

    #[test]
    fn test_unset_color_is_black() {
        assert_eq!(Color::default(), Color::new("black").unwrap());
        assert_eq!(Color::default().to_string(), "black");
    }

    #[test]
    fn test_host_string_reparses_to_same_color() {
        // What the attribute mapper writes must read back unchanged
        for text in ["navy", "#a0a0ff", "rgb(12, 34, 56)"] {
            let color = Color::new(text).unwrap();
            let reparsed = Color::new(&color.to_string()).unwrap();
            assert_eq!(reparsed.to_string(), color.to_string());
        }
    }

    #[test]
    fn test_host_integer_color() {
        let fill = Color::from_rgb_int(0xa0a0ff).unwrap();
        assert_eq!(fill, Color::new("#a0a0ff").unwrap());

        let black = Color::from_rgb_int(0).unwrap();
        assert_eq!(black, Color::new("#000000").unwrap());

        // Alpha byte is dropped
        let opaque = Color::from_rgb_int(0x7f00_00ff).unwrap();
        assert_eq!(opaque, Color::new("#0000ff").unwrap());
    }

    #[test]
    fn test_json_form_is_css_string() {
        let color = Color::new("#a0a0ff").unwrap();
        let json = serde_json::to_string(&color).unwrap();
        assert_eq!(json, format!("\"{color}\""));

        let back: Color = serde_json::from_str(&json).unwrap();
        assert_eq!(back.to_string(), color.to_string());

        assert!(serde_json::from_str::<Color>("\"nope\"").is_err());
    }

    #[test]
    fn test_equal_colors_share_a_hash_slot() {
        use std::collections::HashSet;

        let mut fills = HashSet::new();
        fills.insert(Color::new("red").unwrap());

        assert!(fills.contains(&Color::new("red").unwrap()));
        assert!(!fills.contains(&Color::new("blue").unwrap()));
    }
}
