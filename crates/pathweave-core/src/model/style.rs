//! Enumerated style values of diagram elements.
//!
//! Each type parses from and prints to the tag name used by pathway files
//! (`"Arrow"`, `"Dashed"`, `"RoundedRectangle"`, ...). Graph hosts receive the
//! same tag names as plain string attributes.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Arrowhead drawn at one end of a line.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LineType {
    /// Plain end, no marker
    #[default]
    Line,
    Arrow,
    /// Inhibition bar
    TBar,
    Receptor,
    ReceptorSquare,
    ReceptorRound,
    LigandSquare,
    LigandRound,
}

impl LineType {
    pub const ALL: [LineType; 8] = [
        Self::Line,
        Self::Arrow,
        Self::TBar,
        Self::Receptor,
        Self::ReceptorSquare,
        Self::ReceptorRound,
        Self::LigandSquare,
        Self::LigandRound,
    ];

    /// Returns the tag name of this line type
    pub fn tag(self) -> &'static str {
        match self {
            Self::Line => "Line",
            Self::Arrow => "Arrow",
            Self::TBar => "TBar",
            Self::Receptor => "Receptor",
            Self::ReceptorSquare => "ReceptorSquare",
            Self::ReceptorRound => "ReceptorRound",
            Self::LigandSquare => "LigandSquare",
            Self::LigandRound => "LigandRound",
        }
    }
}

impl fmt::Display for LineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for LineType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|line_type| line_type.tag() == s)
            .ok_or_else(|| format!("invalid line type `{s}`"))
    }
}

/// Stroke pattern of a line or shape outline.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
    Double,
}

impl fmt::Display for LineStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Solid => f.write_str("Solid"),
            Self::Dashed => f.write_str("Dashed"),
            Self::Double => f.write_str("Double"),
        }
    }
}

impl FromStr for LineStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Solid" => Ok(Self::Solid),
            // Older pathway files spell it "Broken"
            "Dashed" | "Broken" => Ok(Self::Dashed),
            "Double" => Ok(Self::Double),
            _ => Err(format!(
                "invalid line style `{s}`, valid values: Solid, Dashed, Double"
            )),
        }
    }
}

/// Outline of a shape annotation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeType {
    #[default]
    Rectangle,
    RoundedRectangle,
    Oval,
    Triangle,
    Hexagon,
    Brace,
    Arc,
}

impl ShapeType {
    pub const ALL: [ShapeType; 7] = [
        Self::Rectangle,
        Self::RoundedRectangle,
        Self::Oval,
        Self::Triangle,
        Self::Hexagon,
        Self::Brace,
        Self::Arc,
    ];

    /// Returns the tag name of this shape type
    pub fn tag(self) -> &'static str {
        match self {
            Self::Rectangle => "Rectangle",
            Self::RoundedRectangle => "RoundedRectangle",
            Self::Oval => "Oval",
            Self::Triangle => "Triangle",
            Self::Hexagon => "Hexagon",
            Self::Brace => "Brace",
            Self::Arc => "Arc",
        }
    }
}

impl fmt::Display for ShapeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for ShapeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|shape| shape.tag() == s)
            .ok_or_else(|| format!("invalid shape type `{s}`"))
    }
}
