//! Pathway diagram model.
//!
//! # Organization
//!
//! - [`element`] - [`DiagramElement`], its [`ElementKind`] and [`Geometry`]
//! - [`property`] - Typed properties: [`PropertyKey`], [`PropertyValue`]
//! - [`style`] - Enumerated style values: [`LineType`], [`LineStyle`], [`ShapeType`]
//! - [`document`] - The generation-checked element arena [`DiagramDocument`]

pub mod document;
pub mod element;
pub mod property;
pub mod style;

pub use document::*;
pub use element::*;
pub use property::*;
pub use style::*;
