//! Pathweave Core Types and Definitions
//!
//! This crate provides the foundational types for Pathweave, the
//! synchronization engine between pathway diagrams and node/edge graph hosts.
//! It includes:
//!
//! - **Identifiers**: Efficient string-interned identifiers ([`identifier::Id`])
//! - **Colors**: Color handling with CSS color support ([`color::Color`])
//! - **Geometry**: Basic geometric types ([`geometry`] module)
//! - **Model**: Diagram elements, typed properties and the element arena ([`model`] module)

pub mod color;
pub mod geometry;
pub mod identifier;
pub mod model;
