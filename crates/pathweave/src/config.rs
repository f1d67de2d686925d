//! Configuration types for Pathweave synchronization.
//!
//! This module provides configuration structures that control how documents
//! are converted, how the host view is scaled and how properties map onto host
//! attributes. All types implement [`serde::Deserialize`] for flexible loading
//! from external sources.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining all sections.
//! - [`ConversionConfig`] - Classification switches for the converter.
//! - [`ViewConfig`] - Initial zoom and model-unit scale of the host view.
//! - [`AttributeConfig`] - Overrides for the attribute mapper.
//!
//! # Example
//!
//! ```
//! # use pathweave::config::AppConfig;
//! // Use default configuration
//! let config = AppConfig::default();
//! assert!(config.conversion().detect_group_cycles());
//! assert_eq!(config.view().zoom(), 1.0);
//! ```

use indexmap::IndexMap;
use serde::Deserialize;

use crate::attributes::HostValue;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Conversion configuration section.
    #[serde(default)]
    conversion: ConversionConfig,

    /// View configuration section.
    #[serde(default)]
    view: ViewConfig,

    /// Attribute mapping configuration section.
    #[serde(default)]
    attributes: AttributeConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from its sections.
    pub fn new(
        conversion: ConversionConfig,
        view: ViewConfig,
        attributes: AttributeConfig,
    ) -> Self {
        Self {
            conversion,
            view,
            attributes,
        }
    }

    /// Returns the conversion configuration.
    pub fn conversion(&self) -> &ConversionConfig {
        &self.conversion
    }

    /// Returns the view configuration.
    pub fn view(&self) -> &ViewConfig {
        &self.view
    }

    /// Returns the attribute mapping configuration.
    pub fn attributes(&self) -> &AttributeConfig {
        &self.attributes
    }
}

/// Classification switches for the converter.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// Turn free-floating labels into graph nodes instead of annotations.
    label_as_node: bool,

    /// Omit membership edges that would close a group containment cycle.
    detect_group_cycles: bool,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            label_as_node: false,
            detect_group_cycles: true,
        }
    }
}

impl ConversionConfig {
    pub fn new(label_as_node: bool, detect_group_cycles: bool) -> Self {
        Self {
            label_as_node,
            detect_group_cycles,
        }
    }

    /// Returns whether labels become graph nodes.
    pub fn label_as_node(&self) -> bool {
        self.label_as_node
    }

    /// Returns whether group containment cycles are detected.
    pub fn detect_group_cycles(&self) -> bool {
        self.detect_group_cycles
    }
}

/// Initial scale of the host view.
///
/// One model unit appears as `zoom / model_units_per_pixel` view units.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    zoom: f64,
    model_units_per_pixel: f64,
    show_annotations: bool,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            model_units_per_pixel: 1.0,
            show_annotations: true,
        }
    }
}

impl ViewConfig {
    pub fn new(zoom: f64, model_units_per_pixel: f64, show_annotations: bool) -> Self {
        Self {
            zoom,
            model_units_per_pixel,
            show_annotations,
        }
    }

    /// Returns the initial zoom factor.
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Returns how many model units make up one pixel at zoom 1.
    pub fn model_units_per_pixel(&self) -> f64 {
        self.model_units_per_pixel
    }

    /// Returns whether annotation overlays start visible.
    pub fn show_annotations(&self) -> bool {
        self.show_annotations
    }
}

/// Overrides for the attribute mapper.
///
/// Properties are named by their pathway-file tag (`TextLabel`, `Database`,
/// `CenterX`, ...). Entries here extend the built-in defaults; `protected`
/// and `hidden` replace the built-in sets when present.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AttributeConfig {
    /// Host attribute name for each property tag.
    mappings: IndexMap<String, String>,

    /// Default values for absent properties, by property tag.
    defaults: IndexMap<String, HostValue>,

    protected: Option<Vec<String>>,

    hidden: Option<Vec<String>>,
}

impl AttributeConfig {
    /// Returns the explicit property tag to attribute name mappings.
    pub fn mappings(&self) -> &IndexMap<String, String> {
        &self.mappings
    }

    /// Returns the configured default values.
    pub fn defaults(&self) -> &IndexMap<String, HostValue> {
        &self.defaults
    }

    /// Returns the protected property tags, if overridden.
    pub fn protected(&self) -> Option<&[String]> {
        self.protected.as_deref()
    }

    /// Returns the hidden property tags, if overridden.
    pub fn hidden(&self) -> Option<&[String]> {
        self.hidden.as_deref()
    }
}
