//! Geometric primitives for diagram elements and host views.
//!
//! - [`Point`] - A 2D coordinate
//! - [`Size`] - Width and height dimensions
//! - [`Bounds`] - An axis-aligned rectangle defined by minimum and maximum coordinates
//!
//! # Coordinate System
//!
//! Both the diagram model and the host view use a screen-like coordinate
//! system:
//!
//! ```text
//!   (0,0) ────────► +X
//!     │
//!     │
//!     ▼
//!    +Y
//! ```
//!
//! Model coordinates and view coordinates differ only by a scale factor, see
//! the coordinate transform of the `pathweave` crate.

use serde::{Deserialize, Serialize};

/// A 2D point in model or view space.
///
/// # Examples
///
/// ```
/// # use pathweave_core::geometry::Point;
/// let start = Point::new(0.0, 0.0);
/// let end = Point::new(100.0, 50.0);
///
/// let quarter = start.lerp(end, 0.25);
/// assert_eq!(quarter.x(), 25.0);
/// assert_eq!(quarter.y(), 12.5);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    x: f32,
    y: f32,
}

impl Point {
    /// Creates a new point with the specified coordinates
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Returns the x-coordinate of the point
    pub fn x(self) -> f32 {
        self.x
    }

    /// Returns the y-coordinate of the point
    pub fn y(self) -> f32 {
        self.y
    }

    /// Creates a new point with the specified x-coordinate
    pub fn with_x(mut self, x: f32) -> Self {
        self.x = x;
        self
    }

    /// Creates a new point with the specified y-coordinate
    pub fn with_y(mut self, y: f32) -> Self {
        self.y = y;
        self
    }

    /// Subtracts another point from this point, returning a new point
    pub fn sub_point(self, other: Point) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }

    /// Multiplies both coordinates by the given factor.
    pub fn scale(self, factor: f32) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
        }
    }

    /// Linear interpolation towards `other`.
    ///
    /// `t = 0.0` yields `self`, `t = 1.0` yields `other`. Used to place anchors
    /// at their fractional position along a line.
    pub fn lerp(self, other: Point, t: f32) -> Self {
        Self {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }
}

/// Width and height of a node-like element, in model or view units
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    width: f32,
    height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Returns the width dimension of this size
    pub fn width(self) -> f32 {
        self.width
    }

    /// Returns the height dimension of this size
    pub fn height(self) -> f32 {
        self.height
    }

    /// Returns a new size with the given width
    pub fn with_width(mut self, width: f32) -> Self {
        self.width = width;
        self
    }

    /// Returns a new size with the given height
    pub fn with_height(mut self, height: f32) -> Self {
        self.height = height;
        self
    }

    /// Multiplies both dimensions by the given factor
    pub fn scale(self, factor: f32) -> Self {
        Self {
            width: self.width * factor,
            height: self.height * factor,
        }
    }
}

/// Axis-aligned box of an element, as drawn by the overlay layer
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    min_x: f32,
    min_y: f32,
    max_x: f32,
    max_y: f32,
}

impl Bounds {
    /// Box of an element stored by its center and size, as pathway files store them
    pub fn new_from_center(center: Point, size: Size) -> Self {
        let half_width = size.width / 2.0;
        let half_height = size.height / 2.0;
        Self {
            min_x: center.x - half_width,
            min_y: center.y - half_height,
            max_x: center.x + half_width,
            max_y: center.y + half_height,
        }
    }

    /// Returns the minimum x-coordinate of the bounds
    pub fn min_x(self) -> f32 {
        self.min_x
    }

    /// Returns the minimum y-coordinate of the bounds
    pub fn min_y(self) -> f32 {
        self.min_y
    }

    /// Returns the maximum x-coordinate of the bounds
    pub fn max_x(self) -> f32 {
        self.max_x
    }

    /// Returns the maximum y-coordinate of the bounds
    pub fn max_y(self) -> f32 {
        self.max_y
    }

    /// Returns the center point of the bounds
    pub fn center(self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Returns the width of the bounds
    pub fn width(self) -> f32 {
        self.max_x - self.min_x
    }

    /// Returns the height of the bounds
    pub fn height(self) -> f32 {
        self.max_y - self.min_y
    }
}
