//! Model ↔ view coordinate transform.
//!
//! Diagram geometry is stored in model units. The host draws in view units;
//! one model unit appears as `zoom / model_units_per_pixel` view units. Both
//! coordinate systems share their origin and axis directions.

use pathweave_core::geometry::{Bounds, Point, Size};

use crate::error::PathweaveError;

/// Live scale between model and view coordinates.
///
/// # Examples
///
/// ```
/// # use pathweave::transform::CoordinateTransform;
/// # use pathweave_core::geometry::Point;
/// let mut transform = CoordinateTransform::new(2.0, 4.0).unwrap();
/// assert_eq!(transform.to_view_length(30.0), 15.0);
///
/// transform.set_zoom(8.0).unwrap();
/// let p = transform.to_view(Point::new(15.0, 45.0));
/// assert_eq!(p, Point::new(30.0, 90.0));
/// assert_eq!(transform.to_model(p), Point::new(15.0, 45.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateTransform {
    zoom: f64,
    model_units_per_pixel: f64,
}

impl Default for CoordinateTransform {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            model_units_per_pixel: 1.0,
        }
    }
}

fn check_scale(value: f64) -> Result<f64, PathweaveError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(PathweaveError::InvalidScale(value))
    }
}

impl CoordinateTransform {
    /// Creates a transform.
    ///
    /// # Errors
    ///
    /// Both factors must be positive and finite.
    pub fn new(zoom: f64, model_units_per_pixel: f64) -> Result<Self, PathweaveError> {
        Ok(Self {
            zoom: check_scale(zoom)?,
            model_units_per_pixel: check_scale(model_units_per_pixel)?,
        })
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Changes the zoom factor. The transform is unchanged on error.
    pub fn set_zoom(&mut self, zoom: f64) -> Result<(), PathweaveError> {
        self.zoom = check_scale(zoom)?;
        Ok(())
    }

    /// View units per model unit
    pub fn factor(&self) -> f32 {
        (self.zoom / self.model_units_per_pixel) as f32
    }

    pub fn to_view(&self, point: Point) -> Point {
        point.scale(self.factor())
    }

    pub fn to_model(&self, point: Point) -> Point {
        point.scale(1.0 / self.factor())
    }

    pub fn to_view_length(&self, length: f32) -> f32 {
        length * self.factor()
    }

    pub fn to_model_length(&self, length: f32) -> f32 {
        length / self.factor()
    }

    pub fn to_view_bounds(&self, center: Point, size: Size) -> Bounds {
        Bounds::new_from_center(self.to_view(center), size.scale(self.factor()))
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    #[test]
    fn test_rejects_invalid_scale() {
        assert!(matches!(
            CoordinateTransform::new(0.0, 1.0),
            Err(PathweaveError::InvalidScale(_))
        ));
        assert!(CoordinateTransform::new(1.0, f64::NAN).is_err());

        let mut transform = CoordinateTransform::default();
        assert!(transform.set_zoom(-2.0).is_err());
        assert_eq!(transform.zoom(), 1.0);
    }

    #[test]
    fn test_view_bounds() {
        let transform = CoordinateTransform::new(2.0, 1.0).unwrap();
        let bounds = transform.to_view_bounds(Point::new(10.0, 10.0), Size::new(4.0, 2.0));

        assert_approx_eq!(f32, bounds.min_x(), 16.0);
        assert_approx_eq!(f32, bounds.max_y(), 22.0);
        assert_approx_eq!(f32, bounds.width(), 8.0);
    }
}
