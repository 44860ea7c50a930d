//! One- and two-dimensional geometry primitives for window packing.
//!
//! The layout engine works in a rectangular coordinate frame with two axes:
//!
//! - The **span axis**, along which sections are ordered and turns advance.
//! - The **depth axis**, along which the layers of one section stack.
//!
//! [`Extent`] is a closed interval along a single axis and is the unit of
//! bookkeeping for sections (span), layers (depth), and usable turn ranges.
//! [`Position`] is a point in the (span, depth) frame, used for turn centers.
//!
//! All coordinates are [`uom`] lengths; nothing in this module assumes a
//! particular physical orientation (radial vs. axial), so callers map their
//! own window frame onto (span, depth) before invoking the engine.

use thiserror::Error;
use uom::{
    ConstZero,
    si::{f64::Length, length::meter},
};

/// An error constructing or manipulating an [`Extent`].
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum GeometryError {
    /// The interval's upper bound fell below its lower bound.
    #[error("extent is inverted: max {max:?} < min {min:?}")]
    Inverted { min: Length, max: Length },
}

/// Comparison slack for geometric checks.
///
/// Accumulated floating-point error in repeated pitch additions is far below
/// this for any physically meaningful winding (dimensions in the 1e-6 m to
/// 1e-1 m range).
pub(crate) fn tolerance() -> Length {
    Length::new::<meter>(1e-12)
}

/// A closed interval `[min, max]` along one axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    min: Length,
    max: Length,
}

impl Extent {
    /// Creates an extent from its bounds.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::Inverted`] if `max < min`.
    pub fn new(min: Length, max: Length) -> Result<Self, GeometryError> {
        if max < min {
            return Err(GeometryError::Inverted { min, max });
        }
        Ok(Self { min, max })
    }

    /// Creates an extent from a starting coordinate and a non-negative length.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::Inverted`] if `length` is negative.
    pub fn from_start(start: Length, length: Length) -> Result<Self, GeometryError> {
        Self::new(start, start + length)
    }

    /// The lower bound.
    pub fn min(&self) -> Length {
        self.min
    }

    /// The upper bound.
    pub fn max(&self) -> Length {
        self.max
    }

    /// The interval length, `max - min`.
    pub fn length(&self) -> Length {
        self.max - self.min
    }

    /// The midpoint of the interval.
    pub fn center(&self) -> Length {
        self.min + (self.max - self.min) / 2.0
    }

    /// Shrinks the interval by `leading` from below and `trailing` from above.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::Inverted`] if the insets consume the interval.
    pub fn inset(&self, leading: Length, trailing: Length) -> Result<Self, GeometryError> {
        Self::new(self.min + leading, self.max - trailing)
    }

    /// Whether a coordinate lies within the interval, up to tolerance.
    pub fn contains(&self, coordinate: Length) -> bool {
        let tol = tolerance();
        coordinate >= self.min - tol && coordinate <= self.max + tol
    }

    /// Whether `other` lies entirely within this interval, up to tolerance.
    pub fn encloses(&self, other: &Extent) -> bool {
        let tol = tolerance();
        other.min >= self.min - tol && other.max <= self.max + tol
    }

    /// Whether the interiors of the two intervals intersect.
    ///
    /// Shared endpoints (up to tolerance) do not count as an overlap, so
    /// adjacent sections and stacked layers are not flagged.
    pub fn overlaps(&self, other: &Extent) -> bool {
        let tol = tolerance();
        self.min + tol < other.max && other.min + tol < self.max
    }
}

/// A point in the (span, depth) window frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    /// Coordinate along the span axis.
    pub span: Length,
    /// Coordinate along the depth axis.
    pub depth: Length,
}

impl Position {
    /// The frame origin.
    pub fn origin() -> Self {
        Self {
            span: Length::ZERO,
            depth: Length::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use uom::si::length::millimeter;

    fn mm(value: f64) -> Length {
        Length::new::<millimeter>(value)
    }

    #[test]
    fn construction_and_accessors() {
        let e = Extent::new(mm(1.0), mm(4.0)).unwrap();
        assert_relative_eq!(e.length().get::<millimeter>(), 3.0);
        assert_relative_eq!(e.center().get::<millimeter>(), 2.5);

        assert!(matches!(
            Extent::new(mm(2.0), mm(1.0)),
            Err(GeometryError::Inverted { .. })
        ));
    }

    #[test]
    fn from_start_rejects_negative_length() {
        assert!(Extent::from_start(mm(0.0), mm(-1.0)).is_err());
        let e = Extent::from_start(mm(2.0), mm(3.0)).unwrap();
        assert_relative_eq!(e.max().get::<millimeter>(), 5.0);
    }

    #[test]
    fn inset_consuming_interval_fails() {
        let e = Extent::new(mm(0.0), mm(2.0)).unwrap();
        assert!(e.inset(mm(0.5), mm(0.5)).is_ok());
        assert!(e.inset(mm(1.5), mm(1.5)).is_err());
    }

    #[test]
    fn overlap_is_interior_only() {
        let a = Extent::new(mm(0.0), mm(2.0)).unwrap();
        let b = Extent::new(mm(2.0), mm(4.0)).unwrap();
        let c = Extent::new(mm(1.0), mm(3.0)).unwrap();

        // Adjacent intervals share only an endpoint.
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(b.overlaps(&c));
    }

    #[test]
    fn containment() {
        let outer = Extent::new(mm(0.0), mm(10.0)).unwrap();
        let inner = Extent::new(mm(2.0), mm(8.0)).unwrap();
        assert!(outer.encloses(&inner));
        assert!(!inner.encloses(&outer));
        assert!(outer.contains(mm(10.0)));
        assert!(!outer.contains(mm(10.1)));
    }
}
