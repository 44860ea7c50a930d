//! Read-only inputs to the winding pipeline.
//!
//! [`Winding`] and [`WindingWindow`] are constructed by upstream collaborators
//! (the wire database resolves outer dimensions, the bobbin resolves window
//! bounds) and passed into the engine immutably. The pipeline never mutates
//! them; every run builds fresh section, layer, and turn collections.

use uom::{
    ConstZero,
    si::{
        angle::degree,
        f64::{Angle, Length},
    },
};

use crate::support::{
    constraint::{ConstraintError, StrictlyPositive},
    geometry::Extent,
};

use super::error::SpecificationError;

/// Which of a rectangular wire's outer dimensions faces the span axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WireMounting {
    /// The wire lies flat: its width advances along the span axis and its
    /// height stacks in depth.
    #[default]
    Flat,
    /// The wire is wound on edge: width and height swap roles.
    EdgeWound,
}

/// The resolved outer geometry of a wire, insulation included.
///
/// Outer dimensions come from the wire database collaborator; this engine
/// does not re-derive them from conductor size or insulation grade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WireSpec {
    /// Round or litz wire with a single outer diameter.
    Round { outer_diameter: Length },
    /// Rectangular or foil wire with two outer dimensions and a mounting.
    Rectangular {
        outer_width: Length,
        outer_height: Length,
        mounting: WireMounting,
    },
}

impl WireSpec {
    /// A round wire with the given outer diameter.
    ///
    /// # Errors
    ///
    /// Returns an error if the diameter is not strictly positive.
    pub fn round(outer_diameter: Length) -> Result<Self, ConstraintError> {
        StrictlyPositive::new(outer_diameter)?;
        Ok(Self::Round { outer_diameter })
    }

    /// A rectangular or foil wire with the given outer dimensions.
    ///
    /// # Errors
    ///
    /// Returns an error if either dimension is not strictly positive.
    pub fn rectangular(
        outer_width: Length,
        outer_height: Length,
        mounting: WireMounting,
    ) -> Result<Self, ConstraintError> {
        StrictlyPositive::new(outer_width)?;
        StrictlyPositive::new(outer_height)?;
        Ok(Self::Rectangular {
            outer_width,
            outer_height,
            mounting,
        })
    }

    /// The outer dimension consumed along the span axis per turn.
    pub fn span_dim(&self) -> Length {
        match *self {
            Self::Round { outer_diameter } => outer_diameter,
            Self::Rectangular {
                outer_width,
                outer_height,
                mounting,
            } => match mounting {
                WireMounting::Flat => outer_width,
                WireMounting::EdgeWound => outer_height,
            },
        }
    }

    /// The outer dimension consumed along the depth axis per layer.
    pub fn depth_dim(&self) -> Length {
        match *self {
            Self::Round { outer_diameter } => outer_diameter,
            Self::Rectangular {
                outer_width,
                outer_height,
                mounting,
            } => match mounting {
                WireMounting::Flat => outer_height,
                WireMounting::EdgeWound => outer_width,
            },
        }
    }

    /// The rotation applied to each turn of this wire.
    pub fn rotation(&self) -> Angle {
        match *self {
            Self::Round { .. }
            | Self::Rectangular {
                mounting: WireMounting::Flat,
                ..
            } => Angle::ZERO,
            Self::Rectangular {
                mounting: WireMounting::EdgeWound,
                ..
            } => Angle::new::<degree>(90.0),
        }
    }
}

/// The galvanic isolation side a winding belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IsolationSide {
    #[default]
    Primary,
    Secondary,
    Tertiary,
    Quaternary,
    Quinary,
    Senary,
    Septenary,
    Octonary,
}

impl IsolationSide {
    /// All sides, in winding-index order.
    pub const ALL: [Self; 8] = [
        Self::Primary,
        Self::Secondary,
        Self::Tertiary,
        Self::Quaternary,
        Self::Quinary,
        Self::Senary,
        Self::Septenary,
        Self::Octonary,
    ];

    /// The conventional side for a winding index (0 is primary, 1 is
    /// secondary, and so on, wrapping past the known sides).
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % Self::ALL.len()]
    }
}

/// One winding of the coil: identity, turn count, and wire.
#[derive(Debug, Clone, PartialEq)]
pub struct Winding {
    /// Human-readable identity, e.g. `"Primary"`.
    pub name: String,
    /// Number of physical turns to place. Must be at least 1.
    pub turn_count: usize,
    /// Resolved outer geometry of the wire.
    pub wire: WireSpec,
    /// Isolation side for insulation coordination.
    pub isolation_side: IsolationSide,
}

impl Winding {
    /// A winding with the default (primary) isolation side.
    pub fn new(name: impl Into<String>, turn_count: usize, wire: WireSpec) -> Self {
        Self {
            name: name.into(),
            turn_count,
            wire,
            isolation_side: IsolationSide::default(),
        }
    }

    /// Sets the isolation side.
    #[must_use]
    pub fn with_isolation_side(mut self, side: IsolationSide) -> Self {
        self.isolation_side = side;
        self
    }
}

/// The rectangular region of a bobbin or core available for windings.
///
/// Coordinates run from the origin: span in `[0, span]`, depth in
/// `[0, depth]`. Callers with toroidal windows map their angular extent onto
/// the span axis before invoking the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindingWindow {
    span: Extent,
    depth: Extent,
}

impl WindingWindow {
    /// A window with the given span and depth.
    ///
    /// # Errors
    ///
    /// Returns an error if either dimension is not strictly positive.
    pub fn new(span: Length, depth: Length) -> Result<Self, ConstraintError> {
        StrictlyPositive::new(span)?;
        StrictlyPositive::new(depth)?;
        let span = Extent::from_start(Length::ZERO, span).map_err(|_| ConstraintError::Negative)?;
        let depth =
            Extent::from_start(Length::ZERO, depth).map_err(|_| ConstraintError::Negative)?;
        Ok(Self { span, depth })
    }

    /// Window extent along the span axis.
    pub fn span(&self) -> Length {
        self.span.length()
    }

    /// Window extent along the depth axis.
    pub fn depth(&self) -> Length {
        self.depth.length()
    }

    /// The span axis as an extent from the origin.
    pub fn span_extent(&self) -> Extent {
        self.span
    }

    /// The depth axis as an extent from the origin.
    pub fn depth_extent(&self) -> Extent {
        self.depth
    }
}

/// Derives turn counts for all windings from the primary turn count and the
/// design's turns ratios (`n_primary / n_secondary` per secondary).
///
/// The first entry of the result is the primary itself.
///
/// # Errors
///
/// Returns an error if any ratio is zero, negative, or NaN.
///
/// # Examples
///
/// ```
/// use coil_layout::layout::turns_from_ratios;
///
/// let turns = turns_from_ratios(24, &[2.0, 0.5]).unwrap();
/// assert_eq!(turns, vec![24, 12, 48]);
/// ```
pub fn turns_from_ratios(
    primary_turns: usize,
    ratios: &[f64],
) -> Result<Vec<usize>, SpecificationError> {
    let mut turns = Vec::with_capacity(ratios.len() + 1);
    turns.push(primary_turns);
    for (index, &ratio) in ratios.iter().enumerate() {
        if !(ratio > 0.0) {
            return Err(SpecificationError::NonPositiveTurnsRatio { index });
        }
        let secondary = (primary_turns as f64 / ratio).round() as usize;
        turns.push(secondary.max(1));
    }
    Ok(turns)
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
    fn round_wire_uses_diameter_on_both_axes() {
        let wire = WireSpec::round(mm(0.5)).unwrap();
        assert_relative_eq!(wire.span_dim().get::<millimeter>(), 0.5);
        assert_relative_eq!(wire.depth_dim().get::<millimeter>(), 0.5);
        assert_relative_eq!(wire.rotation().get::<degree>(), 0.0);
    }

    #[test]
    fn edge_wound_wire_swaps_dimensions() {
        let flat = WireSpec::rectangular(mm(2.0), mm(0.2), WireMounting::Flat).unwrap();
        assert_relative_eq!(flat.span_dim().get::<millimeter>(), 2.0);
        assert_relative_eq!(flat.depth_dim().get::<millimeter>(), 0.2);

        let edge = WireSpec::rectangular(mm(2.0), mm(0.2), WireMounting::EdgeWound).unwrap();
        assert_relative_eq!(edge.span_dim().get::<millimeter>(), 0.2);
        assert_relative_eq!(edge.depth_dim().get::<millimeter>(), 2.0);
        assert_relative_eq!(edge.rotation().get::<degree>(), 90.0);
    }

    #[test]
    fn wire_dimensions_must_be_positive() {
        assert!(WireSpec::round(mm(0.0)).is_err());
        assert!(WireSpec::rectangular(mm(1.0), mm(-0.1), WireMounting::Flat).is_err());
    }

    #[test]
    fn window_dimensions_must_be_positive() {
        assert!(WindingWindow::new(mm(10.0), mm(5.0)).is_ok());
        assert!(WindingWindow::new(mm(0.0), mm(5.0)).is_err());
        assert!(WindingWindow::new(mm(10.0), mm(-1.0)).is_err());
    }

    #[test]
    fn isolation_side_from_index_wraps() {
        assert_eq!(IsolationSide::from_index(0), IsolationSide::Primary);
        assert_eq!(IsolationSide::from_index(1), IsolationSide::Secondary);
        assert_eq!(IsolationSide::from_index(8), IsolationSide::Primary);
    }

    #[test]
    fn turns_from_ratios_rounds_to_nearest() {
        let turns = turns_from_ratios(10, &[3.0]).unwrap();
        assert_eq!(turns, vec![10, 3]);

        assert!(matches!(
            turns_from_ratios(10, &[0.0]),
            Err(SpecificationError::NonPositiveTurnsRatio { index: 0 })
        ));
    }
}
