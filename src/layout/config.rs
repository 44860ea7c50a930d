//! Layout configuration: pattern, proportions, margins, and placement policy.

use uom::{ConstZero, si::f64::Length};

use crate::support::constraint::{Constrained, NonNegative, UnitIntervalLowerOpen};

use super::error::SpecificationError;

/// A window proportion in `(0, 1]`.
pub type Proportion = Constrained<f64, UnitIntervalLowerOpen>;

/// How the turns of a section fill its layers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WindingOrientation {
    /// Each layer is filled to the available span before the next begins.
    #[default]
    Contiguous,
    /// Successive layers begin at a staggered half-pitch offset, nesting
    /// turns between those of the layer below.
    Overlapping,
}

impl WindingOrientation {
    /// All orientations supported by the engine.
    pub const ALL: [Self; 2] = [Self::Contiguous, Self::Overlapping];
}

/// Where the occupied turn block sits within a layer's usable span.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CoilAlignment {
    /// Anchor the first turn at the span lower bound; slack trails.
    #[default]
    InnerOrTop,
    /// Anchor the last turn at the span upper bound; slack leads.
    OuterOrBottom,
    /// Distribute slack evenly between consecutive turns.
    Spread,
    /// Center the occupied block, splitting slack at both ends.
    Centered,
}

impl CoilAlignment {
    /// All alignments supported by the engine.
    pub const ALL: [Self; 4] = [
        Self::InnerOrTop,
        Self::OuterOrBottom,
        Self::Spread,
        Self::Centered,
    ];
}

/// Margin tape clearances at the two span ends of a section.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarginSpec {
    leading: Length,
    trailing: Length,
}

impl Default for MarginSpec {
    fn default() -> Self {
        Self {
            leading: Length::ZERO,
            trailing: Length::ZERO,
        }
    }
}

impl MarginSpec {
    /// Margins at the leading (lower span) and trailing (upper span) ends.
    ///
    /// # Errors
    ///
    /// Returns an error if either margin is negative or NaN.
    pub fn new(
        leading: Length,
        trailing: Length,
    ) -> Result<Self, crate::support::constraint::ConstraintError> {
        NonNegative::new(leading)?;
        NonNegative::new(trailing)?;
        Ok(Self { leading, trailing })
    }

    /// No margin tape at either end.
    pub fn none() -> Self {
        Self::default()
    }

    /// Clearance at the lower span end.
    pub fn leading(&self) -> Length {
        self.leading
    }

    /// Clearance at the upper span end.
    pub fn trailing(&self) -> Length {
        self.trailing
    }

    /// Combined clearance of both ends.
    pub fn total(&self) -> Length {
        self.leading + self.trailing
    }
}

/// Slack allowed when checking that proportions sum to at most 1.
const PROPORTION_SUM_SLACK: f64 = 1e-9;

/// Full configuration of one winding run.
///
/// Constructed with [`LayoutConfig::new`] and refined with the `with_*`
/// builders. Structural checks that depend on the winding count (pattern
/// indices, per-winding vector lengths) happen in [`LayoutConfig::validate`],
/// which every pipeline stage calls before touching geometry.
#[derive(Debug, Clone)]
pub struct LayoutConfig {
    /// How many times the pattern repeats along the span axis.
    pub repetitions: usize,
    /// Share of the net window span per winding, in `(0, 1]`, summing to at
    /// most 1 across all windings.
    pub proportions: Vec<Proportion>,
    /// Winding-index order within one repetition unit, e.g. `[0, 1]`.
    pub pattern: Vec<usize>,
    /// Margin tape per winding. Empty means no margins anywhere.
    pub margins: Vec<MarginSpec>,
    /// Thickness of insulation sections auto-inserted between adjacent
    /// conduction sections of different windings. Zero disables them.
    pub insulation_thickness: Length,
    /// Thickness of insulation layers inserted between consecutive conduction
    /// layers of a multi-layer section. `None` disables them.
    pub layer_insulation: Option<Length>,
    /// How turns fill layers.
    pub orientation: WindingOrientation,
    /// Where the turn block sits within a layer.
    pub alignment: CoilAlignment,
    /// Extra clearance between consecutive turns along the span axis.
    pub turn_spacing: Length,
    /// Produce an out-of-window layout (flagged unfit) instead of failing
    /// when the turns do not fit. Off by default.
    pub allow_overflow: bool,
}

impl LayoutConfig {
    /// A configuration from the combinatorial allocation inputs, with all
    /// placement policies at their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if `repetitions` is zero, the pattern is empty, or any
    /// proportion lies outside `(0, 1]`.
    pub fn new(
        repetitions: usize,
        proportions: &[f64],
        pattern: &[usize],
    ) -> Result<Self, SpecificationError> {
        if repetitions == 0 {
            return Err(SpecificationError::ZeroRepetitions);
        }
        if pattern.is_empty() {
            return Err(SpecificationError::EmptyPattern);
        }
        let proportions = proportions
            .iter()
            .enumerate()
            .map(|(winding, &p)| {
                UnitIntervalLowerOpen::new(p)
                    .map_err(|source| SpecificationError::InvalidProportion { winding, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            repetitions,
            proportions,
            pattern: pattern.to_vec(),
            margins: Vec::new(),
            insulation_thickness: Length::ZERO,
            layer_insulation: None,
            orientation: WindingOrientation::default(),
            alignment: CoilAlignment::default(),
            turn_spacing: Length::ZERO,
            allow_overflow: false,
        })
    }

    /// Sets margin tape per winding.
    #[must_use]
    pub fn with_margins(mut self, margins: Vec<MarginSpec>) -> Self {
        self.margins = margins;
        self
    }

    /// Sets the inter-section insulation thickness.
    #[must_use]
    pub fn with_insulation_thickness(mut self, thickness: Length) -> Self {
        self.insulation_thickness = thickness;
        self
    }

    /// Enables insulation layers between consecutive conduction layers.
    #[must_use]
    pub fn with_layer_insulation(mut self, thickness: Length) -> Self {
        self.layer_insulation = Some(thickness);
        self
    }

    /// Sets the layer filling orientation.
    #[must_use]
    pub fn with_orientation(mut self, orientation: WindingOrientation) -> Self {
        self.orientation = orientation;
        self
    }

    /// Sets the turn alignment policy.
    #[must_use]
    pub fn with_alignment(mut self, alignment: CoilAlignment) -> Self {
        self.alignment = alignment;
        self
    }

    /// Sets the turn-to-turn spacing.
    #[must_use]
    pub fn with_turn_spacing(mut self, spacing: Length) -> Self {
        self.turn_spacing = spacing;
        self
    }

    /// Opts in to producing over-capacity layouts flagged as unfit.
    #[must_use]
    pub fn with_overflow_allowed(mut self) -> Self {
        self.allow_overflow = true;
        self
    }

    /// Checks the configuration against a concrete winding count.
    ///
    /// # Errors
    ///
    /// Returns the first structural defect found: pattern indices out of
    /// range, a winding absent from the pattern, mismatched per-winding
    /// vector lengths, proportions summing past 1, or negative clearances.
    pub fn validate(&self, winding_count: usize) -> Result<(), SpecificationError> {
        if self.repetitions == 0 {
            return Err(SpecificationError::ZeroRepetitions);
        }
        if self.pattern.is_empty() {
            return Err(SpecificationError::EmptyPattern);
        }
        for (entry, &winding) in self.pattern.iter().enumerate() {
            if winding >= winding_count {
                return Err(SpecificationError::PatternIndexOutOfRange {
                    entry,
                    winding,
                    winding_count,
                });
            }
        }
        if let Some(winding) =
            (0..winding_count).find(|w| !self.pattern.iter().any(|&p| p == *w))
        {
            return Err(SpecificationError::WindingMissingFromPattern { winding });
        }
        if self.proportions.len() != winding_count {
            return Err(SpecificationError::ProportionCountMismatch {
                provided: self.proportions.len(),
                winding_count,
            });
        }
        let sum: f64 = self.proportions.iter().map(|p| *p.as_ref()).sum();
        if sum > 1.0 + PROPORTION_SUM_SLACK {
            return Err(SpecificationError::ProportionSum { sum });
        }
        if !self.margins.is_empty() && self.margins.len() != winding_count {
            return Err(SpecificationError::MarginCountMismatch {
                provided: self.margins.len(),
                winding_count,
            });
        }
        if self.insulation_thickness < Length::ZERO {
            return Err(SpecificationError::NegativeInsulation);
        }
        if self.layer_insulation.is_some_and(|t| t < Length::ZERO) {
            return Err(SpecificationError::NegativeInsulation);
        }
        if self.turn_spacing < Length::ZERO {
            return Err(SpecificationError::NegativeSpacing);
        }
        Ok(())
    }

    /// The margin tape for one winding, defaulting to none.
    pub fn margin_for(&self, winding: usize) -> MarginSpec {
        self.margins.get(winding).copied().unwrap_or_default()
    }

    /// The winding-index sequence of the full repetition run.
    pub(super) fn sequence(&self) -> Vec<usize> {
        let mut seq = Vec::with_capacity(self.pattern.len() * self.repetitions);
        for _ in 0..self.repetitions {
            seq.extend_from_slice(&self.pattern);
        }
        seq
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use uom::si::length::millimeter;

    fn mm(value: f64) -> Length {
        Length::new::<millimeter>(value)
    }

    #[test]
    fn rejects_degenerate_combinatorics() {
        assert!(matches!(
            LayoutConfig::new(0, &[1.0], &[0]),
            Err(SpecificationError::ZeroRepetitions)
        ));
        assert!(matches!(
            LayoutConfig::new(1, &[1.0], &[]),
            Err(SpecificationError::EmptyPattern)
        ));
        assert!(matches!(
            LayoutConfig::new(1, &[0.0], &[0]),
            Err(SpecificationError::InvalidProportion { winding: 0, .. })
        ));
    }

    #[test]
    fn validate_checks_pattern_indices() {
        let config = LayoutConfig::new(1, &[0.5, 0.5], &[0, 2]).unwrap();
        assert!(matches!(
            config.validate(2),
            Err(SpecificationError::PatternIndexOutOfRange {
                entry: 1,
                winding: 2,
                winding_count: 2,
            })
        ));
    }

    #[test]
    fn validate_requires_every_winding_in_pattern() {
        let config = LayoutConfig::new(1, &[0.5, 0.5], &[0, 0]).unwrap();
        assert!(matches!(
            config.validate(2),
            Err(SpecificationError::WindingMissingFromPattern { winding: 1 })
        ));
    }

    #[test]
    fn validate_bounds_proportion_sum() {
        let config = LayoutConfig::new(1, &[0.7, 0.7], &[0, 1]).unwrap();
        assert!(matches!(
            config.validate(2),
            Err(SpecificationError::ProportionSum { .. })
        ));

        let config = LayoutConfig::new(1, &[0.5, 0.5], &[0, 1]).unwrap();
        assert!(config.validate(2).is_ok());
    }

    #[test]
    fn validate_rejects_negative_clearances() {
        let config = LayoutConfig::new(1, &[1.0], &[0])
            .unwrap()
            .with_insulation_thickness(mm(-0.1));
        assert!(matches!(
            config.validate(1),
            Err(SpecificationError::NegativeInsulation)
        ));

        let config = LayoutConfig::new(1, &[1.0], &[0])
            .unwrap()
            .with_turn_spacing(mm(-0.1));
        assert!(matches!(
            config.validate(1),
            Err(SpecificationError::NegativeSpacing)
        ));
    }

    #[test]
    fn sequence_repeats_pattern() {
        let config = LayoutConfig::new(2, &[0.5, 0.5], &[0, 1]).unwrap();
        assert_eq!(config.sequence(), vec![0, 1, 0, 1]);
    }

    #[test]
    fn margin_for_defaults_to_none() {
        let config = LayoutConfig::new(1, &[1.0], &[0]).unwrap();
        assert_eq!(config.margin_for(0), MarginSpec::none());

        let margin = MarginSpec::new(mm(1.0), mm(2.0)).unwrap();
        let config = config.with_margins(vec![margin]);
        assert_eq!(config.margin_for(0), margin);
    }
}
