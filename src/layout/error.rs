//! Error taxonomy for the winding pipeline.
//!
//! Failures fall into three tiers with different caller contracts:
//!
//! - [`SpecificationError`]: the configuration is malformed or contradictory.
//!   Rejected before any placement is attempted; no partial state exists.
//! - [`InfeasibleError`]: the configuration is well-formed but cannot be
//!   satisfied within the window. Carries the offending entity so an iterative
//!   caller can adjust parameters and retry.
//! - [`LayoutError::InvariantViolation`]: the validator rejected geometry the
//!   pipeline itself produced. This signals a defect in the engine, never an
//!   unsatisfiable input, and is deliberately kept distinct from
//!   [`LayoutError::Infeasible`].

use thiserror::Error;
use uom::si::f64::Length;

use crate::support::constraint::ConstraintError;

use super::validate::Violation;

/// Any failure of a winding pipeline stage.
#[derive(Debug, Error)]
pub enum LayoutError {
    /// The winding description or configuration is invalid.
    #[error(transparent)]
    Specification(#[from] SpecificationError),

    /// The requested layout cannot fit in the window.
    #[error(transparent)]
    Infeasible(#[from] InfeasibleError),

    /// The engine produced geometry that fails its own validator.
    #[error("layout invariant violated after placement: {0}")]
    InvariantViolation(Violation),

    /// A batch or retry run observed its cancellation flag.
    #[error("layout run was cancelled")]
    Cancelled,
}

/// A malformed or contradictory winding configuration.
///
/// These are detected up front, before any sections, layers, or turns are
/// constructed.
#[derive(Debug, Error)]
pub enum SpecificationError {
    #[error("repetition count must be at least 1")]
    ZeroRepetitions,

    #[error("winding pattern is empty")]
    EmptyPattern,

    #[error(
        "pattern entry {entry} references winding {winding}, but only {winding_count} windings exist"
    )]
    PatternIndexOutOfRange {
        entry: usize,
        winding: usize,
        winding_count: usize,
    },

    #[error("winding {winding} never appears in the pattern")]
    WindingMissingFromPattern { winding: usize },

    #[error("{provided} proportions provided for {winding_count} windings")]
    ProportionCountMismatch {
        provided: usize,
        winding_count: usize,
    },

    #[error("proportion for winding {winding} is invalid")]
    InvalidProportion {
        winding: usize,
        #[source]
        source: ConstraintError,
    },

    #[error("winding proportions sum to {sum}, which exceeds 1")]
    ProportionSum { sum: f64 },

    #[error("{provided} margin pairs provided for {winding_count} windings")]
    MarginCountMismatch {
        provided: usize,
        winding_count: usize,
    },

    #[error("winding {winding} specifies zero turns")]
    ZeroTurns { winding: usize },

    #[error("winding {winding} has a non-positive wire dimension")]
    ZeroWireDimension { winding: usize },

    #[error("insulation thickness is negative")]
    NegativeInsulation,

    #[error("turn spacing is negative")]
    NegativeSpacing,

    #[error("turns ratio {index} is not strictly positive")]
    NonPositiveTurnsRatio { index: usize },

    #[error("section index {index} is out of range for {count} sections")]
    SectionIndexOutOfRange { index: usize, count: usize },
}

/// A well-formed configuration that cannot be satisfied within the window.
///
/// Every variant identifies the first offending entity so the caller can
/// adjust parameters (enlarge a proportion, drop a margin, pick a bigger
/// core) and retry. The engine never silently approximates.
#[derive(Debug, Error)]
pub enum InfeasibleError {
    #[error("insulation sections require {required:?} but the window span is {available:?}")]
    InsulationExceedsWindow { required: Length, available: Length },

    #[error("margins leave no span for conduction sections")]
    MarginsExceedWindow,

    #[error("section {section} has no usable span after margins")]
    SectionTooNarrow { section: usize },

    #[error("section {section} cannot fit a single turn across its span")]
    TurnDoesNotFit { section: usize },

    #[error("section {section} needs {needed:?} of layer depth, window provides {available:?}")]
    LayersExceedDepth {
        section: usize,
        needed: Length,
        available: Length,
    },

    #[error("layout cannot be compacted: input already violates {violation}")]
    Uncompactable { violation: Violation },
}
