//! The winding layout pipeline.
//!
//! A layout run is a fixed sequence of pure stages: sections split the window
//! span among windings, layers distribute each section's turns along the
//! depth axis, turns get exact coordinates, compaction removes free span, and
//! validation gates the result. [`wind`] runs the whole pipeline; the
//! `wind_by_*` entry points resume it from caller-supplied intermediate
//! state, so a caller can edit one stage (say, margins on a section) and
//! rebuild only what follows.
//!
//! Infeasible inputs fail with [`InfeasibleError`] naming the offending
//! entity. Callers that prefer a drawable over-capacity layout to an error
//! opt in with [`LayoutConfig::with_overflow_allowed`]; such layouts skip
//! compaction and carry a failing [`FitReport`].
//!
//! ```
//! use coil_layout::layout::{LayoutConfig, Winding, WindingWindow, WireSpec, wind};
//! use uom::si::{f64::Length, length::millimeter};
//!
//! let mm = Length::new::<millimeter>;
//! let windings = vec![Winding::new("Primary", 10, WireSpec::round(mm(0.5))?)];
//! let window = WindingWindow::new(mm(10.0), mm(10.0))?;
//! let config = LayoutConfig::new(1, &[1.0], &[0])?;
//!
//! let layout = wind(&windings, &window, &config)?;
//! assert!(layout.fits());
//! assert_eq!(layout.turns.len(), 10);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod batch;
mod compact;
mod config;
mod error;
mod input;
mod layer;
mod result;
mod section;
mod turn;
mod validate;

pub use batch::{CancelFlag, LayoutCase, wind_batch, wind_with_retry};
pub use config::{CoilAlignment, LayoutConfig, MarginSpec, Proportion, WindingOrientation};
pub use error::{InfeasibleError, LayoutError, SpecificationError};
pub use input::{
    IsolationSide, Winding, WindingWindow, WireMounting, WireSpec, turns_from_ratios,
};
pub use layer::{Layer, LayerKind};
pub use result::CoilLayout;
pub use section::{Section, SectionKind, add_margin_to_section};
pub use turn::Turn;
pub use validate::{Entity, FitReport, Invariant, Violation, check_fit};

/// Runs the full pipeline: sections, layers, turns, compaction, validation.
///
/// # Errors
///
/// Returns [`SpecificationError`] for defective inputs, [`InfeasibleError`]
/// when the windings cannot fit (unless overflow is allowed), and
/// [`LayoutError::InvariantViolation`] if a placed layout fails validation.
pub fn wind(
    windings: &[Winding],
    window: &WindingWindow,
    config: &LayoutConfig,
) -> Result<CoilLayout, LayoutError> {
    let sections = section::plan_sections(windings, window, config)?;
    wind_by_sections(windings, window, config, sections)
}

/// Resumes the pipeline from a caller-supplied section run.
///
/// # Errors
///
/// As [`wind`].
pub fn wind_by_sections(
    windings: &[Winding],
    window: &WindingWindow,
    config: &LayoutConfig,
    sections: Vec<Section>,
) -> Result<CoilLayout, LayoutError> {
    let layers = layer::organize_layers(windings, window, config, &sections)?;
    wind_by_layers(windings, window, config, sections, layers)
}

/// Resumes the pipeline from caller-supplied sections and layers.
///
/// # Errors
///
/// As [`wind`].
pub fn wind_by_layers(
    windings: &[Winding],
    window: &WindingWindow,
    config: &LayoutConfig,
    sections: Vec<Section>,
    layers: Vec<Layer>,
) -> Result<CoilLayout, LayoutError> {
    let turns = turn::place_turns(windings, config, &layers)?;
    wind_by_turns(windings, window, config, sections, layers, turns)
}

/// Finishes the pipeline from a fully placed layout: validate, then compact.
///
/// # Errors
///
/// As [`wind`].
pub fn wind_by_turns(
    windings: &[Winding],
    window: &WindingWindow,
    config: &LayoutConfig,
    sections: Vec<Section>,
    layers: Vec<Layer>,
    turns: Vec<Turn>,
) -> Result<CoilLayout, LayoutError> {
    match check_fit(windings, window, config, &sections, &layers, &turns) {
        Ok(()) => {
            let (sections, layers, turns) =
                compact::delimit_and_compact(windings, window, config, &sections, &layers, &turns)?;
            Ok(CoilLayout {
                sections,
                layers,
                turns,
                fit: FitReport::pass(),
            })
        }
        Err(violation) if config.allow_overflow => {
            log::warn!("overflowing layout returned unfit: {violation}");
            Ok(CoilLayout {
                sections,
                layers,
                turns,
                fit: FitReport::fail(violation),
            })
        }
        Err(violation) => Err(LayoutError::InvariantViolation(violation)),
    }
}

/// Compacts an already placed layout without re-running the earlier stages.
///
/// # Errors
///
/// Returns [`InfeasibleError::Uncompactable`] when the input does not
/// validate, and [`LayoutError::InvariantViolation`] if the compacted result
/// fails the validation gate.
pub fn delimit_and_compact(
    windings: &[Winding],
    window: &WindingWindow,
    config: &LayoutConfig,
    sections: &[Section],
    layers: &[Layer],
    turns: &[Turn],
) -> Result<CoilLayout, LayoutError> {
    let (sections, layers, turns) =
        compact::delimit_and_compact(windings, window, config, sections, layers, turns)?;
    Ok(CoilLayout {
        sections,
        layers,
        turns,
        fit: FitReport::pass(),
    })
}
