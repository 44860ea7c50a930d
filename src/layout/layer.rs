//! Layer organization: distributing each section's turns across layers.
//!
//! A section's turns advance along its usable span; when they exceed it, the
//! overflow starts a new layer stacked along the depth axis. Contiguous
//! orientation fills each layer to capacity before starting the next.
//! Overlapping orientation staggers every other layer by half a turn pitch so
//! its turns nest between those of the layer below, at the cost of one turn
//! of capacity on staggered layers.
//!
//! Turns are never dropped: a section that cannot hold a single turn across
//! its span, or whose layer stack exceeds the window depth, is reported as
//! infeasible unless the caller opted into overflow.

use uom::{
    ConstZero,
    si::{f64::Length, ratio::ratio},
};

use crate::support::geometry::{Extent, tolerance};

use super::{
    config::{LayoutConfig, WindingOrientation},
    error::{InfeasibleError, LayoutError},
    input::{Winding, WindingWindow},
    section::{Section, SectionKind, validate_windings},
};

/// What a layer holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    /// Some of the turns of the parent section's winding.
    Conduction { winding: usize, turn_count: usize },
    /// Insulation between conduction layers.
    Insulation,
}

/// A depth-wise slice of one section.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layer {
    /// Index of the parent section.
    pub section: usize,
    pub kind: LayerKind,
    /// Occupied range along the depth axis.
    pub depth: Extent,
    /// Usable span range inherited from the parent section, net of margins.
    pub span: Extent,
    /// Start offset along the span axis for staggered (overlapping) layers.
    pub stagger: Length,
}

/// Grace applied before flooring a capacity ratio, so a span that fits `n`
/// turns exactly is not truncated to `n - 1` by floating-point error.
const CAPACITY_GRACE: f64 = 1e-9;

/// How many turns fit across `usable` at the given pitch, after `stagger`.
fn capacity(usable: Length, stagger: Length, wire_span: Length, spacing: Length) -> usize {
    let available = usable - stagger;
    if available + tolerance() < wire_span {
        return 0;
    }
    let pitch = wire_span + spacing;
    (((available + spacing) / pitch).get::<ratio>() + CAPACITY_GRACE).floor() as usize
}

fn stagger_for(orientation: WindingOrientation, layer_index: usize, wire_span: Length) -> Length {
    match orientation {
        WindingOrientation::Contiguous => Length::ZERO,
        WindingOrientation::Overlapping if layer_index % 2 == 1 => wire_span / 2.0,
        WindingOrientation::Overlapping => Length::ZERO,
    }
}

/// How many turns each section receives.
///
/// A winding's turns are divided as evenly as possible among its conduction
/// sections, earlier sections taking the remainder.
pub(super) fn section_turn_shares(windings: &[Winding], sections: &[Section]) -> Vec<usize> {
    let mut section_counts = vec![0usize; windings.len()];
    for section in sections {
        if let Some(w) = section.winding() {
            section_counts[w] += 1;
        }
    }
    let mut seen = vec![0usize; windings.len()];
    sections
        .iter()
        .map(|section| {
            let Some(w) = section.winding() else {
                return 0;
            };
            let total = windings[w].turn_count;
            let count = section_counts[w];
            let base = total / count;
            let remainder = total % count;
            let occurrence = seen[w];
            seen[w] += 1;
            base + usize::from(occurrence < remainder)
        })
        .collect()
}

/// Distributes every section's turns into layers.
pub(super) fn organize_layers(
    windings: &[Winding],
    window: &WindingWindow,
    config: &LayoutConfig,
    sections: &[Section],
) -> Result<Vec<Layer>, LayoutError> {
    config.validate(windings.len())?;
    validate_windings(windings)?;
    let shares = section_turn_shares(windings, sections);
    let layer_insulation = config
        .layer_insulation
        .filter(|&t| t > Length::ZERO);

    let mut layers = Vec::new();
    for (section_index, section) in sections.iter().enumerate() {
        let SectionKind::Conduction { winding } = section.kind else {
            continue;
        };
        let mut remaining = shares[section_index];
        if remaining == 0 {
            continue;
        }

        let wire = &windings[winding].wire;
        let wire_span = wire.span_dim();
        let wire_depth = wire.depth_dim();
        let usable = section.usable_span(section_index).map_err(LayoutError::from)?;

        let mut cursor = Length::ZERO;
        let mut layer_index = 0usize;
        while remaining > 0 {
            let stagger = stagger_for(config.orientation, layer_index, wire_span);
            let mut cap = capacity(usable.length(), stagger, wire_span, config.turn_spacing);
            if cap == 0 {
                if !config.allow_overflow {
                    return Err(InfeasibleError::TurnDoesNotFit {
                        section: section_index,
                    }
                    .into());
                }
                cap = 1;
            }

            if layer_index > 0 && let Some(thickness) = layer_insulation {
                layers.push(Layer {
                    section: section_index,
                    kind: LayerKind::Insulation,
                    depth: depth_slice(cursor, thickness)?,
                    span: usable,
                    stagger: Length::ZERO,
                });
                cursor += thickness;
            }

            let turn_count = cap.min(remaining);
            layers.push(Layer {
                section: section_index,
                kind: LayerKind::Conduction {
                    winding,
                    turn_count,
                },
                depth: depth_slice(cursor, wire_depth)?,
                span: usable,
                stagger,
            });
            cursor += wire_depth;
            remaining -= turn_count;
            layer_index += 1;
        }

        if cursor > window.depth() + tolerance() && !config.allow_overflow {
            return Err(InfeasibleError::LayersExceedDepth {
                section: section_index,
                needed: cursor,
                available: window.depth(),
            }
            .into());
        }
    }

    Ok(layers)
}

fn depth_slice(start: Length, length: Length) -> Result<Extent, LayoutError> {
    Extent::from_start(start, length).map_err(|_| InfeasibleError::MarginsExceedWindow.into())
}
