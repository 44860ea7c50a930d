//! Read-only fit validation over a placed layout.
//!
//! [`check_fit`] re-derives nothing: it takes the winding inputs and the
//! placed sections, layers, and turns exactly as the pipeline (or a caller
//! overriding intermediate state) produced them, and reports the first
//! violated invariant together with the offending entity. It is used both as
//! a standalone query and as the mandatory gate after compaction.

use std::fmt;

use thiserror::Error;
use uom::ConstZero;
use uom::si::f64::Length;

use crate::support::geometry::tolerance;

use super::{
    config::LayoutConfig,
    input::{Winding, WindingWindow},
    layer::{Layer, LayerKind},
    section::{Section, SectionKind},
    turn::Turn,
};

/// The geometric and conservation rules every finished layout must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invariant {
    /// The summed section extents fit within the window span.
    SectionsWithinWindow,
    /// Sections are disjoint and insulation sections are non-empty.
    SectionsDisjoint,
    /// A layer references an existing conduction section, stays inside its
    /// usable span, and carries that section's winding.
    LayerParentage,
    /// The summed layer depths of a section fit within the window depth.
    LayersWithinSection,
    /// A layer's turns fit across its usable span.
    LayerCapacity,
    /// A turn lies within its layer and the window.
    TurnWithinBounds,
    /// Turn outlines do not intersect.
    TurnsDisjoint,
    /// Placed turns per winding match the specified turn count.
    TurnCount,
}

impl fmt::Display for Invariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::SectionsWithinWindow => "sections exceed the window span",
            Self::SectionsDisjoint => "sections overlap or an insulation section is empty",
            Self::LayerParentage => "layer escapes or mismatches its parent section",
            Self::LayersWithinSection => "layers exceed the window depth",
            Self::LayerCapacity => "layer holds more turns than its span allows",
            Self::TurnWithinBounds => "turn lies outside its layer or the window",
            Self::TurnsDisjoint => "turn outlines intersect",
            Self::TurnCount => "placed turn count differs from the winding",
        };
        f.write_str(text)
    }
}

/// The entity a violation points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Window,
    Section(usize),
    Layer(usize),
    Turn(usize),
    Winding(usize),
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Window => f.write_str("window"),
            Self::Section(i) => write!(f, "section {i}"),
            Self::Layer(i) => write!(f, "layer {i}"),
            Self::Turn(i) => write!(f, "turn {i}"),
            Self::Winding(i) => write!(f, "winding {i}"),
        }
    }
}

/// A violated invariant and the first entity violating it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{invariant} ({entity})")]
pub struct Violation {
    pub invariant: Invariant,
    pub entity: Entity,
}

/// Outcome of validating a layout, kept alongside the layout itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FitReport {
    /// Whether the layout satisfies every invariant.
    pub feasible: bool,
    /// The first violation found, when infeasible.
    pub violation: Option<Violation>,
}

impl FitReport {
    /// A passing report.
    pub fn pass() -> Self {
        Self {
            feasible: true,
            violation: None,
        }
    }

    /// A failing report carrying the first violation.
    pub fn fail(violation: Violation) -> Self {
        Self {
            feasible: false,
            violation: Some(violation),
        }
    }

    /// Converts a [`check_fit`] outcome into a report.
    pub fn from_check(check: Result<(), Violation>) -> Self {
        match check {
            Ok(()) => Self::pass(),
            Err(violation) => Self::fail(violation),
        }
    }
}

/// Checks every invariant over a placed layout.
///
/// # Errors
///
/// Returns the first [`Violation`] found, in invariant order.
pub fn check_fit(
    windings: &[Winding],
    window: &WindingWindow,
    config: &LayoutConfig,
    sections: &[Section],
    layers: &[Layer],
    turns: &[Turn],
) -> Result<(), Violation> {
    check_sections_within_window(window, sections)?;
    check_sections_disjoint(config, sections)?;
    check_layer_parentage(sections, layers)?;
    check_layers_within_sections(window, sections, layers)?;
    check_layer_capacity(windings, config, layers)?;
    check_turns_within_bounds(window, layers, turns)?;
    check_turns_disjoint(layers, turns)?;
    check_turn_counts(windings, layers, turns)?;
    Ok(())
}

fn check_sections_within_window(
    window: &WindingWindow,
    sections: &[Section],
) -> Result<(), Violation> {
    let total: Length = sections.iter().map(|s| s.span.length()).sum();
    if total > window.span() + tolerance() {
        return Err(Violation {
            invariant: Invariant::SectionsWithinWindow,
            entity: Entity::Window,
        });
    }
    for (index, section) in sections.iter().enumerate() {
        if !window.span_extent().encloses(&section.span) {
            return Err(Violation {
                invariant: Invariant::SectionsWithinWindow,
                entity: Entity::Section(index),
            });
        }
    }
    Ok(())
}

fn check_sections_disjoint(config: &LayoutConfig, sections: &[Section]) -> Result<(), Violation> {
    for (index, section) in sections.iter().enumerate() {
        if section.kind == SectionKind::Insulation && section.span.length() <= Length::ZERO {
            return Err(Violation {
                invariant: Invariant::SectionsDisjoint,
                entity: Entity::Section(index),
            });
        }
        for (other_index, other) in sections.iter().enumerate().skip(index + 1) {
            if section.span.overlaps(&other.span) {
                return Err(Violation {
                    invariant: Invariant::SectionsDisjoint,
                    entity: Entity::Section(other_index),
                });
            }
        }
    }
    // Adjacent conduction sections of different windings must be separated
    // by insulation whenever a thickness is configured.
    if config.insulation_thickness > Length::ZERO {
        for (index, pair) in sections.windows(2).enumerate() {
            if let (SectionKind::Conduction { winding: a }, SectionKind::Conduction { winding: b }) =
                (pair[0].kind, pair[1].kind)
                && a != b
            {
                return Err(Violation {
                    invariant: Invariant::SectionsDisjoint,
                    entity: Entity::Section(index + 1),
                });
            }
        }
    }
    Ok(())
}

fn check_layer_parentage(sections: &[Section], layers: &[Layer]) -> Result<(), Violation> {
    for (layer_index, layer) in layers.iter().enumerate() {
        let violation = Violation {
            invariant: Invariant::LayerParentage,
            entity: Entity::Layer(layer_index),
        };
        let Some(section) = sections.get(layer.section) else {
            return Err(violation);
        };
        // Layers only ever live inside conduction sections; insulation
        // sections hold nothing.
        if !section.is_conduction() {
            return Err(violation);
        }
        let Ok(usable) = section.usable_span(layer.section) else {
            return Err(violation);
        };
        if !usable.encloses(&layer.span) {
            return Err(violation);
        }
        if let LayerKind::Conduction { winding, .. } = layer.kind
            && section.winding() != Some(winding)
        {
            return Err(violation);
        }
    }
    Ok(())
}

fn check_layers_within_sections(
    window: &WindingWindow,
    sections: &[Section],
    layers: &[Layer],
) -> Result<(), Violation> {
    for section_index in 0..sections.len() {
        let mut depth_total = Length::ZERO;
        let mut in_section: Vec<(usize, &Layer)> = layers
            .iter()
            .enumerate()
            .filter(|(_, l)| l.section == section_index)
            .collect();
        in_section.sort_by(|a, b| {
            a.1.depth
                .min()
                .partial_cmp(&b.1.depth.min())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        for (layer_index, layer) in &in_section {
            depth_total += layer.depth.length();
            if !window.depth_extent().encloses(&layer.depth) {
                return Err(Violation {
                    invariant: Invariant::LayersWithinSection,
                    entity: Entity::Layer(*layer_index),
                });
            }
        }
        if depth_total > window.depth() + tolerance() {
            return Err(Violation {
                invariant: Invariant::LayersWithinSection,
                entity: Entity::Section(section_index),
            });
        }
        for pair in in_section.windows(2) {
            if pair[0].1.depth.overlaps(&pair[1].1.depth) {
                return Err(Violation {
                    invariant: Invariant::LayersWithinSection,
                    entity: Entity::Layer(pair[1].0),
                });
            }
        }
    }
    Ok(())
}

fn check_layer_capacity(
    windings: &[Winding],
    config: &LayoutConfig,
    layers: &[Layer],
) -> Result<(), Violation> {
    for (layer_index, layer) in layers.iter().enumerate() {
        let LayerKind::Conduction {
            winding,
            turn_count,
        } = layer.kind
        else {
            continue;
        };
        if turn_count == 0 {
            continue;
        }
        let Some(winding) = windings.get(winding) else {
            return Err(Violation {
                invariant: Invariant::LayerCapacity,
                entity: Entity::Layer(layer_index),
            });
        };
        let wire_span = winding.wire.span_dim();
        let block = wire_span * turn_count as f64
            + config.turn_spacing * (turn_count - 1) as f64
            + layer.stagger;
        if block > layer.span.length() + tolerance() {
            return Err(Violation {
                invariant: Invariant::LayerCapacity,
                entity: Entity::Layer(layer_index),
            });
        }
    }
    Ok(())
}

fn check_turns_within_bounds(
    window: &WindingWindow,
    layers: &[Layer],
    turns: &[Turn],
) -> Result<(), Violation> {
    let tol = tolerance();
    for (turn_index, turn) in turns.iter().enumerate() {
        let half_span = turn.span_dim / 2.0;
        let half_depth = turn.depth_dim / 2.0;
        let violation = Violation {
            invariant: Invariant::TurnWithinBounds,
            entity: Entity::Turn(turn_index),
        };
        let Some(layer) = layers.get(turn.layer) else {
            return Err(violation);
        };
        let in_layer = turn.position.span - half_span >= layer.span.min() - tol
            && turn.position.span + half_span <= layer.span.max() + tol
            && layer.depth.contains(turn.position.depth);
        let in_window = turn.position.span - half_span >= -tol
            && turn.position.span + half_span <= window.span() + tol
            && turn.position.depth - half_depth >= -tol
            && turn.position.depth + half_depth <= window.depth() + tol;
        if !in_layer || !in_window {
            return Err(violation);
        }
    }
    Ok(())
}

fn check_turns_disjoint(layers: &[Layer], turns: &[Turn]) -> Result<(), Violation> {
    let tol = tolerance();
    for (index, turn) in turns.iter().enumerate() {
        for (other_index, other) in turns.iter().enumerate().skip(index + 1) {
            // The parentage and bounds checks confine every turn outline to
            // its section's span, and sections are disjoint, so only
            // same-section pairs can collide.
            let same_section = layers
                .get(turn.layer)
                .zip(layers.get(other.layer))
                .is_some_and(|(a, b)| a.section == b.section);
            if !same_section {
                continue;
            }
            let span_gap = (turn.position.span - other.position.span).abs()
                - (turn.span_dim + other.span_dim) / 2.0;
            let depth_gap = (turn.position.depth - other.position.depth).abs()
                - (turn.depth_dim + other.depth_dim) / 2.0;
            if span_gap < -tol && depth_gap < -tol {
                return Err(Violation {
                    invariant: Invariant::TurnsDisjoint,
                    entity: Entity::Turn(other_index),
                });
            }
        }
    }
    Ok(())
}

fn check_turn_counts(
    windings: &[Winding],
    layers: &[Layer],
    turns: &[Turn],
) -> Result<(), Violation> {
    for (winding_index, winding) in windings.iter().enumerate() {
        let placed = turns.iter().filter(|t| t.winding == winding_index).count();
        if placed != winding.turn_count {
            return Err(Violation {
                invariant: Invariant::TurnCount,
                entity: Entity::Winding(winding_index),
            });
        }
        let organized: usize = layers
            .iter()
            .filter_map(|l| match l.kind {
                LayerKind::Conduction {
                    winding,
                    turn_count,
                } if winding == winding_index => Some(turn_count),
                _ => None,
            })
            .sum();
        if organized != winding.turn_count {
            return Err(Violation {
                invariant: Invariant::TurnCount,
                entity: Entity::Winding(winding_index),
            });
        }
    }
    Ok(())
}
