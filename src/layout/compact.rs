//! Compaction: removing free span from a feasible layout.
//!
//! Delimiting shrinks every conduction section to the minimal span its widest
//! layer needs, margin tape included, and packs the section run back against
//! the window start with no gaps other than insulation sections. Layers and
//! turns are then rebuilt inside the shrunken sections, so the configured
//! alignment is re-applied to the new bounds.
//!
//! Compaction only ever tightens: given an already compact layout it returns
//! an equal one, and it refuses input that does not validate rather than
//! trying to repair it.

use uom::{ConstZero, si::f64::Length};

use crate::support::geometry::Extent;

use super::{
    config::LayoutConfig,
    error::{InfeasibleError, LayoutError},
    input::{Winding, WindingWindow},
    layer::{Layer, LayerKind},
    section::{Section, SectionKind},
    turn::{Turn, place_turns},
    validate::check_fit,
};

/// Shrinks sections to their occupied span and re-packs the run.
pub(super) fn delimit_and_compact(
    windings: &[Winding],
    window: &WindingWindow,
    config: &LayoutConfig,
    sections: &[Section],
    layers: &[Layer],
    turns: &[Turn],
) -> Result<(Vec<Section>, Vec<Layer>, Vec<Turn>), LayoutError> {
    if let Err(violation) = check_fit(windings, window, config, sections, layers, turns) {
        return Err(InfeasibleError::Uncompactable { violation }.into());
    }

    let old_total: Length = sections.iter().map(|s| s.span.length()).sum();

    let mut compacted_sections = Vec::with_capacity(sections.len());
    let mut cursor = Length::ZERO;
    for (section_index, section) in sections.iter().enumerate() {
        let extent = match section.kind {
            SectionKind::Insulation => section.span.length(),
            SectionKind::Conduction { .. } => {
                minimal_block(windings, config, layers, section_index) + section.margin.total()
            }
        };
        let span = Extent::from_start(cursor, extent)
            .map_err(|_| InfeasibleError::Uncompactable {
                violation: super::validate::Violation {
                    invariant: super::validate::Invariant::SectionsDisjoint,
                    entity: super::validate::Entity::Section(section_index),
                },
            })?;
        compacted_sections.push(Section {
            kind: section.kind,
            span,
            margin: section.margin,
        });
        cursor += extent;
    }

    let mut compacted_layers = Vec::with_capacity(layers.len());
    for layer in layers {
        let usable = compacted_sections[layer.section]
            .usable_span(layer.section)
            .map_err(LayoutError::from)?;
        compacted_layers.push(Layer {
            section: layer.section,
            kind: layer.kind,
            depth: layer.depth,
            span: usable,
            stagger: layer.stagger,
        });
    }

    let compacted_turns = place_turns(windings, config, &compacted_layers)?;

    check_fit(
        windings,
        window,
        config,
        &compacted_sections,
        &compacted_layers,
        &compacted_turns,
    )
    .map_err(LayoutError::InvariantViolation)?;

    log::debug!(
        "compaction reclaimed {:?} of window span",
        old_total - cursor
    );

    Ok((compacted_sections, compacted_layers, compacted_turns))
}

/// The span the widest layer of a conduction section occupies.
fn minimal_block(
    windings: &[Winding],
    config: &LayoutConfig,
    layers: &[Layer],
    section_index: usize,
) -> Length {
    let mut widest = Length::ZERO;
    for layer in layers.iter().filter(|l| l.section == section_index) {
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
        let wire_span = windings[winding].wire.span_dim();
        let block = layer.stagger
            + wire_span * turn_count as f64
            + config.turn_spacing * (turn_count - 1) as f64;
        if block > widest {
            widest = block;
        }
    }
    widest
}
