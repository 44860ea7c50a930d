//! Turn placement: the exact coordinate of every turn.
//!
//! Within a layer, turn centers advance monotonically along the span axis by
//! one pitch (wire span dimension plus configured spacing) per turn. The
//! alignment policy fixes where the occupied block sits in the layer's usable
//! span and how residual slack is distributed. Depth coordinates are the
//! center of the layer's depth slice.

use uom::{ConstZero, si::f64::{Angle, Length}};

use crate::support::geometry::Position;

use super::{
    config::{CoilAlignment, LayoutConfig},
    error::LayoutError,
    input::Winding,
    layer::{Layer, LayerKind},
};

/// One physical turn of wire, the atomic placement unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Turn {
    /// Index of the parent layer.
    pub layer: usize,
    /// Index of the owning winding.
    pub winding: usize,
    /// Center of the turn's outline in the (span, depth) frame.
    pub position: Position,
    /// Rotation of the outline, nonzero for edge-wound rectangular wire.
    pub rotation: Angle,
    /// Outline dimension along the span axis.
    pub span_dim: Length,
    /// Outline dimension along the depth axis.
    pub depth_dim: Length,
}

/// Places every turn of every conduction layer.
pub(super) fn place_turns(
    windings: &[Winding],
    config: &LayoutConfig,
    layers: &[Layer],
) -> Result<Vec<Turn>, LayoutError> {
    config.validate(windings.len())?;

    let mut turns = Vec::new();
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

        let wire = &windings[winding].wire;
        let wire_span = wire.span_dim();
        let wire_depth = wire.depth_dim();
        let rotation = wire.rotation();
        let pitch = wire_span + config.turn_spacing;

        let lower = layer.span.min() + layer.stagger;
        let upper = layer.span.max();
        let block = wire_span * turn_count as f64 + config.turn_spacing * (turn_count - 1) as f64;
        let free = (upper - lower) - block;

        let (first_center, step) = match config.alignment {
            CoilAlignment::InnerOrTop => (lower + wire_span / 2.0, pitch),
            CoilAlignment::OuterOrBottom => (upper - block + wire_span / 2.0, pitch),
            CoilAlignment::Centered => (lower + free / 2.0 + wire_span / 2.0, pitch),
            CoilAlignment::Spread => {
                if turn_count == 1 {
                    (lower + free / 2.0 + wire_span / 2.0, pitch)
                } else if free > Length::ZERO {
                    (
                        lower + wire_span / 2.0,
                        pitch + free / (turn_count - 1) as f64,
                    )
                } else {
                    // No slack to spread (or overflowing): behave as anchored.
                    (lower + wire_span / 2.0, pitch)
                }
            }
        };

        let depth = layer.depth.center();
        for turn_index in 0..turn_count {
            turns.push(Turn {
                layer: layer_index,
                winding,
                position: Position {
                    span: first_center + step * turn_index as f64,
                    depth,
                },
                rotation,
                span_dim: wire_span,
                depth_dim: wire_depth,
            });
        }
    }

    Ok(turns)
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use uom::si::length::millimeter;

    use crate::layout::{
        config::LayoutConfig,
        input::{WindingWindow, WireMounting, WireSpec},
        layer::organize_layers,
        section::plan_sections,
    };

    fn mm(value: f64) -> Length {
        Length::new::<millimeter>(value)
    }

    fn place(
        windings: &[Winding],
        window: &WindingWindow,
        config: &LayoutConfig,
    ) -> Vec<Turn> {
        let sections = plan_sections(windings, window, config).unwrap();
        let layers = organize_layers(windings, window, config, &sections).unwrap();
        place_turns(windings, config, &layers).unwrap()
    }

    fn spans_mm(turns: &[Turn]) -> Vec<f64> {
        turns
            .iter()
            .map(|t| t.position.span.get::<millimeter>())
            .collect()
    }

    // Unit conversion leaves ~1 ulp of noise on computed coordinates, so
    // exact comparison is too strict.
    fn assert_spans_mm(turns: &[Turn], expected: &[f64]) {
        let spans = spans_mm(turns);
        assert_eq!(spans.len(), expected.len());
        for (&actual, &expected) in spans.iter().zip(expected) {
            assert_relative_eq!(actual, expected, epsilon = 1e-9);
        }
    }

    #[test]
    fn inner_alignment_anchors_at_the_lower_bound() {
        let windings = vec![Winding::new("L", 3, WireSpec::round(mm(1.0)).unwrap())];
        let window = WindingWindow::new(mm(10.0), mm(5.0)).unwrap();
        let config = LayoutConfig::new(1, &[1.0], &[0]).unwrap();

        let turns = place(&windings, &window, &config);
        assert_spans_mm(&turns, &[0.5, 1.5, 2.5]);
    }

    #[test]
    fn outer_alignment_anchors_at_the_upper_bound() {
        let windings = vec![Winding::new("L", 3, WireSpec::round(mm(1.0)).unwrap())];
        let window = WindingWindow::new(mm(10.0), mm(5.0)).unwrap();
        let config = LayoutConfig::new(1, &[1.0], &[0])
            .unwrap()
            .with_alignment(CoilAlignment::OuterOrBottom);

        let turns = place(&windings, &window, &config);
        assert_spans_mm(&turns, &[7.5, 8.5, 9.5]);
    }

    #[test]
    fn centered_alignment_splits_the_slack() {
        let windings = vec![Winding::new("L", 3, WireSpec::round(mm(1.0)).unwrap())];
        let window = WindingWindow::new(mm(9.0), mm(5.0)).unwrap();
        let config = LayoutConfig::new(1, &[1.0], &[0])
            .unwrap()
            .with_alignment(CoilAlignment::Centered);

        let turns = place(&windings, &window, &config);
        assert_spans_mm(&turns, &[3.5, 4.5, 5.5]);
    }

    #[test]
    fn spread_alignment_distributes_slack_between_turns() {
        let windings = vec![Winding::new("L", 3, WireSpec::round(mm(1.0)).unwrap())];
        let window = WindingWindow::new(mm(11.0), mm(5.0)).unwrap();
        let config = LayoutConfig::new(1, &[1.0], &[0])
            .unwrap()
            .with_alignment(CoilAlignment::Spread);

        let turns = place(&windings, &window, &config);
        // 3 turns of 1mm in 11mm: 8mm of slack, 4mm between consecutive turns.
        assert_spans_mm(&turns, &[0.5, 5.5, 10.5]);
    }

    #[test]
    fn margin_tape_shifts_the_first_turn_inward() {
        let windings = vec![Winding::new("L", 3, WireSpec::round(mm(1.0)).unwrap())];
        let window = WindingWindow::new(mm(10.0), mm(5.0)).unwrap();
        let margin = super::super::config::MarginSpec::new(mm(2.0), mm(1.0)).unwrap();
        let config = LayoutConfig::new(1, &[1.0], &[0])
            .unwrap()
            .with_margins(vec![margin]);

        let turns = place(&windings, &window, &config);
        assert_relative_eq!(spans_mm(&turns)[0], 2.5, epsilon = 1e-9);
    }

    #[test]
    fn turn_spacing_stretches_the_pitch() {
        let windings = vec![Winding::new("L", 3, WireSpec::round(mm(1.0)).unwrap())];
        let window = WindingWindow::new(mm(10.0), mm(5.0)).unwrap();
        let config = LayoutConfig::new(1, &[1.0], &[0])
            .unwrap()
            .with_turn_spacing(mm(0.5));

        let turns = place(&windings, &window, &config);
        assert_spans_mm(&turns, &[0.5, 2.0, 3.5]);
    }

    #[test]
    fn edge_wound_turns_carry_rotation_and_swapped_outline() {
        let wire = WireSpec::rectangular(mm(2.0), mm(0.5), WireMounting::EdgeWound).unwrap();
        let windings = vec![Winding::new("Foil", 4, wire)];
        let window = WindingWindow::new(mm(10.0), mm(5.0)).unwrap();
        let config = LayoutConfig::new(1, &[1.0], &[0]).unwrap();

        let turns = place(&windings, &window, &config);
        assert_eq!(turns.len(), 4);
        for turn in &turns {
            assert_relative_eq!(turn.rotation.get::<uom::si::angle::degree>(), 90.0);
            assert_relative_eq!(turn.span_dim.get::<millimeter>(), 0.5);
            assert_relative_eq!(turn.depth_dim.get::<millimeter>(), 2.0);
        }
    }

    #[test]
    fn second_layer_turns_sit_deeper() {
        let windings = vec![Winding::new("L", 20, WireSpec::round(mm(1.0)).unwrap())];
        let window = WindingWindow::new(mm(10.0), mm(5.0)).unwrap();
        let config = LayoutConfig::new(1, &[1.0], &[0]).unwrap();

        let turns = place(&windings, &window, &config);
        assert_eq!(turns.len(), 20);
        let depths: Vec<_> = turns
            .iter()
            .map(|t| t.position.depth.get::<millimeter>())
            .collect();
        assert_relative_eq!(depths[0], 0.5);
        assert_relative_eq!(depths[10], 1.5);
    }

    #[test]
    fn placement_is_monotone_within_a_layer() {
        let windings = vec![Winding::new("L", 8, WireSpec::round(mm(0.7)).unwrap())];
        let window = WindingWindow::new(mm(10.0), mm(5.0)).unwrap();
        for alignment in CoilAlignment::ALL {
            let config = LayoutConfig::new(1, &[1.0], &[0])
                .unwrap()
                .with_alignment(alignment);
            let turns = place(&windings, &window, &config);
            let spans = spans_mm(&turns);
            for pair in spans.windows(2) {
                assert!(pair[0] < pair[1], "{alignment:?} placement not monotone");
            }
        }
    }
}
