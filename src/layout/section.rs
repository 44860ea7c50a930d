//! Section allocation: splitting the window span among windings.
//!
//! One repetition unit is the configured pattern; the full run is that unit
//! repeated. Each pattern entry becomes one conduction section, and adjacent
//! conduction sections of different windings are separated by an insulation
//! section when an inter-winding insulation thickness is configured.
//!
//! Proportions are normalized against the net span: the window span less all
//! insulation sections and all margin tape. A winding's net share is divided
//! evenly among its appearances in the run. The allocator never reorders
//! sections to improve packing; slack removal is the compactor's job.

use uom::{ConstZero, si::f64::Length};

use crate::support::geometry::Extent;

use super::{
    config::{LayoutConfig, MarginSpec},
    error::{InfeasibleError, LayoutError, SpecificationError},
    input::{Winding, WindingWindow},
};

/// What a section holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    /// Turns of one winding.
    Conduction { winding: usize },
    /// Inter-winding insulation.
    Insulation,
}

/// A contiguous sub-region of the window along the span axis.
///
/// Sections span the full window depth; their layers stack within it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Section {
    pub kind: SectionKind,
    /// Occupied range along the span axis, margins included.
    pub span: Extent,
    /// Margin tape at the two span ends.
    pub margin: MarginSpec,
}

impl Section {
    /// The owning winding index, for conduction sections.
    pub fn winding(&self) -> Option<usize> {
        match self.kind {
            SectionKind::Conduction { winding } => Some(winding),
            SectionKind::Insulation => None,
        }
    }

    /// Whether this section holds turns.
    pub fn is_conduction(&self) -> bool {
        matches!(self.kind, SectionKind::Conduction { .. })
    }

    /// The span range available to turns, net of margin tape.
    ///
    /// # Errors
    ///
    /// Returns [`InfeasibleError::SectionTooNarrow`] if the margins consume
    /// the section; `index` is reported as the offending entity.
    pub fn usable_span(&self, index: usize) -> Result<Extent, InfeasibleError> {
        self.span
            .inset(self.margin.leading(), self.margin.trailing())
            .map_err(|_| InfeasibleError::SectionTooNarrow { section: index })
    }
}

/// Checks the per-winding inputs the configuration cannot see.
pub(super) fn validate_windings(windings: &[Winding]) -> Result<(), SpecificationError> {
    for (index, winding) in windings.iter().enumerate() {
        if winding.turn_count == 0 {
            return Err(SpecificationError::ZeroTurns { winding: index });
        }
        if winding.wire.span_dim() <= Length::ZERO || winding.wire.depth_dim() <= Length::ZERO {
            return Err(SpecificationError::ZeroWireDimension { winding: index });
        }
    }
    Ok(())
}

/// Splits the window span into the ordered section run.
pub(super) fn plan_sections(
    windings: &[Winding],
    window: &WindingWindow,
    config: &LayoutConfig,
) -> Result<Vec<Section>, LayoutError> {
    config.validate(windings.len())?;
    validate_windings(windings)?;

    let sequence = config.sequence();
    let insulate = config.insulation_thickness > Length::ZERO;
    let gap_count = if insulate {
        sequence.windows(2).filter(|pair| pair[0] != pair[1]).count()
    } else {
        0
    };
    let insulation_total = config.insulation_thickness * gap_count as f64;
    if insulation_total >= window.span() {
        return Err(InfeasibleError::InsulationExceedsWindow {
            required: insulation_total,
            available: window.span(),
        }
        .into());
    }

    let margin_total: Length = sequence.iter().map(|&w| config.margin_for(w).total()).sum();
    let net = window.span() - insulation_total - margin_total;
    if net <= Length::ZERO {
        return Err(InfeasibleError::MarginsExceedWindow.into());
    }

    let mut appearances = vec![0usize; windings.len()];
    for &w in &sequence {
        appearances[w] += 1;
    }

    let mut sections = Vec::with_capacity(sequence.len() + gap_count);
    let mut cursor = Length::ZERO;
    let mut previous: Option<usize> = None;
    for &w in &sequence {
        if insulate && previous.is_some_and(|p| p != w) {
            let span = extent_at(cursor, config.insulation_thickness)?;
            sections.push(Section {
                kind: SectionKind::Insulation,
                span,
                margin: MarginSpec::none(),
            });
            cursor += config.insulation_thickness;
        }

        let margin = config.margin_for(w);
        let share = net * (*config.proportions[w].as_ref() / appearances[w] as f64);
        if share <= Length::ZERO {
            return Err(InfeasibleError::SectionTooNarrow {
                section: sections.len(),
            }
            .into());
        }
        let extent = share + margin.total();
        let span = extent_at(cursor, extent)?;
        sections.push(Section {
            kind: SectionKind::Conduction { winding: w },
            span,
            margin,
        });
        cursor += extent;
        previous = Some(w);
    }

    Ok(sections)
}

fn extent_at(start: Length, length: Length) -> Result<Extent, LayoutError> {
    Extent::from_start(start, length)
        .map_err(|_| InfeasibleError::MarginsExceedWindow.into())
}

/// Returns a copy of the section run with one section's margin tape replaced.
///
/// The section's overall extent is unchanged; the new margins shrink or grow
/// the usable span inside it. Re-run the layer and turn stages afterwards.
///
/// # Errors
///
/// Returns an error if `index` does not name a section.
pub fn add_margin_to_section(
    sections: &[Section],
    index: usize,
    margin: MarginSpec,
) -> Result<Vec<Section>, SpecificationError> {
    if index >= sections.len() {
        return Err(SpecificationError::SectionIndexOutOfRange {
            index,
            count: sections.len(),
        });
    }
    let mut updated = sections.to_vec();
    updated[index].margin = margin;
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use uom::si::length::millimeter;

    use crate::layout::input::WireSpec;

    fn mm(value: f64) -> Length {
        Length::new::<millimeter>(value)
    }

    fn two_windings() -> Vec<Winding> {
        vec![
            Winding::new("Primary", 20, WireSpec::round(mm(0.5)).unwrap()),
            Winding::new("Secondary", 5, WireSpec::round(mm(0.5)).unwrap()),
        ]
    }

    #[test]
    fn equal_proportions_split_the_span() {
        let windings = two_windings();
        let window = WindingWindow::new(mm(10.0), mm(5.0)).unwrap();
        let config = LayoutConfig::new(1, &[0.5, 0.5], &[0, 1]).unwrap();

        let sections = plan_sections(&windings, &window, &config).unwrap();
        assert_eq!(sections.len(), 2);
        assert_relative_eq!(sections[0].span.length().get::<millimeter>(), 5.0);
        assert_relative_eq!(sections[1].span.length().get::<millimeter>(), 5.0);
        assert_eq!(sections[0].winding(), Some(0));
        assert_eq!(sections[1].winding(), Some(1));
    }

    #[test]
    fn interleaved_run_inserts_insulation_between_windings() {
        let windings = two_windings();
        let window = WindingWindow::new(mm(10.0), mm(5.0)).unwrap();
        let config = LayoutConfig::new(2, &[0.5, 0.5], &[0, 1])
            .unwrap()
            .with_insulation_thickness(mm(0.2));

        let sections = plan_sections(&windings, &window, &config).unwrap();
        // Four conduction sections with three insulation gaps between them.
        assert_eq!(sections.len(), 7);
        let conduction: Vec<_> = sections
            .iter()
            .filter_map(super::Section::winding)
            .collect();
        assert_eq!(conduction, vec![0, 1, 0, 1]);
        assert_eq!(
            sections.iter().filter(|s| !s.is_conduction()).count(),
            3
        );
        for gap in sections.iter().filter(|s| !s.is_conduction()) {
            assert_relative_eq!(gap.span.length().get::<millimeter>(), 0.2, epsilon = 1e-9);
        }
    }

    #[test]
    fn interleaved_run_without_insulation_has_no_gaps() {
        let windings = two_windings();
        let window = WindingWindow::new(mm(10.0), mm(5.0)).unwrap();
        let config = LayoutConfig::new(2, &[0.5, 0.5], &[0, 1]).unwrap();

        let sections = plan_sections(&windings, &window, &config).unwrap();
        assert_eq!(sections.len(), 4);
        assert!(sections.iter().all(Section::is_conduction));
    }

    #[test]
    fn repeated_winding_shares_are_divided_evenly() {
        let windings = two_windings();
        let window = WindingWindow::new(mm(12.0), mm(5.0)).unwrap();
        let config = LayoutConfig::new(2, &[0.5, 0.5], &[0, 1]).unwrap();

        let sections = plan_sections(&windings, &window, &config).unwrap();
        // Each winding appears twice; each appearance gets half its share.
        for section in &sections {
            assert_relative_eq!(section.span.length().get::<millimeter>(), 3.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn sections_are_ordered_and_adjacent() {
        let windings = two_windings();
        let window = WindingWindow::new(mm(10.0), mm(5.0)).unwrap();
        let config = LayoutConfig::new(2, &[0.5, 0.5], &[0, 1])
            .unwrap()
            .with_insulation_thickness(mm(0.1));

        let sections = plan_sections(&windings, &window, &config).unwrap();
        for pair in sections.windows(2) {
            assert_relative_eq!(
                pair[0].span.max().get::<millimeter>(),
                pair[1].span.min().get::<millimeter>()
            );
        }
    }

    #[test]
    fn proportion_growth_never_shrinks_a_windings_share() {
        let windings = two_windings();
        let window = WindingWindow::new(mm(10.0), mm(5.0)).unwrap();

        let narrow = LayoutConfig::new(1, &[0.4, 0.6], &[0, 1]).unwrap();
        let wide = LayoutConfig::new(1, &[0.6, 0.4], &[0, 1]).unwrap();

        let narrow_sections = plan_sections(&windings, &window, &narrow).unwrap();
        let wide_sections = plan_sections(&windings, &window, &wide).unwrap();
        assert!(
            wide_sections[0].span.length() > narrow_sections[0].span.length(),
            "a larger proportion must yield at least as much span"
        );
    }

    #[test]
    fn margins_reserve_span_before_normalization() {
        let windings = two_windings();
        let window = WindingWindow::new(mm(10.0), mm(5.0)).unwrap();
        let margin = MarginSpec::new(mm(0.5), mm(0.5)).unwrap();
        let config = LayoutConfig::new(1, &[0.5, 0.5], &[0, 1])
            .unwrap()
            .with_margins(vec![margin, MarginSpec::none()]);

        let sections = plan_sections(&windings, &window, &config).unwrap();
        // Net span is 9mm; each winding nets 4.5mm, plus 1mm of margin tape
        // back onto the first section.
        assert_relative_eq!(
            sections[0].span.length().get::<millimeter>(),
            5.5,
            epsilon = 1e-9
        );
        assert_relative_eq!(
            sections[1].span.length().get::<millimeter>(),
            4.5,
            epsilon = 1e-9
        );
        assert_relative_eq!(
            sections[0].usable_span(0).unwrap().length().get::<millimeter>(),
            4.5,
            epsilon = 1e-9
        );
    }

    #[test]
    fn oversized_margins_are_infeasible_not_clamped() {
        let windings = two_windings();
        let window = WindingWindow::new(mm(4.0), mm(5.0)).unwrap();
        let margin = MarginSpec::new(mm(1.5), mm(1.5)).unwrap();
        let config = LayoutConfig::new(1, &[0.5, 0.5], &[0, 1])
            .unwrap()
            .with_margins(vec![margin, margin]);

        let result = plan_sections(&windings, &window, &config);
        assert!(matches!(
            result,
            Err(LayoutError::Infeasible(InfeasibleError::MarginsExceedWindow))
        ));
    }

    #[test]
    fn insulation_wider_than_window_is_infeasible() {
        let windings = two_windings();
        let window = WindingWindow::new(mm(1.0), mm(5.0)).unwrap();
        let config = LayoutConfig::new(2, &[0.5, 0.5], &[0, 1])
            .unwrap()
            .with_insulation_thickness(mm(0.5));

        let result = plan_sections(&windings, &window, &config);
        assert!(matches!(
            result,
            Err(LayoutError::Infeasible(
                InfeasibleError::InsulationExceedsWindow { .. }
            ))
        ));
    }

    #[test]
    fn margin_editing_preserves_extent() {
        let windings = two_windings();
        let window = WindingWindow::new(mm(10.0), mm(5.0)).unwrap();
        let config = LayoutConfig::new(1, &[0.5, 0.5], &[0, 1]).unwrap();
        let sections = plan_sections(&windings, &window, &config).unwrap();

        let margin = MarginSpec::new(mm(0.4), mm(0.6)).unwrap();
        let updated = add_margin_to_section(&sections, 1, margin).unwrap();
        assert_eq!(updated[1].margin, margin);
        assert_eq!(updated[1].span, sections[1].span);
        assert_eq!(updated[0], sections[0]);

        assert!(matches!(
            add_margin_to_section(&sections, 9, margin),
            Err(SpecificationError::SectionIndexOutOfRange { index: 9, count: 2 })
        ));
    }
}
