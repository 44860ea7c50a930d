//! The finished layout and its query surface.

use uom::{ConstZero, si::f64::Length};

use super::{
    config::MarginSpec,
    error::SpecificationError,
    layer::{Layer, LayerKind},
    section::{Section, add_margin_to_section},
    turn::Turn,
    validate::FitReport,
};

/// A complete placed layout: the section run, its layers, every turn, and
/// the fit verdict.
///
/// Produced by [`wind`](super::wind) and the staged entry points. The
/// contained stages are consistent with one another; callers that edit one
/// stage (for example via [`with_section_margin`](Self::with_section_margin))
/// re-run the downstream stages to restore that consistency.
#[derive(Debug, Clone, PartialEq)]
pub struct CoilLayout {
    pub sections: Vec<Section>,
    pub layers: Vec<Layer>,
    pub turns: Vec<Turn>,
    pub fit: FitReport,
}

impl CoilLayout {
    /// Whether every invariant holds.
    pub fn fits(&self) -> bool {
        self.fit.feasible
    }

    /// The conduction sections, in span order.
    pub fn conduction_sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter().filter(|s| s.is_conduction())
    }

    /// The conduction layers holding turns of one winding, in stack order.
    pub fn layers_of_winding(&self, winding: usize) -> impl Iterator<Item = &Layer> {
        self.layers.iter().filter(move |layer| {
            matches!(layer.kind, LayerKind::Conduction { winding: w, .. } if w == winding)
        })
    }

    /// The layers of one section, insulation included.
    pub fn layers_in_section(&self, section: usize) -> impl Iterator<Item = &Layer> {
        self.layers.iter().filter(move |l| l.section == section)
    }

    /// The turns of one winding, in placement order.
    pub fn turns_of_winding(&self, winding: usize) -> impl Iterator<Item = &Turn> {
        self.turns.iter().filter(move |t| t.winding == winding)
    }

    /// The span covered by the section run.
    pub fn occupied_span(&self) -> Length {
        self.sections
            .iter()
            .map(|s| s.span.length())
            .fold(Length::ZERO, |acc, l| acc + l)
    }

    /// A copy of the section run with one section's margin tape replaced.
    ///
    /// Only the sections are updated; pass them back through
    /// [`wind_by_sections`](super::wind_by_sections) to rebuild the rest.
    ///
    /// # Errors
    ///
    /// Returns an error if `section` does not name a section.
    pub fn with_section_margin(
        &self,
        section: usize,
        margin: MarginSpec,
    ) -> Result<Vec<Section>, SpecificationError> {
        add_margin_to_section(&self.sections, section, margin)
    }
}
