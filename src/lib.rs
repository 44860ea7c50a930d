//! # Coil Layout
//!
//! A constrained placement engine for the windings of magnetic components.
//!
//! Given the winding window of a bobbin or core, a set of windings (turn
//! counts and wire outer geometry), and a layout configuration (pattern,
//! repetitions, proportions, margins, insulation), the engine produces the
//! physical arrangement of the coil: which span of the window each winding
//! occupies, how each section's turns are distributed across layers, and the
//! exact coordinate of every individual turn.
//!
//! ## Crate layout
//!
//! - [`layout`]: The winding pipeline and its data records.
//! - [`support`]: Supporting utilities used by the engine.
//!
//! ## Utility code lifecycle
//!
//! Modules in [`support`] are part of the public API because they're useful,
//! but their APIs are not stable. Breaking changes may occur as needed.

pub mod layout;
pub mod support;
