//! Supporting utilities used by the layout engine.

pub mod constraint;
pub mod geometry;
