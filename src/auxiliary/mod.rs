//! Atoms, element data and structures.

pub mod atom;
pub mod structure;
