//! Species, shells and the global numbering of atomic orbitals.

pub mod ao;
pub mod index;
pub mod species;
