//! Atoms and element look-ups.

use std::collections::HashMap;
use std::fmt;

use nalgebra::Point3;
use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "atom_tests.rs"]
mod atom_tests;

/// Conversion factor from Ångström to Bohr.
pub const ANGSTROM_TO_BOHR: f64 = 1.0 / 0.529_177_210_903;

/// A struct storing a look-up of element symbols to give atomic numbers.
pub struct ElementMap<'a> {
    /// A [`HashMap`] from a symbol string to an atomic number.
    pub map: HashMap<&'a str, u32>,
}

impl Default for ElementMap<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl ElementMap<'static> {
    /// Creates a new [`ElementMap`] for all elements in the periodic table.
    #[must_use]
    pub fn new() -> ElementMap<'static> {
        let map = periodic_table::periodic_table()
            .into_iter()
            .map(|element| (element.symbol, element.atomic_number))
            .collect::<HashMap<_, _>>();
        ElementMap { map }
    }
}

impl<'a> ElementMap<'a> {
    /// Returns the atomic number of an element symbol, if known.
    pub fn atomic_number(&self, symbol: &str) -> Option<u32> {
        self.map.get(symbol).copied()
    }
}

/// A struct representing an atom in a structure. An atom owns no orbitals directly: these are
/// derived from its species.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Atom {
    /// The index of the species of this atom in the species catalog.
    pub species: usize,

    /// The Cartesian position of the atom. The length unit must be the same for all atoms in a
    /// structure, typically Bohr.
    pub coordinates: Point3<f64>,
}

impl Atom {
    /// Constructs a new atom.
    ///
    /// # Arguments
    ///
    /// * `species` - The species index of the atom.
    /// * `coordinates` - The Cartesian coordinates of the atom.
    pub fn new(species: usize, coordinates: Point3<f64>) -> Self {
        Self {
            species,
            coordinates,
        }
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Atom (species {}) {:+.7} {:+.7} {:+.7}",
            self.species, self.coordinates[0], self.coordinates[1], self.coordinates[2]
        )
    }
}
