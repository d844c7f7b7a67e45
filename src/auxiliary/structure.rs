//! Structures: atoms together with the species catalog they refer to.

use std::fmt;

use itertools::Itertools;
use nalgebra::Point3;
use ndarray::Array2;
use rayon::prelude::*;
use serde::Serialize;

use crate::auxiliary::atom::Atom;
use crate::basis::index::IndexTables;
use crate::basis::species::{Species, SpeciesCatalog, SpeciesInput};
use crate::error::{ensure_config, ensure_index, AoNormError, AoNormResult};

#[cfg(test)]
#[path = "structure_tests.rs"]
mod structure_tests;

/// Structure owning an ordered list of atoms and the species catalog they refer to. It is
/// immutable after construction; a changed geometry or catalog means a new structure.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Structure {
    atoms: Vec<Atom>,

    catalog: SpeciesCatalog,
}

impl Structure {
    /// Constructs a structure from atoms and an explicit catalog.
    ///
    /// # Errors
    ///
    /// Errors with [`AoNormError::Configuration`] if an atom refers to a species outside
    /// `catalog`.
    pub fn new(atoms: Vec<Atom>, catalog: SpeciesCatalog) -> AoNormResult<Self> {
        if let Some((iatom, atom)) = atoms
            .iter()
            .enumerate()
            .find(|(_, atom)| atom.species >= catalog.nspecies())
        {
            return Err(AoNormError::Configuration(format!(
                "Atom {iatom} refers to species {} but the catalog has only {} species.",
                atom.species,
                catalog.nspecies()
            )));
        }
        Ok(Self { atoms, catalog })
    }

    /// Constructs a structure from per-atom species claims, deducing the catalog.
    ///
    /// # Arguments
    ///
    /// * `claims` - The species claimed by each atom.
    /// * `coordinates` - The position of each atom.
    ///
    /// # Errors
    ///
    /// Errors with [`AoNormError::Configuration`] if the two slices differ in length or if the
    /// claims are inconsistent.
    pub fn from_atom_species(
        claims: &[SpeciesInput],
        coordinates: &[Point3<f64>],
    ) -> AoNormResult<Self> {
        ensure_config!(
            claims.len() == coordinates.len(),
            "{} species claims given for {} atom positions.",
            claims.len(),
            coordinates.len()
        );
        let (catalog, atom2sp) = SpeciesCatalog::from_atom_species(claims)?;
        let atoms = atom2sp
            .into_iter()
            .zip(coordinates.iter())
            .map(|(sp, coord)| Atom::new(sp, *coord))
            .collect_vec();
        Ok(Self { atoms, catalog })
    }

    /// The number of atoms.
    pub fn natm(&self) -> usize {
        self.atoms.len()
    }

    /// The atoms in order.
    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    /// The species catalog.
    pub fn catalog(&self) -> &SpeciesCatalog {
        &self.catalog
    }

    /// The species identifier of every atom.
    pub fn atom2sp(&self) -> Vec<usize> {
        self.atoms.iter().map(|atom| atom.species).collect()
    }

    /// Builds the global orbital index tables of this structure.
    pub fn index_tables(&self) -> AoNormResult<IndexTables> {
        IndexTables::build(&self.atoms, &self.catalog)
    }

    fn species_of(&self, ia: usize) -> AoNormResult<&Species> {
        ensure_index!(
            ia < self.natm(),
            "Atom index {ia} is out of range for {} atoms.",
            self.natm()
        );
        self.catalog.get(self.atoms[ia].species).ok_or_else(|| {
            AoNormError::Configuration(format!("Atom {ia} refers to an unknown species."))
        })
    }

    fn all_species(&self) -> impl Iterator<Item = &Species> + '_ {
        self.atoms
            .iter()
            .filter_map(|atom| self.catalog.get(atom.species))
    }

    /// The species symbol of atom `ia`.
    pub fn atom_symbol(&self, ia: usize) -> AoNormResult<&str> {
        self.species_of(ia).map(|sp| sp.symbol.as_str())
    }

    /// The nuclear charge of atom `ia`.
    pub fn atom_charge(&self, ia: usize) -> AoNormResult<u32> {
        self.species_of(ia).map(|sp| sp.charge)
    }

    /// The nuclear charges of all atoms.
    pub fn atom_charges(&self) -> Vec<u32> {
        self.all_species().map(|sp| sp.charge).collect()
    }

    /// The position of atom `ia`.
    pub fn atom_coord(&self, ia: usize) -> AoNormResult<Point3<f64>> {
        ensure_index!(
            ia < self.natm(),
            "Atom index {ia} is out of range for {} atoms.",
            self.natm()
        );
        Ok(self.atoms[ia].coordinates)
    }

    /// The positions of all atoms as an `natm x 3` array.
    pub fn atom_coords(&self) -> Array2<f64> {
        Array2::from_shape_fn((self.natm(), 3), |(ia, k)| self.atoms[ia].coordinates[k])
    }

    /// The number of core electrons of atom `ia` that are represented by a pseudopotential.
    pub fn atom_nelec_core(&self, ia: usize) -> AoNormResult<f64> {
        self.species_of(ia).map(Species::nelec_core)
    }

    /// The total number of valence electrons of the neutral structure.
    pub fn nelectron(&self) -> f64 {
        self.all_species().map(|sp| sp.valence).sum()
    }

    /// The largest radial cutoff of every atom.
    pub fn atom2rcut(&self) -> Vec<f64> {
        self.all_species().map(Species::rcut).collect()
    }

    /// The electrostatic repulsion energy of point nuclei,
    /// $`\frac{1}{2}\sum_{A \ne B} Z_A Z_B / |\mathbf{R}_A - \mathbf{R}_B|`$.
    ///
    /// # Arguments
    ///
    /// * `charges` - Charges to use instead of the nuclear charges of the atoms.
    /// * `coords` - Positions to use instead of the atom positions.
    ///
    /// # Errors
    ///
    /// Errors with [`AoNormError::Configuration`] if the charges and positions differ in number or
    /// if two charged centres coincide.
    pub fn energy_nuc(
        &self,
        charges: Option<&[f64]>,
        coords: Option<&[Point3<f64>]>,
    ) -> AoNormResult<f64> {
        let chrg = charges.map_or_else(
            || self.atom_charges().into_iter().map(f64::from).collect_vec(),
            <[f64]>::to_vec,
        );
        let crds = coords.map_or_else(
            || self.atoms.iter().map(|atom| atom.coordinates).collect_vec(),
            <[Point3<f64>]>::to_vec,
        );
        ensure_config!(
            chrg.len() == crds.len(),
            "{} charges given for {} positions.",
            chrg.len(),
            crds.len()
        );
        (0..crds.len())
            .tuple_combinations()
            .map(|(a, b)| {
                let qq = chrg[a] * chrg[b];
                if qq == 0.0 {
                    return Ok(0.0);
                }
                let dist = nalgebra::distance(&crds[a], &crds[b]);
                ensure_config!(dist > 0.0, "Charged centres {a} and {b} coincide.");
                Ok(qq / dist)
            })
            .sum()
    }

    /// The Coulomb potential of the point nuclei, $`-\sum_A Z_A / |\mathbf{r} - \mathbf{R}_A|`$, at
    /// every point. Points on a charged nucleus give $`-\infty`$.
    pub fn comp_vnuc_coulomb(&self, points: &[Point3<f64>]) -> Vec<f64> {
        let centres = self
            .atoms
            .iter()
            .zip(self.atom_charges())
            .map(|(atom, z)| (atom.coordinates, f64::from(z)))
            .collect_vec();
        points
            .par_iter()
            .map(|point| {
                centres
                    .iter()
                    .filter(|(_, z)| *z != 0.0)
                    .map(|(centre, z)| -z / nalgebra::distance(centre, point))
                    .sum::<f64>()
            })
            .collect()
    }
}

impl fmt::Display for Structure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let atom_index_length = self.natm().to_string().chars().count().max(1);
        let symbol_length = self
            .catalog
            .iter()
            .map(|sp| sp.symbol.chars().count())
            .max()
            .unwrap_or(1)
            .max(7);
        let width = atom_index_length + symbol_length + 50;
        writeln!(f, "{}", "┈".repeat(width))?;
        writeln!(
            f,
            " {:>atom_index_length$}  {:<symbol_length$}  {:>14}  {:>14}  {:>14}",
            "#", "Species", "x", "y", "z"
        )?;
        writeln!(f, "{}", "┈".repeat(width))?;
        for (ia, atom) in self.atoms.iter().enumerate() {
            let symbol = self
                .catalog
                .get(atom.species)
                .map_or("?", |sp| sp.symbol.as_str());
            writeln!(
                f,
                " {ia:>atom_index_length$}  {symbol:<symbol_length$}  {:>+14.7}  {:>+14.7}  {:>+14.7}",
                atom.coordinates[0], atom.coordinates[1], atom.coordinates[2]
            )?;
        }
        writeln!(f, "{}", "┈".repeat(width))?;
        Ok(())
    }
}
