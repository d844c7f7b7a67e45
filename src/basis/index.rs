//! Global numbering of atomic orbitals.
//!
//! Orbitals are numbered by walking atoms in order, then the shells of each atom's species in
//! order, then the magnetic quantum number $`m`$ from $`-j`$ to $`+j`$.

use std::fmt;
use std::ops::Range;

use serde::Serialize;

use crate::angmom::angmom_label;
use crate::auxiliary::atom::Atom;
use crate::basis::species::SpeciesCatalog;
use crate::error::{ensure_config, ensure_index, AoNormError, AoNormResult};

#[cfg(test)]
#[path = "index_tests.rs"]
mod index_tests;

/// Immutable global orbital index tables for a list of atoms and a species catalog.
///
/// The tables are recomputed from scratch whenever the atoms or the catalog change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct IndexTables {
    /// Atom to first global orbital index, of length `natm + 1`. The last entry is `norbs`.
    atom2s: Vec<usize>,

    /// Atom to first global shell (radial orbital) index, of length `natm + 1`. The last entry is
    /// `nbas`.
    atom2mu_s: Vec<usize>,

    /// Global shell to first global orbital index, of length `nbas + 1`. The last entry is
    /// `norbs`.
    mu2orb_s: Vec<usize>,

    /// Global shell to angular momentum, of length `nbas`.
    mu2j: Vec<u32>,

    /// Global shell to atom, of length `nbas`.
    mu2atom: Vec<usize>,

    /// Orbital to angular momentum of its shell.
    orb2j: Vec<u32>,

    /// Orbital to magnetic quantum number.
    orb2m: Vec<i32>,

    /// Orbital to atom.
    orb2atom: Vec<usize>,

    /// Orbital to global shell.
    orb2mu: Vec<usize>,

    /// Atom to species, of length `natm`.
    atom2sp: Vec<usize>,
}

impl IndexTables {
    /// Builds the index tables in a single pass over atoms and shells.
    ///
    /// # Arguments
    ///
    /// * `atoms` - The atoms in global order.
    /// * `catalog` - The species catalog the atoms refer to.
    ///
    /// # Errors
    ///
    /// Errors with [`AoNormError::Configuration`] if an atom refers to a species that is not in
    /// `catalog`.
    pub fn build(atoms: &[Atom], catalog: &SpeciesCatalog) -> AoNormResult<Self> {
        let natm = atoms.len();
        let mut atom2s = Vec::with_capacity(natm + 1);
        let mut atom2mu_s = Vec::with_capacity(natm + 1);
        let mut mu2orb_s = vec![0];
        let mut mu2j = vec![];
        let mut mu2atom = vec![];
        let mut orb2j = vec![];
        let mut orb2m = vec![];
        let mut orb2atom = vec![];
        let mut orb2mu = vec![];
        let mut atom2sp = Vec::with_capacity(natm);

        atom2s.push(0);
        atom2mu_s.push(0);
        for (iatom, atom) in atoms.iter().enumerate() {
            let species = catalog.get(atom.species).ok_or_else(|| {
                AoNormError::Configuration(format!(
                    "Atom {iatom} refers to species {} which is not in the catalog of {} species.",
                    atom.species,
                    catalog.nspecies()
                ))
            })?;
            if species.shells.is_empty() {
                log::warn!(
                    "Atom {iatom} (species `{}`) has no shells and contributes no orbitals.",
                    species.symbol
                );
            }
            for shell in species.shells.iter() {
                let mu = mu2j.len();
                let j = i32::try_from(shell.j).map_err(|_| {
                    AoNormError::Configuration(format!(
                        "Angular momentum {} is too large.",
                        shell.j
                    ))
                })?;
                for m in -j..=j {
                    orb2j.push(shell.j);
                    orb2m.push(m);
                    orb2atom.push(iatom);
                    orb2mu.push(mu);
                }
                mu2j.push(shell.j);
                mu2atom.push(iatom);
                mu2orb_s.push(orb2m.len());
            }
            atom2s.push(orb2m.len());
            atom2mu_s.push(mu2j.len());
            atom2sp.push(atom.species);
        }

        let mut referenced = vec![false; catalog.nspecies()];
        atom2sp.iter().for_each(|&sp| referenced[sp] = true);
        let unused = referenced.iter().filter(|used| !**used).count();
        if unused > 0 {
            log::warn!("{unused} species in the catalog are not referenced by any atom.");
        }
        log::debug!(
            "Index tables built: {natm} atoms, {} shells, {} orbitals.",
            mu2j.len(),
            orb2m.len()
        );

        Ok(Self {
            atom2s,
            atom2mu_s,
            mu2orb_s,
            mu2j,
            mu2atom,
            orb2j,
            orb2m,
            orb2atom,
            orb2mu,
            atom2sp,
        })
    }

    /// The number of atoms.
    pub fn natm(&self) -> usize {
        self.atom2sp.len()
    }

    /// The total number of orbitals.
    pub fn norbs(&self) -> usize {
        self.orb2m.len()
    }

    /// The total number of shells (radial orbitals).
    pub fn nbas(&self) -> usize {
        self.mu2j.len()
    }

    /// Atom to first global orbital index.
    pub fn atom2s(&self) -> &[usize] {
        &self.atom2s
    }

    /// Atom to first global shell index.
    pub fn atom2mu_s(&self) -> &[usize] {
        &self.atom2mu_s
    }

    /// Global shell to first global orbital index.
    pub fn mu2orb_s(&self) -> &[usize] {
        &self.mu2orb_s
    }

    /// Global shell to angular momentum.
    pub fn mu2j(&self) -> &[u32] {
        &self.mu2j
    }

    /// Orbital to angular momentum.
    pub fn orb2j(&self) -> &[u32] {
        &self.orb2j
    }

    /// Orbital to magnetic quantum number.
    pub fn orb2m(&self) -> &[i32] {
        &self.orb2m
    }

    /// Orbital to atom.
    pub fn orb2atom(&self) -> &[usize] {
        &self.orb2atom
    }

    /// Orbital to global shell.
    pub fn orb2mu(&self) -> &[usize] {
        &self.orb2mu
    }

    /// Atom to species.
    pub fn atom2sp(&self) -> &[usize] {
        &self.atom2sp
    }

    /// The first orbital of every shell.
    pub fn ao_loc_nr(&self) -> &[usize] {
        &self.mu2orb_s[..self.nbas()]
    }

    /// The range of global orbital indices on an atom.
    ///
    /// # Errors
    ///
    /// Errors with [`AoNormError::Index`] if `atom` is out of range.
    pub fn atom_orbital_range(&self, atom: usize) -> AoNormResult<Range<usize>> {
        ensure_index!(
            atom < self.natm(),
            "Atom index {atom} is out of range for {} atoms.",
            self.natm()
        );
        Ok(self.atom2s[atom]..self.atom2s[atom + 1])
    }

    /// The range of global orbital indices of a global shell.
    ///
    /// # Errors
    ///
    /// Errors with [`AoNormError::Index`] if `mu` is out of range.
    pub fn shell_orbital_range(&self, mu: usize) -> AoNormResult<Range<usize>> {
        ensure_index!(
            mu < self.nbas(),
            "Shell index {mu} is out of range for {} shells.",
            self.nbas()
        );
        Ok(self.mu2orb_s[mu]..self.mu2orb_s[mu + 1])
    }

    /// Reconstructs the `(atom, shell-within-species, m)` triple of a global orbital.
    ///
    /// # Errors
    ///
    /// Errors with [`AoNormError::Index`] if `orb` is out of range.
    pub fn orbital_info(&self, orb: usize) -> AoNormResult<(usize, usize, i32)> {
        ensure_index!(
            orb < self.norbs(),
            "Orbital index {orb} is out of range for {} orbitals.",
            self.norbs()
        );
        let atom = self.orb2atom[orb];
        let shell = self.orb2mu[orb] - self.atom2mu_s[atom];
        Ok((atom, shell, self.orb2m[orb]))
    }

    /// Checks that a per-orbital array has the length of these tables.
    pub(crate) fn check_norbs(&self, len: usize, what: &str) -> AoNormResult<()> {
        ensure_config!(
            len == self.norbs(),
            "{what} has length {len} but the index tables declare {} orbitals.",
            self.norbs()
        );
        Ok(())
    }
}

/// Returns an owned copy of the orbital-to-angular-momentum array.
pub fn get_orb2j(tables: &IndexTables) -> Vec<u32> {
    tables.orb2j().to_vec()
}

/// Returns an owned copy of the orbital-to-magnetic-quantum-number array.
pub fn get_orb2m(tables: &IndexTables) -> Vec<i32> {
    tables.orb2m().to_vec()
}

impl fmt::Display for IndexTables {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let atom_index_length = self.natm().to_string().chars().count().max(1);
        let width = 34 + atom_index_length;
        writeln!(f, "{}", "┈".repeat(width))?;
        writeln!(
            f,
            " {:>atom_index_length$}  Sp.  Shell  Orbitals",
            "#"
        )?;
        writeln!(f, "{}", "┈".repeat(width))?;
        for atom in 0..self.natm() {
            let mus = self.atom2mu_s[atom]..self.atom2mu_s[atom + 1];
            if mus.is_empty() {
                writeln!(
                    f,
                    " {:>atom_index_length$}  {:<3}  {:<5}  (none)",
                    atom, self.atom2sp[atom], "-"
                )?;
            }
            for (i, mu) in mus.enumerate() {
                let (atom_str, sp_str) = if i == 0 {
                    (atom.to_string(), self.atom2sp[atom].to_string())
                } else {
                    (String::new(), String::new())
                };
                writeln!(
                    f,
                    " {:>atom_index_length$}  {:<3}  {:<5}  {}..{}",
                    atom_str,
                    sp_str,
                    angmom_label(self.mu2j[mu]),
                    self.mu2orb_s[mu],
                    self.mu2orb_s[mu + 1]
                )?;
            }
        }
        writeln!(f, "{}", "┈".repeat(width))?;
        writeln!(
            f,
            " {} atoms, {} shells, {} orbitals",
            self.natm(),
            self.nbas(),
            self.norbs()
        )?;
        Ok(())
    }
}
