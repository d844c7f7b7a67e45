//! Interfaces between `aonorm` and the programs that produce electronic-structure data.
//!
//! Every source plugs in through the [`SourceAdapter`] trait. The adapter supplies a structure,
//! the name of its basis convention and its matrices and tensors in source ordering; a
//! [`NaoSystem`] is then built from it with everything expressed in the canonical orbital index
//! space.

use std::fmt;

use anyhow::{self, ensure, format_err};
use derive_builder::Builder;
use indexmap::IndexMap;
use itertools::Itertools;
use ndarray::{ArrayD, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::auxiliary::structure::Structure;
use crate::basis::index::IndexTables;
use crate::convention::orbital_map::{FoldingMap, OrbitalMap};
use crate::convention::{ConventionKind, ConventionTable};
use crate::error::AoNormResult;
use crate::io::format::{
    aonorm_output, aonorm_warn, log_macsec_begin, log_macsec_end, log_subtitle, nice_bool,
    write_subtitle, AoNormOutput,
};
use crate::sparse::CooMatrix;
use crate::validation::{check_symmetric, overlap_check};

pub mod cli;
pub mod input;

#[cfg(test)]
#[path = "interfaces_tests.rs"]
mod interfaces_tests;

// ----------------------
// Source matrices/tensors
// ----------------------

/// A sparse matrix as provided by a source, in source ordering.
#[derive(Clone, Debug, PartialEq, Builder, Serialize, Deserialize)]
pub struct SourceMatrix {
    /// The name of the matrix, *e.g.* `overlap` or `hamiltonian`.
    #[builder(setter(into))]
    pub name: String,

    /// The matrix in source ordering.
    pub matrix: CooMatrix<f64>,

    /// Whether the matrix is expected to be symmetric.
    #[builder(default = "false")]
    pub symmetric: bool,

    /// Whether the column (and row) indices of the matrix are supercell indices that must be folded
    /// onto the unit cell.
    #[builder(default = "false")]
    pub supercell: bool,
}

impl SourceMatrix {
    /// Returns a builder to construct a [`SourceMatrix`].
    pub fn builder() -> SourceMatrixBuilder {
        SourceMatrixBuilder::default()
    }
}

/// A dense tensor as provided by a source, with one axis running over orbitals in source
/// ordering.
#[derive(Clone, Debug, PartialEq, Builder, Serialize, Deserialize)]
pub struct SourceTensor {
    /// The name of the tensor, *e.g.* `mo_coefficients`.
    #[builder(setter(into))]
    pub name: String,

    /// The tensor.
    pub tensor: ArrayD<f64>,

    /// The axis running over orbitals.
    pub orbital_axis: usize,

    /// Whether the orbital axis runs over supercell orbitals.
    #[builder(default = "false")]
    pub supercell: bool,
}

impl SourceTensor {
    /// Returns a builder to construct a [`SourceTensor`].
    pub fn builder() -> SourceTensorBuilder {
        SourceTensorBuilder::default()
    }
}

// -------------
// SourceAdapter
// -------------

/// Trait for anything that can provide electronic-structure data to `aonorm`.
pub trait SourceAdapter {
    /// Returns the atoms and species of the source.
    fn structure(&self) -> Result<Structure, anyhow::Error>;

    /// Returns the basis convention the source writes its data in.
    fn convention(&self) -> Result<ConventionKind, anyhow::Error>;

    /// Returns the map from supercell to unit-cell orbitals, if the source is periodic.
    fn folding_map(&self, _norbs_uc: usize) -> Result<Option<FoldingMap>, anyhow::Error> {
        Ok(None)
    }

    /// Returns the sparse matrices of the source.
    fn matrices(&self) -> Result<Vec<SourceMatrix>, anyhow::Error> {
        Ok(vec![])
    }

    /// Returns the dense tensors of the source.
    fn dense_tensors(&self) -> Result<Vec<SourceTensor>, anyhow::Error> {
        Ok(vec![])
    }
}

// ---------
// NaoSystem
// ---------

/// A sparse matrix in the canonical convention.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CanonicalMatrix {
    /// The matrix in canonical ordering, folded onto the unit cell if it was given over a
    /// supercell.
    pub matrix: CooMatrix<f64>,

    /// Whether the matrix is expected to be symmetric.
    pub symmetric: bool,
}

/// Structure holding a structure, its orbital index tables and all matrices and tensors of a
/// source, expressed in the canonical convention.
#[derive(Clone, Debug)]
pub struct NaoSystem {
    structure: Structure,

    tables: IndexTables,

    convention: ConventionTable,

    orbital_map: OrbitalMap,

    folding: Option<FoldingMap>,

    matrices: IndexMap<String, CanonicalMatrix>,

    tensors: IndexMap<String, ArrayD<f64>>,
}

impl NaoSystem {
    /// Builds a canonical system from a source adapter.
    ///
    /// Index tables are built from the structure of the source. The convention table covers the
    /// largest angular momentum of the catalog. Sparse matrices are transformed in parallel,
    /// folding supercell matrices onto the unit cell, and dense tensors are transformed along their
    /// declared orbital axes.
    ///
    /// # Errors
    ///
    /// Errors if the adapter fails or if any table, matrix or tensor is inconsistent with the
    /// structure.
    pub fn from_adapter(adapter: &dyn SourceAdapter) -> Result<Self, anyhow::Error> {
        log_macsec_begin("Orbital index normalisation");
        aonorm_output!("");

        let structure = adapter.structure()?;
        let tables = structure.index_tables()?;
        let lmax = structure.catalog().jmax().unwrap_or(0);
        let convention = adapter.convention()?.to_table(lmax)?;
        let orbital_map = OrbitalMap::from_tables(&tables, &convention)?;
        let folding = adapter.folding_map(tables.norbs())?;
        if let Some(fm) = folding.as_ref() {
            ensure!(
                fm.norbs_uc() == tables.norbs(),
                "The folding map targets {} unit-cell orbitals but the structure has {}.",
                fm.norbs_uc(),
                tables.norbs()
            );
        }

        log_subtitle("Structure");
        aonorm_output!("");
        structure.log_output_display();
        aonorm_output!("");
        log_subtitle("Orbital index tables");
        aonorm_output!("");
        tables.log_output_display();
        aonorm_output!("");
        log_subtitle("Basis convention");
        aonorm_output!("");
        convention.log_output_display();
        aonorm_output!("");

        let source_matrices = adapter.matrices()?;
        ensure!(
            source_matrices.iter().map(|sm| &sm.name).all_unique(),
            "Matrix names must be unique."
        );
        let canonical = source_matrices
            .par_iter()
            .map(|sm| -> Result<(String, CanonicalMatrix), anyhow::Error> {
                let fm = if sm.supercell {
                    Some(folding.as_ref().ok_or_else(|| {
                        format_err!(
                            "Matrix `{}` is given over a supercell but no folding map is available.",
                            sm.name
                        )
                    })?)
                } else {
                    None
                };
                let matrix = orbital_map.transform_sparse(&sm.matrix, fm)?;
                Ok((
                    sm.name.clone(),
                    CanonicalMatrix {
                        matrix,
                        symmetric: sm.symmetric,
                    },
                ))
            })
            .collect::<Result<Vec<_>, anyhow::Error>>()?;
        let matrices = canonical.into_iter().collect::<IndexMap<_, _>>();

        let source_tensors = adapter.dense_tensors()?;
        ensure!(
            source_tensors.iter().map(|st| &st.name).all_unique(),
            "Tensor names must be unique."
        );
        let tensors = source_tensors
            .into_iter()
            .map(|st| -> Result<(String, ArrayD<f64>), anyhow::Error> {
                let SourceTensor {
                    name,
                    mut tensor,
                    orbital_axis,
                    supercell,
                } = st;
                if supercell {
                    let fm = folding.as_ref().ok_or_else(|| {
                        format_err!(
                            "Tensor `{name}` is given over a supercell but no folding map is available."
                        )
                    })?;
                    orbital_map.transform_dense_supercell(&mut tensor, Axis(orbital_axis), fm)?;
                } else {
                    orbital_map.transform_dense(&mut tensor, Axis(orbital_axis))?;
                }
                Ok((name, tensor))
            })
            .collect::<Result<IndexMap<_, _>, anyhow::Error>>()?;

        let nao_system = Self {
            structure,
            tables,
            convention,
            orbital_map,
            folding,
            matrices,
            tensors,
        };
        log_subtitle("Canonicalised data");
        aonorm_output!("");
        nao_system.log_output_display();
        log_macsec_end("Orbital index normalisation");
        aonorm_output!("");
        Ok(nao_system)
    }

    /// The structure.
    pub fn structure(&self) -> &Structure {
        &self.structure
    }

    /// The orbital index tables.
    pub fn tables(&self) -> &IndexTables {
        &self.tables
    }

    /// The convention table of the source.
    pub fn convention(&self) -> &ConventionTable {
        &self.convention
    }

    /// The per-orbital map from source to canonical ordering.
    pub fn orbital_map(&self) -> &OrbitalMap {
        &self.orbital_map
    }

    /// The supercell folding map, if any.
    pub fn folding(&self) -> Option<&FoldingMap> {
        self.folding.as_ref()
    }

    /// The canonicalised sparse matrices, by name.
    pub fn matrices(&self) -> &IndexMap<String, CanonicalMatrix> {
        &self.matrices
    }

    /// Returns a canonicalised sparse matrix by name.
    pub fn matrix(&self, name: &str) -> Option<&CooMatrix<f64>> {
        self.matrices.get(name).map(|cm| &cm.matrix)
    }

    /// The canonicalised dense tensors, by name.
    pub fn tensors(&self) -> &IndexMap<String, ArrayD<f64>> {
        &self.tensors
    }

    /// Returns a canonicalised dense tensor by name.
    pub fn tensor(&self, name: &str) -> Option<&ArrayD<f64>> {
        self.tensors.get(name)
    }

    /// Checks every matrix expected to be symmetric.
    ///
    /// # Returns
    ///
    /// The name of each checked matrix with the result of its check.
    pub fn check_symmetries(&self, tol: f64) -> Vec<(String, AoNormResult<f64>)> {
        self.matrices
            .iter()
            .filter(|(_, cm)| cm.symmetric)
            .map(|(name, cm)| (name.clone(), check_symmetric(&cm.matrix, tol)))
            .collect()
    }

    /// Runs [`Self::check_symmetries`] and logs the outcome of every check, warning about each
    /// matrix that fails.
    ///
    /// # Returns
    ///
    /// The number of failed checks.
    pub fn log_symmetry_report(&self, tol: f64) -> usize {
        log_subtitle("Symmetry checks");
        aonorm_output!("");
        let checks = self.check_symmetries(tol);
        if checks.is_empty() {
            aonorm_output!("No matrices are expected to be symmetric.");
        }
        let nfailed = checks
            .iter()
            .filter(|(name, res)| match res {
                Ok(maxdev) => {
                    aonorm_output!("  {name:<20}  max |A - Aᵀ| = {maxdev:.3e}");
                    false
                }
                Err(err) => {
                    aonorm_warn!("  {name:<20}  {err}");
                    true
                }
            })
            .count();
        aonorm_output!("");
        nfailed
    }

    /// Compares the canonicalised `overlap` matrix with an independently computed one.
    ///
    /// # Errors
    ///
    /// Errors if there is no `overlap` matrix, or if [`overlap_check`] fails.
    pub fn overlap_check(
        &self,
        computed: &CooMatrix<f64>,
        tol: f64,
    ) -> Result<f64, anyhow::Error> {
        let reference = self
            .matrix("overlap")
            .ok_or_else(|| format_err!("No `overlap` matrix is available."))?;
        Ok(overlap_check(reference, computed, tol)?)
    }
}

impl fmt::Display for NaoSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_subtitle(f, "Sparse matrices")?;
        if self.matrices.is_empty() {
            writeln!(f, "  (none)")?;
        }
        for (name, cm) in self.matrices.iter() {
            writeln!(
                f,
                "  {name:<20}  {} x {}  nnz = {:<8}  symmetric: {}",
                cm.matrix.shape().0,
                cm.matrix.shape().1,
                cm.matrix.nnz(),
                nice_bool(cm.symmetric)
            )?;
        }
        writeln!(f)?;
        write_subtitle(f, "Dense tensors")?;
        if self.tensors.is_empty() {
            writeln!(f, "  (none)")?;
        }
        for (name, tensor) in self.tensors.iter() {
            writeln!(
                f,
                "  {name:<20}  shape {:?}",
                tensor.shape()
            )?;
        }
        Ok(())
    }
}
