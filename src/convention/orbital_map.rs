//! Broadcasting of a [`ConventionTable`] over the global orbital index tables, and the dense and
//! sparse transforms built on it.

use std::fmt;

use itertools::Itertools;
use ndarray::{ArrayBase, ArrayD, Axis, DataMut, Dimension, Zip};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::basis::index::IndexTables;
use crate::convention::ConventionTable;
use crate::error::{ensure_config, ensure_index, AoNormError, AoNormResult};
use crate::sparse::{accumulate, CooMatrix, CsrMatrix, Scalar};

#[cfg(test)]
#[path = "orbital_map_tests.rs"]
mod orbital_map_tests;

// ----------
// FoldingMap
// ----------

/// A validated map from supercell (periodic-image) orbital indices onto unit-cell orbital
/// indices. Several supercell orbitals may fold onto the same unit-cell orbital.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "FoldingMapRaw")]
pub struct FoldingMap {
    orb_sc2orb_uc: Vec<usize>,

    norbs_uc: usize,
}

/// Unvalidated form of [`FoldingMap`] as read from serialised data.
#[derive(Deserialize)]
struct FoldingMapRaw {
    orb_sc2orb_uc: Vec<usize>,
    norbs_uc: usize,
}

impl TryFrom<FoldingMapRaw> for FoldingMap {
    type Error = AoNormError;

    fn try_from(raw: FoldingMapRaw) -> Result<Self, Self::Error> {
        Self::new(raw.orb_sc2orb_uc, raw.norbs_uc)
    }
}

impl FoldingMap {
    /// Constructs a folding map.
    ///
    /// # Arguments
    ///
    /// * `orb_sc2orb_uc` - The unit-cell orbital of every supercell orbital.
    /// * `norbs_uc` - The number of unit-cell orbitals.
    ///
    /// # Errors
    ///
    /// Errors with [`AoNormError::Index`] if any supercell orbital maps outside `0..norbs_uc`.
    pub fn new(orb_sc2orb_uc: Vec<usize>, norbs_uc: usize) -> AoNormResult<Self> {
        if let Some((sc, uc)) = orb_sc2orb_uc
            .iter()
            .enumerate()
            .find(|(_, &uc)| uc >= norbs_uc)
        {
            return Err(AoNormError::Index(format!(
                "Supercell orbital {sc} folds onto orbital {uc}, outside of the {norbs_uc} unit-cell orbitals."
            )));
        }
        Ok(Self {
            orb_sc2orb_uc,
            norbs_uc,
        })
    }

    /// The trivial folding map of a cell onto itself.
    pub fn identity(norbs: usize) -> Self {
        Self {
            orb_sc2orb_uc: (0..norbs).collect(),
            norbs_uc: norbs,
        }
    }

    /// The number of supercell orbitals.
    pub fn norbs_sc(&self) -> usize {
        self.orb_sc2orb_uc.len()
    }

    /// The number of unit-cell orbitals.
    pub fn norbs_uc(&self) -> usize {
        self.norbs_uc
    }

    /// The unit-cell orbital of every supercell orbital.
    pub fn as_slice(&self) -> &[usize] {
        &self.orb_sc2orb_uc
    }

    /// Folds a supercell orbital index onto the unit cell.
    ///
    /// # Errors
    ///
    /// Errors with [`AoNormError::Index`] if `sc` is not a supercell orbital index.
    pub fn fold(&self, sc: usize) -> AoNormResult<usize> {
        self.orb_sc2orb_uc.get(sc).copied().ok_or_else(|| {
            AoNormError::Index(format!(
                "Supercell orbital index {sc} is out of range for {} supercell orbitals.",
                self.norbs_sc()
            ))
        })
    }
}

// ----------
// OrbitalMap
// ----------

/// The per-orbital form of a basis-convention transform: orbital `o` of the source goes to
/// canonical orbital `dest[o]`, multiplied by `signs[o]`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OrbitalMap {
    dest: Vec<usize>,

    signs: Vec<f64>,
}

impl OrbitalMap {
    /// Broadcasts a convention table over per-orbital angular-momentum and magnetic-quantum-number
    /// arrays.
    ///
    /// # Arguments
    ///
    /// * `orb2j` - The angular momentum of every orbital.
    /// * `orb2m` - The canonical magnetic quantum number of every orbital. Shells must appear as
    ///   contiguous runs of $`m = -j, \ldots, +j`$.
    /// * `norbs` - The declared number of orbitals.
    /// * `table` - The convention of the source.
    ///
    /// # Errors
    ///
    /// Errors with [`AoNormError::Configuration`] if the array lengths differ from `norbs`, if the
    /// shells are malformed, or if an angular momentum has no entry in `table`.
    pub fn new(
        orb2j: &[u32],
        orb2m: &[i32],
        norbs: usize,
        table: &ConventionTable,
    ) -> AoNormResult<Self> {
        ensure_config!(
            orb2m.len() == norbs,
            "`orb2m` has length {} but {norbs} orbitals are declared.",
            orb2m.len()
        );
        ensure_config!(
            orb2j.len() == norbs,
            "`orb2j` has length {} but {norbs} orbitals are declared.",
            orb2j.len()
        );
        let mut dest = Vec::with_capacity(norbs);
        let mut signs = Vec::with_capacity(norbs);
        let mut start = 0;
        while start < norbs {
            let j = orb2j[start];
            let shell = table.get(j)?;
            let ncomps = shell.ncomps();
            ensure_config!(
                start + ncomps <= norbs,
                "The shell starting at orbital {start} with j = {j} is truncated."
            );
            let j_i32 = j as i32;
            ensure_config!(
                (0..ncomps).all(|k| orb2j[start + k] == j && orb2m[start + k] == k as i32 - j_i32),
                "Orbitals {start}..{} do not form a shell with j = {j} and ascending m.",
                start + ncomps
            );
            dest.extend(shell.image().iter().map(|pos| start + pos));
            signs.extend_from_slice(shell.signs());
            start += ncomps;
        }
        log::debug!(
            "Orbital map for convention `{}` built over {norbs} orbitals.",
            table.name()
        );
        Ok(Self { dest, signs })
    }

    /// Broadcasts a convention table over global index tables.
    pub fn from_tables(tables: &IndexTables, table: &ConventionTable) -> AoNormResult<Self> {
        Self::new(tables.orb2j(), tables.orb2m(), tables.norbs(), table)
    }

    /// The number of orbitals.
    pub fn norbs(&self) -> usize {
        self.dest.len()
    }

    /// The canonical destination of every source orbital.
    pub fn dest(&self) -> &[usize] {
        &self.dest
    }

    /// The sign of every source orbital.
    pub fn signs(&self) -> &[f64] {
        &self.signs
    }

    /// Returns `true` if no orbital is moved.
    pub fn is_sign_only(&self) -> bool {
        self.dest.iter().enumerate().all(|(o, &d)| o == d)
    }

    /// The map of the reverse transform, from canonical back to source.
    pub fn inverse(&self) -> Self {
        let mut dest = vec![0; self.norbs()];
        let mut signs = vec![1.0; self.norbs()];
        izip_dest(&self.dest, &self.signs).for_each(|(o, d, s)| {
            dest[d] = o;
            signs[d] = s;
        });
        Self { dest, signs }
    }

    /// Extends this unit-cell map to the supercell orbitals of a folding map: every image block is
    /// permuted and signed exactly as the unit-cell orbitals it folds onto.
    ///
    /// # Errors
    ///
    /// Errors with [`AoNormError::Configuration`] if the folding map is for a different number of
    /// unit-cell orbitals or if its images do not consist of whole shells.
    pub fn to_supercell(&self, folding: &FoldingMap) -> AoNormResult<Self> {
        ensure_config!(
            folding.norbs_uc() == self.norbs(),
            "The folding map targets {} unit-cell orbitals but the orbital map has {}.",
            folding.norbs_uc(),
            self.norbs()
        );
        let norbs_sc = folding.norbs_sc();
        let dest = folding
            .as_slice()
            .iter()
            .enumerate()
            .map(|(sc, &uc)| {
                let shifted = sc as isize + self.dest[uc] as isize - uc as isize;
                usize::try_from(shifted)
                    .ok()
                    .filter(|&d| d < norbs_sc)
                    .ok_or_else(|| {
                        AoNormError::Configuration(format!(
                            "Supercell orbital {sc} does not belong to a complete shell image."
                        ))
                    })
            })
            .collect::<AoNormResult<Vec<_>>>()?;
        ensure_config!(
            dest.iter().all_unique(),
            "The supercell images do not consist of whole shells."
        );
        let signs = folding
            .as_slice()
            .iter()
            .map(|&uc| self.signs[uc])
            .collect_vec();
        Ok(Self { dest, signs })
    }

    fn check_len(&self, len: usize, what: &str) -> AoNormResult<()> {
        ensure_config!(
            len == self.norbs(),
            "{what} has {len} orbitals but the orbital map has {}.",
            self.norbs()
        );
        Ok(())
    }

    // -----------------
    // Dense transforms
    // -----------------

    /// Transforms an arbitrary-rank array in place along its orbital axis. Every lane along `axis`
    /// is permuted and sign-multiplied independently; lanes are processed in parallel.
    ///
    /// # Errors
    ///
    /// Errors with [`AoNormError::Configuration`] if `axis` does not exist or if its length differs
    /// from the number of orbitals.
    pub fn transform_dense<T, S, D>(&self, arr: &mut ArrayBase<S, D>, axis: Axis) -> AoNormResult<()>
    where
        T: Scalar,
        S: DataMut<Elem = T>,
        D: Dimension,
    {
        ensure_config!(
            axis.index() < arr.ndim(),
            "Axis {} does not exist in an array of rank {}.",
            axis.index(),
            arr.ndim()
        );
        self.check_len(arr.len_of(axis), "The orbital axis")?;
        Zip::from(arr.lanes_mut(axis)).par_for_each(|mut lane| {
            let source = lane.to_vec();
            source
                .into_iter()
                .zip(self.dest.iter().zip(self.signs.iter()))
                .for_each(|(value, (&d, &s))| lane[d] = value * s);
        });
        Ok(())
    }

    /// Transforms an array in place from canonical back to source convention.
    pub fn inverse_transform_dense<T, S, D>(
        &self,
        arr: &mut ArrayBase<S, D>,
        axis: Axis,
    ) -> AoNormResult<()>
    where
        T: Scalar,
        S: DataMut<Elem = T>,
        D: Dimension,
    {
        self.inverse().transform_dense(arr, axis)
    }

    /// Transforms an array whose orbital axis runs over supercell orbitals.
    pub fn transform_dense_supercell<T, S, D>(
        &self,
        arr: &mut ArrayBase<S, D>,
        axis: Axis,
        folding: &FoldingMap,
    ) -> AoNormResult<()>
    where
        T: Scalar,
        S: DataMut<Elem = T>,
        D: Dimension,
    {
        self.to_supercell(folding)?.transform_dense(arr, axis)
    }

    /// Transforms independent arrays in parallel, all along the same orbital axis.
    pub fn transform_dense_batch<T: Scalar>(
        &self,
        arrs: &mut [ArrayD<T>],
        axis: Axis,
    ) -> AoNormResult<()> {
        arrs.par_iter_mut()
            .map(|arr| self.transform_dense(arr, axis))
            .collect::<AoNormResult<Vec<_>>>()
            .map(|_| ())
    }

    // ------------------
    // Sparse transforms
    // ------------------

    /// Transforms a sparse matrix into the canonical convention.
    ///
    /// If `folding` is given, row and column indices are first folded from supercell to unit-cell
    /// orbitals. Every entry then has its row and column remapped, with the product of both signs
    /// applied to its value. Entries landing on the same (row, column) are summed, which realises
    /// the periodic-image summation into the unit cell. The result is an `norbs x norbs` matrix
    /// with entries in row-major order.
    ///
    /// # Errors
    ///
    /// Errors with [`AoNormError::Configuration`] if the matrix (without folding) or the folding
    /// map does not match the number of orbitals, and with [`AoNormError::Index`] if an index falls
    /// outside of the folding map.
    pub fn transform_sparse<T: Scalar>(
        &self,
        mat: &CooMatrix<T>,
        folding: Option<&FoldingMap>,
    ) -> AoNormResult<CooMatrix<T>> {
        let norbs = self.norbs();
        match folding {
            Some(fm) => ensure_config!(
                fm.norbs_uc() == norbs,
                "The folding map targets {} unit-cell orbitals but the orbital map has {norbs}.",
                fm.norbs_uc()
            ),
            None => ensure_config!(
                mat.shape() == (norbs, norbs),
                "A {} x {} matrix cannot be transformed over {norbs} orbitals.",
                mat.shape().0,
                mat.shape().1
            ),
        }
        let fold = |idx: usize| match folding {
            Some(fm) => fm.fold(idx),
            None => Ok(idx),
        };
        let mapped = (0..mat.nnz())
            .into_par_iter()
            .map(|i| {
                let r = fold(mat.rows()[i])?;
                let c = fold(mat.cols()[i])?;
                Ok((
                    self.dest[r],
                    self.dest[c],
                    mat.values()[i] * (self.signs[r] * self.signs[c]),
                ))
            })
            .collect::<AoNormResult<Vec<_>>>()?;
        Ok(accumulate((norbs, norbs), mapped))
    }

    /// Transforms a canonical sparse matrix back into the source convention.
    pub fn inverse_transform_sparse<T: Scalar>(
        &self,
        mat: &CooMatrix<T>,
    ) -> AoNormResult<CooMatrix<T>> {
        self.inverse().transform_sparse(mat, None)
    }

    /// Transforms independent sparse matrices in parallel.
    pub fn transform_sparse_batch<T: Scalar>(
        &self,
        mats: &[CooMatrix<T>],
        folding: Option<&FoldingMap>,
    ) -> AoNormResult<Vec<CooMatrix<T>>> {
        mats.par_iter()
            .map(|mat| self.transform_sparse(mat, folding))
            .collect()
    }

    /// Applies a sign-only transform to a compressed-row matrix in place, keeping its sparsity
    /// pattern. With a folding map, row and column indices are supercell indices whose signs are
    /// looked up through their unit-cell orbitals; the columns are not folded.
    ///
    /// # Errors
    ///
    /// Errors with [`AoNormError::Configuration`] if this map permutes orbitals or the shapes do
    /// not match, and with [`AoNormError::Index`] if an index falls outside of the folding map.
    pub fn transform_csr_signs_inplace<T: Scalar>(
        &self,
        csr: &mut CsrMatrix<T>,
        folding: Option<&FoldingMap>,
    ) -> AoNormResult<()> {
        ensure_config!(
            self.is_sign_only(),
            "An in-place compressed-row transform requires a sign-only convention."
        );
        let (nrows, ncols) = csr.shape();
        match folding {
            Some(fm) => {
                ensure_config!(
                    fm.norbs_uc() == self.norbs(),
                    "The folding map targets {} unit-cell orbitals but the orbital map has {}.",
                    fm.norbs_uc(),
                    self.norbs()
                );
                ensure_index!(
                    nrows <= fm.norbs_sc() && ncols <= fm.norbs_sc(),
                    "A {nrows} x {ncols} matrix exceeds the {} supercell orbitals.",
                    fm.norbs_sc()
                );
            }
            None => self.check_len(nrows.max(ncols), "The compressed-row matrix")?,
        }
        let sign_of = |idx: usize| -> f64 {
            let uc = folding.map_or(idx, |fm| fm.as_slice()[idx]);
            self.signs[uc]
        };
        let row_signs = (0..nrows).map(sign_of).collect_vec();
        let col_signs = csr.indices().iter().map(|&c| sign_of(c)).collect_vec();
        let indptr = csr.indptr().to_vec();
        let data = csr.data_mut();
        for (r, sr) in row_signs.into_iter().enumerate() {
            for ind in indptr[r]..indptr[r + 1] {
                data[ind] = data[ind] * (sr * col_signs[ind]);
            }
        }
        Ok(())
    }
}

fn izip_dest<'a>(
    dest: &'a [usize],
    signs: &'a [f64],
) -> impl Iterator<Item = (usize, usize, f64)> + 'a {
    dest.iter()
        .zip(signs.iter())
        .enumerate()
        .map(|(o, (&d, &s))| (o, d, s))
}

impl fmt::Display for OrbitalMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Orbital map over {} orbitals:", self.norbs())?;
        for chunk in &izip_dest(&self.dest, &self.signs).chunks(8) {
            writeln!(
                f,
                "  {}",
                chunk
                    .map(|(o, d, s)| format!("{o}->{}{d}", if s < 0.0 { "-" } else { "+" }))
                    .join("  ")
            )?;
        }
        Ok(())
    }
}
