//! Orderings of the real spherical harmonics within a shell.

use std::collections::HashMap;
use std::fmt;
use std::slice::Iter;

use derive_builder::Builder;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::angmom::n_comps;
use crate::error::{ensure_config, AoNormError, AoNormResult};
use crate::permutation::Permutation;

#[cfg(test)]
#[path = "ao_tests.rs"]
mod ao_tests;

// ~~~~~~~~~
// PureOrder
// ~~~~~~~~~

/// Structure to contain information about the ordering of the real spherical harmonics of a
/// certain rank within a shell.
#[derive(Clone, Builder, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PureOrder {
    /// A sequence of $`m`$ values giving the ordering of the functions.
    #[builder(setter(custom))]
    mls: Vec<i32>,

    /// The rank of the shell.
    pub lpure: u32,
}

impl PureOrderBuilder {
    fn mls(&mut self, mls: &[i32]) -> &mut Self {
        self.mls = Some(mls.to_vec());
        self
    }
}

impl PureOrder {
    /// Returns a builder to construct a new [`PureOrder`] structure.
    fn builder() -> PureOrderBuilder {
        PureOrderBuilder::default()
    }

    /// Constructs a new [`PureOrder`] structure from its constituting $`m`$ values. The rank is
    /// deduced from the largest $`|m|`$.
    ///
    /// # Errors
    ///
    /// Errors with [`AoNormError::Configuration`] if `mls` is empty, contains repeats, or does not
    /// contain every $`m`$ in $`[-l, l]`$.
    pub fn new(mls: &[i32]) -> AoNormResult<Self> {
        let lpure = mls
            .iter()
            .map(|m| m.unsigned_abs())
            .max()
            .ok_or_else(|| AoNormError::Configuration("Empty `m` sequence.".to_string()))?;
        let pure_order = PureOrder::builder()
            .lpure(lpure)
            .mls(mls)
            .build()
            .map_err(|err| AoNormError::Configuration(err.to_string()))?;
        ensure_config!(
            pure_order.verify(),
            "Invalid `m` sequence {mls:?} for a shell of rank {lpure}."
        );
        Ok(pure_order)
    }

    /// Constructs a new [`PureOrder`] structure for a specified rank with increasing-$`m`$ order.
    /// This is the canonical order.
    #[must_use]
    pub fn increasingm(lpure: u32) -> Self {
        let lpure_i32 = lpure as i32;
        Self {
            mls: (-lpure_i32..=lpure_i32).collect_vec(),
            lpure,
        }
    }

    /// Constructs a new [`PureOrder`] structure for a specified rank with decreasing-$`m`$ order.
    #[must_use]
    pub fn decreasingm(lpure: u32) -> Self {
        let lpure_i32 = lpure as i32;
        Self {
            mls: (-lpure_i32..=lpure_i32).rev().collect_vec(),
            lpure,
        }
    }

    /// Constructs a new [`PureOrder`] structure for a specified rank with Molden order,
    /// *i.e.* $`0, 1, -1, 2, -2, \ldots`$. This is the order used by most Gaussian-basis codes
    /// that write Molden files.
    #[must_use]
    pub fn molden(lpure: u32) -> Self {
        let lpure_i32 = lpure as i32;
        let mls = (0..=lpure_i32)
            .flat_map(|absm| {
                if absm == 0 {
                    vec![0]
                } else {
                    vec![absm, -absm]
                }
            })
            .collect_vec();
        Self { mls, lpure }
    }

    /// Constructs a new [`PureOrder`] structure for a specified rank with OpenMX order.
    ///
    /// OpenMX lists $`p`$ functions as $`(p_x, p_y, p_z)`$ and $`d`$ functions as
    /// $`(d_{3z^2-r^2}, d_{x^2-y^2}, d_{xy}, d_{xz}, d_{yz})`$. Higher ranks follow Molden order.
    #[must_use]
    pub fn openmx(lpure: u32) -> Self {
        match lpure {
            1 => Self {
                mls: vec![1, -1, 0],
                lpure,
            },
            2 => Self {
                mls: vec![0, 2, -2, 1, -1],
                lpure,
            },
            _ => Self::molden(lpure),
        }
    }

    /// Verifies if this [`PureOrder`] struct is valid.
    #[must_use]
    pub fn verify(&self) -> bool {
        let lpure = self.lpure;
        self.mls.len() == self.ncomps()
            && self.mls.iter().all_unique()
            && self.mls.iter().all(|m| m.unsigned_abs() <= lpure)
    }

    /// Iterates over the constituent $`m`$ values.
    pub fn iter(&'_ self) -> Iter<'_, i32> {
        self.mls.iter()
    }

    /// Returns the number of components in the shell.
    pub fn ncomps(&self) -> usize {
        n_comps(self.lpure)
    }

    /// Returns the permutation sending each slot of `self` to the slot holding the same $`m`$ in
    /// `other`.
    ///
    /// # Errors
    ///
    /// Errors with [`AoNormError::Configuration`] if the two orders are of different ranks.
    pub fn get_perm_of(&self, other: &Self) -> AoNormResult<Permutation> {
        ensure_config!(
            self.lpure == other.lpure,
            "Cannot relate `m` orders of ranks {} and {}.",
            self.lpure,
            other.lpure
        );
        let o_mls: HashMap<&i32, usize> = other
            .mls
            .iter()
            .enumerate()
            .map(|(i, o_m)| (o_m, i))
            .collect();
        let image = self
            .mls
            .iter()
            .map(|s_m| {
                o_mls.get(s_m).copied().ok_or_else(|| {
                    AoNormError::Configuration(format!("`m` = {s_m} not found in {other}."))
                })
            })
            .collect::<AoNormResult<Vec<_>>>()?;
        Permutation::from_image(&image)
    }
}

impl fmt::Display for PureOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Pure (l = {}) ({})",
            self.lpure,
            self.iter().map(|m| m.to_string()).join(", ")
        )
    }
}

impl fmt::Debug for PureOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Pure rank: {}", self.lpure)?;
        writeln!(f, "Order:")?;
        for m in self.iter() {
            writeln!(f, "  {m:?}")?;
        }
        Ok(())
    }
}
