//! Basis-convention transforms between a source program's per-shell ordering and sign convention
//! and the canonical one.
//!
//! The canonical convention orders the real spherical harmonics of a shell by increasing
//! $`m`$ from $`-j`$ to $`+j`$ with a fixed sign convention. For every angular momentum $`j`$, a
//! source convention is described by a [`ShellConvention`]: a permutation of the $`2j+1`$ slots of
//! a shell together with one sign per slot. A [`ConventionTable`] collects these by $`j`$. It is
//! constructed explicitly, read-only thereafter, and passed by reference to the transforms in
//! [`orbital_map`].

use std::fmt;

use itertools::Itertools;
use num_traits::Inv;
use serde::{Deserialize, Serialize};

use crate::angmom::{angmom_label, n_comps};
use crate::basis::ao::PureOrder;
use crate::error::{ensure_config, AoNormError, AoNormResult};
use crate::permutation::Permutation;

pub mod orbital_map;

#[cfg(test)]
#[path = "convention_tests.rs"]
mod convention_tests;

// --------------
// ShellConvention
// --------------

/// Structure describing how the functions of one shell in a source convention map onto the
/// canonical convention.
///
/// Source slot `i` holds the function that belongs at canonical within-shell position
/// `perm.image()[i]`, multiplied by `signs[i]`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ShellConvention {
    /// The angular momentum of the shell.
    lpure: u32,

    /// The permutation from source slots to canonical positions.
    perm: Permutation,

    /// The sign applied to each source slot.
    signs: Vec<f64>,
}

impl ShellConvention {
    /// Constructs a shell convention from the $`m`$ order of the source and the sign of each source
    /// slot.
    ///
    /// # Errors
    ///
    /// Errors with [`AoNormError::Configuration`] if the number of signs does not match the shell
    /// size or if a sign is not $`\pm 1`$.
    pub fn new(source_order: &PureOrder, signs: &[f64]) -> AoNormResult<Self> {
        ensure_config!(
            signs.len() == source_order.ncomps(),
            "{} signs given for a shell of {} functions.",
            signs.len(),
            source_order.ncomps()
        );
        ensure_config!(
            signs.iter().all(|s| *s == 1.0 || *s == -1.0),
            "Shell signs must be +1 or -1, got {signs:?}."
        );
        let perm = source_order.get_perm_of(&PureOrder::increasingm(source_order.lpure))?;
        Ok(Self {
            lpure: source_order.lpure,
            perm,
            signs: signs.to_vec(),
        })
    }

    /// Constructs a shell convention whose signs depend only on $`m`$.
    pub fn with_m_signs<F>(source_order: &PureOrder, sign_of_m: F) -> AoNormResult<Self>
    where
        F: Fn(i32) -> f64,
    {
        let signs = source_order.iter().map(|&m| sign_of_m(m)).collect_vec();
        Self::new(source_order, &signs)
    }

    /// The canonical convention for a shell of rank `lpure`.
    pub fn canonical(lpure: u32) -> Self {
        let ncomps = n_comps(lpure);
        Self {
            lpure,
            perm: Permutation::identity(ncomps),
            signs: vec![1.0; ncomps],
        }
    }

    /// The angular momentum of the shell.
    pub fn lpure(&self) -> u32 {
        self.lpure
    }

    /// The number of functions in the shell.
    pub fn ncomps(&self) -> usize {
        self.signs.len()
    }

    /// The canonical within-shell position of each source slot.
    pub fn image(&self) -> &[usize] {
        self.perm.image()
    }

    /// The sign of each source slot.
    pub fn signs(&self) -> &[f64] {
        &self.signs
    }

    /// Returns `true` if the shell is neither permuted nor sign-corrected.
    pub fn is_identity(&self) -> bool {
        self.is_sign_only() && self.signs.iter().all(|s| *s > 0.0)
    }

    /// Returns `true` if the shell is not permuted, although it may be sign-corrected.
    pub fn is_sign_only(&self) -> bool {
        self.perm.is_identity()
    }

    /// The convention of the reverse transform, from canonical back to source.
    pub fn inverse(&self) -> Self {
        let perm_inv = (&self.perm).inv();
        let signs = perm_inv
            .image()
            .iter()
            .map(|&src| self.signs[src])
            .collect_vec();
        Self {
            lpure: self.lpure,
            perm: perm_inv,
            signs,
        }
    }
}

impl fmt::Display for ShellConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lpure_i32 = self.lpure as i32;
        write!(
            f,
            "{}: ({})",
            angmom_label(self.lpure),
            self.image()
                .iter()
                .zip(self.signs.iter())
                .map(|(&pos, &sign)| format!(
                    "{}{}",
                    if sign < 0.0 { "-" } else { "+" },
                    pos as i32 - lpure_i32
                ))
                .join(", ")
        )
    }
}

// ---------------
// ConventionTable
// ---------------

/// A read-only look-up of [`ShellConvention`]s indexed by angular momentum.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConventionTable {
    /// A short name of the convention, used in log output.
    name: String,

    /// Shell conventions for $`j = 0, 1, \ldots`$.
    shells: Vec<ShellConvention>,
}

impl ConventionTable {
    /// Constructs a table from explicit shell conventions.
    ///
    /// # Errors
    ///
    /// Errors with [`AoNormError::Configuration`] if the $`j`$-th entry is not of rank $`j`$.
    pub fn from_shell_conventions(name: &str, shells: Vec<ShellConvention>) -> AoNormResult<Self> {
        for (j, shell) in shells.iter().enumerate() {
            ensure_config!(
                shell.lpure as usize == j,
                "Entry {j} of convention table `{name}` describes a shell of rank {}.",
                shell.lpure
            );
        }
        Ok(Self {
            name: name.to_string(),
            shells,
        })
    }

    fn from_orders<O, S>(name: &str, lmax: u32, order: O, sign_of_m: S) -> Self
    where
        O: Fn(u32) -> PureOrder,
        S: Fn(i32) -> f64 + Copy,
    {
        let shells = (0..=lmax)
            .map(|j| {
                ShellConvention::with_m_signs(&order(j), sign_of_m)
                    .expect("Built-in `m` orders always contain every `m` of their rank.")
            })
            .collect_vec();
        Self {
            name: name.to_string(),
            shells,
        }
    }

    /// The canonical convention up to `lmax`: no permutation, no sign change.
    pub fn canonical(lmax: u32) -> Self {
        Self {
            name: "canonical".to_string(),
            shells: (0..=lmax).map(ShellConvention::canonical).collect(),
        }
    }

    /// The SIESTA convention up to `lmax`: increasing-$`m`$ order with the Condon–Shortley-like
    /// phase $`(-1)^m`$ relative to the canonical real spherical harmonics.
    pub fn siesta(lmax: u32) -> Self {
        Self::from_orders("siesta", lmax, PureOrder::increasingm, |m| {
            if m.rem_euclid(2) == 0 {
                1.0
            } else {
                -1.0
            }
        })
    }

    /// The OpenMX convention up to `lmax`: see [`PureOrder::openmx`], with no sign change.
    pub fn openmx(lmax: u32) -> Self {
        Self::from_orders("openmx", lmax, PureOrder::openmx, |_| 1.0)
    }

    /// The Molden convention up to `lmax`: see [`PureOrder::molden`], with no sign change.
    pub fn molden(lmax: u32) -> Self {
        Self::from_orders("molden", lmax, PureOrder::molden, |_| 1.0)
    }

    /// The decreasing-$`m`$ convention up to `lmax`, with no sign change.
    pub fn decreasingm(lmax: u32) -> Self {
        Self::from_orders("decreasingm", lmax, PureOrder::decreasingm, |_| 1.0)
    }

    /// The name of this convention.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The largest angular momentum with an entry, if any.
    pub fn lmax(&self) -> Option<u32> {
        self.shells.last().map(|shell| shell.lpure)
    }

    /// Returns the shell convention for angular momentum `j`.
    ///
    /// # Errors
    ///
    /// Errors with [`AoNormError::Configuration`] if the table has no entry for `j`.
    pub fn get(&self, j: u32) -> AoNormResult<&ShellConvention> {
        self.shells.get(j as usize).ok_or_else(|| {
            AoNormError::Configuration(format!(
                "Convention table `{}` has no entry for angular momentum {j}.",
                self.name
            ))
        })
    }

    /// Returns `true` if no shell is permuted.
    pub fn is_sign_only(&self) -> bool {
        self.shells.iter().all(ShellConvention::is_sign_only)
    }

    /// Returns `true` if the table leaves every shell unchanged.
    pub fn is_identity(&self) -> bool {
        self.shells.iter().all(ShellConvention::is_identity)
    }

    /// The table of the reverse transform, from canonical back to source.
    pub fn inverse(&self) -> Self {
        Self {
            name: format!("{} (inverse)", self.name),
            shells: self.shells.iter().map(ShellConvention::inverse).collect(),
        }
    }
}

impl fmt::Display for ConventionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Convention `{}` (source slot -> signed canonical m):", self.name)?;
        for shell in self.shells.iter() {
            writeln!(f, "  {shell}")?;
        }
        Ok(())
    }
}

// --------------
// ConventionKind
// --------------

/// A custom shell convention as given in input: the source $`m`$ order and the per-slot signs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CustomShellConvention {
    /// The $`m`$ value held in each source slot.
    pub mls: Vec<i32>,

    /// The sign of each source slot. If absent, all signs are $`+1`$.
    #[serde(default)]
    pub signs: Option<Vec<f64>>,
}

/// Serialisable/deserialisable enumerated type naming the convention of a source program.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
pub enum ConventionKind {
    /// Data are already canonical.
    #[default]
    Canonical,

    /// SIESTA convention, see [`ConventionTable::siesta`].
    Siesta,

    /// OpenMX convention, see [`ConventionTable::openmx`].
    OpenMx,

    /// Molden convention, see [`ConventionTable::molden`].
    Molden,

    /// Decreasing-$`m`$ convention, see [`ConventionTable::decreasingm`].
    DecreasingM,

    /// A custom convention with one entry per angular momentum $`j = 0, 1, \ldots`$.
    Custom(Vec<CustomShellConvention>),
}

impl ConventionKind {
    /// Constructs the convention table up to `lmax`. For [`ConventionKind::Custom`], the table
    /// covers exactly the given entries and `lmax` is ignored.
    ///
    /// # Errors
    ///
    /// Errors with [`AoNormError::Configuration`] if a custom entry is invalid.
    pub fn to_table(&self, lmax: u32) -> AoNormResult<ConventionTable> {
        let table = match self {
            ConventionKind::Canonical => ConventionTable::canonical(lmax),
            ConventionKind::Siesta => ConventionTable::siesta(lmax),
            ConventionKind::OpenMx => ConventionTable::openmx(lmax),
            ConventionKind::Molden => ConventionTable::molden(lmax),
            ConventionKind::DecreasingM => ConventionTable::decreasingm(lmax),
            ConventionKind::Custom(entries) => {
                let shells = entries
                    .iter()
                    .map(|entry| {
                        let order = PureOrder::new(&entry.mls)?;
                        let signs = entry
                            .signs
                            .clone()
                            .unwrap_or_else(|| vec![1.0; order.ncomps()]);
                        ShellConvention::new(&order, &signs)
                    })
                    .collect::<AoNormResult<Vec<_>>>()?;
                ConventionTable::from_shell_conventions("custom", shells)?
            }
        };
        log::debug!("Convention table constructed:\n{table}");
        Ok(table)
    }
}
