//! Permutations of orbital slots.

use std::collections::HashSet;
use std::fmt;

use derive_builder::Builder;
use num_traits::Inv;
use serde::Serialize;

use crate::error::{ensure_config, AoNormError, AoNormResult};


/// A structure to manage permutation actions of a finite set.
#[derive(Builder, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Permutation {
    /// The rank of the permutation, *i.e.* the number of elements in the finite set on which the
    /// permutation acts.
    rank: usize,

    /// If the permutation is to act on an ordered sequence of $`n`$ integers, $`0, 1, \ldots, n`$
    /// where $`n`$ is [`Self::rank`], then this gives the result of the action: element `i` is
    /// sent to position `image[i]`.
    #[builder(setter(custom))]
    image: Vec<usize>,
}

impl PermutationBuilder {
    fn image(&mut self, perm: &[usize]) -> &mut Self {
        self.image = Some(perm.to_vec());
        self
    }
}

impl Permutation {
    /// Returns a builder to construct a new permutation.
    fn builder() -> PermutationBuilder {
        PermutationBuilder::default()
    }

    /// Constructs a permutation from its image.
    ///
    /// # Errors
    ///
    /// Errors with [`AoNormError::Configuration`] if `image` is not a permutation of
    /// `0..image.len()`.
    pub fn from_image(image: &[usize]) -> AoNormResult<Self> {
        let rank = image.len();
        ensure_config!(
            image.iter().all(|&i| i < rank)
                && image.iter().collect::<HashSet<_>>().len() == rank,
            "`{image:?}` is not a valid permutation image."
        );
        Self::builder()
            .rank(rank)
            .image(image)
            .build()
            .map_err(|err| AoNormError::Configuration(err.to_string()))
    }

    /// Constructs the identity permutation of a given rank.
    pub fn identity(rank: usize) -> Self {
        Self {
            rank,
            image: (0..rank).collect(),
        }
    }

    /// The rank of this permutation.
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// The image of this permutation.
    pub fn image(&self) -> &[usize] {
        &self.image
    }

    /// Returns `true` if this permutation is the identity permutation for this rank.
    pub fn is_identity(&self) -> bool {
        self.image.iter().enumerate().all(|(i, &j)| i == j)
    }
}

impl fmt::Debug for Permutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "π{:?}", self.image)
    }
}

impl fmt::Display for Permutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "π{:?}", self.image)
    }
}

// ---
// Inv
// ---
impl Inv for &Permutation {
    type Output = Permutation;

    fn inv(self) -> Self::Output {
        let mut image_inv = vec![0; self.rank];
        self.image
            .iter()
            .enumerate()
            .for_each(|(i, &j)| image_inv[j] = i);
        Permutation {
            rank: self.rank,
            image: image_inv,
        }
    }
}

impl Inv for Permutation {
    type Output = Permutation;

    fn inv(self) -> Self::Output {
        (&self).inv()
    }
}
