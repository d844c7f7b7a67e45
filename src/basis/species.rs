//! Species and their radial-orbital shells.

use std::fmt;

use approx::relative_eq;
use derive_builder::Builder;
use indexmap::IndexMap;
use itertools::Itertools;
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize};

use crate::angmom::{angmom_from_label, angmom_label, n_comps};
use crate::auxiliary::atom::ElementMap;
use crate::error::{ensure_config, AoNormError, AoNormResult};

#[cfg(test)]
#[path = "species_tests.rs"]
mod species_tests;

/// Prefix marking a species as a ghost (basis functions without a nucleus).
pub const GHOST_PREFIX: &str = "ghost:";

// -----
// Shell
// -----

/// Structure representing a radial-orbital shell of a species.
#[derive(Clone, Debug, PartialEq, Builder, Serialize, Deserialize)]
pub struct Shell {
    /// The angular momentum of the shell.
    pub j: u32,

    /// The radial cutoff of the shell.
    #[builder(default = "0.0")]
    pub rcut: f64,
}

impl Shell {
    /// Returns a builder to construct a new [`Shell`].
    pub fn builder() -> ShellBuilder {
        ShellBuilder::default()
    }

    /// Constructs a new shell.
    pub fn new(j: u32, rcut: f64) -> Self {
        Self { j, rcut }
    }

    /// The number of orbitals in this shell, one per magnetic quantum number.
    pub fn n_funcs(&self) -> usize {
        n_comps(self.j)
    }

    fn same_as(&self, other: &Self) -> bool {
        self.j == other.j && relative_eq!(self.rcut, other.rcut, epsilon = 1e-12)
    }
}

// ----------
// ShellInput
// ----------

/// A shell as claimed by an external source. The angular momentum is signed here so that
/// malformed input can be rejected rather than wrapped.
#[derive(Clone, Debug, PartialEq, Builder, Serialize, Deserialize)]
pub struct ShellInput {
    /// The claimed angular momentum, given either as an integer or as a spectroscopic label such
    /// as `d`.
    #[serde(deserialize_with = "deserialize_angmom")]
    pub j: i32,

    /// The radial cutoff.
    #[builder(default = "0.0")]
    #[serde(default)]
    pub rcut: f64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AngmomRepr {
    Number(i32),
    Label(String),
}

fn deserialize_angmom<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    match AngmomRepr::deserialize(deserializer)? {
        AngmomRepr::Number(j) => Ok(j),
        AngmomRepr::Label(label) => angmom_from_label(&label)
            .and_then(|j| i32::try_from(j).ok())
            .ok_or_else(|| D::Error::custom(format!("Unknown angular momentum label `{label}`."))),
    }
}

impl ShellInput {
    /// Returns a builder to construct a new [`ShellInput`].
    pub fn builder() -> ShellInputBuilder {
        ShellInputBuilder::default()
    }

    /// Validates this input and converts it to a [`Shell`].
    ///
    /// # Errors
    ///
    /// Errors with [`AoNormError::Configuration`] if the angular momentum is negative.
    pub fn to_shell(&self, symbol: &str) -> AoNormResult<Shell> {
        let j = u32::try_from(self.j).map_err(|_| {
            AoNormError::Configuration(format!(
                "Shell of species `{symbol}` has a negative angular momentum {}.",
                self.j
            ))
        })?;
        Ok(Shell::new(j, self.rcut))
    }
}

// ------------
// SpeciesInput
// ------------

/// A species definition as provided by an external source, either once per species (explicit
/// catalog) or once per atom (assignment list).
#[derive(Clone, Debug, PartialEq, Builder, Serialize, Deserialize)]
pub struct SpeciesInput {
    /// The chemical symbol of the species. A symbol starting with [`GHOST_PREFIX`] denotes a ghost
    /// species with zero nuclear charge.
    #[builder(setter(into))]
    pub symbol: String,

    /// The nuclear charge. If absent, this is deduced from the element part of the symbol.
    #[builder(default)]
    #[serde(default)]
    pub charge: Option<u32>,

    /// The number of valence electrons. If absent, this equals the nuclear charge.
    #[builder(default)]
    #[serde(default)]
    pub valence: Option<f64>,

    /// The ordered shells of the species.
    #[builder(default)]
    #[serde(default)]
    pub shells: Vec<ShellInput>,
}

impl SpeciesInput {
    /// Returns a builder to construct a new [`SpeciesInput`].
    pub fn builder() -> SpeciesInputBuilder {
        SpeciesInputBuilder::default()
    }

    /// Converts this input into a [`Species`] with the given identifier.
    fn to_species(&self, id: usize, emap: &ElementMap) -> AoNormResult<Species> {
        let shells = self
            .shells
            .iter()
            .map(|shell| shell.to_shell(&self.symbol))
            .collect::<Result<Vec<_>, _>>()?;
        let charge = match self.charge {
            Some(charge) => charge,
            None if self.symbol.starts_with(GHOST_PREFIX) => 0,
            None => {
                let element = element_part(&self.symbol);
                emap.atomic_number(element).ok_or_else(|| {
                    AoNormError::Configuration(format!(
                        "Unable to deduce the nuclear charge of species `{}`.",
                        self.symbol
                    ))
                })?
            }
        };
        let valence = self.valence.unwrap_or(f64::from(charge));
        ensure_config!(
            valence >= 0.0 && valence <= f64::from(charge) + 1e-12 || charge == 0,
            "Species `{}` has {valence} valence electrons but a nuclear charge of {charge}.",
            self.symbol
        );
        Ok(Species {
            id,
            symbol: self.symbol.clone(),
            charge,
            valence,
            shells,
        })
    }
}

/// Extracts the leading alphabetic part of a species symbol, *e.g.* `Fe` from `Fe.spin_up` or
/// `C` from `C1`.
fn element_part(symbol: &str) -> &str {
    let end = symbol
        .char_indices()
        .find(|(_, c)| !c.is_ascii_alphabetic())
        .map(|(i, _)| i)
        .unwrap_or(symbol.len());
    &symbol[..end]
}

// -------
// Species
// -------

/// Structure representing a chemical species together with its ordered radial-orbital shells.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Species {
    /// The dense identifier of this species in its catalog.
    pub id: usize,

    /// The chemical symbol.
    pub symbol: String,

    /// The nuclear charge.
    pub charge: u32,

    /// The number of valence electrons.
    pub valence: f64,

    /// The ordered shells. The order is part of the identity of the species.
    pub shells: Vec<Shell>,
}

impl Species {
    /// The number of orbitals contributed by one atom of this species.
    pub fn norbs(&self) -> usize {
        self.shells.iter().map(Shell::n_funcs).sum()
    }

    /// The number of shells (radial orbitals, or multiplets) of this species.
    pub fn nmult(&self) -> usize {
        self.shells.len()
    }

    /// The largest radial cutoff of all shells, or zero for a shell-less species.
    pub fn rcut(&self) -> f64 {
        self.shells.iter().map(|shell| shell.rcut).fold(0.0, f64::max)
    }

    /// The angular momenta of the shells in order.
    pub fn mu2j(&self) -> Vec<u32> {
        self.shells.iter().map(|shell| shell.j).collect()
    }

    /// The number of core electrons represented by a pseudopotential.
    pub fn nelec_core(&self) -> f64 {
        f64::from(self.charge) - self.valence
    }

    /// Whether this is a ghost species.
    pub fn is_ghost(&self) -> bool {
        self.symbol.starts_with(GHOST_PREFIX)
    }

    fn same_definition(&self, other: &SpeciesInput, emap: &ElementMap) -> AoNormResult<bool> {
        let other = other.to_species(self.id, emap)?;
        Ok(self.charge == other.charge
            && relative_eq!(self.valence, other.valence, epsilon = 1e-12)
            && self.shells.len() == other.shells.len()
            && self
                .shells
                .iter()
                .zip(other.shells.iter())
                .all(|(a, b)| a.same_as(b)))
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (Z = {}, valence = {}): [{}]",
            self.symbol,
            self.charge,
            self.valence,
            self.shells.iter().map(|shell| angmom_label(shell.j)).join(", ")
        )
    }
}

// --------------
// SpeciesCatalog
// --------------

/// Structure containing all species of a structure, indexed densely by `0..nspecies`.
#[derive(Clone, Debug, PartialEq, Default, Serialize)]
pub struct SpeciesCatalog {
    species: IndexMap<String, Species>,
}

impl SpeciesCatalog {
    /// Constructs an explicit catalog. The identifiers follow the order of `inputs`.
    ///
    /// # Errors
    ///
    /// Errors with [`AoNormError::Configuration`] if a symbol occurs more than once, if a shell has
    /// a negative angular momentum, or if a nuclear charge cannot be deduced.
    pub fn new(inputs: &[SpeciesInput]) -> AoNormResult<Self> {
        let emap = ElementMap::new();
        let mut species = IndexMap::with_capacity(inputs.len());
        for input in inputs {
            ensure_config!(
                !species.contains_key(&input.symbol),
                "Species `{}` is defined more than once in the catalog.",
                input.symbol
            );
            let sp = input.to_species(species.len(), &emap)?;
            species.insert(input.symbol.clone(), sp);
        }
        log::debug!("Species catalog constructed with {} species.", species.len());
        Ok(Self { species })
    }

    /// Constructs a catalog from per-atom species claims. Identifiers are assigned by order of
    /// first occurrence of each symbol.
    ///
    /// # Arguments
    ///
    /// * `atom_species` - The species claimed by each atom, in atom order.
    ///
    /// # Returns
    ///
    /// The catalog together with the species identifier of every atom.
    ///
    /// # Errors
    ///
    /// Errors with [`AoNormError::Configuration`] if two atoms claim the same symbol with different
    /// definitions, or if any shell has a negative angular momentum.
    pub fn from_atom_species(atom_species: &[SpeciesInput]) -> AoNormResult<(Self, Vec<usize>)> {
        Self::default().with_atom_species(atom_species)
    }

    /// Assigns per-atom species claims to this catalog. Claims of symbols already in the catalog
    /// must match their definition; other symbols are appended in order of first occurrence.
    /// Species that no atom claims are kept.
    ///
    /// # Arguments
    ///
    /// * `atom_species` - The species claimed by each atom, in atom order.
    ///
    /// # Returns
    ///
    /// The extended catalog together with the species identifier of every atom.
    ///
    /// # Errors
    ///
    /// Errors with [`AoNormError::Configuration`] if a claim conflicts with the definition of its
    /// symbol, or if any shell has a negative angular momentum.
    pub fn with_atom_species(
        self,
        atom_species: &[SpeciesInput],
    ) -> AoNormResult<(Self, Vec<usize>)> {
        let emap = ElementMap::new();
        let mut species = self.species;
        let atom2sp = atom_species
            .iter()
            .enumerate()
            .map(|(atom, input)| {
                if let Some((id, _, existing)) = species.get_full(&input.symbol) {
                    ensure_config!(
                        existing.same_definition(input, &emap)?,
                        "Atom {atom} claims species `{}` with a definition different from an earlier one.",
                        input.symbol
                    );
                    Ok(id)
                } else {
                    let id = species.len();
                    let sp = input.to_species(id, &emap)?;
                    species.insert(input.symbol.clone(), sp);
                    Ok(id)
                }
            })
            .collect::<AoNormResult<Vec<_>>>()?;
        log::debug!(
            "Species catalog assigned to {} atoms: {} species.",
            atom2sp.len(),
            species.len()
        );
        Ok((Self { species }, atom2sp))
    }

    /// The number of species.
    pub fn nspecies(&self) -> usize {
        self.species.len()
    }

    /// Returns the species with a given identifier.
    pub fn get(&self, id: usize) -> Option<&Species> {
        self.species.get_index(id).map(|(_, sp)| sp)
    }

    /// Returns the identifier of the species with a given symbol.
    pub fn id_of(&self, symbol: &str) -> Option<usize> {
        self.species.get_index_of(symbol)
    }

    /// Iterates over the species in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &Species> + '_ {
        self.species.values()
    }

    /// Numbers of orbitals per species.
    pub fn sp2norbs(&self) -> Vec<usize> {
        self.iter().map(Species::norbs).collect()
    }

    /// Numbers of shells per species.
    pub fn sp2nmult(&self) -> Vec<usize> {
        self.iter().map(Species::nmult).collect()
    }

    /// Angular momenta of the shells of each species.
    pub fn sp_mu2j(&self) -> Vec<Vec<u32>> {
        self.iter().map(Species::mu2j).collect()
    }

    /// Radial cutoffs per species.
    pub fn sp2rcut(&self) -> Vec<f64> {
        self.iter().map(Species::rcut).collect()
    }

    /// Nuclear charges per species.
    pub fn sp2charge(&self) -> Vec<u32> {
        self.iter().map(|sp| sp.charge).collect()
    }

    /// Valence electron counts per species.
    pub fn sp2valence(&self) -> Vec<f64> {
        self.iter().map(|sp| sp.valence).collect()
    }

    /// Symbols per species.
    pub fn sp2symbol(&self) -> Vec<&str> {
        self.iter().map(|sp| sp.symbol.as_str()).collect()
    }

    /// The largest angular momentum over all shells of all species, if any shell exists.
    pub fn jmax(&self) -> Option<u32> {
        self.iter()
            .flat_map(|sp| sp.shells.iter().map(|shell| shell.j))
            .max()
    }
}

impl fmt::Display for SpeciesCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for sp in self.iter() {
            writeln!(f, "  {:>3}  {sp}", sp.id)?;
        }
        Ok(())
    }
}
