//! Human-readable description of a system in `aonorm` YAML input files.

use anyhow::{self, ensure, format_err};
use derive_builder::Builder;
use itertools::Itertools;
use nalgebra::Point3;
use ndarray::{ArrayD, IxDyn};
use serde::{Deserialize, Serialize};

use crate::auxiliary::atom::{Atom, ANGSTROM_TO_BOHR};
use crate::auxiliary::structure::Structure;
use crate::basis::species::{ShellInput, SpeciesCatalog, SpeciesInput};
use crate::convention::orbital_map::FoldingMap;
use crate::convention::ConventionKind;
use crate::interfaces::{SourceAdapter, SourceMatrix, SourceTensor};
use crate::sparse::CooMatrix;


// ----------
// LengthUnit
// ----------

/// Serialisable/deserialisable enumerated type for the unit of atomic coordinates in input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LengthUnit {
    /// Atomic units of length.
    #[default]
    Bohr,

    /// Ångström. Coordinates are converted to Bohr on input.
    Angstrom,
}

impl LengthUnit {
    /// The factor converting a length in this unit to Bohr.
    pub fn to_bohr(&self) -> f64 {
        match self {
            LengthUnit::Bohr => 1.0,
            LengthUnit::Angstrom => ANGSTROM_TO_BOHR,
        }
    }
}

// ---------
// InputAtom
// ---------

/// Serialisable/deserialisable structure describing an atom in input.
#[derive(Clone, Debug, PartialEq, Builder, Serialize, Deserialize)]
pub struct InputAtom {
    /// The species symbol of the atom.
    #[builder(setter(into))]
    pub species: String,

    /// The Cartesian coordinates of the atom.
    pub coordinates: [f64; 3],

    /// The shells of the atom. If absent, these are taken from the species definitions of the
    /// system.
    #[builder(default)]
    #[serde(default)]
    pub shells: Option<Vec<ShellInput>>,
}

impl InputAtom {
    /// Returns a builder to construct an [`InputAtom`].
    pub fn builder() -> InputAtomBuilder {
        InputAtomBuilder::default()
    }
}

// -----------------------
// InputMatrix/InputTensor
// -----------------------

/// Serialisable/deserialisable structure describing a sparse matrix in source ordering.
#[derive(Clone, Debug, PartialEq, Builder, Serialize, Deserialize)]
pub struct InputMatrix {
    /// The name of the matrix.
    #[builder(setter(into))]
    pub name: String,

    /// The numbers of rows and columns.
    pub shape: (usize, usize),

    /// The (row, column, value) entries. Repeated (row, column) pairs are summed.
    pub entries: Vec<(usize, usize, f64)>,

    /// Whether the matrix is expected to be symmetric.
    #[builder(default)]
    #[serde(default)]
    pub symmetric: bool,

    /// Whether the indices run over supercell orbitals.
    #[builder(default)]
    #[serde(default)]
    pub supercell: bool,
}

/// Serialisable/deserialisable structure describing a dense tensor in source ordering.
#[derive(Clone, Debug, PartialEq, Builder, Serialize, Deserialize)]
pub struct InputTensor {
    /// The name of the tensor.
    #[builder(setter(into))]
    pub name: String,

    /// The shape of the tensor.
    pub shape: Vec<usize>,

    /// The elements of the tensor in row-major order.
    pub data: Vec<f64>,

    /// The axis running over orbitals.
    pub orbital_axis: usize,

    /// Whether the orbital axis runs over supercell orbitals.
    #[builder(default)]
    #[serde(default)]
    pub supercell: bool,
}

// -----------
// InputSystem
// -----------

fn default_symmetry_threshold() -> f64 {
    1e-10
}

/// Serialisable/deserialisable structure containing a complete system description that can be
/// read from a YAML input file.
#[derive(Clone, Debug, PartialEq, Builder, Serialize, Deserialize)]
pub struct InputSystem {
    /// Species definitions, used by atoms that do not carry their own shells.
    #[builder(default)]
    #[serde(default)]
    pub species: Vec<SpeciesInput>,

    /// The atoms in order.
    pub atoms: Vec<InputAtom>,

    /// The unit of the atomic coordinates.
    #[builder(default)]
    #[serde(default)]
    pub length_unit: LengthUnit,

    /// The basis convention of the matrices and tensors.
    #[builder(default)]
    #[serde(default)]
    pub convention: ConventionKind,

    /// The unit-cell orbital of every supercell orbital, for periodic sources.
    #[builder(default)]
    #[serde(default)]
    pub folding: Option<Vec<usize>>,

    /// The sparse matrices.
    #[builder(default)]
    #[serde(default)]
    pub matrices: Vec<InputMatrix>,

    /// The dense tensors.
    #[builder(default)]
    #[serde(default)]
    pub tensors: Vec<InputTensor>,

    /// The absolute tolerance for symmetry checks of matrices expected to be symmetric.
    #[builder(default = "default_symmetry_threshold()")]
    #[serde(default = "default_symmetry_threshold")]
    pub symmetry_threshold: f64,
}

impl InputSystem {
    /// Returns a builder to construct an [`InputSystem`].
    pub fn builder() -> InputSystemBuilder {
        InputSystemBuilder::default()
    }

    /// The species claimed by every atom.
    fn atom_claims(&self) -> Result<Vec<SpeciesInput>, anyhow::Error> {
        self.atoms
            .iter()
            .enumerate()
            .map(|(iatom, atom)| match atom.shells.as_ref() {
                Some(shells) => {
                    let mut claim = self
                        .species
                        .iter()
                        .find(|sp| sp.symbol == atom.species)
                        .cloned()
                        .unwrap_or_else(|| SpeciesInput {
                            symbol: atom.species.clone(),
                            charge: None,
                            valence: None,
                            shells: vec![],
                        });
                    claim.shells = shells.clone();
                    Ok(claim)
                }
                None => self
                    .species
                    .iter()
                    .find(|sp| sp.symbol == atom.species)
                    .cloned()
                    .ok_or_else(|| {
                        format_err!(
                            "Atom {iatom} refers to species `{}` which is not defined.",
                            atom.species
                        )
                    }),
            })
            .collect()
    }
}

impl Default for InputSystem {
    /// A minimal SIESTA-style system: a hydrogen atom with one $`s`$ shell and a ghost atom with
    /// one $`p`$ shell, together with their overlap matrix.
    fn default() -> Self {
        InputSystem {
            species: vec![
                SpeciesInput {
                    symbol: "H".to_string(),
                    charge: None,
                    valence: None,
                    shells: vec![ShellInput { j: 0, rcut: 4.0 }],
                },
                SpeciesInput {
                    symbol: "ghost:H".to_string(),
                    charge: None,
                    valence: None,
                    shells: vec![ShellInput { j: 1, rcut: 4.5 }],
                },
            ],
            atoms: vec![
                InputAtom {
                    species: "H".to_string(),
                    coordinates: [0.0, 0.0, 0.0],
                    shells: None,
                },
                InputAtom {
                    species: "ghost:H".to_string(),
                    coordinates: [0.0, 0.0, 1.4],
                    shells: None,
                },
            ],
            length_unit: LengthUnit::Bohr,
            convention: ConventionKind::Siesta,
            folding: None,
            matrices: vec![InputMatrix {
                name: "overlap".to_string(),
                shape: (4, 4),
                entries: vec![
                    (0, 0, 1.0),
                    (1, 1, 1.0),
                    (2, 2, 1.0),
                    (3, 3, 1.0),
                    (0, 2, 0.4),
                    (2, 0, 0.4),
                ],
                symmetric: true,
                supercell: false,
            }],
            tensors: vec![],
            symmetry_threshold: default_symmetry_threshold(),
        }
    }
}

impl SourceAdapter for InputSystem {
    /// The catalog holds the `species` definitions in their given order, followed by any species
    /// that atoms introduce through their own shells.
    fn structure(&self) -> Result<Structure, anyhow::Error> {
        let claims = self.atom_claims()?;
        let (catalog, atom2sp) = SpeciesCatalog::new(&self.species)?.with_atom_species(&claims)?;
        let scale = self.length_unit.to_bohr();
        let atoms = self
            .atoms
            .iter()
            .zip(atom2sp)
            .map(|(atom, sp)| Atom::new(sp, Point3::from(atom.coordinates) * scale))
            .collect_vec();
        Ok(Structure::new(atoms, catalog)?)
    }

    fn convention(&self) -> Result<ConventionKind, anyhow::Error> {
        Ok(self.convention.clone())
    }

    fn folding_map(&self, norbs_uc: usize) -> Result<Option<FoldingMap>, anyhow::Error> {
        self.folding
            .as_ref()
            .map(|fold| FoldingMap::new(fold.clone(), norbs_uc).map_err(|err| format_err!(err)))
            .transpose()
    }

    fn matrices(&self) -> Result<Vec<SourceMatrix>, anyhow::Error> {
        self.matrices
            .iter()
            .map(|im| {
                let matrix = CooMatrix::from_triplets(im.shape, &im.entries)?;
                SourceMatrix::builder()
                    .name(im.name.clone())
                    .matrix(matrix)
                    .symmetric(im.symmetric)
                    .supercell(im.supercell)
                    .build()
                    .map_err(|err| format_err!(err))
            })
            .collect()
    }

    fn dense_tensors(&self) -> Result<Vec<SourceTensor>, anyhow::Error> {
        self.tensors
            .iter()
            .map(|it| {
                ensure!(
                    it.orbital_axis < it.shape.len(),
                    "Tensor `{}` has no axis {}.",
                    it.name,
                    it.orbital_axis
                );
                let tensor = ArrayD::from_shape_vec(IxDyn(&it.shape), it.data.clone())
                    .map_err(|err| format_err!("Tensor `{}`: {err}", it.name))?;
                SourceTensor::builder()
                    .name(it.name.clone())
                    .tensor(tensor)
                    .orbital_axis(it.orbital_axis)
                    .supercell(it.supercell)
                    .build()
                    .map_err(|err| format_err!(err))
            })
            .collect()
    }
}
