use approx::assert_abs_diff_eq;
use nalgebra::Point3;
use ndarray::{array, ArrayD, IxDyn};

use crate::auxiliary::structure::Structure;
use crate::basis::species::{ShellInput, SpeciesInput};
use crate::convention::orbital_map::FoldingMap;
use crate::convention::ConventionKind;
use crate::interfaces::input::InputSystem;
use crate::interfaces::{NaoSystem, SourceAdapter, SourceMatrix, SourceTensor};
use crate::io::read_aonorm_yaml;
use crate::sparse::CooMatrix;

const ROOT: &str = env!("CARGO_MANIFEST_DIR");

#[test]
fn test_interfaces_nao_system_sp_siesta() {
    let _ = env_logger::builder().is_test(true).try_init();
    let name = format!("{ROOT}/tests/input/sp_siesta.yml");
    let inp = read_aonorm_yaml::<InputSystem, _>(&name).unwrap();
    let nao = NaoSystem::from_adapter(&inp).unwrap();

    assert_eq!(nao.tables().atom2s(), &[0, 1, 4]);
    assert_eq!(nao.tables().orb2j(), &[0, 1, 1, 1]);
    assert_eq!(nao.tables().orb2m(), &[0, -1, 0, 1]);
    assert!(nao.convention().is_sign_only());
    assert!(nao.folding().is_none());

    let overlap = nao.matrix("overlap").unwrap();
    assert_eq!(overlap.get(0, 1), -0.5);
    assert_eq!(overlap.get(1, 0), -0.5);
    assert_eq!(overlap.get(3, 3), 1.0);

    let checks = nao.check_symmetries(1e-12);
    assert_eq!(checks.len(), 1);
    assert!(checks[0].1.is_ok());

    let mo = nao.tensor("mo_coefficients").unwrap();
    assert_eq!(
        mo,
        &array![[1.0, -2.0, 3.0, -4.0], [5.0, -6.0, 7.0, -8.0]].into_dyn()
    );

    assert_eq!(nao.overlap_check(overlap, 1e-8).unwrap(), 0.0);
}

#[test]
fn test_interfaces_nao_system_chain_folding() {
    let name = format!("{ROOT}/tests/input/chain_folding.yml");
    let inp = read_aonorm_yaml::<InputSystem, _>(&name).unwrap();
    let nao = NaoSystem::from_adapter(&inp).unwrap();

    let ham = nao.matrix("hamiltonian").unwrap();
    assert_eq!(ham.shape(), (4, 4));
    assert_eq!(ham.nnz(), 3);
    assert_abs_diff_eq!(ham.get(0, 0), -1.25, epsilon = 1e-15);
    assert_eq!(ham.get(2, 2), 0.5);
    assert_eq!(ham.get(3, 1), 0.1);
    assert!(nao.check_symmetries(1e-12).is_empty());

    let bloch = nao.tensor("bloch_coefficients").unwrap();
    assert_eq!(
        bloch.as_slice().unwrap(),
        &[1.0, 4.0, 2.0, 3.0, 5.0, 8.0, 6.0, 7.0]
    );
    assert!(nao.overlap_check(ham, 1e-8).is_err());
}

#[test]
fn test_interfaces_nao_system_errors() {
    // Supercell matrix without a folding map.
    let mut inp = InputSystem::default();
    inp.matrices[0].supercell = true;
    assert!(NaoSystem::from_adapter(&inp).is_err());

    // Duplicate matrix names.
    let mut inp = InputSystem::default();
    let dup = inp.matrices[0].clone();
    inp.matrices.push(dup);
    assert!(NaoSystem::from_adapter(&inp).is_err());

    // Matrix of the wrong size.
    let mut inp = InputSystem::default();
    inp.matrices[0].shape = (5, 5);
    assert!(NaoSystem::from_adapter(&inp).is_err());

    // A folding map pointing outside of the unit cell.
    let mut inp = InputSystem::default();
    inp.folding = Some(vec![0, 1, 2, 3, 4]);
    assert!(NaoSystem::from_adapter(&inp).is_err());
}

/// An adapter holding its data in memory, as a format-specific parser would.
struct MemorySource {
    folding: Vec<usize>,
}

impl SourceAdapter for MemorySource {
    fn structure(&self) -> Result<Structure, anyhow::Error> {
        let claim = SpeciesInput::builder()
            .symbol("N")
            .shells(vec![
                ShellInput::builder().j(0).build()?,
                ShellInput::builder().j(2).build()?,
            ])
            .build()?;
        Ok(Structure::from_atom_species(
            &[claim],
            &[Point3::new(0.0, 0.0, 0.0)],
        )?)
    }

    fn convention(&self) -> Result<ConventionKind, anyhow::Error> {
        Ok(ConventionKind::OpenMx)
    }

    fn folding_map(&self, norbs_uc: usize) -> Result<Option<FoldingMap>, anyhow::Error> {
        Ok(Some(FoldingMap::new(self.folding.clone(), norbs_uc)?))
    }

    fn matrices(&self) -> Result<Vec<SourceMatrix>, anyhow::Error> {
        Ok(vec![SourceMatrix::builder()
            .name("overlap")
            .matrix(CooMatrix::from_triplets(
                (6, 12),
                &[(1, 1, 1.0), (1, 7, 0.5), (2, 4, 0.25)],
            )?)
            .supercell(true)
            .build()?])
    }

    fn dense_tensors(&self) -> Result<Vec<SourceTensor>, anyhow::Error> {
        Ok(vec![SourceTensor::builder()
            .name("density")
            .tensor(ArrayD::from_shape_fn(IxDyn(&[6]), |idx| idx[0] as f64))
            .orbital_axis(0)
            .build()?])
    }
}

#[test]
fn test_interfaces_nao_system_custom_adapter() {
    let source = MemorySource {
        folding: (0..12).map(|i| i % 6).collect(),
    };
    let nao = NaoSystem::from_adapter(&source).unwrap();
    assert_eq!(nao.tables().norbs(), 6);
    assert!(!nao.convention().is_sign_only());

    // OpenMX d order (0, 2, -2, 1, -1) onto canonical (-2, -1, 0, 1, 2).
    assert_eq!(nao.orbital_map().dest(), &[0, 3, 5, 1, 4, 2]);
    let density = nao.tensor("density").unwrap();
    assert_eq!(
        density.as_slice().unwrap(),
        &[0.0, 3.0, 5.0, 1.0, 4.0, 2.0]
    );

    let overlap = nao.matrix("overlap").unwrap();
    assert_eq!(overlap.get(3, 3), 1.5);
    assert_eq!(overlap.get(5, 4), 0.25);
    assert_eq!(overlap.nnz(), 2);
}

#[test]
fn test_interfaces_nao_system_symmetry_report() {
    let inp = InputSystem::default();
    let nao = NaoSystem::from_adapter(&inp).unwrap();
    assert_eq!(nao.log_symmetry_report(1e-12), 0);

    let mut inp = InputSystem::default();
    inp.matrices[0].entries.push((1, 3, 0.2));
    let nao = NaoSystem::from_adapter(&inp).unwrap();
    assert_eq!(nao.log_symmetry_report(1e-12), 1);
    assert!(nao.check_symmetries(1e-12)[0].1.as_ref().unwrap_err().is_consistency());
}
