use approx::assert_abs_diff_eq;
use ndarray::{array, Array1, Array2, ArrayD, Axis, IxDyn};
use num_complex::Complex;
use proptest::prelude::*;

use crate::convention::orbital_map::{FoldingMap, OrbitalMap};
use crate::convention::ConventionTable;
use crate::sparse::{CooMatrix, CsrMatrix};

/// One $`s`$ shell followed by one $`p`$ shell.
fn sp_tables() -> (Vec<u32>, Vec<i32>) {
    (vec![0, 1, 1, 1], vec![0, -1, 0, 1])
}

fn sp_map(table: &ConventionTable) -> OrbitalMap {
    let (orb2j, orb2m) = sp_tables();
    OrbitalMap::new(&orb2j, &orb2m, 4, table).unwrap()
}

#[test]
fn test_orbital_map_new() {
    let siesta = sp_map(&ConventionTable::siesta(1));
    assert!(siesta.is_sign_only());
    assert_eq!(siesta.dest(), &[0, 1, 2, 3]);
    assert_eq!(siesta.signs(), &[1.0, -1.0, 1.0, -1.0]);

    let molden = sp_map(&ConventionTable::molden(1));
    assert!(!molden.is_sign_only());
    assert_eq!(molden.dest(), &[0, 2, 3, 1]);
    assert_eq!(molden.signs(), &[1.0, 1.0, 1.0, 1.0]);
    assert_eq!(molden.norbs(), 4);
}

#[test]
fn test_orbital_map_new_errors() {
    let (orb2j, orb2m) = sp_tables();
    let table = ConventionTable::siesta(1);

    // `orb2m` of length 3 for 4 declared orbitals.
    assert!(OrbitalMap::new(&orb2j, &orb2m[..3], 4, &table)
        .unwrap_err()
        .is_configuration());
    assert!(OrbitalMap::new(&orb2j[..3], &orb2m, 4, &table)
        .unwrap_err()
        .is_configuration());

    // No entry for j = 1.
    assert!(OrbitalMap::new(&orb2j, &orb2m, 4, &ConventionTable::siesta(0))
        .unwrap_err()
        .is_configuration());

    // Truncated p shell.
    assert!(OrbitalMap::new(&[0, 1, 1], &[0, -1, 0], 3, &table)
        .unwrap_err()
        .is_configuration());

    // Shell not in ascending m.
    assert!(OrbitalMap::new(&orb2j, &[0, 0, -1, 1], 4, &table)
        .unwrap_err()
        .is_configuration());

    // Zero orbitals is a valid, empty map.
    let empty = OrbitalMap::new(&[], &[], 0, &table).unwrap();
    assert_eq!(empty.norbs(), 0);
}

#[test]
fn test_orbital_map_inverse() {
    let table = ConventionTable::openmx(2);
    let map = OrbitalMap::new(
        &[0, 1, 1, 1, 2, 2, 2, 2, 2],
        &[0, -1, 0, 1, -2, -1, 0, 1, 2],
        9,
        &table,
    )
    .unwrap();
    let inv = map.inverse();
    for (o, &d) in map.dest().iter().enumerate() {
        assert_eq!(inv.dest()[d], o);
    }
    assert_eq!(inv.inverse(), map);

    let via_table = OrbitalMap::new(
        &[0, 1, 1, 1, 2, 2, 2, 2, 2],
        &[0, -1, 0, 1, -2, -1, 0, 1, 2],
        9,
        &table.inverse(),
    )
    .unwrap();
    assert_eq!(inv, via_table);
}

#[test]
fn test_orbital_map_transform_dense_vector() {
    let siesta = sp_map(&ConventionTable::siesta(1));
    let mut v = array![1.0, 2.0, 3.0, 4.0];
    siesta.transform_dense(&mut v, Axis(0)).unwrap();
    assert_eq!(v, array![1.0, -2.0, 3.0, -4.0]);

    let molden = sp_map(&ConventionTable::molden(1));
    let mut w = array![1.0, 2.0, 3.0, 4.0];
    molden.transform_dense(&mut w, Axis(0)).unwrap();
    assert_eq!(w, array![1.0, 4.0, 2.0, 3.0]);

    molden.inverse_transform_dense(&mut w, Axis(0)).unwrap();
    assert_eq!(w, array![1.0, 2.0, 3.0, 4.0]);

    let mut short = array![1.0, 2.0, 3.0];
    assert!(molden
        .transform_dense(&mut short, Axis(0))
        .unwrap_err()
        .is_configuration());
    assert!(molden
        .transform_dense(&mut w, Axis(1))
        .unwrap_err()
        .is_configuration());
}

#[test]
fn test_orbital_map_transform_dense_axes() {
    let molden = sp_map(&ConventionTable::molden(1));

    // Molecular-orbital coefficients with orbitals along the second axis.
    let mut coeffs = Array2::from_shape_fn((2, 4), |(i, o)| (10 * i + o) as f64);
    molden.transform_dense(&mut coeffs, Axis(1)).unwrap();
    assert_eq!(coeffs, array![[0.0, 3.0, 1.0, 2.0], [10.0, 13.0, 11.0, 12.0]]);

    // A rank-3 tensor with orbitals along the middle axis.
    let mut tensor = ArrayD::from_shape_fn(IxDyn(&[2, 4, 3]), |idx| {
        (100 * idx[0] + 10 * idx[1] + idx[2]) as f64
    });
    let original = tensor.clone();
    molden.transform_dense(&mut tensor, Axis(1)).unwrap();
    for a in 0..2 {
        for c in 0..3 {
            for (o, &d) in molden.dest().iter().enumerate() {
                assert_eq!(tensor[[a, d, c]], original[[a, o, c]]);
            }
        }
    }
}

#[test]
fn test_orbital_map_transform_dense_complex() {
    let siesta = sp_map(&ConventionTable::siesta(1));
    let mut v = Array1::from_vec(vec![
        Complex::new(1.0, 1.0),
        Complex::new(2.0, -1.0),
        Complex::new(0.0, 3.0),
        Complex::new(-4.0, 0.5),
    ]);
    siesta.transform_dense(&mut v, Axis(0)).unwrap();
    assert_eq!(v[1], Complex::new(-2.0, 1.0));
    assert_eq!(v[3], Complex::new(4.0, -0.5));
    assert_eq!(v[2], Complex::new(0.0, 3.0));
}

#[test]
fn test_orbital_map_transform_dense_batch() {
    let molden = sp_map(&ConventionTable::molden(1));
    let mut arrs = vec![
        ArrayD::from_shape_vec(IxDyn(&[4]), vec![1.0, 2.0, 3.0, 4.0]).unwrap(),
        ArrayD::from_shape_vec(IxDyn(&[4]), vec![5.0, 6.0, 7.0, 8.0]).unwrap(),
    ];
    molden.transform_dense_batch(&mut arrs, Axis(0)).unwrap();
    assert_eq!(arrs[0].as_slice().unwrap(), &[1.0, 4.0, 2.0, 3.0]);
    assert_eq!(arrs[1].as_slice().unwrap(), &[5.0, 8.0, 6.0, 7.0]);
}

#[test]
fn test_orbital_map_transform_sparse_signs() {
    let siesta = sp_map(&ConventionTable::siesta(1));

    // The identity is invariant since row and column signs coincide on the diagonal.
    let identity = CooMatrix::from_dense(&Array2::<f64>::eye(4));
    let transformed = siesta.transform_sparse(&identity, None).unwrap();
    assert_eq!(transformed.to_dense(), Array2::<f64>::eye(4));

    let mat = CooMatrix::from_triplets(
        (4, 4),
        &[(0, 1, 0.5), (1, 0, 0.5), (1, 2, 0.25), (3, 3, 2.0)],
    )
    .unwrap();
    let transformed = siesta.transform_sparse(&mat, None).unwrap();
    assert_eq!(transformed.get(0, 1), -0.5);
    assert_eq!(transformed.get(1, 0), -0.5);
    assert_eq!(transformed.get(1, 2), -0.25);
    assert_eq!(transformed.get(3, 3), 2.0);
    assert_eq!(transformed.nnz(), 4);
}

#[test]
fn test_orbital_map_transform_sparse_permutation() {
    let molden = sp_map(&ConventionTable::molden(1));
    let mat = CooMatrix::from_triplets((4, 4), &[(1, 2, 1.0), (3, 0, 2.0)]).unwrap();
    let transformed = molden.transform_sparse(&mat, None).unwrap();
    assert_eq!(transformed.get(2, 3), 1.0);
    assert_eq!(transformed.get(1, 0), 2.0);
    assert_eq!(transformed.rows(), &[1, 2]);

    let back = molden.inverse_transform_sparse(&transformed).unwrap();
    assert_eq!(back.to_dense(), mat.to_dense());

    let wrong_shape = CooMatrix::<f64>::zeros((4, 5));
    assert!(molden
        .transform_sparse(&wrong_shape, None)
        .unwrap_err()
        .is_configuration());
}

#[test]
fn test_orbital_map_transform_sparse_folding() {
    let canonical = sp_map(&ConventionTable::canonical(1));
    let folding = FoldingMap::new(vec![0, 1, 2, 3, 0, 1, 2, 3], 4).unwrap();

    // Two supercell entries folding onto the same unit-cell entry are summed.
    let mat = CooMatrix::from_triplets((4, 8), &[(0, 0, 1.0), (0, 4, 2.0), (1, 6, 0.5)]).unwrap();
    let folded = canonical.transform_sparse(&mat, Some(&folding)).unwrap();
    assert_eq!(folded.shape(), (4, 4));
    assert_eq!(folded.nnz(), 2);
    assert_eq!(folded.get(0, 0), 3.0);
    assert_eq!(folded.get(1, 2), 0.5);

    let siesta = sp_map(&ConventionTable::siesta(1));
    let folded = siesta.transform_sparse(&mat, Some(&folding)).unwrap();
    assert_eq!(folded.get(1, 2), -0.5);

    // A column beyond the supercell.
    let outside = CooMatrix::from_triplets((4, 9), &[(0, 8, 1.0)]).unwrap();
    assert!(canonical
        .transform_sparse(&outside, Some(&folding))
        .unwrap_err()
        .is_index());

    // A folding map for a different unit cell.
    let other = FoldingMap::identity(3);
    assert!(canonical
        .transform_sparse(&mat, Some(&other))
        .unwrap_err()
        .is_configuration());
}

#[test]
fn test_orbital_map_folding_map() {
    assert!(FoldingMap::new(vec![0, 5], 4).unwrap_err().is_index());

    let fm = FoldingMap::new(vec![0, 1, 0, 1], 2).unwrap();
    assert_eq!(fm.norbs_sc(), 4);
    assert_eq!(fm.norbs_uc(), 2);
    assert_eq!(fm.fold(2).unwrap(), 0);
    assert!(fm.fold(4).unwrap_err().is_index());

    let id = FoldingMap::identity(3);
    assert_eq!(id.as_slice(), &[0, 1, 2]);
}

#[test]
fn test_orbital_map_transform_sparse_batch() {
    let molden = sp_map(&ConventionTable::molden(1));
    let mats = vec![
        CooMatrix::from_triplets((4, 4), &[(1, 1, 1.0)]).unwrap(),
        CooMatrix::from_triplets((4, 4), &[(2, 3, 1.0), (2, 3, 1.0)]).unwrap(),
    ];
    let transformed = molden.transform_sparse_batch(&mats, None).unwrap();
    assert_eq!(transformed.len(), 2);
    assert_eq!(transformed[0].get(2, 2), 1.0);
    assert_eq!(transformed[1].get(3, 1), 2.0);
    assert_eq!(transformed[1].nnz(), 1);
}

#[test]
fn test_orbital_map_transform_dense_supercell() {
    let molden = sp_map(&ConventionTable::molden(1));
    let folding = FoldingMap::new(vec![0, 1, 2, 3, 0, 1, 2, 3], 4).unwrap();
    let mut v = Array1::from_iter((1..=8).map(f64::from));
    molden
        .transform_dense_supercell(&mut v, Axis(0), &folding)
        .unwrap();
    assert_eq!(v.to_vec(), vec![1.0, 4.0, 2.0, 3.0, 5.0, 8.0, 6.0, 7.0]);

    // Images that split a p shell cannot be permuted.
    let split = FoldingMap::new(vec![0, 1, 2, 3, 1], 4).unwrap();
    let mut w = Array1::<f64>::zeros(5);
    assert!(molden
        .transform_dense_supercell(&mut w, Axis(0), &split)
        .unwrap_err()
        .is_configuration());
}

#[test]
fn test_orbital_map_transform_csr_signs_inplace() {
    let siesta = sp_map(&ConventionTable::siesta(1));
    let coo = CooMatrix::from_dense(&Array2::<f64>::ones((4, 4)));
    let mut csr = CsrMatrix::from_coo(&coo);
    siesta.transform_csr_signs_inplace(&mut csr, None).unwrap();
    let signs = [1.0, -1.0, 1.0, -1.0];
    let dense = csr.to_coo().to_dense();
    for r in 0..4 {
        for c in 0..4 {
            assert_eq!(dense[(r, c)], signs[r] * signs[c]);
        }
    }

    // Supercell columns keep their position but take the sign of their unit-cell orbital.
    let folding = FoldingMap::new(vec![0, 1, 2, 3, 0, 1, 2, 3], 4).unwrap();
    let coo_sc = CooMatrix::from_triplets((4, 8), &[(0, 5, 1.0), (1, 7, 1.0)]).unwrap();
    let mut csr_sc = CsrMatrix::from_coo(&coo_sc);
    siesta
        .transform_csr_signs_inplace(&mut csr_sc, Some(&folding))
        .unwrap();
    assert_eq!(csr_sc.indices(), &[5, 7]);
    assert_eq!(csr_sc.data(), &[-1.0, 1.0]);

    let molden = sp_map(&ConventionTable::molden(1));
    assert!(molden
        .transform_csr_signs_inplace(&mut csr, None)
        .unwrap_err()
        .is_configuration());
}

fn spd_map(table: &ConventionTable) -> OrbitalMap {
    OrbitalMap::new(
        &[0, 1, 1, 1, 2, 2, 2, 2, 2],
        &[0, -1, 0, 1, -2, -1, 0, 1, 2],
        9,
        table,
    )
    .unwrap()
}

proptest! {
    #[test]
    fn test_orbital_map_round_trip_dense(
        values in prop::collection::vec(-10.0f64..10.0, 9),
        which in 0usize..4,
    ) {
        let table = match which {
            0 => ConventionTable::siesta(2),
            1 => ConventionTable::molden(2),
            2 => ConventionTable::openmx(2),
            _ => ConventionTable::decreasingm(2),
        };
        let map = spd_map(&table);
        let original = Array1::from_vec(values);
        let mut v = original.clone();
        map.transform_dense(&mut v, Axis(0)).unwrap();
        map.inverse_transform_dense(&mut v, Axis(0)).unwrap();
        assert_abs_diff_eq!(v, original, epsilon = 1e-14);
    }

    #[test]
    fn test_orbital_map_sparse_preserves_symmetry(
        entries in prop::collection::vec((0usize..9, 0usize..9, -5.0f64..5.0), 0..30),
        which in 0usize..3,
    ) {
        let table = match which {
            0 => ConventionTable::siesta(2),
            1 => ConventionTable::molden(2),
            _ => ConventionTable::openmx(2),
        };
        let map = spd_map(&table);
        let symmetric = entries
            .iter()
            .flat_map(|&(r, c, v)| [(r, c, v), (c, r, v)])
            .collect::<Vec<_>>();
        let mat = CooMatrix::from_triplets((9, 9), &symmetric).unwrap();
        let transformed = map.transform_sparse(&mat, None).unwrap();
        prop_assert!(transformed.is_symmetric(1e-12));
        assert_abs_diff_eq!(
            map.inverse_transform_sparse(&transformed).unwrap().to_dense(),
            mat.to_dense(),
            epsilon = 1e-12
        );
    }
}

#[test]
fn test_folding_map_deserialise_validated() {
    let fm: FoldingMap =
        serde_yaml::from_str("orb_sc2orb_uc: [0, 1, 2, 3, 0]\nnorbs_uc: 4\n").unwrap();
    assert_eq!(fm.norbs_sc(), 5);
    let map = sp_map(&ConventionTable::siesta(1));
    let mat = CooMatrix::from_triplets((4, 5), &[(1, 4, 2.0)]).unwrap();
    assert_eq!(map.transform_sparse(&mat, Some(&fm)).unwrap().get(1, 0), -2.0);

    assert!(
        serde_yaml::from_str::<FoldingMap>("orb_sc2orb_uc: [0, 1, 2, 3, 9]\nnorbs_uc: 4\n")
            .is_err()
    );
}
