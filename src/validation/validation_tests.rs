use approx::assert_abs_diff_eq;
use ndarray::array;

use crate::convention::orbital_map::OrbitalMap;
use crate::convention::ConventionTable;
use crate::sparse::CooMatrix;
use crate::validation::{check_round_trip, check_symmetric, overlap_check, relative_tolerance};

fn overlap() -> CooMatrix<f64> {
    CooMatrix::from_dense(&array![
        [1.0, 0.3, 0.0, 0.1],
        [0.3, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.1, 0.0, 0.0, 1.0]
    ])
}

#[test]
fn test_validation_check_symmetric() {
    assert_eq!(check_symmetric(&overlap(), 1e-12).unwrap(), 0.0);

    let skew = CooMatrix::from_triplets((2, 2), &[(0, 1, 1e-3)]).unwrap();
    assert!(check_symmetric(&skew, 1e-6).unwrap_err().is_consistency());
    assert_abs_diff_eq!(check_symmetric(&skew, 1e-2).unwrap(), 1e-3, epsilon = 1e-15);

    let rect = CooMatrix::<f64>::zeros((2, 3));
    assert!(check_symmetric(&rect, 1.0).unwrap_err().is_consistency());
}

#[test]
fn test_validation_check_round_trip() {
    let map = OrbitalMap::new(
        &[0, 1, 1, 1],
        &[0, -1, 0, 1],
        4,
        &ConventionTable::openmx(1),
    )
    .unwrap();
    assert!(check_round_trip(&map, &overlap(), 1e-14).unwrap() < 1e-14);

    let wrong = CooMatrix::<f64>::zeros((3, 3));
    assert!(check_round_trip(&map, &wrong, 1e-14)
        .unwrap_err()
        .is_configuration());
}

#[test]
fn test_validation_overlap_check() {
    let reference = overlap();
    assert_eq!(overlap_check(&reference, &reference, 1e-5).unwrap(), 0.0);

    let perturbed = CooMatrix::from_triplets(
        (4, 4),
        &reference
            .triplets()
            .map(|(r, c, v)| (r, c, if r == c { v + 1e-3 } else { v }))
            .collect::<Vec<_>>(),
    )
    .unwrap();
    assert!(overlap_check(&reference, &perturbed, 1e-5)
        .unwrap_err()
        .is_consistency());
    let ratio = overlap_check(&reference, &perturbed, 1e-2).unwrap();
    assert_abs_diff_eq!(ratio, 4e-3 / (2.0 * 4.8 + 4e-3), epsilon = 1e-12);

    let small = CooMatrix::<f64>::zeros((2, 2));
    assert!(overlap_check(&reference, &small, 1e-5)
        .unwrap_err()
        .is_configuration());
}

#[test]
fn test_validation_relative_tolerance() {
    let big = CooMatrix::from_triplets(
        (2, 2),
        &[(0, 0, 4.0e6), (0, 1, 1.0), (1, 0, 1.0 + 1e-7), (0, 0, 1.0e6)],
    )
    .unwrap();
    assert_eq!(big.max_abs(), 5.0e6);
    assert_abs_diff_eq!(relative_tolerance(&big, 1e-12), 5.0e-6, epsilon = 1e-18);

    // An asymmetry of 1e-7 is within 1e-12 relative to entries of order 1e6.
    assert!(check_symmetric(&big, 1e-12).is_err());
    assert!(check_symmetric(&big, relative_tolerance(&big, 1e-12)).is_ok());

    assert_eq!(relative_tolerance(&CooMatrix::zeros((3, 3)), 1e-12), 0.0);
}
