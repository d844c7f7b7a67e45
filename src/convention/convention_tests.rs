use crate::basis::ao::PureOrder;
use crate::convention::{ConventionKind, ConventionTable, CustomShellConvention, ShellConvention};

#[test]
fn test_convention_shell_new() {
    let sc = ShellConvention::new(&PureOrder::molden(1), &[1.0, -1.0, 1.0]).unwrap();
    assert_eq!(sc.lpure(), 1);
    assert_eq!(sc.ncomps(), 3);
    assert_eq!(sc.image(), &[1, 2, 0]);
    assert_eq!(sc.signs(), &[1.0, -1.0, 1.0]);
    assert!(!sc.is_sign_only());
    assert!(!sc.is_identity());

    assert!(ShellConvention::new(&PureOrder::molden(1), &[1.0, 1.0])
        .unwrap_err()
        .is_configuration());
    assert!(ShellConvention::new(&PureOrder::molden(1), &[1.0, 0.5, 1.0])
        .unwrap_err()
        .is_configuration());
}

#[test]
fn test_convention_shell_inverse() {
    let sc = ShellConvention::new(&PureOrder::openmx(2), &[1.0, -1.0, 1.0, 1.0, -1.0]).unwrap();
    let sc_inv = sc.inverse();

    // Composing the forward and reverse transforms leaves every slot in place with sign +1.
    for (slot, (&pos, &sign)) in sc.image().iter().zip(sc.signs().iter()).enumerate() {
        assert_eq!(sc_inv.image()[pos], slot);
        assert_eq!(sc_inv.signs()[pos] * sign, 1.0);
    }
    assert_eq!(sc_inv.inverse(), sc);
}

#[test]
fn test_convention_table_builtin() {
    let canonical = ConventionTable::canonical(3);
    assert_eq!(canonical.lmax(), Some(3));
    assert!(canonical.is_identity());
    assert!(canonical.is_sign_only());

    let siesta = ConventionTable::siesta(2);
    assert!(siesta.is_sign_only());
    assert!(!siesta.is_identity());
    assert_eq!(siesta.get(0).unwrap().signs(), &[1.0]);
    assert_eq!(siesta.get(1).unwrap().signs(), &[-1.0, 1.0, -1.0]);
    assert_eq!(
        siesta.get(2).unwrap().signs(),
        &[1.0, -1.0, 1.0, -1.0, 1.0]
    );

    let molden = ConventionTable::molden(2);
    assert!(!molden.is_sign_only());
    assert_eq!(molden.get(1).unwrap().image(), &[1, 2, 0]);
    assert_eq!(molden.get(2).unwrap().image(), &[2, 3, 1, 4, 0]);

    let openmx = ConventionTable::openmx(2);
    assert_eq!(openmx.get(1).unwrap().image(), &[2, 0, 1]);
    assert_eq!(openmx.get(2).unwrap().image(), &[2, 4, 0, 3, 1]);

    let decm = ConventionTable::decreasingm(1);
    assert_eq!(decm.get(1).unwrap().image(), &[2, 1, 0]);

    assert!(molden.get(3).unwrap_err().is_configuration());
    assert_eq!(molden.inverse().inverse(), molden);
}

#[test]
fn test_convention_table_from_shell_conventions() {
    let table = ConventionTable::from_shell_conventions(
        "pair",
        vec![ShellConvention::canonical(0), ShellConvention::canonical(1)],
    )
    .unwrap();
    assert_eq!(table.name(), "pair");
    assert_eq!(table.lmax(), Some(1));

    assert!(ConventionTable::from_shell_conventions(
        "skip",
        vec![ShellConvention::canonical(0), ShellConvention::canonical(2)],
    )
    .unwrap_err()
    .is_configuration());

    let empty = ConventionTable::from_shell_conventions("empty", vec![]).unwrap();
    assert_eq!(empty.lmax(), None);
    assert!(empty.get(0).unwrap_err().is_configuration());
}

#[test]
fn test_convention_kind_to_table() {
    assert_eq!(
        ConventionKind::Siesta.to_table(2).unwrap(),
        ConventionTable::siesta(2)
    );
    assert_eq!(
        ConventionKind::default().to_table(1).unwrap(),
        ConventionTable::canonical(1)
    );

    let custom = ConventionKind::Custom(vec![
        CustomShellConvention {
            mls: vec![0],
            signs: None,
        },
        CustomShellConvention {
            mls: vec![1, 0, -1],
            signs: Some(vec![1.0, 1.0, -1.0]),
        },
    ]);
    let table = custom.to_table(5).unwrap();
    assert_eq!(table.lmax(), Some(1));
    assert_eq!(table.get(1).unwrap().image(), &[2, 1, 0]);
    assert_eq!(table.get(1).unwrap().signs(), &[1.0, 1.0, -1.0]);

    let bad = ConventionKind::Custom(vec![CustomShellConvention {
        mls: vec![0, 1],
        signs: None,
    }]);
    assert!(bad.to_table(1).unwrap_err().is_configuration());
}

#[test]
fn test_convention_kind_serde() {
    let kind: ConventionKind = serde_yaml::from_str("Siesta").unwrap();
    assert_eq!(kind, ConventionKind::Siesta);

    let custom: ConventionKind = serde_yaml::from_str(
        "!Custom\n- mls: [0]\n- mls: [1, -1, 0]\n  signs: [1.0, -1.0, 1.0]\n",
    )
    .unwrap();
    let table = custom.to_table(0).unwrap();
    assert_eq!(table.get(1).unwrap().image(), &[2, 0, 1]);
}
