use crate::basis::species::{ShellInput, SpeciesInput};
use crate::convention::{ConventionKind, CustomShellConvention};
use crate::io::{read_aonorm_yaml, write_aonorm_yaml};

#[test]
fn test_io_yaml_write_read() {
    let species = vec![SpeciesInput::builder()
        .symbol("ghost:C")
        .shells(vec![
            ShellInput::builder().j(0).rcut(4.5).build().unwrap(),
            ShellInput::builder().j(1).rcut(5.5).build().unwrap(),
        ])
        .build()
        .unwrap()];
    let name = std::env::temp_dir().join(format!("aonorm_io_species_{}", std::process::id()));
    write_aonorm_yaml(&name, &species).unwrap();
    let path = name.with_extension("yml");
    let read: Vec<SpeciesInput> = read_aonorm_yaml(&path).unwrap();
    assert_eq!(read, species);
    std::fs::remove_file(path).unwrap();
}

#[test]
fn test_io_yaml_convention() {
    let kind = ConventionKind::Custom(vec![CustomShellConvention {
        mls: vec![0],
        signs: Some(vec![-1.0]),
    }]);
    let name = std::env::temp_dir().join(format!("aonorm_io_convention_{}", std::process::id()));
    write_aonorm_yaml(&name, &kind).unwrap();
    let path = name.with_extension("yml");
    let read: ConventionKind = read_aonorm_yaml(&path).unwrap();
    assert_eq!(read, kind);
    std::fs::remove_file(path).unwrap();
}

#[test]
fn test_io_yaml_missing_file() {
    let missing = std::env::temp_dir().join("aonorm_io_does_not_exist.yml");
    assert!(read_aonorm_yaml::<ConventionKind, _>(&missing).is_err());
}
