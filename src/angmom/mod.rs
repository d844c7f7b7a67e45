//! Angular momentum labels and helpers.

use phf::phf_map;

/// Alphabetical labels of angular momenta.
pub static ANGMOM_LABELS: [&str; 7] = ["S", "P", "D", "F", "G", "H", "I"];

/// Indices of alphabetical labels of angular momenta.
pub static ANGMOM_INDICES: phf::Map<&'static str, u32> = phf_map! {
    "S" => 0,
    "P" => 1,
    "D" => 2,
    "F" => 3,
    "G" => 4,
    "H" => 5,
    "I" => 6,
};

/// Returns the alphabetical label of an angular momentum, or its numeric value if there is no
/// label for it.
pub fn angmom_label(j: u32) -> String {
    usize::try_from(j)
        .ok()
        .and_then(|ju| ANGMOM_LABELS.get(ju))
        .map(|label| (*label).to_string())
        .unwrap_or_else(|| j.to_string())
}

/// Returns the number of magnetic components of a shell with angular momentum `j`.
pub fn n_comps(j: u32) -> usize {
    2 * j as usize + 1
}

/// Returns the angular momentum denoted by an alphabetical label, ignoring case.
pub fn angmom_from_label(label: &str) -> Option<u32> {
    ANGMOM_INDICES.get(label.to_uppercase().as_str()).copied()
}
