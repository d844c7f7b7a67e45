//! # aonorm: atomic-orbital index normalisation
//!
//! `aonorm` ingests electronic-structure data produced by several independent quantum-chemistry
//! programs and expresses it in one consistent atomic-orbital index space. It provides
//! - a species/shell catalog deduced from per-atom claims or given explicitly,
//! - global orbital index tables (`atom2s`, `atom2mu_s`, `mu2orb_s`, `orb2j`, `orb2m`) built by
//!   walking atoms, then shells, then magnetic quantum numbers, and
//! - basis-convention transforms that reorder and re-sign the functions of every shell into the
//!   canonical increasing-$`m`$ convention, for dense tensors along any orbital axis and for
//!   sparse matrices, optionally folding supercell indices onto the unit cell.
//!
//! Sources plug in through [`interfaces::SourceAdapter`]. A YAML input description,
//! [`interfaces::input::InputSystem`], is provided as an adapter in its own right so that the
//! whole pipeline can be driven from a file.
//!
//! ## Errors
//!
//! Core operations return [`error::AoNormResult`], whose error kinds are
//! - [`error::AoNormError::Configuration`] for inconsistent definitions or mismatched lengths,
//! - [`error::AoNormError::Index`] for indices outside of their documented range, and
//! - [`error::AoNormError::Consistency`] for post-transform validation failures.
//!
//! The adapter and driver layer works with [`anyhow::Error`].
//!
//! ## Logging
//!
//! Diagnostics are emitted through the [`log`] facade. Human-readable report output goes to the
//! `aonorm-output` target, which the `aonorm` binary routes to the console or to a file with
//! `log4rs`.

pub mod angmom;
pub mod auxiliary;
pub mod basis;
pub mod convention;
pub mod error;
pub mod interfaces;
pub mod io;
pub mod permutation;
pub mod sparse;
pub mod validation;
