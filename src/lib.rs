#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![warn(clippy::all, clippy::cargo, clippy::nursery, missing_docs)]
#![doc = include_str!("../README.md")]

/// Shared mathematical utilities (scalars, state vectors, norms).
pub mod math;
/// Typed symbolic expressions and their normal form.
pub mod symbolic;
/// Circuit topology, Kirchhoff derivation and numeric binding.
pub mod circuits;
/// Transient integration and waveform export.
pub mod simulation;
/// Error types shared between submodules.
pub mod errors;

/// Common exports for downstream crates.
pub mod prelude;
