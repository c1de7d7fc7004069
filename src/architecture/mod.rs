//! Architecture-specific target drivers.
//!
//! A host framework that also drives ARM and RISC-V cores would have a
//! sibling module per architecture here; this crate implements Xtensa only.

pub mod xtensa;
