//! Tributary CLI library - shared functionality for testing and binary.

pub mod dot;
pub mod inspect;
pub mod io;
