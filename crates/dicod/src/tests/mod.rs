//! Crate-level test helpers shared by the unit test modules.

pub(crate) mod support;
