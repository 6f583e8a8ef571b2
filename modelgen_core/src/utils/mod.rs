//! Small helpers shared between modules
pub(crate) mod stats;
