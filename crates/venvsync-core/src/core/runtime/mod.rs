pub mod effects;
pub(crate) mod pdm;
pub mod process;
