pub mod config;
pub mod runtime;
pub mod selection;
pub mod sync;
pub mod tooling;
pub mod venv;
pub mod watch;

#[cfg(test)]
pub(crate) mod test_support;
