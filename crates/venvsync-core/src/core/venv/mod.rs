pub mod errors;
pub mod venv_cli;
