//! Fatal harness errors.
//!
//! These abort the run before the first case executes. Case failures are not errors in this sense; they are
//! reported through [`super::runner::RunOutcome`].

use miette::Diagnostic;
use thiserror::Error;

use super::catalog::CatalogError;
use super::config::ConfigError;

#[derive(Debug, Error, Diagnostic)]
pub enum HarnessError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Catalog(#[from] CatalogError),
}
