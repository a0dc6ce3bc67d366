use sf_core::ConfigError;
use sf_serve::ServeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Serve(#[from] ServeError),
    #[error("terminal output failed: {0}")]
    Io(#[from] std::io::Error),
}
