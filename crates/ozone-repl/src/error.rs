//! Facade error type: unifies the sub-crate error types behind one
//! `anyhow`-style surface for binary consumers, per the teacher's
//! convention of reserving `anyhow` for the outermost crate only.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ozone_repl_config::ConfigError),

    #[error(transparent)]
    Manager(#[from] ozone_repl_manager::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
