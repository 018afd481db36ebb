use thiserror::Error;

use authz::error::AuthzError;
use permissions::TreeError;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Seed data error: {0}")]
    Seed(String),

    #[error("Authorization error: {0}")]
    Authz(#[from] AuthzError),

    #[error("Permission tree error: {0}")]
    Tree(#[from] TreeError),

    #[error("Logging error: {0}")]
    Logging(String),
}
