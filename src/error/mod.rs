use crate::canvas::CanvasError;
use crate::config::ConfigPathError;
use crate::storage::StoreError;
use thiserror::Error;

pub type AppResult<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Canvas(#[from] CanvasError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    ConfigPath(#[from] ConfigPathError),
}
