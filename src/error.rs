use crate::normalize::error::NormalizeError;
use crate::transport::error::TransportError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuoyantError {
    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}
