use thiserror::Error;
use uuid::Uuid;

use crate::{model::ContainerId, store::StoreError};

#[derive(Debug, Error)]
pub enum Error {
    /// A public container was requested below a private one.
    #[error("a public container cannot be placed under private {parent}")]
    VisibilityConflict { parent: ContainerId },
    #[error("{0} does not exist")]
    NotFound(ContainerId),
    #[error("task {0} does not exist")]
    TaskNotFound(Uuid),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
