use thiserror::Error;

use crate::model::Id;
use crate::store::StoreError;

pub type CrmResult<T> = Result<T, CrmError>;

#[derive(Debug, Error)]
pub enum CrmError {
    #[error("{entity} ID '{id}' does not exist. Please select a valid {entity}.")]
    MissingReference { entity: &'static str, id: Id },
    #[error("No fields to update")]
    NoFieldsToUpdate,
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Id },
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
    #[error("stored {entity} row could not be read: {reason}")]
    CorruptRecord { entity: &'static str, reason: String },
    #[error(transparent)]
    Store(#[from] StoreError),
}
