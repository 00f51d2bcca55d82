//! Router errors.
//!
//! Internal failures are typed per layer and mapped at the operation boundary
//! to a single user-facing GraphQL error carrying an `extensions.code`:
//!
//! | internal kind                     | `extensions.code`           |
//! |-----------------------------------|-----------------------------|
//! | request parse failure             | `PARSING_ERROR`             |
//! | request validation failure        | `GRAPHQL_VALIDATION_FAILED` |
//! | selection tree too deep           | `MAX_DEPTH_EXCEEDED`        |
//! | missing/invalid/expired credential| `UNAUTHENTICATED`           |
//! | backing-store failure             | `STORAGE_ERROR`             |

use displaydoc::Display;
use thiserror::Error;

use crate::authentication::AuthenticationError;
use crate::graphql;
use crate::graphql::ErrorExtension;
use crate::spec::SpecError;
use crate::spec::operation_limits::DepthLimitExceeded;
use crate::storage::StorageError;

/// Errors raised while executing one operation.
///
/// Note that these are not returned to the client as-is; they are converted
/// to a [`graphql::Error`] at the operation boundary. Storage detail in
/// particular is logged internally and not surfaced.
#[derive(Error, Display, Debug)]
#[non_exhaustive]
pub(crate) enum OperationError {
    /// invalid request: {0}
    Validation(#[from] SpecError),

    /// {0}
    DepthLimitExceeded(#[from] DepthLimitExceeded),

    /// authentication failed: {0}
    Authentication(#[from] AuthenticationError),

    /// storage operation failed
    Storage(#[from] StorageError),
}

impl ErrorExtension for OperationError {
    fn extension_code(&self) -> String {
        match self {
            OperationError::Validation(spec_error) => spec_error.extension_code(),
            OperationError::DepthLimitExceeded(_) => "MAX_DEPTH_EXCEEDED".to_string(),
            OperationError::Authentication(auth_error) => auth_error.extension_code(),
            OperationError::Storage(_) => "STORAGE_ERROR".to_string(),
        }
    }
}

impl OperationError {
    /// Convert to the single user-facing GraphQL error for this operation.
    pub(crate) fn to_graphql_error(&self) -> graphql::Error {
        graphql::Error::builder()
            .message(self.to_string())
            .extension_code(self.extension_code())
            .build()
    }

    /// Convert the error to an appropriate response.
    pub(crate) fn to_response(&self) -> graphql::Response {
        graphql::Response::builder()
            .error(self.to_graphql_error())
            .build()
    }
}
