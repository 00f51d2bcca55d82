mod arguments;
pub(crate) mod operation_limits;
mod query;
mod schema;
mod selection;

pub(crate) use arguments::NestedArguments;
use displaydoc::Display;
pub(crate) use query::Query;
pub(crate) use schema::Schema;
pub use selection::Projection;
use thiserror::Error;

use crate::graphql::ErrorExtension;

/// GraphQL request processing errors.
///
/// These cover everything that can go wrong before an operation reaches the
/// store: parse failures, validation failures, and malformed arguments.
#[derive(Error, Debug, Display, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub(crate) enum SpecError {
    /// must provide a query string
    MissingQuery,
    /// parsing error: {0}
    ParsingError(String),
    /// validation error: {0}
    ValidationError(String),
    /// unknown operation named "{0}"
    UnknownOperation(String),
    /// must provide an operation name when the document contains multiple operations
    AmbiguousOperation,
    /// subscription operation is not supported
    SubscriptionNotSupported,
    /// introspection is not supported
    IntrospectionNotSupported,
    /// cannot resolve field '{0}' on type 'Query'
    InvalidField(String),
    /// argument '{0}' requires a literal value
    NonLiteralArgument(String),
    /// missing required argument '{0}'
    MissingArgument(String),
}

impl ErrorExtension for SpecError {
    fn extension_code(&self) -> String {
        match self {
            SpecError::ParsingError(_) => "PARSING_ERROR",
            SpecError::MissingQuery
            | SpecError::ValidationError(_)
            | SpecError::UnknownOperation(_)
            | SpecError::AmbiguousOperation
            | SpecError::IntrospectionNotSupported
            | SpecError::InvalidField(_)
            | SpecError::NonLiteralArgument(_)
            | SpecError::MissingArgument(_) => "GRAPHQL_VALIDATION_FAILED",
            SpecError::SubscriptionNotSupported => "SUBSCRIPTION_NOT_SUPPORTED",
        }
        .to_string()
    }
}
