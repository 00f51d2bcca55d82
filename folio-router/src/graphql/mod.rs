//! Types related to GraphQL requests, responses, etc.

mod request;
mod response;

use std::fmt;

pub use request::Request;
pub use response::Response;
use serde::Deserialize;
use serde::Serialize;
use serde_json_bytes::ByteString;
use serde_json_bytes::Map as JsonMap;
use serde_json_bytes::Value;

use crate::json_ext::Object;

/// The error location
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    /// The line number
    pub line: u32,
    /// The column number
    pub column: u32,
}

/// A [GraphQL error](https://spec.graphql.org/October2021/#sec-Errors)
/// as may be found in the `errors` field of a GraphQL [`Response`].
///
/// Converted to (or from) JSON with serde.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
#[non_exhaustive]
pub struct Error {
    /// The error message.
    pub message: String,

    /// The locations of the error in the GraphQL document of the originating request.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<Location>,

    /// The optional GraphQL extensions for this error.
    #[serde(skip_serializing_if = "Object::is_empty")]
    pub extensions: Object,
}

#[buildstructor::buildstructor]
impl Error {
    /// Returns a builder that builds a GraphQL [`Error`] from its components.
    ///
    /// The `extension_code` shortcut sets the "code" entry of the extension
    /// map unless the map already carries one.
    #[builder(visibility = "pub")]
    fn new(
        message: String,
        locations: Vec<Location>,
        extension_code: Option<String>,
        // Skip the `Object` type alias in order to use buildstructor's map special-casing
        mut extensions: JsonMap<ByteString, Value>,
    ) -> Self {
        if let Some(code) = extension_code {
            extensions
                .entry("code")
                .or_insert(Value::String(ByteString::from(code)));
        }
        Self {
            message,
            locations,
            extensions,
        }
    }

    /// Extract the error code from [`Error::extensions`] as a String if it is set.
    pub fn extension_code(&self) -> Option<String> {
        self.extensions.get("code").and_then(|c| match c {
            Value::String(s) => Some(s.as_str().to_owned()),
            Value::Number(n) => Some(n.to_string()),
            Value::Null | Value::Array(_) | Value::Object(_) | Value::Bool(_) => None,
        })
    }
}

/// Displays (only) the error message.
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.message.fmt(f)
    }
}

/// Trait used to get the `extensions.code` value for an internal error kind.
pub(crate) trait ErrorExtension
where
    Self: Sized,
{
    fn extension_code(&self) -> String;
}

#[cfg(test)]
mod tests {
    use serde_json_bytes::json;

    use super::*;

    #[test]
    fn test_error_builder_sets_code() {
        let error = Error::builder()
            .message("credential expired")
            .extension_code("UNAUTHENTICATED")
            .build();
        assert_eq!(error.extension_code().as_deref(), Some("UNAUTHENTICATED"));
        assert_eq!(error.to_string(), "credential expired");
    }

    #[test]
    fn test_error_builder_does_not_overwrite_code() {
        let error = Error::builder()
            .message("boom")
            .extensions(
                json!({ "code": "EXISTING" })
                    .as_object()
                    .cloned()
                    .unwrap(),
            )
            .extension_code("IGNORED")
            .build();
        assert_eq!(error.extension_code().as_deref(), Some("EXISTING"));
    }

    #[test]
    fn test_error_serialization_skips_empty_fields() {
        let error = Error::builder().message("boom").build();
        let serialized = serde_json::to_value(&error).unwrap();
        assert_eq!(serialized, serde_json::json!({ "message": "boom" }));
    }
}
