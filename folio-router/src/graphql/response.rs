use serde::Deserialize;
use serde::Serialize;
use serde_json_bytes::ByteString;
use serde_json_bytes::Map;
use serde_json_bytes::Value;

use super::Error;
use crate::json_ext::Object;

/// A GraphQL primary response.
///
/// An operation either populates `data` in full or reports a single error in
/// `errors`; partially populated results are never produced.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct Response {
    /// The response data.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub data: Option<Value>,

    /// The optional graphql errors encountered.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub errors: Vec<Error>,

    /// The optional graphql extensions.
    #[serde(skip_serializing_if = "Object::is_empty", default)]
    pub extensions: Object,
}

#[buildstructor::buildstructor]
impl Response {
    /// Constructor
    #[builder(visibility = "pub")]
    fn new(
        data: Option<Value>,
        errors: Vec<Error>,
        extensions: Map<ByteString, Value>,
    ) -> Self {
        Self {
            data,
            errors,
            extensions,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json_bytes::json as bjson;

    use super::*;

    #[test]
    fn test_response_serialization_skips_empty_fields() {
        let response = Response::builder()
            .data(bjson!({ "books": [] }))
            .build();
        let serialized = serde_json::to_value(&response).unwrap();
        assert_eq!(serialized, serde_json::json!({ "data": { "books": [] } }));
    }

    #[test]
    fn test_error_response_has_no_data() {
        let response = Response::builder()
            .error(Error::builder().message("boom").build())
            .build();
        assert!(response.data.is_none());
        let serialized = serde_json::to_value(&response).unwrap();
        assert_eq!(
            serialized,
            serde_json::json!({ "errors": [ { "message": "boom" } ] })
        );
    }
}
