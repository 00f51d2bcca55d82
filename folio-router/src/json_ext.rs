//! JSON aliases shared by the GraphQL types and the storage layer.

use serde_json_bytes::ByteString;
use serde_json_bytes::Map;

/// A JSON object, as used in GraphQL response trees and stored documents.
pub type Object = Map<ByteString, Value>;

pub use serde_json_bytes::Value;
