//! Query execution: one resolver per exposed operation.
//!
//! Each resolver assembles the projection, nested arguments, depth check, and
//! caller identity into storage calls, then shapes the documents that come
//! back to the exact selection the caller asked for. An operation either
//! returns a fully assembled result or fails entirely.

use std::sync::Arc;

use apollo_compiler::ExecutableDocument;
use apollo_compiler::Node;
use apollo_compiler::ast;
use apollo_compiler::executable::Field;
use apollo_compiler::executable::Operation;
use apollo_compiler::executable::Selection;
use apollo_compiler::executable::SelectionSet;
use futures::future::try_join_all;
use http::HeaderMap;
use serde_json_bytes::ByteString;
use serde_json_bytes::Value;

use crate::authentication::JwtAuth;
use crate::configuration::Configuration;
use crate::configuration::ConfigurationError;
use crate::error::OperationError;
use crate::graphql;
use crate::json_ext::Object;
use crate::spec::NestedArguments;
use crate::spec::Projection;
use crate::spec::Query;
use crate::spec::Schema;
use crate::spec::SpecError;
use crate::spec::operation_limits;
use crate::storage::BOOKS;
use crate::storage::CONTACTS;
use crate::storage::Document;
use crate::storage::DocumentStore;
use crate::storage::Filter;
use crate::storage::FindOptions;
use crate::storage::POSTS;
use crate::storage::SECRETS;
use crate::storage::USERS;

/// Argument selecting the prefix filter of the `secrets` operation.
const STARTS_WITH_ARGUMENT: &str = "STARTS_WITH";
/// Argument naming the caller identifier of the `token` operation.
const CLIENT_ID_ARGUMENT: &str = "clientId";

const CONTACTS_FIELD: &str = "contacts";
const CLIENT_ID_FIELD: &str = "clientId";
const MESSAGE_FIELD: &str = "message";

/// Resolves GraphQL operations against the document store.
///
/// Cheap to clone; the schema, signing keys, and store handle are shared and
/// read-only once built.
#[derive(Clone)]
pub struct ExecutionService {
    schema: Arc<Schema>,
    store: Arc<dyn DocumentStore>,
    auth: Arc<JwtAuth>,
    configuration: Arc<Configuration>,
}

impl ExecutionService {
    /// Build the service from startup configuration.
    ///
    /// Fails if the signing secret is absent or the service schema does not
    /// compile; both are fatal before the listener starts.
    pub fn new(
        configuration: Arc<Configuration>,
        store: Arc<dyn DocumentStore>,
    ) -> Result<Self, ConfigurationError> {
        let schema = Schema::service()
            .map_err(|error| ConfigurationError::ServiceSchema(error.to_string()))?;
        let auth = JwtAuth::new(
            configuration.auth.secret()?,
            configuration.auth.token_expiry,
        );
        Ok(Self {
            schema: Arc::new(schema),
            store,
            auth: Arc::new(auth),
            configuration,
        })
    }

    /// Execute one GraphQL request.
    ///
    /// Any extractor, guard, authentication, or storage failure discards the
    /// partial work of the operation and surfaces as a single error.
    pub async fn execute(&self, request: graphql::Request, headers: &HeaderMap) -> graphql::Response {
        match self.execute_inner(&request, headers).await {
            Ok(data) => graphql::Response::builder().data(data).build(),
            Err(error) => {
                tracing::warn!(?error, "operation failed");
                error.to_response()
            }
        }
    }

    async fn execute_inner(
        &self,
        request: &graphql::Request,
        headers: &HeaderMap,
    ) -> Result<Value, OperationError> {
        let query_text = request
            .query
            .as_deref()
            .filter(|query| !query.trim().is_empty())
            .ok_or(SpecError::MissingQuery)?;
        let query = Query::parse(query_text, request.operation_name.as_deref(), &self.schema)?;
        let operation = query.operation()?;
        let document = query.document();

        let mut fields = Vec::new();
        collect_root_fields(document, &operation.selection_set, &mut fields);

        let mut data = Object::default();
        for field in fields {
            let value = self
                .resolve_root_field(document, operation, field, headers)
                .await?;
            data.insert(ByteString::from(field.response_key().as_str()), value);
        }
        Ok(Value::Object(data))
    }

    async fn resolve_root_field(
        &self,
        document: &ExecutableDocument,
        operation: &Operation,
        field: &Node<Field>,
        headers: &HeaderMap,
    ) -> Result<Value, OperationError> {
        match field.name.as_str() {
            "books" => self.resolve_books(document, field).await,
            "usersWithContacts" => self.resolve_with_contacts(USERS, document, field).await,
            "booksWithContacts" => self.resolve_with_contacts(BOOKS, document, field).await,
            "posts" => self.resolve_posts(document, operation, field).await,
            "secrets" => self.resolve_secrets(document, field, headers).await,
            "token" => self.resolve_token(field),
            "__typename" => Ok(Value::String(ByteString::from("Query"))),
            "__schema" | "__type" => Err(SpecError::IntrospectionNotSupported.into()),
            other => Err(SpecError::InvalidField(other.to_owned()).into()),
        }
    }

    /// Full-collection read with a minimal projection.
    async fn resolve_books(
        &self,
        document: &ExecutableDocument,
        field: &Node<Field>,
    ) -> Result<Value, OperationError> {
        let projection = Projection::of_level(document, &field.selection_set);
        let books = self
            .store
            .find(
                BOOKS,
                Filter::new(),
                FindOptions::default().with_projection(projection),
            )
            .await?;
        Ok(shape_list(document, &field.selection_set, books))
    }

    /// Full-collection read, then one related-record query per primary entity.
    ///
    /// The fan-out is deliberate: N secondary calls, not a batched join. All
    /// of them use the same (limit, sort) pair and run concurrently; results
    /// attach to the owning entity by position.
    async fn resolve_with_contacts(
        &self,
        primary_collection: &str,
        document: &ExecutableDocument,
        field: &Node<Field>,
    ) -> Result<Value, OperationError> {
        let projection = Projection::of_level(document, &field.selection_set);
        let arguments = NestedArguments::of_level(document, &field.selection_set);
        let limit = arguments.limit();
        let sort = arguments.sort_key().map(str::to_owned);

        let primaries = self
            .store
            .find(
                primary_collection,
                Filter::new(),
                FindOptions::default().with_projection(projection),
            )
            .await?;

        let lookups = primaries.iter().map(|_entity| {
            self.store.find(
                CONTACTS,
                Filter::new(),
                FindOptions::default()
                    .with_limit(limit)
                    .with_sort(sort.clone()),
            )
        });
        let related = try_join_all(lookups).await?;

        let entities: Vec<Document> = primaries
            .into_iter()
            .zip(related)
            .map(|(mut entity, contacts)| {
                entity.insert(
                    CONTACTS_FIELD,
                    Value::Array(contacts.into_iter().map(Value::Object).collect()),
                );
                entity
            })
            .collect();
        Ok(shape_list(document, &field.selection_set, entities))
    }

    /// Depth-guarded read of the posts collection.
    async fn resolve_posts(
        &self,
        document: &ExecutableDocument,
        operation: &Operation,
        field: &Node<Field>,
    ) -> Result<Value, OperationError> {
        operation_limits::check(
            &self.configuration.limits,
            document,
            &operation.selection_set,
        )?;
        let projection = Projection::of_level(document, &field.selection_set);
        let posts = self
            .store
            .find(
                POSTS,
                Filter::new(),
                FindOptions::default().with_projection(projection),
            )
            .await?;
        Ok(shape_list(document, &field.selection_set, posts))
    }

    /// Identity-scoped search.
    ///
    /// The caller identity is resolved first; a missing or invalid credential
    /// aborts before any storage call is issued.
    async fn resolve_secrets(
        &self,
        document: &ExecutableDocument,
        field: &Node<Field>,
        headers: &HeaderMap,
    ) -> Result<Value, OperationError> {
        let identity = self.auth.authenticate(headers)?;

        let mut filter = Filter::new().equals(
            CLIENT_ID_FIELD,
            Value::String(ByteString::from(identity.client_id())),
        );
        match field_argument(field, STARTS_WITH_ARGUMENT) {
            Some(ast::Value::String(prefix)) => {
                filter = filter.starts_with(MESSAGE_FIELD, prefix.as_str());
            }
            Some(_) => {
                return Err(SpecError::NonLiteralArgument(STARTS_WITH_ARGUMENT.to_owned()).into());
            }
            None => {}
        }

        let projection = Projection::of_level(document, &field.selection_set);
        let secrets = self
            .store
            .find(
                SECRETS,
                filter,
                FindOptions::default().with_projection(projection),
            )
            .await?;
        Ok(shape_list(document, &field.selection_set, secrets))
    }

    /// Mint a credential; no storage access occurs.
    fn resolve_token(&self, field: &Node<Field>) -> Result<Value, OperationError> {
        let client_id = match field_argument(field, CLIENT_ID_ARGUMENT) {
            Some(ast::Value::String(client_id)) => client_id.as_str(),
            Some(_) => {
                return Err(SpecError::NonLiteralArgument(CLIENT_ID_ARGUMENT.to_owned()).into());
            }
            None => return Err(SpecError::MissingArgument(CLIENT_ID_ARGUMENT.to_owned()).into()),
        };
        let token = self.auth.sign(client_id)?;
        Ok(Value::String(ByteString::from(token)))
    }
}

fn field_argument<'a>(field: &'a Field, name: &str) -> Option<&'a ast::Value> {
    field
        .arguments
        .iter()
        .find(|argument| argument.name.as_str() == name)
        .map(|argument| argument.value.as_ref())
}

/// The top-level fields of an operation, in document order, looking through
/// fragments.
fn collect_root_fields<'a>(
    document: &'a ExecutableDocument,
    selection_set: &'a SelectionSet,
    fields: &mut Vec<&'a Node<Field>>,
) {
    for selection in &selection_set.selections {
        match selection {
            Selection::Field(field) => fields.push(field),
            Selection::InlineFragment(fragment) => {
                collect_root_fields(document, &fragment.selection_set, fields);
            }
            Selection::FragmentSpread(spread) => {
                if let Some(fragment) = document.fragments.get(&spread.fragment_name) {
                    collect_root_fields(document, &fragment.selection_set, fields);
                }
            }
        }
    }
}

fn shape_list(
    document: &ExecutableDocument,
    selection_set: &SelectionSet,
    documents: Vec<Document>,
) -> Value {
    Value::Array(
        documents
            .into_iter()
            .map(|source| Value::Object(shape_document(document, selection_set, &source)))
            .collect(),
    )
}

/// Reduce a stored document to the fields the caller selected, recursively.
///
/// Requested fields absent from the document resolve to null; aliases are
/// honored through the response key.
fn shape_document(
    document: &ExecutableDocument,
    selection_set: &SelectionSet,
    source: &Document,
) -> Object {
    let mut shaped = Object::default();
    shape_into(document, selection_set, source, &mut shaped);
    shaped
}

fn shape_into(
    document: &ExecutableDocument,
    selection_set: &SelectionSet,
    source: &Document,
    out: &mut Object,
) {
    for selection in &selection_set.selections {
        match selection {
            Selection::Field(field) => {
                let key = ByteString::from(field.response_key().as_str());
                if field.name.as_str() == "__typename" {
                    out.insert(key, Value::String(ByteString::from(selection_set.ty.as_str())));
                    continue;
                }
                let value = source.get(field.name.as_str()).cloned().unwrap_or(Value::Null);
                let value = if field.selection_set.selections.is_empty() {
                    value
                } else {
                    shape_value(document, &field.selection_set, value)
                };
                out.insert(key, value);
            }
            Selection::InlineFragment(fragment) => {
                shape_into(document, &fragment.selection_set, source, out);
            }
            Selection::FragmentSpread(spread) => {
                if let Some(fragment) = document.fragments.get(&spread.fragment_name) {
                    shape_into(document, &fragment.selection_set, source, out);
                }
            }
        }
    }
}

fn shape_value(document: &ExecutableDocument, selection_set: &SelectionSet, value: Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| shape_value(document, selection_set, item))
                .collect(),
        ),
        Value::Object(source) => Value::Object(shape_document(document, selection_set, &source)),
        other => other,
    }
}
