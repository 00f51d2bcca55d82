use apollo_compiler::ExecutableDocument;
use apollo_compiler::Node;
use apollo_compiler::ast;
use apollo_compiler::ast::OperationType;
use apollo_compiler::executable::Operation;
use apollo_compiler::validation::Valid;

use super::Schema;
use super::SpecError;

/// A parsed and validated request document, plus the requested operation name.
///
/// Parsing is delegated to apollo-compiler; this type only consumes the
/// resulting executable document.
#[derive(Debug)]
pub(crate) struct Query {
    document: Valid<ExecutableDocument>,
    operation_name: Option<String>,
}

impl Query {
    /// Parse the query string and validate it against the schema.
    pub(crate) fn parse(
        query: &str,
        operation_name: Option<&str>,
        schema: &Schema,
    ) -> Result<Self, SpecError> {
        let ast = ast::Document::parse(query, "query.graphql")
            .map_err(|invalid| SpecError::ParsingError(invalid.errors.to_string()))?;
        let document = ast
            .to_executable_validate(schema.definitions())
            .map_err(|invalid| SpecError::ValidationError(invalid.errors.to_string()))?;
        Ok(Self {
            document,
            operation_name: operation_name.map(str::to_owned),
        })
    }

    pub(crate) fn document(&self) -> &ExecutableDocument {
        &self.document
    }

    /// Look up the operation this request asks to execute.
    pub(crate) fn operation(&self) -> Result<&Node<Operation>, SpecError> {
        let operation = self
            .document
            .operations
            .get(self.operation_name.as_deref())
            .ok()
            .ok_or_else(|| match &self.operation_name {
                Some(name) => SpecError::UnknownOperation(name.clone()),
                None => SpecError::AmbiguousOperation,
            })?;
        if operation.operation_type == OperationType::Subscription {
            return Err(SpecError::SubscriptionNotSupported);
        }
        Ok(operation)
    }
}
