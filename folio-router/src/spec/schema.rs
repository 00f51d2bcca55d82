use std::ops::Deref;

use apollo_compiler::validation::Valid;

use super::SpecError;

/// The SDL for the service's type system, compiled once at startup.
const SERVICE_SDL: &str = include_str!("schema.graphql");

/// A GraphQL schema.
#[derive(Debug)]
pub(crate) struct Schema {
    definitions: Valid<apollo_compiler::Schema>,
}

impl Schema {
    /// Compile and validate a schema from its SDL.
    pub(crate) fn parse(sdl: &str) -> Result<Self, SpecError> {
        let definitions = apollo_compiler::Schema::parse_and_validate(sdl, "schema.graphql")
            .map_err(|invalid| SpecError::ValidationError(invalid.errors.to_string()))?;
        Ok(Self { definitions })
    }

    /// The schema served by this process.
    pub(crate) fn service() -> Result<Self, SpecError> {
        Self::parse(SERVICE_SDL)
    }

    pub(crate) fn definitions(&self) -> &Valid<apollo_compiler::Schema> {
        &self.definitions
    }
}

impl Deref for Schema {
    type Target = Valid<apollo_compiler::Schema>;

    fn deref(&self) -> &Self::Target {
        &self.definitions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_schema_compiles() {
        let schema = Schema::service().expect("service schema must compile");
        assert!(schema.definitions().types.contains_key("Book"));
    }

    #[test]
    fn test_invalid_sdl_is_rejected() {
        let result = Schema::parse("type Query { books: [Missing] }");
        assert!(matches!(result, Err(SpecError::ValidationError(_))));
    }
}
