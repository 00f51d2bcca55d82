use apollo_compiler::ExecutableDocument;
use apollo_compiler::Node;
use apollo_compiler::ast;
use apollo_compiler::executable::Selection;
use apollo_compiler::executable::SelectionSet;

/// Reserved argument name bounding the number of related records attached to
/// each parent entity.
pub(crate) const LIMIT_ARGUMENT: &str = "LIMIT";

/// Reserved argument name selecting the sort key for related records.
pub(crate) const SORT_BY_ARGUMENT: &str = "SORT_BY";

/// The arguments attached to nested fields at one selection level, flattened
/// in document order.
///
/// Accessors find the first argument with a given name; later duplicates are
/// silently ignored. Only literal values are considered — an argument bound
/// to a variable is skipped.
#[derive(Clone, Debug, Default)]
pub(crate) struct NestedArguments {
    arguments: Vec<Node<ast::Argument>>,
}

impl NestedArguments {
    /// Flatten the arguments of every nested field at this level.
    ///
    /// Fragment spreads and inline fragments contribute the arguments of
    /// their own immediate fields, still in document order.
    pub(crate) fn of_level(document: &ExecutableDocument, selection_set: &SelectionSet) -> Self {
        let mut arguments = Vec::new();
        collect(document, selection_set, &mut arguments);
        Self { arguments }
    }

    fn find(&self, name: &str) -> Option<&ast::Value> {
        self.arguments
            .iter()
            .find(|argument| argument.name.as_str() == name)
            .map(|argument| argument.value.as_ref())
    }

    /// The value of the first `LIMIT` argument, or `None` if it is absent or
    /// not an integer literal.
    pub(crate) fn limit(&self) -> Option<i64> {
        match self.find(LIMIT_ARGUMENT)? {
            ast::Value::Int(value) => value.try_to_i32().ok().map(i64::from),
            _ => None,
        }
    }

    /// The value of the first `SORT_BY` argument, or `None` if it is absent
    /// or not a string literal.
    pub(crate) fn sort_key(&self) -> Option<&str> {
        match self.find(SORT_BY_ARGUMENT)? {
            ast::Value::String(value) => Some(value.as_str()),
            _ => None,
        }
    }
}

fn collect(
    document: &ExecutableDocument,
    selection_set: &SelectionSet,
    arguments: &mut Vec<Node<ast::Argument>>,
) {
    for selection in &selection_set.selections {
        match selection {
            Selection::Field(field) => {
                arguments.extend(field.arguments.iter().cloned());
            }
            Selection::InlineFragment(fragment) => {
                collect(document, &fragment.selection_set, arguments);
            }
            Selection::FragmentSpread(spread) => {
                if let Some(fragment) = document.fragments.get(&spread.fragment_name) {
                    collect(document, &fragment.selection_set, arguments);
                }
            }
        }
    }
}
