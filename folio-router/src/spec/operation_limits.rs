//! Depth measurement and enforcement for request selection trees.

use std::collections::HashSet;

use apollo_compiler::ExecutableDocument;
use apollo_compiler::Name;
use apollo_compiler::executable::Selection;
use apollo_compiler::executable::SelectionSet;
use displaydoc::Display;
use thiserror::Error;

use crate::configuration::Limits;

/// operation depth {measured} exceeds the configured maximum of {max}
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub(crate) struct DepthLimitExceeded {
    pub(crate) measured: u32,
    pub(crate) max: u32,
}

/// Check the operation's top-level selection set against the configured depth
/// ceiling.
///
/// Known limitation, kept as-shipped: only the *first* top-level field group
/// is measured. Sibling top-level groups pass unchecked. Correcting this to
/// measure every group would change which requests are rejected, so the
/// narrow check is preserved deliberately.
pub(crate) fn check(
    limits: &Limits,
    document: &ExecutableDocument,
    selection_set: &SelectionSet,
) -> Result<(), DepthLimitExceeded> {
    let Some(first_group) = selection_set.selections.first() else {
        return Ok(());
    };
    let measured = depth_of_selection(document, &mut HashSet::new(), first_group);
    if measured > limits.max_depth {
        tracing::warn!(
            measured,
            max_depth = limits.max_depth,
            "request exceeded the selection depth limit"
        );
        if !limits.warn_only {
            return Err(DepthLimitExceeded {
                measured,
                max: limits.max_depth,
            });
        }
    }
    Ok(())
}

/// Recursively measure the deepest field chain in the given selection set.
///
/// A childless field measures 1; a field with children measures 1 + the
/// deepest child; siblings take the maximum. Fragments measure through
/// without adding a level of their own.
fn depth_of_set(
    document: &ExecutableDocument,
    fragments_seen: &mut HashSet<Name>,
    selection_set: &SelectionSet,
) -> u32 {
    let mut depth = 0;
    for selection in &selection_set.selections {
        depth = depth.max(depth_of_selection(document, fragments_seen, selection));
    }
    depth
}

fn depth_of_selection(
    document: &ExecutableDocument,
    fragments_seen: &mut HashSet<Name>,
    selection: &Selection,
) -> u32 {
    match selection {
        Selection::Field(field) => {
            1 + depth_of_set(document, fragments_seen, &field.selection_set)
        }
        Selection::InlineFragment(fragment) => {
            depth_of_set(document, fragments_seen, &fragment.selection_set)
        }
        Selection::FragmentSpread(spread) => {
            // Self-referential fragments are rejected at validation; the seen
            // set keeps the walk finite regardless.
            if !fragments_seen.insert(spread.fragment_name.clone()) {
                return 0;
            }
            let nested = document
                .fragments
                .get(&spread.fragment_name)
                .map(|fragment| depth_of_set(document, fragments_seen, &fragment.selection_set))
                .unwrap_or(0);
            fragments_seen.remove(&spread.fragment_name);
            nested
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::Query;
    use crate::spec::Schema;

    fn parse(query: &str) -> Query {
        let schema = Schema::service().expect("service schema must compile");
        Query::parse(query, None, &schema).expect("query must validate")
    }

    fn measured_depth(query: &str) -> u32 {
        let query = parse(query);
        let operation = query.operation().expect("operation must resolve");
        depth_of_set(query.document(), &mut HashSet::new(), &operation.selection_set)
    }

    #[test]
    fn test_depth_counts_nested_levels() {
        assert_eq!(
            measured_depth("{ booksWithContacts { contacts { firstName } } }"),
            3
        );
    }

    #[test]
    fn test_depth_of_flat_selection_is_one() {
        assert_eq!(measured_depth(r#"{ token(clientId: "1030") }"#), 1);
    }

    #[test]
    fn test_siblings_take_the_maximum() {
        assert_eq!(
            measured_depth("{ posts { title author { name } } }"),
            3
        );
    }

    #[test]
    fn test_fragments_measure_through() {
        assert_eq!(
            measured_depth(
                "{ posts { ...postFields } } fragment postFields on Post { author { name } }"
            ),
            3
        );
    }

    #[test]
    fn test_six_levels_breach_the_default_ceiling() {
        let query = parse(
            "{ posts { comments { author { posts { comments { text } } } } } }",
        );
        let operation = query.operation().unwrap();
        let result = check(&Limits::default(), query.document(), &operation.selection_set);
        assert_eq!(
            result,
            Err(DepthLimitExceeded {
                measured: 6,
                max: 5
            })
        );
    }

    #[test]
    fn test_five_levels_pass_the_default_ceiling() {
        let query = parse("{ posts { comments { author { posts { title } } } } }");
        let operation = query.operation().unwrap();
        assert!(check(&Limits::default(), query.document(), &operation.selection_set).is_ok());
    }

    #[test]
    fn test_only_the_first_group_is_checked() {
        // The second top-level group is far too deep, but the narrow guard
        // never looks at it.
        let query = parse(
            "{ books { title } posts { comments { author { posts { comments { author { name } } } } } } }",
        );
        let operation = query.operation().unwrap();
        assert!(check(&Limits::default(), query.document(), &operation.selection_set).is_ok());
    }

    #[test]
    fn test_warn_only_does_not_reject() {
        let query = parse(
            "{ posts { comments { author { posts { comments { text } } } } } }",
        );
        let operation = query.operation().unwrap();
        let limits = Limits {
            warn_only: true,
            ..Limits::default()
        };
        assert!(check(&limits, query.document(), &operation.selection_set).is_ok());
    }
}
