use std::collections::HashSet;

use apollo_compiler::ExecutableDocument;
use apollo_compiler::executable::Selection;
use apollo_compiler::executable::SelectionSet;

/// A flat projection of the field names requested at one selection level.
///
/// The projection never recurses: nested field names are never included in a
/// parent's projection. An empty projection means "select all fields" — the
/// convention the document store uses for an absent field selection.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Projection {
    fields: HashSet<String>,
}

impl Projection {
    /// Derive the projection for one selection level.
    ///
    /// Fragment spreads and inline fragments at that level contribute their
    /// own immediate fields; the selection sets *below* the level's fields do
    /// not contribute.
    pub fn of_level(document: &ExecutableDocument, selection_set: &SelectionSet) -> Self {
        let mut fields = HashSet::new();
        collect(document, selection_set, &mut fields);
        Self { fields }
    }

    /// A projection that selects every field of a document.
    pub fn select_all() -> Self {
        Self::default()
    }

    pub fn is_select_all(&self) -> bool {
        self.fields.is_empty()
    }

    /// Whether `field` survives this projection.
    pub fn contains(&self, field: &str) -> bool {
        self.is_select_all() || self.fields.contains(field)
    }

    #[cfg(test)]
    pub(crate) fn fields(&self) -> &HashSet<String> {
        &self.fields
    }
}

fn collect(document: &ExecutableDocument, selection_set: &SelectionSet, fields: &mut HashSet<String>) {
    for selection in &selection_set.selections {
        match selection {
            Selection::Field(field) => {
                // only the immediate level is projected
                fields.insert(field.name.as_str().to_owned());
            }
            Selection::InlineFragment(fragment) => {
                collect(document, &fragment.selection_set, fields);
            }
            Selection::FragmentSpread(spread) => {
                if let Some(fragment) = document.fragments.get(&spread.fragment_name) {
                    collect(document, &fragment.selection_set, fields);
                }
            }
        }
    }
}
