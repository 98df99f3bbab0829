//! Template expansion against library properties
//!
//! A template such as `|Widgets_AssemblyTitle| (|Widgets_AssemblyVersion|)`
//! has each `|key_property|` reference replaced by the property of the
//! library registered under `key`. An undefined reference becomes the empty
//! string with a warning; an ambiguous one is an error.

mod bags;
pub mod tokenizer;

pub use bags::{Library, PropertyBag, PropertyBagTable, PropertyExtractor};
pub use tokenizer::{Token, Tokenizer, DELIMITER};

use crate::diagnostic::{codes, Diagnostics};
use crate::error::BuildError;
use serde::{Deserialize, Serialize};

/// Outcome of resolving one variable name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Value(String),
    Undefined,
    Ambiguous,
}

/// Maps variable names to values
pub trait VariableResolver {
    fn resolve(&self, name: &str) -> Resolution;
}

/// Expand every reference in `template`
pub fn expand(template: &str, resolver: &dyn VariableResolver, diagnostics: &mut Diagnostics) -> String {
    let mut expanded = String::with_capacity(template.len());

    for token in Tokenizer::new(template) {
        match token {
            Token::Text(text) => expanded.push_str(text),
            Token::Variable(name) => match resolver.resolve(name) {
                Resolution::Value(value) => expanded.push_str(&value),
                Resolution::Undefined => diagnostics.warning(
                    codes::UNDEFINED_TOKEN,
                    format!("The replacement token '{}' does not match a defined property", name),
                ),
                Resolution::Ambiguous => diagnostics.error(
                    codes::AMBIGUOUS_TOKEN,
                    BuildError::AmbiguousToken {
                        token: name.to_string(),
                    }
                    .to_string(),
                ),
            },
        }
    }

    expanded
}

/// A named property whose value is a template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyTemplate {
    pub name: String,
    pub value: String,
}

impl PropertyTemplate {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Expand each template's value, keeping names and order
pub fn expand_properties(
    templates: &[PropertyTemplate],
    resolver: &dyn VariableResolver,
    diagnostics: &mut Diagnostics,
) -> Vec<PropertyTemplate> {
    templates
        .iter()
        .map(|template| PropertyTemplate {
            name: template.name.clone(),
            value: expand(&template.value, resolver, diagnostics),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn table() -> PropertyBagTable {
        let mut table = PropertyBagTable::new();
        table.insert(
            "A",
            [("Name", "Foo"), ("Version", "1.0")]
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        );
        table
    }

    #[test]
    fn test_expands_references() {
        let mut diagnostics = Diagnostics::new();
        let value = expand("|A_Name|, v|A_Version|", &table(), &mut diagnostics);
        assert_eq!(value, "Foo, v1.0");
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_doubled_delimiter_is_literal() {
        let mut diagnostics = Diagnostics::new();
        let value = expand("|A_Name| || |A_Version|", &table(), &mut diagnostics);
        assert_eq!(value, "Foo | 1.0");
    }

    #[test]
    fn test_undefined_is_empty_with_warning() {
        let mut diagnostics = Diagnostics::new();
        let value = expand("[|A_Missing|]", &table(), &mut diagnostics);
        assert_eq!(value, "[]");
        assert!(!diagnostics.has_errors());
        assert_eq!(diagnostics.codes(), vec![codes::UNDEFINED_TOKEN]);
    }

    #[test]
    fn test_ambiguous_is_an_error() {
        let mut table = table();
        table.insert(
            "A",
            [("Name", "Bar")].iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
        );
        let mut diagnostics = Diagnostics::new();
        let value = expand("|A_Name|", &table, &mut diagnostics);
        assert_eq!(value, "");
        assert!(diagnostics.has_errors());
        assert!(diagnostics.iter().any(|d| d.message.contains("'A_Name' is ambiguous")));
    }

    #[test]
    fn test_expand_properties_keeps_names() {
        let mut diagnostics = Diagnostics::new();
        let expanded = expand_properties(
            &[
                PropertyTemplate::new("Title", "|A_Name|"),
                PropertyTemplate::new("Version", "|A_Version|"),
            ],
            &table(),
            &mut diagnostics,
        );
        assert_eq!(
            expanded,
            vec![PropertyTemplate::new("Title", "Foo"), PropertyTemplate::new("Version", "1.0")]
        );
    }
}
