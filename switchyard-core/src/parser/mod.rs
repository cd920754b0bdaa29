//! Line parsing against a command mapping.
//!
//! This module turns a raw request line into a validated `ParseResult`:
//! the tokenizer splits the line with shell-like quoting, and the matcher
//! walks the tokens against one mapping's grammar, enforcing cardinality,
//! group, and need constraints in that order.

mod matcher;
mod tokenizer;

pub use matcher::parse_line;
pub use tokenizer::tokenize;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Occurrences recorded for one declared option.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionBinding {
    /// Values in occurrence order; `None` for occurrences without a value
    pub occurrences: Vec<Option<String>>,
}

/// The structured, validated binding of one request line to its mapping's
/// options and positional arguments.
///
/// One instance is produced per request and owned exclusively by the
/// request-handling call; it shares nothing with concurrent requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseResult {
    case_sensitive: bool,
    options: HashMap<String, OptionBinding>,
    args: Vec<String>,
}

impl ParseResult {
    pub(crate) fn new(
        case_sensitive: bool,
        options: HashMap<String, OptionBinding>,
        args: Vec<String>,
    ) -> Self {
        Self {
            case_sensitive,
            options,
            args,
        }
    }

    /// Whether the named option occurred at least once.
    pub fn is_present(&self, name: &str) -> bool {
        self.option_times(name) > 0
    }

    /// How many times the named option occurred.
    pub fn option_times(&self, name: &str) -> usize {
        self.options
            .get(&self.canonical(name))
            .map(|binding| binding.occurrences.len())
            .unwrap_or(0)
    }

    /// The value of the option's first occurrence, if it carried one.
    pub fn first_value(&self, name: &str) -> Option<&str> {
        self.options
            .get(&self.canonical(name))
            .and_then(|binding| binding.occurrences.first())
            .and_then(|value| value.as_deref())
    }

    /// All values the option carried, in occurrence order. Occurrences
    /// without a value are skipped.
    pub fn values(&self, name: &str) -> Vec<&str> {
        self.options
            .get(&self.canonical(name))
            .map(|binding| {
                binding
                    .occurrences
                    .iter()
                    .filter_map(|value| value.as_deref())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Positional arguments, in the order they appeared.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    fn canonical(&self, name: &str) -> String {
        if self.case_sensitive {
            name.to_string()
        } else {
            name.to_ascii_uppercase()
        }
    }
}
