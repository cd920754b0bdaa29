//! Declarative grammar value types for command mappings.
//!
//! A mapping's grammar is assembled from three kinds of immutable value
//! objects: option specifications, group constraints bounding how many
//! options from a set may co-occur, and need constraints requiring certain
//! options whenever others are present. Each object validates its own
//! internal consistency at construction; cross-object consistency is the
//! mapping builder's job.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Whether an option consumes a value token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ValueRequirement {
    /// The option never takes a value
    #[default]
    None,

    /// The option consumes the next token as its value, unless that token
    /// is itself a recognized option name
    Optional,

    /// The option must be followed by a value token
    Required,
}

/// Specification of one recognized option: its name, value behavior, and
/// occurrence bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionSpec {
    /// Name the option is matched by; comparison honors the mapping's
    /// case-sensitivity rule
    pub name: String,

    /// Value behavior for each occurrence
    pub value: ValueRequirement,

    /// Minimum occurrences required per request
    pub min_allowed: u32,

    /// Maximum occurrences permitted per request; 0 means unlimited
    pub max_allowed: u32,
}

impl OptionSpec {
    /// Create an option specification, validating its internal consistency.
    pub fn new(
        name: impl Into<String>,
        value: ValueRequirement,
        min_allowed: u32,
        max_allowed: u32,
    ) -> Result<Self, ConfigError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ConfigError::EmptyOptionName);
        }
        if name.chars().any(char::is_whitespace) {
            return Err(ConfigError::InvalidOptionName(name));
        }
        if max_allowed != 0 && min_allowed > max_allowed {
            return Err(ConfigError::BadCardinality {
                option: name,
                min: min_allowed,
                max: max_allowed,
            });
        }
        Ok(Self {
            name,
            value,
            min_allowed,
            max_allowed,
        })
    }

    /// A mandatory single-occurrence option that carries a value.
    pub fn required_value(name: impl Into<String>) -> Result<Self, ConfigError> {
        Self::new(name, ValueRequirement::Required, 1, 1)
    }

    /// An optional single-occurrence flag with no value.
    pub fn flag(name: impl Into<String>) -> Result<Self, ConfigError> {
        Self::new(name, ValueRequirement::None, 0, 1)
    }

    /// Check whether a token names this option under the given case rule.
    pub fn matches(&self, token: &str, case_sensitive: bool) -> bool {
        if case_sensitive {
            self.name == token
        } else {
            self.name.eq_ignore_ascii_case(token)
        }
    }
}

/// Bounds how many options from a member set may co-occur in one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionGroup {
    /// Names of the options the group constrains
    pub members: Vec<String>,

    /// Minimum number of members that must be present
    pub min: u32,

    /// Maximum number of members that may be present
    pub max: u32,
}

impl OptionGroup {
    /// Create a group constraint over the given member names.
    pub fn new<I, S>(members: I, min: u32, max: u32) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let members: Vec<String> = members.into_iter().map(Into::into).collect();
        if members.is_empty() {
            return Err(ConfigError::EmptyGroup);
        }
        if min > max {
            return Err(ConfigError::BadGroupBounds {
                members: members.join(" "),
                min,
                max,
            });
        }
        Ok(Self { members, min, max })
    }

    /// Space-joined member list, used in diagnostics.
    pub fn member_list(&self) -> String {
        self.members.join(" ")
    }
}

/// Requires certain options (needees) whenever others (needers) are present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionNeed {
    /// Options whose presence triggers the requirement
    pub needers: Vec<String>,

    /// Options that must then also be present
    pub needees: Vec<String>,
}

impl OptionNeed {
    /// Create a need constraint between two sets of option names.
    pub fn new<I, J, S, T>(needers: I, needees: J) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        let needers: Vec<String> = needers.into_iter().map(Into::into).collect();
        let needees: Vec<String> = needees.into_iter().map(Into::into).collect();
        if needers.is_empty() || needees.is_empty() {
            return Err(ConfigError::EmptyNeed);
        }
        Ok(Self { needers, needees })
    }
}
