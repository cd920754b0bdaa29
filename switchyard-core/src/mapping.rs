//! Command mapping descriptors and their builder.
//!
//! A `CommandMapping` aggregates one handler's full grammar: its options,
//! group and need constraints, case rule, positional-argument budget, and
//! the coarse dispatch key derived from its leading options. Mappings are
//! built once during the registration phase and shared read-only behind an
//! `Arc` for the rest of the process's life.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ParseError};
use crate::grammar::{OptionGroup, OptionNeed, OptionSpec, ValueRequirement};
use crate::parser::{parse_line, ParseResult};

/// Separator between the leading option names in a dispatch key.
const DISPATCH_KEY_SEPARATOR: char = '#';

/// Declarative grammar for one recognized command, paired with a handler
/// at registration time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandMapping {
    name: Option<String>,
    options: Vec<OptionSpec>,
    groups: Vec<OptionGroup>,
    needs: Vec<OptionNeed>,
    case_sensitive: bool,
    max_args: u32,
    description: String,
    dispatch_key: String,
}

impl CommandMapping {
    /// Start building a mapping with the given positional-argument budget
    /// and case rule.
    pub fn builder(max_args: u32, case_sensitive: bool) -> MappingBuilder {
        MappingBuilder {
            name: None,
            description: String::new(),
            case_sensitive,
            max_args,
            options: Vec::new(),
            groups: Vec::new(),
            needs: Vec::new(),
        }
    }

    /// Identifying name assigned at build time, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Declared options, in declaration order.
    pub fn options(&self) -> &[OptionSpec] {
        &self.options
    }

    /// Group constraints, in declaration order.
    pub fn groups(&self) -> &[OptionGroup] {
        &self.groups
    }

    /// Need constraints, in declaration order.
    pub fn needs(&self) -> &[OptionNeed] {
        &self.needs
    }

    /// Whether option names are matched case-sensitively.
    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// Maximum number of positional arguments a request may carry.
    pub fn max_args(&self) -> u32 {
        self.max_args
    }

    /// Human-readable description of the command.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Coarse pre-filter key: the first two declared option names,
    /// upper-cased and joined with `#` (just the first name if only one
    /// option is declared). A hint for candidate lookup, never an
    /// authority.
    pub fn dispatch_key(&self) -> &str {
        &self.dispatch_key
    }

    /// Find the declared option a token names, honoring the case rule.
    pub fn find_option(&self, token: &str) -> Option<&OptionSpec> {
        self.options
            .iter()
            .find(|spec| spec.matches(token, self.case_sensitive))
    }

    /// Validate a raw request line against this mapping.
    pub fn parse(&self, line: &str) -> Result<ParseResult, ParseError> {
        parse_line(self, line)
    }

    /// One-line usage summary of the declared options, used in help output.
    pub fn options_usage(&self) -> String {
        self.options
            .iter()
            .map(|spec| {
                let mut part = spec.name.clone();
                match spec.value {
                    ValueRequirement::Required => part.push_str(" <value>"),
                    ValueRequirement::Optional => part.push_str(" [<value>]"),
                    ValueRequirement::None => {}
                }
                if spec.min_allowed == 0 {
                    format!("[{part}]")
                } else {
                    part
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Canonical form of an option name under this mapping's case rule.
    pub(crate) fn canonical(&self, name: &str) -> String {
        if self.case_sensitive {
            name.to_string()
        } else {
            name.to_ascii_uppercase()
        }
    }

    /// Normalized option-name sequence, used to detect exact duplicate
    /// registrations.
    pub(crate) fn signature(&self) -> Vec<String> {
        self.options
            .iter()
            .map(|spec| spec.name.to_ascii_uppercase())
            .collect()
    }

    fn derive_dispatch_key(options: &[OptionSpec]) -> String {
        options
            .iter()
            .take(2)
            .map(|spec| spec.name.to_ascii_uppercase())
            .collect::<Vec<_>>()
            .join(&DISPATCH_KEY_SEPARATOR.to_string())
    }
}

/// Fluent accumulator for `CommandMapping`.
///
/// Group members, needers, and needees are given as space-separated name
/// lists. All cross-references are checked in `build()`, which collects
/// every dangling name before failing so a misdeclared mapping yields one
/// complete diagnostic at startup.
#[derive(Debug, Clone)]
pub struct MappingBuilder {
    name: Option<String>,
    description: String,
    case_sensitive: bool,
    max_args: u32,
    options: Vec<(String, ValueRequirement, u32, u32)>,
    groups: Vec<(String, u32, u32)>,
    needs: Vec<(String, String)>,
}

impl MappingBuilder {
    /// Assign an identifying name to the mapping.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the human-readable description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Declare an option.
    pub fn option(
        mut self,
        name: impl Into<String>,
        value: ValueRequirement,
        min_allowed: u32,
        max_allowed: u32,
    ) -> Self {
        self.options
            .push((name.into(), value, min_allowed, max_allowed));
        self
    }

    /// Declare a group constraint over a space-separated member list.
    pub fn group(mut self, members: impl Into<String>, min: u32, max: u32) -> Self {
        self.groups.push((members.into(), min, max));
        self
    }

    /// Declare a need constraint between two space-separated name lists.
    pub fn need(mut self, needers: impl Into<String>, needees: impl Into<String>) -> Self {
        self.needs.push((needers.into(), needees.into()));
        self
    }

    /// Validate the accumulated grammar and produce the mapping.
    pub fn build(self) -> Result<CommandMapping, ConfigError> {
        let mut options = Vec::with_capacity(self.options.len());
        for (name, value, min, max) in self.options {
            options.push(OptionSpec::new(name, value, min, max)?);
        }
        if options.is_empty() {
            return Err(ConfigError::NoOptions);
        }

        // Uniqueness under the mapping's case rule
        let mut seen = Vec::with_capacity(options.len());
        for spec in &options {
            let canonical = normalize(&spec.name, self.case_sensitive);
            if seen.contains(&canonical) {
                return Err(ConfigError::DuplicateOption(spec.name.clone()));
            }
            seen.push(canonical);
        }

        let mut groups = Vec::with_capacity(self.groups.len());
        for (members, min, max) in self.groups {
            groups.push(OptionGroup::new(members.split_whitespace(), min, max)?);
        }

        let mut needs = Vec::with_capacity(self.needs.len());
        for (needers, needees) in self.needs {
            needs.push(OptionNeed::new(
                needers.split_whitespace(),
                needees.split_whitespace(),
            )?);
        }

        // Cross-reference check: collect every dangling name rather than
        // failing on the first, since this is a one-time startup check and
        // a complete diagnostic is worth more than failing fast.
        let mut dangling: Vec<String> = Vec::new();
        let mut check = |name: &str| {
            let declared = options
                .iter()
                .any(|spec| spec.matches(name, self.case_sensitive));
            if !declared && !dangling.iter().any(|d| d == name) {
                dangling.push(name.to_string());
            }
        };
        for group in &groups {
            for member in &group.members {
                check(member);
            }
        }
        for need in &needs {
            for name in need.needers.iter().chain(need.needees.iter()) {
                check(name);
            }
        }
        if !dangling.is_empty() {
            return Err(ConfigError::DanglingReferences(dangling));
        }

        let dispatch_key = CommandMapping::derive_dispatch_key(&options);
        Ok(CommandMapping {
            name: self.name,
            options,
            groups,
            needs,
            case_sensitive: self.case_sensitive,
            max_args: self.max_args,
            description: self.description,
            dispatch_key,
        })
    }
}

fn normalize(name: &str, case_sensitive: bool) -> String {
    if case_sensitive {
        name.to_string()
    } else {
        name.to_ascii_uppercase()
    }
}
