//! Token walk and grammar validation for one mapping.

use std::collections::HashMap;

use crate::error::ParseError;
use crate::grammar::ValueRequirement;
use crate::mapping::CommandMapping;

use super::tokenizer::tokenize;
use super::{OptionBinding, ParseResult};

/// Validate a raw request line against one mapping, binding option
/// occurrences and positional arguments.
///
/// Constraints are checked in a fixed order — cardinality, then groups,
/// then needs — so a caller always sees the most specific wrong-count
/// error before being told about a cross-option relationship. Values are
/// bound verbatim; interpretation is the handler's responsibility.
pub fn parse_line(mapping: &CommandMapping, line: &str) -> Result<ParseResult, ParseError> {
    let tokens = tokenize(line)?;
    if tokens.is_empty() {
        return Err(ParseError::EmptyRequest);
    }

    let mut bindings: HashMap<String, OptionBinding> = HashMap::new();
    let mut args: Vec<String> = Vec::new();
    let mut seen_option = false;

    let mut i = 0;
    while i < tokens.len() {
        let token = &tokens[i];
        if let Some(spec) = mapping.find_option(token) {
            seen_option = true;
            let value = match spec.value {
                ValueRequirement::None => None,
                ValueRequirement::Required => match tokens.get(i + 1) {
                    // The value slot must not hold another option name
                    Some(next) if mapping.find_option(next).is_none() => {
                        i += 1;
                        Some(next.clone())
                    }
                    _ => return Err(ParseError::MissingValue(spec.name.clone())),
                },
                ValueRequirement::Optional => match tokens.get(i + 1) {
                    Some(next) if mapping.find_option(next).is_none() => {
                        i += 1;
                        Some(next.clone())
                    }
                    _ => None,
                },
            };
            bindings
                .entry(mapping.canonical(&spec.name))
                .or_default()
                .occurrences
                .push(value);
        } else if !seen_option {
            if args.len() >= mapping.max_args() as usize {
                return Err(ParseError::TooManyArgs {
                    max: mapping.max_args(),
                });
            }
            args.push(token.clone());
        } else {
            return Err(ParseError::UnrecognizedToken(token.clone()));
        }
        i += 1;
    }

    // Cardinality, in declaration order
    for spec in mapping.options() {
        let found = bindings
            .get(&mapping.canonical(&spec.name))
            .map(|binding| binding.occurrences.len() as u32)
            .unwrap_or(0);
        let over = spec.max_allowed != 0 && found > spec.max_allowed;
        if found < spec.min_allowed || over {
            return Err(ParseError::CardinalityViolation {
                option: spec.name.clone(),
                found,
                min: spec.min_allowed,
                max: spec.max_allowed,
            });
        }
    }

    let present = |name: &str| bindings.contains_key(&mapping.canonical(name));

    // Groups, in declaration order
    for group in mapping.groups() {
        let found = group.members.iter().filter(|m| present(m)).count() as u32;
        if found < group.min || found > group.max {
            return Err(ParseError::GroupViolation {
                members: group.member_list(),
                found,
                min: group.min,
                max: group.max,
            });
        }
    }

    // Needs, in declaration order
    for need in mapping.needs() {
        if let Some(needer) = need.needers.iter().find(|n| present(n)) {
            if let Some(needee) = need.needees.iter().find(|n| !present(n)) {
                return Err(ParseError::MissingDependency {
                    needer: needer.clone(),
                    needee: needee.clone(),
                });
            }
        }
    }

    Ok(ParseResult::new(mapping.case_sensitive(), bindings, args))
}
