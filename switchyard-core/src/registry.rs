//! Registry of command mappings and their handlers.
//!
//! The registry owns every mapping registered for a service, indexed by
//! the coarse dispatch key for fast candidate lookup, and resolves an
//! incoming line to exactly one mapping before dispatch. It is populated
//! during the single-threaded startup phase and read-only afterwards, so
//! concurrent resolution needs no locking.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::error::{ConfigError, MappingAttempt, ParseError, ServiceError};
use crate::handler::Handler;
use crate::mapping::CommandMapping;
use crate::parser::{parse_line, tokenize, ParseResult};

struct MappingEntry {
    mapping: Arc<CommandMapping>,
    handler: Box<dyn Handler>,
}

/// A successfully resolved request: the matched mapping, its handler, and
/// the request's bindings.
pub struct Resolution<'a> {
    /// The mapping whose grammar validated the line
    pub mapping: Arc<CommandMapping>,

    /// The handler registered with that mapping
    pub handler: &'a dyn Handler,

    /// The validated bindings for this request
    pub bindings: ParseResult,
}

impl std::fmt::Debug for Resolution<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolution")
            .field("mapping", &self.mapping)
            .field("handler", &"<dyn Handler>")
            .field("bindings", &self.bindings)
            .finish()
    }
}

/// Holds all mappings for a service and resolves request lines to them.
#[derive(Default)]
pub struct MappingRegistry {
    entries: Vec<MappingEntry>,
    by_key: HashMap<String, Vec<usize>>,
}

impl MappingRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered mappings.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no mappings have been registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered mappings, in registration order.
    pub fn mappings(&self) -> impl Iterator<Item = &Arc<CommandMapping>> {
        self.entries.iter().map(|entry| &entry.mapping)
    }

    /// Register a mapping and its handler.
    ///
    /// Rejected only for an exact duplicate: a mapping whose dispatch key
    /// and normalized option-name sequence both match an existing
    /// registration. Mappings that merely collide on the coarse key are
    /// legal and disambiguated at request time by full parsing.
    pub fn register(
        &mut self,
        mapping: CommandMapping,
        handler: impl Handler + 'static,
    ) -> Result<(), ConfigError> {
        let key = mapping.dispatch_key().to_string();
        if let Some(indices) = self.by_key.get(&key) {
            for &idx in indices {
                if self.entries[idx].mapping.signature() == mapping.signature() {
                    return Err(ConfigError::DuplicateMapping(key));
                }
            }
        }

        debug!(key = %key, mapping = mapping.name().unwrap_or("<unnamed>"), "registering mapping");
        let idx = self.entries.len();
        self.entries.push(MappingEntry {
            mapping: Arc::new(mapping),
            handler: Box::new(handler),
        });
        self.by_key.entry(key).or_default().push(idx);
        Ok(())
    }

    /// Resolve a raw request line to the one mapping that validates it.
    ///
    /// Candidates are narrowed by the coarse key computed from the line's
    /// first one or two tokens, falling back to a linear scan over every
    /// registration when no key matches. Each candidate is fully parsed in
    /// registration order; the first success wins. The coarse key is a
    /// hint, never an authority.
    pub fn resolve(&self, line: &str) -> Result<Resolution<'_>, ServiceError> {
        let head = tokenize(line)?;
        if head.is_empty() {
            return Err(ParseError::EmptyRequest.into());
        }

        let scan: Vec<usize>;
        let (indices, coarse): (&[usize], bool) = match self.candidates(&head) {
            Some(bucket) => (bucket.as_slice(), true),
            None => {
                trace!("no coarse key match, falling back to linear scan");
                scan = (0..self.entries.len()).collect();
                (&scan, false)
            }
        };

        // A lone registration under its key short-circuits: its parse
        // failure is reported directly instead of a one-element aggregate.
        let single = coarse && indices.len() == 1;

        let mut attempts = Vec::with_capacity(indices.len());
        for &idx in indices {
            let entry = &self.entries[idx];
            match parse_line(&entry.mapping, line) {
                Ok(bindings) => {
                    trace!(key = %entry.mapping.dispatch_key(), "request matched mapping");
                    return Ok(Resolution {
                        mapping: Arc::clone(&entry.mapping),
                        handler: entry.handler.as_ref(),
                        bindings,
                    });
                }
                Err(error) => {
                    if single {
                        return Err(error.into());
                    }
                    attempts.push(MappingAttempt {
                        mapping: entry.mapping.name().map(str::to_string),
                        dispatch_key: entry.mapping.dispatch_key().to_string(),
                        error,
                    });
                }
            }
        }

        debug!(candidates = attempts.len(), "no mapping matched request");
        Err(ServiceError::NoMatchingMapping { attempts })
    }

    /// Candidate bucket for the line head: the two-token key first, then
    /// the one-token key.
    fn candidates(&self, head: &[String]) -> Option<&Vec<usize>> {
        if head.len() >= 2 {
            let key = format!(
                "{}#{}",
                head[0].to_ascii_uppercase(),
                head[1].to_ascii_uppercase()
            );
            if let Some(bucket) = self.by_key.get(&key) {
                return Some(bucket);
            }
        }
        self.by_key.get(&head[0].to_ascii_uppercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HandlerError;
    use crate::grammar::ValueRequirement;
    use crate::handler::BoundRequest;
    use serde_json::{json, Value};

    fn ok_handler(tag: &'static str) -> impl Handler {
        move |_req: &BoundRequest| -> Result<Value, HandlerError> { Ok(json!({ "handler": tag })) }
    }

    fn exec_mapping() -> CommandMapping {
        CommandMapping::builder(0, false)
            .option("EXEC", ValueRequirement::Required, 1, 1)
            .option("TARGET", ValueRequirement::Required, 0, 1)
            .option("WAIT", ValueRequirement::Optional, 0, 1)
            .build()
            .unwrap()
    }

    #[test]
    fn resolves_by_coarse_key() {
        let mut registry = MappingRegistry::new();
        registry.register(exec_mapping(), ok_handler("exec")).unwrap();

        let resolution = registry.resolve("EXEC reboot TARGET web1 WAIT 5").unwrap();
        assert_eq!(resolution.mapping.dispatch_key(), "EXEC#TARGET");
        assert_eq!(resolution.bindings.first_value("EXEC"), Some("reboot"));
    }

    #[test]
    fn shared_key_resolved_by_first_successful_parse() {
        // Two grammars share the coarse key LIST#FORMAT; the line only
        // satisfies the second, so the first's failure is skipped.
        let first = CommandMapping::builder(0, false)
            .name("list-long")
            .option("LIST", ValueRequirement::None, 1, 1)
            .option("FORMAT", ValueRequirement::Required, 1, 1)
            .build()
            .unwrap();
        let second = CommandMapping::builder(0, false)
            .name("list-short")
            .option("LIST", ValueRequirement::None, 1, 1)
            .option("FORMAT", ValueRequirement::Required, 0, 1)
            .option("ALL", ValueRequirement::None, 0, 1)
            .build()
            .unwrap();
        assert_eq!(first.dispatch_key(), second.dispatch_key());

        let mut registry = MappingRegistry::new();
        registry.register(first, ok_handler("first")).unwrap();
        registry.register(second, ok_handler("second")).unwrap();

        let resolution = registry.resolve("LIST FORMAT short ALL").unwrap();
        assert_eq!(resolution.mapping.name(), Some("list-short"));
        assert_eq!(resolution.bindings.first_value("FORMAT"), Some("short"));
    }

    #[test]
    fn lone_registration_short_circuits_to_its_parse_error() {
        let mut registry = MappingRegistry::new();
        registry.register(exec_mapping(), ok_handler("exec")).unwrap();

        let err = registry.resolve("EXEC").unwrap_err();
        assert_eq!(
            err,
            ServiceError::Parse(ParseError::MissingValue("EXEC".to_string()))
        );
    }

    #[test]
    fn no_match_aggregates_candidate_failures() {
        let first = CommandMapping::builder(0, false)
            .name("add")
            .option("ADD", ValueRequirement::None, 1, 1)
            .option("NAME", ValueRequirement::Required, 1, 1)
            .build()
            .unwrap();
        let second = CommandMapping::builder(0, false)
            .name("add-all")
            .option("ADD", ValueRequirement::None, 1, 1)
            .option("NAME", ValueRequirement::Required, 1, 1)
            .option("ALL", ValueRequirement::None, 1, 1)
            .build()
            .unwrap();

        let mut registry = MappingRegistry::new();
        registry.register(first, ok_handler("first")).unwrap();
        registry.register(second, ok_handler("second")).unwrap();

        let err = registry.resolve("ADD NAME").unwrap_err();
        match err {
            ServiceError::NoMatchingMapping { attempts } => {
                assert_eq!(attempts.len(), 2);
                assert_eq!(attempts[0].mapping.as_deref(), Some("add"));
                assert!(matches!(attempts[0].error, ParseError::MissingValue(_)));
            }
            other => panic!("expected NoMatchingMapping, got {other:?}"),
        }
    }

    #[test]
    fn falls_back_to_linear_scan_when_key_misses() {
        // Line head COPY#X and COPY match no key, but the grammar (key
        // COPY#TO) still validates the line via the full scan.
        let mapping = CommandMapping::builder(0, false)
            .option("COPY", ValueRequirement::Required, 1, 1)
            .option("TO", ValueRequirement::Required, 1, 1)
            .build()
            .unwrap();
        let mut registry = MappingRegistry::new();
        registry.register(mapping, ok_handler("copy")).unwrap();

        let resolution = registry.resolve("COPY a.txt TO b.txt").unwrap();
        assert_eq!(resolution.bindings.first_value("TO"), Some("b.txt"));
    }

    #[test]
    fn exact_duplicate_registration_is_rejected() {
        let mut registry = MappingRegistry::new();
        registry.register(exec_mapping(), ok_handler("one")).unwrap();
        let err = registry.register(exec_mapping(), ok_handler("two"));
        assert_eq!(
            err,
            Err(ConfigError::DuplicateMapping("EXEC#TARGET".to_string()))
        );
    }

    #[test]
    fn key_collision_with_different_grammar_is_permitted() {
        let sibling = CommandMapping::builder(0, false)
            .option("EXEC", ValueRequirement::Required, 1, 1)
            .option("TARGET", ValueRequirement::Required, 0, 1)
            .option("DETACH", ValueRequirement::None, 0, 1)
            .build()
            .unwrap();
        let mut registry = MappingRegistry::new();
        registry.register(exec_mapping(), ok_handler("one")).unwrap();
        assert!(registry.register(sibling, ok_handler("two")).is_ok());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn empty_line_is_rejected_before_candidate_lookup() {
        let registry = MappingRegistry::new();
        let err = registry.resolve("   ").unwrap_err();
        assert_eq!(err, ServiceError::Parse(ParseError::EmptyRequest));
    }
}
