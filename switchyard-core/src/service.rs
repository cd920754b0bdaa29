//! Service facade: named registration surface plus built-in requests.
//!
//! A `Service` bundles a populated dispatcher with a service name, a
//! version string, and a help snapshot. The snapshot is rendered exactly
//! once when the builder freezes, after the registration phase completes;
//! nothing about a built service ever mutates, so it can be shared across
//! worker threads without locking.

use serde_json::{json, Value};
use tracing::info;

use crate::dispatcher::Dispatcher;
use crate::error::{ConfigError, ParseError, Result};
use crate::handler::Handler;
use crate::mapping::CommandMapping;
use crate::registry::MappingRegistry;

/// Accumulates mappings for a service during the startup phase.
pub struct ServiceBuilder {
    name: String,
    version: String,
    registry: MappingRegistry,
}

impl ServiceBuilder {
    /// Start building a named service.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            registry: MappingRegistry::new(),
        }
    }

    /// Register a mapping and its handler.
    pub fn mapping(
        mut self,
        mapping: CommandMapping,
        handler: impl Handler + 'static,
    ) -> std::result::Result<Self, ConfigError> {
        self.registry.register(mapping, handler)?;
        Ok(self)
    }

    /// Freeze the registry and render the help snapshot.
    pub fn build(self) -> Service {
        let help = render_help(&self.registry);
        info!(
            service = %self.name,
            mappings = self.registry.len(),
            "service registration complete"
        );
        Service {
            name: self.name,
            version: self.version,
            dispatcher: Dispatcher::new(self.registry),
            help,
        }
    }
}

/// A frozen service: immutable registry, help snapshot, and version info.
pub struct Service {
    name: String,
    version: String,
    dispatcher: Dispatcher,
    help: Value,
}

impl Service {
    /// Start building a service.
    pub fn builder(name: impl Into<String>, version: impl Into<String>) -> ServiceBuilder {
        ServiceBuilder::new(name, version)
    }

    /// The service's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The service's version string.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// The dispatcher over the frozen registry.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Handle one raw request line.
    ///
    /// The built-in actions `help` and `version` are answered from the
    /// frozen snapshot before any mapping resolution; every other line is
    /// dispatched through the registry.
    pub fn handle_request(&self, line: &str) -> Result<Value> {
        let trimmed = line.trim();
        let action = trimmed
            .split_whitespace()
            .next()
            .ok_or(ParseError::EmptyRequest)?;

        if action.eq_ignore_ascii_case("help") {
            return Ok(self.help.clone());
        }
        if action.eq_ignore_ascii_case("version") {
            return Ok(Value::String(self.version.clone()));
        }
        self.dispatcher.dispatch(trimmed)
    }
}

/// Render the help snapshot: one entry per mapping with its command name,
/// option usage, and description.
fn render_help(registry: &MappingRegistry) -> Value {
    let entries: Vec<Value> = registry
        .mappings()
        .map(|mapping| {
            json!({
                "command": mapping.name().unwrap_or(mapping.dispatch_key()),
                "options": mapping.options_usage(),
                "description": mapping.description(),
            })
        })
        .collect();
    Value::Array(entries)
}
