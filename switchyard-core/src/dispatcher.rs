//! Request dispatch: resolve, bind, invoke.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::error::{Result, ServiceError};
use crate::handler::BoundRequest;
use crate::registry::MappingRegistry;

/// Routes validated requests to their registered handlers.
///
/// The dispatcher performs no retries: a handler failure is reported
/// exactly once, as `ServiceError::Handler`, and is never reinterpreted
/// as a parse failure.
pub struct Dispatcher {
    registry: MappingRegistry,
}

impl Dispatcher {
    /// Wrap a populated registry for dispatch.
    pub fn new(registry: MappingRegistry) -> Self {
        Self { registry }
    }

    /// The underlying registry.
    pub fn registry(&self) -> &MappingRegistry {
        &self.registry
    }

    /// Resolve a raw request line and invoke the matched handler.
    pub fn dispatch(&self, line: &str) -> Result<Value> {
        let resolution = self.registry.resolve(line)?;
        let request = BoundRequest {
            mapping: Arc::clone(&resolution.mapping),
            bindings: resolution.bindings,
        };

        debug!(key = %request.mapping.dispatch_key(), "dispatching request");
        resolution.handler.handle(&request).map_err(|error| {
            debug!(key = %request.mapping.dispatch_key(), %error, "handler failed");
            ServiceError::Handler(error)
        })
    }
}
