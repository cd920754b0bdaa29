//! Handler interface for routed requests.
//!
//! Every registered mapping is paired with one handler at registration
//! time. The binding is fully typed and fixed at compile time; there is no
//! runtime introspection of handler signatures.

use std::sync::Arc;

use serde_json::Value;

use crate::error::HandlerError;
use crate::mapping::CommandMapping;
use crate::parser::ParseResult;

/// A validated request bound to the mapping that accepted it, ready for
/// handler invocation.
#[derive(Debug, Clone)]
pub struct BoundRequest {
    /// The mapping whose grammar accepted the line
    pub mapping: Arc<CommandMapping>,

    /// Option and argument bindings for this request
    pub bindings: ParseResult,
}

/// Handler for requests accepted by one registered mapping.
///
/// Handlers receive the bound request and return an opaque JSON payload.
/// Value interpretation (numeric conversion, path resolution, and so on)
/// happens here, never in the parser. Any blocking a handler performs is
/// its own business; the routing core itself never suspends.
pub trait Handler: Send + Sync {
    /// Process one validated request.
    fn handle(&self, request: &BoundRequest) -> Result<Value, HandlerError>;
}

impl<F> Handler for F
where
    F: Fn(&BoundRequest) -> Result<Value, HandlerError> + Send + Sync,
{
    fn handle(&self, request: &BoundRequest) -> Result<Value, HandlerError> {
        self(request)
    }
}
