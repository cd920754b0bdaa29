//! Core types and functionality for the Switchyard routing layer.
//!
//! Switchyard routes single-line commands (for example
//! `EXEC command TARGET x WAIT 5`) to handlers registered with declarative
//! option grammars. A raw line is narrowed to candidate mappings by a
//! coarse dispatch key, fully validated against each candidate's grammar,
//! bound into a `ParseResult`, and handed to the one matching handler.
//!
//! The crate is a pure in-process library: transport, response
//! marshalling, and process lifecycle belong to the calling code.

mod dispatcher;
mod error;
mod grammar;
mod handler;
mod mapping;
mod parser;
mod registry;
mod service;

// Re-export core types
pub use dispatcher::Dispatcher;
pub use error::{
    ConfigError, HandlerError, MappingAttempt, ParseError, Result, ServiceError,
};
pub use grammar::{OptionGroup, OptionNeed, OptionSpec, ValueRequirement};
pub use handler::{BoundRequest, Handler};
pub use mapping::{CommandMapping, MappingBuilder};
pub use parser::{parse_line, tokenize, OptionBinding, ParseResult};
pub use registry::{MappingRegistry, Resolution};
pub use service::{Service, ServiceBuilder};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
