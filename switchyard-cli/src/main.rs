use std::io::{self, BufRead};

use clap::Parser;
use serde_json::{json, Value};
use tracing::debug;

use switchyard_core::{
    BoundRequest, CommandMapping, HandlerError, Service, ValueRequirement,
};

#[derive(Parser)]
#[command(author, version, about = "Interactive client for a demo Switchyard service", long_about = None)]
struct Cli {
    /// Handle a single request line and exit
    #[arg(long)]
    request: Option<String>,

    /// Output raw JSON
    #[arg(long, default_value_t = false)]
    raw: bool,

    /// Enable debug logging
    #[arg(long, default_value_t = false)]
    debug: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.debug {
        "switchyard_core=debug,switchyard_cli=debug"
    } else {
        "switchyard_core=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .init();

    let service = build_service()?;

    if let Some(line) = cli.request {
        return respond(&service, &line, cli.raw);
    }

    // Interactive loop: one request per line until EOF or "quit"
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.eq_ignore_ascii_case("quit") || trimmed.eq_ignore_ascii_case("exit") {
            break;
        }
        respond(&service, trimmed, cli.raw)?;
    }

    Ok(())
}

/// Assemble the demo service: a few mappings covering values, flags,
/// exclusive groups, and dependencies.
fn build_service() -> anyhow::Result<Service> {
    let exec = CommandMapping::builder(0, false)
        .name("exec")
        .description("Run a command on a target host")
        .option("EXEC", ValueRequirement::Required, 1, 1)
        .option("TARGET", ValueRequirement::Required, 0, 1)
        .option("WAIT", ValueRequirement::Optional, 0, 1)
        .option("ASYNC", ValueRequirement::None, 0, 1)
        .need("ASYNC", "WAIT")
        .build()?;

    let task = CommandMapping::builder(0, false)
        .name("task")
        .description("Pause, resume, or stop a running task")
        .option("TASK", ValueRequirement::Required, 1, 1)
        .option("PAUSE", ValueRequirement::None, 0, 1)
        .option("RESUME", ValueRequirement::None, 0, 1)
        .option("STOP", ValueRequirement::None, 0, 1)
        .group("PAUSE RESUME STOP", 1, 1)
        .build()?;

    let echo = CommandMapping::builder(0, false)
        .name("echo")
        .description("Echo a message back, optionally repeated")
        .option("ECHO", ValueRequirement::Required, 1, 1)
        .option("REPEAT", ValueRequirement::Required, 0, 1)
        .build()?;

    let service = Service::builder("demo", switchyard_core::VERSION)
        .mapping(exec, exec_handler)?
        .mapping(task, task_handler)?
        .mapping(echo, echo_handler)?
        .build();

    Ok(service)
}

fn exec_handler(req: &BoundRequest) -> Result<Value, HandlerError> {
    let command = req.bindings.first_value("EXEC");
    let target = req.bindings.first_value("TARGET").unwrap_or("localhost");
    debug!(?command, host = target, "exec request accepted");

    Ok(json!({
        "command": command,
        "target": target,
        "wait": req.bindings.first_value("WAIT"),
        "async": req.bindings.is_present("ASYNC"),
        "state": "submitted",
    }))
}

fn task_handler(req: &BoundRequest) -> Result<Value, HandlerError> {
    let id = req
        .bindings
        .first_value("TASK")
        .ok_or_else(|| HandlerError::new("missing task id"))?;
    let action = ["PAUSE", "RESUME", "STOP"]
        .iter()
        .find(|name| req.bindings.is_present(name))
        .ok_or_else(|| HandlerError::new("no task action given"))?;

    Ok(json!({ "task": id, "action": action.to_lowercase() }))
}

fn echo_handler(req: &BoundRequest) -> Result<Value, HandlerError> {
    let message = req
        .bindings
        .first_value("ECHO")
        .ok_or_else(|| HandlerError::new("missing message"))?;
    let repeat: usize = match req.bindings.first_value("REPEAT") {
        Some(raw) => raw.parse().map_err(|_| {
            HandlerError::with_detail("REPEAT must be a number", json!({ "value": raw }))
        })?,
        None => 1,
    };

    Ok(json!(vec![message; repeat.max(1)]))
}

fn respond(service: &Service, line: &str, raw: bool) -> anyhow::Result<()> {
    match service.handle_request(line) {
        Ok(response) => {
            if raw {
                println!("{}", serde_json::to_string(&response)?);
            } else {
                println!("{}", serde_json::to_string_pretty(&response)?);
            }
        }
        Err(error) => eprintln!("Error: {}", error),
    }
    Ok(())
}
