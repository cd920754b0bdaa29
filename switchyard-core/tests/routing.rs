//! End-to-end routing tests: registration, resolution, dispatch, and the
//! built-in service actions, exercised through the public API only.

use std::sync::Arc;
use std::thread;

use serde_json::{json, Value};

use switchyard_core::{
    BoundRequest, CommandMapping, Dispatcher, HandlerError, MappingRegistry, ParseError,
    Service, ServiceError, ValueRequirement,
};

type HandlerResult = Result<Value, HandlerError>;

fn exec_mapping() -> CommandMapping {
    CommandMapping::builder(0, false)
        .name("exec")
        .description("Run a command on a target")
        .option("EXEC", ValueRequirement::Required, 1, 1)
        .option("TARGET", ValueRequirement::Required, 0, 1)
        .option("WAIT", ValueRequirement::Optional, 0, 1)
        .option("ASYNC", ValueRequirement::None, 0, 1)
        .need("ASYNC", "WAIT")
        .build()
        .unwrap()
}

fn exec_handler(req: &BoundRequest) -> HandlerResult {
    Ok(json!({
        "command": req.bindings.first_value("EXEC"),
        "target": req.bindings.first_value("TARGET"),
        "wait": req.bindings.first_value("WAIT"),
        "async": req.bindings.is_present("ASYNC"),
    }))
}

fn demo_service() -> Service {
    let status = CommandMapping::builder(0, false)
        .name("status")
        .description("Report service status")
        .option("STATUS", ValueRequirement::None, 1, 1)
        .option("VERBOSE", ValueRequirement::None, 0, 1)
        .build()
        .unwrap();

    Service::builder("automation", switchyard_core::VERSION)
        .mapping(exec_mapping(), exec_handler)
        .unwrap()
        .mapping(status, |req: &BoundRequest| -> HandlerResult {
            Ok(json!({ "status": "ok", "verbose": req.bindings.is_present("VERBOSE") }))
        })
        .unwrap()
        .build()
}

#[test]
fn full_request_binds_all_options() {
    let service = demo_service();
    let value = service
        .handle_request("EXEC reboot TARGET web1 WAIT 5 ASYNC")
        .unwrap();
    assert_eq!(
        value,
        json!({ "command": "reboot", "target": "web1", "wait": "5", "async": true })
    );
}

#[test]
fn parsing_is_deterministic() {
    let mapping = exec_mapping();
    let line = r#"EXEC "restart all" TARGET web1 WAIT"#;
    let first = mapping.parse(line).unwrap();
    let second = mapping.parse(line).unwrap();
    assert_eq!(first, second);
}

#[test]
fn unmet_need_is_reported_per_request() {
    let service = demo_service();
    let err = service.handle_request("EXEC reboot ASYNC").unwrap_err();
    assert_eq!(
        err,
        ServiceError::Parse(ParseError::MissingDependency {
            needer: "ASYNC".to_string(),
            needee: "WAIT".to_string(),
        })
    );

    // The service keeps serving after a rejected request
    assert!(service.handle_request("STATUS").is_ok());
}

#[test]
fn handler_failure_is_distinct_from_parse_failure() {
    let flaky = CommandMapping::builder(0, false)
        .option("FLAKY", ValueRequirement::None, 1, 1)
        .build()
        .unwrap();
    let mut registry = MappingRegistry::new();
    registry
        .register(flaky, |_req: &BoundRequest| -> HandlerResult {
            Err(HandlerError::new("downstream unavailable"))
        })
        .unwrap();
    let dispatcher = Dispatcher::new(registry);

    match dispatcher.dispatch("FLAKY").unwrap_err() {
        ServiceError::Handler(inner) => assert_eq!(inner.message, "downstream unavailable"),
        other => panic!("expected Handler error, got {other:?}"),
    }
}

#[test]
fn ambiguous_key_falls_through_to_the_grammar_that_accepts() {
    // Two descriptors share a dispatch key; the line matches only the
    // second grammar, so resolution skips the first's failure and
    // succeeds.
    let strict = CommandMapping::builder(0, false)
        .name("query-strict")
        .option("QUERY", ValueRequirement::Required, 1, 1)
        .option("LIMIT", ValueRequirement::Required, 1, 1)
        .build()
        .unwrap();
    let relaxed = CommandMapping::builder(0, false)
        .name("query-relaxed")
        .option("QUERY", ValueRequirement::Required, 1, 1)
        .option("LIMIT", ValueRequirement::Required, 0, 1)
        .option("ALL", ValueRequirement::None, 0, 1)
        .build()
        .unwrap();

    let mut registry = MappingRegistry::new();
    registry
        .register(strict, |_req: &BoundRequest| -> HandlerResult {
            Ok(json!("strict"))
        })
        .unwrap();
    registry
        .register(relaxed, |_req: &BoundRequest| -> HandlerResult {
            Ok(json!("relaxed"))
        })
        .unwrap();

    let dispatcher = Dispatcher::new(registry);
    assert_eq!(dispatcher.dispatch("QUERY users ALL").unwrap(), json!("relaxed"));
    assert_eq!(
        dispatcher.dispatch("QUERY users LIMIT 10").unwrap(),
        json!("strict"),
        "registration order breaks the tie when both grammars accept"
    );
}

#[test]
fn no_matching_mapping_carries_every_candidate_failure() {
    let service = demo_service();
    let err = service.handle_request("DELETE everything").unwrap_err();
    match err {
        ServiceError::NoMatchingMapping { attempts } => {
            assert_eq!(attempts.len(), 2, "both registered mappings were tried");
            assert!(attempts.iter().all(|a| matches!(
                a.error,
                ParseError::TooManyArgs { .. } | ParseError::CardinalityViolation { .. }
            )));
        }
        other => panic!("expected NoMatchingMapping, got {other:?}"),
    }
}

#[test]
fn requests_run_concurrently_against_the_frozen_service() {
    let service = Arc::new(demo_service());
    let workers: Vec<_> = (0..8)
        .map(|i| {
            let service = Arc::clone(&service);
            thread::spawn(move || {
                for _ in 0..50 {
                    let value = service
                        .handle_request(&format!("EXEC job{i} TARGET host{i}"))
                        .unwrap();
                    assert_eq!(value["command"], json!(format!("job{i}")));
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }
}

#[test]
fn help_and_version_are_served_from_the_snapshot() {
    let service = demo_service();

    let help = service.handle_request("HELP").unwrap();
    let entries = help.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["command"], json!("exec"));
    assert_eq!(
        entries[0]["options"],
        json!("EXEC <value> [TARGET <value>] [WAIT [<value>]] [ASYNC]")
    );

    assert_eq!(
        service.handle_request("version").unwrap(),
        json!(switchyard_core::VERSION)
    );
}

#[test]
fn quoted_values_survive_the_whole_pipeline() {
    let service = demo_service();
    let value = service
        .handle_request(r#"EXEC "restart --all" TARGET 'web 1'"#)
        .unwrap();
    assert_eq!(value["command"], json!("restart --all"));
    assert_eq!(value["target"], json!("web 1"));
}
