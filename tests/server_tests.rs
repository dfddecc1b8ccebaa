//! End-to-end tests over real TCP connections
//!
//! # Test Coverage
//!
//! - Header block, binding, one command exchange, connection close
//! - Unknown paths close without sending a command
//! - Backend hangup while a handler waits for a response
//! - `stop()` leaves calls already in progress running
//! - Concurrent calls on one server
//!
//! # Test Strategy
//!
//! The server runs on `127.0.0.1:0` in may coroutines; [`FakeBackend`]
//! plays the telephony side with blocking std sockets and a read timeout so
//! a misbehaving server fails the test instead of hanging it.

use agirouter::call::CallContext;
use agirouter::dispatcher::{BoundArgs, Param, RouteTable, Signature};
use agirouter::server::{AgiServer, AgiService, ServerHandle};
use agirouter::typed::ParamType;
use agirouter::AgiError;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

mod common;
use common::payload::generate_agi_payload;
use common::test_server::{setup_may_runtime, FakeBackend};

fn start(table: RouteTable) -> ServerHandle {
    setup_may_runtime();
    let handle = AgiServer::new(AgiService::new(table.freeze()))
        .start("127.0.0.1:0")
        .unwrap();
    handle.wait_ready().unwrap();
    handle
}

fn check_table() -> RouteTable {
    let mut table = RouteTable::new();
    let _check = table.route(
        "check",
        Signature::new()
            .param(Param::context("request"))
            .param(Param::scalar("x", ParamType::Int).with_default("3")),
        |ctx: &mut CallContext, args: BoundArgs| {
            if args.get("x").is_some_and(Value::is_i64) {
                ctx.send("OK")?;
            }
            Ok(())
        },
    );
    table
}

#[test]
fn test_check_route_end_to_end() {
    let handle = start(check_table());

    let mut backend = FakeBackend::connect(handle.local_addr());
    backend.send_headers(&generate_agi_payload("check", &[], &[("x", "55")]));
    assert_eq!(backend.read_command(), "OK");
    backend.reply("200 result=0");
    assert_eq!(backend.read_until_closed(), "");

    handle.stop();
}

#[test]
fn test_unknown_route_closes_without_command() {
    let handle = start(check_table());

    let mut backend = FakeBackend::connect(handle.local_addr());
    backend.send_headers(&generate_agi_payload("nowhere", &[], &[]));
    assert_eq!(backend.read_until_closed(), "");

    handle.stop();
}

#[test]
fn test_hangup_mid_command_reports_connection_closed() {
    let (tx, rx) = mpsc::channel::<Option<String>>();
    let tx = Arc::new(Mutex::new(tx));

    let mut table = RouteTable::new();
    let _ivr = table.route(
        "ivr",
        Signature::new().param(Param::context("request")),
        move |ctx: &mut CallContext, _args: BoundArgs| {
            let outcome = ctx.stream_file("welcome", "#", 0);
            let closed_on = match &outcome {
                Err(AgiError::ConnectionClosed { command }) => Some(command.clone()),
                _ => None,
            };
            tx.lock().send(closed_on).unwrap();
            outcome?;
            Ok(())
        },
    );
    let handle = start(table);

    let mut backend = FakeBackend::connect(handle.local_addr());
    backend.send_headers(&generate_agi_payload("ivr", &[], &[]));
    assert_eq!(backend.read_command(), r##"STREAM FILE "welcome" "#" "0""##);
    backend.hang_up();

    let closed_on = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(
        closed_on.as_deref(),
        Some(r##"STREAM FILE "welcome" "#" "0""##)
    );

    handle.stop();
}

#[test]
fn test_stop_lets_in_flight_call_finish() {
    let mut table = RouteTable::new();
    let _two_step = table.route(
        "two-step",
        Signature::new().param(Param::context("request")),
        |ctx: &mut CallContext, _args: BoundArgs| {
            ctx.answer()?;
            ctx.hangup()?;
            Ok(())
        },
    );
    let handle = start(table);

    let mut backend = FakeBackend::connect(handle.local_addr());
    backend.send_headers(&generate_agi_payload("two-step", &[], &[]));
    assert_eq!(backend.read_command(), "ANSWER");

    handle.stop();

    backend.reply("200 result=0");
    assert_eq!(backend.read_command(), "HANGUP");
    backend.reply("200 result=1");
    assert_eq!(backend.read_until_closed(), "");
}

#[test]
fn test_concurrent_calls_are_independent() {
    let handle = start(check_table());
    let addr = handle.local_addr();

    let mut first = FakeBackend::connect(addr);
    let mut second = FakeBackend::connect(addr);
    first.send_headers(&generate_agi_payload("check", &["1"], &[]));
    second.send_headers(&generate_agi_payload("check", &["2"], &[]));

    // both calls are parked on their first command before either is answered
    assert_eq!(second.read_command(), "OK");
    assert_eq!(first.read_command(), "OK");
    second.reply("200 result=0");
    first.reply("200 result=0");
    assert_eq!(first.read_until_closed(), "");
    assert_eq!(second.read_until_closed(), "");

    handle.stop();
}
