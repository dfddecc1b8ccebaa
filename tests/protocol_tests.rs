//! Tests for the command/response protocol as seen from a handler
//!
//! # Test Coverage
//!
//! - Response line decoding, success and failure
//! - DTMF result decoding
//! - `raise_on_error` on and off through a call context
//! - Hangup reported inside a success line

use agirouter::call::CallContext;
use agirouter::protocol::{decode, decode_dtmf, quote, Command};
use agirouter::server::read_headers;
use agirouter::{AgiError, AgiResponse, FailureKind};

mod common;
use common::payload::generate_agi_payload;
use common::transport::{scripted, SharedBuf};

fn call(responses: &str) -> (CallContext, SharedBuf) {
    let input = generate_agi_payload("ivr", &[], &[]) + responses;
    let (mut transport, out) = scripted(&input);
    let headers = read_headers(&mut transport).unwrap();
    (CallContext::new(headers, transport), out)
}

#[test]
fn test_decode_success_lines() {
    let r = decode("200 result=0").unwrap();
    assert_eq!(r.status_code, 200);
    assert_eq!(r.result, ("0".to_string(), String::new()));

    let r = decode("200 result= (timeout)").unwrap();
    assert_eq!(r.status_code, 200);
    assert_eq!(r.result, (String::new(), "timeout".to_string()));
    assert!(r.timed_out());
}

#[test]
fn test_decode_invalid_command_raises() {
    let err = decode("510 Invalid or unknown command").unwrap_err();
    assert_eq!(err.failure_kind(), Some(FailureKind::InvalidCommand));
    let response = err.response().unwrap();
    assert_eq!(response.status_code, 510);
    assert_eq!(response.message, "Invalid or unknown command");
}

#[test]
fn test_parse_never_fails() {
    let r = AgiResponse::parse("garbage");
    assert_eq!(r.status_code, 0);
    assert_eq!(r.error, Some(FailureKind::Unknown));

    let r = AgiResponse::parse("HANGUP");
    assert_eq!(r.error, Some(FailureKind::Hangup));
}

#[test]
fn test_dtmf_decoding() {
    assert_eq!(decode_dtmf("0").unwrap(), None);
    assert_eq!(decode_dtmf("").unwrap(), None);
    assert_eq!(decode_dtmf("49").unwrap(), Some('1'));
    assert_eq!(decode_dtmf("35").unwrap(), Some('#'));
    assert!(matches!(
        decode_dtmf("one"),
        Err(AgiError::Value { payload, .. }) if payload == "one"
    ));
}

#[test]
fn test_command_line_quoting() {
    assert_eq!(quote(r#"say "hi""#), r#""say \"hi\"""#);
    let cmd = Command::new("STREAM FILE").quoted("welcome").digits("#").quoted(0);
    assert_eq!(cmd.as_str(), r##"STREAM FILE "welcome" "#" "0""##);
}

#[test]
fn test_failure_returned_when_not_raising() {
    let (mut ctx, out) = call("510 Invalid or unknown command\n200 result=0\n");
    assert!(!ctx.raise_on_error());

    let r = ctx.send("BOGUS").unwrap();
    assert_eq!(r.error, Some(FailureKind::InvalidCommand));

    // the call carries on with the next command
    assert!(ctx.answer().unwrap().is_success());
    assert_eq!(out.lines(), vec!["BOGUS", "ANSWER"]);
}

#[test]
fn test_failure_raised_when_configured() {
    let (ctx, _out) = call("200 result=-1\n");
    let mut ctx = ctx.with_raise_on_error(true);

    let err = ctx.exec("Dial", Some("SIP/201,20")).unwrap_err();
    assert_eq!(err.failure_kind(), Some(FailureKind::AppError));
    assert_eq!(err.response().map(|r| r.result.0.as_str()), Some("-1"));
}

#[test]
fn test_hangup_qualifier_is_failure() {
    let (ctx, _out) = call("200 result=-1 (hangup)\n");
    let mut ctx = ctx.with_raise_on_error(true);
    let err = ctx.wait_for_digit(5000).unwrap_err();
    assert_eq!(err.failure_kind(), Some(FailureKind::Hangup));
}

#[test]
fn test_interim_lines_skipped_through_context() {
    let (mut ctx, out) = call("100 Trying...\n200 result=1 (alice)\n");
    assert_eq!(ctx.get_variable("CALLER").unwrap().as_deref(), Some("alice"));
    assert_eq!(out.lines(), vec![r#"GET VARIABLE "CALLER""#]);
}
