//! Whitelist soundness: condition strings containing constructs outside the
//! eight node kinds and the registry functions must never compile silently.

use rdetect_parser::{CompileError, compile};

/// Constructs the grammar recognizes but the whitelist forbids.
#[test]
fn forbidden_constructs_fail_as_unsupported() {
    let cases = [
        // arbitrary function calls
        "eval('1')",
        "exec(payload)",
        "open('/etc/passwd')",
        "getattr(x, 'y')",
        "system(cmd)",
        // attribute access
        "x.y",
        "request.headers",
        "a.b.c == 'x'",
        "in_set(user.name, allowed)",
        // arithmetic other than set difference
        "a + b",
        "count * 2",
        "total / n",
        "n % 2 == 0",
        "len(xs) + 1 > 2",
        // negation forms the tree cannot express
        "not suspicious",
        "a and not b",
        "-x",
        "-len(xs)",
    ];

    for input in cases {
        match compile(input) {
            Err(CompileError::UnsupportedOperation(_)) => {}
            Err(other) => panic!("{input:?}: expected UnsupportedOperation, got {other:?}"),
            Ok(expr) => panic!("{input:?}: compiled to {expr} but must be rejected"),
        }
    }
}

/// Constructs the grammar cannot recognize at all.
#[test]
fn malformed_input_fails_as_syntax() {
    let cases = [
        "",
        "x = 5",
        "x := 5",
        "lambda x: x > 1",
        "[y for y in xs]",
        "if a then b",
        "a; b",
        "f(x",
        "{'a', 'b'",
        "x >",
        "== 5",
        "'unterminated",
        "a &&  b",
        "import os",
    ];

    for input in cases {
        match compile(input) {
            Err(CompileError::Syntax(_)) => {}
            Err(other) => panic!("{input:?}: expected Syntax, got {other:?}"),
            Ok(expr) => panic!("{input:?}: compiled to {expr} but must be rejected"),
        }
    }
}

/// Whatever the failure class, nothing outside the whitelist may succeed.
#[test]
fn nothing_outside_the_whitelist_compiles() {
    let cases = [
        "__import__('os').system('id')",
        "().__class__.__bases__",
        "x[0]",
        "d['key']",
        "f()(x)",
        "a if b else c",
        "x ** 2",
        "x << 1",
        "x | y",
        "x & y",
    ];

    for input in cases {
        assert!(
            compile(input).is_err(),
            "{input:?} must not compile"
        );
    }
}

/// The legitimate language still works end to end.
#[test]
fn whitelisted_language_compiles() {
    let cases = [
        "unique_ips > 5 and in_set(region, ['EU', 'US'])",
        "jaccard_distance(known_devices, seen_devices) >= 0.7",
        "len(privileged_roles - expected_roles) > 0",
        "failed_logins >= 10 or (privileged and source_ip != trusted_ip)",
        "not_in_set(country, {'US', 'CA'}) and risk_score > 0.8",
        "min(score_a, score_b) <= 0.2",
        "max([latency_p50, latency_p95]) < 500",
        "abs(drift) > 3.5",
        "mfa_enabled == false",
        "last_rotation == null",
    ];

    for input in cases {
        compile(input).unwrap_or_else(|e| panic!("{input:?} failed to compile: {e}"));
    }
}
