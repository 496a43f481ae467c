//! End-to-end pipeline tests.
//!
//! Tests verify the full pipeline: source → lex → parse → rule → verdict,
//! plus structured error output and the case-file runner.

use hfilter_compiler::{
    compile, compile_named, compile_to_result, run_cases, CaseOutcome, CompileResult, ErrorCode,
    EvalError, InputError, SymbolTable, ERROR_VERDICT,
};
use std::thread;

// ══════════════════════════════════════════════════════════════════════════════
// Sample rule scripts
// ══════════════════════════════════════════════════════════════════════════════

const ANTI_BOT: &str = r#"
// reject crawlers outright
ua # '(?i)bot|spider|crawl' => 403

// rate-limited clients by region
region @ ('cn-north', 'cn-east') && atoi(rps) > 100 => 429

// everyone else passes
default => 200
"#;

const GRAY_RELEASE: &str = r#"
// roll the new build out to a slice of users
len(uid) == 0 => 0
md5(uid, 'salt-2014') # '^[0-7]' => 2
city !@ ('sh', 'bj') => 1
"#;

// ══════════════════════════════════════════════════════════════════════════════
// 1. Compilation
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn sample_scripts_compile() {
    let rule = compile(ANTI_BOT).expect("anti-bot rule should compile");
    assert_eq!(rule.clause_count(), 3);

    let rule = compile(GRAY_RELEASE).expect("gray-release rule should compile");
    assert_eq!(rule.clause_count(), 3);
}

#[test]
fn compile_errors_name_the_file() {
    let errors = compile_named("gateway.rule", "a == => 1").unwrap_err();
    let first = errors.first().expect("an error");
    assert_eq!(first.file, "gateway.rule");
    assert_eq!(first.code, ErrorCode::UNEXPECTED_TOKEN);
    assert!(first.to_string().starts_with("gateway.rule:1:6: E100"));
}

#[test]
fn lex_errors_stop_before_parsing() {
    let errors = compile("a == 'open => 1").unwrap_err();
    assert_eq!(errors.total_errors, 1);
    assert_eq!(errors.errors[0].code, ErrorCode::UNTERMINATED_STRING);
}

#[test]
fn empty_script_is_rejected() {
    let errors = compile("  ;; // nothing here").unwrap_err();
    assert_eq!(errors.errors[0].code, ErrorCode::EMPTY_RULE);
}

#[test]
fn rule_renders_back_to_script() {
    let rule = compile("a == 1 => 10 default => 0").unwrap();
    assert_eq!(rule.to_string(), "a == 1 => 10 default => 0");
}

#[test]
fn source_hash_tracks_text() {
    let a = compile("a == 1 => 1").unwrap();
    let b = compile("a == 1 => 1").unwrap();
    let c = compile("a == 1  => 1").unwrap();
    assert_eq!(a.source_hash(), b.source_hash());
    assert_ne!(a.source_hash(), c.source_hash());
    assert_eq!(a.source_hash().len(), 64);
}

// ══════════════════════════════════════════════════════════════════════════════
// 2. Evaluation
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn anti_bot_verdicts() {
    let rule = compile(ANTI_BOT).unwrap();
    assert_eq!(rule.evaluate_query("ua=Googlebot/2.1&region=us&rps=1"), Ok(403));
    assert_eq!(rule.evaluate_query("ua=curl&region=cn-east&rps=250"), Ok(429));
    assert_eq!(rule.evaluate_query("ua=curl&region=cn-east&rps=20"), Ok(200));
    assert_eq!(rule.evaluate_query("ua=firefox&region=eu&rps=900"), Ok(200));
}

#[test]
fn gray_release_verdicts() {
    let rule = compile(GRAY_RELEASE).unwrap();
    assert_eq!(rule.evaluate_query("uid=&city=sh"), Ok(0));
    assert_eq!(rule.evaluate_query("uid=&city=gz"), Ok(0));

    // Whichever bucket a uid hashes into, the verdict is one of the clauses.
    let verdict = rule.evaluate_query("uid=10086&city=gz").unwrap();
    assert!(verdict == 2 || verdict == 1, "unexpected verdict {verdict}");
}

#[test]
fn json_input() {
    let rule = compile("uid > 1000 && vip == 'yes' => 7 default => 1").unwrap();
    assert_eq!(rule.evaluate_json(r#"{"uid": 2000, "vip": "yes"}"#).unwrap(), 7);
    assert_eq!(rule.evaluate_json(r#"{"uid": 20, "vip": "yes"}"#).unwrap(), 1);
    assert!(matches!(
        rule.evaluate_json("[]"),
        Err(InputError::Symbols(_))
    ));
    assert!(matches!(
        rule.evaluate_json(r#"{"vip": "yes"}"#),
        Err(InputError::Eval(EvalError::SymbolNotFound { .. }))
    ));
}

#[test]
fn verdict_collapses_errors() {
    let rule = compile("missing == 1 => 5").unwrap();
    assert_eq!(rule.verdict(&SymbolTable::new()), ERROR_VERDICT);

    let rule = compile("a == 'x' => 5").unwrap();
    assert_eq!(rule.verdict(&SymbolTable::from_query("a=x")), 5);
}

#[test]
fn rule_is_shared_across_threads() {
    let rule = compile(ANTI_BOT).unwrap();
    let inputs = [
        ("ua=spider&region=us&rps=1", 403),
        ("ua=curl&region=cn-north&rps=101", 429),
        ("ua=curl&region=cn-north&rps=99", 200),
        ("ua=edge&region=eu&rps=0", 200),
    ];

    thread::scope(|scope| {
        for (query, expected) in inputs {
            let rule = &rule;
            scope.spawn(move || {
                for _ in 0..50 {
                    assert_eq!(rule.evaluate_query(query), Ok(expected), "{query}");
                }
            });
        }
    });
}

#[test]
fn evaluation_is_deterministic() {
    let rule = compile(GRAY_RELEASE).unwrap();
    let symbols = SymbolTable::from_query("uid=424242&city=hz");
    let first = rule.evaluate(&symbols);
    for i in 0..100 {
        assert_eq!(rule.evaluate(&symbols), first, "iteration {i} diverged");
    }
}

#[test]
fn long_term_chain_compiles_evaluates_and_drops() {
    let source = format!("a == 1{} => 7", " && a == 1".repeat(99_999));
    let symbols: SymbolTable = [("a", 1.0)].into_iter().collect();

    let rule = compile(&source).expect("long chain should compile");
    assert_eq!(rule.evaluate(&symbols), Ok(7));
    let copy = rule.clone();
    assert_eq!(copy.evaluate(&symbols), Ok(7));
    drop(copy);
    drop(rule);

    let result = compile_to_result(&source, "long.rule");
    assert!(result.success);
    assert_eq!(result.normalized.as_deref(), Some(source.as_str()));
}

#[test]
fn long_clause_chain_compiles_evaluates_and_drops() {
    let source = "a == 2 ".repeat(200_000);
    let rule = compile(&source).expect("long chain should compile");
    assert_eq!(rule.clause_count(), 200_000);

    let symbols: SymbolTable = [("a", 3.0)].into_iter().collect();
    assert_eq!(rule.evaluate(&symbols), Ok(0));
    drop(rule);

    let result = compile_to_result(&source, "clauses.rule");
    assert!(result.success);
    assert_eq!(result.clauses, 200_000);
}

// ══════════════════════════════════════════════════════════════════════════════
// 3. Structured compile results
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn syntax_error_produces_structured_json() {
    let result = compile_to_result("a @ 1 => 2", "bad.rule");
    assert!(!result.success);
    assert!(result.normalized.is_none());
    assert!(result.errors.has_errors());

    let json = serde_json::to_string(&result).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed["success"], false);
    assert!(parsed["errors"]["errors"].is_array());
    assert_eq!(parsed["errors"]["errors"][0]["file"], "bad.rule");
    assert_eq!(parsed["errors"]["errors"][0]["line"], 1);
    assert!(parsed["errors"]["total_errors"].as_u64().unwrap() > 0);
}

#[test]
fn valid_rule_produces_success_result() {
    let result = compile_to_result(ANTI_BOT, "anti_bot.rule");
    assert!(result.success);
    assert_eq!(result.clauses, 3);
    assert!(!result.errors.has_errors());
    assert_eq!(result.source_hash, compile(ANTI_BOT).unwrap().source_hash());

    let json = serde_json::to_string(&result).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed["success"], true);
    assert!(parsed["normalized"].is_string());
}

#[test]
fn compile_result_json_roundtrip() {
    let result = compile_to_result(GRAY_RELEASE, "gray.rule");
    let json = serde_json::to_string(&result).unwrap();
    let rt: CompileResult = serde_json::from_str(&json).unwrap();
    assert_eq!(rt.success, result.success);
    assert_eq!(rt.source_hash, result.source_hash);
    assert_eq!(rt.normalized, result.normalized);
}

#[test]
fn unknown_function_error_code() {
    let result = compile_to_result("lower(ua) == 'x' => 1", "e103.rule");
    assert!(!result.success);
    assert_eq!(result.errors.errors[0].code, ErrorCode::UNKNOWN_FUNCTION);
    assert!(result.errors.errors[0].suggestion.is_some());
}

// ══════════════════════════════════════════════════════════════════════════════
// 4. Case files
// ══════════════════════════════════════════════════════════════════════════════

const CASES: &str = "\
// condition
10%a == '1' => 10 default => 0%a=1
0%a == '1' => 10 default => 0%a=2
1%a == 'x' a == 'y'%a=y
0%a == 'x' a == 'y'%a=z

// function
1%len(md5('abc')) == 32 => 1%
1%count() == 2 => 1%x=1&y=2
1%atoi(itoa(n)) == 3.5 => 1%{\"n\": 3.5}
1%itoa(3) == '3.000000' => 1%k=v

// malformed lines are ignored
this line has no separators
1%too%many%fields

// abnormal
1%a == => 1%a=1
1%nope == 1 => 1%a=1
";

#[test]
fn case_file_outcomes() {
    let report = run_cases(CASES);
    assert_eq!(report.results.len(), 10);
    assert_eq!(report.passed(), 8);
    assert_eq!(report.failed(), 0);
    assert_eq!(report.errored(), 2);
    assert!(report.is_success());

    let compile_error = &report.results[8];
    assert_eq!(compile_error.line, 18);
    assert!(matches!(compile_error.outcome, CaseOutcome::CompileError { .. }));

    let eval_error = &report.results[9];
    assert!(matches!(
        &eval_error.outcome,
        CaseOutcome::EvalError { message } if message.contains("symbol 'nope' not found")
    ));
}

#[test]
fn case_file_reports_wrong_verdicts() {
    let report = run_cases("5%a == '1' => 4%a=1\n");
    assert!(!report.is_success());
    assert!(matches!(
        report.results[0].outcome,
        CaseOutcome::Failed {
            expected: 5,
            actual: 4
        }
    ));

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["results"][0]["outcome"]["outcome"], "failed");
    assert_eq!(json["results"][0]["line"], 1);
}
