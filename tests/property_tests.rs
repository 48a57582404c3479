//! Property-based tests for typeshift
//!
//! This module uses proptest to verify core invariants of the rewriter:
//! untouched files stay byte-identical, rewriting is idempotent, the two
//! matching strategies agree on simple operands, and one failing file never
//! stops a batch.

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

use typeshift::{run, FileOutcome, Mode, Rewriter, RuleSet, RuleSetKind, Strategy};

use proptest::prelude::*;

fn rewriter(strategy: Strategy) -> Rewriter {
    Rewriter::new(RuleSet::builtin(RuleSetKind::All, strategy).unwrap())
}

/// One assertion in the old syntax and its expected rewrite
fn assertion(form: usize, a: &str, b: &str) -> (String, String) {
    match form % 6 {
        0 => (
            format!("expectTypeOf({a}).toEqualTypeOf({b})"),
            format!("Ts.Assert.exact.ofAs<typeof {b}>().on({a})"),
        ),
        1 => (
            format!("expectTypeOf({a}).toMatchTypeOf<{b}>()"),
            format!("Ts.Assert.sub.ofAs<{b}>().on({a})"),
        ),
        2 => (
            format!("expectTypeOf<{a}>().toMatchTypeOf<{b}>()"),
            format!("Ts.Assert.sub.ofAs<{b}>().onAs<{a}>()"),
        ),
        3 => (
            format!("expectTypeOf<{a}>().not.toMatchTypeOf<{b}>()"),
            format!("Ts.Assert.not.sub.ofAs<{b}>().onAs<{a}>()"),
        ),
        4 => (
            format!("expectTypeOf({a}).toEqualTypeOf<{b}>()"),
            format!("Ts.Assert.exact.ofAs<{b}>().on({a})"),
        ),
        _ => (
            format!("expectTypeOf<{a}>().toEqualTypeOf<{b}>()"),
            format!("Ts.Assert.exact.ofAs<{b}>().onAs<{a}>()"),
        ),
    }
}

// ============================================================================
// Property 1: No-op on text without assertions
// ============================================================================

proptest! {
    /// A file with no assertion is left byte-identical and reported unchanged
    #[test]
    fn prop_no_assertions_no_write(
        text in "[a-zA-Z0-9 (){}<>.;=\n]{0,200}"
    ) {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("plain.test.ts");
        fs::write(&file_path, &text).unwrap();

        for strategy in [Strategy::Regex, Strategy::Balanced] {
            let changed = rewriter(strategy).rewrite(&file_path).unwrap();
            prop_assert!(!changed);
            prop_assert_eq!(fs::read_to_string(&file_path).unwrap(), text.clone());
        }
    }
}

// ============================================================================
// Property 2: Single instance and idempotence
// ============================================================================

proptest! {
    /// Exactly one assertion becomes exactly its replacement, nothing else moves
    #[test]
    fn prop_single_assertion_replaced_exactly(
        form in 0usize..6,
        a in "[A-Za-z][A-Za-z0-9]{0,8}",
        b in "[A-Za-z][A-Za-z0-9]{0,8}",
        prefix in "[a-z ;\n]{0,20}",
        suffix in "[a-z ;\n]{0,20}"
    ) {
        let (call, expected) = assertion(form, &a, &b);
        let input = format!("{prefix}{call}{suffix}");

        for strategy in [Strategy::Regex, Strategy::Balanced] {
            let output = rewriter(strategy).rewrite_str(&input).into_owned();
            prop_assert_eq!(output, format!("{prefix}{expected}{suffix}"));
        }
    }

    /// Rewriting a file twice changes nothing the second time
    #[test]
    fn prop_rewrite_is_idempotent(
        calls in prop::collection::vec(
            (0usize..6, "[A-Za-z][A-Za-z0-9]{0,8}", "[A-Za-z][A-Za-z0-9]{0,8}"),
            1..10
        )
    ) {
        let text: String = calls
            .iter()
            .map(|(form, a, b)| format!("  {}\n", assertion(*form, a, b).0))
            .collect();

        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("relation.test.ts");
        fs::write(&file_path, &text).unwrap();

        let rw = rewriter(Strategy::Regex);
        prop_assert!(rw.rewrite(&file_path).unwrap());
        let first = fs::read_to_string(&file_path).unwrap();

        prop_assert!(!rw.rewrite(&file_path).unwrap());
        prop_assert_eq!(fs::read_to_string(&file_path).unwrap(), first.clone());
        prop_assert!(!first.contains("expectTypeOf"));
    }

    /// With plain identifiers as operands, both strategies produce the same text
    #[test]
    fn prop_strategies_agree_on_simple_operands(
        calls in prop::collection::vec(
            (0usize..6, "[A-Za-z][A-Za-z0-9]{0,8}", "[A-Za-z][A-Za-z0-9]{0,8}"),
            1..10
        )
    ) {
        let text: String = calls
            .iter()
            .map(|(form, a, b)| format!("{}\n", assertion(*form, a, b).0))
            .collect();

        let regex_output = rewriter(Strategy::Regex).rewrite_str(&text).into_owned();
        let balanced_output = rewriter(Strategy::Balanced).rewrite_str(&text).into_owned();
        prop_assert_eq!(regex_output, balanced_output);
    }
}

// ============================================================================
// Property 3: Failure isolation
// ============================================================================

proptest! {
    /// Missing files are reported and every existing file is still rewritten
    #[test]
    fn prop_missing_files_do_not_stop_batch(
        present in prop::collection::vec(any::<bool>(), 1..12)
    ) {
        let temp_dir = TempDir::new().unwrap();
        let paths: Vec<PathBuf> = present
            .iter()
            .enumerate()
            .map(|(i, exists)| {
                let path = temp_dir.path().join(format!("{i}.test.ts"));
                if *exists {
                    fs::write(&path, "expectTypeOf<A>().toEqualTypeOf<B>()\n").unwrap();
                }
                path
            })
            .collect();

        let summary = run(&rewriter(Strategy::Regex), &paths, Mode::Apply, |_| {});

        let expected_changed = present.iter().filter(|p| **p).count();
        prop_assert_eq!(summary.reports.len(), paths.len());
        prop_assert_eq!(summary.changed_count(), expected_changed);
        prop_assert_eq!(summary.failed_count(), paths.len() - expected_changed);

        for (report, exists) in summary.reports.iter().zip(&present) {
            prop_assert_eq!(matches!(report.outcome, FileOutcome::Changed), *exists);
            if *exists {
                prop_assert_eq!(
                    fs::read_to_string(&report.path).unwrap(),
                    "Ts.Assert.exact.ofAs<B>().onAs<A>()\n"
                );
            }
        }
    }
}
