//! Property-based tests for assembled chains.
//!
//! - Running totals are prefix sums
//! - Double inversion is the identity
//! - Sorting is stable
//! - Tail truncation keeps whole entries

use std::collections::HashSet;

use chrono::{Days, NaiveDate};
use proptest::prelude::*;
use rust_decimal::Decimal;
use tallyline_shared::types::{Amount, Balance};
use tallyline_shared::ReportOptions;

use super::ChainBuilder;
use crate::expr::BuiltinEvaluator;
use crate::journal::{Entry, Journal, Posting, Transaction};
use crate::stage::{CollectSink, Invert, Stage};

const ACCOUNTS: [&str; 4] = ["Expenses:Food", "Expenses:Rent", "Income:Salary", "Liabilities:Card"];

/// Strategy for one posting: account index and quantity in cents.
fn posting() -> impl Strategy<Value = (usize, i64)> {
    (0..ACCOUNTS.len(), -100_000i64..100_000i64)
}

/// Strategy for a journal of 1 to 12 balanced entries, each with 1 to 3
/// generated postings and one balancing posting to `Assets:Bank`.
fn journal() -> impl Strategy<Value = Journal> {
    prop::collection::vec(prop::collection::vec(posting(), 1..4), 1..12).prop_map(|entries| {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let entries = entries
            .into_iter()
            .enumerate()
            .map(|(i, postings)| {
                let date = start + Days::new(i as u64);
                let mut entry = Entry::new(date, format!("Payee {i}"));
                let mut balance = Decimal::ZERO;
                for (account, cents) in postings {
                    let quantity = Decimal::new(cents, 2);
                    balance += quantity;
                    entry = entry.with_posting(ACCOUNTS[account], Amount::new(quantity, "$"));
                }
                entry.with_posting("Assets:Bank", Amount::new(-balance, "$"))
            })
            .collect();
        Journal::new(entries).unwrap()
    })
}

fn run(options: &ReportOptions, journal: &Journal) -> Vec<Transaction> {
    let mut sink = CollectSink::new();
    ChainBuilder::new(options, &BuiltinEvaluator)
        .build(&mut sink)
        .unwrap()
        .run(journal)
        .unwrap();
    sink.into_transactions()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// *For any* journal, the running total after each transaction SHALL
    /// equal the sum of the amounts seen so far.
    #[test]
    fn prop_register_totals_are_prefix_sums(journal in journal()) {
        let out = run(&ReportOptions::register(), &journal);

        let mut expected = Balance::new();
        for xact in &out {
            expected.add_amount(&xact.amount).unwrap();
            prop_assert_eq!(&xact.total, &expected);
        }
        prop_assert_eq!(out.len(), journal.transactions().count());
    }

    /// *For any* journal, the display filter SHALL exclude filtered
    /// transactions from the running total.
    #[test]
    fn prop_display_filter_precedes_total(journal in journal()) {
        let options = ReportOptions {
            display: Some(r#"account =~ /^Expenses/"#.to_string()),
            ..ReportOptions::register()
        };
        let out = run(&options, &journal);

        let mut expected = Balance::new();
        for xact in &out {
            prop_assert!(xact.account.starts_with("Expenses"));
            expected.add_amount(&xact.amount).unwrap();
            prop_assert_eq!(&xact.total, &expected);
        }
    }

    /// *For any* stream, inverting twice SHALL reproduce it.
    #[test]
    fn prop_double_invert_is_identity(journal in journal()) {
        let input = run(&ReportOptions::register(), &journal);

        let mut sink = CollectSink::new();
        {
            let mut stage = Invert::new(Box::new(Invert::new(Box::new(&mut sink))));
            for xact in input.clone() {
                stage.accept(xact).unwrap();
            }
            stage.finish().unwrap();
        }
        prop_assert_eq!(sink.into_transactions(), input);
    }

    /// *For any* journal, transactions with equal sort keys SHALL keep
    /// their input order.
    #[test]
    fn prop_sort_is_stable(cents in prop::collection::vec(-3i64..3, 1..20)) {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut entry = Entry::new(start, "Batch");
        let mut balance = Decimal::ZERO;
        for (seq, cents) in cents.iter().enumerate() {
            let quantity = Decimal::new(*cents, 0);
            balance += quantity;
            entry = entry.push_posting(
                Posting::new("Expenses:Misc", Amount::new(quantity, "$")).with_note(seq.to_string()),
            );
        }
        let entry = entry.with_posting("Assets:Bank", Amount::new(-balance, "$"));
        let journal = Journal::new(vec![entry]).unwrap();

        let options = ReportOptions {
            display: Some(r#"account == "Expenses:Misc""#.to_string()),
            sort: Some("amount".to_string()),
            ..ReportOptions::register()
        };
        let out = run(&options, &journal);

        prop_assert_eq!(out.len(), cents.len());
        for pair in out.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            prop_assert!(a.amount.quantity <= b.amount.quantity);
            if a.amount.quantity == b.amount.quantity {
                let seq = |x: &Transaction| x.note.as_deref().unwrap_or_default().parse::<usize>().unwrap();
                prop_assert!(seq(a) < seq(b));
            }
        }
    }

    /// *For any* journal and tail count, the output SHALL consist of the
    /// last N whole entries.
    #[test]
    fn prop_tail_keeps_whole_entries(journal in journal(), tail in 0i64..15) {
        let options = ReportOptions {
            tail: Some(tail),
            ..ReportOptions::register()
        };
        let out = run(&options, &journal);

        let entries = journal.entries();
        let keep = usize::try_from(tail).unwrap().min(entries.len());
        let expected: Vec<_> = entries[entries.len() - keep..].iter().map(|e| e.id).collect();

        let mut seen = Vec::new();
        for xact in &out {
            if seen.last() != Some(&xact.entry_id()) {
                seen.push(xact.entry_id());
            }
        }
        prop_assert_eq!(&seen, &expected);

        let kept: HashSet<_> = seen.into_iter().collect();
        let expected_len: usize = entries
            .iter()
            .filter(|e| kept.contains(&e.id))
            .map(|e| e.postings.len())
            .sum();
        prop_assert_eq!(out.len(), expected_len);
    }
}
