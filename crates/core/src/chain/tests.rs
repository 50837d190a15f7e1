//! Scenario tests for assembled chains.

use std::rc::Rc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tallyline_shared::types::{Amount, Balance};
use tallyline_shared::{KeepPolicy, ReportOptions};

use super::{ChainBuilder, ChainError};
use crate::expr::BuiltinEvaluator;
use crate::journal::{Entry, Journal, Posting, Transaction};
use crate::period::PeriodError;
use crate::stage::CollectSink;
use crate::valuation::PriceTable;

fn date(m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, m, d).unwrap()
}

fn usd(quantity: Decimal) -> Amount {
    Amount::new(quantity, "$")
}

fn total(quantity: Decimal) -> Balance {
    Balance::from(&usd(quantity))
}

fn journal(entries: Vec<Entry>) -> Journal {
    Journal::new(entries).unwrap()
}

fn run(options: &ReportOptions, journal: &Journal) -> Result<Vec<Transaction>, ChainError> {
    let mut sink = CollectSink::new();
    ChainBuilder::new(options, &BuiltinEvaluator)
        .build(&mut sink)?
        .run(journal)?;
    assert!(sink.is_finished());
    Ok(sink.into_transactions())
}

fn register() -> ReportOptions {
    ReportOptions::register()
}

/// E1: A $10 / B -$10, E2: A $5 / C -$5.
fn two_entries() -> Journal {
    journal(vec![
        Entry::new(date(1, 1), "E1")
            .with_posting("A", usd(dec!(10)))
            .with_posting("B", usd(dec!(-10))),
        Entry::new(date(1, 2), "E2")
            .with_posting("A", usd(dec!(5)))
            .with_posting("C", usd(dec!(-5))),
    ])
}

// ============================================================================
// Builder
// ============================================================================

#[test]
fn test_full_chain_execution_order() {
    let options = ReportOptions {
        head: Some(2),
        display: Some("true".to_string()),
        only: Some("true".to_string()),
        sort: Some("date".to_string()),
        revalued_only: true,
        collapse: true,
        subtotal: true,
        dow: true,
        by_payee: true,
        period: Some("monthly".to_string()),
        invert: true,
        related_all: true,
        anon: true,
        limit: Some("true".to_string()),
        comm_as_payee: true,
        code_as_payee: true,
        ..register()
    };
    let mut sink = CollectSink::new();
    let chain = ChainBuilder::new(&options, &BuiltinEvaluator)
        .build(&mut sink)
        .unwrap();
    assert_eq!(
        chain.stage_names(),
        vec![
            "truncate",
            "display_filter",
            "calc",
            "only_filter",
            "sort",
            "revalue",
            "collapse",
            "dow",
            "interval",
            "date_sort",
            "invert",
            "related",
            "anonymize",
            "limit_filter",
            "comm_as_payee",
            "collect",
        ]
    );
}

#[test]
fn test_grouping_precedence() {
    let names = |options: ReportOptions| {
        let mut sink = CollectSink::new();
        ChainBuilder::new(&options, &BuiltinEvaluator)
            .build(&mut sink)
            .unwrap()
            .stage_names()
    };

    let by_payee = names(ReportOptions {
        by_payee: true,
        subtotal: true,
        ..register()
    });
    assert_eq!(by_payee, vec!["calc", "by_payee", "collect"]);

    let subtotal = names(ReportOptions {
        subtotal: true,
        ..register()
    });
    assert_eq!(subtotal, vec!["calc", "subtotal", "collect"]);

    let entries = names(ReportOptions {
        sort: Some("amount".to_string()),
        sort_entries: true,
        code_as_payee: true,
        ..register()
    });
    assert_eq!(entries, vec!["calc", "sort_entries", "code_as_payee", "collect"]);
}

#[test]
fn test_non_individual_chain_skips_transaction_stages() {
    let options = ReportOptions {
        head: Some(1),
        subtotal: true,
        invert: true,
        related: true,
        ..ReportOptions::default()
    };
    let mut sink = CollectSink::new();
    let chain = ChainBuilder::new(&options, &BuiltinEvaluator)
        .build(&mut sink)
        .unwrap();
    assert_eq!(chain.stage_names(), vec!["invert", "related", "collect"]);
}

#[test]
fn test_missing_amount_fails_before_streaming() {
    let options = ReportOptions {
        individual_xacts: true,
        display: Some("this is ( not valid".to_string()),
        ..ReportOptions::default()
    };
    let mut sink = CollectSink::new();
    let err = ChainBuilder::new(&options, &BuiltinEvaluator)
        .build(&mut sink)
        .err()
        .unwrap();
    assert_eq!(err, ChainError::MissingOption("amount"));
    assert!(sink.transactions().is_empty());
    assert!(!sink.is_finished());
}

#[test]
fn test_malformed_expression_fails_at_build() {
    let options = ReportOptions {
        limit: Some("amount >".to_string()),
        ..register()
    };
    let mut sink = CollectSink::new();
    let err = ChainBuilder::new(&options, &BuiltinEvaluator)
        .build(&mut sink)
        .err()
        .unwrap();
    assert_eq!(err.error_code(), "EXPR_PARSE");
}

#[test]
fn test_malformed_period_fails_at_build() {
    let options = ReportOptions {
        period: Some("fortnightly".to_string()),
        ..register()
    };
    let mut sink = CollectSink::new();
    let err = ChainBuilder::new(&options, &BuiltinEvaluator)
        .build(&mut sink)
        .err()
        .unwrap();
    assert_eq!(
        err,
        ChainError::Period(PeriodError::UnknownToken("fortnightly".to_string()))
    );
}

#[test]
fn test_calls_after_finish_are_rejected() {
    let options = register();
    let journal = two_entries();
    let mut sink = CollectSink::new();
    let mut chain = ChainBuilder::new(&options, &BuiltinEvaluator)
        .build(&mut sink)
        .unwrap();
    assert_eq!(chain.run(&journal).unwrap(), 4);
    assert!(chain.is_finished());

    let xact = journal.transactions().next().unwrap();
    assert_eq!(chain.accept(xact), Err(ChainError::StreamFinished));
    assert_eq!(chain.finish(), Err(ChainError::StreamFinished));
}

// ============================================================================
// Streaming semantics
// ============================================================================

#[test]
fn test_register_totals_are_prefix_sums() {
    let out = run(&register(), &two_entries()).unwrap();
    let totals: Vec<Balance> = out.iter().map(|x| x.total.clone()).collect();
    assert_eq!(
        totals,
        vec![total(dec!(10)), Balance::new(), total(dec!(5)), Balance::new()]
    );
    let accounts: Vec<&str> = out.iter().map(|x| x.account.as_str()).collect();
    assert_eq!(accounts, vec!["A", "B", "A", "C"]);
}

#[test]
fn test_display_filter_then_calculate() {
    let options = ReportOptions {
        display: Some(r#"account=="A""#.to_string()),
        ..register()
    };
    let out = run(&options, &two_entries()).unwrap();

    assert_eq!(out.len(), 2);
    assert_eq!(out[0].payee(), "E1");
    assert_eq!(out[0].total, total(dec!(10)));
    assert_eq!(out[1].payee(), "E2");
    assert_eq!(out[1].total, total(dec!(15)));
}

#[test]
fn test_display_filter_excludes_from_running_total() {
    let journal = journal(vec![Entry::new(date(1, 1), "Split")
        .with_posting("First", usd(dec!(1)))
        .with_posting("Second", usd(dec!(2)))
        .with_posting("Third", usd(dec!(-3)))]);

    let unfiltered = run(&register(), &journal).unwrap();
    assert!(unfiltered[2].total.is_zero());

    let options = ReportOptions {
        display: Some(r#"account != "Second""#.to_string()),
        ..register()
    };
    let filtered = run(&options, &journal).unwrap();
    assert_eq!(filtered.len(), 2);
    assert_eq!(filtered[1].account, "Third");
    assert_eq!(filtered[1].total, total(dec!(-2)));
}

#[test]
fn test_running_total_overflow_is_an_error() {
    let huge = || {
        Entry::new(date(1, 1), "Huge")
            .with_posting("A", usd(Decimal::MAX))
            .with_posting("B", usd(-Decimal::MAX))
    };
    let options = ReportOptions {
        display: Some(r#"account == "A""#.to_string()),
        ..register()
    };
    let mut sink = CollectSink::new();
    let err = ChainBuilder::new(&options, &BuiltinEvaluator)
        .build(&mut sink)
        .unwrap()
        .run(&journal(vec![huge(), huge()]))
        .unwrap_err();

    assert!(matches!(err, ChainError::Overflow(_)));
    assert_eq!(err.error_code(), "AMOUNT_OVERFLOW");
    assert_eq!(sink.transactions().len(), 1);
}

#[test]
fn test_only_filter_keeps_prior_totals() {
    let options = ReportOptions {
        only: Some(r#"account == "C""#.to_string()),
        ..register()
    };
    let out = run(&options, &two_entries()).unwrap();
    assert_eq!(out.len(), 1);
    assert!(out[0].total.is_zero());
}

#[test]
fn test_sort_is_stable_for_equal_keys() {
    let journal = journal(vec![
        Entry::new(date(1, 1), "Tagged")
            .push_posting(Posting::new("Expenses:Misc", usd(dec!(7))).with_note("seq-1"))
            .push_posting(Posting::new("Expenses:Misc", usd(dec!(7))).with_note("seq-2"))
            .with_posting("Assets:Cash", usd(dec!(-14))),
    ]);
    let options = ReportOptions {
        sort: Some("amount".to_string()),
        ..register()
    };
    let out = run(&options, &journal).unwrap();
    let notes: Vec<Option<&str>> = out.iter().map(|x| x.note.as_deref()).collect();
    assert_eq!(notes, vec![None, Some("seq-1"), Some("seq-2")]);
}

#[test]
fn test_tail_keeps_whole_entries() {
    let options = ReportOptions {
        tail: Some(1),
        ..register()
    };
    let out = run(&options, &two_entries()).unwrap();
    let payees: Vec<&str> = out.iter().map(Transaction::payee).collect();
    assert_eq!(payees, vec!["E2", "E2"]);
    // Truncation precedes the running total.
    assert_eq!(out[0].total, total(dec!(5)));
}

#[test]
fn test_collapse_then_subtotal_preserves_sum() {
    let quantities = [dec!(3), dec!(4.25), dec!(10), dec!(0.75)];
    let entries = quantities
        .iter()
        .enumerate()
        .map(|(i, q)| {
            let day = u32::try_from(i).unwrap() + 1;
            Entry::new(date(2, day), format!("Shop {day}"))
                .with_posting("Expenses:Food", usd(*q))
                .with_posting("Expenses:Food", usd(*q))
                .with_posting("Assets:Cash", usd(-*q * dec!(2)))
        })
        .collect();
    let options = ReportOptions {
        display: Some(r#"account == "Expenses:Food""#.to_string()),
        collapse: true,
        subtotal: true,
        ..register()
    };
    let out = run(&options, &journal(entries)).unwrap();

    let mut sum = Balance::new();
    for xact in &out {
        sum.add_amount(&xact.amount).unwrap();
    }
    let expected: Decimal = quantities.iter().copied().sum::<Decimal>() * dec!(2);
    assert_eq!(sum, total(expected));
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].account, "<Total>");
}

#[test]
fn test_period_output_is_date_ascending_despite_sort() {
    let journal = journal(vec![
        Entry::new(date(1, 5), "Small")
            .with_posting("Expenses:Food", usd(dec!(1)))
            .with_posting("Assets:Cash", usd(dec!(-1))),
        Entry::new(date(2, 5), "Large")
            .with_posting("Expenses:Food", usd(dec!(100)))
            .with_posting("Assets:Cash", usd(dec!(-100))),
        Entry::new(date(3, 5), "Medium")
            .with_posting("Expenses:Food", usd(dec!(50)))
            .with_posting("Assets:Cash", usd(dec!(-50))),
    ]);
    let options = ReportOptions {
        sort: Some("-amount".to_string()),
        period: Some("monthly".to_string()),
        display: Some(r#"account == "Expenses:Food""#.to_string()),
        ..register()
    };
    let out = run(&options, &journal).unwrap();

    let dates: Vec<NaiveDate> = out.iter().map(Transaction::date).collect();
    assert_eq!(dates, vec![date(1, 1), date(2, 1), date(3, 1)]);
    assert!(out.iter().all(|x| x.entry.range.is_some()));
}

#[test]
fn test_invert_negates_register() {
    let options = ReportOptions {
        invert: true,
        ..register()
    };
    let out = run(&options, &two_entries()).unwrap();
    assert_eq!(out[0].amount, usd(dec!(-10)));
    assert_eq!(out[0].total, total(dec!(-10)));
}

#[test]
fn test_limit_sees_inverted_amounts() {
    let options = ReportOptions {
        invert: true,
        limit: Some("amount > 0".to_string()),
        ..register()
    };
    let out = run(&options, &two_entries()).unwrap();
    let accounts: Vec<&str> = out.iter().map(|x| x.account.as_str()).collect();
    assert_eq!(accounts, vec!["B", "C"]);
}

#[test]
fn test_related_shows_other_side() {
    let options = ReportOptions {
        display: Some(r#"account == "A""#.to_string()),
        related: true,
        ..register()
    };
    let out = run(&options, &two_entries()).unwrap();
    let accounts: Vec<&str> = out.iter().map(|x| x.account.as_str()).collect();
    assert_eq!(accounts, vec!["B", "C"]);
}

#[test]
fn test_entry_keep_policy() {
    let options = ReportOptions {
        display: Some(r#"account == "C""#.to_string()),
        keep: KeepPolicy::Entry,
        ..register()
    };
    let out = run(&options, &two_entries()).unwrap();
    let accounts: Vec<&str> = out.iter().map(|x| x.account.as_str()).collect();
    assert_eq!(accounts, vec!["A", "C"]);
}

#[test]
fn test_anonymize_is_stable_across_entries() {
    let journal = journal(vec![
        Entry::new(date(1, 1), "Alice")
            .with_posting("Assets:Bank", usd(dec!(1)))
            .with_posting("Income:Gifts", usd(dec!(-1))),
        Entry::new(date(1, 2), "Bob")
            .with_posting("Assets:Bank", usd(dec!(2)))
            .with_posting("Income:Gifts", usd(dec!(-2))),
        Entry::new(date(1, 3), "Alice")
            .with_posting("Assets:Bank", usd(dec!(3)))
            .with_posting("Income:Gifts", usd(dec!(-3))),
    ]);
    let options = ReportOptions {
        anon: true,
        ..register()
    };
    let out = run(&options, &journal).unwrap();
    assert_eq!(out[0].payee(), out[4].payee());
    assert_ne!(out[0].payee(), out[2].payee());
    assert!(out.iter().all(|x| x.payee() != "Alice" && x.payee() != "Bob"));
    assert_eq!(out[0].account, out[2].account);
}

#[test]
fn test_revaluation_with_price_table() {
    let journal = journal(vec![
        Entry::new(date(1, 1), "Buy")
            .with_posting("Assets:Broker", Amount::new(dec!(2), "AAPL"))
            .with_posting("Equity:Opening", Amount::new(dec!(-2), "AAPL")),
        Entry::new(date(2, 1), "Dividend")
            .with_posting("Assets:Bank", usd(dec!(1)))
            .with_posting("Income:Dividends", usd(dec!(-1))),
    ]);
    let prices = Rc::new(
        PriceTable::new("$")
            .with_price("AAPL", date(1, 1), dec!(180))
            .with_price("AAPL", date(1, 31), dec!(190)),
    );
    let options = ReportOptions {
        display: Some(r#"account =~ /^Assets/"#.to_string()),
        revalued_only: true,
        ..register()
    };

    let mut sink = CollectSink::new();
    ChainBuilder::new(&options, &BuiltinEvaluator)
        .with_prices(prices)
        .build(&mut sink)
        .unwrap()
        .run(&journal)
        .unwrap();
    let out = sink.into_transactions();

    assert_eq!(out.len(), 1);
    assert_eq!(out[0].account, "<Revalued>");
    assert_eq!(out[0].amount, usd(dec!(20)));
    assert_eq!(out[0].date(), date(2, 1));
}

#[test]
fn test_code_as_payee() {
    let journal = journal(vec![Entry::new(date(1, 1), "Landlord")
        .with_code("CHK-1042")
        .with_posting("Expenses:Rent", usd(dec!(900)))
        .with_posting("Assets:Bank", usd(dec!(-900)))]);
    let options = ReportOptions {
        code_as_payee: true,
        ..register()
    };
    let out = run(&options, &journal).unwrap();
    assert!(out.iter().all(|x| x.payee() == "CHK-1042"));
}
