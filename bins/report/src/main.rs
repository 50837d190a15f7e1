//! Tallyline report runner
//!
//! Loads a journal, runs it through the configured report chain, and
//! prints each resulting transaction as one JSON line on stdout.

use std::io::{self, BufWriter, Write};
use std::rc::Rc;

use anyhow::Context;
use serde_json::json;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tallyline_core::valuation::NoPrices;
use tallyline_core::{BuiltinEvaluator, ChainBuilder, CollectSink, Journal, PriceSource, PriceTable};
use tallyline_shared::AppConfig;

fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout carries only the report
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tallyline=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let journal = Journal::load(&config.journal.path)
        .with_context(|| format!("Failed to load journal {}", config.journal.path))?;
    info!(
        path = %config.journal.path,
        entries = journal.entries().len(),
        "Journal loaded"
    );

    let prices: Rc<dyn PriceSource> = match &config.prices.path {
        Some(path) => {
            let table = PriceTable::load(path, config.prices.target.as_str())
                .with_context(|| format!("Failed to load prices {path}"))?;
            info!(path = %path, points = table.len(), "Price table loaded");
            Rc::new(table)
        }
        None => Rc::new(NoPrices),
    };

    let mut sink = CollectSink::new();
    let read = ChainBuilder::new(&config.report, &BuiltinEvaluator)
        .with_prices(prices)
        .build(&mut sink)
        .context("Failed to build report chain")?
        .run(&journal)
        .context("Report chain failed")?;

    let report = sink.into_transactions();
    info!(read, emitted = report.len(), "Report complete");

    let mut out = BufWriter::new(io::stdout().lock());
    for xact in &report {
        let line = json!({
            "date": xact.date().to_string(),
            "payee": xact.payee(),
            "account": xact.account,
            "amount": xact.amount.to_string(),
            "total": xact.total.to_string(),
        });
        writeln!(out, "{line}")?;
    }
    out.flush()?;

    Ok(())
}
