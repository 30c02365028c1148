use std::io::Write;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use guardrule_cli::config::CliConfig;
use guardrule_cli::runner;
use guardrule_store::MemoryStore;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "guardrule=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // --- Configuration ---
    let config = CliConfig::from_env().with_cases_arg(std::env::args().nth(1));
    tracing::info!(
        cases = %config.cases.display(),
        fixtures = ?config.fixtures,
        "Loaded runner configuration"
    );

    // --- Store ---
    let store = match &config.fixtures {
        Some(path) => {
            let store = MemoryStore::from_path(path)
                .with_context(|| format!("Failed to load fixtures from {}", path.display()))?;
            tracing::info!(entity_types = ?store.entity_types(), "Fixture store loaded");
            Some(store)
        }
        None => None,
    };
    let registry = runner::build_registry(store);

    // --- Cases ---
    let cases = runner::load_cases(&config.cases)?;
    let (reports, summary) = runner::run_cases(&*registry, &cases);

    let mut stdout = std::io::stdout().lock();
    for report in &reports {
        serde_json::to_writer(&mut stdout, report)?;
        writeln!(stdout)?;
    }

    tracing::info!(
        cases = summary.cases,
        passed = summary.passed,
        failed = summary.failed,
        errored = summary.errored,
        "Run complete"
    );

    if summary.errored > 0 {
        anyhow::bail!("{} case(s) errored", summary.errored);
    }
    Ok(())
}
