//! Rollcall CLI - demo session against a running server
//!
//! Usage:
//!   rollcall                                   Talk to the default endpoint
//!   rollcall --endpoint http://host:50001      Talk to another server
//!   rollcall --limit 10 --timeout-secs 3       Tune the listing and deadline
//!
//! The session adds one person, streams two more, lists up to `--limit`
//! records and looks the streamed names back up, printing each result set as
//! JSON lines.

use std::io::{self, Write};
use std::time::Duration;

use anyhow::{Context, bail};
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use rollcall::PersonRecord;
use rollcall_grpc::{CallDriver, DEFAULT_ENDPOINT, DriverConfig};

/// Rollcall CLI - exercise every call shape of a Rollcall server
#[derive(Parser, Debug)]
#[command(name = "rollcall")]
#[command(about = "Demo client for the Rollcall person directory")]
struct Args {
    /// Server endpoint
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Per-call deadline in seconds
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,

    /// Maximum number of records to list
    #[arg(long, default_value_t = 5)]
    limit: i32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let args = Args::parse();

    let driver = CallDriver::connect(DriverConfig {
        endpoint: args.endpoint.clone(),
        timeout: Duration::from_secs(args.timeout_secs),
    })
    .await
    .with_context(|| format!("failed to connect to {}", args.endpoint))?;
    tracing::info!(endpoint = %args.endpoint, deadline = ?driver.timeout(), "connected");

    let tom = PersonRecord::new("Tom", 1, "tom@gmail.com");
    if !driver.add_person(tom).await.context("AddPerson failed")? {
        bail!("AddPerson was not accepted");
    }

    let streamed = vec![
        PersonRecord::new("Lilly", 2, "lilly@gmail.com"),
        PersonRecord::new("Jim", 3, "jim@gmail.com"),
    ];
    let names: Vec<String> = streamed.iter().map(|p| p.name.clone()).collect();
    if !driver.add_persons(streamed).await.context("AddPersons failed")? {
        bail!("AddPersons was not accepted");
    }

    let listed = driver
        .list_limit(args.limit)
        .await
        .context("ListPersons failed")?;
    print_persons("ListPersons", &listed)?;

    let found = driver
        .lookup_many(names)
        .await
        .context("LookupPersons failed")?;
    print_persons("LookupPersons", &found)?;

    Ok(())
}

fn print_persons(label: &str, persons: &[PersonRecord]) -> anyhow::Result<()> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{label} output:")?;
    for person in persons {
        writeln!(stdout, "{}", serde_json::to_string(person)?)?;
    }
    writeln!(stdout)?;
    Ok(())
}
