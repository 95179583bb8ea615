//! # Lineup Demo Binary
//!
//! Small showcase for the `lineup` library.
//!
//! ## Usage
//!
//! ```bash
//! # Concurrent progress rows with a pinned footer (default 4 tasks)
//! lineup
//! lineup --tasks 8
//!
//! # Credential prompt flow (masked password entry)
//! lineup --login
//! lineup --login --user alice   # pre-answer the user field
//! ```
//!
//! The progress demo spawns N producer tasks that each append a row,
//! then rewrite it in place as work "completes", while the footer
//! counts finished tasks. It exercises every console operation under
//! real concurrency.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use lineup::{Console, Field, Prompter, TtyPrompter};

/// Lineup - serialized line-addressable terminal output
#[derive(Parser, Debug)]
#[command(name = "lineup")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Demo for the lineup console and prompter", long_about = None)]
struct Args {
    /// Number of concurrent producer tasks in the progress demo
    #[arg(short, long, default_value_t = 4, conflicts_with = "login")]
    tasks: usize,

    /// Run the credential prompt flow instead of the progress demo
    #[arg(long)]
    login: bool,

    /// Pre-answer the user field of the login flow
    #[arg(long, value_name = "NAME", requires = "login")]
    user: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    if args.login {
        run_login(args.user)
    } else {
        run_progress(args.tasks).await
    }
}

/// Spawn `tasks` producers over one console and let them race.
async fn run_progress(tasks: usize) -> Result<()> {
    let console = Console::stdout();
    console
        .set_summary(format!("0/{tasks} done"))
        .await
        .context("Failed to pin the summary")?;

    let mut workers = Vec::with_capacity(tasks);
    for n in 0..tasks {
        let handle = console.handle();
        workers.push(tokio::spawn(async move {
            let row = handle.append_row(format!("task {n}: working")).await?;
            // Staggered finishes so edits land on interior rows.
            tokio::time::sleep(Duration::from_millis(150 * (n as u64 % 5 + 1))).await;
            handle.edit_row(row, format!("task {n}: done")).await?;
            Ok::<_, lineup::ConsoleError>(())
        }));
    }

    let mut finished = 0;
    for worker in workers {
        worker.await.context("Producer task panicked")??;
        finished += 1;
        console.set_summary(format!("{finished}/{tasks} done"));
    }

    console
        .set_summary(format!("all {tasks} tasks done"))
        .await
        .context("Failed to write the final summary")?;
    console.close().await.context("Console shutdown failed")?;
    // The footer carries no newline; leave the shell on a fresh line.
    println!();
    Ok(())
}

/// Gather a user/password pair, honoring a --user override.
fn run_login(user: Option<String>) -> Result<()> {
    let mut overrides = HashMap::new();
    if let Some(user) = user {
        overrides.insert("user".to_string(), user);
    }

    let prompter = TtyPrompter::new("demo", overrides);
    let fields = [
        Field::new("user", "User").with_default("anonymous"),
        Field::new("password", "Password").sensitive(),
    ];
    match prompter.get(&fields) {
        Ok(values) => {
            prompter.success();
            let user = values.get("user").map(String::as_str).unwrap_or_default();
            println!("would sign in as {user}");
            Ok(())
        }
        Err(err) => Err(err).context("Credential gathering aborted"),
    }
}
