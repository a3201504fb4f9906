//! cryopool CLI - demo driver for the suspend/resume worker-process pool.

mod run;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "cryopool")]
#[command(about = "Suspend/resume worker-process pool")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Dispatch demo tasks across a pool of pre-forked workers
    Run {
        /// Number of worker processes
        #[arg(short, long, default_value = "4")]
        workers: usize,

        /// Number of tasks to dispatch
        #[arg(short, long, default_value = "10")]
        actions: usize,

        /// Base value added to every result
        #[arg(long, default_value = "10")]
        base: u64,

        /// Simulated per-task cost in milliseconds
        #[arg(long, default_value = "0")]
        delay_ms: u64,

        /// Keep idle workers blocked on their channel instead of
        /// suspending them at the scheduler level
        #[arg(long)]
        no_suspend: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::DEBUG.into())
    } else {
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Run {
            workers,
            actions,
            base,
            delay_ms,
            no_suspend,
        } => run::execute(workers, actions, base, delay_ms, no_suspend),
    }
}
