//! Worker-side runtime for the cryopool process pool.
//!
//! A worker binary embeds this runtime: it hands [`serve`] (or
//! [`serve_typed`]) its work capability, and the runtime drives the startup
//! handshake and the receive loop over stdin/stdout. The worker never exits
//! on its own; it runs until the coordinator kills it or closes the command
//! channel.

use std::io::{Read, Write};
use std::panic::{AssertUnwindSafe, catch_unwind};

use anyhow::{Context as _, bail};
use serde::Serialize;
use serde::de::DeserializeOwned;

use cryopool_core::{Error, WorkerCommand, WorkerResponse, read_message, write_message};

pub mod stock;

/// Identity and setup data delivered to the worker in its startup frame.
pub struct WorkerContext {
    /// This worker's stable ordinal in the pool.
    pub index: u32,
    /// Opaque caller-supplied setup bytes. Empty if unused.
    pub init_payload: Vec<u8>,
}

/// Run the worker loop on stdin/stdout with a byte-level work capability.
///
/// The capability receives the shared payload and the optional per-task
/// item; returning `Ok(None)` sends the empty sentinel. An `Err` (or a
/// panic) is caught, logged, and also collapsed to the sentinel, so the
/// coordinator cannot tell the two apart.
pub fn serve<F>(work: F) -> anyhow::Result<()>
where
    F: FnMut(&WorkerContext, &[u8], Option<&[u8]>) -> anyhow::Result<Option<Vec<u8>>>,
{
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    run_loop(stdin.lock(), stdout.lock(), work)
}

/// Run the worker loop with a typed work capability.
///
/// Payloads, items, and results are JSON-encoded. The capability signature
/// mirrors the dispatch contract: worker index, shared payload, optional
/// iterable item.
pub fn serve_typed<P, I, R, F>(mut work: F) -> anyhow::Result<()>
where
    P: DeserializeOwned,
    I: DeserializeOwned,
    R: Serialize,
    F: FnMut(u32, &P, Option<&I>) -> anyhow::Result<Option<R>>,
{
    serve(move |ctx, payload, item| {
        let payload: P =
            serde_json::from_slice(payload).context("failed to decode shared payload")?;
        let item: Option<I> = item
            .map(serde_json::from_slice)
            .transpose()
            .context("failed to decode iterable item")?;
        match work(ctx.index, &payload, item.as_ref())? {
            Some(result) => Ok(Some(
                serde_json::to_vec(&result).context("failed to encode result")?,
            )),
            None => Ok(None),
        }
    })
}

/// The worker state machine over arbitrary channel endpoints.
///
/// Generic over the endpoints so tests can drive it with in-memory buffers.
/// Startup: read the one-time `Init` frame, acknowledge with `Ready`, then
/// loop. `Drain` echoes the sentinel; `Task` invokes the work capability
/// and sends exactly one response.
pub fn run_loop<R, W, F>(mut commands: R, mut results: W, mut work: F) -> anyhow::Result<()>
where
    R: Read,
    W: Write,
    F: FnMut(&WorkerContext, &[u8], Option<&[u8]>) -> anyhow::Result<Option<Vec<u8>>>,
{
    let ctx = match read_message::<_, WorkerCommand>(&mut commands) {
        Ok(WorkerCommand::Init {
            index,
            init_payload,
        }) => WorkerContext {
            index,
            init_payload,
        },
        Ok(other) => bail!("expected startup frame, got {:?}", other),
        Err(e) => return Err(e).context("failed to read startup frame"),
    };
    write_message(&mut results, &WorkerResponse::Ready)?;

    loop {
        let command = match read_message::<_, WorkerCommand>(&mut commands) {
            Ok(command) => command,
            // Coordinator closed the command channel; the only voluntary exit.
            Err(Error::Disconnected) => return Ok(()),
            Err(e) => return Err(e).context("failed to read command"),
        };

        match command {
            WorkerCommand::Drain => write_message(&mut results, &WorkerResponse::Empty)?,
            WorkerCommand::Task { item, payload } => {
                let outcome =
                    catch_unwind(AssertUnwindSafe(|| work(&ctx, &payload, item.as_deref())));
                let reply = match outcome {
                    Ok(Ok(Some(bytes))) => WorkerResponse::Output { bytes },
                    Ok(Ok(None)) => WorkerResponse::Empty,
                    Ok(Err(e)) => {
                        tracing::error!(worker = ctx.index, "work function failed: {:#}", e);
                        WorkerResponse::Empty
                    }
                    Err(panic) => {
                        tracing::error!(
                            worker = ctx.index,
                            "work function panicked: {}",
                            panic_message(panic.as_ref())
                        );
                        WorkerResponse::Empty
                    }
                };
                write_message(&mut results, &reply)?;
            }
            WorkerCommand::Init { .. } => bail!("unexpected second startup frame"),
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s
    } else {
        "unknown panic payload"
    }
}
