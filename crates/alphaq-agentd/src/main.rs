mod cli;
mod jobs;

use std::sync::Arc;

use alphaq_brain::BrainPlatform;
use alphaq_core::{CompletionLedger, Dispatcher, LedgerAppender};
use alphaq_observe::logger_init;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use cli::Args;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 1) Logger
    logger_init(&args.logger_config()?)?;

    // 2) Configuration and jobs
    let config = args.dispatch_config()?;
    let jobs = jobs::load_jobs(&args.jobs, &args.template()).await?;

    let ledger_path = args.ledger_path();
    let ledger = CompletionLedger::load(&ledger_path).await?;
    info!(
        ledger = %ledger_path.display(),
        completed = ledger.len(),
        width = config.width.get(),
        mode = %config.session_mode,
        "starting run"
    );

    // 3) Platform and dispatcher
    let platform = BrainPlatform::new(args.brain_config()).with_ledger(LedgerAppender::new(&ledger_path));
    let dispatcher = Dispatcher::new(Arc::new(platform), config)?;

    // 4) Ctrl+C cancels outstanding submissions; sessions are still closed
    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling outstanding submissions");
            shutdown.cancel();
        }
    });

    // 5) Run
    let report = dispatcher.run(jobs, &ledger, cancel).await?;
    info!(
        skipped = report.skipped,
        dispatched = report.dispatched,
        submitted = report.submitted,
        failed = report.failed,
        timed_out = report.timed_out,
        cancelled = report.cancelled,
        sessions_closed = report.sessions_closed,
        "run complete"
    );
    if !report.is_clean() {
        warn!("some expressions were not simulated; run again to retry them");
    }
    Ok(())
}
