//! `components`: JSX-aware component graph from entries, with a live
//! progress line on stderr.

use std::io::Write as _;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use philt_analysis::components::ProgressFn;
use philt_analysis::{
    build_component_graph, build_providers, discover_entries, fallback_root_entry,
};

use crate::cli::ComponentsArgs;
use crate::commands::{write_output, BuildDeadline, CommandContext};
use crate::error::Result;

const COMPONENTS_TIMEOUT: Duration = Duration::from_secs(180);
/// Minimum interval between progress line rewrites.
const PROGRESS_INTERVAL: Duration = Duration::from_millis(200);

pub async fn execute(ctx: &CommandContext, _args: ComponentsArgs, quiet: bool) -> Result<()> {
    let providers = build_providers(&ctx.config.entries);
    let mut entry_paths: Vec<_> = discover_entries(&providers, &ctx.root)?
        .into_iter()
        .map(|entry| entry.path)
        .collect();

    if entry_paths.is_empty() {
        let fallback = fallback_root_entry(&ctx.root);
        tracing::debug!(entry = %fallback.display(), "no configured entries; using root fallback");
        entry_paths.push(fallback);
    }

    let progress = (!quiet).then(progress_printer);

    let deadline = BuildDeadline::start(COMPONENTS_TIMEOUT);
    let report =
        build_component_graph(&ctx.root, &entry_paths, deadline.token(), progress).await;
    if !quiet {
        eprintln!();
    }
    deadline.check(report.cancelled)?;
    write_output(ctx.out.as_deref(), &report.graph)
}

/// A rate-limited single-line progress printer.
fn progress_printer() -> ProgressFn {
    let last = Mutex::new(Instant::now() - PROGRESS_INTERVAL);
    Arc::new(move |visited, edges, queued| {
        let now = Instant::now();
        {
            let mut last = last.lock();
            if now.duration_since(*last) < PROGRESS_INTERVAL {
                return;
            }
            *last = now;
        }
        let mut stderr = std::io::stderr().lock();
        let _ = write!(
            stderr,
            "\rcomponents: visited={visited} edges={edges} queued={queued}"
        );
        let _ = stderr.flush();
    })
}
