//! `scan`: full-tree build → graph document.

use std::time::Duration;

use philt_analysis::{build_graph, ScanOptions};

use crate::cli::ScanArgs;
use crate::commands::{write_output, BuildDeadline, CommandContext};
use crate::error::Result;
use crate::ui;

const SCAN_TIMEOUT: Duration = Duration::from_secs(120);

pub async fn execute(ctx: &CommandContext, _args: ScanArgs) -> Result<()> {
    let deadline = BuildDeadline::start(SCAN_TIMEOUT);
    let report = build_graph(&ctx.root, ScanOptions::default(), deadline.token()).await?;

    // Unresolved relative imports are diagnostics, not failures.
    for unresolved in &report.unresolved {
        ui::warning(&unresolved.to_string());
    }
    if !report.unresolved.is_empty() {
        ui::warning(&format!(
            "{} import(s) could not be resolved; graph is partial",
            report.unresolved.len()
        ));
    }

    deadline.check(report.cancelled)?;
    write_output(ctx.out.as_deref(), &report.graph)
}
