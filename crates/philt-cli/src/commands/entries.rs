//! `entries`: provider-driven build over the reachable closure.

use std::time::Duration;

use philt_analysis::{build_graph_from_entries, build_providers, discover_entries};

use crate::cli::EntriesArgs;
use crate::commands::{write_output, BuildDeadline, CommandContext};
use crate::error::{ConfigError, Result};

const ENTRIES_TIMEOUT: Duration = Duration::from_secs(120);

pub async fn execute(ctx: &CommandContext, args: EntriesArgs) -> Result<()> {
    tracing::debug!(
        root = %ctx.root.display(),
        providers = ctx.config.entries.len(),
        "discovering entries"
    );

    let providers = build_providers(&ctx.config.entries);
    let entries = discover_entries(&providers, &ctx.root)?;
    tracing::debug!(discovered = entries.len(), "entry discovery finished");

    if args.print_entries {
        for entry in &entries {
            eprintln!("• {}  {}", entry.name, entry.path.display());
        }
        return Ok(());
    }

    if entries.is_empty() {
        return Err(ConfigError::MissingField {
            field: "entries".into(),
            hint: "no entries discovered; check the entries list in your config".into(),
        }
        .into());
    }

    let deadline = BuildDeadline::start(ENTRIES_TIMEOUT);
    let report = build_graph_from_entries(&ctx.root, &entries, deadline.token()).await;
    deadline.check(report.cancelled)?;
    write_output(ctx.out.as_deref(), &report.graph)
}
