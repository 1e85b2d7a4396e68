//! `cellar merge`: fold follower records into a leader.

use super::Invocation;
use crate::output::{CliError, pretty_kv, render_error, render_mode};
use anyhow::Result;
use cellar_core::merge::{self, CancelToken, MergeContext, MergeOutcome, RetryPolicy};
use cellar_core::model::MergeLevel;
use clap::Args;
use std::io::{self, Write};
use uuid::Uuid;

#[derive(Args, Debug)]
pub struct MergeArgs {
    /// Level to merge at: country, region, appellation, sub-appellation, wine.
    pub level: MergeLevel,

    /// Id of the record that survives.
    #[arg(long, value_name = "ID")]
    pub leader: Uuid,

    /// Id of a record to fold into the leader. Repeat for several.
    #[arg(long = "follower", value_name = "ID", required = true)]
    pub followers: Vec<Uuid>,
}

fn write_pretty(outcome: &MergeOutcome, w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "✓ {}", outcome.summary())?;
    writeln!(w)?;
    pretty_kv(w, "Leader", outcome.leader_id.to_string())?;
    pretty_kv(w, "Reparented", outcome.stats.reparented.to_string())?;
    pretty_kv(w, "Absorbed", outcome.stats.absorbed.to_string())?;
    pretty_kv(w, "Leaves", outcome.stats.leaves_moved.to_string())
}

/// Execute `cellar merge <LEVEL> --leader <ID> --follower <ID>...`.
///
/// # Errors
///
/// Returns an error if the catalog is not initialized or the merge fails.
/// A failed merge has changed nothing.
pub fn run_merge(args: &MergeArgs, ctx: &Invocation<'_>) -> Result<()> {
    let mut conn = ctx.open_catalog()?;
    let merge_ctx = MergeContext::new(
        RetryPolicy::from_config(&ctx.config.merge),
        CancelToken::new(),
    );

    let outcome = match merge::merge(
        &mut conn,
        args.level,
        args.leader,
        &args.followers,
        &merge_ctx,
    ) {
        Ok(outcome) => outcome,
        Err(err) => {
            render_error(ctx.output, &CliError::from(&err))?;
            return Err(err.into());
        }
    };

    if ctx.quiet && !ctx.output.is_json() {
        return Ok(());
    }
    render_mode(
        ctx.output,
        &outcome,
        |o, w| writeln!(w, "{}", o.summary()),
        |o, w| write_pretty(o, w),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellar_core::merge::MergeStats;

    #[test]
    fn pretty_output_leads_with_summary() {
        let outcome = MergeOutcome {
            level: MergeLevel::Region,
            leader_id: Uuid::nil(),
            leader_name: "Bordeaux".into(),
            followers_merged: 2,
            stats: MergeStats {
                reparented: 4,
                absorbed: 3,
                leaves_moved: 12,
            },
        };
        let mut buf = Vec::new();
        write_pretty(&outcome, &mut buf).expect("write");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.starts_with("✓ Merged 2 regions into Bordeaux.\n"), "got: {text}");
        assert!(text.contains("Absorbed:    3"), "got: {text}");
    }
}
