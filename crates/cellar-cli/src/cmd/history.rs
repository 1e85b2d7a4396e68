//! `cellar history`: recently committed merges.

use super::Invocation;
use crate::output::{pretty_kv, pretty_rule, render_mode};
use anyhow::Result;
use cellar_core::db::query::{self, MergeLogEntry};
use chrono::{DateTime, Utc};
use clap::Args;
use std::io::{self, Write};

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Maximum number of merges to show, newest first.
    #[arg(short = 'n', long, default_value = "20")]
    pub limit: u32,
}

fn format_timestamp(micros: i64) -> String {
    DateTime::<Utc>::from_timestamp_micros(micros)
        .map_or_else(|| micros.to_string(), |ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
}

fn write_text(entries: &[MergeLogEntry], w: &mut dyn Write) -> io::Result<()> {
    for entry in entries {
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{}",
            entry.merge_id,
            entry.level,
            entry.leader_id,
            entry.followers_merged,
            entry.merged_at_us
        )?;
    }
    Ok(())
}

fn write_pretty(entries: &[MergeLogEntry], w: &mut dyn Write) -> io::Result<()> {
    if entries.is_empty() {
        return writeln!(w, "No merges recorded.");
    }
    for entry in entries {
        writeln!(
            w,
            "#{} {} into {}",
            entry.merge_id, entry.level, entry.leader_name
        )?;
        pretty_rule(w)?;
        pretty_kv(w, "Leader", entry.leader_id.to_string())?;
        pretty_kv(w, "Merged", entry.followers_merged.to_string())?;
        for follower in &entry.follower_ids {
            pretty_kv(w, "Follower", follower.to_string())?;
        }
        pretty_kv(w, "At", format!("{} UTC", format_timestamp(entry.merged_at_us)))?;
        writeln!(w)?;
    }
    Ok(())
}

/// Execute `cellar history`.
///
/// # Errors
///
/// Returns an error if the catalog is not initialized or the query fails.
pub fn run_history(args: &HistoryArgs, ctx: &Invocation<'_>) -> Result<()> {
    let conn = ctx.open_catalog()?;
    let entries = query::recent_merges(&conn, args.limit)?;
    render_mode(
        ctx.output,
        &entries,
        |entries, w| write_text(entries, w),
        |entries, w| write_pretty(entries, w),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_render_in_utc() {
        assert_eq!(format_timestamp(0), "1970-01-01 00:00:00");
        assert_eq!(format_timestamp(1_700_000_000_000_000), "2023-11-14 22:13:20");
    }

    #[test]
    fn empty_history_says_so() {
        let mut buf = Vec::new();
        write_pretty(&[], &mut buf).expect("write");
        assert_eq!(String::from_utf8(buf).expect("utf8"), "No merges recorded.\n");
    }
}
