//! `cellar list`: records at one hierarchy level.

use super::Invocation;
use crate::output::{pretty_section, render_mode};
use anyhow::Result;
use cellar_core::db::query::{self, NodeSummary};
use cellar_core::model::MergeLevel;
use clap::Args;
use std::io::{self, Write};
use uuid::Uuid;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Level to list: country, region, appellation, sub-appellation, wine.
    pub level: MergeLevel,

    /// Only records whose parent has this id.
    #[arg(long, value_name = "ID")]
    pub parent: Option<Uuid>,
}

const UNNAMED: &str = "(unnamed)";

fn display_name(node: &NodeSummary) -> &str {
    match node.name.as_deref() {
        Some(name) if !name.trim().is_empty() => name,
        _ => UNNAMED,
    }
}

fn write_text(nodes: &[NodeSummary], w: &mut dyn Write) -> io::Result<()> {
    for node in nodes {
        writeln!(w, "{}\t{}\t{}", node.id, display_name(node), node.children)?;
    }
    Ok(())
}

fn write_pretty(level: MergeLevel, nodes: &[NodeSummary], w: &mut dyn Write) -> io::Result<()> {
    let kind = level.kind();
    let noun = if nodes.len() == 1 {
        kind.noun()
    } else {
        kind.plural()
    };
    pretty_section(w, &format!("{} {noun}", nodes.len()))?;
    let width = nodes
        .iter()
        .map(|node| display_name(node).chars().count())
        .max()
        .unwrap_or(0)
        .max(4);
    for node in nodes {
        writeln!(
            w,
            "{:<width$}  {:>5}  {}",
            display_name(node),
            node.children,
            node.id
        )?;
    }
    Ok(())
}

/// Execute `cellar list <LEVEL>`.
///
/// # Errors
///
/// Returns an error if the catalog is not initialized or the query fails.
pub fn run_list(args: &ListArgs, ctx: &Invocation<'_>) -> Result<()> {
    let conn = ctx.open_catalog()?;
    let nodes = query::list_nodes(&conn, args.level, args.parent)?;
    tracing::debug!(level = %args.level, count = nodes.len(), "listed records");

    render_mode(
        ctx.output,
        &nodes,
        |nodes, w| write_text(nodes, w),
        |nodes, w| write_pretty(args.level, nodes, w),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(name: Option<&str>, children: i64) -> NodeSummary {
        NodeSummary {
            id: Uuid::nil(),
            name: name.map(str::to_string),
            parent_id: None,
            children,
        }
    }

    #[test]
    fn blank_names_display_as_unnamed() {
        assert_eq!(display_name(&node(None, 0)), UNNAMED);
        assert_eq!(display_name(&node(Some("  "), 0)), UNNAMED);
        assert_eq!(display_name(&node(Some("Pauillac"), 0)), "Pauillac");
    }

    #[test]
    fn text_rows_are_tab_separated() {
        let mut buf = Vec::new();
        write_text(&[node(Some("Sonoma"), 3)], &mut buf).expect("write");
        assert_eq!(
            String::from_utf8(buf).expect("utf8"),
            format!("{}\tSonoma\t3\n", Uuid::nil())
        );
    }

    #[test]
    fn pretty_heading_uses_singular_for_one() {
        let mut buf = Vec::new();
        write_pretty(MergeLevel::Region, &[node(Some("Loire"), 1)], &mut buf).expect("write");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.starts_with("1 region\n"), "got: {text}");
    }
}
