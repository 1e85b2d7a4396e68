//! `cellar import`: load a JSON catalog document.

use super::Invocation;
use crate::output::{CliError, pretty_kv, pretty_section, render_error, render_mode};
use anyhow::Result;
use cellar_core::error::ErrorCode;
use cellar_core::import;
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Path to the JSON catalog document.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

/// Execute `cellar import <FILE>`.
///
/// # Errors
///
/// Returns an error if the catalog is not initialized, or the document is
/// unreadable, malformed, or violates a constraint. Nothing is written in
/// that case.
pub fn run_import(args: &ImportArgs, ctx: &Invocation<'_>) -> Result<()> {
    let mut conn = ctx.open_catalog()?;

    let report = match import::import_file(&mut conn, &args.file) {
        Ok(report) => report,
        Err(err) => {
            let code = ErrorCode::ImportInvalid;
            render_error(
                ctx.output,
                &CliError::with_details(format!("{err:#}"), code.hint(), code.code()),
            )?;
            return Err(err);
        }
    };
    tracing::info!(file = %args.file.display(), rows = report.total(), "catalog imported");

    if ctx.quiet && !ctx.output.is_json() {
        return Ok(());
    }
    render_mode(
        ctx.output,
        &report,
        |r, w| writeln!(w, "imported\t{}", r.total()),
        |r, w| {
            pretty_section(w, &format!("Imported {} rows", r.total()))?;
            pretty_kv(w, "Countries", r.countries.to_string())?;
            pretty_kv(w, "Regions", r.regions.to_string())?;
            pretty_kv(w, "Appellations", r.appellations.to_string())?;
            pretty_kv(w, "Sub-apps", r.sub_appellations.to_string())?;
            pretty_kv(w, "Wines", r.wines.to_string())?;
            pretty_kv(w, "Vintages", r.vintages.to_string())?;
            pretty_kv(w, "Bottles", r.bottles.to_string())?;
            pretty_kv(w, "Scores", r.evolution_scores.to_string())?;
            pretty_kv(w, "Profiles", r.taste_profiles.to_string())?;
            pretty_kv(
                w,
                "Suggestions",
                (r.suggested_appellations + r.suggested_wines).to_string(),
            )
        },
    )
}
