//! `cellar init`: create `.cellar/` with a config and an empty catalog.

use super::Invocation;
use crate::output::{pretty_kv, render_mode};
use anyhow::{Context as _, Result};
use cellar_core::db::{self, migrations};
use clap::Args;
use serde::Serialize;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Rewrite `config.toml` even if `.cellar/` already exists. The catalog
    /// database is kept and migrated in place.
    #[arg(long)]
    pub force: bool,
}

const CONFIG_TOML: &str = "[merge]\n\
    max_attempts = 3\n\
    initial_backoff_ms = 50\n\
    max_backoff_ms = 2000\n\
    \n\
    [store]\n\
    busy_timeout_ms = 5000\n";

const GITIGNORE: &str = "cellar.db\ncellar.db-wal\ncellar.db-shm\n";

#[derive(Debug, Serialize)]
struct InitReport {
    catalog: String,
    config: String,
    schema_version: u32,
}

/// Execute `cellar init`:
///
/// ```text
/// .cellar/
///   cellar.db      (migrated catalog)
///   config.toml    (default project config)
///   .gitignore     (database files)
/// ```
///
/// # Errors
///
/// Returns an error if `.cellar/` already exists and `--force` is not set,
/// or if any filesystem or database operation fails.
pub fn run_init(args: &InitArgs, ctx: &Invocation<'_>) -> Result<()> {
    let cellar_dir = ctx.project_root.join(db::CATALOG_DIR);

    if cellar_dir.exists() && !args.force {
        anyhow::bail!(".cellar/ already exists. Use `cellar init --force` to reinitialize.");
    }

    std::fs::create_dir_all(&cellar_dir)
        .with_context(|| format!("Failed to create {}", cellar_dir.display()))?;

    let config_path = cellar_dir.join("config.toml");
    std::fs::write(&config_path, CONFIG_TOML)
        .with_context(|| format!("Failed to write config: {}", config_path.display()))?;

    let gitignore_path = cellar_dir.join(".gitignore");
    std::fs::write(&gitignore_path, GITIGNORE)
        .with_context(|| format!("Failed to write .gitignore: {}", gitignore_path.display()))?;

    let catalog_path = db::catalog_path(ctx.project_root);
    let conn = db::open_catalog(&catalog_path, ctx.config.store.busy_timeout())?;
    let schema_version = migrations::current_schema_version(&conn)?;
    tracing::info!(path = %catalog_path.display(), schema_version, "catalog initialized");

    let report = InitReport {
        catalog: catalog_path.display().to_string(),
        config: config_path.display().to_string(),
        schema_version,
    };
    if ctx.quiet && !ctx.output.is_json() {
        return Ok(());
    }
    render_mode(
        ctx.output,
        &report,
        |r, w| writeln!(w, "initialized\t{}", r.catalog),
        |r, w| {
            writeln!(w, "✓ Initialized .cellar/ catalog.")?;
            writeln!(w)?;
            pretty_kv(w, "Catalog", &r.catalog)?;
            pretty_kv(w, "Config", &r.config)?;
            pretty_kv(w, "Schema", r.schema_version.to_string())?;
            writeln!(w)?;
            writeln!(w, "Next steps:")?;
            writeln!(w, "  cellar import <file.json>")?;
            writeln!(w, "  cellar list country")
        },
    )
}
