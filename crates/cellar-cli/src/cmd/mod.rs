pub mod completions;
pub mod history;
pub mod import;
pub mod init;
pub mod list;
pub mod merge;

use crate::output::{CliError, OutputMode, render_error};
use cellar_core::config::ProjectConfig;
use cellar_core::db;
use cellar_core::error::ErrorCode;
use rusqlite::Connection;
use std::path::Path;

/// Per-invocation state shared by every command handler.
pub struct Invocation<'a> {
    pub project_root: &'a Path,
    pub config: &'a ProjectConfig,
    pub output: OutputMode,
    pub quiet: bool,
}

impl Invocation<'_> {
    /// Open the project's catalog, failing with `E1001` when `cellar init`
    /// has not been run.
    pub fn open_catalog(&self) -> anyhow::Result<Connection> {
        let path = db::catalog_path(self.project_root);
        match db::try_open_catalog(&path, self.config.store.busy_timeout())? {
            Some(conn) => Ok(conn),
            None => {
                let code = ErrorCode::NotInitialized;
                let message = format!("{}: {} does not exist", code.message(), path.display());
                render_error(
                    self.output,
                    &CliError::with_details(&message, code.hint(), code.code()),
                )?;
                anyhow::bail!("{message}");
            }
        }
    }
}
