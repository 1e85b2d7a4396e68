#![forbid(unsafe_code)]

mod cmd;
mod output;

use cellar_core::config;
use clap::{CommandFactory, Parser, Subcommand};
use output::OutputMode;
use std::env;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "cellar: wine catalog with duplicate merging",
    long_about = None
)]
struct Cli {
    /// Enable verbose (debug) logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Output format; overrides `--json`, `FORMAT` and user config.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Suppress non-essential output.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Project root holding `.cellar/` (defaults to the current directory).
    #[arg(long, global = true, value_name = "DIR")]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Setup",
        about = "Initialize a catalog in the current project",
        long_about = "Create .cellar/ with a default config.toml and an empty, migrated catalog database.",
        after_help = "EXAMPLES:\n    # Initialize a catalog here\n    cellar init\n\n    # Rewrite config.toml with defaults, keeping the catalog\n    cellar init --force"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        next_help_heading = "Setup",
        about = "Load a JSON catalog document",
        long_about = "Insert every country, region, appellation, sub-appellation, wine, vintage, bottle, \
                      score and suggestion in a JSON document. The import is a single transaction.",
        after_help = "EXAMPLES:\n    # Import a catalog export\n    cellar import cellar.json\n\n    # Show per-level counts as JSON\n    cellar import cellar.json --json"
    )]
    Import(cmd::import::ImportArgs),

    #[command(
        next_help_heading = "Browse",
        about = "List records at one hierarchy level",
        long_about = "List records at a level with their parent and direct child count, ordered by name.",
        after_help = "EXAMPLES:\n    # Every region\n    cellar list region\n\n    # Regions of one country\n    cellar list region --parent 6f1c...\n\n    # Machine-readable\n    cellar list wine --json"
    )]
    List(cmd::list::ListArgs),

    #[command(
        next_help_heading = "Merge",
        about = "Merge duplicate records into a leader",
        long_about = "Fold one or more follower records into a leader at the same level. Children with \
                      matching names are merged recursively, the rest are moved under the leader, and \
                      the followers are deleted. Either everything commits or nothing changes.",
        after_help = "EXAMPLES:\n    # Merge two regions into a third\n    cellar merge region --leader <ID> --follower <ID> --follower <ID>\n\n    # Merge wines, JSON result\n    cellar merge wine --leader <ID> --follower <ID> --json"
    )]
    Merge(cmd::merge::MergeArgs),

    #[command(
        next_help_heading = "Merge",
        about = "Show recently committed merges",
        after_help = "EXAMPLES:\n    # Last 20 merges\n    cellar history\n\n    # Last 5 as JSON\n    cellar history --limit 5 --json"
    )]
    History(cmd::history::HistoryArgs),

    #[command(
        next_help_heading = "Setup",
        about = "Generate shell completion scripts",
        after_help = "EXAMPLES:\n    # Bash\n    cellar completions bash > ~/.local/share/bash-completion/completions/cellar"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("CELLAR_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "cellar=debug,info"
        } else {
            "cellar=info,warn"
        })
    });

    let format = env::var("CELLAR_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let project_root = match cli.root {
        Some(ref root) => root.clone(),
        None => env::current_dir()?,
    };
    let effective = config::resolve_config(&project_root, cli.json)?;
    let output = output::resolve_output_mode(cli.format, &effective.resolved_output);
    debug!(root = %project_root.display(), ?output, "resolved invocation");

    let ctx = cmd::Invocation {
        project_root: &project_root,
        config: &effective.project,
        output,
        quiet: cli.quiet,
    };

    match cli.command {
        Commands::Init(ref args) => cmd::init::run_init(args, &ctx),
        Commands::Import(ref args) => cmd::import::run_import(args, &ctx),
        Commands::List(ref args) => cmd::list::run_list(args, &ctx),
        Commands::Merge(ref args) => cmd::merge::run_merge(args, &ctx),
        Commands::History(ref args) => cmd::history::run_history(args, &ctx),
        Commands::Completions(ref args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(args.shell, &mut command)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellar_core::model::MergeLevel;

    #[test]
    fn json_flag_parses_after_subcommand() {
        let cli = Cli::parse_from(["cellar", "history", "--json"]);
        assert!(cli.json);
    }

    #[test]
    fn format_flag_parses() {
        let cli = Cli::parse_from(["cellar", "--format", "text", "history"]);
        assert_eq!(cli.format, Some(OutputMode::Text));
    }

    #[test]
    fn merge_collects_repeated_followers() {
        let leader = "00000000-0000-4000-8000-000000000001";
        let a = "00000000-0000-4000-8000-000000000002";
        let b = "00000000-0000-4000-8000-000000000003";
        let cli = Cli::parse_from([
            "cellar",
            "merge",
            "sub-appellation",
            "--leader",
            leader,
            "--follower",
            a,
            "--follower",
            b,
        ]);
        let Commands::Merge(args) = cli.command else {
            panic!("expected merge command");
        };
        assert_eq!(args.level, MergeLevel::SubAppellation);
        assert_eq!(args.followers.len(), 2);
        assert_eq!(args.leader.to_string(), leader);
    }

    #[test]
    fn merge_requires_a_follower() {
        let result = Cli::try_parse_from([
            "cellar",
            "merge",
            "region",
            "--leader",
            "00000000-0000-4000-8000-000000000001",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn malformed_id_is_a_usage_error() {
        let result = Cli::try_parse_from([
            "cellar",
            "merge",
            "region",
            "--leader",
            "not-a-uuid",
            "--follower",
            "00000000-0000-4000-8000-000000000002",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn all_subcommands_parse() {
        let subcommands = [
            vec!["cellar", "init"],
            vec!["cellar", "import", "catalog.json"],
            vec!["cellar", "list", "country"],
            vec!["cellar", "history", "--limit", "5"],
            vec!["cellar", "completions", "zsh"],
        ];
        for args in &subcommands {
            let result = Cli::try_parse_from(args.iter());
            assert!(result.is_ok(), "failed to parse {args:?}: {:?}", result.err());
        }
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
