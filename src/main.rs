use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use o3de_fetch::ObjectKind;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

mod commands;

/// o3de-fetch - Download engines, projects, gems and templates from O3DE repositories
#[derive(Parser)]
#[command(name = "o3de-fetch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Show debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download an object from the registered repositories
    Download {
        #[command(flatten)]
        object: ObjectName,

        /// Destination folder (defaults to the manifest's default folder for the kind)
        #[arg(long, visible_alias = "dp")]
        dest_path: Option<PathBuf>,

        /// Do not register the downloaded object in o3de_manifest.json
        #[arg(long, visible_alias = "sar")]
        skip_auto_register: bool,

        /// Use this folder instead of the user's home folder
        #[arg(long, visible_alias = "ohf")]
        override_home_folder: Option<PathBuf>,
    },

    /// Clear the cache and re-fetch every registered repository
    RefreshRepos {
        /// Use this folder instead of the user's home folder
        #[arg(long, visible_alias = "ohf")]
        override_home_folder: Option<PathBuf>,
    },

    /// Search the registered repositories for objects
    Search {
        /// Object kind (engine, project, gem, template, restricted)
        kind: ObjectKind,

        /// Case-insensitive part of the object name
        query: String,

        /// Use this folder instead of the user's home folder
        #[arg(long, visible_alias = "ohf")]
        override_home_folder: Option<PathBuf>,
    },

    /// Manage the content cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,

        /// Use this folder instead of the user's home folder
        #[arg(long, global = true, visible_alias = "ohf")]
        override_home_folder: Option<PathBuf>,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Exactly one object to download
#[derive(Args)]
#[group(required = true, multiple = false)]
struct ObjectName {
    /// Name of the engine to download
    #[arg(short = 'e', long)]
    engine_name: Option<String>,

    /// Name of the project to download
    #[arg(short = 'p', long)]
    project_name: Option<String>,

    /// Name of the gem to download
    #[arg(short = 'g', long)]
    gem_name: Option<String>,

    /// Name of the template to download
    #[arg(short = 't', long)]
    template_name: Option<String>,

    /// Name of the restricted folder to download
    #[arg(short = 'r', long)]
    restricted_name: Option<String>,
}

impl ObjectName {
    fn into_kind_and_name(self) -> Option<(ObjectKind, String)> {
        [
            (ObjectKind::Engine, self.engine_name),
            (ObjectKind::Project, self.project_name),
            (ObjectKind::Gem, self.gem_name),
            (ObjectKind::Template, self.template_name),
            (ObjectKind::Restricted, self.restricted_name),
        ]
        .into_iter()
        .find_map(|(kind, name)| name.map(|name| (kind, name)))
    }
}

#[derive(Subcommand)]
enum CacheAction {
    /// Show the cache location
    Path,

    /// Remove every cached document, bundle and checkout
    Clear,

    /// Show cache statistics
    Info,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Download {
            object,
            dest_path,
            skip_auto_register,
            override_home_folder,
        } => match object.into_kind_and_name() {
            Some((kind, name)) => commands::download::run(
                kind,
                name,
                dest_path,
                skip_auto_register,
                override_home_folder,
            ),
            None => Err(anyhow::anyhow!("An object name is required")),
        },
        Commands::RefreshRepos {
            override_home_folder,
        } => commands::refresh::run(override_home_folder),
        Commands::Search {
            kind,
            query,
            override_home_folder,
        } => commands::search::run(kind, query, override_home_folder),
        Commands::Cache {
            action,
            override_home_folder,
        } => match action {
            CacheAction::Path => commands::cache::run_path(override_home_folder),
            CacheAction::Clear => commands::cache::run_clear(override_home_folder),
            CacheAction::Info => commands::cache::run_info(override_home_folder),
        },
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "o3de-fetch", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
