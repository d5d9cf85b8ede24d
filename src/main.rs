use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tasklist::config::Config;
use tasklist::error::{Result, TaskError};
use tasklist::output::Format;
use tasklist::store::repo;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const SERVE_LOG_FILTER: &str = "tasklist=info,tower_http=info";
const CLI_LOG_FILTER: &str = "warn";

#[derive(Parser)]
#[command(name = "tasklist", version, about = "Ordered task list with a web front end")]
struct Cli {
    /// Output format
    #[arg(long, global = true, value_enum, default_value = "json")]
    format: Format,
    /// Shorthand for --format pretty
    #[arg(long, global = true, hide = true)]
    pretty: bool,
    /// Database file (overrides TASKLIST_DB and config.yaml)
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new .tasklist/ directory here
    Init,
    /// Append a new task to the end of the list
    Create {
        /// Task name (unique, 1-200 characters)
        name: String,
        /// Cost, a non-negative decimal with up to 2 places
        #[arg(long, allow_hyphen_values = true)]
        cost: String,
        /// Due date (YYYY-MM-DD)
        #[arg(long, allow_hyphen_values = true)]
        due: String,
    },
    /// List tasks in display order with the total cost
    List,
    /// Display a single task
    Show {
        /// Task ID
        id: i64,
    },
    /// Edit task fields
    Edit {
        /// Task ID to edit
        id: i64,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// New cost
        #[arg(long, allow_hyphen_values = true)]
        cost: Option<String>,
        /// New due date (YYYY-MM-DD)
        #[arg(long, allow_hyphen_values = true)]
        due: Option<String>,
    },
    /// Delete a task by ID
    Delete {
        /// Task ID to delete
        id: i64,
    },
    /// Swap a task with the one above it
    MoveUp {
        /// Task ID to move
        id: i64,
    },
    /// Swap a task with the one below it
    MoveDown {
        /// Task ID to move
        id: i64,
    },
    /// Serve the web pages and JSON API
    Serve {
        /// Address to bind (overrides TASKLIST_HOST)
        #[arg(long)]
        host: Option<String>,
        /// Port to bind (overrides TASKLIST_PORT)
        #[arg(long)]
        port: Option<u16>,
    },
}

fn init_logging(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Find the root and layer `--db` over the loaded configuration.
///
/// An explicit database path lets commands run outside an initialized tree.
fn resolve_config(db: Option<PathBuf>) -> Result<Config> {
    let has_db_override = db.is_some() || std::env::var_os("TASKLIST_DB").is_some();
    let root = match repo::find_repo_root() {
        Ok(root) => root,
        Err(TaskError::NotInitialized) if has_db_override => std::env::current_dir()?,
        Err(e) => return Err(e),
    };
    let mut config = Config::load(&root)?;
    if let Some(db) = db {
        config.db_path = std::env::current_dir()?.join(db);
    }
    Ok(config)
}

fn run(cli: Cli, format: Format) -> Result<()> {
    if let Commands::Init = cli.command {
        init_logging(CLI_LOG_FILTER);
        let cwd = std::env::current_dir()?;
        return tasklist::commands::init::run(&cwd);
    }

    let mut config = resolve_config(cli.db)?;
    let default_filter = match cli.command {
        Commands::Serve { .. } => SERVE_LOG_FILTER,
        _ => CLI_LOG_FILTER,
    };
    init_logging(config.log_filter.as_deref().unwrap_or(default_filter));

    match cli.command {
        Commands::Init => unreachable!(),
        Commands::Create { name, cost, due } => {
            tasklist::commands::create::run(&config, name, cost, due, format)
        }
        Commands::List => tasklist::commands::list::run(&config, format),
        Commands::Show { id } => tasklist::commands::show::run(&config, id, format),
        Commands::Edit {
            id,
            name,
            cost,
            due,
        } => tasklist::commands::edit::run(&config, id, name, cost, due, format),
        Commands::Delete { id } => tasklist::commands::delete::run(&config, id, format),
        Commands::MoveUp { id } => tasklist::commands::reorder::move_up(&config, id, format),
        Commands::MoveDown { id } => tasklist::commands::reorder::move_down(&config, id, format),
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            tasklist::commands::serve::run(&config)
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let format = if cli.pretty {
        Format::Pretty
    } else {
        cli.format
    };
    if let Err(e) = run(cli, format) {
        match format {
            Format::Json => {
                eprintln!(
                    "{}",
                    serde_json::json!({
                        "error": e.code(),
                        "message": e.to_string()
                    })
                );
            }
            _ => eprintln!("error: {e}"),
        }
        std::process::exit(1);
    }
}
