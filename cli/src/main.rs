use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use aligngrid::drag::{Command as DragCommand, DragEvent};
use aligngrid::store::AppState;
use aligngrid::{Field, GridBinder, GridConfig, GridError, MemoryStore, canonical_key};
use clap::{Parser, Subcommand};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("missing snapshot; pass --snapshot or set ALIGNGRID_SNAPSHOT")]
    MissingSnapshot,
    #[error("failed to read {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error("no data set loaded in snapshot")]
    NotLoaded,
}

#[derive(Parser, Debug)]
#[command(name = "aligngrid", about = "Inspect column ordering for a parallel-text grid snapshot")]
struct Cli {
    /// JSON file holding a full application state snapshot.
    #[arg(long, global = true, env = "ALIGNGRID_SNAPSHOT")]
    snapshot: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the canonical preference key for a set of fields.
    Key {
        #[arg(required = true)]
        fields: Vec<String>,
    },
    /// Print the resolved column order, one field per line.
    Order,
    /// Print the full view model as JSON.
    Render,
    /// Drop header `from` onto header `to` and print the resulting store actions.
    Swap {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
    },
    /// Toggle an auxiliary field and print the resulting store actions.
    Toggle {
        #[arg(long)]
        field: String,
    },
}

fn main() {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        tracing::error!(error = %err, "command failed");
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = GridConfig::from_env()?;
    match cli.command {
        Command::Key { fields } => {
            let fields: Vec<Field> = fields.into_iter().map(Field::from).collect();
            println!("{}", canonical_key(&fields)?);
            Ok(())
        }
        Command::Order => {
            let (_, binder) = bind(cli.snapshot.as_deref(), config)?;
            for field in binder.ordered_fields() {
                println!("{field}");
            }
            Ok(())
        }
        Command::Render => {
            let (_, binder) = bind(cli.snapshot.as_deref(), config)?;
            println!("{}", serde_json::to_string_pretty(&binder.view())?);
            Ok(())
        }
        Command::Swap { from, to } => {
            let (store, binder) = bind(cli.snapshot.as_deref(), config)?;
            ensure_loaded(&binder)?;
            binder.handle(DragEvent::Start { field: Field::from(from.as_str()) })?;
            let outcome =
                binder.handle(DragEvent::Drop { payload: Some(Field::from(from)), target: Some(Field::from(to)) })?;
            if !matches!(outcome, Some(DragCommand::Reorder { .. })) {
                tracing::warn!("drop was a no-op");
            }
            println!("{}", serde_json::to_string_pretty(&store.dispatched())?);
            Ok(())
        }
        Command::Toggle { field } => {
            let (store, binder) = bind(cli.snapshot.as_deref(), config)?;
            ensure_loaded(&binder)?;
            if !binder.toggle_field(&Field::from(field))? {
                tracing::warn!("field cannot be toggled");
            }
            println!("{}", serde_json::to_string_pretty(&store.dispatched())?);
            Ok(())
        }
    }
}

fn bind(path: Option<&Path>, config: GridConfig) -> Result<(Rc<MemoryStore>, GridBinder<MemoryStore>), CliError> {
    let state = load_snapshot(path)?;
    let store = Rc::new(MemoryStore::new(state));
    let binder = GridBinder::attach(Rc::clone(&store), config);
    Ok((store, binder))
}

fn load_snapshot(path: Option<&Path>) -> Result<AppState, CliError> {
    let path = path.ok_or(CliError::MissingSnapshot)?;
    let raw = fs::read_to_string(path).map_err(|source| CliError::Io { path: path.to_path_buf(), source })?;
    let state: AppState = serde_json::from_str(&raw)?;
    tracing::info!(path = %path.display(), loaded = state.segment_data.data.is_some(), "snapshot read");
    Ok(state)
}

fn ensure_loaded(binder: &GridBinder<MemoryStore>) -> Result<(), CliError> {
    if binder.view().is_placeholder() {
        return Err(CliError::NotLoaded);
    }
    Ok(())
}
