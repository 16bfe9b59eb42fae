use std::path::{Path, PathBuf};
use std::sync::Arc;

use board::config::{ApiConfig, ConfigError, ControllerConfig, load_dotenv};
use board::controller::{BoardController, BoardError};
use board::error::ErrorCode;
use board::export::{ExportError, export_archive, folder_name};
use board::rest::RestStore;
use board::store::{ImageFile, StoreError};
use canvas::content::TodoEdit;
use canvas::doc::{Widget, WidgetKind};
use canvas::geometry::{Point, Size};
use clap::{Args, Parser, Subcommand};
use serde_json::{Value, json};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Board(#[from] BoardError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("refusing to clear the dashboard without --yes")]
    ConfirmationRequired,
    #[error("{0} change(s) could not be saved")]
    Unsaved(usize),
}

#[derive(Parser, Debug)]
#[command(name = "noteboard", about = "Note board CLI over the hosted dashboard backend")]
struct Cli {
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    log: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every widget in draw order.
    List,
    /// Create a widget of the given kind.
    Add {
        kind: WidgetKind,
        #[arg(long, requires = "y", allow_hyphen_values = true)]
        x: Option<f64>,
        #[arg(long, requires = "x", allow_hyphen_values = true)]
        y: Option<f64>,
    },
    /// Move a widget and bring it to the front.
    Move {
        id: Uuid,
        #[arg(allow_hyphen_values = true)]
        x: f64,
        #[arg(allow_hyphen_values = true)]
        y: f64,
    },
    /// Resize a widget; sizes below the minimum are raised to it.
    Resize { id: Uuid, width: f64, height: f64 },
    /// Replace a widget's content.
    Edit { id: Uuid, content: String },
    Todo(TodoCommand),
    /// Upload an image file into an image widget.
    Upload { id: Uuid, path: PathBuf },
    Delete { id: Uuid },
    /// Save a widget's content and wait for the backend to confirm.
    Save { id: Uuid },
    /// Flush pending changes and mark every widget of the dashboard saved.
    SaveAll,
    /// Delete every widget on the dashboard.
    Clear {
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
    /// Write a zip archive of the dashboard.
    Export {
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct TodoCommand {
    #[command(subcommand)]
    command: TodoSubcommand,
}

#[derive(Subcommand, Debug)]
enum TodoSubcommand {
    Add { id: Uuid, text: String },
    Toggle { id: Uuid, item: String },
    Remove { id: Uuid, item: String },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    load_dotenv();
    let cli = Cli::parse();
    init_tracing(&cli.log);

    let api = ApiConfig::from_env()?;
    let tuning = ControllerConfig::from_env()?;
    let store = Arc::new(RestStore::new(&api)?);
    let mut board = BoardController::new(store.clone(), &tuning);
    let dashboard_id = board.start_session(store.as_ref()).await?;

    run(&mut board, &store, dashboard_id, cli.command).await?;

    board.settle().await?;
    let errors = board.take_errors();
    if errors.is_empty() {
        return Ok(());
    }
    for e in &errors {
        error!(code = e.error_code(), error = %e, "change not saved");
    }
    Err(CliError::Unsaved(errors.len()))
}

fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_new(default_filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

async fn run(board: &mut BoardController, store: &RestStore, dashboard_id: Uuid, command: Command) -> Result<(), CliError> {
    match command {
        Command::List => {
            let rows: Vec<Value> = board.render_order().into_iter().map(widget_json).collect();
            print_json(&Value::Array(rows))
        }
        Command::Add { kind, x, y } => {
            let position = x.zip(y).map(|(x, y)| Point::new(x, y));
            let id = board.add_widget(kind, position).await?;
            print_widget(board, id)
        }
        Command::Move { id, x, y } => {
            board.move_widget(id, Point::new(x, y))?;
            print_widget(board, id)
        }
        Command::Resize { id, width, height } => {
            board.resize_widget(id, Size::new(width, height))?;
            board.commit_size(id)?;
            print_widget(board, id)
        }
        Command::Edit { id, content } => {
            board.update_content(id, content)?;
            print_widget(board, id)
        }
        Command::Todo(todo) => {
            let (id, edit) = match todo.command {
                TodoSubcommand::Add { id, text } => (id, TodoEdit::Add(text)),
                TodoSubcommand::Toggle { id, item } => (id, TodoEdit::Toggle(item)),
                TodoSubcommand::Remove { id, item } => (id, TodoEdit::Remove(item)),
            };
            if !board.edit_todo(id, &edit)? {
                info!(%id, "todo list unchanged");
            }
            print_widget(board, id)
        }
        Command::Upload { id, path } => {
            let file = read_image(&path)?;
            let url = board.upload_image(id, store, &file).await?;
            println!("{url}");
            Ok(())
        }
        Command::Delete { id } => {
            board.delete_widget(id)?;
            println!("{id}");
            Ok(())
        }
        Command::Save { id } => {
            board.save_widget(id).await?;
            print_widget(board, id)
        }
        Command::SaveAll => {
            let saved = board.save_all().await?;
            println!("saved {saved} widget(s)");
            Ok(())
        }
        Command::Clear { yes } => {
            if !yes {
                return Err(CliError::ConfirmationRequired);
            }
            let removed = board.clear_dashboard().await?;
            println!("removed {removed} widget(s)");
            Ok(())
        }
        Command::Export { title, out } => {
            let title = match title {
                Some(title) => title,
                None => store.dashboard_title(dashboard_id).await?,
            };
            let archive = export_archive(&title, board.widgets().as_slice(), store).await?;
            let out = out.unwrap_or_else(|| PathBuf::from(format!("{}.zip", folder_name(&title))));
            std::fs::write(&out, &archive)?;
            println!("{}", out.display());
            Ok(())
        }
    }
}

fn read_image(path: &Path) -> Result<ImageFile, CliError> {
    let bytes = std::fs::read(path)?;
    let name = path.file_name().map_or_else(|| "image".to_owned(), |n| n.to_string_lossy().into_owned());
    let content_type = path
        .extension()
        .and_then(|ext| content_type_for(&ext.to_string_lossy().to_ascii_lowercase()))
        .map(str::to_owned);
    Ok(ImageFile { name, content_type, bytes })
}

fn content_type_for(ext: &str) -> Option<&'static str> {
    match ext {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}

fn widget_json(widget: &Widget) -> Value {
    json!({
        "id": widget.id,
        "kind": widget.kind.as_tag(),
        "x": widget.position.x,
        "y": widget.position.y,
        "width": widget.size.width,
        "height": widget.size.height,
        "z": widget.z_index(),
        "content": widget.content,
        "style": widget.style.to_value(),
    })
}

fn print_widget(board: &BoardController, id: Uuid) -> Result<(), CliError> {
    match board.widget(id) {
        Some(widget) => print_json(&widget_json(widget)),
        None => Err(BoardError::WidgetNotFound(id).into()),
    }
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
