use anyhow::{bail, Context, Result};
use clap::Parser;
use defect_prompt_builder::app::clipboard::{ClipboardSink, DisabledClipboard, SystemClipboard};
use defect_prompt_builder::app::events::UserEvent;
use defect_prompt_builder::app::file_dialog::NativeDialogService;
use defect_prompt_builder::app::state::AppState;
use defect_prompt_builder::app::view_model::UiState;
use defect_prompt_builder::app::{commands, tasks};
use defect_prompt_builder::config;
use std::io::Read;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

/// Builds an LLM defect-review prompt from a template, a description, a context
/// file and a selection of project files, and copies it to the clipboard.
#[derive(Parser, Debug)]
#[command(name = "defect-prompt", version, about)]
struct Cli {
    /// Project root folder. Defaults to the one saved in the settings.
    #[arg(long)]
    root: Option<PathBuf>,

    /// Prompt template file.
    #[arg(long)]
    template: Option<PathBuf>,

    /// Context file.
    #[arg(long)]
    context: Option<PathBuf>,

    /// Defect description, or `-` to read it from stdin.
    #[arg(long, short)]
    description: Option<String>,

    /// Toggle the node at this path relative to the root. Repeatable.
    #[arg(long = "select", short = 's', value_name = "REL_PATH")]
    select: Vec<PathBuf>,

    /// Select every file in the tree.
    #[arg(long)]
    all: bool,

    /// Settings file to use instead of the platform default.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Replace the saved settings with the ones in this file before running.
    #[arg(long, value_name = "PATH")]
    import_config: Option<PathBuf>,

    /// Write the settings (after applying the other options) to this file and exit.
    #[arg(long, value_name = "PATH")]
    export_config: Option<PathBuf>,

    /// Use native dialogs for whatever was not given on the command line.
    #[arg(long)]
    pick: bool,

    /// Print the scanned tree and exit.
    #[arg(long)]
    tree_only: bool,

    /// Do not touch the system clipboard.
    ///
    /// On X11 and Wayland the copied text is owned by this process and is lost
    /// when it exits, unless a clipboard manager takes it over first. Use this
    /// flag and pipe stdout instead when none is running.
    #[arg(long)]
    no_clipboard: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let app_config = config::settings::load_config(cli.config.as_deref())?;
    let state = Arc::new(Mutex::new(AppState::new(app_config, cli.config.clone())));
    let (proxy, mut events) = mpsc::unbounded_channel::<UserEvent>();
    let dialog = NativeDialogService;

    if let Some(path) = &cli.import_config {
        if !commands::import_config(path, proxy.clone(), state.clone()) {
            bail!("Could not import settings from {}", path.display());
        }
    }

    match (&cli.template, cli.pick) {
        (Some(path), _) => commands::set_template(path.clone(), proxy.clone(), state.clone()),
        (None, true) => commands::select_template(&dialog, proxy.clone(), state.clone()),
        (None, false) => {}
    }
    match (&cli.context, cli.pick) {
        (Some(path), _) => commands::set_context(path.clone(), proxy.clone(), state.clone()),
        (None, true) => commands::select_context(&dialog, proxy.clone(), state.clone()),
        (None, false) => {}
    }
    if let Some(description) = read_description(cli.description.as_deref())? {
        commands::set_description(description, proxy.clone(), state.clone());
    }
    while events.try_recv().is_ok() {}

    if let Some(path) = &cli.export_config {
        if !commands::export_config(path, proxy.clone(), state.clone()) {
            bail!("Could not export settings to {}", path.display());
        }
        return Ok(());
    }

    match (&cli.root, cli.pick) {
        (Some(root), _) => tasks::start_scan_on_path(root.clone(), proxy.clone(), state.clone()),
        (None, true) => commands::select_root_folder(&dialog, proxy.clone(), state.clone()),
        (None, false) => commands::initialize(proxy.clone(), state.clone()),
    }

    let ui = wait_for_scan(&mut events).await?;
    if ui.root_folder.is_none() {
        bail!("No root folder given. Pass --root, --pick, or save one in the settings.");
    }
    if cli.tree_only {
        print!("{}", ui.tree_diagram);
        return Ok(());
    }

    let unknown: Vec<_> = cli
        .select
        .iter()
        .filter(|relative| !commands::toggle_path(relative, proxy.clone(), state.clone()))
        .collect();
    if !unknown.is_empty() {
        bail!("Not in the scanned tree: {:?}", unknown);
    }
    if cli.all {
        commands::select_all(proxy.clone(), state.clone());
    }

    let clipboard: Box<dyn ClipboardSink> = if cli.no_clipboard {
        Box::new(DisabledClipboard)
    } else {
        Box::new(SystemClipboard)
    };
    commands::generate_prompt(proxy.clone(), state.clone(), clipboard.as_ref());
    drop(proxy);

    while let Some(event) = events.recv().await {
        match event {
            UserEvent::ShowGeneratedContent(text) => {
                println!("{text}");
                return Ok(());
            }
            UserEvent::ShowError(message) => bail!(message),
            UserEvent::StateUpdate(_) => {}
        }
    }
    bail!("No prompt was generated.")
}

/// Waits for the scan to settle, failing on the first reported error.
async fn wait_for_scan(events: &mut mpsc::UnboundedReceiver<UserEvent>) -> Result<Box<UiState>> {
    while let Some(event) = events.recv().await {
        match event {
            UserEvent::StateUpdate(ui) if !ui.is_scanning => return Ok(ui),
            UserEvent::ShowError(message) => bail!(message),
            _ => {}
        }
    }
    bail!("Event channel closed before the scan finished.")
}

fn read_description(arg: Option<&str>) -> Result<Option<String>> {
    match arg {
        Some("-") => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read description from stdin")?;
            Ok(Some(text.trim_end().to_string()))
        }
        Some(text) => Ok(Some(text.to_string())),
        None => Ok(None),
    }
}
