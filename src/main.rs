use iveditor::cli::{Args, BookmarkCommand, Commands, InteractionCommand};
use iveditor::config;
use iveditor::core::player::SimulatedPlayer;
use iveditor::editor::catalog::{load_catalog, JsonFileCatalog};
use iveditor::editor::check::check_store;
use iveditor::editor::store::TimelineStore;
use iveditor::editor::Editor;
use iveditor::entities::{InteractiveVideoParams, VideoField, VideoFile};
use iveditor::settings::EditorSettings;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use log::{debug, info};
use std::path::{Path, PathBuf};

/// Host field the CLI pretends the document's video comes from
const VIDEO_FIELD_PATH: &str = "interactiveVideo/video/files";

fn main() {
    let args = Args::parse();
    init_logging(&args);
    debug!("Command-line args: {:?}", args);

    if let Err(e) = run(args) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(args: &Args) {
    let path_config = config::PathConfig::from_env_and_cli(args.config_dir.clone());

    // 0 (default) = warn, 1 (-v) = info, 2 (-vv) = debug, 3+ (-vvv) = trace
    let log_level = match args.verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    if let Some(log_path_opt) = &args.log_file {
        if let Err(e) = config::ensure_dirs(&path_config) {
            eprintln!("Warning: Failed to create application directories: {}", e);
        }
        let log_path = log_path_opt
            .as_ref()
            .cloned()
            .unwrap_or_else(|| config::data_file(config::LOG_FILE, &path_config));

        match std::fs::File::create(&log_path) {
            Ok(file) => {
                env_logger::Builder::new()
                    .filter_level(log_level)
                    .format_timestamp_millis()
                    .target(env_logger::Target::Pipe(Box::new(file)))
                    .init();
                info!("Logging to file: {} (level: {:?})", log_path.display(), log_level);
                return;
            }
            Err(e) => eprintln!("Warning: cannot create log file {}: {}", log_path.display(), e),
        }
    }

    // Console logging (respects RUST_LOG if set)
    let default_level = match args.verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_millis()
        .init();
}

fn run(args: Args) -> Result<()> {
    let path_config = config::PathConfig::from_env_and_cli(args.config_dir.clone());
    let settings = EditorSettings::load(&path_config);
    info!(
        "Settings: {}",
        config::config_file(config::SETTINGS_FILE, &path_config).display()
    );

    match args.command {
        Commands::Check { file, duration } => cmd_check(&file, duration),
        Commands::Catalog { file } => cmd_catalog(&file, &settings),
        Commands::Bookmark { action } => match action {
            BookmarkCommand::Add {
                file,
                time,
                label,
                out,
            } => cmd_bookmark_add(settings, &file, time, label.as_deref(), out),
            BookmarkCommand::Remove { file, index, out } => cmd_bookmark_remove(settings, &file, index, out),
            BookmarkCommand::Rename {
                file,
                index,
                label,
                out,
            } => cmd_bookmark_rename(settings, &file, index, &label, out),
        },
        Commands::Interaction { action } => match action {
            InteractionCommand::Remove { file, index, out } => cmd_interaction_remove(settings, &file, index, out),
        },
    }
}

/// Command: iveditor check FILE [--duration S]
fn cmd_check(file: &Path, duration: Option<f64>) -> Result<()> {
    let doc = InteractiveVideoParams::from_json(file)?;
    let (store, load) = TimelineStore::from_document(doc);
    let report = check_store(&store, duration, &load);
    print!("{}", report);
    println!(
        "{} interaction(s), {} bookmark(s)",
        store.interaction_count(),
        store.bookmark_count()
    );
    if !report.is_clean() {
        std::process::exit(2);
    }
    Ok(())
}

/// Command: iveditor catalog FILE
fn cmd_catalog(file: &Path, settings: &EditorSettings) -> Result<()> {
    let mut source = JsonFileCatalog::new(file);
    let load = load_catalog(&mut source, settings.catalog_attempts);
    if let Some(e) = load.error {
        return Err(anyhow!(e)).with_context(|| format!("Catalog {}", file.display()));
    }
    for button in &load.buttons {
        println!("{:<16} {:<28} {}", button.id, button.uber_name, button.tooltip);
    }
    Ok(())
}

/// Open `file` in an editor driven by a simulated player long enough for
/// every element in it (or `min_duration`).
fn open_editor(settings: EditorSettings, file: &Path, min_duration: f64) -> Result<Editor> {
    let doc = InteractiveVideoParams::from_json(file)?;
    let duration = doc
        .interactions
        .iter()
        .map(|ia| ia.time_window.to)
        .chain(doc.bookmarks.iter().map(|b| b.time))
        .fold(min_duration, f64::max);

    let video = VideoField::video(
        VIDEO_FIELD_PATH,
        vec![VideoFile {
            path: file.display().to_string(),
            mime: None,
        }],
    );
    let mut editor = Editor::new(settings, VIDEO_FIELD_PATH, &[video], doc)?;
    let player = SimulatedPlayer::new(duration).with_emitter(editor.emitter());
    editor.attach_player(Box::new(player))?;
    Ok(editor)
}

fn save(editor: &Editor, file: &Path, out: Option<PathBuf>) -> Result<()> {
    let target = out.unwrap_or_else(|| file.to_path_buf());
    editor.document().to_json(&target)?;
    info!("Saved {}", target.display());
    Ok(())
}

/// Command: iveditor bookmark add FILE --time T [--label L]
fn cmd_bookmark_add(
    settings: EditorSettings,
    file: &Path,
    time: f64,
    label: Option<&str>,
    out: Option<PathBuf>,
) -> Result<()> {
    let mut editor = open_editor(settings, file, time)?;
    editor.playback_mut()?.seek(time);
    let id = editor.add_bookmark_at_playhead()?;
    if let Some(label) = label {
        editor.rename_bookmark(id, label)?;
    }
    let index = editor.store().bookmark_position(id).unwrap_or_default();
    println!("Bookmark #{} at {:.2}s", index, time);
    save(&editor, file, out)
}

/// Command: iveditor bookmark remove FILE --index N
fn cmd_bookmark_remove(settings: EditorSettings, file: &Path, index: usize, out: Option<PathBuf>) -> Result<()> {
    let mut editor = open_editor(settings, file, 0.0)?;
    let (id, _) = editor
        .store()
        .bookmark_at(index)
        .ok_or_else(|| anyhow!("No bookmark #{}", index))?;
    editor.remove_bookmark(id)?;
    save(&editor, file, out)
}

/// Command: iveditor bookmark rename FILE --index N --label L
fn cmd_bookmark_rename(
    settings: EditorSettings,
    file: &Path,
    index: usize,
    label: &str,
    out: Option<PathBuf>,
) -> Result<()> {
    let mut editor = open_editor(settings, file, 0.0)?;
    let (id, _) = editor
        .store()
        .bookmark_at(index)
        .ok_or_else(|| anyhow!("No bookmark #{}", index))?;
    editor.rename_bookmark(id, label)?;
    save(&editor, file, out)
}

/// Command: iveditor interaction remove FILE --index N
fn cmd_interaction_remove(settings: EditorSettings, file: &Path, index: usize, out: Option<PathBuf>) -> Result<()> {
    let mut editor = open_editor(settings, file, 0.0)?;
    let (id, _) = editor
        .store()
        .interaction_at(index)
        .ok_or_else(|| anyhow!("No interaction #{}", index))?;
    editor.open_dialog(id, Vec::new())?;
    editor.remove_interaction(true)?;
    save(&editor, file, out)
}
