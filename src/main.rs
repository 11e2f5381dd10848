use clap::{Parser, Subcommand};
use diffslide::config::{self, CONFIG_FILE_NAME};
use diffslide::export::{ExportArtifact, ExportEngine, ExportKind};
use diffslide::imaging::SplitPosition;
use diffslide::output::{self, ExportManifest, SavedArtifact};
use diffslide::{ImageAsset, logging};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// The image pair every export command works on.
#[derive(clap::Args, Clone)]
struct PairArgs {
    /// Image shown left of the divider
    #[arg(long)]
    before: PathBuf,

    /// Image shown right of the divider
    #[arg(long)]
    after: PathBuf,

    /// Exchange the before and after images
    #[arg(long)]
    swap: bool,
}

fn version_string() -> &'static str {
    let tagged = env!("DIFFSLIDE_TAGGED");
    if tagged == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("DIFFSLIDE_COMMIT");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "diffslide")]
#[command(about = "Before/after comparison renderer and exporter")]
#[command(long_about = "\
Before/after comparison renderer and exporter

Takes two images and produces a comparison in one of several shapes:

  snapshot   PNG at the before image's size, split at --position
  gif        Looping GIF sweeping the divider 0 → 100 → 0
  video      mp4 or webm of the same sweep (needs ffmpeg on PATH)
  embed      Standalone HTML with a draggable slider
  hover      Standalone HTML that reveals the after image on hover
  copy       Slider HTML printed to stdout, size-capped for pasting
  all        Every file export plus manifest.json

Artifacts are written to --output as <stem>-<unix-ms>.<ext>.

Run 'diffslide gen-config' to generate a documented diffslide.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Config file (missing file = defaults)
    #[arg(long, default_value = CONFIG_FILE_NAME, global = true)]
    config: PathBuf,

    /// Output directory
    #[arg(long, default_value = ".", global = true)]
    output: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a still PNG at a fixed split
    Snapshot {
        #[command(flatten)]
        pair: PairArgs,
        /// Split position, 0 (all after) to 100 (all before)
        #[arg(long, default_value_t = 50, value_parser = clap::value_parser!(u8).range(0..=100))]
        position: u8,
    },
    /// Render the looping sweep GIF
    Gif(PairArgs),
    /// Record the sweep as a video
    Video(PairArgs),
    /// Write the interactive slider HTML
    Embed(PairArgs),
    /// Write the hover-reveal HTML
    Hover(PairArgs),
    /// Print the slider HTML to stdout
    Copy(PairArgs),
    /// Run every file export and write manifest.json
    All(PairArgs),
    /// Print a stock diffslide.toml with all options documented
    GenConfig,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return ExitCode::SUCCESS;
    }

    let export_config = match config::load_config(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}: {e}", cli.config.display());
            return ExitCode::FAILURE;
        }
    };
    logging::init_logging(&export_config.logging);
    init_thread_pool(&export_config.processing);

    match run(&cli, ExportEngine::new(export_config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("Error: {message}");
            ExitCode::FAILURE
        }
    }
}

/// Run one export command. The error is already a user-facing message.
fn run(cli: &Cli, engine: ExportEngine) -> Result<(), String> {
    let pair = match &cli.command {
        Command::Snapshot { pair, .. }
        | Command::Gif(pair)
        | Command::Video(pair)
        | Command::Embed(pair)
        | Command::Hover(pair)
        | Command::Copy(pair)
        | Command::All(pair) => pair,
        Command::GenConfig => return Ok(()),
    };
    let (before_path, after_path) = if pair.swap {
        (&pair.after, &pair.before)
    } else {
        (&pair.before, &pair.after)
    };
    let before = load_asset(before_path)?;
    let after = load_asset(after_path)?;

    if let Command::Copy(_) = cli.command {
        let html = engine
            .clipboard(&before, &after)
            .map_err(|e| e.user_message(ExportKind::Clipboard))?;
        let mut stdout = std::io::stdout().lock();
        stdout
            .write_all(html.as_bytes())
            .and_then(|_| stdout.flush())
            .map_err(|e| format!("writing to stdout: {e}"))?;
        return Ok(());
    }

    output::print_inputs(
        (&before, before_path.as_path()),
        (&after, after_path.as_path()),
    );
    println!();

    let kinds: &[ExportKind] = match &cli.command {
        Command::Snapshot { .. } => &[ExportKind::Snapshot],
        Command::Gif(_) => &[ExportKind::Gif],
        Command::Video(_) => &[ExportKind::Video],
        Command::Embed(_) => &[ExportKind::InteractiveEmbed],
        Command::Hover(_) => &[ExportKind::HoverEmbed],
        _ => &[
            ExportKind::Snapshot,
            ExportKind::Gif,
            ExportKind::Video,
            ExportKind::InteractiveEmbed,
            ExportKind::HoverEmbed,
        ],
    };
    let position = match &cli.command {
        Command::Snapshot { position, .. } => SplitPosition::new(*position),
        _ => SplitPosition::default(),
    };

    std::fs::create_dir_all(&cli.output)
        .map_err(|e| format!("creating {}: {e}", cli.output.display()))?;

    let mut saved = Vec::new();
    let mut failures = Vec::new();
    for &kind in kinds {
        let result = match kind {
            ExportKind::Snapshot => engine.snapshot(&before, &after, position),
            ExportKind::Gif => engine.gif(&before, &after),
            ExportKind::Video => engine.video(&before, &after),
            ExportKind::InteractiveEmbed => engine.interactive_embed(&before, &after),
            ExportKind::HoverEmbed => engine.hover_embed(&before, &after),
            ExportKind::Clipboard => continue,
        };
        match result {
            Ok(artifact) => {
                let path = save_artifact(&cli.output, &artifact)?;
                output::print_artifact(saved.len() + 1, &artifact, &path);
                saved.push(SavedArtifact::new(&artifact, path));
            }
            // `all` continues past a failed export
            Err(e) => failures.push(e.user_message(kind)),
        }
    }

    if let Command::All(_) = cli.command {
        let manifest = ExportManifest {
            before: before_path.clone(),
            after: after_path.clone(),
            artifacts: saved.clone(),
        };
        let json = output::format_manifest_json(&manifest).map_err(|e| e.to_string())?;
        let manifest_path = cli.output.join("manifest.json");
        std::fs::write(&manifest_path, json)
            .map_err(|e| format!("writing {}: {e}", manifest_path.display()))?;
    }

    if !saved.is_empty() {
        println!();
        output::print_summary(&saved);
    }
    if failures.is_empty() {
        Ok(())
    } else {
        Err(failures.join("\n"))
    }
}

fn load_asset(path: &Path) -> Result<ImageAsset, String> {
    ImageAsset::open(path).map_err(|e| format!("{}: {e}", path.display()))
}

fn save_artifact(dir: &Path, artifact: &ExportArtifact) -> Result<PathBuf, String> {
    let path = dir.join(&artifact.filename);
    std::fs::write(&path, &artifact.bytes)
        .map_err(|e| format!("writing {}: {e}", path.display()))?;
    Ok(path)
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; the user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
