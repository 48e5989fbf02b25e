use std::io::{BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use wallcraft_core::backend::ipc::IpcBackend;
use wallcraft_core::catalog::CatalogKind;
use wallcraft_core::config::ClientConfig;
use wallcraft_core::context::AppContext;
use wallcraft_core::models::{AiProvider, GenerationStatus, WallpaperMode};
use wallcraft_core::monitors::MonitorSelection;
use wallcraft_core::paths::WallcraftPaths;
use wallcraft_core::settings::SettingsPatch;
use wallcraft_core::trial::{TrialOrchestrator, TRIAL_SECONDS};

#[derive(Parser)]
#[command(name = "wallcraft", about = "Generate desktop wallpapers and try them out")]
struct Cli {
    /// Backend socket, overriding the config file
    #[arg(long, global = true)]
    socket: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a wallpaper
    Generate(GenerateArgs),
    /// Apply an image for a few seconds, keeping it only if confirmed
    Try {
        /// Image to try
        path: PathBuf,
        /// Layout: span, fit, center, crop
        #[arg(long)]
        mode: Option<WallpaperMode>,
    },
    /// Show detected monitors
    Monitors,
    /// Show or change backend settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// List selectable styles, color schemes and categories
    Catalog,
    /// Manage the client config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write a default config file
    Init {
        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the effective config
    Show,
}

#[derive(Args)]
struct GenerateArgs {
    /// Style id, repeatable
    #[arg(long = "style")]
    styles: Vec<String>,
    /// Color scheme id, repeatable
    #[arg(long = "scheme")]
    schemes: Vec<String>,
    /// Legacy category id, repeatable
    #[arg(long = "category")]
    categories: Vec<String>,
    /// Free-text prompt, replaces the style fragments
    #[arg(long)]
    prompt: Option<String>,
    /// Provider for this run: pollinations, openai
    #[arg(long)]
    provider: Option<AiProvider>,
    /// Generation canvas, e.g. 1024x1024
    #[arg(long, value_parser = parse_resolution)]
    size: Option<(u32, u32)>,
    /// Final resolution, overriding monitor detection
    #[arg(long, value_parser = parse_resolution)]
    target: Option<(u32, u32)>,
    /// Monitor index to size for
    #[arg(long)]
    monitor: Option<usize>,
    /// Size for all monitors combined
    #[arg(long, conflicts_with = "monitor")]
    span: bool,
    /// Force upscaling for this run
    #[arg(long, conflicts_with = "no_upscale")]
    upscale: bool,
    /// Skip upscaling for this run
    #[arg(long)]
    no_upscale: bool,
    /// Upscale factor for this run
    #[arg(long)]
    factor: Option<u32>,
    /// Try the result as wallpaper when done
    #[arg(long = "try")]
    try_result: bool,
    /// Layout used with --try
    #[arg(long)]
    mode: Option<WallpaperMode>,
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print current settings
    Show,
    /// Update and save settings
    Set {
        #[arg(long)]
        provider: Option<AiProvider>,
        #[arg(long)]
        api_key: Option<String>,
        /// Remove the stored API key
        #[arg(long, conflicts_with = "api_key")]
        clear_api_key: bool,
        #[arg(long)]
        save_dir: Option<PathBuf>,
        #[arg(long)]
        upscale: Option<bool>,
        #[arg(long)]
        factor: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let paths = WallcraftPaths::new();
    let config = match &paths {
        Ok(paths) => ClientConfig::load_or_default(paths),
        Err(_) => ClientConfig::default(),
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.filter.as_str().into()),
        )
        .init();

    let socket = cli.socket.clone().unwrap_or_else(|| config.socket_path());
    let backend = Arc::new(IpcBackend::new(socket));
    info!(socket = %backend.socket_path().display(), "using backend");
    let mut ctx = AppContext::new(backend);

    match cli.command {
        Commands::Generate(args) => generate(&mut ctx, &config, args).await?,
        Commands::Try { path, mode } => {
            let mode = mode.or(config.generation.wallpaper_mode);
            let mut input = spawn_stdin_reader();
            run_trial(&ctx.trial, &path, mode, &mut input).await?;
        }
        Commands::Monitors => {
            ctx.monitors.detect(ctx.backend.as_ref()).await;
            if let Some(err) = ctx.monitors.error() {
                anyhow::bail!("monitor detection failed: {err}");
            }
            if let Some(layout) = ctx.monitors.layout() {
                for (i, m) in layout.monitors.iter().enumerate() {
                    println!(
                        "{i}: {} {}x{} ({}) at {},{} scale {}{}",
                        m.name,
                        m.width,
                        m.height,
                        m.aspect_ratio(),
                        m.x,
                        m.y,
                        m.scale_factor,
                        if m.is_primary { " [primary]" } else { "" }
                    );
                }
                println!("spanning: {}x{}", layout.total_width, layout.total_height);
            }
        }
        Commands::Settings { action } => {
            ctx.settings.load(ctx.backend.as_ref()).await;
            match action {
                SettingsAction::Show => {}
                SettingsAction::Set {
                    provider,
                    api_key,
                    clear_api_key,
                    save_dir,
                    upscale,
                    factor,
                } => {
                    let patch = SettingsPatch {
                        ai_provider: provider.map(|p| p.settings_key().to_string()),
                        openai_api_key: if clear_api_key {
                            Some(None)
                        } else {
                            api_key.map(Some)
                        },
                        save_directory: save_dir.map(Some),
                        upscale_enabled: upscale,
                        upscale_factor: factor,
                    };
                    if patch.is_empty() {
                        anyhow::bail!("nothing to change");
                    }
                    ctx.settings.update(patch);
                    ctx.settings
                        .save(ctx.backend.as_ref())
                        .await
                        .context("failed to save settings")?;
                }
            }
            let mut shown = ctx.settings.settings().clone();
            if shown.openai_api_key.is_some() {
                shown.openai_api_key = Some("********".into());
            }
            println!("{}", serde_json::to_string_pretty(&shown)?);
        }
        Commands::Config { action } => match action {
            ConfigAction::Init { force } => {
                let paths = paths?;
                let path = ClientConfig::init(&paths, force)?;
                println!("wrote {}", path.display());
            }
            ConfigAction::Show => {
                if let Ok(paths) = &paths {
                    println!("# {}", paths.config_file().display());
                }
                println!("{}", toml::to_string_pretty(&config)?);
            }
        },
        Commands::Catalog => {
            for kind in CatalogKind::ALL {
                let heading = match kind {
                    CatalogKind::Style => "styles",
                    CatalogKind::ColorScheme => "color schemes",
                    CatalogKind::Category => "categories (legacy)",
                };
                println!("{heading}:");
                for entry in kind.entries() {
                    println!("  {:<12} {} {}", entry.id, entry.icon, entry.label);
                }
            }
        }
    }

    Ok(())
}

async fn generate(ctx: &mut AppContext, config: &ClientConfig, args: GenerateArgs) -> Result<()> {
    ctx.initialize().await;
    if let Some(err) = ctx.monitors.error() {
        warn!("monitor detection failed, using fallback resolution: {err}");
    }
    if args.span {
        ctx.monitors.set_selection(MonitorSelection::Spanning);
    }
    if let Some(index) = args.monitor {
        ctx.monitors.select_monitor(index);
    }
    ctx.monitors.set_resolution_override(args.target);

    // per-run overrides, not saved
    let upscale_enabled = match (args.upscale, args.no_upscale) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    };
    ctx.settings.update(SettingsPatch {
        ai_provider: args.provider.map(|p| p.settings_key().to_string()),
        upscale_enabled,
        upscale_factor: args.factor,
        ..SettingsPatch::default()
    });

    let (width, height) = args
        .size
        .unwrap_or((config.generation.width, config.generation.height));
    let request = ctx
        .request_builder()
        .styles(args.styles)
        .color_schemes(args.schemes)
        .categories(args.categories)
        .custom_prompt(args.prompt)
        .size(width, height)
        .build()?;

    if let Err(e) = ctx.generation.listen_progress().await {
        warn!("progress notifications unavailable: {e}");
    }
    let printer = spawn_status_printer(ctx.generation.subscribe());
    let mut input = spawn_stdin_reader();

    ctx.generate(request).await?;
    // status may already carry a late notification; error/result are authoritative
    while let Some(err) = ctx.generation.error() {
        eprintln!("{} failed: {}", err.stage, err.message);
        if !confirm("retry? [y/N] ", &mut input).await {
            printer.abort();
            anyhow::bail!("generation failed");
        }
        ctx.generation.regenerate().await?;
    }
    printer.abort();

    let result = ctx
        .generation
        .result()
        .context("generation finished without a result")?;
    println!(
        "{} ({}x{}{})",
        result.image_path.display(),
        result.final_width,
        result.final_height,
        if result.was_upscaled { ", upscaled" } else { "" }
    );

    if args.try_result {
        let mode = args.mode.or(config.generation.wallpaper_mode);
        run_trial(&ctx.trial, result.path(), mode, &mut input).await?;
    }
    Ok(())
}

async fn run_trial(
    trial: &TrialOrchestrator,
    path: &Path,
    mode: Option<WallpaperMode>,
    input: &mut mpsc::UnboundedReceiver<String>,
) -> Result<()> {
    trial
        .try_wallpaper(path, mode)
        .await
        .context("failed to apply wallpaper")?;
    println!("keep this wallpaper? [y/N] (reverting in {TRIAL_SECONDS}s)");

    let mut state = trial.subscribe();
    loop {
        tokio::select! {
            line = input.recv() => {
                if line.is_some_and(|l| l.trim().eq_ignore_ascii_case("y")) {
                    trial.approve_try();
                    println!("kept");
                } else {
                    trial.cancel_try().await;
                    println!("restored previous wallpaper");
                }
                break;
            }
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = *state.borrow_and_update();
                if !current.active {
                    println!("\nno answer, restoring previous wallpaper");
                    break;
                }
                eprint!("\r{:>2}s left ", current.countdown);
            }
        }
    }

    trial.wait_idle().await;
    Ok(())
}

fn spawn_status_printer(mut status: watch::Receiver<GenerationStatus>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while status.changed().await.is_ok() {
            let current = *status.borrow_and_update();
            eprintln!("[{current}]");
        }
    })
}

/// Read stdin lines on a plain thread; a pending tokio stdin read would keep
/// the runtime from shutting down.
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

async fn confirm(prompt: &str, input: &mut mpsc::UnboundedReceiver<String>) -> bool {
    if !std::io::stdin().is_terminal() {
        return false;
    }
    print!("{prompt}");
    let _ = std::io::stdout().flush();
    input
        .recv()
        .await
        .is_some_and(|l| l.trim().eq_ignore_ascii_case("y"))
}

fn parse_resolution(s: &str) -> std::result::Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s}"))?;
    let width: u32 = w.trim().parse().map_err(|e| format!("bad width {w}: {e}"))?;
    let height: u32 = h.trim().parse().map_err(|e| format!("bad height {h}: {e}"))?;
    if width == 0 || height == 0 {
        return Err(format!("resolution must be non-zero, got {s}"));
    }
    Ok((width, height))
}
