use scene_review::app::ReviewApp;
use scene_review::cli::Args;
use scene_review::config::{self, Settings};
use scene_review::detect::{BoundaryDetector, SceneDetectCli};
use scene_review::player::Player;
use scene_review::ui::CosmicTextRenderer;

use anyhow::{Context, Result};
use clap::Parser;
use eframe::egui;
use log::{debug, error, info};

fn init_logging(args: &Args, path_config: &config::PathConfig) -> Result<()> {
    // 0 (default) = warn, 1 (-v) = info, 2 (-vv) = debug, 3+ (-vvv) = trace
    let log_level = match args.verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    if let Some(log_path_opt) = &args.log_file {
        let log_path = log_path_opt
            .clone()
            .unwrap_or_else(|| config::data_file(config::LOG_FILE, path_config));
        let file = std::fs::File::create(&log_path)
            .with_context(|| format!("Failed to create log file: {}", log_path.display()))?;

        env_logger::Builder::new()
            .filter_level(log_level)
            .filter_module("egui", log::LevelFilter::Info) // Suppress egui DEBUG spam
            .filter_module("eframe", log::LevelFilter::Info)
            .format_timestamp_millis()
            .target(env_logger::Target::Pipe(Box::new(file)))
            .init();

        info!("Logging to file: {} (level: {:?})", log_path.display(), log_level);
    } else {
        // Console logging, respects RUST_LOG if set
        let default_level = match args.verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
            .filter_module("egui", log::LevelFilter::Info)
            .filter_module("eframe", log::LevelFilter::Info)
            .format_timestamp_millis()
            .init();
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let path_config = config::PathConfig::from_env_and_cli(args.config_dir.clone());
    if let Err(e) = config::ensure_dirs(&path_config) {
        eprintln!("Warning: Failed to create application directories: {:#}", e);
    }
    init_logging(&args, &path_config)?;

    info!("scene-review {} starting...", env!("CARGO_PKG_VERSION"));
    debug!("Command-line args: {:?}", args);

    #[cfg(feature = "ffmpeg")]
    playa_ffmpeg::init().context("Failed to initialize FFmpeg")?;

    let settings_path = config::config_file(config::SETTINGS_FILE, &path_config);
    let mut settings = Settings::load(&settings_path);
    args.apply_to(&mut settings);
    if args.save_config {
        settings.save(&settings_path)?;
    }

    let detector: Option<Box<dyn BoundaryDetector>> = if args.no_index {
        None
    } else {
        Some(Box::new(SceneDetectCli::new(settings.scenedetect_path.clone(), settings.detector)))
    };

    let mut player = Player::new(settings.clone(), Box::new(CosmicTextRenderer), detector);
    let mut pending_audio = args.audio.clone();
    if let Some(video) = &args.video {
        info!("Input video: {}", video.display());
        match player.load(video, args.audio.as_deref()) {
            Ok(()) => {
                pending_audio = None;
                if args.autoplay {
                    player.play();
                }
            }
            Err(e) => {
                error!("{:#}", e);
                player.set_error(format!("{:#}", e));
            }
        }
    }

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(format!("{} v{}", settings.window_title, env!("CARGO_PKG_VERSION")))
            .with_inner_size([settings.window_width as f32, settings.window_height as f32])
            .with_resizable(true)
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "scene-review",
        native_options,
        Box::new(move |_cc| Ok(Box::new(ReviewApp::new(player, pending_audio)))),
    )
    .map_err(|e| anyhow::anyhow!("eframe error: {}", e))
}
