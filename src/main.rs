//! pidisplay
//!
//! Card slideshow for a 480x320 SPI LCD with an XPT2046 touch panel.
//!
//! # Usage
//!
//! ```bash
//! # Render cards and start the slideshow
//! pidisplay run
//!
//! # Re-render only some cards
//! pidisplay render --only btc --only clock
//!
//! # Wiring checks
//! pidisplay fill 255 0 0
//! pidisplay show photo.jpg
//! pidisplay touch
//!
//! # Inspect rendered assets
//! pidisplay assets
//!
//! # Write a default configuration file
//! pidisplay config init
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use crc::{Crc, CRC_32_ISO_HDLC};
use image::imageops::FilterType;
use log::{error, info};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;

use pidisplay::cards::CardDeck;
use pidisplay::config::watcher::ConfigWatcher;
use pidisplay::config::{AppConfig, SharedConfig, DEFAULT_CONFIG_FILE, MENU_CARD};
use pidisplay::display::{codec, AssetStore, Blitter, FramebufferWriter, Rgb565};
use pidisplay::input::{open_device, GestureKind, TouchDecoder, TouchReader};
use pidisplay::shutdown;
use pidisplay::slideshow::SlideshowController;

const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Card slideshow for SPI framebuffer LCDs
#[derive(Parser)]
#[command(name = "pidisplay")]
#[command(version = "0.1.0")]
#[command(about = "Card slideshow for SPI framebuffer LCDs with touch navigation")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Render all cards, then run the slideshow until interrupted
    Run,

    /// Render cards to PNG and raw frames
    Render {
        /// Card to render (repeatable; default: every enabled card)
        #[arg(long)]
        only: Vec<String>,
    },

    /// Write one raw frame to the framebuffer
    Blit {
        /// Raw RGB565 frame file
        raw: PathBuf,
    },

    /// Resize any image to the panel and display it
    Show {
        /// Image file (PNG, JPEG, BMP)
        image: PathBuf,
    },

    /// Fill the panel with a solid color
    Fill {
        r: u8,
        g: u8,
        b: u8,

        /// Swap red and blue for BGR panels
        #[arg(long)]
        bgr: bool,
    },

    /// Print classified touch gestures until interrupted
    Touch {
        /// Also hexdump raw evdev records
        #[arg(long)]
        raw: bool,
    },

    /// List configured cards and check their raw frames
    Assets,

    /// Configuration file operations
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Write the default configuration
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logger
    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let path = &cli.config;
    match cli.command {
        Commands::Run => handle_run(path, load_config(path)?),
        Commands::Render { only } => handle_render(&load_config(path)?, &only),
        Commands::Blit { raw } => handle_blit(&load_config(path)?, &raw),
        Commands::Show { image } => handle_show(&load_config(path)?, &image),
        Commands::Fill { r, g, b, bgr } => handle_fill(&load_config(path)?, r, g, b, bgr),
        Commands::Touch { raw } => handle_touch(&load_config(path)?, raw),
        Commands::Assets => handle_assets(&load_config(path)?),
        Commands::Config(cmd) => handle_config(cmd, path),
    }
}

/// Defaults when the file is missing; a file that fails validation is fatal
fn load_config(path: &Path) -> Result<AppConfig> {
    AppConfig::load_or_default(path).with_context(|| format!("Failed to load {}", path.display()))
}

fn asset_store(config: &AppConfig) -> AssetStore {
    AssetStore::new(&config.paths.images, config.panel.panel(), config.panel.dither)
}

fn card_deck(config: &AppConfig, store: AssetStore) -> CardDeck {
    CardDeck::standard(
        store,
        &config.paths.state,
        config.cards.stale_after(),
        config.cards.weather_stale_after(),
    )
}

fn framebuffer(config: &AppConfig) -> FramebufferWriter {
    FramebufferWriter::new(&config.panel.framebuffer, config.panel.panel())
}

fn handle_run(config_path: &Path, config: AppConfig) -> Result<()> {
    let store = asset_store(&config);
    let removed = store.cleanup_orphans();
    if removed > 0 {
        info!("Removed {} orphaned temp files", removed);
    }

    let fb = framebuffer(&config);
    fb.probe()
        .with_context(|| format!("Framebuffer {} unavailable", fb.device().display()))?;

    let calibration = config.touch.calibration()?;
    let device = open_device(&config.touch.device)?;
    let decoder = TouchDecoder::new(
        calibration,
        config.panel.panel(),
        config.touch.gestures.thresholds(),
    );

    let running = Arc::new(AtomicBool::new(true));
    shutdown::install(Arc::clone(&running)).context("Failed to install signal handlers")?;

    let shared = SharedConfig::new(config.slideshow.clone());
    let (tx, rx) = mpsc::channel();
    let deck = card_deck(&config, store.clone());

    let handles = vec![
        TouchReader::new(device, &config.touch.device, decoder, Arc::clone(&running))
            .spawn(tx)
            .context("Failed to start input thread")?,
        ConfigWatcher::new(config_path, shared.clone(), Arc::clone(&running))
            .spawn()
            .context("Failed to start config watcher")?,
        SlideshowController::new(store, fb, deck, shared, rx, Arc::clone(&running))
            .spawn()
            .context("Failed to start slideshow")?,
    ];

    for handle in handles {
        let name = handle.thread().name().unwrap_or("worker").to_string();
        if handle.join().is_err() {
            error!("{} thread panicked", name);
            running.store(false, Ordering::SeqCst);
        }
    }
    info!("Shut down");
    Ok(())
}

fn handle_render(config: &AppConfig, only: &[String]) -> Result<()> {
    let store = asset_store(config);
    store.cleanup_orphans();
    let deck = card_deck(config, store);

    let names: Vec<String> = if only.is_empty() {
        let available = deck.names();
        config
            .slideshow
            .enabled_cards()
            .filter(|c| available.iter().any(|a| a == c))
            .chain(std::iter::once(MENU_CARD))
            .map(String::from)
            .collect()
    } else {
        only.to_vec()
    };

    let mut failed = 0;
    for name in &names {
        match deck.render_card(name, &config.slideshow) {
            Ok(path) => println!("{} {} -> {}", "[OK]".green(), name, path.display()),
            Err(e) => {
                println!("{} {}: {}", "[FAIL]".red().bold(), name, e);
                failed += 1;
            }
        }
    }
    if failed > 0 {
        bail!("{} of {} cards failed to render", failed, names.len());
    }
    Ok(())
}

fn handle_blit(config: &AppConfig, raw: &Path) -> Result<()> {
    let mut fb = framebuffer(config);
    fb.blit(raw)?;
    println!(
        "{} {} -> {}",
        "[OK]".green().bold(),
        raw.display(),
        fb.device().display()
    );
    Ok(())
}

fn handle_show(config: &AppConfig, path: &Path) -> Result<()> {
    let panel = config.panel.panel();
    let image = image::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?
        .resize_exact(panel.width, panel.height, FilterType::Triangle)
        .to_rgb8();
    let frame = codec::encode(&image, config.panel.dither);
    let fb = framebuffer(config);
    fb.write_frame(&frame)?;
    println!(
        "{} {} ({}x{})",
        "[OK]".green().bold(),
        path.display(),
        panel.width,
        panel.height
    );
    Ok(())
}

fn handle_fill(config: &AppConfig, r: u8, g: u8, b: u8, bgr: bool) -> Result<()> {
    let color = if bgr {
        Rgb565::from_bgr(r, g, b)
    } else {
        Rgb565::from_rgb(r, g, b)
    };
    let panel = config.panel.panel();
    let fb = framebuffer(config);
    fb.write_frame(&codec::solid(color, panel.width, panel.height))?;
    println!(
        "{} Filled with ({}, {}, {}) = 0x{:04X}{}",
        "[OK]".green().bold(),
        r,
        g,
        b,
        color.0,
        if bgr { " [BGR]" } else { "" }
    );
    Ok(())
}

fn handle_touch(config: &AppConfig, raw: bool) -> Result<()> {
    let panel = config.panel.panel();
    let device = open_device(&config.touch.device)?;
    let decoder = TouchDecoder::new(
        config.touch.calibration()?,
        panel,
        config.touch.gestures.thresholds(),
    );

    let running = Arc::new(AtomicBool::new(true));
    shutdown::install(Arc::clone(&running)).context("Failed to install signal handlers")?;

    let (tx, rx) = mpsc::channel();
    let handle = TouchReader::new(device, &config.touch.device, decoder, Arc::clone(&running))
        .with_raw_dump(raw)
        .spawn(tx)
        .context("Failed to start input thread")?;

    println!(
        "Reading {} ({}x{}), Ctrl+C to stop",
        config.touch.device.display().to_string().white(),
        panel.width,
        panel.height
    );
    while running.load(Ordering::SeqCst) {
        match rx.recv_timeout(Duration::from_millis(100)) {
            Ok(event) => {
                let kind = match event.kind {
                    GestureKind::Tap => event.kind.as_str().green(),
                    GestureKind::LongPress => event.kind.as_str().yellow(),
                    GestureKind::TwoFingerTap => event.kind.as_str().magenta(),
                    _ => event.kind.as_str().cyan(),
                };
                println!(
                    "{} zone={} ({}, {}) delta=({}, {}) {}ms",
                    kind.bold(),
                    event.zone,
                    event.screen_x,
                    event.screen_y,
                    event.delta_x,
                    event.delta_y,
                    event.duration.as_millis()
                );
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    running.store(false, Ordering::SeqCst);
    if handle.join().is_err() {
        bail!("Input thread panicked");
    }
    println!("\n{}", "Stopped".yellow());
    Ok(())
}

fn handle_assets(config: &AppConfig) -> Result<()> {
    let store = asset_store(config);
    let fb = framebuffer(config);
    let slideshow = &config.slideshow;

    println!("{}", "=".repeat(60));
    println!(
        "{}",
        format!("Assets in {}", store.dir().display()).cyan().bold()
    );
    println!("{}", "=".repeat(60));

    let rows = slideshow
        .order
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(MENU_CARD));
    for card in rows {
        let flag = if card == MENU_CARD {
            "[menu]".dimmed()
        } else if slideshow.is_enabled(card) {
            "[on]".green()
        } else {
            "[off]".dimmed()
        };
        let raw = store.raw_path(card);
        let status = match fb.check(&raw) {
            Ok(len) => {
                let bytes = fs::read(&raw)
                    .with_context(|| format!("Failed to read {}", raw.display()))?;
                format!(
                    "{} {} crc32={:08x}",
                    "[OK]".green(),
                    format_size(len),
                    CRC32.checksum(&bytes)
                )
            }
            Err(e) => format!("{} {}", "[WARN]".yellow(), e),
        };
        println!(
            "  {:<8} {:<6} {:>5}s  {}",
            card.white().bold(),
            flag,
            slideshow.interval_for(card).as_secs(),
            status
        );
    }

    println!("{}", "=".repeat(60));
    println!(
        "Frame size {} ({}x{} RGB565), device {}",
        format_size(config.panel.panel().frame_len()),
        config.panel.width,
        config.panel.height,
        fb.device().display()
    );
    Ok(())
}

fn handle_config(cmd: ConfigCommands, path: &Path) -> Result<()> {
    match cmd {
        ConfigCommands::Init { force } => {
            if path.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }
            AppConfig::save_default(path)?;
            println!("{} Wrote {}", "[OK]".green().bold(), path.display());
        }

        ConfigCommands::Show => {
            print!("{}", load_config(path)?.to_toml()?);
        }
    }
    Ok(())
}

fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
