use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use photomark::batch::{BatchOptions, BatchScheduler, CancelOutcome, FnObserver};
use photomark::config::AppConfig;
use photomark::font::FontRegistry;
use photomark::imaging::{is_supported_format, OutputFormat, ResizeSpec};
use photomark::watermark::{
    Position, RgbColor, TemplateStore, WatermarkKind, WatermarkSpec, Watermarker,
};

/// Photomark - text and image watermarks for photographs
#[derive(Parser, Debug)]
#[command(name = "photomark")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Watermark a single image
    Apply {
        /// Source image
        input: PathBuf,

        /// Destination file
        output: PathBuf,

        #[command(flatten)]
        watermark: WatermarkArgs,

        #[command(flatten)]
        encode: EncodeArgs,
    },

    /// Watermark many images in the background
    Batch {
        /// Source images or directories containing them
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output directory
        #[arg(short, long)]
        output_dir: PathBuf,

        /// Prepended to each output file name
        #[arg(long)]
        prefix: Option<String>,

        /// Appended to each output file stem
        #[arg(long)]
        suffix: Option<String>,

        #[command(flatten)]
        watermark: WatermarkArgs,

        #[command(flatten)]
        encode: EncodeArgs,
    },

    /// Manage saved watermark templates
    #[command(subcommand)]
    Template(TemplateCommand),
}

#[derive(Subcommand, Debug)]
enum TemplateCommand {
    /// Save a watermark as a named template
    Save {
        name: String,

        #[arg(short, long, default_value = "")]
        description: String,

        #[command(flatten)]
        watermark: WatermarkArgs,
    },
    /// Print a template as JSON
    Show { name: String },
    /// List templates, newest first
    List,
    /// Delete a template
    Delete { name: String },
    /// Rename a template
    Rename { old_name: String, new_name: String },
}

#[derive(Args, Debug)]
struct WatermarkArgs {
    /// Use a saved template
    #[arg(long, conflicts_with_all = ["spec", "text", "image"])]
    template: Option<String>,

    /// Read the watermark from a JSON or YAML file
    #[arg(long, conflicts_with_all = ["text", "image"])]
    spec: Option<PathBuf>,

    /// Watermark text
    #[arg(long, conflicts_with = "image")]
    text: Option<String>,

    /// Watermark image file
    #[arg(long)]
    image: Option<PathBuf>,

    /// Font family name or font file path
    #[arg(long)]
    font: Option<String>,

    #[arg(long, default_value_t = 24)]
    font_size: u32,

    /// Text color as #RGB or #RRGGBB
    #[arg(long, default_value = "#FFFFFF")]
    color: RgbColor,

    #[arg(long)]
    shadow: bool,

    #[arg(long)]
    stroke: bool,

    /// Scale factor for image watermarks
    #[arg(long, default_value_t = 1.0)]
    scale: f32,

    /// Anchor name (e.g. bottom-right) or x,y offset
    #[arg(long, default_value = "bottom-right")]
    position: Position,

    /// Counter-clockwise rotation in degrees
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    rotation: f32,

    /// Opacity from 0 to 100
    #[arg(long, default_value_t = 50)]
    opacity: u8,

    /// Repeat the watermark across the image
    #[arg(long)]
    tile: bool,

    /// Gap between tiles in pixels
    #[arg(long, default_value_t = 50)]
    spacing: u32,
}

#[derive(Args, Debug)]
struct EncodeArgs {
    /// Output format (png, jpeg, bmp, tiff, webp)
    #[arg(short, long)]
    format: Option<OutputFormat>,

    /// Quality for lossy formats, 1-100
    #[arg(short, long)]
    quality: Option<u8>,

    /// Resize to this width after watermarking
    #[arg(long)]
    width: Option<u32>,

    /// Resize to this height after watermarking
    #[arg(long)]
    height: Option<u32>,

    /// Resize by percentage; overrides width and height
    #[arg(long)]
    percentage: Option<f32>,
}

impl EncodeArgs {
    fn resize(&self) -> ResizeSpec {
        ResizeSpec {
            width: self.width,
            height: self.height,
            percentage: self.percentage,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::from_file(path)
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => AppConfig::default(),
    };
    config.validate().map_err(anyhow::Error::msg)?;

    photomark::logging::init_subscriber(&config.logging).map_err(anyhow::Error::msg)?;

    tracing::debug!(
        config_file = ?cli.config,
        output_format = %config.output.format,
        "Configuration loaded"
    );

    match cli.command {
        Command::Apply {
            input,
            output,
            watermark,
            encode,
        } => {
            let spec = build_spec(&watermark, &config)?;
            let watermarker = watermarker(&config);
            let format = encode
                .format
                .or_else(|| OutputFormat::from_path(&output).ok())
                .unwrap_or(config.output.format);
            let quality = encode.quality.unwrap_or(config.output.quality);

            let (width, height) = watermarker
                .apply_file(&input, &output, &spec, format, quality, &encode.resize())
                .with_context(|| format!("Failed to watermark {}", input.display()))?;
            println!("{} ({}x{})", output.display(), width, height);
        }
        Command::Batch {
            inputs,
            output_dir,
            prefix,
            suffix,
            watermark,
            encode,
        } => {
            let spec = build_spec(&watermark, &config)?;
            let options = BatchOptions::new(output_dir)
                .with_format(encode.format.unwrap_or(config.output.format))
                .with_quality(encode.quality.unwrap_or(config.output.quality))
                .with_rename(
                    prefix.unwrap_or_else(|| config.output.prefix.clone()),
                    suffix.unwrap_or_else(|| config.output.suffix.clone()),
                )
                .with_resize(encode.resize());
            run_batch(&config, collect_sources(&inputs)?, &spec, &options)?;
        }
        Command::Template(command) => run_template(command, &config)?,
    }

    Ok(())
}

fn watermarker(config: &AppConfig) -> Watermarker {
    let fonts = FontRegistry::new(config.fonts.to_registry_config());
    Watermarker::new(Arc::new(fonts))
}

fn build_spec(args: &WatermarkArgs, config: &AppConfig) -> anyhow::Result<WatermarkSpec> {
    let spec = if let Some(name) = &args.template {
        TemplateStore::open(&config.templates.dir)?.load(name)?.watermark
    } else if let Some(path) = &args.spec {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&content)?,
            _ => serde_yaml::from_str(&content)?,
        }
    } else {
        let mut spec = match (&args.text, &args.image) {
            (Some(text), _) => WatermarkSpec::text(text.clone()),
            (None, Some(image)) => WatermarkSpec::image(image.clone()),
            (None, None) => bail!("one of --template, --spec, --text or --image is required"),
        };
        match &mut spec.kind {
            WatermarkKind::Text(text) => {
                text.font_name = args.font.clone();
                text.font_size = args.font_size;
                text.font_color = args.color;
                text.has_shadow = args.shadow;
                text.has_stroke = args.stroke;
            }
            WatermarkKind::Image(image) => image.scale = args.scale,
        }
        let spec = spec
            .with_position(args.position)
            .with_rotation(args.rotation)
            .with_opacity(args.opacity);
        if args.tile {
            spec.with_tiling(args.spacing)
        } else {
            spec
        }
    };

    spec.validate()?;
    Ok(spec)
}

/// Expand directories into their supported images, sorted by name.
fn collect_sources(inputs: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    let mut sources = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut found = std::fs::read_dir(input)
                .with_context(|| format!("Failed to read directory {}", input.display()))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| path.is_file() && is_supported_format(path))
                .collect::<Vec<_>>();
            found.sort();
            sources.extend(found);
        } else {
            sources.push(input.clone());
        }
    }
    Ok(sources)
}

fn run_batch(
    config: &AppConfig,
    sources: Vec<PathBuf>,
    spec: &WatermarkSpec,
    options: &BatchOptions,
) -> anyhow::Result<()> {
    let interrupted = Arc::new(AtomicBool::new(false));
    #[cfg(unix)]
    {
        use signal_hook::consts::{SIGINT, SIGTERM};
        signal_hook::flag::register(SIGINT, Arc::clone(&interrupted))?;
        signal_hook::flag::register(SIGTERM, Arc::clone(&interrupted))?;
    }

    let scheduler =
        BatchScheduler::new(watermarker(config)).with_cancel_timeout(config.batch.cancel_timeout());
    let observer = FnObserver::new()
        .on_progress(|percent, path| println!("[{:>3}%] {}", percent, display_name(path)))
        .on_error(|message, path| eprintln!("error: {}: {}", display_name(path), message));

    scheduler.start_with(sources, spec, options, Arc::new(observer))?;

    while scheduler.is_processing() {
        if interrupted.load(Ordering::Relaxed) {
            match scheduler.cancel() {
                CancelOutcome::Stopped(summary) => {
                    eprintln!(
                        "Cancelled after {} of {} images",
                        summary.processed_count, summary.total_count
                    );
                }
                CancelOutcome::TimedOut => eprintln!("Cancelled; current image abandoned"),
                CancelOutcome::NotRunning => {}
            }
            std::process::exit(130);
        }
        thread::sleep(Duration::from_millis(100));
    }

    let summary = scheduler.wait().context("Batch finished without a summary")?;
    println!(
        "Processed {} of {} images ({} failed)",
        summary.processed_count, summary.total_count, summary.failed_count
    );
    if summary.failed_count > 0 {
        bail!("{} images failed", summary.failed_count);
    }
    Ok(())
}

fn run_template(command: TemplateCommand, config: &AppConfig) -> anyhow::Result<()> {
    let store = TemplateStore::open(&config.templates.dir)?;
    match command {
        TemplateCommand::Save {
            name,
            description,
            watermark,
        } => {
            let spec = build_spec(&watermark, config)?;
            let stored = store.save(&name, &spec, &description)?;
            println!("{}", stored);
        }
        TemplateCommand::Show { name } => println!("{}", store.load(&name)?.to_json()?),
        TemplateCommand::List => {
            for info in store.list()? {
                println!(
                    "{}\t{}\t{}",
                    info.name,
                    info.created_at.format("%Y-%m-%d %H:%M:%S"),
                    info.description
                );
            }
        }
        TemplateCommand::Delete { name } => store.delete(&name)?,
        TemplateCommand::Rename { old_name, new_name } => {
            println!("{}", store.rename(&old_name, &new_name)?);
        }
    }
    Ok(())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
