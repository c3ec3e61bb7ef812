use anyhow::{Context, Result, bail};
use clap::Parser;
use pcb_trace::{Layer, Point2D, TraceError, TraceOptions, TracerKind, trace};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Convert a bitmap image into a KiCad footprint made of filled polygons
#[derive(Parser, Debug)]
#[command(name = "pcb-trace", version, about)]
struct Cli {
    /// Input image (PNG or JPEG)
    image: PathBuf,

    /// Image resolution in dots per inch
    #[arg(long, default_value_t = 2540.0)]
    dpi: f64,

    /// Trace light areas instead of dark ones
    #[arg(long)]
    invert: bool,

    /// Gray level separating light from dark (0-255)
    #[arg(long, default_value_t = 127)]
    threshold: u8,

    /// Target board layer
    #[arg(long, value_enum, default_value_t = Layer::FrontSilkscreen)]
    layer: Layer,

    /// Keep the image's top-left corner at the footprint origin
    #[arg(long)]
    no_center: bool,

    /// Footprint position in millimeters
    #[arg(long, num_args = 2, value_names = ["X", "Y"], allow_negative_numbers = true)]
    at: Option<Vec<f64>>,

    /// Maximum curve flattening error in pixels
    #[arg(long, default_value_t = 0.25)]
    bezier_resolution: f64,

    /// Drop specks of at most this many pixels
    #[arg(long, default_value_t = 0)]
    turd_size: u32,

    /// Contour tracer
    #[arg(long, value_enum, default_value_t = TracerKind::Outline)]
    tracer: TracerKind,

    /// Footprint name
    #[arg(long, default_value = "Graphics")]
    name: String,

    /// Write the footprint here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log every pipeline stage
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn options(&self) -> Result<TraceOptions> {
        let placement = match self.at.as_deref() {
            None => Point2D::default(),
            Some([x, y]) => Point2D::new(*x, *y),
            Some(other) => bail!("--at takes two values, got {}", other.len()),
        };

        Ok(TraceOptions {
            invert: self.invert,
            threshold: self.threshold,
            dpi: self.dpi,
            layer: self.layer,
            center: !self.no_center,
            placement,
            bezier_resolution: self.bezier_resolution,
            turd_size: self.turd_size,
            name: self.name.clone(),
            tracer: self.tracer,
        })
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let options = cli.options()?;
    let img = image::open(&cli.image)
        .with_context(|| format!("Failed to open image file '{}'", cli.image.display()))?;

    let footprint = match trace(&img, &options) {
        Ok(text) => text,
        Err(TraceError::EmptyFootprint) => {
            bail!(
                "'{}' has no {} areas at threshold {}",
                cli.image.display(),
                if options.invert { "light" } else { "dark" },
                options.threshold
            )
        }
        Err(e) => return Err(e).context("Failed to trace image"),
    };

    match &cli.output {
        Some(path) => {
            fs::write(path, format!("{}\n", footprint))
                .with_context(|| format!("Error writing output file '{}'", path.display()))?;
            tracing::info!(output = %path.display(), "footprint written");
        }
        None => println!("{}", footprint),
    }

    Ok(())
}
