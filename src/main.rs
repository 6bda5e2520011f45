use clap::{Parser, ValueEnum};
use maskscore::{
    annotation_from_image, imread, overlay_image, reference_from_image, LuminanceWeights,
    MaskOverlapScorer, ResizeFilter, ScoreConfig, SizePolicy,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "maskscore")]
#[command(about = "Dice overlap between a drawn annotation and a ground-truth mask", long_about = None)]
struct Cli {
    /// Annotation image (alpha channel, or brightest channel, is the stroke)
    annotation: PathBuf,

    /// Ground-truth mask image
    reference: PathBuf,

    /// JSON scoring config; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// What to do when the two images differ in size
    #[arg(long, value_enum)]
    policy: Option<Policy>,

    /// Resampling filter for the resize policy
    #[arg(long, value_enum)]
    filter: Option<Filter>,

    /// Weights used to reduce a colour mask to luminance
    #[arg(long, value_enum)]
    luminance: Option<Luminance>,

    /// Write a colour-coded overlap image here
    #[arg(long)]
    overlay: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Policy {
    /// Fail when sizes differ
    Reject,
    /// Resample the annotation onto the reference grid
    ResizeAnnotation,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Filter {
    Nearest,
    Bilinear,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Luminance {
    Bt601,
    Bt709,
    Average,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum OutputFormat {
    /// JSON output with full details
    Json,
    /// Dice score only
    Text,
    /// TSV format: dice\tjaccard\tintersection\tannotation_area\treference_area
    Tsv,
}

fn build_config(cli: &Cli) -> Result<ScoreConfig, Box<dyn std::error::Error>> {
    let mut cfg = match &cli.config {
        Some(path) => ScoreConfig::from_json_file(path)?,
        None => ScoreConfig::default(),
    };
    if let Some(p) = cli.policy {
        cfg.size_policy = match p {
            Policy::Reject => SizePolicy::Reject,
            Policy::ResizeAnnotation => SizePolicy::ResizeAnnotation,
        };
    }
    if let Some(f) = cli.filter {
        cfg.filter = match f {
            Filter::Nearest => ResizeFilter::Nearest,
            Filter::Bilinear => ResizeFilter::Bilinear,
        };
    }
    if let Some(l) = cli.luminance {
        cfg.luminance = match l {
            Luminance::Bt601 => LuminanceWeights::Bt601,
            Luminance::Bt709 => LuminanceWeights::Bt709,
            Luminance::Average => LuminanceWeights::Average,
        };
    }
    Ok(cfg)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let cfg = build_config(&cli)?;
    log::debug!("scoring config: {:?}", cfg);
    let scorer = MaskOverlapScorer::new(cfg)?;

    // Load images
    let annotation = annotation_from_image(&imread(&cli.annotation)?)?;
    let reference = reference_from_image(&imread(&cli.reference)?)?;
    log::info!(
        "annotation {:?} {}x{}, reference {:?} {}x{}",
        cli.annotation,
        annotation.width(),
        annotation.height(),
        cli.reference,
        reference.width(),
        reference.height()
    );

    let report = scorer.report(&annotation, &reference)?;

    if let Some(path) = &cli.overlay {
        let (a, r) = scorer.binarize(&annotation, &reference)?;
        overlay_image(&a, &r)?.save(path)?;
        log::info!("overlay written to {:?}", path);
    }

    // Output results
    match cli.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            println!("{:.4}", report.dice);
        }
        OutputFormat::Tsv => {
            println!(
                "{:.4}\t{:.4}\t{}\t{}\t{}",
                report.dice,
                report.jaccard,
                report.intersection,
                report.annotation_area,
                report.reference_area
            );
        }
    }

    Ok(())
}
