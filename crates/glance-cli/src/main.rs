use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use glance_core::capture::crop_face;
use glance_core::enroll;
use glance_core::infer::{call_with_timeout, DETECT_TIMEOUT, RECOGNIZE_TIMEOUT};
use glance_core::{Config, Detector, EuclideanMatcher, FaceStore, Frame, Matcher, Recognizer};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "glance", about = "Presence tracker enrollment and diagnostics")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture reference images for a new identity and relearn the store
    Enroll {
        /// Person name (also the reference-image directory name)
        #[arg(short, long)]
        name: String,
        /// Number of reference images to capture
        #[arg(short, long, default_value_t = enroll::DEFAULT_CAPTURES)]
        captures: usize,
    },
    /// Rebuild the known-face store from the reference images on disk
    Relearn,
    /// List the identities in the known-face store
    List,
    /// Run detection and recognition over a single image file
    Identify {
        /// Image to identify faces in
        image: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();
    let ctx = config.build_context()?;

    match cli.command {
        Commands::Enroll { name, captures } => {
            enroll::capture_identity(&ctx, &name, captures)?;
            enroll::relearn_all(&ctx)?;
            println!("Enrolled {name}.");
        }
        Commands::Relearn => {
            enroll::relearn_all(&ctx)?;
            let store = FaceStore::load(&ctx.store_path)?;
            println!("Store rebuilt with {} entries.", store.len());
        }
        Commands::List => {
            let store = FaceStore::load(&ctx.store_path)
                .context("no readable known-face store; run `glance enroll` first")?;
            if store.is_empty() {
                println!("Store is empty.");
            }
            let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
            for name in store.names() {
                *counts.entry(name.as_str()).or_default() += 1;
            }
            for (name, count) in counts {
                let plural = if count == 1 { "" } else { "s" };
                println!("{name}  ({count} reference image{plural})");
            }
        }
        Commands::Identify { image } => {
            let names = identify(&ctx, &image)?;
            if names.is_empty() {
                println!("No faces detected.");
            }
            for name in names {
                println!("{name}");
            }
        }
    }

    Ok(())
}

/// One-shot recognition over an image file: every detected face is
/// printed, `unknown` included.
fn identify(ctx: &glance_core::Context, path: &Path) -> Result<Vec<String>> {
    let store = FaceStore::load(&ctx.store_path)?;

    let image = image::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?
        .to_luma8();
    let (width, height) = image.dimensions();
    let frame = Frame::new(image.into_raw(), width, height)?;

    let detector = Arc::clone(&ctx.detector);
    let detect_frame = frame.clone();
    let detections = call_with_timeout(move || detector.detect(&detect_frame), DETECT_TIMEOUT)?;

    let matcher = EuclideanMatcher;
    let mut names = Vec::new();
    for bbox in &detections {
        let crop = crop_face(&frame, bbox)?;
        let recognizer = Arc::clone(&ctx.recognizer);
        let embedding = call_with_timeout(move || recognizer.embed(&crop), RECOGNIZE_TIMEOUT)?;
        names.push(matcher.name_for(&embedding, &store).to_string());
    }
    Ok(names)
}
