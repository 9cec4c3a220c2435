//! Holdfast batch driver
//!
//! ```text
//! holdfast [BATCH.ron] [--out DIR] [--step] [--stl] [--preview] [--loop]
//! ```
//!
//! Without a batch file the shipped presets are built. `--preview` builds
//! with the 2.5D preview kernel, which writes STL but no STEP.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use hf_cad::{CadKernel, PreviewKernel, default_kernel};
use hf_core::{
    Batch, BuildSettings, ExportFormat, ExportOptions, GridBinProvider, Sweep, run_batch,
};

/// Build and export gridfinity holders and spacers
#[derive(Parser, Debug)]
#[command(name = "holdfast")]
#[command(about = "Build and export gridfinity holders and spacers", long_about = None)]
#[command(version)]
struct Args {
    /// Batch file to build; the shipped presets when omitted
    batch: Option<PathBuf>,

    /// Output directory
    #[arg(long, default_value = "out")]
    out: PathBuf,

    /// Write STEP files
    #[arg(long)]
    step: bool,

    /// Write STL files
    #[arg(long)]
    stl: bool,

    /// Build with the preview kernel
    #[arg(long)]
    preview: bool,

    /// Also build the bit spacer and bend gauge sweeps
    #[arg(short = 'l', long = "loop")]
    sweep: bool,
}

impl Args {
    /// Requested formats; STL for the preview kernel and STEP otherwise when none is given
    fn formats(&self) -> Vec<ExportFormat> {
        let mut formats = Vec::new();
        if self.step {
            formats.push(ExportFormat::Step);
        }
        if self.stl {
            formats.push(ExportFormat::Stl);
        }
        if formats.is_empty() {
            formats.push(if self.preview {
                ExportFormat::Stl
            } else {
                ExportFormat::Step
            });
        }
        formats
    }
}

fn main() -> ExitCode {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "holdfast=info,hf_core=info,hf_cad=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let batch = match &args.batch {
        Some(path) => Batch::load(path),
        None => hf_core::presets::batch(BuildSettings::default()),
    };
    let mut batch = match batch {
        Ok(batch) => batch,
        Err(e) => {
            tracing::error!("Failed to load batch: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if args.sweep {
        batch.sweeps.push(Sweep::bit_spacers());
        batch.sweeps.push(Sweep::bend_gauges());
    }

    let kernel: Box<dyn CadKernel> = if args.preview {
        Box::new(PreviewKernel::new())
    } else {
        default_kernel()
    };
    if !kernel.is_available() {
        tracing::warn!(
            "CAD kernel '{}' is not available, run with --preview for STL output",
            kernel.name()
        );
    }
    tracing::info!(
        "Building {} parts and {} sweeps with the {} kernel",
        batch.entries.len(),
        batch.sweeps.len(),
        kernel.name()
    );

    let mut export = ExportOptions::new(args.out.clone());
    export.formats = args.formats();
    export.tolerance = batch.settings.export_tolerance;

    let provider = GridBinProvider::new(&batch.settings);
    let report = run_batch(kernel.as_ref(), &provider, &batch, Some(&export));

    for (name, err) in report.failures() {
        eprintln!("{}: {}", name, err);
    }
    if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
