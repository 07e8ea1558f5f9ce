// HIVE Surrogate Inference CLI
//
// Runs the full reconstruction pipeline offline: load the trained model
// bundle, evaluate the surrogate over the pulse time grid, write the
// time-series data and the final field snapshot, and optionally hand the
// snapshot to the external scene renderer.

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

use hive_surrogate::*;

/// CLI arguments for the surrogate inference pipeline
#[derive(Parser, Debug)]
#[command(name = "infer")]
#[command(about = "Reconstruct HIVE temperature fields from the trained surrogate", long_about = None)]
struct Args {
    /// Directory holding the model bundle (xgb_model.json,
    /// pod_weights_truncated.npz, config.json)
    #[arg(short, long, default_value = "tmp_data")]
    model_dir: PathBuf,

    /// Physical parameter values, one per configured uncertain parameter,
    /// in config order. Defaults to each prior's midpoint.
    #[arg(short, long = "param")]
    params: Vec<f64>,

    /// Number of POD modes to use in the reconstruction
    #[arg(short, long, default_value_t = 4, value_parser = clap::value_parser!(u8).range(1..=16))]
    num_modes: u8,

    /// First evaluated time [s]
    #[arg(long, default_value_t = 5.0)]
    time_start: f64,

    /// Last evaluated time [s], inclusive
    #[arg(long, default_value_t = 60.0)]
    time_end: f64,

    /// Time step [s]
    #[arg(long, default_value_t = 5.0)]
    time_step: f64,

    /// Output directory for the time series and field files
    #[arg(short, long, default_value = "out")]
    output: PathBuf,

    /// Spatial template file (legacy ASCII VTK); when given, the final
    /// field snapshot is written into a copy of it
    #[arg(short, long)]
    template: Option<PathBuf>,

    /// External scene renderer executable; when given together with
    /// --template, it is invoked on the written field file
    #[arg(short, long)]
    renderer: Option<PathBuf>,

    /// Field name shown on the rendered scale bar
    #[arg(long, default_value = "Temperature [K]")]
    field_name: String,
}

/// Run manifest written alongside the time series
#[derive(Debug, Serialize)]
struct RunManifest {
    num_modes: usize,
    parameters: Vec<ParameterValue>,
    times: Vec<f64>,
    max_values: Vec<f64>,
    peak_time: f64,
    peak_value: f64,
}

#[derive(Debug, Serialize)]
struct ParameterValue {
    label: String,
    value: f64,
}

/// Resolve parameter values: explicit overrides in config order, or the
/// prior midpoints when none are given
fn resolve_parameters(
    specs: &[ParameterSpec],
    overrides: &[f64],
) -> Result<Vec<f64>, String> {
    if overrides.is_empty() {
        return Ok(specs.iter().map(|s| s.midpoint()).collect());
    }
    if overrides.len() != specs.len() {
        return Err(format!(
            "got {} --param values but the config declares {} uncertain parameters",
            overrides.len(),
            specs.len()
        ));
    }
    for (spec, &value) in specs.iter().zip(overrides) {
        if value < spec.min || value > spec.max {
            return Err(format!(
                "parameter '{}' value {value} outside prior support [{}, {}]",
                spec.label, spec.min, spec.max
            ));
        }
    }
    Ok(overrides.to_vec())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // One-time setup: verify the model bundle is complete before touching it
    let artifacts = ensure_artifacts(&args.model_dir)?;

    // Uncertain-parameter bounds from the UQ campaign config
    let specs = parse_parameters(&artifacts.config)?;
    let parameters = resolve_parameters(&specs, &args.params)?;

    let grid = TimeGrid::new(args.time_start, args.time_end, args.time_step)?;
    let num_modes = args.num_modes as usize;

    println!("\nHIVE Surrogate Inference");
    println!("=======================================");
    println!("  Model bundle: {}", args.model_dir.display());
    println!("  POD modes: {num_modes}");
    println!(
        "  Time grid: {} to {} s, step {} s ({} points)",
        grid.start,
        grid.end,
        grid.step,
        grid.len()
    );
    for (spec, value) in specs.iter().zip(&parameters) {
        println!("  {}: {value} (prior [{}, {}])", spec.label, spec.min, spec.max);
    }
    println!("=======================================\n");

    // Load both artifacts; any shape inconsistency aborts here
    let model = SurrogateReconstructor::from_files(&artifacts.regressor, &artifacts.basis)?;
    println!(
        "Loaded surrogate: {} modes x {} spatial points, {} trees",
        model.basis().num_modes(),
        model.basis().num_points(),
        model.regressor().trees.len()
    );

    // Evaluate the pulse
    println!("Reconstructing pulse...");
    let pb = ProgressBar::new(grid.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} time points")?,
    );

    let series = model.time_series_with_progress(
        &grid,
        &parameters,
        num_modes,
        max_reduction,
        |done| pb.set_position(done),
    )?;
    pb.finish_with_message("pulse reconstructed");

    // A validated grid is never empty, so the peak always exists
    let (peak_time, peak_value) = series
        .peak()
        .ok_or("time series is empty")?;

    // Write outputs
    fs::create_dir_all(&args.output)?;
    println!("\nWriting files...");

    let manifest = RunManifest {
        num_modes,
        parameters: specs
            .iter()
            .zip(&parameters)
            .map(|(spec, &value)| ParameterValue {
                label: spec.label.clone(),
                value,
            })
            .collect(),
        times: series.times.clone(),
        max_values: series.values.clone(),
        peak_time,
        peak_value,
    };
    let series_path = args.output.join("timeseries.json");
    fs::write(&series_path, serde_json::to_string_pretty(&manifest)?)?;
    println!("  Wrote time series: {}", series_path.display());

    if let Some(template) = &args.template {
        let field_path = args.output.join("temp_field.vtk");
        field_io::write_field(
            &args.field_name,
            series.snapshot.as_slice().ok_or("snapshot not contiguous")?,
            template,
            &field_path,
        )?;
        println!("  Wrote field snapshot: {}", field_path.display());

        if let Some(renderer) = &args.renderer {
            let scene_path = args.output.join("field.html");
            field_io::render_scene(renderer, &field_path, &scene_path, &args.field_name)?;
            println!("  Wrote rendered scene: {}", scene_path.display());
        }
    } else if args.renderer.is_some() {
        println!("  Note: --renderer ignored without --template");
    }

    // Summary
    println!("\nStatistics:");
    println!("  Time points: {}", series.len());
    println!("  Peak max temperature: {peak_value:.2} at t = {peak_time} s");
    println!("\nInference complete.");
    println!("Output: {}\n", args.output.display());

    Ok(())
}
