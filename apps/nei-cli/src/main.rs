use clap::{Parser, Subcommand};
use nei_app::{
    AppError, AppResult, EquilibriumRequest, RunOptions, RunProgressEvent, RunRequest,
    RunTimingSummary, case_service, query, run_service,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "nei")]
#[command(about = "Non-equilibrium ionization simulator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a case file
    Validate {
        /// Path to the case file (YAML or JSON)
        case_path: PathBuf,
    },
    /// Run a case, reusing a cached result when one exists
    Run {
        /// Path to the case file
        case_path: PathBuf,
        /// Skip cache and force re-run
        #[arg(long)]
        no_cache: bool,
    },
    /// List stored runs of a case
    Runs {
        /// Path to the case file
        case_path: PathBuf,
    },
    /// Show details of a stored run
    ShowRun {
        /// Path to the case file
        case_path: PathBuf,
        /// Run ID to display
        run_id: String,
    },
    /// Export one time series of a run as CSV
    ExportSeries {
        /// Path to the case file
        case_path: PathBuf,
        /// Run ID
        run_id: String,
        /// Element symbol, or `global`
        target: String,
        /// Variable (e.g. fraction_2, density_0, mean_charge, electron_density)
        variable: String,
        /// Output CSV file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print equilibrium ionic fractions for every element of a case
    Equilibrium {
        /// Path to the case file
        case_path: PathBuf,
        /// Electron temperature in K
        #[arg(long, conflicts_with = "time_s")]
        temperature_k: Option<f64>,
        /// Time in s at which to read the case's temperature
        #[arg(long)]
        time_s: Option<f64>,
    },
}

fn main() -> AppResult<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { case_path } => cmd_validate(&case_path),
        Commands::Run {
            case_path,
            no_cache,
        } => cmd_run(&case_path, !no_cache),
        Commands::Runs { case_path } => cmd_runs(&case_path),
        Commands::ShowRun { case_path, run_id } => cmd_show_run(&case_path, &run_id),
        Commands::ExportSeries {
            case_path,
            run_id,
            target,
            variable,
            output,
        } => cmd_export_series(&case_path, &run_id, &target, &variable, output.as_deref()),
        Commands::Equilibrium {
            case_path,
            temperature_k,
            time_s,
        } => cmd_equilibrium(
            &case_path,
            EquilibriumRequest {
                temperature_k,
                time_s,
            },
        ),
    }
}

fn cmd_validate(case_path: &Path) -> AppResult<()> {
    println!("Validating case: {}", case_path.display());
    let case = case_service::load_case(case_path)?;
    let summary = case_service::summarize_case(&case);
    println!("✓ Case is valid: {}", summary.name);
    println!(
        "  Elements: {}{}",
        summary.elements.join(", "),
        if summary.explicit_fractions {
            " (explicit fractions)"
        } else {
            " (equilibrium start)"
        }
    );
    println!("  Temperature: {}", summary.temperature);
    println!("  Density: {}", summary.density);
    println!("  Steps: {}", summary.max_steps);
    println!("  Rate model: {}", summary.rate_model);
    Ok(())
}

fn cmd_run(case_path: &Path, use_cache: bool) -> AppResult<()> {
    println!("Running case: {}", case_path.display());

    let request = RunRequest {
        case_path,
        options: RunOptions {
            use_cache,
            ..RunOptions::default()
        },
    };

    let result = run_service::ensure_run_with_progress(
        &request,
        Some(&mut |event| render_cli_progress(&event)),
    );
    clear_progress_line();

    let response = match result {
        Ok(response) => response,
        Err(AppError::RunFailed {
            run_id,
            columns,
            message,
        }) => {
            println!("✗ Run failed: {message}");
            println!("  Partial result stored as {run_id} ({columns} columns)");
            return Err(AppError::RunFailed {
                run_id,
                columns,
                message,
            });
        }
        Err(err) => return Err(err),
    };

    if response.loaded_from_cache {
        println!("✓ Loaded from cache: {}", response.run_id);
    } else {
        println!("✓ Simulation completed: {}", response.run_id);
    }
    print_timing_summary(&response.timing);

    let (_manifest, records) = run_service::load_run(case_path, &response.run_id)?;
    let summary = query::get_run_summary(&records)?;
    println!("  Columns: {}", summary.record_count);
    println!(
        "  Final T_e = {:.4e} K, n_e = {:.4e} cm^-3",
        summary.final_electron_temperature_k, summary.final_electron_density_cm3
    );
    Ok(())
}

fn clear_progress_line() {
    print!("\r{}\r", " ".repeat(80));
    let _ = io::stdout().flush();
}

fn render_cli_progress(event: &RunProgressEvent) {
    debug!(stage = event.stage.label(), elapsed_s = event.elapsed_wall_s);
    let spinner = ['|', '/', '-', '\\'];
    let spin_idx = ((event.elapsed_wall_s * 10.0) as usize) % spinner.len();
    let mut line = format!(
        "\r{} {}  elapsed={:.2}s",
        spinner[spin_idx],
        event.stage.label(),
        event.elapsed_wall_s
    );
    if let Some(msg) = &event.message {
        line.push_str(&format!("  {msg}"));
    }
    print!("{line}");
    let _ = io::stdout().flush();
}

fn print_timing_summary(timing: &RunTimingSummary) {
    if timing.load_cache_time_s > 0.0 {
        println!("  Cache load: {:.3}s", timing.load_cache_time_s);
        return;
    }
    let total = timing.total_time_s.max(1.0e-12);
    println!("\nTiming summary:");
    for (label, secs) in [
        ("Compile", timing.compile_time_s),
        ("Table", timing.table_time_s),
        ("Solve", timing.solve_time_s),
        ("Save", timing.save_time_s),
    ] {
        println!("  {label:<8} {secs:.3}s ({:.1}%)", 100.0 * secs / total);
    }
    println!("  Total:   {:.3}s", timing.total_time_s);
}

fn cmd_runs(case_path: &Path) -> AppResult<()> {
    let runs = run_service::list_runs(case_path)?;

    if runs.is_empty() {
        println!("No stored runs for case: {}", case_path.display());
    } else {
        println!("Stored runs for '{}':", case_path.display());
        for manifest in runs {
            println!(
                "  {} ({}, {} columns, {:?})",
                manifest.run_id, manifest.timestamp, manifest.columns, manifest.status
            );
        }
    }
    Ok(())
}

fn cmd_show_run(case_path: &Path, run_id: &str) -> AppResult<()> {
    println!("Loading run: {run_id}");

    let (manifest, records) = run_service::load_run(case_path, run_id)?;
    let summary = query::get_run_summary(&records)?;

    println!("\nRun Summary:");
    println!("  Case: {}", manifest.case_name);
    println!("  Created: {}", manifest.timestamp);
    println!("  Status: {:?}", manifest.status);
    println!("  Rate model: {}", manifest.rate_model);
    println!("  Columns: {} of {}", summary.record_count, manifest.max_steps + 1);
    println!(
        "  Time range: {:.4e} - {:.4e} s",
        summary.time_range.0, summary.time_range.1
    );

    println!("\nElements:");
    for symbol in &summary.elements {
        let target = query::parse_target(symbol);
        let mean_charge = query::extract_series(&records, &target, "mean_charge")?;
        let last = mean_charge.last().map(|(_, z)| *z).unwrap_or(f64::NAN);
        println!("  {symbol:<3} final mean charge {last:.4}");
    }
    Ok(())
}

fn cmd_export_series(
    case_path: &Path,
    run_id: &str,
    target: &str,
    variable: &str,
    output: Option<&Path>,
) -> AppResult<()> {
    let (_manifest, records) = run_service::load_run(case_path, run_id)?;
    let series = query::extract_series(&records, &query::parse_target(target), variable)?;

    let mut csv = String::from("time_s,value\n");
    for (t, val) in &series {
        csv.push_str(&format!("{t},{val}\n"));
    }

    if let Some(path) = output {
        std::fs::write(path, csv)?;
        println!(
            "✓ Exported {} data points to {}",
            series.len(),
            path.display()
        );
    } else {
        print!("{csv}");
    }
    Ok(())
}

fn cmd_equilibrium(case_path: &Path, request: EquilibriumRequest) -> AppResult<()> {
    let fractions = run_service::equilibrium(case_path, request)?;
    for (element, f) in fractions {
        let values: Vec<String> = f.iter().map(|x| format!("{x:.4e}")).collect();
        println!("{element:<3} {}", values.join(" "));
    }
    Ok(())
}
