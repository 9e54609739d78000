use clap::{Parser, Subcommand};
use pc_compressor::{CycleConfig, CycleError, CycleRun, build_model, solve_cycle};
use pc_core::units::k;
use pc_fluids::{Composition, CoolPropModel, FluidModel, Species};
use std::path::{Path, PathBuf};
use thiserror::Error;
use uom::si::pressure::kilopascal;

#[derive(Error, Debug)]
enum CliError {
    #[error(transparent)]
    Cycle(#[from] CycleError),

    #[error("Fluid error: {0}")]
    Fluid(#[from] pc_fluids::FluidError),

    #[error("Unknown species '{0}'")]
    UnknownSpecies(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "pc-cli")]
#[command(about = "Periodic cycle model of a reciprocating compressor cylinder", long_about = None)]
struct Cli {
    /// Log solver progress at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve the periodic cycle
    Run {
        /// Cycle configuration YAML (defaults when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Write the full JSON report here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Saturation (bubble-point) pressure of a pure fluid
    Saturation {
        /// Species name, e.g. propane or R290
        #[arg(long)]
        fluid: String,
        /// Temperature in kelvin
        #[arg(long)]
        temperature_k: f64,
    },
    /// Print a configuration as YAML
    ShowConfig {
        /// Configuration to load (defaults when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .init();
    } else {
        tracing_subscriber::fmt::init();
    }

    match cli.command {
        Commands::Run { config, output } => cmd_run(config.as_deref(), output.as_deref()),
        Commands::Saturation {
            fluid,
            temperature_k,
        } => cmd_saturation(&fluid, temperature_k),
        Commands::ShowConfig { config } => cmd_show_config(config.as_deref()),
    }
}

fn load_config(path: Option<&Path>) -> CliResult<CycleConfig> {
    Ok(match path {
        Some(path) => CycleConfig::load(path)?,
        None => CycleConfig::default(),
    })
}

fn cmd_run(config_path: Option<&Path>, output: Option<&Path>) -> CliResult<()> {
    let config = load_config(config_path)?;
    let model = build_model(&config.backend)?;
    let run = solve_cycle(&config, model.as_ref())?;

    print_summary(&run);

    if let Some(path) = output {
        let json = serde_json::to_string_pretty(&run.report)?;
        std::fs::write(path, json)?;
        println!("Report written to {}", path.display());
    }
    Ok(())
}

fn print_summary(run: &CycleRun) {
    let s = &run.report.summary;
    let mark = if run.success() { "✓" } else { "✗" };
    println!("{mark} {}", s.message);
    if s.converged && !s.outlet_area_converged {
        println!("  Discharge area did not settle after {} solves", run.valve_updates);
    }
    println!("  Nodes:             {}", s.nodes);
    println!("  Newton iterations: {}", s.iterations);
    println!("  Max residual:      {:.3e}", s.max_residual);
    println!("  Solve time:        {:.3} s", run.solve_time_s);
    println!(
        "  Peak pressure:     {:.1} kPa at {:.1}°",
        s.peak_pressure_pa * 1e-3,
        s.peak_pressure_theta_rad.to_degrees()
    );
    println!("  Min pressure:      {:.1} kPa", s.min_pressure_pa * 1e-3);
    println!("  Inducted mass:     {:.4e} kg/rev", s.inducted_mass_kg);
    println!("  Delivered mass:    {:.4e} kg/rev", s.delivered_mass_kg);
    if let Some(err) = s.mass_balance_error {
        println!("  Mass balance:      {:.2}%", err * 100.0);
    }
    println!("  Indicated work:    {:.4} kJ/rev", s.indicated_work_kj);
    println!("  Indicated power:   {:.3} kW", s.indicated_power_kw);
    println!(
        "  Discharge area:    {:.3e} m² ({} solves)",
        s.outlet_valve_area_m2, run.valve_updates
    );
}

fn cmd_saturation(fluid: &str, temperature_k: f64) -> CliResult<()> {
    let species: Species = fluid
        .parse()
        .map_err(|_| CliError::UnknownSpecies(fluid.to_string()))?;
    let model = CoolPropModel::new();
    let p = model.saturation_pressure(k(temperature_k), &Composition::pure(species))?;
    println!(
        "{} at {temperature_k:.2} K: p_sat = {:.2} kPa",
        species.display_name(),
        p.get::<kilopascal>()
    );
    Ok(())
}

fn cmd_show_config(config_path: Option<&Path>) -> CliResult<()> {
    let config = load_config(config_path)?;
    print!("{}", config.to_yaml_string()?);
    Ok(())
}
