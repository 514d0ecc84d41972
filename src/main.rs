use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;
use swerve_config::hardware::{DeviceClass, FeedbackSensor, MotorFamily, SimulatedBus};
use swerve_config::{AlertBoard, DeployDirectory, EncoderKind, ModuleLocation, SwerveModuleConfiguration};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Check a swerve deploy directory against a simulated CAN bus
#[derive(Parser, Debug)]
#[command(name = "swerve-config")]
#[command(version)]
struct Args {
    /// Directory holding swervedrive.json and modules/
    deploy_dir: PathBuf,

    /// Make every configuration write to this motor id fail (repeatable)
    #[arg(long = "fail-motor", value_name = "ID")]
    fail_motors: Vec<u8>,

    /// Print the resolved modules as JSON
    #[arg(long)]
    json: bool,

    /// Enable debug logging (ignored when RUST_LOG is set)
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ModuleSummary {
    name: String,
    drive_motor: (MotorFamily, u8),
    angle_motor: (MotorFamily, u8),
    encoder: Option<EncoderKind>,
    location_meters: ModuleLocation,
    drive_factor: f64,
    angle_factor: f64,
    angle_feedback: FeedbackSensor,
    absolute_encoder_offset: f64,
}

impl From<&SwerveModuleConfiguration> for ModuleSummary {
    fn from(module: &SwerveModuleConfiguration) -> Self {
        let factors = module.conversion_factors();
        Self {
            name: module.name().to_string(),
            drive_motor: (module.drive_motor().family(), module.drive_motor().id()),
            angle_motor: (module.angle_motor().family(), module.angle_motor().id()),
            encoder: module.absolute_encoder().map(|e| e.kind()),
            location_meters: module.location(),
            drive_factor: factors.drive,
            angle_factor: factors.angle,
            angle_feedback: module.angle_motor().feedback_sensor(),
            absolute_encoder_offset: module.absolute_encoder_offset(),
        }
    }
}

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok(), args.verbose))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(&args) {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    }
}

/// RUST_LOG, when set, replaces the default level entirely
fn log_filter(rust_log: Option<String>, verbose: bool) -> EnvFilter {
    match rust_log {
        Some(directives) => EnvFilter::new(directives),
        None => {
            let level = if verbose { LevelFilter::DEBUG } else { LevelFilter::INFO };
            EnvFilter::default().add_directive(level.into())
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let deploy = DeployDirectory::load(&args.deploy_dir)?;

    let mut bus = SimulatedBus::new();
    for id in &args.fail_motors {
        bus.device(DeviceClass::Motor, *id, "").borrow_mut().fail_always = true;
    }

    let board = AlertBoard::new();
    let modules = deploy.build_modules(&mut bus, board.clone())?;
    let summaries: Vec<ModuleSummary> = modules.iter().map(ModuleSummary::from).collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    } else {
        for s in &summaries {
            println!(
                "{:<12} drive={:?}#{} angle={:?}#{} encoder={} at ({:.4}, {:.4}) m, factors drive={} angle={}, feedback={:?}",
                s.name,
                s.drive_motor.0,
                s.drive_motor.1,
                s.angle_motor.0,
                s.angle_motor.1,
                s.encoder.map_or("none".to_string(), |k| format!("{:?}", k)),
                s.location_meters.front,
                s.location_meters.left,
                s.drive_factor,
                s.angle_factor,
                s.angle_feedback,
            );
        }
    }

    let active = board.active();
    if !active.is_empty() {
        eprintln!("{} active advisories:", active.len());
        for advisory in active {
            eprintln!("  {}", advisory);
        }
    }
    Ok(())
}
