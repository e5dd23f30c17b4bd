//! barrelcam CLI - edit, inspect and export barrel cam files

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use barrelcam_core::{
    Cam, CamConfig, CamPoint, CamProfile, Curve, Distances, MotionLaw, ProfileId, Sample,
};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, warn};

#[derive(Parser)]
#[command(name = "barrelcam")]
#[command(about = "Barrel cam profile editor and exporter", long_about = None)]
struct Cli {
    /// Settings file (.toml or .json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new cam file
    New {
        /// Output .cam file
        file: PathBuf,
        /// Number of empty profiles
        #[arg(short, long, default_value_t = 1)]
        profiles: usize,
    },
    /// Display information about a cam file
    Info {
        /// Path to the .cam file
        file: PathBuf,
    },
    /// Add a control point to a profile
    AddPoint {
        /// Path to the .cam file
        file: PathBuf,
        /// Profile number, starting at 1
        #[arg(short, long)]
        profile: usize,
        /// Angle in degrees, in (0, 360]
        #[arg(short, long)]
        angle: f64,
        /// Displacement in mm
        #[arg(short, long)]
        displacement: f64,
        /// Motion law of the segment ending at the point
        #[arg(short, long, default_value = "linear")]
        law: MotionLaw,
    },
    /// Mirror every profile about 180 degrees
    Mirror {
        /// Path to the .cam file
        file: PathBuf,
    },
    /// Print a sampled curve as CSV
    Sample {
        /// Path to the .cam file
        file: PathBuf,
        /// Profile number, starting at 1
        #[arg(short, long)]
        profile: usize,
        /// Quantity to sample
        #[arg(long, value_enum, default_value_t = CurveArg::Displacement)]
        curve: CurveArg,
        /// Samples per degree (default: the file's angle steps)
        #[arg(short, long)]
        resolution: Option<u32>,
        /// Only emit the start of dwell segments
        #[arg(long)]
        sparse: bool,
    },
    /// Export a cam file (format determined by extension: .dxf, .json)
    Export {
        /// Input .cam file
        input: PathBuf,
        /// Output file
        output: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum CurveArg {
    /// Displacement in mm
    Displacement,
    /// Follower velocity in mm/s
    Velocity,
    /// Follower acceleration in mm/s²
    Acceleration,
    /// Track slope in degrees
    Slope,
    /// Displacement minus that of profile 1, in mm
    Distance,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let config = match &cli.config {
        Some(path) => CamConfig::load_from_file(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?,
        None => CamConfig::default(),
    };

    match cli.command {
        Commands::New { file, profiles } => new_file(&config, &file, profiles),
        Commands::Info { file } => show_info(&config, &file),
        Commands::AddPoint {
            file,
            profile,
            angle,
            displacement,
            law,
        } => add_point(&file, profile, angle, displacement, law),
        Commands::Mirror { file } => mirror_file(&file),
        Commands::Sample {
            file,
            profile,
            curve,
            resolution,
            sparse,
        } => sample_curve(&file, profile, curve, resolution, sparse),
        Commands::Export { input, output } => export_file(&config, &input, &output),
    }
}

fn init_logging(verbose: bool) -> Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let env_filter = EnvFilter::from_default_env().add_directive(level.into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true),
        )
        .try_init()
        .context("failed to initialize logging")?;
    Ok(())
}

fn open(file: &Path) -> Result<Cam> {
    Cam::open(file).with_context(|| format!("failed to open {}", file.display()))
}

/// Resolve a 1-based profile number.
fn profile_id(cam: &Cam, number: usize) -> Result<ProfileId> {
    match number.checked_sub(1).and_then(|i| cam.ids().get(i)) {
        Some(&id) => Ok(id),
        None => bail!(
            "profile {} does not exist (cam has {} profile(s))",
            number,
            cam.len()
        ),
    }
}

fn new_file(config: &CamConfig, file: &Path, profiles: usize) -> Result<()> {
    let mut cam = Cam::from_config(config)?;
    for _ in 0..profiles {
        cam.add_cam(Some(config.new_profile()?));
    }
    cam.save_as(file)
        .with_context(|| format!("failed to write {}", file.display()))?;
    println!("Created {} with {} profile(s)", file.display(), cam.len());
    Ok(())
}

fn show_info(config: &CamConfig, file: &Path) -> Result<()> {
    let mut cam = open(file)?;

    println!("barrel cam: {}", file.display());
    println!("  Radius: {} mm", cam.radius());
    println!("  Speed: {} rpm", cam.speed());
    println!(
        "  Resolution: {} steps/deg, {} steps/mm",
        cam.angle_steps(),
        cam.displacement_steps()
    );
    println!("  Profiles: {}", cam.len());

    for (i, id) in cam.ids().to_vec().into_iter().enumerate() {
        let kin = cam.peak_kinematics(id)?;
        let Some(profile) = cam.get(id) else {
            continue;
        };
        println!(
            "\n  {}: {} ({}, {} x {} mm)",
            i + 1,
            profile.label(),
            profile.color(),
            profile.height(),
            profile.depth()
        );
        for point in profile.points() {
            println!(
                "    {:>8.3} deg  {:>8.3} mm  {}",
                point.angle(),
                point.displacement(),
                point.law()
            );
        }
        println!(
            "    Displacement: {:.3} .. {:.3} mm",
            profile.min_displacement(),
            kin.max_displacement
        );
        println!("    Peak velocity: {:.3} mm/s", kin.peak_velocity);
        println!("    Peak acceleration: {:.3} mm/s²", kin.peak_acceleration);
        println!("    Peak slope: {:.3} deg", kin.peak_slope);
    }

    if cam.len() > 1 {
        println!("\n  Distances to profile 1:");
        for (id, d) in cam.profile_distances()? {
            let label = cam.get(id).map_or("", |p| p.label());
            println!(
                "    {}: min {:.3} mm at {} deg, max {:.3} mm at {} deg",
                label, d.min.value, d.min.angle, d.max.value, d.max.angle
            );
        }
    }

    if let Some(limit) = config.limits.max_acceleration {
        let over = cam.acceleration_violations(limit)?;
        if !over.is_empty() {
            println!(
                "\n{} profile(s) exceed the {} mm/s² acceleration limit",
                over.len(),
                limit
            );
        }
    }

    Ok(())
}

fn add_point(
    file: &Path,
    number: usize,
    angle: f64,
    displacement: f64,
    law: MotionLaw,
) -> Result<()> {
    let mut cam = open(file)?;
    let id = profile_id(&cam, number)?;
    let resolution = cam.resolution();

    let mut point = CamPoint::new(angle, displacement, law)?;
    point.set_angle(angle, &resolution)?;
    point.set_displacement(resolution.quantize_displacement(displacement))?;

    let Some(profile) = cam.get_mut(id) else {
        bail!("profile {} does not exist", number);
    };
    let outcome = profile.add_point(point);
    let fixed = profile.check_cam();
    debug!(?outcome, fixed, "added point");

    cam.save()?;
    println!(
        "Added point at {} deg, {} mm ({}) to profile {}",
        point.angle(),
        point.displacement(),
        point.law(),
        number
    );
    Ok(())
}

fn mirror_file(file: &Path) -> Result<()> {
    let mut cam = open(file)?;
    cam.mirror();
    cam.save()?;
    println!("Mirrored {} profile(s)", cam.len());
    Ok(())
}

fn sample_curve(
    file: &Path,
    number: usize,
    curve: CurveArg,
    resolution: Option<u32>,
    sparse: bool,
) -> Result<()> {
    let mut cam = open(file)?;
    let id = profile_id(&cam, number)?;
    let steps = resolution.unwrap_or(cam.angle_steps());
    let (omega, radius) = (cam.angular_velocity(), cam.radius());
    let reference = profile_id(&cam, 1)?;

    let (header, samples): (&str, Vec<Sample>) = match curve {
        CurveArg::Displacement => {
            let curve = polyline(&mut cam, id, !sparse, steps)?;
            ("displacement_mm", curve.to_vec())
        }
        CurveArg::Distance => {
            let base = polyline(&mut cam, reference, true, steps)?;
            let other = polyline(&mut cam, id, true, steps)?;
            ("distance_mm", Distances::between(&base, &other)?.samples)
        }
        CurveArg::Velocity => {
            let curve = profile_mut(&mut cam, id)?.first_derivative(steps)?;
            ("velocity_mm_s", curve.scaled(omega).to_vec())
        }
        CurveArg::Acceleration => {
            let curve = profile_mut(&mut cam, id)?.second_derivative(steps)?;
            ("acceleration_mm_s2", curve.scaled(omega * omega).to_vec())
        }
        CurveArg::Slope => {
            let curve = profile_mut(&mut cam, id)?.first_derivative(steps)?;
            ("slope_deg", curve.slope_angle(radius).to_vec())
        }
    };

    println!("angle_deg,{}", header);
    for sample in &samples {
        println!("{},{}", sample.angle, sample.value);
    }
    Ok(())
}

fn profile_mut(cam: &mut Cam, id: ProfileId) -> Result<&mut CamProfile> {
    cam.get_mut(id).context("profile does not exist")
}

fn polyline(
    cam: &mut Cam,
    id: ProfileId,
    complete: bool,
    steps: u32,
) -> Result<Curve> {
    Ok(profile_mut(cam, id)?.polyline(complete, steps)?)
}

fn export_file(config: &CamConfig, input: &Path, output: &Path) -> Result<()> {
    let mut cam = open(input)?;

    let ext = output.extension().and_then(|e| e.to_str()).unwrap_or("");
    match ext.to_lowercase().as_str() {
        "dxf" => {
            barrelcam_export::write_dxf(&mut cam, output)?;
            println!("Exported DXF to {}", output.display());
        }
        "json" => {
            barrelcam_export::write_sweep_json(&mut cam, config.export.sweep_stride, output)?;
            println!("Exported sweep description to {}", output.display());
        }
        _ => {
            warn!(ext, "unsupported export format");
            bail!("Unknown output format: {}", ext);
        }
    }

    Ok(())
}
