//! meshbvh CLI - build and query BVHs over STL meshes.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use meshbvh::{BuildOptions, DeserializeOptions, DistanceLimits, MeshBvh, SerializedBvh, Side, SplitStrategy};
use meshbvh_math::{Point3, Ray, Vec3};

mod stl;

#[derive(Parser)]
#[command(name = "meshbvh")]
#[command(about = "Build, inspect and query triangle mesh BVHs", long_about = None)]
struct Cli {
    #[command(flatten)]
    build: BuildArgs,

    /// Log debug output (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct BuildArgs {
    /// TOML file with build options
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Split strategy: center, average or sah
    #[arg(long, global = true)]
    strategy: Option<SplitStrategy>,

    /// Maximum triangles per leaf
    #[arg(long, global = true)]
    max_leaf_tris: Option<u32>,

    /// Maximum tree depth
    #[arg(long, global = true)]
    max_depth: Option<u32>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a BVH and print tree statistics
    Info {
        /// Input STL file
        mesh: PathBuf,
        /// Print per-root statistics as JSON
        #[arg(long)]
        json: bool,
    },
    /// Cast a ray against the mesh
    Raycast {
        /// Input STL file
        mesh: PathBuf,
        /// Ray origin as x,y,z
        #[arg(long, value_parser = parse_vec3, allow_hyphen_values = true)]
        origin: [f32; 3],
        /// Ray direction as x,y,z
        #[arg(long, value_parser = parse_vec3, allow_hyphen_values = true)]
        direction: [f32; 3],
        /// Faces that can be hit
        #[arg(long, value_enum, default_value_t = FaceSide::Front)]
        side: FaceSide,
        /// Report every hit instead of the nearest one
        #[arg(long)]
        all: bool,
    },
    /// Find the surface point closest to a point
    Closest {
        /// Input STL file
        mesh: PathBuf,
        /// Query point as x,y,z
        #[arg(long, value_parser = parse_vec3, allow_hyphen_values = true)]
        point: [f32; 3],
        /// Ignore surface farther than this
        #[arg(long)]
        max_distance: Option<f32>,
    },
    /// Build a BVH and write it as JSON
    Serialize {
        /// Input STL file
        mesh: PathBuf,
        /// Output JSON file
        output: PathBuf,
    },
    /// Restore a serialized BVH against its mesh and check its bounds
    Verify {
        /// Input STL file
        mesh: PathBuf,
        /// Serialized BVH JSON
        bvh: PathBuf,
    },
    /// Write the mesh with its triangles in BVH order
    Reorder {
        /// Input STL file
        mesh: PathBuf,
        /// Output binary STL file
        output: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FaceSide {
    Front,
    Back,
    Double,
}

impl From<FaceSide> for Side {
    fn from(side: FaceSide) -> Self {
        match side {
            FaceSide::Front => Side::Front,
            FaceSide::Back => Side::Back,
            FaceSide::Double => Side::Double,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::new().filter_level(level).parse_default_env().init();

    let options = build_options(&cli.build)?;
    match cli.command {
        Commands::Info { mesh, json } => show_info(&mesh, options, json),
        Commands::Raycast {
            mesh,
            origin,
            direction,
            side,
            all,
        } => raycast(&mesh, options, origin, direction, side.into(), all),
        Commands::Closest {
            mesh,
            point,
            max_distance,
        } => closest(&mesh, options, point, max_distance),
        Commands::Serialize { mesh, output } => serialize(&mesh, options, &output),
        Commands::Verify { mesh, bvh } => verify(&mesh, &bvh),
        Commands::Reorder { mesh, output } => reorder(&mesh, options, &output),
    }
}

/// Defaults, then the config file, then command-line flags.
fn build_options(args: &BuildArgs) -> Result<BuildOptions> {
    let mut options = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
            toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))?
        }
        None => BuildOptions::default(),
    };
    if let Some(strategy) = args.strategy {
        options.strategy = strategy;
    }
    if let Some(max_leaf_tris) = args.max_leaf_tris {
        options.max_leaf_tris = max_leaf_tris;
    }
    if let Some(max_depth) = args.max_depth {
        options.max_depth = max_depth;
    }
    Ok(options)
}

fn parse_vec3(s: &str) -> std::result::Result<[f32; 3], String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let [x, y, z] = parts[..] else {
        return Err(format!("expected x,y,z, got `{s}`"));
    };
    let parse = |v: &str| v.parse::<f32>().map_err(|e| format!("`{v}`: {e}"));
    Ok([parse(x)?, parse(y)?, parse(z)?])
}

fn load(mesh: &Path, options: BuildOptions) -> Result<MeshBvh> {
    let geometry = stl::read_stl(mesh)?;
    let bvh = MeshBvh::new(geometry, options).with_context(|| format!("building BVH for {}", mesh.display()))?;
    Ok(bvh)
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn show_info(mesh: &Path, options: BuildOptions, json: bool) -> Result<()> {
    let bvh = load(mesh, options)?;
    if json {
        return print_json(&bvh.extremes());
    }
    let bounds = bvh.bounding_box();

    println!("mesh: {}", mesh.display());
    println!("  Triangles: {}", bvh.triangle_count());
    println!("  Vertices: {}", bvh.geometry().vertex_count());
    println!(
        "  Bounds: [{:.4}, {:.4}, {:.4}] - [{:.4}, {:.4}, {:.4}]",
        bounds.min.x, bounds.min.y, bounds.min.z, bounds.max.x, bounds.max.y, bounds.max.z
    );
    println!("  Strategy: {:?}", bvh.options().strategy);
    println!("  Memory: {} bytes", bvh.estimate_memory_bytes());

    for (i, stats) in bvh.extremes().iter().enumerate() {
        println!("\nRoot {i}:");
        println!("  Nodes: {} ({} leaves)", stats.node_count, stats.leaf_count);
        println!("  Depth: {} - {}", stats.depth.min, stats.depth.max);
        println!("  Triangles per leaf: {} - {}", stats.triangles.min, stats.triangles.max);
        println!(
            "  Splits x/y/z: {}/{}/{}",
            stats.split_axes[0], stats.split_axes[1], stats.split_axes[2]
        );
        println!("  SAH score: {:.3}", stats.surface_area_score);
    }

    let violations = bvh.validate_bounds();
    if !violations.is_empty() {
        println!("\n{} bounds violations", violations.len());
    }
    Ok(())
}

fn raycast(mesh: &Path, options: BuildOptions, origin: [f32; 3], direction: [f32; 3], side: Side, all: bool) -> Result<()> {
    let direction = Vec3::from(direction);
    if direction.norm_squared() == 0.0 {
        anyhow::bail!("ray direction must be non-zero");
    }
    let bvh = load(mesh, options)?;
    let ray = Ray::new(Point3::from(origin), direction);
    if all {
        print_json(&bvh.raycast(&ray, side))
    } else {
        print_json(&bvh.raycast_first(&ray, side))
    }
}

fn closest(mesh: &Path, options: BuildOptions, point: [f32; 3], max_distance: Option<f32>) -> Result<()> {
    let bvh = load(mesh, options)?;
    let limits = match max_distance {
        Some(max) => DistanceLimits::within(max),
        None => DistanceLimits::default(),
    };
    print_json(&bvh.closest_point_to_point(&Point3::from(point), limits))
}

fn serialize(mesh: &Path, options: BuildOptions, output: &Path) -> Result<()> {
    let bvh = load(mesh, options)?;
    let json = serde_json::to_string(&bvh.serialize())?;
    std::fs::write(output, json).with_context(|| format!("writing {}", output.display()))?;
    println!("Wrote {} roots to {}", bvh.roots().len(), output.display());
    Ok(())
}

fn verify(mesh: &Path, bvh_path: &Path) -> Result<()> {
    let geometry = stl::read_stl(mesh)?;
    let text = std::fs::read_to_string(bvh_path).with_context(|| format!("reading {}", bvh_path.display()))?;
    let data: SerializedBvh = serde_json::from_str(&text).with_context(|| format!("parsing {}", bvh_path.display()))?;
    let bvh = MeshBvh::deserialize(&data, geometry, DeserializeOptions::default())?;

    let violations = bvh.validate_bounds();
    for v in &violations {
        println!("root {} node {}: {}", v.root, v.node, v.reason);
    }
    if !violations.is_empty() {
        anyhow::bail!("{} bounds violations", violations.len());
    }
    println!("OK: {} roots over {} triangles", bvh.roots().len(), bvh.triangle_count());
    Ok(())
}

fn reorder(mesh: &Path, options: BuildOptions, output: &Path) -> Result<()> {
    let bvh = load(mesh, options)?;
    let bytes = stl::to_binary_stl(bvh.geometry());
    std::fs::write(output, bytes).with_context(|| format!("writing {}", output.display()))?;
    println!("Exported STL to {}", output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_vec3() {
        assert_eq!(parse_vec3("1, -2.5,3").unwrap(), [1.0, -2.5, 3.0]);
        assert!(parse_vec3("1,2").is_err());
        assert!(parse_vec3("1,2,x").is_err());
    }

    #[test]
    fn test_flags_override_config() {
        let dir = std::env::temp_dir().join(format!("meshbvh-cli-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("build.toml");
        std::fs::write(&path, "strategy = \"sah\"\nmax_leaf_tris = 4\nmax_depth = 12\n").unwrap();

        let args = BuildArgs {
            config: Some(path),
            strategy: None,
            max_leaf_tris: Some(2),
            max_depth: None,
        };
        let options = build_options(&args).unwrap();
        assert_eq!(options.strategy, SplitStrategy::Sah);
        assert_eq!(options.max_leaf_tris, 2);
        assert_eq!(options.max_depth, 12);
        assert!(options.verbose);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from([
            "meshbvh",
            "--strategy",
            "average",
            "raycast",
            "part.stl",
            "--origin",
            "0,0,-5",
            "--direction",
            "0,0,1",
            "--side",
            "double",
        ])
        .unwrap();
        assert_eq!(cli.build.strategy, Some(SplitStrategy::Average));
        assert!(matches!(cli.command, Commands::Raycast { origin: [_, _, z], all: false, .. } if z == -5.0));
    }
}
