use clap::{Args, Parser, Subcommand};
use keypoint_benchmark::compatibility::CompatibilityPolicy;
use keypoint_benchmark::config::BenchmarkConfig;
use keypoint_benchmark::data_loader::{DirectorySequence, FrameSource, load_frames};
use keypoint_benchmark::features::NativeFeatures;
use keypoint_benchmark::filter::Region;
use keypoint_benchmark::harness::BenchmarkHarness;
use keypoint_benchmark::io::object_to_json;
use keypoint_benchmark::report::{render_table, write_json_report, write_keypoint_sizes};
use keypoint_benchmark::types::{DescriptorKind, DetectorKind, MatcherKind, SelectorKind};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(version, about, author)]
struct KpBenchCli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sweep detector/descriptor combinations over an image sequence
    Run(RunArgs),
    /// Print which combinations would run and why others are skipped
    List(SweepArgs),
    /// Write the default configuration as JSON
    DefaultConfig {
        /// Output file
        #[arg(short, long, default_value = "kpbench.json")]
        output: PathBuf,
    },
}

#[derive(Args)]
struct SweepArgs {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Detector kinds to sweep
    #[arg(long, value_enum, value_delimiter = ',')]
    detectors: Vec<DetectorKind>,

    /// Descriptor kinds to sweep
    #[arg(long, value_enum, value_delimiter = ',')]
    descriptors: Vec<DescriptorKind>,
}

#[derive(Args)]
struct RunArgs {
    #[command(flatten)]
    sweep: SweepArgs,

    /// Read every .png/.jpg of this folder instead of the indexed sequence
    #[arg(short, long)]
    images: Option<PathBuf>,

    /// Base folder of the indexed sequence
    #[arg(long)]
    base_path: Option<PathBuf>,

    #[arg(long, value_enum)]
    matcher: Option<MatcherKind>,

    #[arg(long, value_enum)]
    selector: Option<SelectorKind>,

    /// Only keep keypoints on the preceding vehicle
    #[arg(long)]
    focus_on_vehicle: bool,

    /// Keep at most this many keypoints per frame
    #[arg(long)]
    limit: Option<usize>,

    /// Run configurations on all cores
    #[arg(short, long)]
    parallel: bool,

    /// Entries per ranking
    #[arg(long)]
    top: Option<usize>,

    /// Write a JSON report here
    #[arg(long)]
    json: Option<PathBuf>,

    /// Write <DETECTOR>_keypoints.csv size files into this folder
    #[arg(long)]
    keypoint_csv: Option<PathBuf>,
}

fn load_config(sweep: &SweepArgs) -> Result<BenchmarkConfig, Box<dyn std::error::Error>> {
    let mut config = match &sweep.config {
        Some(path) => BenchmarkConfig::from_json_file(path)?,
        None => BenchmarkConfig::default(),
    };
    if !sweep.detectors.is_empty() {
        config.detectors = sweep.detectors.clone();
    }
    if !sweep.descriptors.is_empty() {
        config.descriptors = sweep.descriptors.clone();
    }
    Ok(config)
}

fn list(sweep: &SweepArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(sweep)?;
    let policy = CompatibilityPolicy::reference();
    for detector in &config.detectors {
        for descriptor in &config.descriptors {
            match policy.rejection(*detector, *descriptor) {
                Some(rule) => println!("{:<10} {:<10} skipped: {}", detector, descriptor, rule),
                None => println!("{:<10} {:<10} runnable", detector, descriptor),
            }
        }
    }
    Ok(())
}

fn run(args: &RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config(&args.sweep)?;
    if let Some(base_path) = &args.base_path {
        config.image_base_path = base_path.clone();
    }
    if let Some(matcher) = args.matcher {
        config.matcher = matcher;
    }
    if let Some(selector) = args.selector {
        config.selector = selector;
    }
    if args.focus_on_vehicle {
        config.region = Some(Region::vehicle());
    }
    if args.limit.is_some() {
        config.keypoint_limit = args.limit;
    }
    if args.parallel {
        config.parallel = true;
    }
    if let Some(top) = args.top {
        config.top_n = top;
    }
    config.validate()?;

    let now = Instant::now();
    let frames = match &args.images {
        Some(dir) => {
            let source = DirectorySequence::new(dir)?;
            log::info!("loading {} images from {}", source.len(), dir.display());
            load_frames(&source)?
        }
        None => {
            let source = config.image_sequence();
            log::info!("loading {} images from {}", source.len(), source.path(0).display());
            load_frames(&source)?
        }
    };
    log::info!("loading images took {:.3} sec", now.elapsed().as_secs_f64());

    let now = Instant::now();
    let harness = BenchmarkHarness::from_config(NativeFeatures, &config)?.with_progress(true);
    let summaries = harness.run(&frames);
    log::info!("sweep took {:.3} sec", now.elapsed().as_secs_f64());

    print!("{}", render_table(&summaries, config.top_n));

    if let Some(path) = &args.json {
        write_json_report(path, &summaries, config.top_n)?;
        log::info!("report written to {}", path.display());
    }
    if let Some(dir) = &args.keypoint_csv {
        std::fs::create_dir_all(dir)?;
        let written = write_keypoint_sizes(dir, &summaries)?;
        log::info!("{} keypoint size files written to {}", written.len(), dir.display());
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = KpBenchCli::parse();
    match &cli.command {
        Commands::Run(args) => run(args),
        Commands::List(sweep) => list(sweep),
        Commands::DefaultConfig { output } => {
            object_to_json(output, &BenchmarkConfig::default())?;
            println!("default configuration written to {}", output.display());
            Ok(())
        }
    }
}
