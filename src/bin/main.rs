use anyhow::{Context, Result};
use clap::Parser;
use pywrapgen::config::{GeneratorConfig, ReturnPolicy, DEFAULT_OUTPUT_FILE};
use pywrapgen::utils::{generate_bindings_file, LibraryJob};
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Generate Python ctypes bindings from annotated C/C++ interface files"
)]
struct Args {
    /// Interface file of a single library
    #[arg(value_name = "CFILE", conflicts_with = "inputs")]
    interface: Option<PathBuf>,

    /// Base folder of a single library
    #[arg(value_name = "BASE_FOLDER", conflicts_with = "base_folders")]
    base_folder: Option<String>,

    /// Name of a single library
    #[arg(value_name = "LIB", conflicts_with = "libraries")]
    library: Option<String>,

    /// Interface file to parse (repeat once per library)
    #[arg(short, long = "input")]
    inputs: Vec<PathBuf>,

    /// Folder below which the runtime searches for the library (one per input)
    #[arg(short, long = "base-folder")]
    base_folders: Vec<String>,

    /// Library name without prefix or extension (one per input)
    #[arg(short, long = "library")]
    libraries: Vec<String>,

    /// Generated Python module
    #[arg(short, long, default_value = DEFAULT_OUTPUT_FILE)]
    output: PathBuf,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// What to return when a function has both a result and output buffers
    #[arg(long, value_enum)]
    return_policy: Option<ReturnPolicy>,

    /// Enable verbose output
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose {
        "pywrapgen=debug"
    } else {
        "pywrapgen=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &args.config {
        Some(path) => GeneratorConfig::load(path)
            .with_context(|| format!("loading configuration {}", path.display()))?,
        None => GeneratorConfig::default(),
    };
    if let Some(policy) = args.return_policy {
        config.return_policy = policy;
    }
    debug!("effective configuration: {:?}", config);

    let mut inputs = args.inputs;
    let mut base_folders = args.base_folders;
    let mut libraries = args.libraries;
    inputs.extend(args.interface);
    base_folders.extend(args.base_folder);
    libraries.extend(args.library);
    let jobs = LibraryJob::from_parallel_lists(inputs, base_folders, libraries)?;

    for job in &jobs {
        info!(
            "binding library '{}' from {}",
            job.library,
            job.interface.display()
        );
    }

    generate_bindings_file(&jobs, &config, &args.output)
        .with_context(|| format!("generating {}", args.output.display()))?;

    Ok(())
}
