use clap::{Parser, Subcommand};
use cropbatch::batch::{self, BatchRequest, Operation};
use cropbatch::catalog::ProfileCatalog;
use cropbatch::config::{self, EngineConfig};
use cropbatch::naming::NamingScheme;
use cropbatch::output;
use cropbatch::output_dir::DirectoryLayout;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "cropbatch")]
#[command(about = "Batch cover-crop and re-encode images into WebP derivatives")]
#[command(long_about = "\
Batch cover-crop and re-encode images into WebP derivatives

Each source is decoded once and written as one lossy WebP per target size of
the chosen profile. Output goes into a fresh directory next to the sources:

  shoot/
  ├── cat.jpg
  ├── dog.png
  └── resized_images/              # shared layout, named after the profile
      ├── 48213907_small.webp
      └── 48213907_large.webp

An existing output directory is cleared only after confirmation.

Run 'cropbatch profiles' to list the built-in profiles and
'cropbatch gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Config file (defaults apply when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Process a batch of source images with a profile
    Run(RunArgs),
    /// List the built-in profiles and their sizes
    Profiles,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

#[derive(clap::Args)]
struct RunArgs {
    /// Profile id (see 'cropbatch profiles')
    #[arg(long, short)]
    profile: String,

    /// cover-crop, contain-crop or pass-through-reencode [default: by profile]
    #[arg(long)]
    operation: Option<Operation>,

    /// Aspect ratio key for aspect-ratio profiles, e.g. 3:4
    #[arg(long)]
    aspect_ratio: Option<String>,

    /// per-source or shared [default: by profile]
    #[arg(long)]
    layout: Option<DirectoryLayout>,

    /// random or stem [default: stem for pass-through, random otherwise]
    #[arg(long)]
    naming: Option<NamingScheme>,

    /// Replace existing output directories without asking
    #[arg(long, short)]
    yes: bool,

    /// Print the outcome as JSON instead of progress lines
    #[arg(long)]
    json: bool,

    /// Source images
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run(args) => {
            let engine_config = load(cli.config.as_deref())?;
            let status = run(args, &engine_config)?;
            std::process::exit(status);
        }
        Command::Profiles => {
            output::print_profiles(ProfileCatalog::builtin());
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn load(path: Option<&Path>) -> Result<EngineConfig, config::ConfigError> {
    match path {
        Some(path) => config::load_config(path),
        None => config::resolve_config(None),
    }
}

/// Run one batch and return the process exit status.
fn run(args: RunArgs, engine_config: &EngineConfig) -> Result<i32, Box<dyn std::error::Error>> {
    let operation = args.operation.unwrap_or_else(|| {
        ProfileCatalog::builtin()
            .get(&args.profile)
            .map(Operation::default_for)
            .unwrap_or(Operation::CoverCrop)
    });
    let mut request = BatchRequest::new(args.files, args.profile, operation);
    request.aspect_ratio = args.aspect_ratio;
    request.layout = args.layout;
    request.naming = args.naming;

    let assume_yes = args.yes;
    let mut confirm = |existing: &Path| assume_yes || ask_overwrite(existing);

    let (tx, rx) = std::sync::mpsc::channel();
    let quiet = args.json;
    let printer = std::thread::spawn(move || {
        for event in rx {
            if quiet {
                continue;
            }
            for line in output::format_batch_event(&event) {
                println!("{}", line);
            }
        }
    });
    let result = batch::run(&request, engine_config, &mut confirm, Some(tx));
    printer.join().map_err(|_| "progress printer panicked")?;

    let (status, message) = batch::status_of(&result);
    if args.json {
        let json = match &result {
            Ok(outcome) => serde_json::json!({
                "status": status,
                "message": message,
                "outcome": outcome,
            }),
            Err(_) => serde_json::json!({ "status": status, "message": message }),
        };
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else {
        match &result {
            Ok(outcome) => output::print_outcome(outcome),
            Err(_) => eprintln!("error: {message}"),
        }
    }
    Ok(status)
}

/// Interactive `[y/N]` prompt on stderr/stdin. Anything but `y`/`yes` declines.
fn ask_overwrite(existing: &Path) -> bool {
    eprint!(
        "{} already exists. Replace its contents? [y/N] ",
        existing.display()
    );
    let _ = std::io::stderr().flush();
    let mut answer = String::new();
    if std::io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
