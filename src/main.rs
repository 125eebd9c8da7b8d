//! Contract Pack CLI
//!
//! Entry point for the `contract-pack` command-line tool.

use clap::{Parser, Subcommand, ValueEnum};
use contract_pack::config::{EffectiveConfig, PackageFormat};
use contract_pack::{LifecyclePackage, PackageError, SmartContractPackage};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "contract-pack")]
#[command(about = "Package smart contracts for peer install", version)]
struct Cli {
    /// Log packaging steps to stderr (overridden by RUST_LOG)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Lifecycle,
    Legacy,
}

impl FormatArg {
    fn as_str(self) -> &'static str {
        match self {
            Self::Lifecycle => "lifecycle",
            Self::Legacy => "legacy",
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Build a package from source
    Package {
        /// Path to project config (default: ./contract-pack.toml if present)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Package format
        #[arg(long, value_enum)]
        format: Option<FormatArg>,

        /// Smart contract source directory (or Go import path)
        #[arg(long)]
        path: Option<String>,

        /// Smart contract language: golang, node or java
        #[arg(long = "type")]
        contract_type: Option<String>,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        version: Option<String>,

        /// Lifecycle label (default: <name>_<version>)
        #[arg(long)]
        label: Option<String>,

        /// Directory of metadata (.json) to package under META-INF/
        #[arg(long)]
        metadata_path: Option<String>,

        /// Go build path (default: $GOPATH)
        #[arg(long)]
        golang_path: Option<String>,

        /// Output file
        #[arg(long, short = 'o')]
        output: Option<String>,
    },

    /// List the files inside a package
    List {
        /// Package file
        file: PathBuf,

        /// Package format (default: guessed from the file)
        #[arg(long, value_enum)]
        format: Option<FormatArg>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Show a package's identity
    Info {
        /// Package file
        file: PathBuf,

        /// Package format (default: guessed from the file)
        #[arg(long, value_enum)]
        format: Option<FormatArg>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Package {
            config,
            format,
            path,
            contract_type,
            name,
            version,
            label,
            metadata_path,
            golang_path,
            output,
        } => {
            let overrides = serde_json::json!({
                "format": format.map(FormatArg::as_str),
                "package": {
                    "path": path,
                    "type": contract_type,
                    "name": name,
                    "version": version,
                    "label": label,
                    "metadata_path": metadata_path,
                    "golang_path": golang_path,
                    "output": output,
                }
            });
            run_package(config, overrides);
        }
        Commands::List { file, format, json } => {
            run_list(&file, format, json);
        }
        Commands::Info { file, format, json } => {
            run_info(&file, format, json);
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_package(config_path: Option<PathBuf>, overrides: serde_json::Value) {
    let config_path = EffectiveConfig::discover(config_path, Path::new("."));
    let config = match EffectiveConfig::build(config_path.as_deref(), Some(overrides)) {
        Ok(c) => c,
        Err(e) => fail(&format!("Error loading config: {}", e)),
    };
    let format = match config.format() {
        Ok(f) => f,
        Err(e) => fail(&format!("Error loading config: {}", e)),
    };
    let options = config.packaging_options();

    let (bytes, default_name, package_id) = match format {
        PackageFormat::Lifecycle => match LifecyclePackage::create(&options) {
            Ok(package) => {
                let file_name = format!("{}.tar.gz", package.label());
                let id = package.package_id();
                (package.into_bytes(), file_name, Some(id))
            }
            Err(e) => fail(&e.to_string()),
        },
        PackageFormat::Legacy => match SmartContractPackage::create(&options) {
            Ok(package) => {
                let file_name = format!("{}@{}.cds", package.name(), package.version());
                (package.into_bytes(), file_name, None)
            }
            Err(e) => fail(&e.to_string()),
        },
    };

    let output = config
        .output()
        .unwrap_or_else(|| config.output_dir().join(default_name));
    if let Err(e) = fs::write(&output, &bytes) {
        fail(&format!("Error writing {}: {}", output.display(), e));
    }

    println!("Wrote: {} ({} bytes)", output.display(), bytes.len());
    if let Some(id) = package_id {
        println!("Package ID: {}", id);
    }
}

/// A package loaded from disk in whichever format it is in
enum LoadedPackage {
    Lifecycle(LifecyclePackage),
    Legacy(SmartContractPackage),
}

fn load_package(file: &Path, format: Option<FormatArg>) -> Result<LoadedPackage, String> {
    let bytes = fs::read(file).map_err(|e| format!("Error reading {}: {}", file.display(), e))?;

    let lifecycle = |bytes| LifecyclePackage::from_bytes(bytes).map(LoadedPackage::Lifecycle);
    let legacy = |bytes| SmartContractPackage::from_bytes(bytes).map(LoadedPackage::Legacy);

    let result: Result<LoadedPackage, PackageError> = match format {
        Some(FormatArg::Lifecycle) => lifecycle(bytes),
        Some(FormatArg::Legacy) => legacy(bytes),
        // Lifecycle packages are gzip; legacy ones are raw protobuf
        None if bytes.starts_with(&[0x1f, 0x8b]) => lifecycle(bytes),
        None => legacy(bytes),
    };
    result.map_err(|e| e.to_string())
}

fn run_list(file: &Path, format: Option<FormatArg>, json_output: bool) {
    let package = load_package(file, format).unwrap_or_else(|e| fail(&e));
    let names = match &package {
        LoadedPackage::Lifecycle(p) => p.file_names(),
        LoadedPackage::Legacy(p) => p.file_names(),
    }
    .unwrap_or_else(|e| fail(&e.to_string()));

    if json_output {
        print_json(&serde_json::json!(names));
    } else {
        for name in names {
            println!("{}", name);
        }
    }
}

fn run_info(file: &Path, format: Option<FormatArg>, json_output: bool) {
    let package = load_package(file, format).unwrap_or_else(|e| fail(&e));

    let info = match &package {
        LoadedPackage::Lifecycle(p) => serde_json::json!({
            "format": "lifecycle",
            "label": p.label(),
            "path": p.metadata().path,
            "type": p.metadata().contract_type,
            "package_id": p.package_id(),
        }),
        LoadedPackage::Legacy(p) => serde_json::json!({
            "format": "legacy",
            "name": p.name(),
            "version": p.version(),
            "path": p.path(),
            "type": p.contract_type(),
        }),
    };

    if json_output {
        print_json(&info);
        return;
    }

    match &package {
        LoadedPackage::Lifecycle(p) => {
            println!("Format: lifecycle");
            println!("  Label: {}", p.label());
            println!("  Type: {}", p.metadata().contract_type);
            if !p.metadata().path.is_empty() {
                println!("  Path: {}", p.metadata().path);
            }
            println!("  Package ID: {}", p.package_id());
        }
        LoadedPackage::Legacy(p) => {
            println!("Format: legacy");
            println!("  Name: {}", p.name());
            println!("  Version: {}", p.version());
            println!("  Type: {}", p.contract_type());
            println!("  Path: {}", p.path());
        }
    }
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => fail(&format!("Error serializing output: {}", e)),
    }
}

fn fail(message: &str) -> ! {
    eprintln!("{}", message);
    process::exit(1);
}
