//! Provider codegen CLI
//!
//! Command-line interface for extracting a Go SDK's API surface and generating
//! Terraform provider glue from it.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use provider_codegen_common::{IntermediateModel, Settings};
use provider_codegen_generator::{DatasourceGenerator, Gofmt, NamespaceClientGenerator};
use provider_codegen_parser::{ExtractRequest, ModuleCache, OperationFilter, SdkExtractor};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// File name of the extraction output
const MODEL_FILE: &str = "sdk_info.json";

#[derive(Parser)]
#[command(name = "provider-codegen")]
#[command(version, about = "Generate Terraform provider glue from a Go SDK", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Settings file (YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the API surface of a Go module into sdk_info.json
    #[command(after_help = "EXAMPLES:\n  \
        # Extract every API operation\n  \
        provider-codegen extract \\\n    \
        --package github.com/nutanix/ntnx-api-golang-clients/monitoring-go-client/v4@v4.0.1\n\n  \
        # Only operations of one API type\n  \
        provider-codegen extract \\\n    \
        --package github.com/nutanix/ntnx-api-golang-clients/monitoring-go-client/v4 \\\n    \
        --receiver AlertsApi")]
    Extract {
        /// Module path, optionally with @version
        #[arg(short, long)]
        package: String,

        /// Output directory
        #[arg(short, long, default_value = "code_gen/sdk_extract_output")]
        output_dir: PathBuf,

        /// Sub-package recorded as the namespace path when the module has an api/ directory
        #[arg(long)]
        api_package: Option<String>,

        /// Only keep operations of this owning type (case-insensitive)
        #[arg(long)]
        receiver: Option<String>,

        /// Only keep operations whose name contains this keyword (case-insensitive)
        #[arg(long)]
        keyword: Option<String>,
    },

    /// Generate the namespace client from sdk_info.json
    GenerateClient {
        /// Path to sdk_info.json
        #[arg(short, long)]
        json: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Generate a data source for one operation from sdk_info.json
    #[command(after_help = "EXAMPLES:\n  \
        provider-codegen generate-datasource \\\n    \
        --json code_gen/sdk_extract_output/sdk_info.json \\\n    \
        --method GetAlertById \\\n    \
        --output-dir ./nutanix/services")]
    GenerateDatasource {
        /// Path to sdk_info.json
        #[arg(short, long)]
        json: PathBuf,

        /// Operation to generate the data source for
        #[arg(short, long)]
        method: String,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Go package of the data source (defaults to <namespace>v2)
        #[arg(short, long)]
        namespace: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        println!("{} Verbose mode enabled", "→".cyan());
    }

    let settings = Settings::load_or_default(cli.config.as_deref())
        .context("Failed to load settings")?;
    debug!("Using settings: {:?}", settings);

    match cli.command {
        Commands::Extract {
            package,
            output_dir,
            api_package,
            receiver,
            keyword,
        } => {
            extract_command(
                &settings,
                ExtractRequest {
                    package,
                    api_package,
                    filter: OperationFilter::from_flags(receiver.as_deref(), keyword.as_deref()),
                },
                &output_dir,
                cli.verbose,
            )?;
        },
        Commands::GenerateClient { json, output_dir } => {
            generate_client_command(&settings, &json, &output_dir)?;
        },
        Commands::GenerateDatasource {
            json,
            method,
            output_dir,
            namespace,
        } => {
            generate_datasource_command(
                &settings,
                &json,
                &method,
                namespace.as_deref(),
                &output_dir,
            )?;
        },
    }

    Ok(())
}

/// Log to stderr; `RUST_LOG` applies unless `--verbose` asks for debug output
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_filter(filter);

    if tracing_subscriber::registry()
        .with(fmt_layer)
        .try_init()
        .is_err()
    {
        eprintln!("Warning: tracing subscriber already initialized");
    }
}

fn extract_command(
    settings: &Settings,
    request: ExtractRequest,
    output_dir: &Path,
    verbose: bool,
) -> Result<()> {
    println!("{} Extracting SDK: {}", "→".cyan(), request.package.yellow());

    let cache = ModuleCache::from_env();
    if verbose {
        println!("  Module cache: {}", cache.root().display());
        if !request.filter.is_all() {
            println!("  Filter: {:?}", request.filter);
        }
    }

    let extractor = SdkExtractor::new(cache, settings);
    let extraction = extractor
        .extract(&request)
        .with_context(|| format!("Failed to extract {}", request.package))?;

    println!(
        "{} Found {} API operations ({} types)",
        "✓".green(),
        extraction.operation_count,
        extraction.type_count
    );

    let output_dir = absolute(output_dir)?;
    fs::create_dir_all(&output_dir).with_context(|| {
        format!("Failed to create output directory {}", output_dir.display())
    })?;
    let model_path = output_dir.join(MODEL_FILE);
    extraction
        .model
        .save(&model_path)
        .context("Failed to write intermediate model")?;

    println!("\n{}", "✓ Extraction complete!".green().bold());
    println!("  {}", model_path.display());

    if verbose {
        println!("\n{}", "Operations:".bold());
        for operation in &extraction.model.operations {
            println!(
                "  • {}.{}",
                operation.method.owning_type.cyan(),
                operation.method.name
            );
        }
    }

    Ok(())
}

fn generate_client_command(settings: &Settings, json: &Path, output_dir: &Path) -> Result<()> {
    let json = absolute(json)?;
    let output_dir = absolute(output_dir)?;
    println!("{} Generating namespace client from: {}", "→".cyan(), json.display());

    let model = load_model(&json)?;
    let generator =
        NamespaceClientGenerator::new(settings).context("Failed to create generator")?;
    let formatter = Gofmt::new(settings.gofmt.as_str());
    let generated = generator
        .generate(&model, &output_dir, &formatter)
        .context("Failed to generate namespace client")?;

    report(&generated.path, generated.formatted);
    Ok(())
}

fn generate_datasource_command(
    settings: &Settings,
    json: &Path,
    method: &str,
    namespace: Option<&str>,
    output_dir: &Path,
) -> Result<()> {
    let json = absolute(json)?;
    let output_dir = absolute(output_dir)?;
    println!(
        "{} Generating data source for {} from: {}",
        "→".cyan(),
        method.yellow(),
        json.display()
    );

    let model = load_model(&json)?;
    let generator = DatasourceGenerator::new(settings).context("Failed to create generator")?;
    let formatter = Gofmt::new(settings.gofmt.as_str());
    let generated = generator
        .generate(&model, method, namespace, &output_dir, &formatter)
        .with_context(|| format!("Failed to generate data source for {}", method))?;

    report(&generated.path, generated.formatted);
    Ok(())
}

fn load_model(path: &Path) -> Result<IntermediateModel> {
    let model = IntermediateModel::load(path)
        .with_context(|| format!("Failed to load {}", path.display()))?;
    println!(
        "{} Loaded {} operations from {}",
        "✓".green(),
        model.operations.len(),
        model.namespace_identifier.yellow()
    );
    Ok(model)
}

fn report(path: &Path, formatted: bool) {
    println!("\n{}", "✓ Generation complete!".green().bold());
    println!("  {}", path.display());
    if !formatted {
        println!(
            "  {} gofmt did not run; the file is unformatted",
            "!".yellow()
        );
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).with_context(|| format!("Failed to resolve {}", path.display()))
}
