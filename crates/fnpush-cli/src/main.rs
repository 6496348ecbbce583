//! fnpush CLI - build and deploy a Go function to AWS Lambda

use camino::Utf8PathBuf;
use clap::Parser;
use miette::Result;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use fnpush_core::aws::{load_sdk_config, AwsFunctionService, AwsObjectStore};
use fnpush_core::build::CompilerInvoker;
use fnpush_core::config::{DeploymentTarget, TargetOverrides};
use fnpush_core::pipeline::Pipeline;

/// fnpush - one-command build and deploy for a single Lambda function
#[derive(Debug, Parser)]
#[command(name = "fnpush")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Function source directory
    #[arg(short, long, default_value = ".")]
    path: Utf8PathBuf,

    /// Lambda function name
    #[arg(short, long)]
    name: Option<String>,

    /// S3 bucket receiving the packaged archive
    #[arg(short, long)]
    bucket: Option<String>,

    /// AWS region (falls back to AWS_DEFAULT_REGION)
    #[arg(short, long)]
    region: Option<String>,

    /// Build for the arm64 (Graviton) architecture
    #[arg(long)]
    arm: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let overrides = TargetOverrides {
        function_name: cli.name,
        bucket: cli.bucket,
        region: cli.region,
        arm: cli.arm.then_some(true),
    };

    let env_region = std::env::var("AWS_DEFAULT_REGION").ok();
    let target = DeploymentTarget::resolve(&cli.path, overrides, env_region)?;

    tracing::info!("Function path: {}", target.source_dir);
    tracing::info!("Function name: {}", target.function_name);
    tracing::info!("Architecture: {}", target.architecture);
    tracing::info!("AWS region: {}", target.region);
    tracing::info!("S3 bucket: {}", target.bucket);

    let sdk_config = load_sdk_config(&target.region).await;
    let store = AwsObjectStore::new(&sdk_config);
    let functions = AwsFunctionService::new(&sdk_config);
    let invoker = CompilerInvoker::new(target.architecture);

    Pipeline::new(&target, invoker, &store, &functions)
        .run()
        .await?;

    Ok(())
}
