use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use items_core::telemetry;
use items_stack::{Architecture, StackConfig, StackError, compose};

/// Synthesize the items service CloudFormation template.
#[derive(Debug, Parser)]
#[command(name = "synth", version)]
struct Args {
    /// Stack name, logged and used by deploy tooling.
    #[arg(long, default_value = "ApiLambdaCrudDynamoDBExample")]
    stack_name: String,

    /// Physical DynamoDB table name.
    #[arg(long, default_value = "items")]
    table_name: String,

    /// REST API name.
    #[arg(long, default_value = "Items Service")]
    api_name: String,

    /// Deployment stage.
    #[arg(long, default_value = "prod")]
    stage: String,

    /// Lambda instruction set; must match the `cargo lambda build` target.
    #[arg(long, value_enum, default_value_t = Architecture::Arm64)]
    architecture: Architecture,

    /// Function memory in MB, within Lambda's 128..=10240.
    #[arg(long, default_value_t = 128, value_parser = clap::value_parser!(u32).range(128..=10240))]
    memory_size: u32,

    /// Function timeout in seconds, within Lambda's 1..=900.
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..=900))]
    timeout: u32,

    /// Prefix of every `<binary>/bootstrap.zip` key in the assets bucket.
    #[arg(long, default_value = "")]
    asset_prefix: String,

    /// Write the template here instead of stdout.
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Emit single-line JSON.
    #[arg(long)]
    compact: bool,
}

impl From<&Args> for StackConfig {
    fn from(args: &Args) -> Self {
        StackConfig {
            stack_name: args.stack_name.clone(),
            table_name: args.table_name.clone(),
            api_name: args.api_name.clone(),
            stage_name: args.stage.clone(),
            architecture: args.architecture,
            memory_size: args.memory_size,
            timeout_secs: args.timeout,
            asset_prefix: args.asset_prefix.clone(),
        }
    }
}

fn run(args: &Args) -> Result<(), StackError> {
    let stack = compose(&StackConfig::from(args))?;
    let json = stack.template().to_json(!args.compact)?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, format!("{json}\n"))?;
            info!(stack = stack.name(), path = %path.display(), "template written");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{json}")?;
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    telemetry::init();
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "synthesis failed");
            ExitCode::FAILURE
        }
    }
}
