use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use serde_json::json;

use path_rewrite_gateway::config::{load_config, ConfigError};
use path_rewrite_gateway::rewrite::{Rewrite, RewriteEngine};

#[derive(Parser)]
#[command(name = "rewrite-cli")]
#[command(about = "Check request paths against the gateway's rewrite rules", long_about = None)]
struct Cli {
    /// Gateway configuration file.
    #[arg(short, long, default_value = "gateway.toml")]
    config: PathBuf,

    /// Print results as JSON lines.
    #[arg(long)]
    json: bool,

    /// Request paths to evaluate.
    #[arg(required = true)]
    paths: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(ConfigError::Validation(errors)) => {
            eprintln!("Error: {} invalid configuration:", cli.config.display());
            for err in errors {
                eprintln!("  - {}", err);
            }
            return ExitCode::FAILURE;
        }
        Err(e) => {
            eprintln!("Error: {}: {}", cli.config.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let engine = match RewriteEngine::from_config(&config) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    for path in &cli.paths {
        let result = engine.apply(path);
        if cli.json {
            let rule = match &result {
                Rewrite::Matched { rule, .. } => Some(*rule),
                Rewrite::Unmatched(_) => None,
            };
            let line = json!({
                "path": path,
                "rewritten": result.path(),
                "matched": result.is_match(),
                "rule": rule,
            });
            println!("{}", line);
        } else if let Rewrite::Matched { path: rewritten, rule } = &result {
            let source = &engine.rules()[*rule].rule().source;
            println!("{} -> {}  (rule #{}: {})", path, rewritten, rule, source);
        } else {
            println!("{} unchanged", path);
        }
    }

    ExitCode::SUCCESS
}
