use clap::Parser;
use e2e_workflow::cli::commands::{cmd_check, cmd_report, cmd_run};
use e2e_workflow::cli::config::{Cli, Commands, load_config};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = load_config(cli.config.as_deref());

    match cli.command {
        Commands::Run {
            cfg,
            hub,
            browser,
            format,
            output,
        } => {
            let all_passed = cmd_run(
                &config,
                &cfg,
                hub.as_deref(),
                browser,
                format.as_deref(),
                output.as_deref(),
            )
            .await?;
            if !all_passed {
                std::process::exit(1);
            }
        }
        Commands::Report {
            results,
            format,
            output,
        } => {
            let all_passed = cmd_report(&results, &format, output.as_deref())?;
            if !all_passed {
                std::process::exit(1);
            }
        }
        Commands::Check { cfg } => {
            cmd_check(&cfg)?;
        }
    }

    Ok(())
}

/// `RUST_LOG` when set, otherwise the `-v` count.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();
}
