use anyhow::{Result, bail};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use triad_rs::cli::Args;
use triad_rs::generator::persona::PersonaRegistry;
use triad_rs::{ask, launch};

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "triad_rs=debug" } else { "triad_rs=info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = args.into_config()?;
    init_tracing(config.verbose);

    if args.list_personas {
        for persona in PersonaRegistry::new().list() {
            println!("{:<12} {:<26} {}", persona.id, persona.name, persona.description);
        }
        return Ok(());
    }

    if let Some(question) = &args.ask {
        let Some(document) = &args.document else {
            bail!("--ask requires --document");
        };
        println!("{}", ask(&config, document, question).await?);
        return Ok(());
    }

    let request = args.run_request()?;
    let outcome = launch(&config, request).await?;
    println!("{}", outcome.report);

    Ok(())
}
