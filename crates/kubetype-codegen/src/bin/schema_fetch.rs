use clap::Parser;
use kubetype_codegen::cli::SchemaFetchArgs;
use kubetype_codegen::fetch::{Config, Fetcher};
use miette::Result;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let args = SchemaFetchArgs::parse();
    init_tracing(args.verbose);

    tracing::info!(config = %args.config.display(), "reading config");
    let config = Config::load(&args.config)?;
    let output = config.output.file.clone();

    tracing::info!(sources = config.sources.len(), "fetching schemas");
    Fetcher::new(config).run().await?;

    println!("Generated code to {:?}", output);

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("KUBETYPE_LOG").unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}
