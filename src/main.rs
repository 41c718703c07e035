use anyhow::Context;
use clap::Parser;

use snapfeed_lib::{run, Cli};
use sf_bootstrap::bootstrap::{config::resolve_data_dir, load_config, tracing::init_tracing_subscriber};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli.config_path())?;

    if let Err(err) = init_tracing_subscriber(Some(&resolve_data_dir(&config))) {
        eprintln!("Failed to initialize tracing: {err}");
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;
    let output = runtime.block_on(run(cli, config))?;

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
