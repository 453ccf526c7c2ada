use clap::Parser;
use nuts_extract::config::AppConfig;
use nuts_extract::{logging, pipeline};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Optional TOML file overriding the built-in catalog URL, retry policies
    /// and output directory
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let cli = Cli::parse();

    let app_config = match &cli.config {
        Some(path) => {
            println!("Using config: {:?}", path);
            AppConfig::load_from_file(path)?
        }
        None => AppConfig::default(),
    };

    let summary = pipeline::run(&app_config).await?;

    println!(
        "Done: {} features from {} datasets, {} files written, {} warnings",
        summary.features,
        summary.datasets,
        summary.files.len(),
        summary.diagnostics.len()
    );

    Ok(())
}
