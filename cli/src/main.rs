use std::process::ExitCode;

use clap::Parser;
use color_eyre::Result;
use image_to_3d::{cli::Cli, run};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    pretty_env_logger::init();
    color_eyre::install()?;
    run(Cli::parse()).await
}
