use std::path::PathBuf;

use engine::present::OutputSelection;

#[derive(Debug, clap::Parser)]
#[command(
    name = "image_to_3d",
    about = "Turn a picture into a 3D model with Hunyuan3D-2",
    long_about = indoc::indoc! {"
        Turn a picture into a 3D model with Hunyuan3D-2.

        The image can be a URL or a local file; local files are uploaded first.
        Store your Synexa API key once with `image_to_3d key set <key>`, or pass
        it with --api-key for a single run.
    "}
)]
pub struct Cli {
    /// Use this API key for this run instead of the stored one
    #[arg(short = 'k', long, global = true)]
    pub api_key: Option<String>,

    /// Read and write this config file instead of the default one
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// Generate a 3D model from an image URL or file
    Generate(Generate),
    /// Wait for an existing prediction and show its model
    Poll(Poll),
    /// Manage the stored API key
    #[command(subcommand)]
    Key(KeyCommand),
    /// Check whether an API key is configured
    Status,
}

#[derive(Debug, clap::Args)]
pub struct Generate {
    /// Image URL or path to a local image
    pub image: String,

    /// Generate textures, not just the shape
    #[arg(long)]
    pub textures: bool,

    /// Don't remove the image background before generating
    #[arg(long)]
    pub keep_background: bool,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, clap::Args)]
pub struct Poll {
    /// Prediction id returned when the generation was started
    pub id: String,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, clap::Args)]
pub struct OutputArgs {
    /// Which of the returned models to show
    #[arg(long, value_enum, default_value_t)]
    pub select: OutputSelection,

    /// Save the model into this directory
    #[arg(short, long)]
    pub download: Option<PathBuf>,
}

#[derive(Debug, clap::Subcommand)]
pub enum KeyCommand {
    /// Store an API key
    Set { key: String },
    /// Forget the stored API key
    Clear,
}
