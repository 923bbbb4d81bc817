use std::{
    path::{Path, PathBuf},
    process::ExitCode,
};

use color_eyre::Result;
use engine::{
    Error,
    config::{config_path, load_config},
    credential::{ConfigCredentialStore, Credential, CredentialStore},
    image_source::{ImageFile, ImageSource},
    workflow::{GenerateOptions, Generator, announce_readiness},
};
use log::info;

use crate::{
    cli::{Cli, Command, KeyCommand, OutputArgs},
    terminal::{ModelLink, StatusLine},
};

pub mod cli;
pub mod terminal;

const KEY_HINT: &str = "Run `image_to_3d key set <key>` or pass --api-key";

pub async fn run(cli: Cli) -> Result<ExitCode> {
    let path = match cli.config {
        Some(path) => path,
        None => config_path()?,
    };
    let mut store = ConfigCredentialStore::new(path.clone());
    let mut status = StatusLine::default();

    match cli.command {
        Command::Key(KeyCommand::Set { key }) => {
            store.set(Credential::new(key)?)?;
            println!("API key stored in {}", path.display());
        }
        Command::Key(KeyCommand::Clear) => {
            store.clear()?;
            println!("API key cleared");
        }
        Command::Status => {
            if !announce_readiness(&store, &mut status)? {
                eprintln!("{KEY_HINT}");
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Generate(args) => {
            let credential = credential(cli.api_key, &store)?;
            let mut generator = Generator::from_config(&load_config(&path)?);
            let mut viewer = ModelLink::default();
            let options = GenerateOptions {
                generate_textures: args.textures,
                remove_background: !args.keep_background,
                selection: args.output.select,
            };

            let source = image_source(&args.image).await?;
            let res = generator
                .generate(
                    source,
                    options,
                    credential.as_ref(),
                    &mut status,
                    &mut viewer,
                )
                .await;
            // the status line already shows the error
            if let Err(e) = res {
                return Ok(failure(&e));
            }
            save_download(viewer, &args.output).await?;
        }
        Command::Poll(args) => {
            let credential = credential(cli.api_key, &store)?;
            let mut generator = Generator::from_config(&load_config(&path)?);
            let mut viewer = ModelLink::default();

            let res = generator
                .resume(
                    &args.id,
                    args.output.select,
                    credential.as_ref(),
                    &mut status,
                    &mut viewer,
                )
                .await;
            if let Err(e) = res {
                return Ok(failure(&e));
            }
            save_download(viewer, &args.output).await?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn hint(err: &Error) -> Option<&'static str> {
    matches!(err, Error::MissingCredential).then_some(KEY_HINT)
}

fn failure(err: &Error) -> ExitCode {
    if let Some(hint) = hint(err) {
        eprintln!("{hint}");
    }
    ExitCode::FAILURE
}

/// A key given on the command line wins over the stored one.
fn credential(flag: Option<String>, store: &impl CredentialStore) -> Result<Option<Credential>> {
    match flag {
        Some(key) => Ok(Some(Credential::new(key)?)),
        None => Ok(store.get()?),
    }
}

/// Existing paths are read as files, everything else is treated as a URL.
async fn image_source(image: &str) -> Result<ImageSource> {
    let path = Path::new(image);
    if path.is_file() {
        info!("Reading image from {}", path.display());
        Ok(ImageFile::read(path).await?.into())
    } else {
        Ok(ImageSource::Url(image.to_string()))
    }
}

async fn save_download(viewer: ModelLink, output: &OutputArgs) -> Result<Option<PathBuf>> {
    let (Some(download), Some(dir)) = (viewer.download, &output.download) else {
        return Ok(None);
    };
    let path = download.save_to(&reqwest::Client::new(), dir).await?;
    println!("Saved to {}", path.display());
    Ok(Some(path))
}
