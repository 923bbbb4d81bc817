use std::path::{Path, PathBuf};

use chrono::Utc;
use log::info;
use nonempty::NonEmpty;
use reqwest::Client;
use strum::Display;

use crate::{Error, Result, prediction::PredictionJob};

pub const MODEL_EXTENSION: &str = "glb";

/// Which of the service's output URLs ends up in the viewer.
#[derive(Debug, Clone, Copy, Display, clap::ValueEnum, PartialEq, Eq, Default)]
pub enum OutputSelection {
    First,
    #[default]
    Last,
}

impl OutputSelection {
    pub fn select<'a>(&self, output: &'a NonEmpty<String>) -> &'a String {
        match self {
            OutputSelection::First => output.first(),
            OutputSelection::Last => output.last(),
        }
    }
}

/// Wherever the finished model is shown.
pub trait ViewerSurface {
    fn show(&mut self, model_url: &str);
    fn offer_download(&mut self, download: DownloadAction);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadAction {
    url: String,
}

impl DownloadAction {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// `generated-model-<unix millis>.glb`
    pub fn file_name(&self) -> String {
        Self::file_name_at(Utc::now().timestamp_millis())
    }

    fn file_name_at(millis: i64) -> String {
        format!("generated-model-{millis}.{MODEL_EXTENSION}")
    }

    /// Downloads the model into `dir` and returns where it landed.
    pub async fn save_to(&self, client: &Client, dir: &Path) -> Result<PathBuf> {
        let bytes = client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(self.file_name());
        tokio::fs::write(&path, &bytes).await?;
        info!("Saved {} bytes to {}", bytes.len(), path.display());
        Ok(path)
    }
}

/// Puts one of a succeeded job's outputs in the viewer and returns its URL.
pub fn present(
    job: PredictionJob,
    selection: OutputSelection,
    viewer: &mut (impl ViewerSurface + ?Sized),
) -> Result<String> {
    let output = job
        .output
        .and_then(NonEmpty::from_vec)
        .ok_or(Error::EmptyOutput)?;
    let url = selection.select(&output).clone();

    viewer.show(&url);
    viewer.offer_download(DownloadAction::new(url.clone()));
    Ok(url)
}
