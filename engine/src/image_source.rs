use std::path::Path;

use bytes::Bytes;
use derive_more::From;
use log::{debug, info};
use reqwest::{
    Client, StatusCode, Url,
    multipart::{Form, Part},
};
use serde::Deserialize;

use crate::{BoxFuture, Error, Result};

/// What the user handed us: either a link to an image or the image itself.
#[derive(Debug, Clone, From)]
pub enum ImageSource {
    Url(String),
    File(ImageFile),
}

#[derive(Debug, Clone)]
pub struct ImageFile {
    pub file_name: String,
    /// Declared media type, e.g. `image/png`
    pub media_type: String,
    pub data: Bytes,
}

impl ImageFile {
    /// Reads a file from disk, guessing its media type from the extension.
    pub async fn read(path: &Path) -> Result<Self> {
        let data = tokio::fs::read(path).await?;
        let media_type = mime_guess::from_path(path)
            .first_raw()
            .unwrap_or("application/octet-stream")
            .to_string();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".into());
        Ok(Self {
            file_name,
            media_type,
            data: data.into(),
        })
    }

    fn is_image(&self) -> bool {
        self.media_type.starts_with("image/")
    }
}

/// Somewhere to put a local image so the generation service can fetch it.
pub trait ImageHost {
    fn upload<'a>(&'a self, file: &'a ImageFile) -> BoxFuture<'a, Result<String>>;
}

/// Turns any [`ImageSource`] into an absolute URL the generation service can read.
pub async fn resolve(source: ImageSource, host: &(impl ImageHost + ?Sized)) -> Result<String> {
    match source {
        ImageSource::Url(url) => {
            let url = url.trim();
            if url.is_empty() {
                return Err(Error::invalid_input("Please enter an image URL"));
            }
            Url::parse(url).map_err(|e| Error::invalid_input(format!("{url:?}: {e}")))?;
            Ok(url.to_string())
        }
        ImageSource::File(file) => {
            if !file.is_image() {
                return Err(Error::invalid_input(format!(
                    "{} is not an image ({})",
                    file.file_name, file.media_type
                )));
            }
            let url = host.upload(&file).await?;
            info!("Uploaded {} to {url}", file.file_name);
            Ok(url)
        }
    }
}

/// Uploads through a single multipart POST, expecting `{"url": ...}` back.
#[derive(Clone)]
pub struct HttpImageHost {
    client: Client,
    endpoint: String,
}

impl HttpImageHost {
    pub fn new(client: Client, endpoint: String) -> Self {
        Self { client, endpoint }
    }
}

impl ImageHost for HttpImageHost {
    fn upload<'a>(&'a self, file: &'a ImageFile) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move {
            let part = Part::bytes(file.data.to_vec())
                .file_name(file.file_name.clone())
                .mime_str(&file.media_type)?;
            let form = Form::new().part("file", part);

            debug!("Uploading {} bytes to {}", file.data.len(), self.endpoint);
            let resp = self
                .client
                .post(&self.endpoint)
                .multipart(form)
                .send()
                .await?;

            let status = resp.status();
            let body = resp.text().await?;
            parse_upload_response(status, &body)
        })
    }
}

#[derive(Deserialize)]
struct UploadResponse {
    url: Option<String>,
}

fn parse_upload_response(status: StatusCode, body: &str) -> Result<String> {
    let failed = |body: String| Error::UploadFailed { status, body };
    if !status.is_success() {
        return Err(failed(body.to_string()));
    }
    serde_json::from_str::<UploadResponse>(body)
        .ok()
        .and_then(|r| r.url)
        .filter(|url| !url.is_empty())
        .ok_or_else(|| failed(format!("response has no url: {body}")))
}
