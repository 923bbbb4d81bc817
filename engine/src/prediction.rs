use log::{debug, info, warn};
use reqwest::{Client, StatusCode, Url, header};
use serde::{Deserialize, Serialize};

use crate::{
    BoxFuture, Error, Result,
    credential::{self, Credential},
};

pub const HUNYUAN3D_MODEL: &str = "tencent/hunyuan3d-2";
pub const STEPS: u32 = 5;
pub const OCTREE_RESOLUTION: &str = "256";
pub const GUIDANCE_SCALE: f64 = 5.5;

/// One user-triggered generation.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub image_url: String,
    pub generate_textures: bool,
    pub remove_background: bool,
}

impl GenerationRequest {
    pub fn new(image_url: impl Into<String>) -> Self {
        Self {
            image_url: image_url.into(),
            generate_textures: false,
            remove_background: true,
        }
    }

    pub fn generate_textures(mut self, yes: bool) -> Self {
        self.generate_textures = yes;
        self
    }

    pub fn remove_background(mut self, yes: bool) -> Self {
        self.remove_background = yes;
        self
    }

    fn to_body(&self) -> CreatePrediction {
        CreatePrediction {
            model: HUNYUAN3D_MODEL.into(),
            input: Hunyuan3dInput {
                image: self.image_url.clone(),
                shape_only: !self.generate_textures,
                check_box_rembg: self.remove_background,
                steps: STEPS,
                octree_resolution: OCTREE_RESOLUTION.into(),
                guidance_scale: GUIDANCE_SCALE,
                caption: String::new(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreatePrediction {
    pub model: String,
    pub input: Hunyuan3dInput,
}

#[derive(Debug, Serialize)]
pub struct Hunyuan3dInput {
    pub image: String,
    pub shape_only: bool,
    pub check_box_rembg: bool,
    pub steps: u32,
    pub octree_resolution: String,
    pub guidance_scale: f64,
    pub caption: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionStatus {
    Succeeded,
    Failed,
    /// `starting`, `processing` and whatever else the service reports while busy
    #[default]
    #[serde(other)]
    Pending,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PredictionJob {
    pub id: String,
    #[serde(default)]
    pub status: PredictionStatus,
    #[serde(default)]
    pub output: Option<Vec<String>>,
    #[serde(default)]
    pub error: Option<String>,
}

/// The two endpoints of the prediction service.
pub trait PredictionApi {
    fn create<'a>(
        &'a self,
        body: &'a CreatePrediction,
        credential: &'a Credential,
    ) -> BoxFuture<'a, Result<PredictionJob>>;

    fn get<'a>(&'a self, id: &'a str, credential: &'a Credential)
    -> BoxFuture<'a, Result<PredictionJob>>;
}

/// Starts a prediction and returns the freshly created job.
pub async fn submit(
    api: &(impl PredictionApi + ?Sized),
    request: &GenerationRequest,
    credential: Option<&Credential>,
) -> Result<PredictionJob> {
    let credential = credential::require(credential)?;
    if request.image_url.trim().is_empty() {
        return Err(Error::invalid_input("Image URL is required"));
    }

    let job = api.create(&request.to_body(), credential).await?;
    info!("Prediction {} created", job.id);
    Ok(job)
}

#[derive(Clone)]
pub struct SynexaClient {
    client: Client,
    api_base: String,
}

impl SynexaClient {
    pub fn new(client: Client, api_base: impl Into<String>) -> Self {
        Self {
            client,
            api_base: api_base.into(),
        }
    }

    /// `<api-base>/v1/predictions[/<id>]`, with the id escaped as a single path segment.
    fn predictions_url(&self, id: Option<&str>) -> Result<Url> {
        let bad_base =
            |reason: String| Error::Config(format!("api_base {:?}: {reason}", self.api_base));
        let mut url = Url::parse(&self.api_base).map_err(|e| bad_base(e.to_string()))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| bad_base("can't be a base".into()))?;
            segments.pop_if_empty().extend(["v1", "predictions"]);
            if let Some(id) = id {
                segments.push(id);
            }
        }
        Ok(url)
    }
}

impl PredictionApi for SynexaClient {
    fn create<'a>(
        &'a self,
        body: &'a CreatePrediction,
        credential: &'a Credential,
    ) -> BoxFuture<'a, Result<PredictionJob>> {
        Box::pin(async move {
            let resp = self
                .client
                .post(self.predictions_url(None)?)
                .header("x-api-key", credential.expose())
                .header(header::CONTENT_TYPE, "application/json")
                .json(body)
                .send()
                .await?;

            let status = resp.status();
            let text = resp.text().await?;
            debug!("Create response {status}: {text}");
            if !status.is_success() {
                return Err(creation_error(status, &text));
            }
            Ok(serde_json::from_str(&text)?)
        })
    }

    fn get<'a>(
        &'a self,
        id: &'a str,
        credential: &'a Credential,
    ) -> BoxFuture<'a, Result<PredictionJob>> {
        Box::pin(async move {
            let resp = self
                .client
                .get(self.predictions_url(Some(id))?)
                .header("x-api-key", credential.expose())
                .send()
                .await?;

            let status = resp.status();
            if !status.is_success() {
                return Err(Error::api(format!(
                    "Failed to get prediction status: {}",
                    status.as_u16()
                )));
            }
            let text = resp.text().await?;
            debug!("Status response for {id}: {text}");
            Ok(serde_json::from_str(&text)?)
        })
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

fn creation_error(status: StatusCode, body: &str) -> Error {
    let message = match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.message,
        Err(e) => {
            warn!("Couldn't parse error body ({e}): {body}");
            None
        }
    };
    Error::api(message.unwrap_or_else(|| {
        format!(
            "API request failed: {} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or_default()
        )
    }))
}
