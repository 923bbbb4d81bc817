use log::{error, info};
use reqwest::Client;
use strum::Display;

use crate::{
    Result,
    config::Config,
    credential::{self, Credential, CredentialStore},
    image_source::{self, HttpImageHost, ImageHost, ImageSource},
    poll::{self, PollConfig, Sleeper, TokioSleeper},
    prediction::{self, GenerationRequest, PredictionApi, SynexaClient},
    present::{self, OutputSelection, ViewerSurface},
};

pub const STARTING_MESSAGE: &str = "Starting 3D generation...";
pub const STARTED_MESSAGE: &str = "Generation started, waiting for result...";
pub const SUCCESS_MESSAGE: &str = "3D model generated successfully!";
pub const READY_MESSAGE: &str = "Ready to generate your 3D model";
pub const KEY_REQUIRED_MESSAGE: &str = "API key required";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum StatusKind {
    Loading,
    Success,
    Error,
}

/// The single status line the user watches, plus the "Generate" control.
pub trait StatusReporter {
    fn report(&mut self, message: &str, kind: StatusKind);

    /// Called with `true` when a run starts and `false` once it is over, whatever the outcome.
    fn set_busy(&mut self, _busy: bool) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerateOptions {
    pub generate_textures: bool,
    pub remove_background: bool,
    pub selection: OutputSelection,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            generate_textures: false,
            remove_background: true,
            selection: OutputSelection::default(),
        }
    }
}

/// Drives resolve → submit → poll → present for one image at a time.
pub struct Generator<A, H, S = TokioSleeper> {
    api: A,
    host: H,
    sleeper: S,
    poll_config: PollConfig,
    in_flight: Option<String>,
}

impl Generator<SynexaClient, HttpImageHost> {
    pub fn from_config(cfg: &Config) -> Self {
        let client = Client::new();
        Self::new(
            SynexaClient::new(client.clone(), cfg.api_base.clone()),
            HttpImageHost::new(client, cfg.upload_endpoint.clone()),
            TokioSleeper,
        )
    }
}

impl<A, H, S> Generator<A, H, S>
where
    A: PredictionApi,
    H: ImageHost,
    S: Sleeper,
{
    pub fn new(api: A, host: H, sleeper: S) -> Self {
        Self {
            api,
            host,
            sleeper,
            poll_config: PollConfig::default(),
            in_flight: None,
        }
    }

    pub fn with_poll_config(mut self, poll_config: PollConfig) -> Self {
        self.poll_config = poll_config;
        self
    }

    /// Id of the prediction currently being polled, if any.
    pub fn in_flight(&self) -> Option<&str> {
        self.in_flight.as_deref()
    }

    /// Runs a whole generation and returns the URL that was handed to the viewer.
    ///
    /// Every outcome is reported on `ui`, and `ui` is released again afterwards
    /// so the user can retry.
    pub async fn generate(
        &mut self,
        source: ImageSource,
        options: GenerateOptions,
        credential: Option<&Credential>,
        ui: &mut (impl StatusReporter + ?Sized),
        viewer: &mut (impl ViewerSurface + ?Sized),
    ) -> Result<String> {
        ui.set_busy(true);
        let res = self.run(source, options, credential, ui, viewer).await;
        self.finish(res, ui)
    }

    /// Picks up a prediction that was created earlier and waits for it to finish.
    pub async fn resume(
        &mut self,
        job_id: &str,
        selection: OutputSelection,
        credential: Option<&Credential>,
        ui: &mut (impl StatusReporter + ?Sized),
        viewer: &mut (impl ViewerSurface + ?Sized),
    ) -> Result<String> {
        ui.set_busy(true);
        let res = match credential::require(credential) {
            Ok(credential) => {
                self.wait_and_present(job_id, selection, credential, ui, viewer)
                    .await
            }
            Err(e) => Err(e),
        };
        self.finish(res, ui)
    }

    async fn run(
        &mut self,
        source: ImageSource,
        options: GenerateOptions,
        credential: Option<&Credential>,
        ui: &mut (impl StatusReporter + ?Sized),
        viewer: &mut (impl ViewerSurface + ?Sized),
    ) -> Result<String> {
        let credential = credential::require(credential)?;
        ui.report(STARTING_MESSAGE, StatusKind::Loading);

        let image_url = image_source::resolve(source, &self.host).await?;
        let request = GenerationRequest::new(image_url)
            .generate_textures(options.generate_textures)
            .remove_background(options.remove_background);

        let job = prediction::submit(&self.api, &request, Some(credential)).await?;
        ui.report(STARTED_MESSAGE, StatusKind::Loading);

        self.wait_and_present(&job.id, options.selection, credential, ui, viewer)
            .await
    }

    async fn wait_and_present(
        &mut self,
        job_id: &str,
        selection: OutputSelection,
        credential: &Credential,
        ui: &mut (impl StatusReporter + ?Sized),
        viewer: &mut (impl ViewerSurface + ?Sized),
    ) -> Result<String> {
        self.in_flight = Some(job_id.to_string());
        let done = poll::poll(
            &self.api,
            job_id,
            credential,
            &self.poll_config,
            &self.sleeper,
            |percent, message| ui.report(&format!("{message} ({percent}%)"), StatusKind::Loading),
        )
        .await;
        self.in_flight = None;

        present::present(done?, selection, viewer)
    }

    fn finish(
        &mut self,
        res: Result<String>,
        ui: &mut (impl StatusReporter + ?Sized),
    ) -> Result<String> {
        match &res {
            Ok(url) => {
                info!("Model ready at {url}");
                ui.report(SUCCESS_MESSAGE, StatusKind::Success);
            }
            Err(e) => {
                error!("Generation error: {e}");
                ui.report(&format!("Error: {e}"), StatusKind::Error);
            }
        }
        ui.set_busy(false);
        res
    }
}

/// Tells the user whether a key is configured. Returns whether one is.
pub fn announce_readiness(
    store: &(impl CredentialStore + ?Sized),
    ui: &mut (impl StatusReporter + ?Sized),
) -> Result<bool> {
    let ready = store.get()?.is_some();
    if ready {
        ui.report(READY_MESSAGE, StatusKind::Success);
    } else {
        ui.report(KEY_REQUIRED_MESSAGE, StatusKind::Error);
    }
    Ok(ready)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::{
        Error,
        credential::MemoryCredentialStore,
        image_source::tests::{CountingHost, file},
        poll::tests::{NoSleep, ScriptedApi, job},
        prediction::PredictionStatus,
        present::tests::RecordingViewer,
    };

    #[derive(Debug, Default)]
    struct RecordingReporter {
        messages: Vec<(String, StatusKind)>,
        busy: Vec<bool>,
    }

    impl StatusReporter for RecordingReporter {
        fn report(&mut self, message: &str, kind: StatusKind) {
            self.messages.push((message.to_string(), kind));
        }

        fn set_busy(&mut self, busy: bool) {
            self.busy.push(busy);
        }
    }

    impl RecordingReporter {
        fn last(&self) -> &(String, StatusKind) {
            self.messages.last().expect("nothing reported")
        }
    }

    fn key() -> Credential {
        Credential::new("k").unwrap()
    }

    #[tokio::test]
    async fn uploaded_file_end_to_end() -> Result<()> {
        let api = ScriptedApi::new([Ok(job(
            "42",
            PredictionStatus::Succeeded,
            &["http://host/model.glb"],
        ))]);
        let mut generator = Generator::new(api, CountingHost::default(), NoSleep::default());
        let mut ui = RecordingReporter::default();
        let mut viewer = RecordingViewer::default();

        let url = generator
            .generate(
                file("image/png").into(),
                GenerateOptions::default(),
                Some(&key()),
                &mut ui,
                &mut viewer,
            )
            .await?;

        assert_eq!(url, "http://host/model.glb");
        assert_eq!(viewer.shown, ["http://host/model.glb"]);
        assert_eq!(
            *generator.api.submitted_images.lock().unwrap(),
            ["http://host/x.png"]
        );
        assert_eq!(generator.host.uploads.load(Ordering::SeqCst), 1);
        assert_eq!(generator.api.gets.load(Ordering::SeqCst), 1);
        assert_eq!(
            ui.messages,
            [
                (STARTING_MESSAGE.to_string(), StatusKind::Loading),
                (STARTED_MESSAGE.to_string(), StatusKind::Loading),
                (SUCCESS_MESSAGE.to_string(), StatusKind::Success),
            ]
        );
        assert_eq!(ui.busy, [true, false]);
        assert_eq!(generator.in_flight(), None);
        Ok(())
    }

    #[tokio::test]
    async fn progress_is_reported_while_pending() -> Result<()> {
        let api = ScriptedApi::new([
            Ok(job("42", PredictionStatus::Pending, &[])),
            Ok(job("42", PredictionStatus::Succeeded, &["a.glb", "b.glb"])),
        ]);
        let mut generator = Generator::new(api, CountingHost::default(), NoSleep::default());
        let mut ui = RecordingReporter::default();
        let mut viewer = RecordingViewer::default();

        let url = generator
            .generate(
                "https://example.com/cat.png".to_string().into(),
                GenerateOptions::default(),
                Some(&key()),
                &mut ui,
                &mut viewer,
            )
            .await?;

        assert_eq!(url, "b.glb");
        assert!(
            ui.messages
                .contains(&("Generating... (0%)".to_string(), StatusKind::Loading))
        );
        assert_eq!(generator.host.uploads.load(Ordering::SeqCst), 0);
        Ok(())
    }

    #[tokio::test]
    async fn missing_key_touches_nothing_and_releases_the_trigger() {
        let mut generator = Generator::new(
            ScriptedApi::default(),
            CountingHost::default(),
            NoSleep::default(),
        );
        let mut ui = RecordingReporter::default();
        let mut viewer = RecordingViewer::default();

        let res = generator
            .generate(
                file("image/png").into(),
                GenerateOptions::default(),
                None,
                &mut ui,
                &mut viewer,
            )
            .await;

        assert!(matches!(res, Err(Error::MissingCredential)));
        assert_eq!(generator.host.uploads.load(Ordering::SeqCst), 0);
        assert_eq!(generator.api.creates.load(Ordering::SeqCst), 0);
        assert_eq!(ui.last().1, StatusKind::Error);
        assert_eq!(ui.last().0, "Error: API key not found");
        assert_eq!(ui.busy, [true, false]);
    }

    #[tokio::test]
    async fn failed_generation_is_reported() {
        let mut failed = job("42", PredictionStatus::Failed, &[]);
        failed.error = Some("boom".into());
        let mut generator = Generator::new(
            ScriptedApi::new([Ok(failed)]),
            CountingHost::default(),
            NoSleep::default(),
        );
        let mut ui = RecordingReporter::default();
        let mut viewer = RecordingViewer::default();

        let res = generator
            .generate(
                "https://example.com/cat.png".to_string().into(),
                GenerateOptions::default(),
                Some(&key()),
                &mut ui,
                &mut viewer,
            )
            .await;

        assert!(matches!(res, Err(Error::GenerationFailed(_))));
        assert_eq!(ui.last(), &("Error: boom".to_string(), StatusKind::Error));
        assert!(viewer.shown.is_empty());
        assert_eq!(ui.busy, [true, false]);
        assert_eq!(generator.in_flight(), None);
    }

    #[tokio::test]
    async fn timeout_with_short_budget() {
        let mut generator = Generator::new(
            ScriptedApi::default(),
            CountingHost::default(),
            NoSleep::default(),
        )
        .with_poll_config(PollConfig {
            max_attempts: 2,
            ..PollConfig::default()
        });
        let mut ui = RecordingReporter::default();
        let mut viewer = RecordingViewer::default();

        let res = generator
            .generate(
                "https://example.com/cat.png".to_string().into(),
                GenerateOptions::default(),
                Some(&key()),
                &mut ui,
                &mut viewer,
            )
            .await;

        assert!(matches!(res, Err(Error::Timeout { attempts: 2 })));
        assert_eq!(generator.sleeper.naps.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn resume_polls_existing_prediction() -> Result<()> {
        let api = ScriptedApi::new([Ok(job("7", PredictionStatus::Succeeded, &["a.glb"]))]);
        let mut generator = Generator::new(api, CountingHost::default(), NoSleep::default());
        let mut ui = RecordingReporter::default();
        let mut viewer = RecordingViewer::default();

        let url = generator
            .resume(
                "7",
                OutputSelection::Last,
                Some(&key()),
                &mut ui,
                &mut viewer,
            )
            .await?;

        assert_eq!(url, "a.glb");
        assert_eq!(generator.api.creates.load(Ordering::SeqCst), 0);
        assert_eq!(ui.last().1, StatusKind::Success);
        Ok(())
    }

    #[test]
    fn readiness() -> Result<()> {
        let mut store = MemoryCredentialStore::default();
        let mut ui = RecordingReporter::default();

        assert!(!announce_readiness(&store, &mut ui)?);
        assert_eq!(ui.last(), &(KEY_REQUIRED_MESSAGE.to_string(), StatusKind::Error));

        store.set(key())?;
        assert!(announce_readiness(&store, &mut ui)?);
        assert_eq!(ui.last(), &(READY_MESSAGE.to_string(), StatusKind::Success));
        Ok(())
    }
}
