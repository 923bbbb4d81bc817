use engine::{
    present::{DownloadAction, ViewerSurface},
    workflow::{StatusKind, StatusReporter},
};
use log::debug;

/// Prints status updates, one per line.
#[derive(Debug, Default)]
pub struct StatusLine;

impl StatusReporter for StatusLine {
    fn report(&mut self, message: &str, kind: StatusKind) {
        match kind {
            StatusKind::Error => eprintln!("[{kind}] {message}"),
            _ => println!("[{kind}] {message}"),
        }
    }

    fn set_busy(&mut self, busy: bool) {
        debug!("Generate {}", if busy { "locked" } else { "released" });
    }
}

/// Stands in for a 3D viewer: prints the model URL and keeps the download for later.
#[derive(Debug, Default)]
pub struct ModelLink {
    pub download: Option<DownloadAction>,
}

impl ViewerSurface for ModelLink {
    fn show(&mut self, model_url: &str) {
        println!("Model: {model_url}");
    }

    fn offer_download(&mut self, download: DownloadAction) {
        self.download = Some(download);
    }
}
