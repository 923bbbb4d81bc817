use std::{fmt, path::PathBuf};

use log::info;

use crate::{
    Error, Result,
    config::{load_config, save_config},
};

/// API key for the generation service. Only ever sent as the `x-api-key` header.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Trims the key, rejecting it when nothing is left.
    pub fn new(key: impl AsRef<str>) -> Result<Self> {
        let key = key.as_ref().trim();
        if key.is_empty() {
            Err(Error::MissingCredential)
        } else {
            Ok(Self(key.to_string()))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Ensures a credential is present, without touching the network.
pub fn require(credential: Option<&Credential>) -> Result<&Credential> {
    credential.ok_or(Error::MissingCredential)
}

pub trait CredentialStore {
    fn get(&self) -> Result<Option<Credential>>;
    fn set(&mut self, credential: Credential) -> Result<()>;
    fn clear(&mut self) -> Result<()>;
}

/// Stores the key in the `api_key` field of the RON config file.
pub struct ConfigCredentialStore {
    path: PathBuf,
}

impl ConfigCredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl CredentialStore for ConfigCredentialStore {
    fn get(&self) -> Result<Option<Credential>> {
        let cfg = load_config(&self.path)?;
        // an empty key in the file counts as no key
        Ok(cfg.api_key.and_then(|k| Credential::new(k).ok()))
    }

    fn set(&mut self, credential: Credential) -> Result<()> {
        let mut cfg = load_config(&self.path)?;
        cfg.api_key = Some(credential.0);
        save_config(&self.path, &cfg)?;
        info!("API key stored in {}", self.path.display());
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        let mut cfg = load_config(&self.path)?;
        cfg.api_key = None;
        save_config(&self.path, &cfg)?;
        info!("API key cleared from {}", self.path.display());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryCredentialStore(Option<Credential>);

impl CredentialStore for MemoryCredentialStore {
    fn get(&self) -> Result<Option<Credential>> {
        Ok(self.0.clone())
    }

    fn set(&mut self, credential: Credential) -> Result<()> {
        self.0 = Some(credential);
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.0 = None;
        Ok(())
    }
}
