use std::pin::Pin;

pub mod config;
pub mod credential;
pub mod error;
pub mod image_source;
pub mod poll;
pub mod prediction;
pub mod present;
pub mod workflow;

#[cfg(test)]
mod test_server;

pub use error::{Error, Result};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
