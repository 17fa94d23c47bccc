//! Remote collaborators: provider fetchers, Wikimedia and Play-Cricket
//! enrichment, and the GitHub-backed ratings store.
//!
//! Everything here performs network I/O through one shared [`HttpClient`].

pub mod client;
pub mod error;
pub mod fetch;
pub mod github;
pub mod images;
pub mod playcricket;

pub use client::{HttpClient, HttpConfig};
pub use error::{Error, Result};
pub use fetch::{Endpoints, Fetcher};
pub use github::{GithubConfig, GithubRatingsStore};
pub use images::{ImageConfig, ImageEnricher, ImageReport};
pub use playcricket::{PlayCricketClient, PlayCricketConfig, PlayCricketReport};
