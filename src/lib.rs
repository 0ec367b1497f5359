//! Data layer for the Souk marketplace admin console.
//!
//! Pages own a [`query::Query`] whose fetcher calls a [`api::CachedClient`]:
//! reads are served from a TTL cache when fresh, mutations replace cached
//! entities with the server's authoritative response, and every outcome is
//! reported through an injected [`notify::Notifier`]. Rendering, routing and
//! the backend itself live elsewhere; this crate only owns the data plumbing
//! between them.
//!
//! ```no_run
//! use souk::api::CachedClient;
//! use souk::notify::{ChannelSink, Notifier};
//! use souk::Config;
//!
//! # async fn run() -> souk::Result<()> {
//! let config = Config::load(None)?;
//! let (sink, mut notifications) = ChannelSink::new();
//! let client = CachedClient::new(&config, Notifier::new(sink))?;
//!
//! let profile = client.profile(false).await?;
//! println!("signed in as {}", profile.name);
//!
//! while let Some(n) = notifications.recv().await {
//!   println!("[{}] {}", n.title, n.message);
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod notify;
pub mod query;

pub use config::Config;
pub use error::{Error, ErrorKind, Result};
