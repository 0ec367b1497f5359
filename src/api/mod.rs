//! Admin REST API: transport seam, wire types, domain types, and clients.

pub mod api_types;
mod cache;
mod cached_client;
mod client;
pub mod mock;
pub mod transport;
pub mod types;

pub use cache::{AdminQueryKey, PROFILE_CACHE_KEY};
pub use cached_client::CachedClient;
pub use client::ApiClient;
