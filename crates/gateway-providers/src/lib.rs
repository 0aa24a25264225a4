//! Upstream HTTP clients: the three catalog providers and the five debrid
//! resolvers, all built on one bounded, connection-pooled `reqwest::Client`.

pub mod debrid;
pub mod direct_host;
pub mod http_client;
pub mod torrent_a;
pub mod torrent_b;
pub mod traits;

pub use direct_host::DirectHostProvider;
pub use torrent_a::TorrentIndexAProvider;
pub use torrent_b::TorrentIndexBProvider;
pub use traits::{ContentKind, ContentQuery, ProviderRegistry, StreamProvider};
