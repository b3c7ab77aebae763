//! Jikan catalog client module.
//!
//! Every request to the rate-limited Jikan v4 API goes through a single
//! [`Dispatcher`]: one call in flight, FIFO order, fixed spacing between
//! calls. [`JikanClient`] translates catalog queries into dispatcher
//! submissions and [`AggregateResolver`] resolves batches of ids on top.

mod api;
mod client;
mod dispatcher;
mod params;
mod resolver;
mod transport;
mod types;
mod util;

pub use api::{CatalogApi, LocalCatalogApi};
#[allow(clippy::module_name_repetitions)]
pub use client::{JikanClient, JikanClientBuilder};
pub use dispatcher::{
    DEFAULT_SPACING, Dispatcher, DispatcherConfig, DispatcherSnapshot, PendingResponse,
};
pub use params::{CatalogRequest, MediaType, PAGE_LIMIT, TOP_LIMIT, TopFilter};
pub use resolver::{AggregateResolver, DEFAULT_ITEM_DELAY, Progress};
pub use transport::{HttpTransport, LocalTransport, Transport};
pub use types::{
    Anime, Character, CharacterEntry, Genre, ImageUrls, Images, NamedResource, PaginatedResult,
    Person, Recommendation, RecommendedEntry, VoiceActor,
};
pub use util::{DEFAULT_MIN_GENRE_COUNT, popular_genres};
