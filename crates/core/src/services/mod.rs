pub mod account_store;
pub mod auth;
pub mod browse;
pub mod debounce;
pub mod details;
pub mod firebase;
pub mod gateway;
pub mod memory_store;
pub mod search;
pub mod tmdb;
pub mod trailer;
pub mod watchlist;

pub use account_store::{AccountStore, Document};
pub use auth::AuthService;
pub use browse::{BrowseService, HomeFeed};
pub use debounce::{DebounceEvent, Debouncer};
pub use details::{MovieDetailsLoader, MovieDetailsView};
pub use firebase::FirebaseAccountStore;
pub use gateway::MetadataGateway;
pub use memory_store::MemoryAccountStore;
pub use search::{SearchController, SearchOptions, SearchOutcome};
pub use tmdb::TmdbService;
pub use trailer::{TrailerPlayer, TrailerResolution, TrailerResolver, select_best_trailer};
pub use watchlist::{WatchlistOutcome, WatchlistSync};
