use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reelscout_core::Config;
use reelscout_core::models::{
    Credentials, EARLIEST_YEAR, Facet, RATING_CHOICES, Session, SortOrder, year_choices,
};
use reelscout_core::services::{
    AccountStore, AuthService, BrowseService, DebounceEvent, Debouncer, FirebaseAccountStore,
    MemoryAccountStore, MetadataGateway, MovieDetailsLoader, SearchController, SearchOutcome,
    TmdbService, TrailerResolution, TrailerResolver, WatchlistSync,
};

mod output;

#[derive(Parser)]
#[command(name = "reelscout")]
#[command(about = "Reelscout - discover movies and keep a watchlist")]
#[command(version)]
struct Cli {
    /// Keep accounts in memory instead of Firebase. Each run starts with a fresh
    /// account and an empty watchlist, and nothing is kept after it exits.
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search movies by title with optional facets
    Search {
        query: String,

        /// Genre id (see `reelscout genres`)
        #[arg(long)]
        genre: Option<i64>,

        /// Primary release year
        #[arg(long)]
        year: Option<i32>,

        /// Minimum average rating (see `reelscout filters`)
        #[arg(long)]
        min_rating: Option<u8>,

        /// Sort order, e.g. popularity.desc or vote_average.desc
        #[arg(long, default_value = "popularity.desc")]
        sort: SortOrder,

        /// Number of result pages to load
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// Search as you type: each stdin line is the full query text
    Live,
    /// Sort orders, years and ratings accepted by `search`
    Filters,
    /// Trending movies today
    Trending,
    /// Popular movies
    Popular,
    /// Movies now in theaters
    NowPlaying,
    /// Movie genres and their ids
    Genres,
    /// Popular movies of one genre
    Genre { id: i64 },
    /// Movie details
    Details { id: i64 },
    /// Resolve a movie's trailer
    Trailer { id: i64 },
    /// Manage your watchlist
    Watchlist {
        #[arg(long, env = "REELSCOUT_EMAIL")]
        email: String,

        #[arg(long, env = "REELSCOUT_PASSWORD", hide_env_values = true)]
        password: String,

        #[command(subcommand)]
        cmd: WatchlistCommands,
    },
}

#[derive(Subcommand)]
enum WatchlistCommands {
    /// Show the watchlist
    List,
    /// Add a movie by id
    Add { id: i64 },
    /// Remove a movie by id
    Remove { id: i64 },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file early for environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,reelscout_cli=debug,reelscout_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let gateway: Arc<dyn MetadataGateway> = Arc::new(TmdbService::from_config(&config));
    let browse = BrowseService::new(gateway.clone());

    match cli.command {
        Commands::Search {
            query,
            genre,
            year,
            min_rating,
            sort,
            pages,
        } => {
            if year.is_some_and(|y| !year_choices().contains(&y)) {
                anyhow::bail!("--year must be between {} and this year", EARLIEST_YEAR);
            }
            if min_rating.is_some_and(|r| !RATING_CHOICES.contains(&r)) {
                anyhow::bail!("--min-rating must be one of {:?}", RATING_CHOICES);
            }

            let controller = SearchController::new(gateway);
            for facet in [
                Facet::Genre(genre),
                Facet::Year(year),
                Facet::MinRating(min_rating),
            ] {
                if let Err(e) = controller.set_filter(facet).await {
                    tracing::warn!(error = %e, ?facet, "Applying filter failed");
                }
            }
            if let Err(e) = controller.set_sort(sort).await {
                tracing::warn!(error = %e, "Applying sort failed");
            }

            if let Err(e) = controller.set_query(query).await {
                tracing::warn!(error = %e, "Search failed");
            }
            let mut loaded = 1;
            while loaded < pages && controller.snapshot().has_more() {
                match controller.load_next_page().await {
                    Ok(SearchOutcome::Applied) => loaded += 1,
                    Ok(_) => break,
                    Err(e) => {
                        tracing::warn!(error = %e, "Loading more results failed");
                        break;
                    }
                }
            }
            output::print_search(&controller.snapshot());
        }
        Commands::Live => live_search(gateway, &config).await?,
        Commands::Filters => output::print_filters(),
        Commands::Trending => output::print_movies("Trending", &browse.trending().await),
        Commands::Popular => output::print_movies("Popular Movies", &browse.popular().await),
        Commands::NowPlaying => output::print_movies("Now Playing", &browse.now_playing().await),
        Commands::Genres => output::print_genres(&browse.genres().await),
        Commands::Genre { id } => {
            output::print_movies(&format!("Genre {}", id), &browse.by_genre(id).await)
        }
        Commands::Details { id } => {
            let resolver = Arc::new(TrailerResolver::with_host(
                gateway.clone(),
                config.trailer_host.clone(),
            ));
            let loader = MovieDetailsLoader::new(gateway, resolver);
            match loader.load(id).await {
                Some(view) => output::print_details(&view.movie),
                None => println!("Failed to load movie details"),
            }
        }
        Commands::Trailer { id } => {
            let resolver = TrailerResolver::with_host(gateway, config.trailer_host.clone());
            match resolver.resolve(id).await {
                TrailerResolution::Playable(video) => match video.embed_url() {
                    Some(url) => println!("{}", url),
                    None => println!("{} on {}", video.key, video.site),
                },
                TrailerResolution::Unsuitable(video) => {
                    println!("No suitable video found ({} on {})", video.name, video.site);
                }
                TrailerResolution::NotFound => println!("No trailer available"),
            }
        }
        Commands::Watchlist {
            email,
            password,
            cmd,
        } => {
            let store = account_store(&config, cli.offline)?;
            let auth = AuthService::new(store.clone());
            let credentials = Credentials { email, password };

            let session = if cli.offline {
                store
                    .sign_up(&credentials.email, &credentials.password)
                    .await
                    .map(Session::new)?
            } else {
                auth.login(credentials).await?
            };

            let mut watchlist = WatchlistSync::new(store, Some(session.clone()));
            watchlist.load().await?;

            match cmd {
                WatchlistCommands::List => {}
                WatchlistCommands::Add { id } => {
                    match gateway.fetch_movie_details(id).await? {
                        Some(details) => {
                            watchlist.add(details.movie).await?;
                        }
                        None => println!("Movie {} not found", id),
                    }
                }
                WatchlistCommands::Remove { id } => {
                    watchlist.remove(id).await?;
                }
            }

            output::print_watchlist(&watchlist.entries());
            watchlist.sign_out();
            auth.logout(session).await?;
        }
    }

    Ok(())
}

fn account_store(config: &Config, offline: bool) -> anyhow::Result<Arc<dyn AccountStore>> {
    if offline {
        return Ok(Arc::new(MemoryAccountStore::new()));
    }

    match config.firebase() {
        Some((api_key, project_id)) => Ok(Arc::new(FirebaseAccountStore::new(api_key, project_id))),
        None => anyhow::bail!("FIREBASE_API_KEY and FIREBASE_PROJECT_ID must be set (or pass --offline)"),
    }
}

async fn live_search(gateway: Arc<dyn MetadataGateway>, config: &Config) -> anyhow::Result<()> {
    let controller = Arc::new(SearchController::new(gateway));
    let (mut debouncer, mut events) = Debouncer::new(config.search_debounce());

    let searcher = {
        let controller = controller.clone();
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                let clearing = event == DebounceEvent::Clear;
                if let Err(e) = controller.apply_debounced(event).await {
                    tracing::warn!(error = %e, "Search failed");
                }
                if clearing {
                    println!("(cleared)");
                } else {
                    output::print_search(&controller.snapshot());
                }
            }
        })
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        debouncer.push(line);
    }

    // Let the last keystroke settle before exiting.
    while debouncer.is_pending() {
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    drop(debouncer);
    searcher.await?;
    Ok(())
}
