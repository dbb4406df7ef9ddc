use reelscout_core::models::{
    EARLIEST_YEAR, Genre, Movie, MovieDetails, RATING_CHOICES, SearchSnapshot, SortOrder,
    WatchlistEntry, YEAR_CHOICES_SHOWN, year_choices,
};

fn movie_line(movie: &Movie) -> String {
    format!(
        "{:>8}  {} ({})  ★ {:.1}",
        movie.id,
        movie.title,
        movie.release_year().unwrap_or("----"),
        movie.vote_average
    )
}

pub fn print_movies(heading: &str, movies: &[Movie]) {
    println!("{}", heading);
    if movies.is_empty() {
        println!("  No movies found");
        return;
    }
    for movie in movies {
        println!("{}", movie_line(movie));
    }
}

pub fn print_search(snapshot: &SearchSnapshot) {
    if snapshot.query.is_empty() {
        println!("Search for a movie");
        return;
    }
    if snapshot.results.is_empty() {
        println!("No movies found");
        println!("Try adjusting your search or filters");
        return;
    }

    println!(
        "{} results found (page {} of {}, sort: {})",
        snapshot.results.len(),
        snapshot.current_page,
        snapshot.total_pages,
        snapshot.sort.label()
    );
    for movie in &snapshot.results {
        println!("{}", movie_line(movie));
    }
    if snapshot.has_more() {
        println!("More results available (use --pages)");
    }
}

pub fn print_filters() {
    println!("Sort orders");
    for order in SortOrder::ALL {
        println!("  {:<20} {}", order.as_param(), order.label());
    }

    let years: Vec<String> = year_choices()
        .iter()
        .take(YEAR_CHOICES_SHOWN)
        .map(|y| y.to_string())
        .collect();
    println!("Years");
    println!("  {} ... {}", years.join(", "), EARLIEST_YEAR);

    println!("Minimum ratings");
    for rating in RATING_CHOICES {
        if rating == 0 {
            println!("  {:<3} All Ratings", rating);
        } else {
            println!("  {:<3} {}+ Stars", rating, rating);
        }
    }
}

pub fn print_genres(genres: &[Genre]) {
    for genre in genres {
        println!("{:>6}  {}", genre.id, genre.name);
    }
}

pub fn print_details(details: &MovieDetails) {
    let movie = &details.movie;
    println!("{}", movie.title);
    if let Some(tagline) = &details.tagline {
        println!("\"{}\"", tagline);
    }
    if !movie.release_date.is_empty() {
        println!("Released: {}", movie.release_date);
    }
    if let Some(runtime) = details.formatted_runtime() {
        println!("Runtime: {}", runtime);
    }
    println!("★ {:.1}/10", movie.vote_average);
    if !details.genres.is_empty() {
        println!("Genres: {}", details.genres.join(", "));
    }
    println!();
    println!("{}", movie.overview);
}

pub fn print_watchlist(entries: &[&WatchlistEntry]) {
    println!("My Watchlist");
    if entries.is_empty() {
        println!("  Your watchlist is empty");
        return;
    }
    for entry in entries {
        println!("{}  added {}", movie_line(&entry.movie), entry.added_at);
    }
}
