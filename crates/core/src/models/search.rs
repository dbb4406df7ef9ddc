use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};

use super::Movie;

/// Oldest year offered by the year facet.
pub const EARLIEST_YEAR: i32 = 1990;

/// Number of recent years the year selector shows.
pub const YEAR_CHOICES_SHOWN: usize = 10;

/// Minimum-rating thresholds offered by the rating facet. `0` reads as "All Ratings".
pub const RATING_CHOICES: [u8; 6] = [9, 8, 7, 6, 5, 0];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SortOrder {
    #[default]
    #[serde(rename = "popularity.desc")]
    PopularityDesc,
    #[serde(rename = "popularity.asc")]
    PopularityAsc,
    #[serde(rename = "release_date.desc")]
    ReleaseDateDesc,
    #[serde(rename = "release_date.asc")]
    ReleaseDateAsc,
    #[serde(rename = "vote_average.desc")]
    VoteAverageDesc,
    #[serde(rename = "vote_average.asc")]
    VoteAverageAsc,
    #[serde(rename = "title.asc")]
    TitleAsc,
    #[serde(rename = "title.desc")]
    TitleDesc,
}

impl SortOrder {
    pub const ALL: [SortOrder; 8] = [
        SortOrder::PopularityDesc,
        SortOrder::PopularityAsc,
        SortOrder::ReleaseDateDesc,
        SortOrder::ReleaseDateAsc,
        SortOrder::VoteAverageDesc,
        SortOrder::VoteAverageAsc,
        SortOrder::TitleAsc,
        SortOrder::TitleDesc,
    ];

    /// Value of the gateway's `sort_by` parameter.
    pub fn as_param(&self) -> &'static str {
        match self {
            SortOrder::PopularityDesc => "popularity.desc",
            SortOrder::PopularityAsc => "popularity.asc",
            SortOrder::ReleaseDateDesc => "release_date.desc",
            SortOrder::ReleaseDateAsc => "release_date.asc",
            SortOrder::VoteAverageDesc => "vote_average.desc",
            SortOrder::VoteAverageAsc => "vote_average.asc",
            SortOrder::TitleAsc => "title.asc",
            SortOrder::TitleDesc => "title.desc",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortOrder::PopularityDesc => "Most Popular",
            SortOrder::PopularityAsc => "Least Popular",
            SortOrder::ReleaseDateDesc => "Newest",
            SortOrder::ReleaseDateAsc => "Oldest",
            SortOrder::VoteAverageDesc => "Highest Rated",
            SortOrder::VoteAverageAsc => "Lowest Rated",
            SortOrder::TitleAsc => "A-Z",
            SortOrder::TitleDesc => "Z-A",
        }
    }
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortOrder::ALL
            .into_iter()
            .find(|order| order.as_param() == s)
            .ok_or_else(|| format!("unknown sort order: {}", s))
    }
}

/// The independently settable search facets. `None` means unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SearchFilters {
    pub genre: Option<i64>,
    pub year: Option<i32>,
    pub min_rating: Option<u8>,
}

impl SearchFilters {
    pub fn is_empty(&self) -> bool {
        self.genre.is_none() && self.year.is_none() && self.min_rating.is_none()
    }

    pub fn apply(&mut self, facet: Facet) {
        match facet {
            Facet::Genre(genre) => self.genre = genre,
            Facet::Year(year) => self.year = year,
            Facet::MinRating(rating) => self.min_rating = rating,
        }
    }

    /// Gateway parameters for the facets that are set. Unset facets produce no key at all.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(genre) = self.genre {
            pairs.push(("with_genres", genre.to_string()));
        }
        if let Some(year) = self.year {
            pairs.push(("primary_release_year", year.to_string()));
        }
        if let Some(rating) = self.min_rating {
            pairs.push(("vote_average.gte", rating.to_string()));
        }
        pairs
    }
}

/// A single facet update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facet {
    Genre(Option<i64>),
    Year(Option<i32>),
    MinRating(Option<u8>),
}

/// Years offered by the year facet, newest first, down to [`EARLIEST_YEAR`].
pub fn year_choices() -> Vec<i32> {
    let current = Utc::now().year();
    (EARLIEST_YEAR..=current).rev().collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchParams {
    pub query: String,
    /// 1-based.
    pub page: u32,
    pub filters: SearchFilters,
    pub sort: SortOrder,
}

impl SearchParams {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            page: 1,
            filters: SearchFilters::default(),
            sort: SortOrder::default(),
        }
    }

    pub fn signature(&self) -> RequestSignature {
        RequestSignature {
            query: self.query.clone(),
            filters: self.filters,
            sort: self.sort,
            page: self.page,
        }
    }
}

/// One page of search results from the gateway.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchPage {
    pub movies: Vec<Movie>,
    pub total_pages: u32,
    pub total_results: u32,
}

/// Identifies the state a search request was issued for. Responses whose signature no
/// longer matches the controller's pending request are dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestSignature {
    pub query: String,
    pub filters: SearchFilters,
    pub sort: SortOrder,
    pub page: u32,
}

/// Read-only view of a search session for presentation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchSnapshot {
    pub query: String,
    pub filters: SearchFilters,
    pub sort: SortOrder,
    pub results: Vec<Movie>,
    pub current_page: u32,
    pub total_pages: u32,
    pub loading: bool,
}

impl SearchSnapshot {
    pub fn has_more(&self) -> bool {
        self.current_page < self.total_pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_order_round_trips_param() {
        for order in SortOrder::ALL {
            assert_eq!(order.as_param().parse::<SortOrder>(), Ok(order));
        }
        assert!("rating.desc".parse::<SortOrder>().is_err());
        assert_eq!(SortOrder::default(), SortOrder::PopularityDesc);
        assert_eq!(SortOrder::default().label(), "Most Popular");
    }

    #[test]
    fn test_unset_facets_are_omitted() {
        let filters = SearchFilters {
            genre: None,
            year: Some(2021),
            min_rating: None,
        };
        assert_eq!(
            filters.query_pairs(),
            vec![("primary_release_year", "2021".to_string())]
        );
        assert!(SearchFilters::default().query_pairs().is_empty());
    }

    #[test]
    fn test_zero_rating_is_still_a_set_facet() {
        let mut filters = SearchFilters::default();
        filters.apply(Facet::MinRating(Some(0)));
        assert_eq!(
            filters.query_pairs(),
            vec![("vote_average.gte", "0".to_string())]
        );

        filters.apply(Facet::MinRating(None));
        assert!(filters.is_empty());
    }

    #[test]
    fn test_year_choices_bounded() {
        let years = year_choices();
        assert_eq!(*years.last().unwrap(), EARLIEST_YEAR);
        assert!(years.windows(2).all(|w| w[0] == w[1] + 1));
        assert!(years.len() >= YEAR_CHOICES_SHOWN);
    }

    #[test]
    fn test_has_more_until_last_page() {
        let mut snapshot = SearchSnapshot {
            current_page: 1,
            total_pages: 2,
            ..Default::default()
        };
        assert!(snapshot.has_more());

        snapshot.current_page = 2;
        assert!(!snapshot.has_more());
        assert!(!SearchSnapshot::default().has_more());
    }

    #[test]
    fn test_signature_includes_page() {
        let mut params = SearchParams::new("alien");
        let first = params.signature();
        params.page = 2;
        assert_ne!(first, params.signature());
    }
}
