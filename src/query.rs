use crate::db::SqlParam;
use crate::rating::Rating;

/// Unfiltered read shown on every page load.
pub const DEFAULT_QUERY: &str =
    "SELECT DISTINCT title, description, rating, price FROM books ORDER BY title";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Rating,
    Price,
}

impl SortKey {
    pub fn parse(s: &str) -> Option<SortKey> {
        match s {
            "Rating" => Some(SortKey::Rating),
            "Price" => Some(SortKey::Price),
            _ => None,
        }
    }

    fn column(self) -> &'static str {
        match self {
            SortKey::Rating => "rating",
            SortKey::Price => "price",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDir {
    Ascending,
    Descending,
}

impl SortDir {
    pub fn parse(s: &str) -> Option<SortDir> {
        match s {
            "Ascending" => Some(SortDir::Ascending),
            "Descending" => Some(SortDir::Descending),
            _ => None,
        }
    }

    fn keyword(self) -> &'static str {
        match self {
            SortDir::Ascending => "ASC",
            SortDir::Descending => "DESC",
        }
    }
}

/// User-selected criteria from the filter panel. `rating: None` means
/// "All".
#[derive(Debug, Clone)]
pub struct BookFilter {
    pub title_search: String,
    pub rating: Option<Rating>,
    pub sort: SortKey,
    pub direction: SortDir,
}

impl Default for BookFilter {
    fn default() -> Self {
        BookFilter {
            title_search: String::new(),
            rating: None,
            sort: SortKey::Rating,
            direction: SortDir::Ascending,
        }
    }
}

/// Compose the filtered read: case-insensitive title match always (empty
/// search text matches everything), rating equality when a specific word
/// was chosen, then the selected ordering. User text only ever travels as
/// a bind parameter; the ORDER BY column and direction come from the
/// closed enums above.
pub fn build_search_query(filter: &BookFilter) -> (String, Vec<SqlParam>) {
    let mut sql = String::from(
        "SELECT DISTINCT title, description, rating, price FROM books WHERE title ILIKE $1",
    );
    let mut params = vec![SqlParam::Text(format!("%{}%", filter.title_search))];

    if let Some(rating) = filter.rating {
        params.push(SqlParam::Int(rating.as_int()));
        sql.push_str(&format!(" AND rating = ${}", params.len()));
    }

    sql.push_str(&format!(
        " ORDER BY {} {}",
        filter.sort.column(),
        filter.direction.keyword()
    ));

    (sql, params)
}

// ── Tests ──
