use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use tracing::info;

use crate::config::DbConfig;
use crate::db::{self, Table};
use crate::query::{self, BookFilter, SortDir, SortKey};
use crate::rating::Rating;

#[derive(Clone)]
struct AppState {
    cfg: DbConfig,
}

pub fn create_router(cfg: DbConfig) -> Router {
    Router::new()
        .route("/", get(index))
        .with_state(AppState { cfg })
}

/// Bind and serve the search UI until interrupted.
pub async fn serve(cfg: DbConfig, port: u16) -> Result<()> {
    let router = create_router(cfg);
    let addr = format!("127.0.0.1:{}", port);
    info!("Serving book search UI on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}

fn default_rating() -> String {
    "All".to_owned()
}

fn default_sort() -> String {
    "Rating".to_owned()
}

fn default_dir() -> String {
    "Ascending".to_owned()
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
    #[serde(default = "default_rating")]
    rating: String,
    #[serde(default = "default_sort")]
    sort: String,
    #[serde(default = "default_dir")]
    dir: String,
    /// Present only when the Search button submitted the form.
    search: Option<String>,
}

impl SearchParams {
    fn searched(&self) -> bool {
        self.search.is_some()
    }

    fn to_filter(&self) -> BookFilter {
        BookFilter {
            title_search: self.q.clone(),
            // "All" (or anything outside the five words) places no rating
            // constraint.
            rating: Rating::from_word(&self.rating),
            sort: SortKey::parse(&self.sort).unwrap_or(SortKey::Rating),
            direction: SortDir::parse(&self.dir).unwrap_or(SortDir::Ascending),
        }
    }
}

async fn index(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Response {
    match render_index(&state.cfg, &params).await {
        Ok(html) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            Html(html),
        )
            .into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, format!("{:#}", e)).into_response(),
    }
}

/// The page always carries the unfiltered default table; the panel's
/// result table appears only after an explicit Search submission.
async fn render_index(cfg: &DbConfig, params: &SearchParams) -> Result<String> {
    let search_section = if params.searched() {
        let (sql, bind) = query::build_search_query(&params.to_filter());
        let results = db::query(cfg, &sql, &bind).await?;
        if results.is_empty() {
            "<p>No books found matching the criteria.</p>".to_string()
        } else {
            render_table(&results)
        }
    } else {
        String::new()
    };

    let default_table = db::query(cfg, query::DEFAULT_QUERY, &[]).await?;

    Ok(render_page(params, &search_section, &default_table))
}

fn render_page(params: &SearchParams, search_section: &str, default_table: &Table) -> String {
    let mut rating_options = vec!["All"];
    rating_options.extend(Rating::ALL.iter().map(|r| r.word()));

    // Keep the panel open when a search was just submitted so its results
    // are visible; collapsed otherwise.
    let open = if params.searched() { " open" } else { "" };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Book Search and Filter</title>
<style>
body {{ font-family: sans-serif; margin: 2em; }}
table {{ border-collapse: collapse; }}
th, td {{ border: 1px solid #ccc; padding: 4px 8px; text-align: left; vertical-align: top; }}
th {{ background: #f0f0f0; }}
details {{ margin-bottom: 1.5em; }}
summary {{ cursor: pointer; font-weight: bold; }}
form p {{ margin: 0.5em 0; }}
.books {{ width: 800px; height: 300px; overflow: auto; }}
</style>
</head>
<body>
<h1>Book Search and Filter</h1>
<details{open}>
<summary>Search and Filter Options</summary>
<form method="get" action="/">
<p><label>Search by book title <input type="text" name="q" value="{q}"></label></p>
<p><label>Filter by rating <select name="rating">{rating_options}</select></label></p>
<p><label>Order by <select name="sort">{sort_options}</select></label></p>
<p>Order direction {dir_radios}</p>
<p><button type="submit" name="search" value="1">Search</button></p>
</form>
{search_section}
</details>
<h3>All Books</h3>
<div class="books">
{default_table}
</div>
</body>
</html>
"#,
        open = open,
        q = escape(&params.q),
        rating_options = option_tags(&rating_options, &params.rating),
        sort_options = option_tags(&["Rating", "Price"], &params.sort),
        dir_radios = radio_tags("dir", &["Ascending", "Descending"], &params.dir),
        search_section = search_section,
        default_table = render_table(default_table),
    )
}

fn render_table(table: &Table) -> String {
    let mut html = String::from("<table>\n<tr>");
    for col in &table.columns {
        html.push_str(&format!("<th>{}</th>", escape(col)));
    }
    html.push_str("</tr>\n");
    for row in &table.rows {
        html.push_str("<tr>");
        for cell in row {
            html.push_str(&format!("<td>{}</td>", escape(&cell.to_string())));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</table>");
    html
}

fn option_tags(options: &[&str], selected: &str) -> String {
    options
        .iter()
        .map(|opt| {
            let sel = if *opt == selected { " selected" } else { "" };
            format!("<option value=\"{}\"{}>{}</option>", opt, sel, opt)
        })
        .collect()
}

fn radio_tags(name: &str, options: &[&str], selected: &str) -> String {
    options
        .iter()
        .map(|opt| {
            let checked = if *opt == selected { " checked" } else { "" };
            format!(
                "<label><input type=\"radio\" name=\"{}\" value=\"{}\"{}> {}</label>",
                name, opt, checked, opt
            )
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqlValue;

    fn params(q: &str, rating: &str, sort: &str, dir: &str, searched: bool) -> SearchParams {
        SearchParams {
            q: q.to_string(),
            rating: rating.to_string(),
            sort: sort.to_string(),
            dir: dir.to_string(),
            search: searched.then(|| "1".to_string()),
        }
    }

    #[test]
    fn filter_from_submitted_params() {
        let p = params("secret", "Three", "Price", "Descending", true);
        let filter = p.to_filter();
        assert_eq!(filter.title_search, "secret");
        assert_eq!(filter.rating, Some(Rating::Three));
        assert_eq!(filter.sort, SortKey::Price);
        assert_eq!(filter.direction, SortDir::Descending);
    }

    #[test]
    fn all_rating_places_no_constraint() {
        let p = params("", "All", "Rating", "Ascending", true);
        assert_eq!(p.to_filter().rating, None);
    }

    #[test]
    fn unknown_selector_values_fall_back_to_defaults() {
        let p = params("", "Everything", "Title", "Sideways", true);
        let filter = p.to_filter();
        assert_eq!(filter.rating, None);
        assert_eq!(filter.sort, SortKey::Rating);
        assert_eq!(filter.direction, SortDir::Ascending);
    }

    #[test]
    fn table_renders_headers_cells_and_nulls() {
        let table = Table {
            columns: vec!["title".into(), "price".into()],
            rows: vec![
                vec![
                    SqlValue::Text("Sharp Objects".into()),
                    SqlValue::Decimal("47.82".parse().unwrap()),
                ],
                vec![SqlValue::Text("Free Book".into()), SqlValue::Null],
            ],
        };
        let html = render_table(&table);
        assert!(html.contains("<th>title</th>"));
        assert!(html.contains("<td>Sharp Objects</td>"));
        assert!(html.contains("<td>47.82</td>"));
        assert!(html.contains("<td></td>"));
    }

    #[test]
    fn cell_text_is_escaped() {
        let table = Table {
            columns: vec!["title".into()],
            rows: vec![vec![SqlValue::Text("<b>\"Bold\" & Brave</b>".into())]],
        };
        let html = render_table(&table);
        assert!(html.contains("&lt;b&gt;&quot;Bold&quot; &amp; Brave&lt;/b&gt;"));
        assert!(!html.contains("<b>"));
    }

    #[test]
    fn panel_open_only_after_search() {
        let empty = Table {
            columns: vec![],
            rows: vec![],
        };
        let page = render_page(&params("", "All", "Rating", "Ascending", false), "", &empty);
        assert!(page.contains("<details>"));
        let page = render_page(&params("", "All", "Rating", "Ascending", true), "", &empty);
        assert!(page.contains("<details open>"));
    }

    #[test]
    fn submitted_values_are_preserved_in_form() {
        let empty = Table {
            columns: vec![],
            rows: vec![],
        };
        let page = render_page(
            &params("tea \"time\"", "Four", "Price", "Descending", true),
            "",
            &empty,
        );
        assert!(page.contains(r#"value="tea &quot;time&quot;""#));
        assert!(page.contains(r#"<option value="Four" selected>Four</option>"#));
        assert!(page.contains(r#"<option value="Price" selected>Price</option>"#));
        assert!(page.contains(r#"value="Descending" checked"#));
    }
}
