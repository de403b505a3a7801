mod catalog;
mod config;
mod db;
mod extract;
mod query;
mod rating;
mod web;

use std::time::Instant;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "book_scraper",
    about = "books.toscrape.com catalog scraper with a search and filter UI"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the books table and its unique index
    Init,
    /// Walk the catalog and store new books
    Scrape {
        /// Listing pages to walk
        #[arg(short = 'n', long, default_value = "50")]
        pages: u32,
    },
    /// Serve the search and filter UI
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8000")]
        port: u16,
    },
    /// Search stored books from the terminal
    Search {
        /// Title substring to match (case-insensitive)
        #[arg(short, long, default_value = "")]
        title: String,
        /// Filter by rating word (One, Two, Three, Four, Five)
        #[arg(short, long)]
        rating: Option<String>,
        /// Sort key (Rating or Price)
        #[arg(short, long, default_value = "Rating")]
        sort: String,
        /// Sort descending instead of ascending
        #[arg(short, long)]
        descending: bool,
    },
    /// Show stored-catalog statistics
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let cfg = config::DbConfig::from_env()?;

    let result = match cli.command {
        Commands::Init => {
            db::init_schema(&cfg).await?;
            println!("Schema ready.");
            Ok(())
        }
        Commands::Scrape { pages } => {
            db::init_schema(&cfg).await?;
            println!("Scraping {} listing pages...", pages);
            let books = catalog::scrape_catalog(pages).await?;
            let inserted = db::insert_books(&cfg, &books).await?;
            println!(
                "Scraped {} books: {} inserted, {} duplicates skipped.",
                books.len(),
                inserted,
                books.len() as u64 - inserted
            );
            Ok(())
        }
        Commands::Serve { port } => {
            db::init_schema(&cfg).await?;
            web::serve(cfg, port).await
        }
        Commands::Search {
            title,
            rating,
            sort,
            descending,
        } => {
            db::init_schema(&cfg).await?;
            let rating_filter = rating
                .map(|word| {
                    rating::Rating::from_word(&word)
                        .ok_or_else(|| anyhow::anyhow!("unknown rating word: {}", word))
                })
                .transpose()?;
            let filter = query::BookFilter {
                title_search: title,
                rating: rating_filter,
                sort: query::SortKey::parse(&sort)
                    .ok_or_else(|| anyhow::anyhow!("sort must be Rating or Price"))?,
                direction: if descending {
                    query::SortDir::Descending
                } else {
                    query::SortDir::Ascending
                },
            };
            let (sql, params) = query::build_search_query(&filter);
            let table = db::query(&cfg, &sql, &params).await?;
            if table.is_empty() {
                println!("No books found matching the criteria.");
                return Ok(());
            }
            print_books(&table);
            Ok(())
        }
        Commands::Stats => {
            db::init_schema(&cfg).await?;
            let s = db::get_stats(&cfg).await?;
            println!("Books:         {}", s.total);
            println!("Distinct:      {}", s.distinct);
            println!("Missing price: {}", s.without_price);
            for (rating, count) in &s.by_rating {
                println!("{} stars:       {}", rating, count);
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn print_books(table: &db::Table) {
    println!(
        "{:>3} | {:<32} | {:<44} | {:>6} | {:>8}",
        "#", "Title", "Description", "Rating", "Price"
    );
    println!("{}", "-".repeat(104));

    for (i, row) in table.rows.iter().enumerate() {
        let cell = |n: usize| row.get(n).map(|v| v.to_string()).unwrap_or_default();
        println!(
            "{:>3} | {:<32} | {:<44} | {:>6} | {:>8}",
            i + 1,
            truncate(&cell(0), 32),
            truncate(&cell(1), 44),
            cell(2),
            cell(3),
        );
    }

    println!("\n{} books", table.rows.len());
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
