use anyhow::{bail, Context, Result};
use rust_decimal::Decimal;
use sqlx::postgres::{PgConnectOptions, PgRow, PgSslMode};
use sqlx::{Column, Connection, PgConnection, Row, TypeInfo};

use crate::config::DbConfig;

/// Open a fresh connection. One connection per call, no pooling; released
/// when it drops at the end of the calling operation.
pub async fn connect(cfg: &DbConfig) -> Result<PgConnection> {
    let opts = PgConnectOptions::new()
        .host(&cfg.host)
        .database(&cfg.name)
        .username(&cfg.user)
        .password(&cfg.pass)
        .ssl_mode(PgSslMode::Prefer);
    PgConnection::connect_with(&opts)
        .await
        .with_context(|| format!("failed to connect to postgres at {}", cfg.host))
}

/// Create the books table and its content-hash unique index. Safe to call
/// repeatedly; never runs as a side effect of `connect`.
pub async fn init_schema(cfg: &DbConfig) -> Result<()> {
    let mut conn = connect(cfg).await?;
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS books (
            id SERIAL PRIMARY KEY,
            title VARCHAR(255) NOT NULL,
            description TEXT,
            rating INTEGER,
            price DECIMAL(10, 2)
        )",
    )
    .execute(&mut conn)
    .await?;
    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_unique_title_description
         ON books ((md5(title || description)))",
    )
    .execute(&mut conn)
    .await?;
    Ok(())
}

// ── Books ──

/// One scraped book, as persisted.
#[derive(Debug, Clone)]
pub struct BookRow {
    pub title: String,
    pub description: String,
    pub rating: i32,
    pub price: Option<Decimal>,
}

/// Insert a batch inside one transaction, one row at a time. Rows whose
/// md5(title || description) already exists are skipped, not updated.
/// Returns how many rows actually landed.
pub async fn insert_books(cfg: &DbConfig, books: &[BookRow]) -> Result<u64> {
    let mut conn = connect(cfg).await?;
    let mut tx = conn.begin().await?;
    let mut inserted = 0u64;
    for book in books {
        let res = sqlx::query(
            "INSERT INTO books (title, description, rating, price)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT DO NOTHING",
        )
        .bind(&book.title)
        .bind(&book.description)
        .bind(book.rating)
        .bind(book.price)
        .execute(&mut *tx)
        .await?;
        inserted += res.rows_affected();
    }
    tx.commit().await?;
    Ok(inserted)
}

// ── Ad-hoc queries ──

/// A bind parameter for ad-hoc queries.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    Int(i32),
}

/// One decoded result cell.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(String),
    Int(i64),
    Decimal(Decimal),
    Null,
}

impl std::fmt::Display for SqlValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SqlValue::Text(s) => f.write_str(s),
            SqlValue::Int(n) => write!(f, "{}", n),
            SqlValue::Decimal(d) => write!(f, "{}", d),
            SqlValue::Null => Ok(()),
        }
    }
}

/// Tabular query result. Column order matches the result set.
#[derive(Debug, Clone)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<SqlValue>>,
}

impl Table {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Run a parametrized query on a fresh connection and decode the whole
/// result set. Parameters bind positionally ($1, $2, ...); user input
/// never lands in the SQL text itself.
pub async fn query(cfg: &DbConfig, sql: &str, params: &[SqlParam]) -> Result<Table> {
    let mut conn = connect(cfg).await?;
    let mut q = sqlx::query(sql);
    for param in params {
        q = match param {
            SqlParam::Text(s) => q.bind(s.as_str()),
            SqlParam::Int(n) => q.bind(*n),
        };
    }
    let rows = q.fetch_all(&mut conn).await.context("query failed")?;

    let columns = match rows.first() {
        Some(row) => row.columns().iter().map(|c| c.name().to_string()).collect(),
        None => Vec::new(),
    };

    let mut decoded = Vec::with_capacity(rows.len());
    for row in &rows {
        let mut cells = Vec::with_capacity(row.columns().len());
        for idx in 0..row.columns().len() {
            cells.push(decode_cell(row, idx)?);
        }
        decoded.push(cells);
    }

    Ok(Table {
        columns,
        rows: decoded,
    })
}

fn decode_cell(row: &PgRow, idx: usize) -> Result<SqlValue> {
    let type_name = row.column(idx).type_info().name();
    let value = match type_name {
        "TEXT" | "VARCHAR" | "CHAR" | "NAME" => row
            .try_get::<Option<String>, _>(idx)?
            .map_or(SqlValue::Null, SqlValue::Text),
        "INT2" => row
            .try_get::<Option<i16>, _>(idx)?
            .map_or(SqlValue::Null, |n| SqlValue::Int(n as i64)),
        "INT4" => row
            .try_get::<Option<i32>, _>(idx)?
            .map_or(SqlValue::Null, |n| SqlValue::Int(n as i64)),
        "INT8" => row
            .try_get::<Option<i64>, _>(idx)?
            .map_or(SqlValue::Null, SqlValue::Int),
        "NUMERIC" => row
            .try_get::<Option<Decimal>, _>(idx)?
            .map_or(SqlValue::Null, SqlValue::Decimal),
        other => bail!("unsupported column type: {}", other),
    };
    Ok(value)
}

// ── Stats ──

pub struct Stats {
    pub total: i64,
    pub distinct: i64,
    pub without_price: i64,
    pub by_rating: Vec<(i32, i64)>,
}

pub async fn get_stats(cfg: &DbConfig) -> Result<Stats> {
    let mut conn = connect(cfg).await?;
    let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM books")
        .fetch_one(&mut conn)
        .await?;
    let (distinct,): (i64,) =
        sqlx::query_as("SELECT COUNT(DISTINCT md5(title || description)) FROM books")
            .fetch_one(&mut conn)
            .await?;
    let (without_price,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM books WHERE price IS NULL")
            .fetch_one(&mut conn)
            .await?;
    let by_rating: Vec<(i32, i64)> = sqlx::query_as(
        "SELECT rating, COUNT(*) FROM books
         WHERE rating IS NOT NULL
         GROUP BY rating
         ORDER BY rating",
    )
    .fetch_all(&mut conn)
    .await?;
    Ok(Stats {
        total,
        distinct,
        without_price,
        by_rating,
    })
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sql_value_display() {
        assert_eq!(SqlValue::Text("Sharp Objects".into()).to_string(), "Sharp Objects");
        assert_eq!(SqlValue::Int(4).to_string(), "4");
        assert_eq!(
            SqlValue::Decimal("47.82".parse().unwrap()).to_string(),
            "47.82"
        );
        assert_eq!(SqlValue::Null.to_string(), "");
    }
}
