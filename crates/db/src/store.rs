//! Collection-scoped JSON documents over a single sqlite table.

use std::cmp::max;
use std::future::Future;
use std::ops::{Deref, DerefMut};
use std::time::Duration;

use recipebox_shared::{Error, Result};
use sea_query::{Expr, ExprTrait, Func, Order, Query, SelectStatement, SqliteQueryBuilder, Value};
use sea_query_sqlx::SqlxBinder;
use serde::{Serialize, de::DeserializeOwned};
use sqlx::SqlitePool;

use crate::table::Documents;

pub trait Document: Serialize + DeserializeOwned + Send + Sync + Unpin + 'static {
    const COLLECTION: &'static str;

    /// Natural key, unique within the collection.
    fn key(&self) -> Option<String> {
        None
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stored<D> {
    pub id: String,
    pub version: i64,
    pub created_at: i64,
    pub updated_at: i64,
    pub data: D,
}

impl<D> Deref for Stored<D> {
    type Target = D;

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl<D> DerefMut for Stored<D> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.data
    }
}

/// Conditions on the JSON body, addressed by top level field name.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(String, Value),
    /// Case-insensitive substring match.
    Like(String, String),
    Gte(String, f64),
    /// Array field holds the value.
    Contains(String, Value),
    /// Array field holds at least one of the values.
    ContainsAny(String, Vec<Value>),
    IdIn(Vec<String>),
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq(field.into(), value.into())
    }

    pub fn like(field: impl Into<String>, fragment: impl Into<String>) -> Self {
        Filter::Like(field.into(), fragment.into())
    }

    pub fn gte(field: impl Into<String>, value: f64) -> Self {
        Filter::Gte(field.into(), value)
    }

    pub fn contains(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Contains(field.into(), value.into())
    }

    pub fn contains_any<V: Into<Value>>(
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Filter::ContainsAny(field.into(), values.into_iter().map(Into::into).collect())
    }

    pub fn id_in(ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Filter::IdIn(ids.into_iter().map(Into::into).collect())
    }

    fn path(field: &str) -> Value {
        Value::from(format!("$.{field}"))
    }

    fn apply(&self, statement: &mut SelectStatement) {
        let expr = match self {
            Filter::Eq(field, value) => Expr::cust_with_values(
                "json_extract(body, ?) = ?",
                [Self::path(field), value.clone()],
            ),
            Filter::Like(field, fragment) => Expr::cust_with_values(
                "lower(json_extract(body, ?)) LIKE ? ESCAPE '!'",
                [
                    Self::path(field),
                    Value::from(format!("%{}%", escape_like(&fragment.to_lowercase()))),
                ],
            ),
            Filter::Gte(field, value) => Expr::cust_with_values(
                "json_extract(body, ?) >= ?",
                [Self::path(field), Value::from(*value)],
            ),
            Filter::Contains(field, value) => Expr::cust_with_values(
                "EXISTS (SELECT 1 FROM json_each(body, ?) WHERE value = ?)",
                [Self::path(field), value.clone()],
            ),
            Filter::ContainsAny(_, values) if values.is_empty() => Expr::cust("1 = 0"),
            Filter::ContainsAny(field, values) => {
                let placeholders = vec!["?"; values.len()].join(", ");
                let mut params = vec![Self::path(field)];
                params.extend(values.iter().cloned());

                Expr::cust_with_values(
                    format!(
                        "EXISTS (SELECT 1 FROM json_each(body, ?) WHERE value IN ({placeholders}))"
                    ),
                    params,
                )
            }
            Filter::IdIn(ids) if ids.is_empty() => Expr::cust("1 = 0"),
            Filter::IdIn(ids) => Expr::col(Documents::Id).is_in(ids.iter().cloned()),
        };

        statement.and_where(expr);
    }
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '!' | '%' | '_') {
            escaped.push('!');
        }
        escaped.push(c);
    }
    escaped
}

/// One-based page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub page_size: u32,
}

impl Page {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: max(page, 1),
            page_size,
        }
    }

    pub fn first(page_size: u32) -> Self {
        Self::new(1, page_size)
    }

    pub fn clamp(self, max_page_size: u32) -> Self {
        Self::new(self.page, Ord::clamp(self.page_size, 1, max(max_page_size, 1)))
    }

    fn limit(&self) -> u64 {
        self.page_size as u64
    }

    fn offset(&self) -> u64 {
        (max(self.page, 1) as u64 - 1) * self.page_size as u64
    }
}

#[derive(sqlx::FromRow)]
struct DocumentRow {
    id: String,
    version: i64,
    body: String,
    created_at: i64,
    updated_at: i64,
}

impl DocumentRow {
    fn decode<D: Document>(self) -> Result<Stored<D>> {
        Ok(Stored {
            id: self.id,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
            data: serde_json::from_str(&self.body)?,
        })
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn timestamp() -> i64 {
    i64::try_from(recipebox_shared::now()).unwrap_or(i64::MAX)
}

#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn select<D: Document>() -> SelectStatement {
        Query::select()
            .columns([
                Documents::Id,
                Documents::Version,
                Documents::Body,
                Documents::CreatedAt,
                Documents::UpdatedAt,
            ])
            .from(Documents::Table)
            .and_where(Expr::col(Documents::Collection).eq(D::COLLECTION))
            .order_by(Documents::Seq, Order::Asc)
            .to_owned()
    }

    async fn fetch<D: Document>(&self, statement: SelectStatement) -> Result<Vec<Stored<D>>> {
        let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);

        sqlx::query_as_with::<_, DocumentRow, _>(&sql, values)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(DocumentRow::decode)
            .collect()
    }

    pub async fn get<D: Document>(&self, id: &str) -> Result<Option<Stored<D>>> {
        let statement = Self::select::<D>()
            .and_where(Expr::col(Documents::Id).eq(id))
            .limit(1)
            .to_owned();

        Ok(self.fetch(statement).await?.pop())
    }

    pub async fn find_by_key<D: Document>(&self, key: &str) -> Result<Option<Stored<D>>> {
        let statement = Self::select::<D>()
            .and_where(Expr::col(Documents::Key).eq(key))
            .limit(1)
            .to_owned();

        Ok(self.fetch(statement).await?.pop())
    }

    pub async fn find<D: Document>(
        &self,
        filters: &[Filter],
        page: Option<Page>,
    ) -> Result<Vec<Stored<D>>> {
        let mut statement = Self::select::<D>();

        for filter in filters {
            filter.apply(&mut statement);
        }

        if let Some(page) = page {
            statement.limit(page.limit()).offset(page.offset());
        }

        self.fetch(statement).await
    }

    pub async fn count<D: Document>(&self, filters: &[Filter]) -> Result<u64> {
        let mut statement = Query::select()
            .expr(Func::count(Expr::col(Documents::Seq)))
            .from(Documents::Table)
            .and_where(Expr::col(Documents::Collection).eq(D::COLLECTION))
            .to_owned();

        for filter in filters {
            filter.apply(&mut statement);
        }

        let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
        let (count,) = sqlx::query_as_with::<_, (i64,), _>(&sql, values)
            .fetch_one(&self.pool)
            .await?;

        Ok(u64::try_from(count).unwrap_or_default())
    }

    /// Assigns a fresh id. A taken natural key is a [`Error::Conflict`].
    pub async fn create<D: Document>(&self, data: D) -> Result<Stored<D>> {
        let id = ulid::Ulid::new().to_string();
        let key = data.key();
        let body = serde_json::to_string(&data)?;
        let now = timestamp();

        let statement = Query::insert()
            .into_table(Documents::Table)
            .columns([
                Documents::Collection,
                Documents::Id,
                Documents::Key,
                Documents::Version,
                Documents::Body,
                Documents::CreatedAt,
                Documents::UpdatedAt,
            ])
            .values_panic([
                D::COLLECTION.into(),
                id.clone().into(),
                key.clone().into(),
                1i64.into(),
                body.into(),
                now.into(),
                now.into(),
            ])
            .to_owned();

        let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
        match sqlx::query_with(&sql, values).execute(&self.pool).await {
            Ok(_) => {}
            Err(err) if is_unique_violation(&err) => {
                return Err(Error::Conflict(format!(
                    "{} key {} already taken",
                    D::COLLECTION,
                    key.unwrap_or_default()
                )));
            }
            Err(err) => return Err(err.into()),
        }

        tracing::debug!(collection = D::COLLECTION, id, "document created");

        Ok(Stored {
            id,
            version: 1,
            created_at: now,
            updated_at: now,
            data,
        })
    }

    /// Writes `doc` only if nobody else wrote it since it was read. Returns
    /// whether the write applied; on success the version is bumped in place.
    pub async fn update<D: Document>(&self, doc: &mut Stored<D>) -> Result<bool> {
        let body = serde_json::to_string(&doc.data)?;
        let now = timestamp();

        let statement = Query::update()
            .table(Documents::Table)
            .values([
                (Documents::Key, doc.data.key().into()),
                (Documents::Body, body.into()),
                (Documents::Version, (doc.version + 1).into()),
                (Documents::UpdatedAt, now.into()),
            ])
            .and_where(Expr::col(Documents::Collection).eq(D::COLLECTION))
            .and_where(Expr::col(Documents::Id).eq(doc.id.as_str()))
            .and_where(Expr::col(Documents::Version).eq(doc.version))
            .to_owned();

        let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
        let result = match sqlx::query_with(&sql, values).execute(&self.pool).await {
            Ok(result) => result,
            Err(err) if is_unique_violation(&err) => {
                return Err(Error::Conflict(format!(
                    "{} key {} already taken",
                    D::COLLECTION,
                    doc.data.key().unwrap_or_default()
                )));
            }
            Err(err) => return Err(err.into()),
        };

        if result.rows_affected() == 0 {
            tracing::debug!(
                collection = D::COLLECTION,
                id = doc.id,
                version = doc.version,
                "stale write rejected"
            );

            return Ok(false);
        }

        doc.version += 1;
        doc.updated_at = now;

        Ok(true)
    }

    pub async fn remove<D: Document>(&self, id: &str) -> Result<bool> {
        self.delete_where::<D>(Expr::col(Documents::Id).eq(id)).await
    }

    pub async fn remove_by_key<D: Document>(&self, key: &str) -> Result<bool> {
        self.delete_where::<D>(Expr::col(Documents::Key).eq(key)).await
    }

    async fn delete_where<D: Document>(&self, condition: Expr) -> Result<bool> {
        let statement = Query::delete()
            .from_table(Documents::Table)
            .and_where(Expr::col(Documents::Collection).eq(D::COLLECTION))
            .and_where(condition)
            .to_owned();

        let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
        let result = sqlx::query_with(&sql, values).execute(&self.pool).await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Retries a read-modify-write until its conditional write applies.
///
/// `op` receives the attempt number and returns `None` when it lost the race.
/// Lost attempts back off exponentially with jitter before the next one.
pub async fn optimistic<T, F, Fut>(attempts: u32, mut op: F) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    let attempts = max(attempts, 1);

    for attempt in 1..=attempts {
        if let Some(value) = op(attempt).await? {
            return Ok(value);
        }

        if attempt < attempts {
            let delay = backoff(attempt);
            tracing::debug!(attempt, ?delay, "optimistic write lost the race, retrying");
            tokio::time::sleep(delay).await;
        }
    }

    Err(Error::Conflict(format!(
        "write still contended after {attempts} attempts"
    )))
}

/// Full jitter over `1ms << attempt`, capped at 64ms.
fn backoff(attempt: u32) -> Duration {
    let ceiling = 1u128 << Ord::min(attempt, 6);
    let jitter = ulid::Ulid::new().random() % ceiling;

    Duration::from_millis(u64::try_from(jitter).unwrap_or_default() + 1)
}
