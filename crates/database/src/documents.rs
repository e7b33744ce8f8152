//! Document CRUD and query operations.

use rakto_core::{Collection, Document, Fields, FilterValue, OrderBy, Query};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::{DatabaseError, Result};
use crate::models::{now_micros, DocumentRow};

/// Insert a document under a freshly generated key.
pub async fn insert_document(
    pool: &SqlitePool,
    collection: Collection,
    fields: &Fields,
) -> Result<Document> {
    let id = Uuid::new_v4().simple().to_string();
    let now = now_micros();

    let row = sqlx::query_as::<_, DocumentRow>(
        r#"
        INSERT INTO documents (collection, id, data, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?)
        RETURNING id, data, created_at, updated_at
        "#,
    )
    .bind(collection.name())
    .bind(&id)
    .bind(serde_json::to_string(fields)?)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await?;

    row.into_document()
}

/// Insert or replace the document under `id`, keeping its creation time.
pub async fn upsert_document(
    pool: &SqlitePool,
    collection: Collection,
    id: &str,
    fields: &Fields,
) -> Result<Document> {
    let now = now_micros();

    let row = sqlx::query_as::<_, DocumentRow>(
        r#"
        INSERT INTO documents (collection, id, data, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(collection, id) DO UPDATE SET
            data = excluded.data,
            updated_at = excluded.updated_at
        RETURNING id, data, created_at, updated_at
        "#,
    )
    .bind(collection.name())
    .bind(id)
    .bind(serde_json::to_string(fields)?)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await?;

    row.into_document()
}

/// Get a document by key.
pub async fn get_document(
    pool: &SqlitePool,
    collection: Collection,
    id: &str,
) -> Result<Option<Document>> {
    let row = sqlx::query_as::<_, DocumentRow>(
        r#"
        SELECT id, data, created_at, updated_at
        FROM documents
        WHERE collection = ? AND id = ?
        "#,
    )
    .bind(collection.name())
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(DocumentRow::into_document).transpose()
}

/// Merge `patch` into an existing document.
///
/// Read and write happen in one `IMMEDIATE` transaction: the write lock is
/// taken up front, so concurrent patches wait on the busy timeout instead of
/// failing on a lock upgrade, and patches to different fields do not
/// overwrite each other.
pub async fn update_document(
    pool: &SqlitePool,
    collection: Collection,
    id: &str,
    patch: Fields,
) -> Result<Document> {
    let mut tx = pool.begin_with("BEGIN IMMEDIATE").await?;

    let existing = sqlx::query_as::<_, DocumentRow>(
        r#"
        SELECT id, data, created_at, updated_at
        FROM documents
        WHERE collection = ? AND id = ?
        "#,
    )
    .bind(collection.name())
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        collection: collection.name(),
        id: id.to_string(),
    })?;

    let mut document = existing.into_document()?;
    document.merge(patch);

    let row = sqlx::query_as::<_, DocumentRow>(
        r#"
        UPDATE documents
        SET data = ?, updated_at = ?
        WHERE collection = ? AND id = ?
        RETURNING id, data, created_at, updated_at
        "#,
    )
    .bind(serde_json::to_string(&document.fields)?)
    .bind(now_micros())
    .bind(collection.name())
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    row.into_document()
}

/// Run a composed query.
///
/// Field names come from [`rakto_core::FilterField`], never from user input,
/// so they are formatted into the JSON paths while values are bound.
pub async fn query_documents(pool: &SqlitePool, query: &Query) -> Result<Vec<Document>> {
    let sql = build_select(query);

    let mut statement = sqlx::query_as::<_, DocumentRow>(&sql).bind(query.collection.name());
    for filter in &query.filters {
        statement = match &filter.value {
            FilterValue::Text(text) => statement.bind(text.clone()),
            FilterValue::Bool(true) => statement.bind("true"),
            FilterValue::Bool(false) => statement.bind("false"),
        };
    }
    if let Some(limit) = query.limit {
        statement = statement.bind(i64::try_from(limit).unwrap_or(i64::MAX));
    }

    let rows = statement.fetch_all(pool).await?;
    rows.into_iter().map(DocumentRow::into_document).collect()
}

fn build_select(query: &Query) -> String {
    let mut sql = String::from(
        "SELECT id, data, created_at, updated_at FROM documents WHERE collection = ?",
    );

    for filter in &query.filters {
        let path = format!("'$.{}'", filter.field.field_name());
        match filter.value {
            FilterValue::Text(_) => sql.push_str(&format!(
                " AND json_type(data, {path}) = 'text' AND json_extract(data, {path}) = ?"
            )),
            FilterValue::Bool(_) => sql.push_str(&format!(" AND json_type(data, {path}) = ?")),
        }
    }

    match query.order_by {
        OrderBy::CreatedAtDesc => {
            sql.push_str(" ORDER BY created_at IS NULL, created_at DESC, rowid DESC")
        }
    }

    if query.limit.is_some() {
        sql.push_str(" LIMIT ?");
    }

    sql
}

/// Count documents in a collection.
pub async fn count_documents(pool: &SqlitePool, collection: Collection) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM documents WHERE collection = ?
        "#,
    )
    .bind(collection.name())
    .fetch_one(pool)
    .await?;

    Ok(count)
}
