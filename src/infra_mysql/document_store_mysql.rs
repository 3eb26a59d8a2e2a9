use super::util::{indexed_column, json_path, store_error};
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{MySql, MySqlPool, QueryBuilder, Row};

/// Document store over one MySQL table. Filters on the edge fields use the
/// indexed generated columns; other fields are matched with `JSON_CONTAINS`
/// against the `fields` column.
pub struct MySqlDocumentStore {
    pool: MySqlPool,
}

impl MySqlDocumentStore {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlDocumentStore { pool }
    }

    /// Creates the document table. The edge fields are mirrored into stored
    /// generated columns so pair lookups and follower counts hit an index.
    /// With `unique_edges` the pair index is UNIQUE and a duplicate insert
    /// fails with [`DocumentStoreError::Conflict`].
    pub async fn ensure_schema(&self, unique_edges: bool) -> Result<(), DocumentStoreError> {
        let pair_index = if unique_edges { "UNIQUE KEY" } else { "KEY" };
        let ddl = format!(
            r#"
CREATE TABLE IF NOT EXISTS document (
    collection  VARCHAR(64)  NOT NULL,
    document_id VARCHAR(36)  NOT NULL,
    fields      JSON         NOT NULL,
    created_at  TIMESTAMP(6) NOT NULL,
    follower_id VARCHAR(191) AS (JSON_UNQUOTE(JSON_EXTRACT(fields, '$.{FOLLOWER_FIELD}'))) STORED,
    followed_id VARCHAR(191) AS (JSON_UNQUOTE(JSON_EXTRACT(fields, '$.{FOLLOWED_FIELD}'))) STORED,
    PRIMARY KEY (collection, document_id),
    KEY ix_document_followed (collection, followed_id),
    {pair_index} ux_document_pair (collection, follower_id, followed_id)
)
"#
        );
        sqlx::query(&ddl)
            .execute(&self.pool)
            .await
            .map_err(|e| store_error("create document table", e))?;

        Ok(())
    }

    fn push_where<'q>(
        builder: &mut QueryBuilder<'q, MySql>,
        collection: &CollectionId,
        filters: &[Filter],
    ) -> Result<(), DocumentStoreError> {
        builder
            .push(" WHERE collection = ")
            .push_bind(collection.0.clone());
        for filter in filters {
            if let Some((column, value)) = indexed_column(filter) {
                builder
                    .push(format!(" AND {column} = "))
                    .push_bind(value.to_owned());
                continue;
            }
            match filter {
                Filter::Equal { field, value } => {
                    builder
                        .push(" AND JSON_CONTAINS(fields, ")
                        .push_bind(value.to_string())
                        .push(", ")
                        .push_bind(json_path(field)?)
                        .push(")");
                }
            }
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl DocumentStore for MySqlDocumentStore {
    async fn query(
        &self,
        collection: &CollectionId,
        query: &DocumentQuery,
    ) -> Result<DocumentList, DocumentStoreError> {
        let mut count = QueryBuilder::<MySql>::new("SELECT COUNT(*) FROM document");
        Self::push_where(&mut count, collection, &query.filters)?;
        let total: i64 = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| store_error("count documents", e))?;

        if query.limit == 0 || total == 0 {
            return Ok(DocumentList {
                total: total.max(0) as u64,
                documents: Vec::new(),
            });
        }

        let mut select =
            QueryBuilder::<MySql>::new("SELECT document_id, fields, created_at FROM document");
        Self::push_where(&mut select, collection, &query.filters)?;
        select
            .push(" ORDER BY created_at, document_id LIMIT ")
            .push_bind(query.limit);

        let rows = select
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| store_error("select documents", e))?;

        let mut documents = Vec::with_capacity(rows.len());
        for row in rows {
            let id = row
                .try_get::<String, _>("document_id")
                .map_err(|e| store_error("decode document_id", e))?;
            let Json(fields) = row
                .try_get::<Json<Fields>, _>("fields")
                .map_err(|e| store_error("decode fields", e))?;
            let created_at = row
                .try_get::<DateTime<Utc>, _>("created_at")
                .map_err(|e| store_error("decode created_at", e))?;
            documents.push(Document {
                id: DocumentId(id),
                collection: collection.clone(),
                fields,
                created_at,
            });
        }

        Ok(DocumentList {
            total: total as u64,
            documents,
        })
    }

    async fn insert(
        &self,
        collection: &CollectionId,
        fields: Fields,
    ) -> Result<Document, DocumentStoreError> {
        let doc = Document {
            id: DocumentId::generate(),
            collection: collection.clone(),
            fields,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
INSERT INTO document (collection, document_id, fields, created_at)
VALUES (?, ?, ?, ?)
"#,
        )
        .bind(&doc.collection.0)
        .bind(&doc.id.0)
        .bind(Json(&doc.fields))
        .bind(doc.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| store_error("insert document", e))?;

        Ok(doc)
    }

    async fn delete(
        &self,
        collection: &CollectionId,
        document_id: &DocumentId,
    ) -> Result<(), DocumentStoreError> {
        let res = sqlx::query("DELETE FROM document WHERE collection = ? AND document_id = ?")
            .bind(&collection.0)
            .bind(&document_id.0)
            .execute(&self.pool)
            .await
            .map_err(|e| store_error("delete document", e))?;

        if res.rows_affected() == 0 {
            return Err(DocumentStoreError::NotFound(format!(
                "{collection}/{document_id}"
            )));
        }
        Ok(())
    }
}
