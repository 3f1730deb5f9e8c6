//! Document store contract and SQLite implementation.
//!
//! Documents live in one `documents` table keyed by `(collection, id)` with
//! the body stored as a JSON object. Predicates are compiled to
//! `json_extract`/`json_type` expressions with bound JSON paths.

use log::debug;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use serde_json::Value;
use uuid::Uuid;

use super::document::{check_field_names, check_name, Document, DocumentFields, DocumentId};
use super::live::{ChangeFeed, ChangeKind, DocumentChange, LiveQuery};
use super::query::{Filter, OrderField, Query, SortDirection};
use super::{StoreError, StoreResult};
use crate::db::now_epoch_ms;

/// Collection-scoped document persistence.
pub trait DocumentStore {
    /// Inserts a document and returns its store-assigned id.
    fn insert(&self, collection: &str, fields: DocumentFields) -> StoreResult<DocumentId>;
    /// Reads one document.
    fn get(&self, collection: &str, id: DocumentId) -> StoreResult<Option<Document>>;
    /// Merges `fields` into an existing document and bumps `updated_at`.
    fn update(&self, collection: &str, id: DocumentId, fields: DocumentFields)
        -> StoreResult<()>;
    /// Deletes one document. Returns `false` when nothing was there.
    fn delete(&self, collection: &str, id: DocumentId) -> StoreResult<bool>;
    /// Runs a predicate query.
    fn query(&self, collection: &str, query: &Query) -> StoreResult<Vec<Document>>;
    /// Opens a live query over the same predicate.
    fn subscribe(&self, collection: &str, query: Query) -> StoreResult<LiveQuery>;
}

/// SQLite-backed document store.
///
/// Store handles are cheap: create one per use-case call with the shared
/// connection and a clone of the shared feed.
pub struct SqliteDocumentStore<'conn> {
    conn: &'conn Connection,
    feed: ChangeFeed,
}

impl<'conn> SqliteDocumentStore<'conn> {
    pub fn new(conn: &'conn Connection, feed: ChangeFeed) -> Self {
        Self { conn, feed }
    }

    fn load(&self, collection: &str, id: DocumentId) -> StoreResult<Option<Document>> {
        let row = self
            .conn
            .query_row(
                "SELECT collection, id, data, created_at, updated_at
                 FROM documents
                 WHERE collection = ?1 AND id = ?2;",
                params![collection, id.to_string()],
                |row| RawRow::read(row),
            )
            .optional()?;
        row.map(RawRow::into_document).transpose()
    }
}

impl DocumentStore for SqliteDocumentStore<'_> {
    fn insert(&self, collection: &str, fields: DocumentFields) -> StoreResult<DocumentId> {
        check_name(collection)?;
        check_field_names(&fields)?;

        let id = Uuid::new_v4();
        let now = now_epoch_ms();
        self.conn.execute(
            "INSERT INTO documents (collection, id, data, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4);",
            params![collection, id.to_string(), encode_body(&fields)?, now],
        )?;

        debug!("event=doc_insert module=store status=ok collection={collection}");
        self.feed.publish(DocumentChange {
            collection: collection.to_string(),
            id,
            kind: ChangeKind::Added,
            before: None,
            after: Some(fields),
        });
        Ok(id)
    }

    fn get(&self, collection: &str, id: DocumentId) -> StoreResult<Option<Document>> {
        check_name(collection)?;
        self.load(collection, id)
    }

    fn update(
        &self,
        collection: &str,
        id: DocumentId,
        fields: DocumentFields,
    ) -> StoreResult<()> {
        check_name(collection)?;
        check_field_names(&fields)?;

        let tx = self.conn.unchecked_transaction()?;
        let Some(existing) = self.load(collection, id)? else {
            return Err(StoreError::NotFound {
                collection: collection.to_string(),
                id,
            });
        };

        let before = existing.fields;
        let mut after = before.clone();
        after.extend(fields);
        // Same-millisecond edits still move forward.
        let updated_at = now_epoch_ms().max(existing.updated_at.saturating_add(1));

        tx.execute(
            "UPDATE documents
             SET data = ?3, updated_at = ?4
             WHERE collection = ?1 AND id = ?2;",
            params![collection, id.to_string(), encode_body(&after)?, updated_at],
        )?;
        tx.commit()?;

        debug!("event=doc_update module=store status=ok collection={collection}");
        self.feed.publish(DocumentChange {
            collection: collection.to_string(),
            id,
            kind: ChangeKind::Modified,
            before: Some(before),
            after: Some(after),
        });
        Ok(())
    }

    fn delete(&self, collection: &str, id: DocumentId) -> StoreResult<bool> {
        check_name(collection)?;

        let tx = self.conn.unchecked_transaction()?;
        let Some(existing) = self.load(collection, id)? else {
            return Ok(false);
        };
        tx.execute(
            "DELETE FROM documents WHERE collection = ?1 AND id = ?2;",
            params![collection, id.to_string()],
        )?;
        tx.commit()?;

        debug!("event=doc_delete module=store status=ok collection={collection}");
        self.feed.publish(DocumentChange {
            collection: collection.to_string(),
            id,
            kind: ChangeKind::Removed,
            before: Some(existing.fields),
            after: None,
        });
        Ok(true)
    }

    fn query(&self, collection: &str, query: &Query) -> StoreResult<Vec<Document>> {
        check_name(collection)?;
        query.validate()?;

        let (sql, bind_values) = compile_query(collection, query)?;
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut documents = Vec::new();
        while let Some(row) = rows.next()? {
            documents.push(RawRow::read(row)?.into_document()?);
        }
        Ok(documents)
    }

    fn subscribe(&self, collection: &str, query: Query) -> StoreResult<LiveQuery> {
        check_name(collection)?;
        query.validate()?;
        Ok(LiveQuery::new(collection, query, self.feed.subscribe()))
    }
}

struct RawRow {
    collection: String,
    id: String,
    data: String,
    created_at: i64,
    updated_at: i64,
}

impl RawRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            collection: row.get("collection")?,
            id: row.get("id")?,
            data: row.get("data")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    fn into_document(self) -> StoreResult<Document> {
        let id = Uuid::parse_str(&self.id).map_err(|_| {
            StoreError::InvalidData(format!("invalid document id `{}`", self.id))
        })?;
        let fields = match serde_json::from_str::<Value>(&self.data) {
            Ok(Value::Object(fields)) => fields,
            Ok(_) => {
                return Err(StoreError::InvalidData(format!(
                    "document {id} body is not a JSON object"
                )))
            }
            Err(err) => {
                return Err(StoreError::InvalidData(format!(
                    "document {id} body is not valid JSON: {err}"
                )))
            }
        };
        Ok(Document {
            collection: self.collection,
            id,
            fields,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn encode_body(fields: &DocumentFields) -> StoreResult<String> {
    serde_json::to_string(fields)
        .map_err(|err| StoreError::InvalidData(format!("cannot encode document body: {err}")))
}

fn json_path(field: &str) -> SqlValue {
    SqlValue::Text(format!("$.{field}"))
}

fn compile_query(collection: &str, query: &Query) -> StoreResult<(String, Vec<SqlValue>)> {
    let mut sql = String::from(
        "SELECT collection, id, data, created_at, updated_at
         FROM documents
         WHERE collection = ?",
    );
    let mut bind_values = vec![SqlValue::Text(collection.to_string())];

    for filter in &query.filters {
        match filter {
            Filter::Eq { field, value } => {
                push_eq_clause(&mut sql, &mut bind_values, field, value)?;
            }
            Filter::Contains { fields, needle } => {
                if fields.is_empty() {
                    sql.push_str(" AND 0");
                    continue;
                }
                let clauses = fields
                    .iter()
                    .map(|field| {
                        bind_values.push(json_path(field));
                        bind_values.push(json_path(field));
                        bind_values.push(SqlValue::Text(needle.clone()));
                        "(json_type(data, ?) = 'text' AND instr(lower(json_extract(data, ?)), lower(?)) > 0)"
                    })
                    .collect::<Vec<_>>();
                sql.push_str(" AND (");
                sql.push_str(&clauses.join(" OR "));
                sql.push(')');
            }
        }
    }

    sql.push_str(" ORDER BY ");
    if let Some(order) = &query.order_by {
        match &order.field {
            OrderField::CreatedAt => sql.push_str("created_at"),
            OrderField::UpdatedAt => sql.push_str("updated_at"),
            OrderField::Field(name) => {
                sql.push_str("json_extract(data, ?)");
                bind_values.push(json_path(name));
            }
        }
        sql.push_str(match order.direction {
            SortDirection::Ascending => " ASC, ",
            SortDirection::Descending => " DESC, ",
        });
    }
    sql.push_str("id ASC;");

    Ok((sql, bind_values))
}

fn push_eq_clause(
    sql: &mut String,
    bind_values: &mut Vec<SqlValue>,
    field: &str,
    value: &Value,
) -> StoreResult<()> {
    match value {
        Value::Null => {
            sql.push_str(" AND json_extract(data, ?) IS NULL");
            bind_values.push(json_path(field));
        }
        Value::Bool(flag) => {
            sql.push_str(" AND json_type(data, ?) = ?");
            bind_values.push(json_path(field));
            bind_values.push(SqlValue::Text(if *flag { "true" } else { "false" }.to_string()));
        }
        Value::String(text) => {
            sql.push_str(" AND json_type(data, ?) = 'text' AND json_extract(data, ?) = ?");
            bind_values.push(json_path(field));
            bind_values.push(json_path(field));
            bind_values.push(SqlValue::Text(text.clone()));
        }
        Value::Number(number) => {
            let bound = if let Some(int) = number.as_i64() {
                SqlValue::Integer(int)
            } else if let Some(real) = number.as_f64() {
                SqlValue::Real(real)
            } else {
                return Err(StoreError::InvalidData(format!(
                    "filter number out of range for `{field}`"
                )));
            };
            sql.push_str(
                " AND json_type(data, ?) IN ('integer', 'real') AND json_extract(data, ?) = ?",
            );
            bind_values.push(json_path(field));
            bind_values.push(json_path(field));
            bind_values.push(bound);
        }
        Value::Array(_) | Value::Object(_) => {
            return Err(StoreError::InvalidData(format!(
                "equality filter on `{field}` must compare a scalar value"
            )));
        }
    }
    Ok(())
}
