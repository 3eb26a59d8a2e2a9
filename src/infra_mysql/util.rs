use crate::domain_model::{FOLLOWED_FIELD, FOLLOWER_FIELD, Filter};
use crate::domain_port::DocumentStoreError;
use sqlx::mysql::MySqlDatabaseError;

const ER_DUP_ENTRY: u16 = 1062;
const ER_DBACCESS_DENIED: u16 = 1044;
const ER_ACCESS_DENIED: u16 = 1045;
const ER_TABLEACCESS_DENIED: u16 = 1142;

fn mysql_error_number(err: &sqlx::Error) -> Option<u16> {
    if let sqlx::Error::Database(db) = err {
        if let Some(mysql_err) = db.try_downcast_ref::<MySqlDatabaseError>() {
            return Some(mysql_err.number());
        }
    }
    None
}

pub fn is_dup_key(err: &sqlx::Error) -> bool {
    mysql_error_number(err) == Some(ER_DUP_ENTRY)
}

pub fn store_error(context: &str, err: sqlx::Error) -> DocumentStoreError {
    if is_dup_key(&err) {
        return DocumentStoreError::Conflict(format!("{context}: {err}"));
    }
    match mysql_error_number(&err) {
        Some(ER_DBACCESS_DENIED | ER_ACCESS_DENIED | ER_TABLEACCESS_DENIED) => {
            return DocumentStoreError::Unauthorized(format!("{context}: {err}"));
        }
        _ => {}
    }
    match err {
        sqlx::Error::PoolTimedOut => DocumentStoreError::Timeout(format!("{context}: pool timed out")),
        sqlx::Error::RowNotFound => DocumentStoreError::NotFound(context.to_owned()),
        e => DocumentStoreError::Transport(format!("{context}: {e}")),
    }
}

/// JSON path for a top-level document field. Field names are spliced into
/// the path literal, so only identifier characters are accepted.
pub fn json_path(field: &str) -> Result<String, DocumentStoreError> {
    let valid = !field.is_empty()
        && field
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(DocumentStoreError::Validation(format!(
            "unsupported field name: {field:?}"
        )));
    }
    Ok(format!("$.{field}"))
}

/// Generated column mirroring a document field, and the string it must equal.
/// Only string comparisons on the edge fields use the columns; everything
/// else goes through `JSON_CONTAINS`.
pub fn indexed_column(filter: &Filter) -> Option<(&'static str, &str)> {
    match filter {
        Filter::Equal { field, value } => {
            let column = match field.as_str() {
                FOLLOWER_FIELD => "follower_id",
                FOLLOWED_FIELD => "followed_id",
                _ => return None,
            };
            value.as_str().map(|v| (column, v))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_path_accepts_identifiers_only() {
        assert_eq!(json_path("followerId").unwrap(), "$.followerId");
        assert!(json_path("a.b").is_err());
        assert!(json_path("x') OR 1=1 --").is_err());
        assert!(json_path("").is_err());
    }

    #[test]
    fn edge_fields_filter_on_generated_columns() {
        assert_eq!(
            indexed_column(&Filter::equal(FOLLOWED_FIELD, "u1")),
            Some(("followed_id", "u1"))
        );
        assert_eq!(
            indexed_column(&Filter::equal(FOLLOWER_FIELD, "u2")),
            Some(("follower_id", "u2"))
        );
        assert_eq!(indexed_column(&Filter::equal(FOLLOWED_FIELD, 7)), None);
        assert_eq!(indexed_column(&Filter::equal("title", "u1")), None);
    }

    #[test]
    fn pool_timeout_maps_to_timeout() {
        assert!(matches!(
            store_error("count", sqlx::Error::PoolTimedOut),
            DocumentStoreError::Timeout(_)
        ));
        assert!(matches!(
            store_error("select", sqlx::Error::RowNotFound),
            DocumentStoreError::NotFound(_)
        ));
    }
}
