//! List audit log records
//!
//! Filters on actorId (exact), action (uppercased exact), table (exact), and
//! a start/end timestamp window. Ordered by timestamp DESC, id DESC. The log
//! page size is deliberately smaller than the entity lists; records carry
//! JSON metadata and get bulky fast.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::features::shared::pagination::{PageParams, Paginated};
use crate::models::{LogJoinedRow, LogView};

pub const LOG_DEFAULT_PAGE_SIZE: i64 = 25;
pub const LOG_MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ListLogsQuery {
    #[serde(default)]
    pub actor_id: Option<i64>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub page_size: Option<i64>,
}

pub type ListLogsResponse = Paginated<LogView>;

impl ListLogsQuery {
    fn pagination(&self) -> PageParams {
        PageParams::new(self.page, self.page_size)
    }

    fn push_filters(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        if let Some(actor_id) = self.actor_id {
            builder.push(" AND l.actor_user_id = ").push_bind(actor_id);
        }
        if let Some(ref action) = self.action {
            if !action.trim().is_empty() {
                builder
                    .push(" AND l.action = ")
                    .push_bind(action.trim().to_uppercase());
            }
        }
        if let Some(ref table) = self.table {
            if !table.trim().is_empty() {
                builder
                    .push(" AND l.target_table = ")
                    .push_bind(table.trim().to_string());
            }
        }
        if let Some(start) = self.start {
            builder.push(" AND l.timestamp >= ").push_bind(start);
        }
        if let Some(end) = self.end {
            builder.push(" AND l.timestamp <= ").push_bind(end);
        }
    }
}

#[tracing::instrument(skip(pool, query))]
pub async fn handle(pool: PgPool, query: ListLogsQuery) -> Result<ListLogsResponse, sqlx::Error> {
    let paging = query.pagination();
    let page = paging.page();
    let size = paging.size(LOG_DEFAULT_PAGE_SIZE, LOG_MAX_PAGE_SIZE);
    let offset = paging.offset(LOG_DEFAULT_PAGE_SIZE, LOG_MAX_PAGE_SIZE);

    let mut count_builder = QueryBuilder::new(
        "SELECT COUNT(*) FROM logs l LEFT JOIN users u ON u.id = l.actor_user_id WHERE 1=1",
    );
    query.push_filters(&mut count_builder);
    let total: i64 = count_builder.build_query_scalar().fetch_one(&pool).await?;

    let mut builder = QueryBuilder::new(format!("{} WHERE 1=1", super::super::SELECT_JOINED));
    query.push_filters(&mut builder);
    builder.push(" ORDER BY l.timestamp DESC, l.id DESC LIMIT ");
    builder.push_bind(size);
    builder.push(" OFFSET ");
    builder.push_bind(offset);

    let rows: Vec<LogJoinedRow> = builder.build_query_as().fetch_all(&pool).await?;
    let items = rows.iter().map(LogView::from).collect();

    Ok(Paginated::new(items, page, size, total))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_uri(uri: &str) -> ListLogsQuery {
        let uri: axum::http::Uri = uri.parse().unwrap();
        axum::extract::Query::try_from_uri(&uri).unwrap().0
    }

    #[test]
    fn test_query_string_deserializes() {
        let query = from_uri(
            "/api/logs?actorId=7&action=insert&start=2026-01-01T00:00:00Z&pageSize=10",
        );
        assert_eq!(query.actor_id, Some(7));
        assert_eq!(query.action.as_deref(), Some("insert"));
        assert!(query.start.is_some());
        assert!(query.end.is_none());
        assert_eq!(
            query.pagination().size(LOG_DEFAULT_PAGE_SIZE, LOG_MAX_PAGE_SIZE),
            10
        );
    }

    #[test]
    fn test_log_page_size_caps_at_hundred() {
        let query = from_uri("/api/logs?pageSize=5000");
        assert_eq!(
            query.pagination().size(LOG_DEFAULT_PAGE_SIZE, LOG_MAX_PAGE_SIZE),
            LOG_MAX_PAGE_SIZE
        );
    }

    #[test]
    fn test_log_page_size_defaults_to_twenty_five() {
        let query = ListLogsQuery::default();
        assert_eq!(
            query.pagination().size(LOG_DEFAULT_PAGE_SIZE, LOG_MAX_PAGE_SIZE),
            LOG_DEFAULT_PAGE_SIZE
        );
    }
}
