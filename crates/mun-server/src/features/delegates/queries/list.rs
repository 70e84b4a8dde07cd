//! List delegate assignments
//!
//! Filters on committeeId/userId (exact), committeeCode (case-insensitive
//! exact), and a free-text search over country, user name/email, and
//! committee name/code. Ordered by updated_at DESC, id DESC.

use serde::Deserialize;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::features::shared::pagination::{PageParams, Paginated, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::models::{DelegateJoinedRow, DelegateView};

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ListDelegatesQuery {
    #[serde(default)]
    pub committee_id: Option<i64>,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub committee_code: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub page_size: Option<i64>,
}

pub type ListDelegatesResponse = Paginated<DelegateView>;

impl ListDelegatesQuery {
    fn pagination(&self) -> PageParams {
        PageParams::new(self.page, self.page_size)
    }

    fn push_filters(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        if let Some(committee_id) = self.committee_id {
            builder.push(" AND d.committee_id = ").push_bind(committee_id);
        }
        if let Some(user_id) = self.user_id {
            builder.push(" AND d.user_id = ").push_bind(user_id);
        }
        if let Some(ref code) = self.committee_code {
            if !code.trim().is_empty() {
                builder
                    .push(" AND upper(c.code) = ")
                    .push_bind(code.trim().to_uppercase());
            }
        }
        if let Some(ref search) = self.search {
            if !search.trim().is_empty() {
                let pattern = format!("%{}%", search.trim());
                builder.push(" AND (d.country ILIKE ");
                builder.push_bind(pattern.clone());
                builder.push(" OR u.name ILIKE ");
                builder.push_bind(pattern.clone());
                builder.push(" OR u.email ILIKE ");
                builder.push_bind(pattern.clone());
                builder.push(" OR c.name ILIKE ");
                builder.push_bind(pattern.clone());
                builder.push(" OR c.code ILIKE ");
                builder.push_bind(pattern);
                builder.push(")");
            }
        }
    }
}

#[tracing::instrument(skip(pool, query))]
pub async fn handle(
    pool: PgPool,
    query: ListDelegatesQuery,
) -> Result<ListDelegatesResponse, sqlx::Error> {
    let paging = query.pagination();
    let page = paging.page();
    let size = paging.size(DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE);
    let offset = paging.offset(DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE);

    let mut count_builder = QueryBuilder::new(
        "SELECT COUNT(*) FROM delegates d \
         JOIN users u ON u.id = d.user_id \
         JOIN committees c ON c.id = d.committee_id WHERE 1=1",
    );
    query.push_filters(&mut count_builder);
    let total: i64 = count_builder.build_query_scalar().fetch_one(&pool).await?;

    let mut builder = QueryBuilder::new(format!("{} WHERE 1=1", super::super::SELECT_JOINED));
    query.push_filters(&mut builder);
    builder.push(" ORDER BY d.updated_at DESC, d.id DESC LIMIT ");
    builder.push_bind(size);
    builder.push(" OFFSET ");
    builder.push_bind(offset);

    let rows: Vec<DelegateJoinedRow> = builder.build_query_as().fetch_all(&pool).await?;
    let items = rows.iter().map(DelegateView::from).collect();

    Ok(Paginated::new(items, page, size, total))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_uri(uri: &str) -> ListDelegatesQuery {
        let uri: axum::http::Uri = uri.parse().unwrap();
        axum::extract::Query::try_from_uri(&uri).unwrap().0
    }

    #[test]
    fn test_query_string_deserializes() {
        let query = from_uri("/api/delegates?committeeCode=sc&search=fra&page=2&pageSize=50");
        assert_eq!(query.committee_code.as_deref(), Some("sc"));
        assert_eq!(query.pagination().page(), 2);
        assert_eq!(query.pagination().size(DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE), 50);
    }

    #[test]
    fn test_query_string_numeric_filters() {
        let query = from_uri("/api/delegates?committeeId=3&userId=12");
        assert_eq!(query.committee_id, Some(3));
        assert_eq!(query.user_id, Some(12));
    }

    #[test]
    fn test_defaults_are_empty() {
        let query = from_uri("/api/delegates");
        assert!(query.committee_id.is_none());
        assert!(query.search.is_none());
        assert_eq!(query.pagination().page(), 1);
    }
}
