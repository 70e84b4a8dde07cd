//! List users query
//!
//! Supports role (exact, after chair normalization), organization substring,
//! and free-text search over name/email/organization/phone. Ordered by
//! created_at DESC, id DESC for a stable pagination order.

use serde::Deserialize;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::features::shared::pagination::{PageParams, Paginated, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::models::{Role, UserRow, UserView};

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ListUsersQuery {
    #[serde(default)]
    pub role: Option<String>,
    /// `committee` is the legacy query-string name for this column.
    #[serde(default, alias = "committee")]
    pub organization: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default, rename = "pageSize")]
    pub page_size: Option<i64>,
}

pub type ListUsersResponse = Paginated<UserView>;

impl ListUsersQuery {
    fn pagination(&self) -> PageParams {
        PageParams::new(self.page, self.page_size)
    }

    /// Normalized role filter; unknown role names match nothing rather than
    /// erroring, mirroring a filter that simply finds no rows.
    fn role_filter(&self) -> Option<String> {
        self.role
            .as_deref()
            .filter(|r| !r.trim().is_empty())
            .map(|r| match r.parse::<Role>() {
                Ok(role) => role.as_str().to_string(),
                Err(_) => r.trim().to_lowercase(),
            })
    }

    fn push_filters(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        if let Some(role) = self.role_filter() {
            builder.push(" AND role = ").push_bind(role);
        }
        if let Some(ref organization) = self.organization {
            if !organization.trim().is_empty() {
                builder
                    .push(" AND organization ILIKE ")
                    .push_bind(format!("%{}%", organization.trim()));
            }
        }
        if let Some(ref search) = self.search {
            if !search.trim().is_empty() {
                let pattern = format!("%{}%", search.trim());
                builder.push(" AND (name ILIKE ");
                builder.push_bind(pattern.clone());
                builder.push(" OR email ILIKE ");
                builder.push_bind(pattern.clone());
                builder.push(" OR organization ILIKE ");
                builder.push_bind(pattern.clone());
                builder.push(" OR phone ILIKE ");
                builder.push_bind(pattern);
                builder.push(")");
            }
        }
    }
}

#[tracing::instrument(skip(pool, query))]
pub async fn handle(pool: PgPool, query: ListUsersQuery) -> Result<ListUsersResponse, sqlx::Error> {
    let paging = query.pagination();
    let page = paging.page();
    let size = paging.size(DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE);
    let offset = paging.offset(DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE);

    let mut count_builder = QueryBuilder::new("SELECT COUNT(*) FROM users WHERE 1=1");
    query.push_filters(&mut count_builder);
    let total: i64 = count_builder.build_query_scalar().fetch_one(&pool).await?;

    let mut builder = QueryBuilder::new("SELECT * FROM users WHERE 1=1");
    query.push_filters(&mut builder);
    builder.push(" ORDER BY created_at DESC, id DESC LIMIT ");
    builder.push_bind(size);
    builder.push(" OFFSET ");
    builder.push_bind(offset);

    let rows: Vec<UserRow> = builder.build_query_as().fetch_all(&pool).await?;
    let items = rows.iter().map(UserView::from).collect();

    Ok(Paginated::new(items, page, size, total))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_filter_normalizes_chair() {
        let query = ListUsersQuery {
            role: Some("chair".to_string()),
            ..Default::default()
        };
        assert_eq!(query.role_filter().as_deref(), Some("dais"));
    }

    #[test]
    fn test_blank_filters_ignored() {
        let query = ListUsersQuery {
            role: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(query.role_filter().is_none());
    }

    #[test]
    fn test_query_string_deserializes() {
        let uri: axum::http::Uri = "/api/users?role=admin&search=ana&page=2&pageSize=50"
            .parse()
            .unwrap();
        let axum::extract::Query(query) =
            axum::extract::Query::<ListUsersQuery>::try_from_uri(&uri).unwrap();
        assert_eq!(query.role_filter().as_deref(), Some("admin"));
        assert_eq!(query.pagination().page(), 2);
        assert_eq!(query.pagination().size(DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE), 50);
    }

    #[test]
    fn test_query_string_committee_alias() {
        let uri: axum::http::Uri = "/api/users?committee=UNSC".parse().unwrap();
        let axum::extract::Query(query) =
            axum::extract::Query::<ListUsersQuery>::try_from_uri(&uri).unwrap();
        assert_eq!(query.organization.as_deref(), Some("UNSC"));
    }
}
