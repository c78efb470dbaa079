//! Table CRUD
//!
//! Thin PostgREST binding: filter/order query building plus the four row
//! operations the app uses. Writes ask for `return=minimal` since the caller
//! reloads the list afterwards anyway.

use gloo_net::http::{Request, Response};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::Config;
use crate::error::Error;

/// Characters escaped in query-string values (filter operands, redirect targets)
pub(crate) const QUERY_VALUE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'&')
    .add(b'+')
    .add(b'/')
    .add(b':')
    .add(b'=')
    .add(b'?');

/// Sort direction for `order=` clauses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Ascending,
    Descending,
}

impl Order {
    fn suffix(self) -> &'static str {
        match self {
            Order::Ascending => "asc",
            Order::Descending => "desc",
        }
    }
}

/// One pending query against a single table.
///
/// Built by [`crate::Supabase::from`], finished by one of the terminal
/// operations (`fetch`, `insert`, `update`, `delete`).
pub struct TableQuery {
    config: Config,
    bearer: String,
    table: String,
    select: Option<String>,
    filters: Vec<(String, String)>,
    order: Option<String>,
}

impl TableQuery {
    pub(crate) fn new(config: Config, bearer: String, table: &str) -> Self {
        Self {
            config,
            bearer,
            table: table.to_string(),
            select: None,
            filters: Vec::new(),
            order: None,
        }
    }

    pub fn select(mut self, columns: &str) -> Self {
        self.select = Some(columns.to_string());
        self
    }

    /// Restrict to rows where `column` equals `value`.
    pub fn eq(mut self, column: &str, value: impl std::fmt::Display) -> Self {
        let encoded = utf8_percent_encode(&value.to_string(), QUERY_VALUE).to_string();
        self.filters.push((column.to_string(), format!("eq.{encoded}")));
        self
    }

    pub fn order(mut self, column: &str, order: Order) -> Self {
        self.order = Some(format!("{column}.{}", order.suffix()));
        self
    }

    /// GET the matching rows.
    pub async fn fetch<T: DeserializeOwned>(self) -> Result<Vec<T>, Error> {
        let response = Request::get(&self.url())
            .header("apikey", &self.config.anon_key)
            .header("Authorization", &format!("Bearer {}", self.bearer))
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if !(200..300).contains(&status) {
            return Err(Error::from_response(status, &text));
        }
        serde_json::from_str(&text).map_err(|e| Error::Decode(e.to_string()))
    }

    /// POST one new row. Identifiers and timestamps are backend-assigned.
    pub async fn insert<R: Serialize>(self, row: &R) -> Result<(), Error> {
        let response = Request::post(&self.url())
            .header("apikey", &self.config.anon_key)
            .header("Authorization", &format!("Bearer {}", self.bearer))
            .header("Prefer", "return=minimal")
            .json(row)?
            .send()
            .await?;
        check_status(response).await
    }

    /// PATCH the matching rows with a partial payload.
    pub async fn update<P: Serialize>(self, patch: &P) -> Result<(), Error> {
        debug_assert!(!self.filters.is_empty(), "unfiltered update would touch every row");
        let response = Request::patch(&self.url())
            .header("apikey", &self.config.anon_key)
            .header("Authorization", &format!("Bearer {}", self.bearer))
            .header("Prefer", "return=minimal")
            .json(patch)?
            .send()
            .await?;
        check_status(response).await
    }

    /// DELETE the matching rows.
    pub async fn delete(self) -> Result<(), Error> {
        debug_assert!(!self.filters.is_empty(), "unfiltered delete would drop every row");
        let response = Request::delete(&self.url())
            .header("apikey", &self.config.anon_key)
            .header("Authorization", &format!("Bearer {}", self.bearer))
            .send()
            .await?;
        check_status(response).await
    }

    fn url(&self) -> String {
        let base = self.config.rest_url(&self.table);
        let query = self.query_string();
        if query.is_empty() {
            base
        } else {
            format!("{base}?{query}")
        }
    }

    fn query_string(&self) -> String {
        let mut parts = Vec::new();
        if let Some(columns) = &self.select {
            parts.push(format!("select={columns}"));
        }
        for (column, predicate) in &self.filters {
            parts.push(format!("{column}={predicate}"));
        }
        if let Some(order) = &self.order {
            parts.push(format!("order={order}"));
        }
        parts.join("&")
    }
}

async fn check_status(response: Response) -> Result<(), Error> {
    let status = response.status();
    if (200..300).contains(&status) {
        Ok(())
    } else {
        let text = response.text().await.unwrap_or_default();
        Err(Error::from_response(status, &text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(table: &str) -> TableQuery {
        TableQuery::new(Config::new("https://proj.supabase.co", "anon"), "anon".to_string(), table)
    }

    #[test]
    fn test_select_filter_order_query() {
        let q = query("tasks")
            .select("*")
            .eq("user_id", "123e4567-e89b-12d3-a456-426614174000")
            .order("created_at", Order::Descending);
        assert_eq!(
            q.url(),
            "https://proj.supabase.co/rest/v1/tasks?select=*\
             &user_id=eq.123e4567-e89b-12d3-a456-426614174000\
             &order=created_at.desc"
        );
    }

    #[test]
    fn test_filter_values_are_escaped() {
        let q = query("tasks").eq("title", "a&b #1");
        assert_eq!(q.query_string(), "title=eq.a%26b%20%231");
    }

    #[test]
    fn test_numeric_id_filter() {
        let q = query("tasks").eq("id", 42_i64);
        assert_eq!(q.query_string(), "id=eq.42");
    }

    #[test]
    fn test_bare_table_url_has_no_question_mark() {
        assert_eq!(query("tasks").url(), "https://proj.supabase.co/rest/v1/tasks");
    }

    #[test]
    fn test_ascending_order_suffix() {
        let q = query("tasks").order("created_at", Order::Ascending);
        assert_eq!(q.query_string(), "order=created_at.asc");
    }
}
