//! PostgREST table store over HTTPS (the hosted Supabase backend).

use crate::core::error::MigrateError;
use crate::destination::{Destination, validate_identifier};
use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{CONTENT_RANGE, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::time::Duration;

const REST_PREFIX: &str = "/rest/v1";

/// Error body PostgREST returns on rejected requests.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
    code: Option<String>,
    details: Option<String>,
    hint: Option<String>,
}

pub struct RestDestination {
    http: Client,
    base_url: String,
}

impl RestDestination {
    /// `base_url` is the project URL, e.g. `https://<ref>.supabase.co`.
    pub fn new(base_url: &str, service_key: &str, timeout: Duration) -> Result<Self, MigrateError> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(service_key)
            .map_err(|e| MigrateError::ConfigError(format!("invalid service key: {}", e)))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", service_key))
            .map_err(|e| MigrateError::ConfigError(format!("invalid service key: {}", e)))?;
        headers.insert("apikey", key);
        headers.insert(reqwest::header::AUTHORIZATION, bearer);

        let http = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .user_agent(concat!("kanban-migrate/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn table_url(&self, table: &str) -> Result<String, MigrateError> {
        Ok(format!(
            "{}{}/{}",
            self.base_url,
            REST_PREFIX,
            validate_identifier(table)?
        ))
    }

    fn send(&self, req: RequestBuilder) -> Result<Response, MigrateError> {
        let resp = req.send()?;
        if resp.status().is_success() {
            return Ok(resp);
        }
        let status = resp.status();
        let body = resp.text().unwrap_or_default();
        Err(MigrateError::DestinationError(api_error_message(status, &body)))
    }
}

impl Destination for RestDestination {
    fn label(&self) -> String {
        self.base_url.clone()
    }

    fn probe(&mut self) -> Result<(), MigrateError> {
        let url = format!("{}{}/", self.base_url, REST_PREFIX);
        self.send(self.http.get(url))?;
        Ok(())
    }

    fn upsert(
        &mut self,
        table: &str,
        records: &[JsonValue],
        conflict_key: &str,
    ) -> Result<(), MigrateError> {
        let url = self.table_url(table)?;
        let req = self
            .http
            .post(url)
            .query(&[("on_conflict", validate_identifier(conflict_key)?)])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(records);
        self.send(req)?;
        tracing::debug!(table, records = records.len(), "upsert accepted");
        Ok(())
    }

    fn count(&mut self, table: &str) -> Result<u64, MigrateError> {
        let url = self.table_url(table)?;
        let req = self
            .http
            .head(url)
            .query(&[("select", "*")])
            .header("Prefer", "count=exact");
        let resp = self.send(req)?;
        let range = resp
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        parse_content_range_total(range).ok_or_else(|| {
            MigrateError::DestinationError(format!(
                "{}: missing row count in Content-Range '{}'",
                table, range
            ))
        })
    }

    fn read_one(&mut self, table: &str) -> Result<Vec<JsonValue>, MigrateError> {
        let url = self.table_url(table)?;
        let req = self.http.get(url).query(&[("select", "*"), ("limit", "1")]);
        let rows: Vec<JsonValue> = self.send(req)?.json()?;
        Ok(rows)
    }
}

/// Total from a `Content-Range` header such as `0-24/3573` or `*/0`.
pub fn parse_content_range_total(header: &str) -> Option<u64> {
    let (_, total) = header.trim().rsplit_once('/')?;
    total.trim().parse().ok()
}

/// Turn a PostgREST error response into one readable line.
pub fn api_error_message(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(err) if err.message.is_some() => {
            let mut msg = err.message.unwrap_or_default();
            if let Some(code) = err.code.filter(|c| !c.is_empty()) {
                msg = format!("{} ({})", msg, code);
            }
            if let Some(details) = err.details.filter(|d| !d.is_empty()) {
                msg.push_str(&format!(": {}", details));
            }
            if let Some(hint) = err.hint.filter(|h| !h.is_empty()) {
                msg.push_str(&format!(" [hint: {}]", hint));
            }
            msg
        }
        _ if body.trim().is_empty() => format!("HTTP {}", status),
        _ => format!("HTTP {}: {}", status, body.trim()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_range_totals() {
        assert_eq!(parse_content_range_total("0-24/3573"), Some(3573));
        assert_eq!(parse_content_range_total("*/0"), Some(0));
        assert_eq!(parse_content_range_total("*/*"), None);
        assert_eq!(parse_content_range_total(""), None);
    }

    #[test]
    fn postgrest_error_is_condensed() {
        let body = r#"{"code":"42P01","details":null,"hint":null,"message":"relation \"public.revenue\" does not exist"}"#;
        assert_eq!(
            api_error_message(StatusCode::NOT_FOUND, body),
            "relation \"public.revenue\" does not exist (42P01)"
        );
    }

    #[test]
    fn non_json_error_keeps_status() {
        assert_eq!(
            api_error_message(StatusCode::BAD_GATEWAY, "upstream down\n"),
            "HTTP 502 Bad Gateway: upstream down"
        );
        assert_eq!(
            api_error_message(StatusCode::UNAUTHORIZED, ""),
            "HTTP 401 Unauthorized"
        );
    }

    #[test]
    fn table_urls_are_validated() {
        let dest =
            RestDestination::new("https://abc.supabase.co/", "key", Duration::from_secs(1)).unwrap();
        assert_eq!(
            dest.table_url("clients").unwrap(),
            "https://abc.supabase.co/rest/v1/clients"
        );
        assert!(dest.table_url("../auth").is_err());
        assert_eq!(dest.label(), "https://abc.supabase.co");
    }
}
