//! HTTP remote store speaking the PostgREST dialect.
//!
//! Rows are read with `GET /rest/v1/<table>?col=eq.value`, written with a
//! merge-duplicates `POST`, and removed with a filtered `DELETE`. Requests
//! carry the project API key and, when signed in, the session's bearer token.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder, StatusCode};
use serde_json::Value;
use tracing::debug;

use super::{primary_key, Filter, RemoteStore};
use crate::auth::AuthProvider;
use crate::config::RemoteConfig;
use crate::error::WellkeepError;

/// PostgREST-backed [`RemoteStore`].
pub struct RestRemote {
    http: Client,
    base_url: String,
    api_key: String,
    auth: Arc<dyn AuthProvider>,
}

impl RestRemote {
    /// Build a client from the remote settings.
    ///
    /// # Errors
    ///
    /// Returns `WellkeepError::Config` if no URL or API key is configured or
    /// the HTTP client cannot be built.
    pub fn new(config: &RemoteConfig, auth: Arc<dyn AuthProvider>) -> Result<Self, WellkeepError> {
        let base_url = config
            .url
            .as_deref()
            .map(|url| url.trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .ok_or_else(|| WellkeepError::Config("remote.url is not set".to_string()))?;
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| WellkeepError::Config("remote.api_key is not set".to_string()))?;

        let http = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("wellkeep/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| WellkeepError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url,
            api_key,
            auth,
        })
    }

    fn endpoint(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let bearer = self
            .auth
            .access_token()
            .unwrap_or_else(|| self.api_key.clone());
        request
            .header("apikey", &self.api_key)
            .header(header::AUTHORIZATION, format!("Bearer {bearer}"))
    }

    async fn send(&self, request: RequestBuilder) -> Result<String, WellkeepError> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| WellkeepError::Remote(format!("request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| WellkeepError::Remote(format!("response read failed: {e}")))?;

        match status {
            s if s.is_success() => Ok(body),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(WellkeepError::NotAuthenticated),
            s => Err(WellkeepError::Remote(format!("status {s}: {body}"))),
        }
    }
}

#[async_trait]
impl RemoteStore for RestRemote {
    async fn upsert(&self, table: &str, records: &[Value]) -> Result<(), WellkeepError> {
        if records.is_empty() {
            return Ok(());
        }
        debug!(table, records = records.len(), "upsert");

        let request = self
            .http
            .post(self.endpoint(table))
            .query(&[("on_conflict", primary_key(table))])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(records);
        self.send(request).await.map(|_| ())
    }

    async fn select(
        &self,
        table: &str,
        filter: &Filter,
    ) -> Result<Option<Vec<Value>>, WellkeepError> {
        debug!(table, "select");

        let request = self
            .http
            .get(self.endpoint(table))
            .query(&[("select", "*")])
            .query(&filter.to_query());
        let body = self.send(request).await?;

        let rows: Vec<Value> = serde_json::from_str(&body)
            .map_err(|e| WellkeepError::Remote(format!("{table}: malformed response: {e}")))?;
        Ok(Some(rows))
    }

    async fn delete(&self, table: &str, filter: &Filter) -> Result<(), WellkeepError> {
        // An unfiltered DELETE would wipe the table for every account
        if filter.is_empty() {
            return Err(WellkeepError::Remote(format!(
                "{table}: refusing to delete without a filter"
            )));
        }
        debug!(table, "delete");

        let request = self
            .http
            .delete(self.endpoint(table))
            .query(&filter.to_query());
        self.send(request).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticAuth;

    fn config(url: Option<&str>, key: Option<&str>) -> RemoteConfig {
        RemoteConfig {
            url: url.map(String::from),
            api_key: key.map(String::from),
            timeout_seconds: 5,
        }
    }

    #[test]
    fn test_requires_url_and_key() {
        let auth = Arc::new(StaticAuth::anonymous());

        assert!(matches!(
            RestRemote::new(&config(None, Some("k")), auth.clone()),
            Err(WellkeepError::Config(_))
        ));
        assert!(matches!(
            RestRemote::new(&config(Some("https://b.test"), None), auth),
            Err(WellkeepError::Config(_))
        ));
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let auth = Arc::new(StaticAuth::anonymous());
        let remote = RestRemote::new(&config(Some("https://b.test/"), Some("k")), auth).unwrap();
        assert_eq!(remote.endpoint("tasks"), "https://b.test/rest/v1/tasks");
    }

    #[tokio::test]
    async fn test_unfiltered_delete_is_refused() {
        let auth = Arc::new(StaticAuth::anonymous());
        let remote = RestRemote::new(&config(Some("https://b.test"), Some("k")), auth).unwrap();

        let err = remote.delete("tasks", &Filter::default()).await.unwrap_err();
        assert!(err.to_string().contains("refusing"));
    }
}
