//! Typed HTTP client of the REST surface

use crate::error::{ClientError, Result};
use labdesk_common::db::{DetailOptions, ListQuery, Page};
use reqwest::{header, Client, Method, RequestBuilder, Url};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const API_PREFIX: &str = "api/v1";

/// Equality filters sent next to the list query, e.g. `("labCode", "3")`
pub type Filters = Vec<(String, String)>;

/// Answer to a create, update or delete
#[derive(Debug, Clone, Deserialize)]
pub struct Mutation<T> {
    pub message: String,
    pub resource: String,
    pub data: Option<T>,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    token: Option<String>,
    locale: Option<String>,
}

impl ApiClient {
    /// Client for the server at `base_url`, e.g. `http://localhost:8080`
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| ClientError::Url(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::Url(format!("{} cannot be a base", base_url)));
        }

        let http = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            http,
            base_url,
            token: None,
            locale: None,
        })
    }

    /// Send `Authorization: Bearer <token>` on every request
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Ask for success messages in `locale` (`en`, `fr`, `ar`)
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    /// URL of `resource` with the key parts as encoded path segments
    pub fn url(&self, resource: &str, key: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| ClientError::Url(self.base_url.to_string()))?;
            segments.pop_if_empty();
            segments.extend(API_PREFIX.split('/'));
            segments.push(resource);
            segments.extend(key.iter().copied());
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let mut request = self.http.request(method, url);
        if let Some(ref token) = self.token {
            request = request.bearer_auth(token);
        }
        if let Some(ref locale) = self.locale {
            request = request.header(header::ACCEPT_LANGUAGE, locale.as_str());
        }
        request
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            debug!(status = status.as_u16(), "API request failed");
            return Err(ClientError::from_body(status, &body));
        }
        Ok(serde_json::from_str(&body)?)
    }

    /// One page of `resource`
    pub async fn fetch_page<T: DeserializeOwned>(
        &self,
        resource: &str,
        query: &ListQuery,
        filters: &[(String, String)],
    ) -> Result<Page<T>> {
        let url = self.url(resource, &[])?;
        let request = self.request(Method::GET, url).query(query).query(filters);
        self.send(request).await
    }

    /// Every row of `resource`, for dropdowns
    pub async fn all<T: DeserializeOwned>(
        &self,
        resource: &str,
        filters: &[(String, String)],
    ) -> Result<Vec<T>> {
        let url = self.url(resource, &["all"])?;
        self.send(self.request(Method::GET, url).query(filters)).await
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        resource: &str,
        key: &[&str],
        options: DetailOptions,
    ) -> Result<T> {
        let url = self.url(resource, key)?;
        self.send(self.request(Method::GET, url).query(&options)).await
    }

    pub async fn create<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        resource: &str,
        body: &B,
    ) -> Result<Mutation<T>> {
        let url = self.url(resource, &[])?;
        self.send(self.request(Method::POST, url).json(body)).await
    }

    /// Partial update; fields left out keep their stored value
    pub async fn update<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        resource: &str,
        key: &[&str],
        body: &B,
    ) -> Result<Mutation<T>> {
        let url = self.url(resource, key)?;
        self.send(self.request(Method::PUT, url).json(body)).await
    }

    pub async fn delete(&self, resource: &str, key: &[&str]) -> Result<Mutation<Value>> {
        let url = self.url(resource, key)?;
        self.send(self.request(Method::DELETE, url)).await
    }
}
