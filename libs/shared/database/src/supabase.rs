use anyhow::{Result, anyhow};
use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION, CONTENT_RANGE},
    Method, Response,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, warn};

use shared_config::AppConfig;

#[derive(Clone)]
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            anon_key: config.supabase_anon_key.clone(),
        }
    }

    fn get_headers(&self, auth_token: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();

        match HeaderValue::from_str(&self.anon_key) {
            Ok(value) => {
                headers.insert("apikey", value);
            }
            Err(_) => warn!("Supabase anon key is not a valid header value"),
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = auth_token {
            if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", token)) {
                headers.insert(AUTHORIZATION, value);
            }
        }

        headers
    }

    async fn send(&self, method: Method, path: &str,
                  auth_token: Option<&str>, body: Option<Value>,
                  extra_headers: Option<HeaderMap>) -> Result<Response> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut headers = self.get_headers(auth_token);
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut req = self.client.request(method, &url)
            .headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            error!("API error ({}): {}", status, error_text);

            return Err(match status.as_u16() {
                401 | 403 => anyhow!("Authentication error: {}", error_text),
                404 => anyhow!("Resource not found: {}", error_text),
                _ => anyhow!("API error ({}): {}", status, error_text),
            });
        }

        Ok(response)
    }

    pub async fn request<T>(&self, method: Method, path: &str,
                            auth_token: Option<&str>, body: Option<Value>)
                            -> Result<T>
    where T: DeserializeOwned {
        self.request_with_headers(method, path, auth_token, body, None).await
    }

    pub async fn request_with_headers<T>(&self, method: Method, path: &str,
                                         auth_token: Option<&str>, body: Option<Value>,
                                         headers: Option<HeaderMap>) -> Result<T>
    where T: DeserializeOwned {
        let response = self.send(method, path, auth_token, body, headers).await?;
        let data = response.json::<T>().await?;
        Ok(data)
    }

    /// Exact row count for a filtered table path, read from `Content-Range`.
    pub async fn count(&self, path: &str, auth_token: Option<&str>) -> Result<u64> {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("count=exact"));

        let response = self.send(Method::HEAD, path, auth_token, None, Some(headers)).await?;
        content_range_total(&response)
            .ok_or_else(|| anyhow!("Missing row count in response for {}", path))
    }

    /// Fetches rows together with the exact total matching the filter, ignoring limit/offset.
    pub async fn request_with_count<T>(&self, path: &str, auth_token: Option<&str>)
                                       -> Result<(Vec<T>, u64)>
    where T: DeserializeOwned {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("count=exact"));

        let response = self.send(Method::GET, path, auth_token, None, Some(headers)).await?;
        let total = content_range_total(&response);
        let rows = response.json::<Vec<T>>().await?;
        let total = total.unwrap_or(rows.len() as u64);

        Ok((rows, total))
    }

    pub async fn rpc<T>(&self, function: &str, params: Value, auth_token: Option<&str>) -> Result<T>
    where T: DeserializeOwned {
        let path = format!("/rest/v1/rpc/{}", function);
        self.request(Method::POST, &path, auth_token, Some(params)).await
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }
}

fn content_range_total(response: &Response) -> Option<u64> {
    response
        .headers()
        .get(CONTENT_RANGE)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_content_range_total)
}

/// Parses the total out of a PostgREST `Content-Range` value such as `0-9/42` or `*/0`.
pub fn parse_content_range_total(value: &str) -> Option<u64> {
    let (_, total) = value.rsplit_once('/')?;
    total.trim().parse().ok()
}
