use async_trait::async_trait;
use log::debug;
#[cfg(test)]
use mockall::automock;
use reqwest::{header::CONTENT_TYPE, Client, Method};
use serde_json::Value;

use crate::error::TransportError;

/// Toggl APIへ送るリクエスト。
#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: vec![],
            body: None,
        }
    }

    pub fn with_query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Toggl APIと通信するためのtrait。
///
/// 成功した場合はレスポンスボディをそのまま返す。
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<Vec<u8>, TransportError>;
}

/// HTTPでToggl APIと通信する`Transport`。
///
/// # Examples
///
/// ```
/// use toggl_entries::transport::HttpTransport;
///
/// let transport = HttpTransport::new("https://api.track.toggl.com/api/v8", "token");
/// ```
pub struct HttpTransport {
    client: Client,
    api_url: String,
    api_token: String,
}

impl HttpTransport {
    /// 新しい`HttpTransport`を返す。
    ///
    /// # Arguments
    ///
    /// * `api_url` - APIのベースURL
    /// * `api_token` - APIトークン
    pub fn new(api_url: impl Into<String>, api_token: impl Into<String>) -> Self {
        let api_url: String = api_url.into();
        Self {
            client: Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            api_token: api_token.into(),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<Vec<u8>, TransportError> {
        let url = format!("{}{}", self.api_url, request.path);
        let method = request.method.to_string();
        debug!("{} {} {:?}", method, url, request.body);

        let mut builder = self
            .client
            .request(request.method, &url)
            .basic_auth(&self.api_token, Some("api_token"))
            .header(CONTENT_TYPE, "application/json");
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|source| TransportError::Request {
                method: method.clone(),
                url: url.clone(),
                source,
            })?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|source| TransportError::Request {
                method: method.clone(),
                url: url.clone(),
                source,
            })?;

        if status.is_client_error() || status.is_server_error() {
            return Err(TransportError::Status {
                method,
                url,
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        Ok(body.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use mockito::Matcher;
    use reqwest::Method;
    use serde_json::json;

    use super::{ApiRequest, HttpTransport, Transport};
    use crate::error::TransportError;

    fn basic_auth(token: &str) -> String {
        format!("Basic {}", STANDARD.encode(format!("{}:api_token", token)))
    }

    /// 認証情報とボディを付けて送信し、レスポンスボディを返すことを確認する。
    #[tokio::test]
    async fn test_send_with_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/time_entries/start")
            .match_header("authorization", basic_auth("secret").as_str())
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(
                json!({"time_entry": {"description": "write"}}),
            ))
            .with_status(200)
            .with_body(r#"{"data": {"id": 1}}"#)
            .create_async()
            .await;
        let transport = HttpTransport::new(server.url(), "secret");

        let body = transport
            .send(
                ApiRequest::new(Method::POST, "/time_entries/start")
                    .with_body(json!({"time_entry": {"description": "write"}})),
            )
            .await
            .unwrap();

        assert_eq!(body, br#"{"data": {"id": 1}}"#.to_vec());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_with_query() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/time_entries")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("start_date".into(), "2024-01-01T00:00:00+00:00".into()),
                Matcher::UrlEncoded("end_date".into(), "2024-01-02T00:00:00+00:00".into()),
            ]))
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;
        let transport = HttpTransport::new(format!("{}/", server.url()), "secret");

        let body = transport
            .send(
                ApiRequest::new(Method::GET, "/time_entries")
                    .with_query("start_date", "2024-01-01T00:00:00+00:00")
                    .with_query("end_date", "2024-01-02T00:00:00+00:00"),
            )
            .await
            .unwrap();

        assert_eq!(body, b"[]".to_vec());
        mock.assert_async().await;
    }

    /// エラーステータスの場合はステータスとボディを含むエラーを返すことを確認する。
    #[tokio::test]
    async fn test_send_error_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("DELETE", "/time_entries/42")
            .with_status(404)
            .with_body("Time entry not found")
            .create_async()
            .await;
        let transport = HttpTransport::new(server.url(), "secret");

        let result = transport
            .send(ApiRequest::new(Method::DELETE, "/time_entries/42"))
            .await;

        match result {
            Err(TransportError::Status { status, body, .. }) => {
                assert_eq!(status, 404);
                assert_eq!(body, "Time entry not found");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
