use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::ClientConfig;
use crate::error::{Error, Result};

use super::cookies::SessionCookies;

/// Header the CSRF cookie value is mirrored into on authenticated calls.
pub const CSRF_HEADER_NAME: &str = "X-CSRF-Token";

/// Endpoint that exchanges the refresh cookie for a new session.
pub const REFRESH_ENDPOINT: &str = "/api/v1/auth/refresh-token";

/// A single API call: method, endpoint path, query and optional JSON body.
///
/// Kept separate from `reqwest::RequestBuilder` so the same call can be
/// rebuilt for the retry after a session refresh.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    endpoint: String,
    query: Vec<(String, String)>,
    body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(Method::GET, endpoint)
    }

    pub fn post(endpoint: impl Into<String>) -> Self {
        Self::new(Method::POST, endpoint)
    }

    pub fn put(endpoint: impl Into<String>) -> Self {
        Self::new(Method::PUT, endpoint)
    }

    pub fn delete(endpoint: impl Into<String>) -> Self {
        Self::new(Method::DELETE, endpoint)
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn query_pairs(mut self, pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        self.query.extend(pairs);
        self
    }

    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    config: ClientConfig,
    cookies: SessionCookies,
}

impl HttpClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let cookies = SessionCookies::new(&config.api_base_url)?;
        let client = Client::builder().cookie_provider(cookies.jar()).build()?;
        Ok(Self {
            client,
            config,
            cookies,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.config.api_base_url
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn cookies(&self) -> &SessionCookies {
        &self.cookies
    }

    // ── Public ──────────────────────────────────────────────────────────

    /// Call an endpoint that needs no session.
    pub async fn request<T: DeserializeOwned>(&self, req: ApiRequest) -> Result<T> {
        let result = self.send_public(&req).await;
        self.report(&req, &result);
        result
    }

    async fn send_public<T: DeserializeOwned>(&self, req: &ApiRequest) -> Result<T> {
        let resp = self.build(req, None).send().await?;
        read_body(resp).await
    }

    /// Send a call and hand back the raw status, without error mapping.
    pub async fn raw_status(&self, req: ApiRequest) -> Result<StatusCode> {
        let resp = self.build(&req, None).send().await?;
        Ok(resp.status())
    }

    // ── Session ─────────────────────────────────────────────────────────

    /// Call an endpoint that needs the session cookie and CSRF header.
    ///
    /// A 401 triggers one session refresh followed by exactly one retry.
    /// If the refresh itself fails, `Ok(None)` is returned: the caller has to
    /// send the user back to the login screen.
    pub async fn authed_request<T: DeserializeOwned>(&self, req: ApiRequest) -> Result<Option<T>> {
        let result = self.send_authed(&req).await;
        self.report(&req, &result);
        result
    }

    async fn send_authed<T: DeserializeOwned>(&self, req: &ApiRequest) -> Result<Option<T>> {
        let csrf = self.cookies.csrf_token();
        let mut resp = self.build(req, csrf.as_deref()).send().await?;

        if resp.status() == StatusCode::UNAUTHORIZED {
            log::info!(
                "{} {} returned 401, refreshing session",
                req.method,
                req.endpoint
            );
            if !self.refresh_session().await? {
                return Ok(None);
            }

            // The token may have rotated with the refresh.
            let csrf = self.cookies.csrf_token().or(csrf);
            resp = self.build(req, csrf.as_deref()).send().await?;
        }

        read_body(resp).await.map(Some)
    }

    async fn refresh_session(&self) -> Result<bool> {
        let resp = self
            .build(&ApiRequest::post(REFRESH_ENDPOINT), None)
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            log::info!("Session refreshed");
            Ok(true)
        } else {
            log::warn!("Session refresh failed: {}", status);
            Ok(false)
        }
    }

    // ── Helpers ─────────────────────────────────────────────────────────

    fn build(&self, req: &ApiRequest, csrf: Option<&str>) -> RequestBuilder {
        log::debug!("{} {}", req.method, req.endpoint);

        let mut builder = self
            .client
            .request(
                req.method.clone(),
                format!("{}{}", self.config.api_base_url, req.endpoint),
            )
            .header(CONTENT_TYPE, "application/json");

        if !req.query.is_empty() {
            builder = builder.query(&req.query);
        }
        if let Some(token) = csrf {
            builder = builder.header(CSRF_HEADER_NAME, token);
        }
        if let Some(body) = &req.body {
            builder = builder.json(body);
        }
        builder
    }

    fn report<T>(&self, req: &ApiRequest, result: &Result<T>) {
        if !self.config.debug {
            return;
        }
        if let Err(e) = result {
            log::error!("API error on {} {}: {}", req.method, req.endpoint, e);
        }
    }
}

async fn read_body<T: DeserializeOwned>(resp: Response) -> Result<T> {
    let status = resp.status();
    let bytes = resp.bytes().await?;

    if !(status.is_success() || status.is_redirection()) {
        return Err(Error::Request(extract_error(status, &bytes)));
    }

    let body: &[u8] = if bytes.is_empty() { b"null" } else { &bytes[..] };
    Ok(serde_json::from_slice(body)?)
}

fn extract_error(status: StatusCode, body: &[u8]) -> String {
    let parsed = serde_json::from_slice::<serde_json::Value>(body).ok();
    let field = |name: &str| {
        parsed
            .as_ref()
            .and_then(|v| v.get(name)?.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    field("error")
        .or_else(|| field("message"))
        .unwrap_or_else(|| format!("HTTP error: {}", status.as_u16()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Greeting {
        hello: String,
    }

    fn client_for(server: &mockito::Server) -> HttpClient {
        HttpClient::new(ClientConfig::new(&server.url())).unwrap()
    }

    #[tokio::test]
    async fn test_public_request_returns_body() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("GET", "/api/v1/hello")
            .match_header("content-type", "application/json")
            .match_header("x-csrf-token", Matcher::Missing)
            .with_status(200)
            .with_body(r#"{"hello":"world"}"#)
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server);
        client.cookies().set("csrf_token=secret; Path=/");

        let body: Greeting = client.request(ApiRequest::get("/api/v1/hello")).await.unwrap();
        assert_eq!(body.hello, "world");
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_public_request_sends_query_and_body() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("PUT", "/api/v1/things/7")
            .match_query(Matcher::UrlEncoded("mode".into(), "full".into()))
            .match_body(Matcher::Json(serde_json::json!({"name": "x"})))
            .with_status(200)
            .with_body(r#"{"hello":"done"}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let req = ApiRequest::put("/api/v1/things/7")
            .query("mode", "full")
            .json(&serde_json::json!({"name": "x"}))
            .unwrap();
        let body: Greeting = client.request(req).await.unwrap();
        assert_eq!(body.hello, "done");
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_message_prefers_error_field() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/e1")
            .with_status(400)
            .with_body(r#"{"error":"bad input","message":"ignored"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/e2")
            .with_status(404)
            .with_body(r#"{"message":"not here"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/e3")
            .with_status(502)
            .with_body("<html>gateway</html>")
            .create_async()
            .await;

        let client = client_for(&server);
        let e1 = client.request::<Greeting>(ApiRequest::get("/e1")).await.unwrap_err();
        let e2 = client.request::<Greeting>(ApiRequest::get("/e2")).await.unwrap_err();
        let e3 = client.request::<Greeting>(ApiRequest::get("/e3")).await.unwrap_err();

        assert_eq!(e1.message(), "bad input");
        assert_eq!(e2.message(), "not here");
        assert_eq!(e3.message(), "HTTP error: 502");
        assert!(matches!(e3, Error::Request(_)));
    }

    #[tokio::test]
    async fn test_malformed_success_body_is_decode_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/broken")
            .with_status(200)
            .with_body("{not json")
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client.request::<Greeting>(ApiRequest::get("/broken")).await.unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[tokio::test]
    async fn test_empty_body_decodes_as_unit() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("DELETE", "/api/v1/things/1")
            .with_status(204)
            .create_async()
            .await;

        let client = client_for(&server);
        let result: Option<()> = client
            .authed_request(ApiRequest::delete("/api/v1/things/1"))
            .await
            .unwrap();
        assert_eq!(result, Some(()));
    }

    #[tokio::test]
    async fn test_not_modified_is_not_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v1/things")
            .with_status(304)
            .create_async()
            .await;

        let client = client_for(&server);
        let result: Option<Greeting> = client
            .request(ApiRequest::get("/api/v1/things"))
            .await
            .unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_connection_failure_is_transport_error() {
        let client = HttpClient::new(ClientConfig::new("http://127.0.0.1:1")).unwrap();
        let err = client.request::<Greeting>(ApiRequest::get("/x")).await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }

    #[tokio::test]
    async fn test_authed_request_attaches_csrf_header() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("GET", "/api/v1/auth/me")
            .match_header("x-csrf-token", "tok-1")
            .match_header("cookie", Matcher::Regex("csrf_token=tok-1".into()))
            .with_status(200)
            .with_body(r#"{"hello":"me"}"#)
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server);
        client.cookies().set("csrf_token=tok-1; Path=/");

        let body: Option<Greeting> = client
            .authed_request(ApiRequest::get("/api/v1/auth/me"))
            .await
            .unwrap();
        assert_eq!(body.unwrap().hello, "me");
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_unauthorized_refreshes_then_retries_once() {
        let mut server = mockito::Server::new_async().await;
        let original = server
            .mock("GET", "/api/v1/users")
            .match_header("x-csrf-token", "old")
            .with_status(401)
            .with_body(r#"{"error":"expired"}"#)
            .expect(1)
            .create_async()
            .await;
        let refresh = server
            .mock("POST", REFRESH_ENDPOINT)
            .with_status(200)
            .with_header("set-cookie", "csrf_token=new; Path=/")
            .with_body("{}")
            .expect(1)
            .create_async()
            .await;
        let retry = server
            .mock("GET", "/api/v1/users")
            .match_header("x-csrf-token", "new")
            .with_status(200)
            .with_body(r#"{"hello":"retried"}"#)
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server);
        client.cookies().set("csrf_token=old; Path=/");

        let body: Option<Greeting> = client
            .authed_request(ApiRequest::get("/api/v1/users"))
            .await
            .unwrap();
        assert_eq!(body.unwrap().hello, "retried");

        original.assert_async().await;
        refresh.assert_async().await;
        retry.assert_async().await;
    }

    #[tokio::test]
    async fn test_failed_refresh_returns_empty_result() {
        let mut server = mockito::Server::new_async().await;
        let original = server
            .mock("GET", "/api/v1/audit")
            .with_status(401)
            .expect(1)
            .create_async()
            .await;
        let refresh = server
            .mock("POST", REFRESH_ENDPOINT)
            .with_status(401)
            .with_body(r#"{"error":"refresh expired"}"#)
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server);
        let body: Option<Greeting> = client
            .authed_request(ApiRequest::get("/api/v1/audit"))
            .await
            .unwrap();
        assert!(body.is_none());

        original.assert_async().await;
        refresh.assert_async().await;
    }

    #[tokio::test]
    async fn test_second_unauthorized_is_reported_not_looped() {
        let mut server = mockito::Server::new_async().await;
        let endpoint = server
            .mock("GET", "/api/v1/serials")
            .with_status(401)
            .with_body(r#"{"error":"still unauthorized"}"#)
            .expect(2)
            .create_async()
            .await;
        let refresh = server
            .mock("POST", REFRESH_ENDPOINT)
            .with_status(200)
            .with_body("{}")
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client
            .authed_request::<Greeting>(ApiRequest::get("/api/v1/serials"))
            .await
            .unwrap_err();
        assert_eq!(err.message(), "still unauthorized");

        endpoint.assert_async().await;
        refresh.assert_async().await;
    }

    #[tokio::test]
    async fn test_retry_keeps_method_and_body() {
        let mut server = mockito::Server::new_async().await;
        let payload = serde_json::json!({"count": 3});
        let first = server
            .mock("POST", "/api/v1/warranty/batch-create")
            .match_header("x-csrf-token", "old")
            .match_body(Matcher::Json(payload.clone()))
            .with_status(401)
            .expect(1)
            .create_async()
            .await;
        server
            .mock("POST", REFRESH_ENDPOINT)
            .with_status(200)
            .with_header("set-cookie", "csrf_token=new; Path=/")
            .expect(1)
            .create_async()
            .await;
        let retry = server
            .mock("POST", "/api/v1/warranty/batch-create")
            .match_header("x-csrf-token", "new")
            .match_body(Matcher::Json(payload.clone()))
            .with_status(200)
            .with_body(r#"{"hello":"created"}"#)
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server);
        client.cookies().set("csrf_token=old; Path=/");

        let req = ApiRequest::post("/api/v1/warranty/batch-create")
            .json(&payload)
            .unwrap();
        let body: Option<Greeting> = client.authed_request(req).await.unwrap();
        assert_eq!(body.unwrap().hello, "created");

        first.assert_async().await;
        retry.assert_async().await;
    }

    #[tokio::test]
    async fn test_debug_config_does_not_change_result() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/e")
            .with_status(500)
            .with_body(r#"{"message":"boom"}"#)
            .create_async()
            .await;

        let client =
            HttpClient::new(ClientConfig::new(&server.url()).with_debug(true)).unwrap();
        let err = client.request::<Greeting>(ApiRequest::get("/e")).await.unwrap_err();
        assert_eq!(err.message(), "boom");
    }
}
