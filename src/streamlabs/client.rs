//! Authenticated request executor for the Streamlabs API

use parking_lot::RwLock;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use super::envelope::{Envelope, RequestMeta};
use super::params::{Endpoint, Placement};
use crate::config::settings::{DEFAULT_API_URL, DEFAULT_DONATION_PULL_LIMIT};
use crate::error::{Error, Result};

/// The current access token.
///
/// Empty until a handshake succeeds. Each replacement is a single store under
/// the lock, so readers see either the old or the new token.
#[derive(Default)]
pub struct Credentials {
    access_token: RwLock<String>,
}

impl Credentials {
    pub fn access_token(&self) -> String {
        self.access_token.read().clone()
    }

    pub fn set_access_token(&self, token: impl Into<String>) {
        *self.access_token.write() = token.into();
    }

    pub fn has_access_token(&self) -> bool {
        !self.access_token.read().is_empty()
    }
}

/// Settings read by the donation pull at call time
struct PullSettings {
    donation_pull_limit: u32,
    currency_code: String,
}

/// Streamlabs API client, shared by the handshake and the business operations
pub struct StreamlabsClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Credentials,
    pull: RwLock<PullSettings>,
}

impl StreamlabsClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_http_client(reqwest::Client::new(), base_url)
    }

    pub fn with_http_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials: Credentials::default(),
            pull: RwLock::new(PullSettings {
                donation_pull_limit: DEFAULT_DONATION_PULL_LIMIT,
                currency_code: String::new(),
            }),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Replace the token used for authenticated calls
    pub fn set_access_token(&self, token: impl Into<String>) {
        self.credentials.set_access_token(token);
    }

    /// Set how many donation records a pull returns
    pub fn set_donation_pull_limit(&self, limit: u32) {
        self.pull.write().donation_pull_limit = limit;
    }

    /// Set the currency donations are converted to
    pub fn set_currency_code(&self, currency_code: impl Into<String>) {
        self.pull.write().currency_code = currency_code.into();
    }

    pub fn donation_pull_limit(&self) -> u32 {
        self.pull.read().donation_pull_limit
    }

    pub fn currency_code(&self) -> String {
        self.pull.read().currency_code.clone()
    }

    /// Build the HTTP request for an operation.
    ///
    /// The bearer token is read here, so a request built before a token
    /// change keeps the token it was built with.
    pub fn build_request<E: Endpoint>(&self, params: &E) -> Result<reqwest::Request> {
        let uri = format!("{}{}", self.base_url, E::PATH);
        let url = reqwest::Url::parse(&uri).map_err(|e| Error::InvalidUri {
            uri: uri.clone(),
            message: e.to_string(),
        })?;

        let mut builder = self
            .http
            .request(E::METHOD, url)
            .header(reqwest::header::ACCEPT, "application/json");

        if E::AUTHENTICATED {
            builder = builder.bearer_auth(self.credentials.access_token());
        }

        builder = match E::PLACEMENT {
            Placement::Query => builder.query(params),
            Placement::Form => builder.form(params),
        };

        builder.build().map_err(|e| Error::InvalidUri {
            uri,
            message: e.to_string(),
        })
    }

    /// Perform one round trip and wrap the response in an [`Envelope`].
    ///
    /// Failing before any response arrives is an `Err`; every received
    /// response, whatever its status, becomes an envelope.
    pub async fn execute<E: Endpoint>(&self, params: &E) -> Result<Envelope> {
        let request = self.build_request(params)?;

        // The token exchange body carries the client secret
        let posted_body = if E::AUTHENTICATED {
            request
                .body()
                .and_then(|b| b.as_bytes())
                .map(|b| String::from_utf8_lossy(b).into_owned())
                .unwrap_or_default()
        } else {
            String::new()
        };

        debug!("{} {}{}", E::METHOD, self.base_url, E::PATH);

        let transport = |e: reqwest::Error| Error::Transport {
            path: E::PATH.to_string(),
            source: e,
        };
        let response = self.http.execute(request).await.map_err(transport)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(transport)?;

        let meta = RequestMeta {
            request_type: E::METHOD.to_string(),
            posted_body,
            url: E::PATH.to_string(),
            http_status: status,
        };

        match serde_json::from_str::<Value>(&body) {
            Ok(Value::Object(payload)) => Ok(Envelope::wrap(payload, meta, None)),
            Ok(_) => {
                warn!("{} {} returned JSON that is not an object", E::METHOD, E::PATH);
                Ok(Envelope::undecodable(
                    body,
                    meta,
                    "response is not a JSON object".to_string(),
                ))
            }
            Err(e) => {
                warn!(
                    "{} {} returned a non-JSON body (HTTP {}): {}",
                    E::METHOD,
                    E::PATH,
                    status,
                    e
                );
                Ok(Envelope::undecodable(body, meta, e.to_string()))
            }
        }
    }
}

impl Default for StreamlabsClient {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

/// Shared client type
pub type SharedStreamlabsClient = Arc<StreamlabsClient>;

pub fn create_shared_client(client: StreamlabsClient) -> SharedStreamlabsClient {
    Arc::new(client)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streamlabs::params::{DonationsQuery, PointsQuery, SetPointsBody, TokenRequest};
    use httpmock::prelude::*;
    use serde_json::json;

    fn body_text(request: &reqwest::Request) -> String {
        request
            .body()
            .and_then(|b| b.as_bytes())
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .unwrap_or_default()
    }

    #[test]
    fn test_bearer_header_uses_current_token() {
        let client = StreamlabsClient::new("https://streamlabs.example/api/v2.0");
        client.set_access_token("first");
        let before = client
            .build_request(&PointsQuery {
                username: "alice",
                channel: "chan",
            })
            .unwrap();
        client.set_access_token("second");
        let after = client
            .build_request(&PointsQuery {
                username: "alice",
                channel: "chan",
            })
            .unwrap();

        assert_eq!(
            before.headers().get("authorization").unwrap(),
            "Bearer first"
        );
        assert_eq!(
            after.headers().get("authorization").unwrap(),
            "Bearer second"
        );
    }

    #[test]
    fn test_token_exchange_is_unauthenticated_form() {
        let client = StreamlabsClient::new("https://streamlabs.example/api/v2.0/");
        client.set_access_token("stale");
        let request = client
            .build_request(&TokenRequest::authorization_code(
                "cid",
                "secret",
                "http://bot.local/streamlabsoauth",
                "abc",
            ))
            .unwrap();

        assert_eq!(request.method(), reqwest::Method::POST);
        assert_eq!(
            request.url().as_str(),
            "https://streamlabs.example/api/v2.0/token"
        );
        assert!(request.headers().get("authorization").is_none());
        let body = body_text(&request);
        assert!(body.contains("grant_type=authorization_code"));
        assert!(body.contains("redirect_uri=http%3A%2F%2Fbot.local%2Fstreamlabsoauth"));
        assert!(body.contains("code=abc"));
    }

    #[test]
    fn test_donation_query_string() {
        let client = StreamlabsClient::new("https://streamlabs.example/api/v2.0");

        let request = client
            .build_request(&DonationsQuery::new(5, "USD", 0))
            .unwrap();
        assert_eq!(request.url().query(), Some("limit=5&currency=USD"));
        assert!(request.body().is_none());

        let request = client
            .build_request(&DonationsQuery::new(5, "USD", 42))
            .unwrap();
        assert_eq!(request.url().query(), Some("limit=5&currency=USD&after=42"));
    }

    #[test]
    fn test_invalid_base_url() {
        let client = StreamlabsClient::new("not a url");
        let err = client
            .build_request(&DonationsQuery::new(5, "", 0))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidUri { .. }));
    }

    #[test]
    fn test_pull_settings() {
        let client = StreamlabsClient::default();
        assert_eq!(client.donation_pull_limit(), 5);
        assert_eq!(client.currency_code(), "");
        client.set_donation_pull_limit(25);
        client.set_currency_code("EUR");
        assert_eq!(client.donation_pull_limit(), 25);
        assert_eq!(client.currency_code(), "EUR");
    }

    #[tokio::test]
    async fn test_execute_json_response() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/points")
                    .header("authorization", "Bearer tok")
                    .body_contains("username=alice")
                    .body_contains("points=10");
                then.status(200).json_body(json!({"points": 10}));
            })
            .await;

        let client = StreamlabsClient::new(server.base_url());
        client.set_access_token("tok");
        let envelope = client
            .execute(&SetPointsBody {
                username: "alice",
                points: 10,
            })
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(envelope.success);
        assert_eq!(envelope.request_type, "POST");
        assert_eq!(envelope.url, "/points");
        assert_eq!(envelope.http_status, 200);
        assert!(envelope.posted_body.contains("username=alice"));
        assert_eq!(envelope.get("points"), Some(&json!(10)));
    }

    #[tokio::test]
    async fn test_execute_error_status_with_json_keeps_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/points");
                then.status(401).json_body(json!({"error": "invalid_token"}));
            })
            .await;

        let client = StreamlabsClient::new(server.base_url());
        let envelope = client
            .execute(&PointsQuery {
                username: "bob",
                channel: "chan",
            })
            .await
            .unwrap();

        assert!(envelope.success);
        assert_eq!(envelope.http_status, 401);
        assert!(!envelope.has("points"));
    }

    #[tokio::test]
    async fn test_execute_non_json_response() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/donations");
                then.status(502).body("Bad Gateway");
            })
            .await;

        let client = StreamlabsClient::new(server.base_url());
        let envelope = client
            .execute(&DonationsQuery::new(5, "", 0))
            .await
            .unwrap();

        assert!(!envelope.success);
        assert_eq!(envelope.http_status, 502);
        assert_eq!(envelope.exception_kind.as_deref(), Some("decode"));
        assert_eq!(envelope.get("error"), Some(&json!("Bad Gateway")));
    }

    #[tokio::test]
    async fn test_execute_transport_failure_is_error() {
        let client = StreamlabsClient::new("http://127.0.0.1:1");
        let err = client
            .execute(&DonationsQuery::new(5, "", 0))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Transport { .. }));
        assert_eq!(err.kind(), crate::error::ErrorKind::Transport);
    }
}
