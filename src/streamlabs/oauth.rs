//! OAuth2 authorization code handshake with Streamlabs

use serde_json::Value;
use tracing::{info, warn};

use super::client::SharedStreamlabsClient;
use super::params::TokenRequest;
use crate::config::{SharedPropertyStore, ACCESS_TOKEN_KEY, CLIENT_ID_KEY, CLIENT_SECRET_KEY};
use crate::error::{Error, Result};

/// Path Streamlabs redirects back to
pub const OAUTH_CALLBACK_PATH: &str = "/streamlabsoauth";

/// Scope requested during authorization
pub const OAUTH_SCOPE: &str = "donations.read";

/// Scheme and host the endpoint is reached at, derived from the `Host` header.
///
/// Without a `Host` header this is empty, leaving later URLs host-relative.
pub fn external_origin(host: Option<&str>, secure: bool) -> String {
    match host {
        Some(host) if secure => format!("https://{}", host),
        Some(host) => format!("http://{}", host),
        None => String::new(),
    }
}

/// Drives the two steps of the handshake: building the authorize URL and
/// exchanging the returned code for an access token.
#[derive(Clone)]
pub struct OAuthCoordinator {
    client: SharedStreamlabsClient,
    properties: SharedPropertyStore,
    /// Whether the callback endpoint is served over TLS
    secure: bool,
}

impl OAuthCoordinator {
    pub fn new(
        client: SharedStreamlabsClient,
        properties: SharedPropertyStore,
        secure: bool,
    ) -> Self {
        Self {
            client,
            properties,
            secure,
        }
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }

    pub fn client(&self) -> &SharedStreamlabsClient {
        &self.client
    }

    /// Redirect URI registered for this endpoint
    pub fn redirect_uri(&self, host: Option<&str>) -> String {
        format!(
            "{}{}",
            external_origin(host, self.secure),
            OAUTH_CALLBACK_PATH
        )
    }

    /// Step 1: URL the operator is sent to for granting access
    pub async fn authorize_uri(&self, host: Option<&str>) -> String {
        let client_id = self.properties.get_property(CLIENT_ID_KEY, "").await;

        format!(
            "{}/authorize\
            ?client_id={}\
            &redirect_uri={}\
            &response_type=code\
            &scope={}",
            self.client.base_url(),
            urlencoding::encode(&client_id),
            urlencoding::encode(&self.redirect_uri(host)),
            urlencoding::encode(OAUTH_SCOPE)
        )
    }

    /// Step 2: exchange an authorization code for an access token.
    ///
    /// Returns `Ok(false)` when Streamlabs answers without an `access_token`.
    /// The token is committed to the property store before it replaces the
    /// in-memory credential; on any failure both are left untouched.
    pub async fn request_access_token(&self, host: Option<&str>, code: &str) -> Result<bool> {
        let client_id = self.properties.get_property(CLIENT_ID_KEY, "").await;
        let client_secret = self.properties.get_property(CLIENT_SECRET_KEY, "").await;
        let redirect_uri = self.redirect_uri(host);

        let request =
            TokenRequest::authorization_code(&client_id, &client_secret, &redirect_uri, code);
        let envelope = self.client.execute(&request).await?;

        let access_token = match envelope.get("access_token") {
            Some(Value::String(token)) => token.clone(),
            Some(other) => {
                return Err(Error::Decode {
                    path: envelope.url.clone(),
                    field: "access_token".to_string(),
                    value: other.to_string(),
                })
            }
            None => {
                warn!(
                    "Token exchange returned no access_token (HTTP {})",
                    envelope.http_status
                );
                return Ok(false);
            }
        };

        let mut transaction = self.properties.start_transaction();
        transaction.set_property(ACCESS_TOKEN_KEY, access_token.as_str());
        transaction.commit().await?;

        self.client.set_access_token(access_token);
        info!("Streamlabs access token updated");

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{create_shared_property_store, PropertyStore};
    use crate::streamlabs::client::{create_shared_client, StreamlabsClient};
    use httpmock::prelude::*;
    use serde_json::json;

    async fn coordinator(base_url: &str, secure: bool) -> OAuthCoordinator {
        let properties = create_shared_property_store(PropertyStore::in_memory());
        let mut tx = properties.start_transaction();
        tx.set_property(CLIENT_ID_KEY, "client-1")
            .set_property(CLIENT_SECRET_KEY, "shh");
        tx.commit().await.unwrap();

        let client = create_shared_client(StreamlabsClient::new(base_url));
        OAuthCoordinator::new(client, properties, secure)
    }

    #[test]
    fn test_external_origin() {
        assert_eq!(
            external_origin(Some("bot.local:25000"), false),
            "http://bot.local:25000"
        );
        assert_eq!(external_origin(Some("bot.example"), true), "https://bot.example");
        assert_eq!(external_origin(None, true), "");
    }

    #[tokio::test]
    async fn test_authorize_uri() {
        let oauth = coordinator("https://streamlabs.com/api/v2.0", true).await;
        let uri = oauth.authorize_uri(Some("bot.example")).await;

        assert_eq!(
            uri,
            "https://streamlabs.com/api/v2.0/authorize\
            ?client_id=client-1\
            &redirect_uri=https%3A%2F%2Fbot.example%2Fstreamlabsoauth\
            &response_type=code\
            &scope=donations.read"
        );
    }

    #[tokio::test]
    async fn test_authorize_uri_without_host() {
        let oauth = coordinator("https://streamlabs.com/api/v2.0", false).await;
        let uri = oauth.authorize_uri(None).await;
        assert!(uri.contains("&redirect_uri=%2Fstreamlabsoauth&"));
    }

    #[tokio::test]
    async fn test_successful_exchange_stores_token() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/token")
                    .body_contains("grant_type=authorization_code")
                    .body_contains("client_id=client-1")
                    .body_contains("client_secret=shh")
                    .body_contains("code=the-code")
                    .body_contains("redirect_uri=http%3A%2F%2Fbot.local%2Fstreamlabsoauth");
                then.status(200).json_body(json!({
                    "access_token": "fresh-token",
                    "token_type": "Bearer"
                }));
            })
            .await;

        let oauth = coordinator(&server.base_url(), false).await;
        let revision = oauth.properties.revision().await;

        let ok = oauth
            .request_access_token(Some("bot.local"), "the-code")
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(ok);
        assert_eq!(oauth.client().credentials().access_token(), "fresh-token");
        assert_eq!(
            oauth.properties.get_property(ACCESS_TOKEN_KEY, "").await,
            "fresh-token"
        );
        assert_eq!(oauth.properties.revision().await, revision + 1);
    }

    #[tokio::test]
    async fn test_rejected_exchange_leaves_token_unchanged() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/token");
                then.status(400).json_body(json!({
                    "error": "invalid_grant",
                    "message": "The authorization code is invalid"
                }));
            })
            .await;

        let oauth = coordinator(&server.base_url(), false).await;
        oauth.client().set_access_token("old-token");
        let revision = oauth.properties.revision().await;

        let ok = oauth
            .request_access_token(Some("bot.local"), "bad-code")
            .await
            .unwrap();

        assert!(!ok);
        assert_eq!(oauth.client().credentials().access_token(), "old-token");
        assert!(!oauth.properties.has_property(ACCESS_TOKEN_KEY).await);
        assert_eq!(oauth.properties.revision().await, revision);
    }

    #[tokio::test]
    async fn test_empty_token_field_counts_as_present() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/token");
                then.status(200).json_body(json!({"access_token": ""}));
            })
            .await;

        let oauth = coordinator(&server.base_url(), false).await;
        oauth.client().set_access_token("old-token");

        let ok = oauth
            .request_access_token(Some("bot.local"), "code")
            .await
            .unwrap();

        assert!(ok);
        assert_eq!(oauth.client().credentials().access_token(), "");
        assert!(oauth.properties.has_property(ACCESS_TOKEN_KEY).await);
        assert_eq!(oauth.properties.revision().await, 2);
    }

    #[tokio::test]
    async fn test_malformed_token_is_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/token");
                then.status(200).json_body(json!({"access_token": 12345}));
            })
            .await;

        let oauth = coordinator(&server.base_url(), false).await;
        let err = oauth
            .request_access_token(Some("bot.local"), "code")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Decode { .. }));
        assert!(!oauth.client().credentials().has_access_token());
    }
}
