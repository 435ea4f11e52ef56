//! Streamlabs API integration
//!
//! OAuth2 handshake, authenticated request execution and the donation/points
//! operations built on top of it.

mod api;
pub mod client;
pub mod envelope;
pub mod oauth;
pub mod params;

pub use api::POINTS_UNKNOWN;
pub use client::{create_shared_client, Credentials, SharedStreamlabsClient, StreamlabsClient};
pub use envelope::{Envelope, RequestMeta};
pub use oauth::{external_origin, OAuthCoordinator, OAUTH_CALLBACK_PATH};
