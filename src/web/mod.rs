//! Web endpoint for the Streamlabs OAuth callback
//!
//! Streamlabs redirects the operator back here after authorization; the
//! handler completes the handshake and forwards to the web panel.

mod auth;
mod callback;
mod server;

pub use auth::{basic_credentials, require_panel_login};
pub use callback::{oauth_callback, PANEL_CHECK_LOGIN_PATH, PANEL_HOME_PATH};
pub use server::{build_router, start_web_server, AppState};
