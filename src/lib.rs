//! Streamlabs donation and loyalty points integration
//!
//! Performs the three-legged OAuth2 handshake for an operator, keeps the
//! resulting access token, and exposes the authenticated donation and points
//! operations of the Streamlabs API.

pub mod config;
pub mod datastore;
pub mod error;
pub mod streamlabs;
pub mod web;

pub use error::{Error, ErrorKind, Result};
