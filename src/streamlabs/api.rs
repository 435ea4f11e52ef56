//! Donation and loyalty points operations

use serde_json::Value;

use super::client::StreamlabsClient;
use super::envelope::Envelope;
use super::params::{AddToAllPointsBody, DonationsQuery, PointsQuery, SetPointsBody};
use crate::error::{Error, Result};

/// Returned when a points balance could not be determined
pub const POINTS_UNKNOWN: i64 = -1;

impl StreamlabsClient {
    /// Pull donations newer than `last_id` (0 starts from the beginning)
    pub async fn get_donations(&self, last_id: i64) -> Result<Envelope> {
        let currency = self.currency_code();
        let query = DonationsQuery::new(self.donation_pull_limit(), &currency, last_id);
        self.execute(&query).await
    }

    pub async fn get_points_raw(&self, username: &str, channel: &str) -> Result<Envelope> {
        self.execute(&PointsQuery { username, channel }).await
    }

    /// A user's points, or [`POINTS_UNKNOWN`] when the response has none
    pub async fn get_points(&self, username: &str, channel: &str) -> Result<i64> {
        let envelope = self.get_points_raw(username, channel).await?;
        points_field(&envelope)
    }

    pub async fn set_points_raw(&self, username: &str, points: i64) -> Result<Envelope> {
        self.execute(&SetPointsBody { username, points }).await
    }

    /// Set a user's points, returning the new balance or [`POINTS_UNKNOWN`]
    pub async fn set_points(&self, username: &str, points: i64) -> Result<i64> {
        let envelope = self.set_points_raw(username, points).await?;
        points_field(&envelope)
    }

    pub async fn add_to_all_points_raw(&self, channel: &str, value: i64) -> Result<Envelope> {
        self.execute(&AddToAllPointsBody { channel, value }).await
    }

    /// Add `value` points to every active viewer of `channel`
    pub async fn add_to_all_points(&self, channel: &str, value: i64) -> Result<bool> {
        let envelope = self.add_to_all_points_raw(channel, value).await?;
        Ok(envelope
            .get("message")
            .and_then(Value::as_str)
            .is_some_and(|message| message.eq_ignore_ascii_case("success")))
    }
}

/// Read `points`; absent means unknown, anything non-integer is a decode error
fn points_field(envelope: &Envelope) -> Result<i64> {
    let Some(value) = envelope.get("points") else {
        return Ok(POINTS_UNKNOWN);
    };

    value
        .as_i64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
        .ok_or_else(|| Error::Decode {
            path: envelope.url.clone(),
            field: "points".to_string(),
            value: value.to_string(),
        })
}
