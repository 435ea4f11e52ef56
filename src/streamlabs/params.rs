//! Typed request parameters, one struct per Streamlabs operation

use reqwest::Method;
use serde::Serialize;

/// Where an endpoint's parameters are encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// URL query string
    Query,
    /// `application/x-www-form-urlencoded` body
    Form,
}

/// A Streamlabs API operation and the parameters it sends
pub trait Endpoint: Serialize {
    const METHOD: Method;
    const PATH: &'static str;
    const PLACEMENT: Placement;
    /// Whether the bearer token is attached
    const AUTHENTICATED: bool = true;
}

/// Authorization code exchange (`POST /token`)
#[derive(Debug, Serialize)]
pub struct TokenRequest<'a> {
    pub grant_type: &'static str,
    pub client_id: &'a str,
    pub client_secret: &'a str,
    pub redirect_uri: &'a str,
    pub code: &'a str,
}

impl<'a> TokenRequest<'a> {
    pub fn authorization_code(
        client_id: &'a str,
        client_secret: &'a str,
        redirect_uri: &'a str,
        code: &'a str,
    ) -> Self {
        Self {
            grant_type: "authorization_code",
            client_id,
            client_secret,
            redirect_uri,
            code,
        }
    }
}

impl Endpoint for TokenRequest<'_> {
    const METHOD: Method = Method::POST;
    const PATH: &'static str = "/token";
    const PLACEMENT: Placement = Placement::Form;
    const AUTHENTICATED: bool = false;
}

/// Donation listing (`GET /donations`)
#[derive(Debug, Serialize)]
pub struct DonationsQuery<'a> {
    pub limit: u32,
    pub currency: &'a str,
    /// Only donations newer than this id; omitted to start from the beginning
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<i64>,
}

impl<'a> DonationsQuery<'a> {
    pub fn new(limit: u32, currency: &'a str, last_id: i64) -> Self {
        Self {
            limit,
            currency,
            after: (last_id > 0).then_some(last_id),
        }
    }
}

impl Endpoint for DonationsQuery<'_> {
    const METHOD: Method = Method::GET;
    const PATH: &'static str = "/donations";
    const PLACEMENT: Placement = Placement::Query;
}

/// Points lookup (`GET /points`)
#[derive(Debug, Serialize)]
pub struct PointsQuery<'a> {
    pub username: &'a str,
    pub channel: &'a str,
}

impl Endpoint for PointsQuery<'_> {
    const METHOD: Method = Method::GET;
    const PATH: &'static str = "/points";
    const PLACEMENT: Placement = Placement::Query;
}

/// Points assignment (`POST /points`)
#[derive(Debug, Serialize)]
pub struct SetPointsBody<'a> {
    pub username: &'a str,
    pub points: i64,
}

impl Endpoint for SetPointsBody<'_> {
    const METHOD: Method = Method::POST;
    const PATH: &'static str = "/points";
    const PLACEMENT: Placement = Placement::Form;
}

/// Bulk points grant to every active viewer (`POST /points/add_to_all`)
#[derive(Debug, Serialize)]
pub struct AddToAllPointsBody<'a> {
    pub channel: &'a str,
    pub value: i64,
}

impl Endpoint for AddToAllPointsBody<'_> {
    const METHOD: Method = Method::POST;
    const PATH: &'static str = "/points/add_to_all";
    const PLACEMENT: Placement = Placement::Form;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_donations_cursor() {
        let first = DonationsQuery::new(5, "USD", 0);
        assert_eq!(first.after, None);
        let json = serde_json::to_value(&first).unwrap();
        assert!(json.get("after").is_none());

        let next = DonationsQuery::new(5, "USD", 42);
        assert_eq!(next.after, Some(42));

        let negative = DonationsQuery::new(5, "USD", -3);
        assert_eq!(negative.after, None);
    }

    #[test]
    fn test_endpoint_declarations() {
        assert_eq!(TokenRequest::PATH, "/token");
        assert!(!TokenRequest::AUTHENTICATED);
        assert_eq!(TokenRequest::PLACEMENT, Placement::Form);

        assert_eq!(PointsQuery::METHOD, Method::GET);
        assert_eq!(PointsQuery::PLACEMENT, Placement::Query);
        assert!(PointsQuery::AUTHENTICATED);

        assert_eq!(SetPointsBody::METHOD, Method::POST);
        assert_eq!(AddToAllPointsBody::PATH, "/points/add_to_all");
    }
}
