//! HTTP client for the upstream timetable GraphQL API.
//!
//! Each public operation sends one POST and maps the reply onto
//! [`rail_core`] entities. All failures come back as [`RailError`].

use std::time::Duration;

use chrono::{NaiveDate, NaiveTime};
use rail_core::queries::{self, Operation};
use rail_core::{decode_list, Node, Place, Trip, TripPage};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::{Config, Language};
use crate::error::RailError;

/// Parameters of a trip search between two resolved places.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripQuery {
    pub origin_id: String,
    pub destination_id: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub language: Language,
}

/// A trip to price, identified by the id returned from a trip search.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TripPriceRequest {
    /// Trip id from get_trips
    pub id: String,
    /// Origin place id
    pub origin: String,
    /// Destination place id
    pub destination: String,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphqlErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct GraphqlErrorEntry {
    #[serde(default)]
    message: String,
}

/// Client for the upstream GraphQL endpoint.
#[derive(Debug, Clone)]
pub struct RailClient {
    http: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl RailClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            timeout,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.graphql_url.clone(), config.timeout)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Finds stop places whose name matches `name`, best match first.
    pub async fn search_places(&self, name: &str, language: Language) -> Result<Vec<Place>, RailError> {
        tracing::info!("→ Searching places matching {:?}", name);

        let places = self
            .execute(queries::GET_PLACES, place_variables(name, language), "places")
            .await?;
        let places: Vec<Place> = decode_list(&places, "data.places")?;

        tracing::info!("✓ {} place(s) found for {:?}", places.len(), name);
        Ok(places)
    }

    /// First page of trips for `query`.
    pub async fn search_trips(&self, query: &TripQuery) -> Result<Vec<Trip>, RailError> {
        Ok(self.search_trips_page(query, None).await?.trips)
    }

    /// One page of trips; pass a cursor from a previous page to move forward or back.
    pub async fn search_trips_page(
        &self,
        query: &TripQuery,
        paging_cursor: Option<&str>,
    ) -> Result<TripPage, RailError> {
        tracing::info!(
            "→ Searching trips {} → {} departing {} {}",
            query.origin_id,
            query.destination_id,
            query.date,
            query.time.format("%H:%M")
        );

        let trips = self
            .execute(queries::GET_TRIPS, trip_variables(query, paging_cursor), "trips")
            .await?;
        let page: TripPage = Node::root(&trips, "data.trips").decode()?;

        tracing::info!("✓ {} trip(s) found", page.trips.len());
        Ok(page)
    }

    /// Fetches prices for the given trips. The priced payload is passed through as-is.
    pub async fn fetch_trip_prices(&self, trips: &[TripPriceRequest]) -> Result<Value, RailError> {
        if trips.is_empty() {
            return Err(RailError::InvalidArguments(
                "at least one trip is required".to_string(),
            ));
        }
        let process_id = uuid::Uuid::new_v4().to_string();
        tracing::info!("→ Fetching prices for {} trip(s), process {}", trips.len(), process_id);

        let prices = self
            .execute(queries::GET_TRIP_PRICES, price_variables(trips, &process_id), "tripPrices")
            .await?;

        tracing::info!("✓ Prices received");
        Ok(prices)
    }

    /// Sends one GraphQL operation and returns `data.<root>`.
    async fn execute(&self, op: Operation, variables: Value, root: &str) -> Result<Value, RailError> {
        let body = json!({
            "operationName": op.name,
            "query": op.document,
            "variables": variables,
        });
        tracing::debug!("POST {} operation={}", self.endpoint, op.name);

        let exchange = async {
            let response = self
                .http
                .post(&self.endpoint)
                .json(&body)
                .send()
                .await
                .map_err(|e| RailError::Transport(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                return Err(RailError::Transport(format!("upstream returned HTTP {status}")));
            }

            response
                .json::<Envelope>()
                .await
                .map_err(|e| RailError::Transport(format!("unreadable GraphQL response: {e}")))
        };

        let envelope = match tokio::time::timeout(self.timeout, exchange).await {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!("✗ {} timed out after {:?}", op.name, self.timeout);
                return Err(RailError::Timeout(self.timeout));
            }
        };

        extract_root(envelope, root).inspect_err(|e| tracing::warn!("✗ {} failed: {}", op.name, e))
    }
}

fn extract_root(envelope: Envelope, root: &str) -> Result<Value, RailError> {
    let Envelope { data, errors } = envelope;
    let value = data
        .and_then(|mut data| data.get_mut(root).map(Value::take))
        .filter(|value| !value.is_null());

    match value {
        Some(value) => {
            if !errors.is_empty() {
                tracing::warn!("⚠ Upstream returned partial data with {} error(s)", errors.len());
            }
            Ok(value)
        }
        None if !errors.is_empty() => Err(RailError::Graphql(
            errors
                .into_iter()
                .map(|e| e.message)
                .collect::<Vec<_>>()
                .join("; "),
        )),
        None => Err(rail_core::ValidationError::MissingField {
            entity: "response",
            path: format!("data.{root}"),
        }
        .into()),
    }
}

pub fn place_variables(name: &str, language: Language) -> Value {
    json!({
        "input": {"type": "NAME", "value": name},
        "language": language,
    })
}

pub fn trip_variables(query: &TripQuery, paging_cursor: Option<&str>) -> Value {
    json!({
        "input": {
            "places": [
                {"type": "ID", "value": query.origin_id},
                {"type": "ID", "value": query.destination_id},
            ],
            "time": {
                "date": query.date.format("%Y-%m-%d").to_string(),
                "time": query.time.format("%H:%M").to_string(),
                "type": "DEPARTURE",
            },
            "includeEconomic": false,
            "directConnection": false,
            "includeAccessibility": "NONE",
            "includeNoticeAttributes": [],
            "includeTransportModes": queries::TRANSPORT_MODES,
            "includeUnsharp": false,
            "occupancy": "ALL",
            "walkSpeed": 100,
        },
        "pagingCursor": paging_cursor,
        "language": query.language,
    })
}

pub fn price_variables(trips: &[TripPriceRequest], process_id: &str) -> Value {
    let trips: Vec<Value> = trips
        .iter()
        .map(|trip| {
            json!({
                "id": trip.id,
                "fromPlace": trip.origin,
                "toPlace": trip.destination,
            })
        })
        .collect();

    json!({
        "input": {
            "travelClass": "ANY_CLASS",
            "trips": trips,
            "processId": process_id,
            "passengers": [{"reductions": ["HALF_FARE"]}],
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query() -> TripQuery {
        TripQuery {
            origin_id: "8503000".to_string(),
            destination_id: "8507000".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
            time: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
            language: Language::En,
        }
    }

    #[test]
    fn test_place_variables() {
        assert_eq!(
            place_variables("Zürich HB", Language::De),
            json!({"input": {"type": "NAME", "value": "Zürich HB"}, "language": "DE"})
        );
    }

    #[test]
    fn test_trip_variables_first_page() {
        let vars = trip_variables(&query(), None);
        assert_eq!(vars["pagingCursor"], Value::Null);
        assert_eq!(vars["language"], "EN");
        let input = &vars["input"];
        assert_eq!(
            input["places"],
            json!([{"type": "ID", "value": "8503000"}, {"type": "ID", "value": "8507000"}])
        );
        assert_eq!(input["time"], json!({"date": "2025-05-01", "time": "12:00", "type": "DEPARTURE"}));
        assert_eq!(input["occupancy"], "ALL");
        assert_eq!(input["includeAccessibility"], "NONE");
        assert_eq!(input["walkSpeed"], 100);
        assert_eq!(input["includeTransportModes"].as_array().unwrap().len(), queries::TRANSPORT_MODES.len());
    }

    #[test]
    fn test_trip_variables_thread_cursor() {
        let vars = trip_variables(&query(), Some("next-page"));
        assert_eq!(vars["pagingCursor"], "next-page");
    }

    #[test]
    fn test_price_variables() {
        let trips = [TripPriceRequest {
            id: "HC_1".to_string(),
            origin: "8503000".to_string(),
            destination: "8507000".to_string(),
        }];
        assert_eq!(
            price_variables(&trips, "p-1"),
            json!({"input": {
                "travelClass": "ANY_CLASS",
                "trips": [{"id": "HC_1", "fromPlace": "8503000", "toPlace": "8507000"}],
                "processId": "p-1",
                "passengers": [{"reductions": ["HALF_FARE"]}]
            }})
        );
    }

    #[test]
    fn test_graphql_errors_without_data() {
        let envelope = Envelope {
            data: None,
            errors: vec![
                GraphqlErrorEntry { message: "bad input".to_string() },
                GraphqlErrorEntry { message: "try again".to_string() },
            ],
        };
        assert_eq!(
            extract_root(envelope, "places"),
            Err(RailError::Graphql("bad input; try again".to_string()))
        );
    }

    #[test]
    fn test_null_root_with_errors_is_a_graphql_error() {
        let envelope = Envelope {
            data: Some(json!({"trips": null})),
            errors: vec![GraphqlErrorEntry { message: "no service".to_string() }],
        };
        assert!(matches!(extract_root(envelope, "trips"), Err(RailError::Graphql(_))));
    }

    #[test]
    fn test_missing_root_without_errors_is_a_validation_error() {
        let envelope = Envelope {
            data: Some(json!({})),
            errors: vec![],
        };
        let err = extract_root(envelope, "places").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::ValidationError);
        assert!(err.to_string().contains("data.places"));
    }

    #[test]
    fn test_partial_data_is_used() {
        let envelope = Envelope {
            data: Some(json!({"places": []})),
            errors: vec![GraphqlErrorEntry { message: "minor".to_string() }],
        };
        assert_eq!(extract_root(envelope, "places"), Ok(json!([])));
    }
}
