//! The tools this server exposes, independent of the transport that carries them.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use rail_core::booking;
use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::client::{RailClient, TripPriceRequest};
use crate::config::Language;
use crate::error::RailError;
use crate::orchestrator::find_trips;

/// get_places arguments
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct GetPlacesParams {
    /// Station or stop name to look up, e.g. "Zürich HB"
    pub name: String,
    /// Response language (defaults to the server setting)
    #[serde(default)]
    pub language: Option<Language>,
}

/// get_trips arguments
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct GetTripsParams {
    /// Origin station name, e.g. "Zürich HB"
    pub origin: String,
    /// Destination station name, e.g. "Bern"
    pub destination: String,
    /// Departure date as YYYY-MM-DD
    pub departure_date: String,
    /// Departure time as HH:MM
    pub departure_time: String,
    #[serde(default)]
    pub language: Option<Language>,
}

/// get_trip_prices arguments
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct GetTripPricesParams {
    /// Trips returned by get_trips, with the place ids they run between
    pub trips: Vec<TripPriceRequest>,
}

/// book_ticket arguments
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct BookTicketParams {
    /// Trip id from get_trips
    pub trip_id: String,
    pub passenger_name: String,
    pub passenger_email: String,
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Reported to the caller as a structured tool result.
    #[error(transparent)]
    Rail(#[from] RailError),

    #[error("failed to encode tool result: {0}")]
    Encode(#[from] serde_json::Error),
}

struct ToolSpec {
    name: &'static str,
    description: &'static str,
    schema: fn() -> Value,
}

fn schema<T: JsonSchema>() -> Value {
    serde_json::to_value(schema_for!(T)).unwrap_or_else(|_| json!({"type": "object"}))
}

const TOOLS: &[ToolSpec] = &[
    ToolSpec {
        name: "get_places",
        description: "Look up stations and stops by name. Returns candidates best match first, with their place ids.",
        schema: schema::<GetPlacesParams>,
    },
    ToolSpec {
        name: "get_trips",
        description: "Find train connections between two stations for a departure date and time.",
        schema: schema::<GetTripsParams>,
    },
    ToolSpec {
        name: "get_trip_prices",
        description: "Get ticket prices (half-fare, any class) for trips found with get_trips.",
        schema: schema::<GetTripPricesParams>,
    },
    ToolSpec {
        name: "book_ticket",
        description: "Reserve a ticket for a trip. Reservation only; no payment is taken.",
        schema: schema::<BookTicketParams>,
    },
];

/// Rail tool server - holds the upstream client shared by all calls
#[derive(Debug, Clone)]
pub struct RailMcp {
    client: Arc<RailClient>,
    language: Language,
}

impl RailMcp {
    pub fn new(client: RailClient, language: Language) -> Self {
        Self {
            client: Arc::new(client),
            language,
        }
    }

    /// List all available tools
    pub fn list_tools(&self) -> Value {
        let tools: Vec<Value> = TOOLS
            .iter()
            .map(|tool| {
                json!({
                    "name": tool.name,
                    "description": tool.description,
                    "inputSchema": (tool.schema)(),
                })
            })
            .collect();
        json!({ "tools": tools })
    }

    /// Call a tool and return its result
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value, ToolError> {
        // arguments may carry passenger details
        tracing::debug!("tool call {}", name);
        match name {
            "get_places" => {
                let params: GetPlacesParams = parse_args(arguments)?;
                let language = params.language.unwrap_or(self.language);
                let places = self.client.search_places(&params.name, language).await?;
                Ok(serde_json::to_value(places)?)
            }

            "get_trips" => {
                let params: GetTripsParams = parse_args(arguments)?;
                let date = NaiveDate::parse_from_str(&params.departure_date, "%Y-%m-%d").map_err(|e| {
                    RailError::InvalidArguments(format!(
                        "departure_date {:?} is not YYYY-MM-DD: {}",
                        params.departure_date, e
                    ))
                })?;
                let time = NaiveTime::parse_from_str(&params.departure_time, "%H:%M").map_err(|e| {
                    RailError::InvalidArguments(format!(
                        "departure_time {:?} is not HH:MM: {}",
                        params.departure_time, e
                    ))
                })?;
                let language = params.language.unwrap_or(self.language);

                let trips = find_trips(
                    self.client.as_ref(),
                    &params.origin,
                    &params.destination,
                    date,
                    time,
                    language,
                )
                .await?;
                Ok(serde_json::to_value(trips)?)
            }

            "get_trip_prices" => {
                let params: GetTripPricesParams = parse_args(arguments)?;
                Ok(self.client.fetch_trip_prices(&params.trips).await?)
            }

            "book_ticket" => {
                let params: BookTicketParams = parse_args(arguments)?;
                let booking = booking::handle(booking::Request {
                    trip_id: params.trip_id,
                    passenger_name: params.passenger_name,
                    passenger_email: params.passenger_email,
                })
                .map_err(RailError::from)?;
                tracing::info!("✓ Ticket reserved: {}", booking.booking_id);
                Ok(serde_json::to_value(booking)?)
            }

            _ => Err(ToolError::UnknownTool(name.to_string())),
        }
    }
}

fn parse_args<T: DeserializeOwned>(arguments: Value) -> Result<T, RailError> {
    serde_json::from_value(arguments).map_err(|e| RailError::InvalidArguments(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::time::Duration;

    fn server() -> RailMcp {
        // nothing listens here; tests below must not reach the network
        RailMcp::new(
            RailClient::new("http://127.0.0.1:9/graphql", Duration::from_millis(200)),
            Language::En,
        )
    }

    #[test]
    fn test_every_tool_has_an_object_schema() {
        let listed = server().list_tools();
        let tools = listed["tools"].as_array().unwrap();
        let names: Vec<&str> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();
        assert_eq!(names, ["get_places", "get_trips", "get_trip_prices", "book_ticket"]);
        for tool in tools {
            assert_eq!(tool["inputSchema"]["type"], "object", "{}", tool["name"]);
        }
        let required = &tools[1]["inputSchema"]["required"];
        assert!(required.as_array().unwrap().contains(&json!("departure_date")));
    }

    #[tokio::test]
    async fn test_book_ticket() {
        let result = server()
            .call_tool(
                "book_ticket",
                json!({"trip_id": "HC_1", "passenger_name": "Anna", "passenger_email": "anna@example.ch"}),
            )
            .await
            .unwrap();
        assert_eq!(result["status"], "reserved");
        assert_eq!(result["trip_id"], "HC_1");
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_passenger_details_stay_out_of_logs() {
        let logs = CapturedLogs::default();
        let sink = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(move || sink.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        server()
            .call_tool(
                "book_ticket",
                json!({"trip_id": "HC_1", "passenger_name": "Anna", "passenger_email": "anna@example.ch"}),
            )
            .await
            .unwrap();

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("tool call book_ticket"), "{output}");
        assert!(!output.contains("anna@example.ch"), "{output}");
    }

    #[tokio::test]
    async fn test_bad_date_is_rejected_before_any_request() {
        let err = server()
            .call_tool(
                "get_trips",
                json!({"origin": "Zürich HB", "destination": "Bern",
                       "departure_date": "01.05.2025", "departure_time": "12:00"}),
            )
            .await
            .unwrap_err();
        match err {
            ToolError::Rail(e) => {
                assert_eq!(e.kind(), ErrorKind::ValidationError);
                assert!(e.to_string().contains("departure_date"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_missing_argument_is_a_validation_error() {
        let err = server().call_tool("get_places", json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::Rail(RailError::InvalidArguments(_))));
    }

    #[tokio::test]
    async fn test_empty_price_request_is_rejected() {
        let err = server()
            .call_tool("get_trip_prices", json!({"trips": []}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Rail(RailError::InvalidArguments(_))));
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let err = server().call_tool("buy_bmi", json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::UnknownTool(name) if name == "buy_bmi"));
    }
}
