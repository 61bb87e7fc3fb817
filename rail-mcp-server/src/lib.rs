//! Rail travel MCP server library
//!
//! Exposes an upstream timetable GraphQL API as MCP tools:
//! - get_places: look up stations by name
//! - get_trips: find connections between two named stations
//! - get_trip_prices: price trips returned by get_trips
//! - book_ticket: reserve a ticket (stub, no upstream call)

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod jsonrpc;
pub mod orchestrator;
pub mod tools;

pub use client::{RailClient, TripPriceRequest, TripQuery};
pub use config::{Config, Language, Mode};
pub use error::{ErrorKind, ErrorPayload, RailError};
pub use orchestrator::{find_trips, TimetableApi};
pub use tools::{RailMcp, ToolError};
