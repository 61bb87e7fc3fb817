//! Typed trip and place records decoded from upstream GraphQL payloads.
//!
//! Every entity declares the upstream key for each of its fields in
//! `FIELD_NAMES`; fields not listed there use the same name on both sides.
//! Keys the entity does not ask for (`__typename`, fields belonging to other
//! leg kinds, ...) are ignored.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ValidationError;

/// A cursor into an upstream JSON document that remembers where it is.
#[derive(Debug, Clone)]
pub struct Node<'a> {
    value: &'a Value,
    path: String,
    entity: &'static str,
    fields: &'static [(&'static str, &'static str)],
}

impl<'a> Node<'a> {
    /// Wraps `value`, reporting errors relative to `path` ("" for the document root).
    pub fn root(value: &'a Value, path: impl Into<String>) -> Self {
        Self {
            value,
            path: path.into(),
            entity: "value",
            fields: &[],
        }
    }

    fn entity<T: FromUpstream>(&self) -> Self {
        Self {
            value: self.value,
            path: self.path.clone(),
            entity: T::ENTITY,
            fields: T::FIELD_NAMES,
        }
    }

    fn child(&self, value: &'a Value, path: String) -> Self {
        Self {
            value,
            path,
            entity: self.entity,
            fields: self.fields,
        }
    }

    fn child_path(&self, key: &str) -> String {
        if self.path.is_empty() {
            key.to_string()
        } else {
            format!("{}.{}", self.path, key)
        }
    }

    fn upstream_key<'k>(&self, field: &'k str) -> &'k str {
        self.fields
            .iter()
            .find(|(internal, _)| *internal == field)
            .map(|(_, upstream)| *upstream)
            .unwrap_or(field)
    }

    pub fn invalid(&self, reason: impl Into<String>) -> ValidationError {
        ValidationError::InvalidField {
            entity: self.entity,
            path: self.path.clone(),
            reason: reason.into(),
        }
    }

    fn object(&self) -> Result<&'a Map<String, Value>, ValidationError> {
        self.value
            .as_object()
            .ok_or_else(|| self.invalid("expected an object"))
    }

    /// Looks up a required field by its internal name. `null` counts as missing.
    pub fn field(&self, name: &str) -> Result<Node<'a>, ValidationError> {
        let key = self.upstream_key(name);
        match self.object()?.get(key) {
            None | Some(Value::Null) => Err(ValidationError::MissingField {
                entity: self.entity,
                path: self.child_path(key),
            }),
            Some(value) => Ok(self.child(value, self.child_path(key))),
        }
    }

    /// Looks up an optional field by its internal name.
    pub fn optional(&self, name: &str) -> Result<Option<Node<'a>>, ValidationError> {
        let key = self.upstream_key(name);
        Ok(match self.object()?.get(key) {
            None | Some(Value::Null) => None,
            Some(value) => Some(self.child(value, self.child_path(key))),
        })
    }

    pub fn string(&self) -> Result<String, ValidationError> {
        match self.value {
            Value::String(s) => Ok(s.clone()),
            // ids occasionally arrive as bare numbers
            Value::Number(n) => Ok(n.to_string()),
            _ => Err(self.invalid("expected a string")),
        }
    }

    pub fn non_empty_string(&self) -> Result<String, ValidationError> {
        let s = self.string()?;
        if s.trim().is_empty() {
            return Err(self.invalid("must not be empty"));
        }
        Ok(s)
    }

    pub fn integer(&self) -> Result<i64, ValidationError> {
        self.value
            .as_i64()
            .ok_or_else(|| self.invalid("expected an integer"))
    }

    pub fn timestamp(&self) -> Result<DateTime<FixedOffset>, ValidationError> {
        let raw = self
            .value
            .as_str()
            .ok_or_else(|| self.invalid("expected an ISO-8601 timestamp string"))?;
        DateTime::parse_from_rfc3339(raw)
            .map_err(|e| self.invalid(format!("malformed timestamp {raw:?}: {e}")))
    }

    pub fn items(&self) -> Result<Vec<Node<'a>>, ValidationError> {
        let items = self
            .value
            .as_array()
            .ok_or_else(|| self.invalid("expected a list"))?;
        Ok(items
            .iter()
            .enumerate()
            .map(|(i, value)| self.child(value, format!("{}[{}]", self.path, i)))
            .collect())
    }

    pub fn decode<T: FromUpstream>(&self) -> Result<T, ValidationError> {
        T::from_node(&self.entity::<T>())
    }

    fn optional_string(&self, name: &str) -> Result<Option<String>, ValidationError> {
        self.optional(name)?.map(|n| n.string()).transpose()
    }
}

/// Construction of a domain entity from its upstream JSON shape.
pub trait FromUpstream: Sized {
    const ENTITY: &'static str;

    /// `(internal, upstream)` key pairs for fields whose names differ.
    const FIELD_NAMES: &'static [(&'static str, &'static str)] = &[];

    fn from_node(node: &Node<'_>) -> Result<Self, ValidationError>;

    fn from_upstream(value: &Value) -> Result<Self, ValidationError> {
        Node::root(value, "").decode()
    }
}

/// Decodes a list of entities found at `path` in the enclosing document.
pub fn decode_list<T: FromUpstream>(value: &Value, path: &str) -> Result<Vec<T>, ValidationError> {
    Node::root(value, path)
        .entity::<T>()
        .items()?
        .iter()
        .map(Node::decode)
        .collect()
}

/// A stop place (station, stop, address) known to the upstream network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Place {
    /// The stop place id (e.g. "8503000" for Zürich HB)
    pub id: String,
    pub name: String,
    /// Canton initials, e.g. "ZH"
    pub canton: Option<String>,
}

impl FromUpstream for Place {
    const ENTITY: &'static str = "Place";

    fn from_node(node: &Node<'_>) -> Result<Self, ValidationError> {
        Ok(Self {
            id: node.field("id")?.non_empty_string()?,
            name: node.field("name")?.string()?,
            canton: node.optional_string("canton")?,
        })
    }
}

/// A scheduled arrival or departure plus the observed delay in minutes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StopPointDetail {
    pub time: DateTime<FixedOffset>,
    /// Minutes behind schedule; negative for early running.
    pub delay: i64,
}

impl FromUpstream for StopPointDetail {
    const ENTITY: &'static str = "StopPointDetail";

    fn from_node(node: &Node<'_>) -> Result<Self, ValidationError> {
        Ok(Self {
            time: node.field("time")?.timestamp()?,
            delay: node.field("delay")?.integer()?,
        })
    }
}

/// The line or vehicle class operating a trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceProduct {
    /// e.g. "IC 1", "RE 1"
    pub name: String,
    pub category: Option<String>,
    pub vehicle_mode: Option<String>,
}

impl FromUpstream for ServiceProduct {
    const ENTITY: &'static str = "ServiceProduct";
    const FIELD_NAMES: &'static [(&'static str, &'static str)] = &[("vehicle_mode", "vehicleMode")];

    fn from_node(node: &Node<'_>) -> Result<Self, ValidationError> {
        Ok(Self {
            name: node.field("name")?.string()?,
            category: node.optional_string("category")?,
            vehicle_mode: node.optional_string("vehicle_mode")?,
        })
    }
}

/// Headline view of a trip: overall duration, endpoints and main product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TripSummary {
    /// Minutes
    pub duration: i64,
    pub arrival: StopPointDetail,
    pub arrival_walk: i64,
    pub last_stop_place: Place,
    pub departure: StopPointDetail,
    pub departure_walk: i64,
    pub first_stop_place: Place,
    pub product: ServiceProduct,
    /// Final stop of the main service
    pub direction: String,
}

impl FromUpstream for TripSummary {
    const ENTITY: &'static str = "TripSummary";
    const FIELD_NAMES: &'static [(&'static str, &'static str)] = &[
        ("arrival_walk", "arrivalWalk"),
        ("last_stop_place", "lastStopPlace"),
        ("departure_walk", "departureWalk"),
        ("first_stop_place", "firstStopPlace"),
    ];

    fn from_node(node: &Node<'_>) -> Result<Self, ValidationError> {
        Ok(Self {
            duration: node.field("duration")?.integer()?,
            arrival: node.field("arrival")?.decode()?,
            arrival_walk: node.field("arrival_walk")?.integer()?,
            last_stop_place: node.field("last_stop_place")?.decode()?,
            departure: node.field("departure")?.decode()?,
            departure_walk: node.field("departure_walk")?.integer()?,
            first_stop_place: node.field("first_stop_place")?.decode()?,
            product: node.field("product")?.decode()?,
            direction: node.field("direction")?.string()?,
        })
    }
}

/// A public-transport ride between two stops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RideLeg {
    /// Position-style id, "0" for the first leg
    pub id: String,
    pub duration: i64,
    pub start: Place,
    pub end: Place,
    pub arrival: StopPointDetail,
    pub departure: StopPointDetail,
}

impl FromUpstream for RideLeg {
    const ENTITY: &'static str = "RideLeg";

    fn from_node(node: &Node<'_>) -> Result<Self, ValidationError> {
        Ok(Self {
            id: node.field("id")?.string()?,
            duration: node.field("duration")?.integer()?,
            start: node.field("start")?.decode()?,
            end: node.field("end")?.decode()?,
            arrival: node.field("arrival")?.decode()?,
            departure: node.field("departure")?.decode()?,
        })
    }
}

/// Walking to or from the first/last stop of an itinerary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessLeg {
    pub id: String,
    pub duration: i64,
    /// Metres
    pub distance: Option<i64>,
    pub start: Option<Place>,
    pub end: Option<Place>,
}

impl FromUpstream for AccessLeg {
    const ENTITY: &'static str = "AccessLeg";

    fn from_node(node: &Node<'_>) -> Result<Self, ValidationError> {
        Ok(Self {
            id: node.field("id")?.string()?,
            duration: node.field("duration")?.integer()?,
            distance: node.optional("distance")?.map(|n| n.integer()).transpose()?,
            start: node.optional("start")?.map(|n| n.decode()).transpose()?,
            end: node.optional("end")?.map(|n| n.decode()).transpose()?,
        })
    }
}

/// A transfer between two rides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionLeg {
    pub id: String,
    pub duration: i64,
    pub start: Option<Place>,
    pub end: Option<Place>,
}

impl FromUpstream for ConnectionLeg {
    const ENTITY: &'static str = "ConnectionLeg";

    fn from_node(node: &Node<'_>) -> Result<Self, ValidationError> {
        Ok(Self {
            id: node.field("id")?.string()?,
            duration: node.field("duration")?.integer()?,
            start: node.optional("start")?.map(|n| n.decode()).transpose()?,
            end: node.optional("end")?.map(|n| n.decode()).transpose()?,
        })
    }
}

/// A segment served by something other than scheduled transit (taxi, bike, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlternativeModeLeg {
    pub id: String,
    pub duration: i64,
    pub mode: Option<String>,
}

impl FromUpstream for AlternativeModeLeg {
    const ENTITY: &'static str = "AlternativeModeLeg";

    fn from_node(node: &Node<'_>) -> Result<Self, ValidationError> {
        Ok(Self {
            id: node.field("id")?.string()?,
            duration: node.field("duration")?.integer()?,
            mode: node.optional_string("mode")?,
        })
    }
}

/// One segment of an itinerary, keyed on the upstream `__typename`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Leg {
    Ride(RideLeg),
    Access(AccessLeg),
    Connection(ConnectionLeg),
    AlternativeMode(AlternativeModeLeg),
}

impl Leg {
    pub fn id(&self) -> &str {
        match self {
            Self::Ride(leg) => &leg.id,
            Self::Access(leg) => &leg.id,
            Self::Connection(leg) => &leg.id,
            Self::AlternativeMode(leg) => &leg.id,
        }
    }
}

impl FromUpstream for Leg {
    const ENTITY: &'static str = "Leg";
    const FIELD_NAMES: &'static [(&'static str, &'static str)] = &[("kind", "__typename")];

    fn from_node(node: &Node<'_>) -> Result<Self, ValidationError> {
        let kind = node.optional_string("kind")?;
        match kind.as_deref() {
            // untagged legs are rides
            None | Some("PTRideLeg") => node.decode().map(Leg::Ride),
            Some("AccessLeg") => node.decode().map(Leg::Access),
            Some("PTConnectionLeg") => node.decode().map(Leg::Connection),
            Some("AlternativeModeLeg") => node.decode().map(Leg::AlternativeMode),
            Some(other) => Err(node.invalid(format!("unknown leg kind `{other}`"))),
        }
    }
}

/// A complete itinerary returned by a trip search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Trip {
    /// Opaque id, needed to request prices
    pub id: String,
    /// First-to-last along the itinerary
    pub legs: Vec<Leg>,
    pub summary: TripSummary,
}

impl FromUpstream for Trip {
    const ENTITY: &'static str = "Trip";

    fn from_node(node: &Node<'_>) -> Result<Self, ValidationError> {
        let id = node.field("id")?.non_empty_string()?;
        let legs_node = node.field("legs")?;
        let legs = legs_node
            .items()?
            .iter()
            .map(Node::decode)
            .collect::<Result<Vec<Leg>, _>>()?;
        if legs.is_empty() {
            return Err(legs_node.invalid("a trip needs at least one leg"));
        }
        Ok(Self {
            id,
            legs,
            summary: node.field("summary")?.decode()?,
        })
    }
}

/// One page of trip search results plus the cursors to move between pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TripPage {
    pub trips: Vec<Trip>,
    pub previous_cursor: Option<String>,
    pub next_cursor: Option<String>,
}

impl FromUpstream for TripPage {
    const ENTITY: &'static str = "TripPage";
    const FIELD_NAMES: &'static [(&'static str, &'static str)] =
        &[("cursor", "paginationCursor")];

    fn from_node(node: &Node<'_>) -> Result<Self, ValidationError> {
        let trips = node
            .field("trips")?
            .items()?
            .iter()
            .map(Node::decode)
            .collect::<Result<Vec<Trip>, _>>()?;
        let (previous_cursor, next_cursor) = match node.optional("cursor")? {
            Some(cursor) => (
                cursor.optional_string("previous")?,
                cursor.optional_string("next")?,
            ),
            None => (None, None),
        };
        Ok(Self {
            trips,
            previous_cursor,
            next_cursor,
        })
    }
}
