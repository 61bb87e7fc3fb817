//! Rail travel domain: GraphQL query catalog, typed trip/place model, and the
//! ticket purchase stub. No I/O happens in this crate.

pub mod booking;
pub mod error;
pub mod model;
pub mod queries;

pub use error::ValidationError;
pub use model::{
    decode_list, AccessLeg, AlternativeModeLeg, ConnectionLeg, FromUpstream, Leg, Node, Place,
    RideLeg, ServiceProduct, StopPointDetail, Trip, TripPage, TripSummary,
};
