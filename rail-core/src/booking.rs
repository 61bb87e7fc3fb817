use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::ValidationError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub trip_id: String,
    pub passenger_name: String,
    pub passenger_email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub booking_id: String,
    pub confirmation_code: String,
    pub status: String,
    pub trip_id: String,
    pub passenger_name: String,
}

/// Ticket purchase stub.
///
/// Nothing is sent upstream: the booking reference is derived from the
/// request so that the same request always yields the same reservation.
pub fn handle(req: Request) -> Result<Response, ValidationError> {
    for (field, value) in [("trip_id", &req.trip_id), ("passenger_name", &req.passenger_name)] {
        if value.trim().is_empty() {
            return Err(ValidationError::InvalidField {
                entity: "Booking",
                path: field.to_string(),
                reason: "must not be empty".to_string(),
            });
        }
    }

    let digest = Sha256::digest(
        format!("{}|{}|{}", req.trip_id, req.passenger_name, req.passenger_email).as_bytes(),
    );
    let hex = hex::encode_upper(digest);

    Ok(Response {
        booking_id: format!("BK{}", &hex[..8]),
        confirmation_code: format!("CONF{}", &hex[8..14]),
        status: String::from("reserved"),
        trip_id: req.trip_id,
        passenger_name: req.passenger_name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(trip_id: &str) -> Request {
        Request {
            trip_id: trip_id.to_string(),
            passenger_name: "Anna Muster".to_string(),
            passenger_email: "anna@example.ch".to_string(),
        }
    }

    #[test]
    fn test_booking_is_deterministic() {
        let first = handle(request("HC_1")).unwrap();
        let second = handle(request("HC_1")).unwrap();
        assert_eq!(first, second);
        assert!(first.booking_id.starts_with("BK"));
        assert_eq!(first.booking_id.len(), 10);
        assert_eq!(first.confirmation_code.len(), 10);
        assert_eq!(first.status, "reserved");
    }

    #[test]
    fn test_different_trips_get_different_references() {
        let a = handle(request("HC_1")).unwrap();
        let b = handle(request("HC_2")).unwrap();
        assert_ne!(a.booking_id, b.booking_id);
    }

    #[test]
    fn test_empty_trip_id_is_rejected() {
        let err = handle(request("  ")).unwrap_err();
        assert_eq!(err.path(), "trip_id");
    }
}
