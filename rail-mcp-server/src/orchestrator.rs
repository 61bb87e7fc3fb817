//! Name-to-name trip search: resolve both places, then search trips between them.

use std::future::Future;

use chrono::{NaiveDate, NaiveTime};
use rail_core::{Place, Trip};

use crate::client::{RailClient, TripQuery};
use crate::config::Language;
use crate::error::RailError;

/// The two upstream calls trip orchestration depends on.
pub trait TimetableApi {
    fn search_places(
        &self,
        name: &str,
        language: Language,
    ) -> impl Future<Output = Result<Vec<Place>, RailError>> + Send;

    fn search_trips(
        &self,
        query: &TripQuery,
    ) -> impl Future<Output = Result<Vec<Trip>, RailError>> + Send;
}

impl TimetableApi for RailClient {
    async fn search_places(&self, name: &str, language: Language) -> Result<Vec<Place>, RailError> {
        RailClient::search_places(self, name, language).await
    }

    async fn search_trips(&self, query: &TripQuery) -> Result<Vec<Trip>, RailError> {
        RailClient::search_trips(self, query).await
    }
}

/// Resolves `origin` and `destination` concurrently and searches trips between
/// the best match for each.
///
/// The first failing lookup aborts the other one. A name with no match is a
/// [`RailError::NotFound`]; no trips between two valid places is `Ok(vec![])`.
pub async fn find_trips<A: TimetableApi>(
    api: &A,
    origin: &str,
    destination: &str,
    date: NaiveDate,
    time: NaiveTime,
    language: Language,
) -> Result<Vec<Trip>, RailError> {
    let (from, to) = tokio::try_join!(
        resolve_place(api, origin, language),
        resolve_place(api, destination, language)
    )?;
    tracing::info!("Resolved {:?} → {} and {:?} → {}", origin, from.id, destination, to.id);

    let query = TripQuery {
        origin_id: from.id,
        destination_id: to.id,
        date,
        time,
        language,
    };
    api.search_trips(&query).await
}

async fn resolve_place<A: TimetableApi>(
    api: &A,
    name: &str,
    language: Language,
) -> Result<Place, RailError> {
    api.search_places(name, language)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| RailError::NotFound(name.to_string()))
}
