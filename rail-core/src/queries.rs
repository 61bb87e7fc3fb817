//! GraphQL documents sent to the upstream timetable API.
//!
//! Field selections here must stay in step with the decoders in
//! [`crate::model`]: anything the model requires has to be requested.

/// A document together with the operation name it declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operation {
    pub name: &'static str,
    pub document: &'static str,
}

pub const GET_PLACES: Operation = Operation {
    name: "GetPlaces",
    document: r#"
query GetPlaces($input: PlaceInput, $language: LanguageEnum!) {
  places(input: $input, language: $language) {
    id
    name
    __typename
  }
}
"#,
};

pub const GET_TRIPS: Operation = Operation {
    name: "getTrips",
    document: r#"
query getTrips($input: TripInput!, $pagingCursor: String, $language: LanguageEnum!) {
  trips(tripInput: $input, pagingCursor: $pagingCursor, language: $language) {
    trips {
      ...TripFields
      __typename
    }
    paginationCursor {
      previous
      next
      __typename
    }
    __typename
  }
}

fragment NoticesFields on Notice {
  name
  text {
    template
    arguments {
      type
      values
      __typename
    }
    __typename
  }
  type
  priority
  advertised
  __typename
}

fragment ArrivalDepartureFields on ScheduledStopPointDetail {
  time
  delay
  delayText
  quayFormatted
  quayChanged
  quayChangedText
  __typename
}

fragment ServiceProductFields on ServiceProduct {
  name
  line
  number
  vehicleMode
  vehicleSubModeShortName
  corporateIdentityIcon
  corporateIdentityPictogram
  __typename
}

fragment TripStatusFields on TripStatus {
  alternative
  alternativeText
  cancelled
  cancelledText
  partiallyCancelled
  delayed
  delayedUnknown
  quayChanged
  __typename
}

fragment StopPlaceFields on StopPlace {
  __typename
  id
  name
}

fragment TripFields on Trip {
  id
  legs {
    __typename
    duration
    id
    ... on AccessLeg {
      __typename
      duration
      distance
      start {
        ...StopPlaceFields
      }
      end {
        ...StopPlaceFields
      }
    }
    ... on PTConnectionLeg {
      __typename
      duration
      start {
        ...StopPlaceFields
      }
      end {
        ...StopPlaceFields
      }
      notices {
        ...NoticesFields
        __typename
      }
    }
    ... on AlternativeModeLeg {
      __typename
      mode
      duration
    }
    ... on PTRideLeg {
      __typename
      duration
      start {
        ...StopPlaceFields
      }
      end {
        ...StopPlaceFields
      }
      arrival {
        ...ArrivalDepartureFields
        __typename
      }
      departure {
        ...ArrivalDepartureFields
        __typename
      }
      serviceJourney {
        id
        serviceProducts {
          ...ServiceProductFields
          routeIndexFrom
          routeIndexTo
          __typename
        }
        direction
        __typename
      }
    }
    __typename
  }
  notices {
    ...NoticesFields
    __typename
  }
  valid
  isBuyable
  summary {
    duration
    arrival {
      ...ArrivalDepartureFields
      __typename
    }
    arrivalWalk
    lastStopPlace {
      __typename
      id
      name
      canton
    }
    tripStatus {
      ...TripStatusFields
      __typename
    }
    departure {
      ...ArrivalDepartureFields
      __typename
    }
    departureWalk
    firstStopPlace {
      __typename
      id
      name
      canton
    }
    product {
      ...ServiceProductFields
      __typename
    }
    direction
    international
    __typename
  }
  searchHint
  __typename
}
"#,
};

pub const GET_TRIP_PRICES: Operation = Operation {
    name: "TripPrices",
    document: r#"
query TripPrices($input: TripPricesQueryInput!) {
  tripPrices(input: $input) {
    tripId
    tripPrices {
      price {
        amount
        currency
        vats {
          amount
          currency
          taxId
        }
      }
      productId
      travelClass
      afterSaleFlexibility
    }
  }
}
"#,
};

/// Modes of transport a trip search may use.
pub const TRANSPORT_MODES: &[&str] = &[
    "HIGH_SPEED_TRAIN",
    "INTERCITY",
    "INTERREGIO",
    "REGIO",
    "URBAN_TRAIN",
    "SPECIAL_TRAIN",
    "SHIP",
    "BUS",
    "TRAMWAY",
    "CABLEWAY_GONDOLA_CHAIRLIFT",
    "UNDERGROUND",
    "TAXI",
];
