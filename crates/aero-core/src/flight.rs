//! # Flight Types
//!
//! Search criteria, flight offers and the PNR / ticketing payloads
//! exchanged with the ticketing provider. Wire names are camelCase.

use crate::error::{BookingError, BookingResult};
use crate::money::Currency;
use crate::passenger::{ContactRecord, PassengerCounts, PassengerRecord, PassengerType, Salutation};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripType {
    OneWay,
    Return,
}

impl Default for TripType {
    fn default() -> Self {
        TripType::OneWay
    }
}

/// What the customer searched for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchCriteria {
    pub trip_type: TripType,
    pub origin: String,
    pub destination: String,
    pub departure_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_date: Option<NaiveDate>,
    pub passengers: PassengerCounts,
}

impl SearchCriteria {
    pub fn one_way(
        origin: impl Into<String>,
        destination: impl Into<String>,
        departure_date: NaiveDate,
        passengers: PassengerCounts,
    ) -> Self {
        Self {
            trip_type: TripType::OneWay,
            origin: origin.into(),
            destination: destination.into(),
            departure_date,
            return_date: None,
            passengers,
        }
    }

    pub fn round_trip(
        origin: impl Into<String>,
        destination: impl Into<String>,
        departure_date: NaiveDate,
        return_date: NaiveDate,
        passengers: PassengerCounts,
    ) -> Self {
        Self {
            trip_type: TripType::Return,
            origin: origin.into(),
            destination: destination.into(),
            departure_date,
            return_date: Some(return_date),
            passengers,
        }
    }

    pub fn is_return(&self) -> bool {
        self.trip_type == TripType::Return
    }

    /// Last day of travel, used for passport validity
    pub fn last_travel_date(&self) -> NaiveDate {
        self.return_date
            .filter(|_| self.is_return())
            .unwrap_or(self.departure_date)
    }

    pub fn validate(&self) -> BookingResult<()> {
        let origin = self.origin.trim();
        let destination = self.destination.trim();
        if origin.is_empty() || destination.is_empty() {
            return Err(BookingError::Validation(
                "Origin and destination are required".to_string(),
            ));
        }
        if origin.eq_ignore_ascii_case(destination) {
            return Err(BookingError::Validation(
                "Origin and destination must differ".to_string(),
            ));
        }
        self.passengers.validate()?;

        match (self.trip_type, self.return_date) {
            (TripType::Return, None) => Err(BookingError::Validation(
                "Return trips need a return date".to_string(),
            )),
            (TripType::Return, Some(ret)) if ret < self.departure_date => {
                Err(BookingError::Validation(
                    "Return date cannot be before departure".to_string(),
                ))
            }
            _ => Ok(()),
        }
    }
}

/// Price and remaining seats for one cabin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CabinOffer {
    pub price: f64,
    pub seats_available: u32,
}

/// A flight offer returned by search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flight {
    pub id: String,
    pub flight_number: String,
    pub origin: String,
    pub destination: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub duration_minutes: u32,
    pub aircraft: String,
    pub economy: CabinOffer,
    pub business: CabinOffer,
    #[serde(default)]
    pub baggage_allowance_kg: u32,
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default)]
    pub currency: Currency,
    /// Opaque provider key, passed back unchanged on PNR generation
    pub search_key: String,
    /// Opaque provider key, passed back unchanged on PNR generation
    pub class_key: String,
}

/// Whether a result came from the live provider or the degraded fallback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceMode {
    Live,
    Degraded,
}

impl Default for ServiceMode {
    fn default() -> Self {
        ServiceMode::Live
    }
}

/// Candidate flights for both legs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    #[serde(default)]
    pub outbound_flights: Vec<Flight>,
    #[serde(default)]
    pub return_flights: Vec<Flight>,
    #[serde(default)]
    pub mode: ServiceMode,
}

impl SearchResults {
    pub fn is_degraded(&self) -> bool {
        self.mode == ServiceMode::Degraded
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LegCategory {
    Departure,
    Return,
}

/// Flight keys for one leg, tagged by category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightKey {
    pub category: LegCategory,
    pub search_key: String,
    pub class_key: String,
}

impl FlightKey {
    pub fn for_flight(category: LegCategory, flight: &Flight) -> Self {
        Self {
            category,
            search_key: flight.search_key.clone(),
            class_key: flight.class_key.clone(),
        }
    }
}

/// One traveller in the provider's PNR format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PnrPassenger {
    pub first_name: String,
    pub last_name: String,
    pub salutation: Salutation,
    pub date_of_birth: NaiveDate,
    pub passport_number: String,
    pub passport_expiry: NaiveDate,
    pub country: String,
}

impl From<&PassengerRecord> for PnrPassenger {
    fn from(record: &PassengerRecord) -> Self {
        Self {
            first_name: record.first_name.trim().to_string(),
            last_name: record.last_name.trim().to_string(),
            salutation: record.salutation,
            date_of_birth: record.date_of_birth,
            passport_number: record.passport_number.trim().to_string(),
            passport_expiry: record.passport_expiry,
            country: record.country.trim().to_string(),
        }
    }
}

/// Passengers grouped by type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupedPassengers {
    #[serde(default)]
    pub adult: Vec<PnrPassenger>,
    #[serde(default)]
    pub child: Vec<PnrPassenger>,
    #[serde(default)]
    pub infant: Vec<PnrPassenger>,
}

impl GroupedPassengers {
    pub fn from_records(records: &[PassengerRecord]) -> Self {
        let mut grouped = Self::default();
        for record in records {
            let target = match record.passenger_type {
                PassengerType::Adult => &mut grouped.adult,
                PassengerType::Child => &mut grouped.child,
                PassengerType::Infant => &mut grouped.infant,
            };
            target.push(PnrPassenger::from(record));
        }
        grouped
    }
}

/// PNR generation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PnrRequest {
    pub passengers: GroupedPassengers,
    pub contact: ContactRecord,
    pub flights: Vec<FlightKey>,
}

impl PnrRequest {
    pub fn new(
        passengers: &[PassengerRecord],
        contact: &ContactRecord,
        outbound: &Flight,
        inbound: Option<&Flight>,
    ) -> Self {
        let mut flights = vec![FlightKey::for_flight(LegCategory::Departure, outbound)];
        if let Some(flight) = inbound {
            flights.push(FlightKey::for_flight(LegCategory::Return, flight));
        }
        Self {
            passengers: GroupedPassengers::from_records(passengers),
            contact: contact.clone(),
            flights,
        }
    }
}

/// PNR generation response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PnrResponse {
    pub booking_code: String,
    pub status: String,
    pub total_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassengerTicket {
    pub name: String,
    pub ticket_number: String,
}

/// Ticket issuance response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketIssuance {
    pub success: bool,
    #[serde(default)]
    pub passengers: Vec<PassengerTicket>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_criteria_validation() {
        let ok = SearchCriteria::one_way("DIL", "SIN", date(2030, 1, 10), PassengerCounts::default());
        assert!(ok.validate().is_ok());

        let same = SearchCriteria::one_way("DIL", "dil", date(2030, 1, 10), PassengerCounts::default());
        assert!(same.validate().is_err());

        let empty = SearchCriteria::one_way("", "SIN", date(2030, 1, 10), PassengerCounts::default());
        assert!(empty.validate().is_err());

        let backwards = SearchCriteria::round_trip(
            "DIL",
            "SIN",
            date(2030, 1, 10),
            date(2030, 1, 9),
            PassengerCounts::default(),
        );
        assert!(backwards.validate().is_err());
    }

    #[test]
    fn test_search_request_wire_format() {
        let criteria = SearchCriteria::round_trip(
            "DIL",
            "SIN",
            date(2030, 1, 10),
            date(2030, 1, 17),
            PassengerCounts::new(2, 1, 0),
        );
        let json = serde_json::to_value(&criteria).unwrap();
        assert_eq!(json["tripType"], "return");
        assert_eq!(json["departureDate"], "2030-01-10");
        assert_eq!(json["returnDate"], "2030-01-17");
        assert_eq!(json["passengers"]["adult"], 2);
    }

    #[test]
    fn test_grouped_passengers() {
        let record = |t| PassengerRecord {
            passenger_type: t,
            salutation: Salutation::Ms,
            first_name: " Ana ".to_string(),
            last_name: "Belo".to_string(),
            date_of_birth: date(1990, 1, 1),
            passport_number: "P1".to_string(),
            passport_expiry: date(2035, 1, 1),
            country: "TL".to_string(),
        };
        let grouped = GroupedPassengers::from_records(&[
            record(PassengerType::Adult),
            record(PassengerType::Infant),
            record(PassengerType::Adult),
        ]);
        assert_eq!(grouped.adult.len(), 2);
        assert_eq!(grouped.child.len(), 0);
        assert_eq!(grouped.infant.len(), 1);
        assert_eq!(grouped.adult[0].first_name, "Ana");
    }
}
