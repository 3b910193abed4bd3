//! # Passenger Types
//!
//! Passenger counts, passenger records and contact details captured
//! during flight booking.

use crate::error::{BookingError, BookingResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Largest party a single booking may carry
pub const MAX_PASSENGERS: u32 = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PassengerType {
    Adult,
    Child,
    Infant,
}

impl PassengerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PassengerType::Adult => "adult",
            PassengerType::Child => "child",
            PassengerType::Infant => "infant",
        }
    }
}

/// Number of travellers per passenger type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassengerCounts {
    pub adult: u32,
    #[serde(default)]
    pub child: u32,
    #[serde(default)]
    pub infant: u32,
}

impl PassengerCounts {
    pub fn new(adult: u32, child: u32, infant: u32) -> Self {
        Self { adult, child, infant }
    }

    /// Saturates, so oversized counts still fail the seat limit
    pub fn total(&self) -> u32 {
        self.adult.saturating_add(self.child).saturating_add(self.infant)
    }

    pub fn count_of(&self, passenger_type: PassengerType) -> u32 {
        match passenger_type {
            PassengerType::Adult => self.adult,
            PassengerType::Child => self.child,
            PassengerType::Infant => self.infant,
        }
    }

    /// At least one adult, every infant on an adult's lap, at most nine seats.
    pub fn validate(&self) -> BookingResult<()> {
        if self.adult == 0 {
            return Err(BookingError::Validation(
                "At least one adult passenger is required".to_string(),
            ));
        }
        if self.infant > self.adult {
            return Err(BookingError::Validation(format!(
                "Infants ({}) cannot outnumber adults ({})",
                self.infant, self.adult
            )));
        }
        if self.total() > MAX_PASSENGERS {
            return Err(BookingError::Validation(format!(
                "A booking holds at most {} passengers, got {}",
                MAX_PASSENGERS,
                self.total()
            )));
        }
        Ok(())
    }
}

impl Default for PassengerCounts {
    fn default() -> Self {
        Self::new(1, 0, 0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Salutation {
    Mr,
    Mrs,
    Ms,
    Mstr,
    Miss,
}

/// One traveller as captured on the passenger details step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassengerRecord {
    pub passenger_type: PassengerType,
    pub salutation: Salutation,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub passport_number: String,
    pub passport_expiry: NaiveDate,
    /// ISO country code of the passport
    pub country: String,
}

impl PassengerRecord {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
    }

    /// Field-level checks; `travel_until` is the last date the passport must cover.
    pub fn validate(&self, travel_until: NaiveDate) -> BookingResult<()> {
        if self.first_name.trim().is_empty() || self.last_name.trim().is_empty() {
            return Err(BookingError::Validation(
                "Passenger first and last name are required".to_string(),
            ));
        }
        if self.passport_number.trim().is_empty() {
            return Err(BookingError::Validation(format!(
                "Passport number missing for {}",
                self.full_name()
            )));
        }
        if self.passport_expiry < travel_until {
            return Err(BookingError::Validation(format!(
                "Passport of {} expires before travel ({})",
                self.full_name(),
                self.passport_expiry
            )));
        }
        if self.date_of_birth >= travel_until {
            return Err(BookingError::Validation(format!(
                "Date of birth of {} is not before travel",
                self.full_name()
            )));
        }
        if self.country.trim().is_empty() {
            return Err(BookingError::Validation(format!(
                "Country missing for {}",
                self.full_name()
            )));
        }
        Ok(())
    }
}

/// Contact details for a booking, shipper or consignee
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRecord {
    pub name: String,
    pub phone: String,
    pub email: String,
}

impl ContactRecord {
    pub fn new(name: impl Into<String>, phone: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phone: phone.into(),
            email: email.into(),
        }
    }

    pub fn validate(&self) -> BookingResult<()> {
        if self.name.trim().is_empty() {
            return Err(BookingError::Validation("Contact name is required".to_string()));
        }
        if self.phone.trim().is_empty() {
            return Err(BookingError::Validation("Contact phone is required".to_string()));
        }
        let email = self.email.trim();
        match email.split_once('@') {
            Some((user, domain)) if !user.is_empty() && domain.contains('.') => Ok(()),
            _ => Err(BookingError::Validation(format!(
                "Invalid contact email: {}",
                self.email
            ))),
        }
    }
}

/// Checks that the records match the counts exactly, type by type.
pub fn validate_passenger_records(
    counts: &PassengerCounts,
    records: &[PassengerRecord],
    travel_until: NaiveDate,
) -> BookingResult<()> {
    for passenger_type in [PassengerType::Adult, PassengerType::Child, PassengerType::Infant] {
        let expected = counts.count_of(passenger_type) as usize;
        let actual = records
            .iter()
            .filter(|r| r.passenger_type == passenger_type)
            .count();
        if expected != actual {
            return Err(BookingError::Validation(format!(
                "Expected {} {} passenger record(s), got {}",
                expected,
                passenger_type.as_str(),
                actual
            )));
        }
    }

    records.iter().try_for_each(|r| r.validate(travel_until))
}
