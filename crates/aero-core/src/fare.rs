//! # Fare Calculation
//!
//! Turns an adult fare and a passenger mix into a priced breakdown.
//!
//! Children pay the adult fare, infants pay a tenth of it. Taxes and fees
//! are shown as fixed shares of the grand total, each rounded to a whole
//! currency unit; the displayed base fare absorbs the rounding so the
//! breakdown always sums back to the grand total.

use crate::error::{BookingError, BookingResult};
use crate::money::{Currency, Money};
use crate::passenger::PassengerCounts;
use serde::{Deserialize, Serialize};

pub const CHILD_FARE_RATIO: f64 = 1.0;
pub const INFANT_FARE_RATIO: f64 = 0.10;

pub const AIRPORT_TAX_RATE: f64 = 0.06;
pub const FUEL_SURCHARGE_RATE: f64 = 0.04;
pub const SERVICE_CHARGE_RATE: f64 = 0.02;
pub const INSURANCE_FEE_RATE: f64 = 0.01;

/// Per-person fares and the line totals for each passenger type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassengerFares {
    pub adult_fare: Money,
    pub child_fare: Money,
    pub infant_fare: Money,
    pub adult_total: Money,
    pub child_total: Money,
    pub infant_total: Money,
}

/// Priced fare with its display breakdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FareBreakdown {
    pub passengers: PassengerCounts,
    pub fares: PassengerFares,
    /// Authoritative amount passed to payment
    pub grand_total: Money,
    pub airport_tax: Money,
    pub fuel_surcharge: Money,
    pub service_charge: Money,
    pub insurance_fee: Money,
    /// Grand total minus the four rounded fees
    pub base_fare: Money,
}

impl FareBreakdown {
    pub fn total_fees(&self) -> Money {
        self.airport_tax + self.fuel_surcharge + self.service_charge + self.insurance_fee
    }
}

/// Stateless fare calculator
#[derive(Debug, Clone, Copy, Default)]
pub struct FareCalculator;

impl FareCalculator {
    /// Per-person fares and line totals
    pub fn passenger_fares(adult_fare: Money, counts: &PassengerCounts) -> PassengerFares {
        let child_fare = adult_fare.scale(CHILD_FARE_RATIO);
        let infant_fare = adult_fare.scale(INFANT_FARE_RATIO);
        let line = |fare: Money, count: u32| Money::from_cents(fare.amount * count as i64, fare.currency);

        PassengerFares {
            adult_fare,
            child_fare,
            infant_fare,
            adult_total: line(adult_fare, counts.adult),
            child_total: line(child_fare, counts.child),
            infant_total: line(infant_fare, counts.infant),
        }
    }

    /// Sum of all passenger fares
    pub fn fare_total(adult_fare: Money, counts: &PassengerCounts) -> Money {
        let fares = Self::passenger_fares(adult_fare, counts);
        fares.adult_total + fares.child_total + fares.infant_total
    }

    /// Full breakdown for an adult price given in decimal currency units
    pub fn calculate(
        adult_price: f64,
        currency: Currency,
        counts: &PassengerCounts,
    ) -> BookingResult<FareBreakdown> {
        if !adult_price.is_finite() || adult_price < 0.0 {
            return Err(BookingError::Validation(format!(
                "Invalid adult price: {}",
                adult_price
            )));
        }
        counts.validate()?;

        let adult_fare = Money::new(adult_price, currency);
        let fares = Self::passenger_fares(adult_fare, counts);
        let grand_total = fares.adult_total + fares.child_total + fares.infant_total;

        let share = |rate: f64| grand_total.scale(rate).round_to_unit();
        let airport_tax = share(AIRPORT_TAX_RATE);
        let fuel_surcharge = share(FUEL_SURCHARGE_RATE);
        let service_charge = share(SERVICE_CHARGE_RATE);
        let insurance_fee = share(INSURANCE_FEE_RATE);
        let base_fare = grand_total - (airport_tax + fuel_surcharge + service_charge + insurance_fee);

        Ok(FareBreakdown {
            passengers: *counts,
            fares,
            grand_total,
            airport_tax,
            fuel_surcharge,
            service_charge,
            insurance_fee,
            base_fare,
        })
    }
}
