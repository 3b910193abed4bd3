//! # Cargo Fee Calculation
//!
//! Prices a cargo shipment from its packages, the fee schedule, the route
//! price overrides and an optional pickup request.

use crate::cargo::{CargoFees, CargoSettings, CargoType, FeeSchedule, PackageRecord, PickupService, RoutePriceOverride};
use crate::money::{Currency, Money};
use crate::routes::{currency_for_origin, normalize_code, pickup_available};
use serde::{Deserialize, Serialize};

/// cm³ to m³
pub const CUBIC_METRE_DIVISOR: f64 = 1_000_000.0;

/// Volumetric-weight style divisor used by the booking summary screen
pub const VOLUMETRIC_DIVISOR: f64 = 60_001.0;

/// Which divisor "total volume" is computed with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeBasis {
    CubicMetres,
    Volumetric,
}

impl VolumeBasis {
    pub fn divisor(&self) -> f64 {
        match self {
            VolumeBasis::CubicMetres => CUBIC_METRE_DIVISOR,
            VolumeBasis::Volumetric => VOLUMETRIC_DIVISOR,
        }
    }
}

impl Default for VolumeBasis {
    fn default() -> Self {
        VolumeBasis::CubicMetres
    }
}

/// Schedule-derived fees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    pub awb_fee: Money,
    pub screening_fee: Money,
    pub handling_fee: Money,
    pub cargo_charge: Money,
}

impl FeeBreakdown {
    pub fn total(&self) -> Money {
        self.awb_fee + self.screening_fee + self.handling_fee + self.cargo_charge
    }
}

/// Input for a single cargo quote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CargoQuoteRequest {
    pub origin: String,
    pub destination: String,
    pub cargo_type: CargoType,
    pub packages: Vec<PackageRecord>,
    #[serde(default)]
    pub pickup_requested: bool,
    /// Admin override of the four schedule rates, for this quote only
    #[serde(default)]
    pub rate_override: Option<CargoFees>,
    #[serde(default)]
    pub volume_basis: VolumeBasis,
}

/// Priced shipment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CargoQuote {
    pub currency: Currency,
    pub total_weight_kg: u64,
    pub total_volume: f64,
    pub volume_basis: VolumeBasis,
    pub fees: FeeBreakdown,
    pub pickup_fee: Money,
    pub route_fee: Money,
    pub grand_total: Money,
    /// Rates came from an admin override rather than the schedule
    pub rates_overridden: bool,
    /// The schedule was unavailable and the built-in fallback was used
    pub schedule_fallback: bool,
}

/// Stateless cargo fee calculator
#[derive(Debug, Clone, Copy, Default)]
pub struct CargoFeeCalculator;

impl CargoFeeCalculator {
    /// Σ weight × quantity; packages missing either contribute nothing
    pub fn total_weight(packages: &[PackageRecord]) -> u64 {
        packages
            .iter()
            .filter_map(|p| match (p.weight_kg, p.quantity) {
                (Some(w), q) if w > 0 && q > 0 => Some(w as u64 * q as u64),
                _ => None,
            })
            .fold(0u64, u64::saturating_add)
    }

    /// Σ length × width × height × quantity, divided per `basis`
    pub fn total_volume(packages: &[PackageRecord], basis: VolumeBasis) -> f64 {
        let cubic_cm: f64 = packages
            .iter()
            .filter_map(|p| p.dimensions.map(|d| d.cubic_cm() as f64 * p.quantity as f64))
            .sum();
        cubic_cm / basis.divisor()
    }

    pub fn fee_breakdown(weight_kg: u64, rates: &CargoFees, currency: Currency) -> FeeBreakdown {
        let per_kg = |rate: f64| Money::new(rate * weight_kg as f64, currency);
        FeeBreakdown {
            awb_fee: Money::new(rates.awb_fee, currency),
            screening_fee: per_kg(rates.screening_fee_per_kg),
            handling_fee: per_kg(rates.handling_fee_per_kg),
            cargo_charge: per_kg(rates.cargo_charge_per_kg),
        }
    }

    /// Zero unless requested from a pickup hub; flat up to the base
    /// weight, then charged per extra kg.
    pub fn pickup_fee(
        weight_kg: u64,
        origin: &str,
        requested: bool,
        service: &PickupService,
        currency: Currency,
    ) -> Money {
        if !requested || !pickup_available(origin) {
            return Money::zero(currency);
        }
        let base_weight = service.base_weight as u64;
        if weight_kg <= base_weight {
            Money::new(service.base_price, currency)
        } else {
            let extra = (weight_kg - base_weight) as f64 * service.additional_price_per_kg;
            Money::new(service.base_price + extra, currency)
        }
    }

    /// Per-kg route price for the cargo type, zero without an exact match
    pub fn route_fee(
        origin: &str,
        destination: &str,
        cargo_type: CargoType,
        weight_kg: u64,
        overrides: &[RoutePriceOverride],
        currency: Currency,
    ) -> Money {
        let origin = normalize_code(origin);
        let destination = normalize_code(destination);
        overrides
            .iter()
            .find(|o| o.matches(&origin, &destination))
            .map(|o| Money::new(o.prices.for_type(cargo_type) * weight_kg as f64, currency))
            .unwrap_or_else(|| Money::zero(currency))
    }

    /// Full quote. `settings` is `None` when the settings store is unavailable.
    pub fn quote(request: &CargoQuoteRequest, settings: Option<&CargoSettings>) -> CargoQuote {
        let currency = currency_for_origin(&request.origin);
        let schedule = settings
            .map(CargoSettings::schedule)
            .unwrap_or_else(FeeSchedule::fallback);
        let overrides = settings
            .map(|s| s.cargo_route_prices.as_slice())
            .unwrap_or(&[]);

        let rates = request.rate_override.unwrap_or(schedule.cargo_fees);
        let total_weight_kg = Self::total_weight(&request.packages);
        let total_volume = Self::total_volume(&request.packages, request.volume_basis);

        let fees = Self::fee_breakdown(total_weight_kg, &rates, currency);
        let pickup_fee = Self::pickup_fee(
            total_weight_kg,
            &request.origin,
            request.pickup_requested,
            &schedule.pickup_service,
            currency,
        );
        let route_fee = Self::route_fee(
            &request.origin,
            &request.destination,
            request.cargo_type,
            total_weight_kg,
            overrides,
            currency,
        );

        CargoQuote {
            currency,
            total_weight_kg,
            total_volume,
            volume_basis: request.volume_basis,
            fees,
            pickup_fee,
            route_fee,
            grand_total: fees.total() + pickup_fee + route_fee,
            rates_overridden: request.rate_override.is_some(),
            schedule_fallback: settings.is_none(),
        }
    }
}
