//! # Cargo Types
//!
//! Packages, cargo details and the admin-configured cargo settings record
//! (fee schedule, pickup service, per-route price overrides).

use crate::error::{BookingError, BookingResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Cargo classes with their own per-kg route prices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CargoType {
    General,
    Pharma,
    Perishable,
    Dangerous,
    Special,
}

impl Default for CargoType {
    fn default() -> Self {
        CargoType::General
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageKind {
    Box,
    Crate,
    Pallet,
    Bag,
    Envelope,
    Other,
}

impl Default for PackageKind {
    fn default() -> Self {
        PackageKind::Box
    }
}

/// Longest side a single piece may have
pub const MAX_DIMENSION_CM: u32 = 1_000;

/// Package dimensions in whole centimetres
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub length_cm: u32,
    pub width_cm: u32,
    pub height_cm: u32,
}

impl Dimensions {
    pub fn new(length_cm: u32, width_cm: u32, height_cm: u32) -> Self {
        Self {
            length_cm,
            width_cm,
            height_cm,
        }
    }

    pub fn cubic_cm(&self) -> u64 {
        (self.length_cm as u64)
            .saturating_mul(self.width_cm as u64)
            .saturating_mul(self.height_cm as u64)
    }

    pub fn longest_side(&self) -> u32 {
        self.length_cm.max(self.width_cm).max(self.height_cm)
    }
}

fn default_quantity() -> u32 {
    1
}

/// One line of the cargo manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRecord {
    #[serde(default)]
    pub package_type: PackageKind,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    /// Weight of a single piece in whole kg
    #[serde(default)]
    pub weight_kg: Option<u32>,
    #[serde(default)]
    pub dimensions: Option<Dimensions>,
    #[serde(default)]
    pub description: String,
}

impl PackageRecord {
    pub fn new(weight_kg: u32, quantity: u32) -> Self {
        Self {
            package_type: PackageKind::Box,
            quantity,
            weight_kg: Some(weight_kg),
            dimensions: None,
            description: String::new(),
        }
    }

    pub fn with_dimensions(mut self, length_cm: u32, width_cm: u32, height_cm: u32) -> Self {
        self.dimensions = Some(Dimensions::new(length_cm, width_cm, height_cm));
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn validate(&self) -> BookingResult<()> {
        if self.quantity == 0 {
            return Err(BookingError::Validation(
                "Package quantity must be at least 1".to_string(),
            ));
        }
        if let Some(dimensions) = &self.dimensions {
            if dimensions.longest_side() > MAX_DIMENSION_CM {
                return Err(BookingError::Validation(format!(
                    "Package sides are limited to {} cm, got {} cm",
                    MAX_DIMENSION_CM,
                    dimensions.longest_side()
                )));
            }
        }
        Ok(())
    }
}

/// Door pickup before the flight
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickupRequest {
    pub address: String,
    pub pickup_date: NaiveDate,
}

/// Everything captured on the cargo details step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CargoDetails {
    pub cargo_type: CargoType,
    pub packages: Vec<PackageRecord>,
    #[serde(default)]
    pub pickup: Option<PickupRequest>,
}

impl CargoDetails {
    pub fn validate(&self) -> BookingResult<()> {
        if self.packages.is_empty() {
            return Err(BookingError::Validation(
                "At least one package is required".to_string(),
            ));
        }
        self.packages.iter().try_for_each(PackageRecord::validate)?;
        if let Some(pickup) = &self.pickup {
            if pickup.address.trim().is_empty() {
                return Err(BookingError::Validation(
                    "Pickup address is required".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Flat and per-kg cargo rates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CargoFees {
    pub awb_fee: f64,
    pub screening_fee_per_kg: f64,
    pub handling_fee_per_kg: f64,
    pub cargo_charge_per_kg: f64,
}

impl CargoFees {
    pub fn validate(&self) -> BookingResult<()> {
        let rates = [
            self.awb_fee,
            self.screening_fee_per_kg,
            self.handling_fee_per_kg,
            self.cargo_charge_per_kg,
        ];
        if rates.iter().any(|r| !r.is_finite() || *r < 0.0) {
            return Err(BookingError::Validation(
                "Cargo rates must be non-negative numbers".to_string(),
            ));
        }
        Ok(())
    }
}

/// Pickup pricing: a base price up to a weight threshold, then per kg
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickupService {
    pub base_weight: u32,
    pub base_price: f64,
    pub additional_price_per_kg: f64,
}

/// The rate part of the settings record
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeeSchedule {
    pub cargo_fees: CargoFees,
    pub pickup_service: PickupService,
}

impl FeeSchedule {
    /// Used when the settings store cannot be reached
    pub fn fallback() -> Self {
        Self {
            cargo_fees: CargoFees {
                awb_fee: 25.0,
                screening_fee_per_kg: 0.0,
                handling_fee_per_kg: 0.0,
                cargo_charge_per_kg: 0.0,
            },
            pickup_service: PickupService {
                base_weight: 0,
                base_price: 0.0,
                additional_price_per_kg: 0.0,
            },
        }
    }
}

/// Per-kg prices for each cargo type
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RoutePrices {
    #[serde(default)]
    pub general: f64,
    #[serde(default)]
    pub pharma: f64,
    #[serde(default)]
    pub perishable: f64,
    #[serde(default)]
    pub dangerous: f64,
    #[serde(default)]
    pub special: f64,
}

impl RoutePrices {
    pub fn for_type(&self, cargo_type: CargoType) -> f64 {
        match cargo_type {
            CargoType::General => self.general,
            CargoType::Pharma => self.pharma,
            CargoType::Perishable => self.perishable,
            CargoType::Dangerous => self.dangerous,
            CargoType::Special => self.special,
        }
    }
}

/// Route-specific prices, matched on exact origin and destination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePriceOverride {
    pub from: String,
    pub to: String,
    pub prices: RoutePrices,
}

impl RoutePriceOverride {
    pub fn matches(&self, origin: &str, destination: &str) -> bool {
        self.from == origin && self.to == destination
    }
}

/// The persisted settings record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CargoSettings {
    pub cargo_fees: CargoFees,
    pub pickup_service: PickupService,
    #[serde(default)]
    pub cargo_route_prices: Vec<RoutePriceOverride>,
}

impl CargoSettings {
    pub fn schedule(&self) -> FeeSchedule {
        FeeSchedule {
            cargo_fees: self.cargo_fees,
            pickup_service: self.pickup_service,
        }
    }

    /// Load settings from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_defaults() {
        let package: PackageRecord = serde_json::from_str(r#"{"weight_kg": 12}"#).unwrap();
        assert_eq!(package.quantity, 1);
        assert_eq!(package.package_type, PackageKind::Box);
        assert_eq!(package.weight_kg, Some(12));
    }

    #[test]
    fn test_negative_weight_rejected_by_type() {
        let result = serde_json::from_str::<PackageRecord>(r#"{"weight_kg": -3}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_oversized_package_rejected() {
        let huge = PackageRecord::new(10, u32::MAX).with_dimensions(3_000_000, 3_000_000, 3_000_000);
        assert!(huge.validate().is_err());
        assert_eq!(huge.dimensions.unwrap().cubic_cm(), u64::MAX);

        let details = CargoDetails {
            cargo_type: CargoType::General,
            packages: vec![huge],
            pickup: None,
        };
        assert!(details.validate().is_err());

        let largest = PackageRecord::new(10, 1).with_dimensions(MAX_DIMENSION_CM, 1, 1);
        assert!(largest.validate().is_ok());
    }

    #[test]
    fn test_details_need_a_package() {
        let details = CargoDetails {
            cargo_type: CargoType::General,
            packages: vec![],
            pickup: None,
        };
        assert!(details.validate().is_err());
    }

    #[test]
    fn test_settings_record_from_json() {
        let json = r#"{
            "cargoFees": {"awbFee": 25, "screeningFeePerKg": 0.15, "handlingFeePerKg": 0.25, "cargoChargePerKg": 2.5},
            "pickupService": {"baseWeight": 45, "basePrice": 80, "additionalPricePerKg": 2},
            "cargoRoutePrices": [
                {"from": "SIN", "to": "DIL", "prices": {"general": 1.2, "pharma": 2.4, "perishable": 1.8, "dangerous": 3.1, "special": 2.0}}
            ]
        }"#;
        let settings: CargoSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.cargo_fees.awb_fee, 25.0);
        assert_eq!(settings.pickup_service.base_weight, 45);
        assert!(settings.cargo_route_prices[0].matches("SIN", "DIL"));
        assert_eq!(settings.cargo_route_prices[0].prices.for_type(CargoType::Pharma), 2.4);
    }

    #[test]
    fn test_settings_from_toml() {
        let toml_str = r#"
            [cargoFees]
            awbFee = 25.0
            screeningFeePerKg = 0.15
            handlingFeePerKg = 0.25
            cargoChargePerKg = 2.5

            [pickupService]
            baseWeight = 45
            basePrice = 80.0
            additionalPricePerKg = 2.0
        "#;
        let settings = CargoSettings::from_toml(toml_str).unwrap();
        assert_eq!(settings.schedule().cargo_fees.cargo_charge_per_kg, 2.5);
        assert!(settings.cargo_route_prices.is_empty());
    }
}
