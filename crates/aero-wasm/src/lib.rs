//! # aero-wasm
//!
//! WebAssembly bindings for aero-booking.
//!
//! The booking forms use these to price a trip and check a cargo route
//! before any request reaches the API:
//! - Fare breakdowns for a party of passengers
//! - Cargo quotes with or without a settings record
//! - Route and schedule checks for a ship date
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { quote_fare_json, validate_cargo_route } from 'aero-booking-wasm';
//!
//! await init();
//!
//! const fare = JSON.parse(quote_fare_json(299, 'USD', 2, 0, 1));
//! console.log('Total:', fare.grand_total.amount);
//! ```
//!
//! ## Building
//!
//! ```bash
//! wasm-pack build --target web
//! ```

use aero_core::routes::{self, next_departure, validate_ship_date};
use aero_core::{
    BookingError, CargoFeeCalculator, CargoQuoteRequest, CargoSettings, Currency, FareCalculator,
    Money, PassengerCounts,
};
use chrono::NaiveDate;
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// Route check result handed back to the form
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteCheck {
    pub origin: String,
    pub destination: String,
    pub valid: bool,
    pub pickup_available: bool,
    pub next_departure: Option<NaiveDate>,
    pub message: Option<String>,
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| format!("Serialization failed: {}", e))
}

fn parse_date(date: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|e| format!("Invalid date {:?}: {}", date, e))
}

fn error_message(error: BookingError) -> String {
    error.to_string()
}

/// Fare breakdown as JSON
pub fn fare_quote(
    adult_price: f64,
    currency: &str,
    adult: u32,
    child: u32,
    infant: u32,
) -> Result<String, String> {
    let currency = Currency::parse(currency).ok_or_else(|| format!("Unsupported currency: {}", currency))?;
    let counts = PassengerCounts::new(adult, child, infant);
    let breakdown =
        FareCalculator::calculate(adult_price, currency, &counts).map_err(error_message)?;
    to_json(&breakdown)
}

/// Cargo quote as JSON. An empty `settings_json` prices with the fallback schedule.
pub fn cargo_quote(request_json: &str, settings_json: &str) -> Result<String, String> {
    let request: CargoQuoteRequest =
        serde_json::from_str(request_json).map_err(|e| format!("Invalid quote request: {}", e))?;
    routes::validate_cargo_route(&request.origin, &request.destination).map_err(error_message)?;
    for package in &request.packages {
        package.validate().map_err(error_message)?;
    }

    let settings: Option<CargoSettings> = if settings_json.trim().is_empty() {
        None
    } else {
        Some(serde_json::from_str(settings_json).map_err(|e| format!("Invalid settings: {}", e))?)
    };

    to_json(&CargoFeeCalculator::quote(&request, settings.as_ref()))
}

/// Route lookup. `ship_date` may be empty; when set, it is checked
/// against the schedule relative to `today`.
pub fn route_check(
    origin: &str,
    destination: &str,
    ship_date: &str,
    today: &str,
) -> Result<RouteCheck, String> {
    let origin = routes::normalize_code(origin);
    let destination = routes::normalize_code(destination);
    let pickup_available = routes::pickup_available(&origin);

    let route = match routes::validate_cargo_route(&origin, &destination) {
        Ok(route) => route,
        Err(e) => {
            return Ok(RouteCheck {
                origin,
                destination,
                valid: false,
                pickup_available,
                next_departure: None,
                message: Some(e.to_string()),
            })
        }
    };

    let today = parse_date(today)?;
    let (valid, message, from) = if ship_date.trim().is_empty() {
        (true, None, today)
    } else {
        let date = parse_date(ship_date)?;
        match validate_ship_date(route, date, today) {
            Ok(()) => (true, None, date),
            Err(e) => (false, Some(e.to_string()), date.max(today)),
        }
    };

    Ok(RouteCheck {
        origin,
        destination,
        valid,
        pickup_available,
        next_departure: Some(next_departure(route, from)),
        message,
    })
}

/// Initialize the WASM module (called automatically)
#[wasm_bindgen(start)]
pub fn init() {
    log(&format!("aero-booking wasm {}", version()));
}

#[wasm_bindgen]
pub fn quote_fare_json(
    adult_price: f64,
    currency: &str,
    adult: u32,
    child: u32,
    infant: u32,
) -> Result<String, JsValue> {
    fare_quote(adult_price, currency, adult, child, infant).map_err(|e| JsValue::from_str(&e))
}

#[wasm_bindgen]
pub fn quote_cargo_json(request_json: &str, settings_json: &str) -> Result<String, JsValue> {
    cargo_quote(request_json, settings_json).map_err(|e| JsValue::from_str(&e))
}

/// Route check as JSON; `today` is the browser's local date (YYYY-MM-DD)
#[wasm_bindgen]
pub fn validate_cargo_route(
    origin: &str,
    destination: &str,
    ship_date: &str,
    today: &str,
) -> Result<String, JsValue> {
    route_check(origin, destination, ship_date, today)
        .and_then(|check| to_json(&check))
        .map_err(|e| JsValue::from_str(&e))
}

#[wasm_bindgen]
pub fn is_cargo_route(origin: &str, destination: &str) -> bool {
    routes::validate_cargo_route(origin, destination).is_ok()
}

/// Format an amount in cents for display
#[wasm_bindgen]
pub fn format_amount(cents: i64, currency: &str) -> String {
    let currency = Currency::parse(currency).unwrap_or_default();
    Money::from_cents(cents, currency).display()
}

/// Log to browser console
#[wasm_bindgen]
pub fn log(message: &str) {
    #[cfg(target_arch = "wasm32")]
    web_sys::console::log_1(&JsValue::from_str(message));
    #[cfg(not(target_arch = "wasm32"))]
    let _ = message;
}

/// Get library version
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_fare_quote() {
        let json = fare_quote(299.0, "usd", 2, 0, 1).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["grand_total"]["amount"], 62790);
        assert_eq!(value["grand_total"]["currency"], "USD");
    }

    #[test]
    fn test_fare_quote_rejects_bad_input() {
        assert!(fare_quote(299.0, "EUR", 1, 0, 0).unwrap_err().contains("EUR"));
        assert!(fare_quote(299.0, "USD", 0, 1, 0).is_err());
    }

    #[test]
    fn test_cargo_quote_fallback_schedule() {
        let request = r#"{
            "origin": "DIL",
            "destination": "SIN",
            "cargo_type": "general",
            "packages": [{"weight_kg": 10}]
        }"#;
        let value: Value = serde_json::from_str(&cargo_quote(request, "").unwrap()).unwrap();

        assert_eq!(value["schedule_fallback"], true);
        assert_eq!(value["grand_total"]["amount"], 2500);
    }

    #[test]
    fn test_cargo_quote_with_settings() {
        let request = r#"{
            "origin": "SIN",
            "destination": "DIL",
            "cargo_type": "general",
            "packages": [{"weight_kg": 25, "quantity": 2}]
        }"#;
        let settings = r#"{
            "cargoFees": {"awbFee": 25.0, "screeningFeePerKg": 0.15, "handlingFeePerKg": 0.25, "cargoChargePerKg": 2.5},
            "pickupService": {"baseWeight": 45, "basePrice": 80.0, "additionalPricePerKg": 2.0},
            "cargoRoutePrices": [{"from": "SIN", "to": "DIL", "prices": {"general": 1.0}}]
        }"#;
        let value: Value =
            serde_json::from_str(&cargo_quote(request, settings).unwrap()).unwrap();

        assert_eq!(value["currency"], "SGD");
        assert_eq!(value["route_fee"]["amount"], 5000);
        assert_eq!(value["grand_total"]["amount"], 22000);
    }

    #[test]
    fn test_cargo_quote_unknown_route() {
        let request = r#"{"origin": "SIN", "destination": "DRW", "cargo_type": "general", "packages": []}"#;
        assert!(cargo_quote(request, "").unwrap_err().contains("SIN"));
    }

    #[test]
    fn test_route_check_weekly_schedule() {
        // 2030-03-06 is a Wednesday
        let check = route_check("dil", "drw", "2030-03-07", "2030-03-01").unwrap();
        assert!(!check.valid);
        assert!(check.message.is_some());
        assert_eq!(check.next_departure, NaiveDate::from_ymd_opt(2030, 3, 13));

        let check = route_check("DIL", "DRW", "", "2030-03-01").unwrap();
        assert!(check.valid);
        assert_eq!(check.next_departure, NaiveDate::from_ymd_opt(2030, 3, 6));
    }

    #[test]
    fn test_route_check_unknown_route() {
        let check = route_check("SIN", "SIN", "", "2030-03-01").unwrap();
        assert!(!check.valid);
        assert_eq!(check.next_departure, None);
        assert!(!is_cargo_route("SIN", "KOE"));
        assert!(is_cargo_route("sin", "dil"));
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(22000, "SGD"), Money::from_cents(22000, Currency::SGD).display());
    }
}
