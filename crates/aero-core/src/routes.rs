//! # Cargo Route Table
//!
//! The routes cargo can be booked on, with their operating schedule, plus
//! the origin-based rules for pickup availability and pricing currency.

use crate::error::{BookingError, BookingResult};
use crate::money::Currency;
use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;

pub const SINGAPORE_HUB: &str = "SIN";
pub const DILI_HUB: &str = "DIL";

/// Origins where door pickup is offered
pub const PICKUP_HUBS: [&str; 2] = [DILI_HUB, SINGAPORE_HUB];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteSchedule {
    Daily,
    Weekly(Weekday),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CargoRoute {
    pub origin: &'static str,
    pub destination: &'static str,
    pub schedule: RouteSchedule,
}

const fn route(origin: &'static str, destination: &'static str, schedule: RouteSchedule) -> CargoRoute {
    CargoRoute {
        origin,
        destination,
        schedule,
    }
}

pub const CARGO_ROUTES: &[CargoRoute] = &[
    route("SIN", "DIL", RouteSchedule::Daily),
    route("DIL", "SIN", RouteSchedule::Daily),
    route("DIL", "DPS", RouteSchedule::Daily),
    route("DPS", "DIL", RouteSchedule::Daily),
    route("DIL", "DRW", RouteSchedule::Weekly(Weekday::Wed)),
    route("DRW", "DIL", RouteSchedule::Weekly(Weekday::Wed)),
    route("DIL", "KOE", RouteSchedule::Weekly(Weekday::Fri)),
    route("KOE", "DIL", RouteSchedule::Weekly(Weekday::Fri)),
];

/// Upper-cased, trimmed airport code
pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// Looks up a bookable cargo route
pub fn validate_cargo_route(origin: &str, destination: &str) -> BookingResult<&'static CargoRoute> {
    let origin = normalize_code(origin);
    let destination = normalize_code(destination);

    if origin.is_empty() || destination.is_empty() {
        return Err(BookingError::Route(
            "Origin and destination are required".to_string(),
        ));
    }
    if origin == destination {
        return Err(BookingError::Route(format!(
            "Origin and destination are the same ({})",
            origin
        )));
    }

    CARGO_ROUTES
        .iter()
        .find(|r| r.origin == origin && r.destination == destination)
        .ok_or_else(|| {
            BookingError::Route(format!("No cargo service from {} to {}", origin, destination))
        })
}

/// Checks a ship date against the route's schedule. Dates before `today`
/// are never accepted.
pub fn validate_ship_date(route: &CargoRoute, date: NaiveDate, today: NaiveDate) -> BookingResult<()> {
    if date < today {
        return Err(BookingError::Route(format!(
            "Ship date {} is in the past",
            date
        )));
    }
    match route.schedule {
        RouteSchedule::Daily => Ok(()),
        RouteSchedule::Weekly(day) if date.weekday() == day => Ok(()),
        RouteSchedule::Weekly(day) => Err(BookingError::Route(format!(
            "{} to {} only operates on {:?}, {} is a {:?}",
            route.origin,
            route.destination,
            day,
            date,
            date.weekday()
        ))),
    }
}

/// Next date on or after `from` that the route operates
pub fn next_departure(route: &CargoRoute, from: NaiveDate) -> NaiveDate {
    match route.schedule {
        RouteSchedule::Daily => from,
        RouteSchedule::Weekly(day) => {
            let ahead = (day.num_days_from_monday() + 7 - from.weekday().num_days_from_monday()) % 7;
            from + chrono::Days::new(ahead as u64)
        }
    }
}

pub fn pickup_available(origin: &str) -> bool {
    let origin = normalize_code(origin);
    PICKUP_HUBS.contains(&origin.as_str())
}

/// SGD from the Singapore hub, USD everywhere else
pub fn currency_for_origin(origin: &str) -> Currency {
    if normalize_code(origin) == SINGAPORE_HUB {
        Currency::SGD
    } else {
        Currency::USD
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_validate_cargo_route() {
        assert!(validate_cargo_route("SIN", "SIN").is_err());
        assert!(validate_cargo_route("SIN", "DIL").is_ok());
        assert!(validate_cargo_route(" sin ", "dil").is_ok());
        assert!(validate_cargo_route("SIN", "DRW").is_err());
        assert!(validate_cargo_route("", "DIL").is_err());
    }

    #[test]
    fn test_daily_route_accepts_any_future_date() {
        let route = validate_cargo_route("SIN", "DIL").unwrap();
        let today = date(2030, 1, 1);
        assert!(validate_ship_date(route, today, today).is_ok());
        assert!(validate_ship_date(route, date(2030, 1, 5), today).is_ok());
        assert!(validate_ship_date(route, date(2029, 12, 31), today).is_err());
    }

    #[test]
    fn test_weekly_route_accepts_only_scheduled_day() {
        let route = validate_cargo_route("DIL", "DRW").unwrap();
        let today = date(2030, 1, 1);
        // 2030-01-02 is a Wednesday
        assert_eq!(date(2030, 1, 2).weekday(), Weekday::Wed);
        assert!(validate_ship_date(route, date(2030, 1, 2), today).is_ok());
        assert!(validate_ship_date(route, date(2030, 1, 3), today).is_err());
        assert!(validate_ship_date(route, date(2030, 1, 9), today).is_ok());
    }

    #[test]
    fn test_next_departure() {
        let route = validate_cargo_route("DIL", "KOE").unwrap();
        let next = next_departure(route, date(2030, 1, 1));
        assert_eq!(next.weekday(), Weekday::Fri);
        assert_eq!(next, date(2030, 1, 4));
        assert_eq!(next_departure(route, next), next);
    }

    #[test]
    fn test_origin_rules() {
        assert!(pickup_available("DIL"));
        assert!(pickup_available("sin"));
        assert!(!pickup_available("DPS"));
        assert_eq!(currency_for_origin("SIN"), Currency::SGD);
        assert_eq!(currency_for_origin("DIL"), Currency::USD);
    }
}
