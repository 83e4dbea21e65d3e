use crate::models::{AddOn, ServiceType};

/// Fixed base price per service package, in whole currency units.
pub fn base_price(service: ServiceType) -> f64 {
    match service {
        ServiceType::BasicWash => 15.0,
        ServiceType::DeluxeWash => 25.0,
        ServiceType::FullDetailing => 50.0,
    }
}

/// Fixed duration per service package, in minutes.
pub fn service_duration(service: ServiceType) -> i64 {
    match service {
        ServiceType::BasicWash => 30,
        ServiceType::DeluxeWash => 60,
        ServiceType::FullDetailing => 120,
    }
}

pub fn add_on_price(add_on: AddOn) -> f64 {
    match add_on {
        AddOn::InteriorCleaning => 10.0,
        AddOn::Polishing => 15.0,
        AddOn::WaxProtection => 20.0,
        AddOn::TireShine => 5.0,
        AddOn::AirFreshener => 3.0,
    }
}

/// Base price plus the sum of all selected add-on prices.
pub fn total_price(service: ServiceType, add_ons: &[AddOn]) -> f64 {
    base_price(service) + add_ons.iter().map(|a| add_on_price(*a)).sum::<f64>()
}
