use chrono::{Datelike, Local, NaiveDate};

use crate::errors::FieldError;
use crate::models::{
    AddOn, Booking, BookingStatus, CarDetails, CarDetailsInput, CarType, CreateBooking,
    ServiceType, UpdateBooking, TIME_SLOTS,
};
use crate::services::pricing;

/// A fully validated create payload. Price and duration are intentionally
/// absent; the caller derives them from the pricing tables.
#[derive(Debug)]
pub struct NewBooking {
    pub customer_name: String,
    pub car_details: CarDetails,
    pub service_type: ServiceType,
    pub date: NaiveDate,
    pub time_slot: String,
    pub status: BookingStatus,
    pub rating: Option<i64>,
    pub add_ons: Vec<AddOn>,
}

/// No transition graph is enforced today: any status may move to any other.
/// Kept as a single hook so a constraint (e.g. forbidding
/// Cancelled -> Completed) can be added without touching call sites.
pub fn validate_transition(
    _from: BookingStatus,
    _to: BookingStatus,
) -> Result<(), FieldError> {
    Ok(())
}

pub fn validate_create(req: &CreateBooking) -> Result<NewBooking, Vec<FieldError>> {
    let mut errors = Vec::new();

    let customer_name = match &req.customer_name {
        Some(name) => check_customer_name(name).map_err(|e| errors.push(e)).ok(),
        None => {
            errors.push(FieldError::new("customerName", "Customer name is required"));
            None
        }
    };

    let car_details = match &req.car_details {
        Some(details) => check_car_details(details, &mut errors),
        None => {
            errors.push(FieldError::new("carDetails", "Car details are required"));
            None
        }
    };

    let service_type = match &req.service_type {
        Some(s) => check_service_type(s).map_err(|e| errors.push(e)).ok(),
        None => {
            errors.push(FieldError::new("serviceType", "Service type is required"));
            None
        }
    };

    let date = match &req.date {
        Some(s) => check_date(s).map_err(|e| errors.push(e)).ok(),
        None => {
            errors.push(FieldError::new("date", "Booking date is required"));
            None
        }
    };

    let time_slot = match &req.time_slot {
        Some(s) => check_time_slot(s).map_err(|e| errors.push(e)).ok(),
        None => {
            errors.push(FieldError::new("timeSlot", "Time slot is required"));
            None
        }
    };

    let status = match &req.status {
        Some(s) => check_status(s).map_err(|e| errors.push(e)).ok(),
        None => Some(BookingStatus::Pending),
    };

    let rating = match &req.rating {
        Some(v) => check_rating(v).map_err(|e| errors.push(e)).ok(),
        None => Some(None),
    };

    let add_ons = match &req.add_ons {
        Some(list) => check_add_ons(list).map_err(|e| errors.push(e)).ok(),
        None => Some(Vec::new()),
    };

    // Rating is only legal on a completed booking.
    if let (Some(Some(_)), Some(status)) = (&rating, &status) {
        if *status != BookingStatus::Completed {
            errors.push(FieldError::new(
                "rating",
                "Rating can only be set for completed bookings",
            ));
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    // All Nones were recorded as errors above.
    Ok(NewBooking {
        customer_name: customer_name.unwrap(),
        car_details: car_details.unwrap(),
        service_type: service_type.unwrap(),
        date: date.unwrap(),
        time_slot: time_slot.unwrap(),
        status: status.unwrap(),
        rating: rating.unwrap(),
        add_ons: add_ons.unwrap(),
    })
}

/// Merge a partial update onto an existing booking, re-running every field
/// constraint and recomputing price/duration when the service type or
/// add-ons are part of the update. The merged record is returned with
/// `updated_at` untouched; the caller refreshes it at write time.
pub fn validate_update(
    existing: &Booking,
    req: &UpdateBooking,
) -> Result<Booking, Vec<FieldError>> {
    let mut errors = Vec::new();
    let mut merged = existing.clone();

    if let Some(name) = &req.customer_name {
        match check_customer_name(name) {
            Ok(name) => merged.customer_name = name,
            Err(e) => errors.push(e),
        }
    }

    if let Some(details) = &req.car_details {
        apply_car_details_patch(&mut merged.car_details, details, &mut errors);
    }

    if let Some(s) = &req.service_type {
        match check_service_type(s) {
            Ok(service) => merged.service_type = service,
            Err(e) => errors.push(e),
        }
    }

    if let Some(s) = &req.date {
        match check_date(s) {
            Ok(date) => merged.date = date,
            Err(e) => errors.push(e),
        }
    }

    if let Some(s) = &req.time_slot {
        match check_time_slot(s) {
            Ok(slot) => merged.time_slot = slot,
            Err(e) => errors.push(e),
        }
    }

    if let Some(s) = &req.status {
        match check_status(s) {
            Ok(status) => match validate_transition(existing.status, status) {
                Ok(()) => merged.status = status,
                Err(e) => errors.push(e),
            },
            Err(e) => errors.push(e),
        }
    }

    match &req.rating {
        None => {}
        // Explicit null clears the rating.
        Some(serde_json::Value::Null) => merged.rating = None,
        Some(v) => match check_rating(v) {
            Ok(rating) => merged.rating = rating,
            Err(e) => errors.push(e),
        },
    }

    if let Some(list) = &req.add_ons {
        match check_add_ons(list) {
            Ok(add_ons) => merged.add_ons = add_ons,
            Err(e) => errors.push(e),
        }
    }

    if merged.rating.is_some() && merged.status != BookingStatus::Completed {
        errors.push(FieldError::new(
            "rating",
            "Rating can only be set for completed bookings",
        ));
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    if req.service_type.is_some() || req.add_ons.is_some() {
        merged.price = pricing::total_price(merged.service_type, &merged.add_ons);
        merged.duration = pricing::service_duration(merged.service_type);
    }

    Ok(merged)
}

// ── Field checks ──

fn check_customer_name(raw: &str) -> Result<String, FieldError> {
    let name = raw.trim();
    let len = name.chars().count();
    if len < 2 || len > 100 {
        return Err(FieldError::new(
            "customerName",
            "Customer name must be between 2 and 100 characters",
        ));
    }
    Ok(name.to_string())
}

fn check_car_text(raw: &str, field: &str, label: &str) -> Result<String, FieldError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(FieldError::new(field, format!("{label} is required")));
    }
    if value.chars().count() > 50 {
        return Err(FieldError::new(
            field,
            format!("{label} cannot exceed 50 characters"),
        ));
    }
    Ok(value.to_string())
}

fn max_car_year() -> i64 {
    i64::from(Local::now().year()) + 1
}

fn check_car_year(value: &serde_json::Value) -> Result<i64, FieldError> {
    let max = max_car_year();
    let err = || {
        FieldError::new(
            "carDetails.year",
            format!("Car year must be between 1900 and {max}"),
        )
    };
    let year = value.as_i64().ok_or_else(err)?;
    if !(1900..=max).contains(&year) {
        return Err(err());
    }
    Ok(year)
}

fn check_car_type(raw: &str) -> Result<CarType, FieldError> {
    CarType::parse(raw.trim()).ok_or_else(|| {
        FieldError::new(
            "carDetails.type",
            "Car type must be one of: sedan, SUV, hatchback, luxury, truck, coupe",
        )
    })
}

fn check_car_details(
    input: &CarDetailsInput,
    errors: &mut Vec<FieldError>,
) -> Option<CarDetails> {
    let make = match &input.make {
        Some(s) => check_car_text(s, "carDetails.make", "Car make")
            .map_err(|e| errors.push(e))
            .ok(),
        None => {
            errors.push(FieldError::new("carDetails.make", "Car make is required"));
            None
        }
    };
    let model = match &input.model {
        Some(s) => check_car_text(s, "carDetails.model", "Car model")
            .map_err(|e| errors.push(e))
            .ok(),
        None => {
            errors.push(FieldError::new("carDetails.model", "Car model is required"));
            None
        }
    };
    let year = match &input.year {
        Some(v) => check_car_year(v).map_err(|e| errors.push(e)).ok(),
        None => {
            errors.push(FieldError::new("carDetails.year", "Car year is required"));
            None
        }
    };
    let car_type = match &input.car_type {
        Some(s) => check_car_type(s).map_err(|e| errors.push(e)).ok(),
        None => {
            errors.push(FieldError::new("carDetails.type", "Car type is required"));
            None
        }
    };

    match (make, model, year, car_type) {
        (Some(make), Some(model), Some(year), Some(car_type)) => Some(CarDetails {
            make,
            model,
            year,
            car_type,
        }),
        _ => None,
    }
}

fn apply_car_details_patch(
    target: &mut CarDetails,
    patch: &CarDetailsInput,
    errors: &mut Vec<FieldError>,
) {
    if let Some(s) = &patch.make {
        match check_car_text(s, "carDetails.make", "Car make") {
            Ok(make) => target.make = make,
            Err(e) => errors.push(e),
        }
    }
    if let Some(s) = &patch.model {
        match check_car_text(s, "carDetails.model", "Car model") {
            Ok(model) => target.model = model,
            Err(e) => errors.push(e),
        }
    }
    if let Some(v) = &patch.year {
        match check_car_year(v) {
            Ok(year) => target.year = year,
            Err(e) => errors.push(e),
        }
    }
    if let Some(s) = &patch.car_type {
        match check_car_type(s) {
            Ok(car_type) => target.car_type = car_type,
            Err(e) => errors.push(e),
        }
    }
}

fn check_service_type(raw: &str) -> Result<ServiceType, FieldError> {
    ServiceType::parse(raw.trim()).ok_or_else(|| {
        FieldError::new(
            "serviceType",
            "Service type must be one of: Basic Wash, Deluxe Wash, Full Detailing",
        )
    })
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp (the date part is kept).
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }
    chrono::DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.date_naive())
}

fn check_date(raw: &str) -> Result<NaiveDate, FieldError> {
    let date = parse_date(raw)
        .ok_or_else(|| FieldError::new("date", "Date must be a valid ISO 8601 date"))?;
    // Past dates are rejected at write time only; existing records are not
    // re-validated as time passes.
    if date < Local::now().date_naive() {
        return Err(FieldError::new("date", "Booking date cannot be in the past"));
    }
    Ok(date)
}

fn check_time_slot(raw: &str) -> Result<String, FieldError> {
    let slot = raw.trim();
    if TIME_SLOTS.contains(&slot) {
        Ok(slot.to_string())
    } else {
        Err(FieldError::new("timeSlot", "Invalid time slot"))
    }
}

fn check_status(raw: &str) -> Result<BookingStatus, FieldError> {
    BookingStatus::parse(raw.trim()).ok_or_else(|| {
        FieldError::new(
            "status",
            "Status must be one of: Pending, Confirmed, In Progress, Completed, Cancelled",
        )
    })
}

fn check_rating(value: &serde_json::Value) -> Result<Option<i64>, FieldError> {
    if value.is_null() {
        return Ok(None);
    }
    let err = || FieldError::new("rating", "Rating must be an integer between 1 and 5");
    let rating = value.as_i64().ok_or_else(err)?;
    if !(1..=5).contains(&rating) {
        return Err(err());
    }
    Ok(Some(rating))
}

fn check_add_ons(list: &[String]) -> Result<Vec<AddOn>, FieldError> {
    let mut add_ons = Vec::new();
    let mut invalid = Vec::new();
    for raw in list {
        match AddOn::parse(raw.trim()) {
            Some(add_on) => {
                if !add_ons.contains(&add_on) {
                    add_ons.push(add_on);
                }
            }
            None => invalid.push(raw.as_str()),
        }
    }
    if !invalid.is_empty() {
        return Err(FieldError::new(
            "addOns",
            format!("Invalid add-ons: {}", invalid.join(", ")),
        ));
    }
    Ok(add_ons)
}
