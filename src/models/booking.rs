use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// The eight bookable one-hour slots between 09:00 and 17:00.
pub const TIME_SLOTS: [&str; 8] = [
    "09:00-10:00",
    "10:00-11:00",
    "11:00-12:00",
    "12:00-13:00",
    "13:00-14:00",
    "14:00-15:00",
    "15:00-16:00",
    "16:00-17:00",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceType {
    #[serde(rename = "Basic Wash")]
    BasicWash,
    #[serde(rename = "Deluxe Wash")]
    DeluxeWash,
    #[serde(rename = "Full Detailing")]
    FullDetailing,
}

impl ServiceType {
    pub const ALL: [ServiceType; 3] = [
        ServiceType::BasicWash,
        ServiceType::DeluxeWash,
        ServiceType::FullDetailing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::BasicWash => "Basic Wash",
            ServiceType::DeluxeWash => "Deluxe Wash",
            ServiceType::FullDetailing => "Full Detailing",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Basic Wash" => Some(ServiceType::BasicWash),
            "Deluxe Wash" => Some(ServiceType::DeluxeWash),
            "Full Detailing" => Some(ServiceType::FullDetailing),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CarType {
    #[serde(rename = "sedan")]
    Sedan,
    #[serde(rename = "SUV")]
    Suv,
    #[serde(rename = "hatchback")]
    Hatchback,
    #[serde(rename = "luxury")]
    Luxury,
    #[serde(rename = "truck")]
    Truck,
    #[serde(rename = "coupe")]
    Coupe,
}

impl CarType {
    pub const ALL: [CarType; 6] = [
        CarType::Sedan,
        CarType::Suv,
        CarType::Hatchback,
        CarType::Luxury,
        CarType::Truck,
        CarType::Coupe,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CarType::Sedan => "sedan",
            CarType::Suv => "SUV",
            CarType::Hatchback => "hatchback",
            CarType::Luxury => "luxury",
            CarType::Truck => "truck",
            CarType::Coupe => "coupe",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "sedan" => Some(CarType::Sedan),
            "SUV" => Some(CarType::Suv),
            "hatchback" => Some(CarType::Hatchback),
            "luxury" => Some(CarType::Luxury),
            "truck" => Some(CarType::Truck),
            "coupe" => Some(CarType::Coupe),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingStatus {
    Pending,
    Confirmed,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 5] = [
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::InProgress,
        BookingStatus::Completed,
        BookingStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "Pending",
            BookingStatus::Confirmed => "Confirmed",
            BookingStatus::InProgress => "In Progress",
            BookingStatus::Completed => "Completed",
            BookingStatus::Cancelled => "Cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Pending" => Some(BookingStatus::Pending),
            "Confirmed" => Some(BookingStatus::Confirmed),
            "In Progress" => Some(BookingStatus::InProgress),
            "Completed" => Some(BookingStatus::Completed),
            "Cancelled" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddOn {
    #[serde(rename = "Interior Cleaning")]
    InteriorCleaning,
    #[serde(rename = "Polishing")]
    Polishing,
    #[serde(rename = "Wax Protection")]
    WaxProtection,
    #[serde(rename = "Tire Shine")]
    TireShine,
    #[serde(rename = "Air Freshener")]
    AirFreshener,
}

impl AddOn {
    pub const ALL: [AddOn; 5] = [
        AddOn::InteriorCleaning,
        AddOn::Polishing,
        AddOn::WaxProtection,
        AddOn::TireShine,
        AddOn::AirFreshener,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AddOn::InteriorCleaning => "Interior Cleaning",
            AddOn::Polishing => "Polishing",
            AddOn::WaxProtection => "Wax Protection",
            AddOn::TireShine => "Tire Shine",
            AddOn::AirFreshener => "Air Freshener",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Interior Cleaning" => Some(AddOn::InteriorCleaning),
            "Polishing" => Some(AddOn::Polishing),
            "Wax Protection" => Some(AddOn::WaxProtection),
            "Tire Shine" => Some(AddOn::TireShine),
            "Air Freshener" => Some(AddOn::AirFreshener),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarDetails {
    pub make: String,
    pub model: String,
    pub year: i64,
    #[serde(rename = "type")]
    pub car_type: CarType,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    pub customer_name: String,
    pub car_details: CarDetails,
    pub service_type: ServiceType,
    pub date: NaiveDate,
    pub time_slot: String,
    pub duration: i64,
    pub price: f64,
    pub status: BookingStatus,
    pub rating: Option<i64>,
    pub add_ons: Vec<AddOn>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Ids are 24 lowercase hex characters, the same shape as a document-store
/// object id, derived from a v4 UUID.
pub fn new_booking_id() -> String {
    let hex = uuid::Uuid::new_v4().simple().to_string();
    hex[..24].to_string()
}

pub fn is_valid_booking_id(id: &str) -> bool {
    id.len() == 24 && id.bytes().all(|b| b.is_ascii_hexdigit())
}

// ── Request bodies ──
//
// Fields arrive loosely typed so validation can report every bad field at
// once instead of failing on the first deserialization error. Client-supplied
// `price` and `duration` are ignored entirely; both are always derived from
// the service type and add-ons.

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarDetailsInput {
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<serde_json::Value>,
    #[serde(rename = "type")]
    pub car_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBooking {
    pub customer_name: Option<String>,
    pub car_details: Option<CarDetailsInput>,
    pub service_type: Option<String>,
    pub date: Option<String>,
    pub time_slot: Option<String>,
    pub status: Option<String>,
    pub rating: Option<serde_json::Value>,
    pub add_ons: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBooking {
    pub customer_name: Option<String>,
    pub car_details: Option<CarDetailsInput>,
    pub service_type: Option<String>,
    pub date: Option<String>,
    pub time_slot: Option<String>,
    pub status: Option<String>,
    pub rating: Option<serde_json::Value>,
    pub add_ons: Option<Vec<String>>,
}
