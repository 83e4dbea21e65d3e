pub mod booking;

pub use booking::{
    is_valid_booking_id, new_booking_id, AddOn, Booking, BookingStatus, CarDetails,
    CarDetailsInput, CarType, CreateBooking, ServiceType, UpdateBooking, TIME_SLOTS,
};
