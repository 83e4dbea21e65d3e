use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde_json::json;

use crate::db::queries;
use crate::errors::{ApiError, ApiJson};
use crate::models::{
    is_valid_booking_id, new_booking_id, AddOn, Booking, BookingStatus, CarType, CreateBooking,
    ServiceType, UpdateBooking, TIME_SLOTS,
};
use crate::services::pricing;
use crate::services::query::BookingQuery;
use crate::services::validation;
use crate::state::AppState;

/// Raw (key, value) pairs; multi-value filters arrive as repeated keys.
type QueryPairs = Query<Vec<(String, String)>>;

fn check_id(id: &str) -> Result<(), ApiError> {
    if is_valid_booking_id(id) {
        Ok(())
    } else {
        Err(ApiError::InvalidIdFormat)
    }
}

fn pagination_json(page: i64, limit: i64, total: i64) -> serde_json::Value {
    let total_pages = if total == 0 { 0 } else { (total + limit - 1) / limit };
    json!({
        "currentPage": page,
        "totalPages": total_pages,
        "totalCount": total,
        "hasNextPage": page < total_pages,
        "hasPrevPage": page > 1,
        "limit": limit,
    })
}

// POST /api/bookings
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<CreateBooking>,
) -> Result<impl IntoResponse, ApiError> {
    let new = validation::validate_create(&body).map_err(ApiError::Validation)?;

    // Price and duration are always derived server-side; any client-supplied
    // values were never deserialized in the first place.
    let price = pricing::total_price(new.service_type, &new.add_ons);
    let duration = pricing::service_duration(new.service_type);
    let now = Utc::now().naive_utc();

    let booking = Booking {
        id: new_booking_id(),
        customer_name: new.customer_name,
        car_details: new.car_details,
        service_type: new.service_type,
        date: new.date,
        time_slot: new.time_slot,
        duration,
        price,
        status: new.status,
        rating: new.rating,
        add_ons: new.add_ons,
        created_at: now,
        updated_at: now,
    };

    {
        let db = state.db.lock().unwrap();
        queries::insert_booking(&db, &booking).map_err(|e| {
            ApiError::internal("CREATE_BOOKING_ERROR", "Failed to create booking", e)
        })?;
    }

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": booking,
            "message": "Booking created successfully",
        })),
    ))
}

// GET /api/bookings
pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    Query(params): QueryPairs,
) -> Result<impl IntoResponse, ApiError> {
    let query = BookingQuery::from_params(&params)?;

    let (bookings, total) = {
        let db = state.db.lock().unwrap();
        queries::list_bookings(&db, &query).map_err(|e| {
            ApiError::internal("FETCH_BOOKINGS_ERROR", "Failed to fetch bookings", e)
        })?
    };

    Ok(Json(json!({
        "success": true,
        "data": bookings,
        "pagination": pagination_json(query.page, query.limit, total),
    })))
}

// GET /api/bookings/:id
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    check_id(&id)?;

    let booking = {
        let db = state.db.lock().unwrap();
        queries::get_booking(&db, &id).map_err(|e| {
            ApiError::internal("FETCH_BOOKING_ERROR", "Failed to fetch booking", e)
        })?
    }
    .ok_or(ApiError::BookingNotFound)?;

    Ok(Json(json!({ "success": true, "data": booking })))
}

// PUT /api/bookings/:id
pub async fn update_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdateBooking>,
) -> Result<impl IntoResponse, ApiError> {
    check_id(&id)?;

    let db = state.db.lock().unwrap();

    let existing = queries::get_booking(&db, &id)
        .map_err(|e| ApiError::internal("UPDATE_BOOKING_ERROR", "Failed to update booking", e))?
        .ok_or(ApiError::BookingNotFound)?;

    let mut merged = validation::validate_update(&existing, &body).map_err(ApiError::Validation)?;
    merged.updated_at = Utc::now().naive_utc();

    queries::update_booking(&db, &merged)
        .map_err(|e| ApiError::internal("UPDATE_BOOKING_ERROR", "Failed to update booking", e))?;

    Ok(Json(json!({
        "success": true,
        "data": merged,
        "message": "Booking updated successfully",
    })))
}

// DELETE /api/bookings/:id
pub async fn delete_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    check_id(&id)?;

    let deleted = {
        let db = state.db.lock().unwrap();
        queries::delete_booking(&db, &id).map_err(|e| {
            ApiError::internal("DELETE_BOOKING_ERROR", "Failed to delete booking", e)
        })?
    };

    if !deleted {
        return Err(ApiError::BookingNotFound);
    }

    Ok(Json(json!({
        "success": true,
        "message": "Booking deleted successfully",
        "data": { "id": id },
    })))
}

// GET /api/bookings/search?q=
pub async fn search_bookings(
    State(state): State<Arc<AppState>>,
    Query(params): QueryPairs,
) -> Result<impl IntoResponse, ApiError> {
    let term = params
        .iter()
        .find(|(k, _)| k == "q")
        .map(|(_, v)| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ApiError::SearchTermRequired)?;

    let query = BookingQuery::from_params(&params)?;

    let (bookings, total) = {
        let db = state.db.lock().unwrap();
        queries::list_bookings(&db, &query)
            .map_err(|e| ApiError::internal("SEARCH_ERROR", "Search failed", e))?
    };

    Ok(Json(json!({
        "success": true,
        "data": bookings,
        "searchTerm": term,
        "pagination": pagination_json(query.page, query.limit, total),
    })))
}

// GET /api/bookings/filter
pub async fn filter_bookings(
    State(state): State<Arc<AppState>>,
    Query(params): QueryPairs,
) -> Result<impl IntoResponse, ApiError> {
    let query = BookingQuery::from_params(&params)?;

    let (bookings, total) = {
        let db = state.db.lock().unwrap();
        queries::list_bookings(&db, &query)
            .map_err(|e| ApiError::internal("FILTER_ERROR", "Filter operation failed", e))?
    };

    Ok(Json(json!({
        "success": true,
        "data": bookings,
        "filters": applied_filters(&query),
        "pagination": pagination_json(query.page, query.limit, total),
    })))
}

/// Echo of the filters actually applied, null for anything not supplied.
fn applied_filters(query: &BookingQuery) -> serde_json::Value {
    fn list_or_null<T>(items: &[T], f: impl Fn(&T) -> serde_json::Value) -> serde_json::Value {
        if items.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::Value::Array(items.iter().map(f).collect())
        }
    }

    json!({
        "serviceType": list_or_null(&query.service_types, |s| json!(s.as_str())),
        "carType": list_or_null(&query.car_types, |c| json!(c.as_str())),
        "status": list_or_null(&query.statuses, |s| json!(s.as_str())),
        "rating": list_or_null(&query.ratings, |r| json!(r)),
        "dateFrom": query.date_from.map(|d| d.format("%Y-%m-%d").to_string()),
        "dateTo": query.date_to.map(|d| d.format("%Y-%m-%d").to_string()),
        "minPrice": query.min_price,
        "maxPrice": query.max_price,
        "sortBy": query.sort_key.as_str(),
        "sortOrder": query.sort_order.as_str(),
    })
}

// PATCH /api/bookings/:id/rating
pub async fn rate_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<serde_json::Value>,
) -> Result<impl IntoResponse, ApiError> {
    check_id(&id)?;

    let rating = body
        .get("rating")
        .and_then(|v| v.as_i64())
        .filter(|r| (1..=5).contains(r))
        .ok_or(ApiError::InvalidRating)?;

    let db = state.db.lock().unwrap();

    let mut booking = queries::get_booking(&db, &id)
        .map_err(|e| ApiError::internal("UPDATE_RATING_ERROR", "Failed to update rating", e))?
        .ok_or(ApiError::BookingNotFound)?;

    if booking.status != BookingStatus::Completed {
        return Err(ApiError::BookingNotCompleted);
    }

    booking.rating = Some(rating);
    booking.updated_at = Utc::now().naive_utc();

    queries::set_rating(&db, &id, rating, &booking.updated_at)
        .map_err(|e| ApiError::internal("UPDATE_RATING_ERROR", "Failed to update rating", e))?;

    Ok(Json(json!({
        "success": true,
        "data": booking,
        "message": "Rating updated successfully",
    })))
}

// GET /api/bookings/stats
pub async fn booking_stats(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let stats = {
        let db = state.db.lock().unwrap();
        queries::booking_stats(&db).map_err(|e| {
            ApiError::internal("STATS_ERROR", "Failed to fetch booking statistics", e)
        })?
    };

    Ok(Json(json!({
        "success": true,
        "data": {
            "totalBookings": stats.total_bookings,
            "statusDistribution": stats.status_distribution,
            "serviceTypeDistribution": stats.service_type_distribution,
            "carTypeDistribution": stats.car_type_distribution,
            "averagePrice": stats.average_price,
            "priceRange": { "minPrice": stats.min_price, "maxPrice": stats.max_price },
            "availableFilters": {
                "serviceTypes": ServiceType::ALL.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
                "carTypes": CarType::ALL.iter().map(|c| c.as_str()).collect::<Vec<_>>(),
                "statuses": BookingStatus::ALL.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
                "addOns": AddOn::ALL.iter().map(|a| a.as_str()).collect::<Vec<_>>(),
                "timeSlots": TIME_SLOTS,
                "ratings": [1, 2, 3, 4, 5],
                "sortOptions": ["newest", "price", "duration", "status", "date", "rating"],
            },
        },
    })))
}
