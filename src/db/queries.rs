use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, Row};
use serde::Serialize;

use crate::models::{AddOn, Booking, BookingStatus, CarDetails, CarType, ServiceType};
use crate::services::query::BookingQuery;

const BOOKING_COLUMNS: &str = "id, customer_name, car_make, car_model, car_year, car_type, \
     service_type, date, time_slot, duration, price, status, rating, add_ons, \
     created_at, updated_at";

const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S%.3f";

fn format_datetime(dt: &NaiveDateTime) -> String {
    dt.format(DATETIME_FMT).to_string()
}

fn parse_datetime(idx: usize, s: &str) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn booking_from_row(row: &Row) -> rusqlite::Result<Booking> {
    let date_str: String = row.get(7)?;
    let status_str: String = row.get(11)?;
    let add_ons_json: String = row.get(13)?;
    let created_at_str: String = row.get(14)?;
    let updated_at_str: String = row.get(15)?;

    let service_type_str: String = row.get(6)?;
    let car_type_str: String = row.get(5)?;

    Ok(Booking {
        id: row.get(0)?,
        customer_name: row.get(1)?,
        car_details: CarDetails {
            make: row.get(2)?,
            model: row.get(3)?,
            year: row.get(4)?,
            car_type: CarType::parse(&car_type_str).unwrap_or(CarType::Sedan),
        },
        service_type: ServiceType::parse(&service_type_str).unwrap_or(ServiceType::BasicWash),
        date: NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e))
        })?,
        time_slot: row.get(8)?,
        duration: row.get(9)?,
        price: row.get(10)?,
        status: BookingStatus::parse(&status_str).unwrap_or(BookingStatus::Pending),
        rating: row.get(12)?,
        add_ons: serde_json::from_str::<Vec<AddOn>>(&add_ons_json).unwrap_or_default(),
        created_at: parse_datetime(14, &created_at_str)?,
        updated_at: parse_datetime(15, &updated_at_str)?,
    })
}

pub fn insert_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO bookings (id, customer_name, car_make, car_model, car_year, car_type, \
         service_type, date, time_slot, duration, price, status, rating, add_ons, \
         created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
        params![
            booking.id,
            booking.customer_name,
            booking.car_details.make,
            booking.car_details.model,
            booking.car_details.year,
            booking.car_details.car_type.as_str(),
            booking.service_type.as_str(),
            booking.date.format("%Y-%m-%d").to_string(),
            booking.time_slot,
            booking.duration,
            booking.price,
            booking.status.as_str(),
            booking.rating,
            serde_json::to_string(&booking.add_ons)?,
            format_datetime(&booking.created_at),
            format_datetime(&booking.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_booking(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"
    ))?;

    match stmt.query_row(params![id], booking_from_row) {
        Ok(booking) => Ok(Some(booking)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn update_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<bool> {
    let updated = conn.execute(
        "UPDATE bookings SET customer_name = ?1, car_make = ?2, car_model = ?3, \
         car_year = ?4, car_type = ?5, service_type = ?6, date = ?7, time_slot = ?8, \
         duration = ?9, price = ?10, status = ?11, rating = ?12, add_ons = ?13, \
         updated_at = ?14
         WHERE id = ?15",
        params![
            booking.customer_name,
            booking.car_details.make,
            booking.car_details.model,
            booking.car_details.year,
            booking.car_details.car_type.as_str(),
            booking.service_type.as_str(),
            booking.date.format("%Y-%m-%d").to_string(),
            booking.time_slot,
            booking.duration,
            booking.price,
            booking.status.as_str(),
            booking.rating,
            serde_json::to_string(&booking.add_ons)?,
            format_datetime(&booking.updated_at),
            booking.id,
        ],
    )?;
    Ok(updated > 0)
}

pub fn delete_booking(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let deleted = conn.execute("DELETE FROM bookings WHERE id = ?1", params![id])?;
    Ok(deleted > 0)
}

pub fn set_rating(
    conn: &Connection,
    id: &str,
    rating: i64,
    updated_at: &NaiveDateTime,
) -> anyhow::Result<bool> {
    let updated = conn.execute(
        "UPDATE bookings SET rating = ?1, updated_at = ?2 WHERE id = ?3",
        params![rating, format_datetime(updated_at), id],
    )?;
    Ok(updated > 0)
}

/// Run the validated query: one page of matching rows plus the total count
/// for the same predicate.
pub fn list_bookings(
    conn: &Connection,
    query: &BookingQuery,
) -> anyhow::Result<(Vec<Booking>, i64)> {
    let (where_sql, values) = query.filter_sql();

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM bookings {where_sql}"),
        params_from_iter(values.iter()),
        |row| row.get(0),
    )?;

    let sql = format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings {where_sql} {} LIMIT ? OFFSET ?",
        query.order_sql()
    );
    let mut stmt = conn.prepare(&sql)?;

    let mut bind = values;
    bind.push(SqlValue::Integer(query.limit));
    bind.push(SqlValue::Integer(query.skip()));

    let rows = stmt.query_map(params_from_iter(bind.iter()), booking_from_row)?;

    let mut bookings = Vec::new();
    for row in rows {
        bookings.push(row?);
    }
    Ok((bookings, total))
}

#[derive(Debug, Serialize)]
pub struct Distribution {
    pub value: String,
    pub count: i64,
}

#[derive(Debug)]
pub struct BookingStats {
    pub total_bookings: i64,
    pub status_distribution: Vec<Distribution>,
    pub service_type_distribution: Vec<Distribution>,
    pub car_type_distribution: Vec<Distribution>,
    pub average_price: f64,
    pub min_price: f64,
    pub max_price: f64,
}

fn distribution(conn: &Connection, column: &str) -> anyhow::Result<Vec<Distribution>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {column}, COUNT(*) AS n FROM bookings GROUP BY {column} ORDER BY n DESC, {column} ASC"
    ))?;
    let rows = stmt.query_map([], |row| {
        Ok(Distribution {
            value: row.get(0)?,
            count: row.get(1)?,
        })
    })?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

pub fn booking_stats(conn: &Connection) -> anyhow::Result<BookingStats> {
    let total_bookings: i64 =
        conn.query_row("SELECT COUNT(*) FROM bookings", [], |row| row.get(0))?;

    let (average_price, min_price, max_price) = conn.query_row(
        "SELECT COALESCE(AVG(price), 0), COALESCE(MIN(price), 0), COALESCE(MAX(price), 0) \
         FROM bookings",
        [],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
    )?;

    Ok(BookingStats {
        total_bookings,
        status_distribution: distribution(conn, "status")?,
        service_type_distribution: distribution(conn, "service_type")?,
        car_type_distribution: distribution(conn, "car_type")?,
        average_price,
        min_price,
        max_price,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::new_booking_id;
    use crate::services::pricing;
    use chrono::Utc;

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    fn make_booking(name: &str, service: ServiceType, status: BookingStatus) -> Booking {
        let now = Utc::now().naive_utc();
        Booking {
            id: new_booking_id(),
            customer_name: name.to_string(),
            car_details: CarDetails {
                make: "Toyota".to_string(),
                model: "Camry".to_string(),
                year: 2021,
                car_type: CarType::Sedan,
            },
            service_type: service,
            date: NaiveDate::from_ymd_opt(2030, 6, 15).unwrap(),
            time_slot: "10:00-11:00".to_string(),
            duration: pricing::service_duration(service),
            price: pricing::total_price(service, &[]),
            status,
            rating: None,
            add_ons: vec![],
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_insert_and_get_round_trip() {
        let conn = setup_db();
        let mut booking = make_booking("Alice", ServiceType::DeluxeWash, BookingStatus::Pending);
        booking.add_ons = vec![AddOn::TireShine, AddOn::WaxProtection];
        booking.price = pricing::total_price(booking.service_type, &booking.add_ons);
        insert_booking(&conn, &booking).unwrap();

        let fetched = get_booking(&conn, &booking.id).unwrap().unwrap();
        assert_eq!(fetched.customer_name, "Alice");
        assert_eq!(fetched.service_type, ServiceType::DeluxeWash);
        assert_eq!(fetched.add_ons, vec![AddOn::TireShine, AddOn::WaxProtection]);
        assert_eq!(fetched.price, 50.0);
        assert_eq!(fetched.rating, None);
    }

    #[test]
    fn test_corrupt_timestamp_is_an_error() {
        let conn = setup_db();
        let booking = make_booking("Alice", ServiceType::BasicWash, BookingStatus::Pending);
        insert_booking(&conn, &booking).unwrap();

        conn.execute(
            "UPDATE bookings SET created_at = 'garbage' WHERE id = ?1",
            params![booking.id],
        )
        .unwrap();

        assert!(get_booking(&conn, &booking.id).is_err());
    }

    #[test]
    fn test_get_missing_returns_none() {
        let conn = setup_db();
        assert!(get_booking(&conn, "507f1f77bcf86cd799439011")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_delete_is_idempotent_reporting() {
        let conn = setup_db();
        let booking = make_booking("Alice", ServiceType::BasicWash, BookingStatus::Pending);
        insert_booking(&conn, &booking).unwrap();

        assert!(delete_booking(&conn, &booking.id).unwrap());
        assert!(!delete_booking(&conn, &booking.id).unwrap());
    }

    #[test]
    fn test_set_rating() {
        let conn = setup_db();
        let booking = make_booking("Alice", ServiceType::BasicWash, BookingStatus::Completed);
        insert_booking(&conn, &booking).unwrap();

        assert!(set_rating(&conn, &booking.id, 4, &Utc::now().naive_utc()).unwrap());
        let fetched = get_booking(&conn, &booking.id).unwrap().unwrap();
        assert_eq!(fetched.rating, Some(4));
    }

    #[test]
    fn test_list_with_filters_and_count() {
        let conn = setup_db();
        insert_booking(
            &conn,
            &make_booking("Alice", ServiceType::BasicWash, BookingStatus::Pending),
        )
        .unwrap();
        insert_booking(
            &conn,
            &make_booking("Bob", ServiceType::DeluxeWash, BookingStatus::Completed),
        )
        .unwrap();
        insert_booking(
            &conn,
            &make_booking("Carol", ServiceType::FullDetailing, BookingStatus::Completed),
        )
        .unwrap();

        let query = BookingQuery::from_params(&[(
            "status".to_string(),
            "Completed".to_string(),
        )])
        .unwrap();
        let (bookings, total) = list_bookings(&conn, &query).unwrap();
        assert_eq!(total, 2);
        assert_eq!(bookings.len(), 2);

        // Price bounds are inclusive.
        let query = BookingQuery::from_params(&[
            ("minPrice".to_string(), "15".to_string()),
            ("maxPrice".to_string(), "25".to_string()),
        ])
        .unwrap();
        let (bookings, total) = list_bookings(&conn, &query).unwrap();
        assert_eq!(total, 2);
        assert!(bookings.iter().all(|b| b.price >= 15.0 && b.price <= 25.0));
    }

    #[test]
    fn test_list_sorting_and_window() {
        let conn = setup_db();
        for (name, service) in [
            ("Alice", ServiceType::FullDetailing),
            ("Bob", ServiceType::BasicWash),
            ("Carol", ServiceType::DeluxeWash),
        ] {
            insert_booking(&conn, &make_booking(name, service, BookingStatus::Pending)).unwrap();
        }

        let query = BookingQuery::from_params(&[
            ("sortBy".to_string(), "price".to_string()),
            ("sortOrder".to_string(), "asc".to_string()),
        ])
        .unwrap();
        let (bookings, _) = list_bookings(&conn, &query).unwrap();
        let prices: Vec<f64> = bookings.iter().map(|b| b.price).collect();
        assert_eq!(prices, vec![15.0, 25.0, 50.0]);

        // A window past the end yields no rows but the true total.
        let query = BookingQuery::from_params(&[
            ("page".to_string(), "999".to_string()),
            ("limit".to_string(), "10".to_string()),
        ])
        .unwrap();
        let (bookings, total) = list_bookings(&conn, &query).unwrap();
        assert!(bookings.is_empty());
        assert_eq!(total, 3);
    }

    #[test]
    fn test_search_matches_make_case_insensitively() {
        let conn = setup_db();
        let mut booking = make_booking("Dave", ServiceType::BasicWash, BookingStatus::Pending);
        booking.car_details.make = "BMW".to_string();
        insert_booking(&conn, &booking).unwrap();
        insert_booking(
            &conn,
            &make_booking("Erin", ServiceType::BasicWash, BookingStatus::Pending),
        )
        .unwrap();

        let query =
            BookingQuery::from_params(&[("q".to_string(), "bmw".to_string())]).unwrap();
        let (bookings, total) = list_bookings(&conn, &query).unwrap();
        assert_eq!(total, 1);
        assert_eq!(bookings[0].car_details.make, "BMW");
    }

    #[test]
    fn test_stats_aggregation() {
        let conn = setup_db();
        insert_booking(
            &conn,
            &make_booking("Alice", ServiceType::BasicWash, BookingStatus::Pending),
        )
        .unwrap();
        insert_booking(
            &conn,
            &make_booking("Bob", ServiceType::BasicWash, BookingStatus::Completed),
        )
        .unwrap();
        insert_booking(
            &conn,
            &make_booking("Carol", ServiceType::FullDetailing, BookingStatus::Completed),
        )
        .unwrap();

        let stats = booking_stats(&conn).unwrap();
        assert_eq!(stats.total_bookings, 3);
        assert_eq!(stats.min_price, 15.0);
        assert_eq!(stats.max_price, 50.0);
        assert!((stats.average_price - 80.0 / 3.0).abs() < 1e-9);

        assert_eq!(stats.status_distribution[0].value, "Completed");
        assert_eq!(stats.status_distribution[0].count, 2);
        assert_eq!(stats.service_type_distribution[0].value, "Basic Wash");
        assert_eq!(stats.car_type_distribution[0].value, "sedan");
    }

    #[test]
    fn test_stats_on_empty_store() {
        let conn = setup_db();
        let stats = booking_stats(&conn).unwrap();
        assert_eq!(stats.total_bookings, 0);
        assert_eq!(stats.average_price, 0.0);
        assert_eq!(stats.min_price, 0.0);
        assert_eq!(stats.max_price, 0.0);
        assert!(stats.status_distribution.is_empty());
    }
}
