use chrono::NaiveDate;
use rusqlite::types::Value as SqlValue;

use crate::errors::ApiError;
use crate::models::{BookingStatus, CarType, ServiceType};
use crate::services::validation::parse_date;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    CreatedAt,
    Price,
    Duration,
    Status,
    Date,
    Rating,
}

impl SortKey {
    fn column(self) -> &'static str {
        match self {
            SortKey::CreatedAt => "created_at",
            SortKey::Price => "price",
            SortKey::Duration => "duration",
            SortKey::Status => "status",
            SortKey::Date => "date",
            SortKey::Rating => "rating",
        }
    }

    /// The external name, as echoed back in filter responses.
    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::CreatedAt => "newest",
            SortKey::Price => "price",
            SortKey::Duration => "duration",
            SortKey::Status => "status",
            SortKey::Date => "date",
            SortKey::Rating => "rating",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// A fully validated listing request: an AND-combined predicate, a single
/// sort key, and a pagination window. Built entirely before any query runs,
/// so a query is never partially applied.
#[derive(Debug)]
pub struct BookingQuery {
    pub service_types: Vec<ServiceType>,
    pub car_types: Vec<CarType>,
    pub statuses: Vec<BookingStatus>,
    pub ratings: Vec<i64>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub search: Option<String>,
    pub sort_key: SortKey,
    pub sort_order: SortOrder,
    pub page: i64,
    pub limit: i64,
}

impl BookingQuery {
    /// Parse raw query pairs. Multi-value filters accept both repeated keys
    /// (`status=Pending&status=Confirmed`) and comma-separated lists.
    pub fn from_params(params: &[(String, String)]) -> Result<Self, ApiError> {
        let service_types = parse_enum_list(params, "serviceType", "service type", ServiceType::parse)?;
        let car_types = parse_enum_list(params, "carType", "car type", CarType::parse)?;
        let statuses = parse_enum_list(params, "status", "status", BookingStatus::parse)?;

        let mut ratings = Vec::new();
        for raw in values_for(params, "rating") {
            let rating = raw
                .parse::<i64>()
                .ok()
                .filter(|r| (1..=5).contains(r))
                .ok_or_else(|| {
                    ApiError::InvalidFilterValue(format!("Invalid rating(s): {raw}"))
                })?;
            if !ratings.contains(&rating) {
                ratings.push(rating);
            }
        }

        let date_from = parse_date_param(params, "dateFrom")?;
        let date_to = parse_date_param(params, "dateTo")?;

        let min_price = parse_price_param(params, "minPrice")?;
        let max_price = parse_price_param(params, "maxPrice")?;
        if let (Some(min), Some(max)) = (min_price, max_price) {
            if min > max {
                return Err(ApiError::InvalidPriceRange(
                    "minPrice cannot be greater than maxPrice".to_string(),
                ));
            }
        }

        // `q` (search endpoint) and `search` (list endpoint) are the same
        // filter; both match the same canonical field set.
        let search = first_value(params, "q")
            .or_else(|| first_value(params, "search"))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let sort_key = match first_value(params, "sortBy") {
            None => SortKey::CreatedAt,
            Some(raw) => match raw.as_str() {
                "newest" | "createdAt" => SortKey::CreatedAt,
                "price" => SortKey::Price,
                "duration" => SortKey::Duration,
                "status" => SortKey::Status,
                "date" => SortKey::Date,
                "rating" => SortKey::Rating,
                _ => {
                    return Err(ApiError::InvalidSortField(
                        "Invalid sort field. Must be one of: newest, price, duration, status, date, rating, createdAt"
                            .to_string(),
                    ))
                }
            },
        };

        let sort_order = match first_value(params, "sortOrder") {
            None => SortOrder::Desc,
            Some(raw) => match raw.as_str() {
                "asc" => SortOrder::Asc,
                "desc" => SortOrder::Desc,
                _ => {
                    return Err(ApiError::InvalidSortOrder(
                        "Invalid sort order. Must be one of: asc, desc".to_string(),
                    ))
                }
            },
        };

        let page = match first_value(params, "page") {
            None => DEFAULT_PAGE,
            Some(raw) => raw.parse::<i64>().ok().filter(|p| *p >= 1).ok_or_else(|| {
                ApiError::InvalidPagination("Page must be a positive integer".to_string())
            })?,
        };

        let limit = match first_value(params, "limit") {
            None => DEFAULT_LIMIT,
            Some(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|l| (1..=MAX_LIMIT).contains(l))
                .ok_or_else(|| {
                    ApiError::InvalidPagination(
                        "Limit must be a positive integer between 1 and 100".to_string(),
                    )
                })?,
        };

        Ok(BookingQuery {
            service_types,
            car_types,
            statuses,
            ratings,
            date_from,
            date_to,
            min_price,
            max_price,
            search,
            sort_key,
            sort_order,
            page,
            limit,
        })
    }

    /// Render the predicate as a `WHERE` clause (empty string when there are
    /// no filters) plus its bind values, in order.
    pub fn filter_sql(&self) -> (String, Vec<SqlValue>) {
        let mut clauses: Vec<String> = Vec::new();
        let mut values: Vec<SqlValue> = Vec::new();

        if !self.service_types.is_empty() {
            clauses.push(format!(
                "service_type IN ({})",
                placeholders(self.service_types.len())
            ));
            values.extend(
                self.service_types
                    .iter()
                    .map(|s| SqlValue::Text(s.as_str().to_string())),
            );
        }

        if !self.car_types.is_empty() {
            clauses.push(format!("car_type IN ({})", placeholders(self.car_types.len())));
            values.extend(
                self.car_types
                    .iter()
                    .map(|c| SqlValue::Text(c.as_str().to_string())),
            );
        }

        if !self.statuses.is_empty() {
            clauses.push(format!("status IN ({})", placeholders(self.statuses.len())));
            values.extend(
                self.statuses
                    .iter()
                    .map(|s| SqlValue::Text(s.as_str().to_string())),
            );
        }

        if !self.ratings.is_empty() {
            clauses.push(format!("rating IN ({})", placeholders(self.ratings.len())));
            values.extend(self.ratings.iter().map(|r| SqlValue::Integer(*r)));
        }

        if let Some(from) = self.date_from {
            clauses.push("date >= ?".to_string());
            values.push(SqlValue::Text(from.format("%Y-%m-%d").to_string()));
        }
        if let Some(to) = self.date_to {
            clauses.push("date <= ?".to_string());
            values.push(SqlValue::Text(to.format("%Y-%m-%d").to_string()));
        }

        if let Some(min) = self.min_price {
            clauses.push("price >= ?".to_string());
            values.push(SqlValue::Real(min));
        }
        if let Some(max) = self.max_price {
            clauses.push("price <= ?".to_string());
            values.push(SqlValue::Real(max));
        }

        if let Some(term) = &self.search {
            let pattern = format!("%{}%", escape_like(&term.to_lowercase()));
            clauses.push(
                "(LOWER(customer_name) LIKE ? ESCAPE '\\' \
                 OR LOWER(car_make) LIKE ? ESCAPE '\\' \
                 OR LOWER(car_model) LIKE ? ESCAPE '\\' \
                 OR LOWER(car_type) LIKE ? ESCAPE '\\')"
                    .to_string(),
            );
            for _ in 0..4 {
                values.push(SqlValue::Text(pattern.clone()));
            }
        }

        if clauses.is_empty() {
            (String::new(), values)
        } else {
            (format!("WHERE {}", clauses.join(" AND ")), values)
        }
    }

    pub fn order_sql(&self) -> String {
        let direction = match self.sort_order {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        };
        format!("ORDER BY {} {}", self.sort_key.column(), direction)
    }

    /// Saturates rather than wrapping, so an absurdly large page number
    /// lands past the last row instead of at a negative offset.
    pub fn skip(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

fn first_value(params: &[(String, String)], key: &str) -> Option<String> {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.clone())
}

fn values_for(params: &[(String, String)], key: &str) -> Vec<String> {
    params
        .iter()
        .filter(|(k, _)| k == key)
        .flat_map(|(_, v)| v.split(','))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_enum_list<T: Copy + PartialEq>(
    params: &[(String, String)],
    key: &str,
    label: &str,
    parse: fn(&str) -> Option<T>,
) -> Result<Vec<T>, ApiError> {
    let mut out = Vec::new();
    for raw in values_for(params, key) {
        let value = parse(&raw).ok_or_else(|| {
            ApiError::InvalidFilterValue(format!("Invalid {label}(s): {raw}"))
        })?;
        if !out.contains(&value) {
            out.push(value);
        }
    }
    Ok(out)
}

fn parse_date_param(
    params: &[(String, String)],
    key: &str,
) -> Result<Option<NaiveDate>, ApiError> {
    match first_value(params, key) {
        None => Ok(None),
        Some(raw) => parse_date(&raw).map(Some).ok_or_else(|| {
            ApiError::InvalidDateFormat(format!(
                "Invalid {key} format. Use ISO 8601 format (YYYY-MM-DD)"
            ))
        }),
    }
}

fn parse_price_param(params: &[(String, String)], key: &str) -> Result<Option<f64>, ApiError> {
    match first_value(params, key) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<f64>()
            .ok()
            .filter(|p| p.is_finite() && *p >= 0.0)
            .map(Some)
            .ok_or_else(|| {
                ApiError::InvalidPriceRange(format!("{key} must be a non-negative number"))
            }),
    }
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let query = BookingQuery::from_params(&[]).unwrap();
        assert_eq!(query.page, 1);
        assert_eq!(query.limit, 10);
        assert_eq!(query.sort_key, SortKey::CreatedAt);
        assert_eq!(query.sort_order, SortOrder::Desc);
        assert_eq!(query.skip(), 0);
        let (where_sql, values) = query.filter_sql();
        assert!(where_sql.is_empty());
        assert!(values.is_empty());
        assert_eq!(query.order_sql(), "ORDER BY created_at DESC");
    }

    #[test]
    fn test_repeated_keys_and_comma_lists() {
        let query = BookingQuery::from_params(&params(&[
            ("status", "Pending"),
            ("status", "Confirmed"),
            ("serviceType", "Basic Wash,Deluxe Wash"),
        ]))
        .unwrap();
        assert_eq!(query.statuses.len(), 2);
        assert_eq!(query.service_types.len(), 2);

        let (where_sql, values) = query.filter_sql();
        assert!(where_sql.contains("service_type IN (?, ?)"));
        assert!(where_sql.contains("status IN (?, ?)"));
        assert_eq!(values.len(), 4);
    }

    #[test]
    fn test_invalid_filter_values() {
        let err = BookingQuery::from_params(&params(&[("serviceType", "Gold Wash")]))
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_FILTER_VALUE");

        let err = BookingQuery::from_params(&params(&[("carType", "boat")])).unwrap_err();
        assert_eq!(err.code(), "INVALID_FILTER_VALUE");

        let err = BookingQuery::from_params(&params(&[("rating", "6")])).unwrap_err();
        assert_eq!(err.code(), "INVALID_FILTER_VALUE");

        let err = BookingQuery::from_params(&params(&[("rating", "4.5")])).unwrap_err();
        assert_eq!(err.code(), "INVALID_FILTER_VALUE");
    }

    #[test]
    fn test_invalid_dates() {
        let err = BookingQuery::from_params(&params(&[("dateFrom", "15/06/2030")]))
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_DATE_FORMAT");

        let query =
            BookingQuery::from_params(&params(&[("dateFrom", "2030-06-15")])).unwrap();
        assert!(query.date_from.is_some());
    }

    #[test]
    fn test_price_range_validation() {
        let err = BookingQuery::from_params(&params(&[("minPrice", "abc")])).unwrap_err();
        assert_eq!(err.code(), "INVALID_PRICE_RANGE");

        let err = BookingQuery::from_params(&params(&[("maxPrice", "-5")])).unwrap_err();
        assert_eq!(err.code(), "INVALID_PRICE_RANGE");

        let err = BookingQuery::from_params(&params(&[
            ("minPrice", "50"),
            ("maxPrice", "20"),
        ]))
        .unwrap_err();
        assert_eq!(err.code(), "INVALID_PRICE_RANGE");

        let query = BookingQuery::from_params(&params(&[
            ("minPrice", "20"),
            ("maxPrice", "50"),
        ]))
        .unwrap();
        assert_eq!(query.min_price, Some(20.0));
        assert_eq!(query.max_price, Some(50.0));
    }

    #[test]
    fn test_sort_validation() {
        let err = BookingQuery::from_params(&params(&[("sortBy", "color")])).unwrap_err();
        assert_eq!(err.code(), "INVALID_SORT_FIELD");

        let err = BookingQuery::from_params(&params(&[("sortOrder", "up")])).unwrap_err();
        assert_eq!(err.code(), "INVALID_SORT_ORDER");

        // createdAt is an accepted alias of newest.
        let query = BookingQuery::from_params(&params(&[
            ("sortBy", "createdAt"),
            ("sortOrder", "asc"),
        ]))
        .unwrap();
        assert_eq!(query.sort_key, SortKey::CreatedAt);
        assert_eq!(query.order_sql(), "ORDER BY created_at ASC");

        let query = BookingQuery::from_params(&params(&[("sortBy", "price")])).unwrap();
        assert_eq!(query.order_sql(), "ORDER BY price DESC");
    }

    #[test]
    fn test_pagination_validation() {
        let err = BookingQuery::from_params(&params(&[("page", "0")])).unwrap_err();
        assert_eq!(err.code(), "INVALID_PAGINATION");

        let err = BookingQuery::from_params(&params(&[("page", "two")])).unwrap_err();
        assert_eq!(err.code(), "INVALID_PAGINATION");

        let err = BookingQuery::from_params(&params(&[("limit", "101")])).unwrap_err();
        assert_eq!(err.code(), "INVALID_PAGINATION");

        let err = BookingQuery::from_params(&params(&[("limit", "0")])).unwrap_err();
        assert_eq!(err.code(), "INVALID_PAGINATION");

        let query =
            BookingQuery::from_params(&params(&[("page", "3"), ("limit", "25")])).unwrap();
        assert_eq!(query.skip(), 50);
        assert_eq!(query.limit, 25);
    }

    #[test]
    fn test_pagination_offset_saturates_at_i64_max() {
        let query = BookingQuery::from_params(&params(&[
            ("page", "9223372036854775807"),
            ("limit", "100"),
        ]))
        .unwrap();
        assert_eq!(query.skip(), i64::MAX);
    }

    #[test]
    fn test_search_clause_covers_canonical_fields() {
        let query = BookingQuery::from_params(&params(&[("q", "BMW")])).unwrap();
        let (where_sql, values) = query.filter_sql();
        assert!(where_sql.contains("customer_name"));
        assert!(where_sql.contains("car_make"));
        assert!(where_sql.contains("car_model"));
        assert!(where_sql.contains("car_type"));
        assert_eq!(values.len(), 4);
        assert!(matches!(&values[0], SqlValue::Text(t) if t == "%bmw%"));
    }

    #[test]
    fn test_search_escapes_like_wildcards() {
        let query = BookingQuery::from_params(&params(&[("q", "100%")])).unwrap();
        let (_, values) = query.filter_sql();
        assert!(matches!(&values[0], SqlValue::Text(t) if t == "%100\\%%"));
    }

    #[test]
    fn test_blank_search_is_ignored() {
        let query = BookingQuery::from_params(&params(&[("search", "  ")])).unwrap();
        assert_eq!(query.search, None);
    }

    #[test]
    fn test_combined_filters_joined_with_and() {
        let query = BookingQuery::from_params(&params(&[
            ("status", "Completed"),
            ("minPrice", "20"),
            ("maxPrice", "50"),
            ("dateFrom", "2030-01-01"),
            ("rating", "4,5"),
        ]))
        .unwrap();
        let (where_sql, values) = query.filter_sql();
        assert_eq!(where_sql.matches(" AND ").count(), 4);
        assert_eq!(values.len(), 6);
    }
}
