use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Query for location-based lookups (`/branches/best`, `/branches/near`)
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LocationQuery {
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = 1, max = 100))]
    pub k: Option<u16>,
}

/// Point a single branch's distance is measured from
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OriginQuery {
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
}

/// Day whose free booking slots are requested
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotsQuery {
    pub date: NaiveDate,
}

/// Query for the service-filtered nearby search
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AvailableBranchesQuery {
    pub service_id: i64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = 1, max = 100))]
    pub max_results: Option<u16>,
}

/// Map viewport query
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_viewport"))]
pub struct BoundingBoxQuery {
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude_min: f64,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude_min: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude_max: f64,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude_max: f64,
}

fn validate_viewport(query: &BoundingBoxQuery) -> Result<(), ValidationError> {
    if query.longitude_min > query.longitude_max || query.latitude_min > query.latitude_max {
        return Err(ValidationError::new("inverted_bounding_box"));
    }
    Ok(())
}

/// Request to book a reservation at an office
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BookReservationRequest {
    #[serde(alias = "office_id", rename = "officeId")]
    pub office_id: i64,
    pub date: NaiveDate,
    pub time: NaiveTime,
    #[serde(alias = "service_id", rename = "serviceId")]
    pub service_id: i64,
}

/// Request to receive a reminder for a reservation
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NotifyRequest {
    #[validate(length(min = 5, max = 32))]
    #[serde(alias = "phone_number", rename = "phoneNumber")]
    pub phone_number: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_query_rejects_out_of_range() {
        let query = LocationQuery { longitude: 200.0, latitude: 10.0, k: None };
        assert!(query.validate().is_err());

        let query = LocationQuery { longitude: 37.6, latitude: 55.7, k: Some(0) };
        assert!(query.validate().is_err());

        let query = LocationQuery { longitude: 37.6, latitude: 55.7, k: Some(5) };
        assert!(query.validate().is_ok());
    }

    #[test]
    fn test_origin_query_from_url() {
        let query = actix_web::web::Query::<OriginQuery>::from_query("longitude=37.6173&latitude=55.7558")
            .unwrap()
            .into_inner();
        assert_eq!(query.latitude, 55.7558);
        assert!(query.validate().is_ok());

        let query = OriginQuery { longitude: 37.6, latitude: -91.0 };
        assert!(query.validate().is_err());
    }

    #[test]
    fn test_inverted_viewport_rejected() {
        let query = BoundingBoxQuery {
            longitude_min: 38.0,
            latitude_min: 55.0,
            longitude_max: 37.0,
            latitude_max: 56.0,
        };
        assert!(query.validate().is_err());
    }

    #[test]
    fn test_book_request_accepts_both_casings() {
        let camel: BookReservationRequest = serde_json::from_str(
            r#"{"officeId": 1, "date": "2024-05-01", "time": "10:30:00", "serviceId": 4}"#,
        )
        .unwrap();
        let snake: BookReservationRequest = serde_json::from_str(
            r#"{"office_id": 1, "date": "2024-05-01", "time": "10:30:00", "service_id": 4}"#,
        )
        .unwrap();
        assert_eq!(camel.office_id, snake.office_id);
        assert_eq!(camel.service_id, 4);
    }
}
