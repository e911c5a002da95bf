use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use super::itinerary::{format_hm, ItineraryItem, SkippedEntry};
use super::repo::{Trip, TripDay, TripFood, TripPlace};

#[derive(Debug, Deserialize)]
pub struct TripCreateRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub departure: String,
    #[serde(default)]
    pub destinations: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub start_datetime: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end_datetime: OffsetDateTime,
    #[serde(default = "default_timezone")]
    pub start_timezone: String,
    #[serde(default = "default_timezone")]
    pub end_timezone: String,
    #[serde(default = "default_people_count")]
    pub people_count: i32,
    #[serde(default = "default_travel_mode")]
    pub travel_mode: i16,
    #[serde(default)]
    pub preferences: Option<Vec<String>>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub budget: Option<f64>,
    #[serde(default)]
    pub is_public: i16,
}

fn default_timezone() -> String {
    "Asia/Shanghai".to_string()
}

fn default_people_count() -> i32 {
    1
}

fn default_travel_mode() -> i16 {
    1
}

#[derive(Debug, Deserialize)]
pub struct TripListQuery {
    /// "all", "planning", "completed" or "cancelled".
    #[serde(default)]
    pub status: Option<String>,
    /// Short-circuits every other filter when present.
    #[serde(default)]
    pub trip_id: Option<i64>,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
    #[serde(default)]
    pub include_days: bool,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    20
}

#[derive(Debug, Clone, Serialize)]
pub struct TripResponse {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    pub departure: String,
    pub destinations: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub start_datetime: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end_datetime: OffsetDateTime,
    pub start_timezone: String,
    pub end_timezone: String,
    pub days: i32,
    pub people_count: i32,
    pub travel_mode: i16,
    pub preferences: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub budget: Option<f64>,
    pub overview: Option<String>,
    pub estimated_cost: Option<f64>,
    pub status: i16,
    pub is_public: i16,
    pub view_count: i32,
    pub like_count: i32,
    pub share_count: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_overview: Option<Vec<TripDayResponse>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherInfo {
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub temperature: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub humidity: Option<String>,
    #[serde(default)]
    pub wind: Option<String>,
    #[serde(default)]
    pub precipitation: Option<String>,
    #[serde(default)]
    pub uv_index: Option<String>,
    /// "HH:MM".
    #[serde(default)]
    pub sunrise: Option<String>,
    #[serde(default)]
    pub sunset: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccommodationInfo {
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub contact: Option<String>,
}

/// Where a day begins or ends, e.g. the hotel or a railway station.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointInfo {
    pub name: String,
    /// "HH:MM".
    #[serde(default)]
    pub time: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TripDayResponse {
    pub day_index: i32,
    pub date: Date,
    #[serde(with = "time::serde::rfc3339")]
    pub datetime: OffsetDateTime,
    pub timezone: String,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub city: Option<String>,
    pub theme: Option<String>,
    pub weather: Option<WeatherInfo>,
    pub accommodation: Option<AccommodationInfo>,
    pub start_point: Option<PointInfo>,
    pub end_point: Option<PointInfo>,
    pub estimated_cost: Option<f64>,
    pub is_generated: bool,
    pub place_count: i32,
    pub food_count: i32,
    pub version: i64,
}

#[derive(Debug, Serialize)]
pub struct TripListResponse {
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
    pub has_next: bool,
    pub has_prev: bool,
    pub trips: Vec<TripResponse>,
}

#[derive(Debug, Serialize)]
pub struct HighlightPlace {
    pub name: String,
    pub image_url: Option<String>,
    pub day_index: i32,
}

#[derive(Debug, Serialize)]
pub struct TripOverviewResponse {
    pub trip_info: TripResponse,
    pub days_list: Vec<TripDayResponse>,
    pub total_highlights: Vec<HighlightPlace>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TripDayDetailResponse {
    pub trip_id: i64,
    pub day_index: i32,
    pub date: Date,
    pub title: Option<String>,
    pub city: Option<String>,
    pub weather: Option<WeatherInfo>,
    pub total_places: i32,
    pub version: i64,
    pub itinerary: Vec<ItineraryItem>,
}

#[derive(Debug, Deserialize)]
pub struct TripDayUpdateRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub estimated_cost: Option<f64>,
    #[serde(default)]
    pub weather: Option<WeatherInfo>,
    #[serde(default)]
    pub accommodation: Option<AccommodationInfo>,
    #[serde(default)]
    pub start_point: Option<PointInfo>,
    #[serde(default)]
    pub end_point: Option<PointInfo>,
    /// When present the day's items are fully rebuilt from this list.
    #[serde(default)]
    pub itinerary: Option<Vec<ItineraryItem>>,
    /// Optional optimistic-concurrency guard.
    #[serde(default)]
    pub expected_version: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct TripDayUpdateResponse {
    #[serde(flatten)]
    pub detail: TripDayDetailResponse,
    pub skipped: Vec<SkippedEntry>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TripCancelRequest {
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Debug, Serialize)]
pub struct TripCancelResponse {
    pub id: i64,
    pub status: i16,
    #[serde(with = "time::serde::rfc3339")]
    pub cancel_time: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct TripFoodResponse {
    pub id: i64,
    pub day_index: i32,
    pub visit_order: i32,
    pub name: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub rating: Option<f64>,
    pub price: Option<f64>,
    pub start_time: Option<String>,
    pub description: Option<String>,
    pub recommendation: Option<String>,
    pub business_hours: Option<String>,
    pub is_highlight: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TripFoodsResponse {
    pub trip_id: i64,
    pub total: i64,
    pub foods: Vec<TripFoodResponse>,
}

pub fn trip_response(trip: &Trip, days_overview: Option<Vec<TripDayResponse>>) -> TripResponse {
    TripResponse {
        id: trip.id,
        user_id: trip.user_id,
        title: trip.title.clone(),
        description: trip.description.clone(),
        cover_image: trip.cover_image.clone(),
        departure: trip.departure.clone(),
        destinations: trip.destinations.0.clone(),
        start_datetime: trip.start_datetime,
        end_datetime: trip.end_datetime,
        start_timezone: trip.start_timezone.clone(),
        end_timezone: trip.end_timezone.clone(),
        days: trip.days,
        people_count: trip.people_count,
        travel_mode: trip.travel_mode,
        preferences: trip.preferences.as_ref().map(|j| j.0.clone()),
        tags: trip.tags.as_ref().map(|j| j.0.clone()),
        budget: trip.budget,
        overview: trip.overview.clone(),
        estimated_cost: trip.estimated_cost,
        status: trip.status,
        is_public: trip.is_public,
        view_count: trip.view_count,
        like_count: trip.like_count,
        share_count: trip.share_count,
        created_at: trip.created_at,
        updated_at: trip.updated_at,
        days_overview,
    }
}

pub fn weather_info(day: &TripDay) -> Option<WeatherInfo> {
    day.weather_condition.as_ref()?;
    Some(WeatherInfo {
        condition: day.weather_condition.clone(),
        temperature: day.temperature.clone(),
        icon: day.weather_icon.clone(),
        humidity: day.humidity.clone(),
        wind: day.wind.clone(),
        precipitation: day.precipitation.clone(),
        uv_index: day.uv_index.clone(),
        sunrise: day.sunrise.map(format_hm),
        sunset: day.sunset.map(format_hm),
    })
}

pub fn accommodation_info(day: &TripDay) -> Option<AccommodationInfo> {
    let name = day.accommodation_name.clone()?;
    Some(AccommodationInfo {
        name,
        address: day.accommodation_address.clone(),
        price: day.accommodation_price,
        rating: day.accommodation_rating,
        latitude: day.accommodation_latitude,
        longitude: day.accommodation_longitude,
        contact: day.accommodation_contact.clone(),
    })
}

fn start_point_info(day: &TripDay) -> Option<PointInfo> {
    let name = day.start_point_name.clone()?;
    Some(PointInfo {
        name,
        time: day.start_point_time.map(format_hm),
        kind: day.start_point_type.clone(),
    })
}

fn end_point_info(day: &TripDay) -> Option<PointInfo> {
    let name = day.end_point_name.clone()?;
    Some(PointInfo {
        name,
        time: day.end_point_time.map(format_hm),
        kind: day.end_point_type.clone(),
    })
}

pub fn day_response(day: &TripDay) -> TripDayResponse {
    TripDayResponse {
        day_index: day.day_index,
        date: day.date,
        datetime: day.start_datetime,
        timezone: day.timezone.clone(),
        title: day.title.clone(),
        summary: day.summary.clone(),
        city: day.city.clone(),
        theme: day.theme.clone(),
        weather: weather_info(day),
        accommodation: accommodation_info(day),
        start_point: start_point_info(day),
        end_point: end_point_info(day),
        estimated_cost: day.estimated_cost,
        is_generated: day.is_generated == 1,
        place_count: day.place_count,
        food_count: day.food_count,
        version: day.version,
    }
}

pub fn day_detail_response(day: &TripDay, itinerary: Vec<ItineraryItem>) -> TripDayDetailResponse {
    TripDayDetailResponse {
        trip_id: day.trip_id,
        day_index: day.day_index,
        date: day.date,
        title: day.title.clone(),
        city: day.city.clone(),
        weather: weather_info(day),
        total_places: day.place_count,
        version: day.version,
        itinerary,
    }
}

pub fn food_response(food: &TripFood) -> TripFoodResponse {
    TripFoodResponse {
        id: food.id,
        day_index: food.day_index,
        visit_order: food.visit_order,
        name: food.name.clone(),
        address: food.address.clone(),
        city: food.city.clone(),
        category: food.category.clone(),
        image_url: food.image_url.clone(),
        rating: food.rating,
        price: food.price,
        start_time: food.start_time.map(format_hm),
        description: food.description.clone(),
        recommendation: food.recommendation.clone(),
        business_hours: food.business_hours.clone(),
        is_highlight: food.is_highlight == 1,
    }
}

pub fn highlight_place(place: &TripPlace) -> HighlightPlace {
    HighlightPlace {
        name: place.name.clone(),
        image_url: place.image_url.clone(),
        day_index: place.day_index,
    }
}

/// Ceiling-divide pagination: total pages for a given page size.
pub fn total_pages(total: i64, page_size: i64) -> i64 {
    if page_size <= 0 {
        0
    } else {
        (total + page_size - 1) / page_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0, 20), 0);
        assert_eq!(total_pages(1, 20), 1);
        assert_eq!(total_pages(20, 20), 1);
        assert_eq!(total_pages(21, 20), 2);
    }

    #[test]
    fn create_request_defaults() {
        let json = r#"{
            "title": "周末广州行",
            "departure": "深圳",
            "destinations": ["广州"],
            "start_datetime": "2025-05-01T09:00:00+08:00",
            "end_datetime": "2025-05-03T18:00:00+08:00"
        }"#;
        let req: TripCreateRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.people_count, 1);
        assert_eq!(req.travel_mode, 1);
        assert_eq!(req.start_timezone, "Asia/Shanghai");
        assert_eq!(req.is_public, 0);
    }

    #[test]
    fn cancel_request_defaults_to_unconfirmed() {
        let req: TripCancelRequest = serde_json::from_str("{}").unwrap();
        assert!(!req.confirm);
    }

    #[test]
    fn list_query_defaults() {
        let q: TripListQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(q.page, 1);
        assert_eq!(q.page_size, 20);
        assert!(!q.include_days);
        assert!(q.status.is_none());
    }
}
