//! Row structs and queries for the trip tables. All ids are BIGSERIAL;
//! `trip_id` is denormalized onto day items and must match the parent day's.

use sqlx::types::Json;
use sqlx::{FromRow, PgExecutor, PgPool};
use time::{Date, OffsetDateTime, Time};

pub const STATUS_PLANNING: i16 = 0;
pub const STATUS_COMPLETED: i16 = 1;
pub const STATUS_CANCELLED: i16 = 2;

#[derive(Debug, Clone, FromRow)]
pub struct Trip {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    pub departure: String,
    pub destinations: Json<Vec<String>>,
    pub start_datetime: OffsetDateTime,
    pub end_datetime: OffsetDateTime,
    pub start_timezone: String,
    pub end_timezone: String,
    pub days: i32,
    pub people_count: i32,
    pub travel_mode: i16,
    pub preferences: Option<Json<Vec<String>>>,
    pub tags: Option<Json<Vec<String>>>,
    pub budget: Option<f64>,
    pub overview: Option<String>,
    pub estimated_cost: Option<f64>,
    pub status: i16,
    pub is_public: i16,
    pub view_count: i32,
    pub like_count: i32,
    pub share_count: i32,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub struct TripDay {
    pub id: i64,
    pub trip_id: i64,
    pub day_index: i32,
    pub date: Date,
    pub start_datetime: OffsetDateTime,
    pub timezone: String,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub city: Option<String>,
    pub theme: Option<String>,
    pub weather_condition: Option<String>,
    pub temperature: Option<String>,
    pub weather_icon: Option<String>,
    pub humidity: Option<String>,
    pub wind: Option<String>,
    pub precipitation: Option<String>,
    pub uv_index: Option<String>,
    pub sunrise: Option<Time>,
    pub sunset: Option<Time>,
    pub accommodation_name: Option<String>,
    pub accommodation_address: Option<String>,
    pub accommodation_price: Option<f64>,
    pub accommodation_rating: Option<f64>,
    pub accommodation_latitude: Option<f64>,
    pub accommodation_longitude: Option<f64>,
    pub accommodation_contact: Option<String>,
    pub start_point_name: Option<String>,
    pub start_point_time: Option<Time>,
    pub start_point_type: Option<String>,
    pub end_point_name: Option<String>,
    pub end_point_time: Option<Time>,
    pub end_point_type: Option<String>,
    pub estimated_cost: Option<f64>,
    pub is_generated: i16,
    pub place_count: i32,
    pub food_count: i32,
    pub version: i64,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub struct TripPlace {
    pub id: i64,
    pub trip_id: i64,
    pub day_id: i64,
    pub day_index: i32,
    pub visit_order: i32,
    pub name: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub images: Option<Json<Vec<String>>>,
    pub rating: Option<f64>,
    pub price: Option<f64>,
    pub start_time: Option<Time>,
    pub end_time: Option<Time>,
    pub duration: Option<i32>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub poi_id: Option<String>,
    pub contact: Option<String>,
    pub notes: Option<String>,
    pub is_highlight: i16,
}

#[derive(Debug, Clone, FromRow)]
pub struct TripFood {
    pub id: i64,
    pub trip_id: i64,
    pub day_id: i64,
    pub day_index: i32,
    pub visit_order: i32,
    pub name: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub images: Option<Json<Vec<String>>>,
    pub rating: Option<f64>,
    pub price: Option<f64>,
    pub start_time: Option<Time>,
    pub duration: Option<i32>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub poi_id: Option<String>,
    pub contact: Option<String>,
    pub description: Option<String>,
    pub recommendation: Option<String>,
    pub business_hours: Option<String>,
    pub is_highlight: i16,
}

#[derive(Debug, Clone, FromRow)]
pub struct TripTransportation {
    pub id: i64,
    pub trip_id: i64,
    pub day_id: i64,
    pub day_index: i32,
    pub transport_order: i32,
    pub from_name: String,
    pub from_latitude: Option<f64>,
    pub from_longitude: Option<f64>,
    pub to_name: String,
    pub to_latitude: Option<f64>,
    pub to_longitude: Option<f64>,
    pub start_time: Option<Time>,
    pub duration: Option<i32>,
    pub distance: Option<f64>,
    pub mode: Option<String>,
    pub description: Option<String>,
    pub amap_navigation_url: Option<String>,
    pub web_navigation_url: Option<String>,
}

/// Values for a fresh trip row; the id and counters come from the database.
#[derive(Debug, Clone)]
pub struct NewTrip {
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub departure: String,
    pub destinations: Vec<String>,
    pub start_datetime: OffsetDateTime,
    pub end_datetime: OffsetDateTime,
    pub start_timezone: String,
    pub end_timezone: String,
    pub days: i32,
    pub people_count: i32,
    pub travel_mode: i16,
    pub preferences: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub budget: Option<f64>,
    pub is_public: i16,
}

#[derive(Debug, Clone)]
pub struct NewTripDay {
    pub trip_id: i64,
    pub day_index: i32,
    pub date: Date,
    pub start_datetime: OffsetDateTime,
    pub timezone: String,
    pub title: String,
    pub city: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTripPlace {
    pub visit_order: i32,
    pub name: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub images: Option<Vec<String>>,
    pub rating: Option<f64>,
    pub price: Option<f64>,
    pub start_time: Option<Time>,
    pub duration: Option<i32>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub poi_id: Option<String>,
    pub contact: Option<String>,
    pub is_highlight: i16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTripFood {
    pub visit_order: i32,
    pub name: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub images: Option<Vec<String>>,
    pub rating: Option<f64>,
    pub price: Option<f64>,
    pub start_time: Option<Time>,
    pub duration: Option<i32>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub poi_id: Option<String>,
    pub contact: Option<String>,
    pub recommendation: Option<String>,
    pub business_hours: Option<String>,
    pub is_highlight: i16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTripTransportation {
    pub transport_order: i32,
    pub from_name: String,
    pub from_latitude: Option<f64>,
    pub from_longitude: Option<f64>,
    pub to_name: String,
    pub to_latitude: Option<f64>,
    pub to_longitude: Option<f64>,
    pub start_time: Option<Time>,
    pub duration: Option<i32>,
    pub distance: Option<f64>,
    pub mode: Option<String>,
    pub description: Option<String>,
    pub amap_navigation_url: Option<String>,
    pub web_navigation_url: Option<String>,
}

const TRIP_COLUMNS: &str = "id, user_id, title, description, cover_image, departure, destinations, \
     start_datetime, end_datetime, start_timezone, end_timezone, days, people_count, \
     travel_mode, preferences, tags, budget, overview, estimated_cost, status, is_public, \
     view_count, like_count, share_count, created_at, updated_at";

const DAY_COLUMNS: &str = "id, trip_id, day_index, date, start_datetime, timezone, title, summary, \
     city, theme, weather_condition, temperature, weather_icon, humidity, wind, \
     precipitation, uv_index, sunrise, sunset, accommodation_name, accommodation_address, \
     accommodation_price, accommodation_rating, accommodation_latitude, \
     accommodation_longitude, accommodation_contact, start_point_name, start_point_time, \
     start_point_type, end_point_name, end_point_time, end_point_type, estimated_cost, \
     is_generated, place_count, food_count, version, created_at, updated_at";

const PLACE_COLUMNS: &str = "id, trip_id, day_id, day_index, visit_order, name, address, city, \
     category, image_url, images, rating, price, start_time, end_time, duration, \
     latitude, longitude, poi_id, contact, notes, is_highlight";

const FOOD_COLUMNS: &str = "id, trip_id, day_id, day_index, visit_order, name, address, city, \
     category, image_url, images, rating, price, start_time, duration, latitude, \
     longitude, poi_id, contact, description, recommendation, business_hours, is_highlight";

const TRANSPORT_COLUMNS: &str = "id, trip_id, day_id, day_index, transport_order, from_name, \
     from_latitude, from_longitude, to_name, to_latitude, to_longitude, start_time, \
     duration, distance, mode, description, amap_navigation_url, web_navigation_url";

pub async fn insert_trip<'e, E>(ex: E, new: &NewTrip) -> sqlx::Result<Trip>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Trip>(&format!(
        "INSERT INTO trips (user_id, title, description, departure, destinations, \
             start_datetime, end_datetime, start_timezone, end_timezone, days, \
             people_count, travel_mode, preferences, tags, budget, is_public) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16) \
         RETURNING {TRIP_COLUMNS}"
    ))
    .bind(new.user_id)
    .bind(&new.title)
    .bind(&new.description)
    .bind(&new.departure)
    .bind(Json(&new.destinations))
    .bind(new.start_datetime)
    .bind(new.end_datetime)
    .bind(&new.start_timezone)
    .bind(&new.end_timezone)
    .bind(new.days)
    .bind(new.people_count)
    .bind(new.travel_mode)
    .bind(new.preferences.as_ref().map(Json))
    .bind(new.tags.as_ref().map(Json))
    .bind(new.budget)
    .bind(new.is_public)
    .fetch_one(ex)
    .await
}

pub async fn find_trip(db: &PgPool, trip_id: i64) -> sqlx::Result<Option<Trip>> {
    sqlx::query_as::<_, Trip>(&format!("SELECT {TRIP_COLUMNS} FROM trips WHERE id = $1"))
        .bind(trip_id)
        .fetch_optional(db)
        .await
}

pub async fn count_trips(db: &PgPool, user_id: i64, status: Option<i16>) -> sqlx::Result<i64> {
    let (total,): (i64,) = match status {
        Some(code) => {
            sqlx::query_as("SELECT COUNT(*) FROM trips WHERE user_id = $1 AND status = $2")
                .bind(user_id)
                .bind(code)
                .fetch_one(db)
                .await?
        }
        None => {
            sqlx::query_as("SELECT COUNT(*) FROM trips WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(db)
                .await?
        }
    };
    Ok(total)
}

pub async fn list_trips(
    db: &PgPool,
    user_id: i64,
    status: Option<i16>,
    limit: i64,
    offset: i64,
) -> sqlx::Result<Vec<Trip>> {
    match status {
        Some(code) => {
            sqlx::query_as::<_, Trip>(&format!(
                "SELECT {TRIP_COLUMNS} FROM trips \
                 WHERE user_id = $1 AND status = $2 \
                 ORDER BY created_at DESC LIMIT $3 OFFSET $4"
            ))
            .bind(user_id)
            .bind(code)
            .bind(limit)
            .bind(offset)
            .fetch_all(db)
            .await
        }
        None => {
            sqlx::query_as::<_, Trip>(&format!(
                "SELECT {TRIP_COLUMNS} FROM trips \
                 WHERE user_id = $1 \
                 ORDER BY created_at DESC LIMIT $2 OFFSET $3"
            ))
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(db)
            .await
        }
    }
}

pub async fn update_trip_status(db: &PgPool, trip_id: i64, status: i16) -> sqlx::Result<()> {
    sqlx::query("UPDATE trips SET status = $2, updated_at = now() WHERE id = $1")
        .bind(trip_id)
        .bind(status)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn insert_day<'e, E>(ex: E, new: &NewTripDay) -> sqlx::Result<TripDay>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, TripDay>(&format!(
        "INSERT INTO trip_days (trip_id, day_index, date, start_datetime, timezone, title, city) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING {DAY_COLUMNS}"
    ))
    .bind(new.trip_id)
    .bind(new.day_index)
    .bind(new.date)
    .bind(new.start_datetime)
    .bind(&new.timezone)
    .bind(&new.title)
    .bind(&new.city)
    .fetch_one(ex)
    .await
}

pub async fn list_days(db: &PgPool, trip_id: i64) -> sqlx::Result<Vec<TripDay>> {
    sqlx::query_as::<_, TripDay>(&format!(
        "SELECT {DAY_COLUMNS} FROM trip_days WHERE trip_id = $1 ORDER BY day_index"
    ))
    .bind(trip_id)
    .fetch_all(db)
    .await
}

pub async fn find_day(db: &PgPool, trip_id: i64, day_index: i32) -> sqlx::Result<Option<TripDay>> {
    sqlx::query_as::<_, TripDay>(&format!(
        "SELECT {DAY_COLUMNS} FROM trip_days WHERE trip_id = $1 AND day_index = $2"
    ))
    .bind(trip_id)
    .bind(day_index)
    .fetch_optional(db)
    .await
}

/// Write back all mutable day columns and bump the version. When
/// `expected_version` is given the update only applies if the stored version
/// still matches; `None` is returned on a conflict.
pub async fn update_day<'e, E>(
    ex: E,
    day: &TripDay,
    expected_version: Option<i64>,
) -> sqlx::Result<Option<TripDay>>
where
    E: PgExecutor<'e>,
{
    let guard = expected_version.unwrap_or(day.version);
    sqlx::query_as::<_, TripDay>(&format!(
        "UPDATE trip_days SET \
             title = $3, summary = $4, city = $5, theme = $6, \
             weather_condition = $7, temperature = $8, weather_icon = $9, humidity = $10, \
             wind = $11, precipitation = $12, uv_index = $13, sunrise = $14, sunset = $15, \
             accommodation_name = $16, accommodation_address = $17, accommodation_price = $18, \
             accommodation_rating = $19, accommodation_latitude = $20, \
             accommodation_longitude = $21, accommodation_contact = $22, \
             start_point_name = $23, start_point_time = $24, start_point_type = $25, \
             end_point_name = $26, end_point_time = $27, end_point_type = $28, \
             estimated_cost = $29, is_generated = $30, place_count = $31, food_count = $32, \
             version = version + 1, updated_at = now() \
         WHERE id = $1 AND version = $2 \
         RETURNING {DAY_COLUMNS}"
    ))
    .bind(day.id)
    .bind(guard)
    .bind(&day.title)
    .bind(&day.summary)
    .bind(&day.city)
    .bind(&day.theme)
    .bind(&day.weather_condition)
    .bind(&day.temperature)
    .bind(&day.weather_icon)
    .bind(&day.humidity)
    .bind(&day.wind)
    .bind(&day.precipitation)
    .bind(&day.uv_index)
    .bind(day.sunrise)
    .bind(day.sunset)
    .bind(&day.accommodation_name)
    .bind(&day.accommodation_address)
    .bind(day.accommodation_price)
    .bind(day.accommodation_rating)
    .bind(day.accommodation_latitude)
    .bind(day.accommodation_longitude)
    .bind(&day.accommodation_contact)
    .bind(&day.start_point_name)
    .bind(day.start_point_time)
    .bind(&day.start_point_type)
    .bind(&day.end_point_name)
    .bind(day.end_point_time)
    .bind(&day.end_point_type)
    .bind(day.estimated_cost)
    .bind(day.is_generated)
    .bind(day.place_count)
    .bind(day.food_count)
    .fetch_optional(ex)
    .await
}

pub async fn list_places_by_day(db: &PgPool, day_id: i64) -> sqlx::Result<Vec<TripPlace>> {
    sqlx::query_as::<_, TripPlace>(&format!(
        "SELECT {PLACE_COLUMNS} FROM trip_places WHERE day_id = $1 ORDER BY visit_order"
    ))
    .bind(day_id)
    .fetch_all(db)
    .await
}

pub async fn list_foods_by_day(db: &PgPool, day_id: i64) -> sqlx::Result<Vec<TripFood>> {
    sqlx::query_as::<_, TripFood>(&format!(
        "SELECT {FOOD_COLUMNS} FROM trip_foods WHERE day_id = $1 ORDER BY visit_order"
    ))
    .bind(day_id)
    .fetch_all(db)
    .await
}

pub async fn list_transports_by_day(
    db: &PgPool,
    day_id: i64,
) -> sqlx::Result<Vec<TripTransportation>> {
    sqlx::query_as::<_, TripTransportation>(&format!(
        "SELECT {TRANSPORT_COLUMNS} FROM trip_transportations \
         WHERE day_id = $1 ORDER BY transport_order"
    ))
    .bind(day_id)
    .fetch_all(db)
    .await
}

pub async fn list_highlight_places(db: &PgPool, trip_id: i64) -> sqlx::Result<Vec<TripPlace>> {
    sqlx::query_as::<_, TripPlace>(&format!(
        "SELECT {PLACE_COLUMNS} FROM trip_places \
         WHERE trip_id = $1 AND is_highlight = 1 \
         ORDER BY day_index, visit_order"
    ))
    .bind(trip_id)
    .fetch_all(db)
    .await
}

pub async fn list_foods_by_trip(db: &PgPool, trip_id: i64) -> sqlx::Result<Vec<TripFood>> {
    sqlx::query_as::<_, TripFood>(&format!(
        "SELECT {FOOD_COLUMNS} FROM trip_foods \
         WHERE trip_id = $1 ORDER BY day_index, visit_order"
    ))
    .bind(trip_id)
    .fetch_all(db)
    .await
}

/// Drop every place/food/leg row for a day ahead of a rebuild. Takes a
/// connection so it can run inside the rebuild transaction.
pub async fn delete_day_items(conn: &mut sqlx::PgConnection, day_id: i64) -> sqlx::Result<()> {
    sqlx::query("DELETE FROM trip_places WHERE day_id = $1")
        .bind(day_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("DELETE FROM trip_foods WHERE day_id = $1")
        .bind(day_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("DELETE FROM trip_transportations WHERE day_id = $1")
        .bind(day_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub async fn insert_place<'e, E>(ex: E, day: &TripDay, new: &NewTripPlace) -> sqlx::Result<()>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        "INSERT INTO trip_places (trip_id, day_id, day_index, visit_order, name, address, \
             city, category, image_url, images, rating, price, start_time, duration, \
             latitude, longitude, poi_id, contact, is_highlight) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, \
             $17, $18, $19)",
    )
    .bind(day.trip_id)
    .bind(day.id)
    .bind(day.day_index)
    .bind(new.visit_order)
    .bind(&new.name)
    .bind(&new.address)
    .bind(&new.city)
    .bind(&new.category)
    .bind(&new.image_url)
    .bind(new.images.as_ref().map(Json))
    .bind(new.rating)
    .bind(new.price)
    .bind(new.start_time)
    .bind(new.duration)
    .bind(new.latitude)
    .bind(new.longitude)
    .bind(&new.poi_id)
    .bind(&new.contact)
    .bind(new.is_highlight)
    .execute(ex)
    .await?;
    Ok(())
}

pub async fn insert_food<'e, E>(ex: E, day: &TripDay, new: &NewTripFood) -> sqlx::Result<()>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        "INSERT INTO trip_foods (trip_id, day_id, day_index, visit_order, name, address, \
             city, category, image_url, images, rating, price, start_time, duration, \
             latitude, longitude, poi_id, contact, recommendation, business_hours, \
             is_highlight) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, \
             $17, $18, $19, $20, $21)",
    )
    .bind(day.trip_id)
    .bind(day.id)
    .bind(day.day_index)
    .bind(new.visit_order)
    .bind(&new.name)
    .bind(&new.address)
    .bind(&new.city)
    .bind(&new.category)
    .bind(&new.image_url)
    .bind(new.images.as_ref().map(Json))
    .bind(new.rating)
    .bind(new.price)
    .bind(new.start_time)
    .bind(new.duration)
    .bind(new.latitude)
    .bind(new.longitude)
    .bind(&new.poi_id)
    .bind(&new.contact)
    .bind(&new.recommendation)
    .bind(&new.business_hours)
    .bind(new.is_highlight)
    .execute(ex)
    .await?;
    Ok(())
}

pub async fn insert_transportation<'e, E>(
    ex: E,
    day: &TripDay,
    new: &NewTripTransportation,
) -> sqlx::Result<()>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        "INSERT INTO trip_transportations (trip_id, day_id, day_index, transport_order, \
             from_name, from_latitude, from_longitude, to_name, to_latitude, to_longitude, \
             start_time, duration, distance, mode, description, amap_navigation_url, \
             web_navigation_url) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)",
    )
    .bind(day.trip_id)
    .bind(day.id)
    .bind(day.day_index)
    .bind(new.transport_order)
    .bind(&new.from_name)
    .bind(new.from_latitude)
    .bind(new.from_longitude)
    .bind(&new.to_name)
    .bind(new.to_latitude)
    .bind(new.to_longitude)
    .bind(new.start_time)
    .bind(new.duration)
    .bind(new.distance)
    .bind(&new.mode)
    .bind(&new.description)
    .bind(&new.amap_navigation_url)
    .bind(&new.web_navigation_url)
    .execute(ex)
    .await?;
    Ok(())
}
