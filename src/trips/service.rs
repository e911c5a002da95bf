//! Trip operations. Handlers stay thin; everything from permission checks to
//! the day rebuild transaction lives here.

use std::collections::HashMap;
use std::sync::Arc;

use time::macros::time;
use time::{Date, OffsetDateTime, PrimitiveDateTime};
use tracing::{info, warn};

use crate::error::ApiError;
use crate::locations::dto::LocationDetail;
use crate::state::AppState;
use crate::weather::Forecast;

use super::dto::{
    self, TripCancelRequest, TripCancelResponse, TripCreateRequest, TripDayDetailResponse,
    TripDayResponse, TripDayUpdateRequest, TripDayUpdateResponse, TripFoodsResponse,
    TripListQuery, TripListResponse, TripOverviewResponse, TripResponse,
};
use super::itinerary::{self, parse_hm, ItineraryItem};
use super::repo::{
    self, NewTrip, NewTripDay, Trip, TripDay, STATUS_CANCELLED, STATUS_COMPLETED, STATUS_PLANNING,
};

const MAX_PAGE_SIZE: i64 = 50;
const MAX_TRIP_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    View,
    Edit,
}

/// Owners can do everything; a public trip is viewable by anyone.
pub fn check_access(
    owner_id: i64,
    is_public: i16,
    user_id: i64,
    capability: Capability,
) -> Result<(), ApiError> {
    if owner_id == user_id {
        return Ok(());
    }
    match capability {
        Capability::View if is_public == 1 => Ok(()),
        Capability::View => Err(ApiError::permission("no permission to view this trip")),
        Capability::Edit => Err(ApiError::permission("no permission to modify this trip")),
    }
}

/// Existence is checked before permission, so probing ids cannot tell a
/// private trip apart from a missing one by the error alone.
async fn get_trip_checked(
    state: &AppState,
    trip_id: i64,
    user_id: i64,
    capability: Capability,
) -> Result<Trip, ApiError> {
    let trip = repo::find_trip(&state.db, trip_id)
        .await?
        .ok_or_else(|| ApiError::not_found("trip not found"))?;
    check_access(trip.user_id, trip.is_public, user_id, capability)?;
    Ok(trip)
}

pub fn parse_status_filter(status: &str) -> Result<Option<i16>, ApiError> {
    match status {
        "all" => Ok(None),
        "planning" => Ok(Some(STATUS_PLANNING)),
        "completed" => Ok(Some(STATUS_COMPLETED)),
        "cancelled" => Ok(Some(STATUS_CANCELLED)),
        other => Err(ApiError::validation(format!(
            "unknown status filter: {other}"
        ))),
    }
}

/// Inclusive calendar-day span between two dates.
pub fn day_span(start: Date, end: Date) -> i64 {
    i64::from(end.to_julian_day()) - i64::from(start.to_julian_day()) + 1
}

/// Consecutive calendar dates for each day of the span. `None` if the span
/// runs past the representable date range.
fn day_dates(start: Date, span: i64) -> Option<Vec<Date>> {
    let mut dates = Vec::with_capacity(span as usize);
    let mut date = start;
    for index in 0..span {
        dates.push(date);
        if index + 1 < span {
            date = date.next_day()?;
        }
    }
    Some(dates)
}

pub async fn create_trip(
    state: &AppState,
    user_id: i64,
    req: TripCreateRequest,
) -> Result<TripResponse, ApiError> {
    if req.title.trim().is_empty() {
        return Err(ApiError::validation("title is required"));
    }
    if req.departure.trim().is_empty() {
        return Err(ApiError::validation("departure is required"));
    }
    if req.people_count < 1 {
        return Err(ApiError::validation("people_count must be at least 1"));
    }
    let span = day_span(req.start_datetime.date(), req.end_datetime.date());
    if span < 1 {
        return Err(ApiError::validation("end date must not precede start date"));
    }
    if span > MAX_TRIP_DAYS {
        return Err(ApiError::validation(format!(
            "trip is limited to {MAX_TRIP_DAYS} days"
        )));
    }

    let dates = day_dates(req.start_datetime.date(), span)
        .ok_or_else(|| ApiError::validation("trip dates out of range"))?;

    // One transaction, so a trip row never lands without its full day batch.
    let mut tx = state.db.begin().await.map_err(ApiError::from)?;
    let trip = repo::insert_trip(
        &mut *tx,
        &NewTrip {
            user_id,
            title: req.title.trim().to_string(),
            description: req.description,
            departure: req.departure.trim().to_string(),
            destinations: req.destinations.clone(),
            start_datetime: req.start_datetime,
            end_datetime: req.end_datetime,
            start_timezone: req.start_timezone.clone(),
            end_timezone: req.end_timezone,
            days: span as i32,
            people_count: req.people_count,
            travel_mode: req.travel_mode,
            preferences: req.preferences,
            tags: req.tags,
            budget: req.budget,
            is_public: req.is_public,
        },
    )
    .await?;

    // Default city for every skeleton day: first destination, else departure.
    let city = req
        .destinations
        .first()
        .cloned()
        .unwrap_or_else(|| trip.departure.clone());

    let mut days = Vec::with_capacity(dates.len());
    for (offset, date) in dates.iter().enumerate() {
        let index = offset as i32 + 1;
        let day = repo::insert_day(
            &mut *tx,
            &NewTripDay {
                trip_id: trip.id,
                day_index: index,
                date: *date,
                start_datetime: PrimitiveDateTime::new(*date, time!(09:00)).assume_utc(),
                timezone: req.start_timezone.clone(),
                title: format!("DAY{index}"),
                city: Some(city.clone()),
            },
        )
        .await?;
        days.push(dto::day_response(&day));
    }
    tx.commit().await.map_err(ApiError::from)?;

    info!(trip_id = trip.id, user_id, days = span, "trip created");
    Ok(dto::trip_response(&trip, Some(days)))
}

pub async fn list_trips(
    state: &AppState,
    user_id: i64,
    query: TripListQuery,
) -> Result<TripListResponse, ApiError> {
    // An explicit id bypasses every filter but still goes through the
    // permission check.
    if let Some(trip_id) = query.trip_id {
        let trip = get_trip_checked(state, trip_id, user_id, Capability::View).await?;
        let days = if query.include_days {
            Some(day_responses(state, trip.id).await?)
        } else {
            None
        };
        return Ok(TripListResponse {
            total: 1,
            page: 1,
            page_size: 1,
            total_pages: 1,
            has_next: false,
            has_prev: false,
            trips: vec![dto::trip_response(&trip, days)],
        });
    }

    if query.page < 1 {
        return Err(ApiError::validation("page must be at least 1"));
    }
    if !(1..=MAX_PAGE_SIZE).contains(&query.page_size) {
        return Err(ApiError::validation(format!(
            "page_size must be between 1 and {MAX_PAGE_SIZE}"
        )));
    }
    let status = match query.status.as_deref() {
        Some(s) => parse_status_filter(s)?,
        None => None,
    };

    let total = repo::count_trips(&state.db, user_id, status).await?;
    let offset = (query.page - 1) * query.page_size;
    let rows = repo::list_trips(&state.db, user_id, status, query.page_size, offset).await?;

    let mut trips = Vec::with_capacity(rows.len());
    for trip in &rows {
        let days = if query.include_days {
            Some(day_responses(state, trip.id).await?)
        } else {
            None
        };
        trips.push(dto::trip_response(trip, days));
    }

    let total_pages = dto::total_pages(total, query.page_size);
    Ok(TripListResponse {
        total,
        page: query.page,
        page_size: query.page_size,
        total_pages,
        has_next: query.page < total_pages,
        has_prev: query.page > 1,
        trips,
    })
}

async fn day_responses(state: &AppState, trip_id: i64) -> Result<Vec<TripDayResponse>, ApiError> {
    let days = repo::list_days(&state.db, trip_id).await?;
    Ok(days.iter().map(dto::day_response).collect())
}

pub async fn get_trip_overview(
    state: &AppState,
    user_id: i64,
    trip_id: i64,
) -> Result<TripOverviewResponse, ApiError> {
    let trip = get_trip_checked(state, trip_id, user_id, Capability::View).await?;
    let days_list = day_responses(state, trip.id).await?;
    let highlights = repo::list_highlight_places(&state.db, trip.id).await?;
    Ok(TripOverviewResponse {
        trip_info: dto::trip_response(&trip, None),
        days_list,
        total_highlights: highlights.iter().map(dto::highlight_place).collect(),
    })
}

pub async fn get_trip_day_detail(
    state: &AppState,
    user_id: i64,
    trip_id: i64,
    day_index: i32,
) -> Result<Arc<TripDayDetailResponse>, ApiError> {
    // Permission is checked on every call; only the assembled payload is
    // cached.
    let trip = get_trip_checked(state, trip_id, user_id, Capability::View).await?;
    if let Some(cached) = state.cache.get_day_detail(trip.id, day_index).await {
        return Ok(cached);
    }

    let day = repo::find_day(&state.db, trip.id, day_index)
        .await?
        .ok_or_else(|| ApiError::not_found("trip day not found"))?;
    let detail = Arc::new(load_day_detail(state, &day).await?);
    state.cache.put_day_detail(detail.clone()).await;
    Ok(detail)
}

async fn load_day_detail(state: &AppState, day: &TripDay) -> Result<TripDayDetailResponse, ApiError> {
    let places = repo::list_places_by_day(&state.db, day.id).await?;
    let foods = repo::list_foods_by_day(&state.db, day.id).await?;
    let legs = repo::list_transports_by_day(&state.db, day.id).await?;
    let itinerary = itinerary::assemble_day(day, &places, &foods, &legs);
    Ok(dto::day_detail_response(day, itinerary))
}

fn apply_scalar_updates(day: &mut TripDay, req: &TripDayUpdateRequest) {
    if let Some(title) = &req.title {
        day.title = Some(title.clone());
    }
    if let Some(summary) = &req.summary {
        day.summary = Some(summary.clone());
    }
    if let Some(city) = &req.city {
        day.city = Some(city.clone());
    }
    if let Some(theme) = &req.theme {
        day.theme = Some(theme.clone());
    }
    if let Some(cost) = req.estimated_cost {
        day.estimated_cost = Some(cost);
    }
    if let Some(weather) = &req.weather {
        day.weather_condition = weather.condition.clone();
        day.temperature = weather.temperature.clone();
        day.weather_icon = weather.icon.clone();
        day.humidity = weather.humidity.clone();
        day.wind = weather.wind.clone();
        day.precipitation = weather.precipitation.clone();
        day.uv_index = weather.uv_index.clone();
        day.sunrise = weather.sunrise.as_deref().and_then(parse_hm);
        day.sunset = weather.sunset.as_deref().and_then(parse_hm);
    }
    if let Some(acc) = &req.accommodation {
        day.accommodation_name = Some(acc.name.clone());
        day.accommodation_address = acc.address.clone();
        day.accommodation_price = acc.price;
        day.accommodation_rating = acc.rating;
        day.accommodation_latitude = acc.latitude;
        day.accommodation_longitude = acc.longitude;
        day.accommodation_contact = acc.contact.clone();
    }
    if let Some(start) = &req.start_point {
        day.start_point_name = Some(start.name.clone());
        day.start_point_time = start.time.as_deref().and_then(parse_hm);
        day.start_point_type = start.kind.clone();
    }
    if let Some(end) = &req.end_point {
        day.end_point_name = Some(end.name.clone());
        day.end_point_time = end.time.as_deref().and_then(parse_hm);
        day.end_point_type = end.kind.clone();
    }
}

fn apply_forecast(day: &mut TripDay, forecast: Forecast) {
    day.weather_condition = Some(forecast.condition);
    day.temperature = Some(forecast.temperature);
    day.weather_icon = forecast.icon;
    day.humidity = forecast.humidity;
    day.wind = forecast.wind;
    day.precipitation = forecast.precipitation;
}

/// Resolve every distinct POI reference in the submitted list. Individual
/// lookup failures degrade to "unresolved", which the rebuild reports as a
/// skipped entry.
async fn resolve_pois(
    state: &AppState,
    items: &[ItineraryItem],
) -> HashMap<String, LocationDetail> {
    let mut resolved = HashMap::new();
    for poi_id in items.iter().filter_map(|i| i.poi_id.as_deref()) {
        if resolved.contains_key(poi_id) {
            continue;
        }
        match state.locations.detail(poi_id).await {
            Ok(Some(detail)) => {
                resolved.insert(poi_id.to_string(), detail);
            }
            Ok(None) => {}
            Err(err) => {
                warn!(poi_id, error = %err, "poi lookup failed during day rebuild");
            }
        }
    }
    resolved
}

pub async fn update_trip_day(
    state: &AppState,
    user_id: i64,
    trip_id: i64,
    day_index: i32,
    req: TripDayUpdateRequest,
) -> Result<TripDayUpdateResponse, ApiError> {
    let trip = get_trip_checked(state, trip_id, user_id, Capability::Edit).await?;
    let mut day = repo::find_day(&state.db, trip.id, day_index)
        .await?
        .ok_or_else(|| ApiError::not_found("trip day not found"))?;

    if let Some(expected) = req.expected_version {
        if expected != day.version {
            return Err(ApiError::validation(
                "trip day was modified by another request",
            ));
        }
    }

    apply_scalar_updates(&mut day, &req);

    // Best-effort weather backfill when nothing was supplied and the day has
    // no snapshot yet.
    if req.weather.is_none() && day.weather_condition.is_none() {
        if let Some(city) = day.city.clone() {
            if let Some(forecast) = state.weather.forecast(&city, day.date).await {
                apply_forecast(&mut day, forecast);
            }
        }
    }

    let mut skipped = Vec::new();
    let plan = match &req.itinerary {
        Some(items) => {
            let resolved = resolve_pois(state, items).await;
            let plan = itinerary::plan_day_rebuild(items, &resolved, day.city.as_deref());
            if let Some(acc) = &plan.accommodation {
                day.accommodation_name = Some(acc.name.clone());
                day.accommodation_address = acc.address.clone();
                day.accommodation_price = acc.price;
                day.accommodation_rating = acc.rating;
                day.accommodation_latitude = acc.latitude;
                day.accommodation_longitude = acc.longitude;
                day.accommodation_contact = acc.contact.clone();
            }
            day.place_count = plan.places.len() as i32;
            day.food_count = plan.foods.len() as i32;
            day.is_generated = 1;
            Some(plan)
        }
        None => None,
    };

    let mut tx = state.db.begin().await.map_err(ApiError::from)?;
    if let Some(plan) = &plan {
        repo::delete_day_items(&mut tx, day.id).await?;
        for place in &plan.places {
            repo::insert_place(&mut *tx, &day, place).await?;
        }
        for food in &plan.foods {
            repo::insert_food(&mut *tx, &day, food).await?;
        }
        for leg in &plan.transportations {
            repo::insert_transportation(&mut *tx, &day, leg).await?;
        }
    }
    let updated = repo::update_day(&mut *tx, &day, req.expected_version)
        .await?
        .ok_or_else(|| {
            ApiError::validation("trip day was modified by another request")
        })?;
    tx.commit().await.map_err(ApiError::from)?;

    if let Some(plan) = plan {
        skipped = plan.skipped;
    }

    state.cache.invalidate_day(trip.id, day_index).await;
    state.cache.invalidate_trip_foods(trip.id).await;

    let detail = load_day_detail(state, &updated).await?;
    info!(
        trip_id = trip.id,
        day_index,
        places = updated.place_count,
        foods = updated.food_count,
        skipped = skipped.len(),
        "trip day updated"
    );
    Ok(TripDayUpdateResponse { detail, skipped })
}

pub async fn get_trip_foods(
    state: &AppState,
    user_id: i64,
    trip_id: i64,
) -> Result<Arc<TripFoodsResponse>, ApiError> {
    let trip = get_trip_checked(state, trip_id, user_id, Capability::View).await?;
    if let Some(cached) = state.cache.get_trip_foods(trip.id).await {
        return Ok(cached);
    }

    let rows = repo::list_foods_by_trip(&state.db, trip.id).await?;
    let response = Arc::new(TripFoodsResponse {
        trip_id: trip.id,
        total: rows.len() as i64,
        foods: rows.iter().map(dto::food_response).collect(),
    });
    state.cache.put_trip_foods(response.clone()).await;
    Ok(response)
}

/// Cancellation needs an explicit confirmation flag and only applies to trips
/// still in planning; completed and cancelled are both terminal.
pub fn ensure_cancellable(status: i16, confirm: bool) -> Result<(), ApiError> {
    if !confirm {
        return Err(ApiError::validation(
            "cancellation must be confirmed with confirm=true",
        ));
    }
    match status {
        STATUS_PLANNING => Ok(()),
        STATUS_COMPLETED => Err(ApiError::validation("completed trip cannot be cancelled")),
        STATUS_CANCELLED => Err(ApiError::validation("trip is already cancelled")),
        other => Err(ApiError::validation(format!("unknown trip status {other}"))),
    }
}

pub async fn cancel_trip(
    state: &AppState,
    user_id: i64,
    trip_id: i64,
    req: TripCancelRequest,
) -> Result<TripCancelResponse, ApiError> {
    let trip = get_trip_checked(state, trip_id, user_id, Capability::Edit).await?;
    ensure_cancellable(trip.status, req.confirm)?;

    repo::update_trip_status(&state.db, trip.id, STATUS_CANCELLED).await?;
    info!(trip_id = trip.id, user_id, "trip cancelled");
    Ok(TripCancelResponse {
        id: trip.id,
        status: STATUS_CANCELLED,
        cancel_time: OffsetDateTime::now_utc(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn status_filter_maps_names_to_codes() {
        assert_eq!(parse_status_filter("all").unwrap(), None);
        assert_eq!(parse_status_filter("planning").unwrap(), Some(0));
        assert_eq!(parse_status_filter("completed").unwrap(), Some(1));
        assert_eq!(parse_status_filter("cancelled").unwrap(), Some(2));
        assert!(parse_status_filter("archived").is_err());
    }

    #[test]
    fn day_span_is_inclusive() {
        assert_eq!(day_span(date!(2025 - 05 - 01), date!(2025 - 05 - 01)), 1);
        assert_eq!(day_span(date!(2025 - 05 - 01), date!(2025 - 05 - 03)), 3);
        assert_eq!(day_span(date!(2025 - 05 - 03), date!(2025 - 05 - 01)), -1);
    }

    #[test]
    fn day_dates_are_consecutive_from_start() {
        let dates = day_dates(date!(2024 - 05 - 01), 3).unwrap();
        assert_eq!(
            dates,
            vec![
                date!(2024 - 05 - 01),
                date!(2024 - 05 - 02),
                date!(2024 - 05 - 03)
            ]
        );
        assert_eq!(day_dates(date!(2024 - 05 - 01), 1).unwrap().len(), 1);
    }

    #[test]
    fn owner_has_full_access() {
        assert!(check_access(1, 0, 1, Capability::View).is_ok());
        assert!(check_access(1, 0, 1, Capability::Edit).is_ok());
    }

    #[test]
    fn public_trips_are_view_only_for_others() {
        assert!(check_access(1, 1, 2, Capability::View).is_ok());
        assert!(matches!(
            check_access(1, 1, 2, Capability::Edit),
            Err(ApiError::Permission(_))
        ));
    }

    #[test]
    fn private_trips_are_invisible_to_others() {
        assert!(matches!(
            check_access(1, 0, 2, Capability::View),
            Err(ApiError::Permission(_))
        ));
    }

    #[test]
    fn cancel_requires_confirmation() {
        assert!(matches!(
            ensure_cancellable(STATUS_PLANNING, false),
            Err(ApiError::Validation(_))
        ));
        assert!(ensure_cancellable(STATUS_PLANNING, true).is_ok());
    }

    #[test]
    fn terminal_states_cannot_be_cancelled() {
        assert!(ensure_cancellable(STATUS_COMPLETED, true).is_err());
        assert!(ensure_cancellable(STATUS_CANCELLED, true).is_err());
    }
}
