//! Day itinerary assembly.
//!
//! The read path merges a day's place, food and transport rows into one
//! chronological list. The write path turns a submitted list back into row
//! values, with POI attributes resolved ahead of time by the caller. Both
//! directions are pure so they can be exercised without a database.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use time::format_description::FormatItem;
use time::macros::format_description;
use time::Time;
use tracing::warn;

use crate::locations::dto::LocationDetail;

use super::repo::{
    NewTripFood, NewTripPlace, NewTripTransportation, TripDay, TripFood, TripPlace,
    TripTransportation,
};

const HM_FORMAT: &[FormatItem<'static>] = format_description!("[hour]:[minute]");

/// Entry categories. Unrecognized values deserialize as `Other` so a single
/// bad entry cannot fail the whole submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Place,
    Food,
    Transportation,
    Accommodation,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationPoint {
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationInfo {
    pub amap_url: Option<String>,
    pub web_url: Option<String>,
}

/// One itinerary entry, in both day-detail responses and day-update requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItineraryItem {
    /// "HH:MM", absent for entries without a scheduled time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poi_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<i32>,
    /// Kilometers, transport entries only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    /// On a place/food/accommodation entry this is a hint for how to travel
    /// onward to the next entry; on a transport entry it is the leg's mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transportation_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_location: Option<LocationPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_location: Option<LocationPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub navigation: Option<NavigationInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_highlight: Option<bool>,
}

impl ItineraryItem {
    fn bare(kind: ItemKind, name: impl Into<String>) -> Self {
        Self {
            time: None,
            kind,
            name: name.into(),
            description: None,
            image_url: None,
            images: None,
            latitude: None,
            longitude: None,
            poi_id: None,
            category: None,
            rating: None,
            price: None,
            contact: None,
            duration: None,
            distance: None,
            transportation_mode: None,
            from_location: None,
            to_location: None,
            navigation: None,
            is_highlight: None,
        }
    }
}

/// Parse an "HH:MM" clock time. Failures are logged and treated as missing,
/// never silently reinterpreted.
pub fn parse_hm(s: &str) -> Option<Time> {
    match Time::parse(s, &HM_FORMAT) {
        Ok(t) => Some(t),
        Err(err) => {
            warn!(value = s, %err, "unparseable itinerary time");
            None
        }
    }
}

pub fn format_hm(t: Time) -> String {
    format!("{:02}:{:02}", t.hour(), t.minute())
}

/// Render an amount without a fractional part when it is whole.
fn fmt_amount(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

fn place_description(p: &TripPlace) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(price) = p.price {
        parts.push(format!("门票：{}元/人", fmt_amount(price)));
    }
    if let Some(duration) = p.duration {
        parts.push(format!("建议游览{duration}分钟"));
    }
    if parts.is_empty() {
        p.notes.clone()
    } else {
        Some(parts.join(" | "))
    }
}

fn food_description(f: &TripFood) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(price) = f.price {
        parts.push(format!("人均：{}元", fmt_amount(price)));
    }
    if let Some(rec) = f.recommendation.as_deref().filter(|r| !r.is_empty()) {
        parts.push(rec.to_string());
    }
    if parts.is_empty() {
        f.description.clone()
    } else {
        Some(parts.join(" | "))
    }
}

/// Merge a day's rows into one chronological itinerary.
///
/// Entries are pooled in a fixed category order (accommodation start, places,
/// foods, transport legs) and stable-sorted by time, so equal times keep that
/// order and untimed entries sink to the end in pooling order.
pub fn assemble_day(
    day: &TripDay,
    places: &[TripPlace],
    foods: &[TripFood],
    legs: &[TripTransportation],
) -> Vec<ItineraryItem> {
    let mut entries: Vec<(Option<Time>, ItineraryItem)> = Vec::new();

    // A day-start entry needs both the accommodation and a departure time;
    // without a time there is nothing to anchor it to.
    if let (Some(name), Some(start)) = (day.accommodation_name.as_deref(), day.start_point_time) {
        let mut item = ItineraryItem::bare(ItemKind::Accommodation, name);
        item.time = Some(format_hm(start));
        item.description = Some("从住宿出发".to_string());
        item.latitude = day.accommodation_latitude;
        item.longitude = day.accommodation_longitude;
        item.contact = day.accommodation_contact.clone();
        entries.push((Some(start), item));
    }

    for p in places {
        let mut item = ItineraryItem::bare(ItemKind::Place, &p.name);
        item.time = p.start_time.map(format_hm);
        item.description = place_description(p);
        item.image_url = p.image_url.clone();
        item.images = p.images.as_ref().map(|j| j.0.clone());
        item.latitude = p.latitude;
        item.longitude = p.longitude;
        item.poi_id = p.poi_id.clone();
        item.category = p.category.clone();
        item.rating = p.rating;
        item.price = p.price;
        item.contact = p.contact.clone();
        item.duration = p.duration;
        item.is_highlight = Some(p.is_highlight == 1);
        entries.push((p.start_time, item));
    }

    for f in foods {
        let mut item = ItineraryItem::bare(ItemKind::Food, &f.name);
        item.time = f.start_time.map(format_hm);
        item.description = food_description(f);
        item.image_url = f.image_url.clone();
        item.images = f.images.as_ref().map(|j| j.0.clone());
        item.latitude = f.latitude;
        item.longitude = f.longitude;
        item.poi_id = f.poi_id.clone();
        item.category = f.category.clone();
        item.rating = f.rating;
        item.price = f.price;
        item.contact = f.contact.clone();
        item.duration = f.duration;
        item.is_highlight = Some(f.is_highlight == 1);
        entries.push((f.start_time, item));
    }

    for t in legs {
        let mut item = ItineraryItem::bare(ItemKind::Transportation, "交通");
        item.time = t.start_time.map(format_hm);
        item.description = t.description.clone();
        item.duration = t.duration;
        item.distance = t.distance;
        item.transportation_mode = t.mode.clone();
        item.from_location = Some(LocationPoint {
            name: t.from_name.clone(),
            latitude: t.from_latitude,
            longitude: t.from_longitude,
        });
        item.to_location = Some(LocationPoint {
            name: t.to_name.clone(),
            latitude: t.to_latitude,
            longitude: t.to_longitude,
        });
        item.navigation = Some(NavigationInfo {
            amap_url: t.amap_navigation_url.clone(),
            web_url: t.web_navigation_url.clone(),
        });
        entries.push((t.start_time, item));
    }

    entries.sort_by_key(|(time, _)| (time.is_none(), *time));
    entries.into_iter().map(|(_, item)| item).collect()
}

/// A submitted entry that could not be persisted. Reported back to the
/// client instead of failing the whole update.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedEntry {
    pub position: usize,
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct AccommodationUpdate {
    pub name: String,
    pub address: Option<String>,
    pub price: Option<f64>,
    pub rating: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub contact: Option<String>,
}

/// Row values for one rebuilt day, ready to be written in a transaction.
#[derive(Debug, Default)]
pub struct DayRebuildPlan {
    pub places: Vec<NewTripPlace>,
    pub foods: Vec<NewTripFood>,
    pub transportations: Vec<NewTripTransportation>,
    pub accommodation: Option<AccommodationUpdate>,
    pub skipped: Vec<SkippedEntry>,
}

struct ResolvedEntry {
    name: String,
    address: Option<String>,
    city: Option<String>,
    category: Option<String>,
    image_url: Option<String>,
    images: Option<Vec<String>>,
    rating: Option<f64>,
    price: Option<f64>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    contact: Option<String>,
    business_hours: Option<String>,
}

// Last geocoded stop, carrying the onward travel hint of its entry.
struct PendingLeg {
    name: String,
    latitude: f64,
    longitude: f64,
    mode: Option<String>,
    time: Option<Time>,
}

/// Merge a submitted entry with its resolved POI detail. Resolved attributes
/// win; submitted fields fill the gaps. `Err` carries the skip reason.
fn resolve_entry(
    item: &ItineraryItem,
    resolved: &HashMap<String, LocationDetail>,
    day_city: Option<&str>,
) -> Result<ResolvedEntry, String> {
    let detail = match item.poi_id.as_deref() {
        Some(poi_id) => match resolved.get(poi_id) {
            Some(detail) => Some(detail),
            None => return Err(format!("unresolved poi reference {poi_id}")),
        },
        None => None,
    };

    let name = detail
        .map(|d| d.name.clone())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| item.name.clone());
    if name.is_empty() {
        return Err("entry has neither a name nor a poi reference".to_string());
    }

    let coords = detail.and_then(|d| d.coords());
    Ok(ResolvedEntry {
        name,
        address: detail.and_then(|d| d.address.clone()),
        city: detail
            .and_then(|d| d.city.clone())
            .or_else(|| day_city.map(str::to_string)),
        category: detail
            .map(|d| d.kind.clone())
            .or_else(|| item.category.clone()),
        image_url: item.image_url.clone().or_else(|| {
            detail.and_then(|d| d.images.as_ref().and_then(|imgs| imgs.first().cloned()))
        }),
        images: detail
            .and_then(|d| d.images.clone())
            .or_else(|| item.images.clone()),
        rating: detail.and_then(|d| d.rating).or(item.rating),
        price: detail.and_then(|d| d.price).or(item.price),
        latitude: coords.map(|(_, lat)| lat).or(item.latitude),
        longitude: coords.map(|(lng, _)| lng).or(item.longitude),
        contact: detail.and_then(|d| d.tel.clone()).or_else(|| item.contact.clone()),
        business_hours: detail.and_then(|d| d.business_hours.clone()),
    })
}

/// Turn a submitted itinerary into row values.
///
/// Orders are assigned 1-based per category in list order. Transport legs are
/// synthesized between consecutive geocoded stops when the earlier stop's
/// entry carried a travel-mode hint; explicit transport entries are kept and
/// suppress synthesis for the gap they cover. Unusable entries land in
/// `skipped` and do not interrupt the rest of the list.
pub fn plan_day_rebuild(
    items: &[ItineraryItem],
    resolved: &HashMap<String, LocationDetail>,
    day_city: Option<&str>,
) -> DayRebuildPlan {
    let mut plan = DayRebuildPlan::default();
    let mut pending: Option<PendingLeg> = None;

    for (position, item) in items.iter().enumerate() {
        match item.kind {
            ItemKind::Transportation => {
                let order = plan.transportations.len() as i32 + 1;
                plan.transportations.push(explicit_leg(item, order));
                pending = None;
            }
            ItemKind::Place | ItemKind::Food | ItemKind::Accommodation => {
                let entry = match resolve_entry(item, resolved, day_city) {
                    Ok(entry) => entry,
                    Err(reason) => {
                        plan.skipped.push(SkippedEntry {
                            position,
                            name: item.name.clone(),
                            reason,
                        });
                        continue;
                    }
                };
                let time = item.time.as_deref().and_then(parse_hm);

                if item.kind == ItemKind::Accommodation {
                    plan.accommodation = Some(AccommodationUpdate {
                        name: entry.name.clone(),
                        address: entry.address.clone().or_else(|| item.description.clone()),
                        price: entry.price,
                        rating: entry.rating,
                        latitude: entry.latitude,
                        longitude: entry.longitude,
                        contact: entry.contact.clone(),
                    });
                }

                // The accommodation is still a stop in the travel chain.
                connect_leg(&mut plan, &mut pending, &entry);

                if let (Some(lat), Some(lng)) = (entry.latitude, entry.longitude) {
                    pending = Some(PendingLeg {
                        name: entry.name.clone(),
                        latitude: lat,
                        longitude: lng,
                        mode: item.transportation_mode.clone(),
                        time,
                    });
                } else {
                    pending = None;
                }

                match item.kind {
                    ItemKind::Place => {
                        let order = plan.places.len() as i32 + 1;
                        plan.places.push(NewTripPlace {
                            visit_order: order,
                            name: entry.name,
                            address: entry.address,
                            city: entry.city,
                            category: entry.category,
                            image_url: entry.image_url,
                            images: entry.images,
                            rating: entry.rating,
                            price: entry.price,
                            start_time: time,
                            duration: item.duration,
                            latitude: entry.latitude,
                            longitude: entry.longitude,
                            poi_id: item.poi_id.clone(),
                            contact: entry.contact,
                            is_highlight: i16::from(item.is_highlight.unwrap_or(false)),
                        });
                    }
                    ItemKind::Food => {
                        let order = plan.foods.len() as i32 + 1;
                        plan.foods.push(NewTripFood {
                            visit_order: order,
                            name: entry.name,
                            address: entry.address,
                            city: entry.city,
                            category: entry.category,
                            image_url: entry.image_url,
                            images: entry.images,
                            rating: entry.rating,
                            price: entry.price,
                            start_time: time,
                            duration: item.duration,
                            latitude: entry.latitude,
                            longitude: entry.longitude,
                            poi_id: item.poi_id.clone(),
                            contact: entry.contact,
                            recommendation: item.description.clone(),
                            business_hours: entry.business_hours,
                            is_highlight: i16::from(item.is_highlight.unwrap_or(false)),
                        });
                    }
                    _ => {}
                }
            }
            ItemKind::Other => {
                plan.skipped.push(SkippedEntry {
                    position,
                    name: item.name.clone(),
                    reason: "unknown entry category".to_string(),
                });
            }
        }
    }

    plan
}

/// Emit a synthesized leg from the previous geocoded stop when it carried a
/// travel hint and the current entry is geocoded too.
fn connect_leg(plan: &mut DayRebuildPlan, pending: &mut Option<PendingLeg>, entry: &ResolvedEntry) {
    if let (Some(lat), Some(lng)) = (entry.latitude, entry.longitude) {
        if let Some(p) = pending.take() {
            if p.mode.is_some() {
                let order = plan.transportations.len() as i32 + 1;
                plan.transportations
                    .push(synthesized_leg(&p, &entry.name, lat, lng, order));
            }
        }
    }
}

fn explicit_leg(item: &ItineraryItem, order: i32) -> NewTripTransportation {
    let from = item.from_location.clone().unwrap_or(LocationPoint {
        name: String::new(),
        latitude: None,
        longitude: None,
    });
    let to = item.to_location.clone().unwrap_or(LocationPoint {
        name: String::new(),
        latitude: None,
        longitude: None,
    });
    let mode = item.transportation_mode.clone();
    let (amap_url, web_url) = match (&item.navigation, from.latitude, from.longitude, to.latitude, to.longitude) {
        (Some(nav), ..) => (nav.amap_url.clone(), nav.web_url.clone()),
        (None, Some(flat), Some(flng), Some(tlat), Some(tlng)) => {
            let mode = mode.as_deref().unwrap_or("car");
            (
                Some(amap_nav_url(&from.name, flat, flng, &to.name, tlat, tlng, mode)),
                Some(web_nav_url(&from.name, flat, flng, &to.name, tlat, tlng, mode)),
            )
        }
        _ => (None, None),
    };
    NewTripTransportation {
        transport_order: order,
        from_name: from.name,
        from_latitude: from.latitude,
        from_longitude: from.longitude,
        to_name: to.name,
        to_latitude: to.latitude,
        to_longitude: to.longitude,
        start_time: item.time.as_deref().and_then(parse_hm),
        duration: item.duration,
        distance: item.distance,
        mode,
        description: item.description.clone(),
        amap_navigation_url: amap_url,
        web_navigation_url: web_url,
    }
}

fn synthesized_leg(
    from: &PendingLeg,
    to_name: &str,
    to_lat: f64,
    to_lng: f64,
    order: i32,
) -> NewTripTransportation {
    let mode = from.mode.clone().unwrap_or_else(|| "car".to_string());
    let meters = haversine_m(from.latitude, from.longitude, to_lat, to_lng);
    let km = (meters / 1000.0 * 100.0).round() / 100.0;
    NewTripTransportation {
        transport_order: order,
        from_name: from.name.clone(),
        from_latitude: Some(from.latitude),
        from_longitude: Some(from.longitude),
        to_name: to_name.to_string(),
        to_latitude: Some(to_lat),
        to_longitude: Some(to_lng),
        start_time: from.time,
        duration: None,
        distance: Some(km),
        description: Some(format!("前往{to_name}")),
        amap_navigation_url: Some(amap_nav_url(
            &from.name,
            from.latitude,
            from.longitude,
            to_name,
            to_lat,
            to_lng,
            &mode,
        )),
        web_navigation_url: Some(web_nav_url(
            &from.name,
            from.latitude,
            from.longitude,
            to_name,
            to_lat,
            to_lng,
            &mode,
        )),
        mode: Some(mode),
    }
}

/// Great-circle distance in meters.
pub fn haversine_m(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    const EARTH_RADIUS_M: f64 = 6_371_000.0;
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lng2 - lng1).to_radians();
    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
}

fn encode(s: &str) -> String {
    url::form_urlencoded::byte_serialize(s.as_bytes()).collect()
}

fn amap_mode_flag(mode: &str) -> &'static str {
    match mode {
        "bus" | "transit" => "1",
        "walk" | "walking" => "2",
        "bike" | "riding" => "3",
        _ => "0",
    }
}

/// Deep link for the amap mobile app.
pub fn amap_nav_url(
    from_name: &str,
    from_lat: f64,
    from_lng: f64,
    to_name: &str,
    to_lat: f64,
    to_lng: f64,
    mode: &str,
) -> String {
    format!(
        "androidamap://route/plan/?sourceApplication=tripplan\
         &slat={from_lat}&slon={from_lng}&sname={}\
         &dlat={to_lat}&dlon={to_lng}&dname={}&dev=0&t={}",
        encode(from_name),
        encode(to_name),
        amap_mode_flag(mode),
    )
}

/// Browser fallback for clients without the amap app.
pub fn web_nav_url(
    from_name: &str,
    from_lat: f64,
    from_lng: f64,
    to_name: &str,
    to_lat: f64,
    to_lng: f64,
    mode: &str,
) -> String {
    format!(
        "https://uri.amap.com/navigation?from={from_lng},{from_lat},{}\
         &to={to_lng},{to_lat},{}&mode={mode}&src=tripplan",
        encode(from_name),
        encode(to_name),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::types::Json;
    use time::macros::{date, datetime, time};

    fn day_fixture() -> TripDay {
        TripDay {
            id: 10,
            trip_id: 1,
            day_index: 1,
            date: date!(2025 - 05 - 01),
            start_datetime: datetime!(2025-05-01 09:00 UTC),
            timezone: "Asia/Shanghai".into(),
            title: Some("DAY1".into()),
            summary: None,
            city: Some("广州".into()),
            theme: None,
            weather_condition: None,
            temperature: None,
            weather_icon: None,
            humidity: None,
            wind: None,
            precipitation: None,
            uv_index: None,
            sunrise: None,
            sunset: None,
            accommodation_name: None,
            accommodation_address: None,
            accommodation_price: None,
            accommodation_rating: None,
            accommodation_latitude: None,
            accommodation_longitude: None,
            accommodation_contact: None,
            start_point_name: None,
            start_point_time: None,
            start_point_type: None,
            end_point_name: None,
            end_point_time: None,
            end_point_type: None,
            estimated_cost: None,
            is_generated: 0,
            place_count: 0,
            food_count: 0,
            version: 1,
            created_at: datetime!(2025-04-01 00:00 UTC),
            updated_at: datetime!(2025-04-01 00:00 UTC),
        }
    }

    fn place_row(name: &str, start: Option<Time>) -> TripPlace {
        TripPlace {
            id: 0,
            trip_id: 1,
            day_id: 10,
            day_index: 1,
            visit_order: 1,
            name: name.into(),
            address: None,
            city: None,
            category: None,
            image_url: None,
            images: None,
            rating: None,
            price: None,
            start_time: start,
            end_time: None,
            duration: None,
            latitude: None,
            longitude: None,
            poi_id: None,
            contact: None,
            notes: None,
            is_highlight: 0,
        }
    }

    fn food_row(name: &str, start: Option<Time>) -> TripFood {
        TripFood {
            id: 0,
            trip_id: 1,
            day_id: 10,
            day_index: 1,
            visit_order: 1,
            name: name.into(),
            address: None,
            city: None,
            category: None,
            image_url: None,
            images: None,
            rating: None,
            price: None,
            start_time: start,
            duration: None,
            latitude: None,
            longitude: None,
            poi_id: None,
            contact: None,
            description: None,
            recommendation: None,
            business_hours: None,
            is_highlight: 0,
        }
    }

    fn detail(id: &str, name: &str, lng: f64, lat: f64) -> LocationDetail {
        LocationDetail {
            id: id.into(),
            name: name.into(),
            kind: "风景名胜".into(),
            type_code: None,
            address: Some("某地址".into()),
            location: Some(format!("{lng},{lat}")),
            district: None,
            city: Some("广州".into()),
            province: None,
            tel: None,
            website: None,
            business_hours: None,
            rating: Some(4.5),
            price: Some(50.0),
            images: None,
            tags: None,
        }
    }

    fn entry(kind: ItemKind, name: &str, poi: Option<&str>, time: Option<&str>) -> ItineraryItem {
        let mut item = ItineraryItem::bare(kind, name);
        item.poi_id = poi.map(str::to_string);
        item.time = time.map(str::to_string);
        item
    }

    #[test]
    fn merge_sorts_by_time_with_untimed_last() {
        let day = day_fixture();
        let places = vec![
            place_row("晚到的", Some(time!(15:00))),
            place_row("没时间的", None),
            place_row("早到的", Some(time!(09:30))),
        ];
        let foods = vec![food_row("午饭", Some(time!(12:00)))];
        let items = assemble_day(&day, &places, &foods, &[]);

        let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["早到的", "午饭", "晚到的", "没时间的"]);
    }

    #[test]
    fn merge_ties_keep_category_pooling_order() {
        let day = day_fixture();
        let places = vec![place_row("景点", Some(time!(12:00)))];
        let foods = vec![food_row("饭店", Some(time!(12:00)))];
        let items = assemble_day(&day, &places, &foods, &[]);

        assert_eq!(items[0].kind, ItemKind::Place);
        assert_eq!(items[1].kind, ItemKind::Food);
    }

    #[test]
    fn merge_prepends_accommodation_start() {
        let mut day = day_fixture();
        day.accommodation_name = Some("城市酒店".into());
        day.start_point_time = Some(time!(07:30));
        let places = vec![place_row("景点", Some(time!(10:00)))];
        let items = assemble_day(&day, &places, &[], &[]);

        assert_eq!(items[0].kind, ItemKind::Accommodation);
        assert_eq!(items[0].name, "城市酒店");
        assert_eq!(items[0].time.as_deref(), Some("07:30"));
    }

    #[test]
    fn merge_needs_start_time_for_accommodation_entry() {
        let mut day = day_fixture();
        day.accommodation_name = Some("城市酒店".into());
        day.start_point_time = None;
        let places = vec![place_row("景点", Some(time!(10:00)))];
        let items = assemble_day(&day, &places, &[], &[]);

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].kind, ItemKind::Place);
    }

    #[test]
    fn merge_formats_place_and_food_descriptions() {
        let day = day_fixture();
        let mut place = place_row("博物馆", None);
        place.price = Some(60.0);
        place.duration = Some(90);
        let mut food = food_row("老字号", None);
        food.price = Some(85.5);
        food.recommendation = Some("招牌烧鹅".into());
        let items = assemble_day(&day, &[place], &[food], &[]);

        assert_eq!(
            items[0].description.as_deref(),
            Some("门票：60元/人 | 建议游览90分钟")
        );
        assert_eq!(
            items[1].description.as_deref(),
            Some("人均：85.5元 | 招牌烧鹅")
        );
    }

    #[test]
    fn rebuild_orders_are_one_based_per_category() {
        let resolved: HashMap<String, LocationDetail> = [
            ("p1".to_string(), detail("p1", "景点一", 113.3, 23.1)),
            ("p2".to_string(), detail("p2", "景点二", 113.4, 23.2)),
            ("f1".to_string(), detail("f1", "饭店一", 113.5, 23.3)),
        ]
        .into();
        let items = vec![
            entry(ItemKind::Place, "", Some("p1"), Some("09:00")),
            entry(ItemKind::Food, "", Some("f1"), Some("12:00")),
            entry(ItemKind::Place, "", Some("p2"), Some("14:00")),
        ];
        let plan = plan_day_rebuild(&items, &resolved, Some("广州"));

        assert_eq!(plan.places.len(), 2);
        assert_eq!(plan.foods.len(), 1);
        assert_eq!(plan.places[0].visit_order, 1);
        assert_eq!(plan.places[1].visit_order, 2);
        assert_eq!(plan.foods[0].visit_order, 1);
        assert!(plan.skipped.is_empty());
    }

    #[test]
    fn rebuild_applies_resolved_attributes() {
        let resolved: HashMap<String, LocationDetail> =
            [("p1".to_string(), detail("p1", "镇海楼", 113.27, 23.14))].into();
        let items = vec![entry(ItemKind::Place, "提交名", Some("p1"), None)];
        let plan = plan_day_rebuild(&items, &resolved, Some("广州"));

        let place = &plan.places[0];
        assert_eq!(place.name, "镇海楼");
        assert_eq!(place.latitude, Some(23.14));
        assert_eq!(place.longitude, Some(113.27));
        assert_eq!(place.rating, Some(4.5));
        assert_eq!(place.city.as_deref(), Some("广州"));
    }

    #[test]
    fn rebuild_skips_unresolved_and_keeps_rest() {
        let resolved: HashMap<String, LocationDetail> =
            [("p1".to_string(), detail("p1", "景点一", 113.3, 23.1))].into();
        let items = vec![
            entry(ItemKind::Place, "不存在", Some("missing"), Some("09:00")),
            entry(ItemKind::Place, "", Some("p1"), Some("11:00")),
        ];
        let plan = plan_day_rebuild(&items, &resolved, None);

        assert_eq!(plan.places.len(), 1);
        assert_eq!(plan.places[0].visit_order, 1);
        assert_eq!(plan.skipped.len(), 1);
        assert_eq!(plan.skipped[0].position, 0);
        assert!(plan.skipped[0].reason.contains("missing"));
    }

    #[test]
    fn rebuild_accepts_self_described_entries() {
        let mut item = entry(ItemKind::Place, "自定义地点", None, Some("10:00"));
        item.latitude = Some(23.1);
        item.longitude = Some(113.3);
        let plan = plan_day_rebuild(&[item], &HashMap::new(), None);

        assert_eq!(plan.places.len(), 1);
        assert_eq!(plan.places[0].name, "自定义地点");
        assert!(plan.skipped.is_empty());
    }

    #[test]
    fn rebuild_skips_nameless_entries() {
        let plan = plan_day_rebuild(
            &[entry(ItemKind::Place, "", None, None)],
            &HashMap::new(),
            None,
        );
        assert!(plan.places.is_empty());
        assert_eq!(plan.skipped.len(), 1);
    }

    #[test]
    fn rebuild_skips_unknown_categories() {
        let json = r#"{"type":"teleport","name":"任意门"}"#;
        let item: ItineraryItem = serde_json::from_str(json).unwrap();
        let plan = plan_day_rebuild(&[item], &HashMap::new(), None);

        assert!(plan.places.is_empty());
        assert_eq!(plan.skipped[0].reason, "unknown entry category");
    }

    #[test]
    fn rebuild_synthesizes_leg_between_geocoded_stops() {
        let resolved: HashMap<String, LocationDetail> = [
            ("p1".to_string(), detail("p1", "景点一", 113.30, 23.10)),
            ("p2".to_string(), detail("p2", "景点二", 113.40, 23.20)),
        ]
        .into();
        let mut first = entry(ItemKind::Place, "", Some("p1"), Some("09:00"));
        first.transportation_mode = Some("walk".into());
        let second = entry(ItemKind::Place, "", Some("p2"), Some("11:00"));
        let plan = plan_day_rebuild(&[first, second], &resolved, None);

        assert_eq!(plan.transportations.len(), 1);
        let leg = &plan.transportations[0];
        assert_eq!(leg.transport_order, 1);
        assert_eq!(leg.from_name, "景点一");
        assert_eq!(leg.to_name, "景点二");
        assert_eq!(leg.mode.as_deref(), Some("walk"));
        assert_eq!(leg.start_time, Some(time!(09:00)));
        assert!(leg.distance.unwrap() > 0.0);
        assert!(leg.amap_navigation_url.as_deref().unwrap().contains("t=2"));
    }

    #[test]
    fn rebuild_does_not_synthesize_without_mode_hint() {
        let resolved: HashMap<String, LocationDetail> = [
            ("p1".to_string(), detail("p1", "景点一", 113.30, 23.10)),
            ("p2".to_string(), detail("p2", "景点二", 113.40, 23.20)),
        ]
        .into();
        let items = vec![
            entry(ItemKind::Place, "", Some("p1"), None),
            entry(ItemKind::Place, "", Some("p2"), None),
        ];
        let plan = plan_day_rebuild(&items, &resolved, None);
        assert!(plan.transportations.is_empty());
    }

    #[test]
    fn rebuild_keeps_explicit_legs_and_suppresses_synthesis() {
        let resolved: HashMap<String, LocationDetail> = [
            ("p1".to_string(), detail("p1", "景点一", 113.30, 23.10)),
            ("p2".to_string(), detail("p2", "景点二", 113.40, 23.20)),
        ]
        .into();
        let mut first = entry(ItemKind::Place, "", Some("p1"), Some("09:00"));
        first.transportation_mode = Some("car".into());
        let mut leg = entry(ItemKind::Transportation, "", None, Some("09:30"));
        leg.transportation_mode = Some("bus".into());
        leg.from_location = Some(LocationPoint {
            name: "景点一".into(),
            latitude: Some(23.10),
            longitude: Some(113.30),
        });
        leg.to_location = Some(LocationPoint {
            name: "景点二".into(),
            latitude: Some(23.20),
            longitude: Some(113.40),
        });
        let second = entry(ItemKind::Place, "", Some("p2"), Some("11:00"));
        let plan = plan_day_rebuild(&[first, leg, second], &resolved, None);

        assert_eq!(plan.transportations.len(), 1);
        assert_eq!(plan.transportations[0].mode.as_deref(), Some("bus"));
    }

    #[test]
    fn rebuild_updates_accommodation_snapshot() {
        let resolved: HashMap<String, LocationDetail> =
            [("h1".to_string(), detail("h1", "城市酒店", 113.25, 23.12))].into();
        let mut hotel = entry(ItemKind::Accommodation, "", Some("h1"), Some("20:00"));
        hotel.price = Some(420.0);
        let plan = plan_day_rebuild(&[hotel], &resolved, None);

        assert!(plan.places.is_empty());
        let acc = plan.accommodation.expect("accommodation update");
        assert_eq!(acc.name, "城市酒店");
        assert_eq!(acc.latitude, Some(23.12));
        // Resolved detail price wins over the submitted value.
        assert_eq!(acc.price, Some(50.0));
    }

    fn place_from_plan(new: &NewTripPlace) -> TripPlace {
        let mut row = place_row(&new.name, new.start_time);
        row.visit_order = new.visit_order;
        row.latitude = new.latitude;
        row.longitude = new.longitude;
        row
    }

    fn food_from_plan(new: &NewTripFood) -> TripFood {
        let mut row = food_row(&new.name, new.start_time);
        row.visit_order = new.visit_order;
        row
    }

    #[test]
    fn rebuild_then_merge_preserves_ascending_order() {
        let resolved: HashMap<String, LocationDetail> = [
            ("p1".to_string(), detail("p1", "早上的景点", 113.30, 23.10)),
            ("f1".to_string(), detail("f1", "中午的饭店", 113.35, 23.15)),
            ("p2".to_string(), detail("p2", "下午的景点", 113.40, 23.20)),
        ]
        .into();
        let items = vec![
            entry(ItemKind::Place, "", Some("p1"), Some("09:00")),
            entry(ItemKind::Food, "", Some("f1"), Some("12:00")),
            entry(ItemKind::Place, "", Some("p2"), Some("15:00")),
        ];
        let plan = plan_day_rebuild(&items, &resolved, None);

        let places: Vec<TripPlace> = plan.places.iter().map(place_from_plan).collect();
        let foods: Vec<TripFood> = plan.foods.iter().map(food_from_plan).collect();
        let merged = assemble_day(&day_fixture(), &places, &foods, &[]);

        let names: Vec<&str> = merged.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["早上的景点", "中午的饭店", "下午的景点"]);
    }

    #[test]
    fn rebuild_treats_bad_time_as_untimed() {
        let mut item = entry(ItemKind::Place, "没有时间的景点", None, Some("25:99"));
        item.latitude = Some(23.1);
        item.longitude = Some(113.3);
        let plan = plan_day_rebuild(&[item], &HashMap::new(), None);
        assert_eq!(plan.places[0].start_time, None);
    }

    #[test]
    fn parse_hm_accepts_and_rejects() {
        assert_eq!(parse_hm("09:30"), Some(time!(09:30)));
        assert_eq!(parse_hm("23:59"), Some(time!(23:59)));
        assert_eq!(parse_hm("25:00"), None);
        assert_eq!(parse_hm("morning"), None);
    }

    #[test]
    fn haversine_matches_known_distance() {
        // Guangzhou Tower to Beijing Road, roughly 6.1 km.
        let d = haversine_m(23.1066, 113.3245, 23.1254, 113.2683);
        assert!((5500.0..6500.0).contains(&d), "got {d}");
    }

    #[test]
    fn nav_urls_encode_names() {
        let amap = amap_nav_url("起点 A", 23.1, 113.3, "终点", 23.2, 113.4, "car");
        assert!(amap.starts_with("androidamap://route/plan/?"));
        assert!(!amap.contains("起点 A"));
        assert!(amap.contains("t=0"));

        let web = web_nav_url("起点", 23.1, 113.3, "终点", 23.2, 113.4, "walk");
        assert!(web.starts_with("https://uri.amap.com/navigation?"));
        assert!(web.contains("mode=walk"));
        assert!(web.contains("113.3,23.1"));
    }

    #[test]
    fn item_serde_uses_type_tag() {
        let place = ItineraryItem::bare(ItemKind::Place, "景点");
        let json = serde_json::to_value(&place).unwrap();
        assert_eq!(json["type"], "place");
        assert!(json.get("poi_id").is_none());
    }

    #[test]
    fn images_fall_back_to_single_image_url() {
        let day = day_fixture();
        let mut place = place_row("景点", None);
        place.images = Some(Json(vec!["a.jpg".into(), "b.jpg".into()]));
        let items = assemble_day(&day, &[place], &[], &[]);
        assert_eq!(items[0].images.as_ref().unwrap().len(), 2);
    }
}
