//! In-memory location provider for development and tests, serving POIs
//! registered up front instead of calling the mapping API.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::ApiError;

use super::amap::LocationProvider;
use super::dto::{LocationDetail, LocationListResponse, LocationSummary};

#[derive(Default)]
pub struct MockLocationProvider {
    pois: Mutex<HashMap<String, LocationDetail>>,
}

impl MockLocationProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, detail: LocationDetail) {
        self.pois
            .lock()
            .expect("mock poi map poisoned")
            .insert(detail.id.clone(), detail);
    }

    /// Minimal POI with coordinates, enough for itinerary resolution.
    pub fn poi(id: &str, name: &str, lng: f64, lat: f64) -> LocationDetail {
        LocationDetail {
            id: id.to_string(),
            name: name.to_string(),
            kind: "风景名胜".to_string(),
            type_code: None,
            address: None,
            location: Some(format!("{lng},{lat}")),
            district: None,
            city: None,
            province: None,
            tel: None,
            website: None,
            business_hours: None,
            rating: None,
            price: None,
            images: None,
            tags: None,
        }
    }

    fn summaries(&self, filter: impl Fn(&LocationDetail) -> bool) -> Vec<LocationSummary> {
        self.pois
            .lock()
            .expect("mock poi map poisoned")
            .values()
            .filter(|d| filter(d))
            .map(|d| LocationSummary {
                id: d.id.clone(),
                name: d.name.clone(),
                kind: d.kind.clone(),
                address: d.address.clone(),
                location: d.location.clone(),
                district: d.district.clone(),
                city: d.city.clone(),
                province: d.province.clone(),
                image_url: d.images.as_ref().and_then(|i| i.first().cloned()),
                rating: d.rating,
                price: d.price,
                distance: None,
                tel: d.tel.clone(),
                business_hours: d.business_hours.clone(),
            })
            .collect()
    }
}

#[async_trait]
impl LocationProvider for MockLocationProvider {
    async fn search(
        &self,
        keyword: &str,
        _city: Option<&str>,
        _page: u32,
        _page_size: u32,
    ) -> Result<LocationListResponse, ApiError> {
        let locations = self.summaries(|d| d.name.contains(keyword));
        Ok(LocationListResponse {
            total: locations.len() as i64,
            locations,
        })
    }

    async fn detail(&self, poi_id: &str) -> Result<Option<LocationDetail>, ApiError> {
        Ok(self
            .pois
            .lock()
            .expect("mock poi map poisoned")
            .get(poi_id)
            .cloned())
    }

    async fn around(
        &self,
        _center: &str,
        _radius: u32,
        _kind: Option<&str>,
        _page: u32,
        _page_size: u32,
    ) -> Result<LocationListResponse, ApiError> {
        let locations = self.summaries(|_| true);
        Ok(LocationListResponse {
            total: locations.len() as i64,
            locations,
        })
    }

    async fn districts(
        &self,
        _keywords: Option<&str>,
        _subdistrict: u8,
    ) -> Result<serde_json::Value, ApiError> {
        Ok(serde_json::json!([]))
    }
}
