//! Amap (高德) POI client.
//!
//! The provider reports success via `status == "1"`; anything else carries a
//! human-readable `info` message which we surface as a validation error.

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;

use crate::config::AmapConfig;
use crate::error::ApiError;

use super::dto::{LocationDetail, LocationListResponse, LocationSummary};

/// POI resolution, consumed by the trip service and the locations endpoints.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn search(
        &self,
        keyword: &str,
        city: Option<&str>,
        page: u32,
        page_size: u32,
    ) -> Result<LocationListResponse, ApiError>;

    /// `None` when the id resolves to no POI.
    async fn detail(&self, poi_id: &str) -> Result<Option<LocationDetail>, ApiError>;

    async fn around(
        &self,
        center: &str,
        radius: u32,
        kind: Option<&str>,
        page: u32,
        page_size: u32,
    ) -> Result<LocationListResponse, ApiError>;

    async fn districts(
        &self,
        keywords: Option<&str>,
        subdistrict: u8,
    ) -> Result<serde_json::Value, ApiError>;
}

#[derive(Debug, Deserialize)]
struct AmapPoiEnvelope {
    status: String,
    info: Option<String>,
    count: Option<String>,
    #[serde(default)]
    pois: Vec<AmapPoi>,
}

#[derive(Debug, Deserialize)]
struct AmapDistrictEnvelope {
    status: String,
    info: Option<String>,
    #[serde(default)]
    districts: serde_json::Value,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct AmapPoi {
    id: Option<String>,
    name: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    typecode: Option<String>,
    address: Option<String>,
    location: Option<String>,
    adname: Option<String>,
    cityname: Option<String>,
    pname: Option<String>,
    tel: Option<String>,
    website: Option<String>,
    business_hours: Option<String>,
    distance: Option<String>,
    tag: Option<String>,
    biz_ext: Option<AmapBizExt>,
    photos: Option<Vec<AmapPhoto>>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct AmapBizExt {
    rating: Option<String>,
    cost: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct AmapPhoto {
    url: Option<String>,
}

pub struct AmapClient {
    http: reqwest::Client,
    key: String,
    base_url: String,
}

impl AmapClient {
    pub fn new(http: reqwest::Client, config: &AmapConfig) -> Self {
        Self {
            http,
            key: config.key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn get_pois(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<AmapPoiEnvelope, ApiError> {
        let url = format!("{}/{}", self.base_url, path);
        let mut query: Vec<(&str, String)> = vec![("key", self.key.clone())];
        query.extend_from_slice(params);
        let resp: AmapPoiEnvelope = self
            .http
            .get(&url)
            .query(&query)
            .send()
            .await
            .context("amap request failed")?
            .json()
            .await
            .context("amap response was not valid json")?;
        if resp.status != "1" {
            let info = resp.info.unwrap_or_else(|| "amap lookup failed".into());
            return Err(ApiError::validation(info));
        }
        Ok(resp)
    }

    fn poi_summary(poi: AmapPoi) -> LocationSummary {
        let (rating, price) = biz_numbers(&poi);
        LocationSummary {
            id: poi.id.unwrap_or_default(),
            name: poi.name.unwrap_or_default(),
            kind: primary_type(poi.kind.as_deref()),
            address: poi.address,
            location: poi.location,
            district: poi.adname,
            city: poi.cityname,
            province: poi.pname,
            image_url: poi
                .photos
                .as_ref()
                .and_then(|p| p.first())
                .and_then(|p| p.url.clone()),
            rating,
            price,
            distance: poi.distance.as_deref().and_then(|d| d.parse().ok()),
            tel: poi.tel,
            business_hours: poi.business_hours,
        }
    }

    fn poi_detail(poi: AmapPoi) -> LocationDetail {
        let (rating, price) = biz_numbers(&poi);
        LocationDetail {
            id: poi.id.unwrap_or_default(),
            name: poi.name.unwrap_or_default(),
            kind: primary_type(poi.kind.as_deref()),
            type_code: poi.typecode,
            address: poi.address,
            location: poi.location,
            district: poi.adname,
            city: poi.cityname,
            province: poi.pname,
            tel: poi.tel,
            website: poi.website,
            business_hours: poi.business_hours,
            rating,
            price,
            images: poi
                .photos
                .map(|ps| ps.into_iter().filter_map(|p| p.url).collect()),
            tags: poi
                .tag
                .map(|t| t.split(',').map(|s| s.to_string()).collect()),
        }
    }
}

fn primary_type(kind: Option<&str>) -> String {
    kind.and_then(|k| k.split(';').next())
        .unwrap_or_default()
        .to_string()
}

fn biz_numbers(poi: &AmapPoi) -> (Option<f64>, Option<f64>) {
    match &poi.biz_ext {
        Some(ext) => (
            ext.rating.as_deref().and_then(|r| r.parse().ok()),
            ext.cost.as_deref().and_then(|c| c.parse().ok()),
        ),
        None => (None, None),
    }
}

#[async_trait]
impl LocationProvider for AmapClient {
    async fn search(
        &self,
        keyword: &str,
        city: Option<&str>,
        page: u32,
        page_size: u32,
    ) -> Result<LocationListResponse, ApiError> {
        let mut params = vec![
            ("keywords", keyword.to_string()),
            ("offset", page_size.to_string()),
            ("page", page.to_string()),
            ("extensions", "all".to_string()),
        ];
        if let Some(city) = city {
            params.push(("city", city.to_string()));
        }
        let resp = self.get_pois("place/text", &params).await?;
        let total = resp
            .count
            .as_deref()
            .and_then(|c| c.parse().ok())
            .unwrap_or(0);
        Ok(LocationListResponse {
            total,
            locations: resp.pois.into_iter().map(Self::poi_summary).collect(),
        })
    }

    async fn detail(&self, poi_id: &str) -> Result<Option<LocationDetail>, ApiError> {
        let params = vec![
            ("id", poi_id.to_string()),
            ("extensions", "all".to_string()),
        ];
        let resp = self.get_pois("place/detail", &params).await?;
        Ok(resp.pois.into_iter().next().map(Self::poi_detail))
    }

    async fn around(
        &self,
        center: &str,
        radius: u32,
        kind: Option<&str>,
        page: u32,
        page_size: u32,
    ) -> Result<LocationListResponse, ApiError> {
        let mut params = vec![
            ("location", center.to_string()),
            ("radius", radius.to_string()),
            ("offset", page_size.to_string()),
            ("page", page.to_string()),
            ("extensions", "all".to_string()),
        ];
        if let Some(kind) = kind {
            params.push(("types", kind.to_string()));
        }
        let resp = self.get_pois("place/around", &params).await?;
        let total = resp
            .count
            .as_deref()
            .and_then(|c| c.parse().ok())
            .unwrap_or(0);
        Ok(LocationListResponse {
            total,
            locations: resp.pois.into_iter().map(Self::poi_summary).collect(),
        })
    }

    async fn districts(
        &self,
        keywords: Option<&str>,
        subdistrict: u8,
    ) -> Result<serde_json::Value, ApiError> {
        let url = format!("{}/config/district", self.base_url);
        let mut query: Vec<(&str, String)> = vec![
            ("key", self.key.clone()),
            ("subdistrict", subdistrict.to_string()),
            ("extensions", "base".to_string()),
        ];
        if let Some(keywords) = keywords {
            query.push(("keywords", keywords.to_string()));
        }
        let resp: AmapDistrictEnvelope = self
            .http
            .get(&url)
            .query(&query)
            .send()
            .await
            .context("amap district request failed")?
            .json()
            .await
            .context("amap district response was not valid json")?;
        if resp.status != "1" {
            let info = resp.info.unwrap_or_else(|| "district lookup failed".into());
            return Err(ApiError::validation(info));
        }
        Ok(resp.districts)
    }
}
