use serde::{Deserialize, Serialize};

/// One POI row as returned by search / around lookups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationSummary {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub address: Option<String>,
    /// "lng,lat" as the mapping provider reports it.
    pub location: Option<String>,
    pub district: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_hours: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationDetail {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub type_code: Option<String>,
    pub address: Option<String>,
    pub location: Option<String>,
    pub district: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub tel: Option<String>,
    pub website: Option<String>,
    pub business_hours: Option<String>,
    pub rating: Option<f64>,
    pub price: Option<f64>,
    pub images: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
}

impl LocationDetail {
    /// Parsed (longitude, latitude), when the provider gave coordinates.
    pub fn coords(&self) -> Option<(f64, f64)> {
        self.location.as_deref().and_then(parse_location)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LocationListResponse {
    pub total: i64,
    pub locations: Vec<LocationSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DistrictsResponse {
    pub districts: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub keyword: String,
    pub city: Option<String>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

#[derive(Debug, Deserialize)]
pub struct DetailQuery {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct AroundQuery {
    /// Center point, "lng,lat".
    pub location: String,
    #[serde(default = "default_radius")]
    pub radius: u32,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

#[derive(Debug, Deserialize)]
pub struct DistrictsQuery {
    pub keywords: Option<String>,
    #[serde(default = "default_subdistrict")]
    pub subdistrict: u8,
}

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    20
}

fn default_radius() -> u32 {
    3000
}

fn default_subdistrict() -> u8 {
    1
}

/// Parse a "lng,lat" coordinate pair.
pub fn parse_location(s: &str) -> Option<(f64, f64)> {
    let (lng, lat) = s.split_once(',')?;
    let lng = lng.trim().parse::<f64>().ok()?;
    let lat = lat.trim().parse::<f64>().ok()?;
    Some((lng, lat))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_location_pair() {
        assert_eq!(parse_location("113.26,23.13"), Some((113.26, 23.13)));
        assert_eq!(parse_location("113.26 , 23.13"), Some((113.26, 23.13)));
    }

    #[test]
    fn rejects_malformed_location() {
        assert_eq!(parse_location("nonsense"), None);
        assert_eq!(parse_location("113.26"), None);
        assert_eq!(parse_location("a,b"), None);
    }
}
