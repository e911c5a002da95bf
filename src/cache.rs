//! In-process response caches. Day and food payloads are keyed so that a
//! write to one day only evicts that day's entries.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;

use crate::config::CacheConfig;
use crate::locations::dto::{LocationDetail, LocationListResponse};
use crate::trips::dto::{TripDayDetailResponse, TripFoodsResponse};

pub struct ResponseCache {
    day_detail: Cache<(i64, i32), Arc<TripDayDetailResponse>>,
    trip_foods: Cache<i64, Arc<TripFoodsResponse>>,
    location_lists: Cache<String, Arc<LocationListResponse>>,
    location_detail: Cache<String, Arc<LocationDetail>>,
}

impl ResponseCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            day_detail: Cache::builder()
                .max_capacity(10_000)
                .time_to_live(Duration::from_secs(config.day_detail_ttl_secs))
                .build(),
            trip_foods: Cache::builder()
                .max_capacity(10_000)
                .time_to_live(Duration::from_secs(config.foods_ttl_secs))
                .build(),
            location_lists: Cache::builder()
                .max_capacity(10_000)
                .time_to_live(Duration::from_secs(config.location_ttl_secs))
                .build(),
            location_detail: Cache::builder()
                .max_capacity(10_000)
                .time_to_live(Duration::from_secs(config.location_ttl_secs))
                .build(),
        }
    }

    pub async fn get_day_detail(
        &self,
        trip_id: i64,
        day_index: i32,
    ) -> Option<Arc<TripDayDetailResponse>> {
        self.day_detail.get(&(trip_id, day_index)).await
    }

    pub async fn put_day_detail(&self, detail: Arc<TripDayDetailResponse>) {
        self.day_detail
            .insert((detail.trip_id, detail.day_index), detail.clone())
            .await;
    }

    pub async fn invalidate_day(&self, trip_id: i64, day_index: i32) {
        self.day_detail.invalidate(&(trip_id, day_index)).await;
    }

    pub async fn get_trip_foods(&self, trip_id: i64) -> Option<Arc<TripFoodsResponse>> {
        self.trip_foods.get(&trip_id).await
    }

    pub async fn put_trip_foods(&self, foods: Arc<TripFoodsResponse>) {
        self.trip_foods.insert(foods.trip_id, foods.clone()).await;
    }

    pub async fn invalidate_trip_foods(&self, trip_id: i64) {
        self.trip_foods.invalidate(&trip_id).await;
    }

    /// Search and around lookups share one cache; the key embeds the query.
    pub async fn get_location_list(&self, key: &str) -> Option<Arc<LocationListResponse>> {
        self.location_lists.get(key).await
    }

    pub async fn put_location_list(&self, key: String, list: Arc<LocationListResponse>) {
        self.location_lists.insert(key, list).await;
    }

    pub async fn get_location_detail(&self, poi_id: &str) -> Option<Arc<LocationDetail>> {
        self.location_detail.get(poi_id).await
    }

    pub async fn put_location_detail(&self, poi_id: String, detail: Arc<LocationDetail>) {
        self.location_detail.insert(poi_id, detail).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache() -> ResponseCache {
        ResponseCache::new(&CacheConfig {
            day_detail_ttl_secs: 60,
            foods_ttl_secs: 60,
            location_ttl_secs: 60,
        })
    }

    #[tokio::test]
    async fn day_detail_round_trip_and_invalidation() {
        let cache = cache();
        let detail = Arc::new(TripDayDetailResponse {
            trip_id: 1,
            day_index: 2,
            date: time::macros::date!(2025 - 05 - 01),
            title: None,
            city: None,
            weather: None,
            total_places: 0,
            version: 1,
            itinerary: vec![],
        });
        cache.put_day_detail(detail).await;
        assert!(cache.get_day_detail(1, 2).await.is_some());
        assert!(cache.get_day_detail(1, 3).await.is_none());

        cache.invalidate_day(1, 2).await;
        assert!(cache.get_day_detail(1, 2).await.is_none());
    }

    #[tokio::test]
    async fn foods_keyed_by_trip() {
        let cache = cache();
        let foods = Arc::new(TripFoodsResponse {
            trip_id: 7,
            total: 0,
            foods: vec![],
        });
        cache.put_trip_foods(foods).await;
        assert!(cache.get_trip_foods(7).await.is_some());
        cache.invalidate_trip_foods(7).await;
        assert!(cache.get_trip_foods(7).await.is_none());
    }
}
