//! Cache-wrapped POI lookups. Provider results are immutable for a given
//! query, so they are cached under a key derived from the full query.

use std::sync::Arc;

use crate::error::ApiError;
use crate::state::AppState;

use super::dto::{
    parse_location, AroundQuery, DetailQuery, DistrictsQuery, DistrictsResponse,
    LocationDetail, LocationListResponse, SearchQuery,
};

pub async fn search(
    state: &AppState,
    query: SearchQuery,
) -> Result<Arc<LocationListResponse>, ApiError> {
    let keyword = query.keyword.trim();
    if keyword.is_empty() {
        return Err(ApiError::validation("keyword is required"));
    }

    let key = format!(
        "search:{keyword}:{}:{}:{}",
        query.city.as_deref().unwrap_or(""),
        query.page,
        query.page_size
    );
    if let Some(cached) = state.cache.get_location_list(&key).await {
        return Ok(cached);
    }

    let list = state
        .locations
        .search(keyword, query.city.as_deref(), query.page, query.page_size)
        .await?;
    let list = Arc::new(list);
    state.cache.put_location_list(key, list.clone()).await;
    Ok(list)
}

pub async fn detail(state: &AppState, query: DetailQuery) -> Result<Arc<LocationDetail>, ApiError> {
    let poi_id = query.id.trim();
    if poi_id.is_empty() {
        return Err(ApiError::validation("id is required"));
    }
    if let Some(cached) = state.cache.get_location_detail(poi_id).await {
        return Ok(cached);
    }

    let detail = state
        .locations
        .detail(poi_id)
        .await?
        .ok_or_else(|| ApiError::not_found("location not found"))?;
    let detail = Arc::new(detail);
    state
        .cache
        .put_location_detail(poi_id.to_string(), detail.clone())
        .await;
    Ok(detail)
}

pub async fn around(
    state: &AppState,
    query: AroundQuery,
) -> Result<Arc<LocationListResponse>, ApiError> {
    if parse_location(&query.location).is_none() {
        return Err(ApiError::validation("location must be \"lng,lat\""));
    }

    let key = format!(
        "around:{}:{}:{}:{}:{}",
        query.location,
        query.radius,
        query.kind.as_deref().unwrap_or(""),
        query.page,
        query.page_size
    );
    if let Some(cached) = state.cache.get_location_list(&key).await {
        return Ok(cached);
    }

    let list = state
        .locations
        .around(
            &query.location,
            query.radius,
            query.kind.as_deref(),
            query.page,
            query.page_size,
        )
        .await?;
    let list = Arc::new(list);
    state.cache.put_location_list(key, list.clone()).await;
    Ok(list)
}

pub async fn districts(
    state: &AppState,
    query: DistrictsQuery,
) -> Result<DistrictsResponse, ApiError> {
    let districts = state
        .locations
        .districts(query.keywords.as_deref(), query.subdistrict)
        .await?;
    Ok(DistrictsResponse { districts })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locations::mock::MockLocationProvider;
    use crate::state::AppState;
    use std::sync::Arc as StdArc;

    fn state_with_pois() -> AppState {
        let mut state = AppState::fake();
        let provider = MockLocationProvider::new();
        provider.insert(MockLocationProvider::poi("B001", "镇海楼", 113.27, 23.14));
        provider.insert(MockLocationProvider::poi("B002", "陈家祠", 113.24, 23.12));
        state.locations = StdArc::new(provider);
        state
    }

    #[tokio::test]
    async fn search_requires_keyword() {
        let state = state_with_pois();
        let query = SearchQuery {
            keyword: "  ".into(),
            city: None,
            page: 1,
            page_size: 20,
        };
        assert!(matches!(
            search(&state, query).await,
            Err(ApiError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn search_finds_and_caches() {
        let state = state_with_pois();
        let query = SearchQuery {
            keyword: "镇海楼".into(),
            city: None,
            page: 1,
            page_size: 20,
        };
        let first = search(&state, query).await.expect("search");
        assert_eq!(first.total, 1);

        let cached = state
            .cache
            .get_location_list("search:镇海楼::1:20")
            .await
            .expect("cached entry");
        assert_eq!(cached.total, 1);
    }

    #[tokio::test]
    async fn detail_maps_missing_poi_to_not_found() {
        let state = state_with_pois();
        let found = detail(
            &state,
            DetailQuery {
                id: "B001".into(),
            },
        )
        .await
        .expect("detail");
        assert_eq!(found.name, "镇海楼");

        assert!(matches!(
            detail(
                &state,
                DetailQuery {
                    id: "missing".into()
                }
            )
            .await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn around_validates_center() {
        let state = state_with_pois();
        let query = AroundQuery {
            location: "not-a-pair".into(),
            radius: 3000,
            kind: None,
            page: 1,
            page_size: 20,
        };
        assert!(matches!(
            around(&state, query).await,
            Err(ApiError::Validation(_))
        ));
    }
}
