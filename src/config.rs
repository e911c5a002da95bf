use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeChatConfig {
    pub app_id: String,
    pub app_secret: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AmapConfig {
    pub key: String,
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeatherConfig {
    pub api_key: String,
    pub base_url: String,
    pub geo_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    pub day_detail_ttl_secs: u64,
    pub foods_ttl_secs: u64,
    pub location_ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub wechat: WeChatConfig,
    pub amap: AmapConfig,
    pub weather: WeatherConfig,
    pub cache: CacheConfig,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

fn env_parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: env_or("JWT_ISSUER", "tripplan"),
            audience: env_or("JWT_AUDIENCE", "tripplan-users"),
            // Source default: 30 days.
            ttl_minutes: env_parse_or("JWT_TTL_MINUTES", 30 * 24 * 60),
        };
        let wechat = WeChatConfig {
            app_id: env_or("WECHAT_APP_ID", ""),
            app_secret: env_or("WECHAT_APP_SECRET", ""),
        };
        let amap = AmapConfig {
            key: env_or("AMAP_API_KEY", ""),
            base_url: env_or("AMAP_BASE_URL", "https://restapi.amap.com/v3"),
        };
        let weather = WeatherConfig {
            api_key: env_or("WEATHER_API_KEY", ""),
            base_url: env_or(
                "WEATHER_BASE_URL",
                "https://api.openweathermap.org/data/2.5",
            ),
            geo_url: env_or(
                "WEATHER_GEO_URL",
                "http://api.openweathermap.org/geo/1.0/direct",
            ),
        };
        let cache = CacheConfig {
            day_detail_ttl_secs: env_parse_or("CACHE_DAY_DETAIL_TTL_SECS", 10 * 60),
            foods_ttl_secs: env_parse_or("CACHE_FOODS_TTL_SECS", 10 * 60),
            location_ttl_secs: env_parse_or("CACHE_LOCATION_TTL_SECS", 2 * 60 * 60),
        };
        Ok(Self {
            database_url,
            jwt,
            wechat,
            amap,
            weather,
            cache,
        })
    }
}
