/// 환경 변수 기반 설정
/// 서비스 시작 시 한 번 읽어서 각 구성 요소에 전달한다.
// region:    --- Imports
use std::time::Duration;
use thiserror::Error;

// endregion: --- Imports

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} 값이 올바르지 않습니다: {value}")]
    Invalid { name: &'static str, value: String },
}

/// 서비스 동작 파라미터
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    /// 낙관적 동시성 충돌 시 최대 재시도 횟수
    pub max_bid_retries: u32,
    /// 경매 종료 스케줄러 주기
    pub sweep_interval: Duration,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            max_bid_retries: 100,
            sweep_interval: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub kafka_brokers: String,
    pub bind_addr: String,
    pub blob_store_url: String,
    pub verify_url: String,
    pub settings: ServiceSettings,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 조회 함수로부터 설정 구성
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let defaults = ServiceSettings::default();

        Ok(Self {
            database_url,
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 5)?,
            kafka_brokers: lookup("KAFKA_BROKERS").unwrap_or_else(|| "localhost:9092".to_string()),
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            blob_store_url: lookup("BLOB_STORE_URL")
                .unwrap_or_else(|| "http://localhost:9000/auction-media".to_string()),
            verify_url: lookup("VERIFY_URL").unwrap_or_else(|| "http://127.0.0.1:5000".to_string()),
            settings: ServiceSettings {
                max_bid_retries: parse_or(&lookup, "MAX_BID_RETRIES", defaults.max_bid_retries)?,
                sweep_interval: Duration::from_secs(parse_or(
                    &lookup,
                    "SWEEP_INTERVAL_SECS",
                    defaults.sweep_interval.as_secs(),
                )?),
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn database_url_is_required() {
        let err = AppConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("DATABASE_URL")));
    }

    #[test]
    fn defaults_and_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/auction"),
            ("MAX_BID_RETRIES", "7"),
            ("SWEEP_INTERVAL_SECS", "30"),
        ]))
        .unwrap();
        assert_eq!(config.kafka_brokers, "localhost:9092");
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.db_max_connections, 5);
        assert_eq!(config.settings.max_bid_retries, 7);
        assert_eq!(config.settings.sweep_interval, Duration::from_secs(30));
    }

    #[test]
    fn invalid_number_is_reported() {
        let err = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/auction"),
            ("MAX_BID_RETRIES", "many"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "MAX_BID_RETRIES", .. }));
    }
}
