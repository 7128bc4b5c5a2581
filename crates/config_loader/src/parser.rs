//! 配置解析模块
//!
//! 支持 TOML (主要) 和 JSON (可选) 格式。

use contracts::{ContractError, ServerBlueprint};

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML 格式 (推荐)
    Toml,
    /// JSON 格式
    Json,
}

impl ConfigFormat {
    /// 从文件扩展名推断格式
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// 解析 TOML 格式配置
pub fn parse_toml(content: &str) -> Result<ServerBlueprint, ContractError> {
    toml::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 解析 JSON 格式配置
pub fn parse_json(content: &str) -> Result<ServerBlueprint, ContractError> {
    serde_json::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 根据格式解析配置
pub fn parse(content: &str, format: ConfigFormat) -> Result<ServerBlueprint, ContractError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{DeliveryPolicy, ThrottlePolicy};

    #[test]
    fn test_parse_toml_minimal() {
        let content = r#"
[source]
queue = "analyzer:3:events"
"#;
        let result = parse_toml(content);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let bp = result.unwrap();
        assert_eq!(bp.source.queue, "analyzer:3:events");
        assert_eq!(bp.source.redis_port, 6379);
        assert_eq!(bp.http.bind, "127.0.0.1:1323");
    }

    #[test]
    fn test_parse_toml_full() {
        let content = r#"
[source]
redis_host = "10.0.0.5"
redis_port = 6380
redis_db = 2
queue = "events"

[http]
bind = "0.0.0.0:8080"
ws_path = "/live"
static_dir = "/srv/map"

[store]
path = "/srv/map/daily.json"
queue_capacity = 64

[ingestion]
gate_period_ms = 250
channel_capacity = 16
throttle = "per_item"

[hub]
client_queue_capacity = 32
delivery_policy = "drop_newest"
register_timeout_ms = 2000
unregister_capacity = 128

[rollover]
enabled = false
at = "04:30"

[shutdown]
drain_timeout_ms = 1500
"#;
        let bp = parse_toml(content).unwrap();
        assert_eq!(bp.source.redis_db, 2);
        assert_eq!(bp.http.ws_path, "/live");
        assert_eq!(bp.store.queue_capacity, 64);
        assert_eq!(bp.ingestion.throttle, ThrottlePolicy::PerItem);
        assert_eq!(bp.hub.delivery_policy, DeliveryPolicy::DropNewest);
        assert!(!bp.rollover.enabled);
        assert_eq!(bp.shutdown.drain_timeout_ms, 1500);
    }

    #[test]
    fn test_parse_json_minimal() {
        let content = r#"{
            "source": { "queue": "events", "redis_db": 1 },
            "hub": { "delivery_policy": "disconnect_on_full" }
        }"#;
        let bp = parse_json(content).unwrap();
        assert_eq!(bp.source.redis_db, 1);
        assert_eq!(bp.hub.delivery_policy, DeliveryPolicy::DisconnectOnFull);
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let content = "invalid toml [[[";
        let result = parse_toml(content);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ContractError::ConfigParse { .. }));
    }

    #[test]
    fn test_unknown_policy_rejected() {
        let content = r#"
[hub]
delivery_policy = "drop_oldest"
"#;
        assert!(parse_toml(content).is_err());
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ConfigFormat::from_extension("toml"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("TOML"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("json"),
            Some(ConfigFormat::Json)
        );
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}
