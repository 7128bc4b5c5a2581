//! 配置校验模块
//!
//! 校验规则：
//! - source.queue 非空
//! - 所有队列容量 > 0
//! - gate_period_ms > 0
//! - http.bind 为合法 socket 地址, ws_path 以 `/` 开头
//! - rollover.at 为合法时间 (HH:MM[:SS])

use std::net::SocketAddr;

use contracts::{ContractError, ServerBlueprint};

/// 校验 ServerBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &ServerBlueprint) -> Result<(), ContractError> {
    validate_source(blueprint)?;
    validate_http(blueprint)?;
    validate_capacities(blueprint)?;
    validate_ingestion(blueprint)?;
    validate_rollover(blueprint)?;
    Ok(())
}

/// 校验事件源配置
fn validate_source(blueprint: &ServerBlueprint) -> Result<(), ContractError> {
    if blueprint.source.queue.trim().is_empty() {
        return Err(ContractError::config_validation(
            "source.queue",
            "queue name cannot be empty",
        ));
    }
    if blueprint.source.redis_host.trim().is_empty() {
        return Err(ContractError::config_validation(
            "source.redis_host",
            "redis host cannot be empty",
        ));
    }
    if blueprint.source.redis_db < 0 {
        return Err(ContractError::config_validation(
            "source.redis_db",
            format!("redis_db must be >= 0, got {}", blueprint.source.redis_db),
        ));
    }
    Ok(())
}

/// 校验 HTTP 配置
fn validate_http(blueprint: &ServerBlueprint) -> Result<(), ContractError> {
    let http = &blueprint.http;

    if http.bind.parse::<SocketAddr>().is_err() {
        return Err(ContractError::config_validation(
            "http.bind",
            format!("'{}' is not a valid socket address", http.bind),
        ));
    }

    if !http.ws_path.starts_with('/') {
        return Err(ContractError::config_validation(
            "http.ws_path",
            format!("ws_path must start with '/', got '{}'", http.ws_path),
        ));
    }

    Ok(())
}

/// 校验队列容量
fn validate_capacities(blueprint: &ServerBlueprint) -> Result<(), ContractError> {
    let capacities = [
        ("store.queue_capacity", blueprint.store.queue_capacity),
        (
            "ingestion.channel_capacity",
            blueprint.ingestion.channel_capacity,
        ),
        (
            "hub.client_queue_capacity",
            blueprint.hub.client_queue_capacity,
        ),
        ("hub.unregister_capacity", blueprint.hub.unregister_capacity),
    ];

    for (field, capacity) in capacities {
        if capacity == 0 {
            return Err(ContractError::config_validation(
                field,
                "capacity must be > 0",
            ));
        }
    }
    Ok(())
}

/// 校验 ingestion 配置
fn validate_ingestion(blueprint: &ServerBlueprint) -> Result<(), ContractError> {
    if blueprint.ingestion.gate_period_ms == 0 {
        return Err(ContractError::config_validation(
            "ingestion.gate_period_ms",
            "gate_period_ms must be > 0",
        ));
    }
    Ok(())
}

/// 校验日切配置
fn validate_rollover(blueprint: &ServerBlueprint) -> Result<(), ContractError> {
    if blueprint.rollover.time_of_day().is_none() {
        return Err(ContractError::config_validation(
            "rollover.at",
            format!(
                "'{}' is not a valid time of day (expected HH:MM[:SS])",
                blueprint.rollover.at
            ),
        ));
    }
    Ok(())
}
