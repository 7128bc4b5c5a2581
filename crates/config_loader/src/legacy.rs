//! Legacy configuration directory
//!
//! Older deployments keep one setting per file in a directory:
//!
//! - `redis_input`: `host:port/db`
//! - `redis_queue`: list key to pop
//!
//! Everything else takes its default value.

use std::path::Path;

use contracts::{ContractError, ServerBlueprint, SourceConfig};

/// File holding `host:port/db`
pub const REDIS_INPUT_FILE: &str = "redis_input";

/// File holding the queue name
pub const REDIS_QUEUE_FILE: &str = "redis_queue";

/// Build a blueprint from a legacy configuration directory
pub fn load_dir(dir: &Path) -> Result<ServerBlueprint, ContractError> {
    let redis_input = read_setting(dir, REDIS_INPUT_FILE)?;
    let queue = read_setting(dir, REDIS_QUEUE_FILE)?;

    let mut source = parse_redis_input(&redis_input)?;
    source.queue = queue;

    Ok(ServerBlueprint {
        source,
        ..Default::default()
    })
}

fn read_setting(dir: &Path, name: &str) -> Result<String, ContractError> {
    let path = dir.join(name);
    let content = std::fs::read_to_string(&path).map_err(|e| ContractError::ConfigParse {
        message: format!("cannot read {}: {e}", path.display()),
        source: Some(Box::new(e)),
    })?;
    Ok(content.trim().to_string())
}

/// Parse `host:port/db`
pub fn parse_redis_input(value: &str) -> Result<SourceConfig, ContractError> {
    let (address, db) = value.split_once('/').ok_or_else(|| {
        ContractError::config_validation(
            REDIS_INPUT_FILE,
            "missing database: should be host:port/database",
        )
    })?;

    let redis_db = db.trim().parse::<i64>().map_err(|_| {
        ContractError::config_validation(
            REDIS_INPUT_FILE,
            format!("database '{db}' is not a number"),
        )
    })?;

    let (host, port) = address.rsplit_once(':').ok_or_else(|| {
        ContractError::config_validation(
            REDIS_INPUT_FILE,
            format!("'{address}' is not host:port"),
        )
    })?;

    if host.is_empty() {
        return Err(ContractError::config_validation(
            REDIS_INPUT_FILE,
            "redis host cannot be empty",
        ));
    }

    let redis_port = port.parse::<u16>().map_err(|_| {
        ContractError::config_validation(REDIS_INPUT_FILE, format!("invalid port '{port}'"))
    })?;

    Ok(SourceConfig {
        redis_host: host.to_string(),
        redis_port,
        redis_db,
        queue: String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_redis_input() {
        let source = parse_redis_input("127.0.0.1:6380/3").unwrap();
        assert_eq!(source.redis_host, "127.0.0.1");
        assert_eq!(source.redis_port, 6380);
        assert_eq!(source.redis_db, 3);
    }

    #[test]
    fn test_parse_redis_input_missing_db() {
        let err = parse_redis_input("127.0.0.1:6380").unwrap_err().to_string();
        assert!(err.contains("missing database"), "got: {err}");
    }

    #[test]
    fn test_parse_redis_input_bad_port() {
        let err = parse_redis_input("redis:http/0").unwrap_err().to_string();
        assert!(err.contains("invalid port"), "got: {err}");
    }

    #[test]
    fn test_parse_redis_input_no_port() {
        let err = parse_redis_input("redis/0").unwrap_err().to_string();
        assert!(err.contains("not host:port"), "got: {err}");
    }

    #[test]
    fn test_load_dir() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(REDIS_INPUT_FILE), "localhost:6379/2\n").unwrap();
        std::fs::write(dir.path().join(REDIS_QUEUE_FILE), "analyzer:3:abcd\n").unwrap();

        let bp = load_dir(dir.path()).unwrap();
        assert_eq!(bp.source.redis_host, "localhost");
        assert_eq!(bp.source.redis_db, 2);
        assert_eq!(bp.source.queue, "analyzer:3:abcd");
        assert_eq!(bp.store.path, "./build/daily.json");
    }

    #[test]
    fn test_load_dir_missing_file() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(REDIS_INPUT_FILE), "localhost:6379/2").unwrap();

        let result = load_dir(dir.path());
        assert!(matches!(result, Err(ContractError::ConfigParse { .. })));
    }
}
