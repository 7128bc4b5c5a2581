//! ServerBlueprint - Config Loader output
//!
//! Describes the complete runtime configuration: event source, HTTP surface,
//! daily store, ingestion gate, hub delivery policy, rollover schedule.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// Config version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete server configuration blueprint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerBlueprint {
    /// Config version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Event source (Redis list)
    #[serde(default)]
    pub source: SourceConfig,

    /// HTTP / WebSocket surface
    #[serde(default)]
    pub http: HttpConfig,

    /// Daily store
    #[serde(default)]
    pub store: StoreConfig,

    /// Ingestion loop
    #[serde(default)]
    pub ingestion: IngestionConfig,

    /// Dispatch hub
    #[serde(default)]
    pub hub: HubConfig,

    /// Day-boundary rollover
    #[serde(default)]
    pub rollover: RolloverConfig,

    /// Shutdown behavior
    #[serde(default)]
    pub shutdown: ShutdownConfig,
}

/// Redis list the events are popped from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Redis host
    #[serde(default = "default_redis_host")]
    pub redis_host: String,

    /// Redis port
    #[serde(default = "default_redis_port")]
    pub redis_port: u16,

    /// Redis database index
    #[serde(default)]
    pub redis_db: i64,

    /// List key to pop from (required)
    #[serde(default)]
    pub queue: String,
}

impl SourceConfig {
    /// Connection URL for the redis client
    pub fn redis_url(&self) -> String {
        format!(
            "redis://{}:{}/{}",
            self.redis_host, self.redis_port, self.redis_db
        )
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            redis_host: default_redis_host(),
            redis_port: default_redis_port(),
            redis_db: 0,
            queue: String::new(),
        }
    }
}

fn default_redis_host() -> String {
    "127.0.0.1".to_string()
}

fn default_redis_port() -> u16 {
    6379
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Listen address
    #[serde(default = "default_bind")]
    pub bind: String,

    /// WebSocket endpoint path
    #[serde(default = "default_ws_path")]
    pub ws_path: String,

    /// Directory served at `/`
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            ws_path: default_ws_path(),
            static_dir: default_static_dir(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:1323".to_string()
}

fn default_ws_path() -> String {
    "/ws".to_string()
}

fn default_static_dir() -> String {
    "./build".to_string()
}

/// Daily store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store file path
    #[serde(default = "default_store_path")]
    pub path: String,

    /// Capacity of the store request queue (hub -> sink hand-off)
    #[serde(default = "default_one")]
    pub queue_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            queue_capacity: default_one(),
        }
    }
}

fn default_store_path() -> String {
    "./build/daily.json".to_string()
}

fn default_one() -> usize {
    1
}

/// Ingestion loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionConfig {
    /// Gate period in milliseconds
    #[serde(default = "default_gate_period_ms")]
    pub gate_period_ms: u64,

    /// Capacity of the ingestion output channel
    #[serde(default = "default_one")]
    pub channel_capacity: usize,

    /// Throttle policy
    #[serde(default)]
    pub throttle: ThrottlePolicy,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            gate_period_ms: default_gate_period_ms(),
            channel_capacity: default_one(),
            throttle: ThrottlePolicy::default(),
        }
    }
}

fn default_gate_period_ms() -> u64 {
    1000
}

/// How the periodic gate limits the ingestion loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThrottlePolicy {
    /// A tick starts a scan session that runs until EOF/error.
    /// The period bounds restart latency only.
    #[default]
    RestartGate,
    /// At most one event per tick.
    PerItem,
}

/// Dispatch hub configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubConfig {
    /// Per-client output queue capacity
    #[serde(default = "default_one")]
    pub client_queue_capacity: usize,

    /// What the hub does when a client queue is full
    #[serde(default)]
    pub delivery_policy: DeliveryPolicy,

    /// Registration timeout in milliseconds (0 = wait forever)
    #[serde(default)]
    pub register_timeout_ms: u64,

    /// Capacity of the unregister queue
    #[serde(default = "default_unregister_capacity")]
    pub unregister_capacity: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            client_queue_capacity: default_one(),
            delivery_policy: DeliveryPolicy::default(),
            register_timeout_ms: 0,
            unregister_capacity: default_unregister_capacity(),
        }
    }
}

fn default_unregister_capacity() -> usize {
    4096
}

/// Delivery policy for full client queues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryPolicy {
    /// Wait until the client accepts (head-of-line blocking)
    #[default]
    Block,
    /// Skip the item for that client
    DropNewest,
    /// Remove the client from the registry
    DisconnectOnFull,
}

/// Day-boundary rollover configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RolloverConfig {
    /// Enable the daily flush trigger
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Local wall-clock time of the boundary, `HH:MM[:SS]`
    #[serde(default = "default_rollover_at")]
    pub at: String,
}

impl RolloverConfig {
    /// Parse `at` as a local time of day
    ///
    /// Accepts `HH:MM:SS` and `HH:MM`.
    pub fn time_of_day(&self) -> Option<NaiveTime> {
        NaiveTime::parse_from_str(&self.at, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(&self.at, "%H:%M"))
            .ok()
    }
}

impl Default for RolloverConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            at: default_rollover_at(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_rollover_at() -> String {
    "00:00:00".to_string()
}

/// Shutdown configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShutdownConfig {
    /// Upper bound on the drain after cancellation, in milliseconds
    #[serde(default = "default_drain_timeout_ms")]
    pub drain_timeout_ms: u64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            drain_timeout_ms: default_drain_timeout_ms(),
        }
    }
}

fn default_drain_timeout_ms() -> u64 {
    5000
}
