//! # Dispatcher
//!
//! 事件分发模块。
//!
//! 负责：
//! - 维护客户端注册表 (单写者 Hub)
//! - 按到达顺序广播到所有客户端，再转交 daily store
//! - Daily store worker：过滤命令、逐条落盘、日切清空
//! - 定时 flush 触发器

pub mod error;
pub mod handle;
pub mod hub;
pub mod metrics;
pub mod sinks;
pub mod trigger;

pub use contracts::{DataSink, Item};
pub use error::DispatcherError;
pub use handle::{StoreHandle, StoreRequest, StoreSender};
pub use hub::{ClientId, Hub, HubHandle, Subscription};
pub use metrics::{HubMetrics, HubSnapshot, SinkMetrics, SinkSnapshot};
pub use sinks::DailyFileSink;
pub use trigger::{duration_until, FlushTrigger};
