//! 指标记录模块
//!
//! Hub、Daily Store 与 Ingestion Loop 的运行指标。
//! 未安装 recorder 时所有调用均为空操作。

use metrics::{counter, gauge, histogram};

/// 记录从事件源读取的一行
pub fn record_item_ingested(source: &str) {
    counter!(
        "eventcast_items_ingested_total",
        "source" => source.to_string()
    )
    .increment(1);
}

/// 记录事件源读取失败 (会话结束，等待下一次 tick)
pub fn record_source_error(source: &str) {
    counter!(
        "eventcast_source_errors_total",
        "source" => source.to_string()
    )
    .increment(1);
}

/// 记录一次广播
///
/// # Example
///
/// ```ignore
/// observability::metrics::record_item_broadcast(clients.len(), item.is_command());
/// ```
pub fn record_item_broadcast(client_count: usize, is_command: bool) {
    let kind = if is_command { "command" } else { "event" };
    counter!("eventcast_items_broadcast_total", "kind" => kind).increment(1);
    histogram!("eventcast_broadcast_fanout").record(client_count as f64);
}

/// 记录因客户端队列满而未投递的消息
pub fn record_delivery_dropped(policy: &'static str) {
    counter!("eventcast_deliveries_dropped_total", "policy" => policy).increment(1);
}

/// 记录当前在线客户端数
pub fn record_client_count(count: usize) {
    gauge!("eventcast_clients_connected").set(count as f64);
}

/// 记录客户端注册
pub fn record_client_registered() {
    counter!("eventcast_clients_registered_total").increment(1);
}

/// 记录客户端注销
pub fn record_client_unregistered(reason: &'static str) {
    counter!("eventcast_clients_unregistered_total", "reason" => reason).increment(1);
}

/// 记录 daily store 写入结果
pub fn record_store_write(success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!("eventcast_store_writes_total", "status" => status).increment(1);
}

/// 记录被过滤掉的命令 (不落盘)
pub fn record_command_skipped() {
    counter!("eventcast_store_commands_skipped_total").increment(1);
}

/// 记录 daily store 日切清空
pub fn record_store_reset(success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!("eventcast_store_resets_total", "status" => status).increment(1);
}
