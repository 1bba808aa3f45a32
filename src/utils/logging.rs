/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::models::{BatchSnapshot, TaskStatus};

/// 初始化 tracing 订阅者
///
/// 默认 `info` 级别，可通过 `RUST_LOG` 覆盖；重复调用无副作用
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 新闻帖子批处理");
    info!(
        "📋 分类: {}",
        config
            .categories
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    info!("⏱️ 分类间隔: {} ms", config.category_delay_ms);
    info!("{}", "=".repeat(60));
}

/// 记录阶段开始信息
pub fn log_phase_start(phase: usize, name: &str, count: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📦 第 {} 阶段: {} ({} 项)", phase, name, count);
    info!("{}", "=".repeat(60));
}

/// 进度行
pub fn log_progress(snapshot: &BatchSnapshot) {
    info!(
        "📈 进度: {}/{} ({:.0}%)",
        snapshot.completed,
        snapshot.total,
        snapshot.progress_percent()
    );
}

/// 打印最终统计信息
pub fn print_final_stats(snapshot: &BatchSnapshot, report_file: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    for task in &snapshot.tasks {
        match &task.status {
            TaskStatus::Done(result) => {
                info!("✅ {}: {}", task.category_name, truncate_text(&result.headline, 60))
            }
            TaskStatus::Error(message) => info!("❌ {}: {}", task.category_name, message),
            other => info!("⏸️ {}: {}", task.category_name, other),
        }
    }
    info!("{}", "─".repeat(60));
    info!("✅ 成功: {}/{}", snapshot.completed, snapshot.total);
    info!("❌ 失败: {}", snapshot.failed());
    info!("{}", "=".repeat(60));
    info!("\n报告已保存至: {}", report_file);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大字符数
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
