//! 应用入口：用配置组装真实服务，运行一个批次，输出报告并上报状态

use anyhow::{Context, Result};
use std::fs;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Config;
use crate::models::BatchSnapshot;
use crate::orchestrator::{BatchOrchestrator, BatchSettings, Collaborators};
use crate::services::{
    CloudinaryUploader, HttpImageLoader, LlmAnalysisService, MakeWebhookSender, NewsDataService,
    OpenAiImageGenerator, StatusLevel, StatusReporter, SvgCompositor,
};
use crate::utils::logging;

/// 应用主结构
pub struct App {
    config: Config,
    orchestrator: Arc<BatchOrchestrator>,
    status_reporter: Option<StatusReporter>,
}

impl App {
    /// 初始化应用
    pub fn initialize(config: Config) -> Result<Self> {
        logging::log_startup(&config);

        let client = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .build()
            .context("无法创建 HTTP 客户端")?;

        let collaborators = Collaborators {
            news: Arc::new(NewsDataService::new(&config, client.clone())),
            analyzer: Arc::new(LlmAnalysisService::new(&config)),
            loader: Arc::new(HttpImageLoader::new(client.clone())),
            generator: Arc::new(OpenAiImageGenerator::new(&config, client.clone())),
            compositor: Arc::new(SvgCompositor),
            uploader: Arc::new(CloudinaryUploader::new(&config, client.clone())),
            webhook: Arc::new(MakeWebhookSender::new(&config, client.clone())),
        };

        let orchestrator = Arc::new(BatchOrchestrator::new(
            collaborators,
            BatchSettings::from_config(&config),
        )?);
        let status_reporter = StatusReporter::from_config(&config, client);

        Ok(Self {
            config,
            orchestrator,
            status_reporter,
        })
    }

    /// 运行一个批次
    pub async fn run(&self) -> Result<BatchSnapshot> {
        let watcher = spawn_progress_logger(&self.orchestrator);

        let snapshot = self.orchestrator.run_batch().await?;
        watcher.abort();

        write_report(&self.config.report_file, &snapshot)?;
        logging::print_final_stats(&snapshot, &self.config.report_file);
        self.report_status(&snapshot).await;

        Ok(snapshot)
    }

    async fn report_status(&self, snapshot: &BatchSnapshot) {
        let Some(reporter) = &self.status_reporter else {
            return;
        };

        let failed = snapshot.failed();
        let (level, message) = if failed > 0 {
            (
                StatusLevel::Error,
                "Automation completed with one or more failed tasks.",
            )
        } else {
            (
                StatusLevel::Success,
                "Automation batch process completed successfully.",
            )
        };
        let details = serde_json::json!({
            "completed": snapshot.completed,
            "failed": failed,
            "total": snapshot.total,
        });

        match reporter.report(level, message, details).await {
            Ok(()) => info!("✓ 已上报运行状态"),
            Err(e) => warn!("⚠️ 上报运行状态失败: {:#}", e),
        }
    }
}

/// 运行期间输出进度
fn spawn_progress_logger(orchestrator: &Arc<BatchOrchestrator>) -> tokio::task::JoinHandle<()> {
    let mut rx = orchestrator.subscribe();
    tokio::spawn(async move {
        let mut last_completed = 0;
        while rx.changed().await.is_ok() {
            let snapshot = rx.borrow_and_update().clone();
            if snapshot.running && snapshot.completed != last_completed {
                last_completed = snapshot.completed;
                logging::log_progress(&snapshot);
            }
        }
    })
}

/// 把最终快照写成 JSON 报告
fn write_report(path: &str, snapshot: &BatchSnapshot) -> Result<()> {
    let json = serde_json::to_string_pretty(snapshot)?;
    fs::write(path, json).with_context(|| format!("无法写入报告文件: {}", path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, TaskRegistry};

    #[test]
    fn test_write_report() {
        let registry = TaskRegistry::new(&[Category::new("crime", "Crime")]);
        let snapshot = BatchSnapshot {
            tasks: registry.tasks().to_vec(),
            completed: 0,
            total: 1,
            running: false,
        };

        let path = std::env::temp_dir().join(format!("news_batch_report_{}.json", std::process::id()));
        let path_str = path.to_string_lossy().to_string();
        write_report(&path_str, &snapshot).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["total"], 1);
        assert_eq!(written["tasks"][0]["status"], "Pending");

        let _ = fs::remove_file(path);
    }
}
