//! 批处理编排器 - 编排层
//!
//! ## 职责
//!
//! 1. **运行隔离**：每次 `run_batch` 创建全新的任务登记表和去重账本
//! 2. **两阶段调度**：先收集全部分类，再统一处理收集到的条目
//! 3. **并发保护**：同一时间只允许一个批次在运行，重复调用直接拒绝
//! 4. **进度暴露**：通过 watch 通道提供只读快照
//!
//! ## 设计特点
//!
//! - 顺序执行分类和条目，以适应外部接口的频率限制
//! - 任务级错误在流程层被捕获，批次本身不会失败

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tracing::warn;

use crate::config::Config;
use crate::error::BatchError;
use crate::models::{validate_categories, BatchSnapshot, Category};
use crate::services::{
    ArticleAnalyzer, Branding, Compositor, ImageGenerator, ImageLoader, NewsSource, Uploader,
    WebhookSender,
};
use crate::utils::logging;
use crate::workflow::{GatherFlow, ProcessFlow, RunContext};

/// 编排器依赖的全部外部能力
#[derive(Clone)]
pub struct Collaborators {
    pub news: Arc<dyn NewsSource>,
    pub analyzer: Arc<dyn ArticleAnalyzer>,
    pub loader: Arc<dyn ImageLoader>,
    pub generator: Arc<dyn ImageGenerator>,
    pub compositor: Arc<dyn Compositor>,
    pub uploader: Arc<dyn Uploader>,
    pub webhook: Arc<dyn WebhookSender>,
}

/// 批处理参数
#[derive(Debug, Clone)]
pub struct BatchSettings {
    pub categories: Vec<Category>,
    pub category_delay: Duration,
    pub trending_size: usize,
    pub branding: Branding,
    pub verbose_logging: bool,
}

impl BatchSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            categories: config.categories.clone(),
            category_delay: config.category_delay(),
            trending_size: config.trending_size,
            branding: Branding {
                logo_url: config.logo_url.clone(),
                brand_text: config.brand_text.clone(),
                overlay_url: config.overlay_image_url.clone(),
            },
            verbose_logging: config.verbose_logging,
        }
    }
}

pub struct BatchOrchestrator {
    collaborators: Collaborators,
    settings: BatchSettings,
    run_lock: Mutex<()>,
    progress: watch::Sender<BatchSnapshot>,
}

impl BatchOrchestrator {
    /// 分类 id 重复时返回 `BatchError::InvalidCategories`
    pub fn new(collaborators: Collaborators, settings: BatchSettings) -> Result<Self, BatchError> {
        validate_categories(&settings.categories)?;

        let (progress, _) = watch::channel(BatchSnapshot::default());
        Ok(Self {
            collaborators,
            settings,
            run_lock: Mutex::new(()),
            progress,
        })
    }

    /// 运行一个完整批次
    ///
    /// 已有批次在运行时返回 `BatchError::AlreadyRunning`，不会影响正在运行的批次。
    /// 正常情况下总是返回最终快照，调用方通过其中的 Error 任务判断失败。
    pub async fn run_batch(&self) -> Result<BatchSnapshot, BatchError> {
        let _guard = self.run_lock.try_lock().map_err(|_| {
            warn!("⚠️ 已有批次在运行，本次调用被拒绝");
            BatchError::AlreadyRunning
        })?;

        let settings = &self.settings;
        let c = &self.collaborators;
        let mut ctx = RunContext::new(&settings.categories).with_progress(&self.progress);

        logging::log_phase_start(1, "收集新闻", settings.categories.len());
        let gathered = GatherFlow::new(c.news.as_ref(), c.analyzer.as_ref())
            .trending_size(settings.trending_size)
            .category_delay(settings.category_delay)
            .verbose_logging(settings.verbose_logging)
            .run(&settings.categories, &mut ctx)
            .await;

        logging::log_phase_start(2, "生成并投递帖子", gathered.len());
        ProcessFlow {
            loader: c.loader.as_ref(),
            generator: c.generator.as_ref(),
            compositor: c.compositor.as_ref(),
            uploader: c.uploader.as_ref(),
            webhook: c.webhook.as_ref(),
            branding: &settings.branding,
        }
        .run(&gathered, &mut ctx)
        .await;

        Ok(ctx.finish())
    }

    /// 当前（或最近一次）运行的只读快照
    pub fn snapshot(&self) -> BatchSnapshot {
        self.progress.borrow().clone()
    }

    /// 订阅进度变化
    pub fn subscribe(&self) -> watch::Receiver<BatchSnapshot> {
        self.progress.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.run_lock.try_lock().is_err()
    }
}
