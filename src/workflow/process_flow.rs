//! 第二阶段：生成并投递帖子 - 流程层
//!
//! 对每个收集到的条目：取图（失败则生成）→ 合成 → 上传 → 推送 webhook。
//! 任一步骤失败只影响当前任务。

use tracing::{info, warn};

use crate::error::{PipelineError, PipelineResult};
use crate::models::{GatheredItem, TaskResult, TaskStatus, WebhookPayload};
use crate::services::{
    Branding, Compositor, ImageGenerator, ImageHandle, ImageLoader, Uploader, WebhookSender,
};
use crate::utils::logging::truncate_text;
use crate::workflow::RunContext;

pub struct ProcessFlow<'a> {
    pub loader: &'a dyn ImageLoader,
    pub generator: &'a dyn ImageGenerator,
    pub compositor: &'a dyn Compositor,
    pub uploader: &'a dyn Uploader,
    pub webhook: &'a dyn WebhookSender,
    pub branding: &'a Branding,
}

impl ProcessFlow<'_> {
    /// 按收集顺序逐个处理
    pub async fn run(&self, items: &[GatheredItem], ctx: &mut RunContext<'_>) {
        for item in items {
            ctx.set_status(&item.task_id, TaskStatus::Processing);
            info!(
                "[{}] 🖼️ 处理: {}",
                item.task_id,
                truncate_text(&item.analysis.headline, 80)
            );

            match self.process_item(item, ctx).await {
                Ok(result) => {
                    info!("[{}] ✅ 完成: {}", item.task_id, result.image_url);
                    ctx.complete(&item.task_id, result);
                }
                Err(e) => ctx.fail(&item.task_id, &e),
            }
        }
    }

    async fn process_item(
        &self,
        item: &GatheredItem,
        ctx: &mut RunContext<'_>,
    ) -> PipelineResult<TaskResult> {
        let GatheredItem {
            task_id,
            analysis,
            article,
        } = item;

        let image = self.acquire_image(item, ctx).await?;

        ctx.set_status(task_id, TaskStatus::Composing);
        let composed = self
            .compositor
            .compose(&image, &analysis.headline, &analysis.highlight_phrases, self.branding)
            .await
            .map_err(|e| PipelineError::Composition(format!("{:#}", e)))?;

        ctx.set_status(task_id, TaskStatus::Uploading);
        let image_url = self.uploader.upload(&composed).await?;

        ctx.set_status(task_id, TaskStatus::SendingWebhook);
        let payload = WebhookPayload::queued(analysis, &image_url, &article.link);
        self.webhook.send(&payload).await?;

        Ok(TaskResult {
            headline: analysis.headline.clone(),
            image_url,
            caption: analysis.caption.clone(),
            source_url: article.link.clone(),
            source_name: analysis.source_name.clone(),
        })
    }

    /// 优先加载原文配图，失败时按 image prompt 生成一张
    ///
    /// 兜底生成只尝试一次
    async fn acquire_image(
        &self,
        item: &GatheredItem,
        ctx: &mut RunContext<'_>,
    ) -> PipelineResult<ImageHandle> {
        let original = match item.article.image_url.as_deref() {
            Some(url) if !url.trim().is_empty() => self.loader.load(url).await,
            _ => Err(anyhow::anyhow!("article has no image URL")),
        };

        let reason = match original {
            Ok(image) => return Ok(image),
            Err(e) => e,
        };

        warn!(
            "[{}] ⚠️ 原图加载失败，改为生成图片: {:#}",
            item.task_id, reason
        );
        ctx.set_status(&item.task_id, TaskStatus::GeneratingImage);

        let generated = self
            .generator
            .generate(&item.analysis.image_prompt)
            .await
            .map_err(|e| PipelineError::ImageAcquisition(format!("image generation failed: {:#}", e)))?;

        self.loader.load(&generated).await.map_err(|e| {
            PipelineError::ImageAcquisition(format!("generated image could not be loaded: {:#}", e))
        })
    }
}
