//! Webhook 投递 - 业务能力层
//!
//! - `WebhookSender`：把完成的帖子推送到下游自动化
//! - `StatusReporter`：批次结束后上报整体运行状态

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::DeliveryError;
use crate::models::WebhookPayload;

/// 投递帖子数据
#[async_trait]
pub trait WebhookSender: Send + Sync {
    async fn send(&self, payload: &WebhookPayload) -> Result<(), DeliveryError>;
}

/// Make.com webhook
pub struct MakeWebhookSender {
    client: Client,
    url: String,
    auth_token: String,
}

impl MakeWebhookSender {
    pub fn new(config: &Config, client: Client) -> Self {
        Self {
            client,
            url: config.webhook_url.clone(),
            auth_token: config.webhook_auth_token.clone(),
        }
    }
}

#[async_trait]
impl WebhookSender for MakeWebhookSender {
    async fn send(&self, payload: &WebhookPayload) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(&self.url)
            .header("x-make-apikey", &self.auth_token)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(DeliveryError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        info!("✓ 已推送到 webhook: \"{}\"", payload.headline);
        Ok(())
    }
}

/// 运行状态级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StatusLevel {
    Success,
    Error,
}

#[derive(Debug, Serialize)]
struct StatusUpdate<'a> {
    timestamp: String,
    level: StatusLevel,
    message: &'a str,
    category: &'a str,
    details: serde_json::Value,
}

/// 批次运行状态上报
pub struct StatusReporter {
    client: Client,
    url: String,
}

impl StatusReporter {
    /// 未配置状态 webhook 时返回 None
    pub fn from_config(config: &Config, client: Client) -> Option<Self> {
        config
            .status_webhook_url
            .as_ref()
            .filter(|url| !url.is_empty())
            .map(|url| Self {
                client,
                url: url.clone(),
            })
    }

    pub async fn report(
        &self,
        level: StatusLevel,
        message: &str,
        details: serde_json::Value,
    ) -> Result<()> {
        let update = StatusUpdate {
            timestamp: Utc::now().to_rfc3339(),
            level,
            message,
            category: "Scheduled Batch",
            details,
        };
        debug!("上报运行状态: {:?}", update);

        let response = self
            .client
            .post(&self.url)
            .json(&update)
            .send()
            .await
            .context("status update request failed")?;

        if !response.status().is_success() {
            anyhow::bail!("status webhook returned {}", response.status().as_u16());
        }
        Ok(())
    }
}
