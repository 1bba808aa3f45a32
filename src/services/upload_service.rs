//! 图片上传 - 业务能力层
//!
//! 使用 Cloudinary 的 unsigned upload preset 上传合成好的图片

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::config::Config;
use crate::error::UploadError;
use crate::services::ImageHandle;

/// 上传图片并返回公开 URL
#[async_trait]
pub trait Uploader: Send + Sync {
    async fn upload(&self, image: &ImageHandle) -> Result<String, UploadError>;
}

pub struct CloudinaryUploader {
    client: Client,
    upload_url: String,
    upload_preset: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
    url: Option<String>,
}

impl CloudinaryUploader {
    pub fn new(config: &Config, client: Client) -> Self {
        Self {
            client,
            upload_url: format!(
                "https://api.cloudinary.com/v1_1/{}/image/upload",
                config.cloudinary_cloud_name
            ),
            upload_preset: config.cloudinary_upload_preset.clone(),
        }
    }
}

#[async_trait]
impl Uploader for CloudinaryUploader {
    async fn upload(&self, image: &ImageHandle) -> Result<String, UploadError> {
        debug!("上传图片 ({} 字节, {})", image.bytes.len(), image.mime);

        let file = image.to_data_url();
        let response = self
            .client
            .post(&self.upload_url)
            .form(&[("file", file.as_str()), ("upload_preset", self.upload_preset.as_str())])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(UploadError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UploadError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: UploadResponse = response.json().await?;
        parsed
            .secure_url
            .or(parsed.url)
            .filter(|url| !url.is_empty())
            .ok_or(UploadError::MissingUrl)
    }
}
