//! 图片加载与生成 - 业务能力层

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::Config;

/// 已加载的图片
#[derive(Debug, Clone, PartialEq)]
pub struct ImageHandle {
    pub bytes: Vec<u8>,
    pub mime: String,
}

impl ImageHandle {
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
    }
}

/// 按 URL 或 base64 数据加载图片
#[async_trait]
pub trait ImageLoader: Send + Sync {
    async fn load(&self, source: &str) -> Result<ImageHandle>;
}

/// 根据文字描述生成图片，返回 base64 数据
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// 支持 http(s) URL、data URL 和裸 base64 的加载器
pub struct HttpImageLoader {
    client: Client,
}

impl HttpImageLoader {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ImageLoader for HttpImageLoader {
    async fn load(&self, source: &str) -> Result<ImageHandle> {
        let source = source.trim();
        if source.is_empty() {
            anyhow::bail!("no image source");
        }

        if source.starts_with("http://") || source.starts_with("https://") {
            debug!("下载图片: {}", source);
            let response = self
                .client
                .get(source)
                .send()
                .await
                .with_context(|| format!("failed to request image {}", source))?;

            let status = response.status();
            if !status.is_success() {
                anyhow::bail!("image request returned status {}", status.as_u16());
            }

            let mime = response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.split(';').next().unwrap_or(v).trim().to_string())
                .unwrap_or_default();
            if !mime.starts_with("image/") {
                anyhow::bail!("unexpected content type for image: {:?}", mime);
            }

            let bytes = response.bytes().await.context("failed to read image body")?;
            if bytes.is_empty() {
                anyhow::bail!("image body is empty");
            }
            return Ok(ImageHandle {
                bytes: bytes.to_vec(),
                mime,
            });
        }

        decode_inline_image(source)
    }
}

/// 解析 `data:<mime>;base64,<data>` 或裸 base64（按 PNG 处理）
pub fn decode_inline_image(source: &str) -> Result<ImageHandle> {
    let (mime, data) = match source.strip_prefix("data:") {
        Some(rest) => {
            let (header, data) = rest
                .split_once(',')
                .context("malformed data URL")?;
            let mime = header
                .strip_suffix(";base64")
                .context("only base64 data URLs are supported")?;
            (mime.to_string(), data)
        }
        None => ("image/png".to_string(), source),
    };

    if !mime.starts_with("image/") {
        anyhow::bail!("data URL is not an image: {}", mime);
    }

    let bytes = STANDARD
        .decode(data.trim())
        .context("invalid base64 image data")?;
    if bytes.is_empty() {
        anyhow::bail!("image data is empty");
    }

    Ok(ImageHandle { bytes, mime })
}

/// OpenAI 兼容的图片生成接口
pub struct OpenAiImageGenerator {
    client: Client,
    api_key: String,
    base_url: String,
    model_name: String,
}

#[derive(Debug, Deserialize)]
struct ImageGenerationResponse {
    #[serde(default)]
    data: Vec<GeneratedImage>,
}

#[derive(Debug, Deserialize)]
struct GeneratedImage {
    b64_json: Option<String>,
}

impl OpenAiImageGenerator {
    pub fn new(config: &Config, client: Client) -> Self {
        Self {
            client,
            api_key: config.llm_api_key.clone(),
            base_url: config.llm_api_base_url.trim_end_matches('/').to_string(),
            model_name: config.image_model_name.clone(),
        }
    }
}

#[async_trait]
impl ImageGenerator for OpenAiImageGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        if prompt.trim().is_empty() {
            anyhow::bail!("image prompt is empty");
        }
        debug!("调用图片生成，模型: {}", self.model_name);

        let response = self
            .client
            .post(format!("{}/images/generations", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({
                "model": self.model_name,
                "prompt": prompt,
                "n": 1,
                "size": "1024x1024",
                "response_format": "b64_json",
            }))
            .send()
            .await
            .context("image generation request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("image generation returned status {}: {}", status.as_u16(), body);
        }

        let parsed: ImageGenerationResponse = response
            .json()
            .await
            .context("failed to parse image generation response")?;

        parsed
            .data
            .into_iter()
            .find_map(|image| image.b64_json)
            .filter(|data| !data.is_empty())
            .context("image generation returned no image")
    }
}
