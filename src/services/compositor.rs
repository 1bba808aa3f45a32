//! 帖子图片合成 - 业务能力层
//!
//! 输出 1080×1080 的 SVG：底图（内嵌 data URL）+ 遮罩 + Logo + 标题 + 品牌文字。
//! 标题中命中高亮短语的单词使用强调色。

use anyhow::Result;
use async_trait::async_trait;
use regex::{Regex, RegexBuilder};
use std::ops::Range;
use std::sync::LazyLock;

use crate::services::ImageHandle;

const CANVAS_SIZE: u32 = 1080;
const MARGIN: u32 = 60;
const FONT_SIZE: u32 = 64;
const LINE_HEIGHT: u32 = 78;
const MAX_LINE_CHARS: usize = 24;
const TEXT_COLOR: &str = "#FFFFFF";
const ACCENT_COLOR: &str = "#FFD400";

static RE_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\S+").unwrap());

/// 固定的品牌素材
#[derive(Debug, Clone)]
pub struct Branding {
    pub logo_url: String,
    pub brand_text: String,
    pub overlay_url: String,
}

/// 合成最终的帖子图片
#[async_trait]
pub trait Compositor: Send + Sync {
    async fn compose(
        &self,
        image: &ImageHandle,
        headline: &str,
        highlight_phrases: &[String],
        branding: &Branding,
    ) -> Result<ImageHandle>;
}

/// SVG 合成器
#[derive(Debug, Default)]
pub struct SvgCompositor;

#[async_trait]
impl Compositor for SvgCompositor {
    async fn compose(
        &self,
        image: &ImageHandle,
        headline: &str,
        highlight_phrases: &[String],
        branding: &Branding,
    ) -> Result<ImageHandle> {
        let svg = render_post_svg(image, headline, highlight_phrases, branding)?;
        Ok(ImageHandle {
            bytes: svg.into_bytes(),
            mime: "image/svg+xml".to_string(),
        })
    }
}

/// 一个待渲染的单词
#[derive(Debug, Clone, PartialEq)]
struct Word<'a> {
    text: &'a str,
    highlighted: bool,
}

pub fn render_post_svg(
    image: &ImageHandle,
    headline: &str,
    highlight_phrases: &[String],
    branding: &Branding,
) -> Result<String> {
    let headline = headline.trim();
    if headline.is_empty() {
        anyhow::bail!("headline is empty");
    }
    if image.bytes.is_empty() {
        anyhow::bail!("source image is empty");
    }

    let words = mark_highlights(headline, highlight_phrases)?;
    let lines = wrap_words(&words, MAX_LINE_CHARS);

    let line_count = lines.len() as u32;
    let text_bottom = CANVAS_SIZE - MARGIN * 2;
    let first_baseline = text_bottom.saturating_sub((line_count - 1) * LINE_HEIGHT);

    let mut headline_svg = String::new();
    for (i, line) in lines.iter().enumerate() {
        let y = first_baseline + i as u32 * LINE_HEIGHT;
        headline_svg.push_str(&format!(
            r#"    <text x="{MARGIN}" y="{y}" font-family="Montserrat, Arial, sans-serif" font-size="{FONT_SIZE}" font-weight="800">"#
        ));
        for (j, word) in line.iter().enumerate() {
            let color = if word.highlighted { ACCENT_COLOR } else { TEXT_COLOR };
            let space = if j + 1 < line.len() { " " } else { "" };
            headline_svg.push_str(&format!(
                r#"<tspan fill="{}">{}{}</tspan>"#,
                color,
                escape_xml(word.text),
                space
            ));
        }
        headline_svg.push_str("</text>\n");
    }

    let brand_x = CANVAS_SIZE - MARGIN;
    let brand_y = CANVAS_SIZE - MARGIN / 2;

    Ok(format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{size}" height="{size}" viewBox="0 0 {size} {size}">
    <image href="{image}" x="0" y="0" width="{size}" height="{size}" preserveAspectRatio="xMidYMid slice"/>
    <image href="{overlay}" x="0" y="0" width="{size}" height="{size}" preserveAspectRatio="none"/>
    <image href="{logo}" x="{MARGIN}" y="{MARGIN}" width="160" height="160"/>
{headline_svg}    <text x="{brand_x}" y="{brand_y}" text-anchor="end" font-family="Montserrat, Arial, sans-serif" font-size="28" font-weight="600" fill="{TEXT_COLOR}">{brand}</text>
</svg>
"#,
        size = CANVAS_SIZE,
        image = escape_xml(&image.to_data_url()),
        overlay = escape_xml(&branding.overlay_url),
        logo = escape_xml(&branding.logo_url),
        brand = escape_xml(&branding.brand_text),
    ))
}

/// 拆分单词并标记是否落在任一高亮短语内（不区分大小写）
fn mark_highlights<'a>(headline: &'a str, phrases: &[String]) -> Result<Vec<Word<'a>>> {
    let mut ranges: Vec<Range<usize>> = Vec::new();
    for phrase in phrases.iter().map(|p| p.trim()).filter(|p| !p.is_empty()) {
        let re = RegexBuilder::new(&regex::escape(phrase))
            .case_insensitive(true)
            .build()?;
        ranges.extend(re.find_iter(headline).map(|m| m.range()));
    }

    Ok(RE_WORD
        .find_iter(headline)
        .map(|m| Word {
            text: m.as_str(),
            highlighted: ranges
                .iter()
                .any(|r| m.start() < r.end && r.start < m.end()),
        })
        .collect())
}

/// 按字符数贪心换行，超长单词独占一行
fn wrap_words<'a>(words: &[Word<'a>], max_chars: usize) -> Vec<Vec<Word<'a>>> {
    let mut lines: Vec<Vec<Word<'a>>> = Vec::new();
    let mut current: Vec<Word<'a>> = Vec::new();
    let mut current_len = 0;

    for word in words {
        let len = word.text.chars().count();
        if !current.is_empty() && current_len + 1 + len > max_chars {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }
        current_len += if current.is_empty() { len } else { len + 1 };
        current.push(word.clone());
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
