use anyhow::Result;
use news_batch::utils::logging;
use news_batch::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logging::init();

    // 加载配置（可选的 news_batch.toml + 环境变量）
    let config_path = std::env::var("NEWS_BATCH_CONFIG").unwrap_or_else(|_| "news_batch.toml".to_string());
    let config = Config::load(&config_path)?;

    // 初始化并运行一个批次
    App::initialize(config)?.run().await?;

    Ok(())
}
