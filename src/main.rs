use anyhow::Result;
use attachment_scraper::utils::logging;
use attachment_scraper::{App, Config};
use tracing::warn;

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logging::init(Config::from_env().verbose_logging);

    // 加载配置
    let config = Config::load()?;
    logging::set_verbose(config.verbose_logging);

    // 初始化并运行应用
    let app = App::initialize(config).await?;
    let result = app.run().await;
    app.shutdown().await?;
    let result = result?;

    if !result.is_complete() {
        warn!(
            "运行未完整完成: {} 个条目失败，{} 个文件失败，已处理 {}/{}",
            result.failure_count, result.file_failure_count, result.processed, result.total
        );
        std::process::exit(2);
    }

    Ok(())
}
