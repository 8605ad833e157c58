use anyhow::Result;
use room_schedule_scraper::utils::logging;
use room_schedule_scraper::{App, Config};
use tracing::{error, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let mut config = Config::from_env();
    let warnings = config.apply_args(std::env::args().skip(1));

    // 初始化日志
    logging::init(config.verbose_logging);
    for warning in &warnings {
        warn!("⚠️ {}", warning);
    }

    // 初始化并运行应用
    let app = App::initialize(config).await?;
    if let Err(e) = app.run().await {
        error!("❌ 运行中止: {:#}", e);
        return Err(e);
    }

    Ok(())
}
