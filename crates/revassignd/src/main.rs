use anyhow::Result;
use clap::Parser;
use revassignd::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();
    revassign_core::init_tracing(config.json_logs, config.log_level);

    revassignd::run(config).await
}
