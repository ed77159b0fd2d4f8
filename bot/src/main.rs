use tgbot::cli::Cli;
use tgbot::{commands, logging, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse_args();

    // publish dan patch tidak butuh konfigurasi MongoDB/bot
    let (config, config_error) = match Config::from_env() {
        Ok(config) => (config, None),
        Err(e) if !cli.command.requires_config() => (Config::from_lookup(|_| None)?, Some(e)),
        Err(e) => return Err(e.into()),
    };
    logging::init(&config)?;
    if let Some(e) = config_error {
        log::warn!("Konfigurasi environment diabaikan, memakai default: {}", e);
    }
    log::debug!("🚀 tgbot {} dimulai (TZ {})", env!("CARGO_PKG_VERSION"), config.tz);

    if let Err(e) = commands::execute(cli, config).await {
        // sudah dicatat logger, jangan dicetak ulang oleh anyhow
        log::error!("{}", e);
        std::process::exit(1);
    }
    Ok(())
}
