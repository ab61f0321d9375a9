use color_eyre::Result;
use tracing_appender::rolling;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> Result<()> {
    color_eyre::install()?;

    // Load .env (optional). OPENAI_API_KEY there pre-fills the key screen.
    let _ = dotenvy::dotenv();

    // ログ: 標準出力は使わず、ファイルへのみ出力してratatuiと衝突しないようにする
    let file_appender = rolling::daily("logs", "app.log");
    // _guard はdropするとログが失われるため、main の終わりまで保持
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false) // ファイルにANSIカラー不要
        .with_target(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    let config = assistant_gpt::Config::from_env()?;
    tracing::info!(target: "app", model = %config.model, poll_interval_ms = config.poll_interval_ms, "starting");

    let terminal = ratatui::init();
    let res = assistant_gpt::run(terminal, config);
    ratatui::restore();
    res
}
