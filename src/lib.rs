
// 同階層のファイルをモジュールとしてインポート
pub mod config;
pub mod error;
pub mod modes; // API key / research screens
pub mod openai; // Assistants API session, run poller, tools

pub use config::Config;
pub use error::AssistantError;

use color_eyre::Result;
use crossterm::event::{self as crossterm_event, Event, KeyEventKind};
use ratatui::DefaultTerminal;
use std::time::Duration;

// Ensure .env is loaded for tests before anything else runs in the test process.
#[cfg(test)]
#[ctor::ctor]
fn load_dotenv_for_tests() {
    let _ = dotenvy::dotenv();
}

/// アプリケーションのメインループを実行
pub fn run(mut terminal: DefaultTerminal, config: Config) -> Result<()> {
    let prefill = std::env::var("OPENAI_API_KEY").ok();
    let mut current_mode = modes::AppMode::ApiKey(modes::ApiKeyMode::new(config, prefill));

    loop {
        // 現在のモードで更新処理を実行
        current_mode.update();

        // 画面を描画
        terminal.draw(|f| current_mode.render(f))?;

        // 100ms以内にイベントが来たら処理
        if crossterm_event::poll(Duration::from_millis(100))? {
            match crossterm_event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    match current_mode.handle_key(key) {
                        Ok(Some(next_mode)) => {
                            if matches!(next_mode, modes::AppMode::Exit) {
                                break;
                            }
                            current_mode = next_mode;
                        }
                        Ok(None) => {}
                        Err(e) => {
                            // 同じモードのまま継続
                            tracing::error!("Error in mode: {:?}", e);
                        }
                    }
                }
                Event::Resize(_, _) => {
                    // 次ループで再描画されるので特別な処理なし
                }
                _ => {}
            }
        }
    }
    Ok(())
}
