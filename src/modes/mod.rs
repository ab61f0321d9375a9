//! モードシステム: API キー入力画面とリサーチ画面を管理

use color_eyre::Result;
use crossterm::event::KeyEvent;
use ratatui::Frame;

/// 各モードが実装すべきトレイト
pub trait Mode {
    /// フレーム毎の非ブロッキング更新処理（ワーカー応答チェックなど）
    fn update(&mut self);

    /// 画面描画
    fn render(&self, f: &mut Frame);

    /// キーイベント処理
    /// 戻り値: Some(次のモード) でモード遷移、None で同じモード継続
    fn handle_key(&mut self, key: KeyEvent) -> Result<Option<AppMode>>;
}

/// アプリケーションが取り得るモードの列挙型
pub enum AppMode {
    ApiKey(ApiKeyMode),
    Research(ResearchMode),
    Exit,
}

impl AppMode {
    /// 現在のモードで update() を呼び出す
    pub fn update(&mut self) {
        match self {
            AppMode::ApiKey(m) => m.update(),
            AppMode::Research(m) => m.update(),
            AppMode::Exit => {}
        }
    }

    /// 現在のモードで render() を呼び出す
    pub fn render(&self, f: &mut Frame) {
        match self {
            AppMode::ApiKey(m) => m.render(f),
            AppMode::Research(m) => m.render(f),
            AppMode::Exit => {}
        }
    }

    /// 現在のモードで handle_key() を呼び出す
    pub fn handle_key(&mut self, key: KeyEvent) -> Result<Option<AppMode>> {
        match self {
            AppMode::ApiKey(m) => m.handle_key(key),
            AppMode::Research(m) => m.handle_key(key),
            AppMode::Exit => Ok(None),
        }
    }
}

pub mod api_key;
pub mod research;

pub use api_key::ApiKeyMode;
pub use research::ResearchMode;
