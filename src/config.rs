//! アプリケーション設定と定数

use color_eyre::{Result, eyre::WrapErr};
use std::num::NonZeroU32;
use std::str::FromStr;
use std::time::Duration;

/// アシスタント名（セッション内で1回だけ作成される）
pub const ASSISTANT_NAME: &str = "Investor Assistant";

/// アシスタントに渡す固定の指示文
pub const ASSISTANT_INSTRUCTIONS: &str = "You help users do research on publicly traded companies and you help users decide if they should buy the stock or not.";

/// アプリケーション設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// OpenAI APIモデル名
    pub model: String,
    /// Run のステータス確認間隔（ミリ秒）
    pub poll_interval_ms: u64,
    /// ポーリング回数の上限
    pub max_polls: u32,
    /// Wikipedia の言語サブドメイン (en, ja, ...)
    pub wikipedia_lang: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            // NOTE: Keep in sync with tests (tests/config_tests.rs).
            poll_interval_ms: 2000,
            max_polls: 150,
            wikipedia_lang: "en".to_string(),
        }
    }
}

impl Config {
    /// 新しい設定インスタンスを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 環境変数 (.env 含む) から設定を読み込む。未設定の項目はデフォルト値。
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Some(model) = env_string("ASSISTANT_MODEL") {
            config.model = model;
        }
        if let Some(ms) = env_parse::<u64>("ASSISTANT_POLL_INTERVAL_MS")? {
            config.poll_interval_ms = ms;
        }
        if let Some(n) = env_parse::<NonZeroU32>("ASSISTANT_MAX_POLLS")? {
            config.max_polls = n.get();
        }
        if let Some(lang) = env_string("WIKIPEDIA_LANG") {
            config.wikipedia_lang = lang;
        }
        Ok(config)
    }

    /// ポーリング間隔を `Duration` で取得
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env_string(key)
        .map(|raw| {
            raw.parse::<T>()
                .wrap_err_with(|| format!("invalid value for {key}: {raw:?}"))
        })
        .transpose()
}
