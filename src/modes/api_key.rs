//! API キー入力モード: キーが入力されるまで他の画面には進めない

use super::{AppMode, Mode, ResearchMode};
use crate::config::Config;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    prelude::Stylize,
    style::Color,
    text::Line,
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use tracing::info;

/// API キー入力モード状態
pub struct ApiKeyMode {
    /// 入力中のキー（画面上はマスク表示）
    pub input: String,
    config: Config,
}

impl ApiKeyMode {
    /// `prefill` は .env / 環境変数の OPENAI_API_KEY など
    pub fn new(config: Config, prefill: Option<String>) -> Self {
        Self {
            input: prefill.unwrap_or_default(),
            config,
        }
    }

    fn masked(&self) -> String {
        "*".repeat(self.input.chars().count())
    }

    fn render_header(&self, f: &mut Frame, area: Rect) {
        let guide = vec![
            Line::from("AssistantGPT".bold().fg(Color::Cyan)),
            Line::from("Welcome to AssistantGPT."),
            Line::from("Write down the issue and our Assistant will do the research for you."),
        ];
        let guide_widget = Paragraph::new(guide)
            .block(Block::default().borders(Borders::ALL).title("Guide"));
        f.render_widget(guide_widget, area);
    }

    fn render_input(&self, f: &mut Frame, area: Rect) {
        let mut current = self.masked();
        current.push('_'); // 簡易カーソル表示
        let input_widget = Paragraph::new(current).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Please enter your OpenAI API key"),
        );
        f.render_widget(input_widget, area);
    }
}

impl Mode for ApiKeyMode {
    fn update(&mut self) {}

    fn render(&self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(5), // ヘッダ
                Constraint::Length(3), // キー入力欄
                Constraint::Min(0),    // 余白
            ])
            .split(f.area());

        self.render_header(f, chunks[0]);
        self.render_input(f, chunks[1]);
        let hint = Paragraph::new("Enter: continue / Backspace: delete / Esc or Ctrl+C: quit")
            .style(ratatui::style::Style::default().fg(Color::DarkGray));
        f.render_widget(hint, chunks[2]);
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<Option<AppMode>> {
        match key.code {
            KeyCode::Esc => Ok(Some(AppMode::Exit)),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Ok(Some(AppMode::Exit))
            }
            KeyCode::Enter => {
                let api_key = self.input.trim();
                if api_key.is_empty() {
                    // キーがなければ先へ進まない
                    return Ok(None);
                }
                info!(target: "app", "api_key_complete");
                Ok(Some(AppMode::Research(ResearchMode::new(api_key, self.config.clone()))))
            }
            KeyCode::Backspace => {
                self.input.pop();
                Ok(None)
            }
            KeyCode::Char(ch) => {
                self.input.push(ch);
                Ok(None)
            }
            _ => Ok(None),
        }
    }
}
