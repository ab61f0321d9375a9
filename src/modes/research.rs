//! リサーチモード: 課題を入力し、アシスタントの回答を表示する

use super::{AppMode, Mode};
use crate::config::Config;
use crate::openai::{ResearchEvent, start_research_worker};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    prelude::Stylize,
    style::Color,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Instant;
use tracing::{info, warn};

/// リサーチモード状態
pub struct ResearchMode {
    /// 現在の入力テキスト
    pub input: String,
    /// 最後に送信された課題
    pub last_submitted: String,
    /// レンダリング済みの会話 ("{role}: {text}")
    pub transcript: Vec<String>,
    /// ツール呼び出しなどの途中経過
    pub activity: Vec<String>,
    /// 直近のクエリの失敗内容
    pub error: Option<String>,
    /// 問い合わせ中フラグ
    pub pending: bool,
    /// モード開始時刻
    pub started: Instant,
    /// クエリ送信用チャンネル
    tx: Sender<String>,
    /// ワーカーイベント受信用チャンネル
    rx: Receiver<ResearchEvent>,
}

impl ResearchMode {
    /// OpenAI ワーカーをバックグラウンドで開始してモードを作成
    pub fn new(api_key: &str, config: Config) -> Self {
        let (tx_query, rx_query) = mpsc::channel::<String>();
        let (tx_event, rx_event) = mpsc::channel::<ResearchEvent>();
        // 起動失敗は Failed イベントとして rx_event に届く
        let _worker = start_research_worker(api_key, config, rx_query, tx_event);
        Self::with_channels(tx_query, rx_event)
    }

    /// 既存のワーカーのチャンネルに接続してモードを作成
    pub fn with_channels(tx: Sender<String>, rx: Receiver<ResearchEvent>) -> Self {
        Self {
            input: String::new(),
            last_submitted: String::from("(none yet)"),
            transcript: Vec::new(),
            activity: Vec::new(),
            error: None,
            pending: false,
            started: Instant::now(),
            tx,
            rx,
        }
    }

    /// 課題を送信。空入力と問い合わせ中の送信は無視する
    pub fn submit_query(&mut self) -> Result<()> {
        let query = self.input.trim().to_string();
        if query.is_empty() || self.pending {
            return Ok(());
        }
        self.last_submitted = query.clone();
        self.input.clear();
        self.transcript.clear();
        self.activity.clear();
        self.error = None;
        self.pending = true;
        info!(target: "app", "submit_query: {}", self.last_submitted);
        if let Err(e) = self.tx.send(query) {
            self.pending = false;
            return Err(color_eyre::eyre::eyre!("research worker is not running: {e}"));
        }
        Ok(())
    }

    /// ワーカーからのイベントを非ブロッキングで取り込む
    pub fn check_worker_events(&mut self) {
        while let Ok(event) = self.rx.try_recv() {
            match event {
                ResearchEvent::Progress(line) => self.activity.push(line),
                ResearchEvent::Finished(lines) => {
                    info!(target: "app", lines = lines.len(), "research_received");
                    self.transcript = lines;
                    self.pending = false;
                }
                ResearchEvent::Failed(error) => {
                    warn!(target: "app", "research_failed: {}", error);
                    self.error = Some(error);
                    self.pending = false;
                }
            }
        }
    }

    /// モード開始からの経過時間を取得
    pub fn elapsed_time(&self) -> std::time::Duration {
        self.started.elapsed()
    }
}

impl Mode for ResearchMode {
    fn update(&mut self) {
        self.check_worker_events();
    }

    fn render(&self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4), // ヘッダ
                Constraint::Length(3), // 入力欄
                Constraint::Length(3), // 直近送信
                Constraint::Length(6), // ツール呼び出し
                Constraint::Min(5),    // 会話
                Constraint::Length(1), // フッタ
            ])
            .split(f.area());

        self.render_header(f, chunks[0]);
        self.render_input(f, chunks[1]);
        self.render_last_submitted(f, chunks[2]);
        self.render_activity(f, chunks[3]);
        self.render_transcript(f, chunks[4]);
        self.render_footer(f, chunks[5]);
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<Option<AppMode>> {
        match key.code {
            KeyCode::Esc => Ok(Some(AppMode::Exit)),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Ok(Some(AppMode::Exit))
            }
            KeyCode::Enter => {
                self.submit_query()?;
                Ok(None)
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

// ===== Private render methods =====

impl ResearchMode {
    fn render_header(&self, f: &mut Frame, area: Rect) {
        let guide = vec![
            Line::from("AssistantGPT".bold().fg(Color::Cyan)),
            Line::from("Write the issue you are interested in → Enter"),
            Line::from("Backspace: delete / Esc or Ctrl+C: quit"),
        ];
        let guide_widget = Paragraph::new(guide)
            .block(Block::default().borders(Borders::ALL).title("API Key Complete"));
        f.render_widget(guide_widget, area);
    }

    fn render_input(&self, f: &mut Frame, area: Rect) {
        let mut current = self.input.clone();
        current.push('_'); // 簡易カーソル表示
        let input_widget = Paragraph::new(current)
            .block(Block::default().borders(Borders::ALL).title("Issue"));
        f.render_widget(input_widget, area);
    }

    fn render_last_submitted(&self, f: &mut Frame, area: Rect) {
        let submitted_widget = Paragraph::new(self.last_submitted.clone())
            .block(Block::default().borders(Borders::ALL).title("Last Submitted"));
        f.render_widget(submitted_widget, area);
    }

    fn render_activity(&self, f: &mut Frame, area: Rect) {
        let lines: Vec<Line> = self.activity.iter().map(|l| Line::from(l.as_str())).collect();
        let widget = Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title("Tool Calls"));
        f.render_widget(widget, area);
    }

    fn render_transcript(&self, f: &mut Frame, area: Rect) {
        let body: Vec<Line> = if let Some(err) = &self.error {
            vec![Line::from(format!("Error: {err}").fg(Color::Red))]
        } else if self.pending {
            vec![Line::from("Researching...")]
        } else if self.transcript.is_empty() {
            vec![Line::from("(no answer yet)")]
        } else {
            self.transcript
                .iter()
                .flat_map(|entry| entry.lines().map(Line::from).chain(std::iter::once(Line::from(""))))
                .collect()
        };
        let widget = Paragraph::new(body)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title("Conversation"));
        f.render_widget(widget, area);
    }

    fn render_footer(&self, f: &mut Frame, area: Rect) {
        let elapsed = self.elapsed_time().as_secs_f32();
        let footer = Paragraph::new(Line::from(vec![Span::raw(format!(
            "elapsed: {elapsed:.1}s"
        ))]))
        .alignment(Alignment::Right);
        f.render_widget(footer, area);
    }
}
