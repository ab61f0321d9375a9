// モードのキー操作テスト: API キー入力画面とリサーチ画面
use assistant_gpt::config::Config;
use assistant_gpt::modes::{ApiKeyMode, AppMode, Mode, ResearchMode};
use assistant_gpt::openai::ResearchEvent;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::sync::mpsc::channel;

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::empty())
}

fn type_text(mode: &mut impl Mode, text: &str) {
    for ch in text.chars() {
        mode.handle_key(key(KeyCode::Char(ch))).unwrap();
    }
}

#[test]
fn api_key_is_required_before_research() {
    let mut m = ApiKeyMode::new(Config::new(), None);

    // 空のキーでは先へ進まない
    let result = m.handle_key(key(KeyCode::Enter)).unwrap();
    assert!(result.is_none(), "empty key must not unlock the research screen");

    type_text(&mut m, "   ");
    assert!(m.handle_key(key(KeyCode::Enter)).unwrap().is_none());
}

#[test]
fn api_key_editing() {
    let mut m = ApiKeyMode::new(Config::new(), Some("sk-ab".into()));
    assert_eq!(m.input, "sk-ab");
    type_text(&mut m, "c");
    assert_eq!(m.input, "sk-abc");
    m.handle_key(key(KeyCode::Backspace)).unwrap();
    assert_eq!(m.input, "sk-ab");
}

#[test]
fn api_key_screen_quits_on_esc_and_ctrl_c() {
    let mut m = ApiKeyMode::new(Config::new(), None);
    assert!(matches!(m.handle_key(key(KeyCode::Esc)), Ok(Some(AppMode::Exit))));
    let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
    assert!(matches!(m.handle_key(ctrl_c), Ok(Some(AppMode::Exit))));
    assert_eq!(m.input, "", "ctrl+c must not be typed into the key");
}

#[test]
fn entered_key_unlocks_research_mode() {
    let mut m = ApiKeyMode::new(Config::new(), Some("sk-test".into()));
    match m.handle_key(key(KeyCode::Enter)) {
        Ok(Some(AppMode::Research(r))) => {
            assert_eq!(r.input, "");
            assert!(!r.pending);
            assert!(r.transcript.is_empty());
        }
        _ => panic!("Enter with a key should open the research screen"),
    }
}

#[test]
fn research_submit_and_receive_flow() {
    let (tx_query, rx_query) = channel::<String>();
    let (tx_event, rx_event) = channel::<ResearchEvent>();
    let mut r = ResearchMode::with_channels(tx_query, rx_event);
    assert_eq!(r.last_submitted, "(none yet)");

    type_text(&mut r, "Tesla stock");
    r.handle_key(key(KeyCode::Enter)).unwrap();

    assert_eq!(rx_query.try_recv().unwrap(), "Tesla stock");
    assert_eq!(r.last_submitted, "Tesla stock");
    assert_eq!(r.input, "");
    assert!(r.pending);

    tx_event
        .send(ResearchEvent::Progress("Calling function: get_issue_from_ddg with arg {\"issue\":\"Tesla stock\"}".into()))
        .unwrap();
    tx_event
        .send(ResearchEvent::Finished(vec![
            "user: Tesla stock".into(),
            "assistant: Tesla closed at \\$250".into(),
        ]))
        .unwrap();
    r.update();

    assert!(!r.pending);
    assert_eq!(r.activity.len(), 1);
    assert_eq!(r.transcript, vec!["user: Tesla stock", "assistant: Tesla closed at \\$250"]);
    assert!(r.error.is_none());
}

#[test]
fn app_mode_enum_dispatch() {
    let mut mode = AppMode::ApiKey(ApiKeyMode::new(Config::new(), None));
    mode.update();
    let result = mode.handle_key(key(KeyCode::Esc));
    assert!(matches!(result, Ok(Some(AppMode::Exit))));
}
