//! リサーチワーカー（TUIとは別スレッドで動く）
//!
//! UI からクエリ文字列を受け取り、`Session::research` を最後まで実行して
//! 進捗・結果を `ResearchEvent` として送り返す。1 件ずつ逐次処理する。

use crate::config::Config;
use crate::openai::api::AssistantApi;
use crate::openai::client::OpenAIAssistantApi;
use crate::openai::poller::PollEvent;
use crate::openai::session::Session;
use crate::openai::tools::ToolRegistry;
use std::sync::mpsc::{Receiver, Sender};
use std::thread::JoinHandle;
use tokio::runtime::Runtime;
use tracing::{error, info};

/// ワーカーから UI へ送るイベント
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResearchEvent {
    /// 途中経過 (ツール呼び出しなど)
    Progress(String),
    /// レンダリング済みのメッセージ行 (古い順)
    Finished(Vec<String>),
    /// クエリ失敗。セッションは次のクエリに引き続き使える
    Failed(String),
}

/// 任意の `AssistantApi` 実装でワーカーを開始
pub fn spawn_research_worker<A>(
    mut session: Session<A>,
    rx_query: Receiver<String>,
    tx_event: Sender<ResearchEvent>,
) -> JoinHandle<()>
where
    A: AssistantApi + 'static,
{
    std::thread::spawn(move || {
        let rt = match Runtime::new() {
            Ok(rt) => rt,
            Err(e) => {
                error!(target: "openai", "runtime_build_error: {e}");
                let _ = tx_event.send(ResearchEvent::Failed(format!("failed to start runtime: {e}")));
                return;
            }
        };
        // session is borrowed so its blocking HTTP clients are dropped outside the runtime
        rt.block_on(async {
            while let Ok(query) = rx_query.recv() {
                info!(target: "openai", "query_received: {}", query);
                let progress = tx_event.clone();
                let mut observer = |ev: &PollEvent| {
                    if matches!(ev, PollEvent::ToolCalled { .. }) {
                        let _ = progress.send(ResearchEvent::Progress(ev.to_string()));
                    }
                };
                let event = match session.research(&query, &mut observer).await {
                    Ok(lines) => {
                        info!(target: "openai", lines = lines.len(), "research_finished");
                        ResearchEvent::Finished(lines)
                    }
                    Err(e) => {
                        error!(target: "openai", "research_error: {e:?}");
                        let chain: Vec<String> = e.chain().map(|c| c.to_string()).collect();
                        ResearchEvent::Failed(chain.join(": "))
                    }
                };
                if tx_event.send(event).is_err() {
                    break; // UI が終了した
                }
            }
        });
        drop(session);
    })
}

/// OpenAI + DuckDuckGo + Wikipedia でワーカーを開始
pub fn start_research_worker(
    api_key: &str,
    config: Config,
    rx_query: Receiver<String>,
    tx_event: Sender<ResearchEvent>,
) -> Option<JoinHandle<()>> {
    let registry = match ToolRegistry::with_http_services(&config) {
        Ok(r) => r,
        Err(e) => {
            error!(target: "openai", "tool_registry_error: {e:?}");
            let _ = tx_event.send(ResearchEvent::Failed(format!("failed to set up lookup tools: {e}")));
            return None;
        }
    };
    let session = Session::new(OpenAIAssistantApi::new(api_key), registry, &config);
    Some(spawn_research_worker(session, rx_query, tx_event))
}
