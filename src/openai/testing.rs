//! Scripted `AssistantApi` fake and a local HTTP fixture server shared by the unit tests.

use crate::openai::api::{
    AssistantApi, AssistantSpec, MessageRole, RunSnapshot, RunStatus, ThreadMessage, ToolInvocation,
    ToolOutput,
};
use async_trait::async_trait;
use color_eyre::Result;
use std::collections::VecDeque;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    CreateAssistant(AssistantSpec),
    CreateThread(String),
    CreateRun { thread_id: String, assistant_id: String },
    RetrieveRun,
    SubmitToolOutputs(Vec<ToolOutput>),
    ListMessages(String),
}

/// Replays a fixed sequence of run states; the last state repeats forever.
#[derive(Debug, Default)]
pub struct ScriptedApi {
    statuses: Mutex<VecDeque<RunSnapshot>>,
    pub calls: Mutex<Vec<ApiCall>>,
}

impl ScriptedApi {
    pub fn new(statuses: Vec<RunSnapshot>) -> Self {
        Self {
            statuses: Mutex::new(statuses.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: ApiCall) {
        self.calls.lock().unwrap().push(call);
    }
}

pub fn run(status: RunStatus) -> RunSnapshot {
    RunSnapshot::new("run_1", "thread_1", status)
}

pub fn call(id: &str, name: &str, issue: &str) -> ToolInvocation {
    ToolInvocation {
        id: id.into(),
        name: name.into(),
        arguments: serde_json::json!({ "issue": issue }).to_string(),
    }
}

#[async_trait]
impl AssistantApi for ScriptedApi {
    async fn create_assistant(&self, spec: &AssistantSpec) -> Result<String> {
        self.record(ApiCall::CreateAssistant(spec.clone()));
        Ok("asst_1".into())
    }

    async fn create_thread(&self, user_text: &str) -> Result<String> {
        self.record(ApiCall::CreateThread(user_text.into()));
        Ok("thread_1".into())
    }

    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<RunSnapshot> {
        self.record(ApiCall::CreateRun {
            thread_id: thread_id.into(),
            assistant_id: assistant_id.into(),
        });
        Ok(run(RunStatus::Queued))
    }

    async fn retrieve_run(&self, _thread_id: &str, _run_id: &str) -> Result<RunSnapshot> {
        self.record(ApiCall::RetrieveRun);
        let mut statuses = self.statuses.lock().unwrap();
        let next = if statuses.len() > 1 { statuses.pop_front() } else { statuses.front().cloned() };
        Ok(next.unwrap_or_else(|| run(RunStatus::InProgress)))
    }

    async fn submit_tool_outputs(
        &self,
        _thread_id: &str,
        _run_id: &str,
        outputs: Vec<ToolOutput>,
    ) -> Result<RunSnapshot> {
        self.record(ApiCall::SubmitToolOutputs(outputs));
        Ok(run(RunStatus::Queued))
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>> {
        self.record(ApiCall::ListMessages(thread_id.into()));
        Ok(vec![
            ThreadMessage { role: MessageRole::User, text: "question".into(), created_at: 1 },
            ThreadMessage { role: MessageRole::Assistant, text: "answer".into(), created_at: 2 },
        ])
    }
}

/// Request targets (`GET /path?query`) seen by a [`fixture_server`].
pub type SeenRequests = Arc<Mutex<Vec<String>>>;

/// Serve HTTP/1.1 on 127.0.0.1 with one connection per request.
///
/// `respond` maps the request target to `(status, body)`. Returns the base
/// URL (`http://127.0.0.1:port`) and the targets received so far.
pub fn fixture_server<F>(respond: F) -> (String, SeenRequests)
where
    F: Fn(&str) -> (u16, String) + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let seen: SeenRequests = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&seen);
    std::thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { break };
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut request_line = String::new();
            if reader.read_line(&mut request_line).is_err() {
                continue;
            }
            let mut header = String::new();
            while reader.read_line(&mut header).map(|n| n > 0).unwrap_or(false) {
                if header == "\r\n" {
                    break;
                }
                header.clear();
            }
            let target = request_line.split_whitespace().take(2).collect::<Vec<_>>().join(" ");
            log.lock().unwrap().push(target.clone());
            let (status, body) = respond(&target);
            let _ = write!(
                stream,
                "HTTP/1.1 {status} X\r\nContent-Type: application/json; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
        }
    });
    (format!("http://{addr}"), seen)
}
