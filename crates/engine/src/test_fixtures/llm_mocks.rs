//! Scripted LLM fake for scene generation tests.
//!
//! Replies are queued per final user message, which identifies the turn: the
//! opening prompt or the action prompt of one option. Because prefetch runs
//! every option concurrently, keying by turn keeps scripts deterministic no
//! matter which branch reaches the backend first.
//!
//! # Usage
//!
//! ```rust,ignore
//! let llm = Arc::new(ScriptedLlm::new());
//! llm.push_start(Ok(scene_json("It begins.", 2)));
//! llm.push_for_intent("open the door", Err(LlmError::RequestFailed("boom".into())));
//! ```

use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use tokio::sync::watch;

use crate::infrastructure::ports::{LlmError, LlmPort, LlmRequest, LlmResponse};
use crate::use_cases::scene::prompts;

type Reply = Result<String, LlmError>;

/// Which turns are currently blocked.
#[derive(Debug, Default)]
struct Gate {
    all: bool,
    turns: HashSet<String>,
}

impl Gate {
    fn blocks(&self, key: &str) -> bool {
        self.all || self.turns.contains(key)
    }
}

pub struct ScriptedLlm {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    requests: Mutex<Vec<LlmRequest>>,
    gate: watch::Sender<Gate>,
}

impl ScriptedLlm {
    pub fn new() -> Self {
        let (gate, _) = watch::channel(Gate::default());
        Self {
            replies: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
            gate,
        }
    }

    /// A fake whose calls block until [`ScriptedLlm::release`] is called.
    pub fn held() -> Self {
        let llm = Self::new();
        llm.hold();
        llm
    }

    /// Block calls made from now on until the next release.
    pub fn hold(&self) {
        self.gate.send_modify(|gate| gate.all = true);
    }

    /// Block only the requests following the option with `intent`.
    pub fn hold_intent(&self, intent: &str) {
        let key = prompts::action_prompt(intent);
        self.gate.send_modify(|gate| {
            gate.turns.insert(key);
        });
    }

    /// Unblock every held call.
    pub fn release(&self) {
        self.gate.send_modify(|gate| {
            gate.all = false;
            gate.turns.clear();
        });
    }

    /// Queue a reply for the opening scene request.
    pub fn push_start(&self, reply: Reply) {
        self.push(prompts::START_PROMPT.to_string(), reply);
    }

    /// Queue a reply for the request following the option with `intent`.
    pub fn push_for_intent(&self, intent: &str, reply: Reply) {
        self.push(prompts::action_prompt(intent), reply);
    }

    fn push(&self, key: String, reply: Reply) {
        self.replies
            .lock()
            .unwrap()
            .entry(key)
            .or_default()
            .push_back(reply);
    }

    /// All requests received so far, in arrival order.
    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn total_calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn start_calls(&self) -> usize {
        self.calls_for(prompts::START_PROMPT)
    }

    /// Requests issued for the option with `intent`.
    pub fn calls_for_intent(&self, intent: &str) -> usize {
        self.calls_for(&prompts::action_prompt(intent))
    }

    /// Most recent request for the option with `intent`.
    pub fn last_request_for_intent(&self, intent: &str) -> Option<LlmRequest> {
        let key = prompts::action_prompt(intent);
        self.requests
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|r| r.last_message() == Some(key.as_str()))
            .cloned()
    }

    fn calls_for(&self, key: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.last_message() == Some(key))
            .count()
    }
}

impl Default for ScriptedLlm {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmPort for ScriptedLlm {
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        let key = request.last_message().unwrap_or_default().to_string();
        self.requests.lock().unwrap().push(request);

        let mut gate = self.gate.subscribe();
        let _ = gate.wait_for(|gate| !gate.blocks(&key)).await;

        let reply = self
            .replies
            .lock()
            .unwrap()
            .get_mut(&key)
            .and_then(VecDeque::pop_front);

        match reply {
            Some(reply) => reply.map(LlmResponse::stop),
            None => Err(LlmError::RequestFailed(format!("no scripted reply for {key:?}"))),
        }
    }
}
