//! Shared test fixtures

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use idlelock_core::{AuthResult, AuthenticationGateway};
use tokio::sync::{mpsc, Mutex};

/// Gateway whose challenges resolve only when the test says so
pub struct ScriptedGateway {
    sensor: bool,
    challenges: AtomicUsize,
    prompts: std::sync::Mutex<Vec<String>>,
    replies: Mutex<mpsc::UnboundedReceiver<AuthResult>>,
}

/// Test-side control of a [`ScriptedGateway`]
pub struct Script {
    pub gateway: Arc<ScriptedGateway>,
    replies: mpsc::UnboundedSender<AuthResult>,
}

impl Script {
    pub fn new(sensor: bool) -> Self {
        let (replies, rx) = mpsc::unbounded_channel();
        let gateway = Arc::new(ScriptedGateway {
            sensor,
            challenges: AtomicUsize::new(0),
            prompts: std::sync::Mutex::new(Vec::new()),
            replies: Mutex::new(rx),
        });
        Self { gateway, replies }
    }

    /// Resolve the next (or current) challenge
    pub fn resolve(&self, result: AuthResult) {
        self.replies.send(result).unwrap();
    }

    pub fn challenges(&self) -> usize {
        self.gateway.challenges.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.gateway.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuthenticationGateway for ScriptedGateway {
    async fn has_challenge(&self) -> bool {
        self.sensor
    }

    async fn challenge(&self, prompt: &str) -> AuthResult {
        self.challenges.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        let mut replies = self.replies.lock().await;
        replies
            .recv()
            .await
            .unwrap_or_else(|| AuthResult::Failed("script closed".to_string()))
    }
}

/// Let spawned tasks run without moving the clock
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}
