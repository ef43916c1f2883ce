//! Testing utilities for the game.
//!
//! This module provides tools for integration testing:
//! - `MockBackend` for deterministic dialogue without API calls
//! - `TestGame` for driving scripted command sequences

use crate::config::{Config, Provider};
use crate::dialogue::ChatBackend;
use crate::game::{Flow, Game, GameError};
use async_trait::async_trait;
use chat::{FinishReason, Request, Response};
use std::collections::VecDeque;
use tokio::sync::Mutex;

/// Text returned once the script runs out.
pub const UNSCRIPTED_REPLY: &str = "(no more scripted replies)";

/// A chat backend that returns scripted results in order and records every
/// request it receives.
#[derive(Default)]
pub struct MockBackend {
    script: Mutex<VecDeque<Result<Option<String>, chat::Error>>>,
    requests: Mutex<Vec<Request>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply.
    pub fn reply(mut self, text: impl Into<String>) -> Self {
        self.script.get_mut().push_back(Ok(Some(text.into())));
        self
    }

    /// Queue a successful call with no content.
    pub fn empty(mut self) -> Self {
        self.script.get_mut().push_back(Ok(None));
        self
    }

    /// Queue a failed call.
    pub fn fail(mut self, error: chat::Error) -> Self {
        self.script.get_mut().push_back(Err(error));
        self
    }

    /// Every request received so far.
    pub async fn requests(&self) -> Vec<Request> {
        self.requests.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.requests.lock().await.len()
    }
}

#[async_trait]
impl ChatBackend for MockBackend {
    async fn complete(&self, request: Request) -> Result<Response, chat::Error> {
        self.requests.lock().await.push(request);

        let next = self
            .script
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok(Some(UNSCRIPTED_REPLY.to_string())));

        next.map(|content| Response {
            id: "mock".to_string(),
            model: "mock".to_string(),
            content,
            finish_reason: FinishReason::Stop,
            usage: None,
        })
    }
}

/// A configuration suitable for tests; never used to reach a real provider.
pub fn test_config() -> Config {
    Config {
        provider: Provider::OpenAi,
        api_key: "test-key".to_string(),
        model: Provider::OpenAi.default_model().to_string(),
        max_response_length: crate::config::DEFAULT_MAX_RESPONSE_LENGTH,
        debug: false,
        game_title: "Test Game".to_string(),
    }
}

/// A village game wired to a mock backend, capturing all output.
pub struct TestGame {
    pub game: Game<MockBackend>,
    output: Vec<u8>,
}

impl TestGame {
    pub fn new(backend: MockBackend) -> Result<Self, GameError> {
        Self::with_config(backend, &test_config())
    }

    pub fn with_config(backend: MockBackend, config: &Config) -> Result<Self, GameError> {
        Ok(Self {
            game: Game::village(config, backend)?,
            output: Vec::new(),
        })
    }

    /// Run one command and return what it printed.
    pub async fn run(&mut self, line: &str) -> Result<(String, Flow), GameError> {
        self.output.clear();
        let flow = self.game.handle_command(line, &mut self.output).await?;
        Ok((String::from_utf8_lossy(&self.output).into_owned(), flow))
    }

    /// Run one command and return only its output.
    pub async fn say(&mut self, line: &str) -> String {
        match self.run(line).await {
            Ok((text, _)) => text,
            Err(e) => format!("[error] {e}"),
        }
    }

    pub fn current_location(&self) -> &str {
        self.game.world().current_id()
    }

    pub async fn backend_calls(&self) -> usize {
        self.game.dialogue().backend().call_count().await
    }
}
