//! Shared state injected into every handler

use std::sync::Arc;

use crate::api_client::ApiClient;
use crate::config::Config;
use crate::dialogue::DialogEngine;
use crate::session::SessionStore;

#[derive(Clone)]
pub struct BotContext {
    pub api: ApiClient,
    pub sessions: Arc<dyn SessionStore>,
    pub dialogs: DialogEngine,
    pub config: Arc<Config>,
    /// Our own username; commands addressed to other bots are ignored
    pub bot_username: Option<Arc<str>>,
}

impl BotContext {
    pub fn new(config: Config, sessions: Arc<dyn SessionStore>) -> Self {
        Self {
            api: ApiClient::new(config.backend_url.clone()),
            dialogs: DialogEngine::new(sessions.clone()),
            sessions,
            config: Arc::new(config),
            bot_username: None,
        }
    }

    pub fn with_bot_username(mut self, username: impl Into<String>) -> Self {
        self.bot_username = Some(Arc::from(username.into()));
        self
    }
}
