use crate::broker::traits::ApiKeySource;
use crate::config::{non_empty_env, API_KEY_VARS};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// Key slot shared between a broker (writer) and the transport (reader).
/// Falls back to the environment when nothing was selected explicitly.
#[derive(Clone, Default)]
pub struct SharedApiKey {
    slot: Arc<RwLock<Option<String>>>,
    env_fallback: bool,
}

impl SharedApiKey {
    pub fn new(initial: Option<String>) -> Self {
        Self {
            slot: Arc::new(RwLock::new(initial.filter(|key| !key.trim().is_empty()))),
            env_fallback: true,
        }
    }

    /// A slot that never consults the environment.
    pub fn isolated(initial: Option<String>) -> Self {
        Self {
            env_fallback: false,
            ..Self::new(initial)
        }
    }

    pub fn select(&self, key: impl Into<String>) {
        let key = key.into().trim().to_string();
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(key).filter(|k| !k.is_empty());
    }

    pub fn clear(&self) {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn is_selected(&self) -> bool {
        self.api_key().is_some()
    }
}

impl fmt::Debug for SharedApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedApiKey")
            .field("selected", &self.is_selected())
            .field("env_fallback", &self.env_fallback)
            .finish()
    }
}

impl ApiKeySource for SharedApiKey {
    fn api_key(&self) -> Option<String> {
        let selected = self
            .slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if selected.is_some() || !self.env_fallback {
            return selected;
        }
        API_KEY_VARS.iter().find_map(|name| non_empty_env(name))
    }
}
