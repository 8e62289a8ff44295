use crate::broker::keys::SharedApiKey;
use crate::broker::traits::CredentialBroker;
use async_trait::async_trait;
use std::io::{self, BufRead, Write};

/// Source of the lines a [`ConsoleBroker`] answers its prompt with.
#[async_trait]
pub trait LineReader: Send + Sync {
    /// `None` means the input is closed.
    async fn read_line(&self, prompt: &'static str) -> io::Result<Option<String>>;
}

/// Reads from the process's stdin through [`read_stdin_line`].
pub struct StdinReader;

#[async_trait]
impl LineReader for StdinReader {
    async fn read_line(&self, prompt: &'static str) -> io::Result<Option<String>> {
        read_stdin_line(prompt).await
    }
}

/// Asks for an API key on the terminal and stores it in a [`SharedApiKey`].
pub struct ConsoleBroker {
    keys: SharedApiKey,
    reader: Box<dyn LineReader>,
}

impl ConsoleBroker {
    pub fn new(keys: SharedApiKey) -> Self {
        Self::with_reader(keys, Box::new(StdinReader))
    }

    pub fn with_reader(keys: SharedApiKey, reader: Box<dyn LineReader>) -> Self {
        Self { keys, reader }
    }
}

#[async_trait]
impl CredentialBroker for ConsoleBroker {
    async fn has_selected_key(&self) -> bool {
        self.keys.is_selected()
    }

    async fn open_selection_flow(&self) {
        eprintln!("Pro mode needs a Gemini API key (https://ai.google.dev/gemini-api/docs/billing).");
        match self.reader.read_line("Paste key: ").await {
            Ok(Some(key)) if !key.trim().is_empty() => {
                self.keys.select(key);
                log::info!("🔑 API key selected");
            }
            Ok(_) => log::warn!("⚠️  No API key entered"),
            Err(e) => log::error!("❌ Failed to read API key: {}", e),
        }
    }
}

/// Reads one trimmed line from stdin off the async runtime. `None` on EOF.
///
/// Goes through the process-wide std handle so callers sharing stdin never
/// lose buffered input to each other.
pub async fn read_stdin_line(prompt: &'static str) -> io::Result<Option<String>> {
    tokio::task::spawn_blocking(move || -> io::Result<Option<String>> {
        let mut stderr = io::stderr();
        stderr.write_all(prompt.as_bytes())?;
        stderr.flush()?;

        let mut line = String::new();
        let read = io::stdin().lock().read_line(&mut line)?;
        Ok((read > 0).then(|| line.trim().to_string()))
    })
    .await
    .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?
}
