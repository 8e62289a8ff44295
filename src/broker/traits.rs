use async_trait::async_trait;

/// Host-provided authority that can tell whether an API key is selected and
/// walk the user through picking one.
#[async_trait]
pub trait CredentialBroker: Send + Sync {
    async fn has_selected_key(&self) -> bool;

    /// Completes once the user has finished interacting, whatever they chose.
    async fn open_selection_flow(&self);
}

/// Where the transport reads the API key from. Consulted on every dispatch,
/// so a key picked through a broker is used by the very next request.
pub trait ApiKeySource: Send + Sync {
    fn api_key(&self) -> Option<String>;
}
