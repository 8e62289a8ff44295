pub mod console;
pub mod keys;
pub mod traits;

pub use console::{ConsoleBroker, LineReader, StdinReader};
pub use keys::SharedApiKey;
pub use traits::{ApiKeySource, CredentialBroker};
