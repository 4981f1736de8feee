// Adapters layer: concrete implementations for external systems.

pub mod nse;
pub mod storage;
pub mod telegram;
pub mod upstox;

pub use nse::NseClient;
pub use storage::LocalStorage;
pub use telegram::{ConsoleNotifier, TelegramNotifier};
pub use upstox::UpstoxClient;
