pub mod config;
pub mod cooldown;
pub mod history;
pub mod ledger;
pub mod volatility;

pub use config::{BotConfig, BotFileConfig};
pub use cooldown::CooldownGate;
pub use history::{HistoryEntry, PriceHistory};
pub use ledger::{LedgerSnapshot, TradeLedger};
pub use volatility::VolatilityRule;
