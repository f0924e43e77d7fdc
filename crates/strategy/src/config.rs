use common::{Error, Result};
use serde::{Deserialize, Serialize};

/// Top-level bot config file (TOML).
///
/// Example `config/bots.toml`:
/// ```toml
/// [[bot]]
/// name = "BTC volatility 10m"
/// symbol = "BTCUSDT"
/// window_minutes = 10
/// change_pct = 2.0
/// notional_usd = 50.0
/// # blocking_error_codes = [-2010]
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BotFileConfig {
    #[serde(rename = "bot")]
    pub bots: Vec<BotConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BotConfig {
    /// Human-readable name shown in logs.
    pub name: String,
    /// Trading pair, e.g. "BTCUSDT".
    pub symbol: String,
    /// Lookback window N: history depth in one-minute candles, and the
    /// cooldown duration in minutes after a trade.
    pub window_minutes: u32,
    /// Percentage change versus the close N minutes ago that triggers a trade.
    pub change_pct: f64,
    /// Order size in quote currency; quantity = notional / current price.
    pub notional_usd: f64,
    /// Exchange error codes that arm the cooldown instead of retrying.
    /// -2010 is Binance's "insufficient balance / would not change position".
    #[serde(default = "default_blocking_error_codes")]
    pub blocking_error_codes: Vec<i64>,
}

fn default_blocking_error_codes() -> Vec<i64> {
    vec![-2010]
}

impl BotFileConfig {
    /// Load and validate a TOML config file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read bot config at '{path}': {e}")))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(content)
            .map_err(|e| Error::Config(format!("failed to parse bot config: {e}")))?;
        for bot in &cfg.bots {
            bot.validate()
                .map_err(|e| Error::Config(format!("invalid bot config '{}': {e}", bot.name)))?;
        }
        Ok(cfg)
    }
}

impl BotConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.symbol.trim().is_empty() {
            return Err("symbol must not be empty".into());
        }
        if self.window_minutes == 0 {
            return Err("window_minutes must be > 0".into());
        }
        if self.change_pct <= 0.0 {
            return Err(format!("change_pct must be > 0, got {}", self.change_pct));
        }
        if self.notional_usd <= 0.0 {
            return Err(format!("notional_usd must be > 0, got {}", self.notional_usd));
        }
        Ok(())
    }
}
