pub mod binance;
pub mod bot;

pub use binance::{BinanceClient, BinanceStream};
pub use bot::{BotHandle, VolatilityBot};
