// Core modules
pub mod api;
pub mod config;
pub mod execution;
pub mod indicators;
pub mod models;
pub mod risk;
pub mod strategy;

// Re-export commonly used types
pub use api::{BybitClient, ExchangeGateway, GatewayError, GatewayResult};
pub use config::{BotConfig, ConfigError, Credentials};
pub use execution::{CycleOutcome, LoopState, Scheduler, TradingEngine};
pub use models::*;
pub use strategy::{SignalEvaluator, StrategyKind};
