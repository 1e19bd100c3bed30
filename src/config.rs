use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::api::bybit::BYBIT_DEMO_API_BASE;
use crate::strategy::{IndicatorParams, SignalEvaluator, StrategyKind};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("{0} not found in environment")]
    MissingCredential(&'static str),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Runtime settings, read from the environment (and `.env`)
///
/// Field names are the lower-cased environment variable names, e.g.
/// `TRADING_SYMBOL` -> `trading_symbol`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotConfig {
    pub trading_symbol: String,
    pub trade_quantity: f64,
    /// Kline interval as Bybit spells it ("1", "5", "60", "D", ...)
    pub trading_interval: String,
    /// Bars of history fetched per cycle
    pub trading_limit: usize,
    pub poll_interval_secs: u64,
    pub leverage: u32,
    pub atr_multiplier: f64,
    /// Reward:risk ratio for the take-profit distance
    pub risk_ratio: f64,
    pub position_timeout_secs: u64,
    pub cooldown_secs: u64,
    pub strategy: StrategyKind,
    pub bybit_base_url: String,
    pub price_decimals: u32,
    pub qty_decimals: u32,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            trading_symbol: "BTCUSDT".to_string(),
            trade_quantity: 0.03,
            trading_interval: "1".to_string(),
            trading_limit: 100,
            poll_interval_secs: 10,
            leverage: 10,
            atr_multiplier: 1.5,
            risk_ratio: 1.5,
            position_timeout_secs: 300,
            cooldown_secs: 120,
            strategy: StrategyKind::EmaRsi,
            bybit_base_url: BYBIT_DEMO_API_BASE.to_string(),
            price_decimals: 2,
            qty_decimals: 3,
        }
    }
}

impl BotConfig {
    /// Load from process environment on top of the defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_environment(config::Environment::default().try_parsing(true))
    }

    /// Load from an explicit environment source (tests inject a map here)
    pub fn from_environment(env: config::Environment) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&BotConfig::default())?)
            .add_source(env)
            .build()?;

        let config: BotConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trading_symbol.trim().is_empty() {
            return Err(ConfigError::Invalid("TRADING_SYMBOL is empty".to_string()));
        }
        if !(self.trade_quantity.is_finite() && self.trade_quantity > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "TRADE_QUANTITY must be positive, got {}",
                self.trade_quantity
            )));
        }
        if self.trading_limit == 0 {
            return Err(ConfigError::Invalid("TRADING_LIMIT must be at least 1".to_string()));
        }
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "POLL_INTERVAL_SECS must be at least 1".to_string(),
            ));
        }
        if self.leverage == 0 {
            return Err(ConfigError::Invalid("LEVERAGE must be at least 1".to_string()));
        }
        if !(self.atr_multiplier.is_finite() && self.atr_multiplier >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "ATR_MULTIPLIER must be >= 0, got {}",
                self.atr_multiplier
            )));
        }
        if !(self.risk_ratio.is_finite() && self.risk_ratio > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "RISK_RATIO must be positive, got {}",
                self.risk_ratio
            )));
        }
        if self.atr_multiplier == 0.0 {
            tracing::warn!("ATR_MULTIPLIER is 0, every bracket will collapse onto the entry price");
        }
        if !self.history_covers_strategy() {
            tracing::warn!(
                trading_limit = self.trading_limit,
                required = self.min_history_bars(),
                strategy = %self.strategy,
                "TRADING_LIMIT is below what the strategy needs, no order will ever be placed"
            );
        }
        Ok(())
    }

    /// Bars the configured strategy needs before it can signal
    pub fn min_history_bars(&self) -> usize {
        SignalEvaluator::new(self.strategy, IndicatorParams::default()).min_bars_required()
    }

    pub fn history_covers_strategy(&self) -> bool {
        self.trading_limit >= self.min_history_bars()
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn position_timeout(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.position_timeout_secs as i64)
    }

    pub fn cooldown(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.cooldown_secs as i64)
    }
}

/// Bybit API key pair
#[derive(Clone)]
pub struct Credentials {
    pub api_key: String,
    pub api_secret: String,
}

impl Credentials {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::MissingCredential(name))
        };

        Ok(Self {
            api_key: read("BYBIT_API_KEY")?,
            api_secret: read("BYBIT_API_SECRET")?,
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"***")
            .finish()
    }
}
