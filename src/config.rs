//! Configuration management.
//!
//! Handles loading and parsing of JSON configuration files with environment
//! variable support for API credentials.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::slippage::SlippageModel;
use crate::types::Symbol;

/// Top-level configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub exchange: ExchangeConfig,
    pub trading: TradingConfig,
    #[serde(default = "default_strategy_name")]
    pub strategy_name: String,
    pub strategy: serde_json::Value,
    pub backtest: BacktestConfig,
    /// Grid search parameters for optimization (optional). Each key is a
    /// strategy param name, value is the array of values to sweep.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid: Option<HashMap<String, Vec<serde_json::Value>>>,
}

fn default_strategy_name() -> String {
    "volatility_regime".to_string()
}

impl Config {
    /// Load configuration from a JSON file, overlaying API credentials from
    /// the environment when present.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref()).context("Failed to read config file")?;
        let mut config: Config = serde_json::from_str(&contents).context("Failed to parse config JSON")?;

        if let Ok(api_key) = std::env::var("EXCHANGE_API_KEY") {
            config.exchange.api_key = Some(api_key);
        }
        if let Ok(api_secret) = std::env::var("EXCHANGE_API_SECRET") {
            config.exchange.api_secret = Some(api_secret);
        }

        Ok(config)
    }

    /// Get timeframe from strategy config. Panics if unset, mirroring the
    /// requirement that a strategy is not runnable without one.
    pub fn timeframe(&self) -> String {
        self.strategy
            .get("timeframe")
            .and_then(|v| v.as_str())
            .expect("FATAL: 'timeframe' is required in the 'strategy' section of config. Example: \"strategy\": { \"timeframe\": \"1h\", ... }")
            .to_string()
    }

    pub fn set_timeframe(&mut self, timeframe: &str) {
        if let Some(obj) = self.strategy.as_object_mut() {
            obj.insert("timeframe".to_string(), serde_json::json!(timeframe));
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            exchange: ExchangeConfig::default(),
            trading: TradingConfig::default(),
            strategy_name: default_strategy_name(),
            strategy: serde_json::json!({}),
            backtest: BacktestConfig::default(),
            grid: None,
        }
    }
}

/// Exchange connection configuration for the live order executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_secret: Option<String>,
    pub maker_fee: f64,
    pub taker_fee: f64,
    pub assumed_slippage: f64,
    pub rate_limit: u32,
    pub max_retries: u32,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        ExchangeConfig {
            api_key: None,
            api_secret: None,
            maker_fee: 0.0002,
            taker_fee: 0.0006,
            assumed_slippage: 0.0005,
            rate_limit: 10,
            max_retries: 3,
        }
    }
}

/// Sizing and risk-manager configuration for live/paper trading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingConfig {
    pub symbols: Vec<String>,
    pub initial_capital: f64,
    pub risk_per_trade: f64,
    pub max_positions: usize,
    pub max_portfolio_heat: f64,
    pub max_position_pct: f64,
    pub max_drawdown: f64,
    pub drawdown_warning: f64,
    pub drawdown_critical: f64,
    pub drawdown_warning_multiplier: f64,
    pub drawdown_critical_multiplier: f64,
    pub consecutive_loss_limit: usize,
    pub consecutive_loss_multiplier: f64,
    pub cooldown_seconds: i64,
    pub max_daily_loss: f64,
    pub position_size_percent: f64,
}

impl Default for TradingConfig {
    fn default() -> Self {
        TradingConfig {
            symbols: vec![
                "BTCUSDT".to_string(),
                "ETHUSDT".to_string(),
                "SOLUSDT".to_string(),
            ],
            initial_capital: 100_000.0,
            risk_per_trade: 0.02,
            max_positions: 5,
            max_portfolio_heat: 0.30,
            max_position_pct: 0.20,
            max_drawdown: 0.25,
            drawdown_warning: 0.10,
            drawdown_critical: 0.15,
            drawdown_warning_multiplier: 0.50,
            drawdown_critical_multiplier: 0.25,
            consecutive_loss_limit: 3,
            consecutive_loss_multiplier: 0.75,
            cooldown_seconds: 60,
            max_daily_loss: 0.05,
            position_size_percent: 0.1,
        }
    }
}

impl TradingConfig {
    pub fn symbols(&self) -> Vec<Symbol> {
        self.symbols.iter().map(|s| Symbol::new(s.clone())).collect()
    }
}

/// Configuration for the backtest execution engine. Field names and
/// defaults follow the option table in spec §6 and
/// `original_source/.../engine.py::BacktestConfig`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestConfig {
    // Capital & leverage
    pub initial_capital: f64,
    pub leverage: f64,
    pub max_position_size: f64,

    // Fees
    pub maker_fee: f64,
    pub taker_fee: f64,
    pub funding_rate: f64,
    pub apply_funding: bool,
    pub funding_interval_minutes: Option<f64>,
    pub funding_interval_candles: Option<u32>,
    pub funding_rate_by_symbol: HashMap<String, f64>,
    pub funding_rate_field: String,

    // Execution
    #[serde(skip)]
    pub slippage_model: Option<SlippageModel>,
    pub fill_model: FillModel,
    pub partial_fills: bool,
    pub partial_fill_threshold_pct: f64,
    pub partial_fill_volume_pct: f64,

    // Risk management
    pub max_drawdown_limit: f64,
    pub daily_loss_limit: f64,
    pub position_limit: usize,

    // Margin
    pub maintenance_margin: f64,
    pub liquidation_penalty_pct: f64,
    pub maintenance_margin_by_symbol: HashMap<String, f64>,
    pub maintenance_vol_multiplier: f64,

    // Metrics
    pub periods_per_year: f64,

    // Data directories (ambient CLI convenience, not core)
    pub data_dir: String,
    pub results_dir: String,
}

/// Engine fill behavior, per spec §6's `fill_model` option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillModel {
    Instant,
    Realistic,
    Pessimistic,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_capital: 10_000.0,
            leverage: 1.0,
            max_position_size: 1.0,

            maker_fee: 0.0002,
            taker_fee: 0.0006,
            funding_rate: 0.0001,
            apply_funding: true,
            funding_interval_minutes: Some(480.0),
            funding_interval_candles: None,
            funding_rate_by_symbol: HashMap::new(),
            funding_rate_field: "funding_rate".to_string(),

            slippage_model: Some(SlippageModel::default_composite()),
            fill_model: FillModel::Realistic,
            partial_fills: true,
            partial_fill_threshold_pct: 0.1,
            partial_fill_volume_pct: 0.1,

            max_drawdown_limit: 0.25,
            daily_loss_limit: 0.05,
            position_limit: 5,

            maintenance_margin: 0.005,
            liquidation_penalty_pct: 0.002,
            maintenance_margin_by_symbol: HashMap::new(),
            maintenance_vol_multiplier: 0.0,

            periods_per_year: 365.0 * 24.0,

            data_dir: "data".to_string(),
            results_dir: "results".to_string(),
        }
    }
}

impl BacktestConfig {
    pub fn slippage_model(&self) -> &SlippageModel {
        self.slippage_model.as_ref().expect("slippage_model always populated by Default/from_file")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_backtest_config_has_composite_slippage() {
        let cfg = BacktestConfig::default();
        assert_eq!(cfg.slippage_model().model_type(), crate::slippage::SlippageType::Composite);
    }

    #[test]
    fn default_config_round_trips_through_json_except_slippage() {
        let cfg = Config::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back.trading.initial_capital, cfg.trading.initial_capital);
    }
}
