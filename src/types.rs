//! Core data types shared across the backtest engine, portfolio engine, OMS
//! and live runner.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// OHLCV candlestick data, optionally carrying exchange-specific metadata
/// (funding rate, maintenance margin override) that the backtest engine
/// consults before falling back to config-level defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candle {
    pub symbol: Symbol,
    pub open_time: Option<DateTime<Utc>>,
    pub close_time: Option<DateTime<Utc>>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub index: Option<usize>,
    pub interval_minutes: Option<f64>,
    pub funding_rate: Option<f64>,
    pub maintenance_margin: Option<f64>,
}

impl Candle {
    /// Validating constructor: rejects non-finite prices and a high/low that
    /// doesn't bound open/close.
    pub fn new(
        symbol: impl Into<Symbol>,
        open_time: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Result<Self, String> {
        if ![open, high, low, close, volume].iter().all(|v| v.is_finite()) {
            return Err("candle contains a non-finite price or volume".into());
        }
        if high < low {
            return Err(format!("candle high {high} below low {low}"));
        }
        if high < open || high < close || low > open || low > close {
            return Err("candle high/low does not bound open/close".into());
        }
        Ok(Self {
            symbol: symbol.into(),
            open_time: Some(open_time),
            close_time: None,
            open,
            high,
            low,
            close,
            volume,
            index: None,
            interval_minutes: None,
            funding_rate: None,
            maintenance_margin: None,
        })
    }

    /// Unchecked constructor for tests and synthetic data where the
    /// high/low bounds are deliberately exercised at the edge.
    pub fn new_unchecked(
        symbol: impl Into<Symbol>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            open_time: None,
            close_time: None,
            open,
            high,
            low,
            close,
            volume,
            index: None,
            interval_minutes: None,
            funding_rate: None,
            maintenance_margin: None,
        }
    }

    pub fn with_open_time(mut self, t: DateTime<Utc>) -> Self {
        self.open_time = Some(t);
        self
    }

    pub fn with_funding_rate(mut self, rate: f64) -> Self {
        self.funding_rate = Some(rate);
        self
    }

    /// Rough intrabar volatility estimate used by slippage and liquidation
    /// checks when no richer measure is available.
    pub fn range_volatility(&self) -> f64 {
        if self.close > 0.0 {
            (self.high - self.low) / self.close
        } else {
            0.02
        }
    }
}

/// Trading pair / instrument identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Symbol(pub String);

impl Symbol {
    pub fn new(s: impl Into<String>) -> Self {
        Symbol(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Symbol(s.to_string())
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Symbol(s)
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// Long/short/flat position side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionSide {
    Long,
    Short,
}

impl PositionSide {
    pub fn from_side(side: Side) -> Self {
        match side {
            Side::Buy => PositionSide::Long,
            Side::Sell => PositionSide::Short,
        }
    }

    /// The side of order that would close this position.
    pub fn closing_side(self) -> Side {
        match self {
            PositionSide::Long => Side::Sell,
            PositionSide::Short => Side::Buy,
        }
    }
}

/// Order type recognized by the backtest engine and the live order executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    Market,
    Limit,
    StopMarket,
    StopLimit,
    TrailingStop,
}

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Open,
    Filled,
    PartiallyFilled,
    Cancelled,
    Rejected,
    Expired,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Cancelled | OrderStatus::Rejected | OrderStatus::Expired
        )
    }
}

/// Why a trade was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CloseReason {
    Regular,
    StopLoss,
    TakeProfit,
    TrailingStop,
    Liquidation,
    EndOfData,
}

impl std::fmt::Display for CloseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CloseReason::Regular => "regular",
            CloseReason::StopLoss => "stop_loss",
            CloseReason::TakeProfit => "take_profit",
            CloseReason::TrailingStop => "trailing_stop",
            CloseReason::Liquidation => "liquidation",
            CloseReason::EndOfData => "end_of_data",
        };
        write!(f, "{s}")
    }
}

/// A resting or filled order, owned by the engine/OMS order queue. Once
/// filled, an order is immutable history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub symbol: Symbol,
    pub side: Side,
    pub order_type: OrderType,
    pub quantity: f64,
    pub price: Option<f64>,
    pub stop_price: Option<f64>,
    pub take_profit: Option<f64>,
    pub stop_loss: Option<f64>,
    pub trailing_stop_pct: Option<f64>,

    pub status: OrderStatus,
    pub filled_quantity: f64,
    pub average_fill_price: f64,
    pub commission: f64,
    pub slippage: f64,

    pub created_at: DateTime<Utc>,
    pub filled_at: Option<DateTime<Utc>>,
}

impl Order {
    pub fn is_active(&self) -> bool {
        matches!(self.status, OrderStatus::Pending | OrderStatus::Open | OrderStatus::PartiallyFilled)
    }
}

/// An open position in a single symbol, one-way mode (no simultaneous long
/// and short). Created on entry fill, mutated on subsequent fills and price
/// updates, destroyed when quantity reaches zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub symbol: Symbol,
    pub side: PositionSide,
    pub entry_price: f64,
    pub quantity: f64,

    pub unrealized_pnl: f64,
    pub realized_pnl: f64,

    pub entry_time: DateTime<Utc>,
    pub last_update: Option<DateTime<Utc>>,

    pub liquidation_price: Option<f64>,
    pub margin_used: f64,
    pub leverage: f64,

    pub entry_commission_total: f64,
    pub funding_paid: f64,

    pub take_profit_price: Option<f64>,
    pub stop_loss_price: Option<f64>,
    pub trailing_stop_pct: Option<f64>,
    pub trail_anchor: Option<f64>,

    pub peak_price: Option<f64>,
    pub trough_price: Option<f64>,
}

impl Position {
    pub fn new(symbol: Symbol, side: PositionSide, entry_price: f64, quantity: f64, leverage: f64) -> Self {
        Self {
            symbol,
            side,
            entry_price,
            quantity,
            unrealized_pnl: 0.0,
            realized_pnl: 0.0,
            entry_time: Utc::now(),
            last_update: None,
            liquidation_price: None,
            margin_used: (entry_price * quantity) / leverage.max(1.0),
            leverage,
            entry_commission_total: 0.0,
            funding_paid: 0.0,
            take_profit_price: None,
            stop_loss_price: None,
            trailing_stop_pct: None,
            trail_anchor: Some(entry_price),
            peak_price: None,
            trough_price: None,
        }
    }

    pub fn update_pnl(&mut self, current_price: f64) {
        self.unrealized_pnl = match self.side {
            PositionSide::Long => (current_price - self.entry_price) * self.quantity,
            PositionSide::Short => (self.entry_price - current_price) * self.quantity,
        };
    }

    /// Update MAE/MFE extremes from the current bar's range. Idempotent
    /// within a bar; safe to call once per bar after `update_pnl`.
    pub fn update_excursions(&mut self, high: f64, low: f64) {
        self.peak_price = Some(self.peak_price.map_or(high, |p| p.max(high)));
        self.trough_price = Some(self.trough_price.map_or(low, |t| t.min(low)));
    }

    /// Maximum Favorable Excursion, as a non-negative percentage.
    pub fn mfe(&self) -> f64 {
        match self.side {
            PositionSide::Long => self
                .peak_price
                .map(|p| ((p - self.entry_price) / self.entry_price * 100.0).max(0.0))
                .unwrap_or(0.0),
            PositionSide::Short => self
                .trough_price
                .map(|t| ((self.entry_price - t) / self.entry_price * 100.0).max(0.0))
                .unwrap_or(0.0),
        }
    }

    /// Maximum Adverse Excursion, as a non-negative percentage.
    pub fn mae(&self) -> f64 {
        match self.side {
            PositionSide::Long => self
                .trough_price
                .map(|t| ((self.entry_price - t) / self.entry_price * 100.0).max(0.0))
                .unwrap_or(0.0),
            PositionSide::Short => self
                .peak_price
                .map(|p| ((p - self.entry_price) / self.entry_price * 100.0).max(0.0))
                .unwrap_or(0.0),
        }
    }

    /// Update the trailing-stop anchor from the current bar's range and
    /// return the current trailing-stop trigger price, if trailing is armed.
    pub fn update_trailing_anchor(&mut self, high: f64, low: f64) -> Option<f64> {
        let pct = self.trailing_stop_pct?;
        self.trail_anchor = Some(match self.side {
            PositionSide::Long => self.trail_anchor.unwrap_or(low).max(high),
            PositionSide::Short => self.trail_anchor.unwrap_or(high).min(low),
        });
        let anchor = self.trail_anchor?;
        Some(match self.side {
            PositionSide::Long => anchor * (1.0 - pct),
            PositionSide::Short => anchor * (1.0 + pct),
        })
    }
}

/// A closed lot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub id: String,
    pub symbol: Symbol,
    pub side: PositionSide,
    pub entry_price: f64,
    pub exit_price: f64,
    pub quantity: f64,

    pub pnl: f64,
    pub pnl_pct: f64,

    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    pub duration_seconds: i64,

    pub commission: f64,
    pub slippage: f64,
    pub funding_fees: f64,
    pub liquidation_penalty: f64,
    pub reason: CloseReason,

    pub max_favorable_excursion: f64,
    pub max_adverse_excursion: f64,
    pub r_multiple: Option<f64>,
}

impl Trade {
    pub fn return_pct(&self) -> f64 {
        self.pnl_pct * 100.0
    }
}

/// Strategy-issued signal. Replaces the duck-typed action dict of the
/// originating system with an explicit tagged union.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Signal {
    Buy(OrderIntent),
    Sell(OrderIntent),
    Close { quantity: Option<f64> },
    Hold,
}

/// Parameters attached to a `Buy`/`Sell` signal. Mirrors the strategy
/// function's output record from the external contract in spec §6.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderIntent {
    pub symbol: Option<Symbol>,
    pub quantity: Option<f64>,
    pub price: Option<f64>,
    pub stop_price: Option<f64>,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    pub trailing_stop_pct: Option<f64>,
    pub order_type: Option<OrderType>,
}

/// Read-only market/account state handed to the strategy each bar, per the
/// strategy function contract in spec §6.
#[derive(Debug, Clone)]
pub struct MarketState<'a> {
    pub position: Option<&'a Position>,
    pub capital: f64,
    pub equity: f64,
    pub drawdown: f64,
    pub params: &'a HashMap<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(h: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::hours(h)
    }

    #[test]
    fn candle_rejects_non_finite() {
        let err = Candle::new("BTCUSDT", t(0), f64::NAN, 101.0, 99.0, 100.0, 10.0);
        assert!(err.is_err());
    }

    #[test]
    fn candle_rejects_bad_bounds() {
        let err = Candle::new("BTCUSDT", t(0), 100.0, 99.0, 101.0, 100.0, 10.0);
        assert!(err.is_err());
    }

    #[test]
    fn candle_accepts_valid_bar() {
        let c = Candle::new("BTCUSDT", t(0), 100.0, 102.0, 98.0, 101.0, 10.0).unwrap();
        assert_eq!(c.close, 101.0);
    }

    #[test]
    fn position_mfe_mae_are_non_negative_for_long() {
        let mut pos = Position::new(Symbol::new("BTCUSDT"), PositionSide::Long, 100.0, 1.0, 1.0);
        pos.update_excursions(110.0, 95.0);
        assert!(pos.mfe() >= 0.0);
        assert!(pos.mae() >= 0.0);
        assert!((pos.mfe() - 10.0).abs() < 1e-9);
        assert!((pos.mae() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn trailing_anchor_seeds_from_first_bar_seen() {
        let mut pos = Position::new(Symbol::new("BTCUSDT"), PositionSide::Long, 100.0, 1.0, 1.0);
        pos.trailing_stop_pct = Some(0.05);
        pos.trail_anchor = None;
        let stop = pos.update_trailing_anchor(105.0, 102.0).unwrap();
        assert!((stop - 105.0 * 0.95).abs() < 1e-9);
    }

    #[test]
    fn position_side_closing_side() {
        assert_eq!(PositionSide::Long.closing_side(), Side::Sell);
        assert_eq!(PositionSide::Short.closing_side(), Side::Buy);
    }
}
