//! Strategy contract shared by the backtest engine and the live runner.
//!
//! Replaces the inheritance-based strategy hierarchy of the originating
//! service with a single capability trait: `on_candle` is called once per
//! confirmed bar with a read-only view of account state and returns an
//! optional signal. Indicator helpers are delivered as free functions over a
//! rolling candle buffer rather than persistent per-strategy state.

use std::collections::HashMap;

use crate::types::{Candle, MarketState, Signal};

/// `{candle, state} -> signal?` — the one interface both the backtest engine
/// and the live runner drive. `&mut self` lets a strategy keep its own
/// scratch state (e.g. a regime classifier) across bars; the engine never
/// inspects it.
pub trait Strategy {
    fn on_candle(&mut self, candle: &Candle, state: &MarketState) -> Option<Signal>;

    /// Human-readable name, used in logs and result metadata. Defaults to
    /// the type name.
    fn name(&self) -> &str {
        "strategy"
    }
}

/// Any `FnMut(&Candle, &MarketState) -> Option<Signal>` closure is a
/// strategy. Lets tests and simple scripts pass a plain closure to
/// `Backtester::run` instead of defining a struct.
impl<F> Strategy for F
where
    F: FnMut(&Candle, &MarketState) -> Option<Signal>,
{
    fn on_candle(&mut self, candle: &Candle, state: &MarketState) -> Option<Signal> {
        self(candle, state)
    }
}

/// Rolling buffer of recent candles handed to a live-runner strategy.
/// Indicators are computed on demand from this buffer; nothing persists
/// between calls beyond what the strategy stores itself.
#[derive(Debug, Clone, Default)]
pub struct CandleBuffer {
    candles: Vec<Candle>,
    max_len: usize,
}

impl CandleBuffer {
    pub fn new(max_len: usize) -> Self {
        Self {
            candles: Vec::with_capacity(max_len.min(1024)),
            max_len,
        }
    }

    pub fn push(&mut self, candle: Candle) {
        self.candles.push(candle);
        if self.candles.len() > self.max_len {
            let excess = self.candles.len() - self.max_len;
            self.candles.drain(0..excess);
        }
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }

    pub fn highs(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.high).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.low).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.volume).collect()
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }
}

/// Strategy-specific parameters carried alongside a backtest run, echoed
/// back into `MarketState::params` each bar.
pub type StrategyParams = HashMap<String, serde_json::Value>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PositionSide, Position, Symbol};
    use chrono::{TimeZone, Utc};

    #[test]
    fn closures_satisfy_the_strategy_trait() {
        let mut s = |_c: &Candle, _st: &MarketState| -> Option<Signal> { Some(Signal::Hold) };
        let candle = Candle::new_unchecked(Symbol::new("BTCUSDT"), 100.0, 101.0, 99.0, 100.0, 1.0);
        let params = StrategyParams::new();
        let state = MarketState {
            position: None,
            capital: 1000.0,
            equity: 1000.0,
            drawdown: 0.0,
            params: &params,
        };
        assert!(matches!(s.on_candle(&candle, &state), Some(Signal::Hold)));
    }

    #[test]
    fn buffer_evicts_oldest_beyond_capacity() {
        let mut buf = CandleBuffer::new(3);
        for i in 0..5 {
            let c = Candle::new_unchecked(
                Symbol::new("BTCUSDT"),
                100.0 + i as f64,
                101.0 + i as f64,
                99.0,
                100.0 + i as f64,
                1.0,
            );
            buf.push(c);
        }
        assert_eq!(buf.len(), 3);
        assert_eq!(buf.closes(), vec![102.0, 103.0, 104.0]);
    }

    #[test]
    fn position_is_readable_through_market_state() {
        let pos = Position::new(Symbol::new("BTCUSDT"), PositionSide::Long, 100.0, 1.0, 1.0);
        let params = StrategyParams::new();
        let state = MarketState {
            position: Some(&pos),
            capital: 900.0,
            equity: 900.0,
            drawdown: 0.0,
            params: &params,
        };
        assert_eq!(state.position.unwrap().entry_price, 100.0);
        let _ = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    }
}
