//! Bar-driven backtest execution engine.
//!
//! Simulates order fills, positions, funding, liquidation and stop/target
//! protections over a chronological candle sequence, and produces a trade
//! ledger, equity curve and a standard set of performance metrics. Ported
//! from `original_source/backend/services/advanced_backtesting/engine.py`;
//! unlike the T+1-next-open model this crate's lineage used previously,
//! market orders fill on the same bar a signal is generated, while
//! explicit limit/stop orders queue and are evaluated on subsequent bars.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{BacktestConfig, FillModel};
use crate::error::EngineError;
use crate::slippage::SlippageContext;
use crate::strategy::{Strategy, StrategyParams};
use crate::types::{
    Candle, CloseReason, MarketState, OrderIntent, OrderType, Position, PositionSide, Side,
    Signal, Symbol, Trade,
};

/// A strategy-originated order that did not fill on the bar it was created
/// (an explicit limit or stop order). Evaluated against every subsequent
/// bar's range until it fills or the run ends.
#[derive(Debug, Clone)]
struct PendingOrder {
    side: Side,
    order_type: OrderType,
    quantity: f64,
    limit_price: Option<f64>,
    trigger_price: Option<f64>,
    stop_loss: Option<f64>,
    take_profit: Option<f64>,
    trailing_stop_pct: Option<f64>,
}

/// One bar's worth of fill.
struct Fill {
    price: f64,
    quantity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BacktestStatus {
    Completed,
    NoTrades,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub final_capital: f64,
    pub total_return_pct: f64,
    pub net_profit: f64,
    pub gross_profit: f64,
    pub gross_loss: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub calmar_ratio: f64,
    pub max_drawdown_pct: f64,
    pub max_drawdown_bars: usize,
    pub time_in_market_pct: f64,
    pub profit_factor: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventsSummary {
    pub liquidations: usize,
    pub funding_events: usize,
    pub log: Vec<EngineEvent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineEvent {
    pub bar_index: usize,
    pub kind: String,
    pub symbol: Symbol,
    pub amount: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TradesSummary {
    pub total: usize,
    pub winning: usize,
    pub losing: usize,
    pub win_rate_pct: f64,
    pub avg_trade: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub expectancy: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CostsSummary {
    pub total_commission: f64,
    pub total_slippage: f64,
    pub total_funding: f64,
    pub cost_ratio_pct: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    pub config: BacktestConfig,
    pub performance: PerformanceSummary,
    pub events: EventsSummary,
    pub trades: TradesSummary,
    pub costs: CostsSummary,
    pub equity_curve: Vec<f64>,
    pub drawdown_curve: Vec<f64>,
    pub all_trades: Vec<Trade>,
    pub duration_seconds: i64,
    pub status: BacktestStatus,
}

/// Bar-driven backtest engine. One instance per run; `reset()` is implicit
/// in `run()`, mirroring the contract's idempotence requirement.
pub struct Backtester {
    config: BacktestConfig,
    capital: f64,
    positions: HashMap<Symbol, Position>,
    open_orders: HashMap<Symbol, PendingOrder>,
    funding_candle_counters: HashMap<Symbol, u32>,
    funding_minutes_accum: HashMap<Symbol, f64>,
    trades: Vec<Trade>,
    equity_curve: Vec<f64>,
    drawdown_curve: Vec<f64>,
    peak_equity: f64,
    bars_in_market: usize,
    dd_duration: usize,
    max_dd_duration: usize,
    events: Vec<EngineEvent>,
    liquidations: usize,
    funding_events: usize,
    order_seq: u64,
    halted: bool,
}

impl Backtester {
    pub fn new(config: BacktestConfig) -> Result<Self, EngineError> {
        Self::validate_config(&config)?;
        let capital = config.initial_capital;
        Ok(Backtester {
            config,
            capital,
            positions: HashMap::new(),
            open_orders: HashMap::new(),
            funding_candle_counters: HashMap::new(),
            funding_minutes_accum: HashMap::new(),
            trades: Vec::new(),
            equity_curve: Vec::new(),
            drawdown_curve: Vec::new(),
            peak_equity: capital,
            bars_in_market: 0,
            dd_duration: 0,
            max_dd_duration: 0,
            events: Vec::new(),
            liquidations: 0,
            funding_events: 0,
            order_seq: 0,
            halted: false,
        })
    }

    fn validate_config(config: &BacktestConfig) -> Result<(), EngineError> {
        if !(config.initial_capital > 0.0) {
            return Err(EngineError::Validation("initial_capital must be > 0".into()));
        }
        if !(config.leverage >= 1.0) {
            return Err(EngineError::Validation("leverage must be >= 1".into()));
        }
        if !(config.max_position_size > 0.0 && config.max_position_size <= 1.0) {
            return Err(EngineError::Validation("max_position_size must be in (0, 1]".into()));
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.capital = self.config.initial_capital;
        self.positions.clear();
        self.open_orders.clear();
        self.funding_candle_counters.clear();
        self.funding_minutes_accum.clear();
        self.trades.clear();
        self.equity_curve.clear();
        self.drawdown_curve.clear();
        self.peak_equity = self.capital;
        self.bars_in_market = 0;
        self.dd_duration = 0;
        self.max_dd_duration = 0;
        self.events.clear();
        self.liquidations = 0;
        self.funding_events = 0;
        self.order_seq = 0;
        self.halted = false;
    }

    fn next_order_id(&mut self) -> String {
        self.order_seq += 1;
        format!("bt-{}", self.order_seq)
    }

    /// Run the engine over a chronological candle sequence, calling
    /// `strategy.on_candle` once per bar after housekeeping. Candles may
    /// span multiple symbols; each symbol's position, funding accumulator
    /// and pending order are tracked independently.
    pub fn run(
        &mut self,
        candles: &[Candle],
        strategy: &mut dyn Strategy,
        params: &StrategyParams,
    ) -> Result<BacktestResult, EngineError> {
        self.reset();

        if candles.is_empty() {
            return Ok(self.finish(BacktestStatus::NoTrades, 0));
        }

        let mut prev_open_time: HashMap<Symbol, DateTime<Utc>> = HashMap::new();

        for (i, candle) in candles.iter().enumerate() {
            if self.halted {
                break;
            }
            let symbol = candle.symbol.clone();

            // Step 1: resolve interval_minutes.
            let interval_minutes = candle.interval_minutes.unwrap_or_else(|| {
                match (candle.open_time, prev_open_time.get(&symbol)) {
                    (Some(open), Some(prev)) => (open - *prev).num_seconds() as f64 / 60.0,
                    _ => match (candle.open_time, candle.close_time) {
                        (Some(o), Some(c)) => (c - o).num_seconds() as f64 / 60.0,
                        _ => 60.0,
                    },
                }
            });
            if let Some(open) = candle.open_time {
                prev_open_time.insert(symbol.clone(), open);
            }

            // Step 2: mark-to-market.
            if let Some(pos) = self.positions.get_mut(&symbol) {
                pos.update_pnl(candle.close);
                pos.update_excursions(candle.high, candle.low);
                pos.last_update = candle.open_time;
            }

            // Step 3: protections, in priority order stop_loss > take_profit > trailing_stop.
            self.apply_protections(&symbol, candle, i);

            // Step 4: funding.
            if self.config.apply_funding {
                self.apply_funding(&symbol, candle, interval_minutes, i);
            }

            // Step 5: liquidation check (across every open position).
            self.check_liquidation(candle, i);

            // Step 6: process any standing limit/stop order for this symbol.
            self.process_pending_order(&symbol, candle);

            // Step 7: risk gate — max_drawdown_limit halts the whole run.
            let equity_before_signal = self.equity(candle, &symbol);
            let drawdown = self.drawdown(equity_before_signal);
            if drawdown >= self.config.max_drawdown_limit {
                self.halted = true;
            }

            // Step 8: strategy signal.
            if !self.halted {
                let position_snapshot = self.positions.get(&symbol).cloned();
                let state = MarketState {
                    position: position_snapshot.as_ref(),
                    capital: self.capital,
                    equity: equity_before_signal,
                    drawdown,
                    params,
                };
                let signal = strategy.on_candle(candle, &state);
                self.process_signal(&symbol, candle, signal, i);
            }

            // Step 9: book-keeping.
            let equity = self.equity(candle, &symbol);
            if self.positions.contains_key(&symbol) {
                self.bars_in_market += 1;
            }
            if equity > self.peak_equity {
                self.peak_equity = equity;
                self.dd_duration = 0;
            } else {
                self.dd_duration += 1;
                self.max_dd_duration = self.max_dd_duration.max(self.dd_duration);
            }
            self.equity_curve.push(equity);
            self.drawdown_curve.push(self.drawdown(equity));
        }

        // End of data: close all remaining positions at the last bar's close.
        if let Some(last) = candles.last() {
            let symbols: Vec<Symbol> = self.positions.keys().cloned().collect();
            for symbol in symbols {
                let candle = candles
                    .iter()
                    .rev()
                    .find(|c| c.symbol == symbol)
                    .unwrap_or(last);
                self.close_position(&symbol, candle.close, 1.0, CloseReason::EndOfData, candle, 0.0);
            }
        }

        let status = if self.trades.is_empty() {
            BacktestStatus::NoTrades
        } else {
            BacktestStatus::Completed
        };
        let duration = candles
            .first()
            .zip(candles.last())
            .and_then(|(f, l)| Some((f.open_time?, l.close_time.or(l.open_time)?)))
            .map(|(a, b)| (b - a).num_seconds())
            .unwrap_or(0);
        Ok(self.finish(status, duration))
    }

    fn equity(&self, _candle: &Candle, _symbol: &Symbol) -> f64 {
        self.capital + self.positions.values().map(|p| p.unrealized_pnl).sum::<f64>()
    }

    fn drawdown(&self, equity: f64) -> f64 {
        if self.peak_equity <= 0.0 {
            return 0.0;
        }
        ((self.peak_equity - equity) / self.peak_equity).clamp(0.0, 1.0)
    }

    fn maintenance_rate(&self, symbol: &Symbol, candle: &Candle) -> f64 {
        let base = candle
            .maintenance_margin
            .or_else(|| self.config.maintenance_margin_by_symbol.get(symbol.as_str()).copied())
            .unwrap_or(self.config.maintenance_margin);
        base + self.config.maintenance_vol_multiplier * candle.range_volatility()
    }

    fn funding_rate(&self, symbol: &Symbol, candle: &Candle) -> f64 {
        candle
            .funding_rate
            .or_else(|| self.config.funding_rate_by_symbol.get(symbol.as_str()).copied())
            .unwrap_or(self.config.funding_rate)
    }

    /// Fraction of a market order that fills this bar. Under `Realistic`
    /// with `partial_fills` enabled, an order notional above
    /// `partial_fill_threshold_pct` of the bar's notional only fills
    /// `partial_fill_volume_pct` of the bar's volume. `Instant` and
    /// `Pessimistic` always fill in full; `Pessimistic` fills at the
    /// adverse end of the bar's range instead (handled by the caller).
    fn market_fill_ratio(&self, order_notional: f64, candle: &Candle) -> f64 {
        if self.config.fill_model != FillModel::Realistic || !self.config.partial_fills {
            return 1.0;
        }
        let bar_notional = candle.volume * candle.close;
        if bar_notional <= 0.0 || order_notional <= self.config.partial_fill_threshold_pct * bar_notional {
            return 1.0;
        }
        let available = self.config.partial_fill_volume_pct * bar_notional;
        (available / order_notional).clamp(0.0, 1.0)
    }

    /// Stop-loss, take-profit and trailing-stop checks on the open position
    /// for `symbol`, in that priority order. A trigger synthesizes a
    /// reduce-only market close at the trigger price, filled immediately.
    fn apply_protections(&mut self, symbol: &Symbol, candle: &Candle, bar_index: usize) {
        let Some(pos) = self.positions.get_mut(symbol) else { return };
        let trailing_trigger = pos.update_trailing_anchor(candle.high, candle.low);

        let side = pos.side;
        let stop_loss = pos.stop_loss_price;
        let take_profit = pos.take_profit_price;

        let hit_stop = stop_loss.map(|sl| match side {
            PositionSide::Long => candle.low <= sl,
            PositionSide::Short => candle.high >= sl,
        });
        let hit_tp = take_profit.map(|tp| match side {
            PositionSide::Long => candle.high >= tp,
            PositionSide::Short => candle.low <= tp,
        });
        let hit_trailing = trailing_trigger.map(|t| match side {
            PositionSide::Long => candle.low <= t,
            PositionSide::Short => candle.high >= t,
        });

        let trigger = if hit_stop == Some(true) {
            Some((stop_loss.unwrap(), CloseReason::StopLoss))
        } else if hit_tp == Some(true) {
            Some((take_profit.unwrap(), CloseReason::TakeProfit))
        } else if hit_trailing == Some(true) {
            Some((trailing_trigger.unwrap(), CloseReason::TrailingStop))
        } else {
            None
        };

        if let Some((trigger_price, reason)) = trigger {
            self.close_position(symbol, trigger_price, 1.0, reason, candle, 0.0);
            let _ = bar_index;
        }
    }

    fn apply_funding(&mut self, symbol: &Symbol, candle: &Candle, interval_minutes: f64, bar_index: usize) {
        let Some(pos) = self.positions.get(symbol) else { return };
        let notional = pos.entry_price * pos.quantity;
        let rate = self.funding_rate(symbol, candle);

        let periods = if let Some(interval_candles) = self.config.funding_interval_candles {
            let counter = self.funding_candle_counters.entry(symbol.clone()).or_insert(0);
            *counter += 1;
            if *counter >= interval_candles {
                *counter = 0;
                1.0
            } else {
                0.0
            }
        } else if let Some(interval_minutes_cfg) = self.config.funding_interval_minutes {
            let accum = self.funding_minutes_accum.entry(symbol.clone()).or_insert(0.0);
            *accum += interval_minutes;
            let p = *accum / interval_minutes_cfg;
            *accum = 0.0;
            p
        } else {
            0.0
        };

        if periods == 0.0 {
            return;
        }

        let fee = notional * rate * periods;
        let side = pos.side;
        let signed_fee = match side {
            PositionSide::Long => fee,
            PositionSide::Short => -fee,
        };

        self.capital -= signed_fee;
        if let Some(pos) = self.positions.get_mut(symbol) {
            pos.funding_paid += signed_fee;
        }
        self.funding_events += 1;
        self.events.push(EngineEvent {
            bar_index,
            kind: "funding".to_string(),
            symbol: symbol.clone(),
            amount: signed_fee,
        });
    }

    fn check_liquidation(&mut self, candle: &Candle, bar_index: usize) {
        if self.positions.is_empty() {
            return;
        }
        let maintenance_req: f64 = self
            .positions
            .iter()
            .map(|(sym, pos)| candle.close * pos.quantity * self.maintenance_rate(sym, candle))
            .sum();
        let unrealized: f64 = self.positions.values().map(|p| p.unrealized_pnl).sum();

        if self.capital + unrealized > maintenance_req {
            return;
        }

        let symbols: Vec<Symbol> = self.positions.keys().cloned().collect();
        for symbol in symbols {
            let qty = self.positions.get(&symbol).map(|p| p.quantity).unwrap_or(0.0);
            let penalty = candle.close * qty * self.config.liquidation_penalty_pct;
            self.close_position(&symbol, candle.close, 1.0, CloseReason::Liquidation, candle, penalty);
        }
        self.capital = self.capital.max(0.0);
        self.liquidations += 1;
        self.events.push(EngineEvent {
            bar_index,
            kind: "liquidation".to_string(),
            symbol: Symbol::new("*"),
            amount: maintenance_req,
        });
    }

    fn process_pending_order(&mut self, symbol: &Symbol, candle: &Candle) {
        let Some(order) = self.open_orders.get(symbol).cloned() else { return };

        let fill_price = match order.order_type {
            OrderType::Limit => {
                let price = order.limit_price.unwrap_or(candle.close);
                let touched = candle.low <= price && candle.high >= price;
                if !touched {
                    return;
                }
                Some(price)
            }
            OrderType::StopMarket => {
                let trigger = order.trigger_price.unwrap_or(candle.close);
                let crossed = candle.low <= trigger && candle.high >= trigger;
                if !crossed {
                    return;
                }
                let ctx = SlippageContext::default().with_volume(candle.volume);
                let result = self.config.slippage_model().calculate(trigger, order.quantity, order.side, &ctx);
                Some(result.execution_price)
            }
            OrderType::StopLimit => {
                let trigger = order.trigger_price.unwrap_or(candle.close);
                let crossed = candle.low <= trigger && candle.high >= trigger;
                if !crossed {
                    return;
                }
                order.limit_price
            }
            OrderType::Market | OrderType::TrailingStop => Some(candle.close),
        };

        let Some(price) = fill_price else { return };
        self.open_orders.remove(symbol);
        self.open_position(
            symbol,
            order.side,
            order.quantity,
            price,
            candle,
            order.stop_loss,
            order.take_profit,
            order.trailing_stop_pct,
            OrderType::Limit == order.order_type,
        );
    }

    fn process_signal(&mut self, symbol: &Symbol, candle: &Candle, signal: Option<Signal>, bar_index: usize) {
        let _ = bar_index;
        match signal {
            Some(Signal::Buy(intent)) => self.process_open(symbol, Side::Buy, intent, candle),
            Some(Signal::Sell(intent)) => self.process_open(symbol, Side::Sell, intent, candle),
            Some(Signal::Close { quantity }) => self.process_close(symbol, quantity, candle),
            Some(Signal::Hold) | None => {}
        }
    }

    fn process_open(&mut self, symbol: &Symbol, side: Side, intent: OrderIntent, candle: &Candle) {
        let desired_side = PositionSide::from_side(side);
        if let Some(existing) = self.positions.get(symbol) {
            if existing.side != desired_side {
                tracing::debug!(%symbol, "ignoring opposite-side open while a position is already open");
                return;
            }
        }
        if self.open_orders.contains_key(symbol) {
            return;
        }
        if !self.can_open_new_position() {
            return;
        }

        let price = intent.price.unwrap_or(candle.close);
        let quantity = match intent.quantity {
            Some(q) => q,
            None => {
                let available_margin = self.capital * self.config.max_position_size;
                (available_margin * self.config.leverage) / price
            }
        };
        if quantity <= 0.0 {
            return;
        }
        let notional = quantity * price;
        if self.capital < notional / self.config.leverage {
            tracing::debug!(%symbol, "insufficient margin for open, skipping signal");
            return;
        }

        let order_type = intent.order_type.unwrap_or_else(|| {
            if intent.price.is_some() {
                OrderType::Limit
            } else if intent.stop_price.is_some() {
                OrderType::StopMarket
            } else {
                OrderType::Market
            }
        });

        if order_type == OrderType::Market {
            self.open_position(
                symbol,
                side,
                quantity,
                candle.close,
                candle,
                intent.stop_loss,
                intent.take_profit,
                intent.trailing_stop_pct,
                false,
            );
        } else {
            self.open_orders.insert(
                symbol.clone(),
                PendingOrder {
                    side,
                    order_type,
                    quantity,
                    limit_price: intent.price,
                    trigger_price: intent.stop_price,
                    stop_loss: intent.stop_loss,
                    take_profit: intent.take_profit,
                    trailing_stop_pct: intent.trailing_stop_pct,
                },
            );
        }
    }

    fn process_close(&mut self, symbol: &Symbol, quantity: Option<f64>, candle: &Candle) {
        if !self.positions.contains_key(symbol) {
            return;
        }
        let frac = match quantity {
            Some(q) => {
                let total = self.positions.get(symbol).map(|p| p.quantity).unwrap_or(0.0);
                if total <= 0.0 {
                    return;
                }
                (q / total).clamp(0.0, 1.0)
            }
            None => 1.0,
        };
        self.close_position(symbol, candle.close, frac, CloseReason::Regular, candle, 0.0);
    }

    fn can_open_new_position(&self) -> bool {
        if self.positions.len() >= self.config.position_limit {
            return false;
        }
        let equity = self.capital + self.positions.values().map(|p| p.unrealized_pnl).sum::<f64>();
        let daily_loss = (self.config.initial_capital - equity) / self.config.initial_capital;
        daily_loss < self.config.daily_loss_limit
    }

    #[allow(clippy::too_many_arguments)]
    fn open_position(
        &mut self,
        symbol: &Symbol,
        side: Side,
        quantity: f64,
        raw_price: f64,
        candle: &Candle,
        stop_loss: Option<f64>,
        take_profit: Option<f64>,
        trailing_stop_pct: Option<f64>,
        is_limit: bool,
    ) {
        let ctx = SlippageContext::default().with_volume(candle.volume).with_volatility(candle.range_volatility());
        let fill = if is_limit {
            Fill { price: raw_price, quantity }
        } else {
            let fill_ratio = self.market_fill_ratio(quantity * raw_price, candle);
            let fill_qty = quantity * fill_ratio;
            let result = self.config.slippage_model().calculate(raw_price, fill_qty, side, &ctx);
            Fill { price: result.execution_price, quantity: fill_qty }
        };
        if fill.quantity <= 0.0 {
            return;
        }
        let fee_rate = if is_limit { self.config.maker_fee } else { self.config.taker_fee };
        let commission = fill.quantity * fill.price * fee_rate;

        let new_side = PositionSide::from_side(side);
        let margin_delta = (fill.price * fill.quantity) / self.config.leverage;

        match self.positions.get_mut(symbol) {
            Some(pos) if pos.side == new_side => {
                let total_qty = pos.quantity + fill.quantity;
                pos.entry_price = (pos.entry_price * pos.quantity + fill.price * fill.quantity) / total_qty;
                pos.quantity = total_qty;
                pos.margin_used += margin_delta;
                pos.entry_commission_total += commission;
                if stop_loss.is_some() {
                    pos.stop_loss_price = stop_loss;
                }
                if take_profit.is_some() {
                    pos.take_profit_price = take_profit;
                }
                if trailing_stop_pct.is_some() {
                    pos.trailing_stop_pct = trailing_stop_pct;
                }
            }
            _ => {
                let mut pos = Position::new(symbol.clone(), new_side, fill.price, fill.quantity, self.config.leverage);
                pos.entry_time = candle.open_time.unwrap_or_else(Utc::now);
                pos.margin_used = margin_delta;
                pos.entry_commission_total = commission;
                pos.stop_loss_price = stop_loss;
                pos.take_profit_price = take_profit;
                pos.trailing_stop_pct = trailing_stop_pct;
                self.positions.insert(symbol.clone(), pos);
            }
        }

        self.capital -= margin_delta + commission;
    }

    fn close_position(
        &mut self,
        symbol: &Symbol,
        raw_price: f64,
        fraction: f64,
        reason: CloseReason,
        candle: &Candle,
        extra_cost: f64,
    ) {
        let Some(pos) = self.positions.get(symbol).cloned() else { return };
        let close_qty = pos.quantity * fraction;
        if close_qty <= 0.0 {
            return;
        }

        let closing_side = pos.side.closing_side();
        let ctx = SlippageContext::default().with_volume(candle.volume).with_volatility(candle.range_volatility());
        let result = self.config.slippage_model().calculate(raw_price, close_qty, closing_side, &ctx);
        let exit_price = result.execution_price;
        let exit_commission = close_qty * exit_price * self.config.taker_fee;

        let raw_pnl = match pos.side {
            PositionSide::Long => (exit_price - pos.entry_price) * close_qty,
            PositionSide::Short => (pos.entry_price - exit_price) * close_qty,
        };

        let released_margin = pos.margin_used * (close_qty / pos.quantity);
        let released_commission = pos.entry_commission_total * (close_qty / pos.quantity);
        let released_funding = pos.funding_paid * (close_qty / pos.quantity);

        let net_pnl = raw_pnl - exit_commission - released_commission - released_funding - extra_cost;
        self.capital += released_margin + raw_pnl - exit_commission - extra_cost;

        let trade = Trade {
            id: self.next_order_id(),
            symbol: symbol.clone(),
            side: pos.side,
            entry_price: pos.entry_price,
            exit_price,
            quantity: close_qty,
            pnl: net_pnl,
            pnl_pct: if pos.entry_price > 0.0 { net_pnl / (pos.entry_price * close_qty) } else { 0.0 },
            entry_time: pos.entry_time,
            exit_time: candle.open_time.unwrap_or_else(Utc::now),
            duration_seconds: candle
                .open_time
                .map(|t| (t - pos.entry_time).num_seconds())
                .unwrap_or(0),
            commission: exit_commission + released_commission,
            slippage: result.slippage_amount.abs() * close_qty,
            funding_fees: released_funding,
            liquidation_penalty: extra_cost,
            reason,
            max_favorable_excursion: pos.mfe(),
            max_adverse_excursion: pos.mae(),
            r_multiple: None,
        };
        self.trades.push(trade);

        if let Some(pos) = self.positions.get_mut(symbol) {
            pos.quantity -= close_qty;
            pos.margin_used -= released_margin;
            pos.entry_commission_total -= released_commission;
            pos.funding_paid -= released_funding;
            if pos.quantity <= 1e-9 {
                self.positions.remove(symbol);
                self.open_orders.remove(symbol);
            }
        }
    }

    fn finish(&self, status: BacktestStatus, duration_seconds: i64) -> BacktestResult {
        let winning: Vec<&Trade> = self.trades.iter().filter(|t| t.pnl > 0.0).collect();
        let losing: Vec<&Trade> = self.trades.iter().filter(|t| t.pnl <= 0.0).collect();

        let gross_profit: f64 = winning.iter().map(|t| t.pnl + t.commission + t.funding_fees + t.liquidation_penalty).sum();
        let gross_loss: f64 = losing
            .iter()
            .map(|t| (t.pnl + t.commission + t.funding_fees + t.liquidation_penalty).abs())
            .sum();
        let profit_factor = if gross_loss > 0.0 {
            (gross_profit / gross_loss).min(100.0)
        } else if gross_profit > 0.0 {
            100.0
        } else {
            0.0
        };

        let total_commission: f64 = self.trades.iter().map(|t| t.commission).sum();
        let total_slippage: f64 = self.trades.iter().map(|t| t.slippage).sum();
        let total_funding: f64 = self.trades.iter().map(|t| t.funding_fees.abs()).sum();

        let returns: Vec<f64> = self
            .equity_curve
            .windows(2)
            .map(|w| if w[0] != 0.0 { (w[1] - w[0]) / w[0] } else { 0.0 })
            .collect();
        let periods_per_year = self.config.periods_per_year;
        let (sharpe, sortino) = compute_sharpe_sortino(&returns, periods_per_year);

        let total_return_pct = if self.config.initial_capital > 0.0 {
            (self.capital - self.config.initial_capital) / self.config.initial_capital * 100.0
        } else {
            0.0
        };
        let max_dd = self.drawdown_curve.iter().copied().fold(0.0_f64, f64::max);
        let calmar = if max_dd > 1e-9 {
            (total_return_pct / 100.0 / max_dd).clamp(-50.0, 50.0)
        } else {
            0.0
        };

        let win_rate_pct = if !self.trades.is_empty() {
            winning.len() as f64 / self.trades.len() as f64 * 100.0
        } else {
            0.0
        };
        let avg_win = if !winning.is_empty() { winning.iter().map(|t| t.pnl).sum::<f64>() / winning.len() as f64 } else { 0.0 };
        let avg_loss = if !losing.is_empty() { losing.iter().map(|t| t.pnl).sum::<f64>() / losing.len() as f64 } else { 0.0 };
        let avg_trade = if !self.trades.is_empty() { self.trades.iter().map(|t| t.pnl).sum::<f64>() / self.trades.len() as f64 } else { 0.0 };
        let expectancy = (win_rate_pct / 100.0) * avg_win + (1.0 - win_rate_pct / 100.0) * avg_loss;

        let time_in_market_pct = if !self.equity_curve.is_empty() {
            self.bars_in_market as f64 / self.equity_curve.len() as f64 * 100.0
        } else {
            0.0
        };
        let final_capital = self.equity_curve.last().copied().unwrap_or(self.config.initial_capital);
        let cost_ratio_pct = if final_capital.abs() > 1e-9 {
            (total_commission + total_slippage + total_funding) / self.config.initial_capital * 100.0
        } else {
            0.0
        };

        BacktestResult {
            config: self.config.clone(),
            performance: PerformanceSummary {
                final_capital,
                total_return_pct,
                net_profit: final_capital - self.config.initial_capital,
                gross_profit,
                gross_loss,
                sharpe_ratio: sharpe,
                sortino_ratio: sortino,
                calmar_ratio: calmar,
                max_drawdown_pct: max_dd * 100.0,
                max_drawdown_bars: self.max_dd_duration,
                time_in_market_pct,
                profit_factor,
            },
            events: EventsSummary {
                liquidations: self.liquidations,
                funding_events: self.funding_events,
                log: self.events.clone(),
            },
            trades: TradesSummary {
                total: self.trades.len(),
                winning: winning.len(),
                losing: losing.len(),
                win_rate_pct,
                avg_trade,
                avg_win,
                avg_loss,
                expectancy,
            },
            costs: CostsSummary {
                total_commission,
                total_slippage,
                total_funding,
                cost_ratio_pct,
            },
            equity_curve: self.equity_curve.clone(),
            drawdown_curve: self.drawdown_curve.clone(),
            all_trades: self.trades.clone(),
            duration_seconds,
            status,
        }
    }
}

/// Sharpe/Sortino on per-bar simple returns, clamped to `[-25, 25]` and
/// coerced to `0` under `std < 1e-9`. Sortino's downside deviation uses
/// `sqrt(mean(min(0, r)^2))` over every return (TradingView parity, not
/// just the downside subset).
fn compute_sharpe_sortino(returns: &[f64], periods_per_year: f64) -> (f64, f64) {
    if returns.len() < 2 {
        return (0.0, 0.0);
    }
    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let std_dev = variance.sqrt();
    let sharpe = if std_dev > 1e-9 {
        (mean / std_dev * periods_per_year.sqrt()).clamp(-25.0, 25.0)
    } else {
        0.0
    };

    let downside_var = returns.iter().map(|r| r.min(0.0).powi(2)).sum::<f64>() / n;
    let downside_dev = downside_var.sqrt();
    let sortino = if downside_dev > 1e-9 {
        (mean / downside_dev * periods_per_year.sqrt()).clamp(-25.0, 25.0)
    } else {
        0.0
    };
    (sharpe, sortino)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Candle;

    fn candle(symbol: &str, close: f64, low: f64, high: f64) -> Candle {
        Candle::new_unchecked(Symbol::new(symbol), close, high, low, close, 1_000.0)
    }

    fn flat_candle(symbol: &str, price: f64) -> Candle {
        candle(symbol, price, price, price)
    }

    /// Scenario 1 (spec §8): short without explicit quantity closes cleanly
    /// and produces exactly one trade once the run ends.
    #[test]
    fn short_without_explicit_quantity_produces_one_trade() {
        let mut config = BacktestConfig::default();
        config.initial_capital = 10_000.0;
        config.leverage = 5.0;
        config.max_position_size = 0.2;
        config.maker_fee = 0.0;
        config.taker_fee = 0.0;
        config.slippage_model = Some(crate::slippage::SlippageModel::Fixed(crate::slippage::FixedSlippage { slippage_pct: 0.0 }));

        let candles = vec![flat_candle("BTCUSDT", 100.0), flat_candle("BTCUSDT", 99.0)];
        let mut bar = 0usize;
        let mut strategy = move |_c: &Candle, _s: &MarketState| -> Option<Signal> {
            bar += 1;
            if bar == 1 {
                Some(Signal::Sell(OrderIntent::default()))
            } else {
                Some(Signal::Close { quantity: None })
            }
        };

        let mut engine = Backtester::new(config).unwrap();
        let result = engine.run(&candles, &mut strategy, &StrategyParams::new()).unwrap();
        assert_eq!(result.trades.total, 1);
        assert_eq!(result.all_trades[0].side, PositionSide::Short);
        assert!(result.all_trades[0].quantity > 0.0);
    }

    /// Scenario 2 (spec §8): a stop-loss set on entry triggers on the bar
    /// whose low breaches it, with the exit priced at/below the stop.
    #[test]
    fn stop_loss_triggers_on_bar_breach() {
        let mut config = BacktestConfig::default();
        config.initial_capital = 10_000.0;
        config.leverage = 1.0;
        config.slippage_model = Some(crate::slippage::SlippageModel::Fixed(crate::slippage::FixedSlippage { slippage_pct: 0.0 }));

        let candles = vec![flat_candle("BTCUSDT", 100.0), candle("BTCUSDT", 95.0, 94.0, 95.0)];
        let mut bar = 0usize;
        let mut strategy = move |_c: &Candle, _s: &MarketState| -> Option<Signal> {
            bar += 1;
            if bar == 1 {
                Some(Signal::Buy(OrderIntent { stop_loss: Some(98.0), ..Default::default() }))
            } else {
                None
            }
        };

        let mut engine = Backtester::new(config).unwrap();
        let result = engine.run(&candles, &mut strategy, &StrategyParams::new()).unwrap();
        assert_eq!(result.trades.total, 1);
        let trade = &result.all_trades[0];
        assert!(trade.exit_price <= 98.0 + 1e-6);
        assert!(matches!(trade.reason, CloseReason::StopLoss));
    }

    /// Scenario 3 (spec §8): over-leveraged long eventually breaches
    /// maintenance margin and liquidates with a positive penalty.
    #[test]
    fn liquidation_closes_position_with_penalty() {
        let mut config = BacktestConfig::default();
        config.initial_capital = 1_000.0;
        config.leverage = 5.0;
        config.maintenance_margin = 0.02;
        config.liquidation_penalty_pct = 0.01;
        config.apply_funding = false;

        let candles = vec![
            flat_candle("BTCUSDT", 100.0),
            flat_candle("BTCUSDT", 100.0),
            flat_candle("BTCUSDT", 40.0),
        ];
        let mut bar = 0usize;
        let mut strategy = move |_c: &Candle, _s: &MarketState| -> Option<Signal> {
            bar += 1;
            if bar == 1 {
                Some(Signal::Buy(OrderIntent::default()))
            } else {
                None
            }
        };

        let mut engine = Backtester::new(config).unwrap();
        let result = engine.run(&candles, &mut strategy, &StrategyParams::new()).unwrap();
        assert_eq!(result.events.liquidations, 1);
        let liquidation_trade = result.all_trades.iter().find(|t| matches!(t.reason, CloseReason::Liquidation));
        assert!(liquidation_trade.is_some());
        assert!(liquidation_trade.unwrap().liquidation_penalty > 0.0);
    }

    /// Scenario 4 (spec §8): funding sign flips between long and short on
    /// an otherwise identical flat market.
    #[test]
    fn funding_sign_differs_between_long_and_short() {
        let base_candles: Vec<Candle> = (0..10).map(|_| flat_candle("BTCUSDT", 100.0)).collect();

        let run = |side_is_long: bool| -> BacktestResult {
            let mut config = BacktestConfig::default();
            config.funding_rate = 0.01;
            config.funding_interval_candles = Some(1);
            let mut opened = false;
            let mut strategy = move |_c: &Candle, _s: &MarketState| -> Option<Signal> {
                if !opened {
                    opened = true;
                    if side_is_long {
                        Some(Signal::Buy(OrderIntent::default()))
                    } else {
                        Some(Signal::Sell(OrderIntent::default()))
                    }
                } else {
                    None
                }
            };
            let mut engine = Backtester::new(config).unwrap();
            engine.run(&base_candles, &mut strategy, &StrategyParams::new()).unwrap()
        };

        let long_result = run(true);
        let short_result = run(false);
        let long_funding: f64 = long_result.all_trades.iter().map(|t| t.funding_fees).sum();
        let short_funding: f64 = short_result.all_trades.iter().map(|t| t.funding_fees).sum();
        assert!(long_funding > 0.0);
        assert!(short_funding < 0.0);
    }

    /// Scenario 5 (spec §8): a zero position limit blocks every open.
    #[test]
    fn position_limit_zero_blocks_every_open() {
        let mut config = BacktestConfig::default();
        config.position_limit = 0;
        let candles: Vec<Candle> = (0..5).map(|_| flat_candle("BTCUSDT", 100.0)).collect();
        let mut strategy = |_c: &Candle, _s: &MarketState| -> Option<Signal> { Some(Signal::Buy(OrderIntent::default())) };

        let mut engine = Backtester::new(config).unwrap();
        let result = engine.run(&candles, &mut strategy, &StrategyParams::new()).unwrap();
        assert_eq!(result.trades.total, 0);
        assert_eq!(result.status, BacktestStatus::NoTrades);
    }

    #[test]
    fn zero_candles_yields_no_trades_status() {
        let config = BacktestConfig::default();
        let mut engine = Backtester::new(config).unwrap();
        let mut strategy = |_c: &Candle, _s: &MarketState| -> Option<Signal> { None };
        let result = engine.run(&[], &mut strategy, &StrategyParams::new()).unwrap();
        assert_eq!(result.status, BacktestStatus::NoTrades);
        assert!(result.equity_curve.is_empty());
    }

    #[test]
    fn rejects_non_positive_initial_capital() {
        let mut config = BacktestConfig::default();
        config.initial_capital = 0.0;
        assert!(Backtester::new(config).is_err());
    }
}
