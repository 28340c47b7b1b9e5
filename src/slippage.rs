//! Slippage models.
//!
//! `calculate` is pure and deterministic for every variant except
//! `Adaptive`, which also consults a timestamp and a market-regime label.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlippageType {
    Fixed,
    VolumeImpact,
    Volatility,
    OrderBook,
    Composite,
    Adaptive,
}

impl SlippageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlippageType::Fixed => "fixed",
            SlippageType::VolumeImpact => "volume_impact",
            SlippageType::Volatility => "volatility",
            SlippageType::OrderBook => "order_book",
            SlippageType::Composite => "composite",
            SlippageType::Adaptive => "adaptive",
        }
    }
}

/// Result of a slippage calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlippageResult {
    pub slippage_pct: f64,
    pub slippage_amount: f64,
    pub execution_price: f64,
    pub original_price: f64,
    pub model_type: SlippageType,
    pub components: HashMap<String, f64>,
}

/// Extra per-call context a slippage model may consult. Every field is
/// optional; models fall back to the documented defaults when absent.
#[derive(Debug, Clone, Default)]
pub struct SlippageContext {
    pub volume: Option<f64>,
    pub volatility: Option<f64>,
    pub atr: Option<f64>,
    pub spread: Option<f64>,
    pub bid_price: Option<f64>,
    pub ask_price: Option<f64>,
    pub book_depth: Option<f64>,
    pub timestamp: Option<DateTime<Utc>>,
    pub regime: Option<String>,
    pub is_limit_order: bool,
}

impl SlippageContext {
    pub fn with_volume(mut self, v: f64) -> Self {
        self.volume = Some(v);
        self
    }
    pub fn with_volatility(mut self, v: f64) -> Self {
        self.volatility = Some(v);
        self
    }
    pub fn with_timestamp(mut self, t: DateTime<Utc>) -> Self {
        self.timestamp = Some(t);
        self
    }
    pub fn with_regime(mut self, r: impl Into<String>) -> Self {
        self.regime = Some(r.into());
        self
    }
    pub fn with_limit_order(mut self, limit: bool) -> Self {
        self.is_limit_order = limit;
        self
    }

    fn volume_or_default(&self) -> f64 {
        self.volume.unwrap_or(1_000_000.0)
    }
    fn volatility_or_default(&self) -> f64 {
        self.volatility.unwrap_or(0.02)
    }
}

fn direction(side: crate::types::Side) -> f64 {
    match side {
        crate::types::Side::Buy => 1.0,
        crate::types::Side::Sell => -1.0,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixedSlippage {
    pub slippage_pct: f64,
}

impl Default for FixedSlippage {
    fn default() -> Self {
        Self { slippage_pct: 0.001 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeImpactSlippage {
    pub impact_factor: f64,
    pub min_slippage: f64,
    pub max_slippage: f64,
}

impl Default for VolumeImpactSlippage {
    fn default() -> Self {
        Self {
            impact_factor: 0.1,
            min_slippage: 0.0001,
            max_slippage: 0.05,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolatilitySlippage {
    pub base_slippage: f64,
    pub volatility_multiplier: f64,
    pub max_slippage: f64,
}

impl Default for VolatilitySlippage {
    fn default() -> Self {
        Self {
            base_slippage: 0.0005,
            volatility_multiplier: 2.0,
            max_slippage: 0.03,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderBookSlippage {
    pub spread_multiplier: f64,
    pub depth_factor: f64,
    pub min_spread: f64,
}

impl Default for OrderBookSlippage {
    fn default() -> Self {
        Self {
            spread_multiplier: 0.5,
            depth_factor: 0.00001,
            min_spread: 0.0001,
        }
    }
}

/// One of the concrete slippage formulas, or a combination of them.
/// Replaces the subclass tree of the originating Python service with a sum
/// type; evaluation is a straight match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SlippageModel {
    Fixed(FixedSlippage),
    VolumeImpact(VolumeImpactSlippage),
    Volatility(VolatilitySlippage),
    OrderBook(OrderBookSlippage),
    Composite(Vec<(SlippageModel, f64)>),
    Adaptive {
        base: Box<SlippageModel>,
        time_multipliers: HashMap<u32, f64>,
        regime_multipliers: HashMap<String, f64>,
    },
}

impl Default for SlippageModel {
    fn default() -> Self {
        SlippageModel::default_composite()
    }
}

impl SlippageModel {
    pub fn default_composite() -> Self {
        SlippageModel::Composite(vec![
            (SlippageModel::VolumeImpact(VolumeImpactSlippage::default()), 0.4),
            (SlippageModel::Volatility(VolatilitySlippage::default()), 0.3),
            (SlippageModel::OrderBook(OrderBookSlippage::default()), 0.3),
        ])
    }

    pub fn default_adaptive() -> Self {
        SlippageModel::Adaptive {
            base: Box::new(SlippageModel::VolumeImpact(VolumeImpactSlippage::default())),
            time_multipliers: default_time_multipliers(),
            regime_multipliers: default_regime_multipliers(),
        }
    }

    pub fn model_type(&self) -> SlippageType {
        match self {
            SlippageModel::Fixed(_) => SlippageType::Fixed,
            SlippageModel::VolumeImpact(_) => SlippageType::VolumeImpact,
            SlippageModel::Volatility(_) => SlippageType::Volatility,
            SlippageModel::OrderBook(_) => SlippageType::OrderBook,
            SlippageModel::Composite(_) => SlippageType::Composite,
            SlippageModel::Adaptive { .. } => SlippageType::Adaptive,
        }
    }

    /// Calculate the execution-price impact for an order. Never produces
    /// NaN/Inf: pathological inputs (zero volume, zero price) collapse to
    /// the model's minimum slippage floor.
    pub fn calculate(
        &self,
        price: f64,
        order_size: f64,
        side: crate::types::Side,
        ctx: &SlippageContext,
    ) -> SlippageResult {
        if !price.is_finite() || price <= 0.0 {
            return SlippageResult {
                slippage_pct: 0.0,
                slippage_amount: 0.0,
                execution_price: price.max(0.0),
                original_price: price,
                model_type: self.model_type(),
                components: HashMap::new(),
            };
        }

        match self {
            SlippageModel::Fixed(m) => {
                let pct = m.slippage_pct;
                finish(price, pct, side, SlippageType::Fixed, HashMap::new())
            }
            SlippageModel::VolumeImpact(m) => {
                let volume = ctx.volume_or_default();
                let volatility = ctx.volatility_or_default();
                let order_value = order_size * price;
                let volume_ratio = (order_value / (volume * price).max(1.0)).max(0.0);
                let impact = m.impact_factor * volume_ratio.sqrt() * volatility;
                let pct = impact.clamp(m.min_slippage, m.max_slippage);
                let mut components = HashMap::new();
                components.insert("volume_ratio".to_string(), volume_ratio);
                components.insert("volatility_component".to_string(), volatility);
                components.insert("raw_impact".to_string(), impact);
                finish(price, pct, side, SlippageType::VolumeImpact, components)
            }
            SlippageModel::Volatility(m) => {
                let volatility = match ctx.atr {
                    Some(atr) if price > 0.0 => atr / price,
                    _ => ctx.volatility_or_default(),
                };
                let pct = (m.base_slippage + volatility * m.volatility_multiplier).min(m.max_slippage);
                let mut components = HashMap::new();
                components.insert("base_slippage".to_string(), m.base_slippage);
                components.insert(
                    "volatility_contribution".to_string(),
                    volatility * m.volatility_multiplier,
                );
                finish(price, pct, side, SlippageType::Volatility, components)
            }
            SlippageModel::OrderBook(m) => {
                let spread = ctx.spread.unwrap_or_else(|| match (ctx.bid_price, ctx.ask_price) {
                    (Some(bid), Some(ask)) => (ask - bid) / price,
                    _ => m.min_spread,
                });
                let spread_slippage = spread * m.spread_multiplier;
                let book_depth = ctx.book_depth.unwrap_or(100_000.0);
                let order_value = order_size * price;
                let depth_ratio = order_value / book_depth.max(1.0);
                let depth_slippage = depth_ratio * m.depth_factor;
                let pct = spread_slippage + depth_slippage;
                let mut components = HashMap::new();
                components.insert("spread_slippage".to_string(), spread_slippage);
                components.insert("depth_slippage".to_string(), depth_slippage);
                components.insert("depth_ratio".to_string(), depth_ratio);
                finish(price, pct, side, SlippageType::OrderBook, components)
            }
            SlippageModel::Composite(models) => {
                let mut total = 0.0;
                let mut components = HashMap::new();
                for (model, weight) in models {
                    let r = model.calculate(price, order_size, side, ctx);
                    total += r.slippage_pct * weight;
                    components.insert(model.model_type().as_str().to_string(), r.slippage_pct);
                }
                finish(price, total, side, SlippageType::Composite, components)
            }
            SlippageModel::Adaptive {
                base,
                time_multipliers,
                regime_multipliers,
            } => {
                let base_result = base.calculate(price, order_size, side, ctx);
                let hour = ctx.timestamp.map(|t| t.hour()).unwrap_or(12);
                let time_mult = time_multipliers.get(&hour).copied().unwrap_or(1.0);
                let regime_mult = ctx
                    .regime
                    .as_deref()
                    .and_then(|r| regime_multipliers.get(r))
                    .copied()
                    .unwrap_or(1.0);
                let order_mult = if ctx.is_limit_order { 0.5 } else { 1.0 };
                let pct = base_result.slippage_pct * time_mult * regime_mult * order_mult;
                finish(price, pct, side, SlippageType::Adaptive, base_result.components)
            }
        }
    }
}

fn finish(
    price: f64,
    slippage_pct: f64,
    side: crate::types::Side,
    model_type: SlippageType,
    components: HashMap<String, f64>,
) -> SlippageResult {
    let pct = if slippage_pct.is_finite() { slippage_pct.max(0.0) } else { 0.0 };
    let amount = price * pct * direction(side);
    SlippageResult {
        slippage_pct: pct,
        slippage_amount: amount,
        execution_price: price + amount,
        original_price: price,
        model_type,
        components,
    }
}

fn default_time_multipliers() -> HashMap<u32, f64> {
    [
        (0, 1.5), (1, 1.5), (2, 1.4), (3, 1.3), (4, 1.2), (5, 1.1),
        (6, 1.0), (7, 0.9), (8, 0.8), (9, 0.8), (10, 0.8), (11, 0.85),
        (12, 0.9), (13, 0.85), (14, 0.8), (15, 0.8), (16, 0.85), (17, 0.9),
        (18, 1.0), (19, 1.1), (20, 1.2), (21, 1.3), (22, 1.4), (23, 1.5),
    ]
    .into_iter()
    .collect()
}

fn default_regime_multipliers() -> HashMap<String, f64> {
    [
        ("trending", 1.0),
        ("volatile", 1.5),
        ("ranging", 0.8),
        ("breakout", 2.0),
        ("low_volatility", 0.7),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Side;

    #[test]
    fn fixed_slippage_sign_convention() {
        let model = SlippageModel::Fixed(FixedSlippage { slippage_pct: 0.01 });
        let ctx = SlippageContext::default();
        let buy = model.calculate(100.0, 1.0, Side::Buy, &ctx);
        let sell = model.calculate(100.0, 1.0, Side::Sell, &ctx);
        assert!((buy.execution_price - 101.0).abs() < 1e-9);
        assert!((sell.execution_price - 99.0).abs() < 1e-9);
    }

    #[test]
    fn volume_impact_clamps_to_bounds() {
        let model = SlippageModel::VolumeImpact(VolumeImpactSlippage::default());
        let ctx = SlippageContext::default().with_volume(1.0).with_volatility(5.0);
        let result = model.calculate(100.0, 1_000_000.0, Side::Buy, &ctx);
        assert!(result.slippage_pct <= 0.05 + 1e-12);
    }

    #[test]
    fn composite_default_weights_sum_correctly() {
        let model = SlippageModel::default_composite();
        let ctx = SlippageContext::default().with_volume(1_000_000.0).with_volatility(0.02);
        let result = model.calculate(100.0, 10.0, Side::Buy, &ctx);
        assert!(result.slippage_pct > 0.0);
        assert_eq!(result.components.len(), 3);
    }

    #[test]
    fn adaptive_halves_slippage_for_limit_orders() {
        let model = SlippageModel::default_adaptive();
        let ctx = SlippageContext::default()
            .with_volume(1_000_000.0)
            .with_volatility(0.02)
            .with_regime("trending");
        let market = model.calculate(100.0, 10.0, Side::Buy, &ctx);
        let limit = model.calculate(100.0, 10.0, Side::Buy, &ctx.clone().with_limit_order(true));
        assert!((limit.slippage_pct - market.slippage_pct * 0.5).abs() < 1e-9);
    }

    #[test]
    fn pathological_zero_price_does_not_produce_nan() {
        let model = SlippageModel::default_composite();
        let ctx = SlippageContext::default();
        let result = model.calculate(0.0, 10.0, Side::Buy, &ctx);
        assert!(result.execution_price.is_finite());
        assert!(result.slippage_pct.is_finite());
    }
}
