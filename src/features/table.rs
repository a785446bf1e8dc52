use chrono::NaiveDate;
use ndarray::{Array2, ArrayView1, Axis};

use super::FeatureColumn;
use crate::indicators::{
    pct_change, rolling_std, shift, sma, diff, BollingerBands, DirectionalProxy, Stochastic, ATR,
    EMA, MACD, OBV, RSI,
};
use crate::types::PriceHistory;

/// Bars needed before every indicator is defined (`SMA_50`).
pub const WARMUP_BARS: usize = 49;

/// Raw prices plus indicators, one row per trading day. Every retained
/// value is finite; the last row is the most recent day.
#[derive(Debug, Clone)]
pub struct FeatureTable {
    pub ticker: String,
    dates: Vec<NaiveDate>,
    values: Array2<f64>,
}

impl FeatureTable {
    /// Computes the indicator set over the whole history and drops every row
    /// that still has an undefined value. `None` when nothing survives.
    pub fn from_history(history: &PriceHistory) -> Option<Self> {
        let bars = &history.bars;
        let closes = history.closes();

        let returns = pct_change(&closes);
        let lag_1 = shift(&closes, 1);
        let lag_2 = shift(&closes, 2);
        let momentum = diff(&closes, 10);
        let sma_14 = sma(&closes, 14);
        let sma_50 = sma(&closes, 50);
        let volatility = rolling_std(&closes, 20);

        let mut ema_14 = EMA::new(14);
        let mut macd = MACD::default_params();
        let mut rsi = RSI::new(14);
        let mut bollinger = BollingerBands::default_params();
        let mut stoch = Stochastic::default_params();
        let mut atr = ATR::new(14);
        let mut obv = OBV::new();
        let mut directional = DirectionalProxy::new(14);

        let mut dates = Vec::with_capacity(bars.len());
        let mut flat = Vec::with_capacity(bars.len() * FeatureColumn::COUNT);

        for (i, bar) in bars.iter().enumerate() {
            let mut row = [f64::NAN; FeatureColumn::COUNT];
            let mut put = |col: FeatureColumn, value: Option<f64>| {
                row[col.index()] = value.unwrap_or(f64::NAN);
            };

            put(FeatureColumn::Open, Some(bar.open));
            put(FeatureColumn::High, Some(bar.high));
            put(FeatureColumn::Low, Some(bar.low));
            put(FeatureColumn::Close, Some(bar.close));
            put(FeatureColumn::Volume, Some(bar.volume));
            put(FeatureColumn::Returns, returns[i]);
            put(FeatureColumn::Lag1, lag_1[i]);
            put(FeatureColumn::Lag2, lag_2[i]);
            put(FeatureColumn::Sma14, sma_14[i]);
            put(FeatureColumn::Sma50, sma_50[i]);
            put(FeatureColumn::Ema14, Some(ema_14.update(bar.close)));
            put(FeatureColumn::Volatility, volatility[i]);

            let bb = bollinger.update(bar.close);
            put(FeatureColumn::BollingerUpper, bb.map(|b| b.upper));
            put(FeatureColumn::BollingerMiddle, bb.map(|b| b.middle));
            put(FeatureColumn::BollingerLower, bb.map(|b| b.lower));

            put(FeatureColumn::Momentum10, momentum[i]);

            let m = macd.update(bar.close);
            put(FeatureColumn::Macd, Some(m.macd_line));
            put(FeatureColumn::MacdSignal, Some(m.signal_line));
            put(FeatureColumn::MacdHistogram, Some(m.histogram));

            put(FeatureColumn::Rsi14, rsi.update(bar.close));

            let (k, d) = stoch.update(bar.high, bar.low, bar.close);
            put(FeatureColumn::StochK, k);
            put(FeatureColumn::StochD, d);

            put(FeatureColumn::Atr14, atr.update(bar.high, bar.low, bar.close));
            put(FeatureColumn::Obv, Some(obv.update(bar.close, bar.volume)));

            let dm = directional.update(bar.high, bar.low, bar.close);
            put(FeatureColumn::Adx14, Some(dm.range_ratio));
            put(FeatureColumn::Dmp14, dm.plus_move);
            put(FeatureColumn::Dmn14, dm.minus_move);
            put(FeatureColumn::Adxr14, dm.range_ratio_avg);

            if row.iter().all(|v| v.is_finite()) {
                dates.push(bar.date);
                flat.extend_from_slice(&row);
            }
        }

        if dates.is_empty() {
            return None;
        }

        let values = Array2::from_shape_vec((dates.len(), FeatureColumn::COUNT), flat).ok()?;
        Some(Self {
            ticker: history.ticker.clone(),
            dates,
            values,
        })
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn column(&self, col: FeatureColumn) -> ArrayView1<'_, f64> {
        self.values.column(col.index())
    }

    pub fn value(&self, row: usize, col: FeatureColumn) -> Option<f64> {
        self.values.get((row, col.index())).copied()
    }

    pub fn last_value(&self, col: FeatureColumn) -> Option<f64> {
        self.len().checked_sub(1).and_then(|row| self.value(row, col))
    }

    /// Copies the given columns, in the given order, into a new matrix.
    pub fn select(&self, columns: &[FeatureColumn]) -> Array2<f64> {
        let indices: Vec<usize> = columns.iter().map(|c| c.index()).collect();
        self.values.select(Axis(1), &indices)
    }

    /// The most recent `n` rows.
    pub fn tail(&self, n: usize) -> FeatureTable {
        let start = self.len().saturating_sub(n);
        FeatureTable {
            ticker: self.ticker.clone(),
            dates: self.dates[start..].to_vec(),
            values: self.values.slice(ndarray::s![start.., ..]).to_owned(),
        }
    }
}
