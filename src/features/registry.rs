use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::FeatureColumn;

/// Named indicator groups a caller can switch on. `OHLCV` is always part of
/// the feature matrix whether requested or not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureGroup {
    Ohlcv,
    Rsi,
    Macd,
    Sma,
    Ema,
    Bollinger,
    Atr,
    Stoch,
    Returns,
    Lag,
    Momentum,
    Volatility,
    Obv,
    Adx,
}

impl FeatureGroup {
    pub const ALL: [FeatureGroup; 14] = [
        FeatureGroup::Ohlcv,
        FeatureGroup::Rsi,
        FeatureGroup::Macd,
        FeatureGroup::Sma,
        FeatureGroup::Ema,
        FeatureGroup::Bollinger,
        FeatureGroup::Atr,
        FeatureGroup::Stoch,
        FeatureGroup::Returns,
        FeatureGroup::Lag,
        FeatureGroup::Momentum,
        FeatureGroup::Volatility,
        FeatureGroup::Obv,
        FeatureGroup::Adx,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ohlcv => "OHLCV",
            Self::Rsi => "RSI",
            Self::Macd => "MACD",
            Self::Sma => "SMA",
            Self::Ema => "EMA",
            Self::Bollinger => "Bollinger",
            Self::Atr => "ATR",
            Self::Stoch => "Stoch",
            Self::Returns => "Returns",
            Self::Lag => "Lag",
            Self::Momentum => "Momentum",
            Self::Volatility => "Volatility",
            Self::Obv => "OBV",
            Self::Adx => "ADX",
        }
    }

    pub fn columns(&self) -> &'static [FeatureColumn] {
        use FeatureColumn::*;
        match self {
            Self::Ohlcv => &[Open, High, Low, Close, Volume],
            Self::Rsi => &[Rsi14],
            Self::Macd => &[Macd, MacdHistogram, MacdSignal],
            Self::Sma => &[Sma14, Sma50],
            Self::Ema => &[Ema14],
            Self::Bollinger => &[BollingerUpper, BollingerMiddle, BollingerLower],
            Self::Atr => &[Atr14],
            Self::Stoch => &[StochK, StochD],
            Self::Returns => &[Returns],
            Self::Lag => &[Lag1, Lag2],
            Self::Momentum => &[Momentum10],
            Self::Volatility => &[Volatility],
            Self::Obv => &[Obv],
            Self::Adx => &[Adx14, Dmp14, Dmn14, Adxr14],
        }
    }
}

impl FromStr for FeatureGroup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|g| g.as_str() == s.trim())
            .copied()
            .ok_or_else(|| format!("Unknown feature group: {}", s))
    }
}

impl fmt::Display for FeatureGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Feature matrix columns for the requested groups: OHLCV first, then each
/// recognized group in request order, without repeats. Unknown names are
/// skipped.
pub fn resolve_columns<S: AsRef<str>>(groups: &[S]) -> Vec<FeatureColumn> {
    let mut columns: Vec<FeatureColumn> = FeatureGroup::Ohlcv.columns().to_vec();

    for name in groups {
        let name = name.as_ref();
        if name.trim().is_empty() {
            continue;
        }
        match name.parse::<FeatureGroup>() {
            Ok(group) => {
                for col in group.columns() {
                    if !columns.contains(col) {
                        columns.push(*col);
                    }
                }
            }
            Err(_) => debug!("Ignoring unknown feature group '{}'", name),
        }
    }

    columns
}
