use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Every column of a feature table, in storage order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FeatureColumn {
    Open,
    High,
    Low,
    Close,
    Volume,
    Returns,
    Lag1,
    Lag2,
    Sma14,
    Sma50,
    Ema14,
    Volatility,
    BollingerUpper,
    BollingerMiddle,
    BollingerLower,
    Momentum10,
    Macd,
    MacdSignal,
    MacdHistogram,
    Rsi14,
    StochK,
    StochD,
    Atr14,
    Obv,
    Adx14,
    Dmp14,
    Dmn14,
    Adxr14,
}

impl FeatureColumn {
    pub const ALL: [FeatureColumn; 28] = [
        FeatureColumn::Open,
        FeatureColumn::High,
        FeatureColumn::Low,
        FeatureColumn::Close,
        FeatureColumn::Volume,
        FeatureColumn::Returns,
        FeatureColumn::Lag1,
        FeatureColumn::Lag2,
        FeatureColumn::Sma14,
        FeatureColumn::Sma50,
        FeatureColumn::Ema14,
        FeatureColumn::Volatility,
        FeatureColumn::BollingerUpper,
        FeatureColumn::BollingerMiddle,
        FeatureColumn::BollingerLower,
        FeatureColumn::Momentum10,
        FeatureColumn::Macd,
        FeatureColumn::MacdSignal,
        FeatureColumn::MacdHistogram,
        FeatureColumn::Rsi14,
        FeatureColumn::StochK,
        FeatureColumn::StochD,
        FeatureColumn::Atr14,
        FeatureColumn::Obv,
        FeatureColumn::Adx14,
        FeatureColumn::Dmp14,
        FeatureColumn::Dmn14,
        FeatureColumn::Adxr14,
    ];

    pub const COUNT: usize = Self::ALL.len();

    /// Position of the column inside a feature table row.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::High => "High",
            Self::Low => "Low",
            Self::Close => "Close",
            Self::Volume => "Volume",
            Self::Returns => "returns",
            Self::Lag1 => "lag_1",
            Self::Lag2 => "lag_2",
            Self::Sma14 => "SMA_14",
            Self::Sma50 => "SMA_50",
            Self::Ema14 => "EMA_14",
            Self::Volatility => "volatility",
            Self::BollingerUpper => "BBU_20_2.0",
            Self::BollingerMiddle => "BBM_20_2.0",
            Self::BollingerLower => "BBL_20_2.0",
            Self::Momentum10 => "MOM_10",
            Self::Macd => "MACD_12_26_9",
            Self::MacdSignal => "MACDs_12_26_9",
            Self::MacdHistogram => "MACDh_12_26_9",
            Self::Rsi14 => "RSI_14",
            Self::StochK => "STOCHk_14_3_3",
            Self::StochD => "STOCHd_14_3_3",
            Self::Atr14 => "ATRr_14",
            Self::Obv => "OBV",
            Self::Adx14 => "ADX_14",
            Self::Dmp14 => "DMP_14",
            Self::Dmn14 => "DMN_14",
            Self::Adxr14 => "ADXR_14_2",
        }
    }
}

impl FromStr for FeatureColumn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|c| c.as_str() == s)
            .copied()
            .ok_or_else(|| format!("Unknown feature column: {}", s))
    }
}

impl fmt::Display for FeatureColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
