use chrono::NaiveDate;
use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2};

use crate::error::ForecastError;
use crate::features::{FeatureColumn, FeatureTable};
use crate::ml::MinMaxScaler;

/// Fewest labeled rows that still leave one training and one held-out row.
pub const MIN_LABELED_ROWS: usize = 2;

/// Scaled feature matrix with next-day labels and a chronological split.
///
/// The scaler is fitted on every row, the newest one included, and the
/// newest row is only ever used as the projection seed: it has no label.
#[derive(Debug, Clone)]
pub struct TrainingSet {
    columns: Vec<FeatureColumn>,
    dates: Vec<NaiveDate>,
    scaled: Array2<f64>,
    labels: Array1<f64>,
    split: usize,
}

impl TrainingSet {
    pub fn prepare(
        table: &FeatureTable,
        columns: &[FeatureColumn],
        holdout_fraction: f64,
    ) -> Result<Self, ForecastError> {
        let rows = table.len();
        let labeled = rows.saturating_sub(1);
        if labeled < MIN_LABELED_ROWS {
            return Err(ForecastError::InsufficientData {
                rows: labeled,
                required: MIN_LABELED_ROWS,
            });
        }

        let matrix = table.select(columns);
        let (_, scaled) = MinMaxScaler::fit_transform(matrix.view())?;

        let close = table.column(FeatureColumn::Close);
        let labels = close.slice(s![1..]).to_owned();

        let split = (labeled as f64 * (1.0 - holdout_fraction)).floor() as usize;
        if split == 0 || split >= labeled {
            return Err(ForecastError::InsufficientData {
                rows: labeled,
                required: MIN_LABELED_ROWS,
            });
        }

        Ok(Self {
            columns: columns.to_vec(),
            dates: table.dates().to_vec(),
            scaled,
            labels,
            split,
        })
    }

    pub fn columns(&self) -> &[FeatureColumn] {
        &self.columns
    }

    pub fn labeled_rows(&self) -> usize {
        self.labels.len()
    }

    pub fn split_index(&self) -> usize {
        self.split
    }

    pub fn train_x(&self) -> ArrayView2<'_, f64> {
        self.scaled.slice(s![..self.split, ..])
    }

    pub fn train_y(&self) -> ArrayView1<'_, f64> {
        self.labels.slice(s![..self.split])
    }

    pub fn test_x(&self) -> ArrayView2<'_, f64> {
        self.scaled.slice(s![self.split..self.labeled_rows(), ..])
    }

    pub fn test_y(&self) -> ArrayView1<'_, f64> {
        self.labels.slice(s![self.split..])
    }

    /// Dates of the held-out feature rows (the day each prediction is made).
    pub fn test_dates(&self) -> &[NaiveDate] {
        &self.dates[self.split..self.labeled_rows()]
    }

    /// Scaled features of the newest row.
    pub fn seed_row(&self) -> ArrayView1<'_, f64> {
        self.scaled.row(self.scaled.nrows() - 1)
    }
}
