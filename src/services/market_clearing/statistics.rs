use tracing::warn;

use super::types::ClearingType;
use crate::config::{MarketConfig, StatMode, StatType, StatisticDefinition};

#[derive(Debug, Clone, Copy, PartialEq)]
struct Sample {
    price: f64,
    clearing_type: ClearingType,
}

/// Circular history of cleared prices and the rolling statistics computed over it
#[derive(Debug, Clone)]
pub struct StatisticsEngine {
    definitions: Vec<StatisticDefinition>,
    windows: Vec<usize>,
    history: Vec<Sample>,
    price_index: usize,
    total_samples: u64,
    values: Vec<f64>,
    price_cap: f64,
    ignore_pricecap: bool,
    ignore_failedmarket: bool,
    init_price: f64,
    init_stdev: f64,
    future_mean_price: Option<f64>,
}

impl StatisticsEngine {
    pub fn new(config: &MarketConfig) -> Self {
        let seed = Sample {
            price: config.init_price,
            clearing_type: ClearingType::Exact,
        };
        let windows = config
            .statistics
            .iter()
            .map(|stat| config.statistic_window(stat))
            .collect();
        let mean_seed = config.future_mean_price.unwrap_or(config.init_price);
        let values = config
            .statistics
            .iter()
            .map(|stat| match stat.stat_type {
                StatType::Mean => mean_seed,
                StatType::StdDev => config.init_stdev,
            })
            .collect();

        Self {
            definitions: config.statistics.clone(),
            windows,
            history: vec![seed; config.history_slots()],
            price_index: 0,
            total_samples: 0,
            values,
            price_cap: config.price_cap,
            ignore_pricecap: config.ignore_pricecap,
            ignore_failedmarket: config.ignore_failedmarket,
            init_price: config.init_price,
            init_stdev: config.init_stdev,
            future_mean_price: config.future_mean_price,
        }
    }

    /// Store a cleared price and recompute every statistic
    pub fn record(&mut self, price: f64, clearing_type: ClearingType) {
        let price = price.clamp(-self.price_cap, self.price_cap);
        self.history[self.price_index] = Sample {
            price,
            clearing_type,
        };
        self.price_index = (self.price_index + 1) % self.history.len();
        self.total_samples += 1;

        for n in 0..self.definitions.len() {
            self.values[n] = self.compute(n);
        }
    }

    fn compute(&self, n: usize) -> f64 {
        let definition = &self.definitions[n];
        let window = self.windows[n];
        let (stop, required) = match definition.mode {
            StatMode::Current => (self.price_index as i64, window as u64),
            StatMode::Past => (self.price_index as i64 - 1, window as u64 + 1),
        };
        let len = self.history.len() as i64;
        let start = (stop - window as i64).rem_euclid(len) as usize;

        let samples: Vec<f64> = (0..window)
            .map(|k| self.history[(start + k) % self.history.len()])
            .filter(|sample| !self.skipped(sample))
            .map(|sample| sample.price)
            .collect();

        let mean = if samples.is_empty() {
            warn!(
                "Statistic {}: every sample in the window was skipped, using a mean of 0",
                definition.name
            );
            0.0
        } else {
            samples.iter().sum::<f64>() / samples.len() as f64
        };
        let mean = self.future_mean_price.unwrap_or(mean);

        match definition.stat_type {
            StatType::Mean => mean,
            StatType::StdDev => {
                if self.total_samples < required {
                    self.init_stdev
                } else if samples.is_empty() {
                    0.0
                } else {
                    let variance = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>()
                        / samples.len() as f64;
                    variance.sqrt()
                }
            }
        }
    }

    fn skipped(&self, sample: &Sample) -> bool {
        (self.ignore_pricecap && sample.price.abs() == self.price_cap)
            || (self.ignore_failedmarket && sample.clearing_type == ClearingType::Failure)
    }

    /// Current statistic values in configuration order
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn definitions(&self) -> &[StatisticDefinition] {
        &self.definitions
    }

    pub fn total_samples(&self) -> u64 {
        self.total_samples
    }

    /// First mean statistic of a snapshot, falling back to the configured seed
    pub fn published_mean(&self, values: &[f64]) -> f64 {
        self.first_of(StatType::Mean, values)
            .unwrap_or_else(|| self.future_mean_price.unwrap_or(self.init_price))
    }

    /// First standard deviation statistic of a snapshot, falling back to init_stdev
    pub fn published_stdev(&self, values: &[f64]) -> f64 {
        self.first_of(StatType::StdDev, values)
            .unwrap_or(self.init_stdev)
    }

    fn first_of(&self, stat_type: StatType, values: &[f64]) -> Option<f64> {
        self.definitions
            .iter()
            .zip(values)
            .find(|(definition, _)| definition.stat_type == stat_type)
            .map(|(_, value)| *value)
    }
}
