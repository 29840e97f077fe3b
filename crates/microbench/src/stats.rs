// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Aggregate statistics over repetitions.

/// Statistic computed across the repetitions of one benchmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregate {
    Mean,
    Median,
    Stddev,
}

impl Aggregate {
    pub const ALL: [Aggregate; 3] = [Aggregate::Mean, Aggregate::Median, Aggregate::Stddev];

    pub fn as_str(self) -> &'static str {
        match self {
            Aggregate::Mean => "mean",
            Aggregate::Median => "median",
            Aggregate::Stddev => "stddev",
        }
    }

    /// Applies this statistic to `samples`; zero for an empty slice.
    pub fn compute(self, samples: &[f64]) -> f64 {
        match self {
            Aggregate::Mean => mean(samples),
            Aggregate::Median => median(samples),
            Aggregate::Stddev => stddev(samples),
        }
    }
}

pub fn mean(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<f64>() / samples.len() as f64
}

pub fn median(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);
    let len = sorted.len();
    if len % 2 == 0 {
        (sorted[len / 2 - 1] + sorted[len / 2]) / 2.0
    } else {
        sorted[len / 2]
    }
}

/// Sample standard deviation (n - 1 denominator).
pub fn stddev(samples: &[f64]) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }
    let avg = mean(samples);
    let variance = samples
        .iter()
        .map(|s| {
            let diff = s - avg;
            diff * diff
        })
        .sum::<f64>()
        / (samples.len() - 1) as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_median() {
        let samples = [4.0, 1.0, 3.0, 2.0];
        assert!((mean(&samples) - 2.5).abs() < 1e-12);
        assert!((median(&samples) - 2.5).abs() < 1e-12);
        assert!((median(&[5.0, 1.0, 3.0]) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_stddev() {
        let samples = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((stddev(&samples) - 2.138_089_935).abs() < 1e-6);
        assert_eq!(stddev(&[1.0]), 0.0);
    }

    #[test]
    fn test_empty() {
        for agg in Aggregate::ALL {
            assert_eq!(agg.compute(&[]), 0.0);
        }
    }
}
