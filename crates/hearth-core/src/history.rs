// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Hearth.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

use hearth_types::HistorySample;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Fixed-capacity rolling history, oldest sample first
///
/// Once full, every push evicts the oldest sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRing {
    samples: VecDeque<HistorySample>,
    capacity: usize,
}

impl Default for HistoryRing {
    fn default() -> Self {
        Self::new(288) // 24h at 5-minute intervals
    }
}

impl HistoryRing {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, sample: HistorySample) {
        while self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn latest(&self) -> Option<&HistorySample> {
        self.samples.back()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &HistorySample> + ExactSizeIterator {
        self.samples.iter()
    }

    /// The most recent `n` samples, oldest first
    pub fn last_n(&self, n: usize) -> Vec<HistorySample> {
        let skip = self.samples.len().saturating_sub(n);
        self.samples.iter().skip(skip).copied().collect()
    }

    pub fn to_vec(&self) -> Vec<HistorySample> {
        self.samples.iter().copied().collect()
    }

    pub fn stove_temperatures(&self) -> Vec<f32> {
        self.samples.iter().map(|s| s.stove_temperature_c).collect()
    }

    /// Min and max stove temperature over the last `n` samples
    pub fn stove_range(&self, n: usize) -> Option<(f32, f32)> {
        self.range_of(n, |s| s.stove_temperature_c)
    }

    /// Min and max room temperature over the last `n` samples
    pub fn room_range(&self, n: usize) -> Option<(f32, f32)> {
        self.range_of(n, |s| s.room_temperature_c)
    }

    /// Average oxygen level over the last `n` samples
    pub fn mean_oxygen(&self, n: usize) -> Option<f32> {
        if n == 0 || self.samples.len() < n {
            return None;
        }
        let recent = self.last_n(n);
        Some(recent.iter().map(|s| s.oxygen_percent).sum::<f32>() / n as f32)
    }

    fn range_of(&self, n: usize, value: impl Fn(&HistorySample) -> f32) -> Option<(f32, f32)> {
        if n == 0 || self.samples.len() < n {
            return None;
        }
        self.last_n(n).iter().map(value).fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn sample(i: i64, stove: f32) -> HistorySample {
        HistorySample {
            timestamp: Utc.with_ymd_and_hms(2025, 1, 10, 12, 0, 0).unwrap() + Duration::minutes(i),
            stove_temperature_c: stove,
            room_temperature_c: 20.0 + i as f32 * 0.1,
            oxygen_percent: 18.0,
        }
    }

    #[test]
    fn test_ring_never_exceeds_capacity() {
        let mut ring = HistoryRing::new(4);
        for i in 0..10 {
            ring.push(sample(i, 100.0 + i as f32));
            assert!(ring.len() <= 4);
        }
        assert_eq!(ring.len(), 4);
        assert_eq!(ring.capacity(), 4);
    }

    #[test]
    fn test_fifo_eviction_preserves_order() {
        let capacity = 5;
        let extra = 3;
        let mut ring = HistoryRing::new(capacity);
        for i in 0..(capacity + extra) as i64 {
            ring.push(sample(i, i as f32));
        }

        let temps = ring.stove_temperatures();
        // The first `extra` samples are gone, the rest stay in insertion order
        assert_eq!(temps, vec![3.0, 4.0, 5.0, 6.0, 7.0]);
        assert_eq!(ring.latest().unwrap().stove_temperature_c, 7.0);
    }

    #[test]
    fn test_copy_is_detached_from_ring() {
        let mut ring = HistoryRing::new(3);
        ring.push(sample(0, 1.0));
        let copy = ring.to_vec();
        ring.push(sample(1, 2.0));
        assert_eq!(copy.len(), 1);
        assert_eq!(ring.len(), 2);
    }

    #[test]
    fn test_last_n() {
        let mut ring = HistoryRing::new(10);
        for i in 0..6 {
            ring.push(sample(i, i as f32));
        }
        let last = ring.last_n(3);
        assert_eq!(
            last.iter().map(|s| s.stove_temperature_c).collect::<Vec<_>>(),
            vec![3.0, 4.0, 5.0]
        );
        assert_eq!(ring.last_n(50).len(), 6);
    }

    #[test]
    fn test_rolling_statistics() {
        let mut ring = HistoryRing::new(10);
        assert!(ring.stove_range(3).is_none());
        assert!(ring.mean_oxygen(3).is_none());

        ring.push(sample(0, 250.0));
        ring.push(sample(1, 230.0));
        ring.push(sample(2, 240.0));

        assert_eq!(ring.stove_range(3), Some((230.0, 250.0)));
        assert_eq!(ring.stove_range(2), Some((230.0, 240.0)));
        assert_eq!(ring.mean_oxygen(3), Some(18.0));
        assert!(ring.room_range(4).is_none());
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let mut ring = HistoryRing::new(0);
        ring.push(sample(0, 1.0));
        ring.push(sample(1, 2.0));
        assert_eq!(ring.len(), 1);
    }
}
