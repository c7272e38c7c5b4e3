//! Rolling wall-clock window extrema.

use std::collections::VecDeque;

use chrono::TimeDelta;

use super::types::Timestamp;

/// Trailing wall-clock window tracking the maximum and minimum of a series.
///
/// The window ending at `t` covers `(t - window, t]`, so it always holds at
/// least the newest value. Maxima and minima are kept in monotonic deques;
/// each value is pushed and evicted at most once.
#[derive(Debug, Clone)]
pub struct RollingExtrema {
    window: TimeDelta,
    /// Candidates for the maximum, values strictly decreasing front to back.
    maxima: VecDeque<(Timestamp, f64)>,
    /// Candidates for the minimum, values strictly increasing front to back.
    minima: VecDeque<(Timestamp, f64)>,
}

impl RollingExtrema {
    pub fn new(window: TimeDelta) -> Self {
        Self {
            window,
            maxima: VecDeque::new(),
            minima: VecDeque::new(),
        }
    }

    /// Adds the value observed at `timestamp` and returns `(max, min)` of the
    /// window ending there.
    ///
    /// Timestamps must not decrease across calls; several values may share
    /// one timestamp. A window reaching past the earliest representable
    /// time evicts nothing.
    pub fn push(&mut self, timestamp: Timestamp, value: f64) -> (f64, f64) {
        if let Some(horizon) = timestamp.checked_sub_signed(self.window) {
            while self.maxima.front().is_some_and(|&(t, _)| t <= horizon) {
                self.maxima.pop_front();
            }
            while self.minima.front().is_some_and(|&(t, _)| t <= horizon) {
                self.minima.pop_front();
            }
        }

        while self.maxima.back().is_some_and(|&(_, v)| v <= value) {
            self.maxima.pop_back();
        }
        self.maxima.push_back((timestamp, value));

        while self.minima.back().is_some_and(|&(_, v)| v >= value) {
            self.minima.pop_back();
        }
        self.minima.push_back((timestamp, value));

        let max = self.maxima.front().map_or(value, |&(_, v)| v);
        let min = self.minima.front().map_or(value, |&(_, v)| v);
        (max, min)
    }
}

/// Largest `max - min` spread over every trailing window of the series.
///
/// Returns `0.0` for an empty series.
pub fn max_trailing_range(
    points: impl IntoIterator<Item = (Timestamp, f64)>,
    window: TimeDelta,
) -> f64 {
    let mut extrema = RollingExtrema::new(window);
    let mut worst = 0.0_f64;
    for (timestamp, value) in points {
        let (max, min) = extrema.push(timestamp, value);
        let range = max - min;
        if range > worst {
            worst = range;
        }
    }
    worst
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::sim::types::naive_timestamp;

    fn at(day: u32, hour: u32) -> Timestamp {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .and_then(|d| d.and_hms_opt(hour, 0, 0))
            .map(naive_timestamp)
            .expect("valid timestamp")
    }

    /// Reference O(n * w) scan over the same half-open windows.
    fn naive_worst(points: &[(Timestamp, f64)], window: TimeDelta) -> f64 {
        let mut worst = 0.0_f64;
        for (i, &(t, _)) in points.iter().enumerate() {
            let in_window = points[..=i].iter().filter(|(s, _)| *s > t - window);
            let (max, min) = in_window.fold((f64::MIN, f64::MAX), |(hi, lo), &(_, v)| {
                (hi.max(v), lo.min(v))
            });
            worst = worst.max(max - min);
        }
        worst
    }

    #[test]
    fn first_push_is_its_own_window() {
        let mut extrema = RollingExtrema::new(TimeDelta::hours(24));
        assert_eq!(extrema.push(at(1, 0), 3.0), (3.0, 3.0));
    }

    #[test]
    fn window_is_open_at_its_start() {
        let mut extrema = RollingExtrema::new(TimeDelta::hours(2));
        extrema.push(at(1, 0), 10.0);
        extrema.push(at(1, 1), 5.0);
        // (02:00 - 2h, 02:00] excludes the 00:00 value
        assert_eq!(extrema.push(at(1, 2), 6.0), (6.0, 5.0));
    }

    #[test]
    fn gaps_evict_by_wall_clock() {
        let mut extrema = RollingExtrema::new(TimeDelta::hours(24));
        extrema.push(at(1, 0), -50.0);
        extrema.push(at(1, 1), 0.0);
        // Next sample comes two days later: both old values fall out.
        assert_eq!(extrema.push(at(3, 1), 4.0), (4.0, 4.0));
    }

    #[test]
    fn shared_timestamps_are_one_point_in_time() {
        let mut extrema = RollingExtrema::new(TimeDelta::hours(1));
        extrema.push(at(1, 0), 0.0);
        extrema.push(at(1, 0), -2.0);
        assert_eq!(extrema.push(at(1, 1), -1.0), (-1.0, -1.0));
    }

    #[test]
    fn window_longer_than_calendar_keeps_everything() {
        let mut extrema = RollingExtrema::new(TimeDelta::MAX);
        extrema.push(at(1, 0), -3.0);
        assert_eq!(extrema.push(at(20, 0), 4.0), (4.0, -3.0));
    }

    #[test]
    fn empty_series_has_zero_range() {
        assert_eq!(max_trailing_range(Vec::new(), TimeDelta::hours(24)), 0.0);
    }

    #[test]
    fn matches_naive_scan() {
        let values = [
            0.0, -1.5, -3.0, 2.0, 4.5, 1.0, -6.0, -2.0, 3.0, 8.0, 7.5, -1.0, 0.5, 9.0, -4.0,
        ];
        let points: Vec<_> = values
            .iter()
            .enumerate()
            .map(|(i, &v)| (at(1 + (i as u32 * 5) / 24, (i as u32 * 5) % 24), v))
            .collect();
        for hours in [1, 5, 6, 12, 24, 48] {
            let window = TimeDelta::hours(hours);
            let fast = max_trailing_range(points.iter().copied(), window);
            assert_eq!(fast, naive_worst(&points, window), "window {hours}h");
        }
    }
}
