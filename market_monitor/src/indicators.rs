//! Moving average and RSI over a bar sequence.
//!
//! Both indicators are computed in one forward pass. The RSI uses recursive
//! exponential smoothing, so each step only needs the previous smoothed gain
//! and loss ([`RsiState`]).

use crate::models::{Bar, IndicatorSeries};

/// Turns ordered bars into a parallel [`IndicatorSeries`].
#[derive(Debug, Clone, Copy)]
pub struct IndicatorEngine {
    sma_window: usize,
    rsi_span: usize,
}

impl IndicatorEngine {
    /// # Panics
    /// Panics if either window is 0. Options validation rejects that earlier.
    pub fn new(sma_window: usize, rsi_span: usize) -> Self {
        assert!(sma_window > 0, "SMA window must be > 0");
        assert!(rsi_span > 0, "RSI span must be > 0");
        Self {
            sma_window,
            rsi_span,
        }
    }

    /// Computes SMA and RSI for every bar.
    ///
    /// Bars must be ascending by timestamp. Gaps in trading time are taken as
    /// they come. Indices without enough history are `None`.
    pub fn compute(&self, bars: &[Bar]) -> IndicatorSeries {
        let mut sma = Vec::with_capacity(bars.len());
        let mut rsi = Vec::with_capacity(bars.len());

        let window = self.sma_window;
        let mut rsi_state: Option<RsiState> = None;

        for (i, bar) in bars.iter().enumerate() {
            // each window is summed on its own, no running total
            sma.push((i + 1 >= window).then(|| {
                bars[i + 1 - window..=i].iter().map(|b| b.close).sum::<f64>() / window as f64
            }));

            if i == 0 {
                rsi.push(None);
                continue;
            }
            let delta = bar.close - bars[i - 1].close;
            match rsi_state.as_mut() {
                Some(state) => state.update(delta),
                None => rsi_state = Some(RsiState::seed(self.rsi_span, delta)),
            }
            rsi.push(rsi_state.as_ref().map(RsiState::value));
        }

        IndicatorSeries { sma, rsi }
    }
}

impl Default for IndicatorEngine {
    fn default() -> Self {
        Self::new(20, 14)
    }
}

/// Exponentially smoothed average gain and loss.
///
/// `α = 2 / (span + 1)`, recursive form without bias adjustment, seeded with
/// the first price change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RsiState {
    alpha: f64,
    avg_gain: f64,
    avg_loss: f64,
}

impl RsiState {
    pub fn seed(span: usize, first_delta: f64) -> Self {
        let (gain, loss) = split_delta(first_delta);
        Self {
            alpha: 2.0 / (span as f64 + 1.0),
            avg_gain: gain,
            avg_loss: loss,
        }
    }

    pub fn update(&mut self, delta: f64) {
        let (gain, loss) = split_delta(delta);
        self.avg_gain = self.alpha * gain + (1.0 - self.alpha) * self.avg_gain;
        self.avg_loss = self.alpha * loss + (1.0 - self.alpha) * self.avg_loss;
    }

    /// RSI for the current averages, always within `[0, 100]`.
    pub fn value(&self) -> f64 {
        match (self.avg_gain == 0.0, self.avg_loss == 0.0) {
            // no movement at all
            (true, true) => 50.0,
            (false, true) => 100.0,
            _ => {
                let rs = self.avg_gain / self.avg_loss;
                (100.0 - 100.0 / (1.0 + rs)).clamp(0.0, 100.0)
            }
        }
    }
}

fn split_delta(delta: f64) -> (f64, f64) {
    if delta > 0.0 {
        (delta, 0.0)
    } else if delta < 0.0 {
        (0.0, -delta)
    } else {
        (0.0, 0.0)
    }
}
