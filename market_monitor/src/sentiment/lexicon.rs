//! Word-list polarity scorer for financial headlines.
//!
//! Each known word carries a polarity. A headline's score is the mean polarity
//! of the words it contains, after applying the modifiers that precede each
//! word: intensifiers scale it up, negations flip and dampen it.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::errors::ScoreError;
use crate::sentiment::PolarityScorer;

static POLARITY: Lazy<HashMap<&'static str, f64>> = Lazy::new(|| {
    [
        // positive
        ("gain", 0.4),
        ("gains", 0.4),
        ("rally", 0.5),
        ("rallies", 0.5),
        ("surge", 0.6),
        ("surges", 0.6),
        ("soar", 0.7),
        ("soars", 0.7),
        ("jump", 0.4),
        ("jumps", 0.4),
        ("rise", 0.3),
        ("rises", 0.3),
        ("record", 0.3),
        ("beat", 0.4),
        ("beats", 0.4),
        ("strong", 0.45),
        ("growth", 0.4),
        ("profit", 0.4),
        ("profits", 0.4),
        ("upgrade", 0.5),
        ("optimism", 0.6),
        ("optimistic", 0.6),
        ("boost", 0.5),
        ("rebound", 0.4),
        ("recovery", 0.4),
        ("great", 0.8),
        ("good", 0.7),
        ("best", 1.0),
        ("positive", 0.3),
        ("win", 0.8),
        ("wins", 0.8),
        ("bullish", 0.6),
        ("easing", 0.2),
        ("success", 0.5),
        // negative
        ("loss", -0.4),
        ("losses", -0.4),
        ("fall", -0.3),
        ("falls", -0.3),
        ("drop", -0.4),
        ("drops", -0.4),
        ("slump", -0.6),
        ("slumps", -0.6),
        ("plunge", -0.7),
        ("plunges", -0.7),
        ("tumble", -0.6),
        ("tumbles", -0.6),
        ("crash", -0.8),
        ("fear", -0.5),
        ("fears", -0.5),
        ("recession", -0.6),
        ("inflation", -0.2),
        ("weak", -0.45),
        ("miss", -0.4),
        ("misses", -0.4),
        ("downgrade", -0.5),
        ("selloff", -0.6),
        ("sell-off", -0.6),
        ("worst", -1.0),
        ("bad", -0.7),
        ("risk", -0.2),
        ("risks", -0.2),
        ("crisis", -0.7),
        ("bearish", -0.6),
        ("layoffs", -0.5),
        ("lawsuit", -0.4),
        ("tariffs", -0.3),
        ("volatile", -0.3),
        ("warning", -0.4),
        ("warns", -0.4),
    ]
    .into_iter()
    .collect()
});

static INTENSIFIERS: Lazy<HashMap<&'static str, f64>> = Lazy::new(|| {
    [
        ("very", 1.3),
        ("extremely", 1.5),
        ("sharply", 1.4),
        ("deeply", 1.4),
        ("slightly", 0.5),
        ("modest", 0.6),
        ("modestly", 0.6),
    ]
    .into_iter()
    .collect()
});

const NEGATIONS: [&str; 6] = ["not", "no", "never", "without", "isn't", "don't"];

/// Negation flips a word's polarity and halves its strength.
const NEGATION_FACTOR: f64 = -0.5;

/// Deterministic dictionary scorer; needs no model or network access.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexiconScorer;

impl LexiconScorer {
    pub fn new() -> Self {
        Self
    }

    fn score(text: &str) -> f64 {
        let tokens: Vec<String> = text
            .split(|c: char| {
                c.is_whitespace() || matches!(c, ',' | '.' | ':' | ';' | '!' | '?' | '"')
            })
            .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric() && c != '-' && c != '\''))
            .filter(|t| !t.is_empty())
            .map(|t| t.to_lowercase().replace('’', "'"))
            .collect();

        let mut total = 0.0;
        let mut matched = 0usize;
        let mut modifier = 1.0;
        for token in &tokens {
            if let Some(&p) = POLARITY.get(token.as_str()) {
                total += p * modifier;
                matched += 1;
                modifier = 1.0;
            } else if let Some(&m) = INTENSIFIERS.get(token.as_str()) {
                modifier *= m;
            } else if NEGATIONS.contains(&token.as_str()) {
                modifier *= NEGATION_FACTOR;
            } else {
                // modifiers only reach the next word
                modifier = 1.0;
            }
        }

        if matched == 0 {
            0.0
        } else {
            (total / matched as f64).clamp(-1.0, 1.0)
        }
    }
}

impl PolarityScorer for LexiconScorer {
    fn polarity(&self, text: &str) -> Result<f64, ScoreError> {
        Ok(Self::score(text))
    }
}
