//! Dual-Engine Reconciliation
//!
//! Pure merge of two optional engine outputs into one normalized text. No
//! engine-specific state: the tie-break rule only sees the outputs and the
//! configured divergence threshold.
//!
//! Rules, in order:
//! 1. Only one engine produced text -> use it verbatim.
//! 2. The secondary output is more than 1.5x the primary's length -> the
//!    secondary recognized substantially more of the page; use it.
//! 3. Bag-of-tokens similarity below the threshold -> the outputs are
//!    materially different; trust the engine configured as primary.
//! 4. Otherwise the outputs agree -> use the higher-confidence engine's text.

use crate::engine::EngineOutput;

/// Length ratio past which the longer secondary output wins outright.
const LENGTH_DOMINANCE: f64 = 1.5;

/// Reconcile the primary and secondary engine outputs.
///
/// Returns `None` when neither engine produced non-whitespace text.
pub fn reconcile(
    primary: Option<&EngineOutput>,
    secondary: Option<&EngineOutput>,
    divergence_threshold: f64,
) -> Option<String> {
    let primary = primary.filter(|o| !o.is_empty());
    let secondary = secondary.filter(|o| !o.is_empty());

    match (primary, secondary) {
        (None, None) => None,
        (Some(p), None) => Some(p.text.clone()),
        (None, Some(s)) => Some(s.text.clone()),
        (Some(p), Some(s)) => {
            if s.text.len() as f64 > p.text.len() as f64 * LENGTH_DOMINANCE {
                tracing::debug!(
                    primary_len = p.text.len(),
                    secondary_len = s.text.len(),
                    "secondary output dominates by length"
                );
                return Some(s.text.clone());
            }

            let similarity = token_similarity(&p.text, &s.text);
            if similarity < divergence_threshold {
                tracing::debug!(
                    similarity,
                    divergence_threshold,
                    "engine outputs materially differ, preferring primary"
                );
                return Some(p.text.clone());
            }

            if s.confidence > p.confidence {
                Some(s.text.clone())
            } else {
                Some(p.text.clone())
            }
        }
    }
}

/// Jaccard similarity over lowercase whitespace-separated token bags.
pub fn token_similarity(a: &str, b: &str) -> f64 {
    use std::collections::HashSet;

    let tokens_a: HashSet<String> = a.split_whitespace().map(str::to_lowercase).collect();
    let tokens_b: HashSet<String> = b.split_whitespace().map(str::to_lowercase).collect();

    if tokens_a.is_empty() && tokens_b.is_empty() {
        return 1.0;
    }

    let intersection = tokens_a.intersection(&tokens_b).count();
    let union = tokens_a.union(&tokens_b).count();
    intersection as f64 / union as f64
}
