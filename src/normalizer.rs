//! Context-gated character replacement.
//!
//! A confusion symbol is replaced only when the characters around it are
//! mostly Odia. `abc` stays `abc`, while the `a` in `କଖaଗ` becomes `ଅ`.

use crate::config::NormalizerConfig;
use crate::confusion::ConfusionModel;
use crate::script::is_odia;
use std::borrow::Cow;
use std::sync::Arc;
use tracing::trace;
use unicode_normalization::{UnicodeNormalization, is_nfc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeOutcome {
    pub text: String,
    pub corrections: usize,
}

#[derive(Debug, Clone)]
pub struct CharacterNormalizer {
    model: Arc<ConfusionModel>,
    config: NormalizerConfig,
}

impl CharacterNormalizer {
    pub fn new(model: Arc<ConfusionModel>, config: NormalizerConfig) -> Self {
        Self { model, config }
    }

    pub fn model(&self) -> &ConfusionModel {
        &self.model
    }

    pub fn normalize(&self, text: &str) -> NormalizeOutcome {
        let text: Cow<'_, str> = if self.config.unicode_nfc && !is_nfc(text) {
            Cow::Owned(text.nfc().collect())
        } else {
            Cow::Borrowed(text)
        };

        let chars: Vec<char> = text.chars().collect();
        // odia_before[i] = Odia characters in chars[..i]; windows are read off the
        // untouched input, so earlier replacements never shift later decisions.
        let mut odia_before = Vec::with_capacity(chars.len() + 1);
        odia_before.push(0usize);
        for &c in &chars {
            let last = odia_before[odia_before.len() - 1];
            odia_before.push(last + usize::from(is_odia(c)));
        }

        let window = self.config.context_window;
        let mut out = String::with_capacity(text.len());
        let mut corrections = 0;
        let mut pos = 0;

        while pos < chars.len() {
            let Some(entry) = self.model.match_at(&chars, pos) else {
                out.push(chars[pos]);
                pos += 1;
                continue;
            };

            let end = pos + entry.symbol.chars().count();
            let lo = pos.saturating_sub(window);
            let hi = (end + window).min(chars.len());
            let context = odia_before[hi] - odia_before[lo];

            if context >= self.config.min_context_chars {
                trace!(symbol = %entry.symbol, replacement = %entry.replacement, pos, "confusion symbol replaced");
                out.push_str(&entry.replacement);
                corrections += 1;
                pos = end;
            } else {
                out.push(chars[pos]);
                pos += 1;
            }
        }

        NormalizeOutcome { text: out, corrections }
    }
}
