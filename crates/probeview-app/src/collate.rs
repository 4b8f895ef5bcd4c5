// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use feruca::{Collator, Locale, Tailoring};
use std::cmp::Ordering;

/// Root-locale text ordering. Punctuation stays significant, so `a_b`
/// sorts before `a1` and accented letters sort with their base letter.
pub struct TextCollator {
    inner: Collator,
}

impl TextCollator {
    pub fn new() -> Self {
        Self {
            inner: Collator::new(Tailoring::Cldr(Locale::Root), false, false),
        }
    }

    /// Collation order, then lowercase text, then raw text.
    pub fn compare(&mut self, left: &str, right: &str) -> Ordering {
        self.inner
            .collate(left, right)
            .then_with(|| left.to_lowercase().cmp(&right.to_lowercase()))
            .then_with(|| left.cmp(right))
    }
}

impl Default for TextCollator {
    fn default() -> Self {
        Self::new()
    }
}
