use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use tracing::{debug, error, info};

use crate::language::Language;
use crate::page::Field;
use crate::translate::Translator;

/// What a single trigger run did to the target field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// Source text was blank; no request sent
    Skipped,
    /// Target overwritten with the translation
    Applied(String),
    /// Backend answered without a translation
    NoTranslation,
    /// A newer run for the same source started before this one finished
    Stale,
    /// Request failed; diagnostic logged
    Failed,
}

/// Translates one field into its partner, e.g. Arabic name into English name
pub struct TranslationTrigger {
    source: Arc<dyn Field>,
    target: Arc<dyn Field>,
    target_language: Language,
    translator: Arc<dyn Translator>,
    discard_stale: bool,
    issued: AtomicU64,
    in_flight: AtomicUsize,
}

/// Decrements the in-flight count however the request ends
struct InFlightGuard<'a>(&'a AtomicUsize);

impl<'a> InFlightGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl TranslationTrigger {
    pub fn new(
        source: Arc<dyn Field>,
        target: Arc<dyn Field>,
        target_language: Language,
        translator: Arc<dyn Translator>,
    ) -> Self {
        Self {
            source,
            target,
            target_language,
            translator,
            discard_stale: true,
            issued: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Apply every response as it arrives, even one overtaken by a newer edit
    pub fn apply_stale_responses(mut self) -> Self {
        self.discard_stale = false;
        self
    }

    pub fn target_language(&self) -> Language {
        self.target_language
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Translate the current source text into the target field.
    ///
    /// Never fails: every error is logged and leaves the target untouched.
    pub async fn fire(&self) -> TriggerOutcome {
        // Blank runs take a sequence number too, so clearing the source
        // invalidates responses still in flight.
        let seq = self.issued.fetch_add(1, Ordering::SeqCst) + 1;

        let text = self.source.value();
        if text.trim().is_empty() {
            debug!("Field '{}' is blank, skipping translation", self.source.id());
            return TriggerOutcome::Skipped;
        }

        let result = {
            let _guard = InFlightGuard::enter(&self.in_flight);
            self.translator.translate(&text, self.target_language).await
        };

        match result {
            Ok(Some(translation)) => {
                if self.discard_stale && self.issued.load(Ordering::SeqCst) != seq {
                    debug!(
                        "Discarding stale translation #{} for field '{}'",
                        seq,
                        self.source.id()
                    );
                    return TriggerOutcome::Stale;
                }
                info!(
                    "{} -> {} ({}): {}",
                    self.source.id(),
                    self.target.id(),
                    self.target_language,
                    translation
                );
                self.target.set_value(&translation);
                TriggerOutcome::Applied(translation)
            }
            Ok(None) => {
                debug!("No translated text for field '{}'", self.source.id());
                TriggerOutcome::NoTranslation
            }
            Err(e) => {
                error!("Translation error: {}", e);
                TriggerOutcome::Failed
            }
        }
    }
}
