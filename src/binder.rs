//! Wires a pair of name fields together.
//!
//! After the page is ready, [`FieldTranslationBinder`] is handed both field
//! handles. When both exist it registers a debounced key-release listener on
//! each, translating into the other field's language; otherwise it stays
//! inert. Initialization happens at most once.
//!
//! Listeners only hold weak references to their debouncers: dropping the
//! binder cancels pending timers and turns later key releases into no-ops.

use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::runtime::Handle;
use tracing::{error, info, warn};

use crate::config::{BindingConfig, Config, FieldSpec};
use crate::debounce::Debouncer;
use crate::page::{Field, Page};
use crate::translate::Translator;
use crate::trigger::TranslationTrigger;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinderState {
    Uninitialized,
    /// Listeners attached to both fields
    Active,
    /// A field was missing; nothing attached
    Inert,
}

/// Debounced trigger bound to one field's key-release event
trait BoundTrigger: Send + Sync {
    fn is_idle(&self) -> bool;
}

struct Binding<F> {
    trigger: Arc<TranslationTrigger>,
    debouncer: Arc<Debouncer<(), F>>,
}

impl<F, Fut> BoundTrigger for Binding<F>
where
    F: Fn(()) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = ()> + Send + 'static,
{
    fn is_idle(&self) -> bool {
        !self.debouncer.is_pending()
            && self.debouncer.running() == 0
            && self.trigger.in_flight() == 0
    }
}

pub struct FieldTranslationBinder {
    binding: BindingConfig,
    delay: Duration,
    translator: Arc<dyn Translator>,
    runtime: Option<Handle>,
    state: BinderState,
    bindings: Vec<Box<dyn BoundTrigger>>,
}

impl FieldTranslationBinder {
    pub fn new(config: &Config, translator: Arc<dyn Translator>) -> Self {
        Self {
            binding: config.binding.clone(),
            delay: config.debounce.delay(),
            translator,
            runtime: None,
            state: BinderState::Uninitialized,
            bindings: Vec::new(),
        }
    }

    /// Run timers and requests on `runtime` instead of the current one
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn state(&self) -> BinderState {
        self.state
    }

    /// Resolve the configured field ids on `page` and attach to them
    pub fn bind_page(&mut self, page: &Page) -> BinderState {
        let first = page
            .element_by_id(&self.binding.first.id)
            .map(|field| field as Arc<dyn Field>);
        let second = page
            .element_by_id(&self.binding.second.id)
            .map(|field| field as Arc<dyn Field>);
        self.attach(first, second)
    }

    /// Attach listeners when both fields are present
    pub fn attach(
        &mut self,
        first: Option<Arc<dyn Field>>,
        second: Option<Arc<dyn Field>>,
    ) -> BinderState {
        if self.state != BinderState::Uninitialized {
            warn!("Binder already initialized ({:?}), ignoring", self.state);
            return self.state;
        }

        let (Some(first), Some(second)) = (first, second) else {
            info!(
                "Fields '{}'/'{}' not both present, translation disabled",
                self.binding.first.id, self.binding.second.id
            );
            self.state = BinderState::Inert;
            return self.state;
        };

        let Some(runtime) = self.runtime.clone().or_else(|| Handle::try_current().ok()) else {
            error!("No tokio runtime to schedule translations on, translation disabled");
            self.state = BinderState::Inert;
            return self.state;
        };

        let first_spec = self.binding.first.clone();
        let second_spec = self.binding.second.clone();
        self.bind_direction(&runtime, &first, &second, &second_spec);
        self.bind_direction(&runtime, &second, &first, &first_spec);

        info!(
            "Bound '{}' ({}) <-> '{}' ({}), delay {:?}",
            first.id(),
            first_spec.language,
            second.id(),
            second_spec.language,
            self.delay
        );
        self.state = BinderState::Active;
        self.state
    }

    fn bind_direction(
        &mut self,
        runtime: &Handle,
        source: &Arc<dyn Field>,
        target: &Arc<dyn Field>,
        target_spec: &FieldSpec,
    ) {
        let mut trigger = TranslationTrigger::new(
            Arc::clone(source),
            Arc::clone(target),
            target_spec.language,
            Arc::clone(&self.translator),
        );
        if !self.binding.discard_stale_responses {
            trigger = trigger.apply_stale_responses();
        }
        let trigger = Arc::new(trigger);

        let fired = Arc::clone(&trigger);
        let debouncer = Arc::new(Debouncer::new(self.delay, runtime.clone(), move |()| {
            let trigger = Arc::clone(&fired);
            async move {
                trigger.fire().await;
            }
        }));

        // Only the binder keeps debouncers alive.
        let listener_debouncer: Weak<_> = Arc::downgrade(&debouncer);
        source.add_key_up_listener(Arc::new(move || {
            if let Some(debouncer) = listener_debouncer.upgrade() {
                debouncer.call(());
            }
        }));

        self.bindings.push(Box::new(Binding { trigger, debouncer }));
    }

    /// No debounce timer pending and no request in flight
    pub fn is_idle(&self) -> bool {
        self.bindings.iter().all(|binding| binding.is_idle())
    }

    /// Wait until [`is_idle`](Self::is_idle), polling at `interval`
    pub async fn settle(&self, interval: Duration) {
        while !self.is_idle() {
            tokio::time::sleep(interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FieldSyncError;
    use crate::language::Language;
    use crate::page::InputField;
    use crate::translate::MockTranslator;
    use std::sync::Mutex;

    const AR: &str = "id_name_ar";
    const EN: &str = "id_name_en";

    fn page() -> Page {
        Page::new()
            .with_field(InputField::new(AR))
            .with_field(InputField::new(EN))
    }

    fn binder(translator: MockTranslator) -> FieldTranslationBinder {
        FieldTranslationBinder::new(&Config::default(), Arc::new(translator))
    }

    async fn sleep_ms(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_hello_fills_arabic_field() {
        let mut mock = MockTranslator::new();
        mock.expect_translate()
            .withf(|text, lang| text == "hello" && *lang == Language::Arabic)
            .times(1)
            .returning(|_, _| Ok(Some("مرحبا".to_string())));
        let page = page();
        let mut binder = binder(mock);
        assert_eq!(binder.state(), BinderState::Uninitialized);
        assert_eq!(binder.bind_page(&page), BinderState::Active);

        let en = page.element_by_id(EN).unwrap();
        let ar = page.element_by_id(AR).unwrap();
        en.type_text("hello");
        sleep_ms(1000).await;
        binder.settle(Duration::from_millis(10)).await;

        assert_eq!(ar.value(), "مرحبا");
        assert_eq!(en.value(), "hello");
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_sends_one_request_with_last_text() {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&sent);
        let mut mock = MockTranslator::new();
        mock.expect_translate().returning(move |text, lang| {
            log.lock().unwrap().push((text.to_string(), lang));
            Ok(Some("Tower".to_string()))
        });
        let page = page();
        let mut binder = binder(mock);
        binder.bind_page(&page);

        let ar = page.element_by_id(AR).unwrap();
        ar.type_text("a");
        sleep_ms(200).await;
        ar.type_text("ab");
        sleep_ms(1200).await;
        binder.settle(Duration::from_millis(10)).await;

        assert_eq!(*sent.lock().unwrap(), vec![("ab".to_string(), Language::English)]);
        assert_eq!(page.element_by_id(EN).unwrap().value(), "Tower");
    }

    #[tokio::test(start_paused = true)]
    async fn test_fields_debounce_independently() {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&sent);
        let mut mock = MockTranslator::new();
        mock.expect_translate().returning(move |text, _| {
            log.lock().unwrap().push(text.to_string());
            Ok(None)
        });
        let page = page();
        let mut binder = binder(mock);
        binder.bind_page(&page);

        page.element_by_id(AR).unwrap().type_text("برج");
        sleep_ms(300).await;
        page.element_by_id(EN).unwrap().type_text("Tower");
        sleep_ms(1500).await;
        binder.settle(Duration::from_millis(10)).await;

        let mut sent = sent.lock().unwrap().clone();
        sent.sort();
        assert_eq!(sent, vec!["Tower".to_string(), "برج".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_field_is_inert() {
        let mut mock = MockTranslator::new();
        mock.expect_translate().times(0);
        let page = Page::new().with_field(InputField::new(AR));
        let mut binder = binder(mock);

        assert_eq!(binder.bind_page(&page), BinderState::Inert);

        let ar = page.element_by_id(AR).unwrap();
        assert_eq!(ar.listener_count(), 0);
        ar.type_text("برج");
        sleep_ms(2000).await;
        assert!(binder.is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn test_both_fields_missing_is_inert() {
        let mut mock = MockTranslator::new();
        mock.expect_translate().times(0);
        let mut binder = binder(mock);

        assert_eq!(binder.attach(None, None), BinderState::Inert);
        assert!(binder.is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_initialization_is_ignored() {
        let mut mock = MockTranslator::new();
        mock.expect_translate().returning(|_, _| Ok(None));
        let page = page();
        let mut binder = binder(mock);

        assert_eq!(binder.bind_page(&page), BinderState::Active);
        assert_eq!(binder.bind_page(&page), BinderState::Active);
        assert_eq!(page.element_by_id(AR).unwrap().listener_count(), 1);
        assert_eq!(page.element_by_id(EN).unwrap().listener_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_request_leaves_fields() {
        let mut mock = MockTranslator::new();
        mock.expect_translate()
            .times(1)
            .returning(|_, _| Err(FieldSyncError::MissingToken("csrfmiddlewaretoken".to_string())));
        let page = page();
        let mut binder = binder(mock);
        binder.bind_page(&page);

        let en = page.element_by_id(EN).unwrap();
        let ar = page.element_by_id(AR).unwrap();
        ar.set_value("قديم");
        en.type_text("hello");
        sleep_ms(1100).await;
        binder.settle(Duration::from_millis(10)).await;

        assert_eq!(ar.value(), "قديم");
        assert_eq!(en.value(), "hello");
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_binder_cancels_pending_translation() {
        let mut mock = MockTranslator::new();
        mock.expect_translate().times(0);
        let page = page();
        let mut binder = binder(mock);
        binder.bind_page(&page);

        let ar = page.element_by_id(AR).unwrap();
        ar.type_text("برج");
        drop(binder);
        sleep_ms(2000).await;
        ar.type_text("برج خالد");
        sleep_ms(2000).await;

        assert_eq!(page.element_by_id(EN).unwrap().value(), "");
    }

    #[test]
    fn test_key_up_from_thread_without_runtime() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let mut mock = MockTranslator::new();
        mock.expect_translate()
            .times(1)
            .returning(|_, _| Ok(Some("Tower".to_string())));
        let mut config = Config::default();
        config.debounce.delay_ms = 20;
        let page = page();
        let mut binder = FieldTranslationBinder::new(&config, Arc::new(mock))
            .with_runtime(runtime.handle().clone());
        assert_eq!(binder.bind_page(&page), BinderState::Active);

        let ar = page.element_by_id(AR).unwrap();
        std::thread::spawn(move || ar.type_text("برج"))
            .join()
            .unwrap();
        runtime.block_on(async {
            sleep_ms(50).await;
            binder.settle(Duration::from_millis(10)).await;
        });

        assert_eq!(page.element_by_id(EN).unwrap().value(), "Tower");
    }

    #[test]
    fn test_attach_without_runtime_is_inert() {
        let mut mock = MockTranslator::new();
        mock.expect_translate().times(0);
        let page = page();
        let mut binder = binder(mock);

        assert_eq!(binder.bind_page(&page), BinderState::Inert);
        assert_eq!(page.element_by_id(AR).unwrap().listener_count(), 0);
        page.element_by_id(AR).unwrap().type_text("برج");
    }

    mod over_http {
        use super::*;
        use crate::token::HiddenInputToken;
        use crate::translate::HttpTranslator;
        use axum::routing::post;
        use axum::{Json, Router};
        use serde_json::{json, Value};
        use std::sync::atomic::{AtomicUsize, Ordering};

        async fn backend(hits: Arc<AtomicUsize>) -> String {
            let router = Router::new().route(
                "/ar/dashboard/api/translate/",
                post(move |Json(body): Json<Value>| {
                    let hits = Arc::clone(&hits);
                    async move {
                        hits.fetch_add(1, Ordering::SeqCst);
                        match body["text"].as_str() {
                            Some("hello") => Json(json!({"translated_text": "مرحبا"})),
                            _ => Json(json!({})),
                        }
                    }
                }),
            );
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            tokio::spawn(async move {
                axum::serve(listener, router).await.unwrap();
            });
            format!("http://{}", addr)
        }

        fn bound(page: &Arc<Page>, endpoint: String) -> FieldTranslationBinder {
            let mut config = Config::default();
            config.translate.endpoint = endpoint;
            config.debounce.delay_ms = 50;
            let token =
                HiddenInputToken::new(Arc::clone(page), config.translate.csrf_field.clone());
            let translator = HttpTranslator::new(&config.translate, Arc::new(token)).unwrap();
            let mut binder = FieldTranslationBinder::new(&config, Arc::new(translator));
            assert_eq!(binder.bind_page(page), BinderState::Active);
            binder
        }

        #[tokio::test]
        async fn test_typing_fills_partner_field() {
            let hits = Arc::new(AtomicUsize::new(0));
            let endpoint = backend(Arc::clone(&hits)).await;
            let page = Arc::new(page().with_hidden_input("csrfmiddlewaretoken", "tok"));
            let binder = bound(&page, endpoint);

            page.element_by_id(EN).unwrap().type_text("hello");
            binder.settle(Duration::from_millis(10)).await;

            assert_eq!(page.element_by_id(AR).unwrap().value(), "مرحبا");
            assert_eq!(hits.load(Ordering::SeqCst), 1);
        }

        #[tokio::test]
        async fn test_missing_token_element_sends_nothing() {
            let hits = Arc::new(AtomicUsize::new(0));
            let endpoint = backend(Arc::clone(&hits)).await;
            let page = Arc::new(page());
            let binder = bound(&page, endpoint);

            let ar = page.element_by_id(AR).unwrap();
            ar.set_value("قديم");
            page.element_by_id(EN).unwrap().type_text("hello");
            binder.settle(Duration::from_millis(10)).await;

            assert_eq!(hits.load(Ordering::SeqCst), 0);
            assert_eq!(ar.value(), "قديم");
            assert_eq!(page.element_by_id(EN).unwrap().value(), "hello");
        }
    }
}
