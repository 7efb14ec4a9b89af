use crate::compose::compose;
use crate::config::PolicyConfig;
use crate::render::{render_payload, Outbound};
use kidz_catalog::{CatalogItem, ProductCatalog};
use kidz_intent::{IntentCatalog, IntentMatcher, MatchResult};
use kidz_kb::{KbIndex, SearchConfig};
use kidz_llm::{apology_for, ChatModel, Embedder, FallbackChain};
use kidz_session::{extract_slots, Role, SessionConfig, SessionStore, SlotKey};
use kidz_text::{contains_arabic, normalize, token_set};
use std::time::Instant;

/// Per-turn routing decision, in fixed priority order. A short greeting
/// that also carries a catalog keyword still routes to small talk; the
/// priority is intentional.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteState {
    SmallTalk,
    FaqMatch,
    DomainQuery,
    Generic,
}

/// The dialogue state machine. Holds immutable handles to the loaded data
/// (intents, KB, products) and the mutable session store; one call to
/// [`Router::handle_message`] is one complete turn and never fails.
pub struct Router<S, E, M>
where
    S: SessionStore,
    E: Embedder,
    M: ChatModel,
{
    intents: IntentCatalog,
    matcher: IntentMatcher,
    kb: KbIndex,
    products: ProductCatalog,
    sessions: S,
    session_config: SessionConfig,
    embedder: E,
    chain: FallbackChain<M>,
    policy: PolicyConfig,
    search: SearchConfig,
}

impl<S, E, M> Router<S, E, M>
where
    S: SessionStore,
    E: Embedder,
    M: ChatModel,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        intents: IntentCatalog,
        matcher: IntentMatcher,
        kb: KbIndex,
        products: ProductCatalog,
        sessions: S,
        session_config: SessionConfig,
        embedder: E,
        chain: FallbackChain<M>,
        policy: PolicyConfig,
        search: SearchConfig,
    ) -> Self {
        Self {
            intents,
            matcher,
            kb,
            products,
            sessions,
            session_config,
            embedder,
            chain,
            policy,
            search,
        }
    }

    #[must_use]
    pub fn sessions(&self) -> &S {
        &self.sessions
    }

    /// Decide the path for one normalized message.
    #[must_use]
    pub fn classify<'a>(&'a self, normalized: &str) -> (RouteState, MatchResult<'a>) {
        let intent = self.matcher.best_match(normalized, &self.intents);

        if self.is_small_talk(normalized) {
            return (RouteState::SmallTalk, intent);
        }
        if intent.confident {
            return (RouteState::FaqMatch, intent);
        }
        if self
            .policy
            .domain_vocab
            .iter()
            .any(|term| normalized.contains(term.as_str()))
        {
            return (RouteState::DomainQuery, intent);
        }
        (RouteState::Generic, intent)
    }

    /// Run one full turn for a user message.
    pub async fn handle_message(&self, user_id: &str, raw: &str) -> Vec<Outbound> {
        let normalized = normalize(raw);
        let (state, intent) = self.classify(&normalized);
        log::info!("Routing message from {user_id}: {state:?}");

        let out = match state {
            RouteState::SmallTalk => self.small_talk(raw),
            RouteState::FaqMatch => {
                // classify only returns FaqMatch with a confident record.
                match intent.record {
                    Some(record) => render_payload(&record.reply),
                    None => self.generic(user_id, raw).await,
                }
            }
            RouteState::DomainQuery => self.domain_query(user_id, raw, &normalized).await,
            RouteState::Generic => self.generic(user_id, raw).await,
        };

        self.append_turn(user_id, raw, &out);
        out
    }

    fn is_small_talk(&self, normalized: &str) -> bool {
        normalized.chars().count() <= self.policy.small_talk_max_chars
            && self
                .policy
                .small_talk_vocab
                .iter()
                .any(|term| contains_phrase(normalized, term))
    }

    fn small_talk(&self, raw: &str) -> Vec<Outbound> {
        let reply = if contains_arabic(raw) {
            self.policy.small_talk_reply_ar.clone()
        } else {
            self.policy.small_talk_reply_en.clone()
        };
        vec![Outbound::Text(reply)]
    }

    async fn domain_query(&self, user_id: &str, raw: &str, normalized: &str) -> Vec<Outbound> {
        let now = Instant::now();
        let extracted = extract_slots(normalized);

        // Slot merge and ask selection happen atomically under the per-user
        // lock; the external calls below run outside it. The ask budget is
        // charged only after a successful generation, so a turn that falls
        // back to the canned apology keeps the question for the next turn.
        let (pending, history) = self.sessions.with_session(user_id, |session| {
            session.touch(now);
            for slot in extracted {
                session.fill_slot(slot.key, slot.value);
            }
            let pending = SlotKey::ASKABLE
                .iter()
                .copied()
                .find(|key| session.slot(*key).is_none() && !session.was_asked(*key))
                .filter(|_| session.can_ask(now, &self.session_config));
            let history: Vec<_> = session.history().cloned().collect();
            (pending, history)
        });

        let mut blocks = Vec::new();

        // Embedding failure means no semantic context, not a failed turn.
        let kb_hits = match self.embedder.embed(normalized).await {
            Ok(vector) => self.kb.search(&vector, None, self.search),
            Err(err) => {
                log::warn!("Embedding unavailable, continuing without KB context: {err}");
                Vec::new()
            }
        };
        if !kb_hits.is_empty() {
            let excerpts: Vec<&str> = kb_hits.iter().map(|hit| hit.record.text.as_str()).collect();
            blocks.push(format!(
                "مقتطفات من قاعدة المعرفة:\n{}",
                excerpts.join("\n---\n")
            ));
        }

        let items = self.products.rank(&token_set(normalized), self.policy.catalog_limit);
        if !items.is_empty() {
            let lines: Vec<String> = items.iter().map(|item| item_summary(item)).collect();
            blocks.push(format!("ملخص المنتجات:\n{}", lines.join("\n")));
        }

        let mut instruction = format!(
            "لخصي موقف السائلة، وقدمي بحد أقصى {} خطوات عملية، \
             واقترحي منتجًا واحدًا فقط لو كان مناسبًا بوضوح.",
            self.policy.max_advice_steps
        );
        match pending {
            Some(slot) => {
                instruction.push_str(" اسألي هذا السؤال الواحد فقط ولا غيره: ");
                instruction.push_str(self.policy.question_for(slot));
            }
            None => instruction.push_str(" لا تسألي أي سؤال إضافي."),
        }
        blocks.push(instruction);

        let request = compose(
            &self.policy.persona,
            &blocks,
            history.iter(),
            raw,
            self.policy.max_output_tokens,
        );
        let reply = match self.chain.try_generate(&request).await {
            Ok(text) => {
                if let Some(key) = pending {
                    self.sessions.with_session(user_id, |session| {
                        if !session.was_asked(key) {
                            session.mark_asked(key, Instant::now());
                        }
                    });
                }
                text
            }
            Err(err) => {
                log::error!("Model call failed: {err}");
                apology_for(raw)
            }
        };
        vec![Outbound::Text(reply)]
    }

    async fn generic(&self, user_id: &str, raw: &str) -> Vec<Outbound> {
        let history = self
            .sessions
            .with_session(user_id, |session| session.history().cloned().collect::<Vec<_>>());
        let blocks = vec![self.policy.promo_hint.clone()];
        let request = compose(
            &self.policy.persona,
            &blocks,
            history.iter(),
            raw,
            self.policy.max_output_tokens,
        );
        vec![Outbound::Text(self.chain.generate(&request, raw).await)]
    }

    /// Append the user's raw message and the first assistant text unit to
    /// session history.
    fn append_turn(&self, user_id: &str, raw: &str, out: &[Outbound]) {
        let assistant = out.iter().find_map(|unit| unit.as_text()).map(String::from);
        let now = Instant::now();
        self.sessions.with_session(user_id, |session| {
            session.touch(now);
            session.push_history(Role::User, raw.to_string(), &self.session_config);
            if let Some(text) = assistant {
                session.push_history(Role::Assistant, text, &self.session_config);
            }
        });
    }
}

/// Word-bounded phrase search: a vocabulary term only counts when it does
/// not continue a word on either side, so "hi" never fires inside "this"
/// and "هاي" never inside "هايش". Multi-word phrases match as a unit.
fn contains_phrase(normalized: &str, term: &str) -> bool {
    if term.is_empty() {
        return false;
    }
    let mut from = 0;
    while let Some(pos) = normalized[from..].find(term) {
        let begin = from + pos;
        let end = begin + term.len();
        let left_ok = normalized[..begin]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
        let right_ok = normalized[end..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_alphanumeric());
        if left_ok && right_ok {
            return true;
        }
        from = end;
    }
    false
}

fn item_summary(item: &CatalogItem) -> String {
    let mut line = format!("- {}", item.name);
    if !item.description.is_empty() {
        line.push_str(": ");
        line.push_str(&item.description);
    }
    if let Some(price) = &item.price {
        line.push_str(" (");
        line.push_str(price);
        line.push(')');
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use kidz_intent::{IntentRecord, MatcherConfig, ReplyPayload};
    use kidz_llm::{LlmError, ModelRequest, Result as LlmResult};
    use kidz_session::InMemorySessionStore;
    use parking_lot::Mutex;
    use pretty_assertions::{assert_eq, assert_ne};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[derive(Clone, Default)]
    struct RecordingModel {
        requests: Arc<Mutex<Vec<ModelRequest>>>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ChatModel for RecordingModel {
        async fn generate(&self, request: &ModelRequest) -> LlmResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().push(request.clone());
            Ok("نصيحة من الموديل".to_string())
        }
    }

    struct FixedEmbedder(Vec<f32>);

    #[async_trait]
    impl Embedder for FixedEmbedder {
        async fn embed(&self, _text: &str) -> LlmResult<Vec<f32>> {
            Ok(self.0.clone())
        }
    }

    struct BrokenEmbedder;

    #[async_trait]
    impl Embedder for BrokenEmbedder {
        async fn embed(&self, _text: &str) -> LlmResult<Vec<f32>> {
            Err(LlmError::Transient("embedding endpoint down".to_string()))
        }
    }

    struct FailingModel;

    #[async_trait]
    impl ChatModel for FailingModel {
        async fn generate(&self, _request: &ModelRequest) -> LlmResult<String> {
            Err(LlmError::Transient("model endpoint down".to_string()))
        }
    }

    fn intent_catalog() -> IntentCatalog {
        IntentCatalog::new(vec![IntentRecord {
            trigger: "offer".to_string(),
            keywords: vec!["عروض".to_string(), "خصم".to_string(), "اسعار".to_string()],
            examples: vec!["في عروض؟".to_string()],
            reply: ReplyPayload {
                title: "عروضنا الحالية".to_string(),
                description: "اختاري الباقة المناسبة.".to_string(),
                highlights: vec!["شامبو + شاور جل بـ 220".to_string()],
                image: None,
                gallery: vec!["https://example.com/offer.png".to_string()],
            },
        }])
    }

    fn session_config() -> SessionConfig {
        SessionConfig {
            ask_cooldown: Duration::ZERO,
            ..SessionConfig::default()
        }
    }

    fn router<E: Embedder>(
        embedder: E,
        model: RecordingModel,
    ) -> Router<InMemorySessionStore, E, RecordingModel> {
        Router::new(
            intent_catalog(),
            IntentMatcher::new(MatcherConfig::default()),
            KbIndex::default(),
            ProductCatalog::default(),
            InMemorySessionStore::new(session_config()),
            session_config(),
            embedder,
            FallbackChain::new(model),
            PolicyConfig::default(),
            SearchConfig::default(),
        )
    }

    fn last_instruction(model: &RecordingModel) -> String {
        let requests = model.requests.lock();
        let request = requests.last().expect("model was called");
        request
            .messages
            .iter()
            .map(|m| m.content.clone())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[tokio::test]
    async fn greeting_with_catalog_keyword_still_routes_to_small_talk() {
        let r = router(FixedEmbedder(vec![1.0]), RecordingModel::default());
        let (state, _) = r.classify(&normalize("هاي في عروض"));
        assert_eq!(state, RouteState::SmallTalk);
    }

    #[tokio::test]
    async fn greeting_vocabulary_is_word_bounded() {
        let r = router(FixedEmbedder(vec![1.0]), RecordingModel::default());

        // "hi" inside "this" must not fire.
        let (state, _) = r.classify(&normalize("what is this"));
        assert_ne!(state, RouteState::SmallTalk);
        // "هاي" inside "هايش" must not fire either.
        let (state, _) = r.classify(&normalize("شعرها هايش"));
        assert_eq!(state, RouteState::DomainQuery);

        let (state, _) = r.classify(&normalize("hi"));
        assert_eq!(state, RouteState::SmallTalk);
    }

    #[tokio::test]
    async fn long_substantive_message_is_not_small_talk() {
        let r = router(FixedEmbedder(vec![1.0]), RecordingModel::default());
        let normalized =
            normalize("صباح الخير عليكم انا عايزه استفسر عن افضل روتين لشعر بنتي الهايش");
        let (state, _) = r.classify(&normalized);
        assert_ne!(state, RouteState::SmallTalk);
    }

    #[tokio::test]
    async fn faq_match_renders_payload_without_model_call() {
        let model = RecordingModel::default();
        let r = router(FixedEmbedder(vec![1.0]), model.clone());

        let out = r.handle_message("u1", "في عروض؟").await;
        assert!(out[0].as_text().unwrap().starts_with("عروضنا الحالية"));
        assert!(out.iter().any(|u| matches!(u, Outbound::ImageUrl(_))));
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);

        // The static reply still lands in history for later turns.
        let history = r.sessions().with_session("u1", |s| s.history_len());
        assert_eq!(history, 2);
    }

    #[tokio::test]
    async fn domain_query_asks_age_first_then_hair_type_never_age_again() {
        let model = RecordingModel::default();
        let r = router(FixedEmbedder(vec![1.0]), model.clone());

        r.handle_message("u1", "شعر بنتي تعبان اعمل ايه").await;
        let first = last_instruction(&model);
        assert!(first.contains("قد ايه عمر الطفل؟"));
        assert!(!first.contains("ناعم ولا كيرلي"));

        r.handle_message("u1", "هي عندها 5 سنين وشعرها تعبان").await;
        let second = last_instruction(&model);
        assert!(second.contains("ناعم ولا كيرلي"));
        assert!(!second.contains("قد ايه عمر الطفل؟"));

        let age = r
            .sessions()
            .with_session("u1", |s| s.slot(SlotKey::Age).map(String::from));
        assert_eq!(age.as_deref(), Some("5"));
    }

    #[tokio::test]
    async fn ask_budget_is_never_exceeded_across_turns() {
        let model = RecordingModel::default();
        let r = router(FixedEmbedder(vec![1.0]), model.clone());

        for _ in 0..5 {
            r.handle_message("u1", "شعر طفلي محتاج روتين").await;
        }
        let asked = r.sessions().with_session("u1", |s| s.ask_count());
        assert_eq!(asked, SessionConfig::default().max_asks);

        let last = last_instruction(&model);
        assert!(last.contains("لا تسألي أي سؤال إضافي"));
    }

    #[tokio::test]
    async fn failed_generation_does_not_consume_ask_budget() {
        let r = Router::new(
            intent_catalog(),
            IntentMatcher::new(MatcherConfig::default()),
            KbIndex::default(),
            ProductCatalog::default(),
            InMemorySessionStore::new(session_config()),
            session_config(),
            FixedEmbedder(vec![1.0]),
            FallbackChain::new(FailingModel),
            PolicyConfig::default(),
            SearchConfig::default(),
        );

        let out = r.handle_message("u1", "شعر بنتي تعبان اعمل ايه").await;
        // The turn degrades to the canned apology, so the clarifying
        // question was never delivered and stays available.
        assert!(contains_arabic(out[0].as_text().unwrap()));
        let (asked, age_pending) = r.sessions().with_session("u1", |s| {
            (s.ask_count(), !s.was_asked(SlotKey::Age))
        });
        assert_eq!(asked, 0);
        assert!(age_pending);
    }

    #[tokio::test]
    async fn embedding_failure_degrades_to_empty_kb_context() {
        let model = RecordingModel::default();
        let r = router(BrokenEmbedder, model.clone());

        let out = r.handle_message("u1", "شعر بنتي فيه هيشان").await;
        assert_eq!(out[0].as_text(), Some("نصيحة من الموديل"));
        let instruction = last_instruction(&model);
        assert!(!instruction.contains("قاعدة المعرفة"));
    }

    #[tokio::test]
    async fn generic_path_calls_model_with_promo_hint() {
        let model = RecordingModel::default();
        let r = router(FixedEmbedder(vec![1.0]), model.clone());

        let out = r.handle_message("u1", "ممكن اعرف مواعيد الشغل عندكم").await;
        assert_eq!(out[0].as_text(), Some("نصيحة من الموديل"));
        assert!(last_instruction(&model).contains("عروض"));
    }

    #[tokio::test]
    async fn history_is_bounded_after_many_turns() {
        let model = RecordingModel::default();
        let r = router(FixedEmbedder(vec![1.0]), model.clone());

        for i in 0..8 {
            r.handle_message("u1", &format!("سؤال عام رقم {i}")).await;
        }
        let len = r.sessions().with_session("u1", |s| s.history_len());
        assert_eq!(len, SessionConfig::default().max_history);
    }
}
