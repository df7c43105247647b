use super::dispatcher::{fire, job_id, next_fire, parse_cron, run_job};
use super::*;
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use lantern_core::config::SchedulerConfig;
use lantern_core::message::{ConvoTurn, IncomingMessage, Role};
use lantern_core::traits::Channel;
use std::sync::atomic::AtomicUsize;
use std::time::Duration;
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// Mock platform
// ---------------------------------------------------------------------------

/// State shared by every channel a `MockConnector` hands out.
#[derive(Default)]
struct Shared {
    sent: std::sync::Mutex<Vec<OutgoingMessage>>,
    inbound: std::sync::Mutex<Vec<mpsc::Sender<IncomingMessage>>>,
    tokens: std::sync::Mutex<Vec<String>>,
    starts: AtomicUsize,
    stops: AtomicUsize,
    fail_send: AtomicBool,
}

impl Shared {
    fn sent(&self) -> Vec<OutgoingMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// Push a message into the most recently started listener.
    async fn deliver(&self, msg: IncomingMessage) {
        let tx = self.inbound.lock().unwrap().last().cloned().unwrap();
        tx.send(msg).await.unwrap();
    }
}

struct MockChannel {
    shared: Arc<Shared>,
}

#[async_trait]
impl Channel for MockChannel {
    fn name(&self) -> &str {
        "mock"
    }

    async fn start(
        &self,
        _cancel: CancellationToken,
    ) -> Result<mpsc::Receiver<IncomingMessage>, LanternError> {
        self.shared.starts.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::channel(16);
        self.shared.inbound.lock().unwrap().push(tx);
        Ok(rx)
    }

    async fn send(&self, message: OutgoingMessage) -> Result<(), LanternError> {
        if self.shared.fail_send.load(Ordering::SeqCst) {
            return Err(LanternError::Delivery("chat not found".into()));
        }
        self.shared.sent.lock().unwrap().push(message);
        Ok(())
    }

    async fn stop(&self) -> Result<(), LanternError> {
        self.shared.stops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct MockConnector {
    shared: Arc<Shared>,
}

impl Connector for MockConnector {
    fn connect(&self, token: &str) -> Arc<dyn Channel> {
        self.shared.tokens.lock().unwrap().push(token.to_string());
        Arc::new(MockChannel {
            shared: Arc::clone(&self.shared),
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn setup() -> (Arc<BotSession>, Store, Arc<Shared>) {
    let store = Store::new(&MemoryConfig::in_memory()).await.unwrap();
    let shared = Arc::new(Shared::default());
    let connector = Arc::new(MockConnector {
        shared: Arc::clone(&shared),
    });
    let session = Arc::new(BotSession::new(
        connector,
        store.clone(),
        &MemoryConfig::in_memory(),
    ));
    (session, store, shared)
}

/// Poll `check` until it holds, failing after two seconds.
async fn wait_until<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..200 {
        if check().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}

async fn running_session() -> (Arc<BotSession>, Store, Arc<Shared>) {
    let (session, store, shared) = setup().await;
    session.configure("123:abc");
    session.start().unwrap();
    let s = Arc::clone(&session);
    wait_until(|| {
        let s = Arc::clone(&s);
        async move { s.state() == SessionState::Running }
    })
    .await;
    (session, store, shared)
}

// ---------------------------------------------------------------------------
// Session lifecycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_start_without_token_fails() {
    let (session, _store, shared) = setup().await;
    let err = session.start().unwrap_err();
    assert!(err.is_config());
    assert!(!session.running());
    assert_eq!(session.state(), SessionState::Stopped);
    assert!(shared.tokens.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_start_twice_keeps_one_listener() {
    let (session, _store, shared) = running_session().await;
    assert!(session.running());

    session.start().unwrap();
    assert!(session.running());
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(shared.starts.load(Ordering::SeqCst), 1);

    session.shutdown().await;
}

#[tokio::test]
async fn test_stop_is_cooperative() {
    let (session, _store, shared) = running_session().await;

    session.stop();
    let s = Arc::clone(&session);
    wait_until(|| {
        let s = Arc::clone(&s);
        async move { !s.running() }
    })
    .await;
    assert_eq!(session.state(), SessionState::Stopped);
    assert_eq!(shared.stops.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_restart_after_stop() {
    let (session, _store, shared) = running_session().await;
    session.shutdown().await;
    assert!(!session.running());

    session.start().unwrap();
    let sh = Arc::clone(&shared);
    wait_until(|| {
        let sh = Arc::clone(&sh);
        async move { sh.starts.load(Ordering::SeqCst) == 2 }
    })
    .await;
    session.shutdown().await;
}

#[tokio::test]
async fn test_configure_while_running_applies_to_sends_only() {
    let (session, _store, shared) = running_session().await;

    session.configure("456:def");
    session.send("1", "ping").await.unwrap();

    let tokens = shared.tokens.lock().unwrap().clone();
    assert_eq!(tokens, vec!["123:abc".to_string(), "456:def".to_string()]);
    assert_eq!(shared.starts.load(Ordering::SeqCst), 1);
    session.shutdown().await;
}

#[tokio::test]
async fn test_reload_token_from_settings() {
    let (session, store, _shared) = setup().await;
    session.reload_token(&store).await.unwrap();
    assert!(!session.has_token());

    store.set_setting(settings::BOT_TOKEN, " 42:xyz ").await.unwrap();
    session.reload_token(&store).await.unwrap();
    assert!(session.has_token());
}

// ---------------------------------------------------------------------------
// One-shot send
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_send_without_token_is_config_error() {
    let (session, _store, _shared) = setup().await;
    let err = session.send("1", "hi").await.unwrap_err();
    assert!(err.is_config());
}

#[tokio::test]
async fn test_send_failure_is_delivery_error() {
    let (session, _store, shared) = setup().await;
    session.configure("123:abc");
    shared.fail_send.store(true, Ordering::SeqCst);

    let err = session.send("1", "hi").await.unwrap_err();
    assert!(matches!(err, LanternError::Delivery(_)));
}

#[tokio::test]
async fn test_send_does_not_need_listener() {
    let (session, _store, shared) = setup().await;
    session.configure("123:abc");
    session.send("@news", "hello").await.unwrap();

    assert!(!session.running());
    assert_eq!(shared.sent(), vec![OutgoingMessage::new("@news", "hello")]);
}

// ---------------------------------------------------------------------------
// Inbound pipeline
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_inbound_auto_reply() {
    let (session, store, shared) = running_session().await;
    store
        .set_setting(settings::AUTO_REPLY_ENABLED, "1")
        .await
        .unwrap();

    shared
        .deliver(IncomingMessage::new("77", "linh", "mệt quá"))
        .await;

    let sh = Arc::clone(&shared);
    wait_until(|| {
        let sh = Arc::clone(&sh);
        async move { sh.sent().len() == 1 }
    })
    .await;

    let sent = shared.sent();
    assert_eq!(sent[0].chat_id, "77");
    assert!(!sent[0].text.is_empty());

    let st = store.clone();
    wait_until(|| {
        let st = st.clone();
        async move { st.convo_len("77").await.unwrap() == 2 }
    })
    .await;
    let turns = store.recent_convo("77", 14).await.unwrap();
    assert_eq!(turns[0], ConvoTurn::user("mệt quá"));
    assert_eq!(turns[1].role, Role::Bot);
    assert_eq!(turns[1].text, sent[0].text);

    let log = store.list_messages(10).await.unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].username, "linh");

    session.shutdown().await;
}

#[tokio::test]
async fn test_inbound_auto_reply_disabled_only_records() {
    let (session, store, shared) = running_session().await;

    shared.deliver(IncomingMessage::new("5", "", "xin chào")).await;

    let st = store.clone();
    wait_until(|| {
        let st = st.clone();
        async move { st.convo_len("5").await.unwrap() == 1 }
    })
    .await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(shared.sent().is_empty());
    assert_eq!(store.list_messages(10).await.unwrap().len(), 1);
    session.shutdown().await;
}

#[tokio::test]
async fn test_inbound_command_is_not_answered() {
    let (session, store, shared) = running_session().await;
    store
        .set_setting(settings::AUTO_REPLY_ENABLED, "1")
        .await
        .unwrap();

    shared.deliver(IncomingMessage::new("5", "a", "/start")).await;
    shared.deliver(IncomingMessage::new("5", "a", "ok")).await;

    let sh = Arc::clone(&shared);
    wait_until(|| {
        let sh = Arc::clone(&sh);
        async move { sh.sent().len() == 1 }
    })
    .await;

    // Both recorded, only the second answered.
    let turns = store.recent_convo("5", 14).await.unwrap();
    assert_eq!(turns[0].text, "/start");
    assert_eq!(turns[1].text, "ok");
    assert_eq!(store.list_messages(10).await.unwrap().len(), 2);
    session.shutdown().await;
}

#[tokio::test]
async fn test_inbound_ignores_bots_and_marks_non_text() {
    let (session, store, shared) = running_session().await;

    let mut from_bot = IncomingMessage::new("9", "otherbot", "spam");
    from_bot.from_bot = true;
    shared.deliver(from_bot).await;
    shared.deliver(IncomingMessage::new("9", "a", "")).await;

    let st = store.clone();
    wait_until(|| {
        let st = st.clone();
        async move { st.convo_len("9").await.unwrap() == 1 }
    })
    .await;

    let turns = store.recent_convo("9", 14).await.unwrap();
    assert_eq!(turns[0].text, listener::NON_TEXT_PLACEHOLDER);
    let log = store.list_messages(10).await.unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].text, "");
    session.shutdown().await;
}

#[tokio::test]
async fn test_inbound_send_failure_keeps_listener_alive() {
    let (session, store, shared) = running_session().await;
    store
        .set_setting(settings::AUTO_REPLY_ENABLED, "1")
        .await
        .unwrap();
    shared.fail_send.store(true, Ordering::SeqCst);

    shared.deliver(IncomingMessage::new("3", "a", "hello")).await;
    let st = store.clone();
    wait_until(|| {
        let st = st.clone();
        async move { st.convo_len("3").await.unwrap() == 1 }
    })
    .await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(session.running());
    // No bot turn for a reply that never went out.
    assert_eq!(store.convo_len("3").await.unwrap(), 1);

    shared.fail_send.store(false, Ordering::SeqCst);
    shared.deliver(IncomingMessage::new("3", "a", "hello again")).await;
    let sh = Arc::clone(&shared);
    wait_until(|| {
        let sh = Arc::clone(&sh);
        async move { sh.sent().len() == 1 }
    })
    .await;
    session.shutdown().await;
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

#[test]
fn test_parse_cron_field_count() {
    assert!(parse_cron("0 8 * * *").is_some());
    assert!(parse_cron("*/15  9-17 * * 1-5").is_some());
    assert!(parse_cron("* * *").is_none());
    assert!(parse_cron("0 0 8 * * *").is_none());
    assert!(parse_cron("").is_none());
    assert!(parse_cron("99 8 * * *").is_none());
}

#[tokio::test]
async fn test_rebuild_is_idempotent() {
    let (session, store, _shared) = setup().await;
    let a = store.create_schedule("a", "1", "x", "0 8 * * *").await.unwrap();
    let b = store.create_schedule("b", "2", "y", "30 21 * * 0").await.unwrap();

    let dispatcher = Dispatcher::new(store.clone(), session, &SchedulerConfig::default());
    assert_eq!(dispatcher.rebuild().await.unwrap(), 2);
    let first = dispatcher.job_ids().await;
    assert_eq!(dispatcher.rebuild().await.unwrap(), 2);
    let second = dispatcher.job_ids().await;

    let mut expected = vec![job_id(a), job_id(b)];
    expected.sort();
    assert_eq!(first, expected);
    assert_eq!(first, second);
    dispatcher.shutdown().await;
    assert_eq!(dispatcher.job_count().await, 0);
}

#[tokio::test]
async fn test_rebuild_skips_malformed_and_disabled() {
    let (session, store, _shared) = setup().await;
    let good = store.create_schedule("good", "1", "x", "0 8 * * *").await.unwrap();
    store.create_schedule("short", "1", "x", "* * *").await.unwrap();
    let off = store.create_schedule("off", "1", "x", "0 9 * * *").await.unwrap();
    store.set_schedule_enabled(off, false).await.unwrap();

    let dispatcher = Dispatcher::new(store.clone(), session, &SchedulerConfig::default());
    assert_eq!(dispatcher.rebuild().await.unwrap(), 1);
    assert_eq!(dispatcher.job_ids().await, vec![job_id(good)]);

    store.delete_schedule(good).await.unwrap();
    assert_eq!(dispatcher.rebuild().await.unwrap(), 0);
    dispatcher.shutdown().await;
}

#[tokio::test]
async fn test_rebuild_reloads_token() {
    let (session, store, _shared) = setup().await;
    store.set_setting(settings::BOT_TOKEN, "1:a").await.unwrap();

    let dispatcher = Dispatcher::new(store.clone(), Arc::clone(&session), &SchedulerConfig::default());
    dispatcher.rebuild().await.unwrap();
    assert!(session.has_token());
}

#[tokio::test]
async fn test_fire_uses_latest_token_and_survives_failure() {
    let (session, store, shared) = setup().await;
    let id = store.create_schedule("m", "@chan", "good morning", "0 8 * * *").await.unwrap();
    let schedule = store.get_schedule(id).await.unwrap().unwrap();

    // No token anywhere: logged, nothing sent.
    fire(&store, &session, &schedule).await;
    assert!(shared.sent().is_empty());

    store.set_setting(settings::BOT_TOKEN, "9:new").await.unwrap();
    fire(&store, &session, &schedule).await;
    assert_eq!(shared.sent(), vec![OutgoingMessage::new("@chan", "good morning")]);
    assert_eq!(shared.tokens.lock().unwrap().last().unwrap(), "9:new");
}

#[tokio::test]
async fn test_disabled_scheduler_registers_nothing() {
    let (session, store, _shared) = setup().await;
    store.create_schedule("a", "1", "x", "0 8 * * *").await.unwrap();
    store.set_setting(settings::BOT_TOKEN, "1:a").await.unwrap();

    let config = SchedulerConfig { enabled: false };
    let dispatcher = Dispatcher::new(store.clone(), Arc::clone(&session), &config);
    assert_eq!(dispatcher.rebuild().await.unwrap(), 0);
    assert!(dispatcher.job_ids().await.is_empty());
    // The token is still picked up for manual sends.
    assert!(session.has_token());
}

#[tokio::test]
async fn test_failed_rebuild_keeps_previous_jobs() {
    let (session, store, _shared) = setup().await;
    let id = store.create_schedule("a", "1", "x", "0 8 * * *").await.unwrap();

    let dispatcher = Dispatcher::new(store.clone(), session, &SchedulerConfig::default());
    assert_eq!(dispatcher.rebuild().await.unwrap(), 1);

    store.close().await;
    assert!(dispatcher.rebuild().await.is_err());
    assert_eq!(dispatcher.job_ids().await, vec![job_id(id)]);
    dispatcher.shutdown().await;
}

#[test]
fn test_next_fire_skips_missed_occurrences() {
    let cron = parse_cron("0 8 * * *").unwrap();
    let now = Utc::now();
    let last = now - ChronoDuration::days(3);

    let next = next_fire(&cron, last, now).unwrap();
    assert!(next > now);
    assert!(next <= now + ChronoDuration::days(1));

    // Ahead of the clock, the last firing wins.
    let ahead = now + ChronoDuration::days(2);
    assert!(next_fire(&cron, ahead, now).unwrap() > ahead);
}

#[tokio::test]
async fn test_run_job_fires_until_cancelled() {
    let (session, store, shared) = setup().await;
    store.set_setting(settings::BOT_TOKEN, "1:a").await.unwrap();
    let id = store.create_schedule("tick", "@c", "tick", "* * * * *").await.unwrap();
    let schedule = store.get_schedule(id).await.unwrap().unwrap();

    // Every second, so the test does not wait a minute.
    let cron = "* * * * * *".parse::<croner::Cron>().unwrap();
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(run_job(
        cron,
        schedule,
        store.clone(),
        Arc::clone(&session),
        cancel.clone(),
    ));

    let sh = Arc::clone(&shared);
    wait_until(|| {
        let sh = Arc::clone(&sh);
        async move { !sh.sent().is_empty() }
    })
    .await;
    assert_eq!(shared.sent()[0], OutgoingMessage::new("@c", "tick"));

    cancel.cancel();
    handle.await.unwrap();
    let fired = shared.sent().len();
    tokio::time::sleep(Duration::from_millis(1200)).await;
    assert_eq!(shared.sent().len(), fired);
}
