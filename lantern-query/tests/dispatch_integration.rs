//! Integration tests for the query dispatcher.
//!
//! Providers are in-process mocks with configurable delays and failure
//! modes; the presenter records every call so publish sequences can be
//! checked end to end.

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use lantern_query::{
    CycleState, Dispatcher, Entry, MatchingPolicy, MemoryHistory, Presenter, Provider,
    ProviderError, ProviderRegistry, QueryConfig, QueryCycle, TypeaheadStore, Usage,
};

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Publish(Vec<String>),
    Busy(bool),
    Typeahead(Option<String>),
    Prefix(Option<char>),
}

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<Event>>,
}

impl Recorder {
    fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    fn publishes(&self) -> Vec<Vec<String>> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Publish(labels) => Some(labels),
                _ => None,
            })
            .collect()
    }

    fn last_publish(&self) -> Vec<String> {
        self.publishes().pop().unwrap_or_default()
    }

    fn reset(&self) {
        self.events.lock().unwrap().clear();
    }
}

impl Presenter for Recorder {
    fn publish(&self, entries: &[Entry], _reset_selection: bool) {
        let labels = entries.iter().map(|e| e.label().to_string()).collect();
        self.events.lock().unwrap().push(Event::Publish(labels));
    }

    fn set_busy(&self, busy: bool) {
        self.events.lock().unwrap().push(Event::Busy(busy));
    }

    fn typeahead(&self, suggestion: Option<&str>) {
        self.events
            .lock()
            .unwrap()
            .push(Event::Typeahead(suggestion.map(str::to_string)));
    }

    fn prefix_changed(&self, prefix: Option<char>) {
        self.events.lock().unwrap().push(Event::Prefix(prefix));
    }
}

enum Behaviour {
    Entries(Vec<Entry>),
    Echo,
    Fail,
    Panic,
}

struct MockProvider {
    name: &'static str,
    prefix: Option<char>,
    exclusive: bool,
    delay: Duration,
    behaviour: Behaviour,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockProvider {
    fn new(name: &'static str, behaviour: Behaviour) -> Self {
        Self {
            name,
            prefix: None,
            exclusive: false,
            delay: Duration::ZERO,
            behaviour,
            calls: Arc::default(),
        }
    }

    fn labels(name: &'static str, labels: &[&str]) -> Self {
        let entries = labels.iter().map(|l| Entry::new(name, *l)).collect();
        Self::new(name, Behaviour::Entries(entries))
    }

    fn prefix(mut self, prefix: char) -> Self {
        self.prefix = Some(prefix);
        self
    }

    fn exclusive(mut self) -> Self {
        self.exclusive = true;
        self
    }

    fn delay(mut self, ms: u64) -> Self {
        self.delay = Duration::from_millis(ms);
        self
    }

    fn calls(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        self.name
    }

    fn prefix(&self) -> Option<char> {
        self.prefix
    }

    fn switcher_exclusive(&self) -> bool {
        self.exclusive
    }

    async fn entries(&self, query: &str) -> Result<Vec<Entry>, ProviderError> {
        self.calls.lock().unwrap().push(query.to_string());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match &self.behaviour {
            Behaviour::Entries(entries) => Ok(entries.clone()),
            Behaviour::Echo => Ok(vec![Entry::new(self.name, query)]),
            Behaviour::Fail => Err(ProviderError::Failed("index unavailable".into())),
            Behaviour::Panic => panic!("provider exploded"),
        }
    }
}

fn dispatcher(
    providers: Vec<MockProvider>,
    config: QueryConfig,
    history: MemoryHistory,
) -> (Dispatcher, Arc<Recorder>) {
    let registry = providers
        .into_iter()
        .fold(ProviderRegistry::builder(), |b, p| b.register(Arc::new(p)))
        .build()
        .expect("valid registry");
    let recorder = Arc::new(Recorder::default());
    let presenter: Arc<dyn Presenter> = Arc::clone(&recorder) as Arc<dyn Presenter>;
    let dispatcher = Dispatcher::new(registry, Arc::new(history), presenter, config)
        .expect("valid dispatcher");
    (dispatcher, recorder)
}

async fn settle(cycle: &QueryCycle) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while cycle.state() == CycleState::Active {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("cycle should settle");
}

#[tokio::test]
async fn empty_query_lists_initial_provider_ranked_by_usage() {
    let history = MemoryHistory::new();
    history.insert(
        "applications:X",
        "x",
        Usage {
            count: 5,
            last_used_at: Utc::now() - ChronoDuration::days(2),
        },
    );
    let (dispatcher, recorder) = dispatcher(
        vec![
            MockProvider::labels("applications", &["Z", "Y", "X"]),
            MockProvider::labels("files", &["notes.txt"]),
        ],
        QueryConfig::default(),
        history,
    );

    let cycle = dispatcher.submit("");
    settle(&cycle).await;

    assert_eq!(cycle.state(), CycleState::Completed);
    assert_eq!(recorder.last_publish(), vec!["X", "Y", "Z"]);
    assert_eq!(recorder.events().last(), Some(&Event::Busy(false)));
}

#[tokio::test]
async fn empty_query_without_initial_listing_clears() {
    let config = QueryConfig {
        show_initial_entries: false,
        ..Default::default()
    };
    let apps = MockProvider::labels("applications", &["Firefox"]);
    let calls = apps.calls();
    let (dispatcher, recorder) = dispatcher(vec![apps], config, MemoryHistory::new());

    let cycle = dispatcher.submit("   ");
    assert_eq!(cycle.state(), CycleState::Completed);
    assert_eq!(recorder.publishes(), vec![Vec::<String>::new()]);
    assert_eq!(recorder.events().last(), Some(&Event::Busy(false)));
    assert!(calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn label_match_outranks_category_match() {
    let apps = MockProvider::new(
        "applications",
        Behaviour::Entries(vec![
            Entry::new("applications", "Other").categories(["firefox"]),
            Entry::new("applications", "Firefox"),
            Entry::new("applications", "Thunderbird"),
        ]),
    );
    let (dispatcher, recorder) = dispatcher(vec![apps], QueryConfig::default(), MemoryHistory::new());

    let cycle = dispatcher.submit("fir");
    settle(&cycle).await;

    assert_eq!(recorder.last_publish(), vec!["Firefox", "Other"]);
}

#[tokio::test]
async fn always_top_entry_leads_regardless_of_score() {
    let runner = MockProvider::new(
        "runner",
        Behaviour::Entries(vec![
            Entry::new("runner", "run command").matching(MatchingPolicy::AlwaysTop)
        ]),
    );
    let apps = MockProvider::labels("applications", &["ls", "lsblk"]);
    let (dispatcher, recorder) =
        dispatcher(vec![apps, runner], QueryConfig::default(), MemoryHistory::new());

    let cycle = dispatcher.submit("ls");
    settle(&cycle).await;

    let last = recorder.last_publish();
    assert_eq!(last.first().map(String::as_str), Some("run command"));
    assert_eq!(last.len(), 3);
}

#[tokio::test]
async fn superseded_cycle_never_publishes() {
    let slow = MockProvider::new("applications", Behaviour::Echo).delay(150);
    let (dispatcher, recorder) = dispatcher(vec![slow], QueryConfig::default(), MemoryHistory::new());

    let first = dispatcher.submit("a");
    let second = dispatcher.submit("ab");
    assert_eq!(first.state(), CycleState::Superseded);

    settle(&second).await;
    tokio::time::sleep(Duration::from_millis(200)).await;

    let publishes = recorder.publishes();
    assert!(publishes.iter().all(|p| !p.contains(&"a".to_string())));
    assert_eq!(recorder.last_publish(), vec!["ab"]);
    assert_eq!(second.state(), CycleState::Completed);
}

#[tokio::test]
async fn publishes_grow_as_providers_report() {
    let fast = MockProvider::labels("applications", &["Firefox", "Files"]);
    let slow = MockProvider::labels("bookmarks", &["fish shell docs"]).delay(80);
    let (dispatcher, recorder) =
        dispatcher(vec![fast, slow], QueryConfig::default(), MemoryHistory::new());

    let cycle = dispatcher.submit("fi");
    settle(&cycle).await;

    let publishes = recorder.publishes();
    assert_eq!(publishes.first(), Some(&Vec::new()));
    let batches: Vec<_> = publishes.into_iter().skip(1).collect();
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0].len(), 2);
    assert_eq!(batches[1].len(), 3);
    for label in &batches[0] {
        assert!(batches[1].contains(label));
    }
}

#[tokio::test]
async fn failing_providers_do_not_affect_others() {
    let config = QueryConfig {
        provider_timeout_ms: 50,
        ..Default::default()
    };
    let providers = vec![
        MockProvider::labels("applications", &["Firefox"]),
        MockProvider::new("broken", Behaviour::Fail),
        MockProvider::new("panicky", Behaviour::Panic),
        MockProvider::new("stuck", Behaviour::Echo).delay(2_000),
    ];
    let (dispatcher, recorder) = dispatcher(providers, config, MemoryHistory::new());

    let cycle = dispatcher.submit("fire");
    settle(&cycle).await;

    assert_eq!(cycle.state(), CycleState::Completed);
    assert_eq!(recorder.last_publish(), vec!["Firefox"]);
    assert_eq!(recorder.events().last(), Some(&Event::Busy(false)));
}

#[tokio::test]
async fn prefix_routes_to_owner_with_prefix_stripped() {
    let calc = MockProvider::new("calc", Behaviour::Echo).prefix('=');
    let calc_calls = calc.calls();
    let apps = MockProvider::labels("applications", &["Firefox"]);
    let app_calls = apps.calls();
    let (dispatcher, recorder) = dispatcher(vec![apps, calc], QueryConfig::default(), MemoryHistory::new());

    let cycle = dispatcher.submit("=2+2");
    settle(&cycle).await;

    assert_eq!(*calc_calls.lock().unwrap(), vec!["2+2"]);
    assert!(app_calls.lock().unwrap().is_empty());
    assert!(recorder.events().contains(&Event::Prefix(Some('='))));
}

#[tokio::test]
async fn switcher_exclusive_provider_only_runs_when_pinned() {
    let windows = MockProvider::labels("windows", &["Firefox window"]).exclusive();
    let calls = windows.calls();
    let (dispatcher, recorder) = dispatcher(
        vec![MockProvider::labels("applications", &["Firefox"]), windows],
        QueryConfig::default(),
        MemoryHistory::new(),
    );

    let cycle = dispatcher.submit("fire");
    settle(&cycle).await;
    assert!(calls.lock().unwrap().is_empty());
    assert_eq!(recorder.last_publish(), vec!["Firefox"]);

    dispatcher.pin("windows").expect("known provider");
    assert_eq!(dispatcher.pinned().as_deref(), Some("windows"));
    let cycle = dispatcher.submit("fire");
    settle(&cycle).await;
    assert_eq!(*calls.lock().unwrap(), vec!["fire"]);
    assert_eq!(recorder.last_publish(), vec!["Firefox window"]);
}

#[tokio::test]
async fn pin_and_unpin_switch_routing() {
    let calc = MockProvider::new("calc", Behaviour::Echo).prefix('=');
    let files = MockProvider::new("files", Behaviour::Echo);
    let file_calls = files.calls();
    let (dispatcher, recorder) =
        dispatcher(vec![calc, files], QueryConfig::default(), MemoryHistory::new());

    dispatcher.pin("files").expect("known provider");
    assert_eq!(recorder.publishes(), vec![Vec::<String>::new()]);

    let cycle = dispatcher.submit("=x");
    settle(&cycle).await;
    assert_eq!(*file_calls.lock().unwrap(), vec!["=x"]);

    recorder.reset();
    let cycle = dispatcher.unpin("=x").expect("was pinned");
    settle(&cycle).await;
    assert!(dispatcher.pinned().is_none());
    assert_eq!(file_calls.lock().unwrap().len(), 1);
    assert!(recorder.events().contains(&Event::Prefix(Some('='))));
}

#[tokio::test]
async fn allow_list_runs_empty_query_when_initial_listing_enabled() {
    let calc = MockProvider::new("calc", Behaviour::Echo).prefix('=');
    let calls = calc.calls();
    let registry = ProviderRegistry::builder()
        .register(Arc::new(MockProvider::labels("applications", &["Firefox"])))
        .register(Arc::new(calc))
        .with_allow_list(["calc"])
        .build()
        .expect("valid registry");
    let recorder = Arc::new(Recorder::default());
    let dispatcher = Dispatcher::new(
        registry,
        Arc::new(MemoryHistory::new()),
        Arc::clone(&recorder) as Arc<dyn Presenter>,
        QueryConfig::default(),
    )
    .expect("valid dispatcher");

    let cycle = dispatcher.submit("");
    settle(&cycle).await;
    assert_eq!(*calls.lock().unwrap(), vec![""]);
    assert_eq!(recorder.last_publish(), vec![""]);
}

#[tokio::test]
async fn allow_list_strips_registered_prefix() {
    let calc = MockProvider::new("calc", Behaviour::Echo).prefix('=');
    let calls = calc.calls();
    let registry = ProviderRegistry::builder()
        .register(Arc::new(MockProvider::labels("applications", &["Firefox"])))
        .register(Arc::new(calc))
        .with_allow_list(["calc"])
        .build()
        .expect("valid registry");
    let recorder = Arc::new(Recorder::default());
    let dispatcher = Dispatcher::new(
        registry,
        Arc::new(MemoryHistory::new()),
        Arc::clone(&recorder) as Arc<dyn Presenter>,
        QueryConfig::default(),
    )
    .expect("valid dispatcher");

    let cycle = dispatcher.submit("=2+2");
    settle(&cycle).await;
    assert_eq!(*calls.lock().unwrap(), vec!["2+2"]);
    assert!(recorder.events().contains(&Event::Prefix(Some('='))));
    assert_eq!(recorder.last_publish(), vec!["2+2"]);

    let cycle = dispatcher.submit("2*3");
    settle(&cycle).await;
    assert_eq!(calls.lock().unwrap().last().map(String::as_str), Some("2*3"));
}

#[tokio::test]
async fn typeahead_suggests_previous_query() {
    let config = QueryConfig {
        typeahead: true,
        ..Default::default()
    };
    let (dispatcher, recorder) = dispatcher(
        vec![MockProvider::labels("applications", &["Firefox"])],
        config,
        MemoryHistory::new(),
    );
    let dispatcher = dispatcher.with_typeahead(Arc::new(TypeaheadStore::from_queries(["firefox"])));

    let cycle = dispatcher.submit("fi");
    settle(&cycle).await;
    assert_eq!(
        recorder.events().first(),
        Some(&Event::Typeahead(Some("firefox".into())))
    );
}

#[tokio::test]
async fn clear_supersedes_running_cycle() {
    let slow = MockProvider::new("applications", Behaviour::Echo).delay(100);
    let (dispatcher, recorder) = dispatcher(vec![slow], QueryConfig::default(), MemoryHistory::new());

    let running = dispatcher.submit("abc");
    let cleared = dispatcher.clear();
    assert_eq!(running.state(), CycleState::Superseded);
    assert_eq!(cleared.state(), CycleState::Completed);

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(recorder.last_publish(), Vec::<String>::new());
    assert_eq!(dispatcher.cycle_state(), CycleState::Completed);
}
