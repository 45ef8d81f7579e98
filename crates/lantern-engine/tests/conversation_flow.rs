//! End-to-end conversation flows through the public engine API.
//!
//! Exercises the full turn lifecycle with mock collaborators: source
//! fetch, stream request, token events, sealing, follow-up context,
//! and citation rendering of the finished answer.

use lantern_core::config::LanternConfig;
use lantern_core::types::{Source, SourceSet, TurnStatus};
use lantern_core::wire::StreamEvent;

use lantern_engine::mock::{MockConnection, StaticSourceFetcher};
use lantern_engine::{resolve, Segment, StreamOrchestrator};

fn sources(titles: &[&str]) -> SourceSet {
    SourceSet {
        search_results: titles
            .iter()
            .enumerate()
            .map(|(i, title)| Source {
                position: (i + 1) as u32,
                title: title.to_string(),
                link: format!("https://example.com/{}", i + 1),
                snippet: format!("About {}", title),
                origin_label: "example.com".to_string(),
            })
            .collect(),
        video_results: vec![],
    }
}

fn token(data: &str) -> StreamEvent {
    StreamEvent::Token {
        data: data.to_string(),
    }
}

#[tokio::test]
async fn full_turn_with_citation_rendering() {
    let fetcher = StaticSourceFetcher::with_sources(sources(&["Paris", "France"]));
    let mut orch = StreamOrchestrator::new(&LanternConfig::default(), Box::new(fetcher));
    let (connection, sent) = MockConnection::new();
    orch.connect(Box::new(connection));

    orch.submit("capital of france", false).await.unwrap();
    for chunk in ["Paris is the ", "capital", "[1]."] {
        orch.handle_event(token(chunk));
    }
    orch.handle_event(StreamEvent::StreamEnd);

    let snap = orch.snapshot();
    let turn = &snap.turns[0];
    assert_eq!(turn.status, TurnStatus::Complete);
    assert_eq!(turn.answer, "Paris is the capital[1].");

    let segments = resolve(&turn.answer, &turn.sources);
    assert_eq!(segments.len(), 3);
    assert_eq!(segments[0], Segment::Text("Paris is the capital".to_string()));
    match &segments[1] {
        Segment::Citation { index, source } => {
            assert_eq!(*index, 1);
            assert_eq!(source.title, "Paris");
        }
        other => panic!("expected citation, got {:?}", other),
    }
    assert_eq!(segments[2], Segment::Text(".".to_string()));

    let sent = sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].query, "capital of france");
}

#[tokio::test]
async fn follow_up_mid_stream_freezes_partial_and_isolates_streams() {
    let mut orch = StreamOrchestrator::new(
        &LanternConfig::default(),
        Box::new(StaticSourceFetcher::empty()),
    );
    let (connection, sent) = MockConnection::new();
    orch.connect(Box::new(connection));

    orch.submit("first", false).await.unwrap();
    orch.handle_event(token("Hel"));

    // Follow-up lands while the first answer is still streaming.
    orch.submit("second", true).await.unwrap();

    let snap = orch.snapshot();
    assert_eq!(snap.len(), 2);
    assert_eq!(snap.turns[0].answer, "Hel");
    assert_eq!(snap.turns[0].status, TurnStatus::Streaming);

    // The backend's context carries the frozen partial verbatim.
    {
        let sent = sent.lock().unwrap();
        assert_eq!(sent[1].history.len(), 1);
        assert_eq!(sent[1].history[0].query, "first");
        assert_eq!(sent[1].history[0].response, "Hel");
    }

    // Stragglers from the abandoned stream can only reach the turn that
    // currently holds the listener; the sealed turn never changes.
    orch.handle_event(token("lo"));
    let snap = orch.snapshot();
    assert_eq!(snap.turns[0].answer, "Hel");
    assert_eq!(snap.in_flight().unwrap().answer, "lo");
}

#[tokio::test]
async fn stream_error_after_tokens_keeps_concatenation() {
    let mut orch = StreamOrchestrator::new(
        &LanternConfig::default(),
        Box::new(StaticSourceFetcher::empty()),
    );
    let (connection, _) = MockConnection::new();
    orch.connect(Box::new(connection));

    orch.submit("q", false).await.unwrap();
    for chunk in ["one ", "two ", "three"] {
        orch.handle_event(token(chunk));
    }
    orch.handle_event(StreamEvent::StreamError {
        error: "backend gave up".to_string(),
    });

    let snap = orch.snapshot();
    assert_eq!(snap.turns[0].status, TurnStatus::Failed);
    assert_eq!(snap.turns[0].answer, "one two three");
    assert_eq!(snap.turns[0].error.as_deref(), Some("backend gave up"));
    assert!(snap.in_flight().is_none());
}

#[tokio::test]
async fn reset_mid_conversation_starts_over() {
    let mut orch = StreamOrchestrator::new(
        &LanternConfig::default(),
        Box::new(StaticSourceFetcher::empty()),
    );
    let (connection, sent) = MockConnection::new();
    orch.connect(Box::new(connection));

    for query in ["a", "b", "c"] {
        orch.submit(query, true).await.unwrap();
        orch.handle_event(token("ans"));
        orch.handle_event(StreamEvent::StreamEnd);
    }
    assert_eq!(orch.snapshot().len(), 3);

    orch.submit("new topic", false).await.unwrap();
    let snap = orch.snapshot();
    assert_eq!(snap.len(), 1);
    assert_eq!(snap.in_flight().unwrap().query, "new topic");
    assert!(sent.lock().unwrap()[3].history.is_empty());
}

#[tokio::test]
async fn failed_fetch_turn_stays_in_conversation_and_in_history() {
    let mut orch = StreamOrchestrator::new(
        &LanternConfig::default(),
        Box::new(StaticSourceFetcher::failing("404 Not Found")),
    );
    let (connection, _) = MockConnection::new();
    orch.connect(Box::new(connection));

    orch.submit("q", false).await.unwrap();
    let snap = orch.snapshot();
    assert_eq!(snap.turns[0].status, TurnStatus::Failed);
    assert_eq!(snap.turns[0].error.as_deref(), Some("404 Not Found"));
    // Failed turns stay visible; their (empty) answer is legitimate context.
    assert!(snap.in_flight().is_none());
    assert_eq!(snap.len(), 1);
}
