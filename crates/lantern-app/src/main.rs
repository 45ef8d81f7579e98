//! Lantern application binary - composition root.
//!
//! Ties together the Lantern crates into a single executable:
//! 1. Load configuration from TOML (with CLI/env overrides)
//! 2. Build the HTTP source fetcher
//! 3. Connect the shared WebSocket push channel
//! 4. Run the interactive prompt, multiplexing user input, inbound
//!    stream events, and the stall timer on one task

use std::io::Write as _;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};

use lantern_client::{HttpSourceFetcher, WsEvents};
use lantern_core::config::LanternConfig;
use lantern_core::wire::StreamEvent;
use lantern_engine::{EngineError, StreamOrchestrator};

mod cli;
mod focus;
mod render;

use clap::Parser;
use cli::CliArgs;
use focus::FocusMode;

const STALL_CHECK_INTERVAL: Duration = Duration::from_secs(5);

fn print_flush(text: &str) {
    print!("{}", text);
    let _ = std::io::stdout().flush();
}

/// Interactive session state: the orchestrator plus what the prompt has
/// already echoed for the in-flight turn.
struct Session {
    orchestrator: StreamOrchestrator,
    /// Bytes of the in-flight answer already written to the terminal.
    printed: usize,
}

impl Session {
    fn new(orchestrator: StreamOrchestrator) -> Self {
        Self {
            orchestrator,
            printed: 0,
        }
    }

    async fn submit(&mut self, query: &str, is_follow_up: bool) {
        match self.orchestrator.submit(query, is_follow_up).await {
            Ok(()) => {
                self.printed = 0;
                println!("Searching...");
                self.print_sealed_failure();
            }
            Err(err @ (EngineError::EmptyQuery | EngineError::QueryTooLong(_))) => {
                eprintln!("{}", err);
            }
            Err(err) => {
                eprintln!("Cannot submit: {}", err);
            }
        }
    }

    fn apply_event(&mut self, event: StreamEvent) {
        self.orchestrator.handle_event(event);
        let snapshot = self.orchestrator.snapshot();
        if let Some(turn) = snapshot.in_flight() {
            // Echo only the unseen tail of the streaming answer.
            if turn.answer.len() > self.printed {
                print_flush(&turn.answer[self.printed..]);
                self.printed = turn.answer.len();
            }
        } else if let Some(turn) = snapshot.turns.last() {
            if turn.answer.len() > self.printed {
                print_flush(&turn.answer[self.printed..]);
            }
            self.printed = 0;
            println!("{}", render::render_footer(turn));
        }
    }

    fn check_stall(&mut self) {
        if self.orchestrator.tick_stall() {
            if let Some(turn) = self.orchestrator.snapshot().turns.last() {
                println!("{}", render::render_footer(turn));
            }
            self.printed = 0;
        }
    }

    /// A fetch failure seals the turn before `submit` returns.
    fn print_sealed_failure(&mut self) {
        let snapshot = self.orchestrator.snapshot();
        if snapshot.in_flight().is_none() {
            if let Some(turn) = snapshot.turns.last() {
                println!("{}", render::render_footer(turn));
            }
            self.printed = 0;
        }
    }

    fn print_sources(&self) {
        let snapshot = self.orchestrator.snapshot();
        match snapshot.turns.last() {
            Some(turn) => println!("{}", render::render_source_list(&turn.sources)),
            None => println!("No turns yet."),
        }
    }

    fn is_streaming(&self) -> bool {
        self.orchestrator.snapshot().in_flight().is_some()
    }
}

fn print_focus(mode: FocusMode) {
    println!("Focus: {}", mode.label());
    println!("{}", mode.title());
    for (i, suggestion) in mode.suggestions().iter().enumerate() {
        println!("  {}. {}", i + 1, suggestion);
    }
}

fn print_help() {
    println!("Commands:");
    println!("  /new <query>    start a new conversation");
    println!("  /sources        show all sources for the latest turn");
    println!("  /focus [mode]   set focus mode (general, health, local, sports, finance)");
    println!("  <number>        ask a focus suggestion by its number");
    println!("  /quit           exit");
    println!("Anything else is sent as a follow-up question.");
}

/// Dispatch one line of user input. Returns `false` to exit.
async fn handle_input(session: &mut Session, focus: &mut FocusMode, line: &str) -> bool {
    let input = line.trim();
    if input.is_empty() {
        return true;
    }
    if let Some(rest) = input.strip_prefix("/new") {
        let query = rest.trim();
        if query.is_empty() {
            eprintln!("Usage: /new <query>");
        } else {
            session.submit(query, false).await;
        }
    } else if input == "/sources" {
        session.print_sources();
    } else if let Some(rest) = input.strip_prefix("/focus") {
        let name = rest.trim();
        if name.is_empty() {
            print_focus(*focus);
        } else {
            match FocusMode::parse(name) {
                Some(mode) => {
                    // Picking the active mode again toggles back to general.
                    *focus = if mode == *focus {
                        FocusMode::General
                    } else {
                        mode
                    };
                    print_focus(*focus);
                }
                None => eprintln!("Unknown focus mode: {}", name),
            }
        }
    } else if input == "/help" {
        print_help();
    } else if input == "/quit" || input == "/exit" {
        return false;
    } else if let Ok(pick) = input.parse::<usize>() {
        let suggestions = focus.suggestions();
        match pick.checked_sub(1).and_then(|i| suggestions.get(i)) {
            Some(suggestion) => {
                println!("> {}", suggestion);
                session.submit(suggestion, true).await;
            }
            None => eprintln!("No suggestion {} in {} focus", pick, focus.label()),
        }
    } else {
        session.submit(input, true).await;
    }
    true
}

/// Interactive prompt: user input, stream events, and the stall timer
/// multiplexed on one task.
async fn run_prompt(mut session: Session, mut events: WsEvents) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut focus = FocusMode::General;
    let mut stall = tokio::time::interval(STALL_CHECK_INTERVAL);

    println!("{}", FocusMode::General.title());
    print_flush("> ");

    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line {
                    Ok(Some(line)) => {
                        if !handle_input(&mut session, &mut focus, &line).await {
                            break;
                        }
                        if !session.is_streaming() {
                            print_flush("> ");
                        }
                    }
                    Ok(None) => break,
                    Err(err) => {
                        eprintln!("stdin error: {}", err);
                        break;
                    }
                }
            }
            event = events.next_event() => {
                match event {
                    Some(Ok(event)) => {
                        let was_streaming = session.is_streaming();
                        session.apply_event(event);
                        if was_streaming && !session.is_streaming() {
                            print_flush("> ");
                        }
                    }
                    Some(Err(err)) => {
                        tracing::warn!(error = %err, "Dropping malformed frame");
                    }
                    None => {
                        eprintln!("Stream socket closed.");
                        break;
                    }
                }
            }
            _ = stall.tick() => {
                session.check_stall();
            }
        }
    }

    session.orchestrator.close().await;
}

/// One-shot mode: submit a single query, stream the answer, exit.
async fn run_single(mut session: Session, mut events: WsEvents, query: &str) {
    session.submit(query, false).await;
    let mut stall = tokio::time::interval(STALL_CHECK_INTERVAL);
    while session.is_streaming() {
        tokio::select! {
            event = events.next_event() => {
                match event {
                    Some(Ok(event)) => session.apply_event(event),
                    Some(Err(err)) => tracing::warn!(error = %err, "Dropping malformed frame"),
                    None => {
                        eprintln!("Stream socket closed.");
                        break;
                    }
                }
            }
            _ = stall.tick() => {
                session.check_stall();
            }
        }
    }
    session.orchestrator.close().await;
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config, with CLI/env overrides.
    let config_file = args.resolve_config_path();
    let mut config = LanternConfig::load_or_default(&config_file);
    config.search.endpoint = args.resolve_search_endpoint(&config.search.endpoint);
    config.stream.url = args.resolve_stream_url(&config.stream.url);
    let log_level = args.resolve_log_level(&config.general.log_level);

    // Tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    tracing::info!("Starting Lantern v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    let fetcher = HttpSourceFetcher::new(&config.search)?;
    let (connection, events) = lantern_client::connect(&config.stream.url).await?;

    let mut orchestrator = StreamOrchestrator::new(&config, Box::new(fetcher));
    orchestrator.connect(Box::new(connection));
    let session = Session::new(orchestrator);

    match args.query {
        Some(ref query) => run_single(session, events, query).await,
        None => run_prompt(session, events).await,
    }
    Ok(())
}
