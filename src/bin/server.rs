use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use clap::Parser;
use futures_util::{Sink, SinkExt, StreamExt};
use serde_json::json;
use solo_packman_server::constants::FRAME_MS;
use solo_packman_server::engine::{GameEngine, GameEngineOptions};
use solo_packman_server::logging::{emit_log, now_ms, LogContext, LogLevel};
use solo_packman_server::server_protocol::{
    parse_client_message, ParsedClientMessage, ServerMessage,
};
use solo_packman_server::types::{HeldDirections, RuntimeEvent};
use tokio::time::Instant;
use tower_http::services::{ServeDir, ServeFile};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long, env = "PORT", default_value_t = 8080)]
    port: u16,
    #[arg(long, env = "STATIC_DIR")]
    static_dir: Option<PathBuf>,
    #[arg(long, default_value_t = FRAME_MS)]
    frame_ms: u64,
}

#[derive(Clone)]
struct AppState {
    frame_ms: u64,
    next_session: Arc<AtomicU64>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let startup = LogContext::new("server");

    if let Err(error) = GameEngine::new(GameEngineOptions::default()) {
        emit_log(
            LogLevel::Error,
            "maze_invalid",
            &startup,
            json!({ "error": error.to_string() }),
        );
        std::process::exit(2);
    }

    let state = AppState {
        frame_ms: cli.frame_ms.max(1),
        next_session: Arc::new(AtomicU64::new(1)),
    };

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/ws", get(ws_handler))
        .with_state(state);

    let app = match resolve_static_dir(cli.static_dir) {
        Some(static_dir) => {
            let index_file = static_dir.join("index.html");
            emit_log(
                LogLevel::Info,
                "static_root",
                &startup,
                json!({ "path": static_dir.to_string_lossy() }),
            );
            app.fallback_service(
                ServeDir::new(static_dir).not_found_service(ServeFile::new(index_file)),
            )
        }
        None => app,
    };

    let bind_addr = format!("0.0.0.0:{}", cli.port);
    let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
        Ok(listener) => listener,
        Err(error) => {
            emit_log(
                LogLevel::Error,
                "bind_failed",
                &startup,
                json!({ "addr": bind_addr, "error": error.to_string() }),
            );
            std::process::exit(2);
        }
    };

    emit_log(
        LogLevel::Info,
        "listening",
        &startup,
        json!({ "port": cli.port, "frameMs": cli.frame_ms }),
    );
    if let Err(error) = axum::serve(listener, app).await {
        emit_log(
            LogLevel::Error,
            "server_failed",
            &startup,
            json!({ "error": error.to_string() }),
        );
        std::process::exit(1);
    }
}

fn resolve_static_dir(configured: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(path) = configured {
        if path.join("index.html").is_file() {
            return Some(path);
        }
    }
    let fallback = PathBuf::from("static");
    fallback.join("index.html").is_file().then_some(fallback)
}

async fn healthz() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

/// One socket, one game. The task owns its engine outright.
async fn handle_socket(state: AppState, socket: WebSocket) {
    let session = state.next_session.fetch_add(1, Ordering::Relaxed);
    let seed: u32 = rand::random();
    let context = LogContext::new(format!("session-{session}-{}", now_ms())).with_seed(seed);

    let (mut ws_sender, mut ws_receiver) = socket.split();

    let mut engine = match GameEngine::new(GameEngineOptions { seed }) {
        Ok(engine) => engine,
        Err(error) => {
            // the session ends here whether or not the reason reaches the client
            let _ = send_message(&mut ws_sender, &ServerMessage::error(error.to_string())).await;
            return;
        }
    };

    let welcome = ServerMessage::Welcome {
        seed,
        width: engine.board().width(),
        height: engine.board().height(),
    };
    if send_message(&mut ws_sender, &welcome).await.is_err() {
        return;
    }
    emit_log(LogLevel::Info, "session_opened", &context, json!({}));

    let mut held = HeldDirections::none();
    let mut ticker = tokio::time::interval(Duration::from_millis(state.frame_ms));
    let mut last_tick = Instant::now();
    let mut tick = 0u64;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let elapsed_ms = drain_elapsed_ms(&mut last_tick, Instant::now());
                let frame = engine.advance(elapsed_ms, held);
                tick += 1;
                log_runtime_events(&context.at_tick(tick), &frame.events);
                if send_message(&mut ws_sender, &ServerMessage::Frame { frame }).await.is_err() {
                    break;
                }
            }
            received = ws_receiver.next() => {
                let Some(Ok(message)) = received else {
                    break;
                };
                let flow = handle_inbound(
                    message,
                    &mut engine,
                    &mut held,
                    &mut ws_sender,
                    &context.at_tick(tick),
                )
                .await;
                if flow == SocketFlow::Close {
                    break;
                }
            }
        }
    }

    emit_log(
        LogLevel::Info,
        "session_closed",
        &context.at_tick(tick),
        json!({ "score": engine.score(), "level": engine.level() }),
    );
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SocketFlow {
    Continue,
    Close,
}

async fn handle_inbound<S>(
    message: Message,
    engine: &mut GameEngine,
    held: &mut HeldDirections,
    sender: &mut S,
    context: &LogContext,
) -> SocketFlow
where
    S: Sink<Message> + Unpin,
{
    let raw = match message {
        Message::Text(raw) => raw.to_string(),
        Message::Binary(raw) => match String::from_utf8(raw.to_vec()) {
            Ok(text) => text,
            Err(_) => return reply_error(sender, "invalid utf8 message").await,
        },
        Message::Close(_) => return SocketFlow::Close,
        _ => return SocketFlow::Continue,
    };

    match parse_client_message(&raw) {
        Some(ParsedClientMessage::Start) => {
            if engine.start() {
                emit_log(LogLevel::Info, "game_started", context, json!({}));
            }
            SocketFlow::Continue
        }
        Some(ParsedClientMessage::Input { held: next }) => {
            *held = next;
            SocketFlow::Continue
        }
        None => reply_error(sender, "unrecognized message").await,
    }
}

/// A reply that cannot be delivered means the peer is gone.
async fn reply_error<S>(sender: &mut S, message: &str) -> SocketFlow
where
    S: Sink<Message> + Unpin,
{
    match send_message(sender, &ServerMessage::error(message)).await {
        Ok(()) => SocketFlow::Continue,
        Err(()) => SocketFlow::Close,
    }
}

async fn send_message<S>(sender: &mut S, message: &ServerMessage) -> Result<(), ()>
where
    S: Sink<Message> + Unpin,
{
    let payload = message.to_json().map_err(|_| ())?;
    sender
        .send(Message::Text(payload.into()))
        .await
        .map_err(|_| ())
}

/// Whole milliseconds since `last`; the sub-millisecond remainder carries into the next tick.
fn drain_elapsed_ms(last: &mut Instant, now: Instant) -> u64 {
    let elapsed_ms = now.saturating_duration_since(*last).as_millis() as u64;
    *last += Duration::from_millis(elapsed_ms);
    elapsed_ms
}

fn is_logged_event(event: &RuntimeEvent) -> bool {
    matches!(
        event,
        RuntimeEvent::PlayerHit { .. }
            | RuntimeEvent::ExtraLife { .. }
            | RuntimeEvent::LevelCleared { .. }
            | RuntimeEvent::GameOver { .. }
    )
}

fn log_runtime_events(context: &LogContext, events: &[RuntimeEvent]) {
    for event in events.iter().filter(|event| is_logged_event(event)) {
        let details = serde_json::to_value(event).unwrap_or_else(|_| json!({}));
        emit_log(LogLevel::Info, "runtime_event", context, details);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solo_packman_server::types::{Direction, GamePhase, Position};

    #[test]
    fn elapsed_remainder_carries_over() {
        let start = Instant::now();
        let mut last = start;
        assert_eq!(
            drain_elapsed_ms(&mut last, start + Duration::from_micros(16_600)),
            16
        );
        assert_eq!(last, start + Duration::from_millis(16));
        assert_eq!(
            drain_elapsed_ms(&mut last, start + Duration::from_micros(33_200)),
            17
        );
    }

    #[test]
    fn elapsed_never_runs_backwards() {
        let start = Instant::now();
        let mut last = start + Duration::from_millis(5);
        assert_eq!(drain_elapsed_ms(&mut last, start), 0);
    }

    #[test]
    fn only_milestone_events_are_logged() {
        assert!(is_logged_event(&RuntimeEvent::PlayerHit { lives_left: 2 }));
        assert!(is_logged_event(&RuntimeEvent::LevelCleared { level: 1 }));
        assert!(!is_logged_event(&RuntimeEvent::DotEaten {
            at: Position::new(1, 1)
        }));
        assert!(!is_logged_event(&RuntimeEvent::PowerExpired));
    }

    fn session_parts() -> (GameEngine, HeldDirections, LogContext) {
        let engine = GameEngine::new(GameEngineOptions { seed: 4 }).expect("valid");
        (engine, HeldDirections::none(), LogContext::new("session-test"))
    }

    /// A peer whose every send fails, on every attempt.
    struct DeadPeer;

    impl Sink<Message> for DeadPeer {
        type Error = ();

        fn poll_ready(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<Result<(), ()>> {
            std::task::Poll::Ready(Err(()))
        }

        fn start_send(self: std::pin::Pin<&mut Self>, _item: Message) -> Result<(), ()> {
            Err(())
        }

        fn poll_flush(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<Result<(), ()>> {
            std::task::Poll::Ready(Err(()))
        }

        fn poll_close(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<Result<(), ()>> {
            std::task::Poll::Ready(Err(()))
        }
    }

    fn dead_peer() -> impl Sink<Message> + Unpin {
        DeadPeer
    }

    #[tokio::test]
    async fn inbound_messages_drive_the_engine() {
        let (mut engine, mut held, context) = session_parts();
        let mut sink = futures_util::sink::drain();

        let start = Message::Text(r#"{"type":"start"}"#.into());
        let flow = handle_inbound(start, &mut engine, &mut held, &mut sink, &context).await;
        assert_eq!(flow, SocketFlow::Continue);
        assert_eq!(engine.phase(), GamePhase::Playing);

        let input = Message::Text(r#"{"type":"input","held":["left"]}"#.into());
        let flow = handle_inbound(input, &mut engine, &mut held, &mut sink, &context).await;
        assert_eq!(flow, SocketFlow::Continue);
        assert_eq!(held, HeldDirections::only(Direction::Left));

        let flow = handle_inbound(Message::Close(None), &mut engine, &mut held, &mut sink, &context).await;
        assert_eq!(flow, SocketFlow::Close);
    }

    #[tokio::test]
    async fn bad_message_with_live_peer_keeps_session_open() {
        let (mut engine, mut held, context) = session_parts();
        let mut sink = futures_util::sink::drain();
        let bogus = Message::Text(r#"{"type":"teleport"}"#.into());
        let flow = handle_inbound(bogus, &mut engine, &mut held, &mut sink, &context).await;
        assert_eq!(flow, SocketFlow::Continue);
    }

    #[tokio::test]
    async fn undeliverable_error_reply_closes_session() {
        let (mut engine, mut held, context) = session_parts();
        let mut sink = dead_peer();

        let bogus = Message::Text(r#"{"type":"teleport"}"#.into());
        let flow = handle_inbound(bogus, &mut engine, &mut held, &mut sink, &context).await;
        assert_eq!(flow, SocketFlow::Close);

        let garbled = Message::Binary(vec![0xff, 0xfe, 0xfd].into());
        let flow = handle_inbound(garbled, &mut engine, &mut held, &mut sink, &context).await;
        assert_eq!(flow, SocketFlow::Close);
    }

    #[test]
    fn missing_static_dir_is_ignored() {
        let missing = std::env::temp_dir().join("solo-packman-no-such-static-dir");
        assert_eq!(resolve_static_dir(Some(missing)), None);
    }
}
