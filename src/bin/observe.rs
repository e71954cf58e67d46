//! Terminal observer for the crewdeck event stream.
//!
//! Connects to the server's `/ws` endpoint with a blocking WebSocket,
//! folds every event into an `ObserverView` and prints the activity log
//! as it grows. On transport loss it backs off and resubscribes; events
//! missed while disconnected are accepted loss.

use std::io::ErrorKind;
use std::net::TcpStream;
use std::thread;
use std::time::Duration;

use tungstenite::stream::MaybeTlsStream;
use tungstenite::{connect, Message, WebSocket};

use crewdeck::model::ExecutionEvent;
use crewdeck::observer::{ActivityKind, ObserverView};

const LOG_CAPACITY: usize = 1000;
const RECONNECT_BACKOFF: Duration = Duration::from_secs(2);
const PING_INTERVAL: Duration = Duration::from_secs(20);

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "observe=info".into()),
        )
        .init();

    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "ws://127.0.0.1:3000/ws".to_string());

    let mut view = ObserverView::new(LOG_CAPACITY);
    loop {
        match run_session(&url, &mut view) {
            Ok(()) => {
                tracing::info!("server closed the connection, reconnecting");
            }
            Err(err) => {
                tracing::warn!(error = %err, "connection lost, reconnecting");
            }
        }
        thread::sleep(RECONNECT_BACKOFF);
    }
}

fn run_session(url: &str, view: &mut ObserverView) -> anyhow::Result<()> {
    let (mut socket, _) = connect(url)?;
    set_read_timeout(&mut socket);
    tracing::info!(%url, "connected");

    loop {
        match socket.read() {
            Ok(Message::Text(text)) => match serde_json::from_str::<ExecutionEvent>(&text) {
                Ok(event) => render(view, &event),
                Err(_) => {
                    // Pong replies and any future message types land here.
                    tracing::debug!(frame = %text, "ignoring non-event frame");
                }
            },
            Ok(Message::Close(_)) => return Ok(()),
            Ok(_) => {}
            Err(tungstenite::Error::Io(err))
                if err.kind() == ErrorKind::WouldBlock || err.kind() == ErrorKind::TimedOut =>
            {
                socket.send(Message::Text(r#"{"type":"ping"}"#.to_string()))?;
            }
            Err(err) => return Err(err.into()),
        }
    }
}

fn set_read_timeout(socket: &mut WebSocket<MaybeTlsStream<TcpStream>>) {
    // Timeout doubles as the ping cadence on an otherwise idle stream.
    if let MaybeTlsStream::Plain(stream) = socket.get_ref() {
        let _ = stream.set_read_timeout(Some(PING_INTERVAL));
    }
}

fn render(view: &mut ObserverView, event: &ExecutionEvent) {
    view.apply(event);
    let Some(entry) = view.entries().next() else {
        return;
    };
    let marker = match entry.kind {
        ActivityKind::Success => "+",
        ActivityKind::Warning => "!",
        ActivityKind::Info => "-",
    };
    println!("{} [{}] {}", marker, entry.timestamp, entry.message);

    if event.is_terminal() {
        let m = &view.metrics;
        println!(
            "  tokens: {}  api calls: {}  cost: ${:.2}  duration: {}s",
            m.tokens_used, m.api_calls, m.estimated_cost, m.duration
        );
    }
}
