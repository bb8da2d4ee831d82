
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use canvas::doc::{Point, Tool};
use clap::{Args, Parser, Subcommand};
use client::net::{ConnectError, Connection, ws_url};
use client::session::Session;
use frames::{ChatHistory, ChatMessage, CreateRoom, Encoding, Event, JoinRoom, MessageKind, RoomRef};
use serde_json::Value;
use uuid::Uuid;

const REPLY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{0}")]
    Connect(#[from] ConnectError),
    #[error("frame codec failed: {0}")]
    Codec(#[from] frames::CodecError),
    #[error("server returned {status}: {message}")]
    ServerError { status: u16, message: String },
    #[error("room not found: {0}")]
    RoomNotFound(String),
    #[error("server rejected event: {0}")]
    Rejected(String),
    #[error("invalid point `{0}`; expected x,y")]
    InvalidPoint(String),
    #[error("unknown tool `{0}`")]
    UnknownTool(String),
    #[error("a stroke needs at least one point")]
    EmptyStroke,
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "inkroom-cli", about = "Inkroom room API and event channel CLI")]
struct Cli {
    #[arg(long, env = "INKROOM_BASE_URL", default_value = "http://127.0.0.1:3020")]
    base_url: String,

    /// Speak protobuf frames on the event channel instead of JSON text.
    #[arg(long, default_value_t = false)]
    binary: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone)]
struct CliContext {
    base_url: String,
    encoding: Encoding,
}

#[derive(Subcommand, Debug)]
enum Command {
    Ping,
    Rooms(RoomsCommand),
    /// Print a room's chat transcript.
    Chat { room_id: String },
    /// Register a room.
    Create {
        room_id: String,
        #[arg(long, default_value_t = false)]
        private: bool,
    },
    /// Join a room and print every event as a JSON line.
    Watch(WatchArgs),
    /// Join a room and draw one stroke.
    Draw(DrawArgs),
    /// Join a room and post a chat message.
    Say(SayArgs),
}

#[derive(Args, Debug)]
struct RoomsCommand {
    #[command(subcommand)]
    command: RoomsSubcommand,
}

#[derive(Subcommand, Debug)]
enum RoomsSubcommand {
    /// Public, active rooms.
    List,
    /// Which of the given ids exist, whatever their visibility.
    Check { ids: Vec<String> },
}

#[derive(Args, Debug)]
struct WatchArgs {
    room_id: String,
    #[arg(long, default_value = "watcher")]
    username: String,
    #[arg(long, help = "Stop after this many events")]
    count: Option<usize>,
}

#[derive(Args, Debug)]
struct DrawArgs {
    room_id: String,
    #[arg(long, default_value = "cli")]
    username: String,
    #[arg(long, default_value = "pencil", value_parser = parse_tool)]
    tool: Tool,
    #[arg(long)]
    color: Option<String>,
    #[arg(long)]
    width: Option<f64>,
    /// Stroke points as `x,y` pairs.
    #[arg(required = true, allow_hyphen_values = true, value_parser = parse_point)]
    points: Vec<Point>,
}

#[derive(Args, Debug)]
struct SayArgs {
    room_id: String,
    #[arg(long, default_value = "cli")]
    username: String,
    text: String,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let ctx = CliContext {
        base_url: cli.base_url,
        encoding: if cli.binary { Encoding::Binary } else { Encoding::Text },
    };

    match cli.command {
        Command::Ping => run_ping(&ctx).await,
        Command::Rooms(rooms) => run_rooms(&ctx, rooms).await,
        Command::Chat { room_id } => {
            let path = format!("/api/rooms/{room_id}/chat");
            print_json(&api_request(&ctx, reqwest::Method::GET, &path, None).await?)
        }
        Command::Create { room_id, private } => run_create(&ctx, room_id, private).await,
        Command::Watch(args) => run_watch(&ctx, args).await,
        Command::Draw(args) => run_draw(&ctx, args).await,
        Command::Say(args) => run_say(&ctx, args).await,
    }
}

async fn run_ping(cli: &CliContext) -> Result<(), CliError> {
    let url = format!("{}/healthz", cli.base_url.trim_end_matches('/'));
    let status = reqwest::Client::new().get(url).send().await?.status();
    if !status.is_success() {
        return Err(CliError::ServerError { status: status.as_u16(), message: "health check failed".to_owned() });
    }
    println!("ok");
    Ok(())
}

async fn run_rooms(cli: &CliContext, rooms: RoomsCommand) -> Result<(), CliError> {
    let json = match rooms.command {
        RoomsSubcommand::List => api_request(cli, reqwest::Method::GET, "/api/rooms", None).await?,
        RoomsSubcommand::Check { ids } => {
            let body = serde_json::json!({ "ids": ids });
            api_request(cli, reqwest::Method::POST, "/api/rooms/check", Some(body)).await?
        }
    };
    print_json(&json)
}

// =============================================================================
// EVENT CHANNEL
// =============================================================================

async fn run_create(cli: &CliContext, room_id: String, private: bool) -> Result<(), CliError> {
    let mut conn = open(cli).await?;
    conn.send(&Event::CreateRoom(CreateRoom { room_id: room_id.clone(), is_private: private })).await?;
    // Every connection gets the refreshed listing once the room is registered.
    conn.recv_until(REPLY_TIMEOUT, |e| matches!(e, Event::UpdateRooms(_))).await?;
    conn.close().await?;
    eprintln!("created room: {room_id} private={private}");
    Ok(())
}

async fn run_watch(cli: &CliContext, args: WatchArgs) -> Result<(), CliError> {
    let mut conn = open(cli).await?;
    let loading = join(&mut conn, &args.room_id, &args.username).await?;
    println!("{}", frames::encode_text(&loading)?);

    let mut seen = 0_usize;
    while args.count.is_none_or(|limit| seen < limit) {
        let event = match conn.recv().await {
            Ok(event) => event,
            Err(ConnectError::Closed) => break,
            Err(ConnectError::Codec(error)) => {
                eprintln!("skipping undecodable frame: {error}");
                continue;
            }
            Err(error) => return Err(error.into()),
        };
        println!("{}", frames::encode_text(&event)?);
        seen = seen.saturating_add(1);
    }
    Ok(())
}

async fn run_draw(cli: &CliContext, args: DrawArgs) -> Result<(), CliError> {
    let (&first, rest) = args.points.split_first().ok_or(CliError::EmptyStroke)?;

    let mut conn = open(cli).await?;
    let loading = join(&mut conn, &args.room_id, &args.username).await?;

    let mut session = Session::new(args.room_id.clone());
    session.mirror_mut().apply_remote(&loading);
    let settings = session.mirror_mut().settings_mut();
    if let Some(color) = args.color {
        settings.color = color;
    }
    if let Some(width) = args.width {
        settings.stroke_width = width;
    }

    let events = stroke(&mut session, args.tool, first, rest);
    conn.send_all(&events).await?;
    sync_barrier(&mut conn, &args.room_id).await?;
    conn.close().await?;

    eprintln!("sent {} events; canvas now has {} elements", events.len(), session.mirror().elements().len());
    Ok(())
}

async fn run_say(cli: &CliContext, args: SayArgs) -> Result<(), CliError> {
    let mut conn = open(cli).await?;
    join(&mut conn, &args.room_id, &args.username).await?;

    let message = ChatMessage {
        id: Uuid::new_v4().to_string(),
        room_id: Some(args.room_id),
        text: args.text,
        username: args.username,
        time: now_ms(),
        kind: MessageKind::User,
    };
    conn.send(&Event::Message(message.clone())).await?;
    // The room broadcast includes the sender.
    conn.recv_until(REPLY_TIMEOUT, |e| matches!(e, Event::Message(m) if m.id == message.id)).await?;
    conn.close().await?;
    Ok(())
}

async fn open(cli: &CliContext) -> Result<Connection, CliError> {
    let url = ws_url(&cli.base_url)?;
    Ok(Connection::connect(&url, cli.encoding).await?)
}

/// Join `room_id` and return its `loading-canvas` event.
async fn join(conn: &mut Connection, room_id: &str, username: &str) -> Result<Event, CliError> {
    conn.send(&Event::JoinRoom(JoinRoom { room_id: room_id.to_owned(), username: username.to_owned() })).await?;
    let reply = conn
        .recv_until(REPLY_TIMEOUT, |e| {
            matches!(e, Event::LoadingCanvas(_) | Event::RoomNotFound(_) | Event::Error(_))
        })
        .await?;
    match reply {
        Event::RoomNotFound(RoomRef { room_id }) => Err(CliError::RoomNotFound(room_id)),
        Event::Error(payload) => Err(CliError::Rejected(payload.message)),
        loading => Ok(loading),
    }
}

/// Round-trip a `chat-history` request. Events sent before it on this
/// connection have been applied once the reply arrives.
async fn sync_barrier(conn: &mut Connection, room_id: &str) -> Result<(), CliError> {
    conn.send(&Event::ChatHistory(ChatHistory { room_id: room_id.to_owned(), messages: Vec::new() })).await?;
    conn.recv_until(REPLY_TIMEOUT, |e| matches!(e, Event::ChatHistory(_))).await?;
    Ok(())
}

/// Drive one pointer gesture through `session`, collecting the events to send.
fn stroke(session: &mut Session, tool: Tool, first: Point, rest: &[Point]) -> Vec<Event> {
    session.set_tool(tool);
    if tool == Tool::Text {
        let (_, event) = session.place_text(first, "");
        return vec![event];
    }
    let mut events = session.pointer_down(first);
    for &point in rest {
        events.extend(session.pointer_move(point));
    }
    events.extend(session.pointer_up());
    events
}

// =============================================================================
// HELPERS
// =============================================================================

async fn api_request(
    cli: &CliContext,
    method: reqwest::Method,
    path: &str,
    body: Option<Value>,
) -> Result<Value, CliError> {
    let url = format!("{}{}", cli.base_url.trim_end_matches('/'), path);
    let request = reqwest::Client::new().request(method, &url);
    let request = if let Some(json) = body { request.json(&json) } else { request };

    let response = request.send().await?;
    let status = response.status();
    let value = response.json::<Value>().await.unwrap_or(Value::Null);

    if !status.is_success() {
        return Err(CliError::ServerError { status: status.as_u16(), message: value.to_string() });
    }
    Ok(value)
}

fn parse_point(raw: &str) -> Result<Point, CliError> {
    let invalid = || CliError::InvalidPoint(raw.to_owned());
    let (x, y) = raw.split_once(',').ok_or_else(invalid)?;
    let x = x.trim().parse::<f64>().map_err(|_| invalid())?;
    let y = y.trim().parse::<f64>().map_err(|_| invalid())?;
    if !(x.is_finite() && y.is_finite()) {
        return Err(invalid());
    }
    Ok(Point::new(x, y))
}

fn parse_tool(raw: &str) -> Result<Tool, CliError> {
    Ok(match raw.to_ascii_lowercase().as_str() {
        "pencil" => Tool::Pencil,
        "brush" => Tool::Brush,
        "marker" => Tool::Marker,
        "eraser" => Tool::Eraser,
        "rect" => Tool::Rect,
        "circle" => Tool::Circle,
        "text" => Tool::Text,
        "select" => Tool::Select,
        _ => return Err(CliError::UnknownTool(raw.to_owned())),
    })
}

fn now_ms() -> i64 {
    let Ok(duration) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(duration.as_millis()).unwrap_or(0)
}

fn print_json(value: &Value) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
