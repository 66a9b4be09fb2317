//! kvgate CLI Client
//!
//! Sends one command to a kvgate server and prints the reply.

use std::io::{Read, Write};
use std::net::TcpStream;
use std::process;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::{Map, Value};
use tungstenite::Message;

/// kvgate CLI
#[derive(Parser, Debug)]
#[command(name = "kvgate-cli")]
#[command(about = "CLI for the kvgate gateway")]
struct Args {
    /// Gateway address
    #[arg(short, long, default_value = "127.0.0.1:8880")]
    server: String,

    /// Reply timeout in milliseconds
    #[arg(short, long, default_value = "5000")]
    timeout_ms: u64,

    /// Talk raw TCP instead of WebSocket
    #[arg(long)]
    tcp: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get values by key
    Get {
        /// The keys to get
        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Set key-value pairs
    Set {
        /// Pairs as key=value; values that parse as JSON are sent as JSON
        #[arg(required = true)]
        pairs: Vec<String>,
    },
}

/// Client frame as the gateway expects it
#[derive(Serialize)]
struct Request<'a> {
    command: &'a str,
    key: Value,
}

fn build_request(command: &Commands) -> Result<Request<'static>, String> {
    match command {
        Commands::Get { keys } => Ok(Request {
            command: "get",
            key: Value::from(keys.clone()),
        }),
        Commands::Set { pairs } => {
            let mut entries = Map::new();
            for pair in pairs {
                let (key, raw) = pair
                    .split_once('=')
                    .ok_or_else(|| format!("expected key=value, got `{pair}`"))?;
                let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::from(raw));
                entries.insert(key.to_string(), value);
            }
            Ok(Request {
                command: "set",
                key: Value::Object(entries),
            })
        }
    }
}

fn run(args: &Args) -> Result<Vec<u8>, String> {
    let request = build_request(&args.command)?;
    let body = serde_json::to_string(&request).map_err(|e| format!("encode failed: {e}"))?;

    let stream = TcpStream::connect(&args.server)
        .map_err(|e| format!("connect to {} failed: {e}", args.server))?;
    stream
        .set_read_timeout(Some(Duration::from_millis(args.timeout_ms)))
        .map_err(|e| e.to_string())?;

    if args.tcp {
        exchange_tcp(stream, body)
    } else {
        exchange_websocket(&args.server, stream, body)
    }
}

fn exchange_websocket(server: &str, stream: TcpStream, body: String) -> Result<Vec<u8>, String> {
    let (mut ws, _) = tungstenite::client::client(format!("ws://{server}/"), stream)
        .map_err(|e| format!("handshake failed: {e}"))?;
    ws.send(Message::Text(body))
        .map_err(|e| format!("send failed: {e}"))?;

    loop {
        match ws.read().map_err(|e| format!("receive failed: {e}"))? {
            Message::Text(text) => return Ok(text.into_bytes()),
            Message::Binary(data) => return Ok(data),
            Message::Close(_) => return Err("gateway closed the connection".to_string()),
            _ => {}
        }
    }
}

fn exchange_tcp(mut stream: TcpStream, body: String) -> Result<Vec<u8>, String> {
    stream
        .write_all(body.as_bytes())
        .map_err(|e| format!("send failed: {e}"))?;

    let mut reply = vec![0u8; 64 * 1024];
    let n = stream
        .read(&mut reply)
        .map_err(|e| format!("receive failed: {e}"))?;
    if n == 0 {
        return Err("gateway closed the connection".to_string());
    }
    reply.truncate(n);
    Ok(reply)
}

fn main() {
    let args = Args::parse();

    match run(&args) {
        Ok(reply) => println!("{}", String::from_utf8_lossy(&reply)),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}
