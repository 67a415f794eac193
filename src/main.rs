//! Demo client: runs one chat exchange against an orchestrator endpoint and
//! prints messages, agent progress, and visualizations as they arrive.

use std::time::Duration;

use agent_chat_stream::{StreamManager, StreamOptions, ThreadId, ViewModel};
use anyhow::Result;
use clap::Parser;
use futures::StreamExt;

#[derive(Parser, Debug)]
#[command(name = "agent-chat-stream", version, about = "Stream one multi-agent chat exchange")]
struct Args {
    /// Streaming endpoint the message is POSTed to
    #[arg(long, env = "AGENT_STREAM_ENDPOINT")]
    endpoint: String,

    /// User identifier sent with the request
    #[arg(long, env = "AGENT_STREAM_USER", default_value = "cli-user")]
    user_id: String,

    /// Continue an existing conversation thread
    #[arg(long)]
    thread_id: Option<String>,

    /// Extra request header, as NAME=VALUE (repeatable)
    #[arg(long = "header", value_parser = parse_header)]
    headers: Vec<(String, String)>,

    /// Cancel the exchange after this many seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Print the final view model as JSON
    #[arg(long)]
    json: bool,

    /// Message to send
    message: String,
}

fn parse_header(raw: &str) -> std::result::Result<(String, String), String> {
    raw.split_once('=')
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();

    let mut builder = StreamOptions::builder().endpoint(args.endpoint);
    for (name, value) in args.headers {
        builder = builder.header(name, value);
    }
    let manager = StreamManager::http(builder.build())?;

    manager
        .start(args.thread_id.map(ThreadId::from), args.message, args.user_id)
        .await;

    let mut printed = Printed::default();
    let mut views = Box::pin(manager.updates());
    let deadline = args.timeout_secs.map(Duration::from_secs);
    let watch_views = async {
        while let Some(view) = views.next().await {
            printed.print_new(&view);
            if !view.is_streaming {
                break;
            }
        }
    };

    tokio::select! {
        () = watch_views => {}
        () = sleep_or_forever(deadline) => {
            log::warn!("Deadline reached, cancelling exchange");
            manager.cancel();
        }
        _ = tokio::signal::ctrl_c() => {
            manager.cancel();
        }
    }

    let view = manager.snapshot();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        println!("status: {:?}", view.status);
        if let Some(thread) = &view.thread_id {
            println!("thread: {thread}");
        }
        if let Some(error) = view.error_message() {
            println!("error: {error}");
        }
    }

    manager.dispose();
    Ok(())
}

async fn sleep_or_forever(deadline: Option<Duration>) {
    match deadline {
        Some(duration) => tokio::time::sleep(duration).await,
        None => std::future::pending().await,
    }
}

/// How much of each collection has already been printed
#[derive(Default)]
struct Printed {
    messages: usize,
    updates: usize,
    visualizations: usize,
}

impl Printed {
    fn print_new(&mut self, view: &ViewModel) {
        for update in view.agent_updates.iter().skip(self.updates) {
            println!("[{}] {}", update.agent_name, update.response);
        }
        for message in view.messages.iter().skip(self.messages) {
            println!("{:?}: {}", message.role, message.content);
        }
        for viz in view.visualizations.iter().skip(self.visualizations) {
            println!("<{}> {}", viz.kind.as_str(), viz.title);
        }
        self.updates = view.agent_updates.len();
        self.messages = view.messages.len();
        self.visualizations = view.visualizations.len();
    }
}
