use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "msglog",
    about = "msglog: append-only message log with paging, attachments and live push",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding messages.json and attachments/
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP and WebSocket server
    Serve(ServeArgs),
    /// Show one page of the log, newest first
    List(ListArgs),
    /// Show a single message
    Show(ShowArgs),
    /// Append a message without a running server
    Add(AddArgs),
    /// Print the effective configuration as TOML
    Config,
}

#[derive(Args)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long)]
    pub bind: Option<SocketAddr>,
    /// Do not send CORS headers
    #[arg(long)]
    pub no_cors: bool,
}

#[derive(Args)]
pub struct ListArgs {
    /// Page index; 0 is the newest page
    #[arg(long, default_value_t = 0)]
    pub page: usize,
    /// Messages per page
    #[arg(long)]
    pub size: Option<usize>,
    /// Case-insensitive substring filter
    #[arg(long)]
    pub search: Option<String>,
}

#[derive(Args)]
pub struct ShowArgs {
    pub id: u64,
}

#[derive(Args)]
pub struct AddArgs {
    /// Message body; base64 for audio and video
    pub data: String,
    /// text, audio or video
    #[arg(long = "type", default_value = "text")]
    pub kind: String,
    #[arg(long)]
    pub client: Option<String>,
    /// File to attach; repeatable
    #[arg(long = "attach")]
    pub attachments: Vec<PathBuf>,
}
