use std::path::Path;

use anyhow::Context;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use colored::Colorize;
use msglog_query::find_page;
use msglog_server::{AppState, MsglogServer, ServerConfig};
use msglog_store::MessageStore;
use msglog_types::{Message, MessageId, NewMessage, PageQuery, RawAttachment};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = resolve_config(&cli)?;
    let format = cli.format;
    match cli.command {
        Command::Serve(args) => cmd_serve(config, args),
        Command::List(args) => cmd_list(&config, args, &format),
        Command::Show(args) => cmd_show(&config, args, &format),
        Command::Add(args) => cmd_add(config, args, &format),
        Command::Config => {
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
    }
}

fn resolve_config(cli: &Cli) -> anyhow::Result<ServerConfig> {
    let mut config = match &cli.config {
        Some(path) => ServerConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => ServerConfig::default(),
    };
    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = data_dir.clone();
    }
    tracing::debug!(
        file = ?cli.config,
        data_dir = %config.data_dir.display(),
        bind = %config.bind_addr,
        "configuration resolved"
    );
    Ok(config)
}

fn cmd_serve(mut config: ServerConfig, args: ServeArgs) -> anyhow::Result<()> {
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if args.no_cors {
        config.allow_cors = false;
    }
    let server = MsglogServer::open(config).context("opening message log")?;
    println!(
        "{} msglog on {} (data: {}, {} messages)",
        "▶".green().bold(),
        server.config().bind_addr.to_string().bold(),
        server.config().data_dir.display(),
        server.state().store().len()
    );
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(server.serve())?;
    Ok(())
}

fn open_store(config: &ServerConfig) -> anyhow::Result<MessageStore> {
    MessageStore::open(config.snapshot_path())
        .with_context(|| format!("reading {}", config.snapshot_path().display()))
}

fn cmd_list(config: &ServerConfig, args: ListArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let mut query = PageQuery::new(args.page, args.size.unwrap_or(config.default_page_size));
    if let Some(search) = args.search {
        query = query.with_search(search);
    }
    let page = find_page(&store.messages(), &query)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&page)?),
        OutputFormat::Text => {
            if page.is_empty() {
                println!("No messages.");
                return Ok(());
            }
            println!(
                "Page {}/{} ({} matching)",
                (page.page_index + 1).to_string().bold(),
                page.pages_count,
                page.total
            );
            for message in &page.messages {
                println!("{}", summary_line(message));
            }
            if page.has_older() {
                println!("{}", format!("  ... {} older", page.older_start).dimmed());
            }
        }
    }
    Ok(())
}

fn cmd_show(config: &ServerConfig, args: ShowArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let message = store.get(MessageId::new(args.id))?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&*message)?),
        OutputFormat::Text => {
            println!("{}", summary_line(&message));
            if let Some(client) = &message.client_id {
                println!("  Client: {}", client.cyan());
            }
            if let Some(location) = &message.location {
                println!("  Location: {location}");
            }
            for name in &message.attachment_names {
                println!("  Attachment: {}", name.blue());
            }
        }
    }
    Ok(())
}

fn cmd_add(config: ServerConfig, args: AddArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let mut request = NewMessage::of_kind(args.kind, args.data);
    if let Some(client) = args.client {
        request = request.with_client(client);
    }
    for path in &args.attachments {
        request = request.with_attachment(read_attachment(path)?);
    }

    let state = AppState::open(config).context("opening message log")?;
    let message = state.pipeline().create_message(request)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&*message)?),
        OutputFormat::Text => println!(
            "{} Created message {}",
            "✓".green().bold(),
            format!("#{}", message.id).yellow()
        ),
    }
    Ok(())
}

fn read_attachment(path: &Path) -> anyhow::Result<RawAttachment> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("{} has no usable file name", path.display()))?;
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(RawAttachment::new(name, BASE64_STANDARD.encode(bytes)))
}

/// One line per message; media bodies are summarized rather than printed.
fn summary_line(message: &Message) -> String {
    let body = if message.kind.is_media() {
        format!("[{} clip, {} base64 chars]", message.kind, message.data.len())
    } else {
        message.data.clone()
    };
    let clip = if message.attachment_names.is_empty() {
        String::new()
    } else {
        format!(" +{} file(s)", message.attachment_names.len())
    };
    format!(
        "{} {} {}{}",
        format!("#{}", message.id).yellow(),
        message.date_time.to_string().dimmed(),
        body,
        clip.blue()
    )
}
