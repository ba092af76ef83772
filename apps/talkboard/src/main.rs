use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{realtime::realtime_url_for, GraphqlClient, TalkBoard, WsTalkSubscriber};
use shared::domain::ClientId;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::{wrappers::LinesStream, StreamExt};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod render;

use commands::{parse_line, Command, CommandError, HELP};
use config::{load_settings, Overrides, DEFAULT_CONFIG_PATH};
use render::{render_draft, render_talks};

#[derive(Parser, Debug)]
#[command(about = "List, create and follow conference talks through a GraphQL API")]
struct Args {
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    #[arg(long)]
    graphql_url: Option<String>,
    #[arg(long)]
    realtime_url: Option<String>,
    #[arg(long)]
    api_key: Option<String>,
    #[arg(long)]
    auth_token: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let settings = load_settings(
        &args.config,
        Overrides {
            graphql_url: args.graphql_url,
            realtime_url: args.realtime_url,
            api_key: args.api_key,
            auth_token: args.auth_token,
        },
    )?;
    let credential = settings.credential();
    let api = Arc::new(GraphqlClient::new(&settings.graphql_url, credential.clone())?);
    let realtime_url = match &settings.realtime_url {
        Some(url) => url.clone(),
        None => realtime_url_for(api.endpoint())?.to_string(),
    };
    let subscriber = Arc::new(WsTalkSubscriber::new(&realtime_url, credential)?);

    let client_id = ClientId::generate();
    info!(%client_id, endpoint = %api.endpoint(), realtime = %realtime_url, "starting talkboard");
    let mut board = TalkBoard::new(client_id, api.clone(), api, subscriber);

    board.initialize();
    if let Err(err) = board.subscribe().await {
        warn!("live updates unavailable: {err:#}");
    }

    println!("{HELP}");
    let mut lines = LinesStream::new(BufReader::new(tokio::io::stdin()).lines());
    loop {
        tokio::select! {
            line = lines.next() => {
                let Some(line) = line else { break };
                let line = line.context("failed to read stdin")?;
                if !handle_line(&mut board, &line) {
                    break;
                }
            }
            applied = board.next_event() => {
                let Some(applied) = applied else { break };
                if applied.changed_talks() {
                    print!("{}", render_talks(board.talks()));
                }
            }
        }
    }

    board.teardown().await;
    Ok(())
}

/// Applies one input line; returns `false` when the user asked to quit.
fn handle_line(board: &mut TalkBoard, line: &str) -> bool {
    match parse_line(line) {
        Ok(Command::Set { field, value }) => board.set_draft_field(field, value),
        Ok(Command::Submit) => match board.submit_draft() {
            Some(talk) => {
                debug!(talk = %talk.name, "submitted draft");
                print!("{}", render_talks(board.talks()));
            }
            None => debug!("draft incomplete; submit ignored"),
        },
        Ok(Command::List) => print!("{}", render_talks(board.talks())),
        Ok(Command::Draft) => print!("{}", render_draft(board.draft())),
        Ok(Command::Help) => println!("{HELP}"),
        Ok(Command::Quit) => return false,
        Err(CommandError::Empty) => {}
        Err(err) => eprintln!("{err}"),
    }
    true
}
