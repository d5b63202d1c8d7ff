//! `okr-dispatch` command line driver
//!
//! Runs chat turns through the standard dispatcher backed by a fresh
//! in-memory store. `replay` shares one store and memory across every line,
//! so multi-turn conversations (create, then "update it") can be scripted.

mod turn;

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use okr_dispatch::{ConversationMemory, DispatchConfig, IntentDispatcher, ResultEnvelope, Services};
use okr_inmem::InMemoryOkrStore;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;
use turn::{parse_line, parse_pairs, parse_role, DefaultUser};

fn cli() -> Command {
    Command::new("okr-dispatch")
        .version(okr_dispatch::VERSION)
        .about("Route OKR chat intents against an in-memory backend")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .global(true)
                .default_value("info")
                .help("Default log filter when RUST_LOG is unset"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .arg(
            Arg::new("pretty")
                .long("pretty")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Pretty-print envelopes"),
        )
        .arg(
            Arg::new("max-conversations")
                .long("max-conversations")
                .global(true)
                .value_parser(value_parser!(u64))
                .help("Override memory.max_conversations"),
        )
        .arg(
            Arg::new("idle-timeout")
                .long("idle-timeout")
                .global(true)
                .value_parser(value_parser!(u64))
                .help("Override memory.idle_timeout_secs"),
        )
        .arg(
            Arg::new("org")
                .long("org")
                .global(true)
                .default_value("org-cli")
                .help("Organization of the calling user"),
        )
        .arg(
            Arg::new("user")
                .long("user")
                .global(true)
                .default_value("cli-user")
                .help("Calling user id"),
        )
        .arg(
            Arg::new("role")
                .long("role")
                .global(true)
                .default_value("Admin")
                .help("Role of the calling user"),
        )
        .subcommand(
            Command::new("route")
                .about("Dispatch a single turn")
                .arg(
                    Arg::new("conversation")
                        .long("conversation")
                        .default_value("cli")
                        .help("Conversation id"),
                )
                .arg(
                    Arg::new("intent")
                        .long("intent")
                        .required(true)
                        .help("Intent name, e.g. CreateObjective"),
                )
                .arg(
                    Arg::new("param")
                        .long("param")
                        .short('p')
                        .action(ArgAction::Append)
                        .help("Parameter as key=value (repeatable)"),
                ),
        )
        .subcommand(
            Command::new("replay")
                .about("Dispatch JSON-lines turns against one shared store and memory")
                .arg(
                    Arg::new("file")
                        .value_parser(value_parser!(PathBuf))
                        .help("Script file; reads stdin when omitted"),
                ),
        )
        .subcommand(Command::new("intents").about("List claimed intents per handler"))
}

fn init_tracing(matches: &ArgMatches) {
    let level = matches
        .get_one::<String>("log-level")
        .map_or("info", String::as_str);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    // A subscriber may already be installed by tests or an embedding runtime.
    if matches.get_flag("log-json") {
        builder.json().try_init().ok();
    } else {
        builder.try_init().ok();
    }
}

fn load_config(matches: &ArgMatches) -> Result<DispatchConfig> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => DispatchConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => DispatchConfig::new(),
    };
    if let Some(max) = matches.get_one::<u64>("max-conversations") {
        config.memory = config.memory.with_max_conversations(*max);
    }
    if let Some(secs) = matches.get_one::<u64>("idle-timeout") {
        config.memory = config.memory.with_idle_timeout(Some(Duration::from_secs(*secs)));
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn default_user(matches: &ArgMatches) -> Result<DefaultUser> {
    let text = |name: &str| matches.get_one::<String>(name).cloned().unwrap_or_default();
    Ok(DefaultUser {
        user_id: text("user"),
        organization_id: text("org"),
        role: parse_role(&text("role"))?,
    })
}

fn render(envelope: &ResultEnvelope, pretty: bool) -> Result<String> {
    let text = if pretty {
        serde_json::to_string_pretty(envelope)?
    } else {
        serde_json::to_string(envelope)?
    };
    Ok(text)
}

async fn replay<R>(dispatcher: &IntentDispatcher, input: R, fallback: &DefaultUser, pretty: bool) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    let mut line_no = 0usize;
    let mut rejected = 0usize;
    while let Some(line) = lines.next_line().await.context("reading script")? {
        line_no += 1;
        let turn = match parse_line(&line, fallback) {
            Ok(Some(turn)) => turn,
            Ok(None) => continue,
            Err(err) => {
                rejected += 1;
                tracing::error!(line = line_no, error = %format!("{err:#}"), "skipping malformed turn");
                continue;
            }
        };
        let envelope = dispatcher
            .route(&turn.conversation_id, &turn.intent, &turn.params, &turn.user)
            .await;
        println!("{}", render(&envelope, pretty)?);
    }
    Ok(rejected)
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_tracing(&matches);

    let config = load_config(&matches)?;
    let fallback = default_user(&matches)?;
    let pretty = matches.get_flag("pretty");

    let store = Arc::new(InMemoryOkrStore::new());
    let memory = ConversationMemory::from_config(&config.memory);
    let dispatcher = IntentDispatcher::standard(Services::from_backend(store), memory)
        .context("wiring intent handlers")?;

    match matches.subcommand() {
        Some(("route", args)) => {
            let conversation = args
                .get_one::<String>("conversation")
                .map_or("cli", String::as_str);
            let intent = args.get_one::<String>("intent").map_or("", String::as_str);
            let params = parse_pairs(args.get_many::<String>("param").into_iter().flatten())?;

            let envelope = dispatcher.route(conversation, intent, &params, &fallback.context()).await;
            println!("{}", render(&envelope, pretty)?);
            if !envelope.success {
                std::process::exit(2);
            }
        }
        Some(("replay", args)) => {
            let rejected = match args.get_one::<PathBuf>("file") {
                Some(path) => {
                    let file = tokio::fs::File::open(path)
                        .await
                        .with_context(|| format!("opening {}", path.display()))?;
                    replay(&dispatcher, BufReader::new(file), &fallback, pretty).await?
                }
                None => replay(&dispatcher, BufReader::new(tokio::io::stdin()), &fallback, pretty).await?,
            };
            let stats = dispatcher.stats();
            tracing::info!(
                routed = stats.routed,
                succeeded = stats.succeeded,
                failed = stats.failed,
                unrouted = stats.unrouted,
                panicked = stats.panicked,
                rejected,
                "replay finished"
            );
            if rejected > 0 {
                std::process::exit(1);
            }
        }
        Some(("intents", _)) => {
            for (intent, handler) in dispatcher.intents() {
                println!("{intent:<32} {handler}");
            }
        }
        _ => {}
    }
    Ok(())
}
