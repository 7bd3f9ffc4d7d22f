use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use std::io::{self, Write};
use std::sync::Arc;
use uuid::Uuid;

mod catalog;
mod cli;
mod config;
mod conversation;
mod errors;
mod log;
mod prompt;
mod provider;
mod repl;
mod selection;
mod session;
mod storage;
mod ux;
mod wire;

use catalog::Catalog;
use cli::Command;
use errors::SessionError;
use provider::CompletionClient;
use repl::Action;
use session::{Observers, Session};
use storage::{FileStore, KeyValueStore, MemoryStore, SelectionStorage};

const CLEAR_PROMPT: &str = "Are you sure you want to remove all selected products?";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Args::parse();
    log::init_tracing(args.debug);

    let mut cfg = config::Config::resolve(args.config.as_deref())?;
    if let Some(e) = &args.endpoint { cfg.endpoint = e.clone(); }
    if args.timeout_secs.is_some() { cfg.timeout_secs = args.timeout_secs; }
    if let Some(c) = &args.catalog { cfg.catalog = c.clone(); }
    if let Some(s) = &args.storage { cfg.storage_path = s.clone(); }
    cfg.save_exchange |= args.save_exchange;

    let store: Box<dyn KeyValueStore> = if args.ephemeral {
        Box::new(MemoryStore::new())
    } else {
        Box::new(FileStore::new(&cfg.storage_path))
    };
    tracing::debug!(storage = %cfg.storage_path.display(), endpoint = %cfg.endpoint, "starting");

    let interactive = args.command.is_none();
    let view = Arc::new(ux::TerminalView { show_restore: interactive });
    let on_selection: Arc<dyn selection::SelectionObserver> = view.clone();
    let on_conversation: Arc<dyn conversation::ConversationObserver> = view;
    let observers = Observers {
        selection: vec![on_selection],
        conversation: vec![on_conversation],
    };
    let mut session = Session::new(SelectionStorage::new(store, cfg.storage_key.clone()), observers);
    if cfg.save_exchange {
        let exchanges = log::ExchangeLog::new(&cfg.artifacts_dir, Uuid::new_v4());
        tracing::info!(dir = %exchanges.dir().display(), "saving exchanges");
        session = session.with_exchange_log(exchanges);
    }

    let client = provider::make_client(&cfg)?;
    let mut input = ux::Input::stdin();

    match args.command {
        None => interactive_loop(&mut session, &cfg, client.as_ref(), &mut input).await,
        Some(cmd) => {
            let action = match cmd {
                Command::Categories => Action::Categories,
                Command::List { category } => Action::List(category),
                Command::Show { id } => Action::Show(id),
                Command::Select { id } => Action::Select(id),
                Command::Remove { id } => Action::Remove(id),
                Command::Selected => Action::Selected,
                Command::Clear { yes: true } => {
                    session.clear_all();
                    return Ok(());
                }
                Command::Clear { yes: false } => Action::Clear,
                Command::Generate => Action::Generate,
                Command::Ask { text } => Action::Ask(text.join(" ")),
            };
            run_action(action, &mut session, &cfg, client.as_ref(), &mut input).await?;
            Ok(())
        }
    }
}

async fn interactive_loop(
    session: &mut Session,
    cfg: &config::Config,
    client: &dyn CompletionClient,
    input: &mut ux::Input,
) -> anyhow::Result<()> {
    println!("{}", "Product routine picker".bold());
    println!("{}", "Type 'categories' to start, 'help' for commands.".dimmed());
    loop {
        print!("{} {} ", session.placeholder().dimmed(), ">".bold());
        io::stdout().flush().ok();

        // End of input and Ctrl-C both leave the loop.
        let Some(line) = input.next_line().await? else {
            println!();
            return Ok(());
        };
        let action = match repl::parse(&line) {
            Ok(a) => a,
            Err(usage) => {
                println!("{}", usage.yellow());
                continue;
            }
        };
        if !run_action(action, session, cfg, client, input).await? {
            return Ok(());
        }
    }
}

/// Executes one action. Returns `false` when the user asked to quit.
async fn run_action(
    action: Action,
    session: &mut Session,
    cfg: &config::Config,
    client: &dyn CompletionClient,
    input: &mut ux::Input,
) -> anyhow::Result<bool> {
    match action {
        Action::Nothing => {}
        Action::Quit => return Ok(false),
        Action::Help => println!("{}", repl::HELP),
        Action::Categories => {
            let catalog = load_catalog(cfg).await?;
            println!("{}", ux::render_categories(&catalog.categories()));
            println!("{}", format!("{} products", catalog.products().len()).dimmed());
        }
        Action::List(category) => {
            // Reloaded each time, like re-filtering the category dropdown.
            let catalog = load_catalog(cfg).await?;
            println!("{}", ux::render_products(&catalog.in_category(&category)));
        }
        Action::Show(id) => {
            let catalog = load_catalog(cfg).await?;
            match catalog.find(id) {
                Ok(p) => println!("{}", ux::render_details(p)),
                Err(e) => println!("{}", e.to_string().yellow()),
            }
        }
        Action::Select(id) => {
            let catalog = load_catalog(cfg).await?;
            match catalog.find(id) {
                Ok(p) => {
                    if !session.select(p.clone()) {
                        println!("{}", format!("{} is already selected.", p.name).dimmed());
                    }
                }
                Err(e) => println!("{}", e.to_string().yellow()),
            }
        }
        Action::Remove(id) => {
            if !session.remove(id) {
                println!("{}", format!("Product {id} is not in your selection.").dimmed());
            }
        }
        Action::Selected => {
            println!("{}", ux::render_selection(session.selection()));
            println!("{}", ux::render_actions(session.has_selection()));
        }
        Action::Clear => {
            if !session.has_selection() {
                println!("{}", "No products selected yet".dimmed());
            } else if ux::confirm(input, CLEAR_PROMPT).await {
                session.clear_all();
            }
        }
        Action::Transcript => {
            if session.history().is_empty() {
                println!("{}", "No conversation yet.".dimmed());
            } else {
                println!("{}", ux::render_transcript(session.history()));
            }
        }
        Action::Generate => generate(session, client).await,
        Action::Ask(text) => ask(session, client, &text).await,
    }
    Ok(true)
}

async fn load_catalog(cfg: &config::Config) -> anyhow::Result<Catalog> {
    Catalog::load(&cfg.catalog)
        .await
        .with_context(|| format!("loading catalog from {}", cfg.catalog))
}

async fn generate(session: &mut Session, client: &dyn CompletionClient) {
    let client = ux::Spinning::new(client, "Generating your personalized routine...");
    let outcome = tokio::select! {
        r = session.generate_routine(&client) => Some(r),
        _ = tokio::signal::ctrl_c() => None,
    };
    match outcome {
        None => println!("{}", "Cancelled.".dimmed()),
        Some(Ok(routine)) => println!("{}", ux::render_routine(&routine)),
        Some(Err(SessionError::Assemble(e))) => println!("{}", ux::assemble_hint(e)),
        Some(Err(SessionError::Superseded)) => {}
        Some(Err(e)) => {
            tracing::error!("Error generating routine: {e}");
            ux::print_error("Sorry, there was an error generating your routine. Please try again.", Some(e.to_string()));
        }
    }
}

async fn ask(session: &mut Session, client: &dyn CompletionClient, text: &str) {
    if !text.trim().is_empty() {
        println!("{} {}", "You:".bold(), text.trim());
    }
    let client = ux::Spinning::new(client, "Thinking...");
    let outcome = tokio::select! {
        r = session.ask(&client, text) => Some(r),
        _ = tokio::signal::ctrl_c() => None,
    };
    match outcome {
        None => println!("{}", "Cancelled.".dimmed()),
        Some(Ok(reply)) => println!("{}\n", ux::render_reply(&reply)),
        Some(Err(SessionError::Assemble(e))) => println!("{}", ux::assemble_hint(e).yellow()),
        Some(Err(SessionError::Superseded)) => {}
        Some(Err(e)) => {
            tracing::error!("Error sending chat message: {e}");
            ux::print_error("Sorry, I couldn't process your message. Please try again.", None);
        }
    }
}
