use async_trait::async_trait;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::future::Future;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::conversation::{ConversationEvent, ConversationObserver, PLACEHOLDER_ACTIVE, PLACEHOLDER_FRESH};
use crate::errors::{AssembleError, CompletionError};
use crate::provider::CompletionClient;
use crate::selection::{SelectionChange, SelectionObserver};
use crate::wire::{ChatMessage, Product};

pub fn render_products(products: &[&Product]) -> String {
    if products.is_empty() {
        return "No products in this category.".dimmed().to_string();
    }
    products
        .iter()
        .map(|p| format!("  {:>4}  {}  {}", p.id.to_string().bold(), p.name, p.brand.dimmed()))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_categories(categories: &[String]) -> String {
    if categories.is_empty() {
        return "Catalog is empty.".dimmed().to_string();
    }
    categories.iter().map(|c| format!("  - {c}")).collect::<Vec<_>>().join("\n")
}

pub fn render_details(p: &Product) -> String {
    format!(
        "{} {}\n{}\n\n{}\n{}",
        p.name.bold(),
        format!("[{}]", p.id).dimmed(),
        p.brand,
        p.description,
        p.image.dimmed()
    )
}

pub fn render_selection(products: &[Product]) -> String {
    if products.is_empty() {
        return "No products selected yet".dimmed().to_string();
    }
    let mut out = format!("{}", "Selected products".bold());
    for p in products {
        out.push_str(&format!("\n  {:>4}  {}  {}", p.id, p.name, p.brand.dimmed()));
    }
    out
}

/// Which actions are offered; mirrors the generate/clear buttons.
pub fn render_actions(has_selection: bool) -> String {
    if has_selection {
        format!("{}  {}", "[generate]".green().bold(), "[clear]".red().bold())
    } else {
        "select products to generate a routine".dimmed().to_string()
    }
}

pub fn render_routine(routine: &str) -> String {
    format!("\n{}\n{}\n", "Your Personalized Routine".bold().magenta(), routine)
}

pub fn render_reply(reply: &str) -> String {
    format!("{} {}", "AI:".bold().cyan(), reply)
}

pub fn render_transcript(history: &[ChatMessage]) -> String {
    use crate::wire::Role;
    history
        .iter()
        .filter(|m| m.role != Role::System)
        .map(|m| match m.role {
            Role::User => format!("{} {}", "You:".bold(), m.content),
            _ => render_reply(&m.content),
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn print_error(headline: &str, detail: Option<String>) {
    eprintln!("{} {}", "Error:".red().bold(), headline);
    if let Some(d) = detail {
        eprintln!("{}", format!("Error: {d}").dimmed());
    }
}

/// What to tell the user when a request could not even be built.
pub fn assemble_hint(err: AssembleError) -> &'static str {
    match err {
        AssembleError::EmptySelection => "Please select some products first before generating a routine.",
        AssembleError::EmptyMessage => "Please type a question first.",
    }
}

/// Terminal lines from a detached reader thread. A pending read can be
/// abandoned on Ctrl-C and never holds the process open.
pub struct Input {
    lines: mpsc::Receiver<io::Result<String>>,
}

impl Input {
    pub fn stdin() -> Self {
        let (tx, rx) = mpsc::channel(1);
        thread::spawn(move || {
            for line in io::stdin().lines() {
                if tx.blocking_send(line).is_err() {
                    break;
                }
            }
        });
        Self::new(rx)
    }

    fn new(lines: mpsc::Receiver<io::Result<String>>) -> Self {
        Self { lines }
    }

    /// Next line, or `None` at end of input or on Ctrl-C.
    pub async fn next_line(&mut self) -> io::Result<Option<String>> {
        self.next_line_or(tokio::signal::ctrl_c()).await
    }

    async fn next_line_or<F: Future>(&mut self, interrupt: F) -> io::Result<Option<String>> {
        tokio::select! {
            line = self.lines.recv() => line.transpose(),
            _ = interrupt => Ok(None),
        }
    }
}

fn is_yes(answer: &str) -> bool {
    let ans = answer.trim().to_lowercase();
    ans == "y" || ans == "yes"
}

pub async fn confirm(input: &mut Input, prompt: &str) -> bool {
    print!("{} [y/N]: ", prompt);
    let _ = io::stdout().flush();
    match input.next_line().await {
        Ok(Some(s)) => is_yes(&s),
        _ => false,
    }
}

/// The "thinking" placeholder. Cleared on drop so every exit path removes it.
pub struct Thinking {
    bar: ProgressBar,
}

impl Thinking {
    pub fn start(msg: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            bar.set_style(style);
        }
        bar.set_message(msg.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }
}

impl Drop for Thinking {
    fn drop(&mut self) {
        self.bar.finish_and_clear();
    }
}

/// Shows a [`Thinking`] spinner for exactly as long as the wrapped request
/// runs. The spinner is gone before the session records the reply.
pub struct Spinning<'a> {
    inner: &'a dyn CompletionClient,
    message: &'static str,
    busy: AtomicBool,
}

impl<'a> Spinning<'a> {
    pub fn new(inner: &'a dyn CompletionClient, message: &'static str) -> Self {
        Self { inner, message, busy: AtomicBool::new(false) }
    }
}

#[async_trait]
impl<'a> CompletionClient for Spinning<'a> {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, CompletionError> {
        let _thinking = Thinking::start(self.message);
        self.busy.store(true, Ordering::SeqCst);
        let outcome = self.inner.complete(messages).await;
        self.busy.store(false, Ordering::SeqCst);
        outcome
    }
}

/// Redraws on store notifications.
pub struct TerminalView {
    pub show_restore: bool,
}

impl TerminalView {
    fn render_change(&self, change: SelectionChange, products: &[Product]) -> Option<String> {
        let headline = match change {
            SelectionChange::Restored if !self.show_restore || products.is_empty() => return None,
            SelectionChange::Removed { found: false, .. } => return None,
            SelectionChange::Added(id) => products
                .iter()
                .find(|p| p.id == id)
                .map(|p| format!("{} {}\n", "Added".green(), p.name)),
            SelectionChange::Removed { id, .. } => Some(format!("{} product {id}\n", "Removed".red())),
            SelectionChange::Cleared | SelectionChange::Restored => None,
        };
        Some(format!(
            "{}{}\n{}",
            headline.unwrap_or_default(),
            render_selection(products),
            render_actions(!products.is_empty())
        ))
    }
}

impl SelectionObserver for TerminalView {
    fn selection_changed(&self, change: SelectionChange, products: &[Product]) {
        if let Some(out) = self.render_change(change, products) {
            println!("{out}");
        }
    }
}

impl ConversationObserver for TerminalView {
    fn conversation_changed(&self, event: ConversationEvent, _history: &[ChatMessage]) {
        match event {
            ConversationEvent::RoutineGenerated => println!("{}", PLACEHOLDER_ACTIVE.dimmed()),
            ConversationEvent::Reset => println!("{}", PLACEHOLDER_FRESH.dimmed()),
            ConversationEvent::ReplyAppended => {}
        }
    }
}
