use anyhow::Result;
use colored::Colorize;
use futures::StreamExt;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use cortexchat_agent::StreamingSession;

use crate::app::render::{ChunkPrinter, Reply};
use crate::cli::Cli;

pub const GREETING: &str = "Hi there! I'm Paige from Bookly. \
    I can help you with order status, returns, shipping questions, and more. \
    How can I help you today?";

pub const SAMPLE_QUERIES: [&str; 4] = [
    "Where's my order ORD-1042?",
    "I want to return a book",
    "What's your shipping policy?",
    "I need help with my account",
];

/// A line typed at the prompt
#[derive(Debug, PartialEq, Eq)]
pub enum Input {
    Exit,
    Samples,
    History,
    Empty,
    Message(String),
}

/// Interpret one prompt line; `/1`..`/4` pick a sample query
pub fn parse_input(line: &str) -> Input {
    let trimmed = line.trim();
    match trimmed {
        "" => Input::Empty,
        "exit" | "quit" => Input::Exit,
        "/samples" => Input::Samples,
        "/history" => Input::History,
        _ => {
            if let Some(index) = trimmed.strip_prefix('/').and_then(|n| n.parse::<usize>().ok()) {
                if let Some(query) = index.checked_sub(1).and_then(|i| SAMPLE_QUERIES.get(i)) {
                    return Input::Message(query.to_string());
                }
            }
            Input::Message(trimmed.to_string())
        }
    }
}

fn print_samples() {
    println!("{}", "Try one of these (type /1 - /4):".bright_black());
    for (i, query) in SAMPLE_QUERIES.iter().enumerate() {
        println!("  {} {}", format!("/{}", i + 1).bright_cyan(), query);
    }
    println!();
}

/// Send one message and stream the reply to the terminal.
///
/// Returns the final text shown to the user. Ctrl-C while streaming drops the
/// stream, which closes the connection.
pub async fn send_and_render(session: &mut StreamingSession, text: &str, show_thinking: bool, verbose: bool) -> String {
    let mut reply = Reply::new();
    let mut printer = ChunkPrinter::new(show_thinking, verbose);

    print!("{} ", "📖".bright_cyan());

    match session.send(text).await {
        Ok(mut chunks) => loop {
            tokio::select! {
                item = chunks.next() => match item {
                    Some(Ok(chunk)) => {
                        reply.absorb(&chunk);
                        printer.print(&chunk);
                    }
                    Some(Err(e)) => {
                        reply.fail(e.user_message());
                        break;
                    }
                    None => break,
                },
                _ = tokio::signal::ctrl_c() => {
                    reply.fail("Interrupted.");
                    break;
                }
            }
        },
        Err(e) => reply.fail(e.user_message()),
    }

    printer.break_line();
    let final_text = reply.final_text();
    if reply.needs_replacement() {
        println!("{}", final_text.red());
    }
    println!();

    if verbose {
        if !reply.tools().is_empty() {
            println!("{}", format!("Tools used: {}", reply.tools().join(", ")).bright_black());
        }
        if !reply.completed() {
            println!("{}", "⚠️  No final message received; this turn was not added to the history".yellow());
        }
    }

    final_text
}

/// Send `--query` once and exit
pub async fn run_query_mode(cli: &Cli, mut session: StreamingSession, query: &str) -> Result<()> {
    send_and_render(&mut session, query, cli.show_thinking, cli.verbose).await;
    Ok(())
}

/// Run interactive REPL mode
pub async fn run_repl_mode(cli: &Cli, mut session: StreamingSession) -> Result<()> {
    println!("{}", "📚 Bookly Support".bright_cyan().bold());
    println!("{}", format!("Agent endpoint: {}", session.endpoint()).bright_black());
    println!("{}", "Type 'exit' or 'quit' to exit, '/samples' for example questions\n".bright_black());

    println!("{} {}\n", "📖".bright_cyan(), GREETING);
    print_samples();

    let mut rl = DefaultEditor::new()?;

    loop {
        let readline = rl.readline(&format!("{} ", "You:".bright_green().bold()));
        let line = match readline {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                println!("{}", "Goodbye!".bright_cyan());
                break;
            }
            Err(e) => {
                eprintln!("{} {}", "Input error:".red(), e);
                break;
            }
        };

        match parse_input(&line) {
            Input::Empty => continue,
            Input::Exit => {
                println!("{}", "Goodbye!".bright_cyan());
                break;
            }
            Input::Samples => print_samples(),
            Input::History => {
                let turns = session.conversation().len();
                println!("{}", format!("{} messages in this conversation\n", turns).bright_black());
            }
            Input::Message(text) => {
                let _ = rl.add_history_entry(text.as_str());
                send_and_render(&mut session, &text, cli.show_thinking, cli.verbose).await;
            }
        }
    }

    Ok(())
}
