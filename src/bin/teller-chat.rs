//! Interactive text chat with the banking agent.
//!
//! This binary provides a REPL that sends each line to the backend's chat
//! endpoint and prints the agent's reply.
//!
//! # Usage
//!
//! ```bash
//! # Chat as the default verified customer against http://localhost:8000
//! teller-chat
//!
//! # Chat as an unverified guest against the local-model agent
//! teller-chat --customer guest --local
//!
//! # Point at another backend
//! teller-chat --api-url http://agent.internal:9000
//! ```
//!
//! # Commands
//!
//! While chatting, you can use slash commands:
//! - `/help` - Show available commands
//! - `/reset` - Reset the call
//! - `/customer [id]` - Switch or show the simulated customer
//! - `/customers` - List the simulated customers
//! - `/thread` - Show the current thread reference
//! - `/route hosted|local` - Choose the hosted or local agent
//! - `/ping` - Check the backend
//! - `/stats` - Show session statistics
//! - `/quit` - Exit the application
//!
//! Ctrl+C while the agent is typing stops waiting; the reply is added to the
//! transcript when it arrives.

use std::sync::Arc;

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::Notify;
use tracing_subscriber::EnvFilter;

use teller::chat::{
    ChatArgs, ChatCommand, ChatConfig, ChatSession, InFlightTurn, PlainTextRenderer, Renderer,
    TurnOutcome, help_text, parse_command,
};
use teller::{AgentClient, CustomerId, KNOWN_CUSTOMERS};

/// Main entry point for the teller-chat application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let (args, _) = ChatArgs::from_command_line_relaxed("teller-chat [OPTIONS]");
    let config = ChatConfig::from(args);
    let use_color = config.use_color;

    let client = AgentClient::with_options(config.api_url.clone(), config.timeout)?;
    let mut session = ChatSession::new(client, config);
    let mut renderer = PlainTextRenderer::with_color(use_color);
    let mut rl = DefaultEditor::new()?;

    // Ctrl+C at the prompt is handled by rustyline; this catches it mid-turn.
    // Only a wait in progress is woken, so a stray press never cancels the next turn.
    let interrupt = Arc::new(Notify::new());
    let interrupt_clone = interrupt.clone();
    ctrlc::set_handler(move || {
        interrupt_clone.notify_waiters();
    })?;
    let mut in_flight: Vec<InFlightTurn> = Vec::new();

    println!(
        "Banking Agent Chat ({} at {})",
        session.customer(),
        session.client().base_url()
    );
    println!("Type /help for commands, /quit to exit\n");

    loop {
        for outcome in session.settle_turns(&mut in_flight) {
            print_outcome(&mut renderer, &outcome);
        }

        match rl.readline("You: ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                if let Some(cmd) = parse_command(line) {
                    match cmd {
                        ChatCommand::Quit => {
                            println!("Goodbye!");
                            break;
                        }
                        ChatCommand::Reset => {
                            session.reset();
                            renderer.print_info("Call reset. Starting a new conversation.");
                        }
                        ChatCommand::Help => {
                            for line in help_text().lines() {
                                println!("    {}", line);
                            }
                        }
                        ChatCommand::Customer(None) => {
                            renderer.print_info(&format!("Customer: {}", session.customer()));
                        }
                        ChatCommand::Customer(Some(id)) => {
                            let customer = CustomerId::from(id);
                            if customer.label().is_none() {
                                renderer.print_error(&format!(
                                    "{} is not a known customer; the backend will treat it as unverified",
                                    customer.as_str()
                                ));
                            }
                            session.set_customer(customer);
                            renderer.print_info(&format!(
                                "Now chatting as {}",
                                session.customer()
                            ));
                        }
                        ChatCommand::Customers => {
                            print_customers(session.customer());
                        }
                        ChatCommand::Thread => match session.thread() {
                            Some(thread) => renderer.print_info(&format!("Thread: {thread}")),
                            None => renderer.print_info("Thread: (new conversation)"),
                        },
                        ChatCommand::Route(route) => {
                            session.set_route(route);
                            renderer.print_info(&format!("Route set to /{}", route.path()));
                        }
                        ChatCommand::Ping => {
                            let health = tokio::select! {
                                health = session.client().health() => Some(health),
                                _ = interrupt.notified() => None,
                            };
                            match health {
                                Some(Ok(message)) => {
                                    renderer.print_info(&format!("Backend: {message}"))
                                }
                                Some(Err(err)) => {
                                    renderer.print_error(&format!("Backend unreachable: {err}"))
                                }
                                None => renderer.print_info("\nPing cancelled."),
                            }
                        }
                        ChatCommand::Stats => {
                            print_stats(&session);
                        }
                        ChatCommand::Invalid(message) => {
                            renderer.print_error(&message);
                        }
                    }
                    continue;
                }

                let Some(mut turn) = session.spawn_turn(line) else {
                    continue;
                };
                if let Some(entry) = session.transcript().last() {
                    renderer.print_message(entry);
                }
                renderer.print_pending(session.pending());

                let reply = tokio::select! {
                    reply = turn.reply() => Some(reply),
                    _ = interrupt.notified() => None,
                };
                match reply {
                    Some(reply) => {
                        let outcome = session.complete_turn(turn.into_pending(), reply);
                        print_outcome(&mut renderer, &outcome);
                    }
                    None => {
                        println!();
                        renderer.print_info(
                            "Stopped waiting; the reply will be shown when it arrives.",
                        );
                        in_flight.push(turn);
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                renderer.print_error(&format!("Input error: {}", err));
                break;
            }
        }
    }

    Ok(())
}

fn print_outcome(renderer: &mut dyn Renderer, outcome: &TurnOutcome) {
    match outcome {
        TurnOutcome::Replied(message) | TurnOutcome::Fallback(message) => {
            renderer.print_message(message)
        }
        TurnOutcome::Discarded => {}
    }
}

fn print_customers(current: &CustomerId) {
    println!("    Simulated customers:");
    for (id, label) in KNOWN_CUSTOMERS {
        let marker = if *id == current.as_str() { "*" } else { " " };
        println!("     {marker} {id:<10} {label}");
    }
}

fn print_stats(session: &ChatSession) {
    let stats = session.stats();
    println!("    Session Statistics:");
    println!("      Customer: {}", stats.customer);
    println!("      Route: /{}", stats.route.path());
    match stats.thread {
        Some(ref thread) => println!("      Thread: {}", thread),
        None => println!("      Thread: (new conversation)"),
    }
    println!("      Messages: {}", stats.message_count);
    println!("      Pending: {}", stats.pending);
    println!(
        "      Turns: {} sent / {} answered / {} failed",
        stats.turns_sent, stats.replies, stats.fallbacks
    );
}
