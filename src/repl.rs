//! Line-oriented interaction loop for `newsdash interactive`.
//!
//! Each input line is one user action. Actions that fetch are spawned so a
//! second click can be issued while the first request is still in flight,
//! exactly as in a browser. The screen is re-rendered whenever the view
//! state changes.
//!
//! | Input | Action |
//! |-------|--------|
//! | `search <phrase>` | submit a search (opens the groups panel) |
//! | `field <name>` | change the grouping attribute |
//! | `open <n or key>` | request the summary for a group |
//! | `all` | request the unscoped summary |
//! | `toggle <n>` | expand or collapse summary card `n` |
//! | `wait` | block until every in-flight request has settled |
//! | `show` | re-render the screen |
//! | `help` | list commands |
//! | `quit` | leave immediately |
//!
//! End of input waits for in-flight requests, prints the final screen and
//! returns.

use anyhow::Result;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::task::JoinSet;
use tracing::warn;

use crate::models::GroupField;
use crate::orchestrator::Orchestrator;
use crate::view::render;

const HELP: &str = "commands: search <phrase> | field <source|publishedAt|unknown> | open <n|key> | all | toggle <n> | wait | show | help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Search(String),
    Field(GroupField),
    Open(GroupRef),
    All,
    Toggle(usize),
    Wait,
    Show,
    Help,
    Quit,
}

/// A group named by its 1-based position in the list or by its key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupRef {
    Position(usize),
    Key(String),
}

pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((w, r)) => (w, r.trim()),
        None => (line, ""),
    };

    match word {
        "search" | "s" => {
            if rest.is_empty() {
                Err("usage: search <phrase>".to_string())
            } else {
                Ok(Command::Search(rest.to_string()))
            }
        }
        "field" | "f" => rest.parse().map(Command::Field),
        "open" | "o" => {
            if rest.is_empty() {
                return Err("usage: open <n|key>".to_string());
            }
            Ok(Command::Open(match rest.parse::<usize>() {
                Ok(n) if n > 0 => GroupRef::Position(n),
                _ => GroupRef::Key(rest.to_string()),
            }))
        }
        "all" => Ok(Command::All),
        "toggle" | "t" => match rest.parse::<usize>() {
            Ok(n) if n > 0 => Ok(Command::Toggle(n)),
            _ => Err("usage: toggle <n> (1-based card number)".to_string()),
        },
        "wait" => Ok(Command::Wait),
        "show" | "" => Ok(Command::Show),
        "help" | "?" => Ok(Command::Help),
        "quit" | "q" | "exit" => Ok(Command::Quit),
        other => Err(format!("unknown command '{}'. {}", other, HELP)),
    }
}

async fn print_screen<W: Write>(orch: &Orchestrator, out: &mut W) -> Result<()> {
    let state = orch.snapshot().await;
    writeln!(out, "{}", render(&state))?;
    out.flush()?;
    Ok(())
}

async fn drain(tasks: &mut JoinSet<()>) {
    while let Some(res) = tasks.join_next().await {
        if let Err(e) = res {
            warn!(error = %e, "fetch task failed");
        }
    }
}

/// Run the loop until `quit` or end of input.
pub async fn run<R, W>(orch: Orchestrator, input: R, out: &mut W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    let mut revisions = orch.subscribe();
    let mut tasks: JoinSet<()> = JoinSet::new();

    {
        let orch = orch.clone();
        tasks.spawn(async move {
            orch.start().await;
        });
    }
    print_screen(&orch, out).await?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    drain(&mut tasks).await;
                    print_screen(&orch, out).await?;
                    break;
                };
                let command = match parse_command(&line) {
                    Ok(c) => c,
                    Err(msg) => {
                        writeln!(out, "{}", msg)?;
                        continue;
                    }
                };
                match command {
                    Command::Quit => {
                        tasks.abort_all();
                        break;
                    }
                    Command::Help => writeln!(out, "{}", HELP)?,
                    Command::Show => print_screen(&orch, out).await?,
                    Command::Wait => {
                        drain(&mut tasks).await;
                        print_screen(&orch, out).await?;
                    }
                    Command::Toggle(n) => {
                        if orch.toggle_expansion(n - 1).await.is_none() {
                            writeln!(out, "no summary card {}", n)?;
                        }
                    }
                    Command::Search(query) => {
                        let orch = orch.clone();
                        tasks.spawn(async move {
                            orch.submit_search(&query).await;
                        });
                    }
                    Command::Field(field) => {
                        let orch = orch.clone();
                        tasks.spawn(async move {
                            orch.change_group_field(field).await;
                        });
                    }
                    Command::All => {
                        let orch = orch.clone();
                        tasks.spawn(async move {
                            orch.fetch_summary(None, None).await;
                        });
                    }
                    Command::Open(GroupRef::Key(key)) => {
                        let orch = orch.clone();
                        tasks.spawn(async move {
                            orch.select_group(&key).await;
                        });
                    }
                    Command::Open(GroupRef::Position(n)) => {
                        let key = orch
                            .snapshot()
                            .await
                            .groups()
                            .and_then(|g| g.nth(n - 1))
                            .map(|g| g.key.clone());
                        match key {
                            Some(key) => {
                                let orch = orch.clone();
                                tasks.spawn(async move {
                                    orch.select_group(&key).await;
                                });
                            }
                            None => writeln!(out, "no group at position {} (run `show` to list groups)", n)?,
                        }
                    }
                }
            }
            changed = revisions.changed() => {
                if changed.is_err() {
                    break;
                }
                print_screen(&orch, out).await?;
            }
            Some(res) = tasks.join_next(), if !tasks.is_empty() => {
                if let Err(e) = res {
                    warn!(error = %e, "fetch task failed");
                }
            }
        }
    }

    Ok(())
}
