//! Line-oriented console: the headless key source and macro editor.
//!
//! Each input line is one command:
//!
//! | Command                              | Effect                                  |
//! |--------------------------------------|-----------------------------------------|
//! | `press <hotkey>`                     | records a press of every key in hotkey  |
//! | `add <hotkey> <a1>, <a2>, ...`       | adds a macro                            |
//! | `edit <old> <new> <a1>, <a2>, ...`   | replaces a macro, possibly renaming it  |
//! | `delete <hotkey>`                    | removes a macro                         |
//! | `list`                               | prints the macro table                  |
//! | `help`                               | prints this summary                     |
//! | `quit`                               | closes the session                      |
//!
//! Action lists use the prefixed text form (`TEXT:Hello, KEYS:ctrl_l+c`).
//! Mutations go through the registry, so they are logged for replication
//! and seen by every observer.

use macrolink_core::{
    Action, ActionError, Hotkey, HotkeyError, HotkeyTrigger, MacroRegistry, RegistryError,
    SessionHandle,
};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

const HELP: &str = "commands: press <hotkey> | add <hotkey> <actions> | \
edit <old> <new> <actions> | delete <hotkey> | list | help | quit";

/// Errors produced while parsing or executing a console line.
#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("unknown command {0:?}; type `help`")]
    UnknownCommand(String),

    #[error("`{command}` needs a {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },

    #[error(transparent)]
    Hotkey(#[from] HotkeyError),

    #[error(transparent)]
    Action(#[from] ActionError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// One parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Press(Hotkey),
    Add {
        hotkey: Hotkey,
        actions: Vec<Action>,
    },
    Edit {
        old: Hotkey,
        new: Hotkey,
        actions: Vec<Action>,
    },
    Delete(Hotkey),
    List,
    Help,
    Quit,
}

impl ConsoleCommand {
    /// Parses one line.  Returns `Ok(None)` for a blank line.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError`] for unknown commands, missing arguments, or
    /// unparsable hotkeys and actions.
    pub fn parse(line: &str) -> Result<Option<Self>, ConsoleError> {
        let (word, rest) = split_word(line);
        let command = match word.to_ascii_lowercase().as_str() {
            "" => return Ok(None),
            "press" => ConsoleCommand::Press(required_hotkey("press", rest)?.0),
            "add" => {
                let (hotkey, rest) = required_hotkey("add", rest)?;
                ConsoleCommand::Add {
                    hotkey,
                    actions: required_actions("add", rest)?,
                }
            }
            "edit" => {
                let (old, rest) = required_hotkey("edit", rest)?;
                let (new, rest) = required_hotkey("edit", rest)?;
                ConsoleCommand::Edit {
                    old,
                    new,
                    actions: required_actions("edit", rest)?,
                }
            }
            "delete" => ConsoleCommand::Delete(required_hotkey("delete", rest)?.0),
            "list" => ConsoleCommand::List,
            "help" => ConsoleCommand::Help,
            "quit" | "exit" => ConsoleCommand::Quit,
            other => return Err(ConsoleError::UnknownCommand(other.to_string())),
        };
        Ok(Some(command))
    }
}

/// Splits off the first whitespace-delimited word.
fn split_word(line: &str) -> (&str, &str) {
    let line = line.trim_start();
    match line.find(char::is_whitespace) {
        Some(i) => (&line[..i], line[i..].trim_start()),
        None => (line, ""),
    }
}

fn required_hotkey<'a>(
    command: &'static str,
    rest: &'a str,
) -> Result<(Hotkey, &'a str), ConsoleError> {
    let (word, rest) = split_word(rest);
    if word.is_empty() {
        return Err(ConsoleError::MissingArgument {
            command,
            argument: "hotkey",
        });
    }
    Ok((Hotkey::parse(word)?, rest))
}

fn required_actions(command: &'static str, rest: &str) -> Result<Vec<Action>, ConsoleError> {
    if rest.trim().is_empty() {
        return Err(ConsoleError::MissingArgument {
            command,
            argument: "action list",
        });
    }
    Ok(Action::parse_list(rest)?)
}

/// Runs one command and returns the text to print.
///
/// `Quit` is not handled here; the caller owns the session handle.
///
/// # Errors
///
/// Propagates [`RegistryError`]s from mutations.
pub fn execute(
    command: ConsoleCommand,
    registry: &MacroRegistry,
    trigger: &HotkeyTrigger,
) -> Result<String, ConsoleError> {
    let reply = match command {
        ConsoleCommand::Press(hotkey) => {
            for key in hotkey.keys() {
                trigger.on_key_press(key);
            }
            debug!(%hotkey, "keys pressed from console");
            format!("pressed {hotkey}")
        }
        ConsoleCommand::Add { hotkey, actions } => {
            registry.add(hotkey.clone(), actions)?;
            format!("added {hotkey}")
        }
        ConsoleCommand::Edit { old, new, actions } => {
            registry.edit(old.clone(), new.clone(), actions)?;
            format!("edited {old} -> {new}")
        }
        ConsoleCommand::Delete(hotkey) => {
            registry.delete(hotkey.clone())?;
            format!("deleted {hotkey}")
        }
        ConsoleCommand::List => format_table(registry),
        ConsoleCommand::Help | ConsoleCommand::Quit => HELP.to_string(),
    };
    Ok(reply)
}

fn format_table(registry: &MacroRegistry) -> String {
    let macros = registry.list();
    if macros.is_empty() {
        return "no macros".to_string();
    }
    macros
        .iter()
        .map(|m| {
            let actions: Vec<String> = m.actions.iter().map(ToString::to_string).collect();
            format!("{} => {}", m.hotkey, actions.join(", "))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Reads commands from `reader` until `quit` or end of input, writing
/// replies and errors to `writer`.
///
/// `quit` closes the session through `handle`; end of input does not.
///
/// # Errors
///
/// Returns I/O errors from reading or writing.
pub async fn run_console<R, W>(
    reader: R,
    mut writer: W,
    registry: &MacroRegistry,
    trigger: &HotkeyTrigger,
    handle: &SessionHandle,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        let reply = match ConsoleCommand::parse(&line) {
            Ok(None) => continue,
            Ok(Some(ConsoleCommand::Quit)) => {
                info!("quit requested from console");
                handle.close();
                writer.write_all(b"closing session\n").await?;
                writer.flush().await?;
                return Ok(());
            }
            Ok(Some(command)) => match execute(command, registry, trigger) {
                Ok(reply) => reply,
                Err(e) => format!("error: {e}"),
            },
            Err(e) => format!("error: {e}"),
        };
        writer.write_all(reply.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }
    debug!("console input closed");
    Ok(())
}
