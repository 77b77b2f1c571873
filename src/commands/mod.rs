//! Bot commands. Every command runs inside one store scope.

mod exercises;
pub mod format;
mod help;
mod reps;

#[cfg(test)]
mod tests;

use machma_core::{error::MachmaError, message::Reply, message::Sender};
use machma_store::Scope;

pub(crate) const TOO_FEW_ARGS: &str = "Zu wenig Argumente, du Otto.";
pub(crate) const TOO_MANY_ARGS: &str = "Zu viele Argumente, du Otto.";
pub(crate) const NOT_A_NUMBER: &str = "Ne Zahl! Ist das so schwer?";
pub(crate) const SOMETHING_WENT_WRONG: &str = "Da ist was schiefgegangen. Versuch's nochmal.";

/// Known bot commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Help,
    AddExercise,
    AddAlias,
    Todos,
    Done,
    Exercises,
}

impl Command {
    /// Parse a command from message text. Returns `None` for plain text,
    /// unknown `/` prefixes and commands addressed to another bot.
    ///
    /// `bot_name` is this bot's username; a `/cmd@name` mention is only
    /// accepted when it matches. Command words are case-insensitive.
    pub fn parse(text: &str, bot_name: Option<&str>) -> Option<Self> {
        let first = text.split_whitespace().next()?;
        let cmd = match first.split_once('@') {
            Some((cmd, mention)) => match bot_name {
                Some(name) if name.eq_ignore_ascii_case(mention) => cmd,
                _ => return None,
            },
            None => first,
        };
        match cmd.to_lowercase().as_str() {
            "/help" | "/hilfe" | "/commands" | "/befehle" => Some(Self::Help),
            "/exercise" | "/übung" => Some(Self::AddExercise),
            "/alias" => Some(Self::AddAlias),
            "/todo" | "/todos" | "/zutun" => Some(Self::Todos),
            "/machma" | "/getan" | "/done" => Some(Self::Done),
            "/exercises" | "/übungen" => Some(Self::Exercises),
            _ => None,
        }
    }
}

/// Everything after the command word.
pub fn args(text: &str) -> &str {
    let text = text.trim_start();
    match text.find(char::is_whitespace) {
        Some(i) => text[i..].trim(),
        None => "",
    }
}

/// Split `args` into exactly `min..=max` words, or the reply explaining why not.
pub(crate) fn split_args(args: &str, min: usize, max: usize) -> Result<Vec<&str>, Reply> {
    let words: Vec<&str> = args.split_whitespace().collect();
    if words.len() < min {
        Err(Reply::plain(TOO_FEW_ARGS))
    } else if words.len() > max {
        Err(Reply::plain(TOO_MANY_ARGS))
    } else {
        Ok(words)
    }
}

/// Handle a command and return the replies to send, in order.
pub async fn handle(
    cmd: Command,
    args: &str,
    sender: &Sender,
    scope: &mut Scope,
) -> Result<Vec<Reply>, MachmaError> {
    match cmd {
        Command::Help => Ok(vec![help::handle_help()]),
        Command::AddExercise => exercises::handle_add_exercise(args, scope).await,
        Command::AddAlias => exercises::handle_add_alias(args, scope).await,
        Command::Todos => reps::handle_todos(sender, scope).await,
        Command::Done => reps::handle_done(args, sender, scope).await,
        Command::Exercises => exercises::handle_exercises(scope).await,
    }
}

/// Short reply for an error that escaped a command.
pub fn error_reply(err: &MachmaError) -> Reply {
    match err {
        MachmaError::ExerciseDoesNotExist { exercise, .. } => {
            Reply::plain(format!("Die Übung {exercise} existiert nicht."))
        }
        _ => Reply::plain(SOMETHING_WENT_WRONG),
    }
}
