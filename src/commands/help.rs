//! /help

use super::format::html_escape;
use machma_core::message::Reply;

const HELP_ENTRIES: &[(&str, &str)] = &[
    ("/help", "Diese Hilfe"),
    ("/exercise [name] [link]?", "Neue Übung mit optionalem Link"),
    ("/alias [alias] [übung]", "Alias für eine Übung"),
    ("/todos", "Deine Todos"),
    ("/done [zahl] [übung]", "Wiederholungen anrechnen"),
    ("/exercises", "Übungsübersicht"),
];

pub(super) fn handle_help() -> Reply {
    let mut text = String::from("<b>Hilfe</b>");
    for (command, description) in HELP_ENTRIES {
        text.push_str(&format!(
            "\n\n{}\n{}",
            html_escape(command),
            html_escape(description)
        ));
    }
    Reply::html(text)
}
