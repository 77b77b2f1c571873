//! Exercise and alias commands: /exercise, /alias, /exercises.

use super::format::html_escape;
use super::split_args;
use machma_core::{error::MachmaError, message::Reply};
use machma_store::Scope;
use tracing::info;

/// `/exercise [name] [link]?`
pub(super) async fn handle_add_exercise(
    args: &str,
    scope: &mut Scope,
) -> Result<Vec<Reply>, MachmaError> {
    let words = match split_args(args, 1, 2) {
        Ok(words) => words,
        Err(reply) => return Ok(vec![reply]),
    };
    let exercise = words[0];
    let link = words.get(1).copied();

    if scope.has_exercise(exercise).await? {
        return Ok(vec![Reply::plain(format!(
            "Die Übung {exercise} gibt es bereits."
        ))]);
    }

    scope.add_exercise(exercise, link).await?;
    info!("new exercise {exercise:?}");
    Ok(vec![Reply::plain(format!(
        "Ich kenne jetzt die Übung {exercise}."
    ))])
}

/// `/alias [alias] [exercise-or-alias]`
pub(super) async fn handle_add_alias(
    args: &str,
    scope: &mut Scope,
) -> Result<Vec<Reply>, MachmaError> {
    let words = match split_args(args, 2, 2) {
        Ok(words) => words,
        Err(reply) => return Ok(vec![reply]),
    };
    let (alias, target) = (words[0], words[1]);

    if scope.has_alias(alias).await? {
        return Ok(vec![Reply::plain(format!(
            "Der Alias {alias} existiert bereits."
        ))]);
    }
    let Some(exercise) = scope.get_exercise_by_alias(target).await? else {
        return Ok(vec![Reply::plain(format!(
            "Die Übung {target} existiert nicht."
        ))]);
    };

    scope.add_alias(alias, &exercise).await?;
    Ok(vec![Reply::plain(format!(
        "{alias} oder {target}? Alles das gleiche!"
    ))])
}

/// `/exercises`: every exercise, linked where a link is known.
pub(super) async fn handle_exercises(scope: &mut Scope) -> Result<Vec<Reply>, MachmaError> {
    let exercises = scope.get_exercises().await?;
    if exercises.is_empty() {
        return Ok(vec![Reply::plain("Noch keine Übungen.")]);
    }

    let mut text = String::from("<b>Übungen</b>");
    for exercise in &exercises {
        let name = html_escape(&exercise.exercise_name);
        text.push('\n');
        match &exercise.exercise_link {
            Some(link) => text.push_str(&format!("<a href=\"{}\">{name}</a>", html_escape(link))),
            None => text.push_str(&name),
        }
    }
    Ok(vec![Reply::html(text).without_preview()])
}
