//! Rep commands: /todos and /done.

use super::format::{html_escape, table, tg_href, wrap, Cell};
use super::{split_args, NOT_A_NUMBER};
use machma_core::{
    error::MachmaError,
    message::{Reply, Sender},
};
use machma_store::Scope;

/// Exercise names wider than this wrap inside the todo table.
const EXERCISE_COLUMN_WIDTH: usize = 12;

/// `/todos`: the sender's todo and done reps for every exercise.
pub(super) async fn handle_todos(
    sender: &Sender,
    scope: &mut Scope,
) -> Result<Vec<Reply>, MachmaError> {
    scope.ensure_user(sender).await?;

    let todos = scope.get_user_todo_reps(sender.id).await?;
    let dones = scope.get_user_reps(sender.id).await?;

    let rows: Vec<Vec<Cell>> = todos
        .iter()
        .map(|(exercise, todo)| {
            vec![
                Cell::text(wrap(exercise, EXERCISE_COLUMN_WIDTH)),
                Cell::number(*todo),
                Cell::number(dones.get(exercise).copied().unwrap_or(0)),
            ]
        })
        .collect();

    let header = format!(
        "<b>Todos für {}</b>\n\n",
        tg_href(sender.id, &sender.first_name)
    );
    let body = html_escape(&table(&["Übung", "Todo", "Done"], &rows));
    Ok(vec![Reply::html(format!("{header}<pre>{body}</pre>"))])
}

/// `/done [count] [exercise-or-alias]`
///
/// Announces the reps that went beyond the sender's todo, i.e. the reps
/// everybody else now has to catch up on.
pub(super) async fn handle_done(
    args: &str,
    sender: &Sender,
    scope: &mut Scope,
) -> Result<Vec<Reply>, MachmaError> {
    let words = match split_args(args, 2, 2) {
        Ok(words) => words,
        Err(reply) => return Ok(vec![reply]),
    };
    let (count, target) = (words[0], words[1]);

    let exercise = scope.get_exercise_by_alias(target).await?;
    let Ok(reps) = count.parse::<u32>() else {
        return Ok(vec![Reply::plain(NOT_A_NUMBER)]);
    };

    scope.ensure_user(sender).await?;

    let Some(exercise) = exercise else {
        return Ok(vec![Reply::plain(format!(
            "Die Übung {target} existiert nicht."
        ))]);
    };

    let todo = scope
        .get_user_todo_reps_for_exercise(sender.id, &exercise)
        .await?;
    scope.add_to_user_reps(sender.id, &exercise, reps).await?;

    let reps = i64::from(reps);
    if reps > todo {
        Ok(vec![Reply::html(format!(
            "{} weitere {} von {}.",
            reps - todo,
            html_escape(&exercise),
            tg_href(sender.id, &sender.first_name)
        ))])
    } else {
        Ok(Vec::new())
    }
}
