use super::*;
use machma_core::{config::StoreConfig, message::ParseMode};
use machma_store::Store;

/// An in-memory store with the demo data, and an open scope on it.
async fn test_scope() -> (Store, Scope) {
    let store = Store::new(&StoreConfig::in_memory()).await.unwrap();
    let mut scope = store.begin().await.unwrap();
    scope.seed_demo_data().await.unwrap();
    (store, scope)
}

fn sender(id: i64, first_name: &str) -> Sender {
    Sender {
        id,
        first_name: first_name.to_string(),
        username: None,
        last_name: None,
    }
}

const BOT: Option<&str> = Some("machma_bot");

fn parse(text: &str) -> Option<Command> {
    Command::parse(text, BOT)
}

async fn run(text: &str, from: &Sender, scope: &mut Scope) -> Vec<Reply> {
    let cmd = parse(text).unwrap();
    handle(cmd, args(text), from, scope).await.unwrap()
}

fn texts(replies: &[Reply]) -> Vec<&str> {
    replies.iter().map(|r| r.text.as_str()).collect()
}

#[test]
fn test_parse_all_commands() {
    for text in ["/help", "/hilfe", "/commands", "/befehle"] {
        assert_eq!(parse(text), Some(Command::Help), "{text}");
    }
    for text in ["/exercise Dips", "/übung Dips"] {
        assert_eq!(parse(text), Some(Command::AddExercise), "{text}");
    }
    assert_eq!(parse("/alias a b"), Some(Command::AddAlias));
    for text in ["/todo", "/todos", "/zutun"] {
        assert_eq!(parse(text), Some(Command::Todos), "{text}");
    }
    for text in ["/machma 5 Dips", "/getan 5 Dips", "/done 5 Dips"] {
        assert_eq!(parse(text), Some(Command::Done), "{text}");
    }
    for text in ["/exercises", "/übungen"] {
        assert_eq!(parse(text), Some(Command::Exercises), "{text}");
    }
}

#[test]
fn test_parse_accepts_own_bot_name() {
    assert_eq!(parse("/done@machma_bot 5 Dips"), Some(Command::Done));
    assert_eq!(parse("/todos@Machma_Bot"), Some(Command::Todos));
}

#[test]
fn test_parse_rejects_other_bot_name() {
    assert_eq!(parse("/done@some_other_bot 5 Dips"), None);
    assert_eq!(parse("/todos@"), None);
    // Without a known name no mention can be ours.
    assert_eq!(Command::parse("/done@machma_bot 5 Dips", None), None);
    assert_eq!(Command::parse("/done 5 Dips", None), Some(Command::Done));
}

#[test]
fn test_parse_is_case_insensitive() {
    assert_eq!(parse("/Done 5 Dips"), Some(Command::Done));
    assert_eq!(parse("/TODOS"), Some(Command::Todos));
    assert_eq!(parse("/Übung Dips"), Some(Command::AddExercise));
    assert_eq!(parse("/HILFE@machma_bot"), Some(Command::Help));
}

#[test]
fn test_parse_ignores_non_commands() {
    assert_eq!(parse("hello"), None);
    assert_eq!(parse(""), None);
    assert_eq!(parse("/unknown"), None);
    assert_eq!(parse("done 5 Dips"), None);
}

#[test]
fn test_args() {
    assert_eq!(args("/done 10 Dips"), "10 Dips");
    assert_eq!(args("/done@machma_bot   10   Dips  "), "10   Dips");
    assert_eq!(args("/todos"), "");
}

#[test]
fn test_split_args_bounds() {
    assert_eq!(split_args("a b", 2, 2).unwrap(), vec!["a", "b"]);
    assert_eq!(split_args("a", 2, 2).unwrap_err().text, TOO_FEW_ARGS);
    assert_eq!(split_args("a b c", 1, 2).unwrap_err().text, TOO_MANY_ARGS);
    assert_eq!(split_args("", 1, 2).unwrap_err().text, TOO_FEW_ARGS);
}

#[test]
fn test_error_reply() {
    let reply = error_reply(&MachmaError::exercise_does_not_exist("Badoof"));
    assert_eq!(reply.text, "Die Übung Badoof existiert nicht.");
    let reply = error_reply(&MachmaError::Store("boom".into()));
    assert_eq!(reply.text, SOMETHING_WENT_WRONG);
}

#[tokio::test]
async fn test_help() {
    let (_store, mut scope) = test_scope().await;
    let replies = run("/hilfe", &sender(1, "Eve"), &mut scope).await;
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].parse_mode, ParseMode::Html);
    assert!(replies[0].text.starts_with("<b>Hilfe</b>\n\n/help\nDiese Hilfe"));
    assert!(replies[0].text.contains("/done [zahl] [übung]\nWiederholungen anrechnen"));
}

#[tokio::test]
async fn test_add_exercise() {
    let (_store, mut scope) = test_scope().await;
    let eve = sender(1, "Eve");

    let replies = run("/exercise Pushups https://pushups.example", &eve, &mut scope).await;
    assert_eq!(texts(&replies), vec!["Ich kenne jetzt die Übung Pushups."]);
    assert!(scope.has_exercise("Pushups").await.unwrap());
    assert!(scope.has_alias("Pushups").await.unwrap());

    let replies = run("/übung Dips", &eve, &mut scope).await;
    assert_eq!(texts(&replies), vec!["Die Übung Dips gibt es bereits."]);

    let replies = run("/exercise", &eve, &mut scope).await;
    assert_eq!(texts(&replies), vec![TOO_FEW_ARGS]);

    let replies = run("/exercise a b c", &eve, &mut scope).await;
    assert_eq!(texts(&replies), vec![TOO_MANY_ARGS]);
}

#[tokio::test]
async fn test_add_alias() {
    let (_store, mut scope) = test_scope().await;
    let eve = sender(1, "Eve");

    let replies = run("/alias Bauch Crunches", &eve, &mut scope).await;
    assert_eq!(texts(&replies), vec!["Bauch oder Crunches? Alles das gleiche!"]);
    assert_eq!(
        scope.get_exercise_by_alias("Bauch").await.unwrap().as_deref(),
        Some("Crunches")
    );

    // Aliases of aliases resolve to the exercise.
    let replies = run("/alias Trizeps Triceps", &eve, &mut scope).await;
    assert_eq!(texts(&replies), vec!["Trizeps oder Triceps? Alles das gleiche!"]);
    assert_eq!(
        scope.get_exercise_by_alias("Trizeps").await.unwrap().as_deref(),
        Some("Dips")
    );

    let replies = run("/alias Triceps Situps", &eve, &mut scope).await;
    assert_eq!(texts(&replies), vec!["Der Alias Triceps existiert bereits."]);

    let replies = run("/alias Foo Badoof", &eve, &mut scope).await;
    assert_eq!(texts(&replies), vec!["Die Übung Badoof existiert nicht."]);

    let replies = run("/alias Foo", &eve, &mut scope).await;
    assert_eq!(texts(&replies), vec![TOO_FEW_ARGS]);
}

#[tokio::test]
async fn test_todos_table() {
    let (_store, mut scope) = test_scope().await;
    let replies = run("/todos", &sender(2, "John"), &mut scope).await;
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].parse_mode, ParseMode::Html);

    let expected = "<b>Todos für <a href=\"tg://user?id=2\">John</a></b>\n\n\
                    <pre>Übung       Todo    Done\n\
                    --------  ------  ------\n\
                    Crunches       0      80\n\
                    Dips          20      10\n\
                    Situps        20       0</pre>";
    assert_eq!(replies[0].text, expected);
}

#[tokio::test]
async fn test_todos_registers_new_user() {
    let (_store, mut scope) = test_scope().await;
    let ada = sender(3, "Ada & Co");
    let replies = run("/zutun", &ada, &mut scope).await;

    assert!(scope.has_user(3).await.unwrap());
    assert!(replies[0].text.contains(">Ada &amp; Co</a>"));
    assert!(replies[0].text.contains("Crunches      80       0"));
}

#[tokio::test]
async fn test_done_beyond_todo_announces() {
    let (_store, mut scope) = test_scope().await;
    let john = sender(2, "John");

    // John's Dips todo is 20.
    let replies = run("/done 25 Triceps", &john, &mut scope).await;
    assert_eq!(
        texts(&replies),
        vec!["5 weitere Dips von <a href=\"tg://user?id=2\">John</a>."]
    );
    assert_eq!(replies[0].parse_mode, ParseMode::Html);
    assert_eq!(scope.get_user_reps_for_exercise(2, "Dips").await.unwrap(), 35);
    assert_eq!(scope.get_user_todo_reps_for_exercise(1, "Dips").await.unwrap(), 5);
}

#[tokio::test]
async fn test_done_within_todo_is_silent() {
    let (_store, mut scope) = test_scope().await;
    let replies = run("/machma 20 Dips", &sender(2, "John"), &mut scope).await;
    assert!(replies.is_empty());
    assert_eq!(scope.get_user_todo_reps_for_exercise(2, "Dips").await.unwrap(), 0);
}

#[tokio::test]
async fn test_done_bad_input() {
    let (_store, mut scope) = test_scope().await;
    let john = sender(2, "John");

    for text in ["/done zehn Dips", "/done -5 Dips", "/done 1.5 Dips"] {
        let replies = run(text, &john, &mut scope).await;
        assert_eq!(texts(&replies), vec![NOT_A_NUMBER], "{text}");
    }

    let replies = run("/done 5 Badoof", &john, &mut scope).await;
    assert_eq!(texts(&replies), vec!["Die Übung Badoof existiert nicht."]);

    let replies = run("/done 5", &john, &mut scope).await;
    assert_eq!(texts(&replies), vec![TOO_FEW_ARGS]);

    let replies = run("/done 5 Dips extra", &john, &mut scope).await;
    assert_eq!(texts(&replies), vec![TOO_MANY_ARGS]);

    assert_eq!(scope.get_user_reps_for_exercise(2, "Dips").await.unwrap(), 10);
}

#[tokio::test]
async fn test_done_registers_new_user_even_for_unknown_exercise() {
    let (_store, mut scope) = test_scope().await;
    run("/done 5 Badoof", &sender(9, "Neu"), &mut scope).await;
    assert!(scope.has_user(9).await.unwrap());
}

#[tokio::test]
async fn test_exercises_list() {
    let (_store, mut scope) = test_scope().await;
    let replies = run("/übungen", &sender(1, "Eve"), &mut scope).await;
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].parse_mode, ParseMode::Html);
    assert!(replies[0].disable_link_preview);
    assert_eq!(
        replies[0].text,
        "<b>Übungen</b>\n\
         <a href=\"https://www.stack.com/a/dips\">Dips</a>\n\
         Crunches\n\
         Situps"
    );
}

#[tokio::test]
async fn test_exercises_empty_store() {
    let store = Store::new(&StoreConfig::in_memory()).await.unwrap();
    let mut scope = store.begin().await.unwrap();
    let replies = run("/exercises", &sender(1, "Eve"), &mut scope).await;
    assert_eq!(texts(&replies), vec!["Noch keine Übungen."]);
}
