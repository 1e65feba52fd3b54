// Allow dead code in the binary - the library surface is wider than what the
// CLI front end touches
#![allow(dead_code)]

mod attributes;
mod constants;
mod document;
mod goals;
mod progression;
mod quest;
mod session;
mod store;
mod suggestions;

use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};

use attributes::AttributeType;
use goals::GoalType;
use session::Session;
use store::{FileCache, FileStore};
use suggestions::{FallbackSuggester, OpenAiSuggester, QuestSuggester};

fn main() -> io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let profile = std::env::args().nth(1).unwrap_or_else(|| "default".to_string());

    let store = FileStore::new()?;
    let cache = FileCache::new()?;
    let mut session = Session::new(store, cache);

    if session.sign_in(&profile).is_err() {
        eprintln!("Could not load profile '{}'.", profile);
        return Ok(());
    }

    println!("Signed in as '{}'.", profile);
    print_status(&session);
    println!("Commands: list | toggle <id> | add <xp> <text> | goals | habit <text> | material <text> | suggest <goal-id> | quit");

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        let (command, rest) = match line.split_once(' ') {
            Some((c, r)) => (c, r.trim()),
            None => (line, ""),
        };

        match command {
            "" => {}
            "quit" | "exit" => break,
            "list" => print_quests(&session),
            "status" => print_status(&session),
            "toggle" => match rest.parse::<u64>() {
                Ok(id) => {
                    if session.toggle_quest(id) {
                        print_status(&session);
                    } else {
                        println!("No quest with that id.");
                    }
                }
                Err(_) => println!("Usage: toggle <id>"),
            },
            "add" => match quest::parse_quest_entry(rest) {
                Some((xp, text)) => {
                    if session.add_quest(text, xp, BTreeMap::new()).is_none() {
                        println!("Quest needs non-empty text and positive XP.");
                    }
                }
                None => println!("Usage: add <xp> <text> (XP must be a positive number)"),
            },
            "goals" => print_goals(&session),
            "habit" => {
                if session.add_goal(GoalType::Habit, rest, None).is_none() {
                    println!("Goal text cannot be empty.");
                }
            }
            "material" => {
                if session.add_goal(GoalType::Material, rest, None).is_none() {
                    println!("Goal text cannot be empty.");
                }
            }
            "suggest" => suggest_for_goal(&mut session, rest),
            _ => println!("Unknown command."),
        }
    }

    session.sign_out();
    Ok(())
}

fn print_status<S: store::RemoteStore, C: store::LocalCache>(session: &Session<S, C>) {
    let state = session.progression();
    println!("Level {}  {}/100 XP", state.level, state.xp);
    for attr in AttributeType::all() {
        print!("  {} {}", attr.key(), state.stats.get(attr));
    }
    println!();
}

fn print_quests<S: store::RemoteStore, C: store::LocalCache>(session: &Session<S, C>) {
    for quest in session.quests() {
        let mark = if session.progression().is_completed(quest.id) {
            "x"
        } else {
            " "
        };
        println!("[{}] {:>3}. {} ({} XP)", mark, quest.id, quest.text, quest.xp);
    }
}

fn print_goals<S: store::RemoteStore, C: store::LocalCache>(session: &Session<S, C>) {
    println!("Habit goals:");
    for goal in session.habit_goals() {
        println!("  {}  {}", goal.id, goal.text);
    }
    println!("Material goals:");
    for goal in session.material_goals() {
        println!("  {}  {}", goal.id, goal.text);
    }
}

fn suggest_for_goal<S: store::RemoteStore, C: store::LocalCache>(
    session: &mut Session<S, C>,
    goal_id: &str,
) {
    let found = session
        .habit_goals()
        .iter()
        .find(|g| g.id == goal_id)
        .map(|g| (g.text.clone(), GoalType::Habit))
        .or_else(|| {
            session
                .material_goals()
                .iter()
                .find(|g| g.id == goal_id)
                .map(|g| (g.text.clone(), GoalType::Material))
        });
    let Some((text, goal_type)) = found else {
        println!("No goal with that id.");
        return;
    };

    let mut suggestions = match std::env::var("OPENAI_API_KEY") {
        Ok(key) => OpenAiSuggester::new(key).suggest(&text, goal_type),
        Err(_) => Vec::new(),
    };
    if suggestions.is_empty() {
        suggestions = FallbackSuggester.suggest(&text, goal_type);
    }

    let added = session.append_suggestions(&suggestions);
    println!("Added {} suggested quest(s).", added);
    print_quests(session);
}
