/// Play: a line-oriented shell over the narrative controller.
///
/// Usage: play [--config <game.ron>] [--slot <name>]
///
/// Commands: look, choose <n|id>, stats, save, load, history, quit

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;
use story_engine::core::config::GameConfig;
use story_engine::core::controller::{NarrativeController, SceneStatus};
use story_engine::core::database::ContentDatabase;
use story_engine::core::persistence::FileStore;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

fn main() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "story_engine=info,play=info".into()),
        )
        .with(fmt::layer().with_writer(io::stderr))
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("Usage: play [--config <game.ron>] [--slot <name>]");
        process::exit(0);
    }

    let mut config_path = PathBuf::from("content/game.ron");
    let mut slot = None;

    let mut i = 1;
    while i < args.len() {
        if args[i] == "--config" && i + 1 < args.len() {
            i += 1;
            config_path = PathBuf::from(&args[i]);
        } else if args[i] == "--slot" && i + 1 < args.len() {
            i += 1;
            slot = Some(args[i].clone());
        }
        i += 1;
    }

    let config = match GameConfig::load_from_ron(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("ERROR: Failed to load config '{}': {}", config_path.display(), e);
            process::exit(1);
        }
    };
    let slot = slot.unwrap_or_else(|| config.save_slot.clone());

    let db = match config.composer().build() {
        Ok(db) => db,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            process::exit(1);
        }
    };

    let mut controller = match NarrativeController::new(&db, config.new_game()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            process::exit(1);
        }
    };
    let mut store = config.save_store();

    look(&controller);

    let stdin = io::stdin();
    loop {
        print!("> ");
        let _ = io::stdout().flush();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                eprintln!("ERROR: {}", e);
                break;
            }
        }

        let mut words = line.split_whitespace();
        let Some(command) = words.next() else { continue };
        let argument = words.next();

        match command {
            "look" | "l" => look(&controller),
            "choose" | "c" => match argument {
                Some(arg) => choose(&mut controller, arg),
                None => println!("Usage: choose <n|id>"),
            },
            "stats" | "s" => stats(&controller),
            "history" | "h" => history(&controller),
            "save" => match controller.save(&mut store, &slot) {
                Ok(()) => println!("Saved to '{}'.", slot),
                Err(e) => println!("Save failed: {}", e),
            },
            "load" => {
                if let Some(loaded) = load(&db, &store, &slot) {
                    controller = loaded;
                    look(&controller);
                }
            }
            "quit" | "q" => break,
            other => println!("Unknown command '{}'. Try look, choose, stats, save, load, history, quit.", other),
        }
    }
}

fn look(controller: &NarrativeController<'_>) {
    let view = match controller.view() {
        Ok(view) => view,
        Err(e) => {
            println!("ERROR: {}", e);
            return;
        }
    };

    println!("\n[{}]  {}", view.id, controller.state().clock);
    println!("{}\n", view.text);

    let mut n = 0;
    for choice in &view.choices {
        match choice.gate.reason() {
            None => {
                n += 1;
                println!("  {}. {}", n, choice.text);
            }
            Some(reason) => println!("  -  {} ({})", choice.text, reason),
        }
    }

    match view.status {
        SceneStatus::Open { .. } => {}
        SceneStatus::Ending => {
            println!("  THE END: {}", view.ending.unwrap_or("ending"));
        }
        SceneStatus::Blocked => println!("  Every way forward is closed."),
    }
}

fn choose(controller: &mut NarrativeController<'_>, arg: &str) {
    let result = match arg.parse::<usize>() {
        Ok(0) => {
            println!("Choices are numbered from 1.");
            return;
        }
        Ok(n) => controller.select_index(n - 1),
        Err(_) => controller.select(arg),
    };

    match result {
        Ok(transition) => {
            if let Some(event) = transition.event {
                println!("\n* {}", event);
            }
            look(controller);
        }
        Err(e) => println!("{}", e),
    }
}

fn stats(controller: &NarrativeController<'_>) {
    let state = controller.state();
    println!("{} ({})  {}", state.character_name, controller.persona(), state.clock);
    println!(
        "  morality {}  trauma {}  stress {}",
        state.morality, state.trauma, state.stress
    );
    for (name, value) in &state.stats {
        println!("  {:<12} {}", name, value);
    }
    if !state.inventory.is_empty() {
        println!("  inventory: {}", state.inventory.join(", "));
    }
    for (name, value) in &state.relationships {
        println!("  {:<12} {:+}", name, value);
    }
    let mut flags: Vec<&str> = state.flags.iter().map(String::as_str).collect();
    flags.sort_unstable();
    if !flags.is_empty() {
        println!("  flags: {}", flags.join(", "));
    }
}

fn history(controller: &NarrativeController<'_>) {
    let state = controller.state();
    if state.history.is_empty() {
        println!("No choices made yet.");
    }
    for (i, entry) in state.history.iter().enumerate() {
        println!("  {:>3}. {}  {} -> {}", i + 1, entry.at, entry.scene, entry.choice);
    }
    let recent: Vec<&str> = controller.events().take(5).map(|e| e.text.as_str()).collect();
    if !recent.is_empty() {
        println!("\nRecent events:");
        for text in recent {
            println!("  * {}", text);
        }
    }
}

fn load<'a>(
    db: &'a ContentDatabase,
    store: &FileStore,
    slot: &str,
) -> Option<NarrativeController<'a>> {
    match NarrativeController::load(db, store, slot) {
        Ok(controller) => {
            println!("Loaded '{}'.", slot);
            Some(controller)
        }
        Err(e) => {
            println!("Load failed: {}", e);
            None
        }
    }
}
