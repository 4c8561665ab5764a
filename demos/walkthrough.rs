/// Walkthrough example: plays a fixed route through the bundled story.
///
/// A mini playthrough: lose Alex → fill the bathtub → cut the lights → a quiet night.
///
/// Run with: cargo run --example walkthrough

use story_engine::core::config::GameConfig;
use story_engine::core::controller::{Decision, NarrativeController};
use story_engine::core::persistence::{MemoryStore, DEFAULT_SAVE_SLOT};

const ROUTE: [&str; 9] = [
    "intro_wait",
    "continue",
    "sah_water",
    "swm_bathtub",
    "sah_power",
    "spm_kill_lights",
    "sah_night",
    "sner_dark",
    "snp_sleep",
];

fn main() {
    let config = GameConfig::load_from_ron(std::path::Path::new("content/game.ron"))
        .expect("Failed to load content/game.ron");
    let db = config
        .composer()
        .build()
        .expect("Failed to compose the story");

    println!("Composed {} scenes, starting at '{}'\n", db.len(), db.start());

    let mut controller =
        NarrativeController::new(&db, config.new_game()).expect("Failed to start a new game");
    let mut store = MemoryStore::default();

    for (step, choice) in ROUTE.iter().enumerate() {
        let view = controller.view().expect("Current scene is missing");
        println!("--- {} ({}) ---", view.id, controller.state().clock);
        println!("{}", view.text);
        for c in &view.choices {
            match c.gate.reason() {
                None => println!("  [open]    {}", c.text),
                Some(reason) => println!("  [blocked] {} ({})", c.text, reason),
            }
        }

        let transition = controller.select(choice).expect("Route choice was rejected");
        println!("  > {}", choice);
        if let Some(event) = &transition.event {
            println!("  * {}", event);
        }
        println!();

        // Save halfway through
        if step == ROUTE.len() / 2 {
            controller
                .save(&mut store, DEFAULT_SAVE_SLOT)
                .expect("Failed to save");
        }
    }

    let view = controller.view().expect("Current scene is missing");
    println!("--- {} ---\n{}", view.id, view.text);
    println!("Ending: {}\n", view.ending.unwrap_or("none"));

    let state = controller.state();
    println!("Persona:  {}", controller.persona());
    println!("Clock:    {}", state.clock);
    println!("Stress:   {}", state.stress);
    println!("Items:    {}", state.inventory.join(", "));
    let mut flags: Vec<&str> = state.flags.iter().map(String::as_str).collect();
    flags.sort_unstable();
    println!("Flags:    {}", flags.join(", "));

    // --- Resume from the mid-route save and replay the rest ---
    let resumed = NarrativeController::load(&db, &store, DEFAULT_SAVE_SLOT)
        .expect("Failed to load the save");
    let done = resumed.state().history.len();
    let remaining: Vec<Decision> = state.history[done..].iter().map(Decision::from).collect();
    let replayed = NarrativeController::replay(&db, resumed.into_state(), &remaining)
        .expect("Replay diverged");

    println!(
        "\nResumed at step {} and replayed {} choices: {}",
        done,
        remaining.len(),
        if replayed.state() == state {
            "identical outcome"
        } else {
            "DIFFERENT outcome"
        }
    );
}
