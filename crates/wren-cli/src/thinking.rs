use rand::seq::SliceRandom;

const THINKING_MESSAGES: &[&str] = &[
    "Thinking",
    "Pondering",
    "Consulting the manual",
    "Rummaging through the toolbox",
    "Sharpening pencils",
    "Reading the fine print",
    "Connecting the dots",
    "Untangling wires",
    "Counting on fingers",
    "Checking twice",
    "Warming up the transistors",
    "Herding electrons",
    "Looking under the hood",
    "Brewing a response",
    "Chasing the bug",
];

/// Pick a status line for the spinner.
pub fn get_random_thinking_message() -> &'static str {
    THINKING_MESSAGES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or("Thinking")
}
