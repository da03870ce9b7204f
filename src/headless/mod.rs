//! Headless mode for scripted scenario runs
//!
//! Runs the combat core without any graphical output for a fixed number of
//! frames, suitable for automated testing and replaying input scripts.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release -- --headless scenario.json --skills skills.ron
//! ```
//!
//! ## JSON Configuration
//!
//! ```json
//! {
//!   "frames": 300,
//!   "random_seed": 7,
//!   "combatants": [
//!     { "id": 1, "team": 1, "max_hp": 100, "skills": [10], "traits": { "healer": true } },
//!     { "id": 2, "team": 2, "max_hp": 100, "position": [3, 0] }
//!   ]
//! }
//! ```

pub mod config;
pub mod runner;

pub use config::{CombatantConfig, HeadlessScenario, InputAction, ScriptedInput};
pub use runner::{
    build_headless_app, collect_result, run_headless, run_scenario, BattlerSummary, MatchResult,
};
