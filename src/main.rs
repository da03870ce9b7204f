//! fieldcombat - real-time combat decision core
//!
//! Loads settings and the skill database, then either validates them or runs
//! a headless scenario.

use std::process::ExitCode;

use fieldcombat::cli::{parse_args, Args};
use fieldcombat::error::ConfigResult;
use fieldcombat::headless::{run_headless, HeadlessScenario};
use fieldcombat::settings::CoreSettings;
use fieldcombat::skills::SkillDatabase;

fn main() -> ExitCode {
    let args = parse_args();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> ConfigResult<()> {
    let settings = match &args.settings {
        Some(path) => CoreSettings::load(path)?,
        None => CoreSettings::load_or_default(&CoreSettings::default_path()),
    };
    let skills = SkillDatabase::load(&args.skills)?;

    let Some(scenario_path) = args.headless else {
        println!(
            "Configuration OK: {} skills, input delay {} frames",
            skills.len(),
            settings.input_delay
        );
        return Ok(());
    };

    let mut scenario = HeadlessScenario::load_from_file(&scenario_path)?;
    if let Some(frames) = args.frames {
        scenario.frames = frames;
    }

    run_headless(
        scenario,
        settings,
        skills,
        args.output.as_deref(),
        args.combat_log.as_deref(),
    )?;
    Ok(())
}
