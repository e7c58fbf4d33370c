use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufRead, BufReader};

use rehab_tracker::config::Config;
use rehab_tracker::pose::LandmarkFrame;
use rehab_tracker::session::{ExerciseSession, PlanState};

const CONFIG_PATH: &str = "config.toml";

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::load_or_default(CONFIG_PATH);
    let mut session = ExerciseSession::from_config(&config)?;

    let source = std::env::args().nth(1);
    let reader: Box<dyn BufRead> = match &source {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Failed to open {}", path))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };

    println!("Rehab Tracker - replay");
    println!("Input: {}", source.as_deref().unwrap_or("<stdin>"));
    println!("Mirror handedness: {}", config.tracker.mirror_handedness);
    println!();
    print_plan(&session);
    println!();
    println!("Control lines: reset / next (any other line is one JSON frame)");
    println!();

    let mut frames = 0u64;
    let mut rejected = 0u64;
    let mut reps = 0u64;
    let mut wraps = 0u64;
    let mut last_status = session.status();
    println!("{}", last_status);

    for (line_no, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read input")?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let changed = match line {
            "reset" => {
                session.reset();
                true
            }
            "next" => {
                if session.advance().sequence_wrapped {
                    wraps += 1;
                }
                true
            }
            _ => {
                let frame: LandmarkFrame = match serde_json::from_str(line) {
                    Ok(frame) => frame,
                    Err(e) => {
                        eprintln!("line {}: invalid JSON: {}", line_no + 1, e);
                        rejected += 1;
                        continue;
                    }
                };
                frames += 1;
                match session.process(&frame) {
                    Ok(outcome) => {
                        if outcome.repetition_accepted {
                            reps += 1;
                        }
                        if outcome.sequence_wrapped {
                            wraps += 1;
                            println!("*** Plan complete ***");
                        }
                        outcome.rep_count_changed()
                    }
                    Err(e) => {
                        eprintln!("line {}: rejected frame: {}", line_no + 1, e);
                        rejected += 1;
                        continue;
                    }
                }
            }
        };

        // 回数・運動・キャリブレーション完了が変わったときだけ出す
        let status = session.status();
        if changed || status.calibration.is_ready() != last_status.calibration.is_ready() {
            println!("{}", status);
            if let Some(p) = session.progress() {
                println!("  progress: {:.0}%", p * 100.0);
            }
            if status.exercise != last_status.exercise {
                println!("  hint: {}", session.active_exercise().kind.hint());
            }
            last_status = status;
        }
    }

    println!();
    println!("=== Summary ===");
    println!("Frames: {}, rejected lines: {}", frames, rejected);
    println!("Repetitions: {}", reps);
    println!("Plan completions: {}", wraps);
    println!("{}", session.status());
    print_plan(&session);
    Ok(())
}

fn print_plan(session: &ExerciseSession) {
    println!("Plan:");
    for (i, entry) in session.plan().iter().enumerate() {
        let marker = match entry.state {
            PlanState::Done => "x",
            PlanState::Active => ">",
            PlanState::Pending => " ",
        };
        println!(
            "  [{}] {:2}. {} ({})",
            marker,
            i + 1,
            entry.exercise.name,
            entry.exercise.target()
        );
    }
}
