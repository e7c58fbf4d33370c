use anyhow::{bail, Context, Result};
use std::io::{self, BufWriter, Write};

use rehab_tracker::config::Config;
use rehab_tracker::exercise::ExerciseKind;
use rehab_tracker::synth;

const CONFIG_PATH: &str = "config.toml";
const DEFAULT_CYCLES: usize = 10;
const DEFAULT_HOLD: usize = 6;

fn parse_kind(name: &str) -> Result<ExerciseKind> {
    serde_json::from_value(serde_json::Value::String(name.to_string()))
        .with_context(|| format!("Unknown exercise kind: {}", name))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        let program = args.first().map(String::as_str).unwrap_or("synth_session");
        eprintln!("Usage: {} <kind> [cycles] [hold_frames]", program);
        eprintln!();
        eprintln!("kinds:");
        for kind in ExerciseKind::ALL {
            eprintln!("  {}", serde_json::to_string(&kind)?.trim_matches('"'));
        }
        bail!("missing exercise kind");
    }

    let kind = parse_kind(&args[1])?;
    let cycles: usize = match args.get(2) {
        Some(s) => s.parse().context("cycles must be a number")?,
        None => DEFAULT_CYCLES,
    };
    let hold: usize = match args.get(3) {
        Some(s) => s.parse().context("hold_frames must be a number")?,
        None => DEFAULT_HOLD,
    };

    let config = Config::load_or_default(CONFIG_PATH);
    let mirror = config.tracker.mirror_handedness;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    writeln!(out, "# {} x{} (hold {} frames)", kind.default_name(), cycles, hold)?;
    // キャリブレーション用の直立
    let rest = serde_json::to_string(&synth::rest_frame())?;
    for _ in 0..config.calibration.frames {
        writeln!(out, "{}", rest)?;
    }
    for _ in 0..cycles {
        for frame in synth::cycle(kind, mirror, hold) {
            writeln!(out, "{}", serde_json::to_string(&frame)?)?;
        }
    }
    out.flush()?;
    Ok(())
}
