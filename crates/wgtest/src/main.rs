//! Testing utilities for wavegen

use {
    anstyle::AnsiColor,
    clap::Parser,
    serde::Deserialize,
    std::{
        error::Error,
        io::{self},
        path::{Path, PathBuf},
    },
    wavegen::{
        Calibration, Engine, Snapshot,
        clock::Tier,
        fast_mode::{DutyTable, REDUCED_LEN},
        hal::sim::SimHardware,
        sync_square::{FREE_MIN_HALF, SYNC_MIN_HALF},
        wave_table::Half,
    },
};

#[derive(clap::Parser)]
enum Args {
    /// Write the tables of a settings file
    DumpTables {
        out_path: PathBuf,
        /// Settings file, defaults when left out
        settings: Option<PathBuf>,
    },
    /// Compare the tables of a settings file against a clean dump
    CompareTables {
        /// Settings file, defaults when left out
        settings: Option<PathBuf>,
    },
    /// Check that every duty cycle splits each tier's cycle completely
    CheckDuty,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct Settings {
    calibration: Calibration,
    snapshot: Snapshot,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    if let Err(e) = std::fs::create_dir_all(basedir()) {
        eprintln!("Error: Failed to create test dir: {e}");
    }
    match args {
        Args::DumpTables { out_path, settings } => {
            dump_tables_file(&out_path, settings.as_deref())?;
        }
        Args::CompareTables { settings } => cmp_tables(settings.as_deref())?,
        Args::CheckDuty => check_duty(),
    }
    Ok(())
}

fn load(path: Option<&Path>) -> Result<Settings, Box<dyn Error>> {
    match path {
        Some(path) => Ok(toml::from_str(&std::fs::read_to_string(path)?)?),
        None => Ok(Settings::default()),
    }
}

/// Half cycle table, reduced table, then every tier's two halves
fn dump_tables_buf(settings: Settings) -> Vec<u8> {
    let eng = Engine::with_snapshot(
        SimHardware::new(1),
        settings.calibration,
        &settings.snapshot,
    );
    let mut out = Vec::new();
    for half in Half::BOTH {
        out.extend_from_slice(bytemuck::cast_slice(eng.table().half(half)));
    }
    for half in Half::BOTH {
        for i in 0..REDUCED_LEN {
            out.extend_from_slice(&eng.reduced().sample(half, i).to_le_bytes());
        }
    }
    for tier in Tier::ALL {
        for half in Half::BOTH {
            out.extend_from_slice(bytemuck::cast_slice(eng.tier_half(tier, half)));
        }
    }
    out
}

fn dump_tables_file(out_path: &Path, settings: Option<&Path>) -> Result<(), Box<dyn Error>> {
    std::fs::write(out_path, dump_tables_buf(load(settings)?))?;
    Ok(())
}

fn basedir() -> PathBuf {
    std::env::temp_dir().join("wavegen-test")
}

fn cmp_tables(settings: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let path = basedir().join("clean-tables.bin");
    if !path.exists() {
        return Err(format!("Need clean file at '{}'", path.display()).into());
    }
    let clean = std::fs::read(path)?;
    let dirty = dump_tables_buf(load(settings)?);
    if clean == dirty {
        pass("Tables match");
    } else {
        let first = clean.iter().zip(&dirty).position(|(a, b)| a != b);
        match first {
            Some(pos) => fail(&format!("Table mismatch at byte {pos}")),
            None => fail(&format!(
                "Table length mismatch ({} vs {} bytes)",
                clean.len(),
                dirty.len()
            )),
        }
    }
    Ok(())
}

fn check_duty() {
    let mut bad = 0;
    for min_half in [FREE_MIN_HALF, SYNC_MIN_HALF] {
        for step in 0..=1000u16 {
            let duty = f64::from(step) / 10.0;
            let tbl = DutyTable::new(duty, min_half);
            for tier in Tier::ALL {
                let sum = tbl.count(Half::First, tier) + tbl.count(Half::Second, tier);
                if u32::from(sum) != tier.samples_per_cycle() {
                    bad += 1;
                    fail(&format!("{duty}% at {tier:?}: {sum} samples"));
                }
            }
        }
    }
    if bad == 0 {
        pass("Duty splits cover every cycle");
    }
}

fn pass(msg: &str) {
    let style = anstyle::Style::new()
        .fg_color(Some(anstyle::Color::Ansi(AnsiColor::Green)))
        .bold();
    eprintln!("{style}[PASS]{style:#} {msg}");
}

fn fail(msg: &str) {
    let style = anstyle::Style::new()
        .fg_color(Some(anstyle::Color::Ansi(AnsiColor::Red)))
        .bold();
    eprintln!("{style}[FAIL]{style:#} {msg}");
}
