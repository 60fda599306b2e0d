//! Build script for kaleido-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates frame.toml at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Effect names the firmware understands
const EFFECTS: &[&str] = &[
    "plasma",
    "flow",
    "moire",
    "cellular",
    "pipes",
    "starfield",
    "matrix",
    "mystify",
    "toasters",
    "logo",
];

const PALETTES: &[&str] = &["ember", "ocean", "aurora", "sunset", "neon", "moss"];

const BUS_POLICIES: &[&str] = &["held", "per_frame"];

const SECTIONS: &[&str] = &["scheduler", "palette", "ambient", "display"];

const MAX_PLAYLIST: usize = 16;

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    println!("cargo:rustc-link-search={}", out_dir.display());
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate frame.toml at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=frame.toml");

    let config_path = Path::new("frame.toml");
    if !config_path.exists() {
        fail("frame.toml not found", &["The firmware embeds frame.toml; create one next to Cargo.toml.".to_string()]);
    }

    let content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => fail("Failed to read frame.toml", &[e.to_string()]),
    };

    let config: toml::Value = match toml::from_str(&content) {
        Ok(value) => value,
        Err(e) => fail(
            "Invalid TOML syntax in frame.toml",
            &e.to_string().lines().map(str::to_string).collect::<Vec<_>>(),
        ),
    };

    let mut errors = Vec::new();
    validate_sections(&config, &mut errors);
    validate_scheduler(&config, &mut errors);
    validate_palette(&config, &mut errors);
    validate_ambient(&config, &mut errors);
    validate_display(&config, &mut errors);

    if !errors.is_empty() {
        fail("Invalid configuration in frame.toml", &errors);
    }

    println!("cargo:warning=frame.toml validated successfully");
}

/// Abort the build with a boxed message
fn fail(title: &str, lines: &[String]) -> ! {
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<56} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title,
        format_error_lines(lines)
    );
}

/// Format error message lines with box drawing
fn format_error_lines(lines: &[String]) -> String {
    lines
        .iter()
        .map(|line| {
            let truncated = if line.len() > 62 {
                format!("{}...", &line[..59])
            } else {
                line.to_string()
            };
            format!("║  • {:<62} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn table<'a>(config: &'a toml::Value, name: &str) -> Option<&'a toml::value::Table> {
    config.get(name).and_then(|v| v.as_table())
}

/// Non-negative integer that fits in `max`
fn check_int(section: &str, key: &str, value: Option<&toml::Value>, max: i64, errors: &mut Vec<String>) -> Option<i64> {
    match value {
        None => None,
        Some(toml::Value::Integer(n)) if (0..=max).contains(n) => Some(*n),
        Some(toml::Value::Integer(_)) => {
            errors.push(format!("[{}] {} must be 0-{}", section, key, max));
            None
        }
        Some(_) => {
            errors.push(format!("[{}] {} must be an integer", section, key));
            None
        }
    }
}

fn check_name(section: &str, key: &str, value: Option<&toml::Value>, known: &[&str], errors: &mut Vec<String>) {
    match value {
        None => {}
        Some(toml::Value::String(s)) if known.contains(&s.as_str()) => {}
        Some(toml::Value::String(s)) => errors.push(format!("[{}] unknown {} '{}'", section, key, s)),
        Some(_) => errors.push(format!("[{}] {} must be a string", section, key)),
    }
}

fn validate_sections(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(root) = config.as_table() else {
        return;
    };
    for (name, value) in root {
        match value {
            toml::Value::Table(_) if !SECTIONS.contains(&name.as_str()) => {
                errors.push(format!("unknown section [{}]", name));
            }
            _ => {}
        }
    }
    check_int("root", "seed", root.get("seed"), i64::MAX, errors);
}

fn validate_scheduler(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(scheduler) = table(config, "scheduler") else {
        return;
    };

    match scheduler.get("playlist") {
        None => {}
        Some(toml::Value::Array(entries)) => {
            if entries.is_empty() {
                errors.push("[scheduler] playlist cannot be empty".to_string());
            }
            if entries.len() > MAX_PLAYLIST {
                errors.push(format!("[scheduler] playlist holds at most {} effects", MAX_PLAYLIST));
            }
            for entry in entries {
                check_name("scheduler", "effect", Some(entry), EFFECTS, errors);
            }
        }
        Some(_) => errors.push("[scheduler] playlist must be an array of names".to_string()),
    }

    let min = check_int("scheduler", "dwell_min_ms", scheduler.get("dwell_min_ms"), u32::MAX as i64, errors)
        .unwrap_or(45_000);
    let max = check_int("scheduler", "dwell_max_ms", scheduler.get("dwell_max_ms"), u32::MAX as i64, errors)
        .unwrap_or(90_000);
    if min > max {
        errors.push(format!("[scheduler] dwell_min_ms ({}) exceeds dwell_max_ms ({})", min, max));
    }

    if check_int("scheduler", "fade_ms", scheduler.get("fade_ms"), u32::MAX as i64, errors) == Some(0) {
        errors.push("[scheduler] fade_ms must be positive".to_string());
    }
}

fn validate_palette(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(palette) = table(config, "palette") else {
        return;
    };
    check_name("palette", "first", palette.get("first"), PALETTES, errors);
    if check_int("palette", "blend_steps", palette.get("blend_steps"), u16::MAX as i64, errors) == Some(0) {
        errors.push("[palette] blend_steps must be positive".to_string());
    }
}

fn validate_ambient(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(ambient) = table(config, "ambient") else {
        return;
    };
    if let Some(v) = ambient.get("enabled") {
        if !v.is_bool() {
            errors.push("[ambient] enabled must be true or false".to_string());
        }
    }
    if check_int("ambient", "every", ambient.get("every"), u8::MAX as i64, errors) == Some(0) {
        errors.push("[ambient] every must be positive".to_string());
    }
    check_int("ambient", "alpha", ambient.get("alpha"), u8::MAX as i64, errors);
}

fn validate_display(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(display) = table(config, "display") else {
        return;
    };
    check_name("display", "bus", display.get("bus"), BUS_POLICIES, errors);
    if let Some(v) = display.get("flip") {
        if !v.is_bool() {
            errors.push("[display] flip must be true or false".to_string());
        }
    }
    if check_int("display", "frame_ms", display.get("frame_ms"), 1_000, errors) == Some(0) {
        errors.push("[display] frame_ms must be positive".to_string());
    }
}
