//! Minimal TOML parser for frame configuration
//!
//! Handles only the subset `frame.toml` uses; it does NOT support the
//! full TOML language.
//!
//! Supported features:
//! - `[section]` headers
//! - `key = value` pairs (string, integer, boolean)
//! - Single-line string arrays: `playlist = ["plasma", "flow"]`
//! - Comments (`# ...`), including trailing ones
//!
//! Unknown keys are ignored so older firmware accepts newer files.

use kaleido_core::config::{playlist_from_names, BusPolicy, ConfigError, MAX_PLAYLIST};
use kaleido_core::palette;

use super::FrameConfig;

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Unknown or malformed section header
    InvalidSection,
    /// Value has the wrong type or is out of range
    InvalidValue,
    /// Array has more entries than the config can hold
    TooManyItems,
    /// Values parsed but do not form a valid configuration
    Config(ConfigError),
}

impl From<ConfigError> for ParseError {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::PlaylistTooLong => ParseError::TooManyItems,
            other => ParseError::Config(other),
        }
    }
}

/// Current parsing context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Scheduler,
    Palette,
    Ambient,
    Display,
}

/// Parse TOML text into a [`FrameConfig`]
///
/// Missing sections and keys keep their defaults. The result is
/// validated before it is returned.
pub fn parse_config(input: &str) -> Result<FrameConfig, ParseError> {
    let mut config = FrameConfig::default();
    let mut section = Section::Root;

    for line in input.lines() {
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('[') {
            let header = strip_comment(line);
            if !header.ends_with(']') {
                return Err(ParseError::InvalidSection);
            }
            section = parse_section_header(&header[1..header.len() - 1])?;
            continue;
        }

        if let Some((key, value)) = parse_key_value(line) {
            apply_value(&mut config, section, key, value)?;
        }
    }

    config.engine.validate()?;
    Ok(config)
}

fn parse_section_header(header: &str) -> Result<Section, ParseError> {
    match header.trim() {
        "scheduler" => Ok(Section::Scheduler),
        "palette" => Ok(Section::Palette),
        "ambient" => Ok(Section::Ambient),
        "display" => Ok(Section::Display),
        _ => Err(ParseError::InvalidSection),
    }
}

/// Drop a trailing `# comment` that is not inside a string
fn strip_comment(s: &str) -> &str {
    let mut in_string = false;
    for (i, ch) in s.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return s[..i].trim(),
            _ => {}
        }
    }
    s.trim()
}

/// Parse "key = value" line
fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let eq_pos = line.find('=')?;
    let key = line[..eq_pos].trim();
    let value = strip_comment(&line[eq_pos + 1..]);

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

/// Parse a quoted string value
fn parse_string(value: &str) -> Result<&str, ParseError> {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .ok_or(ParseError::InvalidValue)
}

/// Parse an integer value; `_` separators are allowed
fn parse_int<T: TryFrom<u64>>(value: &str) -> Result<T, ParseError> {
    let mut n: u64 = 0;
    let mut digits = 0;
    for ch in value.chars() {
        match ch {
            '_' => continue,
            '0'..='9' => {
                n = n
                    .checked_mul(10)
                    .and_then(|n| n.checked_add(ch as u64 - '0' as u64))
                    .ok_or(ParseError::InvalidValue)?;
                digits += 1;
            }
            _ => return Err(ParseError::InvalidValue),
        }
    }
    if digits == 0 {
        return Err(ParseError::InvalidValue);
    }
    T::try_from(n).map_err(|_| ParseError::InvalidValue)
}

/// Parse a boolean value
fn parse_bool(value: &str) -> Result<bool, ParseError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ParseError::InvalidValue),
    }
}

/// Parse a single-line array of strings
fn parse_string_array(value: &str) -> Result<heapless::Vec<&str, MAX_PLAYLIST>, ParseError> {
    let inner = value
        .strip_prefix('[')
        .and_then(|v| v.strip_suffix(']'))
        .ok_or(ParseError::InvalidValue)?;
    let mut items = heapless::Vec::new();
    for item in inner.split(',') {
        let item = item.trim();
        // Trailing comma
        if item.is_empty() {
            continue;
        }
        items
            .push(parse_string(item)?)
            .map_err(|_| ParseError::TooManyItems)?;
    }
    Ok(items)
}

fn apply_value(
    config: &mut FrameConfig,
    section: Section,
    key: &str,
    value: &str,
) -> Result<(), ParseError> {
    let engine = &mut config.engine;
    match (section, key) {
        (Section::Root, "seed") => engine.seed = parse_int(value)?,

        (Section::Scheduler, "playlist") => {
            let names = parse_string_array(value)?;
            engine.scheduler.playlist = playlist_from_names(names.iter().copied())?;
        }
        (Section::Scheduler, "dwell_min_ms") => engine.scheduler.dwell_min_ms = parse_int(value)?,
        (Section::Scheduler, "dwell_max_ms") => engine.scheduler.dwell_max_ms = parse_int(value)?,
        (Section::Scheduler, "fade_ms") => engine.scheduler.fade_ms = parse_int(value)?,

        (Section::Palette, "first") => {
            let id = palette::find(parse_string(value)?).ok_or(ConfigError::UnknownPalette)?;
            engine.palette.first = id as u8;
        }
        (Section::Palette, "blend_steps") => engine.palette.blend_steps = parse_int(value)?,

        (Section::Ambient, "enabled") => config.lights = parse_bool(value)?,
        (Section::Ambient, "every") => engine.ambient.every = parse_int(value)?,
        (Section::Ambient, "alpha") => engine.ambient.alpha = parse_int(value)?,

        (Section::Display, "bus") => {
            engine.display.bus =
                BusPolicy::from_name(parse_string(value)?).ok_or(ParseError::InvalidValue)?;
        }
        (Section::Display, "flip") => config.flip = parse_bool(value)?,
        (Section::Display, "frame_ms") => {
            config.frame_ms = parse_int(value)?;
            if config.frame_ms == 0 {
                return Err(ParseError::InvalidValue);
            }
        }

        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kaleido_core::effects::EffectKind;

    #[test]
    fn test_parse_empty_keeps_defaults() {
        assert_eq!(parse_config("").unwrap(), FrameConfig::default());
    }

    #[test]
    fn test_parse_full_config() {
        let config_str = r#"
seed = 42

[scheduler]
playlist = ["starfield", "pipes", "logo",]   # screensavers only
dwell_min_ms = 30_000
dwell_max_ms = 60000
fade_ms = 750

[palette]
first = "ember"
blend_steps = 900

[ambient]
enabled = false
every = 4
alpha = 50

[display]
bus = "per_frame"
flip = true
frame_ms = 40
"#;

        let config = parse_config(config_str).unwrap();
        let engine = &config.engine;
        assert_eq!(engine.seed, 42);
        assert_eq!(
            &engine.scheduler.playlist[..],
            &[EffectKind::Starfield, EffectKind::Pipes, EffectKind::Logo]
        );
        assert_eq!(engine.scheduler.dwell_min_ms, 30_000);
        assert_eq!(engine.scheduler.fade_ms, 750);
        assert_eq!(engine.palette.first as usize, palette::find("ember").unwrap());
        assert_eq!(engine.palette.blend_steps, 900);
        assert_eq!((engine.ambient.every, engine.ambient.alpha), (4, 50));
        assert_eq!(engine.display.bus, BusPolicy::PerFrame);
        assert!(config.flip);
        assert!(!config.lights);
        assert_eq!(config.frame_ms, 40);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_config("[lights]"), Err(ParseError::InvalidSection));
        assert_eq!(
            parse_config("[scheduler]\nplaylist = [\"lava\"]"),
            Err(ParseError::Config(ConfigError::UnknownEffect))
        );
        assert_eq!(
            parse_config("[scheduler]\ndwell_min_ms = 9000\ndwell_max_ms = 10"),
            Err(ParseError::Config(ConfigError::DwellRange))
        );
        assert_eq!(
            parse_config("[palette]\nfirst = \"mauve\""),
            Err(ParseError::Config(ConfigError::UnknownPalette))
        );
        assert_eq!(
            parse_config("[display]\nbus = \"shared\""),
            Err(ParseError::InvalidValue)
        );
        assert_eq!(parse_config("[ambient]\nevery = -1"), Err(ParseError::InvalidValue));
        assert_eq!(parse_config("[ambient]\nalpha = 300"), Err(ParseError::InvalidValue));
    }

    #[test]
    fn test_strip_comment_respects_strings() {
        assert_eq!(strip_comment("\"a#b\" # note"), "\"a#b\"");
        assert_eq!(strip_comment("12 #x"), "12");
    }
}
