//! Tracker cell formatting
//!
//! Cells render as `NNN II VV EPP`: note name with octave, instrument, volume
//! column and effect command with parameter, each with a dotted placeholder
//! when empty. Decoders that do not format cells themselves can use
//! [`format_note_event`]; the engine uses [`parse_instrument_column`] to find
//! which instrument a channel last triggered.

/// Placeholder shown when a cell cannot be formatted
pub const EMPTY_CELL: &str = "--- .. .. ...";

const NOTE_NAMES: [&str; 12] = [
    "C-", "C#", "D-", "D#", "E-", "F-", "F#", "G-", "G#", "A-", "A#", "B-",
];

/// Byte range of the instrument column inside a formatted cell
const INSTRUMENT_COLUMN: std::ops::Range<usize> = 4..6;

/// Decoded contents of one pattern cell
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoteEvent {
    /// Note number (octave × 12 + semitone)
    pub note: Option<i32>,
    /// 1-based instrument number
    pub instrument: Option<i32>,
    /// Volume column (0-64)
    pub volume: Option<i32>,
    /// Effect command
    pub effect: Option<i32>,
    /// Effect parameter
    pub effect_param: Option<i32>,
}

/// `C-4`, `F#2`, or `---`
pub fn format_note_name(note: Option<i32>) -> String {
    match note {
        Some(value) if value >= 0 => {
            format!("{}{}", NOTE_NAMES[(value % 12) as usize], value / 12)
        }
        _ => "---".to_string(),
    }
}

/// Two-digit instrument number, `..` when unset
pub fn format_instrument(instrument: Option<i32>) -> String {
    match instrument {
        Some(value) if value > 0 => format!("{value:02}"),
        _ => "..".to_string(),
    }
}

/// Two-digit volume clamped to 0-64, `..` when unset
pub fn format_volume(volume: Option<i32>) -> String {
    match volume {
        Some(value) if value >= 0 => format!("{:02}", value.clamp(0, 64)),
        _ => "..".to_string(),
    }
}

/// Effect letter/digit plus two hex parameter digits
pub fn format_effect(effect: Option<i32>, param: Option<i32>) -> String {
    if effect.is_none() && param.is_none() {
        return "...".to_string();
    }
    let command = effect.map_or_else(|| ".".to_string(), |e| format!("{e:X}"));
    let value = param.map_or_else(|| "..".to_string(), |p| format!("{p:02X}"));
    format!("{command}{value}")
}

/// Full cell text
pub fn format_note_event(event: &NoteEvent) -> String {
    format!(
        "{} {} {} {}",
        format_note_name(event.note),
        format_instrument(event.instrument),
        format_volume(event.volume),
        format_effect(event.effect, event.effect_param)
    )
}

/// Instrument number referenced by a formatted cell, if any.
///
/// Reads the two characters of the instrument column, hex first and decimal
/// as a fallback. Dotted placeholders yield `None`.
pub fn parse_instrument_column(line: &str) -> Option<i32> {
    let column = line.get(INSTRUMENT_COLUMN)?;
    let digits: String = column.chars().filter(|c| *c != ' ').collect();
    if digits.is_empty() || matches!(digits.as_str(), ".." | "." | "-") {
        return None;
    }
    i32::from_str_radix(&digits, 16)
        .or_else(|_| digits.parse::<i32>())
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_names() {
        assert_eq!(format_note_name(Some(48)), "C-4");
        assert_eq!(format_note_name(Some(30)), "F#2");
        assert_eq!(format_note_name(None), "---");
        assert_eq!(format_note_name(Some(-1)), "---");
    }

    #[test]
    fn test_instrument_and_volume() {
        assert_eq!(format_instrument(Some(3)), "03");
        assert_eq!(format_instrument(Some(0)), "..");
        assert_eq!(format_volume(Some(80)), "64");
        assert_eq!(format_volume(None), "..");
    }

    #[test]
    fn test_effect_column() {
        assert_eq!(format_effect(Some(0xA), Some(0x0F)), "A0F");
        assert_eq!(format_effect(None, Some(0x20)), ".20");
        assert_eq!(format_effect(Some(0xC), None), "C..");
        assert_eq!(format_effect(None, None), "...");
    }

    #[test]
    fn test_full_event() {
        let event = NoteEvent {
            note: Some(49),
            instrument: Some(1),
            volume: Some(40),
            effect: Some(0xF),
            effect_param: Some(0x06),
        };
        assert_eq!(format_note_event(&event), "C#4 01 40 F06");
        assert_eq!(format_note_event(&NoteEvent::default()), EMPTY_CELL);
    }

    #[test]
    fn test_parse_instrument_column() {
        assert_eq!(parse_instrument_column("C-4 01 40 F06"), Some(1));
        assert_eq!(parse_instrument_column("C-4 1A .. ..."), Some(0x1A));
        assert_eq!(parse_instrument_column("--- .. .. ..."), None);
        assert_eq!(parse_instrument_column("C-4"), None);
        assert_eq!(parse_instrument_column("C-4 zz .. ..."), None);
    }
}
