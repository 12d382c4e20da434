//! Alpha sign packet encoding
//!
//! Only the commands the sign loop issues are encoded here: write text file,
//! clear memory, allocate memory and set run sequence. Every packet is
//! broadcast to all signs on the line.

use super::traits::{Label, TextFile};
use crate::sequence::{normalize, Color, Mode, Speed};

const NUL: u8 = 0x00;
const SOH: u8 = 0x01;
const STX: u8 = 0x02;
const EOT: u8 = 0x04;
const ESC: u8 = 0x1B;
const COLOR_CONTROL: u8 = 0x1C;

const TYPE_ALL_SIGNS: u8 = b'Z';
const ADDRESS_BROADCAST: &[u8] = b"00";

const WRITE_TEXT: u8 = b'A';
const WRITE_SPECIAL: u8 = b'E';
const SET_MEMORY: u8 = b'$';
const SET_RUN_SEQUENCE: u8 = b'.';

const MIDDLE_LINE: u8 = 0x20;
const FILE_TYPE_TEXT: u8 = b'A';
const UNLOCKED: u8 = b'U';
/// Start/stop times meaning "always"
const ALWAYS_ON: &[u8] = b"FF00";
/// Ignore on/off times, unlocked
const RUN_SEQUENCE_MODE: &[u8] = b"SU";

/// Wrap a command body in the sign's framing.
pub fn packet(body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(body.len() + 12);
    out.extend_from_slice(&[NUL; 5]);
    out.push(SOH);
    out.push(TYPE_ALL_SIGNS);
    out.extend_from_slice(ADDRESS_BROADCAST);
    out.push(STX);
    out.extend_from_slice(body);
    out.push(EOT);
    out
}

pub fn clear_memory() -> Vec<u8> {
    packet(&[WRITE_SPECIAL, SET_MEMORY])
}

pub fn allocate(files: &[TextFile]) -> Vec<u8> {
    let mut body = vec![WRITE_SPECIAL, SET_MEMORY];
    for file in files {
        body.push(file.label.0);
        body.push(FILE_TYPE_TEXT);
        body.push(UNLOCKED);
        body.extend_from_slice(format!("{:04X}", file.size).as_bytes());
        body.extend_from_slice(ALWAYS_ON);
    }
    packet(&body)
}

pub fn run_sequence(labels: &[Label]) -> Vec<u8> {
    let mut body = vec![WRITE_SPECIAL, SET_RUN_SEQUENCE];
    body.extend_from_slice(RUN_SEQUENCE_MODE);
    body.extend(labels.iter().map(|l| l.0));
    packet(&body)
}

pub fn write_text(file: &TextFile) -> Vec<u8> {
    let mut body = vec![WRITE_TEXT, file.label.0, ESC, MIDDLE_LINE];
    body.extend_from_slice(mode_code(file.mode));
    body.extend(render_data(file));
    packet(&body)
}

/// Text file payload: color control, speed control, then printable text
/// clipped to the file size.
pub fn render_data(file: &TextFile) -> Vec<u8> {
    let mut data = Vec::with_capacity(file.text.len() + 3);
    if let Some(color) = file.color {
        data.push(COLOR_CONTROL);
        data.push(color_code(color));
    }
    if let Some(speed) = file.speed {
        data.push(speed_code(speed));
    }
    // Control codes share the slot's allocation with the text
    let room = file.size.saturating_sub(data.len());
    let text = normalize(&file.text);
    data.extend(
        text.chars()
            .filter(|c| !c.is_control())
            .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
            .take(room),
    );
    data
}

pub fn mode_code(mode: Mode) -> &'static [u8] {
    match mode {
        Mode::Rotate => b"a",
        Mode::Hold => b"b",
        Mode::Flash => b"c",
        Mode::RollUp => b"e",
        Mode::RollDown => b"f",
        Mode::RollLeft => b"g",
        Mode::RollRight => b"h",
        Mode::WipeUp => b"i",
        Mode::WipeDown => b"j",
        Mode::WipeLeft => b"k",
        Mode::WipeRight => b"l",
        Mode::Scroll => b"m",
        Mode::AutoMode => b"o",
        Mode::RollIn => b"p",
        Mode::RollOut => b"q",
        Mode::WipeIn => b"r",
        Mode::WipeOut => b"s",
        Mode::CompressedRotate => b"t",
        Mode::Explode => b"u",
        Mode::Clock => b"v",
        Mode::Twinkle => b"n0",
        Mode::Sparkle => b"n1",
        Mode::Snow => b"n2",
        Mode::Interlock => b"n3",
        Mode::Switch => b"n4",
        Mode::Slide => b"n5",
        Mode::Spray => b"n6",
        Mode::Starburst => b"n7",
        Mode::Welcome => b"n8",
        Mode::SlotMachine => b"n9",
    }
}

pub fn color_code(color: Color) -> u8 {
    match color {
        Color::Red => b'1',
        Color::Green => b'2',
        Color::Amber => b'3',
        Color::DimRed => b'4',
        Color::DimGreen => b'5',
        Color::Brown => b'6',
        Color::Orange => b'7',
        Color::Yellow => b'8',
        Color::Rainbow1 => b'9',
        Color::Rainbow2 => b'A',
        Color::ColorMix => b'B',
        Color::AutoColor => b'C',
    }
}

pub fn speed_code(speed: Speed) -> u8 {
    match speed {
        Speed::Speed1 => 0x15,
        Speed::Speed2 => 0x16,
        Speed::Speed3 => 0x17,
        Speed::Speed4 => 0x18,
        Speed::Speed5 => 0x19,
    }
}
