//! Key name mappings
//!
//! Maps keycodes to the names used in narrator.cfg and on the console, and
//! back. Codes follow the SDL keycode layout: printable keys are their
//! ASCII value, everything else is a scancode with bit 30 set.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Keycodes referenced by default bindings
pub mod keys {
    pub const BACKSPACE: i32 = 8;
    pub const TAB: i32 = 9;
    pub const RETURN: i32 = 13;
    pub const ESCAPE: i32 = 27;
    pub const SPACE: i32 = 32;
    pub const A: i32 = 97;
    pub const N: i32 = 110;
    pub const P: i32 = 112;
    pub const Q: i32 = 113;
    pub const RIGHT: i32 = 0x4000004F;
    pub const LEFT: i32 = 0x40000050;
    pub const DOWN: i32 = 0x40000051;
    pub const UP: i32 = 0x40000052;
}

const NAMED_KEYS: &[(i32, &str)] = &[
    (keys::BACKSPACE, "Backspace"),
    (keys::TAB, "Tab"),
    (keys::RETURN, "Return"),
    (keys::ESCAPE, "Escape"),
    (keys::SPACE, "Space"),
    (127, "Delete"),
    (0x4000003A, "F1"),
    (0x4000003B, "F2"),
    (0x4000003C, "F3"),
    (0x4000003D, "F4"),
    (0x4000003E, "F5"),
    (0x4000003F, "F6"),
    (0x40000040, "F7"),
    (0x40000041, "F8"),
    (0x40000042, "F9"),
    (0x40000043, "F10"),
    (0x40000044, "F11"),
    (0x40000045, "F12"),
    (0x40000049, "Insert"),
    (0x4000004A, "Home"),
    (0x4000004B, "PageUp"),
    (0x4000004D, "End"),
    (0x4000004E, "PageDown"),
    (keys::RIGHT, "Right"),
    (keys::LEFT, "Left"),
    (keys::DOWN, "Down"),
    (keys::UP, "Up"),
];

/// Keycode to name mapping
static KEY_NAMES: LazyLock<HashMap<i32, String>> = LazyLock::new(|| {
    let mut m: HashMap<i32, String> = NAMED_KEYS
        .iter()
        .map(|&(code, name)| (code, name.to_string()))
        .collect();

    // Digits and letters; letters are named in upper case but coded lower
    for c in ('0'..='9').chain('a'..='z') {
        m.insert(c as i32, c.to_ascii_uppercase().to_string());
    }
    m
});

/// Lower-cased name to keycode (reverse lookup)
static NAME_TO_KEY: LazyLock<HashMap<String, i32>> = LazyLock::new(|| {
    KEY_NAMES
        .iter()
        .map(|(&code, name)| (name.to_ascii_lowercase(), code))
        .collect()
});

/// Get the human-readable name for a keycode
pub fn key_name(keycode: i32) -> &'static str {
    KEY_NAMES
        .get(&keycode)
        .map(String::as_str)
        .unwrap_or("Unknown")
}

/// Get the keycode for a key name (case-insensitive, surrounding whitespace ignored)
pub fn key_from_name(name: &str) -> Option<i32> {
    NAME_TO_KEY.get(&name.trim().to_ascii_lowercase()).copied()
}
