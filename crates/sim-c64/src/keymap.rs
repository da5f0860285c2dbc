//! Key-script tokens and the C64 keyboard matrix.
//!
//! Key scripts are flat text: single characters for most keys plus named
//! tokens in angle brackets (`<RETURN>`, `<LSHIFT>`, ...). Each token maps
//! to one intersection of the 8x8 scan matrix; the mask bit driven onto
//! the model's keyboard pin is `1 << (pa * 8 + pb)`.
//!
//! Matrix layout (PA = row select, PB = column read):
//!
//! | PA | PB0 | PB1  | PB2 | PB3 | PB4 | PB5 | PB6  | PB7  |
//! |----|-----|------|-----|-----|-----|-----|------|------|
//! | 0  | DEL | 3    | 5   | 7   | 9   | +   | £    | 1    |
//! | 1  | RET | W    | R   | Y   | I   | P   | *    | ←    |
//! | 2  | →   | A    | D   | G   | J   | L   | ;    | CTRL |
//! | 3  | F7  | 4    | 6   | 8   | 0   | -   | HOME | 2    |
//! | 4  | F1  | Z    | C   | B   | M   | .   | RSHFT| SPC  |
//! | 5  | F3  | S    | F   | H   | K   | :   | =    | C=   |
//! | 6  | F5  | E    | T   | U   | O   | @   | ↑    | Q    |
//! | 7  | ↓   | LSHFT| X   | V   | N   | ,   | /    | STOP |

/// One scriptable key: its literal token and matrix coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyDef {
    pub token: &'static str,
    pub pa: u8,
    pub pb: u8,
}

impl KeyDef {
    /// Bit this key asserts in the 64-bit keyboard mask.
    #[must_use]
    pub const fn mask_bit(&self) -> u64 {
        1 << (self.pa * 8 + self.pb)
    }

    /// Shift-class modifiers are held together with the following key
    /// rather than pressed in isolation.
    #[must_use]
    pub fn is_shift(&self) -> bool {
        self.token == "<LSHIFT>" || self.token == "<RSHIFT>"
    }
}

const fn key(token: &'static str, pa: u8, pb: u8) -> KeyDef {
    KeyDef { token, pa, pb }
}

/// Every recognised key token.
pub const KEY_TABLE: &[KeyDef] = &[
    // Named keys
    key("<RETURN>", 1, 0),
    key("<LSHIFT>", 7, 1),
    key("<RSHIFT>", 4, 6),
    key("<SPACE>", 4, 7),
    key("<DEL>", 0, 0),
    key("<HOME>", 3, 6),
    key("<RUNSTOP>", 7, 7),
    key("<CTRL>", 2, 7),
    key("<CBM>", 5, 7),
    key("<CRSR-DOWN>", 7, 0),
    key("<CRSR-RIGHT>", 2, 0),
    key("<F1>", 4, 0),
    key("<F3>", 5, 0),
    key("<F5>", 6, 0),
    key("<F7>", 3, 0),
    // Letters
    key("A", 2, 1),
    key("B", 4, 3),
    key("C", 4, 2),
    key("D", 2, 2),
    key("E", 6, 1),
    key("F", 5, 2),
    key("G", 2, 3),
    key("H", 5, 3),
    key("I", 1, 4),
    key("J", 2, 4),
    key("K", 5, 4),
    key("L", 2, 5),
    key("M", 4, 4),
    key("N", 7, 4),
    key("O", 6, 4),
    key("P", 1, 5),
    key("Q", 6, 7),
    key("R", 1, 2),
    key("S", 5, 1),
    key("T", 6, 2),
    key("U", 6, 3),
    key("V", 7, 3),
    key("W", 1, 1),
    key("X", 7, 2),
    key("Y", 1, 3),
    key("Z", 4, 1),
    // Digits
    key("0", 3, 4),
    key("1", 0, 7),
    key("2", 3, 7),
    key("3", 0, 1),
    key("4", 3, 1),
    key("5", 0, 2),
    key("6", 3, 2),
    key("7", 0, 3),
    key("8", 3, 3),
    key("9", 0, 4),
    // Punctuation
    key(" ", 4, 7),
    key("+", 0, 5),
    key("-", 3, 5),
    key("*", 1, 6),
    key("@", 6, 5),
    key(",", 7, 5),
    key(".", 4, 5),
    key(":", 5, 5),
    key(";", 2, 6),
    key("=", 5, 6),
    key("/", 7, 6),
];

/// Longest recognised token at the start of `script`.
///
/// Returns `None` when no token matches, which the injection session
/// treats as a script error at that position.
#[must_use]
pub fn match_longest(script: &str) -> Option<&'static KeyDef> {
    let mut best: Option<&'static KeyDef> = None;
    for def in KEY_TABLE {
        if script.starts_with(def.token)
            && best.is_none_or(|b| def.token.len() > b.token.len())
        {
            best = Some(def);
        }
    }
    best
}
