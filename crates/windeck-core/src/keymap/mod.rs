//! Key translation for the keyboard input bridge.
//!
//! Operator key input arrives as DOM-style key names (`"Enter"`, `"ArrowUp"`,
//! `"a"`).  The Electron side expects its own synthetic key codes
//! (`"Return"`, `"Up"`, `"A"`).  This module is the single fixed table that
//! translates between the two, plus the allow-list rules deciding what gets
//! forwarded at all:
//!
//! - Input with a ctrl/alt/meta modifier held is never forwarded (those
//!   chords belong to the operator's own terminal).
//! - Single printable characters pass through uppercased.
//! - Named keys translate through the table below; anything else is ignored.
//!
//! Enter, Tab, and Backspace additionally require a synthetic key-up
//! immediately after the key-down — the remote side treats a lone key-down
//! for those keys as held.

/// A key press as captured from the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPress {
    /// DOM-style key value: a single character or a named key.
    pub key: String,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl KeyPress {
    /// A press with no modifiers held.
    pub fn plain(key: &str) -> Self {
        Self {
            key: key.to_string(),
            ctrl: false,
            alt: false,
            meta: false,
        }
    }
}

/// The synthetic key event to forward to the remote window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntheticKey {
    /// Electron key code (`"Return"`, `"Up"`, `"A"`, …).
    pub code: String,
    /// The original key value, echoed alongside the code.
    pub key: String,
    /// `true` when a key-up must be sent immediately after the key-down.
    pub press_and_release: bool,
}

/// Translates a named key to its Electron synthetic key code.
///
/// Returns `None` for names outside the allow-list.
pub fn named_key_code(name: &str) -> Option<&'static str> {
    match name {
        "Enter" => Some("Return"),
        "Backspace" => Some("Backspace"),
        "Tab" => Some("Tab"),
        "Escape" => Some("Escape"),
        "ArrowUp" => Some("Up"),
        "ArrowDown" => Some("Down"),
        "ArrowLeft" => Some("Left"),
        "ArrowRight" => Some("Right"),
        "Delete" => Some("Delete"),
        "Insert" => Some("Insert"),
        "Home" => Some("Home"),
        "End" => Some("End"),
        "PageUp" => Some("PageUp"),
        "PageDown" => Some("PageDown"),
        _ => None,
    }
}

/// Keys whose key-down must be paired with an immediate key-up.
fn needs_key_up(name: &str) -> bool {
    matches!(name, "Enter" | "Tab" | "Backspace")
}

/// Applies the allow-list and translates a press to its synthetic event.
///
/// Returns `None` when the press must be ignored: a modifier chord, a named
/// key outside the table, or a multi-character value that is not a named key.
pub fn translate(press: &KeyPress) -> Option<SyntheticKey> {
    if press.ctrl || press.alt || press.meta {
        return None;
    }

    let mut chars = press.key.chars();
    match (chars.next(), chars.next()) {
        // Exactly one character: printable passthrough, uppercased.
        (Some(c), None) => Some(SyntheticKey {
            code: c.to_uppercase().collect(),
            key: press.key.clone(),
            press_and_release: false,
        }),
        _ => {
            let code = named_key_code(&press.key)?;
            Some(SyntheticKey {
                code: code.to_string(),
                key: press.key.clone(),
                press_and_release: needs_key_up(&press.key),
            })
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enter_translates_to_return() {
        let synth = translate(&KeyPress::plain("Enter")).unwrap();
        assert_eq!(synth.code, "Return");
        assert_eq!(synth.key, "Enter");
    }

    #[test]
    fn test_arrow_keys_drop_the_arrow_prefix() {
        assert_eq!(translate(&KeyPress::plain("ArrowUp")).unwrap().code, "Up");
        assert_eq!(translate(&KeyPress::plain("ArrowDown")).unwrap().code, "Down");
        assert_eq!(translate(&KeyPress::plain("ArrowLeft")).unwrap().code, "Left");
        assert_eq!(translate(&KeyPress::plain("ArrowRight")).unwrap().code, "Right");
    }

    #[test]
    fn test_navigation_keys_translate_to_themselves() {
        for name in ["Delete", "Insert", "Home", "End", "PageUp", "PageDown", "Escape"] {
            let synth = translate(&KeyPress::plain(name)).unwrap();
            assert_eq!(synth.code, name, "named key {name} must map to itself");
        }
    }

    #[test]
    fn test_printable_character_is_uppercased() {
        let synth = translate(&KeyPress::plain("a")).unwrap();
        assert_eq!(synth.code, "A");
        // The original key value is forwarded unchanged.
        assert_eq!(synth.key, "a");
    }

    #[test]
    fn test_uppercase_character_stays_uppercase() {
        assert_eq!(translate(&KeyPress::plain("Z")).unwrap().code, "Z");
    }

    #[test]
    fn test_digit_and_punctuation_pass_through() {
        assert_eq!(translate(&KeyPress::plain("7")).unwrap().code, "7");
        assert_eq!(translate(&KeyPress::plain("/")).unwrap().code, "/");
        assert_eq!(translate(&KeyPress::plain(" ")).unwrap().code, " ");
    }

    #[test]
    fn test_enter_tab_backspace_request_key_up_pairing() {
        for name in ["Enter", "Tab", "Backspace"] {
            let synth = translate(&KeyPress::plain(name)).unwrap();
            assert!(synth.press_and_release, "{name} must send down+up");
        }
    }

    #[test]
    fn test_arrows_and_printables_send_key_down_only() {
        assert!(!translate(&KeyPress::plain("ArrowUp")).unwrap().press_and_release);
        assert!(!translate(&KeyPress::plain("x")).unwrap().press_and_release);
        assert!(!translate(&KeyPress::plain("Escape")).unwrap().press_and_release);
    }

    #[test]
    fn test_unlisted_named_keys_are_ignored() {
        assert_eq!(translate(&KeyPress::plain("F5")), None);
        assert_eq!(translate(&KeyPress::plain("CapsLock")), None);
        assert_eq!(translate(&KeyPress::plain("Shift")), None);
    }

    #[test]
    fn test_modifier_chords_are_ignored() {
        // Ctrl/Alt/Meta chords stay with the operator's terminal.
        let mut press = KeyPress::plain("c");
        press.ctrl = true;
        assert_eq!(translate(&press), None);

        let mut press = KeyPress::plain("Enter");
        press.alt = true;
        assert_eq!(translate(&press), None);

        let mut press = KeyPress::plain("x");
        press.meta = true;
        assert_eq!(translate(&press), None);
    }

    #[test]
    fn test_named_key_code_rejects_unknown_names() {
        assert_eq!(named_key_code("NotAKey"), None);
        assert_eq!(named_key_code(""), None);
    }
}
