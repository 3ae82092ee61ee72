//! Typed remote command set for window and web-contents control.
//!
//! The server's `control_electron_BrowserWindow` and
//! `control_electron_WebContents` procedures accept a scripted action string
//! (`"win.focus()"`, `"webContents.sendInputEvent({...})"`).  Rather than
//! templating those strings at every call site, the console builds one of the
//! enums below and serializes it at the RPC boundary.  This keeps the remote
//! action set explicit and typed, and confines string escaping to a single
//! function — operator-controlled key values cannot break out of the script.

/// Mouse buttons accepted by the `cdp_click` procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl MouseButton {
    /// The wire name of the button.
    pub fn as_str(&self) -> &'static str {
        match self {
            MouseButton::Left => "left",
            MouseButton::Right => "right",
            MouseButton::Middle => "middle",
        }
    }
}

/// Direction of a synthetic key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDirection {
    Down,
    Up,
}

impl KeyDirection {
    /// The `type` field of the Electron input event.
    pub fn event_type(&self) -> &'static str {
        match self {
            KeyDirection::Down => "keyDown",
            KeyDirection::Up => "keyUp",
        }
    }
}

/// Actions executed against the remote `BrowserWindow` object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowCommand {
    /// Bring the window to the foreground.
    Focus,
    /// Reload the window's current page.
    Reload,
}

impl WindowCommand {
    /// The RPC procedure these commands are sent through.
    pub const PROCEDURE: &'static str = "control_electron_BrowserWindow";

    /// The scripted action string the server executes.
    pub fn script(&self) -> &'static str {
        match self {
            WindowCommand::Focus => "win.focus()",
            WindowCommand::Reload => "win.reload()",
        }
    }
}

/// Actions executed against the remote `webContents` object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentCommand {
    /// Inject a synthetic key event.
    SendKey {
        /// Electron key code, e.g. `"Return"` or `"A"`.
        code: String,
        /// The original key value, e.g. `"Enter"` or `"a"`.
        key: String,
        direction: KeyDirection,
    },
}

impl ContentCommand {
    /// The RPC procedure these commands are sent through.
    pub const PROCEDURE: &'static str = "control_electron_WebContents";

    /// Serializes the command to the server's scripted action string.
    ///
    /// The exact shape is a fixed wire contract:
    /// `webContents.sendInputEvent({type: 'keyDown', keyCode: 'Return', key: 'Enter'})`.
    pub fn script(&self) -> String {
        match self {
            ContentCommand::SendKey { code, key, direction } => format!(
                "webContents.sendInputEvent({{type: '{}', keyCode: '{}', key: '{}'}})",
                direction.event_type(),
                escape_single_quoted(code),
                escape_single_quoted(key),
            ),
        }
    }
}

/// Escapes a value for embedding inside a single-quoted script literal.
///
/// Backslashes are doubled first so the quote escape cannot itself be
/// re-escaped into a bare quote.
fn escape_single_quoted(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_focus_serializes_to_win_focus() {
        assert_eq!(WindowCommand::Focus.script(), "win.focus()");
    }

    #[test]
    fn test_reload_serializes_to_win_reload() {
        assert_eq!(WindowCommand::Reload.script(), "win.reload()");
    }

    #[test]
    fn test_window_commands_target_browser_window_procedure() {
        assert_eq!(WindowCommand::PROCEDURE, "control_electron_BrowserWindow");
    }

    #[test]
    fn test_send_key_down_matches_wire_format_exactly() {
        let cmd = ContentCommand::SendKey {
            code: "Return".to_string(),
            key: "Enter".to_string(),
            direction: KeyDirection::Down,
        };
        assert_eq!(
            cmd.script(),
            "webContents.sendInputEvent({type: 'keyDown', keyCode: 'Return', key: 'Enter'})"
        );
    }

    #[test]
    fn test_send_key_up_uses_key_up_event_type() {
        let cmd = ContentCommand::SendKey {
            code: "Tab".to_string(),
            key: "Tab".to_string(),
            direction: KeyDirection::Up,
        };
        assert_eq!(
            cmd.script(),
            "webContents.sendInputEvent({type: 'keyUp', keyCode: 'Tab', key: 'Tab'})"
        );
    }

    #[test]
    fn test_content_commands_target_web_contents_procedure() {
        assert_eq!(ContentCommand::PROCEDURE, "control_electron_WebContents");
    }

    #[test]
    fn test_quote_in_key_value_is_escaped() {
        // A raw quote would otherwise terminate the script literal early.
        let cmd = ContentCommand::SendKey {
            code: "'".to_string(),
            key: "'".to_string(),
            direction: KeyDirection::Down,
        };
        let script = cmd.script();
        assert!(script.contains("keyCode: '\\''"), "got: {script}");
        assert!(!script.contains("keyCode: '''"));
    }

    #[test]
    fn test_backslash_is_escaped_before_quotes() {
        // The sequence \' in the input must not collapse into an unescaped quote.
        let cmd = ContentCommand::SendKey {
            code: "\\'".to_string(),
            key: "x".to_string(),
            direction: KeyDirection::Down,
        };
        assert!(cmd.script().contains("keyCode: '\\\\\\''"));
    }

    #[test]
    fn test_mouse_button_wire_names() {
        assert_eq!(MouseButton::Left.as_str(), "left");
        assert_eq!(MouseButton::Right.as_str(), "right");
        assert_eq!(MouseButton::Middle.as_str(), "middle");
    }

    #[test]
    fn test_key_direction_event_types() {
        assert_eq!(KeyDirection::Down.event_type(), "keyDown");
        assert_eq!(KeyDirection::Up.event_type(), "keyUp");
    }
}
