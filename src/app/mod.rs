//! Application state types and entry glue.
//!
//! Wraps the user list controller with the terminal-only concerns: theme,
//! key bindings, selection cursor, help overlay. The event loop lives in
//! `update` and is re-exported as `run`.
//!
pub mod keymap;
pub mod update;

use std::sync::Arc;
use std::time::Instant;

use ratatui::style::Color;

use crate::auth::AuthContext;
use crate::controller::UserListController;
use keymap::Keymap;

pub const THEME_FILE: &str = "theme.conf";

/// Color palette for theming the TUI.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Theme {
    pub text: Color,
    pub muted: Color,
    pub title: Color,
    pub border: Color,
    pub header_bg: Color,
    pub header_fg: Color,
    pub status_bg: Color,
    pub status_fg: Color,
    pub highlight_fg: Color,
    pub highlight_bg: Color,
    pub error_fg: Color,
}

impl Theme {
    /// Catppuccin Mocha palette.
    pub fn mocha() -> Self {
        Self {
            text: Color::Rgb(0xcd, 0xd6, 0xf4),
            muted: Color::Rgb(0x7f, 0x84, 0x9c),
            title: Color::Rgb(0xcb, 0xa6, 0xf7),
            border: Color::Rgb(0x58, 0x5b, 0x70),
            header_bg: Color::Rgb(0x31, 0x32, 0x44),
            header_fg: Color::Rgb(0xb4, 0xbe, 0xfe),
            status_bg: Color::Rgb(0x45, 0x47, 0x5a),
            status_fg: Color::Rgb(0xcd, 0xd6, 0xf4),
            highlight_fg: Color::Rgb(0xf9, 0xe2, 0xaf),
            highlight_bg: Color::Rgb(0x45, 0x47, 0x5a),
            error_fg: Color::Rgb(0xf3, 0x8b, 0xa8),
        }
    }

    /// Parse `key = color` lines on top of `mocha`.
    pub fn parse(contents: &str) -> Self {
        let mut theme = Self::mocha();
        for raw_line in contents.lines() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut parts = line.splitn(2, '=');
            let key = parts.next().map(|s| s.trim()).unwrap_or("");
            let val = parts.next().map(|s| s.trim()).unwrap_or("");
            let Some(color) = Self::parse_color(val) else { continue };
            if let Some(slot) = theme.slot_mut(key) {
                *slot = color;
            }
        }
        theme
    }

    pub fn from_file(path: &str) -> Option<Self> {
        let contents = std::fs::read_to_string(path).ok()?;
        Some(Self::parse(&contents))
    }

    fn slot_mut(&mut self, key: &str) -> Option<&mut Color> {
        Some(match key {
            "text" => &mut self.text,
            "muted" => &mut self.muted,
            "title" => &mut self.title,
            "border" => &mut self.border,
            "header_bg" => &mut self.header_bg,
            "header_fg" => &mut self.header_fg,
            "status_bg" => &mut self.status_bg,
            "status_fg" => &mut self.status_fg,
            "highlight_fg" => &mut self.highlight_fg,
            "highlight_bg" => &mut self.highlight_bg,
            "error_fg" => &mut self.error_fg,
            _ => return None,
        })
    }

    /// Parse "#RRGGBB", "RRGGBB" or "reset".
    fn parse_color(s: &str) -> Option<Color> {
        let lower = s.trim().to_ascii_lowercase();
        if lower == "reset" {
            return Some(Color::Reset);
        }
        let hex = lower.strip_prefix('#').unwrap_or(lower.as_str());
        if hex.len() != 6 {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Color::Rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    fn color_to_str(c: Color) -> String {
        match c {
            Color::Rgb(r, g, b) => format!("#{:02X}{:02X}{:02X}", r, g, b),
            Color::Reset => "reset".to_string(),
            Color::Black => "#000000".to_string(),
            Color::Red => "#FF0000".to_string(),
            Color::Yellow => "#FFFF00".to_string(),
            Color::Cyan => "#00FFFF".to_string(),
            Color::Gray => "#B3B3B3".to_string(),
            Color::DarkGray => "#4D4D4D".to_string(),
            Color::White => "#FFFFFF".to_string(),
            other => format!("{other}"),
        }
    }

    pub fn write_file(&self, path: &str) -> std::io::Result<()> {
        use std::fmt::Write as _;
        let mut buf = String::new();
        buf.push_str("# usradmin theme configuration\n");
        buf.push_str("# Colors: hex as #RRGGBB or RRGGBB, or 'reset'\n\n");
        let mut theme = *self;
        for key in [
            "text", "muted", "title", "border", "header_bg", "header_fg", "status_bg", "status_fg",
            "highlight_fg", "highlight_bg", "error_fg",
        ] {
            if let Some(color) = theme.slot_mut(key) {
                let _ = writeln!(&mut buf, "{} = {}", key, Self::color_to_str(*color));
            }
        }
        std::fs::write(path, buf)
    }

    /// Load `path`, or write and return `mocha` when it is missing.
    pub fn load_or_init(path: &str) -> Self {
        if std::path::Path::new(path).exists() {
            return Self::from_file(path).unwrap_or_else(Self::mocha);
        }
        let t = Self::mocha();
        let _ = t.write_file(path);
        t
    }
}

/// Which modal currently receives key input. At most one is topmost: the
/// create form, then a row's delete confirmation, then a row's edit panel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActiveModal {
    None,
    Help,
    Create,
    DeleteConfirm(String),
    Edit(String),
}

pub struct AppState {
    pub started_at: Instant,
    pub controller: UserListController,
    pub auth: Arc<dyn AuthContext>,
    pub endpoint: String,
    pub selected_user_index: usize,
    pub rows_per_page: usize,
    pub theme: Theme,
    pub keymap: Keymap,
    pub show_help: bool,
    pub should_quit: bool,
}

impl AppState {
    pub fn new(controller: UserListController, auth: Arc<dyn AuthContext>, endpoint: impl Into<String>) -> Self {
        Self {
            started_at: Instant::now(),
            controller,
            auth,
            endpoint: endpoint.into(),
            selected_user_index: 0,
            rows_per_page: 10,
            theme: Theme::mocha(),
            keymap: Keymap::default(),
            show_help: false,
            should_quit: false,
        }
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn with_keymap(mut self, keymap: Keymap) -> Self {
        self.keymap = keymap;
        self
    }

    /// Id of the highlighted row, if any.
    pub fn selected_id(&self) -> Option<String> {
        self.controller
            .rows()
            .get(self.selected_user_index)
            .map(|r| r.id().to_string())
    }

    /// Keep the cursor inside the current row list.
    pub fn clamp_selection(&mut self) {
        let len = self.controller.rows().len();
        if self.selected_user_index >= len {
            self.selected_user_index = len.saturating_sub(1);
        }
    }

    pub fn active_modal(&self) -> ActiveModal {
        use crate::controller::PageView;
        if self.show_help {
            return ActiveModal::Help;
        }
        // Modals only exist on top of a loaded list.
        if !matches!(self.controller.view(), PageView::List(_)) {
            return ActiveModal::None;
        }
        if self.controller.create_form().is_some() {
            return ActiveModal::Create;
        }
        let rows = self.controller.rows();
        if let Some(row) = rows.iter().find(|r| r.delete_confirm_open()) {
            return ActiveModal::DeleteConfirm(row.id().to_string());
        }
        if let Some(row) = rows.iter().find(|r| r.edit_panel_open()) {
            return ActiveModal::Edit(row.id().to_string());
        }
        ActiveModal::None
    }
}

/// Re-export the application event loop entry function.
pub use update::run_app as run;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn theme_parse_overrides_known_keys() {
        let t = Theme::parse("# c\ntitle = #010203\nerror_fg = reset\nunknown = #FFFFFF\nborder = nothex\n");
        assert_eq!(t.title, Color::Rgb(1, 2, 3));
        assert_eq!(t.error_fg, Color::Reset);
        assert_eq!(t.border, Theme::mocha().border);
    }
}
