use ratatui::style::{Color, Modifier, Style};

use crate::core::message::MessageKind;

/// Header and body styling for one kind of message.
#[derive(Debug, Clone)]
pub struct MessageStyle {
    pub title: &'static str,
    pub icon: &'static str,
    pub title_style: Style,
    pub text_style: Style,
}

#[derive(Debug, Clone)]
pub struct Theme {
    pub name: &'static str,
    // Indexed by `MessageKind::index`
    pub messages: [MessageStyle; 4],

    // Prose
    pub heading_style: Style,
    pub inline_code_style: Style,
    pub link_style: Style,
    pub rule_style: Style,

    // Code fences
    pub code_label_style: Style,
    pub code_style: Style,

    // Edit blocks
    pub edit_header_style: Style,
    pub edit_adds_style: Style,
    pub edit_dels_style: Style,
    pub search_style: Style,
    pub replace_style: Style,

    // Find-in-transcript marks
    pub match_style: Style,
    pub current_match_style: Style,
}

impl Theme {
    pub fn dark_default() -> Self {
        Theme {
            name: "dark",
            messages: [
                MessageStyle {
                    title: "You",
                    icon: "›",
                    title_style: Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                    text_style: Style::default().fg(Color::Cyan),
                },
                MessageStyle {
                    title: "Assistant",
                    icon: "●",
                    title_style: Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD),
                    text_style: Style::default().fg(Color::White),
                },
                MessageStyle {
                    title: "System",
                    icon: "⚙",
                    title_style: Style::default().fg(Color::Gray),
                    text_style: Style::default().fg(Color::DarkGray),
                },
                MessageStyle {
                    title: "Notice",
                    icon: "◆",
                    title_style: Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                    text_style: Style::default().fg(Color::Yellow),
                },
            ],

            heading_style: Style::default()
                .fg(Color::LightBlue)
                .add_modifier(Modifier::BOLD),
            inline_code_style: Style::default().fg(Color::LightYellow),
            link_style: Style::default()
                .fg(Color::LightBlue)
                .add_modifier(Modifier::UNDERLINED),
            rule_style: Style::default().fg(Color::DarkGray),

            code_label_style: Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
            code_style: Style::default().fg(Color::Gray),

            edit_header_style: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
            edit_adds_style: Style::default().fg(Color::Green),
            edit_dels_style: Style::default().fg(Color::Red),
            search_style: Style::default().fg(Color::Red),
            replace_style: Style::default().fg(Color::Green),

            match_style: Style::default().fg(Color::Black).bg(Color::Yellow),
            current_match_style: Style::default()
                .fg(Color::Black)
                .bg(Color::LightRed)
                .add_modifier(Modifier::BOLD),
        }
    }

    pub fn light() -> Self {
        Theme {
            name: "light",
            messages: [
                MessageStyle {
                    title: "You",
                    icon: "›",
                    title_style: Style::default()
                        .fg(Color::Blue)
                        .add_modifier(Modifier::BOLD),
                    text_style: Style::default().fg(Color::Blue),
                },
                MessageStyle {
                    title: "Assistant",
                    icon: "●",
                    title_style: Style::default()
                        .fg(Color::Black)
                        .add_modifier(Modifier::BOLD),
                    text_style: Style::default().fg(Color::Black),
                },
                MessageStyle {
                    title: "System",
                    icon: "⚙",
                    title_style: Style::default().fg(Color::DarkGray),
                    text_style: Style::default().fg(Color::Gray),
                },
                MessageStyle {
                    title: "Notice",
                    icon: "◆",
                    title_style: Style::default()
                        .fg(Color::Magenta)
                        .add_modifier(Modifier::BOLD),
                    text_style: Style::default().fg(Color::Magenta),
                },
            ],

            heading_style: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            inline_code_style: Style::default().fg(Color::Magenta),
            link_style: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::UNDERLINED),
            rule_style: Style::default().fg(Color::Gray),

            code_label_style: Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::ITALIC),
            code_style: Style::default().fg(Color::DarkGray),

            edit_header_style: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
            edit_adds_style: Style::default().fg(Color::Green),
            edit_dels_style: Style::default().fg(Color::Red),
            search_style: Style::default().fg(Color::Red),
            replace_style: Style::default().fg(Color::Green),

            match_style: Style::default().bg(Color::LightYellow),
            current_match_style: Style::default()
                .bg(Color::LightMagenta)
                .add_modifier(Modifier::BOLD),
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "dark" | "default" | "default-dark" => Self::dark_default(),
            "light" => Self::light(),
            // Fallback
            _ => Self::dark_default(),
        }
    }

    pub fn message_style(&self, kind: MessageKind) -> &MessageStyle {
        &self.messages[kind.index()]
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark_default()
    }
}
