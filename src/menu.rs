use colored::*;
use std::io::{self, Write};

/// One row of the static menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuOption {
    pub key: char,
    pub label: &'static str,
}

pub const SHOW_MENU_KEY: char = 'm';
pub const QUIT_KEY: char = 'q';

pub const MENU_OPTIONS: [MenuOption; 7] = [
    MenuOption { key: '1', label: "File Management" },
    MenuOption { key: '2', label: "Process Management" },
    MenuOption { key: '3', label: "Network Tools" },
    MenuOption { key: '4', label: "System Information" },
    MenuOption { key: '5', label: "Package Management" },
    MenuOption { key: SHOW_MENU_KEY, label: "Show this menu" },
    MenuOption { key: QUIT_KEY, label: "Quit heycli" },
];

/// What selecting a menu key does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    ShowMenu,
    Quit,
    Topic(&'static str),
}

/// A key known to be in the menu table, resolved to its action at parse time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuKey {
    key: char,
    action: MenuAction,
}

impl MenuKey {
    /// Accepts exactly one character naming a menu row, case-insensitively
    pub fn parse(input: &str) -> Option<Self> {
        let mut chars = input.chars();
        let key = chars.next()?.to_ascii_lowercase();
        if chars.next().is_some() {
            return None;
        }

        let option = MENU_OPTIONS.iter().find(|option| option.key == key)?;
        let action = match option.key {
            SHOW_MENU_KEY => MenuAction::ShowMenu,
            QUIT_KEY => MenuAction::Quit,
            _ => MenuAction::Topic(option.label),
        };
        Some(MenuKey { key, action })
    }

    pub fn key(self) -> char {
        self.key
    }

    pub fn action(self) -> MenuAction {
        self.action
    }
}

pub const INVALID_OPTION_MESSAGE: &str = "Invalid option. Type 'm' to see the menu.";

/// Prompt sent to the model when a topic is picked from the menu
pub fn topic_prompt(label: &str) -> String {
    format!("Provide a brief overview and common commands for {}.", label)
}

pub fn write_menu<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "heycli Menu:".bold().cyan())?;
    for option in MENU_OPTIONS.iter() {
        writeln!(out, "{}: {}", option.key.to_string().green(), option.label)?;
    }
    Ok(())
}
