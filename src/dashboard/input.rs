//! Key routing for the terminal dashboard.
//!
//! Global keys first (quit, section navigation), then section keys, then
//! plain characters into the focused buffer.

#![allow(missing_docs)]

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::model::{DashboardMsg, Section};

/// Map a key event to a message for the given visible section.
#[must_use]
pub fn map_key(key: &KeyEvent, active: Section) -> Option<DashboardMsg> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);

    match key.code {
        KeyCode::Esc => Some(DashboardMsg::Quit),
        KeyCode::Char('c') if ctrl => Some(DashboardMsg::Quit),

        KeyCode::Char(c @ '1'..='5') if alt => {
            let n = u8::try_from(c.to_digit(10)?).ok()?;
            Section::from_number(n).map(DashboardMsg::Navigate)
        }
        KeyCode::F(n) => Section::from_number(n).map(DashboardMsg::Navigate),
        KeyCode::Right if ctrl => Some(DashboardMsg::NavigateNext),
        KeyCode::Left if ctrl => Some(DashboardMsg::NavigatePrev),
        KeyCode::Tab if active == Section::Datasources => Some(DashboardMsg::FocusNextField),
        KeyCode::BackTab if active == Section::Datasources => Some(DashboardMsg::FocusPrevField),
        KeyCode::Tab => Some(DashboardMsg::NavigateNext),
        KeyCode::BackTab => Some(DashboardMsg::NavigatePrev),

        KeyCode::Enter => Some(DashboardMsg::Submit),
        KeyCode::Up => Some(DashboardMsg::CursorUp),
        KeyCode::Down => Some(DashboardMsg::CursorDown),
        KeyCode::Backspace => Some(DashboardMsg::InputBackspace),

        KeyCode::Char('u') if ctrl => Some(DashboardMsg::InputClear),
        KeyCode::Char('t') if ctrl && active == Section::FindMetadata => {
            Some(DashboardMsg::ToggleFidelity)
        }
        KeyCode::Char('e') if ctrl && active == Section::FindMetadata => {
            Some(DashboardMsg::ToggleSelectedRow)
        }
        KeyCode::Char('d') if ctrl && active == Section::Datasources => {
            Some(DashboardMsg::RemoveSelectedCredential)
        }

        KeyCode::Char(c) if !ctrl && !alt => Some(DashboardMsg::InputChar(c)),
        _ => None,
    }
}
