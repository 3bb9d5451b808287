//! Pure update function for the Elm-style dashboard.
//!
//! `update()` takes the current model and a message, mutates the model, and
//! returns a command describing any side-effects the runtime should execute.
//!
//! **Design invariant:** this module performs zero I/O. All effects are
//! described as [`DashboardCmd`] values.

#![allow(missing_docs)]

use super::model::{DashboardCmd, DashboardModel, DashboardMsg, Operation, Outcome, Section};
use super::orchestrator;

/// Apply a message to the model and return the next command for the runtime.
///
/// Every state transition goes through this function.
pub fn update(model: &mut DashboardModel, msg: DashboardMsg) -> DashboardCmd {
    match msg {
        DashboardMsg::Navigate(section) => navigate(model, section),
        DashboardMsg::NavigateNext => navigate(model, model.active.next()),
        DashboardMsg::NavigatePrev => navigate(model, model.active.prev()),

        DashboardMsg::SetInput { section, value } => {
            model.section_mut(section).input = value;
            DashboardCmd::None
        }
        DashboardMsg::InputChar(c) => {
            if let Some(buffer) = model.focused_input_mut() {
                buffer.push(c);
            }
            DashboardCmd::None
        }
        DashboardMsg::InputBackspace => {
            if let Some(buffer) = model.focused_input_mut() {
                buffer.pop();
            }
            DashboardCmd::None
        }
        DashboardMsg::InputClear => {
            if let Some(buffer) = model.focused_input_mut() {
                buffer.clear();
            }
            DashboardCmd::None
        }

        DashboardMsg::SetFidelity(mode) => {
            model.set_fidelity(mode);
            DashboardCmd::None
        }
        DashboardMsg::ToggleFidelity => {
            model.set_fidelity(model.fidelity.toggled());
            DashboardCmd::None
        }

        DashboardMsg::Submit => match model.active.operation() {
            Some(op) => run(model, op),
            None => {
                save_form(model);
                DashboardCmd::None
            }
        },
        DashboardMsg::Run(op) => run(model, op),

        DashboardMsg::ToggleRow(index) => {
            model.toggle_row(index);
            DashboardCmd::None
        }
        DashboardMsg::ToggleSelectedRow => {
            model.toggle_row(model.selected_row);
            DashboardCmd::None
        }
        DashboardMsg::CursorUp => {
            match model.active {
                Section::FindMetadata => {
                    model.row_cursor_up();
                }
                Section::Datasources => {
                    model.credential_cursor_up();
                }
                _ => {}
            }
            DashboardCmd::None
        }
        DashboardMsg::CursorDown => {
            match model.active {
                Section::FindMetadata => {
                    model.row_cursor_down();
                }
                Section::Datasources => {
                    model.credential_cursor_down();
                }
                _ => {}
            }
            DashboardCmd::None
        }

        DashboardMsg::FocusNextField => {
            model.credential_form.focus = model.credential_form.focus.next();
            DashboardCmd::None
        }
        DashboardMsg::FocusPrevField => {
            model.credential_form.focus = model.credential_form.focus.prev();
            DashboardCmd::None
        }
        DashboardMsg::SaveCredential(record) => {
            model.credentials.save(record);
            DashboardCmd::None
        }
        DashboardMsg::SaveCredentialForm => {
            save_form(model);
            DashboardCmd::None
        }
        DashboardMsg::RemoveCredential(index) => {
            model.credentials.remove(index);
            model.clamp_credential_cursor();
            DashboardCmd::None
        }
        DashboardMsg::RemoveSelectedCredential => {
            model.credentials.remove(model.selected_credential);
            model.clamp_credential_cursor();
            DashboardCmd::None
        }

        DashboardMsg::Completed(completion) => {
            orchestrator::finish(model, completion);
            DashboardCmd::None
        }

        DashboardMsg::Quit => {
            model.quit = true;
            DashboardCmd::Quit
        }
    }
}

fn navigate(model: &mut DashboardModel, section: Section) -> DashboardCmd {
    let entered = model.navigate_to(section);
    let wants_fetch = entered
        && section == Section::Analytics
        && model.auto_fetch_analytics
        && model.section(Section::Analytics).outcome == Outcome::Idle;
    if wants_fetch {
        run(model, Operation::FetchAnalytics)
    } else {
        DashboardCmd::None
    }
}

fn run(model: &mut DashboardModel, op: Operation) -> DashboardCmd {
    orchestrator::begin(model, op).map_or(DashboardCmd::None, DashboardCmd::Issue)
}

fn save_form(model: &mut DashboardModel) {
    let record = model.credential_form.take();
    model.credentials.save(record);
}
