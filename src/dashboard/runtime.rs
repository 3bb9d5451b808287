//! Interactive terminal runtime.
//!
//! A current-thread `tokio` runtime drives the event loop. Key events come
//! from a blocking reader thread over a channel; issued requests run as
//! spawned tasks and report back through the same channel, so the loop
//! never blocks on the backend.

#![allow(missing_docs)]

use std::io::{self, Stdout, Write};
use std::panic;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyEvent};
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, queue};
use tokio::sync::mpsc::{UnboundedSender, unbounded_channel};
use tracing::{debug, info};

use super::controller::DashboardController;
use super::input;
use super::model::{DashboardCmd, DashboardModel, DashboardMsg, Operation, Section};
use super::orchestrator::{Completion, Request, RequestOrchestrator};
use super::render::{self, RenderOptions, Tone};
use crate::backend::Backend;
use crate::core::errors::{FinsError, Result};

/// Presentation settings for the interactive session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeOptions {
    pub chart_width: usize,
    pub color: bool,
}

#[derive(Debug)]
enum RuntimeEvent {
    Key(KeyEvent),
    Resize,
    Completed(Completion),
    InputClosed,
}

/// Run the dashboard until the operator quits.
///
/// # Errors
/// Terminal setup/IO failures and runtime construction failures.
pub fn run_dashboard<B>(controller: DashboardController<B>, options: RuntimeOptions) -> Result<()>
where
    B: Backend + Clone + 'static,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| FinsError::Runtime {
            details: format!("tokio runtime: {error}"),
        })?;
    let guard = TerminalGuard::new().map_err(|source| FinsError::Terminal { source })?;
    let result = runtime.block_on(event_loop(controller, options));
    drop(guard);
    result
}

async fn event_loop<B>(
    mut controller: DashboardController<B>,
    options: RuntimeOptions,
) -> Result<()>
where
    B: Backend + Clone + 'static,
{
    let (tx, mut rx) = unbounded_channel();
    spawn_key_reader(tx.clone());
    let mut stdout = io::stdout();
    info!(section = controller.model().active.title(), "dashboard started");

    let model = controller.model();
    if model.active == Section::Analytics && model.auto_fetch_analytics {
        let cmd = controller.dispatch(DashboardMsg::Run(Operation::FetchAnalytics));
        apply_command(cmd, &controller, &tx);
    }
    paint(&mut stdout, controller.model(), options)?;

    while let Some(event) = rx.recv().await {
        let cmd = match event {
            RuntimeEvent::Key(key) => input::map_key(&key, controller.model().active)
                .map_or(DashboardCmd::None, |msg| controller.dispatch(msg)),
            RuntimeEvent::Resize => DashboardCmd::None,
            RuntimeEvent::Completed(completion) => {
                controller.dispatch(DashboardMsg::Completed(completion))
            }
            RuntimeEvent::InputClosed => DashboardCmd::Quit,
        };
        if !apply_command(cmd, &controller, &tx) {
            break;
        }
        paint(&mut stdout, controller.model(), options)?;
    }
    info!("dashboard stopped");
    Ok(())
}

/// Returns `false` when the loop should stop.
fn apply_command<B>(
    cmd: DashboardCmd,
    controller: &DashboardController<B>,
    tx: &UnboundedSender<RuntimeEvent>,
) -> bool
where
    B: Backend + Clone + 'static,
{
    match cmd {
        DashboardCmd::None => true,
        DashboardCmd::Issue(request) => {
            spawn_request(controller.orchestrator().clone(), request, tx.clone());
            true
        }
        DashboardCmd::Quit => false,
    }
}

fn spawn_request<B>(
    orchestrator: RequestOrchestrator<B>,
    request: Request,
    tx: UnboundedSender<RuntimeEvent>,
) where
    B: Backend + Clone + 'static,
{
    tokio::spawn(async move {
        let completion = orchestrator.execute(request).await;
        if tx.send(RuntimeEvent::Completed(completion)).is_err() {
            debug!("completion arrived after dashboard exit");
        }
    });
}

fn spawn_key_reader(tx: UnboundedSender<RuntimeEvent>) {
    thread::spawn(move || {
        loop {
            let forwarded = match event::read() {
                Ok(Event::Key(key)) => tx.send(RuntimeEvent::Key(key)),
                Ok(Event::Resize(..)) => tx.send(RuntimeEvent::Resize),
                Ok(_) => Ok(()),
                Err(_) => {
                    let _ = tx.send(RuntimeEvent::InputClosed);
                    return;
                }
            };
            if forwarded.is_err() {
                return;
            }
        }
    });
}

// ──────────────────── painting ────────────────────

fn paint(stdout: &mut Stdout, model: &DashboardModel, options: RuntimeOptions) -> Result<()> {
    let terminal_error = |source| FinsError::Terminal { source };
    let (cols, rows) = terminal::size().map_err(terminal_error)?;
    let lines = render::render(
        model,
        RenderOptions {
            width: usize::from(cols),
            chart_width: options.chart_width,
        },
    );

    queue!(stdout, MoveTo(0, 0), Clear(ClearType::All)).map_err(terminal_error)?;
    for (row, line) in (0..rows).zip(&lines) {
        queue!(stdout, MoveTo(0, row)).map_err(terminal_error)?;
        if options.color {
            queue!(stdout, SetForegroundColor(tone_color(line.tone))).map_err(terminal_error)?;
        }
        queue!(stdout, Print(&line.text), ResetColor).map_err(terminal_error)?;
    }
    stdout.flush().map_err(terminal_error)
}

const fn tone_color(tone: Tone) -> Color {
    match tone {
        Tone::Normal => Color::White,
        Tone::Heading => Color::Cyan,
        Tone::Muted => Color::DarkGrey,
        Tone::Accent => Color::Blue,
        Tone::Success => Color::Green,
        Tone::Error => Color::Red,
    }
}

// ──────────────────── terminal guard ────────────────────

/// Set while raw mode is active; checked by the panic hook.
static RAW_MODE_ACTIVE: AtomicBool = AtomicBool::new(false);

type PanicHook = dyn Fn(&panic::PanicHookInfo<'_>) + Send + Sync + 'static;

/// RAII guard: raw mode + alternate screen on creation, restored on drop
/// (including unwinding panics). The panic hook found at creation is put
/// back on drop.
struct TerminalGuard {
    prev_hook: Option<Arc<PanicHook>>,
}

impl TerminalGuard {
    fn new() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        RAW_MODE_ACTIVE.store(true, Ordering::SeqCst);
        let mut guard = Self { prev_hook: None };
        execute!(io::stdout(), EnterAlternateScreen, Hide)?;
        guard.prev_hook = Some(install_panic_hook());
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        restore_terminal_best_effort();
        if let Some(prev) = self.prev_hook.take() {
            restore_panic_hook(prev);
        }
    }
}

/// Wrap the current panic hook so the terminal is restored before it runs.
/// Returns the wrapped hook for [`restore_panic_hook`].
fn install_panic_hook() -> Arc<PanicHook> {
    let prev: Arc<PanicHook> = Arc::from(panic::take_hook());
    let chained = Arc::clone(&prev);
    panic::set_hook(Box::new(move |info| {
        restore_terminal_best_effort();
        chained(info);
    }));
    prev
}

/// Replace our hook with the one [`install_panic_hook`] wrapped.
fn restore_panic_hook(prev: Arc<PanicHook>) {
    drop(panic::take_hook());
    panic::set_hook(Box::new(move |info| prev(info)));
}

/// Safe to call repeatedly.
fn restore_terminal_best_effort() {
    if RAW_MODE_ACTIVE.swap(false, Ordering::SeqCst) {
        let _ = execute!(io::stdout(), Show, LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    #[test]
    fn restore_terminal_is_idempotent() {
        restore_terminal_best_effort();
        restore_terminal_best_effort();
        assert!(!RAW_MODE_ACTIVE.load(Ordering::SeqCst));
    }

    #[test]
    fn dropping_the_hook_restores_the_previous_one() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        panic::set_hook(Box::new(|_| {
            CALLS.fetch_add(1, Ordering::SeqCst);
        }));

        let prev = install_panic_hook();
        restore_panic_hook(prev);
        let before = CALLS.load(Ordering::SeqCst);
        let result = panic::catch_unwind(|| panic!("hook check"));

        drop(panic::take_hook());
        assert!(result.is_err());
        assert!(CALLS.load(Ordering::SeqCst) > before);
    }

    #[test]
    fn tones_have_distinct_status_colors() {
        assert_ne!(tone_color(Tone::Success), tone_color(Tone::Error));
        assert_eq!(tone_color(Tone::Error), Color::Red);
    }
}
