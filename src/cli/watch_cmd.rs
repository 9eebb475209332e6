use std::io::{self, IsTerminal, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{self, ClearType},
    ExecutableCommand,
};
use tokio::sync::mpsc;

use crate::cli::context::AppContext;
use crate::cli::output::OutputOptions;
use crate::cli::renderer;
use crate::cli::report_cmd::{resolve_timeframe, ReportArgs};
use crate::core::controller::{ControllerView, ReportController};
use crate::core::timeframe::Timeframe;

const FOOTER: &str = "[r] refresh  [l] live  [y] yesterday  [w] 7 days  [m] 30 days  [q] quit";

#[derive(Debug, Clone, Copy, PartialEq)]
enum Command {
    Refresh,
    Select(Timeframe),
    Quit,
}

fn map_key(key: KeyEvent) -> Option<Command> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    match (key.code, key.modifiers) {
        (KeyCode::Char('c'), KeyModifiers::CONTROL) => Some(Command::Quit),
        (KeyCode::Char('q'), _) | (KeyCode::Esc, _) => Some(Command::Quit),
        (KeyCode::Char('r'), _) => Some(Command::Refresh),
        (KeyCode::Char('l'), _) => Some(Command::Select(Timeframe::Live)),
        (KeyCode::Char('y'), _) => Some(Command::Select(Timeframe::Yesterday)),
        (KeyCode::Char('w'), _) => Some(Command::Select(Timeframe::Last7Days)),
        (KeyCode::Char('m'), _) => Some(Command::Select(Timeframe::Last30Days)),
        _ => None,
    }
}

/// RAII guard that restores terminal state on drop (even on panic).
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        io::stdout().execute(cursor::Hide)?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = io::stdout().execute(cursor::Show);
        let _ = terminal::disable_raw_mode();
    }
}

// Key polling blocks, so it lives on the blocking pool and checks `stop`
// between polls.
fn spawn_key_reader(tx: mpsc::UnboundedSender<Command>, stop: Arc<AtomicBool>) {
    tokio::task::spawn_blocking(move || {
        while !stop.load(Ordering::Relaxed) {
            match event::poll(Duration::from_millis(200)) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) => {
                    tracing::warn!(error = %e, "keyboard polling failed");
                    break;
                }
            }
            if let Ok(Event::Key(key)) = event::read() {
                if let Some(command) = map_key(key) {
                    if tx.send(command).is_err() {
                        break;
                    }
                }
            }
        }
    });
}

fn draw(view: &ControllerView, opts: &OutputOptions, raw_mode: bool) -> Result<()> {
    if !opts.is_text() {
        return opts.print_json(view);
    }
    let mut stdout = io::stdout();
    stdout
        .execute(terminal::Clear(ClearType::All))?
        .execute(cursor::MoveTo(0, 0))?;
    let mut screen = renderer::render_dashboard(view, opts.use_color);
    if raw_mode {
        screen.push_str("\n\n ");
        screen.push_str(FOOTER);
        // Raw mode does not translate newlines into carriage returns.
        screen = screen.replace('\n', "\r\n");
    }
    write!(stdout, "{}", screen)?;
    if !raw_mode {
        writeln!(stdout)?;
    }
    stdout.flush()?;
    Ok(())
}

async fn next_command(keys: &mut Option<mpsc::UnboundedReceiver<Command>>) -> Option<Command> {
    match keys.as_mut() {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

fn start(controller: &ReportController, timeframe: Timeframe, args: &ReportArgs) -> Result<()> {
    if controller.set_timeframe(timeframe).is_none() {
        controller.set_custom_range(args.start, args.end)?;
        controller.apply_filters();
    }
    Ok(())
}

/// Live dashboard: redraw on every controller change until quit or logout.
pub async fn run(args: ReportArgs, ctx: &AppContext, opts: &OutputOptions) -> Result<()> {
    ctx.require_login()?;
    let timeframe = resolve_timeframe(args.timeframe, args.start, args.end)?;
    let controller = ctx.controller(args.campaign.as_deref());
    let mut changes = controller.subscribe();

    let interactive = opts.is_text() && io::stdin().is_terminal() && io::stdout().is_terminal();
    let stop = Arc::new(AtomicBool::new(false));
    let (raw_mode, mut keys) = if interactive {
        let guard = RawModeGuard::enable()?;
        let (tx, rx) = mpsc::unbounded_channel();
        spawn_key_reader(tx, stop.clone());
        (Some(guard), Some(rx))
    } else {
        (None, None)
    };

    start(&controller, timeframe, &args)?;
    draw(&controller.view(), opts, interactive)?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut expired = false;

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            command = next_command(&mut keys) => match command {
                Some(Command::Refresh) => {
                    controller.refresh();
                }
                Some(Command::Select(tf)) => {
                    controller.set_timeframe(tf);
                }
                Some(Command::Quit) | None => break,
            },
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                draw(&controller.view(), opts, interactive)?;
                if !ctx.session.is_authenticated() {
                    expired = true;
                    break;
                }
            }
        }
    }

    stop.store(true, Ordering::Relaxed);
    controller.shutdown();
    drop(raw_mode);

    if expired {
        ctx.forget_session_if_rejected();
        anyhow::bail!("Session expired. Run `calldash login` to sign in again.");
    }
    Ok(())
}
