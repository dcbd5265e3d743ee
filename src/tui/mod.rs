pub mod app;
pub mod input;
pub mod ui;

use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{
    io::{self, Stdout},
    time::{Duration, Instant},
};

use crate::cli::config::TerminalConfig;
use app::App;
use input::map_key;

/// Upper bound on how long the loop waits for input without redrawing.
const IDLE_WAIT: Duration = Duration::from_millis(250);

pub fn start(config: TerminalConfig) -> Result<()> {
    log::info!("hexterm TUI starting...");

    let auto_open = config.auto_open;
    let mut app = App::new(config);

    crossterm::terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    let res = crossterm::execute!(stdout, crossterm::terminal::EnterAlternateScreen)
        .map_err(anyhow::Error::from)
        .and_then(|()| {
            let mut terminal = Terminal::new(CrosstermBackend::new(&mut stdout))?;
            let now = Instant::now();
            app.terminal.start(now);
            if auto_open {
                app.terminal.toggle_open(now);
            }
            run_app(&mut terminal, &mut app)
        });

    let stopped = shutdown(&mut app, restore_screen);
    log::info!("hexterm TUI stopped");
    res.and(stopped)
}

/// Close the port first, then hand the screen back.
fn shutdown(app: &mut App, restore: impl FnOnce() -> Result<()>) -> Result<()> {
    app.terminal.close();
    restore()
}

fn restore_screen() -> Result<()> {
    let mut stdout = io::stdout();
    let left = crossterm::execute!(stdout, crossterm::terminal::LeaveAlternateScreen);
    let raw = crossterm::terminal::disable_raw_mode();
    left?;
    raw?;
    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<&mut Stdout>>, app: &mut App) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|f| ui::render_ui(f, app))?;

        // Sleep in the input poll until the next timer is due.
        let now = Instant::now();
        let wait = app
            .terminal
            .next_deadline()
            .map(|deadline| deadline.saturating_duration_since(now))
            .unwrap_or(IDLE_WAIT)
            .min(IDLE_WAIT);

        if event::poll(wait)? {
            if let Event::Key(key) = event::read()? {
                // Only the initial press; ignore Repeat and Release.
                if key.kind == KeyEventKind::Press {
                    let action = map_key(key, app.focus);
                    app.handle(action, Instant::now());
                }
            }
        }

        app.terminal.poll(Instant::now());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{link::SerialConfig, loopback::LoopbackHandle, session::PortSession};

    #[test]
    fn port_is_closed_even_if_the_screen_is_not_restored() {
        let handle = LoopbackHandle::new();
        let config = TerminalConfig {
            serial: SerialConfig::new("loop0", 9600),
            ..Default::default()
        };
        let mut app = App::with_ports(config, PortSession::with_opener(handle.opener()), vec![]);
        app.terminal.open(Instant::now()).expect("loopback opens");

        let res = shutdown(&mut app, || Err(anyhow::anyhow!("tty went away")));
        assert!(res.is_err());
        assert!(!app.terminal.is_open());
    }
}
