//! Raw mode and alternate screen handling for the dashboard.
//!
//! Every exit path (normal restore, a failed setup step, a panic) goes
//! through [`leave_screen`], so the shell is never left in raw mode.

use std::io::{self, IsTerminal, Stdout, Write};

use crossterm::{
    cursor::Show,
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::{DipwatchError, Result};

pub type Tui = Terminal<CrosstermBackend<Stdout>>;

fn io_error(context: &'static str) -> impl Fn(io::Error) -> DipwatchError {
    move |e| DipwatchError::Io(format!("{context}: {e}"))
}

/// Fails unless the dashboard has a terminal to draw on.
fn ensure_interactive(is_terminal: bool) -> Result<()> {
    if is_terminal {
        Ok(())
    } else {
        Err(DipwatchError::Io(
            "the dashboard needs an interactive terminal; set DIPWATCH_HEADLESS=1 to run without one"
                .to_string(),
        ))
    }
}

/// Leaves the alternate screen, shows the cursor and drops raw mode.
///
/// Every step is attempted; the first failure is returned.
fn leave_screen(out: &mut impl Write) -> io::Result<()> {
    let screen = execute!(out, LeaveAlternateScreen, Show);
    let raw = disable_raw_mode();
    screen.and(raw)
}

/// Switches stdout to raw mode on the alternate screen.
///
/// # Errors
///
/// Returns [`DipwatchError::Io`] when stdout is not a TTY or a setup step
/// fails. Steps already taken are undone first.
pub fn setup_terminal() -> Result<Tui> {
    ensure_interactive(io::stdout().is_terminal())?;
    enable_raw_mode().map_err(io_error("failed to enable raw mode"))?;

    let mut stdout = io::stdout();
    if let Err(e) = execute!(stdout, EnterAlternateScreen) {
        let _ = leave_screen(&mut stdout);
        return Err(io_error("failed to enter alternate screen")(e));
    }

    Terminal::new(CrosstermBackend::new(stdout)).map_err(|e| {
        let _ = leave_screen(&mut io::stdout());
        io_error("failed to create terminal")(e)
    })
}

/// Hands the terminal back to the shell.
pub fn restore_terminal(terminal: &mut Tui) -> Result<()> {
    leave_screen(terminal.backend_mut()).map_err(io_error("failed to restore terminal"))
}

/// Leaves raw mode and the alternate screen before the default panic
/// handler prints, so the message is readable.
pub fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = leave_screen(&mut io::stdout());
        previous(info);
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_terminal_output_points_at_headless_mode() {
        assert!(ensure_interactive(true).is_ok());
        match ensure_interactive(false) {
            Err(DipwatchError::Io(message)) => assert!(message.contains("DIPWATCH_HEADLESS")),
            other => panic!("expected io error, got {other:?}"),
        }
    }

    #[test]
    fn io_errors_carry_their_context() {
        let error = io_error("failed to draw")(io::Error::other("broken pipe"));
        assert_eq!(error.to_string(), DipwatchError::Io("failed to draw: broken pipe".into()).to_string());
    }
}
