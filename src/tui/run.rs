//! Terminal UI entry point and setup.

use std::io;

use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{prelude::CrosstermBackend, Terminal};

use crate::clock::Clock;
use crate::controller::TaskList;
use crate::fields::Theme;
use crate::storage::Storage;
use crate::tui::app::App;

/// Initialise the terminal, run the UI until the user quits, then restore
/// the terminal. Deletes still animating when the user quits are applied
/// before returning.
pub fn run_tui<S: Storage, C: Clock>(list: &mut TaskList<S, C>, theme: Theme) -> anyhow::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(list, theme);
    let result = app.run(&mut terminal);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    result?;
    list.flush_deferred()?;
    Ok(())
}
