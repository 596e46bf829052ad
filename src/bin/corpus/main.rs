//! corpus - shape a piano body in the terminal and play it.
//!
//! Run with: cargo run --bin corpus

mod app;
mod keymap;
mod ui;

use app::App;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let app = App::new()?;
    let mut terminal = ratatui::init();
    let result = app.run(&mut terminal);
    ratatui::restore();
    result
}
