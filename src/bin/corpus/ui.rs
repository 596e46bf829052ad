//! Status view: body panel, keyboard rows and the transport-style header.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use super::app::App;
use super::keymap::{LOWER_ROW, UPPER_ROW};

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // header
            Constraint::Min(5),    // body panel
            Constraint::Length(4), // keyboard
            Constraint::Length(1), // help bar
        ])
        .split(frame.area());

    render_header(frame, chunks[0], app);
    render_body_panel(frame, chunks[1], app);
    render_keyboard(frame, chunks[2], app);

    let help = Paragraph::new(
        " [Esc] Quit  [Enter] Build  [Tab] Material  [Space] Panic  \
         [\u{2190}\u{2192}] Length  [\u{2191}\u{2193}] Width  [PgUp/PgDn] Height  Play: Z-, / Q-I",
    )
    .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, chunks[3]);
}

fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let snapshot = &app.latest;
    let built = if snapshot.built {
        Span::styled("built", Style::default().fg(Color::Green))
    } else {
        Span::styled("not built", Style::default().fg(Color::Yellow))
    };

    let line = Line::from(vec![
        Span::styled(
            format!(" {}  ", app.material),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(
                "{:.0} x {:.0} x {:.0} cm  ",
                app.dims.length_cm(),
                app.dims.width_cm(),
                app.dims.height_cm()
            ),
            Style::default().fg(Color::White),
        ),
        built,
        Span::styled(
            format!("  gain {:.2}{}  ", snapshot.master_gain, if snapshot.saturation { " +sat" } else { "" }),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
            format!("voices {:>2}  ", snapshot.voice_count),
            Style::default().fg(Color::White),
        ),
        Span::styled(
            format!("{:.1} kHz  ", app.sample_rate / 1000.0),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
            format!("peak {:.2}", snapshot.peak),
            Style::default().fg(Color::Magenta),
        ),
    ]);

    let block = Block::default().title(" corpus ").borders(Borders::ALL);
    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn render_body_panel(frame: &mut Frame, area: Rect, app: &App) {
    let lines = vec![
        Line::from(Span::styled(
            app.describe(),
            Style::default().fg(Color::White),
        )),
        Line::default(),
        Line::from(Span::styled(
            app.status.clone(),
            Style::default().fg(Color::Yellow),
        )),
    ];

    let block = Block::default().title(" Body ").borders(Borders::ALL);
    frame.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: true }).block(block),
        area,
    );
}

fn render_keyboard(frame: &mut Frame, area: Rect, app: &App) {
    let rows = vec![
        key_row(&UPPER_ROW, &app.latest.held),
        key_row(&LOWER_ROW, &app.latest.held),
    ];

    let block = Block::default().title(" Keyboard ").borders(Borders::ALL);
    frame.render_widget(Paragraph::new(rows).block(block), area);
}

fn key_row(row: &[(char, u8)], held: &[bool; 128]) -> Line<'static> {
    let mut spans = Vec::with_capacity(row.len() + 1);
    spans.push(Span::raw(" "));
    for (ch, pitch) in row {
        let sharp = matches!(pitch % 12, 1 | 3 | 6 | 8 | 10);
        let style = if held[*pitch as usize] {
            Style::default().fg(Color::Black).bg(Color::Green)
        } else if sharp {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default().fg(Color::White)
        };
        spans.push(Span::styled(format!(" {} ", ch.to_ascii_uppercase()), style));
    }
    Line::from(spans)
}
