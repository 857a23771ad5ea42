//! Terminal rendering: alert log, controls, and the report table.

mod theme;

pub use theme::Theme;

use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Cell, List, ListItem, Row, Table};
use ratatui::Frame;

use crate::app::App;

/// Help text shown in the controls pane.
pub const INFO: [&str; 5] = [
    "press q to quit",
    "press s to resume monitoring",
    "press p to pause monitoring",
    "availability: % of status code 200",
    "unsuccessful requests may have timed out",
];

/// Render the whole screen: messages and controls on top, the report
/// table below.
pub fn render(frame: &mut Frame, app: &App) {
    let chunks =
        Layout::vertical([Constraint::Length(11), Constraint::Min(8)]).split(frame.area());
    let top =
        Layout::horizontal([Constraint::Ratio(2, 3), Constraint::Ratio(1, 3)]).split(chunks[0]);

    render_messages(frame, app, top[0]);
    render_controls(frame, app, top[1]);
    render_reports(frame, app, chunks[1]);
}

fn bordered(title: &'static str, app: &App) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border))
        .title(title)
}

fn render_messages(frame: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .messages
        .iter()
        .map(|line| {
            ListItem::new(Line::styled(
                line.message.clone(),
                app.theme.alert_style(line.kind),
            ))
        })
        .collect();
    frame.render_widget(List::new(items).block(bordered("Messages", app)), area);
}

fn render_controls(frame: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = INFO
        .iter()
        .map(|info| ListItem::new(Line::styled(*info, Style::default().fg(app.theme.info))))
        .collect();
    frame.render_widget(List::new(items).block(bordered("Controls", app)), area);
}

fn render_reports(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let header = Row::new(vec![
        Cell::from("website").style(theme.header),
        Cell::from("period").style(theme.header),
        Cell::from("average response").style(theme.header),
        Cell::from("max response time").style(theme.header),
        Cell::from("availability").style(theme.header),
        Cell::from("2XX").style(Style::default().fg(theme.healthy)),
        Cell::from("5XX").style(Style::default().fg(theme.critical)),
        Cell::from("4XX").style(Style::default().fg(theme.info)),
        Cell::from("Unsuccessful %").style(Style::default().fg(theme.unsuccessful)),
    ]);

    let rows: Vec<Row> = app
        .summaries()
        .into_iter()
        .map(|cells| {
            Row::new(
                cells
                    .into_iter()
                    .map(|cell| Cell::from(cell.text).style(theme.cell_style(cell.tone)))
                    .collect::<Vec<Cell>>(),
            )
        })
        .collect();

    let widths = [
        Constraint::Min(26),
        Constraint::Length(12),
        Constraint::Length(17),
        Constraint::Length(18),
        Constraint::Length(13),
        Constraint::Length(8),
        Constraint::Length(8),
        Constraint::Length(8),
        Constraint::Length(14),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(bordered("Reports", app));
    frame.render_widget(table, area);
}
