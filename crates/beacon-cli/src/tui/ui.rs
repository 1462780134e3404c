//! Layout and rendering for the dashboard.
//!
//! - **Header**: title and session state
//! - **Readings**: the seven display slots
//! - **Charts**: one panel per chart group, one sparkline per series
//! - **Status bar**: available keys and the last status message

use beacon_core::{ChartGroup, DeviceFactory, SeriesKind, SessionState};
use ratatui::prelude::*;
use ratatui::widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Sparkline, Table};

use super::app::App;
use super::charts::{Trace, resample, sparkline_data};

const BORDER_TYPE: BorderType = BorderType::Rounded;

/// Width of the readings panel.
const READINGS_WIDTH: u16 = 44;

fn series_color(kind: SeriesKind) -> Color {
    match kind {
        SeriesKind::Temperature => Color::Red,
        SeriesKind::Humidity => Color::Cyan,
        SeriesKind::Illuminance => Color::Yellow,
        SeriesKind::BatteryVoltage => Color::Green,
    }
}

fn state_color(state: SessionState) -> Color {
    match state {
        SessionState::Disconnected => Color::DarkGray,
        SessionState::Scanning => Color::Yellow,
        SessionState::Connected => Color::Green,
    }
}

/// Draw the complete dashboard.
pub fn draw<F: DeviceFactory>(frame: &mut Frame, app: &App<F>) {
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header bar
            Constraint::Min(1),    // Main content
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    draw_header(frame, main_layout[0], app);

    let content = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(READINGS_WIDTH), Constraint::Min(1)])
        .split(main_layout[1]);

    draw_readings(frame, content[0], app);
    draw_charts(frame, content[1], app);
    draw_status_bar(frame, main_layout[2], app);
}

fn draw_header<F: DeviceFactory>(frame: &mut Frame, area: Rect, app: &App<F>) {
    let state = app.session().state();
    let line = Line::from(vec![
        Span::styled(
            " Logger Beacon ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(" {} ", state),
            Style::default().fg(state_color(state)),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn draw_readings<F: DeviceFactory>(frame: &mut Frame, area: Rect, app: &App<F>) {
    let slots = app.session().presenter().slots();
    let rows: Vec<Row> = slots
        .rows()
        .into_iter()
        .map(|(caption, value)| {
            Row::new(vec![
                Cell::from(caption).style(Style::default().add_modifier(Modifier::BOLD)),
                Cell::from(value.to_string()),
            ])
        })
        .collect();

    let table = Table::new(rows, [Constraint::Length(16), Constraint::Min(1)]).block(
        Block::default()
            .title(" Readings ")
            .borders(Borders::ALL)
            .border_type(BORDER_TYPE),
    );
    frame.render_widget(table, area);
}

fn draw_charts<F: DeviceFactory>(frame: &mut Frame, area: Rect, app: &App<F>) {
    let panels = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Ratio(2, 4),
            Constraint::Ratio(1, 4),
            Constraint::Ratio(1, 4),
        ])
        .split(area);

    let charts = app.session().presenter().sink();
    for (group, panel) in ChartGroup::ALL.into_iter().zip(panels.iter()) {
        draw_chart_panel(frame, *panel, group, charts.traces(group));
    }
}

fn draw_chart_panel(frame: &mut Frame, area: Rect, group: ChartGroup, traces: &[Trace]) {
    let block = Block::default()
        .title(format!(" {} ", group.title()))
        .borders(Borders::ALL)
        .border_type(BORDER_TYPE);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if traces.is_empty() {
        return;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            traces
                .iter()
                .map(|_| Constraint::Ratio(1, traces.len() as u32))
                .collect::<Vec<_>>(),
        )
        .split(inner);

    for (trace, row) in traces.iter().zip(rows.iter()) {
        let parts = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(0)])
            .split(*row);

        let color = series_color(trace.kind);
        let latest = trace
            .latest()
            .map(|v| v.to_string())
            .unwrap_or_else(|| "-".to_string());
        let label = Line::from(vec![
            Span::styled(format!("{} ", trace.label()), Style::default().fg(color)),
            Span::raw(latest),
            Span::styled(
                format!("  ({} pts)", trace.values.len()),
                Style::default().fg(Color::DarkGray),
            ),
        ]);
        frame.render_widget(Paragraph::new(label), parts[0]);

        if !trace.values.is_empty() && parts[1].height > 0 {
            let data = resample(&sparkline_data(&trace.values), parts[1].width as usize);
            let sparkline = Sparkline::default()
                .data(&data)
                .max(100)
                .style(Style::default().fg(color));
            frame.render_widget(sparkline, parts[1]);
        }
    }
}

fn draw_status_bar<F: DeviceFactory>(frame: &mut Frame, area: Rect, app: &App<F>) {
    let controls = app.session().controls();
    let mut spans = Vec::new();
    if controls.connect_visible {
        spans.push(Span::styled(" [c] Connect ", Style::default().fg(Color::Green)));
    }
    if controls.disconnect_visible {
        spans.push(Span::styled(" [d] Disconnect ", Style::default().fg(Color::Yellow)));
    }
    spans.push(Span::raw(" [q] Quit "));
    if !app.status().is_empty() {
        spans.push(Span::styled(
            format!(" {} ", app.status()),
            Style::default().fg(Color::DarkGray),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::input::Action;
    use beacon_core::MockDevice;
    use beacon_core::mock::synthetic_frame;
    use ratatui::backend::TestBackend;

    fn render<F: DeviceFactory>(app: &App<F>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(110, 30)).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    fn app() -> App<impl DeviceFactory<Device = MockDevice>> {
        App::new(|| MockDevice::with_unique_name("Leafony_AC02", "desk"))
    }

    #[tokio::test]
    async fn test_disconnected_layout() {
        let app = app();
        let screen = render(&app);

        assert!(screen.contains("Logger Beacon"));
        assert!(screen.contains("disconnected"));
        assert!(screen.contains("Device Name"));
        assert!(screen.contains("Battery Voltage"));
        assert!(screen.contains("[c] Connect"));
        assert!(!screen.contains("[d] Disconnect"));
    }

    #[tokio::test]
    async fn test_connected_layout_shows_frame() {
        let mut app = app();
        app.apply(Action::Connect).await;
        app.session().device().push_frame(&synthetic_frame(0));
        app.tick();

        let screen = render(&app);
        assert!(screen.contains("Connected to Leafony_AC02"));
        assert!(screen.contains("[d] Disconnect"));
        assert!(!screen.contains("[c] Connect"));
        assert!(screen.contains("Leafony_AC02"));
        assert!(screen.contains("desk"));
        assert!(screen.contains("(1 pts)"));
    }
}
