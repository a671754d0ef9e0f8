use crate::keys::InputMode;
use nodewatch_client::{FieldValue, Node, NodeId};
use nodewatch_core::{
    AppState, NoticeLevel, RiskClass, RunState, SharedClass, risk_class, shared_class,
};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Gauge, List, ListItem, Paragraph, Row, Table, Wrap},
};

const PAGE: usize = 10;

/// View state for the node table: cursor, scroll and input mode. The data
/// itself lives in the controller's [`AppState`].
pub struct NodeMonitor {
    pub(crate) cursor: usize,
    scroll: usize,
    pub(crate) mode: InputMode,
    /// Shown in the hint bar while a request is outstanding.
    pending: Option<String>,
    source_label: String,
    /// First document line shown in the export view.
    export_scroll: usize,
}

impl NodeMonitor {
    pub fn new(source_label: impl Into<String>) -> Self {
        Self {
            cursor: 0,
            scroll: 0,
            mode: InputMode::Browse,
            pending: None,
            source_label: source_label.into(),
            export_scroll: 0,
        }
    }

    /// Switch to the export view, starting at the top of the document.
    pub fn open_export(&mut self) {
        self.mode = InputMode::ViewExport;
        self.export_scroll = 0;
    }

    pub fn close_export(&mut self) {
        self.mode = InputMode::Browse;
    }

    /// Move the export view by `delta` lines, kept within `lines`.
    pub fn scroll_export(&mut self, delta: isize, lines: usize) {
        let last = lines.saturating_sub(1);
        self.export_scroll = self.export_scroll.saturating_add_signed(delta).min(last);
    }

    pub fn mode(&self) -> &InputMode {
        &self.mode
    }

    pub fn cursor_id(&self, state: &AppState) -> Option<NodeId> {
        state.nodes().at(self.cursor).map(|n| n.id)
    }

    pub fn set_pending(&mut self, message: impl Into<String>) {
        self.pending = Some(message.into());
    }

    pub fn clear_pending(&mut self) {
        self.pending = None;
    }

    /// Keep the cursor on a row after the list shrinks.
    pub fn clamp(&mut self, len: usize) {
        self.cursor = self.cursor.min(len.saturating_sub(1));
    }

    pub fn up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn down(&mut self, len: usize) {
        if len > 0 {
            self.cursor = (self.cursor + 1).min(len - 1);
        }
    }

    pub fn page_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(PAGE);
    }

    pub fn page_down(&mut self, len: usize) {
        if len > 0 {
            self.cursor = (self.cursor + PAGE).min(len - 1);
        }
    }

    pub fn top(&mut self) {
        self.cursor = 0;
    }

    pub fn bottom(&mut self, len: usize) {
        self.cursor = len.saturating_sub(1);
    }

    pub fn render(&mut self, f: &mut Frame, state: &AppState, banner: Option<&str>) {
        let vertical_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(10), Constraint::Length(1)])
            .split(f.area());

        let main_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(68), Constraint::Percentage(32)])
            .split(vertical_chunks[0]);

        let right_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(9), Constraint::Min(5)])
            .split(main_chunks[1]);

        self.render_nodes(f, main_chunks[0], state);
        self.render_progress(f, right_chunks[0], state, banner);
        self.render_notices(f, right_chunks[1], state);
        self.render_hints(f, vertical_chunks[1], state);

        if self.mode == InputMode::ViewExport {
            self.render_export(f, vertical_chunks[0], state);
        }
    }

    fn render_export(&self, f: &mut Frame, area: Rect, state: &AppState) {
        let Some(session) = &state.export else {
            return;
        };
        let popup = centered(area, 80, 85);
        f.render_widget(Clear, popup);

        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" Export: {} ", session.filename))
            .border_style(Style::default().fg(Color::Green));
        let inner = block.inner(popup);
        f.render_widget(block, popup);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(1)])
            .split(inner);

        let url = Line::from(vec![
            Span::styled("URL: ", Style::default().fg(Color::DarkGray)),
            Span::styled(session.url.clone(), Style::default().fg(Color::Cyan)),
        ]);
        f.render_widget(Paragraph::new(url), chunks[0]);

        let scroll = u16::try_from(self.export_scroll).unwrap_or(u16::MAX);
        let document = Paragraph::new(session.document.as_str()).scroll((scroll, 0));
        f.render_widget(document, chunks[1]);
    }

    fn render_nodes(&mut self, f: &mut Frame, area: Rect, state: &AppState) {
        let title = format!(
            " Nodes ({} / {} selected) ",
            state.selection().len(),
            state.nodes().len()
        );
        let block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(Style::default().fg(Color::Cyan));

        let inner = block.inner(area);

        if state.nodes().is_empty() {
            f.render_widget(block, area);
            let empty_msg = Paragraph::new("No nodes yet. Press s to start a check.")
                .style(Style::default().fg(Color::DarkGray))
                .wrap(Wrap { trim: true });
            f.render_widget(empty_msg, inner);
            return;
        }

        // One line for the header row.
        let height = (inner.height as usize).saturating_sub(1).max(1);
        self.clamp(state.nodes().len());
        if self.cursor < self.scroll {
            self.scroll = self.cursor;
        } else if self.cursor >= self.scroll + height {
            self.scroll = self.cursor + 1 - height;
        }

        let header = Row::new(
            ["", "Name", "IP", "Risk", "Shared", "Type", "Native", "Source", "Status"]
                .into_iter()
                .map(|h| Cell::from(h).style(Style::default().add_modifier(Modifier::BOLD))),
        )
        .style(Style::default().fg(Color::Gray));

        let rows: Vec<Row> = state
            .nodes()
            .iter()
            .enumerate()
            .skip(self.scroll)
            .take(height)
            .map(|(idx, node)| self.node_row(idx, node, state))
            .collect();

        let table = Table::new(
            rows,
            [
                Constraint::Length(3),
                Constraint::Min(18),
                Constraint::Length(15),
                Constraint::Length(6),
                Constraint::Length(10),
                Constraint::Length(8),
                Constraint::Length(7),
                Constraint::Length(7),
                Constraint::Length(8),
            ],
        )
        .header(header)
        .block(block);

        f.render_widget(table, area);
    }

    fn node_row<'a>(&self, idx: usize, node: &'a Node, state: &'a AppState) -> Row<'a> {
        let checkbox = if state.is_selected(node.id) { "[x]" } else { "[ ]" };

        let name = match state.edit.draft() {
            Some(draft) if state.edit.is_editing(node.id) => Cell::from(format!("{}▏", draft))
                .style(Style::default().fg(Color::Black).bg(Color::Yellow)),
            _ => Cell::from(node.name.as_str()).style(risk_style(&node.risk)),
        };

        let status = match &node.error {
            Some(_) => Cell::from("error").style(Style::default().fg(Color::Red)),
            None => Cell::from(node.status.as_str()),
        };

        let mut style = Style::default();
        if idx == self.cursor {
            style = style.bg(Color::DarkGray).add_modifier(Modifier::BOLD);
        }

        Row::new(vec![
            Cell::from(checkbox),
            name,
            field_cell(&node.ip),
            field_cell(&node.risk).style(risk_style(&node.risk)),
            field_cell(&node.shared).style(shared_style(&node.shared)),
            field_cell(&node.ip_type),
            field_cell(&node.native),
            field_cell(&node.source),
            status,
        ])
        .style(style)
    }

    fn render_progress(&self, f: &mut Frame, area: Rect, state: &AppState, banner: Option<&str>) {
        let (title, border_color) = match state.run {
            RunState::Running => (" Running ", Color::Yellow),
            RunState::Validating | RunState::Starting => (" Starting ", Color::Yellow),
            RunState::Idle => (" Progress ", Color::Green),
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(Style::default().fg(border_color));

        let inner = block.inner(area);
        f.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(1)])
            .split(inner);

        let progress = &state.progress;
        let ratio = if progress.total == 0 {
            0.0
        } else {
            (progress.done as f64 / progress.total as f64).clamp(0.0, 1.0)
        };
        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(Color::Cyan).bg(Color::Black))
            .ratio(ratio)
            .label(format!("{}/{}", progress.done, progress.total));
        f.render_widget(gauge, chunks[0]);

        let mut text = vec![
            Line::from(vec![
                Span::styled("State: ", Style::default().fg(Color::DarkGray)),
                Span::styled(state.run.as_str(), Style::default().fg(Color::Cyan)),
            ]),
            Line::from(vec![
                Span::styled("File: ", Style::default().fg(Color::DarkGray)),
                Span::raw(self.source_label.clone()),
            ]),
        ];

        if !progress.current.is_empty() {
            text.push(Line::from(vec![
                Span::styled("Now: ", Style::default().fg(Color::DarkGray)),
                Span::styled(
                    progress.current.clone(),
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                ),
            ]));
        }

        if let Some(session) = &state.export {
            text.push(Line::from(vec![
                Span::styled("Export: ", Style::default().fg(Color::DarkGray)),
                Span::styled(session.filename.clone(), Style::default().fg(Color::Green)),
            ]));
        }

        if let Some(message) = banner {
            text.push(Line::from(Span::styled(
                message.to_string(),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )));
        }

        let paragraph = Paragraph::new(text).wrap(Wrap { trim: true });
        f.render_widget(paragraph, chunks[1]);
    }

    fn render_notices(&self, f: &mut Frame, area: Rect, state: &AppState) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Log ")
            .border_style(Style::default().fg(Color::Magenta));

        let inner = block.inner(area);
        f.render_widget(block, area);

        let height = inner.height as usize;
        let skip = state.notices.len().saturating_sub(height);

        let items: Vec<ListItem> = state
            .notices
            .iter()
            .skip(skip)
            .map(|notice| {
                let (prefix, style) = match notice.level {
                    NoticeLevel::Info => ("INFO ", Style::default().fg(Color::Blue)),
                    NoticeLevel::Warn => ("WARN ", Style::default().fg(Color::Yellow)),
                    NoticeLevel::Error => ("ERROR", Style::default().fg(Color::Red)),
                };
                ListItem::new(format!(
                    "{} [{}] {}",
                    notice.at.format("%H:%M:%S"),
                    prefix,
                    notice.message
                ))
                .style(style)
            })
            .collect();

        f.render_widget(List::new(items), inner);
    }

    fn render_hints(&self, f: &mut Frame, area: Rect, state: &AppState) {
        let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Black).bg(Color::Gray));

        let hints = if let Some(pending) = &self.pending {
            Line::from(Span::styled(
                format!(" {} ", pending),
                Style::default().fg(Color::Yellow),
            ))
        } else {
            match &self.mode {
                InputMode::Editing => Line::from(vec![
                    key(" Enter "),
                    Span::raw(" Save  "),
                    key(" Esc "),
                    Span::raw(" Cancel"),
                ]),
                InputMode::ConfirmDelete { prompt, .. } => Line::from(vec![
                    Span::styled(format!(" {} ", prompt), Style::default().fg(Color::Yellow)),
                    key(" y "),
                    Span::raw(" Yes  "),
                    key(" n "),
                    Span::raw(" No"),
                ]),
                InputMode::ViewExport => Line::from(vec![
                    key(" ↑/↓ "),
                    Span::raw(" Scroll  "),
                    key(" w "),
                    Span::raw(" Save  "),
                    key(" c "),
                    Span::raw(" Copy  "),
                    key(" i "),
                    Span::raw(" Link  "),
                    key(" Esc "),
                    Span::raw(" Close"),
                ]),
                InputMode::Browse if state.run == RunState::Running => Line::from(vec![
                    key(" x "),
                    Span::raw(" Stop  "),
                    key(" space "),
                    Span::raw(" Toggle  "),
                    key(" a "),
                    Span::raw(" All  "),
                    key(" ↑/↓ "),
                    Span::raw(" Move  "),
                    key(" q "),
                    Span::raw(" Quit"),
                ]),
                InputMode::Browse => Line::from(vec![
                    key(" s "),
                    Span::raw(" Start  "),
                    key(" r "),
                    Span::raw(" Recheck  "),
                    key(" e "),
                    Span::raw(" Rename  "),
                    key(" d "),
                    Span::raw(" Delete  "),
                    key(" space/a "),
                    Span::raw(" Select  "),
                    key(" E "),
                    Span::raw(" Export  "),
                    key(" v "),
                    Span::raw(" View  "),
                    key(" w/c/i "),
                    Span::raw(" Save/Copy/Link  "),
                    key(" q "),
                    Span::raw(" Quit"),
                ]),
            }
        };

        let paragraph = Paragraph::new(hints).style(Style::default().bg(Color::Black).fg(Color::Gray));
        f.render_widget(paragraph, area);
    }
}

/// A rectangle `percent_x` by `percent_y` of `area`, centred in it.
fn centered(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

fn field_cell(value: &FieldValue) -> Cell<'_> {
    Cell::from(value.as_str())
}

fn risk_style(risk: &FieldValue) -> Style {
    let color = match risk_class(risk.as_str()) {
        Some(RiskClass::White) => Color::White,
        Some(RiskClass::Green) => Color::Green,
        Some(RiskClass::Yellow) => Color::Yellow,
        Some(RiskClass::Orange) => Color::LightRed,
        Some(RiskClass::Red) => Color::Red,
        Some(RiskClass::Black) => Color::Magenta,
        None => return Style::default(),
    };
    Style::default().fg(color)
}

fn shared_style(shared: &FieldValue) -> Style {
    let color = match shared_class(shared.as_str()) {
        Some(SharedClass::Green) => Color::Green,
        Some(SharedClass::Yellow) => Color::Yellow,
        Some(SharedClass::Orange) => Color::LightRed,
        Some(SharedClass::Red) => Color::Red,
        Some(SharedClass::Black) => Color::Magenta,
        None => return Style::default(),
    };
    Style::default().fg(color)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodewatch_core::ExportSession;
    use ratatui::{Terminal, backend::TestBackend};

    fn state() -> AppState {
        let mut state = AppState::new();
        let mut hk = Node::new(0, "HK 01");
        hk.risk = "12%".into();
        state.reset_nodes(vec![hk, Node::new(1, "JP 02"), Node::new(2, "US 03")]);
        state
    }

    fn screen(monitor: &mut NodeMonitor, state: &AppState, banner: Option<&str>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(140, 30)).unwrap();
        terminal
            .draw(|f| monitor.render(f, state, banner))
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn cursor_stays_in_bounds() {
        let mut monitor = NodeMonitor::new("nodes.yaml");
        monitor.up();
        assert_eq!(monitor.cursor, 0);

        monitor.page_down(3);
        assert_eq!(monitor.cursor, 2);
        monitor.down(3);
        assert_eq!(monitor.cursor, 2);

        monitor.clamp(1);
        assert_eq!(monitor.cursor, 0);
        monitor.bottom(0);
        assert_eq!(monitor.cursor, 0);
    }

    #[test]
    fn cursor_id_follows_list_order() {
        let state = state();
        let mut monitor = NodeMonitor::new("nodes.yaml");
        monitor.down(state.nodes().len());
        assert_eq!(monitor.cursor_id(&state), Some(NodeId(1)));
    }

    #[test]
    fn renders_rows_and_banner() {
        let state = state();
        let mut monitor = NodeMonitor::new("nodes.yaml");
        let text = screen(&mut monitor, &state, Some("Clash API unreachable"));

        assert!(text.contains("HK 01"));
        assert!(text.contains("US 03"));
        assert!(text.contains("3 / 3 selected"));
        assert!(text.contains("Clash API unreachable"));
    }

    #[test]
    fn export_view_shows_document_and_url() {
        let mut state = state();
        state.export = Some(ExportSession {
            document: "proxies:\n  - name: HK 01\n    type: ss\n".to_string(),
            filename: "nodes_checked.yaml".to_string(),
            url: "/download/nodes_checked.yaml".to_string(),
        });
        let mut monitor = NodeMonitor::new("nodes.yaml");
        monitor.open_export();

        let text = screen(&mut monitor, &state, None);
        assert!(text.contains("Export: nodes_checked.yaml"));
        assert!(text.contains("URL: /download/nodes_checked.yaml"));
        assert!(text.contains("proxies:"));
        assert!(text.contains("type: ss"));
        assert!(text.contains("Close"));

        monitor.scroll_export(1, 3);
        let text = screen(&mut monitor, &state, None);
        assert!(!text.contains("proxies:"));
        assert!(text.contains("type: ss"));

        monitor.close_export();
        let text = screen(&mut monitor, &state, None);
        assert!(!text.contains("URL: /download"));
    }

    #[test]
    fn export_scroll_stays_in_document() {
        let mut monitor = NodeMonitor::new("nodes.yaml");
        monitor.open_export();
        monitor.scroll_export(-5, 10);
        assert_eq!(monitor.export_scroll, 0);
        monitor.scroll_export(50, 10);
        assert_eq!(monitor.export_scroll, 9);
        monitor.open_export();
        assert_eq!(monitor.export_scroll, 0);
    }

    #[test]
    fn renders_empty_hint() {
        let state = AppState::new();
        let mut monitor = NodeMonitor::new("nodes.yaml");
        let text = screen(&mut monitor, &state, None);
        assert!(text.contains("No nodes yet"));
    }
}
