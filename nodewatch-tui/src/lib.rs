pub mod clipboard;
pub mod keys;
pub mod node_monitor;

pub use clipboard::SystemClipboard;
pub use keys::{Action, InputMode, action_for};
pub use node_monitor::NodeMonitor;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use nodewatch_core::{Backend, RunController};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;
use url::Url;

const FRAME_POLL: Duration = Duration::from_millis(100);
const PAGE_LINES: usize = 20;

/// Everything the UI needs besides the controller.
pub struct UiContext {
    /// Node list submitted on `s`.
    pub source: String,
    /// Shown in the progress panel.
    pub source_label: String,
    /// Base used to resolve export links.
    pub server: Url,
    /// Where `w` writes the exported file.
    pub download_dir: PathBuf,
}

/// Run the node table until the user quits. Any run still in progress is
/// left running on the service.
pub async fn run<B: Backend>(controller: &mut RunController<B>, ctx: UiContext) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut monitor = NodeMonitor::new(ctx.source_label.clone());
    let result = event_loop(&mut terminal, &mut monitor, controller, &ctx).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn event_loop<B: Backend, T: ratatui::backend::Backend>(
    terminal: &mut Terminal<T>,
    monitor: &mut NodeMonitor,
    controller: &mut RunController<B>,
    ctx: &UiContext,
) -> Result<()> {
    loop {
        controller.drain().await;
        draw(terminal, monitor, controller)?;

        if !event::poll(FRAME_POLL)? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        let Some(action) = action_for(key, monitor.mode()) else {
            continue;
        };

        if action == Action::Quit {
            break;
        }
        apply(action, terminal, monitor, controller, ctx).await?;
    }

    Ok(())
}

fn draw<B: Backend, T: ratatui::backend::Backend>(
    terminal: &mut Terminal<T>,
    monitor: &mut NodeMonitor,
    controller: &mut RunController<B>,
) -> Result<()> {
    if controller.state_mut().edit.take_focus_request()
        && let Some(id) = controller.state().edit.editing_id()
        && let Some(row) = controller.state().nodes().position(id)
    {
        monitor.cursor = row;
    }
    let banner = controller.error_message().map(str::to_string);
    terminal.draw(|f| monitor.render(f, controller.state(), banner.as_deref()))?;
    Ok(())
}

/// Draw once with a pending message before awaiting a request, since the
/// loop cannot redraw until it returns.
fn show_pending<B: Backend, T: ratatui::backend::Backend>(
    message: String,
    terminal: &mut Terminal<T>,
    monitor: &mut NodeMonitor,
    controller: &mut RunController<B>,
) -> Result<()> {
    monitor.set_pending(message);
    draw(terminal, monitor, controller)
}

async fn apply<B: Backend, T: ratatui::backend::Backend>(
    action: Action,
    terminal: &mut Terminal<T>,
    monitor: &mut NodeMonitor,
    controller: &mut RunController<B>,
    ctx: &UiContext,
) -> Result<()> {
    let len = controller.state().nodes().len();
    let cursor_id = monitor.cursor_id(controller.state());

    // Failures are already in the notice log and banner; the UI only needs
    // to keep going.
    match action {
        Action::Quit => {}
        Action::Start => {
            show_pending("Validating and starting...".to_string(), terminal, monitor, controller)?;
            if let Err(e) = controller.start_check(&ctx.source).await {
                debug!("Start not taken: {}", e);
            }
            monitor.top();
        }
        Action::Stop => {
            show_pending("Stopping...".to_string(), terminal, monitor, controller)?;
            controller.stop_check().await;
        }
        Action::Recheck => {
            if let Some(id) = cursor_id
                && controller.state().can_recheck()
            {
                let label = controller
                    .state()
                    .node(id)
                    .map(|n| n.label().to_string())
                    .unwrap_or_default();
                show_pending(format!("Rechecking {}...", label), terminal, monitor, controller)?;
                if let Err(e) = controller.recheck_node(id).await {
                    debug!("Recheck not applied: {}", e);
                }
            }
        }
        Action::BeginEdit => {
            if let Some(id) = cursor_id
                && controller.start_edit(id).is_ok()
            {
                monitor.mode = InputMode::Editing;
            }
        }
        Action::Insert(c) => {
            if let Some(draft) = controller.edit_draft_mut() {
                draft.push(c);
            }
        }
        Action::Backspace => {
            if let Some(draft) = controller.edit_draft_mut() {
                draft.pop();
            }
        }
        Action::SaveEdit => {
            monitor.mode = InputMode::Browse;
            show_pending("Renaming...".to_string(), terminal, monitor, controller)?;
            if let Err(e) = controller.save_edit().await {
                debug!("Rename not applied: {}", e);
            }
        }
        Action::CancelEdit => {
            monitor.mode = InputMode::Browse;
            controller.cancel_edit();
        }
        Action::BeginDelete => {
            if let Some(id) = cursor_id
                && let Some(prompt) = controller.delete_prompt(id)
            {
                monitor.mode = InputMode::ConfirmDelete { id, prompt };
            }
        }
        Action::ConfirmDelete => {
            if let InputMode::ConfirmDelete { id, .. } = std::mem::take(&mut monitor.mode) {
                show_pending("Deleting...".to_string(), terminal, monitor, controller)?;
                if let Err(e) = controller.delete_node(id, &mut |_: &str| true).await {
                    debug!("Delete not applied: {}", e);
                }
            }
        }
        Action::DeclineDelete => {
            monitor.mode = InputMode::Browse;
        }
        Action::ToggleRow => {
            if let Some(id) = cursor_id {
                controller.toggle_selected(id);
            }
            monitor.down(len);
        }
        Action::ToggleAll => {
            let all_selected = controller.state().selection().len() == len;
            controller.toggle_all(!all_selected);
        }
        Action::Export => {
            show_pending("Exporting...".to_string(), terminal, monitor, controller)?;
            match controller.export().await {
                Ok(_) => monitor.open_export(),
                Err(e) => debug!("Export not produced: {}", e),
            }
        }
        Action::ViewExport => {
            if controller.export_session().is_some() {
                monitor.open_export();
            } else {
                controller
                    .state_mut()
                    .notices
                    .warn("Nothing exported yet; press E first");
            }
        }
        Action::CloseExport => monitor.close_export(),
        Action::WriteExport => {
            if let Err(e) = controller.download_export(&ctx.download_dir) {
                debug!("Export not written: {}", e);
            }
        }
        Action::CopyExport => {
            if let Err(e) = controller.copy_export(&mut SystemClipboard) {
                debug!("Export not copied: {}", e);
            }
        }
        Action::ShowImportLink => {
            if let Some(link) = controller.import_link(&ctx.server) {
                controller.state_mut().notices.info(format!("Import link: {}", link));
            }
        }
        Action::Up | Action::Down | Action::PageUp | Action::PageDown | Action::Top | Action::Bottom
            if *monitor.mode() == InputMode::ViewExport =>
        {
            let lines = controller
                .export_session()
                .map(|session| session.document.lines().count())
                .unwrap_or(0);
            let delta = match action {
                Action::Up => -1,
                Action::Down => 1,
                Action::PageUp => -(PAGE_LINES as isize),
                Action::PageDown => PAGE_LINES as isize,
                Action::Top => -(lines as isize),
                _ => lines as isize,
            };
            monitor.scroll_export(delta, lines);
        }
        Action::Up => monitor.up(),
        Action::Down => monitor.down(len),
        Action::PageUp => monitor.page_up(),
        Action::PageDown => monitor.page_down(len),
        Action::Top => monitor.top(),
        Action::Bottom => monitor.bottom(len),
    }

    monitor.clear_pending();
    monitor.clamp(controller.state().nodes().len());
    Ok(())
}
