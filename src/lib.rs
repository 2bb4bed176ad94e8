use color_eyre::eyre::eyre;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::path::{Path, PathBuf};
use std::time::Instant;

use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph, StatefulWidget, Wrap};
use ratatui::{buffer::Buffer, layout::Rect, widgets::Widget};

pub mod cache;
pub mod chart_export;
pub mod cli;
pub mod column;
pub mod config;
pub mod dashboard;
pub mod distribution;
pub mod export;
pub mod filter;
pub mod logging;
pub mod selector;
pub mod widgets;
pub mod workbook;

pub use cache::CacheManager;
pub use cli::Args;
pub use config::{AppConfig, ColorParser, ConfigManager, SheetConfig, Theme};
pub use dashboard::{compute_view, DashboardState, DashboardView};
pub use distribution::Distribution;
pub use export::ExportArtifact;
pub use filter::{ColumnFilter, FilterKind, FilterSet};
pub use selector::SheetSelector;
pub use workbook::{Sheet, Workbook};

use chart_export::{pie_file_name, write_pie_png};
use widgets::controls::Controls;
use widgets::datatable::{DataTableView, TableViewState};
use widgets::debug::DebugState;
use widgets::pie::PieChart;
use widgets::sidebar::{filter_items, FilterItem, FilterList, FilterListState, SheetList};

/// Application name used for cache directory and other app-specific paths
pub const APP_NAME: &str = "ggcdash";

const FILTER_PAGE: isize = 10;

pub enum AppEvent {
    Key(KeyEvent),
    Open(PathBuf),
    DoLoad(PathBuf), // Internal event to actually perform loading after UI update
    Export,
    ExportChart,
    Exit,
    Crash(String),
    Resize(u16, u16), // resized (width, height)
}

/// Which panel receives navigation keys.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    #[default]
    Sheets,
    Filters,
    Table,
    Chart,
}

impl Focus {
    const ORDER: [Focus; 4] = [Focus::Sheets, Focus::Filters, Focus::Table, Focus::Chart];

    fn position(self) -> usize {
        Self::ORDER.iter().position(|f| *f == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ORDER[(self.position() + 1) % Self::ORDER.len()]
    }

    pub fn previous(self) -> Self {
        Self::ORDER[(self.position() + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }
}

#[derive(Default)]
pub struct ErrorModal {
    pub active: bool,
    pub message: String,
}

impl ErrorModal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self, message: String) {
        self.active = true;
        self.message = message;
    }

    pub fn hide(&mut self) {
        self.active = false;
        self.message.clear();
    }
}

pub struct App {
    config: AppConfig,
    theme: Theme,
    workbook: Option<Workbook>,
    selector: Option<SheetSelector>,
    state: Option<DashboardState>,
    view: Option<DashboardView>,
    pub focus: Focus,
    pub filter_list: FilterListState,
    pub table_state: TableViewState,
    export_dir: PathBuf,
    initial_sheet: Option<String>,
    pub error_modal: ErrorModal,
    pub show_help: bool,
    status: Option<String>,
    loading: Option<PathBuf>,
    debug: DebugState,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    pub fn new() -> App {
        let theme = Theme::from_config(&AppConfig::default().theme).unwrap_or_else(|e| {
            tracing::warn!("Failed to create default theme: {}. Using fallback.", e);
            Theme {
                colors: std::collections::HashMap::new(),
            }
        });

        Self::new_with_config(theme, AppConfig::default())
    }

    pub fn new_with_config(theme: Theme, app_config: AppConfig) -> App {
        let export_dir = app_config
            .export
            .directory
            .clone()
            .unwrap_or_else(|| PathBuf::from("."));
        let debug = DebugState {
            enabled: app_config.debug.enabled,
            ..Default::default()
        };

        App {
            config: app_config,
            theme,
            workbook: None,
            selector: None,
            state: None,
            view: None,
            focus: Focus::default(),
            filter_list: FilterListState::default(),
            table_state: TableViewState::default(),
            export_dir,
            initial_sheet: None,
            error_modal: ErrorModal::new(),
            show_help: false,
            status: None,
            loading: None,
            debug,
        }
    }

    pub fn enable_debug(&mut self) {
        self.debug.enabled = true;
    }

    pub fn set_export_dir(&mut self, dir: PathBuf) {
        self.export_dir = dir;
    }

    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    /// Sheet to activate once the workbook is loaded.
    pub fn set_initial_sheet(&mut self, name: String) {
        self.initial_sheet = Some(name);
    }

    pub fn selector(&self) -> Option<&SheetSelector> {
        self.selector.as_ref()
    }

    pub fn state(&self) -> Option<&DashboardState> {
        self.state.as_ref()
    }

    pub fn view(&self) -> Option<&DashboardView> {
        self.view.as_ref()
    }

    /// Last status-bar message (e.g. where an export went).
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Get a color from the theme by name
    fn color(&self, name: &str) -> Color {
        self.theme.get(name)
    }

    /// Take ownership of a loaded workbook and show its first (or requested) sheet.
    pub fn load_workbook(&mut self, workbook: Workbook) -> Result<()> {
        let mut selector = SheetSelector::new(workbook.sheet_names())?;
        if let Some(name) = self.initial_sheet.take() {
            if let Err(e) = selector.select_name(&name) {
                tracing::warn!("{}", e);
                self.error_modal.show(e.to_string());
            }
        }
        tracing::info!(
            sheets = ?selector.names(),
            active = selector.active_name(),
            "workbook ready"
        );

        self.workbook = Some(workbook);
        self.selector = Some(selector);
        self.loading = None;
        self.activate_sheet();
        Ok(())
    }

    /// Rebuild filters for the active sheet and start from an unfiltered view.
    fn activate_sheet(&mut self) {
        let (Some(workbook), Some(selector)) = (&self.workbook, &self.selector) else {
            return;
        };
        match DashboardState::for_sheet(workbook, selector.active_index()) {
            Ok(state) => {
                self.state = Some(state);
                self.filter_list.reset();
                self.table_state.reset();
                self.refresh();
            }
            Err(e) => self
                .error_modal
                .show(format!("Could not open sheet: {}", e)),
        }
    }

    fn refresh(&mut self) {
        let (Some(workbook), Some(state)) = (&self.workbook, &self.state) else {
            return;
        };
        let started = Instant::now();
        match compute_view(workbook, state) {
            Ok(view) => {
                self.debug.on_recompute(started.elapsed());
                self.table_state
                    .clamp(view.filtered.height(), view.filtered.width());
                self.view = Some(view);
            }
            Err(e) => {
                tracing::error!(error = %e, "recompute failed");
                self.error_modal
                    .show(format!("Could not update the dashboard: {}", e));
            }
        }
    }

    /// Select every value of every filter again.
    pub fn reset_filters(&mut self) {
        if let Some(state) = self.state.as_mut() {
            state.filters.reset();
            self.table_state.scroll_to_start();
            self.status = Some("Filters reset".to_string());
            self.refresh();
        }
    }

    /// Write the filtered table as CSV into the export directory.
    pub fn export_csv(&mut self) -> Result<PathBuf> {
        let view = self
            .view
            .as_ref()
            .ok_or_else(|| eyre!("Nothing to export yet"))?;
        let artifact = ExportArtifact::csv(&view.sheet_name, &view.filtered)?;
        let path = artifact.save(&self.export_dir)?;
        self.status = Some(format!(
            "Saved {} ({} rows, {} bytes)",
            path.display(),
            view.filtered.height(),
            artifact.bytes.len()
        ));
        Ok(path)
    }

    /// Write the current pie chart as PNG into the export directory.
    pub fn export_chart(&mut self) -> Result<PathBuf> {
        let view = self
            .view
            .as_ref()
            .ok_or_else(|| eyre!("Nothing to export yet"))?;
        let distribution = view
            .distribution
            .as_ref()
            .ok_or_else(|| eyre!("No column of this sheet can be charted"))?;
        std::fs::create_dir_all(&self.export_dir)?;
        let path = self
            .export_dir
            .join(pie_file_name(&view.sheet_name, &distribution.column));
        write_pie_png(&path, distribution)?;
        self.status = Some(format!("Saved {}", path.display()));
        Ok(path)
    }

    fn key(&mut self, event: &KeyEvent) -> Option<AppEvent> {
        self.debug.on_key(event);

        // Handle error modal first - it has highest priority
        if self.error_modal.active {
            if matches!(event.code, KeyCode::Esc | KeyCode::Enter) {
                self.error_modal.hide();
            }
            return None;
        }

        if self.show_help {
            if matches!(
                event.code,
                KeyCode::Esc | KeyCode::Enter | KeyCode::Char('?')
            ) {
                self.show_help = false;
            }
            return None;
        }

        if event.code == KeyCode::Char('c') && event.modifiers.contains(KeyModifiers::CONTROL) {
            return Some(AppEvent::Exit);
        }

        match event.code {
            KeyCode::Char('q') => return Some(AppEvent::Exit),
            KeyCode::Char('?') => {
                self.show_help = true;
                return None;
            }
            KeyCode::Tab => {
                self.focus = self.focus.next();
                return None;
            }
            KeyCode::BackTab => {
                self.focus = self.focus.previous();
                return None;
            }
            KeyCode::Char('e') => return Some(AppEvent::Export),
            KeyCode::Char('p') => return Some(AppEvent::ExportChart),
            KeyCode::Char('r') => {
                self.debug.last_action = "reset_filters".to_string();
                self.reset_filters();
                return None;
            }
            _ => {}
        }

        match self.focus {
            Focus::Sheets => self.sheets_key(event.code),
            Focus::Filters => self.filters_key(event.code),
            Focus::Table => self.table_key(event.code),
            Focus::Chart => self.chart_key(event.code),
        }
        None
    }

    fn sheets_key(&mut self, code: KeyCode) {
        let Some(selector) = self.selector.as_mut() else {
            return;
        };
        let changed = match code {
            KeyCode::Up | KeyCode::Char('k') => selector.select_previous(),
            KeyCode::Down | KeyCode::Char('j') => selector.select_next(),
            _ => false,
        };
        if changed {
            self.debug.last_action = "select_sheet".to_string();
            tracing::debug!(sheet = selector.active_name(), "sheet selected");
            self.activate_sheet();
        }
    }

    fn filters_key(&mut self, code: KeyCode) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        let items = filter_items(&state.filters);
        let changed = match code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.filter_list.move_by(-1, items.len());
                false
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.filter_list.move_by(1, items.len());
                false
            }
            KeyCode::PageUp => {
                self.filter_list.move_by(-FILTER_PAGE, items.len());
                false
            }
            KeyCode::PageDown => {
                self.filter_list.move_by(FILTER_PAGE, items.len());
                false
            }
            KeyCode::Char(' ') | KeyCode::Enter => match self.filter_list.current(&items) {
                Some(FilterItem::Heading(f)) => match state.filters.get_mut(f) {
                    Some(filter) if filter.all_selected() => {
                        filter.select_none();
                        true
                    }
                    Some(filter) => {
                        filter.select_all();
                        true
                    }
                    None => false,
                },
                Some(FilterItem::Value(f, o)) => match state.filters.get_mut(f) {
                    Some(filter) => {
                        let value = filter.options[o].clone();
                        filter.toggle(&value);
                        true
                    }
                    None => false,
                },
                None => false,
            },
            KeyCode::Char('a') | KeyCode::Char('n') => {
                let current = self.filter_list.current_filter(&items);
                match current.and_then(|f| state.filters.get_mut(f)) {
                    Some(filter) => {
                        if code == KeyCode::Char('a') {
                            filter.select_all();
                        } else {
                            filter.select_none();
                        }
                        true
                    }
                    None => false,
                }
            }
            _ => false,
        };

        if changed {
            self.debug.last_action = "toggle_filter".to_string();
            self.table_state.scroll_to_start();
            self.refresh();
        }
    }

    fn table_key(&mut self, code: KeyCode) {
        let Some(view) = self.view.as_ref() else {
            return;
        };
        let (rows, cols) = (view.filtered.height(), view.filtered.width());
        let table = &mut self.table_state;
        match code {
            KeyCode::Up | KeyCode::Char('k') => table.scroll_rows(-1, rows),
            KeyCode::Down | KeyCode::Char('j') => table.scroll_rows(1, rows),
            KeyCode::PageUp => table.page_up(rows),
            KeyCode::PageDown => table.page_down(rows),
            KeyCode::Home | KeyCode::Char('g') => table.scroll_to_start(),
            KeyCode::End | KeyCode::Char('G') => table.scroll_to_end(rows),
            KeyCode::Left | KeyCode::Char('h') => table.scroll_cols(-1, cols),
            KeyCode::Right | KeyCode::Char('l') => table.scroll_cols(1, cols),
            _ => {}
        }
    }

    fn chart_key(&mut self, code: KeyCode) {
        let step: isize = match code {
            KeyCode::Left | KeyCode::Char('h') => -1,
            KeyCode::Right | KeyCode::Char('l') => 1,
            _ => return,
        };
        let Some(view) = self.view.as_ref() else {
            return;
        };
        let len = view.chart_columns.len();
        if len == 0 {
            return;
        }
        let current = view
            .chart_column()
            .and_then(|c| view.chart_columns.iter().position(|name| name == c))
            .unwrap_or(0);
        let next = (current as isize + step).rem_euclid(len as isize) as usize;
        let column = view.chart_columns[next].clone();
        if let Some(state) = self.state.as_mut() {
            state.chart_column = Some(column);
        }
        self.debug.last_action = "chart_column".to_string();
        self.refresh();
    }

    pub fn event(&mut self, event: &AppEvent) -> Option<AppEvent> {
        self.debug.num_events += 1;
        match event {
            AppEvent::Key(key) => self.key(key),
            AppEvent::Open(path) => {
                // Show the loading screen, then load on the next event
                self.loading = Some(path.clone());
                Some(AppEvent::DoLoad(path.clone()))
            }
            AppEvent::DoLoad(path) => {
                let loaded = Workbook::open(path, &self.config.workbook.sheets);
                match loaded.and_then(|workbook| self.load_workbook(workbook)) {
                    Ok(()) => None,
                    Err(e) => {
                        self.loading = None;
                        tracing::error!(error = %e, "workbook load failed");
                        Some(AppEvent::Crash(e.to_string()))
                    }
                }
            }
            AppEvent::Export => {
                if let Err(e) = self.export_csv() {
                    tracing::error!(error = %e, "csv export failed");
                    self.error_modal.show(format!("Export failed: {}", e));
                }
                None
            }
            AppEvent::ExportChart => {
                if let Err(e) = self.export_chart() {
                    tracing::error!(error = %e, "chart export failed");
                    self.error_modal.show(format!("Chart export failed: {}", e));
                }
                None
            }
            AppEvent::Resize(_, _) | AppEvent::Exit | AppEvent::Crash(_) => None,
        }
    }

    fn context_controls(&self) -> &'static [(&'static str, &'static str)] {
        match self.focus {
            Focus::Sheets => &[("↑↓", "Sheet")],
            Focus::Filters => &[("↑↓", "Move"), ("Space", "Toggle"), ("a/n", "All/None")],
            Focus::Table => &[("↑↓←→", "Scroll"), ("PgUp/PgDn", "Page")],
            Focus::Chart => &[("←→", "Column")],
        }
    }

    fn render_loading(&self, path: &Path, area: Rect, buf: &mut Buffer) {
        let popup_area = centered_rect(area, 50, 20);
        Clear.render(popup_area, buf);
        Paragraph::new(format!("Opening {}", path.display()))
            .centered()
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Loading")
                    .border_style(Style::default().fg(self.color("modal_border"))),
            )
            .render(popup_area, buf);
    }

    fn render_dashboard(&mut self, area: Rect, buf: &mut Buffer) {
        let border_color = self.color("table_border");
        let active_color = self.color("modal_border_active");
        let header_color = self.color("table_header");
        let heading_color = self.color("secondary");
        let dimmed_color = self.color("dimmed");

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(self.config.display.sidebar_width),
                Constraint::Fill(1),
            ])
            .split(area);
        let sheet_rows = self
            .selector
            .as_ref()
            .map(|s| s.names().len() as u16)
            .unwrap_or(1);
        let sidebar = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(sheet_rows + 2), Constraint::Fill(1)])
            .split(columns[0]);
        let main = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(55), Constraint::Fill(1)])
            .split(columns[1]);

        if let Some(selector) = &self.selector {
            SheetList {
                names: selector.names(),
                active: selector.active_index(),
                focused: self.focus == Focus::Sheets,
                border_color,
                active_color,
            }
            .render(sidebar[0], buf);
        }

        if let Some(state) = &self.state {
            FilterList {
                filters: &state.filters,
                focused: self.focus == Focus::Filters,
                border_color,
                active_color,
                heading_color,
                dimmed_color,
            }
            .render(sidebar[1], buf, &mut self.filter_list);
        }

        if let Some(view) = &self.view {
            DataTableView {
                df: &view.filtered,
                title: format!("Data from {} Sheet", view.sheet_name),
                focused: self.focus == Focus::Table,
                border_color,
                active_color,
                header_color,
                dimmed_color,
                max_column_width: self.config.display.max_column_width,
            }
            .render(main[0], buf, &mut self.table_state);
        }

        self.render_chart(main[1], buf);
    }

    fn render_chart(&self, area: Rect, buf: &mut Buffer) {
        let border_color = if self.focus == Focus::Chart {
            self.color("modal_border_active")
        } else {
            self.color("table_border")
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .title(" Pie Chart Visualization ")
            .border_style(Style::default().fg(border_color));
        let inner = block.inner(area);
        block.render(area, buf);

        let Some(view) = &self.view else {
            return;
        };
        let Some(distribution) = &view.distribution else {
            return;
        };

        let parts = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Fill(1),
            ])
            .split(inner);

        let position = view
            .chart_columns
            .iter()
            .position(|c| *c == distribution.column)
            .unwrap_or(0);
        Paragraph::new(format!(
            "Select column for pie chart: ◂ {} ▸ ({}/{})",
            distribution.column,
            position + 1,
            view.chart_columns.len()
        ))
        .style(Style::default().fg(self.color("text_secondary")))
        .render(parts[0], buf);

        Paragraph::new(distribution.title())
            .style(
                Style::default()
                    .fg(self.color("text_primary"))
                    .add_modifier(Modifier::BOLD),
            )
            .centered()
            .render(parts[1], buf);

        PieChart {
            distribution,
            text_color: self.color("text_primary"),
            dimmed_color: self.color("dimmed"),
        }
        .render(parts[2], buf);
    }

    fn render_help(&self, area: Rect, buf: &mut Buffer) {
        let popup_area = centered_rect(area, 60, 60);
        Clear.render(popup_area, buf);
        let text = "\
Tab / Shift-Tab   Move focus: Sheets, Filters, Table, Chart

Sheets            ↑/↓ choose the data sheet
Filters           ↑/↓ move, Space/Enter toggle a value
                  (on a filter name: select all or none)
                  a select all, n select none
Table             ↑/↓ PgUp/PgDn Home/End scroll rows
                  ←/→ scroll columns
Chart             ←/→ choose the pie chart column

e                 Export the filtered data as CSV
p                 Save the pie chart as PNG
r                 Reset all filters
q / Ctrl-C        Quit

Press Esc to close";
        Paragraph::new(text)
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Help")
                    .border_style(Style::default().fg(self.color("modal_border"))),
            )
            .render(popup_area, buf);
    }
}

impl Widget for &mut App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.debug.num_frames += 1;

        let mut constraints = vec![
            Constraint::Length(1), // Title
            Constraint::Fill(1),
            Constraint::Length(1), // Status
            Constraint::Length(1), // Controls
        ];
        if self.debug.enabled {
            constraints.push(Constraint::Length(1));
        }
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        Paragraph::new(self.config.display.title.as_str())
            .style(
                Style::default()
                    .fg(self.color("primary"))
                    .add_modifier(Modifier::BOLD),
            )
            .centered()
            .render(layout[0], buf);

        if let Some(path) = &self.loading {
            self.render_loading(path, layout[1], buf);
        } else if self.view.is_some() {
            self.render_dashboard(layout[1], buf);
        } else {
            Paragraph::new("No workbook loaded")
                .style(Style::default().fg(self.color("dimmed")))
                .centered()
                .render(layout[1], buf);
        }

        if let Some(status) = &self.status {
            Paragraph::new(status.as_str())
                .style(Style::default().fg(self.color("success")))
                .render(layout[2], buf);
        }

        let mut controls = Controls::new()
            .with_context_controls(self.context_controls())
            .with_colors(
                self.color("controls_bg"),
                self.color("primary"),
                self.color("text_primary"),
            );
        if let (Some(view), Some(state), Some(workbook)) =
            (&self.view, &self.state, &self.workbook)
        {
            let total = workbook
                .sheet(state.active_sheet)
                .map(|s| s.num_rows())
                .unwrap_or(0);
            controls = controls.with_rows(view.filtered.height(), total);
        }
        controls.render(layout[3], buf);

        if self.error_modal.active {
            let popup_area = centered_rect(area, 70, 40);
            Clear.render(popup_area, buf);
            let block = Block::default()
                .borders(Borders::ALL)
                .title("Error")
                .border_style(Style::default().fg(self.color("modal_border_error")));
            let inner_area = block.inner(popup_area);
            block.render(popup_area, buf);

            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Min(0),    // Message (takes available space)
                    Constraint::Length(3), // OK button
                ])
                .split(inner_area);

            Paragraph::new(self.error_modal.message.as_str())
                .style(Style::default().fg(self.color("error")))
                .wrap(Wrap { trim: true })
                .render(chunks[0], buf);

            let ok_style = Style::default().fg(self.color("modal_border_active"));
            Paragraph::new("[ OK ]")
                .centered()
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(ok_style),
                )
                .render(chunks[1], buf);
        } else if self.show_help {
            self.render_help(area, buf);
        }

        if self.debug.enabled && layout.len() > 4 {
            self.debug.render(layout[4], buf);
        }
    }
}

fn centered_rect(r: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
