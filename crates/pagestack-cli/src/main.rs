mod manifest;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::{error, info};
use manifest::{ManifestExporter, manifest_path};
use pagestack_config::{Preferences, Theme};
use pagestack_engine::{
    Direction as Step, EditError, EntityId, FsProbe, LayoutMode, Patch, Workspace,
    io::ExportMetadata,
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};
use std::{
    env,
    fs::File,
    io::{Stdout, stdout},
    path::PathBuf,
};

struct App {
    workspace: Workspace,
    prefs: Preferences,
    list_state: ListState,
    status: String,
}

impl App {
    fn new(prefs: Preferences, files: &[PathBuf]) -> Self {
        let mut app = Self {
            workspace: Workspace::new(),
            prefs,
            list_state: ListState::default(),
            status: String::new(),
        };
        if !files.is_empty() {
            match app.workspace.import(files, &FsProbe) {
                Ok(patch) => {
                    app.status = format!("Imported {} files", patch.created.len());
                }
                Err(e) => app.status = format!("Import failed: {e}"),
            }
        }
        app
    }

    fn top_level_only(&self) -> bool {
        self.prefs.layout == LayoutMode::Grid
    }

    fn rows(&self) -> Vec<EntityId> {
        self.workspace.visible_order(self.top_level_only())
    }

    fn navigate(&mut self, delta: isize, extend: bool) {
        let top_level_only = self.top_level_only();
        if let Some(entity) = self.workspace.navigate(delta, extend, top_level_only)
            && !self.prefs.keep_expanded
        {
            self.workspace.collapse_others(entity);
        }
    }

    fn toggle_expanded(&mut self) {
        if let Some(cursor) = self.workspace.selection().cursor() {
            self.workspace.toggle_expanded(cursor);
        }
    }

    fn report(&mut self, action: &str, result: Result<Patch, EditError>) {
        self.status = match result {
            Ok(patch) if patch.changed => format!("{action} done"),
            Ok(_) => format!("{action}: nothing to do"),
            Err(e) => format!("{action} failed: {e}"),
        };
    }

    fn toggle_layout(&mut self) {
        let layout = self.prefs.toggle_layout();
        self.save_prefs(format!("Layout: {layout:?}"));
    }

    fn toggle_theme(&mut self) {
        self.prefs.theme = self.prefs.theme.toggled();
        self.save_prefs(format!("Theme: {:?}", self.prefs.theme));
    }

    fn save_prefs(&mut self, message: String) {
        self.status = match self.prefs.save() {
            Ok(()) => message,
            Err(e) => {
                error!("Failed to save preferences: {e:#}");
                format!("{message} (not saved: {e})")
            }
        };
    }

    fn export(&mut self) {
        let first_source = self
            .workspace
            .document()
            .flattened_pages()
            .next()
            .map(|page| page.path.clone());
        let output = manifest_path(self.prefs.export_dir.as_deref(), first_source.as_deref());

        self.status = match self.workspace.export(
            &ManifestExporter,
            ExportMetadata::default(),
            output.clone(),
            self.prefs.resize_to_fit,
        ) {
            Ok(outcome) if outcome.failed_files.is_empty() => {
                info!("Exported to {}", output.display());
                format!("Exported to {}", output.display())
            }
            Ok(outcome) => format!(
                "Exported to {} ({} files missing)",
                output.display(),
                outcome.failed_files.len()
            ),
            Err(e) => format!("Export failed: {e}"),
        };
    }

    /// Returns false to quit
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        let shift = key.modifiers.contains(KeyModifiers::SHIFT);
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Char('q') => return false,
            KeyCode::Up if ctrl => {
                let result = self.workspace.move_selected(Step::Backward);
                self.report("Move", result);
            }
            KeyCode::Down if ctrl => {
                let result = self.workspace.move_selected(Step::Forward);
                self.report("Move", result);
            }
            KeyCode::Down | KeyCode::Char('j') => self.navigate(1, shift),
            KeyCode::Up | KeyCode::Char('k') => self.navigate(-1, shift),
            KeyCode::Char('J') => self.navigate(1, true),
            KeyCode::Char('K') => self.navigate(-1, true),
            KeyCode::Char(' ') => self.toggle_expanded(),
            KeyCode::Char('d') => {
                let result = self.workspace.duplicate_selected();
                self.report("Duplicate", result);
            }
            KeyCode::Char('r') => {
                let result = self.workspace.rotate_selected();
                self.report("Rotate", result);
            }
            KeyCode::Char('v') => {
                let result = self.workspace.revert_selected();
                self.report("Revert", result);
            }
            KeyCode::Delete => {
                let result = self.workspace.delete_selected();
                self.report("Delete", result);
            }
            KeyCode::Char('z') if ctrl => self.undo(),
            KeyCode::Char('u') => self.undo(),
            KeyCode::Char('y') if ctrl => {
                self.status = if self.workspace.redo() {
                    "Redone".to_string()
                } else {
                    "Nothing to redo".to_string()
                };
            }
            KeyCode::Tab => self.toggle_layout(),
            KeyCode::Char('t') => self.toggle_theme(),
            KeyCode::Char('e') => self.export(),
            KeyCode::Esc => self.workspace.clear_selection(),
            _ => {}
        }
        true
    }

    fn undo(&mut self) {
        self.status = if self.workspace.undo() {
            "Undone".to_string()
        } else {
            "Nothing to undo".to_string()
        };
    }

    fn row_label(&self, entity: EntityId) -> (usize, String) {
        let document = self.workspace.document();
        match entity {
            EntityId::Item(id) => {
                let Some(item) = document.item(id) else {
                    return (0, String::new());
                };
                let marker = if item.expanded { "▾" } else { "▸" };
                (
                    0,
                    format!("{marker} {} ({} pages)", item.name, item.pages.len()),
                )
            }
            EntityId::Page(id) => {
                let Some(page) = document.page(id) else {
                    return (0, String::new());
                };
                let depth = match document.owner_item(id) {
                    Some(owner) if owner.is_group => 1,
                    _ => 0,
                };
                let rotation = match page.rotation.degrees() {
                    0 => String::new(),
                    degrees => format!(" ↻{degrees}°"),
                };
                (depth, format!("{}{rotation}", page.name))
            }
        }
    }
}

fn init_logging() {
    let log_dir = Preferences::config_dir();
    let target = std::fs::create_dir_all(&log_dir)
        .and_then(|()| File::create(log_dir.join("pagestack.log")));

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    match target {
        Ok(file) => {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        // Nowhere to write that would not corrupt the terminal UI
        Err(_) => {
            builder.filter_level(log::LevelFilter::Off);
        }
    }
    builder.init();
}

fn main() -> Result<()> {
    init_logging();

    let files: Vec<PathBuf> = env::args().skip(1).map(PathBuf::from).collect();
    let prefs = match Preferences::load() {
        Ok(prefs) => prefs.unwrap_or_default(),
        Err(e) => {
            eprintln!("Warning: {e}; using default preferences");
            Preferences::default()
        }
    };

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(prefs, &files);

    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
            && !app.handle_key(key)
        {
            return Ok(());
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let (fg, bg) = match app.prefs.theme {
        Theme::Light => (Color::Black, Color::White),
        Theme::Dark => (Color::White, Color::Black),
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Min(0), Constraint::Length(1), Constraint::Length(1)])
        .split(f.area());

    let rows = app.rows();
    let selection = app.workspace.selection();
    let cursor = selection.cursor();
    app.list_state
        .select(cursor.and_then(|c| rows.iter().position(|id| *id == c)));

    let title = match app.prefs.layout {
        LayoutMode::Grid => "Pages (grid)",
        LayoutMode::List => "Pages (list)",
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .style(Style::default().fg(fg).bg(bg));

    match app.prefs.layout {
        LayoutMode::List => {
            let items: Vec<ListItem> = rows
                .iter()
                .map(|entity| {
                    let (depth, label) = app.row_label(*entity);
                    let mark = if selection.contains(*entity) { "● " } else { "  " };
                    let text = format!("{mark}{}{label}", "  ".repeat(depth));
                    ListItem::new(vec![Line::from(vec![Span::raw(text)])])
                })
                .collect();
            let list = List::new(items)
                .block(block)
                .highlight_style(Style::default().bg(Color::Yellow).fg(Color::Black));
            f.render_stateful_widget(list, chunks[0], &mut app.list_state);
        }
        LayoutMode::Grid => {
            let columns = usize::from(app.prefs.grid_columns.max(1));
            let cell_width = usize::from(chunks[0].width.saturating_sub(2)) / columns;
            let lines: Vec<Line> = rows
                .chunks(columns)
                .map(|row| {
                    let cells: Vec<Span> = row
                        .iter()
                        .map(|entity| {
                            let (_, label) = app.row_label(*entity);
                            let cell: String = format!(" {label}").chars().take(cell_width).collect();
                            let style = if Some(*entity) == cursor {
                                Style::default().bg(Color::Yellow).fg(Color::Black)
                            } else if selection.contains(*entity) {
                                Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
                            } else {
                                Style::default()
                            };
                            Span::styled(format!("{cell:<cell_width$}"), style)
                        })
                        .collect();
                    Line::from(cells)
                })
                .collect();
            f.render_widget(Paragraph::new(lines).block(block), chunks[0]);
        }
    }

    f.render_widget(Paragraph::new(app.status.as_str()), chunks[1]);

    let help_text = Line::from(vec![
        Span::raw("q: Quit | ↑↓/jk: Move cursor (shift extends) | ctrl+↑↓: Move | "),
        Span::raw("space: Expand | d: Duplicate | r: Rotate | v: Revert | Del: Delete | "),
        Span::raw("u: Undo | ctrl+y: Redo | Tab: Layout | t: Theme | e: Export"),
    ]);
    f.render_widget(Paragraph::new(vec![help_text]), chunks[2]);
}
