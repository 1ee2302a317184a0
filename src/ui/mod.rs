use std::io::{Stdout, stdout};
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};

use crate::app::{App, InputMode};
use crate::domain::filter::Filter;
use crate::repo::KeyValueStore;
use crate::usecase::projector::TodoRow;

pub fn run<K: KeyValueStore>(mut app: App<K>, tick_rate: Duration) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut last_frame = Instant::now();
    let res = loop {
        let now = Instant::now();
        app.tick(now - last_frame);
        last_frame = now;

        if let Err(e) = terminal.draw(|f| draw(f, &app)) {
            break Err(e.into());
        }

        let polled = match event::poll(tick_rate) {
            Ok(polled) => polled,
            Err(e) => break Err(e.into()),
        };
        if polled {
            match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                    if handle_key(&mut app, key.code) {
                        break Ok(());
                    }
                }
                Ok(_) => {}
                Err(e) => break Err(e.into()),
            }
        }
    };

    cleanup_terminal(&mut terminal)?;
    res
}

/// Returns true when the user asked to quit.
fn handle_key<K: KeyValueStore>(app: &mut App<K>, code: KeyCode) -> bool {
    match app.mode {
        InputMode::Normal => match code {
            KeyCode::Char('q') => return true,
            KeyCode::Char('j') | KeyCode::Down => app.select_next(),
            KeyCode::Char('k') | KeyCode::Up => app.select_previous(),
            KeyCode::Char('a') | KeyCode::Char('n') => app.start_editing(),
            KeyCode::Enter | KeyCode::Char(' ') => app.toggle_selected(),
            KeyCode::Char('1') => app.select_filter(Filter::All),
            KeyCode::Char('2') => app.select_filter(Filter::Open),
            KeyCode::Char('3') => app.select_filter(Filter::Done),
            KeyCode::Tab => app.cycle_filter(),
            KeyCode::Char('c') => app.remove_completed(),
            KeyCode::Char('r') => app.reload(),
            _ => {}
        },
        InputMode::Editing => match code {
            KeyCode::Esc => app.cancel_editing(),
            KeyCode::Enter => app.add_todo(),
            KeyCode::Backspace => {
                app.input.pop();
            }
            KeyCode::Char(c) => app.input.push(c),
            _ => {}
        },
    }

    false
}

fn draw<K: KeyValueStore>(f: &mut ratatui::Frame, app: &App<K>) {
    let size = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(size);

    f.render_widget(render_header(app), chunks[0]);
    f.render_widget(render_filters(app.view.filter), chunks[1]);

    let mut list_state = ListState::default();
    if !app.view.rows.is_empty() {
        list_state.select(Some(app.selected));
    }
    let list = render_list(&app.view.rows, app.selected);
    f.render_stateful_widget(list, chunks[2], &mut list_state);

    f.render_widget(render_footer(app), chunks[3]);
}

fn render_header<K: KeyValueStore>(app: &App<K>) -> Paragraph<'static> {
    let (open, total) = app.counts();
    let summary = format!("Open: {open} / All: {total}");
    let line = Line::from(vec![
        Span::styled("tasuku - todo", Style::default().fg(Color::Cyan)),
        Span::raw("  |  "),
        Span::styled(summary, Style::default().fg(Color::Yellow)),
    ]);
    Paragraph::new(line)
        .block(Block::default().title("Overview").borders(Borders::ALL))
        .wrap(Wrap { trim: true })
}

fn render_filters(selected: Filter) -> Paragraph<'static> {
    let mut spans = Vec::new();
    for (idx, filter) in Filter::ALL.into_iter().enumerate() {
        if idx > 0 {
            spans.push(Span::raw("   "));
        }
        let (radio, style) = if filter == selected {
            (
                "(•)",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
        } else {
            ("( )", Style::default())
        };
        spans.push(Span::styled(format!("{radio} {}:{filter}", idx + 1), style));
    }
    Paragraph::new(Line::from(spans))
        .block(Block::default().title("Filter (1/2/3 or Tab)").borders(Borders::ALL))
}

fn render_list(rows: &[TodoRow], selected: usize) -> List<'_> {
    let items: Vec<ListItem> = rows
        .iter()
        .enumerate()
        .map(|(idx, row)| {
            let checkbox = if row.done { "[x]" } else { "[ ]" };
            let line = Line::from(Span::raw(format!(" {checkbox} {}", row.description)));

            let style = if idx == selected {
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD | Modifier::REVERSED)
            } else if row.done {
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::CROSSED_OUT)
            } else {
                Style::default()
            };

            ListItem::new(line).style(style)
        })
        .collect();

    List::new(items)
        .block(
            Block::default()
                .title("Todos (j/k move ; a/n add ; Space/Enter toggle ; c remove done)")
                .borders(Borders::ALL),
        )
        .highlight_symbol("➤ ")
}

fn render_footer<K: KeyValueStore>(app: &App<K>) -> Paragraph<'_> {
    match app.mode {
        InputMode::Normal => {
            let msg = app
                .status
                .as_deref()
                .unwrap_or("q quit ; a add ; c remove done ; r reload");
            Paragraph::new(msg).block(Block::default().title("Normal").borders(Borders::ALL))
        }
        InputMode::Editing => {
            let mut spans = vec![
                Span::raw("New task: "),
                Span::styled(&app.input, Style::default().fg(Color::Yellow)),
                Span::raw("█"),
            ];
            if let Some(hint) = app.hint {
                spans.push(Span::raw("  "));
                spans.push(Span::styled(hint, Style::default().fg(Color::Red)));
            }
            Paragraph::new(Line::from(spans)).block(
                Block::default()
                    .title("Input (Enter to add / Esc to cancel)")
                    .borders(Borders::ALL),
            )
        }
    }
}

fn cleanup_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use ratatui::backend::TestBackend;

    use super::*;
    use crate::config::Config;
    use crate::repo::memory::MemoryKv;
    use crate::usecase::store::{StateStore, StorageLayout};

    fn app() -> App<MemoryKv> {
        let mut store = StateStore::new(MemoryKv::default(), StorageLayout::SingleBlob);
        store.initialize();
        App::new(store, &Config::default())
    }

    fn render_to_string(app: &App<MemoryKv>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 16)).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();
        let buf = terminal.backend().buffer().clone();
        let w = buf.area.width as usize;
        buf.content
            .chunks(w)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn type_line(app: &mut App<MemoryKv>, text: &str) {
        for c in text.chars() {
            handle_key(app, KeyCode::Char(c));
        }
        handle_key(app, KeyCode::Enter);
    }

    #[test]
    fn keys_drive_add_toggle_and_filter() {
        let mut app = app();
        handle_key(&mut app, KeyCode::Char('a'));
        type_line(&mut app, "Buy milk");
        assert_eq!(app.view.rows.len(), 1);

        handle_key(&mut app, KeyCode::Char(' '));
        assert!(app.view.rows[0].done);

        handle_key(&mut app, KeyCode::Char('2'));
        assert_eq!(app.view.filter, Filter::Open);
        assert!(app.view.rows.is_empty());

        handle_key(&mut app, KeyCode::Tab);
        assert_eq!(app.view.filter, Filter::Done);
        assert_eq!(app.view.rows.len(), 1);

        handle_key(&mut app, KeyCode::Char('c'));
        assert!(app.view.rows.is_empty());
        assert!(handle_key(&mut app, KeyCode::Char('q')));
    }

    #[test]
    fn typing_q_while_editing_does_not_quit() {
        let mut app = app();
        handle_key(&mut app, KeyCode::Char('n'));
        assert!(!handle_key(&mut app, KeyCode::Char('q')));
        assert_eq!(app.input, "q");
        handle_key(&mut app, KeyCode::Esc);
        assert_eq!(app.mode, InputMode::Normal);
        assert!(app.input.is_empty());
    }

    #[test]
    fn draw_shows_rows_filter_and_counts() {
        let mut app = app();
        handle_key(&mut app, KeyCode::Char('a'));
        type_line(&mut app, "Buy milk");
        handle_key(&mut app, KeyCode::Char('a'));
        type_line(&mut app, "Walk dog");
        handle_key(&mut app, KeyCode::Char(' '));

        let screen = render_to_string(&app);
        assert!(screen.contains("Open: 1 / All: 2"), "{screen}");
        assert!(screen.contains("(•) 1:all"), "{screen}");
        assert!(screen.contains("( ) 2:open"), "{screen}");
        assert!(screen.contains("[ ] Buy milk"), "{screen}");
        assert!(screen.contains("[x] Walk dog"), "{screen}");
    }

    #[test]
    fn draw_shows_duplicate_hint() {
        let mut app = app();
        handle_key(&mut app, KeyCode::Char('a'));
        type_line(&mut app, "Buy milk");
        handle_key(&mut app, KeyCode::Char('a'));
        type_line(&mut app, "BUY MILK");

        let screen = render_to_string(&app);
        assert!(screen.contains(crate::app::DUPLICATE_HINT), "{screen}");
    }
}
