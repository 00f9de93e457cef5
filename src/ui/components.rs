//! UI components for the TUI

use super::{App, Focus};
use crate::catalog::BookSummaryRef;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, List, ListItem, Paragraph, Wrap};
use ratatui::Frame;

const LOADING_TEXT: &str = "Processing Please Be Patient⌛...";

fn panel(title: &str, focused: bool) -> Block<'_> {
    let border = if focused {
        Style::default().fg(Color::Magenta)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    Block::bordered()
        .title(Span::styled(
            title,
            Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
        ))
        .border_style(border)
}

/// Render the whole screen
pub fn render(frame: &mut Frame, app: &mut App) {
    let [search_area, middle, summary_area, status_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(8),
        Constraint::Length(12),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    let [results_area, upload_area] =
        Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)]).areas(middle);

    render_search(frame, app, search_area);
    render_results(frame, app, results_area);
    render_upload(frame, app, upload_area);
    render_summary(frame, app, summary_area);
    render_status(frame, app, status_area);
}

fn render_search(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Search;
    let input = Paragraph::new(app.state.query.as_str())
        .block(panel("Search Free Books", focused));
    frame.render_widget(input, area);

    if focused {
        let x = area.x + 1 + app.state.query.chars().count() as u16;
        frame.set_cursor_position((x.min(area.right().saturating_sub(2)), area.y + 1));
    }
}

fn book_item<'a>(book: &'a BookSummaryRef, covers_url: &str) -> ListItem<'a> {
    let mut lines = vec![
        Line::from(Span::styled(
            book.display_title(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::raw("by "),
            Span::styled(book.author.as_str(), Style::default().fg(Color::Cyan)),
        ]),
    ];
    if let Some(cover) = book.cover_url(covers_url) {
        lines.push(Line::from(Span::styled(
            cover,
            Style::default().fg(Color::DarkGray),
        )));
    }
    ListItem::new(Text::from(lines))
}

fn render_results(frame: &mut Frame, app: &mut App, area: Rect) {
    let focused = app.focus == Focus::Results;
    let title = if app.searching {
        "Results (searching...)".to_string()
    } else {
        format!("Results ({})", app.state.results().len())
    };

    let items: Vec<ListItem> = app
        .state
        .results()
        .iter()
        .map(|book| book_item(book, &app.config.catalog.covers_url))
        .collect();

    let list = List::new(items)
        .block(panel(&title, focused))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut app.list);
}

fn render_upload(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Upload;
    let loading = app.state.is_loading();

    let button = if loading {
        Span::styled("Processing...", Style::default().fg(Color::DarkGray))
    } else if app.upload_input.trim().is_empty() {
        Span::styled(
            "[Enter] Summarize & Voice",
            Style::default().fg(Color::DarkGray),
        )
    } else {
        Span::styled(
            "[Enter] Summarize & Voice",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )
    };

    let text = vec![
        Line::from(vec![
            Span::raw("Language: "),
            Span::styled(
                app.state.language.name(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::styled(" (F2)", Style::default().fg(Color::DarkGray)),
        ]),
        Line::from(""),
        Line::from("File (.pdf or .txt):"),
        Line::from(Span::styled(
            app.upload_input.as_str(),
            Style::default().fg(Color::Yellow),
        )),
        Line::from(""),
        Line::from(button),
    ];

    let paragraph = Paragraph::new(text)
        .block(panel("Upload PDF/Text", focused))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);

    if focused {
        // Cursor sits after the file path on the fourth line
        let x = area.x + 1 + app.upload_input.chars().count() as u16;
        frame.set_cursor_position((x.min(area.right().saturating_sub(2)), area.y + 4));
    }
}

fn render_summary(frame: &mut Frame, app: &App, area: Rect) {
    let block = panel("Summary", false);

    if app.state.is_loading() {
        let waiting = Paragraph::new(Line::from(Span::styled(
            LOADING_TEXT,
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        )))
        .centered()
        .block(block);
        frame.render_widget(waiting, area);
        return;
    }

    let Some(summary) = app.state.summary().filter(|s| !s.is_empty()) else {
        frame.render_widget(block, area);
        return;
    };

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [text_area, actions_area] =
        Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(inner);

    frame.render_widget(
        Paragraph::new(summary).wrap(Wrap { trim: false }),
        text_area,
    );

    let key_style = Style::default().fg(Color::Green).add_modifier(Modifier::BOLD);
    let mut actions = vec![Span::styled("Ctrl-S", key_style), Span::raw(" Download TXT")];
    if let Some(audio) = app.state.audio() {
        actions.extend([
            Span::raw("   🔊 "),
            Span::raw(format!("{} KB", audio.len().div_ceil(1024))),
            Span::raw("   "),
            Span::styled("Ctrl-P", key_style.fg(Color::Yellow)),
            Span::raw(" Play   "),
            Span::styled("Ctrl-A", key_style.fg(Color::Yellow)),
            Span::raw(" Download MP3"),
        ]);
    }
    frame.render_widget(Paragraph::new(Line::from(actions)), actions_area);
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    let line = match &app.status {
        Some(status) => Line::from(Span::styled(
            status.as_str(),
            Style::default().fg(Color::Yellow),
        )),
        None => Line::from(Span::styled(
            "Tab switch panel · Enter search/summarize · F2 language · Esc quit",
            Style::default().fg(Color::DarkGray),
        )),
    };
    frame.render_widget(Paragraph::new(line), area);
}
