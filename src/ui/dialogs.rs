//! Frame rendering for the menu and the prompts
//!
//! Dialogs are drawn centred on top of whatever the frame already holds,
//! after clearing their own rectangle.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Margin, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};

use super::layout::{centered_rect, label_width, menu_positions, visible_window};
use crate::console::{MenuView, Severity};
use crate::theme::{Colors, Styles, severity_style};

const MIN_DIALOG_WIDTH: u16 = 40;

/// Draw a menu: title on top, entries centred, hint at the bottom
pub fn render_menu(f: &mut Frame, view: &MenuView<'_>, dry_run: bool) {
    let area = f.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(1),    // Entries
            Constraint::Length(1), // Hint
        ])
        .split(area);

    let title = Paragraph::new(view.title)
        .style(Styles::title())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::BOTTOM)
                .border_style(Style::default().fg(Colors::PRIMARY)),
        );
    f.render_widget(title, chunks[0]);

    if dry_run {
        let badge = " DRY RUN ";
        let width = label_width(badge).min(area.width);
        f.render_widget(
            Paragraph::new(badge).style(Styles::dry_run_badge()),
            Rect::new(area.right() - width, area.y, width, 1),
        );
    }

    let entries = chunks[1];
    let window = visible_window(view.items.len(), view.selected, entries.height as usize);
    let offset = window.start;
    let shown = &view.items[window];
    for (i, (label, (x, y))) in shown
        .iter()
        .zip(menu_positions(entries, shown))
        .enumerate()
    {
        let style = if offset + i == view.selected {
            Styles::selected()
        } else {
            Styles::item()
        };
        let width = label_width(label).min(entries.right().saturating_sub(x));
        f.render_widget(
            Paragraph::new(*label).style(style),
            Rect::new(x, y, width, 1),
        );
    }

    f.render_widget(
        Paragraph::new(view.hint)
            .style(Styles::hint())
            .alignment(Alignment::Center),
        chunks[2],
    );
}

fn dialog_rect(area: Rect, lines: &[Line<'_>]) -> Rect {
    let widest = lines.iter().map(|l| l.width()).max().unwrap_or(0);
    let width = u16::try_from(widest)
        .unwrap_or(u16::MAX)
        .saturating_add(4)
        .max(MIN_DIALOG_WIDTH);
    let height = u16::try_from(lines.len())
        .unwrap_or(u16::MAX)
        .saturating_add(2);
    centered_rect(width, height, area)
}

fn dialog_block(title: &str, color: ratatui::style::Color) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(color))
        .style(Styles::dialog())
}

/// Dismissible message
pub fn render_message(f: &mut Frame, severity: Severity, text: &str) {
    let (color, title) = severity_style(severity);
    let mut lines: Vec<Line> = text.lines().map(Line::from).collect();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Press any key to continue",
        Styles::hint(),
    )));

    let rect = dialog_rect(f.area(), &lines);
    f.render_widget(Clear, rect);
    f.render_widget(
        Paragraph::new(lines)
            .block(dialog_block(title, color))
            .wrap(Wrap { trim: false }),
        rect,
    );
}

/// Yes/no question
pub fn render_confirm(f: &mut Frame, question: &str) {
    let mut lines: Vec<Line> = question.lines().map(Line::from).collect();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Press y to confirm", Styles::hint())));

    let rect = dialog_rect(f.area(), &lines);
    f.render_widget(Clear, rect);
    f.render_widget(
        Paragraph::new(lines)
            .block(dialog_block(" Confirm ", Colors::WARNING))
            .wrap(Wrap { trim: false }),
        rect,
    );
}

/// Text entry; `shown` is already masked for secrets
pub fn render_input(f: &mut Frame, prompt: &str, shown: &str) {
    let lines = vec![
        Line::from(prompt.to_string()),
        Line::from(vec![
            Span::styled("> ", Style::default().fg(Colors::PRIMARY)),
            Span::raw(shown.to_string()),
            Span::styled("█", Style::default().fg(Colors::FG_SECONDARY)),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "Enter to accept, Esc to cancel",
            Styles::hint(),
        )),
    ];

    let rect = dialog_rect(f.area(), &lines);
    f.render_widget(Clear, rect);
    f.render_widget(
        Paragraph::new(lines).block(dialog_block(" Input ", Colors::PRIMARY)),
        rect,
    );
}

fn render_list(
    f: &mut Frame,
    title: &str,
    items: Vec<ListItem<'_>>,
    widest: usize,
    selected: usize,
) {
    let area = f.area();
    let title = format!(" {} ", title);
    let width = u16::try_from(widest.max(title.chars().count()))
        .unwrap_or(u16::MAX)
        .saturating_add(8);
    let height = u16::try_from(items.len())
        .unwrap_or(u16::MAX)
        .saturating_add(2);
    let rect = centered_rect(width, height, area.inner(Margin::new(1, 1)));

    let list = List::new(items)
        .block(dialog_block(&title, Colors::PRIMARY))
        .highlight_style(Styles::selected())
        .highlight_symbol(">> ");
    let mut state = ListState::default().with_selected(Some(selected));

    f.render_widget(Clear, rect);
    f.render_stateful_widget(list, rect, &mut state);
}

/// Single-choice list
pub fn render_select(f: &mut Frame, title: &str, options: &[String], selected: usize) {
    let widest = options.iter().map(|o| o.chars().count()).max().unwrap_or(0);
    let items = options
        .iter()
        .map(|o| ListItem::new(o.as_str()).style(Styles::item()))
        .collect();
    render_list(f, title, items, widest, selected);
}

/// Checklist with `[x]` markers
pub fn render_toggle(
    f: &mut Frame,
    title: &str,
    options: &[String],
    checked: &[bool],
    selected: usize,
) {
    let widest = options.iter().map(|o| o.chars().count()).max().unwrap_or(0) + 4;
    let items = options
        .iter()
        .zip(checked)
        .map(|(option, &on)| {
            let (mark, style) = if on {
                ("[x] ", Style::default().fg(Colors::CHECKED))
            } else {
                ("[ ] ", Styles::item())
            };
            ListItem::new(format!("{}{}", mark, option)).style(style)
        })
        .collect();
    render_list(f, title, items, widest, selected);
}
