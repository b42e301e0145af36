use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use bookshelf_core::form::FormField;
use bookshelf_core::BookKind;

use crate::app::{App, AppState};
use crate::dialog::BookDialog;

use super::styles;
use super::table;

/// Width of the value box in the dialog
const FIELD_WIDTH: usize = 36;

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Title bar
            Constraint::Min(8),    // Table
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    table::render(frame, app, chunks[1]);
    render_status_bar(frame, app, chunks[2]);

    // Render overlays
    match app.state {
        AppState::InDialog => {
            if let Some(dialog) = app.dialog.as_ref() {
                render_dialog_overlay(frame, dialog, !app.save_disabled());
            }
        }
        AppState::ShowingHelp => render_help_overlay(frame),
        AppState::ConfirmingQuit => render_quit_overlay(frame),
        AppState::Normal | AppState::Quitting => {}
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = "  Bookshelf";
    let help_hint = "[?] Help";
    let source = format!("  {}", app.config.api_base_url());
    let loading = if app.is_loading() { "  loading..." } else { "" };

    let used = title.len() + source.chars().count() + loading.len() + help_hint.len() + 2;
    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::styled(source, styles::muted_style()),
        Span::styled(loading, styles::highlight_style()),
        Span::raw(" ".repeat((area.width as usize).saturating_sub(used))),
        Span::styled(help_hint, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(title_line).block(block), area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = "[u]pdate | [q]uit";

    let (left_text, left_style) = match app.status_message.as_ref() {
        Some(msg) if msg.is_error => (format!(" {} ", msg.text), styles::error_style()),
        Some(msg) => (format!(" {} ", msg.text), styles::success_style()),
        None => match app.catalog.store().age_display() {
            Some(age) => (format!(" Updated {} ", age), styles::muted_style()),
            None => (" Not loaded ".to_string(), styles::muted_style()),
        },
    };
    let right_text = format!(" {} ", shortcuts);

    let padding_len = (area.width as usize)
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.len());
    let status_line = Line::from(vec![
        Span::styled(left_text, left_style),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    frame.render_widget(Paragraph::new(status_line).style(styles::status_bar_style()), area);
}

fn field_label(field: FormField, kind: BookKind) -> &'static str {
    match field {
        FormField::Title => "Title",
        FormField::Author => "Author",
        FormField::Genre => "Genre",
        FormField::Kind => "Type",
        FormField::Length => kind.length_label(),
        FormField::Description => "Description",
    }
}

fn kind_selector(dialog: &BookDialog) -> Span<'static> {
    let kind = dialog.form.kind();
    let mark = |k: BookKind| if k == kind { "(•)" } else { "( )" };
    let text = if dialog.form.kind_locked() {
        format!("{} (fixed)", kind)
    } else {
        format!(
            "{} {}  {} {}",
            mark(BookKind::Paper),
            BookKind::Paper,
            mark(BookKind::Audio),
            BookKind::Audio
        )
    };
    Span::styled(text, styles::field_style(dialog.focus == FormField::Kind, false))
}

fn render_dialog_overlay(frame: &mut Frame, dialog: &BookDialog, save_enabled: bool) {
    let kind = dialog.form.kind();
    let mut lines = vec![Line::from("")];

    if let Some(failure) = dialog.failure.as_ref() {
        lines.push(Line::from(Span::styled(format!(" ! {}", failure), styles::error_style())));
        lines.push(Line::from(""));
    }

    for field in FormField::ALL {
        let focused = dialog.focus == field;
        let error = dialog.errors.get(field);
        let label = Span::styled(format!(" {:<12}", field_label(field, kind)), styles::muted_style());

        let value = match dialog.form.text(field) {
            Some(text) => {
                let cursor = if focused && !dialog.submitting { "▌" } else { "" };
                // Keep the tail visible so the cursor stays in view
                let skip = text.chars().count().saturating_sub(FIELD_WIDTH - 1);
                let shown: String = text.chars().skip(skip).collect();
                Span::styled(
                    format!("[{:<width$}]", format!("{}{}", shown, cursor), width = FIELD_WIDTH),
                    styles::field_style(focused, error.is_some()),
                )
            }
            None => kind_selector(dialog),
        };
        lines.push(Line::from(vec![label, value]));

        if let Some(message) = error {
            lines.push(Line::from(Span::styled(format!("              {}", message), styles::error_style())));
        }
    }

    lines.push(Line::from(""));
    let save = if dialog.submitting { "[ Saving... ]" } else { "[ Save ]" };
    lines.push(Line::from(vec![
        Span::raw("              "),
        Span::styled(save, styles::button_style(save_enabled)),
        Span::raw("   "),
        Span::styled("[ Cancel ]", styles::button_style(true)),
    ]));
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled(" Tab", styles::help_key_style()),
        Span::styled(" next  ", styles::muted_style()),
        Span::styled("Enter", styles::help_key_style()),
        Span::styled(" save  ", styles::muted_style()),
        Span::styled("Esc", styles::help_key_style()),
        Span::styled(" cancel", styles::muted_style()),
    ]));

    let height = lines.len() as u16 + 2;
    let area = centered_rect_fixed(56, height, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(format!(" {} ", dialog.title()))
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn help_line(key: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<10}", key), styles::help_key_style()),
        Span::styled(desc, styles::help_desc_style()),
    ])
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(48, 24, frame.area());
    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");

    let help_text = vec![
        Line::from(Span::styled(" Bookshelf", styles::title_style())),
        Line::from(Span::styled(format!(" version {}", version), styles::muted_style())),
        Line::from(""),
        Line::from(Span::styled(" Navigation", styles::highlight_style())),
        help_line("↑/↓ j/k", "Move selection"),
        help_line("PgUp/PgDn", "Move by a page"),
        help_line("Home/End", "First/last book"),
        Line::from(""),
        Line::from(Span::styled(" Actions", styles::highlight_style())),
        help_line("a", "Add a book"),
        help_line("e/Enter", "Edit selected book"),
        help_line("x/Delete", "Delete selected book"),
        help_line("u", "Reload from server"),
        help_line("q", "Quit"),
        Line::from(""),
        Line::from(Span::styled(" Dialog", styles::highlight_style())),
        help_line("Tab", "Next field"),
        help_line("←/→ Space", "Change type (new books)"),
        help_line("Esc", "Cancel"),
        Line::from(""),
        Line::from(vec![
            Span::styled("    Press ", styles::muted_style()),
            Span::styled("?", styles::help_key_style()),
            Span::styled(" or ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(help_text).block(block), area);
}

fn render_quit_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(40, 6, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "  Are you sure you want to quit?",
            styles::highlight_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to quit, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Create a centered rectangle with fixed dimensions
fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}
