use std::collections::HashSet;

use ratatui::{
    layout::{Alignment, Constraint, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use bookshelf_core::utils::{single_line, truncate_string};
use bookshelf_core::{Book, BookId, QueryState};

use crate::app::{App, AppState};
use crate::ui::styles;

/// Placeholder rows shown while the first fetch is running
pub const SKELETON_ROWS: usize = 5;

pub const EMPTY_MESSAGE: &str = "There's no data to show you right now.";

pub const HEADERS: [&str; 6] = ["Title", "Author", "Genre", "Details", "Description", "Actions"];

const ACTIONS: &str = "[e]dit [x] delete";

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

/// Longest description shown in a cell before truncation
const DESCRIPTION_MAX_CHARS: usize = 60;

/// What the table area shows for a given query state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableView {
    Skeleton,
    Empty,
    Rows(Vec<Book>),
}

impl TableView {
    pub fn from_state(state: QueryState) -> Self {
        match state.books {
            Some(books) if books.is_empty() => TableView::Empty,
            Some(books) => TableView::Rows(books),
            // A failed first fetch has nothing to show
            None if state.error.is_some() && !state.is_loading => TableView::Empty,
            None => TableView::Skeleton,
        }
    }
}

/// Text of the six cells for one book
pub fn row_cells(book: &Book, deleting: &HashSet<BookId>, tick: usize) -> [String; 6] {
    let details = &book.details;
    let actions = if deleting.contains(&book.id) {
        format!("{} deleting", SPINNER[tick % SPINNER.len()])
    } else {
        ACTIONS.to_string()
    };

    [
        details.title.clone(),
        details.author.clone(),
        details.genre.clone(),
        book.details_label(),
        truncate_string(&single_line(&details.brief_description), DESCRIPTION_MAX_CHARS),
        actions,
    ]
}

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let view = TableView::from_state(app.catalog.query().state());
    let focused = matches!(app.state, AppState::Normal);

    let title = match &view {
        TableView::Rows(books) => format!(" Books ({}) - [a]dd ", books.len()),
        _ => " Books - [a]dd ".to_string(),
    };
    let block = Block::default()
        .title(title)
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused));

    let header = Row::new(HEADERS.iter().map(|h| Cell::from(*h)))
        .style(styles::title_style())
        .height(1);

    let widths = [
        Constraint::Fill(3),     // Title
        Constraint::Fill(2),     // Author
        Constraint::Fill(2),     // Genre
        Constraint::Length(13),  // Details
        Constraint::Fill(4),     // Description
        Constraint::Length(18),  // Actions
    ];

    match view {
        TableView::Empty => {
            let paragraph = Paragraph::new(vec![
                Line::from(""),
                Line::from(Span::styled(EMPTY_MESSAGE, styles::muted_style())),
            ])
            .alignment(Alignment::Center)
            .block(block);
            frame.render_widget(paragraph, area);
        }
        TableView::Skeleton => {
            let bar = |width: usize| Cell::from("█".repeat(width)).style(styles::skeleton_style());
            let rows: Vec<Row> = (0..SKELETON_ROWS)
                .map(|i| {
                    // Stagger widths so the placeholder does not look like a grid
                    let w = 6 + (i * 3) % 7;
                    Row::new(vec![bar(w + 4), bar(w), bar(w - 2), bar(9), bar(w + 8), bar(12)])
                })
                .collect();
            let table = Table::new(rows, widths).header(header).block(block);
            frame.render_widget(table, area);
        }
        TableView::Rows(books) => {
            let rows: Vec<Row> = books
                .iter()
                .map(|book| {
                    let cells = row_cells(book, &app.deleting, app.tick);
                    let style = if app.deleting.contains(&book.id) {
                        styles::muted_style()
                    } else {
                        styles::list_item_style()
                    };
                    Row::new(cells.into_iter().map(Cell::from)).style(style)
                })
                .collect();

            let table = Table::new(rows, widths)
                .header(header)
                .block(block)
                .row_highlight_style(styles::selected_style());

            let mut state = TableState::default();
            state.select(Some(app.selection));
            frame.render_stateful_widget(table, area, &mut state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookshelf_core::{BookDetails, BookFormat};

    fn audio(id: BookId, description: &str) -> Book {
        Book::new(
            id,
            BookDetails {
                title: "B".to_string(),
                author: "C".to_string(),
                genre: "D".to_string(),
                brief_description: description.to_string(),
                format: BookFormat::Audio { minutes: 30 },
            },
        )
    }

    #[test]
    fn test_view_for_states() {
        let loading = QueryState {
            books: None,
            is_loading: true,
            error: None,
        };
        assert_eq!(TableView::from_state(loading), TableView::Skeleton);

        let failed = QueryState {
            books: None,
            is_loading: false,
            error: Some("boom".to_string()),
        };
        assert_eq!(TableView::from_state(failed), TableView::Empty);

        let empty = QueryState {
            books: Some(Vec::new()),
            ..Default::default()
        };
        assert_eq!(TableView::from_state(empty), TableView::Empty);

        let loaded = QueryState {
            books: Some(vec![audio(1, "")]),
            ..Default::default()
        };
        assert_eq!(TableView::from_state(loaded), TableView::Rows(vec![audio(1, "")]));
    }

    #[test]
    fn test_row_cells() {
        let cells = row_cells(&audio(7, "Line one\nline two"), &HashSet::new(), 0);
        assert_eq!(cells[3], "30 minutes");
        assert_eq!(cells[4], "Line one line two");
        assert_eq!(cells[5], ACTIONS);
    }

    #[test]
    fn test_row_cells_while_deleting() {
        let deleting: HashSet<BookId> = [7].into_iter().collect();
        let cells = row_cells(&audio(7, ""), &deleting, 1);
        assert_eq!(cells[5], "/ deleting");
    }
}
