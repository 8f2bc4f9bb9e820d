use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::fmt::{money, number};
use crate::models::{ClaimRecord, Column};
use crate::tui::{self, FOOTER_STYLE, HEADER_STYLE, SELECTED_STYLE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

enum BrowseMode {
    Normal,
    GotoPage(String),
    Search(String),
}

pub enum BrowseAction {
    Continue,
    Close,
}

/// Paged, sortable view over the filtered claims. Deleting a row or sorting
/// only changes this view; the dataset is untouched and the next filter
/// recomputation starts over from it.
pub struct ClaimBrowser<'a> {
    rows: Vec<&'a ClaimRecord>,
    /// `rows` narrowed by the search query. Rebuilt whenever rows or query change.
    visible: Vec<&'a ClaimRecord>,
    extra_columns: &'a [String],
    page_size: usize,
    page: usize,
    selected: usize,
    cursor: Column,
    sort: Option<(Column, SortDirection)>,
    query: String,
    mode: BrowseMode,
    status_message: Option<String>,
    table_state: TableState,
}

impl<'a> ClaimBrowser<'a> {
    pub fn new(rows: Vec<&'a ClaimRecord>, extra_columns: &'a [String], page_size: usize) -> Self {
        Self {
            visible: rows.clone(),
            rows,
            extra_columns,
            page_size: page_size.max(1),
            page: 0,
            selected: 0,
            cursor: Column::Month,
            sort: None,
            query: String::new(),
            mode: BrowseMode::Normal,
            status_message: None,
            table_state: TableState::default(),
        }
    }

    fn refresh_visible(&mut self) {
        if self.query.is_empty() {
            self.visible = self.rows.clone();
            return;
        }
        let q = self.query.to_lowercase();
        self.visible = self
            .rows
            .iter()
            .filter(|r| {
                Column::ALL
                    .iter()
                    .any(|c| c.value(r).to_lowercase().contains(&q))
                    || r.extras.iter().any(|v| v.to_lowercase().contains(&q))
            })
            .copied()
            .collect();
    }

    /// Rows matching the current search, in display order.
    pub fn visible(&self) -> &[&'a ClaimRecord] {
        &self.visible
    }

    pub fn page_count(&self) -> usize {
        self.visible.len().div_ceil(self.page_size).max(1)
    }

    pub fn current_page(&self) -> &[&'a ClaimRecord] {
        let start = (self.page * self.page_size).min(self.visible.len());
        let end = (start + self.page_size).min(self.visible.len());
        &self.visible[start..end]
    }

    pub fn selected_row(&self) -> Option<&'a ClaimRecord> {
        self.current_page().get(self.selected).copied()
    }

    /// Sort by `column`. Re-sorting the active column flips its direction.
    /// The sort is stable, so a previous ordering survives among ties and
    /// successive sorts build a multi-column order.
    pub fn sort_by(&mut self, column: Column) {
        let direction = match self.sort {
            Some((c, SortDirection::Ascending)) if c == column => SortDirection::Descending,
            _ => SortDirection::Ascending,
        };
        self.rows.sort_by(|a, b| {
            let ord = column.compare(a, b);
            match direction {
                SortDirection::Ascending => ord,
                SortDirection::Descending => ord.reverse(),
            }
        });
        self.sort = Some((column, direction));
        self.refresh_visible();
        self.page = 0;
        self.selected = 0;
    }

    /// Remove the selected row from this view.
    pub fn delete_selected(&mut self) {
        let Some(target) = self.selected_row() else {
            return;
        };
        if let Some(idx) = self.rows.iter().position(|r| std::ptr::eq(*r, target)) {
            self.rows.remove(idx);
            self.refresh_visible();
            self.status_message = Some(format!("Removed {} row from view", target.payer));
        }
        self.clamp_position();
    }

    fn clamp_position(&mut self) {
        self.page = self.page.min(self.page_count() - 1);
        let on_page = self.current_page().len();
        self.selected = self.selected.min(on_page.saturating_sub(1));
    }

    fn next_page(&mut self) {
        if self.page + 1 < self.page_count() {
            self.page += 1;
            self.selected = 0;
        }
    }

    fn prev_page(&mut self) {
        if self.page > 0 {
            self.page -= 1;
            self.selected = 0;
        }
    }

    /// Draw the table, its status line and key hints into `area`.
    pub fn draw(&mut self, frame: &mut Frame, area: Rect) {
        let [table_area, status_area, keys_area] = Layout::vertical([
            Constraint::Fill(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(area);

        let extra_widths: Vec<u16> = self
            .extra_columns
            .iter()
            .map(|h| (h.chars().count() as u16).clamp(8, 16))
            .collect();
        let fixed: u16 = 8 + 6 + 8 + 14 + 22 + 18 + extra_widths.iter().map(|w| w + 1).sum::<u16>();
        let spec_width = table_area.width.saturating_sub(fixed + 6).max(10) as usize;

        let page_rows = self.current_page();
        let rows: Vec<Row> = page_rows
            .iter()
            .map(|r| {
                let (spec, lines) = tui::wrap_text(&r.claim_specialty, spec_width);
                let mut cells = vec![
                    Cell::from(r.month.to_string()),
                    Cell::from(r.year.clone()),
                    Cell::from(r.month_n.to_string()),
                    Cell::from(tui::money_span(r.paid_amount)),
                    Cell::from(r.service_category.clone()),
                    Cell::from(r.payer.clone()),
                    Cell::from(spec),
                ];
                cells.extend(r.extras.iter().map(|v| Cell::from(v.clone())));
                Row::new(cells).height(lines)
            })
            .collect();

        let mut header: Vec<Cell> = Column::ALL
            .iter()
            .map(|c| {
                let arrow = match self.sort {
                    Some((s, SortDirection::Ascending)) if s == *c => " \u{25b2}",
                    Some((s, SortDirection::Descending)) if s == *c => " \u{25bc}",
                    _ => "",
                };
                let style = if *c == self.cursor {
                    HEADER_STYLE.add_modifier(Modifier::UNDERLINED)
                } else {
                    HEADER_STYLE
                };
                Cell::from(Span::styled(format!("{}{arrow}", c.header()), style))
            })
            .collect();
        header.extend(
            self.extra_columns
                .iter()
                .map(|h| Cell::from(Span::styled(h.clone(), HEADER_STYLE))),
        );

        let mut widths = vec![
            Constraint::Length(8),
            Constraint::Length(6),
            Constraint::Length(8),
            Constraint::Length(14),
            Constraint::Length(22),
            Constraint::Length(18),
            Constraint::Fill(1),
        ];
        widths.extend(extra_widths.into_iter().map(Constraint::Length));

        let page_empty = page_rows.is_empty();
        if page_empty {
            self.table_state.select(None);
        } else {
            self.table_state.select(Some(self.selected));
        }
        let table = Table::new(rows, widths)
            .header(Row::new(header).bottom_margin(1))
            .column_spacing(1)
            .row_highlight_style(SELECTED_STYLE);
        frame.render_stateful_widget(table, table_area, &mut self.table_state);

        let total: f64 = self.visible.iter().map(|r| r.paid_amount).sum();
        let search = if self.query.is_empty() {
            String::new()
        } else {
            format!(" | search: {}", self.query)
        };
        let mut status = format!(
            "Page {} of {} | {} rows | Paid: {}{}",
            self.page + 1,
            self.page_count(),
            number(self.visible.len()),
            money(total),
            search,
        );
        if let Some(ref msg) = self.status_message {
            status.push_str(&format!(" | {msg}"));
        }
        frame.render_widget(Paragraph::new(status).style(FOOTER_STYLE), status_area);

        let keys = match &self.mode {
            BrowseMode::Normal => Paragraph::new(
                "\u{2191}/\u{2193}:select  n/p:page  g:goto  </>:column  s:sort  /:search  x:remove row",
            )
            .style(FOOTER_STYLE),
            BrowseMode::GotoPage(input) => Paragraph::new(Line::from(vec![
                Span::raw(format!("Go to page: {input}")),
                Span::styled("\u{2588}", Style::default().fg(Color::Gray)),
            ])),
            BrowseMode::Search(input) => {
                Paragraph::new(format!("Search (Enter=apply, Esc=cancel): {input}\u{2588}"))
            }
        };
        frame.render_widget(keys, keys_area);
    }

    /// True while the browser is collecting typed input, so the caller should
    /// not interpret keys itself.
    pub fn is_capturing_input(&self) -> bool {
        !matches!(self.mode, BrowseMode::Normal)
    }

    pub fn handle_key_event(&mut self, code: KeyCode) -> BrowseAction {
        self.status_message = None;

        match &mut self.mode {
            BrowseMode::Normal => match code {
                KeyCode::Char('q') => return BrowseAction::Close,
                KeyCode::Esc => {
                    if self.query.is_empty() {
                        return BrowseAction::Close;
                    }
                    self.query.clear();
                    self.refresh_visible();
                    self.page = 0;
                    self.selected = 0;
                }
                KeyCode::Down => {
                    if self.selected + 1 < self.current_page().len() {
                        self.selected += 1;
                    } else if self.page + 1 < self.page_count() {
                        self.next_page();
                    }
                }
                KeyCode::Up => {
                    if self.selected > 0 {
                        self.selected -= 1;
                    } else if self.page > 0 {
                        self.prev_page();
                        self.selected = self.current_page().len().saturating_sub(1);
                    }
                }
                KeyCode::Char('n') | KeyCode::Right | KeyCode::PageDown => self.next_page(),
                KeyCode::Char('p') | KeyCode::Left | KeyCode::PageUp => self.prev_page(),
                KeyCode::Home => {
                    self.page = 0;
                    self.selected = 0;
                }
                KeyCode::End => {
                    self.page = self.page_count() - 1;
                    self.selected = 0;
                }
                KeyCode::Char('>') => self.cursor = self.cursor.next(),
                KeyCode::Char('<') => {
                    let idx = Column::ALL.iter().position(|c| *c == self.cursor).unwrap_or(0);
                    self.cursor = Column::ALL[(idx + Column::ALL.len() - 1) % Column::ALL.len()];
                }
                KeyCode::Char('s') => self.sort_by(self.cursor),
                KeyCode::Char('x') | KeyCode::Delete => self.delete_selected(),
                KeyCode::Char('g') => self.mode = BrowseMode::GotoPage(String::new()),
                KeyCode::Char('/') => self.mode = BrowseMode::Search(self.query.clone()),
                _ => {}
            },
            BrowseMode::GotoPage(input) | BrowseMode::Search(input) => match code {
                KeyCode::Esc => self.mode = BrowseMode::Normal,
                KeyCode::Enter => self.submit_input(),
                KeyCode::Backspace => {
                    input.pop();
                }
                KeyCode::Char(c) => input.push(c),
                _ => {}
            },
        }
        BrowseAction::Continue
    }

    fn submit_input(&mut self) {
        let mode = std::mem::replace(&mut self.mode, BrowseMode::Normal);
        match mode {
            BrowseMode::GotoPage(input) => match input.trim().parse::<usize>() {
                Ok(page) if page >= 1 && page <= self.page_count() => {
                    self.page = page - 1;
                    self.selected = 0;
                }
                _ => {
                    self.status_message = Some(format!(
                        "No page {} (1-{})",
                        input.trim(),
                        self.page_count()
                    ));
                }
            },
            BrowseMode::Search(input) => {
                self.query = input.trim().to_string();
                self.refresh_visible();
                self.page = 0;
                self.selected = 0;
                if self.visible().is_empty() {
                    self.status_message = Some(format!("No rows match \"{}\"", self.query));
                }
            }
            BrowseMode::Normal => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::test_support::{record, sample_dataset};

    fn make_rows(n: usize) -> Vec<ClaimRecord> {
        (0..n)
            .map(|i| {
                let month = 201801 + (i % 12) as i64;
                record(month, (i + 1) as f64 * 10.0, "SpecialistsFFS", &format!("Payer {}", i % 3))
            })
            .collect()
    }

    #[test]
    fn test_paging() {
        let rows = make_rows(25);
        let mut browser = ClaimBrowser::new(rows.iter().collect(), &[], 10);
        assert_eq!(browser.page_count(), 3);
        assert_eq!(browser.current_page().len(), 10);

        browser.handle_key_event(KeyCode::Char('n'));
        browser.handle_key_event(KeyCode::Char('n'));
        assert_eq!(browser.page, 2);
        assert_eq!(browser.current_page().len(), 5);

        // Stops at the last page
        browser.handle_key_event(KeyCode::Char('n'));
        assert_eq!(browser.page, 2);

        browser.handle_key_event(KeyCode::Home);
        assert_eq!(browser.page, 0);
        browser.handle_key_event(KeyCode::Char('p'));
        assert_eq!(browser.page, 0);
    }

    #[test]
    fn test_empty_view_has_one_page() {
        let browser = ClaimBrowser::new(vec![], &[], 10);
        assert_eq!(browser.page_count(), 1);
        assert!(browser.selected_row().is_none());
    }

    #[test]
    fn test_down_moves_across_pages() {
        let rows = make_rows(12);
        let mut browser = ClaimBrowser::new(rows.iter().collect(), &[], 10);
        for _ in 0..10 {
            browser.handle_key_event(KeyCode::Down);
        }
        assert_eq!(browser.page, 1);
        assert_eq!(browser.selected, 0);
        browser.handle_key_event(KeyCode::Up);
        assert_eq!(browser.page, 0);
        assert_eq!(browser.selected, 9);
    }

    #[test]
    fn test_goto_page() {
        let rows = make_rows(45);
        let mut browser = ClaimBrowser::new(rows.iter().collect(), &[], 10);
        browser.mode = BrowseMode::GotoPage("4".to_string());
        browser.submit_input();
        assert_eq!(browser.page, 3);

        browser.mode = BrowseMode::GotoPage("9".to_string());
        browser.submit_input();
        assert_eq!(browser.page, 3);
        assert!(browser.status_message.as_ref().unwrap().contains("No page 9"));
    }

    #[test]
    fn test_sort_toggles_direction() {
        let ds = sample_dataset();
        let mut browser = ClaimBrowser::new(ds.all(), &[], 10);
        browser.sort_by(Column::PaidAmount);
        assert_eq!(browser.current_page()[0].paid_amount, 50.0);
        assert_eq!(browser.sort, Some((Column::PaidAmount, SortDirection::Ascending)));

        browser.sort_by(Column::PaidAmount);
        assert_eq!(browser.current_page()[0].paid_amount, 1000.0);
        assert_eq!(browser.sort, Some((Column::PaidAmount, SortDirection::Descending)));
    }

    #[test]
    fn test_successive_sorts_are_multi_column() {
        let ds = sample_dataset();
        let mut browser = ClaimBrowser::new(ds.all(), &[], 10);
        browser.sort_by(Column::PaidAmount);
        browser.sort_by(Column::Payer);
        let page = browser.current_page();
        let got: Vec<(&str, f64)> = page.iter().map(|r| (r.payer.as_str(), r.paid_amount)).collect();
        assert_eq!(
            got,
            vec![
                ("Payer F", 50.0),
                ("Payer F", 120.0),
                ("Payer F", 300.0),
                ("Payer H", 75.5),
                ("Payer H", 500.0),
                ("Payer W", 1000.0),
            ]
        );
    }

    #[test]
    fn test_sort_key_uses_cursor() {
        let ds = sample_dataset();
        let mut browser = ClaimBrowser::new(ds.all(), &[], 10);
        browser.handle_key_event(KeyCode::Char('>'));
        browser.handle_key_event(KeyCode::Char('>'));
        browser.handle_key_event(KeyCode::Char('>'));
        assert_eq!(browser.cursor, Column::PaidAmount);
        browser.handle_key_event(KeyCode::Char('s'));
        assert_eq!(browser.sort, Some((Column::PaidAmount, SortDirection::Ascending)));
        browser.handle_key_event(KeyCode::Char('<'));
        assert_eq!(browser.cursor, Column::MonthN);
    }

    #[test]
    fn test_search_filters_rows() {
        let ds = sample_dataset();
        let mut browser = ClaimBrowser::new(ds.all(), &[], 10);
        browser.handle_key_event(KeyCode::Char('/'));
        assert!(browser.is_capturing_input());
        for c in "payer h".chars() {
            browser.handle_key_event(KeyCode::Char(c));
        }
        browser.handle_key_event(KeyCode::Enter);
        assert!(!browser.is_capturing_input());
        assert_eq!(browser.visible().len(), 2);

        // Esc clears the search before closing
        assert!(matches!(browser.handle_key_event(KeyCode::Esc), BrowseAction::Continue));
        assert_eq!(browser.visible().len(), 6);
        assert!(matches!(browser.handle_key_event(KeyCode::Esc), BrowseAction::Close));
    }

    #[test]
    fn test_search_without_matches_sets_status() {
        let ds = sample_dataset();
        let mut browser = ClaimBrowser::new(ds.all(), &[], 10);
        browser.mode = BrowseMode::Search("zzz".to_string());
        browser.submit_input();
        assert!(browser.visible().is_empty());
        assert!(browser.status_message.as_ref().unwrap().contains("zzz"));
    }

    #[test]
    fn test_delete_selected_only_changes_view() {
        let ds = sample_dataset();
        let mut browser = ClaimBrowser::new(ds.all(), &[], 10);
        browser.handle_key_event(KeyCode::Down);
        browser.handle_key_event(KeyCode::Char('x'));
        assert_eq!(browser.visible().len(), 5);
        assert!(browser.visible().iter().all(|r| r.month != 201802));
        assert_eq!(ds.len(), 6);
    }

    #[test]
    fn test_delete_last_row_on_last_page_clamps() {
        let rows = make_rows(11);
        let mut browser = ClaimBrowser::new(rows.iter().collect(), &[], 10);
        browser.handle_key_event(KeyCode::End);
        assert_eq!(browser.page, 1);
        browser.delete_selected();
        assert_eq!(browser.page, 0);
        assert_eq!(browser.page_count(), 1);
    }

    #[test]
    fn test_q_closes() {
        let rows = make_rows(3);
        let mut browser = ClaimBrowser::new(rows.iter().collect(), &[], 10);
        assert!(matches!(browser.handle_key_event(KeyCode::Char('q')), BrowseAction::Close));
    }

    #[test]
    fn test_extra_columns_are_shown_and_searched() {
        let extra_columns = vec!["REGION".to_string()];
        let mut north = record(201801, 50.0, "SpecialistsFFS", "Payer F");
        north.extras = vec!["North".to_string()];
        let mut south = record(201802, 500.0, "InpatientServices", "Payer H");
        south.extras = vec!["South".to_string()];
        let rows = vec![north, south];

        let mut browser = ClaimBrowser::new(rows.iter().collect(), &extra_columns, 10);
        browser.mode = BrowseMode::Search("south".to_string());
        browser.submit_input();
        assert_eq!(browser.visible().len(), 1);
        assert_eq!(browser.visible()[0].payer, "Payer H");

        let mut terminal = ratatui::Terminal::new(ratatui::backend::TestBackend::new(160, 12)).unwrap();
        terminal
            .draw(|frame| {
                let area = frame.area();
                browser.draw(frame, area);
            })
            .unwrap();
        let text: String = terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(text.contains("REGION"));
        assert!(text.contains("South"));
        assert!(!text.contains("North"));
    }

    #[test]
    fn test_view_follows_sort_and_removal_under_search() {
        let ds = sample_dataset();
        let mut browser = ClaimBrowser::new(ds.all(), &[], 10);
        browser.mode = BrowseMode::Search("payer f".to_string());
        browser.submit_input();
        browser.sort_by(Column::PaidAmount);
        browser.sort_by(Column::PaidAmount);
        let amounts: Vec<f64> = browser.visible().iter().map(|r| r.paid_amount).collect();
        assert_eq!(amounts, vec![300.0, 120.0, 50.0]);

        browser.delete_selected();
        assert_eq!(browser.visible().len(), 2);
        assert_eq!(browser.selected_row().map(|r| r.paid_amount), Some(120.0));
    }
}
