use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use log::info;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph},
    Frame,
};

use crate::browser::ClaimBrowser;
use crate::cli::open_dataset;
use crate::dataset::Dataset;
use crate::error::{ClaimError, Result};
use crate::filter::{filter_records, parse_picker_date, FilterState};
use crate::fmt::{format_k, money, month_abbr, number};
use crate::loader;
use crate::models::ClaimRecord;
use crate::reports;
use crate::settings::load_settings;
use crate::tui::{self, bar_value, series_style, FOOTER_STYLE, HEADER_STYLE, WARN_STYLE};

const END_DATE_HINT: &str = "End date has no effect without a start date";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Data,
    Charts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputField {
    StartDate,
    EndDate,
    AmountLow,
    AmountHigh,
}

impl InputField {
    fn label(self) -> &'static str {
        match self {
            InputField::StartDate => "Start date (YYYY-MM-DD, empty to unset)",
            InputField::EndDate => "End date (YYYY-MM-DD, empty to unset)",
            InputField::AmountLow => "Lowest amount (empty for dataset minimum)",
            InputField::AmountHigh => "Highest amount (empty for dataset maximum)",
        }
    }
}

enum Mode {
    Normal,
    Editing { field: InputField, buffer: String },
}

/// The interactive view. Every control change goes through `recompute`,
/// which rebuilds the filtered rows, the table and the charts from the
/// immutable dataset.
pub struct Dashboard<'a> {
    dataset: &'a Dataset,
    filter: FilterState,
    rows: Vec<&'a ClaimRecord>,
    browser: ClaimBrowser<'a>,
    screen: Screen,
    mode: Mode,
    payers: Vec<String>,
    payer_idx: usize,
    page_size: usize,
    status_message: Option<String>,
}

impl<'a> Dashboard<'a> {
    pub fn new(dataset: &'a Dataset, page_size: usize) -> Self {
        let mut dashboard = Self {
            dataset,
            filter: FilterState::full_range(dataset),
            rows: Vec::new(),
            browser: ClaimBrowser::new(Vec::new(), &dataset.extra_columns, page_size),
            screen: Screen::Data,
            mode: Mode::Normal,
            payers: dataset.payers(),
            payer_idx: 0,
            page_size,
            status_message: None,
        };
        dashboard.recompute();
        dashboard
    }

    fn recompute(&mut self) {
        self.rows = filter_records(self.dataset, &self.filter);
        let dataset = self.dataset;
        self.browser = ClaimBrowser::new(self.rows.clone(), &dataset.extra_columns, self.page_size);
        if self.filter.end_date_ignored() {
            self.status_message = Some(END_DATE_HINT.to_string());
        }
    }

    fn selected_payer(&self) -> Option<&str> {
        self.payers.get(self.payer_idx).map(String::as_str)
    }

    fn begin_edit(&mut self, field: InputField) {
        self.mode = Mode::Editing {
            field,
            buffer: String::new(),
        };
    }

    fn apply_edit(&mut self, field: InputField, input: &str) -> Result<()> {
        let input = input.trim();
        let bounds = self.dataset.amount_bounds();
        let parse_amount = |s: &str| {
            loader::parse_amount(s).ok_or_else(|| ClaimError::Other(format!("Invalid amount: {s}")))
        };
        match field {
            InputField::StartDate | InputField::EndDate => {
                let date = if input.is_empty() {
                    None
                } else {
                    Some(parse_picker_date(input)?)
                };
                if field == InputField::StartDate {
                    self.filter.start_date = date;
                } else {
                    self.filter.end_date = date;
                }
            }
            InputField::AmountLow | InputField::AmountHigh => {
                let Some((lo, hi)) = self.filter.amount_range.or(bounds) else {
                    return Err(ClaimError::Other("Dataset has no amounts".to_string()));
                };
                self.filter.amount_range = Some(if field == InputField::AmountLow {
                    let lo = if input.is_empty() {
                        bounds.map_or(lo, |b| b.0)
                    } else {
                        parse_amount(input)?
                    };
                    (lo, hi)
                } else {
                    let hi = if input.is_empty() {
                        bounds.map_or(hi, |b| b.1)
                    } else {
                        parse_amount(input)?
                    };
                    (lo, hi)
                });
            }
        }
        info!("filter changed: {}", self.filter.describe());
        self.recompute();
        Ok(())
    }

    fn handle_edit_key(&mut self, code: KeyCode) {
        let Mode::Editing { field, buffer } = &mut self.mode else {
            return;
        };
        match code {
            KeyCode::Esc => self.mode = Mode::Normal,
            KeyCode::Enter => {
                let field = *field;
                let input = std::mem::take(buffer);
                self.mode = Mode::Normal;
                if let Err(e) = self.apply_edit(field, &input) {
                    self.status_message = Some(e.to_string());
                }
            }
            KeyCode::Backspace => {
                buffer.pop();
            }
            KeyCode::Char(c) => buffer.push(c),
            _ => {}
        }
    }

    /// Handle one key press. Returns true when the dashboard should exit.
    pub fn handle_key(&mut self, code: KeyCode) -> bool {
        if matches!(self.mode, Mode::Editing { .. }) {
            self.handle_edit_key(code);
            return false;
        }
        if self.screen == Screen::Data && self.browser.is_capturing_input() {
            self.browser.handle_key_event(code);
            return false;
        }

        self.status_message = None;
        match code {
            KeyCode::Char('q') => return true,
            KeyCode::Tab => {
                self.screen = match self.screen {
                    Screen::Data => Screen::Charts,
                    Screen::Charts => Screen::Data,
                };
            }
            KeyCode::Char('f') => self.begin_edit(InputField::StartDate),
            KeyCode::Char('t') => self.begin_edit(InputField::EndDate),
            KeyCode::Char('l') => self.begin_edit(InputField::AmountLow),
            KeyCode::Char('h') => self.begin_edit(InputField::AmountHigh),
            KeyCode::Char('c') => {
                self.filter.clear_dates();
                self.recompute();
            }
            KeyCode::Char('r') => {
                self.filter.clear_amount(self.dataset);
                self.recompute();
            }
            KeyCode::Right if self.screen == Screen::Charts && !self.payers.is_empty() => {
                self.payer_idx = (self.payer_idx + 1) % self.payers.len();
            }
            KeyCode::Left if self.screen == Screen::Charts && !self.payers.is_empty() => {
                self.payer_idx = (self.payer_idx + self.payers.len() - 1) % self.payers.len();
            }
            KeyCode::Esc if self.screen == Screen::Charts => self.screen = Screen::Data,
            _ if self.screen == Screen::Data => {
                // Close from the browser is ignored; only q leaves the dashboard.
                self.browser.handle_key_event(code);
                if self.filter.end_date_ignored() && self.status_message.is_none() {
                    self.status_message = Some(END_DATE_HINT.to_string());
                }
            }
            _ => {}
        }
        false
    }

    pub fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        let [header_area, sep1, body_area, hints_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(1),
        ])
        .areas(area);

        let source = self
            .dataset
            .source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        frame.render_widget(
            Paragraph::new(format!(
                " Claims dashboard | {source} | {} of {} rows | Paid: {}",
                number(self.rows.len()),
                number(self.dataset.len()),
                money(reports::total_paid(&self.rows)),
            ))
            .style(HEADER_STYLE),
            header_area,
        );
        let sep_line = "\u{2501}".repeat(area.width as usize);
        frame.render_widget(
            Paragraph::new(sep_line).style(Style::default().fg(Color::DarkGray)),
            sep1,
        );

        match self.screen {
            Screen::Data => self.draw_data(frame, body_area),
            Screen::Charts => self.draw_charts(frame, body_area),
        }

        let hints = match self.screen {
            Screen::Data => "Tab:charts  f/t:start/end date  l/h:amount low/high  c:clear dates  r:reset range  q:quit",
            Screen::Charts => "Tab/Esc:data  \u{2190}/\u{2192}:payer  f/t:dates  l/h:amounts  c:clear dates  r:reset range  q:quit",
        };
        frame.render_widget(Paragraph::new(hints).style(FOOTER_STYLE), hints_area);
    }

    fn controls_lines(&self) -> Vec<Line<'static>> {
        let fmt_date = |d: Option<chrono::NaiveDate>| d.map_or("(none)".to_string(), |d| d.to_string());
        let mut lines = vec![
            Line::from(format!(
                " Start: {}   End: {}   ({})",
                fmt_date(self.filter.start_date),
                fmt_date(self.filter.end_date),
                self.filter.describe(),
            )),
            Line::from(format!(" {}", self.filter.range_summary())),
        ];
        let third = match (&self.mode, &self.status_message) {
            (Mode::Editing { field, buffer }, _) => Line::from(vec![
                Span::raw(format!(" {}: {buffer}", field.label())),
                Span::styled("\u{2588}", Style::default().fg(Color::Gray)),
            ]),
            (Mode::Normal, Some(msg)) => Line::from(Span::styled(format!(" {msg}"), WARN_STYLE)),
            (Mode::Normal, None) => Line::from(""),
        };
        lines.push(third);
        lines
    }

    fn draw_data(&mut self, frame: &mut Frame, area: Rect) {
        let [controls_area, table_area] =
            Layout::vertical([Constraint::Length(4), Constraint::Fill(1)]).areas(area);
        frame.render_widget(Paragraph::new(self.controls_lines()), controls_area);
        self.browser.draw(frame, table_area);
    }

    fn draw_charts(&self, frame: &mut Frame, area: Rect) {
        let [controls_area, top, middle, bottom] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Percentage(30),
            Constraint::Percentage(35),
            Constraint::Fill(1),
        ])
        .areas(area);
        frame.render_widget(Paragraph::new(self.controls_lines()), controls_area);

        let [cat_area, payer_area] =
            Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(top);
        frame.render_widget(
            share_chart("Paid amount per service category", &reports::by_service_category(&self.rows)),
            cat_area,
        );
        frame.render_widget(
            share_chart("Paid amount per payer", &reports::by_payer(&self.rows)),
            payer_area,
        );

        let years = reports::years(&self.rows);
        let [legend_area, monthly_area] =
            Layout::vertical([Constraint::Length(1), Constraint::Fill(1)]).areas(middle);
        frame.render_widget(Paragraph::new(legend_line(&years)), legend_area);
        frame.render_widget(monthly_chart(&self.rows, &years), monthly_area);

        let [payer_year_area, drill_area] =
            Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)]).areas(bottom);
        frame.render_widget(payer_year_chart(&self.rows, &years), payer_year_area);

        match self.selected_payer() {
            Some(payer) => frame.render_widget(drilldown_chart(&self.rows, payer), drill_area),
            None => frame.render_widget(
                Paragraph::new(" No payers in dataset").style(FOOTER_STYLE),
                drill_area,
            ),
        }
    }
}

fn chart_block(title: String) -> Block<'static> {
    Block::default()
        .title(title)
        .title_style(Style::default().add_modifier(Modifier::BOLD))
        .borders(Borders::NONE)
}

fn legend_line(years: &[String]) -> Line<'static> {
    let mut spans = vec![Span::styled(
        " Paid amount per month  ",
        Style::default().add_modifier(Modifier::BOLD),
    )];
    for (i, year) in years.iter().enumerate() {
        spans.push(Span::styled("\u{25a0} ", series_style(i)));
        spans.push(Span::raw(format!("{year}  ")));
    }
    Line::from(spans)
}

/// Horizontal bars, one per group, labelled with amount and share.
fn share_chart(title: &str, groups: &[reports::GroupTotal]) -> BarChart<'static> {
    let bars: Vec<Bar> = groups
        .iter()
        .enumerate()
        .map(|(i, g)| {
            Bar::default()
                .label(Line::from(g.label.clone()))
                .value(bar_value(g.total))
                .text_value(format!("{} ({:.1}%)", format_k(g.total), g.pct))
                .style(series_style(i))
        })
        .collect();
    BarChart::default()
        .block(chart_block(title.to_string()))
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(0)
        .data(BarGroup::default().bars(&bars))
}

/// One group per calendar month, one bar per year.
fn monthly_chart(rows: &[&ClaimRecord], years: &[String]) -> BarChart<'static> {
    let totals = reports::by_month_year(rows);
    let mut months: Vec<u32> = totals.iter().map(|t| t.month_n).collect();
    months.sort_unstable();
    months.dedup();

    let mut chart = BarChart::default().bar_width(2).bar_gap(0).group_gap(1);
    for month_n in months {
        let bars: Vec<Bar> = years
            .iter()
            .enumerate()
            .map(|(i, year)| {
                let total = totals
                    .iter()
                    .find(|t| t.month_n == month_n && &t.year == year)
                    .map_or(0.0, |t| t.total);
                Bar::default()
                    .value(bar_value(total))
                    .text_value(String::new())
                    .style(series_style(i))
            })
            .collect();
        chart = chart.data(
            BarGroup::default()
                .label(Line::from(month_abbr(month_n)))
                .bars(&bars),
        );
    }
    chart
}

/// One group per payer, one bar per year.
fn payer_year_chart(rows: &[&ClaimRecord], years: &[String]) -> BarChart<'static> {
    let totals = reports::by_payer_year(rows);
    let mut payers: Vec<&str> = totals.iter().map(|t| t.payer.as_str()).collect();
    payers.dedup();

    let mut chart = BarChart::default()
        .block(chart_block("Years' comparison per payer".to_string()))
        .bar_width(3)
        .bar_gap(0)
        .group_gap(2);
    for payer in payers {
        let bars: Vec<Bar> = years
            .iter()
            .enumerate()
            .map(|(i, year)| {
                let total = totals
                    .iter()
                    .find(|t| t.payer == payer && &t.year == year)
                    .map_or(0.0, |t| t.total);
                Bar::default()
                    .value(bar_value(total))
                    .text_value(String::new())
                    .style(series_style(i))
            })
            .collect();
        chart = chart.data(
            BarGroup::default()
                .label(Line::from(payer.to_string()))
                .bars(&bars),
        );
    }
    chart
}

fn drilldown_chart(rows: &[&ClaimRecord], payer: &str) -> BarChart<'static> {
    let bars: Vec<Bar> = reports::payer_by_year(rows, payer)
        .iter()
        .enumerate()
        .map(|(i, y)| {
            Bar::default()
                .label(Line::from(y.year.clone()))
                .value(bar_value(y.total))
                .text_value(format_k(y.total))
                .style(series_style(i))
        })
        .collect();
    BarChart::default()
        .block(chart_block(format!("Yearly payment for {payer}")))
        .bar_width(6)
        .bar_gap(2)
        .data(BarGroup::default().bars(&bars))
}

pub fn run(data: Option<&str>) -> Result<()> {
    let dataset = open_dataset(data)?;
    let page_size = load_settings().page_size;
    let mut dashboard = Dashboard::new(&dataset, page_size);

    tui::with_terminal(|terminal| loop {
        terminal.draw(|frame| dashboard.draw(frame))?;
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
                return Ok(());
            }
            if dashboard.handle_key(key.code) {
                return Ok(());
            }
        }
    })
}
