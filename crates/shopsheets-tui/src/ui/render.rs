use chrono::Local;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Cell, Clear, Paragraph, Row, Table},
    Frame,
};
use shopsheets_core::dashboard::{count_label, Activity, PaymentSummary};
use shopsheets_core::utils::{format_date, format_inr, format_phone, truncate_string};

use super::styles;
use crate::app::{App, AppState, Tab};

pub fn render(frame: &mut Frame, app: &App) {
    let banner_height = if app.banner.is_some() { 1 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),             // Title and tabs
            Constraint::Length(banner_height), // Offline banner
            Constraint::Min(10),               // Main content
            Constraint::Length(1),             // Status bar
        ])
        .split(frame.area());

    render_tabs(frame, app, chunks[0]);
    if let Some(banner) = &app.banner {
        frame.render_widget(Paragraph::new(format!(" {}", banner)).style(styles::banner_style()), chunks[1]);
    }
    match app.current_tab {
        Tab::Overview => render_overview(frame, app, chunks[2]),
        Tab::Activity => render_activity(frame, app, chunks[2]),
        Tab::Workers => render_workers(frame, app, chunks[2]),
        Tab::Payments => render_payments(frame, app, chunks[2]),
    }
    render_status_bar(frame, app, chunks[3]);

    if matches!(app.state, AppState::ShowingHelp) {
        render_help_overlay(frame);
    }
}

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::styled(" Shop Manager  ", styles::title_style())];
    for (i, tab) in Tab::ALL.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", styles::muted_style()));
        }
        spans.push(Span::styled(
            format!("[{}] {}", i + 1, tab.title()),
            styles::tab_style(app.current_tab == *tab),
        ));
    }
    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::border_style());
    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn titled(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style())
        .title(Span::styled(format!(" {} ", title), styles::title_style()))
}

// ===== Overview =====

fn render_overview(frame: &mut Frame, app: &App, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(8), Constraint::Min(8)])
        .split(area);

    render_kpis(frame, app, rows[0]);

    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(rows[1]);
    render_monthly_chart(frame, app, top[0]);
    render_revenue_split(frame, app, top[1]);

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[2]);
    render_payment_counts(frame, app, bottom[0]);
    render_expense_chart(frame, app, bottom[1]);
}

fn render_kpis(frame: &mut Frame, app: &App, area: Rect) {
    let kpis = app.data.kpis();
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(area);

    let (trend, trend_style) = if kpis.is_profitable() {
        ("▲ Profitable", styles::success_style())
    } else {
        ("▼ Loss", styles::error_style())
    };
    let cards = [
        ("Total Revenue", format_inr(kpis.total_revenue), None),
        ("Total Orders", kpis.order_count.to_string(), None),
        ("Workers", kpis.worker_count.to_string(), None),
        ("Profit", format_inr(kpis.profit), Some((trend, trend_style))),
    ];

    for (area, (title, value, note)) in cols.iter().zip(cards) {
        let value = if app.loading && app.data.loaded_at.is_none() {
            "Loading...".to_string()
        } else {
            value
        };
        let mut lines = vec![Line::from(Span::styled(value, styles::title_style()))];
        if let Some((text, style)) = note {
            lines.push(Line::from(Span::styled(text, style)));
        }
        frame.render_widget(Paragraph::new(lines).block(titled(title)), *area);
    }
}

fn render_monthly_chart(frame: &mut Frame, app: &App, area: Rect) {
    let months = app.data.monthly_revenue(Local::now().date_naive());
    let bars: Vec<Bar> = months
        .iter()
        .map(|m| {
            Bar::default()
                .label(Line::from(m.label.clone()))
                .value(m.revenue.max(0.0).round() as u64)
                .text_value(compact_inr(m.revenue))
        })
        .collect();
    let chart = BarChart::default()
        .block(titled("Monthly Revenue"))
        .data(BarGroup::default().bars(&bars))
        .bar_width(7)
        .bar_gap(2)
        .bar_style(Style::default().fg(styles::PRIMARY));
    frame.render_widget(chart, area);
}

fn render_revenue_split(frame: &mut Frame, app: &App, area: Rect) {
    let split = app.data.revenue_split();
    let total = split.total();
    let share = |v: f64| if total > 0.0 { v / total * 100.0 } else { 0.0 };
    let lines = vec![
        split_line("Combined Orders", split.combined, share(split.combined)),
        split_line("Fabric Only", split.fabric_only, share(split.fabric_only)),
        split_line("Tailoring Only", split.tailoring_only, share(split.tailoring_only)),
    ];
    frame.render_widget(Paragraph::new(lines).block(titled("Revenue by Order Type")), area);
}

fn split_line(label: &str, amount: f64, percent: f64) -> Line<'static> {
    Line::from(vec![
        Span::raw(format!("{:<16}", label)),
        Span::styled(format!("{:>14}", format_inr(amount)), styles::highlight_style()),
        Span::styled(format!("  {:>5.1}%", percent), styles::muted_style()),
    ])
}

fn render_payment_counts(frame: &mut Frame, app: &App, area: Rect) {
    let counts = app.data.payment_counts();
    let bars = [
        Bar::default()
            .label(Line::from("Paid"))
            .value(counts.paid as u64)
            .style(styles::success_style()),
        Bar::default()
            .label(Line::from("Unpaid"))
            .value(counts.unpaid as u64)
            .style(styles::error_style()),
        Bar::default()
            .label(Line::from("Partial"))
            .value(counts.partial as u64)
            .style(styles::highlight_style()),
    ];
    let chart = BarChart::default()
        .block(titled("Payment Status"))
        .data(BarGroup::default().bars(&bars))
        .bar_width(9)
        .bar_gap(3);
    frame.render_widget(chart, area);
}

fn render_expense_chart(frame: &mut Frame, app: &App, area: Rect) {
    let split = app.data.expense_split();
    let bar = |label: &'static str, amount: f64| {
        Bar::default()
            .label(Line::from(label))
            .value(amount.max(0.0).round() as u64)
            .text_value(compact_inr(amount))
    };
    let bars = [
        bar("Fabric", split.fabric_purchases),
        bar("Workers", split.worker_payments),
        bar("Other", split.other),
    ];
    let chart = BarChart::default()
        .block(titled("Expenses"))
        .data(BarGroup::default().bars(&bars))
        .bar_width(9)
        .bar_gap(3)
        .bar_style(Style::default().fg(styles::ACCENT));
    frame.render_widget(chart, area);
}

/// Short amount for bar labels: `₹12.5k`, `₹1.2L`.
fn compact_inr(amount: f64) -> String {
    let abs = amount.abs();
    let sign = if amount < 0.0 { "-" } else { "" };
    if abs >= 100_000.0 {
        format!("{}₹{:.1}L", sign, abs / 100_000.0)
    } else if abs >= 1_000.0 {
        format!("{}₹{:.1}k", sign, abs / 1_000.0)
    } else {
        format!("{}₹{:.0}", sign, abs)
    }
}

// ===== Activity =====

fn render_activity(frame: &mut Frame, app: &App, area: Rect) {
    let activity = app.data.recent_activity();
    if activity.is_empty() {
        let text = vec![
            Line::from(Span::styled("No recent activities to display", styles::muted_style())),
            Line::from(Span::styled(
                "Activities will appear here when you start using the system",
                styles::muted_style(),
            )),
        ];
        frame.render_widget(Paragraph::new(text).block(titled("Recent Activity")), area);
        return;
    }

    let rows: Vec<Row> = activity
        .iter()
        .map(|item| match item {
            Activity::Order {
                kind,
                customer,
                amount,
                status,
                date,
            } => Row::new(vec![
                Cell::from(kind.label()),
                Cell::from(customer.clone()),
                Cell::from(format_inr(*amount)),
                Cell::from(date.format("%d %b %Y").to_string()),
                Cell::from(Span::styled(status.clone(), styles::payment_status_style(status))),
            ]),
            Activity::WorkerPayment { worker, amount, date } => Row::new(vec![
                Cell::from("Worker Payment"),
                Cell::from(worker.clone()),
                Cell::from(format_inr(*amount)),
                Cell::from(format_date(date)),
                Cell::from(Span::styled("Paid", styles::success_style())),
            ]),
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(16),
            Constraint::Min(16),
            Constraint::Length(14),
            Constraint::Length(12),
            Constraint::Length(10),
        ],
    )
    .header(Row::new(["Type", "Customer", "Amount", "Date", "Status"]).style(styles::muted_style()))
    .block(titled("Recent Activity"));
    frame.render_widget(table, area);
}

// ===== Lists =====

fn search_title(app: &App, base: &str, label: String) -> String {
    if app.search_query.is_empty() {
        format!("{} ({})", base, label)
    } else {
        format!("{} [/{}] ({})", base, app.search_query, label)
    }
}

fn render_workers(frame: &mut Frame, app: &App, area: Rect) {
    let total = app.data.workers.len();
    let workers = app.filtered_workers();
    let rows: Vec<Row> = workers
        .iter()
        .enumerate()
        .map(|(i, w)| {
            let row = Row::new(vec![
                w.name.clone(),
                format_phone(&w.phone),
                truncate_string(&w.address, 40),
                format_date(&w.date_added),
            ]);
            if i == app.selection {
                row.style(styles::selected_style())
            } else {
                row
            }
        })
        .collect();

    let title = search_title(app, "Workers", count_label(workers.len(), total, "worker"));
    let table = Table::new(
        rows,
        [
            Constraint::Min(20),
            Constraint::Length(16),
            Constraint::Min(20),
            Constraint::Length(12),
        ],
    )
    .header(Row::new(["Name", "Phone", "Address", "Added"]).style(styles::muted_style()))
    .block(titled(&title));
    frame.render_widget(table, area);
}

fn render_payments(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(5)])
        .split(area);

    let payments = app.filtered_payments();
    let summary = PaymentSummary::of(&payments);
    let totals = Line::from(vec![
        Span::styled("Work ", styles::muted_style()),
        Span::styled(format_inr(summary.total_work), styles::highlight_style()),
        Span::styled("   Advance ", styles::muted_style()),
        Span::styled(format_inr(summary.total_advance), styles::highlight_style()),
        Span::styled("   Remaining ", styles::muted_style()),
        Span::styled(format_inr(summary.total_remaining), styles::highlight_style()),
    ]);
    frame.render_widget(Paragraph::new(totals).block(titled("Summary")), chunks[0]);

    let rows: Vec<Row> = payments
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let row = Row::new(vec![
                format_date(&p.date),
                p.worker_name.clone(),
                format!("{:.0}", p.paint_count),
                format!("{:.0}", p.shirt_count),
                format_inr(p.total_work_amount),
                format_inr(p.advance_taken),
                format_inr(p.remaining_payment),
                truncate_string(&p.notes, 30),
            ]);
            if i == app.selection {
                row.style(styles::selected_style())
            } else {
                row
            }
        })
        .collect();

    let title = search_title(
        app,
        "Payment History",
        count_label(summary.entries, app.data.payments.len(), "record"),
    );
    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Min(14),
            Constraint::Length(6),
            Constraint::Length(6),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Min(10),
        ],
    )
    .header(
        Row::new(["Date", "Worker", "Paint", "Shirt", "Work", "Advance", "Remaining", "Notes"])
            .style(styles::muted_style()),
    )
    .block(titled(&title));
    frame.render_widget(table, chunks[1]);
}

// ===== Chrome =====

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let left = match (&app.state, &app.status_message) {
        (AppState::Searching, _) => format!(" /{}", app.search_query),
        (_, Some(message)) => format!(" {}", message),
        _ => String::new(),
    };
    let right = "[r] Refresh  [/] Search  [?] Help  [q] Quit ";
    let padding = (area.width as usize).saturating_sub(left.chars().count() + right.len());
    let line = Line::from(vec![
        Span::raw(left),
        Span::raw(" ".repeat(padding)),
        Span::styled(right, styles::muted_style()),
    ]);
    frame.render_widget(Paragraph::new(line).style(styles::status_bar_style()), area);
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect(50, 50, frame.area());
    let keys = [
        ("1-4 / Tab", "Switch view"),
        ("j/k, ↑/↓", "Move selection"),
        ("PgUp/PgDn", "Scroll a page"),
        ("/", "Search workers or payment notes"),
        ("Esc", "Clear search / close"),
        ("r", "Refresh now"),
        ("q", "Quit"),
    ];
    let lines: Vec<Line> = keys
        .iter()
        .map(|(key, desc)| {
            Line::from(vec![
                Span::styled(format!("{:>12}  ", key), styles::help_key_style()),
                Span::raw(*desc),
            ])
        })
        .collect();
    frame.render_widget(Clear, area);
    frame.render_widget(Paragraph::new(lines).block(titled("Help")), area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compact_inr() {
        assert_eq!(compact_inr(950.0), "₹950");
        assert_eq!(compact_inr(12_500.0), "₹12.5k");
        assert_eq!(compact_inr(250_000.0), "₹2.5L");
        assert_eq!(compact_inr(-1_500.0), "-₹1.5k");
    }

    #[test]
    fn test_centered_rect_fits() {
        let outer = Rect::new(0, 0, 100, 40);
        let inner = centered_rect(50, 50, outer);
        assert_eq!(inner.width, 50);
        assert_eq!(inner.height, 20);
    }
}
