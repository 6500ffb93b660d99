use chrono::NaiveDate;
use portfolio_dashboard_core::models::analytics::{format_money, DashboardSnapshot};
use portfolio_dashboard_core::models::chart::ChartDataPoint;
use portfolio_dashboard_core::models::settings::{
    DashboardParams, CAPITAL_STEP, MAX_REFRESH_SECS, MIN_INITIAL_CAPITAL,
};

const WIDTH: i32 = 960;
const HEIGHT: i32 = 420;
const PADDING: f64 = 56.0;
const PORTFOLIO_COLOR: &str = "#348dc1";
const BENCHMARK_COLOR: &str = "#ff9933";
const GRID_COLOR: &str = "#e6e6e6";
const Y_TICKS: usize = 5;

const STYLE: &str = r#"
body { margin: 0; font-family: "Source Sans Pro", Helvetica, Arial, sans-serif; color: #262730; display: flex; }
aside { width: 260px; min-height: 100vh; background: #f0f2f6; padding: 24px; box-sizing: border-box; }
aside label { display: block; margin: 14px 0 4px; font-size: 14px; }
aside input { width: 100%; box-sizing: border-box; padding: 6px; }
aside button { margin-top: 18px; width: 100%; padding: 8px; }
main { flex: 1; padding: 24px 48px; }
.metrics { display: flex; gap: 24px; }
.metric { flex: 1; }
.metric .label { font-size: 14px; color: #555; }
.metric .value { font-size: 32px; }
.error { background: #ffe2e2; color: #7d1a1a; padding: 12px 16px; border-radius: 6px; }
.note { color: #777; font-size: 13px; }
table.weights { border-collapse: collapse; font-size: 13px; }
table.weights td, table.weights th { padding: 2px 12px 2px 0; text-align: left; }
"#;

/// Minimal escaping for text and attribute values.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// What the sidebar controls show.
#[derive(Debug, Clone, PartialEq)]
pub struct FormState {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub capital: f64,
    /// 0 means auto-refresh is off.
    pub refresh_secs: u32,
}

impl From<&DashboardParams> for FormState {
    fn from(params: &DashboardParams) -> Self {
        Self {
            start: params.start,
            end: params.end,
            capital: params.initial_capital,
            refresh_secs: params.refresh_interval_secs.unwrap_or(0),
        }
    }
}

/// Full page for a successful render.
pub fn render_dashboard(snapshot: &DashboardSnapshot) -> String {
    let form = FormState::from(&snapshot.params);
    let label = escape_html(&snapshot.benchmark_label);

    let mut body = String::new();
    body.push_str(&format!("<h2>Portfolio vs. {label} Performance</h2>\n"));
    body.push_str(&render_chart_svg(&snapshot.chart, &snapshot.benchmark_label));

    body.push_str("<h2>Performance Statistics</h2>\n<div class=\"metrics\">\n");
    body.push_str(&metric("Portfolio Return (%)", &snapshot.summary.portfolio_return_display()));
    body.push_str(&metric(
        &format!("{} Return (%)", snapshot.benchmark_label),
        &snapshot.summary.benchmark_return_display(),
    ));
    body.push_str(&metric("Portfolio Value ($)", &snapshot.summary.final_value_display()));
    body.push_str("</div>\n");

    body.push_str(&render_weights(snapshot));

    page(&snapshot.title, &form, snapshot.refresh_interval_secs(), &body)
}

/// Full page showing an error banner instead of the chart.
pub fn render_error(title: &str, form: &FormState, message: &str) -> String {
    let body = format!(
        "<div class=\"error\"><strong>Could not render dashboard:</strong> {}</div>\n",
        escape_html(message)
    );
    let refresh = (form.refresh_secs > 0).then_some(form.refresh_secs);
    page(title, form, refresh, &body)
}

fn page(title: &str, form: &FormState, refresh_secs: Option<u32>, body: &str) -> String {
    let title = escape_html(title);
    let refresh_meta = refresh_secs
        .map(|secs| format!("<meta http-equiv=\"refresh\" content=\"{secs}\">\n"))
        .unwrap_or_default();

    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n{refresh_meta}\
<title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n{sidebar}<main>\n<h1>{title}</h1>\n{body}</main>\n</body>\n</html>\n",
        sidebar = render_sidebar(form),
    )
}

fn render_sidebar(form: &FormState) -> String {
    format!(
        r#"<aside>
<h3>Settings</h3>
<form method="get" action="/">
<label for="start">Start Date</label>
<input type="date" id="start" name="start" value="{start}">
<label for="end">End Date</label>
<input type="date" id="end" name="end" value="{end}">
<label for="capital">Initial Investment ($)</label>
<input type="number" id="capital" name="capital" min="{min_capital}" step="{step}" value="{capital}">
<label for="refresh">Auto-refresh (seconds, 0 = off): <output id="refresh-value">{refresh}</output></label>
<input type="range" id="refresh" name="refresh" min="0" max="{max_refresh}" step="10" value="{refresh}" oninput="document.getElementById('refresh-value').textContent = this.value">
<button type="submit">Update</button>
</form>
</aside>
"#,
        start = form.start,
        end = form.end,
        min_capital = MIN_INITIAL_CAPITAL,
        step = CAPITAL_STEP,
        capital = form.capital,
        refresh = form.refresh_secs,
        max_refresh = MAX_REFRESH_SECS,
    )
}

fn metric(label: &str, value: &str) -> String {
    format!(
        "<div class=\"metric\"><div class=\"label\">{}</div><div class=\"value\">{}</div></div>\n",
        escape_html(label),
        escape_html(value)
    )
}

fn render_weights(snapshot: &DashboardSnapshot) -> String {
    let mut html = String::from(
        "<h3>Effective Weights</h3>\n<table class=\"weights\">\n<tr><th>Ticker</th><th>Target</th><th>Effective</th></tr>\n",
    );
    for w in &snapshot.weights {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{:.2}%</td><td>{:.2}%</td></tr>\n",
            escape_html(&w.symbol),
            w.configured * 100.0,
            w.normalized * 100.0
        ));
    }
    html.push_str("</table>\n");
    if !snapshot.excluded.is_empty() {
        let list: Vec<String> = snapshot.excluded.iter().map(|s| escape_html(s)).collect();
        html.push_str(&format!(
            "<p class=\"note\">No data for: {}. Weights were rescaled over the remaining tickers.</p>\n",
            list.join(", ")
        ));
    }
    html
}

// ── SVG line chart ──────────────────────────────────────────────────

fn svg_header(width: i32, height: i32) -> String {
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {width} {height}" width="100%" font-family="Helvetica, Arial, sans-serif" font-size="11">"#
    )
}

fn extent(points: &[ChartDataPoint]) -> Option<(f64, f64)> {
    let mut min_v = f64::INFINITY;
    let mut max_v = f64::NEG_INFINITY;
    for p in points {
        for v in [p.portfolio_value, p.benchmark_value] {
            if v.is_finite() {
                min_v = min_v.min(v);
                max_v = max_v.max(v);
            }
        }
    }
    if !min_v.is_finite() || !max_v.is_finite() {
        return None;
    }
    if min_v == max_v {
        // widen flat ranges
        let adjust = if min_v == 0.0 { 1.0 } else { min_v.abs() * 0.05 };
        min_v -= adjust;
        max_v += adjust;
    }
    Some((min_v, max_v))
}

fn scale_y(value: f64, min_v: f64, max_v: f64) -> f64 {
    let height = HEIGHT as f64;
    let inner = height - 2.0 * PADDING;
    let norm = (value - min_v) / (max_v - min_v);
    PADDING + (1.0 - norm) * inner
}

fn scale_x(idx: usize, count: usize) -> f64 {
    let width = WIDTH as f64;
    if count <= 1 {
        return width / 2.0;
    }
    let inner = width - 2.0 * PADDING;
    PADDING + inner * idx as f64 / (count - 1) as f64
}

fn polyline(
    points: &[ChartDataPoint],
    min_v: f64,
    max_v: f64,
    pick: fn(&ChartDataPoint) -> f64,
    color: &str,
) -> String {
    let coords: Vec<String> = points
        .iter()
        .enumerate()
        .filter(|(_, p)| pick(p).is_finite())
        .map(|(i, p)| {
            format!(
                "{:.2},{:.2}",
                scale_x(i, points.len()),
                scale_y(pick(p), min_v, max_v)
            )
        })
        .collect();
    format!(
        r#"<polyline fill="none" stroke="{color}" stroke-width="1.8" points="{}" />"#,
        coords.join(" ")
    )
}

/// Dual-series line chart of portfolio and benchmark value, as inline SVG.
/// Returns an empty string when there is nothing to plot.
pub fn render_chart_svg(points: &[ChartDataPoint], benchmark_label: &str) -> String {
    let (min_v, max_v) = match extent(points) {
        Some(extent) => extent,
        None => return String::new(),
    };
    let width = WIDTH as f64;

    let mut svg = svg_header(WIDTH, HEIGHT);

    // horizontal grid with value labels
    for i in 0..=Y_TICKS {
        let value = min_v + (max_v - min_v) * i as f64 / Y_TICKS as f64;
        let y = scale_y(value, min_v, max_v);
        svg.push_str(&format!(
            r#"<line x1="{x1:.2}" y1="{y:.2}" x2="{x2:.2}" y2="{y:.2}" stroke="{GRID_COLOR}" stroke-width="1" />"#,
            x1 = PADDING,
            x2 = width - PADDING,
        ));
        svg.push_str(&format!(
            r##"<text x="{x:.2}" y="{y:.2}" text-anchor="end" fill="#555">{label}</text>"##,
            x = PADDING - 6.0,
            y = y + 4.0,
            label = format_axis_value(value),
        ));
    }

    // first, middle and last date on the x axis
    let mut label_idx = vec![0, points.len() / 2, points.len() - 1];
    label_idx.dedup();
    for idx in label_idx {
        let anchor = if idx == 0 {
            "start"
        } else if idx == points.len() - 1 {
            "end"
        } else {
            "middle"
        };
        svg.push_str(&format!(
            r##"<text x="{x:.2}" y="{y:.2}" text-anchor="{anchor}" fill="#555">{date}</text>"##,
            x = scale_x(idx, points.len()),
            y = HEIGHT as f64 - PADDING + 18.0,
            date = points[idx].date,
        ));
    }

    svg.push_str(&polyline(points, min_v, max_v, |p| p.benchmark_value, BENCHMARK_COLOR));
    svg.push_str(&polyline(points, min_v, max_v, |p| p.portfolio_value, PORTFOLIO_COLOR));

    // legend
    let entries = [
        ("Portfolio ($)".to_string(), PORTFOLIO_COLOR),
        (format!("{} ($)", escape_html(benchmark_label)), BENCHMARK_COLOR),
    ];
    let mut y = PADDING - 24.0;
    for (label, color) in entries {
        svg.push_str(&format!(
            r#"<line x1="{x1:.2}" y1="{ly:.2}" x2="{x2:.2}" y2="{ly:.2}" stroke="{color}" stroke-width="2" />"#,
            x1 = PADDING + 10.0,
            x2 = PADDING + 30.0,
            ly = y - 4.0,
        ));
        svg.push_str(&format!(
            r##"<text x="{x:.2}" y="{y:.2}" text-anchor="start" fill="#333">{label}</text>"##,
            x = PADDING + 36.0,
        ));
        y += 14.0;
    }

    svg.push_str("</svg>\n");
    svg
}

fn format_axis_value(value: f64) -> String {
    if value.abs() >= 10_000.0 {
        format_money(value.round()).trim_end_matches(".00").to_string()
    } else {
        format_money(value)
    }
}
