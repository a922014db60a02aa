//! Terminal and HTML rendering of a loaded board

use crate::viewer::table::{DisplayCell, DisplayTable};
use crate::viewer::LoadedView;
use colored::Colorize;

const TITLE: &str = "Latest Edges";

/// Shorten to `width` chars, marking the cut with an ellipsis
pub fn truncate_cell(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(1)).collect();
    format!("{}…", kept)
}

fn published_label(view: &LoadedView) -> &str {
    view.published.as_deref().unwrap_or("unknown")
}

fn summary_line(table: &DisplayTable) -> String {
    format!("Rows: {} | Cols: {}", table.rows.len(), table.columns.len())
}

/// Render the board as an aligned, colored table
pub fn render_terminal(view: &LoadedView, max_cell_width: usize) -> String {
    let table = &view.table;
    let mut lines = Vec::new();

    lines.push(format!("{}", format!("📊 {}", TITLE).bold().cyan()));
    lines.push(format!("Published: {}", published_label(view).bright_blue()));
    lines.push(summary_line(table));

    if table.columns.is_empty() {
        lines.push(format!("{}", "⚠️  The published file has no columns".yellow()));
        return lines.join("\n") + "\n";
    }

    let cells: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|cell| truncate_cell(&cell.display(), max_cell_width))
                .collect()
        })
        .collect();
    let headers: Vec<String> = table
        .columns
        .iter()
        .map(|c| truncate_cell(c, max_cell_width))
        .collect();

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            cells
                .iter()
                .filter_map(|row| row.get(i))
                .map(|c| c.chars().count())
                .chain(std::iter::once(h.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();
    let rule_width = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);

    lines.push("─".repeat(rule_width));
    let header_line: Vec<String> = headers
        .iter()
        .zip(&widths)
        .map(|(h, w)| format!("{}", pad(h, *w, false).bold()))
        .collect();
    lines.push(header_line.join("  "));
    lines.push("─".repeat(rule_width));

    for (row, texts) in table.rows.iter().zip(&cells) {
        let rendered: Vec<String> = row
            .iter()
            .zip(texts)
            .zip(&widths)
            .map(|((cell, text), w)| match cell {
                DisplayCell::Number(_) => pad(text, *w, true),
                DisplayCell::Percent(p) if *p < 0.0 => format!("{}", pad(text, *w, true).red()),
                DisplayCell::Percent(_) => format!("{}", pad(text, *w, true).green()),
                DisplayCell::Image(_) => format!("{}", pad(text, *w, false).dimmed()),
                DisplayCell::Text(_) | DisplayCell::Missing => pad(text, *w, false),
            })
            .collect();
        lines.push(rendered.join("  ").trim_end().to_string());
    }
    lines.push("─".repeat(rule_width));

    lines.join("\n") + "\n"
}

fn pad(text: &str, width: usize, right: bool) -> String {
    if right {
        format!("{:>width$}", text, width = width)
    } else {
        format!("{:<width$}", text, width = width)
    }
}

/// Standalone HTML page for the board; QR cells become images
pub fn render_html(view: &LoadedView, qr_size: u32) -> String {
    let table = &view.table;
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>{}</title>\n", TITLE));
    html.push_str(
        "<style>body{font-family:sans-serif}table{border-collapse:collapse}\
         td,th{border:1px solid #ccc;padding:4px 8px}td.num{text-align:right}</style>\n",
    );
    html.push_str("</head>\n<body>\n");
    html.push_str(&format!("<h1>{}</h1>\n", TITLE));
    html.push_str(&format!(
        "<p>Published: {}</p>\n<p>{}</p>\n",
        escape_html(published_label(view)),
        summary_line(table)
    ));

    html.push_str("<table>\n<thead><tr>");
    for column in &table.columns {
        html.push_str(&format!("<th>{}</th>", escape_html(column)));
    }
    html.push_str("</tr></thead>\n<tbody>\n");

    for row in &table.rows {
        html.push_str("<tr>");
        for cell in row {
            let td = match cell {
                DisplayCell::Image(url) => format!(
                    "<td><img src=\"{}\" width=\"{}\" height=\"{}\" alt=\"QR\"></td>",
                    escape_html(url),
                    qr_size,
                    qr_size
                ),
                DisplayCell::Number(_) | DisplayCell::Percent(_) => {
                    format!("<td class=\"num\">{}</td>", escape_html(&cell.display()))
                }
                DisplayCell::Text(_) | DisplayCell::Missing => {
                    format!("<td>{}</td>", escape_html(&cell.display()))
                }
            };
            html.push_str(&td);
        }
        html.push_str("</tr>\n");
    }

    html.push_str("</tbody>\n</table>\n</body>\n</html>\n");
    html
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewerConfig;

    fn view() -> LoadedView {
        let csv = "Event #,Home,Win%,QR Code\n101,Duke & Co,0.612,ALC|EVT:101\n102,A very long team name indeed,0.48,\n";
        let table = DisplayTable::from_csv(csv)
            .unwrap()
            .normalize(&ViewerConfig::default());
        LoadedView {
            published: Some("2025-03-20 19:00:00 UTC".to_string()),
            table,
            source: "data/latest.csv".to_string(),
        }
    }

    #[test]
    fn test_truncate_cell() {
        assert_eq!(truncate_cell("Duke", 10), "Duke");
        assert_eq!(truncate_cell("Gonzaga Bulldogs", 8), "Gonzaga…");
        assert_eq!(truncate_cell("Gonzaga Bulldogs", 8).chars().count(), 8);
    }

    #[test]
    fn test_render_terminal_plain() {
        colored::control::set_override(false);
        let out = render_terminal(&view(), 12);

        assert!(out.contains("Published: 2025-03-20 19:00:00 UTC"));
        assert!(out.contains("Rows: 2 | Cols: 4"));
        assert!(out.contains("61.20%"));
        assert!(out.contains("A very long…"));
        assert!(!out.contains("indeed"));
    }

    #[test]
    fn test_render_terminal_unknown_timestamp() {
        colored::control::set_override(false);
        let mut v = view();
        v.published = None;
        assert!(render_terminal(&v, 40).contains("Published: unknown"));
    }

    #[test]
    fn test_render_html() {
        let html = render_html(&view(), 150);
        assert!(html.contains("<th>QR</th>"));
        assert!(html.contains("Duke &amp; Co"));
        assert!(html.contains(
            "<img src=\"https://api.qrserver.com/v1/create-qr-code/?size=150x150&amp;data=ALC%7CEVT%3A101\""
        ));
        assert!(html.contains("<td class=\"num\">48.00%</td>"));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<a href=\"x\">'&'</a>"), "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;");
    }
}
