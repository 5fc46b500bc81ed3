use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use itertools::Itertools;

use crate::lr::ParseTable;

/// Writes the table as CSV: a `STATE` column, the ordered terminal columns,
/// a `|` separator, then the ordered nonterminal columns. One row per state
/// in id order.
pub fn write_csv<W: Write>(table: &ParseTable, mut out: W) -> io::Result<()> {
    let mut header: Vec<String> = vec!["STATE".to_string()];
    header.extend(table.terminals().iter().map(ToString::to_string));
    header.push("|".to_string());
    header.extend(table.nonterminals().iter().map(ToString::to_string));
    write_record(&mut out, &header)?;

    for state in 0..table.state_count() {
        let mut record: Vec<String> = vec![format!("I{state}")];
        for terminal in table.terminals() {
            record.push(
                table
                    .action(state, terminal)
                    .map(|action| table.render_action(action))
                    .unwrap_or_default(),
            );
        }
        record.push("|".to_string());
        for nonterminal in table.nonterminals() {
            record.push(
                table
                    .goto(state, nonterminal)
                    .map(|target| target.to_string())
                    .unwrap_or_default(),
            );
        }
        write_record(&mut out, &record)?;
    }

    out.flush()
}

/// Writes the CSV to a file. The writer is flushed before return and the
/// file handle is dropped (closed) on every exit path.
pub fn save_csv(table: &ParseTable, path: impl AsRef<Path>) -> io::Result<()> {
    let file = File::create(path)?;
    write_csv(table, BufWriter::new(file))
}

/// Writes the table as a self-contained HTML document: a conflict banner
/// followed by the ACTION/GOTO grid.
pub fn write_html<W: Write>(table: &ParseTable, title: &str, mut out: W) -> io::Result<()> {
    writeln!(
        out,
        "<!doctype html><html><head><meta charset='utf-8'><title>{title}</title>"
    )?;
    writeln!(
        out,
        "<style>\n\
         body{{font-family:system-ui,Segoe UI,Arial,sans-serif;padding:16px;}}\n\
         table{{border-collapse:collapse;font-size:14px}}\n\
         th,td{{border:1px solid #ccc;padding:6px 10px;text-align:center}}\n\
         thead th{{background:#f3f3f3}}\n\
         .sep{{background:#fafafa}}\n\
         .ok{{color:#0a0}}\n\
         .bad{{color:#a00}}\n\
         </style></head><body>"
    )?;
    writeln!(out, "<h2>{title}</h2>")?;

    if table.conflicts().is_empty() {
        writeln!(out, "<p class='ok'><strong>No conflicts (LR(1)).</strong></p>")?;
    } else {
        writeln!(out, "<p class='bad'><strong>Conflicts detected:</strong></p><ul>")?;
        for conflict in table.conflicts() {
            writeln!(out, "<li>{}</li>", escape(&conflict.describe(table.productions())))?;
        }
        writeln!(out, "</ul>")?;
    }

    writeln!(out, "<table>")?;
    write!(out, "<thead><tr><th>STATE</th>")?;
    for terminal in table.terminals() {
        write!(out, "<th>{}</th>", escape(terminal.as_str()))?;
    }
    write!(out, "<th class='sep'>|</th>")?;
    for nonterminal in table.nonterminals() {
        write!(out, "<th>{}</th>", escape(nonterminal.as_str()))?;
    }
    writeln!(out, "</tr></thead>")?;

    writeln!(out, "<tbody>")?;
    for state in 0..table.state_count() {
        write!(out, "<tr><td><strong>I{state}</strong></td>")?;
        for terminal in table.terminals() {
            let cell = table
                .action(state, terminal)
                .map(|action| table.render_action(action))
                .unwrap_or_default();
            write!(out, "<td>{}</td>", escape(&cell))?;
        }
        write!(out, "<td class='sep'>|</td>")?;
        for nonterminal in table.nonterminals() {
            let cell = table
                .goto(state, nonterminal)
                .map(|target| target.to_string())
                .unwrap_or_default();
            write!(out, "<td>{cell}</td>")?;
        }
        writeln!(out, "</tr>")?;
    }
    writeln!(out, "</tbody></table>")?;
    writeln!(out, "</body></html>")?;

    out.flush()
}

/// Writes the HTML to a file; same closing guarantees as [`save_csv`].
pub fn save_html(table: &ParseTable, path: impl AsRef<Path>, title: &str) -> io::Result<()> {
    let file = File::create(path)?;
    write_html(table, title, BufWriter::new(file))
}

fn write_record<W: Write>(out: &mut W, cells: &[String]) -> io::Result<()> {
    let line = cells.iter().map(|cell| quote_csv(cell)).join(",");
    writeln!(out, "{line}")
}

/// Quotes a cell only when it contains a separator, quote or newline.
fn quote_csv(cell: &str) -> String {
    if cell.contains([',', '"', '\n']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
