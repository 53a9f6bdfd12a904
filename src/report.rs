use std::fmt::Write;

use crate::models::{RankedTable, RsLinePoint};

fn pct(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}%", v * 100.0),
        None => "-".to_string(),
    }
}

/// Plain-text ranking table, RS and daily change shown as percentages.
pub fn render_table(table: &RankedTable, rs_windows: &[usize]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "RS ranking vs {} (sorted by {}-day RS)",
        table.benchmark, table.sort_window
    );

    let mut header = format!("{:>4}  {:<8} {:>10} {:>9}", "#", "Symbol", "Price", "Change");
    for w in rs_windows {
        let _ = write!(header, " {:>10}", format!("RS {}d", w));
    }
    let _ = write!(header, "  {}", "Pattern");
    let _ = writeln!(out, "{}", header);

    for (i, row) in table.rows.iter().enumerate() {
        let _ = write!(
            out,
            "{:>4}  {:<8} {:>10.2} {:>9}",
            i + 1,
            row.symbol,
            row.latest_price,
            pct(Some(row.daily_return))
        );
        for &w in rs_windows {
            let _ = write!(out, " {:>10}", pct(row.rs(w)));
        }
        let _ = writeln!(out, "  {}", row.pattern.as_str());
    }

    for skipped in &table.skipped {
        let _ = writeln!(out, "skipped {}: {}", skipped.symbol, skipped.reason);
    }
    out
}

pub fn render_rs_line(symbol: &str, benchmark: &str, line: &[RsLinePoint]) -> String {
    let mut out = format!("RS line {} vs {} (start = 100)\n", symbol, benchmark);
    for point in line {
        let _ = writeln!(out, "{}  {:.2}", point.date, point.value);
    }
    out
}
