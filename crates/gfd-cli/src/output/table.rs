/// Widest a single column may grow before its cells are truncated.
pub const MAX_CELL_WIDTH: usize = 40;

/// Render a left-aligned table; numeric cells are right-aligned.
#[must_use]
pub fn render_rows(headers: &[&str], rows: &[Vec<String>]) -> String {
    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(index, header)| {
            rows.iter()
                .filter_map(|row| row.get(index))
                .map(|cell| cell.chars().count())
                .max()
                .unwrap_or(0)
                .max(header.chars().count())
                .min(MAX_CELL_WIDTH)
        })
        .collect();

    let header_line = headers
        .iter()
        .zip(&widths)
        .map(|(header, width)| pad(&truncate(header, *width), *width, false))
        .collect::<Vec<_>>()
        .join("  ");
    let divider = "-".repeat(header_line.chars().count());

    let mut lines = vec![header_line.trim_end().to_string(), divider];
    for row in rows {
        let line = widths
            .iter()
            .enumerate()
            .map(|(index, width)| {
                let cell = row.get(index).map_or("-", String::as_str);
                let cell = truncate(cell, *width);
                let numeric = looks_numeric(&cell);
                pad(&cell, *width, numeric)
            })
            .collect::<Vec<_>>()
            .join("  ");
        lines.push(line.trim_end().to_string());
    }
    lines.join("\n")
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let mut out: String = value.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn pad(value: &str, width: usize, right_align: bool) -> String {
    let fill = " ".repeat(width.saturating_sub(value.chars().count()));
    if right_align {
        format!("{fill}{value}")
    } else {
        format!("{value}{fill}")
    }
}

fn looks_numeric(value: &str) -> bool {
    let trimmed = value.trim();
    !trimmed.is_empty()
        && trimmed
            .chars()
            .all(|ch| ch.is_ascii_digit() || matches!(ch, '-' | '.'))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn columns_align_and_numbers_pad_left() {
        let rows = vec![
            vec!["1".to_string(), "Spiral".to_string()],
            vec!["120".to_string(), "L".to_string()],
        ];
        let table = render_rows(&["id", "name"], &rows);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines[0], "id   name");
        assert!(lines[1].chars().all(|c| c == '-'));
        assert_eq!(lines[2], "  1  Spiral");
        assert_eq!(lines[3], "120  L");
    }

    #[test]
    fn long_cells_are_truncated() {
        let long = "x".repeat(MAX_CELL_WIDTH + 10);
        let table = render_rows(&["grid"], &[vec![long]]);
        let last = table.lines().last().unwrap_or_default();
        assert_eq!(last.chars().count(), MAX_CELL_WIDTH);
        assert!(last.ends_with('…'));
    }
}
