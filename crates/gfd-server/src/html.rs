//! Minimal server-rendered HTML.

use std::fmt::Write as _;

use axum::response::Html;
use serde::Serialize;

use gfd_auth::Principal;
use gfd_core::entities::Track;
use gfd_core::grid::{GRID_COLS, GRID_ROWS};

/// Escape text for element content and quoted attribute values.
#[must_use]
pub fn escape(text: &str) -> String {
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

const ADMIN_NAV: [(&str, &str); 6] = [
    ("/admin/dashboard", "Dashboard"),
    ("/admin/tracks", "Tracks"),
    ("/admin/users", "Users"),
    ("/admin/audit", "Audit log"),
    ("/admin/statistics", "Statistics"),
    ("/config/tracks", "Track designer"),
];

/// Full document around `body`. Signed-in admins get the back-office navigation.
#[must_use]
pub fn page(title: &str, principal: Option<&Principal>, body: &str) -> Html<String> {
    let mut nav = String::new();
    if let Some(principal) = principal {
        nav.push_str("<nav>");
        for (href, label) in ADMIN_NAV {
            let _ = write!(nav, r#"<a href="{href}">{label}</a> "#);
        }
        let _ = write!(
            nav,
            r#"<span>{} ({})</span> <form method="post" action="/logout" style="display:inline"><button>Log out</button></form></nav>"#,
            escape(&principal.full_name),
            principal.role
        );
    }
    Html(format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head><meta charset=\"utf-8\"><title>{} - Game for Devs</title></head>\n<body>\n{nav}\n<main>\n<h1>{}</h1>\n{body}\n</main>\n</body>\n</html>\n",
        escape(title),
        escape(title)
    ))
}

/// A table; every cell is escaped.
#[must_use]
pub fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut out = String::from("<table>\n<thead><tr>");
    for header in headers {
        let _ = write!(out, "<th>{}</th>", escape(header));
    }
    out.push_str("</tr></thead>\n<tbody>\n");
    for row in rows {
        out.push_str("<tr>");
        for cell in row {
            let _ = write!(out, "<td>{}</td>", escape(cell));
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</tbody>\n</table>");
    out
}

/// Two-column list of labelled values.
#[must_use]
pub fn summary(items: &[(&str, String)]) -> String {
    let mut out = String::from("<dl>\n");
    for (label, value) in items {
        let _ = writeln!(out, "<dt>{}</dt><dd>{}</dd>", escape(label), escape(value));
    }
    out.push_str("</dl>");
    out
}

/// The track layout as a table of `path`/`wall` cells, with the start cell marked.
#[must_use]
pub fn grid_preview(track: &Track) -> String {
    let Ok(grid) = track.grid() else {
        return "<p>Invalid grid</p>".into();
    };
    let mut out = String::from(r#"<table class="grid">"#);
    for y in 0..GRID_ROWS {
        out.push_str("<tr>");
        for x in 0..GRID_COLS {
            let (x, y) = (
                i32::try_from(x).unwrap_or(i32::MAX),
                i32::try_from(y).unwrap_or(i32::MAX),
            );
            let class = if grid.is_path(x, y) { "path" } else { "wall" };
            let marker = if x == track.start_x && y == track.start_y {
                track.start_direction.as_str()
            } else {
                ""
            };
            let _ = write!(out, r#"<td class="{class}">{marker}</td>"#);
        }
        out.push_str("</tr>");
    }
    out.push_str("</table>");
    out
}

/// Embed `value` as a JSON data block readable by page scripts.
#[must_use]
pub fn json_script<T: Serialize>(id: &str, value: &T) -> String {
    let json = serde_json::to_string(value)
        .unwrap_or_else(|_| "null".into())
        .replace("</", "<\\/");
    format!(r#"<script type="application/json" id="{}">{json}</script>"#, escape(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn table_cells_are_escaped() {
        let html = table(&["Name"], &[vec!["<script>".into()]]);
        assert!(html.contains("<td>&lt;script&gt;</td>"));
    }

    #[test]
    fn json_script_cannot_close_the_tag() {
        let html = json_script("data", &json!({"name": "</script><script>alert(1)"}));
        assert!(!html.contains("</script><script>"));
        assert!(html.ends_with("</script>"));
    }

    #[test]
    fn anonymous_pages_have_no_nav() {
        let Html(doc) = page("Login", None, "<form></form>");
        assert!(!doc.contains("<nav>"));
        assert!(doc.contains("<title>Login - Game for Devs</title>"));
    }
}
