//! Markup rendering for stored pastes.
//!
//! The store hands out raw content. Escaping happens here and nowhere else.

use crate::models::PasteRecord;

/// Turns read outcomes into markup.
pub trait Renderer: Send + Sync + 'static {
    fn render_paste(&self, paste: &PasteRecord) -> String;
    fn render_not_found(&self, id: &str) -> String;
}

/// Minimal HTML page renderer.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlRenderer;

/// Escape text for safe embedding in HTML element content and attributes.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            other => escaped.push(other),
        }
    }
    escaped
}

impl Renderer for HtmlRenderer {
    fn render_paste(&self, paste: &PasteRecord) -> String {
        let id = escape_html(&paste.id);
        let views = if paste.view_count == 1 { "view" } else { "views" };
        format!(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n<title>Paste {id}</title>\n</head>\n<body>\n<h1>Paste: {id}</h1>\n<p>Created {created} &middot; {count} {views}</p>\n<pre><code>{content}</code></pre>\n</body>\n</html>\n",
            id = id,
            created = paste.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
            count = paste.view_count,
            views = views,
            content = escape_html(&paste.content),
        )
    }

    fn render_not_found(&self, id: &str) -> String {
        format!(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n<title>Not found</title>\n</head>\n<body>\n<h1>Paste {} not found or expired.</h1>\n</body>\n</html>\n",
            escape_html(id)
        )
    }
}
