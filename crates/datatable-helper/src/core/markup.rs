use crate::core::descriptor::{DataTable, TableDescriptor};
use crate::core::store::TableStore;
use crate::error::AppResult;

/// Class the client widget bootstraps tables from.
pub const WIDGET_CLASS: &str = "perry-rylance-datatable";

#[derive(Debug, Clone, Copy)]
pub struct MarkupOptions {
    pub auto_initialize: bool,
}

impl Default for MarkupOptions {
    fn default() -> Self {
        Self {
            auto_initialize: true,
        }
    }
}

/// Empty table skeleton the client widget bootstraps from: the route plus
/// one header cell per displayed column.
pub fn render_markup<D, S>(table: &DataTable<D>, store: &S, options: MarkupOptions) -> AppResult<String>
where
    D: TableDescriptor,
    S: TableStore + ?Sized,
{
    let catalog = table.columns(store)?;

    let mut html = format!(
        "<table class=\"{WIDGET_CLASS}\" data-route=\"{}\"",
        escape_html(table.route())
    );
    if !options.auto_initialize {
        html.push_str(" data-auto-initialize=\"false\"");
    }
    html.push_str(">\n  <thead>\n    <tr>");
    for column in catalog.displayed() {
        html.push_str(&format!(
            "<th data-column-field=\"{}\" data-column-type=\"{}\">{}</th>",
            escape_html(&column.name),
            escape_html(&column.sql_type),
            escape_html(&column.caption)
        ));
    }
    html.push_str("</tr>\n  </thead>\n  <tbody>\n  </tbody>\n</table>\n");
    Ok(html)
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
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

    #[test]
    fn escapes_attribute_text() {
        assert_eq!(escape_html(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }
}
