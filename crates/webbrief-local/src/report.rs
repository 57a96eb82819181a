use webbrief_core::AnnotatedResult;

/// Render the annotated result list as a standalone HTML report.
///
/// Result order is preserved; each entry gets a linked heading and, when
/// the outcome carries non-empty text (a summary or a captured failure
/// message), a paragraph below it. All interpolated text is escaped.
pub fn render_report(query: &str, results: &[AnnotatedResult]) -> String {
    let mut out = String::new();
    out.push_str("<!doctype html>\n<html>\n");
    out.push_str("<head><meta charset=\"utf-8\"><title>Report</title></head>\n<body>\n");
    push_results(&mut out, query, results);
    out.push_str("</body>\n</html>\n");
    out
}

/// Render the web surface: a query form, plus the report body when a query
/// has been run. `None` means the landing page (form only).
pub fn render_serve_page(run: Option<(&str, &[AnnotatedResult])>) -> String {
    let query = run.map(|(q, _)| q).unwrap_or("");
    let mut out = String::new();
    out.push_str("<!doctype html>\n<html>\n");
    out.push_str("<head><meta charset=\"utf-8\"><title>webbrief</title></head>\n<body>\n");
    out.push_str(&format!(
        "<form method=\"get\" action=\"/\">\n\
         <input type=\"text\" name=\"q\" placeholder=\"Enter search query\" value=\"{}\" />\n\
         <button type=\"submit\">Search</button>\n</form>\n",
        escape_html(query)
    ));
    if let Some((query, results)) = run {
        push_results(&mut out, query, results);
    }
    out.push_str("</body>\n</html>\n");
    out
}

fn push_results(out: &mut String, query: &str, results: &[AnnotatedResult]) {
    out.push_str(&format!(
        "<h1>Search results for {}</h1>\n",
        escape_html(query)
    ));
    for r in results {
        out.push_str(&format!(
            "<h2><a href=\"{}\">{}</a></h2>\n",
            escape_html(&r.url),
            escape_html(&r.title)
        ));
        let text = r.summary.text();
        if !text.is_empty() {
            out.push_str(&format!("<p>{}</p>\n", escape_html(text)));
        }
    }
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
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

#[cfg(test)]
mod tests {
    use super::*;
    use webbrief_core::{SearchResult, SummaryOutcome};

    fn annotated(title: &str, url: &str, outcome: SummaryOutcome) -> AnnotatedResult {
        AnnotatedResult::new(
            &SearchResult {
                title: title.to_string(),
                url: url.to_string(),
            },
            outcome,
        )
    }

    #[test]
    fn report_preserves_result_order_and_links() {
        let results = vec![
            annotated(
                "First",
                "https://a.example.com",
                SummaryOutcome::Summary("Alpha.".to_string()),
            ),
            annotated(
                "Second",
                "https://b.example.com",
                SummaryOutcome::Failed("Failed to fetch: HTTP 404".to_string()),
            ),
        ];
        let html = render_report("rust", &results);
        let first = html.find("https://a.example.com").unwrap();
        let second = html.find("https://b.example.com").unwrap();
        assert!(first < second, "result order must be preserved");
        assert!(html.contains("<h1>Search results for rust</h1>"));
        assert!(html.contains("<p>Alpha.</p>"));
        assert!(html.contains("<p>Failed to fetch: HTTP 404</p>"));
    }

    #[test]
    fn empty_summary_renders_no_paragraph() {
        let results = vec![annotated(
            "Empty",
            "https://e.example.com",
            SummaryOutcome::Summary(String::new()),
        )];
        let html = render_report("q", &results);
        assert!(html.contains("<h2>"));
        assert!(!html.contains("<p>"));
    }

    #[test]
    fn zero_results_still_render_a_valid_page() {
        let html = render_report("nothing", &[]);
        assert!(html.contains("<h1>Search results for nothing</h1>"));
        assert!(html.ends_with("</body>\n</html>\n"));
    }

    #[test]
    fn interpolated_text_is_escaped() {
        let results = vec![annotated(
            "<script>alert(1)</script>",
            "https://x.example.com/?a=1&b=2",
            SummaryOutcome::Summary("1 < 2 & 3 > 2".to_string()),
        )];
        let html = render_report("\"q\" & <q>", &results);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("https://x.example.com/?a=1&amp;b=2"));
        assert!(html.contains("<p>1 &lt; 2 &amp; 3 &gt; 2</p>"));
        assert!(html.contains("&quot;q&quot; &amp; &lt;q&gt;"));
    }

    #[test]
    fn serve_page_shows_form_and_keeps_query_value() {
        let landing = render_serve_page(None);
        assert!(landing.contains("<form method=\"get\" action=\"/\">"));
        assert!(!landing.contains("<h1>"));

        let results = vec![annotated(
            "Hit",
            "https://h.example.com",
            SummaryOutcome::Summary("Text.".to_string()),
        )];
        let page = render_serve_page(Some(("cats", &results)));
        assert!(page.contains("value=\"cats\""));
        assert!(page.contains("<h1>Search results for cats</h1>"));
    }
}
