//! Minimal Atom feed rendering for the items feed.

use blockpress_database_models::NewsItemRow;
use chrono::{DateTime, SecondsFormat, Utc};

/// Escapes the five XML-significant characters.
fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn rfc3339(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Renders an Atom feed of news items, newest first as given.
#[must_use]
pub fn render_feed(title: &str, feed_id: &str, updated: DateTime<Utc>, items: &[NewsItemRow]) -> String {
    let mut feed = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
    feed.push_str("<feed xmlns=\"http://www.w3.org/2005/Atom\">\n");
    feed.push_str(&format!("  <title>{}</title>\n", escape_xml(title)));
    feed.push_str(&format!("  <id>{}</id>\n", escape_xml(feed_id)));
    feed.push_str(&format!("  <updated>{}</updated>\n", rfc3339(updated)));

    for item in items {
        feed.push_str("  <entry>\n");
        feed.push_str(&format!("    <title>{}</title>\n", escape_xml(&item.title)));
        feed.push_str(&format!(
            "    <id>tag:blockpress,{}:item/{}</id>\n",
            item.pub_date.format("%Y-%m-%d"),
            item.id
        ));
        feed.push_str(&format!("    <updated>{}</updated>\n", rfc3339(item.pub_date)));
        feed.push_str(&format!(
            "    <category term=\"{}\"/>\n",
            escape_xml(&item.schema_slug)
        ));
        if !item.url.is_empty() {
            feed.push_str(&format!(
                "    <link rel=\"alternate\" href=\"{}\"/>\n",
                escape_xml(&item.url)
            ));
        }
        feed.push_str(&format!(
            "    <summary>{}</summary>\n",
            escape_xml(&item.description)
        ));
        feed.push_str("  </entry>\n");
    }

    feed.push_str("</feed>\n");
    feed
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone as _;

    fn item(id: i64, title: &str) -> NewsItemRow {
        NewsItemRow {
            id,
            schema_id: 1,
            schema_slug: "police-reports".to_string(),
            title: title.to_string(),
            description: "A & B < C".to_string(),
            url: "https://example.com/item".to_string(),
            pub_date: Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap(),
            location_geojson: None,
        }
    }

    #[test]
    fn escapes_markup_in_text() {
        assert_eq!(escape_xml("a<b>&\"c'"), "a&lt;b&gt;&amp;&quot;c&apos;");
    }

    #[test]
    fn renders_entries_with_escaped_fields() {
        let now = Utc.with_ymd_and_hms(2026, 6, 2, 0, 0, 0).unwrap();
        let feed = render_feed("items", "tag:blockpress:items", now, &[item(7, "Fire & Ice")]);

        assert!(feed.starts_with("<?xml"));
        assert!(feed.contains("<title>Fire &amp; Ice</title>"));
        assert!(feed.contains("<summary>A &amp; B &lt; C</summary>"));
        assert!(feed.contains("tag:blockpress,2026-06-01:item/7"));
        assert!(feed.contains("<category term=\"police-reports\"/>"));
        assert!(feed.ends_with("</feed>\n"));
    }

    #[test]
    fn empty_feed_has_no_entries() {
        let now = Utc.with_ymd_and_hms(2026, 6, 2, 0, 0, 0).unwrap();
        let feed = render_feed("items", "tag:blockpress:items", now, &[]);
        assert!(!feed.contains("<entry>"));
    }
}
