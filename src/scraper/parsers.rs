use crate::models::{RawCell, RawRow, RawTable};
use crate::utils::clean_text;
use anyhow::Result;
use scraper::{ElementRef, Html, Selector};

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow::anyhow!("{} selector: {:?}", css, e))
}

fn cell_text(el: &ElementRef) -> String {
    clean_text(&el.text().collect::<String>())
}

// ── Ranking tables ────────────────────────────────────────────────────────────

/// Every `<table>` in document order, with all of its `tr` rows.
///
/// Nested tables show up twice (once inside their parent, once on their own);
/// de-duplication downstream absorbs the repeats.
pub fn parse_tables(html: &str) -> Result<Vec<RawTable>> {
    let doc = Html::parse_document(html);

    let table_sel = selector("table")?;
    let tr_sel = selector("tr")?;
    let cell_sel = selector("td, th")?;
    let a_sel = selector("a[href]")?;

    let tables = doc
        .select(&table_sel)
        .map(|table| RawTable {
            rows: table
                .select(&tr_sel)
                .map(|tr| RawRow {
                    cells: tr
                        .select(&cell_sel)
                        .map(|cell| RawCell {
                            text: cell_text(&cell),
                            href: cell
                                .select(&a_sel)
                                .next()
                                .and_then(|a| a.value().attr("href"))
                                .map(|h| h.trim().to_string()),
                        })
                        .collect(),
                })
                .collect(),
        })
        .collect();

    Ok(tables)
}

/// Number of `table tr` rows on the page.
pub fn count_table_rows(html: &str) -> Result<usize> {
    let doc = Html::parse_document(html);
    let sel = selector("table tr")?;
    Ok(doc.select(&sel).count())
}

// ── Detail pages ──────────────────────────────────────────────────────────────

/// `href` of every link in document order.
pub fn parse_links(html: &str) -> Result<Vec<String>> {
    let doc = Html::parse_document(html);
    let sel = selector("a[href]")?;

    Ok(doc
        .select(&sel)
        .filter_map(|a| a.value().attr("href"))
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <table id="nav"><tr><td><a href="/home">Home</a></td></tr></table>
          <table>
            <thead><tr><th>Rank</th><th>Name</th><th>Revenues ($M)</th></tr></thead>
            <tbody>
              <tr><td>1</td><td><a href="/company/walmart/">  Walmart
                  </a></td><td>$648,125</td></tr>
              <tr><td>2</td><td><span>Amazon</span><span>.com</span></td><td>$574,785</td></tr>
            </tbody>
          </table>
        </body></html>
    "#;

    #[test]
    fn test_parse_tables_keeps_document_order() {
        let tables = parse_tables(PAGE).unwrap();
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].rows.len(), 1);
        assert_eq!(tables[1].rows.len(), 3);

        let header = &tables[1].rows[0];
        assert_eq!(header.cell_text(0), Some("Rank"));
        assert_eq!(header.cell_text(2), Some("Revenues ($M)"));
    }

    #[test]
    fn test_parse_tables_cleans_text_and_captures_links() {
        let tables = parse_tables(PAGE).unwrap();
        let walmart = &tables[1].rows[1];
        assert_eq!(walmart.cell_text(1), Some("Walmart"));
        assert_eq!(walmart.cell_href(1), Some("/company/walmart/"));
        assert_eq!(walmart.cell_href(0), None);

        let amazon = &tables[1].rows[2];
        assert_eq!(amazon.cell_text(1), Some("Amazon.com"));
    }

    #[test]
    fn test_count_table_rows() {
        assert_eq!(count_table_rows(PAGE).unwrap(), 4);
        assert_eq!(count_table_rows("<p>nothing</p>").unwrap(), 0);
    }

    #[test]
    fn test_parse_links_skips_anchors_without_href() {
        let html = r#"<a name="top">x</a><a href=" https://a.example/ ">a</a><a href="">e</a><a href="/rel">r</a>"#;
        assert_eq!(parse_links(html).unwrap(), vec!["https://a.example/", "/rel"]);
    }
}
