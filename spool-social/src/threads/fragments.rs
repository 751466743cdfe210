//! Locating the parts of a profile page that may carry post data.
use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

static JSON_SCRIPT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)<script\b[^>]*?[\s"']type\s*=\s*["']?\s*application/json\s*["']?[^>]*>(.*?)</script\s*>"#,
    )
    .expect("json script pattern compiles")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentKind {
    /// Body of a `<script type="application/json">` block.
    ScriptJson,
    /// No script block matched; the whole page is scanned.
    WholePage,
}

/// A borrowed region of the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment<'a> {
    pub kind: FragmentKind,
    /// Byte range of `text` within the page.
    pub range: Range<usize>,
    pub text: &'a str,
}

impl<'a> Fragment<'a> {
    pub fn whole_page(page: &'a str) -> Self {
        Self {
            kind: FragmentKind::WholePage,
            range: 0..page.len(),
            text: page,
        }
    }
}

/// Every JSON script block in page order, or a single whole-page fragment
/// when there are none.
pub fn locate(page: &str) -> Vec<Fragment<'_>> {
    let fragments: Vec<Fragment<'_>> = JSON_SCRIPT
        .captures_iter(page)
        .filter_map(|caps| caps.get(1))
        .map(|body| Fragment {
            kind: FragmentKind::ScriptJson,
            range: body.range(),
            text: body.as_str(),
        })
        .collect();

    if fragments.is_empty() {
        tracing::debug!(page_len = page.len(), "no json script blocks, scanning whole page");
        return vec![Fragment::whole_page(page)];
    }

    tracing::debug!(count = fragments.len(), "json script blocks located");
    fragments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_each_json_script_block() {
        let page = r#"<html><script type="application/json">{"a":1}</script>
            <script>var x = 1;</script>
            <script data-sjs type="application/json" nonce="n">{"b":2}</script></html>"#;
        let frags = locate(page);
        assert_eq!(frags.len(), 2);
        assert_eq!(frags[0].text, r#"{"a":1}"#);
        assert_eq!(frags[1].text, r#"{"b":2}"#);
        assert!(frags.iter().all(|f| f.kind == FragmentKind::ScriptJson));
        assert_eq!(&page[frags[1].range.clone()], frags[1].text);
    }

    #[test]
    fn tolerates_case_whitespace_and_quotes() {
        let page = "<SCRIPT Type = 'Application/JSON'>\n{\"x\":1}\n</Script >\
                    <script type=application/json>[]</script>";
        let frags = locate(page);
        assert_eq!(frags.len(), 2);
        assert_eq!(frags[0].text, "\n{\"x\":1}\n");
        assert_eq!(frags[1].text, "[]");
    }

    #[test]
    fn blocks_are_captured_non_greedily() {
        let page = r#"<script type="application/json">one</script>middle<script type="application/json">two</script>"#;
        let texts: Vec<_> = locate(page).into_iter().map(|f| f.text).collect();
        assert_eq!(texts, vec!["one", "two"]);
    }

    #[test]
    fn falls_back_to_whole_page() {
        let page = r#"<div data-x='"taken_at":1'></div><script>no json here</script>"#;
        let frags = locate(page);
        assert_eq!(frags.len(), 1);
        assert_eq!(frags[0].kind, FragmentKind::WholePage);
        assert_eq!(frags[0].text, page);
        assert_eq!(frags[0].range, 0..page.len());
    }

    #[test]
    fn other_script_types_are_ignored() {
        let page = r#"<script type="text/javascript">{"taken_at":1}</script>"#;
        assert_eq!(locate(page)[0].kind, FragmentKind::WholePage);
    }

    #[test]
    fn prefixed_type_attributes_do_not_count() {
        let page = r#"<script data-type="application/json">{"taken_at":1}</script>
            <script data-type="application/json" type="application/json">{"b":2}</script>"#;
        let frags = locate(page);
        assert_eq!(frags.len(), 1);
        assert_eq!(frags[0].kind, FragmentKind::ScriptJson);
        assert_eq!(frags[0].text, r#"{"b":2}"#);
    }
}
