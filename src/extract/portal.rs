//! Page contract for the Oracle updates portal (`/Orion/...` pages).

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, trace};

use super::{DownloadLink, FilenameFilter, PageContract, PageScan, compile_static_regex};
use crate::catalog::PlatformEntry;

const LOGIN_PATH: &str = "/Orion/SimpleSearch/switch_to_saved_searches";
const CATALOG_PATH: &str = "/Orion/SavedSearches/switch_to_simple";
const SEARCH_PATH: &str = "/Orion/SimpleSearch/process_form";
const DOWNLOAD_MARKER: &str = "process_form/";
const ARCHIVE_EXTENSION: &str = ".zip";
const PROTECTED_NOTICE: &str = "Download Password Protected Patch";

static DOWNLOAD_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(
        r#"https://[^"\s]+?Download/process_form/(?P<file>[^"\s]*?)\.zip[^"\s]*"#,
    )
});
static MULTIPART_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(
        r#"javascript:showDetails.\s*"(?P<path>/Orion/PatchDetails/process_form[^"]*)".*?Download Multi Part Patch"#,
    )
});
static PLATFORM_SELECT_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"(?s)<select name=plat_lang.*?</select>"));

/// The `/Orion` page layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct PortalPageContract;

impl PortalPageContract {
    /// Creates the contract.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl PageContract for PortalPageContract {
    fn login_url(&self, base: &str) -> String {
        format!("{base}{LOGIN_PATH}")
    }

    fn catalog_url(&self, base: &str) -> String {
        format!("{base}{CATALOG_PATH}")
    }

    fn search_url(&self, base: &str, patch: &str, platform: &str) -> String {
        format!("{base}{SEARCH_PATH}?search_type=patch&patch_number={patch}&plat_lang={platform}")
    }

    fn detail_url(&self, base: &str, detail_path: &str) -> String {
        format!("{base}{detail_path}")
    }

    fn scan(&self, html: &str, filter: &FilenameFilter) -> PageScan {
        let mut seen = HashSet::new();
        let mut links = Vec::new();
        for captures in DOWNLOAD_LINK_RE.captures_iter(html) {
            let (Some(link), Some(file)) = (captures.get(0), captures.name("file")) else {
                continue;
            };
            let Some(filename) = self.filename_for(link.as_str()) else {
                debug!(url = link.as_str(), "skipping link without a usable filename");
                continue;
            };
            if !filter.matches(file.as_str()) {
                trace!(file = file.as_str(), filter = filter.as_str(), "filtered out");
                continue;
            }
            if seen.insert(link.as_str()) {
                links.push(DownloadLink::new(link.as_str(), filename));
            }
        }

        let detail_paths: Vec<String> = MULTIPART_LINK_RE
            .captures_iter(html)
            .filter_map(|captures| captures.name("path"))
            .map(|path| path.as_str().to_string())
            .collect();

        let protected = html.contains(PROTECTED_NOTICE);

        debug!(
            links = links.len(),
            detail_pages = detail_paths.len(),
            protected,
            "scanned page"
        );
        PageScan {
            links,
            detail_paths,
            protected,
        }
    }

    fn platform_options(&self, html: &str) -> Vec<PlatformEntry> {
        let Some(select) = PLATFORM_SELECT_RE.find(html) else {
            return Vec::new();
        };
        select
            .as_str()
            .lines()
            .filter(|line| line.contains("option") && !line.contains("selected"))
            .filter_map(parse_option_line)
            .collect()
    }

    fn filename_for(&self, url: &str) -> Option<String> {
        let (_, after_marker) = url.split_once(DOWNLOAD_MARKER)?;
        let (token, _) = after_marker.split_once(ARCHIVE_EXTENSION)?;
        if token.is_empty() || token == ".." || token.contains(['/', '\\']) {
            return None;
        }
        Some(format!("{token}{ARCHIVE_EXTENSION}"))
    }
}

/// `<option value="226P">Linux x86-64` → (`226P`, `Linux x86-64`).
fn parse_option_line(line: &str) -> Option<PlatformEntry> {
    let code = line.split('"').nth(1)?.trim();
    let description = line.split_once('>')?.1;
    let description = description.split('<').next().unwrap_or_default().trim();
    if code.is_empty() {
        return None;
    }
    Some(PlatformEntry::new(code, description))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const LINK_112: &str = "https://updates.oracle.com/Orion/Download/process_form/p6880880_112000_Linux-x86-64.zip?file_id=1&aru=2";
    const LINK_121: &str = "https://updates.oracle.com/Orion/Download/process_form/p6880880_121010_Linux-x86-64.zip?file_id=3&aru=4";

    fn search_page() -> String {
        format!(
            r#"<html><body>
<table>
<tr><td><a href="{LINK_112}">Download</a></td></tr>
<tr><td><a href="{LINK_121}">Download</a></td></tr>
</table>
</body></html>"#
        )
    }

    fn urls(scan: &PageScan) -> Vec<&str> {
        scan.links.iter().map(|link| link.url.as_str()).collect()
    }

    #[test]
    fn test_scan_match_all_returns_every_link_in_order() {
        let scan = PortalPageContract::new().scan(&search_page(), &FilenameFilter::match_all());
        assert_eq!(urls(&scan), vec![LINK_112, LINK_121]);
        assert_eq!(scan.links[0].filename, "p6880880_112000_Linux-x86-64.zip");
        assert!(scan.detail_paths.is_empty());
        assert!(!scan.protected);
    }

    #[test]
    fn test_scan_applies_filename_filter() {
        let filter = FilenameFilter::new(".*1120.*").unwrap();
        let scan = PortalPageContract::new().scan(&search_page(), &filter);
        assert_eq!(urls(&scan), vec![LINK_112]);
    }

    #[test]
    fn test_scan_filter_sees_token_without_extension_or_query() {
        let filter = FilenameFilter::new("p6880880_112000_Linux-x86-64").unwrap();
        let scan = PortalPageContract::new().scan(&search_page(), &filter);
        assert_eq!(scan.links.len(), 1);
    }

    #[test]
    fn test_scan_ignores_plain_http_and_other_handlers() {
        let html = r#"<a href="http://updates.oracle.com/Orion/Download/process_form/p1.zip">x</a>
<a href="https://updates.oracle.com/Orion/Other/p2.zip">y</a>"#;
        let scan = PortalPageContract::new().scan(html, &FilenameFilter::match_all());
        assert!(scan.links.is_empty());
    }

    #[test]
    fn test_scan_does_not_run_across_attribute_quotes() {
        let html = format!(r#"<a href="https://example.com/help">help</a> <a href="{LINK_112}">dl</a>"#);
        let scan = PortalPageContract::new().scan(&html, &FilenameFilter::match_all());
        assert_eq!(urls(&scan), vec![LINK_112]);
    }

    #[test]
    fn test_scan_collapses_repeated_link() {
        let html = format!(r#"<a href="{LINK_112}">a</a><a href="{LINK_112}">b</a>"#);
        let scan = PortalPageContract::new().scan(&html, &FilenameFilter::match_all());
        assert_eq!(scan.links.len(), 1);
    }

    #[test]
    fn test_scan_detects_protected_notice() {
        let html = format!(
            r#"<a href="{LINK_112}">x</a> <a href="javascript:void(0)">Download Password Protected Patch</a>"#
        );
        let scan = PortalPageContract::new().scan(&html, &FilenameFilter::match_all());
        assert!(scan.protected);
        assert_eq!(scan.links.len(), 1, "scan reports links; the caller withholds them");
    }

    #[test]
    fn test_scan_finds_multipart_detail_paths() {
        let html = r#"<a href="javascript:showDetails("/Orion/PatchDetails/process_form?patch_num=12978712&plat_lang=226P")">Download Multi Part Patch</a>
<a href="javascript:showDetails("/Orion/PatchDetails/process_form?patch_num=12978712&plat_lang=46P")" class="x">Download Multi Part Patch</a>"#;
        let scan = PortalPageContract::new().scan(html, &FilenameFilter::match_all());
        assert_eq!(
            scan.detail_paths,
            vec![
                "/Orion/PatchDetails/process_form?patch_num=12978712&plat_lang=226P".to_string(),
                "/Orion/PatchDetails/process_form?patch_num=12978712&plat_lang=46P".to_string(),
            ]
        );
    }

    #[test]
    fn test_scan_skips_links_without_usable_filename() {
        let html = format!(
            r#"<a href="https://updates.oracle.com/Orion/Download/process_form/.zip?x=1">a</a>
<a href="https://updates.oracle.com/Orion/Download/process_form/../../../tmp/evil.zip?x=1">b</a>
<a href="https://updates.oracle.com/Orion/Download/process_form/dir\evil.zip?x=1">c</a>
<a href="{LINK_112}">d</a>"#
        );
        let scan = PortalPageContract::new().scan(&html, &FilenameFilter::match_all());
        assert_eq!(urls(&scan), vec![LINK_112]);
    }

    #[test]
    fn test_scan_empty_page_is_not_an_error() {
        let scan = PortalPageContract::new().scan("<html></html>", &FilenameFilter::match_all());
        assert_eq!(scan, PageScan::default());
    }

    #[test]
    fn test_filename_for_strips_query_string() {
        let contract = PortalPageContract::new();
        let with_query = contract
            .filename_for("https://updates.oracle.com/Orion/Download/process_form/p6880880_112000_Linux-x86-64.zip?x=1")
            .unwrap();
        let other_query = contract
            .filename_for("https://updates.oracle.com/Orion/Download/process_form/p6880880_112000_Linux-x86-64.zip?x=2&y=3")
            .unwrap();
        assert_eq!(with_query, "p6880880_112000_Linux-x86-64.zip");
        assert_eq!(with_query, other_query);
    }

    #[test]
    fn test_filename_for_requires_marker_and_extension() {
        let contract = PortalPageContract::new();
        assert!(contract.filename_for("https://example.com/p1.zip").is_none());
        assert!(
            contract
                .filename_for("https://updates.oracle.com/Orion/Download/process_form/readme.txt")
                .is_none()
        );
    }

    #[test]
    fn test_filename_for_rejects_empty_and_path_tokens() {
        let contract = PortalPageContract::new();
        for url in [
            "https://updates.oracle.com/Orion/Download/process_form/.zip?x=1",
            "https://updates.oracle.com/Orion/Download/process_form/../../../tmp/evil.zip?x=1",
            "https://updates.oracle.com/Orion/Download/process_form/sub/p1.zip",
            "https://updates.oracle.com/Orion/Download/process_form/..\\p1.zip",
            "https://updates.oracle.com/Orion/Download/process_form/...zip",
        ] {
            assert!(contract.filename_for(url).is_none(), "accepted {url}");
        }
    }

    #[test]
    fn test_platform_options_parses_select_block() {
        let html = r#"<form>
<select name=plat_lang size=10 multiple>
<option value="226P">Linux x86-64
<option value="46P">Linux x86
<option value="4L" selected>Canadian French (FRC)
<option value="3L">Canadian French (FRC)
</select>
<select name=other><option value="zz">Ignored</select>
</form>"#;
        let options = PortalPageContract::new().platform_options(html);
        let pairs: Vec<(&str, &str)> = options
            .iter()
            .map(|entry| (entry.code.as_str(), entry.description.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("226P", "Linux x86-64"),
                ("46P", "Linux x86"),
                ("3L", "Canadian French (FRC)"),
            ]
        );
    }

    #[test]
    fn test_platform_options_strips_closing_tag() {
        let html = "<select name=plat_lang>\n<option value=\"226P\">Linux x86-64</option>\n</select>";
        let options = PortalPageContract::new().platform_options(html);
        assert_eq!(options, vec![PlatformEntry::new("226P", "Linux x86-64")]);
    }

    #[test]
    fn test_platform_options_missing_select_is_empty() {
        assert!(PortalPageContract::new().platform_options("<html/>").is_empty());
    }

    #[test]
    fn test_urls_join_base() {
        let contract = PortalPageContract::new();
        let base = "https://updates.oracle.com";
        assert_eq!(
            contract.search_url(base, "6880880", "226P"),
            "https://updates.oracle.com/Orion/SimpleSearch/process_form?search_type=patch&patch_number=6880880&plat_lang=226P"
        );
        assert_eq!(
            contract.login_url(base),
            "https://updates.oracle.com/Orion/SimpleSearch/switch_to_saved_searches"
        );
        assert_eq!(
            contract.catalog_url(base),
            "https://updates.oracle.com/Orion/SavedSearches/switch_to_simple"
        );
        assert_eq!(
            contract.detail_url(base, "/Orion/PatchDetails/process_form?x=1"),
            "https://updates.oracle.com/Orion/PatchDetails/process_form?x=1"
        );
    }
}
