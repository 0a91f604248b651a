/// Default values and fixed labels shared across the codebase

// Configuration defaults (used when config.toml omits a field)
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
pub const DEFAULT_TARGET_FACULTY: &str = "Faculty of Science";
pub const DEFAULT_PAGES_DIR: &str = "data/pages";
pub const DEFAULT_OUTPUT_DIR: &str = "data/json";
pub const DEFAULT_WORKERS: usize = 8;
pub const DEFAULT_BASE_URL: &str = "https://kurser.ku.dk/course";

/// Subdirectory of the output directory that receives non-target field bags
pub const SECONDARY_DIR: &str = "secondary";

/// Cached page files carry this extension; the file stem is the page name
pub const PAGE_EXTENSION: &str = "html";

/// Panel subsection headers (lower-cased) whose items are course coordinators
pub const COORDINATOR_LABELS: [&str; 2] = ["kursusansvarlige", "course coordinators"];

/// Environment variable that enables the Prometheus exporter
pub const METRICS_PORT_ENV: &str = "COURSE_METRICS_PORT";

/// Build the source URL of a cached page from its name
pub fn page_url(base_url: &str, name: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_url_joins_once() {
        assert_eq!(
            page_url("https://kurser.ku.dk/course/", "ndab15009u"),
            "https://kurser.ku.dk/course/ndab15009u"
        );
        assert_eq!(page_url(DEFAULT_BASE_URL, "x"), "https://kurser.ku.dk/course/x");
    }
}
