use std::sync::LazyLock;

use regex::Regex;
use url::Url;

pub const DEFAULT_HOST: &str = "www.linkedin.com";

static JOB_VIEW_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/jobs/(?:guest/)?view/(?:[^/?#]*-)?(\d+)(?:[/?#]|$)").unwrap());
static JOB_POSTING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/jobPosting/(\d+)").unwrap());
pub static URN_JOB_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"urn:li:(?:fs_)?jobPosting:(\d+)").unwrap());

/// Query parameters that carry a job id on search and collection pages.
const ID_QUERY_KEYS: &[&str] = &["currentJobId", "jobId", "id"];

static BASE_URL: LazyLock<Url> = LazyLock::new(|| {
    Url::parse(&format!("https://{}/", DEFAULT_HOST)).unwrap()
});

/// Pull a numeric job id out of a URL or href, path patterns first, then
/// the known query parameters. Relative hrefs are resolved against the
/// default host.
pub fn job_id_from(url: &str) -> Option<String> {
    for re in [&*JOB_VIEW_RE, &*JOB_POSTING_RE] {
        if let Some(caps) = re.captures(url) {
            return Some(caps[1].to_string());
        }
    }

    let parsed = Url::options().base_url(Some(&*BASE_URL)).parse(url).ok()?;
    ID_QUERY_KEYS.iter().find_map(|key| {
        parsed
            .query_pairs()
            .find(|(k, v)| k.as_ref() == *key && is_numeric_id(v))
            .map(|(_, v)| v.into_owned())
    })
}

pub fn is_numeric_id(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

pub fn view_url(job_id: &str) -> String {
    format!("https://{}/jobs/view/{}/", DEFAULT_HOST, job_id)
}

/// Canonical form of a job URL: the view URL when an id is present,
/// otherwise scheme + host + path with exactly one trailing slash.
pub fn canonicalize(url: &str) -> String {
    if let Some(id) = job_id_from(url) {
        return view_url(&id);
    }

    match Url::parse(url) {
        Ok(parsed) if parsed.has_host() => {
            let mut host = parsed.host_str().unwrap_or_default().to_string();
            if let Some(port) = parsed.port() {
                host = format!("{}:{}", host, port);
            }
            let path = parsed.path().trim_end_matches('/');
            format!("{}://{}{}/", parsed.scheme(), host, path)
        }
        _ => format!("{}/", url.trim().trim_end_matches('/')),
    }
}

/// Turn one input line into a canonical URL, or `None` for blanks,
/// comments and anything that is not recognisably a job URL.
pub fn normalize_input(line: &str) -> Option<String> {
    let s = line.trim();
    if s.is_empty() || s.starts_with('#') {
        return None;
    }
    if s.starts_with("http") {
        return Some(canonicalize(s));
    }

    // Bare fragments like "/jobs/view/123/" or "../jobs/view/123"
    let at = if JOB_VIEW_RE.is_match(s) {
        s.find("/jobs/")
    } else if JOB_POSTING_RE.is_match(s) {
        s.find("/jobPosting/")
    } else {
        None
    }?;
    Some(canonicalize(&format!("https://{}{}", DEFAULT_HOST, &s[at..])))
}

/// Normalise every line of an input file, dropping the ones that are skipped.
pub fn parse_input(text: &str) -> Vec<String> {
    text.lines().filter_map(normalize_input).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_path_canonicalizes_to_default_host() {
        assert_eq!(
            canonicalize("https://www.linkedin.com/jobs/view/3912345678/?refId=abc&trk=xyz"),
            "https://www.linkedin.com/jobs/view/3912345678/"
        );
        assert_eq!(
            canonicalize("https://ca.linkedin.com/jobs/view/42"),
            "https://www.linkedin.com/jobs/view/42/"
        );
        assert_eq!(
            canonicalize("https://www.linkedin.com/jobs/guest/view/77/"),
            "https://www.linkedin.com/jobs/view/77/"
        );
    }

    #[test]
    fn slugged_view_path() {
        assert_eq!(
            job_id_from("https://www.linkedin.com/jobs/view/senior-rust-engineer-at-acme-3901234567?trk=x"),
            Some("3901234567".into())
        );
        assert_eq!(job_id_from("https://www.linkedin.com/jobs/view/12abc/"), None);
    }

    #[test]
    fn job_posting_path() {
        assert_eq!(
            canonicalize("https://www.linkedin.com/voyager/api/jobs/jobPosting/555"),
            "https://www.linkedin.com/jobs/view/555/"
        );
    }

    #[test]
    fn query_parameter_ids() {
        assert_eq!(
            job_id_from("https://www.linkedin.com/jobs/collections/recommended/?currentJobId=987654"),
            Some("987654".into())
        );
        assert_eq!(job_id_from("/jobs/search/?keywords=rust&jobId=12"), Some("12".into()));
        assert_eq!(job_id_from("https://www.linkedin.com/jobs/search/?id=abc"), None);
        assert_eq!(job_id_from("https://www.linkedin.com/feed/"), None);
    }

    #[test]
    fn url_without_id_keeps_scheme_host_path() {
        assert_eq!(
            canonicalize("https://example.com/careers/rust-dev?src=x#top"),
            "https://example.com/careers/rust-dev/"
        );
        assert_eq!(canonicalize("https://example.com"), "https://example.com/");
        assert_eq!(canonicalize("http://example.com:8080/a//"), "http://example.com:8080/a/");
    }

    #[test]
    fn canonicalize_is_idempotent() {
        let inputs = [
            "https://www.linkedin.com/jobs/view/123456/?trk=public",
            "https://www.linkedin.com/jobs/collections/similar/?currentJobId=42",
            "https://example.com/careers/rust-dev?src=x",
            "https://example.com",
            "http://example.com:8080/a/b/",
        ];
        for u in inputs {
            let once = canonicalize(u);
            assert_eq!(canonicalize(&once), once, "not idempotent for {}", u);
        }
    }

    #[test]
    fn input_lines_filtered() {
        let lines = ["", "# comment", "https://www.linkedin.com/jobs/view/123456/"];
        let urls = parse_input(&lines.join("\n"));
        assert_eq!(urls, vec!["https://www.linkedin.com/jobs/view/123456/".to_string()]);
    }

    #[test]
    fn bare_fragments_get_default_host() {
        assert_eq!(
            normalize_input("  ../jobs/view/314159/?trk=abc "),
            Some("https://www.linkedin.com/jobs/view/314159/".into())
        );
        assert_eq!(
            normalize_input("www.linkedin.com/jobs/view/2718/"),
            Some("https://www.linkedin.com/jobs/view/2718/".into())
        );
        assert_eq!(normalize_input("just some notes"), None);
        assert_eq!(normalize_input("   "), None);
        assert_eq!(normalize_input("#https://www.linkedin.com/jobs/view/1/"), None);
    }
}
