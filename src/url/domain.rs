use url::Url;

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
/// If the URL has no host, it returns None.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use wfind::url::extract_domain;
///
/// let url = Url::parse("https://MIRRORS.example.org:8080/pub/").unwrap();
/// assert_eq!(extract_domain(&url), Some("mirrors.example.org".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Builds the list of hostnames a crawl may visit, one per distinct seed host
///
/// Order follows the seeds.
pub fn allowed_hosts(seeds: &[Url]) -> Vec<String> {
    let mut hosts: Vec<String> = Vec::new();

    for domain in seeds.iter().filter_map(extract_domain) {
        if !hosts.contains(&domain) {
            hosts.push(domain);
        }
    }

    hosts
}

/// Returns true if the URL's host is in the allow-list
pub fn is_allowed_host(url: &Url, allowed: &[String]) -> bool {
    extract_domain(url).is_some_and(|domain| allowed.iter().any(|h| *h == domain))
}
