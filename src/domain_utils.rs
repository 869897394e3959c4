/// Extract the registered (organizational) domain from a host name,
/// e.g. `aging.frederickcountymd.gov` -> `frederickcountymd.gov`.
/// Used to decide whether a discovered link stays on the same site.
pub fn registered_domain(host: &str) -> String {
    let host = host.to_lowercase();
    let parts: Vec<&str> = host.split('.').collect();

    if parts.len() <= 2 {
        return host;
    }

    let last_two = format!("{}.{}", parts[parts.len() - 2], parts[parts.len() - 1]);

    // Compound TLDs (e.g. .co.uk, .md.us) need three labels for the apex.
    // Every `co.<name>.<state>.us` county host falls in this bucket.
    let is_compound = matches!(
        last_two.as_str(),
        "co.uk" | "org.uk" | "gov.uk" | "com.au" | "co.nz" | "co.jp"
    ) || (parts[parts.len() - 1] == "us" && parts[parts.len() - 2].len() == 2);

    if is_compound {
        if parts.len() > 3 {
            format!("{}.{}", parts[parts.len() - 3], last_two)
        } else {
            host
        }
    } else {
        last_two
    }
}

/// Check whether two hosts belong to the same registered domain
pub fn same_registered_domain(a: &str, b: &str) -> bool {
    registered_domain(a) == registered_domain(b)
}
