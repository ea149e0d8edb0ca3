use reqwest::Url;

/// Extracts the `workspace_id` query parameter the install redirect appends to the setup
/// page URL. Blank values count as absent.
pub fn workspace_id_from_setup_url(raw: &str) -> Option<String> {
    let url = Url::parse(raw.trim()).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == "workspace_id")
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
