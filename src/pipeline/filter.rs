// src/pipeline/filter.rs

//! Text and tag filtering over a fetched story set.

use crate::models::{DiscoveryConfig, Domain, UserStory};
use crate::utils::search_tokens;
use crate::utils::url::same_origin;

/// Select the stories matching a free-text query, in listing order.
///
/// Every whitespace-separated token must occur in the uppercased name;
/// an empty query selects the curated (tag-matched) stories.
pub fn filter_stories<'a>(stories: &'a [UserStory], query: &str) -> Vec<&'a UserStory> {
    let tokens = search_tokens(query);
    stories.iter().filter(|s| s.matches(&tokens)).collect()
}

/// Prepend the last visited location, borrowing a thumbnail from any
/// listed domain on the same scheme and host.
pub fn with_last_location(
    mut domains: Vec<Domain>,
    last_location: &str,
    discovery: &DiscoveryConfig,
) -> Vec<Domain> {
    let last_location = last_location.trim();
    if last_location.is_empty() {
        return domains;
    }

    let thumbnail = domains
        .iter()
        .find(|d| same_origin(&d.url, last_location))
        .map(|d| d.thumbnail.clone())
        .unwrap_or_else(|| discovery.placeholder_thumbnail.clone());

    domains.insert(
        0,
        Domain {
            name: discovery.last_location_label.clone(),
            url: last_location.to_string(),
            thumbnail,
        },
    );
    domains
}

/// Run the filter and convert the result to displayable domains.
pub fn build_domains(
    stories: &[UserStory],
    query: &str,
    last_location: Option<&str>,
    discovery: &DiscoveryConfig,
) -> Vec<Domain> {
    let domains: Vec<Domain> = filter_stories(stories, query)
        .into_iter()
        .map(|s| s.to_domain(discovery))
        .collect();

    match last_location {
        Some(location) if search_tokens(query).is_empty() => {
            with_last_location(domains, location, discovery)
        }
        _ => domains,
    }
}
