use crate::config::TIMESTAMP_FORMAT;
use crate::types::TimeRange;

const PROFILE_IDX: &str = "web.item.graph.filter";
const FORBIDDEN_CHARS: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];
const FILE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H%M%S";
const IMAGE_EXTENSION: &str = "png";

/// Builds the `chart.php` export URL for one item.
///
/// Parameter order is fixed and each value is percent-encoded on its own.
pub fn graph_url(server_base: &str, range: &TimeRange, item_id: &str, width: u32, height: u32) -> String {
    let from = range.start.format(TIMESTAMP_FORMAT).to_string();
    let to = range.end.format(TIMESTAMP_FORMAT).to_string();
    let width = width.to_string();
    let height = height.to_string();

    let params: [(&str, &str); 8] = [
        ("from", from.as_str()),
        ("to", to.as_str()),
        ("itemids[0]", item_id),
        ("type", "0"),
        ("profileIdx", PROFILE_IDX),
        ("profileIdx2", item_id),
        ("width", width.as_str()),
        ("height", height.as_str()),
    ];

    let query = params
        .iter()
        .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&");

    format!("{}/chart.php?{}", server_base, query)
}

/// Deletes every character that is unsafe in a path segment.
///
/// Distinct names can collapse to the same output; file names also carry
/// the item id so this does not clash in practice.
pub fn sanitize_filename(name: &str) -> String {
    name.chars().filter(|c| !FORBIDDEN_CHARS.contains(c)).collect()
}

pub fn image_filename(host_name: &str, item_name: &str, item_id: &str, range: &TimeRange) -> String {
    format!(
        "{}_{}_{}_{}_{}.{}",
        host_name,
        sanitize_filename(item_name),
        item_id,
        range.start.format(FILE_TIMESTAMP_FORMAT),
        range.end.format(FILE_TIMESTAMP_FORMAT),
        IMAGE_EXTENSION
    )
}
