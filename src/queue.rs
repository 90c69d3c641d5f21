use crate::api::ApiClient;
use crate::chart::{graph_url, image_filename};
use crate::config::Config;
use crate::error::GraphDlError;
use crate::types::DownloadQueue;
use log::{debug, error, info, warn};

/// Maps every item of every configured host to a chart URL and a target file.
///
/// A host that cannot be resolved or listed is logged and skipped; the rest
/// of the hosts are still processed. Files already on disk are left out.
pub async fn build_queue(api: &ApiClient, config: &Config) -> Result<DownloadQueue, GraphDlError> {
    let server_base = config.server_base();
    let range = &config.time_range;
    let mut queue = DownloadQueue::default();

    for host_name in &config.hosts {
        info!("Processing host: {}", host_name);

        let host = match api.resolve_host(host_name).await {
            Ok(Some(host)) => host,
            Ok(None) => {
                warn!("No host found with name: {}", host_name);
                queue.skipped_hosts.push(host_name.clone());
                continue;
            }
            Err(e) => {
                error!("Failed to get host ID for {}: {}", host_name, e);
                queue.skipped_hosts.push(host_name.clone());
                continue;
            }
        };

        let host_dir = config.output_dir.join(host_name);
        tokio::fs::create_dir_all(&host_dir).await?;

        let items = match api.list_items(&host.host_id).await {
            Ok(items) => items,
            Err(e) => {
                error!("Failed to get items for host {}: {}", host_name, e);
                queue.skipped_hosts.push(host_name.clone());
                continue;
            }
        };
        info!("Host {} (id {}) has {} items", host_name, host.host_id, items.len());

        for item in items {
            debug!("Item {} ({}) on host {}", item.item_id, item.name, item.host_id);
            let file_path = host_dir.join(image_filename(host_name, &item.name, &item.item_id, range));

            if file_path.exists() {
                info!("Skipping existing file: {}", file_path.display());
                queue.already_present += 1;
                continue;
            }

            let url = graph_url(&server_base, range, &item.item_id, config.width, config.height);
            if let Some(previous) = queue.entries.insert(url, file_path) {
                warn!("Replaced queued destination {}", previous.display());
            }
        }
    }

    info!(
        "Queued {} images ({} already present, {} hosts skipped)",
        queue.len(),
        queue.already_present,
        queue.skipped_hosts.len()
    );
    Ok(queue)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::TIMESTAMP_FORMAT;
    use crate::types::TimeRange;
    use chrono::NaiveDateTime;
    use serde_json::json;
    use std::path::Path;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub(crate) fn test_config(server: &MockServer, output_dir: &Path, hosts: &[&str]) -> Config {
        Config {
            api_url: format!("{}/api_jsonrpc.php", server.uri()).parse().unwrap(),
            api_token: "tok".into(),
            username: "admin".into(),
            password: "pw".into(),
            hosts: hosts.iter().map(|h| h.to_string()).collect(),
            time_range: TimeRange {
                start: NaiveDateTime::parse_from_str("2024-01-01 00:00:00", TIMESTAMP_FORMAT).unwrap(),
                end: NaiveDateTime::parse_from_str("2024-01-02 00:00:00", TIMESTAMP_FORMAT).unwrap(),
            },
            width: 1920,
            height: 200,
            retry_ceiling: 3,
            request_timeout: Duration::from_secs(5),
            output_dir: output_dir.to_path_buf(),
            parallelism: None,
        }
    }

    pub(crate) async fn mount_host(server: &MockServer, name: &str, host_id: &str, items: serde_json::Value) {
        Mock::given(method("POST"))
            .and(path("/api_jsonrpc.php"))
            .and(body_partial_json(json!({ "method": "host.get", "params": { "filter": { "host": name } } })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0", "result": [{ "hostid": host_id }], "id": 1
            })))
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api_jsonrpc.php"))
            .and(body_partial_json(json!({ "method": "item.get", "params": { "hostids": host_id } })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0", "result": items, "id": 1
            })))
            .mount(server)
            .await;
    }

    pub(crate) async fn mount_missing_host(server: &MockServer, name: &str) {
        Mock::given(method("POST"))
            .and(path("/api_jsonrpc.php"))
            .and(body_partial_json(json!({ "method": "host.get", "params": { "filter": { "host": name } } })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0", "result": [], "id": 1
            })))
            .mount(server)
            .await;
    }

    fn api(config: &Config) -> ApiClient {
        ApiClient::new(config.api_url.as_str(), &config.api_token, config.request_timeout).unwrap()
    }

    #[tokio::test]
    async fn failing_hosts_do_not_affect_others() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        mount_missing_host(&server, "gone").await;
        mount_host(&server, "srv-a", "101", json!([{ "itemid": "1", "hostid": "101", "name": "CPU" }])).await;
        // srv-b resolves but listing its items fails
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "method": "host.get", "params": { "filter": { "host": "srv-b" } } })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0", "result": [{ "hostid": "102" }], "id": 1
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "method": "item.get", "params": { "hostids": "102" } })))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;
        mount_host(&server, "srv-c", "103", json!([{ "itemid": "9", "hostid": "103", "name": "Disk: /" }])).await;

        let config = test_config(&server, dir.path(), &["gone", "srv-a", "srv-b", "srv-c"]);
        let queue = build_queue(&api(&config), &config).await.unwrap();

        assert_eq!(queue.skipped_hosts, vec!["gone".to_string(), "srv-b".to_string()]);
        assert_eq!(queue.len(), 2);
        let paths: Vec<_> = queue.entries.values().cloned().collect();
        assert!(paths.contains(&dir.path().join("srv-a").join("srv-a_CPU_1_2024-01-01_000000_2024-01-02_000000.png")));
        assert!(paths.contains(&dir.path().join("srv-c").join("srv-c_Disk _9_2024-01-01_000000_2024-01-02_000000.png")));
        assert!(!dir.path().join("gone").exists());
        assert!(dir.path().join("srv-b").is_dir());
    }

    #[tokio::test]
    async fn existing_files_are_not_queued() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        mount_host(
            &server,
            "srv-a",
            "101",
            json!([
                { "itemid": "1", "hostid": "101", "name": "CPU" },
                { "itemid": "2", "hostid": "101", "name": "Memory" }
            ]),
        )
        .await;

        let config = test_config(&server, dir.path(), &["srv-a"]);
        let first = build_queue(&api(&config), &config).await.unwrap();
        assert_eq!(first.len(), 2);

        for path in first.entries.values() {
            std::fs::write(path, b"png").unwrap();
        }

        let second = build_queue(&api(&config), &config).await.unwrap();
        assert!(second.is_empty());
        assert_eq!(second.already_present, 2);
    }

    #[tokio::test]
    async fn queued_url_points_at_chart_export() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        mount_host(&server, "srv-a", "101", json!([{ "itemid": "77", "hostid": "101", "name": "CPU" }])).await;

        let config = test_config(&server, dir.path(), &["srv-a"]);
        let queue = build_queue(&api(&config), &config).await.unwrap();

        let url = queue.entries.keys().next().unwrap();
        assert!(url.starts_with(&format!("{}/chart.php?from=", server.uri())));
        assert!(url.contains("itemids[0]=77&"));
    }
}
