use std::io;
use std::path::Path;

use common::release::{ReleaseMeta, UpdateManifest};
use derive_more::{Display, Error, From};
use indicatif::ProgressBar;
use semver::Version;
use serde_json::{Map, Value};

use crate::archiver::{self, ArchiveEntry, ArchiverError};
use crate::client::{ApiClient, ApiError};
use crate::filemap::{self, FileMapError};

/// Release publishing errors.
#[derive(Debug, Display, From, Error)]
pub(crate) enum PublishError {
    /// IO-related error.
    Io(io::Error),

    /// A version string could not be parsed as a semantic version.
    Version(semver::Error),

    /// JSON serialization error.
    Json(serde_json::Error),

    /// Update server API error.
    Api(ApiError),

    /// Asset tree fingerprinting error.
    FileMap(FileMapError),

    /// Unable to create the update archive.
    #[display(fmt = "unable to create update archive: {}", _0)]
    Archiver(ArchiverError),
}

/// How a publish attempt ended.
#[derive(Debug)]
pub(crate) enum PublishOutcome {
    /// The local version did not exceed the server's published version; the
    /// release was not sent.
    VersionRejected {
        /// Version declared in the project config.
        local: Version,

        /// Version currently published on the channel.
        server: Version,
    },

    /// The release was submitted to the server.
    Published {
        /// Number of files in the local asset tree.
        total_files: usize,

        /// Number of files the server requested and received.
        pushed_files: usize,

        /// Size of the uploaded archive in bytes, when one was built.
        archive_size: Option<u64>,
    },
}

/// A release may only replace a strictly older one.
pub(crate) fn version_allows(local: &Version, server: &Version) -> bool {
    local > server
}

/// Publishes a release to an update channel.
///
/// The steps run strictly in sequence: fetch the channel's latest release
/// metadata (404 means no release exists yet), gate on the version,
/// fingerprint the asset tree, ask the server which files it is missing,
/// package exactly those into a temporary zip, and upload it together with
/// the manifest. The temporary archive is removed when its handle drops,
/// whether or not the upload went through.
pub(crate) async fn publish_update(
    client: &ApiClient,
    channel_id: &str,
    version: &str,
    assets_dir: &Path,
    extras: Map<String, Value>,
    progress: &ProgressBar,
) -> Result<PublishOutcome, PublishError> {
    let local_version = Version::parse(version)?;

    progress.set_message("Fetching latest release metadata...");

    let server_meta = match client.latest_release(channel_id).await {
        Ok(meta) => meta,
        Err(ApiError::NotFound) => {
            progress.println("No release published yet, this will be the first one");
            ReleaseMeta::default()
        }
        Err(err) => return Err(err.into()),
    };
    let server_version = Version::parse(&server_meta.version)?;

    if !version_allows(&local_version, &server_version) {
        return Ok(PublishOutcome::VersionRejected {
            local: local_version,
            server: server_version,
        });
    }

    progress.set_message("Fingerprinting update assets...");

    let files_map = filemap::build_file_map(assets_dir)?;
    let total_files = files_map.len();

    let manifest = UpdateManifest {
        files_map,
        version: version.to_owned(),
        extras,
    };
    let signed_data = serde_json::to_string(&manifest)?;

    progress.set_message("Negotiating changed files...");

    let requested = client.check_update(channel_id, &signed_data).await?.files_map;

    let archive = if requested.is_empty() {
        // The server already has every file; only the manifest is sent.
        None
    } else {
        progress.set_message("Creating update archive...");

        let entries: Vec<ArchiveEntry> = requested
            .iter()
            .map(|(path, dst)| ArchiveEntry {
                src: assets_dir.join(path),
                dst: dst.clone(),
            })
            .collect();

        let mut archive_file = tempfile::Builder::new()
            .prefix("airlift-update-")
            .suffix(".zip")
            .tempfile()?;
        let size = archiver::build_update_archive(&entries, archive_file.as_file_mut())?;

        Some((archive_file, size))
    };

    progress.set_message("Uploading release...");

    let upload_result = client
        .publish_release(
            channel_id,
            &signed_data,
            archive.as_ref().map(|(file, _)| file.path()),
        )
        .await;

    let archive_size = archive.as_ref().map(|(_, size)| *size);

    // The temporary archive is removed on drop regardless of the upload
    // outcome.
    drop(archive);
    upload_result?;

    Ok(PublishOutcome::Published {
        total_files,
        pushed_files: requested.len(),
        archive_size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    use serde_json::json;
    use tempfile::TempDir;

    use crate::testing::{mock_server, MockResponse};

    /// Three web-asset files, one of them nested.
    fn create_asset_tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();

        fs::write(root.join("index.html"), b"<html></html>").unwrap();
        fs::create_dir_all(root.join("js")).unwrap();
        fs::write(root.join("js").join("app.js"), b"console.log(1);").unwrap();
        fs::write(root.join("style.css"), b"body {}").unwrap();

        dir
    }

    #[test]
    fn gate_allows_only_strictly_newer_versions() {
        let version = |raw| Version::parse(raw).unwrap();

        assert!(version_allows(&version("1.2.0"), &version("1.1.9")));
        assert!(version_allows(&version("1.0.0"), &version("0.0.0")));
        assert!(!version_allows(&version("1.0.0"), &version("1.0.0")));
        assert!(!version_allows(&version("1.0.0"), &version("1.0.1")));
        // Pre-releases order below their release per semver.
        assert!(version_allows(&version("1.0.0"), &version("1.0.0-beta")));
        assert!(!version_allows(&version("1.0.0-alpha"), &version("1.0.0")));
    }

    #[tokio::test]
    async fn first_deploy_ships_the_requested_subset() {
        let assets = create_asset_tree();
        let (url, requests, handle) = mock_server(vec![
            MockResponse::json(404, "{}"),
            MockResponse::json(
                200,
                r#"{"version":"2.0.0","filesMap":{"js/app.js":"js/app.js"}}"#,
            ),
            MockResponse::json(200, "{}"),
        ])
        .await;

        let client = ApiClient::new(&url, "test-token");
        let outcome = publish_update(
            &client,
            "chan-1",
            "2.0.0",
            assets.path(),
            Map::new(),
            &ProgressBar::hidden(),
        )
        .await
        .unwrap();

        let PublishOutcome::Published {
            total_files,
            pushed_files,
            archive_size,
        } = outcome
        else {
            panic!("expected a published outcome");
        };

        assert_eq!(total_files, 3);
        assert_eq!(pushed_files, 1);
        assert!(archive_size.unwrap() > 0);

        let requests = requests.lock().unwrap();
        assert_eq!(requests.len(), 3);
        assert!(requests[0].starts_with("GET /deploy/chan-1/meta/latest"));
        assert!(requests[1].starts_with("POST /deploy/chan-1?check=1"));
        assert!(requests[2].starts_with("POST /deploy/chan-1 "));
        // The upload is multipart: the manifest field plus the archive.
        assert!(requests[2].contains(r#"name="signedData""#), "{}", requests[2]);
        assert!(requests[2].contains("update.zip"), "{}", requests[2]);

        handle.abort();
    }

    #[tokio::test]
    async fn manifest_carries_file_map_and_extras() {
        let assets = create_asset_tree();
        let (url, requests, handle) = mock_server(vec![
            MockResponse::json(404, "{}"),
            MockResponse::json(200, r#"{"version":"1.0.0","filesMap":{}}"#),
            MockResponse::json(200, "{}"),
        ])
        .await;

        let extras = json!({"campaign": {"id": 7}});
        let Value::Object(extras) = extras else {
            unreachable!()
        };

        let client = ApiClient::new(&url, "test-token");
        publish_update(
            &client,
            "chan-1",
            "1.0.0",
            assets.path(),
            extras,
            &ProgressBar::hidden(),
        )
        .await
        .unwrap();

        let requests = requests.lock().unwrap();
        assert!(requests[1].contains("js/app.js"), "{}", requests[1]);
        assert!(
            requests[1].contains(r#"\"campaign\":{\"id\":7}"#),
            "{}",
            requests[1]
        );

        handle.abort();
    }

    #[tokio::test]
    async fn unchanged_assets_skip_the_archive() {
        let assets = create_asset_tree();
        let (url, requests, handle) = mock_server(vec![
            MockResponse::json(404, "{}"),
            MockResponse::json(200, r#"{"version":"1.0.0","filesMap":{}}"#),
            MockResponse::json(200, "{}"),
        ])
        .await;

        let client = ApiClient::new(&url, "test-token");
        let outcome = publish_update(
            &client,
            "chan-1",
            "1.0.0",
            assets.path(),
            Map::new(),
            &ProgressBar::hidden(),
        )
        .await
        .unwrap();

        let PublishOutcome::Published {
            pushed_files,
            archive_size,
            ..
        } = outcome
        else {
            panic!("expected a published outcome");
        };

        assert_eq!(pushed_files, 0);
        assert!(archive_size.is_none());

        let requests = requests.lock().unwrap();
        assert!(!requests[2].contains("update.zip"), "{}", requests[2]);

        handle.abort();
    }

    #[tokio::test]
    async fn stale_version_stops_after_the_metadata_fetch() {
        let assets = create_asset_tree();
        let (url, requests, handle) = mock_server(vec![MockResponse::json(
            200,
            r#"{"version":"2.0.0","filesMap":{}}"#,
        )])
        .await;

        let client = ApiClient::new(&url, "test-token");
        let outcome = publish_update(
            &client,
            "chan-1",
            "2.0.0",
            assets.path(),
            Map::new(),
            &ProgressBar::hidden(),
        )
        .await
        .unwrap();

        let PublishOutcome::VersionRejected { local, server } = outcome else {
            panic!("expected a rejected outcome");
        };

        assert_eq!(local.to_string(), "2.0.0");
        assert_eq!(server.to_string(), "2.0.0");
        assert_eq!(requests.lock().unwrap().len(), 1);

        handle.abort();
    }

    #[tokio::test]
    async fn metadata_fetch_failure_aborts_the_publish() {
        let assets = create_asset_tree();
        let (url, _requests, handle) =
            mock_server(vec![MockResponse::json(500, r#"{"error":"boom"}"#)]).await;

        let client = ApiClient::new(&url, "test-token");
        let err = publish_update(
            &client,
            "chan-1",
            "2.0.0",
            assets.path(),
            Map::new(),
            &ProgressBar::hidden(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, PublishError::Api(ApiError::Status { .. })), "{err}");

        handle.abort();
    }

    #[tokio::test]
    async fn upload_failure_surfaces_after_cleanup() {
        let assets = create_asset_tree();
        let (url, _requests, handle) = mock_server(vec![
            MockResponse::json(404, "{}"),
            MockResponse::json(
                200,
                r#"{"version":"1.0.0","filesMap":{"index.html":"index.html"}}"#,
            ),
            MockResponse::json(502, r#"{"error":"bad gateway"}"#),
        ])
        .await;

        let client = ApiClient::new(&url, "test-token");
        let err = publish_update(
            &client,
            "chan-1",
            "1.0.0",
            assets.path(),
            Map::new(),
            &ProgressBar::hidden(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, PublishError::Api(ApiError::Status { status: 502, .. })), "{err}");

        handle.abort();
    }
}
