use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Relative file path (forward slashes) mapped to a lowercase hex digest.
///
/// In a check *response* the value is instead the destination name the file
/// should be stored under inside the update archive.
pub type FilesMap = BTreeMap<String, String>;

/// The server's record of a published release, also the shape of the
/// check-phase response.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseMeta {
    pub version: String,
    pub files_map: FilesMap,
}

impl Default for ReleaseMeta {
    /// The state reported for a channel without any published release.
    fn default() -> Self {
        Self {
            version: String::from("0.0.0"),
            files_map: FilesMap::new(),
        }
    }
}

/// Release manifest transmitted to the server, both when requesting the
/// changed-file diff and alongside the final upload.
///
/// The wire protocol calls the serialized form `signedData`, although no
/// signature is attached to it.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateManifest {
    pub files_map: FilesMap,
    pub version: String,
    pub extras: Map<String, Value>,
}
