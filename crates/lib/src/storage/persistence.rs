//! Persistence for [`Storage`].
//!
//! The tables are written as one JSON document. Rows are stored as plain
//! arrays; the lookup maps are rebuilt on load.

use std::{collections::HashMap, path::Path};

use serde::{Deserialize, Deserializer, Serialize};
use tokio::sync::RwLock;
use tracing::info;

use super::Storage;
use crate::{
    Result,
    model::{ActivityEntry, Board, BoardId, List, Member, Task},
};

/// The current persistence file format version.
/// v0 indicates this is an unstable format subject to breaking changes.
const PERSISTENCE_VERSION: u8 = 0;

fn is_v0(v: &u8) -> bool {
    *v == 0
}

fn validate_persistence_version<'de, D>(deserializer: D) -> std::result::Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let version = u8::deserialize(deserializer)?;
    if version != PERSISTENCE_VERSION {
        return Err(serde::de::Error::custom(format!(
            "unsupported persistence version {version}; only version {PERSISTENCE_VERSION} is supported"
        )));
    }
    Ok(version)
}

#[derive(Serialize, Deserialize)]
struct SerializableStorage {
    #[serde(
        rename = "_v",
        default,
        skip_serializing_if = "is_v0",
        deserialize_with = "validate_persistence_version"
    )]
    version: u8,
    #[serde(default)]
    boards: Vec<Board>,
    #[serde(default)]
    lists: Vec<List>,
    #[serde(default)]
    tasks: Vec<Task>,
    #[serde(default)]
    members: Vec<Member>,
    #[serde(default)]
    activity: Vec<ActivityEntry>,
}

impl SerializableStorage {
    fn into_storage(self) -> Storage {
        let mut members: HashMap<BoardId, Vec<Member>> = HashMap::new();
        for member in self.members {
            members.entry(member.board_id).or_default().push(member);
        }
        Storage {
            boards: RwLock::new(self.boards.into_iter().map(|b| (b.id, b)).collect()),
            lists: RwLock::new(
                self.lists
                    .into_iter()
                    .map(|l| (l.id, l.without_tasks()))
                    .collect(),
            ),
            tasks: RwLock::new(self.tasks.into_iter().map(|t| (t.id, t)).collect()),
            members: RwLock::new(members),
            activity: RwLock::new(self.activity),
        }
    }
}

pub(super) async fn save_to_file<P: AsRef<Path>>(storage: &Storage, path: P) -> Result<()> {
    let serializable = SerializableStorage {
        version: PERSISTENCE_VERSION,
        boards: storage.boards.read().await.values().cloned().collect(),
        lists: storage.lists.read().await.values().cloned().collect(),
        tasks: storage.tasks.read().await.values().cloned().collect(),
        members: storage
            .members
            .read()
            .await
            .values()
            .flatten()
            .cloned()
            .collect(),
        activity: storage.activity.read().await.clone(),
    };

    let json = serde_json::to_string_pretty(&serializable)?;
    tokio::fs::write(path.as_ref(), json).await?;
    info!(path = %path.as_ref().display(), "saved board data");
    Ok(())
}

pub(super) async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Storage> {
    match tokio::fs::read_to_string(path.as_ref()).await {
        Ok(json) => {
            let serializable: SerializableStorage = serde_json::from_str(&json)?;
            Ok(serializable.into_storage())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Storage::new()),
        Err(e) => Err(e.into()),
    }
}
