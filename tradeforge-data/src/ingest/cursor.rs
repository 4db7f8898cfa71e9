use serde::{Deserialize, Serialize};

/// Resumable read position of one source: the position immediately AFTER the last emitted
/// record.
///
/// `record_index` is the index of the next record within `(file, entry)`; earlier files and
/// entries are implied consumed. Re-opening a reader at a cursor re-emits the next record, never
/// the one already consumed. `seq` carries the next per-source sequence number so a restored
/// reader continues the session numbering; cursors missing it restart decoration at 0.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cursor {
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<String>,
    pub record_index: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq: Option<u32>,
}
