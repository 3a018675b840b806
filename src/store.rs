use std::{fs, io, path::Path};

use crate::models::EditableState;

pub const STATE_PATH: &str = "data/state.json";

/// Read the persisted editable state. Absent, unreadable or malformed
/// content is all treated the same way: there is no stored state.
pub fn load_state() -> Option<EditableState> {
    load_state_from(Path::new(STATE_PATH))
}

/// Mirror the editable state to disk. Best-effort: a failed write is logged
/// and swallowed so the edit that triggered it still completes.
pub fn save_state(state: &EditableState) {
    if let Err(e) = save_state_to(Path::new(STATE_PATH), state) {
        log::warn!("failed to persist state to {STATE_PATH}: {e}");
    }
}

/// Drop the stored state (reset action). Missing file is not an error.
pub fn clear_state() {
    if let Err(e) = fs::remove_file(STATE_PATH) {
        if e.kind() != io::ErrorKind::NotFound {
            log::warn!("failed to remove {STATE_PATH}: {e}");
        }
    }
}

fn load_state_from(path: &Path) -> Option<EditableState> {
    let text = fs::read_to_string(path).ok()?;
    serde_json::from_str(&text).ok()
}

fn save_state_to(path: &Path, state: &EditableState) -> io::Result<()> {
    let text = serde_json::to_string_pretty(state)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    // Write to a sibling temp file first so a crash never truncates the
    // current state file.
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, text)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}
