use crate::config::types::{ParticipantId, PortalError, Result};
use crate::store::{ParticipantRecord, ProgressStore};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

static WRITE_SEQ: AtomicU64 = AtomicU64::new(0);

/// One JSON file per participant under a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| {
            PortalError::Store(format!("cannot create store dir {}: {}", dir.display(), e))
        })?;
        log::debug!("Progress store at {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, participant: &ParticipantId) -> PathBuf {
        self.dir.join(format!("{}.json", participant.as_str()))
    }
}

/// Write-then-rename so a reader never observes a torn record
fn atomic_write(target: &Path, content: &[u8]) -> std::io::Result<()> {
    let parent = target
        .parent()
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidInput, "no parent dir"))?;

    let temp_path = parent.join(format!(
        ".{}.tmp.{}.{}",
        target.file_name().unwrap_or_default().to_string_lossy(),
        std::process::id(),
        WRITE_SEQ.fetch_add(1, Ordering::Relaxed)
    ));

    {
        let mut f = fs::File::create(&temp_path)?;
        f.write_all(content)?;
        f.sync_all()?;
    }

    if let Err(e) = fs::rename(&temp_path, target) {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    if let Ok(dir) = fs::File::open(parent) {
        let _ = dir.sync_all();
    }
    Ok(())
}

impl ProgressStore for FileStore {
    fn load(&self, participant: &ParticipantId) -> Result<Option<ParticipantRecord>> {
        let path = self.record_path(participant);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(PortalError::Store(format!(
                    "cannot read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        let record: ParticipantRecord = serde_json::from_str(&content).map_err(|e| {
            PortalError::Store(format!("corrupt record {}: {}", path.display(), e))
        })?;
        if &record.participant_id != participant {
            return Err(PortalError::Store(format!(
                "record {} belongs to another participant",
                path.display()
            )));
        }
        Ok(Some(record))
    }

    fn upsert(&self, record: &ParticipantRecord) -> Result<()> {
        let path = self.record_path(&record.participant_id);
        let json = serde_json::to_vec_pretty(record)?;
        atomic_write(&path, &json).map_err(|e| {
            PortalError::Store(format!("cannot write {}: {}", path.display(), e))
        })?;
        log::debug!(
            "Persisted progress for {} ({} complete)",
            record.participant_id.short(),
            record.completed.len()
        );
        Ok(())
    }
}
