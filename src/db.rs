use crate::error::CliError;
use crate::model::{default_db, Db};
use std::collections::BTreeSet;
use std::fs;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// `--db`, then `CHALLENGE_DB_PATH`, then `db_path` from the config file,
/// then `$XDG_DATA_HOME/challenge-tracker/db.json`.
pub fn resolve_db_path(cli_db_path: Option<&str>, config_db_path: Option<&str>) -> Result<String, CliError> {
    if let Some(p) = cli_db_path.map(|s| s.trim()).filter(|s| !s.is_empty()) {
        return Ok(p.to_string());
    }

    if let Ok(p) = std::env::var("CHALLENGE_DB_PATH") {
        let p = p.trim().to_string();
        if !p.is_empty() {
            return Ok(p);
        }
    }

    if let Some(p) = config_db_path.map(|s| s.trim()).filter(|s| !s.is_empty()) {
        return Ok(p.to_string());
    }

    let base = std::env::var("XDG_DATA_HOME")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let home = std::env::var("HOME")
        .ok()
        .or_else(|| std::env::var("USERPROFILE").ok());

    let base = match (base, home) {
        (Some(b), _) => PathBuf::from(b),
        (None, Some(h)) => Path::new(&h).join(".local").join("share"),
        (None, None) => return Err(CliError::io("DB IO error")),
    };

    Ok(base
        .join("challenge-tracker")
        .join("db.json")
        .to_string_lossy()
        .to_string())
}

fn validate_db_shape(db: &Db) -> Result<(), CliError> {
    if db.version != 1 {
        return Err(CliError::io("DB corrupted"));
    }
    if db.meta.next_challenge_number < 1 || db.meta.next_entry_number < 1 {
        return Err(CliError::io("DB corrupted"));
    }

    let ids: BTreeSet<&str> = db.challenges.iter().map(|c| c.id.as_str()).collect();
    if ids.len() != db.challenges.len() {
        return Err(CliError::io("DB corrupted"));
    }
    if let Some(orphan) = db.entries.iter().find(|e| !ids.contains(e.challenge_id.as_str())) {
        warn!(entry = %orphan.id, challenge = %orphan.challenge_id, "entry without challenge");
        return Err(CliError::io("DB corrupted"));
    }
    Ok(())
}

pub fn read_db(db_path: &str) -> Result<Db, CliError> {
    match fs::read_to_string(db_path) {
        Ok(txt) => {
            let db: Db = serde_json::from_str(&txt).map_err(|e| {
                warn!(path = db_path, error = %e, "unreadable DB");
                CliError::io("DB corrupted")
            })?;
            validate_db_shape(&db)?;
            debug!(
                path = db_path,
                challenges = db.challenges.len(),
                entries = db.entries.len(),
                "loaded DB"
            );
            Ok(db)
        }
        Err(e) => {
            if e.kind() == std::io::ErrorKind::NotFound {
                debug!(path = db_path, "no DB yet, starting empty");
                Ok(default_db())
            } else {
                Err(CliError::io("DB IO error"))
            }
        }
    }
}

fn ensure_parent_dir(db_path: &str) -> Result<PathBuf, CliError> {
    let dir = Path::new(db_path)
        .parent()
        .map(|p| if p.as_os_str().is_empty() { Path::new(".") } else { p })
        .ok_or_else(|| CliError::io("DB IO error"))?
        .to_path_buf();
    fs::create_dir_all(&dir).map_err(|_| CliError::io("DB IO error"))?;

    #[cfg(unix)]
    {
        let _ = fs::set_permissions(&dir, fs::Permissions::from_mode(0o700));
    }

    Ok(dir)
}

/// Removes the lock file when the mutation finishes, successful or not.
struct WriteLock {
    path: PathBuf,
}

impl Drop for WriteLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

fn with_write_lock<R>(
    db_path: &str,
    f: impl FnOnce() -> Result<R, CliError>,
) -> Result<R, CliError> {
    let lock_path = PathBuf::from(format!("{}.lock", db_path));

    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&lock_path)
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::AlreadyExists {
                CliError::io("DB is locked")
            } else {
                CliError::io("DB IO error")
            }
        })?;

    #[cfg(unix)]
    {
        let _ = file.set_permissions(fs::Permissions::from_mode(0o600));
    }
    drop(file);

    let _guard = WriteLock { path: lock_path };
    f()
}

/// Full-file JSON with keys in a stable order (serde_json maps are sorted).
pub fn to_json_pretty<T: serde::Serialize>(value: &T) -> Result<String, CliError> {
    serde_json::to_string_pretty(value).map_err(|_| CliError::io("DB IO error"))
}

fn write_db_inner(db_path: &str, db: &Db) -> Result<(), CliError> {
    validate_db_shape(db)?;
    let dir = ensure_parent_dir(db_path)?;

    let tmp_path = dir.join(format!(".db.json.tmp.{}", std::process::id()));
    let data = to_json_pretty(db)? + "\n";

    {
        let mut f = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&tmp_path)
            .map_err(|_| CliError::io("DB IO error"))?;

        #[cfg(unix)]
        {
            let _ = f.set_permissions(fs::Permissions::from_mode(0o600));
        }

        f.write_all(data.as_bytes())
            .and_then(|_| f.sync_all())
            .map_err(|_| CliError::io("DB IO error"))?;
    }

    fs::rename(&tmp_path, db_path).map_err(|_| {
        let _ = fs::remove_file(&tmp_path);
        CliError::io("DB IO error")
    })?;

    #[cfg(unix)]
    {
        let _ = fs::set_permissions(db_path, fs::Permissions::from_mode(0o600));
    }

    debug!(path = db_path, bytes = data.len(), "wrote DB");
    Ok(())
}

/// Read-modify-write under the lock file. Nothing is written when
/// `mutator` fails.
pub fn update_db<R>(
    db_path: &str,
    mutator: impl FnOnce(&mut Db) -> Result<R, CliError>,
) -> Result<R, CliError> {
    ensure_parent_dir(db_path)?;
    with_write_lock(db_path, || {
        let mut db = read_db(db_path)?;
        let out = mutator(&mut db)?;
        write_db_inner(db_path, &db)?;
        Ok(out)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Entry;
    use chrono::NaiveDate;

    #[test]
    fn missing_file_reads_as_empty_db() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        let db = read_db(path.to_str().unwrap()).unwrap();
        assert!(db.challenges.is_empty());
        assert_eq!(db.meta.next_challenge_number, 1);
    }

    #[test]
    fn failed_mutation_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("db.json");
        let p = path.to_str().unwrap();

        update_db(p, |db| {
            db.meta.next_challenge_number = 7;
            Ok(())
        })
        .unwrap();
        let err = update_db(p, |db| -> Result<(), CliError> {
            db.meta.next_challenge_number = 99;
            Err(CliError::usage("nope"))
        })
        .unwrap_err();
        assert_eq!(err.exit_code, 2);
        assert_eq!(read_db(p).unwrap().meta.next_challenge_number, 7);
        assert!(!Path::new(&format!("{}.lock", p)).exists());
    }

    #[test]
    fn held_lock_and_orphans_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        let p = path.to_str().unwrap();

        fs::write(format!("{}.lock", p), b"").unwrap();
        let err = update_db(p, |_| Ok(())).unwrap_err();
        assert_eq!(err.message, "DB is locked");
        fs::remove_file(format!("{}.lock", p)).unwrap();

        let err = update_db(p, |db| {
            db.entries.push(Entry {
                id: "e0001".to_string(),
                challenge_id: "c0404".to_string(),
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                value: 1.0,
                notes: None,
            });
            Ok(())
        })
        .unwrap_err();
        assert_eq!(err.message, "DB corrupted");
    }

    #[test]
    fn corrupted_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        fs::write(&path, "{not json").unwrap();
        assert_eq!(read_db(path.to_str().unwrap()).unwrap_err().message, "DB corrupted");
    }
}
