//! Single-instance process control
//!
//! A pidfile under the runtime directory makes the start/stop triggers
//! idempotent: starting while an instance is alive is a no-op, stopping a
//! non-running instance is a no-op. Stale pidfiles left by a crashed
//! instance are removed on the next start.

use std::fs;
use std::path::{Path, PathBuf};

use rustix::process::{kill_process, Pid, Signal};
use tracing::{debug, info, warn};

use crate::error::{BarError, Result};

/// Default pidfile location: the XDG runtime dir, falling back to the
/// cache dir for sessions without one
pub fn default_pidfile() -> Result<PathBuf> {
    let dir = dirs::runtime_dir()
        .or_else(dirs::cache_dir)
        .ok_or(BarError::NoRuntimeDir)?;
    Ok(dir.join("overlay-statusbar.pid"))
}

/// Outcome of a start attempt
#[derive(Debug)]
pub enum Acquire {
    /// This process now owns the pidfile; the guard removes it on drop
    Acquired(PidFile),
    /// A live instance already owns the pidfile
    AlreadyRunning(i32),
}

/// Owned pidfile, removed when dropped
#[derive(Debug)]
pub struct PidFile {
    path: PathBuf,
}

impl Drop for PidFile {
    fn drop(&mut self) {
        // Cleanup failure at teardown is non-fatal
        if let Err(e) = fs::remove_file(&self.path) {
            warn!(path = ?self.path, error = %e, "Failed to remove pidfile");
        }
    }
}

/// Try to become the single running instance
pub fn acquire(path: &Path) -> Result<Acquire> {
    if let Some(pid) = read_pid(path) {
        if pid_alive(pid) {
            return Ok(Acquire::AlreadyRunning(pid));
        }
        debug!(pid = %pid, path = ?path, "Removing stale pidfile");
        fs::remove_file(path)?;
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, std::process::id().to_string())?;
    info!(path = ?path, pid = %std::process::id(), "Acquired pidfile");

    Ok(Acquire::Acquired(PidFile {
        path: path.to_path_buf(),
    }))
}

/// Ask a running instance to stop. Returns the signalled pid, or None when
/// nothing was running (a no-op, not an error).
pub fn stop(path: &Path) -> Result<Option<i32>> {
    let Some(pid) = read_pid(path) else {
        return Ok(None);
    };

    if !pid_alive(pid) {
        debug!(pid = %pid, "Pidfile owner already gone, removing pidfile");
        let _ = fs::remove_file(path);
        return Ok(None);
    }

    let target = Pid::from_raw(pid).ok_or_else(|| {
        BarError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("invalid pid {} in pidfile", pid),
        ))
    })?;
    kill_process(target, Signal::Term).map_err(std::io::Error::from)?;
    info!(pid = %pid, "Sent SIGTERM to running instance");
    Ok(Some(pid))
}

fn read_pid(path: &Path) -> Option<i32> {
    let content = fs::read_to_string(path).ok()?;
    match content.trim().parse::<i32>() {
        Ok(pid) if pid > 0 => Some(pid),
        _ => {
            warn!(path = ?path, "Pidfile holds no valid pid");
            None
        }
    }
}

fn pid_alive(pid: i32) -> bool {
    Path::new("/proc").join(pid.to_string()).exists()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pidfile_in(dir: &tempfile::TempDir) -> PathBuf {
        dir.path().join("overlay-statusbar.pid")
    }

    #[test]
    fn test_acquire_writes_own_pid() {
        let dir = tempfile::tempdir().unwrap();
        let path = pidfile_in(&dir);

        let acquire = acquire(&path).unwrap();
        assert!(matches!(acquire, Acquire::Acquired(_)));
        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written.trim(), std::process::id().to_string());
    }

    #[test]
    fn test_second_acquire_reports_already_running() {
        let dir = tempfile::tempdir().unwrap();
        let path = pidfile_in(&dir);

        let _guard = acquire(&path).unwrap();
        // Our own pid is alive, so a second start must not proceed.
        match acquire(&path).unwrap() {
            Acquire::AlreadyRunning(pid) => {
                assert_eq!(pid, std::process::id() as i32);
            }
            Acquire::Acquired(_) => panic!("second acquire should not succeed"),
        }
    }

    #[test]
    fn test_stale_pidfile_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = pidfile_in(&dir);

        // Larger than any real pid (kernel pid_max tops out at 2^22)
        fs::write(&path, "2147483647").unwrap();

        let acquire = acquire(&path).unwrap();
        assert!(matches!(acquire, Acquire::Acquired(_)));
        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written.trim(), std::process::id().to_string());
    }

    #[test]
    fn test_garbage_pidfile_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = pidfile_in(&dir);
        fs::write(&path, "not a pid").unwrap();

        // Unparseable content is treated like no instance running; the
        // fresh write replaces it.
        let acquire = acquire(&path).unwrap();
        assert!(matches!(acquire, Acquire::Acquired(_)));
    }

    #[test]
    fn test_stop_without_instance_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let path = pidfile_in(&dir);
        assert_eq!(stop(&path).unwrap(), None);
    }

    #[test]
    fn test_stop_with_stale_pidfile_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let path = pidfile_in(&dir);
        fs::write(&path, "2147483647").unwrap();

        assert_eq!(stop(&path).unwrap(), None);
        assert!(!path.exists(), "stale pidfile should be cleaned up");
    }

    #[test]
    fn test_pidfile_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = pidfile_in(&dir);

        let guard = acquire(&path).unwrap();
        assert!(path.exists());
        drop(guard);
        assert!(!path.exists());
    }
}
