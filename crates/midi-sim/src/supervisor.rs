//! Virtual process supervisor

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use midi_mux::{ProcessSupervisor, SupervisorError};
use parking_lot::Mutex;

/// One call made against the supervisor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorCall {
    Find(String),
    Kill(u32),
    Spawn(PathBuf),
}

#[derive(Debug)]
struct Inner {
    processes: BTreeMap<u32, String>,
    calls: Vec<(Instant, SupervisorCall)>,
    next_pid: u32,
    fail_spawns: bool,
}

/// Fake process table
///
/// Spawned processes are named after the executable's file name, so a
/// relaunched process is found again by the same name.
#[derive(Debug, Clone)]
pub struct VirtualSupervisor {
    inner: Arc<Mutex<Inner>>,
}

impl Default for VirtualSupervisor {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                processes: BTreeMap::new(),
                calls: Vec::new(),
                next_pid: 1000,
                fail_spawns: false,
            })),
        }
    }
}

impl VirtualSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a running process, returning its pid
    pub fn add_process(&self, name: &str) -> u32 {
        let mut inner = self.inner.lock();
        inner.next_pid += 1;
        let pid = inner.next_pid;
        inner.processes.insert(pid, name.to_string());
        pid
    }

    /// Names of running processes, by pid
    pub fn processes(&self) -> BTreeMap<u32, String> {
        self.inner.lock().processes.clone()
    }

    /// Make every later spawn fail
    pub fn fail_spawns(&self, fail: bool) {
        self.inner.lock().fail_spawns = fail;
    }

    /// Every call so far, with when it happened
    pub fn timed_calls(&self) -> Vec<(Instant, SupervisorCall)> {
        self.inner.lock().calls.clone()
    }

    pub fn calls(&self) -> Vec<SupervisorCall> {
        self.inner
            .lock()
            .calls
            .iter()
            .map(|(_, call)| call.clone())
            .collect()
    }
}

impl ProcessSupervisor for VirtualSupervisor {
    fn find_processes(&self, name: &str) -> Vec<u32> {
        let mut inner = self.inner.lock();
        inner
            .calls
            .push((Instant::now(), SupervisorCall::Find(name.to_string())));
        inner
            .processes
            .iter()
            .filter(|(_, process)| process.contains(name))
            .map(|(&pid, _)| pid)
            .collect()
    }

    fn kill(&self, pid: u32) -> Result<(), SupervisorError> {
        let mut inner = self.inner.lock();
        inner.calls.push((Instant::now(), SupervisorCall::Kill(pid)));
        inner
            .processes
            .remove(&pid)
            .map(|_| ())
            .ok_or_else(|| SupervisorError::KillFailed {
                pid,
                reason: "no such process".to_string(),
            })
    }

    fn spawn(&self, executable: &Path) -> Result<u32, SupervisorError> {
        let mut inner = self.inner.lock();
        inner
            .calls
            .push((Instant::now(), SupervisorCall::Spawn(executable.to_path_buf())));
        if inner.fail_spawns {
            return Err(SupervisorError::SpawnFailed {
                path: executable.display().to_string(),
                reason: "spawn disabled".to_string(),
            });
        }

        let name = executable
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        inner.next_pid += 1;
        let pid = inner.next_pid;
        inner.processes.insert(pid, name);
        Ok(pid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_matches_substring() {
        let sup = VirtualSupervisor::new();
        let a = sup.add_process("Strobot");
        sup.add_process("Finder");
        let b = sup.add_process("Strobot Helper");
        assert_eq!(sup.find_processes("Strobot"), vec![a, b]);
    }

    #[test]
    fn test_kill_missing_pid_fails() {
        let sup = VirtualSupervisor::new();
        assert!(sup.kill(42).is_err());
        assert_eq!(sup.calls(), vec![SupervisorCall::Kill(42)]);
    }

    #[test]
    fn test_spawn_names_process_after_file() {
        let sup = VirtualSupervisor::new();
        let pid = sup
            .spawn(Path::new("/Applications/Strobot.app/Contents/MacOS/Strobot"))
            .unwrap();
        assert_eq!(sup.processes().get(&pid).map(String::as_str), Some("Strobot"));
    }
}
