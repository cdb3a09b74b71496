//! Host process supervision
//!
//! Enumeration and kill go through `sysinfo`; launching uses
//! `std::process::Command` with the child detached from our stdio.

use std::path::Path;
use std::process::{Command, Stdio};

use midi_mux::{ProcessSupervisor, SupervisorError};
use sysinfo::{Pid, ProcessesToUpdate, System};

#[derive(Debug, Default)]
pub struct SysinfoSupervisor;

impl SysinfoSupervisor {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessSupervisor for SysinfoSupervisor {
    fn find_processes(&self, name: &str) -> Vec<u32> {
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::All);

        let mut pids: Vec<u32> = sys
            .processes()
            .iter()
            .filter(|(_, process)| process.name().to_string_lossy().contains(name))
            .map(|(pid, _)| pid.as_u32())
            .collect();
        pids.sort_unstable();
        pids
    }

    fn kill(&self, pid: u32) -> Result<(), SupervisorError> {
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::All);

        let process = sys
            .process(Pid::from_u32(pid))
            .ok_or_else(|| SupervisorError::KillFailed {
                pid,
                reason: "process not found".to_string(),
            })?;
        if process.kill() {
            Ok(())
        } else {
            Err(SupervisorError::KillFailed {
                pid,
                reason: "signal not delivered".to_string(),
            })
        }
    }

    fn spawn(&self, executable: &Path) -> Result<u32, SupervisorError> {
        let child = Command::new(executable)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| SupervisorError::SpawnFailed {
                path: executable.display().to_string(),
                reason: e.to_string(),
            })?;
        Ok(child.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_unknown_process_is_empty() {
        let sup = SysinfoSupervisor::new();
        assert!(sup
            .find_processes("midimux-no-such-process-name")
            .is_empty());
    }

    #[test]
    fn test_spawn_missing_executable_fails() {
        let sup = SysinfoSupervisor::new();
        let err = sup
            .spawn(Path::new("/nonexistent/midimux/test-binary"))
            .unwrap_err();
        assert!(matches!(err, SupervisorError::SpawnFailed { .. }));
    }
}
