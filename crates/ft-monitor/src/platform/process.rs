use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System, UpdateKind};

/// Name and executable of a running process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    pub name: String,
    pub exe_path: String,
}

/// Looks up processes by pid, refreshing only the process asked for.
pub struct ProcessResolver {
    system: System,
}

impl Default for ProcessResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessResolver {
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }

    /// `None` when the process is gone or its executable cannot be read.
    pub fn lookup(&mut self, pid: u32) -> Option<ProcessInfo> {
        let pid = Pid::from_u32(pid);
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            ProcessRefreshKind::new().with_exe(UpdateKind::OnlyIfNotSet),
        );

        let process = self.system.process(pid)?;
        let Some(exe) = process.exe() else {
            tracing::debug!(%pid, "process executable not readable");
            return None;
        };

        Some(ProcessInfo {
            name: process.name().to_string_lossy().into_owned(),
            exe_path: exe.to_string_lossy().into_owned(),
        })
    }
}
