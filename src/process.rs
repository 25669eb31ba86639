//! Critical process presence checks from /proc/[pid]/ files.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

/// Report whether each name matches at least one running process.
///
/// A process matches on its `comm` or on the file name of `argv[0]`; the
/// latter covers names longer than the kernel's 15 byte `comm` limit. Unreadable
/// entries (races with exiting processes, permissions) are skipped.
pub fn process_status(names: &[String]) -> BTreeMap<String, bool> {
    if names.is_empty() {
        return BTreeMap::new();
    }

    let running = running_process_names(Path::new("/proc"));
    names
        .iter()
        .map(|name| (name.clone(), is_running(name, &running)))
        .collect()
}

fn is_running(name: &str, running: &HashSet<String>) -> bool {
    running.contains(name)
}

/// Names of every visible process under `proc_dir`: `comm` and argv[0] base name.
pub(crate) fn running_process_names(proc_dir: &Path) -> HashSet<String> {
    let mut names = HashSet::new();

    let Ok(entries) = fs::read_dir(proc_dir) else {
        return names;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let is_pid = path
            .file_name()
            .and_then(|f| f.to_str())
            .is_some_and(|f| f.parse::<u32>().is_ok());
        if !is_pid {
            continue;
        }

        if let Ok(comm) = fs::read_to_string(path.join("comm")) {
            let comm = comm.trim();
            if !comm.is_empty() {
                names.insert(comm.to_string());
            }
        }

        if let Ok(cmdline) = fs::read_to_string(path.join("cmdline")) {
            if let Some(exe) = argv0_basename(&cmdline) {
                names.insert(exe.to_string());
            }
        }
    }

    names
}

fn argv0_basename(cmdline: &str) -> Option<&str> {
    let argv0 = cmdline.split('\0').next()?;
    let base = argv0.rsplit('/').next()?;
    if base.is_empty() {
        None
    } else {
        Some(base)
    }
}
