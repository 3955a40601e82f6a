//! Fake build tool scripts.
//!
//! Each script is a tiny POSIX shell program written into a temp directory
//! and marked executable. They are invoked by the real process layer, so the
//! scripts receive exactly the argument vector a real aggregator binary would.
//!
//! Every invocation appends its arguments to `invocations.log` in the working
//! directory (the install root), one line per run.

use std::fs;
use std::path::{Path, PathBuf};

/// Name of the file the fake tools append their arguments to.
pub const INVOCATION_LOG: &str = "invocations.log";

/// Write an executable shell script at `path` with the given body.
///
/// # Panics
/// Panics if the filesystem operations fail.
pub fn write_script(path: &Path, body: &str) -> PathBuf {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .unwrap_or_else(|e| panic!("write_script: failed to create {}: {e}", parent.display()));
    }
    fs::write(path, format!("#!/bin/sh\n{body}\n"))
        .unwrap_or_else(|e| panic!("write_script: failed to write {}: {e}", path.display()));

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755))
            .unwrap_or_else(|e| panic!("write_script: failed to chmod {}: {e}", path.display()));
    }

    path.to_path_buf()
}

/// A build tool that behaves like the aggregator's `build` command.
///
/// It records its arguments, writes `<output-dir>/packages.json` (the fourth
/// token of the vector, third argument), prints one line on stdout and one on
/// stderr, then exits with `exit_code`.
pub fn write_build_tool(root: &Path, relative_binary: &str, exit_code: i32) -> PathBuf {
    let body = format!(
        r#"echo "$*" >> {log}
out="$3"
if [ -n "$out" ]; then
  mkdir -p "$out"
  echo '{{"packages":[]}}' > "$out/packages.json"
fi
echo "Scanning packages"
echo "Writing packages.json" >&2
exit {exit_code}"#,
        log = INVOCATION_LOG,
    );
    write_script(&root.join(relative_binary), &body)
}

/// A build tool that prints a line and then sleeps for `seconds`.
pub fn write_slow_tool(root: &Path, relative_binary: &str, seconds: u32) -> PathBuf {
    let body = format!(
        "echo \"$*\" >> {INVOCATION_LOG}\necho \"starting\"\nsleep {seconds}\necho \"finished\""
    );
    write_script(&root.join(relative_binary), &body)
}

/// Argument lines recorded by the fake tools under `root`.
///
/// Returns an empty list when no tool has run yet.
pub fn invocations(root: &Path) -> Vec<String> {
    fs::read_to_string(root.join(INVOCATION_LOG))
        .map(|content| content.lines().map(str::to_string).collect())
        .unwrap_or_default()
}
