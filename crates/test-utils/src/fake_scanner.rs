use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::TempDir;

/// A scratch directory holding stand-in scanner scripts, a memory image
/// and a results directory.
///
/// Scripts are plain `sh` scripts; `$1` is the input image path, exactly as
/// the real scanners receive it.
pub struct FakeScanner {
    dir: TempDir,
}

impl FakeScanner {
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir().context("creating scratch dir")?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Directory the pipeline writes results into (not created up front).
    pub fn output_dir(&self) -> PathBuf {
        self.dir.path().join("results")
    }

    /// A small file standing in for a memory dump.
    pub fn memory_image(&self) -> Result<PathBuf> {
        let path = self.dir.path().join("memory.img");
        fs::write(&path, [0u8; 512]).context("writing memory image")?;
        Ok(path)
    }

    /// Write `body` as `#!/bin/sh` script `name`, mode 0755.
    pub fn script(&self, name: &str, body: &str) -> Result<PathBuf> {
        let path = self.dir.path().join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n"))
            .with_context(|| format!("writing script {name}"))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
                .with_context(|| format!("chmod {name}"))?;
        }

        Ok(path)
    }

    /// A scanner that prints `report` on stdout, a progress note on
    /// stderr, and exits with `exit_code`.
    pub fn reporting(&self, name: &str, report: &str, exit_code: i32) -> Result<PathBuf> {
        let report_path = self.dir.path().join(format!("{name}.report"));
        fs::write(&report_path, report).context("writing canned report")?;

        self.script(
            name,
            &format!(
                "echo \"scanning $1\" >&2\ncat '{}'\nexit {exit_code}",
                report_path.display()
            ),
        )
    }
}
