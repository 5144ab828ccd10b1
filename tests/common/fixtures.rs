use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempDir};

/// Test data fixtures for build contexts and cluster tooling
pub struct TestFixtures;

impl TestFixtures {
    /// A `.tar.gz`-named archive holding `contents`.
    pub fn context_archive(contents: &[u8]) -> NamedTempFile {
        let mut file = tempfile::Builder::new()
            .prefix("build_context")
            .suffix(".tar.gz")
            .tempfile()
            .expect("create archive");
        file.write_all(contents).expect("write archive");
        file.flush().expect("flush archive");
        file
    }

    /// Write a fake `kubectl` into `dir` that reports `phase` for the builder pod.
    ///
    /// The manifest passed to `kubectl create` is saved as `manifest.yaml` and
    /// every invocation is appended to `calls.log`.
    #[cfg(unix)]
    pub fn fake_kubectl(dir: &TempDir, phase: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let root = dir.path().display();
        let status = if phase == "Failed" {
            r#"{"status":{"phase":"Failed","containerStatuses":[{"name":"kaniko","state":{"terminated":{"exitCode":1,"reason":"Error"}}}]}}"#.to_string()
        } else {
            format!(r#"{{"status":{{"phase":"{}"}}}}"#, phase)
        };

        let script = format!(
            r#"#!/bin/sh
echo "$@" >> "{root}/calls.log"
case "$1" in
  version) echo "Client Version: v1.29.0" ;;
  create) cat > "{root}/manifest.yaml"; echo "pod/fairing-builder-abc12" ;;
  get)
    case "$2" in
      pod) echo '{status}' ;;
      *) echo "$2/$3" ;;
    esac ;;
  logs) echo "INFO[0001] Taking snapshot of full filesystem..." ;;
  delete) echo "pod \"$3\" deleted" ;;
esac
"#
        );

        let path = dir.path().join("kubectl");
        std::fs::write(&path, script).expect("write fake kubectl");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("chmod fake kubectl");
        path
    }

    pub fn read_calls(dir: &Path) -> Vec<String> {
        std::fs::read_to_string(dir.join("calls.log"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }
}
