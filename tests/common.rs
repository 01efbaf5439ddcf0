use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

// Not every test binary uses every helper.
#[allow(dead_code)]
pub struct TestContext {
    pub _temp_dir: TempDir,
    pub runner_temp: PathBuf,
    pub tool_cache: PathBuf,
    pub github_path: PathBuf,
    pub github_env: PathBuf,
    pub bin_path: PathBuf,
}

#[allow(dead_code)]
impl TestContext {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let runner_temp = temp_dir.path().join("runner-temp");
        let tool_cache = temp_dir.path().join("tool-cache");
        fs::create_dir_all(&runner_temp).expect("Failed to create runner temp");
        fs::create_dir_all(&tool_cache).expect("Failed to create tool cache");

        Self {
            github_path: temp_dir.path().join("github_path"),
            github_env: temp_dir.path().join("github_env"),
            runner_temp,
            tool_cache,
            bin_path: PathBuf::from(env!("CARGO_BIN_EXE_setup-butler")),
            _temp_dir: temp_dir,
        }
    }

    /// A command isolated from whatever runner the tests happen to execute on.
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::new(&self.bin_path);
        for key in [
            "INPUT_VERSION",
            "INPUT_SELF-UPDATE",
            "INPUT_SELF_UPDATE",
            "RUNNER_DEBUG",
            "RUST_LOG",
        ] {
            cmd.env_remove(key);
        }
        cmd.env("RUNNER_TEMP", &self.runner_temp);
        cmd.env("RUNNER_TOOL_CACHE", &self.tool_cache);
        cmd.env("GITHUB_PATH", &self.github_path);
        cmd.env("GITHUB_ENV", &self.github_env);
        cmd.env("HOME", self._temp_dir.path());
        cmd.env("XDG_DATA_HOME", self._temp_dir.path().join("data"));
        // Nothing listens here; any unexpected request fails fast.
        cmd.env("SETUP_BUTLER_BASE_URL", "http://127.0.0.1:9/butler");
        cmd
    }

    /// Seeds a completed cache entry holding a shell-script butler.
    #[cfg(unix)]
    pub fn seed_cache(&self, version: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let version_dir = self.tool_cache.join("butler").join(version);
        let dir = version_dir.join("x64");
        fs::create_dir_all(&dir).expect("Failed to create cache entry");
        let binary = dir.join("butler");
        write_script(&binary, version);
        fs::set_permissions(&binary, fs::Permissions::from_mode(0o755))
            .expect("Failed to chmod fake butler");
        fs::write(version_dir.join("x64.complete"), "").expect("Failed to write marker");
        dir
    }
}

/// Shell script that answers `-V` with `v<version>` and logs `upgrade` calls.
#[allow(dead_code)]
pub fn butler_script(version: &str) -> String {
    format!(
        "#!/bin/sh\nif [ \"$1\" = upgrade ]; then echo upgraded >> \"$(dirname \"$0\")/upgrades\"; exit 0; fi\necho \"v{}, built on Jan 1 2024\"\n",
        version
    )
}

#[allow(dead_code)]
pub fn write_script(path: &Path, version: &str) {
    fs::write(path, butler_script(version)).expect("Failed to write fake butler");
}

#[allow(dead_code)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub status: std::process::ExitStatus,
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            status: output.status,
        }
    }
}

#[allow(dead_code)]
impl CommandOutput {
    pub fn assert_success(&self) -> &Self {
        if !self.status.success() {
            panic!(
                "Command failed with status {:?}\nstdout: {}\nstderr: {}",
                self.status.code(),
                self.stdout,
                self.stderr
            );
        }
        self
    }

    pub fn assert_failure(&self) -> &Self {
        assert!(
            !self.status.success(),
            "Command unexpectedly succeeded\nstdout: {}\nstderr: {}",
            self.stdout,
            self.stderr
        );
        self
    }

    pub fn assert_stdout_contains(&self, text: &str) -> &Self {
        assert!(
            self.stdout.contains(text),
            "Stdout did not contain '{}'\nActual stdout: {}",
            text,
            self.stdout
        );
        self
    }

    pub fn assert_stderr_contains(&self, text: &str) -> &Self {
        assert!(
            self.stderr.contains(text),
            "Stderr did not contain '{}'\nActual stderr: {}",
            text,
            self.stderr
        );
        self
    }
}
