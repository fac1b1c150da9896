//! Command helper methods for Test.

use super::Test;
use assert_cmd::Command;
use std::process::Output;

impl Test {
    /// Create a secrets-api command running in the test directory.
    ///
    /// Environment variables that would change server configuration are
    /// cleared so the host environment cannot leak in.
    pub fn cmd(&self) -> Command {
        #[allow(deprecated)]
        let mut cmd = Command::cargo_bin("secrets-api").expect("failed to find secrets-api binary");
        for var in [
            "SECRETS_API_CONFIG",
            "SECRETS_API_LISTEN_ADDRESS",
            "SECRETS_API_LOG",
            "ENC_KEY_PATH",
            "VAULT_ADDR",
            "VAULT_TOKEN",
            "VAULT_STORAGE_DIR",
        ] {
            cmd.env_remove(var);
        }
        cmd.env("NO_COLOR", "1");
        cmd.current_dir(self.dir.path());
        cmd
    }

    /// Shortcut for `secrets-api keygen`.
    pub fn keygen(&self, path: &str) -> Output {
        self.cmd()
            .args(["keygen", path])
            .output()
            .expect("failed to run secrets-api keygen")
    }

    /// Shortcut for `secrets-api keygen --force`.
    pub fn keygen_force(&self, path: &str) -> Output {
        self.cmd()
            .args(["keygen", "--force", path])
            .output()
            .expect("failed to run secrets-api keygen")
    }
}
