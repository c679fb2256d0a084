#[cfg(test)]
pub mod test {
    use std::path::PathBuf;

    use tempfile::TempDir;

    use crate::Valfig;
    use crate::env::EnvSource;
    use crate::setup::Setup;

    /// A complete setup whose config file lives in a fresh temp dir.
    ///
    /// App name `test`, version `0.1`, file `config.toml`, separator `__`.
    pub struct TestEnv {
        pub dir: TempDir,
        pub setup: Setup,
    }

    impl TestEnv {
        pub fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let setup = Setup::new("0.1", "test", dir.path().join("config.toml"), "__");
            Self { dir, setup }
        }

        pub fn config_path(&self) -> PathBuf {
            self.dir.path().join("config.toml")
        }

        /// A context over this setup with the given environment variables.
        pub fn valfig(&self, vars: &[(&str, &str)]) -> Valfig {
            let env = EnvSource::Vars(
                vars.iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            );
            Valfig::with_env(self.setup.clone(), env)
        }
    }

    pub fn write_config(env: &TestEnv, content: &str) {
        std::fs::write(env.config_path(), content).unwrap();
    }

    #[test]
    fn test_env_setup_is_complete() {
        let env = TestEnv::new();
        assert!(env.setup.check().is_ok());
        assert!(!env.config_path().exists());
    }
}
