use std::env;
use std::path::PathBuf;

use findsim_sweep::{Config, Mode};

struct EnvGuard {
    key: &'static str,
    original: Option<String>,
}

impl EnvGuard {
    fn set(key: &'static str, value: &str) -> Self {
        let original = env::var(key).ok();
        env::set_var(key, value);
        Self { key, original }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        if let Some(val) = &self.original {
            env::set_var(self.key, val);
        } else {
            env::remove_var(self.key);
        }
    }
}

// Env vars are process-wide, so everything lives in one test.
#[test]
fn test_merge_env_overrides() {
    let _g1 = EnvGuard::set("FINDSIM_WORKDIR", "/srv/findsim");
    let _g2 = EnvGuard::set("FINDSIM_MODES", "idxjoin, iidx");
    let _g3 = EnvGuard::set("FINDSIM_EPSILONS", "0.25,0.75");
    let _g4 = EnvGuard::set("FINDSIM_KS", "5");
    let _g5 = EnvGuard::set("FINDSIM_JOBS", "4");
    let _g6 = EnvGuard::set("FINDSIM_CONTINUE_ON_FAILURE", "true");
    let _g7 = EnvGuard::set("FINDSIM_JSON", "run.json");
    // Invalid values keep the previous setting
    let _g8 = EnvGuard::set("FINDSIM_TIMEOUT_SECS", "soon");
    let _g9 = EnvGuard::set("FINDSIM_DATASETS", "news.csr");

    let config = Config::default().merge_env();

    assert_eq!(config.workdir, PathBuf::from("/srv/findsim"));
    assert_eq!(config.modes, [Mode::IndexedJoin, Mode::FindSim]);
    assert_eq!(config.epsilons, [0.25, 0.75]);
    assert_eq!(config.ks, [5]);
    assert_eq!(config.jobs, 4);
    assert!(config.continue_on_failure);
    assert_eq!(config.timeout_secs, None);
    assert_eq!(
        config.json_path(),
        Some(PathBuf::from("/srv/findsim/run.json"))
    );
    assert_eq!(config.grid().len(), 4);
    assert_eq!(config.compare_datasets(), ["news"]);

    // A file on top of the defaults, then the environment on top of the file
    let from_file = Config::from_toml_str("ks = [100, 200]\ntool = \"findsim\"\n").unwrap();
    let merged = from_file.merge_env();
    assert_eq!(merged.ks, [5]);
    assert_eq!(merged.tool, PathBuf::from("findsim"));

    // Only 1/0/true/false are understood; anything else keeps the configured value
    let _g10 = EnvGuard::set("FINDSIM_CONTINUE_ON_FAILURE", "yes");
    let enabled = Config {
        continue_on_failure: true,
        ..Config::default()
    };
    assert!(enabled.clone().merge_env().continue_on_failure);
    let _g11 = EnvGuard::set("FINDSIM_CONTINUE_ON_FAILURE", "0");
    assert!(!enabled.merge_env().continue_on_failure);
}
