//! Web-server convention probes.
//!
//! Servlet containers routinely load application code from places that never
//! appear on any classpath the process reports. Reading every container's
//! configuration is hopeless, but the common case is an application deployed
//! under the default ROOT context, so we probe those locations relative to
//! the container home variables and keep whatever exists on disk.

use crate::config::AgentConfig;
use indexmap::IndexSet;
use std::path::Path;

pub(crate) fn probe(config: &AgentConfig) -> Vec<String> {
    let mut paths = IndexSet::new();

    // Tomcat
    for key in ["CATALINA_BASE", "CATALINA_HOME"] {
        add_relative(&mut paths, config, key, "webapps/ROOT/WEB-INF/lib");
        add_relative(&mut paths, config, key, "webapps/ROOT/WEB-INF/classes");
    }

    // Jetty; newer versions renamed the ROOT context directory to root
    for key in ["JETTY_BASE", "JETTY_HOME"] {
        add_relative(&mut paths, config, key, "webapps/ROOT/WEB-INF/lib");
        add_relative(&mut paths, config, key, "webapps/ROOT/WEB-INF/classes");
        add_relative(&mut paths, config, key, "webapps/root/WEB-INF/lib");
        add_relative(&mut paths, config, key, "webapps/root/WEB-INF/classes");
    }

    paths.into_iter().collect()
}

/// Join a home-variable base with a relative suffix; collect only paths that
/// exist on disk. Absent variables and dead paths are silently skipped.
fn add_relative(paths: &mut IndexSet<String>, config: &AgentConfig, key: &str, suffix: &str) {
    let Some(base) = config.get(key) else {
        return;
    };
    let path = Path::new(base).join(suffix);
    if path.exists() {
        paths.insert(path.to_string_lossy().into_owned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_keeps_only_existing_paths() {
        let temp = tempfile::tempdir().unwrap();
        let lib = temp.path().join("webapps/ROOT/WEB-INF/lib");
        std::fs::create_dir_all(&lib).unwrap();
        // No classes directory on purpose

        let config = AgentConfig::from_pairs([(
            "CATALINA_BASE",
            temp.path().to_string_lossy().into_owned(),
        )]);

        let paths = probe(&config);
        assert_eq!(paths, vec![lib.to_string_lossy().into_owned()]);
    }

    #[test]
    fn test_probe_without_container_variables() {
        assert!(probe(&AgentConfig::default()).is_empty());
    }

    #[test]
    fn test_jetty_lowercase_root_variant() {
        let temp = tempfile::tempdir().unwrap();
        let classes = temp.path().join("webapps/root/WEB-INF/classes");
        std::fs::create_dir_all(&classes).unwrap();

        let config = AgentConfig::from_pairs([(
            "JETTY_BASE",
            temp.path().to_string_lossy().into_owned(),
        )]);

        let paths = probe(&config);
        assert_eq!(paths, vec![classes.to_string_lossy().into_owned()]);
    }

    #[test]
    fn test_base_and_home_both_probed_without_duplicates() {
        let temp = tempfile::tempdir().unwrap();
        let lib = temp.path().join("webapps/ROOT/WEB-INF/lib");
        std::fs::create_dir_all(&lib).unwrap();

        let base = temp.path().to_string_lossy().into_owned();
        let config = AgentConfig::from_pairs([
            ("CATALINA_BASE", base.clone()),
            ("CATALINA_HOME", base),
        ]);

        let paths = probe(&config);
        assert_eq!(paths, vec![lib.to_string_lossy().into_owned()]);
    }
}
