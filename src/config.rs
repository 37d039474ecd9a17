use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use tracing::debug;

use crate::error::{Result, TdgError};

/// File name looked up next to the executable and under the user config dir.
pub const TEMPLATES_FILENAME: &str = "templates.json";
/// Environment variable that points at an alternative template config.
pub const TEMPLATES_ENV: &str = "TDG_TEMPLATES";
const USER_CONFIG_SUBDIR: &str = "tdg";

/// A raw template as written in the config file.
///
/// `base_dir` may be absolute, relative, or `~`-prefixed. `sub_dirs` and
/// `files` are fragments that may contain the `!name!` token; list order is
/// creation order.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct TemplateRecord {
    pub base_dir: Option<String>,
    #[serde(default)]
    pub sub_dirs: Vec<String>,
    #[serde(default)]
    pub files: Vec<String>,
}

/// All templates from one config file, keyed by template name.
#[derive(Debug)]
pub struct TemplateStore {
    path: Utf8PathBuf,
    templates: BTreeMap<String, TemplateRecord>,
}

impl TemplateStore {
    /// Read and parse the config at `path`.
    pub fn load(path: &Utf8Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                TdgError::ConfigNotFound {
                    path: path.to_owned(),
                }
            } else {
                TdgError::ConfigRead {
                    path: path.to_owned(),
                    source,
                }
            }
        })?;
        Self::parse(path, &raw)
    }

    /// Parse `raw` as TOML when `path` ends in `.toml`, JSON otherwise.
    pub fn parse(path: &Utf8Path, raw: &str) -> Result<Self> {
        let parsed: std::result::Result<BTreeMap<String, TemplateRecord>, String> =
            match path.extension() {
                Some("toml") => toml::from_str(raw).map_err(|err| err.message().to_owned()),
                _ => serde_json::from_str(raw).map_err(|err| err.to_string()),
            };
        let templates = parsed.map_err(|message| TdgError::ConfigParse {
            path: path.to_owned(),
            message,
        })?;

        debug!(config = %path, count = templates.len(), "loaded templates");
        Ok(Self {
            path: path.to_owned(),
            templates,
        })
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Exact, case-sensitive lookup.
    pub fn select(&self, name: &str) -> Result<&TemplateRecord> {
        self.templates
            .get(name)
            .ok_or_else(|| TdgError::TemplateNotFound {
                name: name.to_owned(),
                config: self.path.clone(),
            })
    }

    /// Template names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    pub fn format_summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Templates in {}:", self.path);
        if self.templates.is_empty() {
            let _ = writeln!(out, "  (none)");
        }
        for (name, record) in &self.templates {
            let base = record
                .base_dir
                .as_deref()
                .filter(|base| !base.trim().is_empty())
                .unwrap_or("<cwd>");
            let _ = writeln!(
                out,
                "  - {} (base: {}; sub_dirs: {}; files: {})",
                name,
                base,
                record.sub_dirs.len(),
                record.files.len()
            );
        }
        out
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConfigSource {
    Explicit,
    Environment,
    InstallDir,
    UserConfig,
}

impl ConfigSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigSource::Explicit => "explicit",
            ConfigSource::Environment => "environment",
            ConfigSource::InstallDir => "install-dir",
            ConfigSource::UserConfig => "user-config",
        }
    }
}

#[derive(Clone, Debug)]
pub struct ConfigLocation {
    pub path: Utf8PathBuf,
    pub source: ConfigSource,
}

/// Inputs to config discovery. Each one is supplied by the caller so the
/// lookup never consults process state on its own.
#[derive(Clone, Debug, Default)]
pub struct SearchPaths {
    pub explicit: Option<Utf8PathBuf>,
    pub env_override: Option<String>,
    pub install_dir: Option<Utf8PathBuf>,
    pub user_config_dir: Option<Utf8PathBuf>,
}

/// Pick the config file to load.
///
/// An explicit path or env override is returned even when it does not exist,
/// so the load reports it. Otherwise the install-relative file wins over the
/// user config dir, and the install-relative path is the one reported when
/// neither exists.
pub fn locate(search: &SearchPaths) -> Result<ConfigLocation> {
    if let Some(path) = &search.explicit {
        return Ok(ConfigLocation {
            path: path.clone(),
            source: ConfigSource::Explicit,
        });
    }

    if let Some(value) = search.env_override.as_deref().filter(|v| !v.trim().is_empty()) {
        return Ok(ConfigLocation {
            path: Utf8PathBuf::from(value),
            source: ConfigSource::Environment,
        });
    }

    let install = search
        .install_dir
        .as_ref()
        .map(|dir| dir.join(TEMPLATES_FILENAME));
    let user = search
        .user_config_dir
        .as_ref()
        .map(|dir| dir.join(USER_CONFIG_SUBDIR).join(TEMPLATES_FILENAME));

    let candidates = [
        (install.as_ref(), ConfigSource::InstallDir),
        (user.as_ref(), ConfigSource::UserConfig),
    ];
    for (candidate, source) in candidates {
        if let Some(path) = candidate.filter(|path| path.exists()) {
            return Ok(ConfigLocation {
                path: path.clone(),
                source,
            });
        }
    }

    let reported = install
        .or(user)
        .unwrap_or_else(|| Utf8PathBuf::from(TEMPLATES_FILENAME));
    Err(TdgError::ConfigNotFound { path: reported })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf8_tempdir() -> (tempfile::TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        (dir, path)
    }

    const SAMPLE_JSON: &str = r#"{
        "project": {
            "base_dir": "/srv/projects",
            "sub_dirs": ["src", "!name!-docs"],
            "files": ["README.md"]
        },
        "scratch": {
            "sub_dirs": [],
            "files": []
        }
    }"#;

    #[test]
    fn parses_json_records() {
        let store = TemplateStore::parse(Utf8Path::new("templates.json"), SAMPLE_JSON).unwrap();
        let project = store.select("project").unwrap();
        assert_eq!(project.base_dir.as_deref(), Some("/srv/projects"));
        assert_eq!(project.sub_dirs, vec!["src", "!name!-docs"]);
        assert_eq!(project.files, vec!["README.md"]);

        let scratch = store.select("scratch").unwrap();
        assert_eq!(scratch.base_dir, None);
        assert!(scratch.sub_dirs.is_empty());
    }

    #[test]
    fn toml_and_json_stores_agree() {
        let toml_raw = r#"
[project]
base_dir = "/srv/projects"
sub_dirs = ["src", "!name!-docs"]
files = ["README.md"]

[scratch]
"#;
        let from_toml = TemplateStore::parse(Utf8Path::new("templates.toml"), toml_raw).unwrap();
        let from_json = TemplateStore::parse(Utf8Path::new("templates.json"), SAMPLE_JSON).unwrap();
        for name in ["project", "scratch"] {
            assert_eq!(from_toml.select(name).unwrap(), from_json.select(name).unwrap());
        }
    }

    #[test]
    fn select_is_exact_and_case_sensitive() {
        let store = TemplateStore::parse(Utf8Path::new("t.json"), SAMPLE_JSON).unwrap();
        let err = store.select("Project").unwrap_err();
        assert!(matches!(
            err,
            TdgError::TemplateNotFound { ref name, .. } if name == "Project"
        ));
        assert!(store.select("proj").is_err());
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = TemplateStore::parse(Utf8Path::new("t.json"), "{ not json").unwrap_err();
        assert!(matches!(err, TdgError::ConfigParse { .. }));

        let err =
            TemplateStore::parse(Utf8Path::new("t.json"), r#"{"a": {"sub_dirs": "src"}}"#)
                .unwrap_err();
        assert!(matches!(err, TdgError::ConfigParse { .. }));
    }

    #[test]
    fn missing_file_is_config_not_found() {
        let (_guard, root) = utf8_tempdir();
        let path = root.join("absent.json");
        let err = TemplateStore::load(&path).unwrap_err();
        assert!(matches!(err, TdgError::ConfigNotFound { path: ref p } if *p == path));
    }

    #[test]
    fn load_reads_from_disk() {
        let (_guard, root) = utf8_tempdir();
        let path = root.join(TEMPLATES_FILENAME);
        fs::write(&path, SAMPLE_JSON).unwrap();
        let store = TemplateStore::load(&path).unwrap();
        assert_eq!(store.path(), path);
        assert!(store.select("project").is_ok());
        assert!(store.select("scratch").is_ok());
    }

    #[test]
    fn summary_lists_each_template() {
        let store = TemplateStore::parse(Utf8Path::new("t.json"), SAMPLE_JSON).unwrap();
        let summary = store.format_summary();
        assert!(summary.contains("project (base: /srv/projects; sub_dirs: 2; files: 1)"));
        assert!(summary.contains("scratch (base: <cwd>; sub_dirs: 0; files: 0)"));
    }

    #[test]
    fn names_are_sorted() {
        let raw = r#"{"zeta": {}, "alpha": {}, "Mid": {}}"#;
        let store = TemplateStore::parse(Utf8Path::new("t.json"), raw).unwrap();
        assert_eq!(store.names().collect::<Vec<_>>(), vec!["Mid", "alpha", "zeta"]);
    }

    #[test]
    fn locate_prefers_explicit_then_env() {
        let search = SearchPaths {
            explicit: Some(Utf8PathBuf::from("/tmp/explicit.json")),
            env_override: Some("/tmp/env.json".to_owned()),
            ..SearchPaths::default()
        };
        let found = locate(&search).unwrap();
        assert_eq!(found.source, ConfigSource::Explicit);
        assert_eq!(found.path, "/tmp/explicit.json");

        let search = SearchPaths {
            explicit: None,
            ..search
        };
        let found = locate(&search).unwrap();
        assert_eq!(found.source, ConfigSource::Environment);
        assert_eq!(found.path, "/tmp/env.json");
    }

    #[test]
    fn locate_prefers_install_dir_over_user_config() {
        let (_guard, root) = utf8_tempdir();
        let install = root.join("bin");
        let user = root.join("config");
        fs::create_dir_all(&install).unwrap();
        fs::create_dir_all(user.join(USER_CONFIG_SUBDIR)).unwrap();
        fs::write(user.join(USER_CONFIG_SUBDIR).join(TEMPLATES_FILENAME), "{}").unwrap();

        let search = SearchPaths {
            env_override: Some("   ".to_owned()),
            install_dir: Some(install.clone()),
            user_config_dir: Some(user.clone()),
            ..SearchPaths::default()
        };
        let found = locate(&search).unwrap();
        assert_eq!(found.source, ConfigSource::UserConfig);

        fs::write(install.join(TEMPLATES_FILENAME), "{}").unwrap();
        let found = locate(&search).unwrap();
        assert_eq!(found.source, ConfigSource::InstallDir);
        assert_eq!(found.path, install.join(TEMPLATES_FILENAME));
    }

    #[test]
    fn locate_reports_install_path_when_nothing_exists() {
        let (_guard, root) = utf8_tempdir();
        let search = SearchPaths {
            install_dir: Some(root.join("bin")),
            user_config_dir: Some(root.join("config")),
            ..SearchPaths::default()
        };
        let err = locate(&search).unwrap_err();
        assert!(matches!(
            err,
            TdgError::ConfigNotFound { ref path } if *path == root.join("bin").join(TEMPLATES_FILENAME)
        ));
    }
}
