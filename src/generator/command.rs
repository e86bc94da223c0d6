//! Generator backed by an external command line.
//!
//! The effective config reaches the command three ways:
//!
//! | Placeholder / variable | Value                                   |
//! |------------------------|-----------------------------------------|
//! | `$SITE_SOURCE`         | absolute source directory               |
//! | `$SITE_DESTINATION`    | absolute destination directory          |
//! | `$SITE_OVERLAY`        | config overlay file (JSON, valid YAML)  |
//! | `$SITE_DRAFTS`         | `true` / `false`                        |
//! | `$SITE_FUTURE`         | `true` / `false`                        |
//!
//! Placeholders are substituted inside arguments and exported as environment
//! variables of the same name. The overlay carries `include`/`exclude`, so a
//! Jekyll-style `--config _config.yml,$SITE_OVERLAY` picks up the isolation
//! scope.

use super::{BuildError, Generator, OutputSnapshot};
use crate::{config::BuildConfig, utils::exec::Cmd};
use serde::Serialize;
use std::io::Write;

/// Config keys layered over the generator's own configuration.
#[derive(Debug, Serialize)]
struct Overlay<'a> {
    source: String,
    destination: String,
    show_drafts: bool,
    future: bool,
    #[serde(skip_serializing_if = "no_entries")]
    include: &'a [String],
    exclude: &'a [String],
}

fn no_entries(list: &&[String]) -> bool {
    list.is_empty()
}

impl<'a> Overlay<'a> {
    fn new(config: &'a BuildConfig) -> Self {
        Self {
            source: config.source.to_string_lossy().into_owned(),
            destination: config.destination.to_string_lossy().into_owned(),
            show_drafts: config.drafts,
            future: config.future,
            include: &config.include,
            exclude: &config.exclude,
        }
    }
}

#[derive(Debug, Default)]
pub struct CommandGenerator {
    before: OutputSnapshot,
    after: OutputSnapshot,
}

impl CommandGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    fn write_overlay(config: &BuildConfig) -> Result<tempfile::NamedTempFile, BuildError> {
        let temp_dir = std::env::temp_dir();
        let io_err = |err| BuildError::Io(temp_dir.clone(), err);

        let mut file = tempfile::Builder::new()
            .prefix("hawkins-overlay-")
            .suffix(".yml")
            .tempfile()
            .map_err(io_err)?;
        serde_json::to_writer_pretty(&mut file, &Overlay::new(config))?;
        file.flush().map_err(io_err)?;
        Ok(file)
    }
}

/// `$SITE_*` name/value pairs for one build.
fn variables(config: &BuildConfig, overlay: &str) -> Vec<(&'static str, String)> {
    vec![
        ("SITE_SOURCE", config.source.to_string_lossy().into_owned()),
        ("SITE_DESTINATION", config.destination.to_string_lossy().into_owned()),
        ("SITE_OVERLAY", overlay.to_string()),
        ("SITE_DRAFTS", config.drafts.to_string()),
        ("SITE_FUTURE", config.future.to_string()),
    ]
}

/// Replace `$NAME` placeholders in `arg`. Longer names go first so that a
/// prefix never shadows a longer variable.
fn substitute(arg: &str, vars: &[(&'static str, String)]) -> String {
    let mut sorted: Vec<_> = vars.iter().collect();
    sorted.sort_by_key(|(name, _)| std::cmp::Reverse(name.len()));

    let mut out = arg.to_string();
    for (name, value) in sorted {
        out = out.replace(&format!("${name}"), value);
    }
    out
}

impl Generator for CommandGenerator {
    fn process(&mut self, config: &BuildConfig) -> Result<(), BuildError> {
        let overlay = Self::write_overlay(config)?;
        let vars = variables(config, &overlay.path().to_string_lossy());

        let argv: Vec<String> = config.command.iter().map(|arg| substitute(arg, &vars)).collect();
        if argv.is_empty() {
            return Err(anyhow::anyhow!("empty generator command").into());
        }
        let cmd = Cmd::from_slice(&argv);

        self.before = OutputSnapshot::scan(&config.destination);
        cmd.cwd(&config.source).envs(vars.iter().map(|(k, v)| (*k, v.as_str()))).run()?;
        self.after = OutputSnapshot::scan(&config.destination);

        crate::debug!("build"; "{} output files after build", self.after.len());
        Ok(())
    }

    fn regenerate(&self, page: &str) -> bool {
        self.after.differs_from(&self.before, page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_site_config;
    use tempfile::TempDir;

    fn build_config(dir: &TempDir, command: &[&str]) -> BuildConfig {
        let mut site = test_site_config(dir.path());
        site.build.command = command.iter().map(ToString::to_string).collect();
        BuildConfig::resolve(&site, None).unwrap()
    }

    #[test]
    fn test_substitute() {
        let vars = vec![
            ("SITE_SOURCE", "/src".to_string()),
            ("SITE_OVERLAY", "/tmp/o.yml".to_string()),
        ];
        assert_eq!(
            substitute("_config.yml,$SITE_OVERLAY", &vars),
            "_config.yml,/tmp/o.yml"
        );
        assert_eq!(substitute("$SITE_SOURCE/x", &vars), "/src/x");
        assert_eq!(substitute("$HOME", &vars), "$HOME");
    }

    #[test]
    fn test_overlay_json() {
        let dir = TempDir::new().unwrap();
        let mut config = build_config(&dir, &["true"]);
        config.exclude = vec!["a.md".into()];

        let value = serde_json::to_value(Overlay::new(&config)).unwrap();
        assert_eq!(value["exclude"], serde_json::json!(["a.md"]));
        assert_eq!(value["show_drafts"], serde_json::json!(false));
        // outside isolation the generator's own include list stays untouched
        assert!(value.get("include").is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_process_reports_changed_pages() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("_site");
        std::fs::create_dir_all(&dest).unwrap();
        std::fs::write(dest.join("same.html"), "same").unwrap();
        std::fs::write(dest.join("edit.html"), "v1").unwrap();

        let script = "printf same > \"$SITE_DESTINATION/same.html\"; \
                      printf v2 > \"$SITE_DESTINATION/edit.html\"; \
                      test -f \"$SITE_OVERLAY\"";
        let config = build_config(&dir, &["sh", "-c", script]);

        let mut generator = CommandGenerator::new();
        generator.process(&config).unwrap();

        assert!(generator.regenerate("/edit.html"));
        assert!(!generator.regenerate("/same.html"));
        assert!(!generator.regenerate("/missing.html"));
    }

    #[cfg(unix)]
    #[test]
    fn test_process_failure() {
        let dir = TempDir::new().unwrap();
        let config = build_config(&dir, &["sh", "-c", "echo broken layout >&2; exit 3"]);

        let err = CommandGenerator::new().process(&config).unwrap_err();
        assert!(err.to_string().contains("broken layout"));
    }

    #[test]
    fn test_empty_command() {
        let dir = TempDir::new().unwrap();
        let mut config = build_config(&dir, &["true"]);
        config.command.clear();
        assert!(CommandGenerator::new().process(&config).is_err());
    }
}
