//! Static site build command.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use folio_static::{BuildConfig, FormatOptions, StaticBuilder};
use serde::Deserialize;

/// Configuration file structure (site.toml).
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    site: SiteConfig,
    #[serde(default)]
    format: FormatSettings,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct SiteConfig {
    index: Option<PathBuf>,
    source: Option<PathBuf>,
    output: Option<PathBuf>,
    resources: Option<PathBuf>,
    nav_script: Option<PathBuf>,
    bundle_artifact: Option<PathBuf>,
    viewer_base_url: Option<String>,
    placeholder: Option<String>,
    category_label: Option<String>,
    container_id: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct FormatSettings {
    indent: Option<usize>,
    minify_css: Option<bool>,
}

impl ConfigFile {
    /// Overlay the file's settings on the built-in defaults.
    fn into_build_config(self) -> BuildConfig {
        let defaults = BuildConfig::default();
        let site = self.site;

        BuildConfig {
            index_template: site.index.unwrap_or(defaults.index_template),
            source_dir: site.source.unwrap_or(defaults.source_dir),
            output_dir: site.output.unwrap_or(defaults.output_dir),
            resources_dir: site.resources.unwrap_or(defaults.resources_dir),
            nav_script: site.nav_script.unwrap_or(defaults.nav_script),
            bundle_artifact: site.bundle_artifact.unwrap_or(defaults.bundle_artifact),
            viewer_base_url: site.viewer_base_url.unwrap_or(defaults.viewer_base_url),
            placeholder: site.placeholder.unwrap_or(defaults.placeholder),
            category_label: site.category_label.unwrap_or(defaults.category_label),
            container_id: site.container_id.unwrap_or(defaults.container_id),
            format: FormatOptions {
                indent: self.format.indent.unwrap_or(defaults.format.indent),
                minify_css: self.format.minify_css.unwrap_or(defaults.format.minify_css),
            },
        }
    }
}

/// Load configuration from `path` if it exists.
/// Returns an error if the config file exists but is malformed.
fn load_config(path: &Path) -> Result<BuildConfig> {
    if !path.exists() {
        return Ok(BuildConfig::default());
    }

    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    tracing::info!("Loaded config from {}", path.display());
    Ok(config.into_build_config())
}

/// Run the build command.
pub async fn run(config_path: &Path) -> Result<()> {
    tracing::info!("Building site...");

    let config = load_config(config_path)?;

    let result = StaticBuilder::new(config).build().await?;

    tracing::info!(
        "Built {} pages ({} exercises, {} assets) in {}ms",
        result.pages,
        result.exercises,
        result.assets,
        result.duration_ms
    );

    tracing::info!("Output: {}", result.output_dir.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_without_config_file() {
        let temp = tempdir().unwrap();

        let config = load_config(&temp.path().join("site.toml")).unwrap();

        assert_eq!(config.source_dir, PathBuf::from("dev"));
        assert_eq!(config.output_dir, PathBuf::from("docs"));
        assert_eq!(config.category_label, "Shader");
    }

    #[test]
    fn overlays_config_file() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("site.toml");
        fs::write(
            &path,
            r#"
[site]
output = "public"
viewer_base_url = "https://example.com/tree/main/public/"

[format]
minify_css = true
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();

        assert_eq!(config.output_dir, PathBuf::from("public"));
        assert_eq!(config.viewer_base_url, "https://example.com/tree/main/public/");
        assert!(config.format.minify_css);
        assert_eq!(config.format.indent, 2);
        assert_eq!(config.source_dir, PathBuf::from("dev"));
    }

    #[test]
    fn rejects_malformed_config() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("site.toml");
        fs::write(&path, "[site]\noutput = [").unwrap();

        assert!(load_config(&path).is_err());
    }

    #[test]
    fn rejects_unknown_keys() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("site.toml");
        fs::write(&path, "[site]\nouptut = \"public\"").unwrap();

        assert!(load_config(&path).is_err());
    }
}
