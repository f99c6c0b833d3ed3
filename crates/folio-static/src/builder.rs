//! Static site builder.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use folio_manifest::{Discovery, FsTree, Manifest, SourceTree};

use crate::assets::AssetPipeline;
use crate::format::{FormatError, FormatOptions, Formatter};
use crate::inline::{InlineError, Placeholder};
use crate::templates::{NavContext, TemplateEngine};

/// Published name of the landing page.
const LANDING_PAGE: &str = "index.html";

/// Configuration for building the site.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Landing page template
    pub index_template: PathBuf,

    /// Source root containing exercise templates
    pub source_dir: PathBuf,

    /// Output directory
    pub output_dir: PathBuf,

    /// Static assets copied verbatim
    pub resources_dir: PathBuf,

    /// Where the navigation script is generated before inlining
    pub nav_script: PathBuf,

    /// Leftover bundle removed after publishing, relative to the output directory
    pub bundle_artifact: PathBuf,

    /// Base URL of the repository viewer linked next to each exercise
    pub viewer_base_url: String,

    /// Script tag replaced during inlining, with `{script}` for the file name
    pub placeholder: String,

    /// Label of the fixed, non-numbered category
    pub category_label: String,

    /// Id of the landing page element that receives the navigation list
    pub container_id: String,

    /// Markup formatting
    pub format: FormatOptions,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            index_template: PathBuf::from("index.html"),
            source_dir: PathBuf::from("dev"),
            output_dir: PathBuf::from("docs"),
            resources_dir: PathBuf::from("dev/resources"),
            nav_script: PathBuf::from("main.js"),
            bundle_artifact: PathBuf::from("bundle.js"),
            viewer_base_url: "https://github.com/8gaU8/3d-vis-practical-works/tree/main/docs/"
                .to_string(),
            placeholder: r#"<script type="module" src="./{script}"></script>"#.to_string(),
            category_label: "Shader".to_string(),
            container_id: "exercise-list".to_string(),
            format: FormatOptions::default(),
        }
    }
}

/// Result of a build operation.
#[derive(Debug)]
pub struct BuildResult {
    /// Number of pages published, landing page included
    pub pages: usize,

    /// Number of exercises in the navigation
    pub exercises: usize,

    /// Number of static assets copied
    pub assets: usize,

    /// Total build time in milliseconds
    pub duration_ms: u64,

    /// Output directory
    pub output_dir: PathBuf,
}

/// Errors that can occur during build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Missing required input: {0}")]
    MissingInput(String),

    #[error("Failed to read {0}")]
    ReadError(String),

    #[error("Failed to inline script into {path}: {source}")]
    InlineError {
        path: String,
        #[source]
        source: InlineError,
    },

    #[error("Failed to format {path}: {source}")]
    FormatError {
        path: String,
        #[source]
        source: FormatError,
    },

    #[error("Formatting task failed: {0}")]
    Interrupted(String),

    #[error("Failed to render template: {0}")]
    TemplateError(String),

    #[error("Failed to write output: {0}")]
    WriteError(String),
}

/// Static site builder.
pub struct StaticBuilder {
    config: BuildConfig,
    source: Box<dyn SourceTree + Send + Sync>,
    discovery: Discovery,
    placeholder: Placeholder,
    templates: TemplateEngine,
    formatter: Arc<Formatter>,
}

impl StaticBuilder {
    /// Create a builder reading templates from `config.source_dir`.
    pub fn new(config: BuildConfig) -> Self {
        let source = FsTree::new(&config.source_dir).exclude(&config.resources_dir);
        Self::with_source(config, source)
    }

    /// Create a builder reading templates from an arbitrary source tree.
    ///
    /// The landing template, resources and output still live on disk.
    pub fn with_source(config: BuildConfig, source: impl SourceTree + Send + Sync + 'static) -> Self {
        Self {
            discovery: Discovery::new(config.category_label.clone()),
            placeholder: Placeholder::new(config.placeholder.clone()),
            templates: TemplateEngine::new(),
            formatter: Arc::new(Formatter::new(config.format.clone())),
            source: Box::new(source),
            config,
        }
    }

    /// Build the site.
    ///
    /// The navigation script is removed again whether or not publishing succeeds.
    pub async fn build(&self) -> Result<BuildResult, BuildError> {
        let start = Instant::now();

        self.check_inputs()?;

        let manifest = self.discovery.discover(self.source.as_ref());
        tracing::info!("Discovered {} exercises", manifest.len());

        self.write_navigation_script(&manifest)?;

        let (pages, assets) = match self.publish().await {
            Ok(counts) => counts,
            Err(e) => {
                self.discard_navigation_script();
                return Err(e);
            }
        };

        self.cleanup()?;

        let duration = start.elapsed();

        Ok(BuildResult {
            pages,
            exercises: manifest.len(),
            assets,
            duration_ms: duration.as_millis() as u64,
            output_dir: self.config.output_dir.clone(),
        })
    }

    /// Publish every page and copy assets, returning both counts.
    async fn publish(&self) -> Result<(usize, usize), BuildError> {
        fs::create_dir_all(&self.config.output_dir)
            .map_err(|e| BuildError::WriteError(e.to_string()))?;

        self.publish_index().await?;
        let mut pages = 1;

        let templates: Vec<PathBuf> = self.discovery.templates(self.source.as_ref()).collect();
        for template in &templates {
            if template.as_path() == Path::new(LANDING_PAGE) {
                tracing::warn!(
                    "Skipping {}: it would overwrite the landing page",
                    self.config.source_dir.join(template).display()
                );
                continue;
            }
            self.publish_template(template).await?;
            pages += 1;
        }

        let assets = self.copy_assets()?;

        Ok((pages, assets))
    }

    /// Fail before writing anything if a primary input is absent.
    fn check_inputs(&self) -> Result<(), BuildError> {
        if !self.config.index_template.is_file() {
            return Err(BuildError::MissingInput(format!(
                "index template not found: {}",
                self.config.index_template.display()
            )));
        }

        if !self.source.is_present() {
            return Err(BuildError::MissingInput(format!(
                "source directory not found: {}",
                self.config.source_dir.display()
            )));
        }

        if !self.config.resources_dir.is_dir() {
            return Err(BuildError::MissingInput(format!(
                "resources directory not found: {}",
                self.config.resources_dir.display()
            )));
        }

        Ok(())
    }

    fn write_navigation_script(&self, manifest: &Manifest) -> Result<(), BuildError> {
        let nav = NavContext::new(
            manifest,
            &self.config.viewer_base_url,
            &self.config.container_id,
        )
        .map_err(|e| BuildError::TemplateError(e.to_string()))?;

        let script = self
            .templates
            .render_navigation(&nav)
            .map_err(|e: minijinja::Error| BuildError::TemplateError(e.to_string()))?;

        let path = &self.config.nav_script;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| BuildError::WriteError(e.to_string()))?;
        }
        fs::write(path, script).map_err(|e| BuildError::WriteError(e.to_string()))?;

        tracing::info!("Generated {}", path.display());
        Ok(())
    }

    /// Inline the navigation script into the landing page and publish it.
    async fn publish_index(&self) -> Result<(), BuildError> {
        let index = &self.config.index_template;
        let html = read(index)?;
        let script = read(&self.config.nav_script)?;

        let html = self
            .placeholder
            .inline(&html, &file_name(&self.config.nav_script), &script)
            .map_err(|source| BuildError::InlineError {
                path: index.display().to_string(),
                source,
            })?;

        if !self.has_container(&html) {
            tracing::warn!(
                "{} has no element with id \"{}\"; the navigation list will not render",
                index.display(),
                self.config.container_id
            );
        }

        let html = self.format(index, html).await?;

        let output = self.config.output_dir.join(LANDING_PAGE);
        fs::write(&output, html).map_err(|e| BuildError::WriteError(e.to_string()))?;

        tracing::info!("Built {}", output.display());
        Ok(())
    }

    /// Inline a template's paired script, if any, and publish the page.
    async fn publish_template(&self, template: &Path) -> Result<(), BuildError> {
        let html = self
            .source
            .read_to_string(template)
            .map_err(|e| BuildError::ReadError(format!("{}: {}", template.display(), e)))?;

        let script = template.with_extension("js");
        let html = if self.source.exists(&script) {
            let code = self
                .source
                .read_to_string(&script)
                .map_err(|e| BuildError::ReadError(format!("{}: {}", script.display(), e)))?;

            self.placeholder
                .inline(&html, &file_name(&script), &code)
                .map_err(|source| BuildError::InlineError {
                    path: template.display().to_string(),
                    source,
                })?
        } else {
            tracing::debug!("No script for {}", template.display());
            html
        };

        let html = self.format(template, html).await?;

        let output = self.config.output_dir.join(template);
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent).map_err(|e| BuildError::WriteError(e.to_string()))?;
        }
        fs::write(&output, html).map_err(|e| BuildError::WriteError(e.to_string()))?;

        tracing::info!("Bundled: {}", output.display());
        Ok(())
    }

    /// Format markup off the async thread; the page is written only afterwards.
    async fn format(&self, path: &Path, html: String) -> Result<String, BuildError> {
        let formatter = Arc::clone(&self.formatter);

        tokio::task::spawn_blocking(move || formatter.format(&html))
            .await
            .map_err(|e| BuildError::Interrupted(e.to_string()))?
            .map_err(|source| BuildError::FormatError {
                path: path.display().to_string(),
                source,
            })
    }

    fn has_container(&self, html: &str) -> bool {
        let id = &self.config.container_id;
        html.contains(&format!("id=\"{}\"", id)) || html.contains(&format!("id='{}'", id))
    }

    fn copy_assets(&self) -> Result<usize, BuildError> {
        let dest = self.config.output_dir.join(AssetPipeline::mirror_dir(
            &self.config.source_dir,
            &self.config.resources_dir,
        ));

        let copied = AssetPipeline::copy_tree(&self.config.resources_dir, &dest)
            .map_err(|e| BuildError::WriteError(e.to_string()))?;

        Ok(copied.len())
    }

    /// Remove intermediate files, tolerating their absence.
    fn cleanup(&self) -> Result<(), BuildError> {
        let leftovers = [
            self.config.output_dir.join(&self.config.bundle_artifact),
            self.config.nav_script.clone(),
        ];

        for path in &leftovers {
            match fs::remove_file(path) {
                Ok(()) => tracing::info!("Deleted: {}", path.display()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(BuildError::WriteError(format!("{}: {}", path.display(), e)))
                }
            }
        }

        Ok(())
    }

    /// Best-effort removal of the navigation script after a failed build.
    fn discard_navigation_script(&self) {
        let path = &self.config.nav_script;
        match fs::remove_file(path) {
            Ok(()) => tracing::debug!("Deleted: {}", path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Failed to delete {}: {}", path.display(), e),
        }
    }
}

fn read(path: &Path) -> Result<String, BuildError> {
    fs::read_to_string(path).map_err(|e| BuildError::ReadError(format!("{}: {}", path.display(), e)))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
