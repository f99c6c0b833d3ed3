//! Initialize a site in the current project.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Run the init command.
pub fn run(config_path: &Path, yes: bool) -> Result<()> {
    tracing::info!("Initializing folio...");

    write_default(config_path, DEFAULT_CONFIG, yes)?;
    write_default(Path::new("index.html"), DEFAULT_INDEX, yes)?;

    for dir in ["dev", "dev/resources"] {
        fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir))?;
    }

    tracing::info!("Initialization complete!");
    tracing::info!("Add exercises as dev/week<N>/ex<M>.html and run 'folio build'.");

    Ok(())
}

fn write_default(path: &Path, contents: &str, overwrite: bool) -> Result<()> {
    if path.exists() && !overwrite {
        tracing::warn!("{} already exists. Use --yes to overwrite.", path.display());
        return Ok(());
    }

    fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!("Created {}", path.display());
    Ok(())
}

const DEFAULT_CONFIG: &str = r#"# Folio Configuration

[site]
# Landing page template
index = "index.html"

# Exercise templates: week<N>/ex<M>.html and shader/shader_ex<M>.html
source = "dev"

# Publish directory
output = "docs"

# Copied verbatim into the publish directory
resources = "dev/resources"

# Prefix of the "code" link shown next to each exercise
viewer_base_url = "https://github.com/8gaU8/3d-vis-practical-works/tree/main/docs/"

# Tag replaced by the page's script; {script} is the script file name
placeholder = '<script type="module" src="./{script}"></script>'

[format]
indent = 2
minify_css = false
"#;

const DEFAULT_INDEX: &str = r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>3D Visualization Exercises</title>
  </head>
  <body>
    <h1>3D Visualization Exercises</h1>
    <ul id="exercise-list"></ul>
    <script type="module" src="./main.js"></script>
  </body>
</html>
"#;
