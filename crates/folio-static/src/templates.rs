//! Template engine for the generated navigation script.

use minijinja::{context, AutoEscape, Environment};

use folio_manifest::Manifest;

/// Values substituted into the navigation script.
///
/// Every field is already a JavaScript literal.
#[derive(Debug, Clone, serde::Serialize)]
pub struct NavContext {
    /// Repository viewer base URL, as a string literal ending in `/`
    pub viewer_base_url: String,
    /// Id of the element the list is appended to, as a string literal
    pub container_id: String,
    /// Exercise records, as a JSON array
    pub exercises: String,
}

impl NavContext {
    pub fn new(
        manifest: &Manifest,
        viewer_base_url: &str,
        container_id: &str,
    ) -> Result<Self, serde_json::Error> {
        let mut base = viewer_base_url.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }

        Ok(Self {
            viewer_base_url: js_string(&base)?,
            container_id: js_string(container_id)?,
            exercises: manifest.to_json()?,
        })
    }
}

fn js_string(value: &str) -> Result<String, serde_json::Error> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

/// Template engine using minijinja.
pub struct TemplateEngine {
    env: Environment<'static>,
}

impl TemplateEngine {
    /// Create a new template engine with the navigation script template.
    pub fn new() -> Self {
        let mut env = Environment::new();

        // Output is JavaScript, values are escaped by NavContext.
        env.set_auto_escape_callback(|_| AutoEscape::None);

        env.add_template_owned("navigation.js".to_string(), NAV_SCRIPT.to_string())
            .expect("Failed to add navigation template");

        Self { env }
    }

    /// Render the navigation script.
    pub fn render_navigation(&self, nav: &NavContext) -> Result<String, minijinja::Error> {
        let tmpl = self.env.get_template("navigation.js")?;

        tmpl.render(context! {
            viewer_base_url => &nav.viewer_base_url,
            container_id => &nav.container_id,
            exercises => &nav.exercises,
        })
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

const NAV_SCRIPT: &str = r#"document.addEventListener("DOMContentLoaded", () => {
  const VIEWER_BASE_URL = {{ viewer_base_url }};
  const exercises = {{ exercises | indent(2) }};
  const listContainer = document.getElementById({{ container_id }});
  let currentGroup = null;

  exercises.forEach(({ groupLabel, index, path }) => {
    if (currentGroup !== groupLabel) {
      const header = document.createElement("h2");
      header.textContent = groupLabel;
      listContainer.appendChild(header);
      currentGroup = groupLabel;
    }

    const li = document.createElement("li");

    const pageLink = document.createElement("a");
    pageLink.href = `./${path}`;
    pageLink.textContent = `${groupLabel} - Exercise ${index} (HTML)`;
    li.appendChild(pageLink);

    const viewerLink = document.createElement("a");
    viewerLink.href = `${VIEWER_BASE_URL}${path}`;
    viewerLink.textContent = " (Link for HTML code)";
    viewerLink.style.color = "gray";
    li.appendChild(viewerLink);

    listContainer.appendChild(li);
  });
});
"#;
