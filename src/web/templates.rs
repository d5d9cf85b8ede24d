use minijinja::Environment;

use crate::error::Result;

const TEMPLATES: &[(&str, &str)] = &[
    ("layout.html", include_str!("../../templates/layout.html")),
    ("index.html", include_str!("../../templates/index.html")),
    ("form.html", include_str!("../../templates/form.html")),
];

/// Build the template set. `.html` names get HTML auto-escaping.
pub fn environment() -> Result<Environment<'static>> {
    let mut env = Environment::new();
    for &(name, source) in TEMPLATES {
        env.add_template(name, source)?;
    }
    Ok(env)
}

pub fn render<S: serde::Serialize>(env: &Environment<'_>, name: &str, ctx: S) -> Result<String> {
    Ok(env.get_template(name)?.render(ctx)?)
}
