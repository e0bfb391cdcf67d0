pub mod axios;
pub mod fetch;
pub mod view;

use apigen_core::error::GeneratorError;
use minijinja::{Environment, Value};

const TEMPLATES: &[(&str, &str)] = &[
    ("fetch.ts.j2", include_str!("../../templates/fetch.ts.j2")),
    ("axios.ts.j2", include_str!("../../templates/axios.ts.j2")),
    ("query.ts.j2", include_str!("../../templates/query.ts.j2")),
];

fn render_error(err: minijinja::Error) -> GeneratorError {
    GeneratorError::Render(err.to_string())
}

/// Render one of the client templates. Output has no trailing whitespace.
pub(crate) fn render(template: &str, ctx: Value) -> Result<String, GeneratorError> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.set_keep_trailing_newline(true);
    for (name, source) in TEMPLATES {
        env.add_template(name, source).map_err(render_error)?;
    }
    let tmpl = env.get_template(template).map_err(render_error)?;
    tmpl.render(ctx)
        .map(|s| s.trim_end().to_string())
        .map_err(render_error)
}
