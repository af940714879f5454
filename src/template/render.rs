use std::collections::HashMap;
use std::sync::LazyLock;

use minijinja::{Environment, UndefinedBehavior, Value};

use crate::config::types::PromptTemplate;
use crate::error::HarperBotError;

/// Shared minijinja environment with strict undefined behavior.
static JINJA_ENV: LazyLock<Environment<'static>> = LazyLock::new(|| {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env
});

/// Render the review prompt with the given variables.
///
/// Takes ownership of `vars` so the diff string is moved into the context
/// rather than cloned.
pub fn render_prompt(
    template: &PromptTemplate,
    vars: HashMap<String, Value>,
) -> Result<String, HarperBotError> {
    let tmpl = JINJA_ENV.template_from_str(&template.template)?;
    let rendered = tmpl.render(Value::from_iter(vars))?;
    Ok(rendered)
}
