//! # Template Rendering
//!
//! Rendering is built on `minijinja`. Two powar-specific mechanisms sit on
//! top of plain variable substitution:
//!
//! 1. **External output extraction**: a template body may contain
//!    `{% external "name.conf" %} ... {% endexternal %}` blocks. The block
//!    does not appear in the primary output; its body is rendered separately
//!    and returned as a `(filename, content)` pair. The installer writes each
//!    pair next to the primary destination. The filename part is itself a
//!    template expression, so it may reference variables.
//!
//! 2. **Command substitution in configuration values**: a string value that,
//!    after stripping trailing newlines, is wholly wrapped in backticks is
//!    replaced by the stdout of running it as a shell command in the module
//!    directory. The `` parse`...` `` form additionally parses the stdout as
//!    YAML and splices in the structured result. The command string is
//!    template-rendered against the current scope before running. Values are
//!    expanded depth-first in document order, and each expanded top-level
//!    variable is visible to the ones after it.
//!
//! `{% include "file" %}` in templates resolves relative to the module
//! directory. Rendering is pure except for the command substitutions, which
//! are real process executions; configuration sources are trusted input.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use minijinja::Environment;
use regex::Regex;

use crate::error::{Error, Result};
use crate::exec;

/// `{% external <expr> %}<body>{% endexternal %}`, non-greedy across lines.
const EXTERNAL_BLOCK_PATTERN: &str =
    r"(?s)\{%-?\s*external\s+(.+?)\s*-?%\}(.*?)\{%-?\s*endexternal\s*-?%\}";

fn external_block_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(EXTERNAL_BLOCK_PATTERN).expect("pattern is valid"))
}

/// Template renderer for one module (or the config directory, when expanding
/// global variables).
///
/// The renderer owns a `minijinja` environment whose include loader is rooted
/// at the module directory. The variable scope is passed per call, because
/// command substitution grows the scope field by field.
pub struct Renderer {
    env: Environment<'static>,
    base_dir: PathBuf,
}

impl Renderer {
    /// Create a renderer whose `{% include %}` lookups resolve inside
    /// `base_dir`.
    pub fn new(base_dir: &Path) -> Self {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_loader(minijinja::path_loader(base_dir));
        Self {
            env,
            base_dir: base_dir.to_path_buf(),
        }
    }

    /// Render a template string against `scope`.
    pub fn render_str(&self, text: &str, scope: &serde_yaml::Mapping) -> Result<String> {
        let ctx = minijinja::Value::from_serialize(scope);
        Ok(self.env.render_str(text, ctx)?)
    }

    /// Render a top-level template, extracting external output blocks.
    ///
    /// Returns the primary rendered text (with the blocks removed) and the
    /// list of `(filename, rendered body)` pairs in document order.
    pub fn render_template(
        &self,
        text: &str,
        scope: &serde_yaml::Mapping,
    ) -> Result<(String, Vec<(String, String)>)> {
        let mut externals = Vec::new();

        let regex = external_block_regex();
        let mut primary_template = String::with_capacity(text.len());
        let mut last_end = 0;

        for captures in regex.captures_iter(text) {
            let whole = captures.get(0).expect("group 0 always present");
            let filename_expr = &captures[1];
            let body = &captures[2];

            let filename = self.render_expression(filename_expr, scope)?;
            if filename.is_empty() {
                return Err(Error::Template {
                    message: format!(
                        "external block filename rendered empty: {}",
                        filename_expr
                    ),
                });
            }
            let content = self.render_str(body, scope)?;
            externals.push((filename, content));

            primary_template.push_str(&text[last_end..whole.start()]);
            last_end = whole.end();
        }
        primary_template.push_str(&text[last_end..]);

        let primary = self.render_str(&primary_template, scope)?;
        Ok((primary, externals))
    }

    /// Evaluate a template expression (e.g. an external block's filename).
    fn render_expression(&self, expr: &str, scope: &serde_yaml::Mapping) -> Result<String> {
        self.render_str(&format!("{{{{ {} }}}}", expr), scope)
    }

    /// Expand command substitutions in a variable mapping.
    ///
    /// `base_scope` is the already-final scope underneath (global variables
    /// when expanding a module's variables; empty when expanding the global
    /// config itself). Each top-level entry is expanded in document order and
    /// becomes visible to the entries after it.
    pub fn expand_variables(
        &self,
        variables: &serde_yaml::Mapping,
        base_scope: &serde_yaml::Mapping,
    ) -> Result<serde_yaml::Mapping> {
        let mut scope = base_scope.clone();
        let mut expanded = serde_yaml::Mapping::new();

        for (key, value) in variables {
            let new_value = self.expand_value(value, &scope)?;
            scope.insert(key.clone(), new_value.clone());
            expanded.insert(key.clone(), new_value);
        }

        Ok(expanded)
    }

    /// Depth-first expansion of one value. Nested mappings and sequences are
    /// walked in document order with the enclosing scope.
    fn expand_value(
        &self,
        value: &serde_yaml::Value,
        scope: &serde_yaml::Mapping,
    ) -> Result<serde_yaml::Value> {
        match value {
            serde_yaml::Value::String(s) => match command_directive(s) {
                Some(directive) => {
                    let command = self.render_str(directive.command, scope)?;
                    let stdout = exec::run_capture(&command, &self.base_dir)?;
                    let stdout = stdout.trim_end_matches('\n');
                    if directive.parse {
                        Ok(serde_yaml::from_str(stdout)?)
                    } else {
                        Ok(serde_yaml::Value::String(stdout.to_string()))
                    }
                }
                None => Ok(value.clone()),
            },
            serde_yaml::Value::Mapping(mapping) => {
                let mut out = serde_yaml::Mapping::new();
                for (key, nested) in mapping {
                    out.insert(key.clone(), self.expand_value(nested, scope)?);
                }
                Ok(serde_yaml::Value::Mapping(out))
            }
            serde_yaml::Value::Sequence(sequence) => {
                let mut out = Vec::with_capacity(sequence.len());
                for nested in sequence {
                    out.push(self.expand_value(nested, scope)?);
                }
                Ok(serde_yaml::Value::Sequence(out))
            }
            _ => Ok(value.clone()),
        }
    }
}

struct CommandDirective<'a> {
    command: &'a str,
    parse: bool,
}

/// Recognize the backtick sentinels in a configuration value.
///
/// The value must be wholly wrapped (after stripping trailing newlines, which
/// YAML block scalars add): `` `cmd` `` or `` parse`cmd` ``. A backtick
/// appearing elsewhere in a string is not a directive.
fn command_directive(value: &str) -> Option<CommandDirective<'_>> {
    let trimmed = value.trim_end_matches('\n');
    if let Some(rest) = trimmed.strip_prefix("parse`") {
        let command = rest.strip_suffix('`')?;
        Some(CommandDirective {
            command,
            parse: true,
        })
    } else if let Some(rest) = trimmed.strip_prefix('`') {
        let command = rest.strip_suffix('`')?;
        Some(CommandDirective {
            command,
            parse: false,
        })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn scope(pairs: &[(&str, &str)]) -> serde_yaml::Mapping {
        let mut mapping = serde_yaml::Mapping::new();
        for (key, value) in pairs {
            mapping.insert((*key).into(), (*value).into());
        }
        mapping
    }

    #[test]
    fn test_render_plain_variables() {
        let temp = TempDir::new().unwrap();
        let renderer = Renderer::new(temp.path());
        let out = renderer
            .render_str("color={{ color }}", &scope(&[("color", "red")]))
            .unwrap();
        assert_eq!(out, "color=red");
    }

    #[test]
    fn test_render_include_relative_to_module_dir() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("fragment"), "included {{ color }}").unwrap();
        let renderer = Renderer::new(temp.path());
        let out = renderer
            .render_str("pre {% include \"fragment\" %} post", &scope(&[("color", "red")]))
            .unwrap();
        assert_eq!(out, "pre included red post");
    }

    #[test]
    fn test_external_block_extraction() {
        let temp = TempDir::new().unwrap();
        let renderer = Renderer::new(temp.path());
        let template = "{% external \"foo.conf\" %}bar{% endexternal %}";
        let (primary, externals) = renderer
            .render_template(template, &serde_yaml::Mapping::new())
            .unwrap();
        assert_eq!(primary, "");
        assert_eq!(externals, vec![("foo.conf".to_string(), "bar".to_string())]);
    }

    #[test]
    fn test_external_block_removed_from_primary() {
        let temp = TempDir::new().unwrap();
        let renderer = Renderer::new(temp.path());
        let template = "head\n{% external \"x\" %}body{% endexternal %}\ntail";
        let (primary, externals) = renderer
            .render_template(template, &serde_yaml::Mapping::new())
            .unwrap();
        assert!(primary.contains("head"));
        assert!(primary.contains("tail"));
        assert!(!primary.contains("body"));
        assert_eq!(externals.len(), 1);
    }

    #[test]
    fn test_external_filename_is_an_expression() {
        let temp = TempDir::new().unwrap();
        let renderer = Renderer::new(temp.path());
        let template = "{% external name ~ \".conf\" %}v={{ color }}{% endexternal %}";
        let (_, externals) = renderer
            .render_template(template, &scope(&[("name", "app"), ("color", "red")]))
            .unwrap();
        assert_eq!(externals, vec![("app.conf".to_string(), "v=red".to_string())]);
    }

    #[test]
    fn test_multiple_external_blocks_in_document_order() {
        let temp = TempDir::new().unwrap();
        let renderer = Renderer::new(temp.path());
        let template = concat!(
            "{% external \"a\" %}1{% endexternal %}",
            "middle",
            "{% external \"b\" %}2{% endexternal %}",
        );
        let (primary, externals) = renderer
            .render_template(template, &serde_yaml::Mapping::new())
            .unwrap();
        assert_eq!(primary, "middle");
        assert_eq!(
            externals,
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "2".to_string())
            ]
        );
    }

    #[test]
    fn test_command_directive_recognition() {
        assert!(command_directive("plain").is_none());
        assert!(command_directive("has `backticks` inside").is_none());

        let simple = command_directive("`echo 1`").unwrap();
        assert_eq!(simple.command, "echo 1");
        assert!(!simple.parse);

        let parsed = command_directive("parse`cat list.yml`").unwrap();
        assert_eq!(parsed.command, "cat list.yml");
        assert!(parsed.parse);

        // trailing newline from a YAML block scalar is ignored
        let block = command_directive("`echo 1`\n").unwrap();
        assert_eq!(block.command, "echo 1");
    }

    #[test]
    fn test_expand_simple_command_value() {
        let temp = TempDir::new().unwrap();
        let renderer = Renderer::new(temp.path());
        let mut variables = serde_yaml::Mapping::new();
        variables.insert("version".into(), "`echo 1`".into());

        let expanded = renderer
            .expand_variables(&variables, &serde_yaml::Mapping::new())
            .unwrap();
        assert_eq!(
            expanded.get("version"),
            Some(&serde_yaml::Value::String("1".into()))
        );
    }

    #[test]
    fn test_expanded_value_visible_to_later_fields() {
        let temp = TempDir::new().unwrap();
        let renderer = Renderer::new(temp.path());
        let mut variables = serde_yaml::Mapping::new();
        variables.insert("first".into(), "`echo 1`".into());
        variables.insert("second".into(), "`echo {{ first }}{{ first }}`".into());

        let expanded = renderer
            .expand_variables(&variables, &serde_yaml::Mapping::new())
            .unwrap();
        assert_eq!(
            expanded.get("second"),
            Some(&serde_yaml::Value::String("11".into()))
        );
    }

    #[test]
    fn test_expand_parse_directive_yields_structured_value() {
        let temp = TempDir::new().unwrap();
        let renderer = Renderer::new(temp.path());
        let mut variables = serde_yaml::Mapping::new();
        variables.insert("hosts".into(), "parse`printf -- '- a\\n- b\\n'`".into());

        let expanded = renderer
            .expand_variables(&variables, &serde_yaml::Mapping::new())
            .unwrap();
        let hosts = expanded.get("hosts").unwrap();
        assert_eq!(
            hosts,
            &serde_yaml::Value::Sequence(vec!["a".into(), "b".into()])
        );
    }

    #[test]
    fn test_expand_recurses_into_nested_values() {
        let temp = TempDir::new().unwrap();
        let renderer = Renderer::new(temp.path());
        let nested: serde_yaml::Value =
            serde_yaml::from_str("theme:\n  accent: \"`echo blue`\"\n  plain: red\n").unwrap();
        let mut variables = serde_yaml::Mapping::new();
        if let serde_yaml::Value::Mapping(m) = nested {
            for (k, v) in m {
                variables.insert(k, v);
            }
        }

        let expanded = renderer
            .expand_variables(&variables, &serde_yaml::Mapping::new())
            .unwrap();
        let theme = expanded.get("theme").unwrap();
        assert_eq!(
            theme.get("accent"),
            Some(&serde_yaml::Value::String("blue".into()))
        );
        assert_eq!(
            theme.get("plain"),
            Some(&serde_yaml::Value::String("red".into()))
        );
    }

    #[test]
    fn test_failing_command_is_an_error() {
        let temp = TempDir::new().unwrap();
        let renderer = Renderer::new(temp.path());
        let mut variables = serde_yaml::Mapping::new();
        variables.insert("broken".into(), "`exit 7`".into());

        let err = renderer
            .expand_variables(&variables, &serde_yaml::Mapping::new())
            .unwrap_err();
        assert!(err.to_string().contains("Command failed"));
    }
}
