use std::sync::Arc;

use itertools::Itertools;
use miette::miette;
use mscript_lang::{Function, Registry};

/// Documentation output format.
#[derive(Clone, Debug, Default, clap::ValueEnum)]
pub enum DocFormat {
    #[default]
    Markdown,
    Text,
}

/// Generate documentation for the functions of `registry`, in registration order.
///
/// When `names` is given, only those functions are documented and an unknown
/// name is an error.
pub fn generate_docs(
    registry: &Registry,
    names: &Option<Vec<String>>,
    format: &DocFormat,
) -> Result<String, miette::Error> {
    let functions: Vec<&Arc<dyn Function>> = match names {
        Some(names) if !names.is_empty() => names
            .iter()
            .map(|name| {
                registry
                    .get(name)
                    .ok_or_else(|| miette!("Unknown function: {}", name))
            })
            .try_collect()?,
        _ => registry.iter().collect(),
    };

    Ok(match format {
        DocFormat::Markdown => format_markdown(&functions),
        DocFormat::Text => format_text(&functions),
    })
}

fn format_markdown(functions: &[&Arc<dyn Function>]) -> String {
    let header = [
        "| Function Name | Arity | Description | Parameters | Throws | Example |",
        "| --- | --- | --- | --- | --- | --- |",
    ];

    let rows = functions.iter().map(|function| {
        let params = function.params().iter().map(|p| format!("`{}`", p)).join(", ");
        let thrown = function.thrown().iter().join(", ");
        let example = function
            .examples()
            .first()
            .map(|example| format!("`{}` → `{}`", example.script, example.output))
            .unwrap_or_default();

        format!(
            "| `{}` | {} | {} | {} | {} | {} |",
            function.name(),
            function.arity(),
            escape_cell(function.docs()),
            params,
            thrown,
            escape_cell(&example)
        )
    });

    header.into_iter().map(str::to_string).chain(rows).join("\n")
}

fn format_text(functions: &[&Arc<dyn Function>]) -> String {
    functions
        .iter()
        .map(|function| {
            let examples = function
                .examples()
                .iter()
                .map(|example| {
                    format!(
                        "  # {}\n  {}\n  => {}",
                        example.description, example.script, example.output
                    )
                })
                .join("\n");

            format!(
                "# {}\n{}({})\n{}",
                function.docs(),
                function.name(),
                function.params().join(", "),
                examples
            )
        })
        .join("\n\n")
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}
