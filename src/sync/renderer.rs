use std::collections::HashMap;

use crate::parser::{annotations, has_token, FunctionRecord};

/// Prefix modifiers a definition cannot spell, carried over from the old declaration
const CARRIED_PREFIXES: &[&str] = &["static", "explicit"];

/// Suffix modifiers a definition cannot spell
const CARRIED_SUFFIXES: &[&str] = &["final"];

/// Render a single `;`-terminated declaration, without indentation or line break.
///
/// With no `replacement`, `original` is reproduced. Otherwise the replacement's signature is
/// rendered, keeping the original's `static`/`explicit`/`virtual`/`override`/`final` markers,
/// its attributes and annotation macros, and any default values whose parameter text is unchanged.
pub fn render_declaration(original: &FunctionRecord, replacement: Option<&FunctionRecord>) -> String {
    let target = replacement.unwrap_or(original);

    let mut prefix = target.prefix.clone();
    let mut parameters = target.parameters.clone();
    let mut is_virtual = target.is_virtual;
    let mut is_override = target.is_override;
    let mut suffix = target.suffix.clone();
    let mut carried_suffixes = Vec::new();

    if replacement.is_some() {
        for modifier in CARRIED_PREFIXES.iter().rev() {
            if has_token(&original.prefix, modifier) && !has_token(&prefix, modifier) {
                prefix = join([*modifier, prefix.as_str()]);
            }
        }
        for annotation in annotations(&original.prefix).into_iter().rev() {
            if !prefix.contains(annotation) {
                prefix = join([annotation, prefix.as_str()]);
            }
        }
        for annotation in annotations(&original.suffix) {
            if !suffix.contains(annotation) {
                suffix = join([suffix.as_str(), annotation]);
            }
        }
        carried_suffixes.extend(
            CARRIED_SUFFIXES
                .iter()
                .copied()
                .filter(|modifier| has_token(&original.suffix, modifier) && !has_token(&suffix, modifier)),
        );
        is_virtual |= original.is_virtual;
        is_override |= original.is_override || has_token(&original.suffix, "override");

        let defaults: HashMap<&str, &str> = original
            .parameters
            .iter()
            .filter_map(|p| p.default_value.as_deref().map(|value| (p.type_and_name.as_str(), value)))
            .collect();
        for parameter in parameters.iter_mut().filter(|p| p.default_value.is_none()) {
            if let Some(value) = defaults.get(parameter.type_and_name.as_str()) {
                parameter.default_value = Some(value.to_string());
            }
        }
    }

    if is_virtual && !has_token(&prefix, "virtual") {
        prefix = join(["virtual", prefix.as_str()]);
    }
    if is_override && !has_token(&suffix, "override") {
        suffix = join([suffix.as_str(), "override"]);
    }
    for modifier in carried_suffixes {
        suffix = join([suffix.as_str(), modifier]);
    }

    let head = join([prefix.as_str(), target.return_type.as_str(), target.name.as_str()]);
    let parameters = parameters.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ");
    if suffix.is_empty() {
        format!("{head}({parameters});")
    } else {
        format!("{head}({parameters}) {suffix};")
    }
}

fn join<const N: usize>(parts: [&str; N]) -> String {
    parts.iter().filter(|p| !p.is_empty()).copied().collect::<Vec<_>>().join(" ")
}
