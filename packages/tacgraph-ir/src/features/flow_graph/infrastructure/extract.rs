//! Scoped extraction of one function or class body from a lowered unit

use crate::shared::constants::{END_CLASS_LABEL_PREFIX, END_LABEL_PREFIX};
use crate::shared::models::{
    class_name_of_label, function_name_of_label, strip_counter, IrInstruction, Result, TacError,
};

/// Instructions from `func_<name>_*` through its matching `end_<name>_*`, inclusive
///
/// The first function with that name wins. A missing closing label keeps
/// everything up to the end of the stream.
pub fn extract_function(instructions: &[IrInstruction], name: &str) -> Result<Vec<IrInstruction>> {
    extract_between(
        instructions,
        name,
        "function",
        |label| function_name_of_label(label) == Some(name),
        |label| {
            !label.starts_with(END_CLASS_LABEL_PREFIX)
                && label.strip_prefix(END_LABEL_PREFIX).and_then(strip_counter) == Some(name)
        },
    )
}

/// Instructions from `class_<name>_*` through its matching `end_class_<name>_*`
pub fn extract_class(instructions: &[IrInstruction], name: &str) -> Result<Vec<IrInstruction>> {
    extract_between(
        instructions,
        name,
        "class",
        |label| class_name_of_label(label) == Some(name),
        |label| label.strip_prefix(END_CLASS_LABEL_PREFIX).and_then(strip_counter) == Some(name),
    )
}

fn extract_between(
    instructions: &[IrInstruction],
    name: &str,
    what: &str,
    is_open: impl Fn(&str) -> bool,
    is_close: impl Fn(&str) -> bool,
) -> Result<Vec<IrInstruction>> {
    let labels = || {
        instructions
            .iter()
            .enumerate()
            .filter(|(_, i)| i.is_label())
            .filter_map(|(idx, i)| i.label_name().map(|l| (idx, l)))
    };
    let Some(start) = labels().find(|&(_, l)| is_open(l)).map(|(idx, _)| idx) else {
        let available: Vec<&str> = labels()
            .filter_map(|(_, l)| match what {
                "class" => class_name_of_label(l),
                _ => function_name_of_label(l),
            })
            .collect();
        return Err(TacError::not_found(format!(
            "{} '{}' not found (available: {})",
            what,
            name,
            if available.is_empty() {
                "none".to_string()
            } else {
                available.join(", ")
            }
        )));
    };
    let end = labels()
        .skip_while(|(idx, _)| *idx <= start)
        .find(|&(_, l)| is_close(l))
        .map(|(idx, _)| idx + 1)
        .unwrap_or_else(|| {
            tracing::warn!("{} '{}' has no closing label; extracting to end of unit", what, name);
            instructions.len()
        });
    Ok(instructions[start..end].to_vec())
}
