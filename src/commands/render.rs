use crate::ArborContext;
use crate::output;
use crate::promise::Outcome;
use crate::utils::{Transformer, transform_file};
use anyhow::{Context, Result};
use std::path::Path;

/// Copy `src` to `dest`, replacing `tokens` in the contents
///
/// Tokens are regular expressions unless `literal` is set or the config
/// enables `render.literal_tokens`.
///
/// # Errors
///
/// Returns an error if:
/// - A token is not a valid regular expression
/// - Either path is empty
/// - The source cannot be read or the destination cannot be written
pub fn execute(
    ctx: &ArborContext,
    src: &Path,
    dest: &Path,
    tokens: Vec<(String, String)>,
    literal: bool,
) -> Result<()> {
    let literal = literal || ctx.config.render.literal_tokens;
    let transformer = Transformer::from_pairs(tokens, literal)?;
    output::verbose(&format!(
        "Rendering with {} {} token(s)",
        transformer.len(),
        if literal { "literal" } else { "pattern" }
    ));

    let done = transform_file(src, dest, Some(transformer))?;
    let outcome = super::wait_for(&done)?;
    if let Outcome::Rejected(error) = &*outcome {
        return Err(error.clone()).context("Render failed");
    }

    output::action("Rendered", &dest.display().to_string());
    Ok(())
}
