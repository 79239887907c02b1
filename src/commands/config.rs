use crate::ArborContext;
use crate::output;
use anyhow::Result;
use colored::Colorize;

/// Execute config command to get/set configuration values
///
/// # Errors
///
/// Returns an error if:
/// - Failed to set the configuration value
/// - Failed to save configuration
pub fn execute(
    ctx: &mut ArborContext,
    key: Option<&str>,
    value: Option<&str>,
    list: bool,
) -> Result<()> {
    let Some(key) = key.filter(|_| !list) else {
        show_all_config(ctx);
        return Ok(());
    };

    if let Some(val) = value {
        ctx.config.set(key, val)?;
        ctx.config.save(&ctx.config_path)?;
        output::success(&format!("Set {key} = {val}"));
    } else if let Some(val) = ctx.config.get(key) {
        println!("{val}");
    } else {
        output::warning(&format!("Unknown configuration key '{key}'"));
    }

    Ok(())
}

/// Show all configuration values
fn show_all_config(ctx: &ArborContext) {
    println!("{}", "[performance]".bold());
    println!(
        "  parallel_threads = {}",
        ctx.config.performance.parallel_threads
    );

    println!("\n{}", "[walk]".bold());
    println!(
        "  backend = {}",
        ctx.config.get("walk.backend").unwrap_or_default()
    );

    println!("\n{}", "[render]".bold());
    println!("  literal_tokens = {}", ctx.config.render.literal_tokens);
}
