use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;
use switchbook_server::ServerConfig;

use crate::CliError;

fn mask_value(s: &str) -> String {
    if s.chars().count() <= 2 {
        "****".to_string()
    } else {
        format!("{}****", s.chars().take(2).collect::<String>())
    }
}

/// Show every setting and where its value came from.
pub(crate) fn run_config_show() -> Result<(), CliError> {
    let (config, entries) = ServerConfig::load_with_sources()?;

    log::info!(
        "{}",
        "Switchbook Configuration".if_supports_color(Stdout, |t| t.bold()),
    );
    crate::log_blank();

    match switchbook_server::config::config_path() {
        Some(p) if p.exists() => {
            log::info!(
                "  Config file: {} {}",
                p.display().if_supports_color(Stdout, |t| t.cyan()),
                "(exists)".if_supports_color(Stdout, |t| t.green()),
            );
        }
        Some(p) => {
            log::info!(
                "  Config file: {} {}",
                p.display().if_supports_color(Stdout, |t| t.cyan()),
                "(not found)".if_supports_color(Stdout, |t| t.dimmed()),
            );
        }
        None => {
            log::info!(
                "  Config file: {}",
                "could not determine path".if_supports_color(Stdout, |t| t.red()),
            );
        }
    }
    crate::log_blank();

    for entry in &entries {
        let source = format!("({})", entry.source);
        let name = format!("{}:", entry.key);
        match &entry.value {
            Some(v) => {
                let shown = if entry.secret { mask_value(v) } else { v.clone() };
                log::info!(
                    "  {} {} {}",
                    name.if_supports_color(Stdout, |t| t.cyan()),
                    shown,
                    source.if_supports_color(Stdout, |t| t.dimmed()),
                );
            }
            None => {
                log::info!(
                    "  {} {} {}",
                    name.if_supports_color(Stdout, |t| t.cyan()),
                    "not set".if_supports_color(Stdout, |t| t.yellow()),
                    source.if_supports_color(Stdout, |t| t.dimmed()),
                );
            }
        }
    }

    if config.smtp.is_none() {
        crate::log_blank();
        log::info!(
            "  {}",
            "SMTP disabled: emails are written to the log".if_supports_color(Stdout, |t| t.dimmed()),
        );
    }
    Ok(())
}

/// Print the config file path.
pub(crate) fn run_config_path() -> Result<(), CliError> {
    let path = switchbook_server::config::config_path()
        .ok_or_else(|| CliError::other("Could not determine config directory"))?;
    log::info!("{}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_all_but_two_characters() {
        assert_eq!(mask_value("hunter22"), "hu****");
        assert_eq!(mask_value("ab"), "****");
        assert_eq!(mask_value(""), "****");
    }

    #[test]
    fn masking_respects_char_boundaries() {
        assert_eq!(mask_value("ü€xyz"), "ü€****");
    }
}
