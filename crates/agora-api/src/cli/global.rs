//! `agora global ...`: per-user settings and channel maintenance.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use serde_json::json;

use agora_types::channel::ChannelId;
use agora_types::config::{GenerationSettings, UserKey};
use agora_types::llm::SamplingUpdate;
use agora_types::notice::Notice;

use super::output::print_notice;
use crate::state::AppState;

pub async fn cleanup(state: &AppState, channel: ChannelId, json: bool) -> Result<()> {
    let removed = state.conversation_service.cleanup(channel).await?;
    let notice = Notice::success(
        "Cleanup Complete",
        format!("Removed {removed} agent identities from channel {channel}"),
    );
    print_notice(&notice, json)
}

pub async fn set_system_prompt(
    state: &AppState,
    user: &UserKey,
    prompt: Option<String>,
    json: bool,
) -> Result<()> {
    let reset = prompt.as_deref().is_none_or(|p| p.trim().is_empty());
    let stored = state.settings_service.set_system_prompt(user, prompt).await?;
    let title = if reset {
        "System Prompt Reset"
    } else {
        "System Prompt Updated"
    };
    print_notice(&Notice::success(title, stored), json)
}

pub async fn set_parameters(
    state: &AppState,
    user: &UserKey,
    update: SamplingUpdate,
    json: bool,
) -> Result<()> {
    if update.is_empty() {
        let notice = Notice::info(
            "No Changes",
            "Pass at least one parameter, e.g. --temperature 0.7",
        );
        return print_notice(&notice, json);
    }

    let options = state.settings_service.set_parameters(user, update).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&options)?);
        return Ok(());
    }

    let notice = Notice::success("Parameters Updated", "New generation parameters")
        .with_field("temperature", options.temperature.to_string())
        .with_field("num_ctx", options.num_ctx.to_string())
        .with_field("top_k", options.top_k.to_string())
        .with_field("top_p", options.top_p.to_string())
        .with_field("repeat_penalty", options.repeat_penalty.to_string())
        .with_field("num_predict", options.num_predict.to_string());
    print_notice(&notice, false)
}

/// Show the model, prompt and parameters, plus the models on offer.
pub async fn list_parameters(state: &AppState, user: &UserKey, json: bool) -> Result<()> {
    let settings = state.settings_service.settings(user).await?;
    let models = state.settings_service.refresh_models().await?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "settings": settings,
                "available_models": models,
            }))?
        );
        return Ok(());
    }

    println!();
    println!("{}", settings_table(&settings));
    println!();
    println!(
        "  {}  {}",
        style("Available models:").bold(),
        style(models.join(", ")).dim()
    );
    println!();
    Ok(())
}

fn settings_table(settings: &GenerationSettings) -> Table {
    let params = &settings.parameters;
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Setting").fg(Color::White),
        Cell::new("Value").fg(Color::White),
    ]);

    let rows = [
        ("model", settings.model.clone()),
        ("system_prompt", settings.system_prompt.clone()),
        ("temperature", params.temperature.to_string()),
        ("num_ctx", params.num_ctx.to_string()),
        ("top_k", params.top_k.to_string()),
        ("top_p", params.top_p.to_string()),
        ("repeat_penalty", params.repeat_penalty.to_string()),
        ("num_predict", params.num_predict.to_string()),
    ];
    for (name, value) in rows {
        table.add_row(vec![Cell::new(name).fg(Color::Cyan), Cell::new(value)]);
    }
    table
}

pub async fn set_model(state: &AppState, user: &UserKey, name: &str, json: bool) -> Result<()> {
    let model = state.settings_service.set_model(user, name).await?;
    let notice = Notice::success("Model Updated", format!("All agents now use '{model}'"));
    print_notice(&notice, json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_table_shows_defaults() {
        let rendered = settings_table(&GenerationSettings::default()).to_string();
        assert!(rendered.contains("llama3.2"));
        assert!(rendered.contains("num_predict"));
        assert!(rendered.contains("150"));
    }
}
