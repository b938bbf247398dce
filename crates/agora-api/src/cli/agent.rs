//! `agora agent ...`: persona management and conversations.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::Confirm;
use serde_json::json;

use agora_types::channel::ChannelId;
use agora_types::config::UserKey;
use agora_types::conversation::{AskRequest, SimulationRequest};
use agora_types::notice::Notice;
use agora_types::persona::PersonaTemplate;

use super::output::{SpinnerProgress, format_latency, print_notice};
use crate::state::AppState;

/// List the user's personas in a table.
pub async fn list(state: &AppState, user: &UserKey, json: bool) -> Result<()> {
    let templates = state.persona_service.list(user).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&templates)?);
        return Ok(());
    }

    if templates.is_empty() {
        println!();
        println!(
            "  {} No agents configured. Load the built-in set with: {}",
            style("i").blue().bold(),
            style("agora agent default").yellow()
        );
        println!();
        return Ok(());
    }

    println!();
    println!("{}", persona_table(&templates));
    println!();
    let active = templates.iter().filter(|t| t.active).count();
    println!(
        "  {} agent{}, {} active",
        style(templates.len()).bold(),
        if templates.len() == 1 { "" } else { "s" },
        style(active).green()
    );
    println!();
    Ok(())
}

fn persona_table(templates: &[PersonaTemplate]) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Name").fg(Color::White),
        Cell::new("Status").fg(Color::White),
        Cell::new("Personality").fg(Color::White),
    ]);

    for template in templates {
        let status = if template.active {
            Cell::new("● Active").fg(Color::Green)
        } else {
            Cell::new("○ Inactive").fg(Color::Yellow)
        };
        table.add_row(vec![
            Cell::new(&template.name).fg(Color::Cyan),
            status,
            Cell::new(preview(&template.personality, 60)),
        ]);
    }
    table
}

fn preview(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let cut: String = flat.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{cut}...")
}

pub async fn create(
    state: &AppState,
    user: &UserKey,
    name: &str,
    personality: &str,
    avatar_url: Option<String>,
    json: bool,
) -> Result<()> {
    let created = state
        .persona_service
        .create(user, name, personality, avatar_url)
        .await?;
    let notice = Notice::success(
        "Agent Created",
        format!("Agent template '{}' created successfully", created.name),
    )
    .with_field("Avatar", &created.avatar_url);
    print_notice(&notice, json)
}

pub async fn delete(state: &AppState, user: &UserKey, name: &str, json: bool) -> Result<()> {
    let removed = state.persona_service.delete(user, name).await?;
    let notice = Notice::success(
        "Agent Deleted",
        format!("Agent template '{}' has been deleted", removed.name),
    );
    print_notice(&notice, json)
}

pub async fn delete_all(state: &AppState, user: &UserKey, force: bool, json: bool) -> Result<()> {
    if !force && !json {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Delete {} agent templates for this user?",
                style("all").red().bold()
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    let count = state.persona_service.delete_all(user).await?;
    let notice = Notice::success(
        "All Agents Deleted",
        format!("Successfully deleted {count} agent templates"),
    );
    print_notice(&notice, json)
}

pub async fn toggle(state: &AppState, user: &UserKey, name: &str, json: bool) -> Result<()> {
    let active = state.persona_service.toggle(user, name).await?;
    let status = if active { "activated" } else { "deactivated" };
    let notice = Notice::success("Agent Toggled", format!("Agent '{name}' has been {status}"));
    print_notice(&notice, json)
}

pub async fn load_defaults(state: &AppState, user: &UserKey, json: bool) -> Result<()> {
    let loaded = state.persona_service.load_defaults(user).await?;
    let notice = Notice::success(
        "Default Agents Loaded",
        format!(
            "Replaced {} templates with the built-in set",
            loaded.previous
        ),
    )
    .with_field("Agents", loaded.loaded.join(", "));
    print_notice(&notice, json)
}

/// Run a simulation with a spinner following its progress.
pub async fn simulation(
    state: &AppState,
    user: &UserKey,
    request: SimulationRequest,
    json: bool,
) -> Result<()> {
    let progress = SpinnerProgress::new(json);
    let stats = state
        .conversation_service
        .run_simulation(user, &request, &progress)
        .await;
    progress.finish();
    let stats = stats?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "channel_id": request.channel_id,
                "topic": request.topic_or_default(),
                "message_count": stats.message_count,
                "total_time_ms": stats.total_latency.as_millis() as u64,
                "average_time_ms": stats.average_latency().as_millis() as u64,
            }))?
        );
        return Ok(());
    }

    let notice = Notice::success(
        "Simulation Complete",
        format!("Conversation on '{}' finished", request.topic_or_default()),
    )
    .with_field("Total Time", format_latency(stats.total_latency))
    .with_field("Messages", stats.message_count.to_string())
    .with_field("Average Time", format_latency(stats.average_latency()));
    print_notice(&notice, false)
}

pub async fn ask(
    state: &AppState,
    user: &UserKey,
    persona: &str,
    question: &str,
    channel_id: ChannelId,
    json: bool,
) -> Result<()> {
    let request = AskRequest {
        persona: persona.to_string(),
        question: question.to_string(),
        channel_id,
    };
    let progress = SpinnerProgress::new(json);
    let outcome = state
        .conversation_service
        .ask(user, &request, &progress)
        .await;
    progress.finish();
    let outcome = outcome?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    let notice = Notice::success(outcome.display_name.clone(), outcome.content.clone())
        .with_field("Response Time", format_latency(outcome.latency));
    print_notice(&notice, false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_flattens_and_truncates() {
        assert_eq!(preview("short\n  text", 60), "short text");
        let long = "a".repeat(80);
        let shown = preview(&long, 10);
        assert_eq!(shown.chars().count(), 10);
        assert!(shown.ends_with("..."));
    }

    #[test]
    fn test_table_lists_every_template() {
        let mut inactive = PersonaTemplate::new("science", "Curious.", None);
        inactive.active = false;
        let templates = vec![PersonaTemplate::new("tech", "Loves gadgets.", None), inactive];
        let rendered = persona_table(&templates).to_string();
        assert!(rendered.contains("tech"));
        assert!(rendered.contains("Inactive"));
    }
}
