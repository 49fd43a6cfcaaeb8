//! Plain-text rendering of the player for the terminal front-end

use crate::input::{key_name, Action};
use crate::sequence::SequencePlayer;

const DEFAULT_TITLE: &str = "Narrator";

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

/// Key hint line, e.g. `[Space] skip  [Right] next`
pub fn key_hints(player: &SequencePlayer) -> String {
    let keys = &player.config().keys;
    Action::ALL
        .iter()
        .map(|&action| format!("[{}] {}", key_name(keys.key_for(action)), action))
        .collect::<Vec<_>>()
        .join("  ")
}

/// Render the current step as a block of text
pub fn render_frame(player: &SequencePlayer) -> String {
    let sequence = player.sequence();
    let title = sequence.title().unwrap_or(DEFAULT_TITLE);
    let mut lines = Vec::new();

    if player.is_finished() {
        lines.push(format!("{} [done]", title));
        return lines.join("\n");
    }

    match player.position() {
        Some(index) => lines.push(format!("{} [{}/{}]", title, index + 1, sequence.len())),
        None => lines.push(title.to_string()),
    }

    if let Some(step) = player.current_step() {
        for (name, value) in step.fields() {
            lines.push(format!("  {}: {}", name, value));
        }
    }

    lines.push(format!("> {}", player.revealed_text()));
    lines.push(format!(
        "audio: {}  next: {}  auto-play: {}",
        if player.is_audio_playing() {
            "playing"
        } else {
            "stopped"
        },
        yes_no(player.can_go_next()),
        if player.auto_play() { "on" } else { "off" },
    ));
    lines.push(key_hints(player));
    lines.join("\n")
}
