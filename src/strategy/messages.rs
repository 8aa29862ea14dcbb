//! Outbound channel message templates
//!
//! Messages are sent with HTML parse mode.

use super::ScoreboardSnapshot;
use crate::domain::Outcome;

/// A message the lifecycle wants posted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Entry call for a new signal
    Entry { color: Outcome },
    /// First attempt missed, going to the retry
    Retry,
    /// Win or push, with the streak after counting it
    Streak { streak: u32 },
    Loss,
    Scoreboard(ScoreboardSnapshot),
    /// "Analyzing" placeholder shown while idle
    Analyzing,
}

impl Notice {
    pub fn render(&self) -> String {
        match self {
            Notice::Entry { color } => entry_text(*color),
            Notice::Retry => "➡️ Vamos para o 1ª gale".to_string(),
            Notice::Streak { streak } => format!(
                "🔥 Estamos a {} vitória(s) seguida(s)!\nPAGA BLACK G1",
                streak
            ),
            Notice::Loss => "🟥 <b>LOSS 🟥</b>".to_string(),
            Notice::Scoreboard(snapshot) => snapshot.to_string(),
            Notice::Analyzing => "🔍 <b>ANALISANDO...</b> 🔍".to_string(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Notice::Entry { .. } => "entry",
            Notice::Retry => "retry",
            Notice::Streak { .. } => "streak",
            Notice::Loss => "loss",
            Notice::Scoreboard(_) => "scoreboard",
            Notice::Analyzing => "analyzing",
        }
    }
}

fn entry_text(color: Outcome) -> String {
    let headline = match color {
        Outcome::Banker => "𝗩𝗘𝗥𝗠𝗘𝗟𝗛𝗢 🔴",
        _ => "𝗔𝗭𝗨𝗟 🔵",
    };

    format!(
        "{}\n\
         𝗖𝗢𝗕𝗥𝗘 𝗘𝗠𝗣𝗔𝗧𝗘 🟡\n\n\
         𝗦𝗢𝗠𝗘𝗡𝗧𝗘 𝗚𝗔𝗟𝗘 1\n\n\
         𝗝𝗢𝗚𝗨𝗘 𝗖𝗢𝗠 𝗥𝗘𝗦𝗣𝗢𝗡𝗦𝗔𝗕𝗟𝗜𝗗𝗔𝗗𝗘",
        headline
    )
}

/// Fatal error report
pub fn error_text(error: &str) -> String {
    format!("⚠️ Error: {}", error)
}
