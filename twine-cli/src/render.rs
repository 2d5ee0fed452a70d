use colored::*;
use twine_protocol::message::Message;
use twine_timeline::{ActiveList, Timeline, VisibleTimelineList};

/// Renders every timeline of the session, at most `limit` messages each.
pub fn render_session(list: &VisibleTimelineList, limit: usize) -> String {
    let mut out = String::new();
    let active = list.active_index();

    for (index, timeline) in list.timelines().iter().enumerate() {
        let unread = list.get_unread_count(index).unwrap_or(0);
        let marker = if Some(index) == active { "▶" } else { " " };
        let name = if list.is_visible(index) {
            timeline.name().bold().to_string()
        } else {
            timeline.name().dimmed().to_string()
        };
        out.push_str(&format!("{} {} ({} messages", marker, name, timeline.len()));
        if unread > 0 {
            let unread = format!("{} unread", unread);
            out.push_str(&format!(", {}", unread.yellow().bold()));
        }
        out.push_str(")\n");
        render_messages(&mut out, timeline, limit);
    }

    if out.is_empty() {
        out.push_str(&format!("{}\n", "no timelines".red()));
    }
    out
}

fn render_messages(out: &mut String, timeline: &Timeline, limit: usize) {
    for message in timeline.iter().take(limit) {
        out.push_str(&format!("    {}\n", render_message(message)));
    }
    if timeline.len() > limit {
        let more = format!("… {} more", timeline.len() - limit);
        out.push_str(&format!("    {}\n", more.dimmed()));
    }
}

fn render_message(message: &Message) -> String {
    let mut header = format!(
        "{} {}",
        message.created_at().format("%Y-%m-%d %H:%M"),
        format!("@{}", message.author().screen_name).cyan()
    );
    if let Some(recipient) = message.recipient() {
        header.push_str(&format!(" → @{}", recipient.screen_name));
    }
    if message.is_retweet() {
        header.push_str(&format!(" {}", "RT".green()));
    }
    if message.is_favorite() {
        header.push_str(&format!(" {}", "★".yellow()));
    }
    format!("{}  {}", header, message.text().replace('\n', " "))
}
