//! Rendering of chat events into htmx out-of-band fragments.
//!
//! The page keeps two targets: `#chat_room` (message log, appended to) and
//! `#members` (roster, replaced). Every fragment names its own target.

use crate::ws::registry::Identity;

/// A logical event to be turned into a display payload.
#[derive(Debug, Clone, Copy)]
pub enum ChatEvent<'a> {
    Joined(&'a Identity),
    Message { sender: &'a Identity, message: &'a str },
    Left(&'a Identity),
    Roster(&'a [Identity]),
    Welcome(&'a Identity),
}

/// Turns events into payloads. Must be pure and infallible.
pub trait Renderer: Send + Sync {
    fn render(&self, event: ChatEvent<'_>) -> String;
}

/// Escape HTML special characters.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlRenderer;

impl HtmlRenderer {
    fn append(line: &str, color: Option<&str>) -> String {
        let style = color
            .map(|c| format!(r#" style="color: {c}""#))
            .unwrap_or_default();
        format!(r#"<div id="chat_room" hx-swap-oob="beforeend"><p{style}>{line}</p></div>"#)
    }
}

impl Renderer for HtmlRenderer {
    fn render(&self, event: ChatEvent<'_>) -> String {
        match event {
            ChatEvent::Joined(who) => {
                Self::append(&format!("User {} joined", html_escape(&who.name)), None)
            }
            ChatEvent::Message { sender, message } => Self::append(
                &format!(
                    "{} ({}): {}",
                    html_escape(&sender.name),
                    sender.id,
                    html_escape(message)
                ),
                Some("blue"),
            ),
            ChatEvent::Left(who) => {
                Self::append(&format!("User {} left", html_escape(&who.name)), Some("red"))
            }
            ChatEvent::Roster(members) => {
                let items: String = members
                    .iter()
                    .map(|m| format!("<li>{} ({})</li>", html_escape(&m.name), m.id))
                    .collect();
                format!(
                    r#"<div id="members" hx-swap-oob="innerHTML"><p style="color: green">Online: {}</p><ul>{items}</ul></div>"#,
                    members.len()
                )
            }
            ChatEvent::Welcome(who) => Self::append(
                &format!(
                    "Welcome {}! You are user {}.",
                    html_escape(&who.name),
                    who.id
                ),
                None,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Identity {
        Identity { id: 0, name: "alice".into() }
    }

    #[test]
    fn test_chat_line_is_blue_and_tagged() {
        let who = alice();
        let html = HtmlRenderer.render(ChatEvent::Message { sender: &who, message: "hi" });
        assert!(html.contains("alice (0): hi"));
        assert!(html.contains("color: blue"));
        assert!(html.contains(r#"hx-swap-oob="beforeend""#));
    }

    #[test]
    fn test_left_is_red() {
        let html = HtmlRenderer.render(ChatEvent::Left(&alice()));
        assert!(html.contains("User alice left"));
        assert!(html.contains("color: red"));
    }

    #[test]
    fn test_roster_lists_members_in_green() {
        let members = vec![alice(), Identity { id: 1, name: "bob".into() }];
        let html = HtmlRenderer.render(ChatEvent::Roster(&members));
        assert!(html.contains(r#"id="members""#));
        assert!(html.contains("color: green"));
        assert!(html.contains("Online: 2"));
        assert!(html.contains("<li>alice (0)</li><li>bob (1)</li>"));
    }

    #[test]
    fn test_client_text_is_escaped() {
        let who = Identity { id: 3, name: "<b>eve</b>".into() };
        let html = HtmlRenderer.render(ChatEvent::Message {
            sender: &who,
            message: "<script>alert('x')</script>",
        });
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;b&gt;eve&lt;/b&gt; (3): &lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;"));
    }
}
