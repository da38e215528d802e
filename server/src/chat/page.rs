use axum::{extract::State, response::Html};

use crate::chat::render::html_escape;
use crate::state::AppState;

/// GET / — The chat page. Forms post over the socket via the htmx ws extension
/// and server fragments are swapped out-of-band into `#chat_room` / `#members`.
pub async fn chat_page(State(state): State<AppState>) -> Html<String> {
    Html(render_page(&state.page_title))
}

pub fn render_page(title: &str) -> String {
    let title = html_escape(title);
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <script src="https://unpkg.com/htmx.org@2.0.4"></script>
    <script src="https://unpkg.com/htmx-ext-ws@2.0.2/ws.js"></script>
    <style>
        body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; margin: 2rem; }}
        main {{ display: flex; gap: 2rem; }}
        #chat_room {{ flex: 3; min-height: 20rem; border: 1px solid #ccc; padding: 0.5rem; overflow-y: auto; }}
        #members {{ flex: 1; border: 1px solid #ccc; padding: 0.5rem; }}
    </style>
</head>
<body>
    <h1>{title}</h1>
    <div hx-ext="ws" ws-connect="/ws">
        <form id="join" ws-send>
            <input type="hidden" name="type" value="chat_new_join">
            <input name="name" placeholder="Display name" required>
            <button type="submit">Join</button>
        </form>
        <main>
            <div id="chat_room"></div>
            <div id="members"></div>
        </main>
        <form id="send" ws-send hx-on::ws-after-send="this.reset()">
            <input type="hidden" name="type" value="chat_message">
            <input name="message" placeholder="Message" autocomplete="off" required>
            <button type="submit">Send</button>
        </form>
    </div>
</body>
</html>"#
    )
}
