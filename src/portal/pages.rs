use axum::extract::State;
use axum::response::{Html, Redirect};

use super::SharedDirectory;

const STYLE: &str = "body{font-family:sans-serif;max-width:40em;margin:2em auto}";

pub(super) async fn root() -> Redirect {
    Redirect::to("/wall-of-fame")
}

pub(super) async fn overview(State(directory): State<SharedDirectory>) -> Html<String> {
    let count = directory.guild_count();
    let body = format!(
        "<h1>Wall of Fame</h1>\n\
         <p>Connected to <strong>{}</strong> servers.</p>\n\
         <p><a href=\"/wall-of-fame/list\">See the list</a></p>",
        count
    );
    Html(page("Wall of Fame", &body))
}

pub(super) async fn server_list(State(directory): State<SharedDirectory>) -> Html<String> {
    let items: String = directory
        .guilds()
        .iter()
        .map(|guild| format!("<li>{}</li>\n", escape_html(&guild.name)))
        .collect();
    let body = format!(
        "<h1>Servers</h1>\n<ul>\n{}</ul>\n<p><a href=\"/wall-of-fame\">Back</a></p>",
        items
    );
    Html(page("Wall of Fame - servers", &body))
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{}</title>\
         <style>{}</style></head>\n<body>\n{}\n</body>\n</html>\n",
        title, STYLE, body
    )
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("plain"), "plain");
        assert_eq!(escape_html("a\"b'c"), "a&quot;b&#39;c");
    }
}
