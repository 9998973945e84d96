// Tiny markdown helpers for messages shown in Mattermost.

pub fn hyperlink(text: &str, url: &str) -> String {
    format!("[{}]({})", text, url)
}

/// Renders a bullet list, one item per line.
pub fn bullet_list<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .map(|item| format!("- {}", item.as_ref()))
        .collect::<Vec<_>>()
        .join("\n")
}
