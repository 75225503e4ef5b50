//! Small presentation helpers shared by every client surface.

use time::OffsetDateTime;

/// Up to two uppercase initials from a display name ("Ada Lovelace" → "AL").
#[must_use]
pub fn initials(name: &str) -> String {
    let letters: String = name
        .split_whitespace()
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .take(2)
        .collect();
    if letters.is_empty() { "U".to_owned() } else { letters }
}

/// Split a list into the avatars to draw and the `+N` overflow count.
#[must_use]
pub fn avatar_stack<T>(items: &[T], max_visible: usize) -> (&[T], usize) {
    let shown = items.len().min(max_visible);
    (&items[..shown], items.len() - shown)
}

/// "Today", "Yesterday", "N days ago" within a week, otherwise the calendar date.
#[must_use]
pub fn updated_label(now: OffsetDateTime, then: OffsetDateTime) -> String {
    let days = (now - then).whole_days();
    match days {
        i64::MIN..=0 => "Today".to_owned(),
        1 => "Yesterday".to_owned(),
        2..=6 => format!("{days} days ago"),
        _ => {
            let date = then.date();
            format!("{}-{:02}-{:02}", date.year(), u8::from(date.month()), date.day())
        }
    }
}

#[must_use]
pub fn member_count_label(count: i64) -> String {
    if count == 1 { "1 member".to_owned() } else { format!("{count} members") }
}
