use standup_core::{Timezone, DEFAULT_TIMEZONE};

pub fn run() -> String {
    Timezone::ALL
        .iter()
        .map(|timezone| {
            let marker = if *timezone == DEFAULT_TIMEZONE { " (default)" } else { "" };
            format!("{:<20} {}{marker}", timezone.as_str(), timezone.label())
        })
        .collect::<Vec<_>>()
        .join("\n")
}
