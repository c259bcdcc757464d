use crate::records::Record;

const NAME_FIELD: &str = "Name";
const ADMISSION_FIELD: &str = "Admission_No";
const MISSING: &str = "N/A";
const SEPARATOR_WIDTH: usize = 20;

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

/// Render a record as a Markdown reply. Name and admission number come first,
/// followed by every other non-empty field in header order.
pub fn format_result(record: &Record) -> String {
    let name = present(record.get(NAME_FIELD)).unwrap_or(MISSING);
    let admission = present(record.get(ADMISSION_FIELD))
        .or_else(|| present(record.first_value()))
        .unwrap_or(MISSING);

    let mut message = String::from("📊 **Student Results**\n\n");
    message.push_str(&format!("👤 **Name**: {name}\n"));
    message.push_str(&format!("🎫 **Admission**: {admission}\n"));
    message.push_str(&"─".repeat(SEPARATOR_WIDTH));
    message.push('\n');

    for (key, value) in record.iter() {
        if key.is_empty() || value.is_empty() || key == NAME_FIELD || key == ADMISSION_FIELD {
            continue;
        }
        message.push_str(&format!("📚 **{key}**: {value}\n"));
    }

    message
}
