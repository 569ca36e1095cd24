/// Trim whitespace + strip outer quotes if present.
pub fn clean_str(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        trimmed[1..trimmed.len() - 1].trim().to_string()
    } else {
        trimmed.to_string()
    }
}

/// Cleaned cell text, or `None` when nothing is left after cleaning.
pub fn non_empty(raw: &str) -> Option<String> {
    let cleaned = clean_str(raw);
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Number of literal commas in `line`. Quoting is not taken into account.
pub fn comma_count(line: &str) -> usize {
    line.bytes().filter(|b| *b == b',').count()
}

/// Raw export name for one age stratum, e.g.
/// `"Prevalence of overweight (including obesity) among 11-year-olds.csv"`.
pub fn raw_file_name(prefix: &str, age: u32) -> String {
    format!("{} {}-year-olds.csv", prefix, age)
}
