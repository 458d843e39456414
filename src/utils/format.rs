/// Groups the integer digits of `digits` with commas: `5000000` -> `5,000,000`.
fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Formats a dollar amount with thousands separators and two decimals.
pub fn currency(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let sign = if value < 0.0 { "-" } else { "" };
    format!("${}{}.{}", sign, group_thousands(int_part), frac_part)
}

/// `5e9` -> `$5.0B`
pub fn billions(value: f64) -> String {
    format!("${:.1}B", value / 1e9)
}

/// `3e9` -> `$3000.0M`
pub fn millions(value: f64) -> String {
    format!("${:.1}M", value / 1e6)
}

/// Output file name for a company's deck: lower-cased, spaces to underscores.
pub fn deck_file_name(company_name: &str) -> String {
    format!(
        "pitch_deck_{}.pptx",
        company_name.to_lowercase().replace(' ', "_")
    )
}
