//! Classification of results-sheet column headers.

const SKIPPED_PREFIXES: [&str; 4] = ["dup", "blank", "bs", "low"];

/// What a header cell in the results sheet represents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderKind {
    /// Starts a new batch; following sample columns belong to it.
    BatchMarker { code: String },
    /// A `BS` header without a batch number.
    MalformedBatch,
    /// A sample column.
    Sample { sample_id: String, display: String },
    /// Duplicates, blanks, low standards and labels.
    Skip,
}

/// Classify one header cell.
pub fn classify_header(raw: &str) -> HeaderKind {
    let text = raw.trim();
    if text.is_empty() {
        return HeaderKind::Skip;
    }

    let compact = compact(text);
    if starts_with_ignore_case(&compact, "bs") {
        return match first_digit_run(&compact[2..]) {
            Some(code) => HeaderKind::BatchMarker { code },
            None => HeaderKind::MalformedBatch,
        };
    }
    if should_skip_header(text) {
        return HeaderKind::Skip;
    }

    HeaderKind::Sample {
        sample_id: normalize_sample_header(text),
        display: format_column_header(text),
    }
}

fn should_skip_header(text: &str) -> bool {
    let lowered = text.to_ascii_lowercase();
    SKIPPED_PREFIXES
        .iter()
        .any(|prefix| lowered.starts_with(prefix))
        || !text.chars().any(|c| c.is_ascii_digit())
}

/// Normalize a sample header to its id: `"14956.0"` and `"14956 "` become
/// `"14956"`, `"14956-2 rerun"` becomes `"14956-2"`.
pub fn normalize_sample_header(raw: &str) -> String {
    let compact = compact(raw.trim());
    let integer_len = leading_digits(&compact);
    if integer_len == 0 {
        return compact;
    }
    let rest = &compact[integer_len..];
    let suffix_len = match rest.strip_prefix('-') {
        Some(suffix) if leading_digits(suffix) > 0 => 1 + leading_digits(suffix),
        _ => 0,
    };
    compact[..integer_len + suffix_len].to_string()
}

/// Header text as shown to users.
pub fn format_column_header(raw: &str) -> String {
    let text = raw.trim();
    match text.strip_suffix(".0") {
        Some(integer) if !integer.is_empty() && integer.chars().all(|c| c.is_ascii_digit()) => {
            integer.to_string()
        }
        _ => text.to_string(),
    }
}

/// Strip a numeric replicate suffix: `14956-1` → `14956`.
pub fn base_sample_id(sample_id: &str) -> &str {
    match sample_id.split_once('-') {
        Some((prefix, suffix)) if is_digits(prefix) && is_digits(suffix) => prefix,
        _ => sample_id,
    }
}

/// Extract a batch number from a batch-sheet token.
///
/// Tries a `BS…<digits>` pattern, then a numeric value, then any digits.
pub fn sanitize_batch_token(token: &str) -> Option<String> {
    let token = token.trim();
    if let Some(position) = token.to_ascii_lowercase().find("bs")
        && let Some(code) = first_digit_run(&token[position + 2..])
    {
        return Some(code);
    }
    if let Ok(number) = token.replace(',', "").parse::<f64>()
        && number.is_finite()
    {
        return Some(if number.fract() == 0.0 {
            format!("{}", number as i64)
        } else {
            number.to_string()
        });
    }
    let digits: String = token.chars().filter(char::is_ascii_digit).collect();
    (!digits.is_empty()).then_some(digits)
}

fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    text.len() >= prefix.len()
        && text.is_char_boundary(prefix.len())
        && text[..prefix.len()].eq_ignore_ascii_case(prefix)
}

/// First run of ASCII digits in `text`.
fn first_digit_run(text: &str) -> Option<String> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let run = &text[start..];
    Some(run[..leading_digits(run)].to_string())
}

fn leading_digits(text: &str) -> usize {
    text.bytes().take_while(u8::is_ascii_digit).count()
}

fn compact(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

fn is_digits(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_ascii_digit())
}
