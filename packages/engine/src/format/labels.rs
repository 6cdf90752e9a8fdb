use std::collections::HashSet;
use std::sync::Arc;

/// Custom per-event problem labeling hook. Receives a zero-based index.
pub type ProblemLabeler = Arc<dyn Fn(usize) -> Result<String, String> + Send + Sync>;

/// `1`, `2`, `3`, ...
pub fn numeric(index: usize) -> String {
    (index + 1).to_string()
}

/// `A` ... `Z`, `AA`, `AB`, ...
pub fn alphabetic(index: usize) -> String {
    let mut n = index + 1;
    let mut label = Vec::new();
    while n > 0 {
        n -= 1;
        label.push(b'A' + (n % 26) as u8);
        n /= 26;
    }
    label.reverse();
    String::from_utf8(label).unwrap_or_default()
}

/// Run the labeler over `count` indices and require non-empty, distinct labels.
pub fn validate(labeler: &ProblemLabeler, count: usize) -> Result<Vec<String>, String> {
    let mut seen = HashSet::with_capacity(count);
    let mut labels = Vec::with_capacity(count);
    for index in 0..count {
        let label = labeler(index).map_err(|e| format!("label for problem {index} failed: {e}"))?;
        if label.is_empty() {
            return Err(format!("label for problem {index} is empty"));
        }
        if !seen.insert(label.clone()) {
            return Err(format!("label '{label}' is used more than once"));
        }
        labels.push(label);
    }
    Ok(labels)
}
