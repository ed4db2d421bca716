use crate::error::ProcessingError;

/// Parse a comma-separated list of 0-based page indices, e.g. `"3, 0,1"`.
///
/// Whitespace and empty tokens are ignored. Order and duplicates are kept.
pub fn parse_index_list(name: &'static str, raw: &str) -> Result<Vec<usize>, ProcessingError> {
    raw.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| {
            token.parse::<usize>().map_err(|_| {
                ProcessingError::invalid(
                    name,
                    format!("'{}' is not a non-negative page index", token),
                )
            })
        })
        .collect()
}
