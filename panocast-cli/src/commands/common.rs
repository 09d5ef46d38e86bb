//! Common utilities shared across CLI commands.

/// Flatten repeated and comma-separated region codes.
///
/// `["09 ", "07,15", ""]` becomes `["09", "07", "15"]`. Returns `None` when
/// no codes remain, meaning "all regions".
pub fn parse_regions(values: &[String]) -> Option<Vec<String>> {
    let regions: Vec<String> = values
        .iter()
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(str::to_string)
        .collect();
    (!regions.is_empty()).then_some(regions)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_space_and_comma_separated() {
        assert_eq!(
            parse_regions(&strings(&["09", "07,15"])),
            Some(strings(&["09", "07", "15"]))
        );
    }

    #[test]
    fn test_whitespace_and_empty_entries() {
        assert_eq!(
            parse_regions(&strings(&[" 09 , ", ",13"])),
            Some(strings(&["09", "13"]))
        );
    }

    #[test]
    fn test_no_regions_means_all() {
        assert_eq!(parse_regions(&[]), None);
        assert_eq!(parse_regions(&strings(&[",", " "])), None);
    }
}
