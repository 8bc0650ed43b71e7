//! Artifact naming shared by the sweep (producer) and the comparator (consumer).
//!
//! Both sides must format epsilon identically, otherwise the comparator looks
//! for files the sweep never wrote.

/// Extension of every artifact the tool writes.
pub const ARTIFACT_EXTENSION: &str = "csr";

/// Format epsilon for filenames and the CSV report.
///
/// Uses the shortest representation that round-trips, keeping one decimal
/// place for whole numbers (`1.0`, not `1`).
pub fn format_epsilon(epsilon: f64) -> String {
    if epsilon.is_finite() && epsilon.fract() == 0.0 {
        format!("{epsilon:.1}")
    } else {
        format!("{epsilon}")
    }
}

/// Format epsilon as passed on the tool's command line (fixed six decimals).
pub fn format_epsilon_arg(epsilon: f64) -> String {
    format!("{epsilon:.6}")
}

/// Strip everything from the first `.` of the file name component.
///
/// Leading directories are kept, so `data/wiki1.csr` becomes `data/wiki1`.
/// A name without a dot is returned unchanged.
pub fn dataset_stem(input: &str) -> &str {
    let name_start = input
        .rfind(|c| c == '/' || c == '\\')
        .map_or(0, |idx| idx + 1);
    match input[name_start..].find('.') {
        Some(dot) => &input[..name_start + dot],
        None => input,
    }
}

/// Artifact filename `<datasetStem>.<mode>.<epsilon>.<k>.csr`.
///
/// `input` may be either the dataset file (`wiki1.csr`) or an already
/// stripped stem (`wiki1`); both yield the same name.
pub fn derive_filename(input: &str, mode_tag: &str, epsilon: f64, k: u32) -> String {
    format!(
        "{}.{}.{}.{}.{}",
        dataset_stem(input),
        mode_tag,
        format_epsilon(epsilon),
        k,
        ARTIFACT_EXTENSION
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_filename() {
        assert_eq!(derive_filename("wiki1.csr", "ij", 0.3, 10), "wiki1.ij.0.3.10.csr");
        assert_eq!(derive_filename("wiki2.csr", "iidx", 0.9, 100), "wiki2.iidx.0.9.100.csr");
    }

    #[test]
    fn test_stem_and_file_agree() {
        for eps in [0.3, 0.4, 0.5, 0.7, 0.9] {
            assert_eq!(
                derive_filename("wiki1.csr", "ij", eps, 50),
                derive_filename("wiki1", "ij", eps, 50)
            );
        }
    }

    #[test]
    fn test_format_epsilon() {
        assert_eq!(format_epsilon(0.3), "0.3");
        assert_eq!(format_epsilon(0.75), "0.75");
        assert_eq!(format_epsilon(1.0), "1.0");
        assert_eq!(format_epsilon(0.0), "0.0");
    }

    #[test]
    fn test_format_epsilon_arg() {
        assert_eq!(format_epsilon_arg(0.3), "0.300000");
        assert_eq!(format_epsilon_arg(1.0), "1.000000");
    }

    #[test]
    fn test_dataset_stem() {
        assert_eq!(dataset_stem("wiki1.csr"), "wiki1");
        assert_eq!(dataset_stem("wiki1"), "wiki1");
        assert_eq!(dataset_stem("wiki1.tar.csr"), "wiki1");
        assert_eq!(dataset_stem("data/wiki1.csr"), "data/wiki1");
        assert_eq!(dataset_stem("../v1.2/wiki1.csr"), "../v1.2/wiki1");
    }
}
