/// Length of the longest common subsequence of two strings, by characters.
fn lcs_length(s1: &str, s2: &str) -> usize {
    let chars1: Vec<char> = s1.chars().collect();
    let chars2: Vec<char> = s2.chars().collect();
    let len1 = chars1.len();
    let len2 = chars2.len();

    let mut matrix = vec![vec![0usize; len2 + 1]; len1 + 1];
    for i in 1..=len1 {
        for j in 1..=len2 {
            matrix[i][j] = if chars1[i - 1] == chars2[j - 1] {
                matrix[i - 1][j - 1] + 1
            } else {
                matrix[i - 1][j].max(matrix[i][j - 1])
            };
        }
    }
    matrix[len1][len2]
}

/// Edit distance counting only insertions and deletions.
pub fn indel_distance(s1: &str, s2: &str) -> usize {
    s1.chars().count() + s2.chars().count() - 2 * lcs_length(s1, s2)
}

/// Similarity score in 0..=100: `100 * (1 - indel / (len1 + len2))`, rounded.
///
/// An empty input scores 0.
pub fn ratio(s1: &str, s2: &str) -> u8 {
    let total = s1.chars().count() + s2.chars().count();
    if s1.is_empty() || s2.is_empty() {
        return 0;
    }
    let similarity = 1.0 - indel_distance(s1, s2) as f64 / total as f64;
    (similarity * 100.0).round() as u8
}
