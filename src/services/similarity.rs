/// Levenshtein distance: the minimum number of single-character insertions,
/// deletions, and substitutions to turn `a` into `b`. Operates on chars, so
/// multi-byte letters count as one edit. Case folding is the caller's job.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let m = a_chars.len();
    let n = b_chars.len();

    if m == 0 {
        return n;
    }
    if n == 0 {
        return m;
    }

    let mut prev: Vec<usize> = (0..=n).collect();
    let mut curr: Vec<usize> = vec![0; n + 1];

    for i in 1..=m {
        curr[0] = i;
        for j in 1..=n {
            let cost = if a_chars[i - 1] == b_chars[j - 1] {
                0
            } else {
                1
            };
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        assert_eq!(edit_distance("moonlight", "moonlight"), 0);
        assert_eq!(edit_distance("", ""), 0);
    }

    #[test]
    fn test_empty_side() {
        assert_eq!(edit_distance("", "dunkirk"), 7);
        assert_eq!(edit_distance("dunkirk", ""), 7);
    }

    #[test]
    fn test_symmetry() {
        assert_eq!(
            edit_distance("thelma & louise", "thelma and louise"),
            edit_distance("thelma and louise", "thelma & louise")
        );
    }

    #[test]
    fn test_known_distances() {
        assert_eq!(edit_distance("kitten", "sitting"), 3);
        assert_eq!(edit_distance("moonlight", "moonlite"), 2);
    }

    #[test]
    fn test_multibyte_chars_count_once() {
        assert_eq!(edit_distance("fack ju göhte", "fack ju gohte"), 1);
    }
}
