//! Mode change parsing.

use super::types::{ModeChange, Sign};

/// Result of splitting a MODE flag string against its arguments.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ModeChanges {
    /// Changes in the order they appeared.
    pub changes: Vec<ModeChange>,
    /// Letters that needed an argument but ran out of them.
    pub missing: Vec<char>,
    /// Arguments left over after every letter was processed.
    pub unused: Vec<String>,
}

/// Parse a flag string such as `+kl-n` and hand out positional arguments.
///
/// `takes_arg(sign, letter)` decides whether a letter consumes the next
/// argument. Letters before any sign are treated as `+`. Parsing never
/// fails; shortfalls and leftovers are reported in the result.
pub fn parse_mode_changes<'a, I, F>(flags: &str, args: I, mut takes_arg: F) -> ModeChanges
where
    I: IntoIterator<Item = &'a str>,
    F: FnMut(Sign, char) -> bool,
{
    let mut out = ModeChanges::default();
    let mut args = args.into_iter();
    let mut sign = Sign::Plus;

    for c in flags.chars() {
        match c {
            '+' => sign = Sign::Plus,
            '-' => sign = Sign::Minus,
            _ => {
                let arg = if takes_arg(sign, c) {
                    let next = args.next().map(str::to_owned);
                    if next.is_none() {
                        out.missing.push(c);
                    }
                    next
                } else {
                    None
                };
                out.changes.push(ModeChange {
                    sign,
                    mode: c,
                    arg,
                });
            }
        }
    }

    out.unused = args.map(str::to_owned).collect();
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value_bearing(_: Sign, c: char) -> bool {
        matches!(c, 'b' | 'k' | 'l' | 'o' | 'v')
    }

    #[test]
    fn test_arguments_consumed_in_order() {
        let parsed = parse_mode_changes("+kl", ["bla", "42"], value_bearing);
        assert_eq!(parsed.changes.len(), 2);
        assert_eq!(parsed.changes[0].arg.as_deref(), Some("bla"));
        assert_eq!(parsed.changes[1].arg.as_deref(), Some("42"));
        assert!(parsed.missing.is_empty());
        assert!(parsed.unused.is_empty());
    }

    #[test]
    fn test_flags_do_not_consume() {
        let parsed = parse_mode_changes("+nt-s+o", ["joe"], value_bearing);
        let letters: String = parsed.changes.iter().map(|c| c.mode).collect();
        assert_eq!(letters, "ntso");
        assert_eq!(parsed.changes[2].sign, Sign::Minus);
        assert_eq!(parsed.changes[3].arg.as_deref(), Some("joe"));
    }

    #[test]
    fn test_missing_and_unused() {
        let parsed = parse_mode_changes("+k", Vec::<&str>::new(), value_bearing);
        assert_eq!(parsed.missing, vec!['k']);
        assert_eq!(parsed.changes[0].arg, None);

        let parsed = parse_mode_changes("+n", ["stray"], value_bearing);
        assert_eq!(parsed.unused, vec!["stray".to_string()]);
    }

    #[test]
    fn test_sign_aware_consumption() {
        let parsed = parse_mode_changes("-l+l", ["10"], |sign, c| c == 'l' && sign == Sign::Plus);
        assert_eq!(parsed.changes[0].arg, None);
        assert_eq!(parsed.changes[1].arg.as_deref(), Some("10"));
    }
}
