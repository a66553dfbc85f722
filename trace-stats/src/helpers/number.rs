/// How counters are rendered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Grouping {
    /// Plain digits.
    None,
    /// Groups of three digits, separated by the given character.
    Thousands(char),
}

impl Grouping {
    pub(crate) fn format(&self, value: u64) -> String {
        let digits = value.to_string();
        let sep = match self {
            Grouping::None => return digits,
            Grouping::Thousands(sep) => *sep,
        };

        let mut out = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i != 0 && (digits.len() - i) % 3 == 0 {
                out.push(sep);
            }
            out.push(c);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case(0 => "0")]
    #[test_case(999 => "999")]
    #[test_case(1000 => "1,000")]
    #[test_case(123456 => "123,456")]
    #[test_case(1234567 => "1,234,567")]
    #[test_case(u64::MAX => "18,446,744,073,709,551,615")]
    fn thousands(value: u64) -> String {
        Grouping::Thousands(',').format(value)
    }

    #[test]
    fn other_separators() {
        assert_eq!(Grouping::None.format(1234567), "1234567");
        assert_eq!(Grouping::Thousands('.').format(10000), "10.000");
    }
}
