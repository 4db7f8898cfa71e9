use std::io::BufRead;

/// Iterator yielding one UTF-8 line at a time from a buffered reader.
///
/// Trailing `\n` and `\r` are stripped; a trailing incomplete line (no newline before EOF) is
/// yielded exactly once.
#[derive(Debug)]
pub struct Lines<R> {
    reader: R,
}

impl<R> Lines<R>
where
    R: BufRead,
{
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R> Iterator for Lines<R>
where
    R: BufRead,
{
    type Item = Result<String, std::io::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => {
                if line.ends_with('\n') {
                    line.pop();
                }
                if line.ends_with('\r') {
                    line.pop();
                }
                Some(Ok(line))
            }
            Err(error) => Some(Err(error)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn collect(input: &str) -> Vec<String> {
        Lines::new(Cursor::new(input.as_bytes()))
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn test_lines() {
        struct TestCase {
            input: &'static str,
            expected: Vec<&'static str>,
        }

        let tests = vec![
            TestCase {
                // TC0: plain newline separated
                input: "a\nb\n",
                expected: vec!["a", "b"],
            },
            TestCase {
                // TC1: CRLF line endings are stripped
                input: "a\r\nb\r\n",
                expected: vec!["a", "b"],
            },
            TestCase {
                // TC2: trailing incomplete line is yielded once at EOF
                input: "a\nb",
                expected: vec!["a", "b"],
            },
            TestCase {
                // TC3: empty input yields nothing
                input: "",
                expected: vec![],
            },
            TestCase {
                // TC4: blank lines are preserved
                input: "a\n\nb\n",
                expected: vec!["a", "", "b"],
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            assert_eq!(collect(test.input), test.expected, "TC{index} failed");
        }
    }
}
