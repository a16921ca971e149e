use std::fmt::{self, Display, Formatter};

use super::{Line, Trailing};

/// A last argument that could not be read back without a colon.
fn needs_colon(arg: &str) -> bool {
    arg.is_empty() || arg.contains(' ') || arg.starts_with(':')
}

impl Line {
    fn colon_on_last(&self, last: &str) -> bool {
        needs_colon(last)
            || match self.trailing {
                Trailing::Colon => true,
                Trailing::Bare => false,
                Trailing::Auto => self.command().requires_colon(self.args.len()),
            }
    }
}

impl Display for Line {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if let Some(ref origin) = self.origin {
            write!(f, ":{} ", origin)?;
        }

        f.write_str(&self.command)?;

        if let Some((last, middle)) = self.args.split_last() {
            for arg in middle {
                write!(f, " {}", arg)?;
            }
            if self.colon_on_last(last) {
                write!(f, " :{}", last)?;
            } else {
                write!(f, " {}", last)?;
            }
        }

        Ok(())
    }
}
