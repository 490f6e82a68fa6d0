use std::fmt::{Display, Formatter};

pub struct DisplaySlice<'a, D: Display> {
    items: &'a [D],
}
impl<'a, D: Display> Display for DisplaySlice<'a, D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        let len = self.items.len();
        for (index, item) in self.items.iter().enumerate() {
            write!(f, "{item}")?;
            if index != len - 1 {
                write!(f, ", ")?;
            }
        }
        write!(f, "]")?;
        Ok(())
    }
}

impl<'a, D: Display> From<&'a [D]> for DisplaySlice<'a, D> {
    fn from(items: &'a [D]) -> Self {
        DisplaySlice { items }
    }
}

/// A price rounded to whole units, with thousands separated by commas.
pub struct DisplayPrice(pub f64);

impl Display for DisplayPrice {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let value = self.0;
        if !value.is_finite() {
            return write!(f, "{value}");
        }
        let rounded = value.round();
        let digits = format!("{:.0}", rounded.abs());
        if rounded < 0.0 {
            write!(f, "-")?;
        }
        let lead = match digits.len() % 3 {
            0 => 3,
            lead => lead,
        };
        write!(f, "{}", &digits[..lead])?;
        for group in digits.as_bytes()[lead..].chunks(3) {
            // digits are ASCII, so every chunk is valid UTF-8
            write!(f, ",{}", std::str::from_utf8(group).map_err(|_| std::fmt::Error)?)?;
        }
        Ok(())
    }
}
