/// Forward-only cursor over the raw lines of one document.
///
/// Heading conventions that put a title on the line after its marker need
/// one line of lookahead; `peek` exposes it without committing, `advance`
/// consumes it. This replaces manual index arithmetic in the caller.
#[derive(Debug)]
pub struct LineCursor<'a> {
    lines: Vec<&'a str>,
    index: usize,
}

impl<'a> LineCursor<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().collect(),
            index: 0,
        }
    }

    pub fn next(&mut self) -> Option<&'a str> {
        let line = self.lines.get(self.index).copied()?;
        self.index += 1;
        Some(line)
    }

    pub fn peek(&self) -> Option<&'a str> {
        self.lines.get(self.index).copied()
    }

    pub fn advance(&mut self) {
        if self.index < self.lines.len() {
            self.index += 1;
        }
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}
