//! Line-at-a-time brace depth tracking for C-family syntax.
//!
//! Braces inside comments, quoted strings, regex literals and template
//! literals do not move the depth. Template interpolations (`${ ... }`) are
//! code and may nest.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Code,
    BlockComment,
    Template,
}

/// What one scanned line looked like.
#[derive(Debug, Clone)]
pub(crate) struct LineScan {
    /// Depth before the first character of the line.
    pub depth_before: usize,
    /// Depth after the last character of the line.
    pub depth_after: usize,
    /// Deepest point reached on the line.
    pub max_depth: usize,
    /// Whether the line started outside comments and template literals.
    pub starts_in_code: bool,
    /// The line with comment text and literal contents replaced by spaces.
    pub code: String,
}

/// Stateful scanner fed one line at a time.
#[derive(Debug)]
pub(crate) struct BraceScanner {
    state: State,
    depth: usize,
    /// Depths at which a `${` re-entered code from a template literal.
    template_stack: Vec<usize>,
}

impl BraceScanner {
    pub fn new() -> Self {
        Self {
            state: State::Code,
            depth: 0,
            template_stack: Vec::new(),
        }
    }

    pub fn scan_line(&mut self, line: &str) -> LineScan {
        let chars: Vec<char> = line.chars().collect();
        let starts_in_code = self.state == State::Code;
        let depth_before = self.depth;
        let mut max_depth = self.depth;
        let mut code = String::with_capacity(line.len());

        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];
            let next = chars.get(i + 1).copied();

            match self.state {
                State::BlockComment => {
                    if c == '*' && next == Some('/') {
                        self.state = State::Code;
                        code.push_str("  ");
                        i += 2;
                        continue;
                    }
                    code.push(' ');
                }
                State::Template => {
                    if c == '\\' {
                        code.push(' ');
                        if next.is_some() {
                            code.push(' ');
                        }
                        i += 2;
                        continue;
                    }
                    if c == '`' {
                        self.state = State::Code;
                        code.push('`');
                    } else if c == '$' && next == Some('{') {
                        self.template_stack.push(self.depth);
                        self.depth += 1;
                        max_depth = max_depth.max(self.depth);
                        self.state = State::Code;
                        code.push_str("${");
                        i += 2;
                        continue;
                    } else {
                        code.push(' ');
                    }
                }
                State::Code => {
                    if c == '/' && next == Some('/') {
                        break;
                    }
                    if c == '/' && next == Some('*') {
                        self.state = State::BlockComment;
                        code.push_str("  ");
                        i += 2;
                        continue;
                    }
                    if c == '/' && starts_regex(&code) {
                        // Regex literals end at the first unescaped `/` outside a class.
                        code.push('/');
                        i += 1;
                        let mut in_class = false;
                        while i < chars.len() {
                            let d = chars[i];
                            if d == '\\' {
                                code.push(' ');
                                i += 1;
                                if i < chars.len() {
                                    code.push(' ');
                                    i += 1;
                                }
                                continue;
                            }
                            match d {
                                '[' => in_class = true,
                                ']' => in_class = false,
                                '/' if !in_class => {
                                    code.push('/');
                                    break;
                                }
                                _ => {}
                            }
                            code.push(' ');
                            i += 1;
                        }
                        i += 1;
                        continue;
                    }
                    match c {
                        '\'' | '"' => {
                            // Quoted strings end at the closing quote or the end of the line.
                            code.push(c);
                            i += 1;
                            while i < chars.len() {
                                let d = chars[i];
                                if d == '\\' {
                                    code.push(' ');
                                    i += 1;
                                    if i < chars.len() {
                                        code.push(' ');
                                        i += 1;
                                    }
                                    continue;
                                }
                                if d == c {
                                    code.push(c);
                                    break;
                                }
                                code.push(' ');
                                i += 1;
                            }
                        }
                        '`' => {
                            self.state = State::Template;
                            code.push('`');
                        }
                        '{' => {
                            self.depth += 1;
                            max_depth = max_depth.max(self.depth);
                            code.push('{');
                        }
                        '}' => {
                            self.depth = self.depth.saturating_sub(1);
                            code.push('}');
                            if self.template_stack.last() == Some(&self.depth) {
                                self.template_stack.pop();
                                self.state = State::Template;
                            }
                        }
                        _ => code.push(c),
                    }
                }
            }
            i += 1;
        }

        LineScan {
            depth_before,
            depth_after: self.depth,
            max_depth,
            starts_in_code,
            code,
        }
    }
}

/// Keywords after which a `/` opens a regex rather than dividing.
const REGEX_KEYWORDS: &[&str] = &[
    "return", "typeof", "case", "in", "of", "delete", "void", "throw", "new", "yield", "await", "else", "do",
];

/// Whether a `/` following `code` (this line so far) starts a regex literal.
fn starts_regex(code: &str) -> bool {
    let before = code.trim_end();
    match before.chars().last() {
        None => true,
        Some(c) if "(,=:[!&|?{};+-*%>~^".contains(c) => true,
        Some(c) if c.is_alphanumeric() || c == '_' || c == '$' => {
            let word = before
                .rsplit(|c: char| !(c.is_alphanumeric() || c == '_' || c == '$'))
                .next()
                .unwrap_or("");
            REGEX_KEYWORDS.contains(&word)
        }
        _ => false,
    }
}
