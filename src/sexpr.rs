//! S-expression writer for KiCad board files
//!
//! Output is byte-reproducible: floats always use six decimals with `.` as
//! separator and negative zero is written as zero. A list whose items include
//! another non-empty list breaks each such item onto its own indented line.

use std::fmt::Write;

/// One node of an S-expression
#[derive(Debug, Clone, PartialEq)]
pub enum SExpr {
    /// `(token item...)`
    List(String, Vec<SExpr>),
    /// Bare keyword such as `solid`
    Symbol(String),
    /// Quoted, escaped string
    Str(String),
    /// Fixed six-decimal number
    Float(f64),
    Int(i64),
}

impl SExpr {
    pub fn list(token: &str, items: Vec<SExpr>) -> Self {
        SExpr::List(token.to_string(), items)
    }

    pub fn symbol(s: &str) -> Self {
        SExpr::Symbol(s.to_string())
    }

    pub fn string(s: &str) -> Self {
        SExpr::Str(s.to_string())
    }

    fn is_nested_list(&self) -> bool {
        matches!(self, SExpr::List(_, items) if !items.is_empty())
    }

    /// Render to text
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.write(&mut out, 0);
        out
    }

    fn write(&self, out: &mut String, depth: usize) {
        match self {
            SExpr::List(token, items) => {
                if depth > 0 {
                    out.push('\n');
                    out.push_str(&"  ".repeat(depth));
                }
                if items.is_empty() {
                    out.push_str(token);
                    return;
                }

                out.push('(');
                out.push_str(token);
                let mut broken = false;
                for item in items {
                    if item.is_nested_list() {
                        broken = true;
                        item.write(out, depth + 1);
                    } else {
                        out.push(' ');
                        item.write_atom(out);
                    }
                }

                if broken {
                    out.push('\n');
                    out.push_str(&"  ".repeat(depth));
                }
                out.push(')');
            }
            _ => self.write_atom(out),
        }
    }

    fn write_atom(&self, out: &mut String) {
        match self {
            SExpr::List(token, _) => out.push_str(token),
            SExpr::Symbol(s) => out.push_str(s),
            SExpr::Str(s) => escape_string(s, out),
            SExpr::Float(n) => out.push_str(&format_float(*n)),
            SExpr::Int(n) => {
                let _ = write!(out, "{}", n);
            }
        }
    }
}

/// Format a number with 6 decimal places, treating -0 as 0
pub fn format_float(n: f64) -> String {
    let n = if n == 0.0 { 0.0 } else { n };
    let s = format!("{:.6}", n);
    // values that round to zero would otherwise print as "-0.000000"
    if s == "-0.000000" { "0.000000".to_string() } else { s }
}

fn escape_string(s: &str, out: &mut String) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_float_fixed_precision() {
        assert_eq!(format_float(1.0), "1.000000");
        assert_eq!(format_float(-2.5), "-2.500000");
        assert_eq!(format_float(1e-7), "0.000000");
        assert_eq!(format_float(123456789.0), "123456789.000000");
    }

    #[test]
    fn test_negative_zero_normalized() {
        assert_eq!(format_float(-0.0), "0.000000");
        assert_eq!(format_float(-1e-9), "0.000000");
    }

    #[test]
    fn test_flat_list() {
        let e = SExpr::list("xy", vec![SExpr::Float(1.0), SExpr::Float(-2.0)]);
        assert_eq!(e.render(), "(xy 1.000000 -2.000000)");
    }

    #[test]
    fn test_nested_lists_break_lines() {
        let e = SExpr::list(
            "fp_poly",
            vec![
                SExpr::list(
                    "pts",
                    vec![SExpr::list("xy", vec![SExpr::Float(0.0), SExpr::Float(1.0)])],
                ),
                SExpr::list("fill", vec![SExpr::symbol("solid")]),
                SExpr::list("width", vec![SExpr::Int(0)]),
            ],
        );
        assert_eq!(
            e.render(),
            "(fp_poly\n  (pts\n    (xy 0.000000 1.000000)\n  )\n  (fill solid)\n  (width 0)\n)"
        );
    }

    #[test]
    fn test_string_escaping() {
        let e = SExpr::list("name", vec![SExpr::string("a\"b\\c")]);
        assert_eq!(e.render(), r#"(name "a\"b\\c")"#);
    }
}
