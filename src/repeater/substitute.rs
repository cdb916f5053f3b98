/// Rewrites a constraint template by replacing each counter name with its
/// current value, ready for re-parsing into a concrete AST.
///
/// Substitution is identifier-token-aware: a counter name only replaces a
/// whole standalone identifier, never a substring of a longer identifier and
/// never a `$`-prefixed variable name. `i` bound to `2` turns `$x[i] > i`
/// into `$x[2] > 2` and leaves `$xi` and `$index` alone.
pub fn substitute(template: &str, bindings: &[(&str, i64)]) -> String {
    let mut output = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    let mut after_dollar = false;

    while let Some(&c) = chars.peek() {
        if c.is_alphabetic() || c == '_' {
            let mut ident = String::new();
            while let Some(&d) = chars.peek() {
                if d.is_alphanumeric() || d == '_' {
                    ident.push(d);
                    chars.next();
                } else {
                    break;
                }
            }
            let binding = if after_dollar {
                None
            } else {
                bindings
                    .iter()
                    .find(|(name, _)| *name == ident)
                    .map(|(_, value)| *value)
            };
            match binding {
                Some(value) => output.push_str(&value.to_string()),
                None => output.push_str(&ident),
            }
            after_dollar = false;
        } else {
            after_dollar = c == '$';
            output.push(c);
            chars.next();
        }
    }

    output
}
