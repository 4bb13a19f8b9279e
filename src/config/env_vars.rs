//! Environment variable expansion for configured source paths.
//!
//! Windows-style `%VAR%` and Unix-style `$VAR` / `${VAR}` references are
//! supported, plus a leading `~`. Unknown variables are left untouched so the
//! resulting path simply does not exist and the task treats it as absent.

/// Expand variables using the process environment
pub fn expand_env_vars(path: &str) -> String {
    expand_with(path, |name| std::env::var(name).ok())
}

/// Expand variables with a caller-supplied lookup
pub fn expand_with<F>(path: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let path = expand_home(path, &lookup);
    let path = parse_windows_env_vars(&path, &lookup);
    parse_unix_env_vars(&path, &lookup)
}

fn expand_home<F>(path: &str, lookup: &F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let rest = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') || rest.starts_with('\\') => rest,
        _ => return path.to_string(),
    };

    match lookup("HOME").or_else(|| lookup("USERPROFILE")) {
        Some(home) => format!("{}{}", home, rest),
        None => path.to_string(),
    }
}

/// Expand `%VAR%` references
fn parse_windows_env_vars<F>(path: &str, lookup: &F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut result = String::with_capacity(path.len());
    let mut rest = path;

    while let Some(start) = rest.find('%') {
        result.push_str(&rest[..start]);
        let after = &rest[start + 1..];

        match after.find('%') {
            Some(end) if end > 0 && is_var_name(&after[..end]) => {
                let name = &after[..end];
                match lookup(name) {
                    Some(value) => result.push_str(&value),
                    None => {
                        result.push('%');
                        result.push_str(name);
                        result.push('%');
                    }
                }
                rest = &after[end + 1..];
            }
            _ => {
                // Lone percent sign
                result.push('%');
                rest = after;
            }
        }
    }

    result.push_str(rest);
    result
}

/// Expand `${VAR}` and `$VAR` references
fn parse_unix_env_vars<F>(path: &str, lookup: &F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut result = String::with_capacity(path.len());
    let mut rest = path;

    while let Some(start) = rest.find('$') {
        result.push_str(&rest[..start]);
        let after = &rest[start + 1..];

        if let Some(braced) = after.strip_prefix('{') {
            if let Some(end) = braced.find('}') {
                let name = &braced[..end];
                match lookup(name) {
                    Some(value) => result.push_str(&value),
                    None => result.push_str(&rest[start..start + 1 + 1 + end + 1]),
                }
                rest = &braced[end + 1..];
                continue;
            }
            result.push('$');
            rest = after;
            continue;
        }

        let name_len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(after.len());

        if name_len == 0 {
            result.push('$');
            rest = after;
            continue;
        }

        let name = &after[..name_len];
        match lookup(name) {
            Some(value) => result.push_str(&value),
            None => {
                result.push('$');
                result.push_str(name);
            }
        }
        rest = &after[name_len..];
    }

    result.push_str(rest);
    result
}

fn is_var_name(name: &str) -> bool {
    name.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '(' || c == ')')
}

/// Normalize path separators for the current OS
pub fn normalize_path_for_os(path: &str) -> String {
    if cfg!(windows) {
        path.replace('/', "\\")
    } else {
        path.replace('\\', "/")
    }
}
