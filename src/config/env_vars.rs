use std::path::PathBuf;

/// Expand Windows-style environment variables (%VAR%)
///
/// Unknown variables are left in place.
pub fn parse_windows_env_vars(path: &str) -> String {
    let mut result = String::with_capacity(path.len());
    let mut rest = path;

    while let Some(start) = rest.find('%') {
        result.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('%') {
            Some(end) => {
                let var_name = &after[..end];
                match std::env::var(var_name) {
                    Ok(value) if !var_name.is_empty() => {
                        result.push_str(&value);
                        rest = &after[end + 1..];
                    }
                    _ => {
                        // Keep the opening % and retry from the closing one
                        result.push('%');
                        result.push_str(var_name);
                        rest = &after[end..];
                    }
                }
            }
            None => {
                result.push('%');
                rest = after;
            }
        }
    }

    result.push_str(rest);
    result
}

/// Expand Unix-style environment variables ($VAR and ${VAR})
///
/// Unknown variables expand to the empty string, like a POSIX shell.
pub fn parse_unix_env_vars(path: &str) -> String {
    let mut result = String::with_capacity(path.len());
    let mut chars = path.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        if let Some(&(_, '{')) = chars.peek() {
            match path[i + 2..].find('}') {
                Some(end) => {
                    let var_name = &path[i + 2..i + 2 + end];
                    result.push_str(&std::env::var(var_name).unwrap_or_default());
                    // Skip past the closing brace
                    while let Some((j, _)) = chars.next() {
                        if j == i + 2 + end {
                            break;
                        }
                    }
                }
                None => result.push(c),
            }
            continue;
        }

        let mut var_name = String::new();
        while let Some(&(_, next)) = chars.peek() {
            if next.is_ascii_alphanumeric() || next == '_' {
                var_name.push(next);
                chars.next();
            } else {
                break;
            }
        }

        if var_name.is_empty() {
            result.push(c);
        } else {
            result.push_str(&std::env::var(&var_name).unwrap_or_default());
        }
    }

    result
}

/// Expand both variable styles in a configured path
pub fn expand_path(path: &str) -> PathBuf {
    let mut expanded = path.to_string();
    if expanded.contains('%') {
        expanded = parse_windows_env_vars(&expanded);
    }
    if expanded.contains('$') {
        expanded = parse_unix_env_vars(&expanded);
    }
    PathBuf::from(expanded)
}

/// Home directory of the invoking user, from `HOME` or `USERPROFILE`
pub fn user_home_dir() -> Option<PathBuf> {
    ["HOME", "USERPROFILE"]
        .iter()
        .filter_map(|var| std::env::var_os(var))
        .find(|value| !value.is_empty())
        .map(PathBuf::from)
}
