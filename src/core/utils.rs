//! Identifier transformation utilities for code generation

/// Converts a string to snake_case.
///
/// Handles camelCase, PascalCase, kebab-case and space-separated input.
///
/// # Examples
/// ```
/// use sdk_codegen::core::utils::to_snake_case;
///
/// assert_eq!(to_snake_case("getUserRoles"), "get_user_roles");
/// assert_eq!(to_snake_case("GetUserRoles"), "get_user_roles");
/// assert_eq!(to_snake_case("get-user-roles"), "get_user_roles");
/// ```
pub fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    let mut prev_is_lowercase = false;

    for ch in s.chars() {
        if ch.is_uppercase() {
            if prev_is_lowercase {
                result.push('_');
            }
            result.extend(ch.to_lowercase());
            prev_is_lowercase = false;
        } else if ch.is_alphanumeric() {
            result.push(ch);
            prev_is_lowercase = ch.is_lowercase() || ch.is_ascii_digit();
        } else if (ch == '-' || ch == '_' || ch == ' ') && !result.ends_with('_') {
            result.push('_');
            prev_is_lowercase = false;
        }
    }

    result.trim_matches('_').to_string()
}

/// Converts a string to PascalCase for type names.
///
/// # Examples
/// ```
/// use sdk_codegen::core::utils::to_proper_case;
///
/// assert_eq!(to_proper_case("all_users"), "AllUsers");
/// assert_eq!(to_proper_case("allUsers"), "AllUsers");
/// ```
pub fn to_proper_case(s: &str) -> String {
    to_snake_case(s)
        .split('_')
        .filter(|s| !s.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
            }
        })
        .collect()
}
