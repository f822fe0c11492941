//! Field rules shared by the account and visitor services.

/// Fails with `"{field} is required"` when `value` is blank.
pub fn required(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field} is required"));
    }
    Ok(())
}

pub fn max_length(field: &str, value: &str, max: usize) -> Result<(), String> {
    if value.chars().count() > max {
        return Err(format!("{field} must be {max} characters or less"));
    }
    Ok(())
}

/// An empty address is accepted; anything else must look like `local@domain.tld`.
pub fn email(value: &str) -> Result<(), String> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(());
    }

    let valid = value.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty()
            && !domain.contains('@')
            && domain
                .split_once('.')
                .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
            && !domain.ends_with('.')
            && !value.chars().any(char::is_whitespace)
    });

    if valid {
        Ok(())
    } else {
        Err(format!("Invalid email address: {value}"))
    }
}
