fn apply_cors_headers(headers: &mut axum::http::HeaderMap) {
    headers.insert(
        HeaderName::from_static("access-control-allow-origin"),
        HeaderValue::from_static("*"),
    );
    headers.insert(
        HeaderName::from_static("access-control-allow-methods"),
        HeaderValue::from_static("GET,POST,OPTIONS,PUT,PATCH,DELETE"),
    );
    headers.insert(
        HeaderName::from_static("access-control-allow-headers"),
        HeaderValue::from_static("*"),
    );
    headers.insert(
        HeaderName::from_static("access-control-max-age"),
        HeaderValue::from_static("3600"),
    );
}

#[derive(Debug)]
struct AllocationPayload {
    allocation: Allocation,
    shock_amount: Option<i64>,
}

/// Parse an allocation request body: collect `allocation_*` keys, map their
/// suffixes onto catalog category names, and read the optional pinned shock.
/// `Err` carries a participant-facing rejection message, not a transport
/// error; malformed amounts are a study observation, not a bad request.
fn parse_allocation_payload(
    entries: &Map<String, Value>,
    categories: &[String],
) -> Result<AllocationPayload, String> {
    let mut allocation = Allocation::new();
    for (key, value) in entries {
        let Some(suffix) = key.strip_prefix(ALLOCATION_KEY_PREFIX) else {
            continue;
        };
        let category = canonical_category(suffix, categories);
        let Some(amount) = amount_from_value(value) else {
            return Err(format!("Invalid amount for {category}"));
        };
        allocation.insert(category, amount);
    }

    let shock_amount = match entries.get("shock_amount") {
        None | Some(Value::Null) => None,
        Some(value) => match amount_from_value(value) {
            Some(amount) => Some(amount),
            None => return Err("Invalid shock_amount".to_string()),
        },
    };

    Ok(AllocationPayload {
        allocation,
        shock_amount,
    })
}

/// Amounts arrive as JSON numbers or as integer-parsable strings, because
/// form frontends send both.
fn amount_from_value(value: &Value) -> Option<i64> {
    if let Some(amount) = value.as_i64() {
        return Some(amount);
    }
    value.as_str().and_then(|raw| raw.trim().parse::<i64>().ok())
}

/// Map an `allocation_<suffix>` key onto the catalog's spelling of the
/// category, matching case-insensitively with underscores as spaces. An
/// unmatched suffix is title-cased so the rejection message stays readable.
fn canonical_category(raw: &str, categories: &[String]) -> String {
    let spaced = raw.replace('_', " ");
    for category in categories {
        if category.eq_ignore_ascii_case(&spaced) {
            return category.clone();
        }
    }
    title_case(&spaced)
}

fn title_case(raw: &str) -> String {
    raw.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
