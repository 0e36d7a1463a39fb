pub const DEFAULT_COLOR: &str = "hsl(211, 100%, 50%)";
const MAX_NAME_CHARS: usize = 100;

fn strip_control(input: &str) -> String {
    input
        .chars()
        .filter(|ch| !ch.is_control() || *ch == '\n' || *ch == '\t')
        .collect()
}

/// Task titles keep unicode and emoji but lose control characters and
/// surrounding whitespace. An empty result means the input was unusable.
pub fn sanitize_title(title: &str) -> String {
    strip_control(title).trim().to_string()
}

/// Notes keep their newlines; only control characters are dropped.
pub fn sanitize_notes(notes: &str) -> String {
    strip_control(notes)
}

/// Project, area, and tag names are trimmed and length-capped.
pub fn sanitize_name(name: &str) -> String {
    strip_control(name)
        .trim()
        .chars()
        .take(MAX_NAME_CHARS)
        .collect()
}

/// Accepts `#rrggbb`, `rgb()`/`rgba()`, and `hsl()`/`hsla()` forms; anything
/// else becomes the default accent color.
pub fn sanitize_color(color: &str) -> String {
    let trimmed = color.trim();
    if trimmed.is_empty() {
        return DEFAULT_COLOR.to_string();
    }

    if is_hex_color(trimmed) || is_rgb_color(trimmed) || is_hsl_color(trimmed) {
        return trimmed.to_string();
    }

    DEFAULT_COLOR.to_string()
}

fn is_hex_color(input: &str) -> bool {
    let Some(rest) = input.strip_prefix('#') else {
        return false;
    };

    rest.len() == 6 && rest.chars().all(|ch| ch.is_ascii_hexdigit())
}

fn is_rgb_color(input: &str) -> bool {
    let Some(body) = strip_function(input, "rgb") else {
        return false;
    };

    let parts: Vec<&str> = body.split(',').map(str::trim).collect();
    if parts.len() != 3 && parts.len() != 4 {
        return false;
    }

    let channels_ok = parts[..3]
        .iter()
        .all(|part| part.parse::<u16>().is_ok_and(|value| value <= 255));
    let alpha_ok = parts.len() == 3 || parts[3].parse::<f64>().is_ok();

    channels_ok && alpha_ok
}

fn is_hsl_color(input: &str) -> bool {
    let Some(body) = strip_function(input, "hsl") else {
        return false;
    };

    let parts: Vec<&str> = body.split(',').map(str::trim).collect();
    if parts.len() != 3 && parts.len() != 4 {
        return false;
    }

    let hue_ok = parts[0].parse::<u16>().is_ok_and(|value| value <= 360);
    let percent_ok = parts[1..3].iter().all(|part| {
        part.strip_suffix('%')
            .and_then(|digits| digits.parse::<u16>().ok())
            .is_some_and(|value| value <= 100)
    });
    let alpha_ok = parts.len() == 3 || parts[3].parse::<f64>().is_ok();

    hue_ok && percent_ok && alpha_ok
}

fn strip_function<'a>(input: &'a str, name: &str) -> Option<&'a str> {
    let rest = input
        .strip_prefix(name)
        .map(|rest| rest.strip_prefix('a').unwrap_or(rest))?;

    rest.strip_prefix('(')?.strip_suffix(')')
}
