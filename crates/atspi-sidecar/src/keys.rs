//! Key name → X keysym translation for the `key` method

/// Offset X uses for keysyms of Unicode characters outside Latin-1
const UNICODE_KEYSYM_BASE: u32 = 0x0100_0000;

const F1_KEYSYM: u32 = 0xffbe;

/// Translate a key name (`"Return"`, `"ctrl"`, `"F5"`, `"a"`, ...) to a keysym
///
/// Names are matched case-insensitively. A single character maps to its own
/// keysym. Returns `None` for names that are not recognized.
pub fn keysym(name: &str) -> Option<u32> {
    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return char_keysym(c);
    }

    let lower = name.to_ascii_lowercase();
    if let Some(number) = lower.strip_prefix('f').and_then(|n| n.parse::<u32>().ok()) {
        return (1..=24).contains(&number).then(|| F1_KEYSYM + number - 1);
    }

    let sym = match lower.as_str() {
        "return" | "enter" => 0xff0d,
        "tab" => 0xff09,
        "escape" | "esc" => 0xff1b,
        "backspace" => 0xff08,
        "delete" | "del" => 0xffff,
        "insert" => 0xff63,
        "home" => 0xff50,
        "end" => 0xff57,
        "left" => 0xff51,
        "up" => 0xff52,
        "right" => 0xff53,
        "down" => 0xff54,
        "page_up" | "pageup" | "prior" => 0xff55,
        "page_down" | "pagedown" | "next" => 0xff56,
        "space" => 0x0020,
        "menu" => 0xff67,
        "shift" | "shift_l" => 0xffe1,
        "shift_r" => 0xffe2,
        "control" | "ctrl" | "control_l" => 0xffe3,
        "control_r" => 0xffe4,
        "alt" | "alt_l" => 0xffe9,
        "alt_r" => 0xffea,
        "super" | "super_l" | "meta" | "win" => 0xffeb,
        "super_r" => 0xffec,
        "caps_lock" | "capslock" => 0xffe5,
        _ => return None,
    };
    Some(sym)
}

fn char_keysym(c: char) -> Option<u32> {
    match c {
        '\n' | '\r' => Some(0xff0d),
        '\t' => Some(0xff09),
        c if c.is_control() => None,
        c if (c as u32) < 0x100 => Some(c as u32),
        c => Some(UNICODE_KEYSYM_BASE + c as u32),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_keys() {
        assert_eq!(keysym("Return"), Some(0xff0d));
        assert_eq!(keysym("enter"), Some(0xff0d));
        assert_eq!(keysym("Escape"), Some(0xff1b));
        assert_eq!(keysym("ctrl"), Some(0xffe3));
        assert_eq!(keysym("Page_Down"), Some(0xff56));
    }

    #[test]
    fn test_function_keys() {
        assert_eq!(keysym("F1"), Some(0xffbe));
        assert_eq!(keysym("f12"), Some(0xffc9));
        assert_eq!(keysym("F0"), None);
        assert_eq!(keysym("F25"), None);
    }

    #[test]
    fn test_single_characters() {
        assert_eq!(keysym("a"), Some('a' as u32));
        assert_eq!(keysym("A"), Some('A' as u32));
        assert_eq!(keysym("é"), Some(0xe9));
        assert_eq!(keysym("€"), Some(0x0100_20ac));
        assert_eq!(keysym("\n"), Some(0xff0d));
        assert_eq!(keysym("\u{7}"), None);
    }

    #[test]
    fn test_unknown_names() {
        assert_eq!(keysym(""), None);
        assert_eq!(keysym("hyperdrive"), None);
        assert_eq!(keysym("ctrl+c"), None);
    }
}
