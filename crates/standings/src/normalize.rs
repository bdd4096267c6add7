//! Team-name normalization used as the join key between roster and leaderboards.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Lower-case, strip diacritics, trim and collapse inner whitespace.
///
/// Total and pure. Roster names and leaderboard names must both go through
/// this function or matching silently breaks.
pub fn normalize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());

    // Lower-case after decomposition: styled capitals (𝐒, ℌ) only become
    // plain letters under NFKD.
    for c in raw.nfkd().flat_map(char::to_lowercase) {
        if is_combining_mark(c) {
            continue;
        }
        match transliterate(c) {
            Some(s) => out.push_str(s),
            None => out.push(c),
        }
    }

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Latin letters with no canonical decomposition.
fn transliterate(c: char) -> Option<&'static str> {
    let s = match c {
        'ß' => "ss",
        'æ' => "ae",
        'œ' => "oe",
        'ø' => "o",
        'đ' | 'ð' => "d",
        'ł' => "l",
        'þ' => "th",
        'ı' => "i",
        'ħ' => "h",
        _ => return None,
    };
    Some(s)
}
