/// Which path produced the slug text.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SlugSource {
    Transliterated,
    Raw,
}

/// Derives the stored slug for a freshly inserted row: the row id, a hyphen,
/// and a slugified transliteration of `text`. Falls back to slugifying the
/// raw text when it contains non-ASCII characters outside the Cyrillic range.
pub fn assign(id: i32, text: &str) -> (String, SlugSource) {
    match transliterate(text) {
        Some(latin) => (format!("{id}-{}", slugify(&latin)), SlugSource::Transliterated),
        None => (format!("{id}-{}", slugify(text)), SlugSource::Raw),
    }
}

/// Lowercases, keeps ASCII alphanumerics, turns separator runs into single
/// hyphens and drops everything else.
pub fn slugify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_dash = false;
    for ch in text.chars() {
        let ch = ch.to_ascii_lowercase();
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            out.push(ch);
            pending_dash = false;
        } else if ch.is_ascii_whitespace() || ch == '-' || ch == '_' {
            pending_dash = true;
        }
    }
    out
}

fn transliterate(text: &str) -> Option<String> {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch.is_ascii() {
            out.push(ch);
            continue;
        }
        let low = ch.to_lowercase().next().unwrap_or(ch);
        out.push_str(cyrillic_to_latin(low)?);
    }
    Some(out)
}

fn cyrillic_to_latin(ch: char) -> Option<&'static str> {
    Some(match ch {
        'а' => "a",
        'б' => "b",
        'в' => "v",
        'г' => "g",
        'д' => "d",
        'е' => "e",
        'ё' => "e",
        'ж' => "zh",
        'з' => "z",
        'и' => "i",
        'й' => "y",
        'к' => "k",
        'л' => "l",
        'м' => "m",
        'н' => "n",
        'о' => "o",
        'п' => "p",
        'р' => "r",
        'с' => "s",
        'т' => "t",
        'у' => "u",
        'ф' => "f",
        'х' => "kh",
        'ц' => "ts",
        'ч' => "ch",
        'ш' => "sh",
        'щ' => "shch",
        'ъ' => "",
        'ы' => "y",
        'ь' => "",
        'э' => "e",
        'ю' => "yu",
        'я' => "ya",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transliterates_cyrillic_titles() {
        assert_eq!(assign(1, "Терминатор"), ("1-terminator".to_string(), SlugSource::Transliterated));
    }

    #[test]
    fn ascii_text_takes_the_transliterated_path() {
        assert_eq!(
            assign(2, "Terminator 2"),
            ("2-terminator-2".to_string(), SlugSource::Transliterated)
        );
    }

    #[test]
    fn transliterates_names_with_soft_signs() {
        let (slug, source) = assign(1, "Арнольд Шварценеггер");
        assert_eq!(slug, "1-arnold-shvartsenegger");
        assert_eq!(source, SlugSource::Transliterated);
    }

    #[test]
    fn unmappable_text_falls_back_to_raw_slugify() {
        let (slug, source) = assign(5, "千と千尋の神隠し");
        assert_eq!(slug, "5-");
        assert_eq!(source, SlugSource::Raw);
    }

    #[test]
    fn mixed_script_with_unmappable_chars_keeps_the_ascii_part() {
        let (slug, source) = assign(7, "Spirited Away 千尋");
        assert_eq!(slug, "7-spirited-away");
        assert_eq!(source, SlugSource::Raw);
    }

    #[test]
    fn slugify_collapses_separators_and_drops_punctuation() {
        assert_eq!(slugify("Mad Max: Fury Road"), "mad-max-fury-road");
        assert_eq!(slugify("  spaced   out __ title "), "spaced-out-title");
    }
}
