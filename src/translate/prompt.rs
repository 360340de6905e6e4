use crate::subtitle::SubtitleEntry;

/// Separator between an entry index and its text, in both directions
pub const ID_SEPARATOR: &str = ">>>";

/// A chat prompt: fixed rules in the system message, the entries in the user message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// Build the translation prompt for a run of entries
///
/// Every entry of the batch is included so the model can use neighbouring
/// lines to disambiguate. Multi-line entries keep their line breaks; the
/// continuation lines follow the `ID >>> first line` line.
pub fn build_prompt(entries: &[SubtitleEntry], target_language: &str) -> Prompt {
    let language_name = language_code_to_name(target_language);

    let system = format!(
        "You are a professional subtitle translator. Translate the text to {}.\n\
         RULES:\n\
         1. Output format must be strictly: ID {} Translated Text\n\
         2. Maintain the exact same IDs as the input, one translation per ID.\n\
         3. Keep HTML tags (<i>, <b>, <u>, <font>) exactly as they are.\n\
         4. Keep line breaks inside a subtitle: continuation lines follow their ID line.\n\
         5. Do not output anything else.",
        language_name, ID_SEPARATOR
    );

    let user = entries
        .iter()
        .map(|entry| format!("{} {} {}", entry.index, ID_SEPARATOR, entry.text.join("\n")))
        .collect::<Vec<_>>()
        .join("\n");

    Prompt { system, user }
}

/// Expand two-letter language codes to names the model understands reliably
pub fn language_code_to_name(language: &str) -> String {
    let language = language.trim();
    let name = match language.to_lowercase().as_str() {
        "ar" => "Arabic",
        "cs" => "Czech",
        "da" => "Danish",
        "de" => "German",
        "el" => "Greek",
        "en" => "English",
        "es" => "Spanish",
        "fi" => "Finnish",
        "fr" => "French",
        "he" => "Hebrew",
        "hi" => "Hindi",
        "hu" => "Hungarian",
        "id" => "Indonesian",
        "it" => "Italian",
        "ja" => "Japanese",
        "ko" => "Korean",
        "nl" => "Dutch",
        "no" => "Norwegian",
        "pl" => "Polish",
        "pt" => "Portuguese",
        "ro" => "Romanian",
        "ru" => "Russian",
        "sv" => "Swedish",
        "th" => "Thai",
        "tr" => "Turkish",
        "uk" => "Ukrainian",
        "vi" => "Vietnamese",
        "zh" => "Chinese",
        _ => return language.to_string(),
    };
    name.to_string()
}
