//! Localized "translation pending" messages
//!
//! Returned in the `pending` block so a client polling in its own language
//! sees the retry hint in that language where we have one.

/// Look up the pending message for a language code, falling back to English.
pub fn pending_message(lang: &str) -> &'static str {
    match lang.to_ascii_lowercase().as_str() {
        "es" => "El contenido se está traduciendo a español. Por favor, inténtelo de nuevo en unos segundos.",
        "fr" => "Le contenu est en cours de traduction en français. Veuillez réessayer dans quelques instants.",
        "de" => "Inhalte werden ins Deutsche übersetzt. Bitte versuchen Sie es in Kürze wieder.",
        "it" => "Il contenuto è in fase di traduzione in italiano. Riprova tra qualche istante.",
        "jp" => "コンテンツは日本語に翻訳中です。数秒後にもう一度お試しください。",
        _ => "Content is being translated. Please try again in a few moments.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_language_gets_localized_message() {
        assert!(pending_message("fr").contains("français"));
        assert!(pending_message("FR").contains("français"));
    }

    #[test]
    fn unknown_language_falls_back_to_default() {
        assert!(pending_message("nl").starts_with("Content is being translated"));
    }
}
