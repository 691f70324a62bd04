/// Reserved words of the filter language.
///
/// Keywords are recognised after an identifier has been scanned, so
/// `index` or `nullable` stay plain identifiers.
#[derive(
    Debug, Clone, PartialEq, strum::EnumString, strum::Display, strum::EnumIter, strum::AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum Keyword {
    True,
    False,
    Null,
    In,
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_keyword_round_trip() {
        for kw in Keyword::iter() {
            let text = kw.to_string();
            assert_eq!(Keyword::try_from(text.as_str()).unwrap(), kw);
        }
    }

    #[test]
    fn test_keyword_is_case_sensitive() {
        assert!(Keyword::try_from("True").is_err());
        assert!(Keyword::try_from("IN").is_err());
    }
}
