//! Regex-based text anonymizer.
//!
//! Replaces Finnish personal identity codes, IPv4 addresses and phone
//! numbers with placeholder tags. Rules run in a fixed order so that an
//! identity code is never half-consumed by the phone rules.

use std::sync::LazyLock;

use regex::Regex;

use tracksync_core::anonymizer::Anonymizer;

pub const HETU_TAG: &str = "<hetu>";
pub const IP_TAG: &str = "<ip>";
pub const PHONE_TAG: &str = "<phone>";

// Personal identity code: DDMMYY, century sign, 3-digit individual number,
// check character.
static HETU: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b\d{6}[-+a-fu-y]\d{3}[0-9a-y]\b").expect("valid hetu pattern")
});

static IPV4: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:\d{1,3}\.){3}\d{1,3}\b").expect("valid ip pattern")
});

// +358..., (+358)..., 00358...
static INTERNATIONAL_PHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\(\+\d{1,3}\)|\+\d{1,3}|\b00\d{1,3})(?:[ -]?\d){6,12}\b")
        .expect("valid international phone pattern")
});

// 050 1234567, 040-654 3210, ...
static DOMESTIC_PHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b0\d{2}(?:[ -]?\d){5,8}\b").expect("valid domestic phone pattern")
});

/// Default [`Anonymizer`] used for conversations sent to the remote store.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexAnonymizer;

impl RegexAnonymizer {
    pub fn new() -> Self {
        Self
    }

    fn rules() -> [(&'static Regex, &'static str); 4] {
        [
            (&*HETU, HETU_TAG),
            (&*IPV4, IP_TAG),
            (&*INTERNATIONAL_PHONE, PHONE_TAG),
            (&*DOMESTIC_PHONE, PHONE_TAG),
        ]
    }
}

impl Anonymizer for RegexAnonymizer {
    fn anonymize_text(&self, text: &str) -> String {
        let mut result = text.to_string();
        for (pattern, tag) in Self::rules() {
            result = pattern.replace_all(&result, tag).into_owned();
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(text: &str, expected: &str) {
        let result = RegexAnonymizer::new().anonymize_text(text);
        assert_eq!(result, expected, "original text: {text}");
    }

    #[test]
    fn test_phone_numbers() {
        let positives = [
            "05012345",
            "050123456",
            "0501234567",
            "050 1234567",
            "050 1234 567",
            "050-1234567",
            "050-1234 567",
            "050-1234-567",
            "+358501234567",
            "(+358)501234567",
            "+358 50 1234567",
            "00358 50 123456",
            "+47 23 34980",
        ];
        for number in positives {
            check(number, "<phone>");
        }
    }

    #[test]
    fn test_multiple_phone_numbers() {
        check(
            "Numeroni on 050-1234567, 040-654 3210, +358508734987 tai +358 50 8734 987.",
            "Numeroni on <phone>, <phone>, <phone> tai <phone>.",
        );
    }

    #[test]
    fn test_hetus() {
        let positives = [
            "251308A2983",
            "251308a2983",
            "020976-398H",
            "020976-398h",
            "122498+9842",
            "010594Y9021",
            "020594X903P",
            "030594W903B",
            "040594V902Y",
            "050594U903M",
            "010516B903X",
            "020516C902J",
            "030516D9037",
            "010501E9032",
            "020503F9037",
            "020504A902E",
        ];
        for hetu in positives {
            check(hetu, "<hetu>");
        }
    }

    #[test]
    fn test_mixed_sentence() {
        check(
            "Numeroni on 040-4667288, hetuni on 120587-763A ja ip on 127.0.0.1.",
            "Numeroni on <phone>, hetuni on <hetu> ja ip on <ip>.",
        );
    }

    #[test]
    fn test_dates_and_times_untouched() {
        let negatives = [
            "25.12.2019",
            "Aika: 10:23 12.01.2020.",
            "klo 14.20",
            "2014-01-01 12:34",
        ];
        for text in negatives {
            check(text, text);
        }
    }

    #[test]
    fn test_plain_text_untouched() {
        check("Hei, mitä kuuluu?", "Hei, mitä kuuluu?");
    }

    #[test]
    fn test_idempotent() {
        let anonymizer = RegexAnonymizer::new();
        let once = anonymizer.anonymize_text("soita 050-1234567");
        assert_eq!(anonymizer.anonymize_text(&once), once);
    }
}
