//! Realistic text chosen by column name.

use fake::Fake;
use fake::faker::address::en::{BuildingNumber, CityName, CountryName, StreetName};
use fake::faker::company::en::CompanyName;
use fake::faker::internet::en::{DomainSuffix, SafeEmail, Username};
use fake::faker::lorem::en::{Paragraph, Sentence, Word, Words};
use fake::faker::name::en::{FirstName, LastName, Name};
use fake::faker::phone_number::en::PhoneNumber;
use rand_chacha::ChaCha8Rng;

/// Text matching what the column name suggests, if anything.
///
/// More specific names are checked first (`first_name` before `name`).
pub fn by_column_name(column: &str, rng: &mut ChaCha8Rng) -> Option<String> {
    let name = column.to_lowercase();
    let has = |needle: &str| name.contains(needle);

    let value: String = if has("email") {
        SafeEmail().fake_with_rng(rng)
    } else if has("first_name") || has("firstname") {
        FirstName().fake_with_rng(rng)
    } else if has("last_name") || has("lastname") || has("surname") {
        LastName().fake_with_rng(rng)
    } else if has("username") || has("login") {
        Username().fake_with_rng(rng)
    } else if has("phone") || has("mobile") {
        PhoneNumber().fake_with_rng(rng)
    } else if has("city") {
        CityName().fake_with_rng(rng)
    } else if has("country") {
        CountryName().fake_with_rng(rng)
    } else if has("street") || has("address") {
        let number: String = BuildingNumber().fake_with_rng(rng);
        let street: String = StreetName().fake_with_rng(rng);
        format!("{number} {street}")
    } else if has("company") || has("organization") {
        CompanyName().fake_with_rng(rng)
    } else if has("url") || has("website") {
        let host = word(rng);
        let suffix: String = DomainSuffix().fake_with_rng(rng);
        format!("https://{}.{suffix}", host.to_lowercase())
    } else if has("name") {
        Name().fake_with_rng(rng)
    } else if has("title") {
        let sentence: String = Sentence(2..5).fake_with_rng(rng);
        sentence.trim_end_matches('.').to_string()
    } else if has("description") || has("comment") || has("notes") || has("bio") {
        Paragraph(1..3).fake_with_rng(rng)
    } else {
        return None;
    };
    Some(value)
}

pub fn word(rng: &mut ChaCha8Rng) -> String {
    Word().fake_with_rng(rng)
}

/// Filler for text columns without a recognised name.
pub fn words(rng: &mut ChaCha8Rng) -> String {
    let words: Vec<String> = Words(1..4).fake_with_rng(rng);
    words.join(" ")
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn specific_names_win_over_generic_ones() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let email = by_column_name("Email", &mut rng).expect("email");
        assert!(email.contains('@'));

        let url = by_column_name("website_url", &mut rng).expect("url");
        assert!(url.starts_with("https://"));

        assert!(by_column_name("quantity_label", &mut rng).is_none());
    }

    #[test]
    fn same_seed_same_text() {
        let mut first = ChaCha8Rng::seed_from_u64(9);
        let mut second = ChaCha8Rng::seed_from_u64(9);
        assert_eq!(
            by_column_name("full_name", &mut first),
            by_column_name("full_name", &mut second)
        );
    }
}
