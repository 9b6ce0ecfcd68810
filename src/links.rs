//! Deep-link construction for payment and messaging apps.
//!
//! Construction only: nothing here performs a network call, and a link's
//! validity on the recipient's device is out of this tool's hands. The UPI id
//! passes through unvalidated.

const FALLBACK_MERCHANT: &str = "Merchant";

/// Build a `upi://pay` deep link, or `None` when no UPI id is configured
/// (callers then skip the payment section entirely).
pub fn payment_link(upi_id: &str, merchant_name: &str) -> Option<String> {
    let upi_id = upi_id.trim();
    if upi_id.is_empty() {
        return None;
    }

    let name = merchant_name.trim();
    let name = if name.is_empty() { FALLBACK_MERCHANT } else { name };

    Some(format!(
        "upi://pay?pa={upi_id}&pn={}&cu=INR",
        urlencoding::encode(name)
    ))
}

/// Build a `wa.me` click-to-chat link. `phone` must already be normalized
/// (digits and leading `+` only); the text is percent-encoded so reserved
/// characters, newlines, and emoji survive the round trip.
pub fn message_link(phone: &str, text: &str) -> String {
    format!("https://wa.me/{phone}?text={}", urlencoding::encode(text))
}

/// Append the payment section the recipient taps through.
pub fn append_payment_section(message: &str, link: &str) -> String {
    format!("{message}\n\nPay here:\n{link}")
}

#[cfg(test)]
mod tests {
    use super::{append_payment_section, message_link, payment_link};

    #[test]
    fn payment_link_requires_a_upi_id() {
        assert_eq!(payment_link("", "My Shop"), None);
        assert_eq!(payment_link("   ", "My Shop"), None);
    }

    #[test]
    fn payment_link_encodes_merchant_name() {
        assert_eq!(
            payment_link("shop@upi", "My Shop").as_deref(),
            Some("upi://pay?pa=shop@upi&pn=My%20Shop&cu=INR")
        );
    }

    #[test]
    fn payment_link_defaults_merchant_name() {
        assert_eq!(
            payment_link("shop@upi", "").as_deref(),
            Some("upi://pay?pa=shop@upi&pn=Merchant&cu=INR")
        );
    }

    #[test]
    fn message_link_is_exact_for_simple_text() {
        assert_eq!(
            message_link("+911234567890", "Hi there"),
            "https://wa.me/+911234567890?text=Hi%20there"
        );
    }

    #[test]
    fn message_link_text_round_trips_reserved_characters() {
        let text = "Due today & tomorrow? yes\nPay here: 100% 🙏";
        let link = message_link("+911234567890", text);

        let url = url::Url::parse(&link).expect("well-formed URL");
        let decoded = url
            .query_pairs()
            .find(|(key, _)| key == "text")
            .map(|(_, value)| value.into_owned())
            .expect("text parameter present");
        assert_eq!(decoded, text);
    }

    #[test]
    fn payment_section_is_appended_after_a_blank_line() {
        let combined = append_payment_section("Hello Riya", "upi://pay?pa=a@b&pn=M&cu=INR");
        assert_eq!(combined, "Hello Riya\n\nPay here:\nupi://pay?pa=a@b&pn=M&cu=INR");
    }
}
