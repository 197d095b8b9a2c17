//! Contact form. Submitting hands a `mailto:` URI to the user's mail client;
//! nothing leaves the machine otherwise.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::borrow::Cow;
use tracing::info;
use validator::{Validate, ValidationError};

use crate::errors::FormErrors;
use crate::nav::Notice;

pub const DEFAULT_RECIPIENT: &str = "vaibhavsinghal2808@gmail.com";

/// Characters `encodeURIComponent` leaves alone.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

#[derive(Debug, Clone, Default, Validate)]
pub struct ContactForm {
    #[validate(length(min = 2, message = "Name must be at least 2 characters."))]
    pub name: String,
    #[validate(email(message = "Please enter a valid email address."))]
    pub email: String,
    #[validate(custom(function = "validate_message_length"))]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactSubmission {
    pub uri: String,
    pub notice: Notice,
}

fn validate_message_length(value: &str) -> Result<(), ValidationError> {
    let n = value.chars().count();
    if n < 10 {
        return Err(ValidationError::new("length")
            .with_message(Cow::Borrowed("Message must be at least 10 characters.")));
    }
    if n > 500 {
        return Err(ValidationError::new("length")
            .with_message(Cow::Borrowed("Message cannot exceed 500 characters.")));
    }
    Ok(())
}

pub fn encode_component(s: &str) -> String {
    utf8_percent_encode(s, URI_COMPONENT).to_string()
}

impl ContactForm {
    pub fn new(name: impl Into<String>, email: impl Into<String>, message: impl Into<String>) -> Self {
        Self { name: name.into(), email: email.into(), message: message.into() }
    }

    pub fn mailto_uri(&self, recipient: &str) -> String {
        let subject = format!("Contact Form Submission from {}", self.name);
        let body = format!("Name: {}\nEmail: {}\n\nMessage:\n{}", self.name, self.email, self.message);
        format!(
            "mailto:{}?subject={}&body={}",
            recipient,
            encode_component(&subject),
            encode_component(&body)
        )
    }

    pub fn submit(&self, recipient: &str) -> Result<ContactSubmission, FormErrors> {
        self.validate().map_err(|e| FormErrors::from_validation(&e))?;
        info!(chars = self.message.chars().count(), "contact form submitted");
        Ok(ContactSubmission {
            uri: self.mailto_uri(recipient),
            notice: Notice::info(
                "Opening Email Client",
                "Please check your email application to send the message.",
            ),
        })
    }
}
