//! Stateless request validation.
//!
//! Each operation has its own function returning every problem found, so a client
//! can fix a payload in one round trip. An empty vector means the input is valid.

use std::sync::LazyLock;

use regex::Regex;
use validator::{ValidateEmail, ValidateLength};

use crate::domain::accepted::AcceptedCreate;
use crate::domain::inquiry::InquiryCreate;
use crate::domain::item::Item;
use crate::domain::tenant::Tenant;
use crate::domain::user::UserPayload;
use crate::errors::FieldError;

pub fn validate_item_create(item: &Item) -> Vec<FieldError> {
    let mut errors = Vec::new();
    check_min_len(&mut errors, "title", &item.title, 4);
    if item.price < 0 {
        errors.push(FieldError::new("price", "must not be negative"));
    }
    if let (Some(from), Some(to)) = (item.show_from, item.show_to) {
        if from > to {
            errors.push(FieldError::new("showTo", "must not be before showFrom"));
        }
    }
    for (index, entry) in item.date_prices.iter().enumerate() {
        if entry.date_from > entry.date_to {
            errors.push(FieldError::new(
                format!("datePrices[{index}].dateTo"),
                "must not be before dateFrom",
            ));
        }
        if entry.price < 0 {
            errors.push(FieldError::new(
                format!("datePrices[{index}].price"),
                "must not be negative",
            ));
        }
    }
    errors
}

pub fn validate_item_update(item: &Item) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if item.id.0 <= 0 {
        errors.push(FieldError::new("id", "is required"));
    }
    errors.extend(validate_item_create(item));
    errors
}

pub fn validate_inquiry_create(inquiry: &InquiryCreate) -> Vec<FieldError> {
    let mut errors = Vec::new();
    check_min_len(&mut errors, "inquirer", &inquiry.inquirer, 3);
    check_contact(&mut errors, ("email", &inquiry.email), ("phone", &inquiry.phone));
    if inquiry.item_id.0 <= 0 {
        errors.push(FieldError::new("itemId", "is required"));
    }
    if inquiry.date.is_none() {
        errors.push(FieldError::new("date", "is required"));
    }
    errors
}

pub fn validate_accepted(accepted: &AcceptedCreate) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if accepted.inquirer.trim().is_empty() {
        errors.push(FieldError::new("inquirer", "is required"));
    }
    check_contact(
        &mut errors,
        ("inquirerEmail", &accepted.inquirer_email),
        ("inquirerPhone", &accepted.inquirer_phone),
    );

    let has_item_reference = accepted.item_id.0 > 0;
    let has_free_text_item =
        !accepted.item_title.trim().is_empty() && accepted.item_price.is_some();
    if accepted.item_id.0 < 0 {
        errors.push(FieldError::new("itemId", "must be a positive id"));
    } else if !has_item_reference && !has_free_text_item {
        errors.push(FieldError::new("itemId", "is required without itemTitle and itemPrice"));
    }
    if accepted.item_price.is_some_and(|price| price < 0) {
        errors.push(FieldError::new("itemPrice", "must not be negative"));
    }
    if accepted.date_reservation.is_none() {
        errors.push(FieldError::new("dateReservation", "is required"));
    }
    errors
}

pub fn validate_tenant_create(tenant: &Tenant) -> Vec<FieldError> {
    let mut errors = Vec::new();
    check_min_len(&mut errors, "title", &tenant.title, 4);
    check_required_email(&mut errors, "email", &tenant.email);
    errors
}

pub fn validate_tenant_update(tenant: &Tenant) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if tenant.id.0 <= 0 {
        errors.push(FieldError::new("id", "is required"));
    }
    errors.extend(validate_tenant_create(tenant));
    errors
}

pub fn validate_user_create(user: &UserPayload) -> Vec<FieldError> {
    let mut errors = Vec::new();
    check_required(&mut errors, "firstName", &user.first_name);
    check_required(&mut errors, "lastName", &user.last_name);
    check_required(&mut errors, "username", &user.username);
    check_required_email(&mut errors, "email", &user.email);
    if user.password.is_empty() {
        errors.push(FieldError::new("password", "is required"));
    }
    check_confirmation(&mut errors, user);
    errors
}

pub fn validate_user_update(user: &UserPayload) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if user.id.0 <= 0 {
        errors.push(FieldError::new("id", "is required"));
    }
    check_required(&mut errors, "firstName", &user.first_name);
    check_required(&mut errors, "lastName", &user.last_name);
    check_required_email(&mut errors, "email", &user.email);
    check_confirmation(&mut errors, user);
    errors
}

pub fn is_email(value: &str) -> bool {
    value.to_owned().validate_email()
}

/// `+` followed by a country code and subscriber number, 8 to 15 digits total.
static E164_PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+[1-9][0-9]{7,14}$").expect("invalid E.164 pattern"));

pub fn is_e164(value: &str) -> bool {
    E164_PHONE.is_match(value)
}

pub(crate) fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn check_required(errors: &mut Vec<FieldError>, field: &str, value: &str) {
    if !value.trim().to_owned().validate_length(Some(1), None, None) {
        errors.push(FieldError::new(field, "is required"));
    }
}

fn check_min_len(errors: &mut Vec<FieldError>, field: &str, value: &str, min: u64) {
    let trimmed = value.trim().to_owned();
    if trimmed.is_empty() {
        errors.push(FieldError::new(field, "is required"));
    } else if !trimmed.validate_length(Some(min), None, None) {
        errors.push(FieldError::new(field, format!("must be at least {min} characters")));
    }
}

fn check_required_email(errors: &mut Vec<FieldError>, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(FieldError::new(field, "is required"));
    } else if !is_email(value.trim()) {
        errors.push(FieldError::new(field, "must be a valid email address"));
    }
}

/// At least one of the two contact fields, each well-formed when present.
fn check_contact(errors: &mut Vec<FieldError>, email: (&str, &str), phone: (&str, &str)) {
    let (email_field, email_value) = (email.0, email.1.trim());
    let (phone_field, phone_value) = (phone.0, phone.1.trim());

    if email_value.is_empty() && phone_value.is_empty() {
        errors.push(FieldError::new(email_field, format!("is required without {phone_field}")));
        errors.push(FieldError::new(phone_field, format!("is required without {email_field}")));
        return;
    }
    if !email_value.is_empty() && !is_email(email_value) {
        errors.push(FieldError::new(email_field, "must be a valid email address"));
    }
    if !phone_value.is_empty() && !is_e164(phone_value) {
        errors.push(FieldError::new(phone_field, "must be an E.164 phone number"));
    }
}

fn check_confirmation(errors: &mut Vec<FieldError>, user: &UserPayload) {
    if user.password != user.confirm {
        errors.push(FieldError::new("confirm", "must match password"));
    }
}
