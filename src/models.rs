//! Domain records and request payloads.
//!
//! Records mirror the database rows (`sqlx::FromRow`) and serialize straight
//! to the API. Payload structs are what the public/admin endpoints accept.

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::sync::OnceLock;

use crate::i18n::Localize;

// ==================== Content records ====================

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Project {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub category: String,
    pub image_url: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub status: String,
    pub impact_numbers: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectPayload {
    pub title: String,
    pub description: String,
    pub category: String,
    pub image_url: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub status: String,
    #[serde(default = "empty_object")]
    pub impact_numbers: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub location: String,
    pub image_url: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventPayload {
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub location: String,
    pub image_url: Option<String>,
    pub status: String,
}

/// Categories a gallery image may belong to.
pub const GALLERY_CATEGORIES: &[&str] = &["events", "projects", "team", "other"];

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GalleryImage {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub category: String,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GalleryImagePayload {
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub category: String,
    #[serde(default)]
    pub is_featured: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Testimonial {
    pub id: i32,
    pub name: String,
    pub role: String,
    pub content: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TestimonialPayload {
    pub name: String,
    pub role: String,
    pub content: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Career {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub requirements: String,
    pub location: String,
    pub job_type: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CareerPayload {
    pub title: String,
    pub description: String,
    pub requirements: String,
    pub location: String,
    pub job_type: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ImpactStat {
    pub id: i32,
    pub title: String,
    pub number: i32,
    pub description: String,
    pub icon: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImpactStatPayload {
    pub title: String,
    pub number: i32,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TeamMember {
    pub id: i32,
    pub name: String,
    pub role: String,
    pub bio: String,
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TeamMemberPayload {
    pub name: String,
    pub role: String,
    #[serde(default)]
    pub bio: String,
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BlogPost {
    pub id: i32,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    pub cover_image_url: Option<String>,
    pub published: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlogPostPayload {
    pub title: String,
    /// Derived from the title when absent.
    pub slug: Option<String>,
    #[serde(default)]
    pub excerpt: String,
    pub content: String,
    pub cover_image_url: Option<String>,
    #[serde(default)]
    pub published: bool,
}

// ==================== Submissions ====================

pub const DONATION_STATUSES: &[&str] = &["Pending", "Completed"];

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Donation {
    pub id: i32,
    pub donor: String,
    pub email: String,
    pub phone: Option<String>,
    pub amount: f64,
    pub purpose: String,
    pub status: String,
    pub payment_order_id: Option<String>,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DonationPayload {
    pub donor: String,
    pub email: String,
    pub phone: Option<String>,
    pub amount: f64,
    pub purpose: String,
}

pub const VOLUNTEER_STATUSES: &[&str] = &["Pending", "Active"];

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Volunteer {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub area: String,
    pub status: String,
    pub join_date: NaiveDate,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VolunteerPayload {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub area: String,
}

pub const CONTACT_STATUSES: &[&str] = &["new", "in_progress", "resolved"];

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ContactMessage {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
    pub message: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContactMessagePayload {
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct NewsletterSubscription {
    pub id: i32,
    pub email: String,
    pub subscribed_at: DateTime<Utc>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubscribePayload {
    pub email: String,
}

/// Status-only update body for contact messages and volunteers.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusPayload {
    pub status: String,
}

// ==================== Localization ====================

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Language {
    pub id: i32,
    pub name: String,
    pub code: String,
    pub is_default: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LanguagePayload {
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TranslationEntry {
    pub id: i32,
    pub language_code: String,
    pub content_type: String,
    pub field_name: String,
    pub record_id: i32,
    pub translated_text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranslationPayload {
    pub language_code: String,
    pub content_type: String,
    pub field_name: String,
    pub record_id: i32,
    pub translated_text: String,
}

// ==================== Localize implementations ====================

macro_rules! impl_localize {
    ($ty:ty, $name:literal, [$($field:ident),+ $(,)?]) => {
        impl Localize for $ty {
            fn content_type() -> &'static str {
                $name
            }

            fn record_id(&self) -> i32 {
                self.id
            }

            fn localized_fields() -> &'static [&'static str] {
                &[$(stringify!($field)),+]
            }

            fn field(&self, name: &str) -> Option<&str> {
                match name {
                    $(stringify!($field) => Some(self.$field.as_str()),)+
                    _ => None,
                }
            }

            fn set_field(&mut self, name: &str, value: String) {
                match name {
                    $(stringify!($field) => self.$field = value,)+
                    _ => {}
                }
            }
        }
    };
}

impl_localize!(Project, "Project", [title, description]);
impl_localize!(Event, "Event", [title, description, location]);
impl_localize!(GalleryImage, "GalleryImage", [title, description]);
impl_localize!(Testimonial, "Testimonial", [role, content]);
impl_localize!(Career, "Career", [title, description, requirements]);
impl_localize!(ImpactStat, "ImpactStat", [title, description]);
impl_localize!(TeamMember, "TeamMember", [role, bio]);
impl_localize!(BlogPost, "BlogPost", [title, excerpt, content]);

// ==================== Helpers ====================

fn empty_object() -> serde_json::Value {
    serde_json::json!({})
}

/// Validate an email address on the public submission endpoints.
/// Intentionally loose: one `@`, no whitespace, a dot in the domain.
pub fn is_valid_email(email: &str) -> bool {
    static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
    let re = EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex is valid")
    });
    re.is_match(email)
}

/// Derive a URL slug from a blog post title: lowercase, alphanumerics kept,
/// runs of anything else collapsed into single dashes, capped at 200 chars.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_dash = true;

    for c in title.chars() {
        if c.is_alphanumeric() {
            for lower in c.to_lowercase() {
                slug.push(lower);
            }
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }
    slug.truncate(200);
    slug
}
