//! Database records of the site.

use serde::Serialize;
use uuid::Uuid;

use crate::db::Record;
use crate::impl_record_fields;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    /// Identity provider subject.
    pub subject: String,
    pub email: String,
    pub name: String,
}

impl_record_fields!(User { subject, email, name });

impl Record for User {
    const TABLE: &'static str = "users";
    type Id = Uuid;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Episode {
    pub number: i32,
    pub title: String,
    pub synopsis: String,
    pub media_duration: i32,
    /// Slug of the collection the episode belongs to.
    pub collection: String,
    pub subscription_only: bool,
}

impl_record_fields!(Episode {
    number,
    title,
    synopsis,
    media_duration,
    collection,
    subscription_only,
});

impl Record for Episode {
    const TABLE: &'static str = "episodes";
    type Id = i64;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Collection {
    pub slug: String,
    pub title: String,
    pub description: String,
}

impl_record_fields!(Collection { slug, title, description });

impl Record for Collection {
    const TABLE: &'static str = "collections";
    type Id = Uuid;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Gift {
    pub gifter_email: String,
    pub months: i32,
    pub message: Option<String>,
    pub redeemed_by: Option<Uuid>,
}

impl_record_fields!(Gift {
    gifter_email,
    months,
    message,
    redeemed_by,
});

impl Record for Gift {
    const TABLE: &'static str = "gifts";
    type Id = Uuid;
}
