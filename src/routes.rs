//! HTTP surface: the axum router and request handlers.
//!
//! Reads are public; writes require the admin bearer token, except the four
//! public submission endpoints (donations, volunteers, contact, newsletter).
//! List and fetch endpoints accept a `lang` query parameter and serve
//! translated field values where entries exist.

use axum::extract::{Path, Query, Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::db::Database;
use crate::error::{is_foreign_key_violation, is_unique_violation, ApiError};
use crate::i18n::{self, Localize};
use crate::models::*;
use crate::notify::{NotificationEvent, Notifier};
use crate::payments::PaymentGateway;
use crate::security;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub notifier: Notifier,
    pub payments: PaymentGateway,
    pub config: Config,
}

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .route("/projects", get(list_projects))
        .route("/projects/:id", get(get_project))
        .route("/events", get(list_events))
        .route("/events/:id", get(get_event))
        .route("/gallery", get(list_gallery))
        .route("/gallery/:id", get(get_gallery_image))
        .route("/testimonials", get(list_testimonials))
        .route("/careers", get(list_careers))
        .route("/careers/:id", get(get_career))
        .route("/impact", get(list_impact_stats))
        .route("/team", get(list_team_members))
        .route("/blog", get(list_blog_posts))
        .route("/blog/:id", get(get_blog_post))
        .route("/languages", get(list_languages))
        .route("/translations/resolve", get(resolve_translation))
        .route("/donations", post(create_donation))
        .route("/volunteers", post(create_volunteer))
        .route("/contact", post(create_contact_message))
        .route("/newsletter", post(subscribe_newsletter))
        .route("/newsletter/unsubscribe", post(unsubscribe_newsletter))
        .route("/payments/order", post(create_payment_order))
        .route("/payments/confirm", post(confirm_payment));

    let admin = Router::new()
        .route("/projects", post(create_project))
        .route("/projects/:id", put(update_project).delete(delete_project))
        .route("/events", post(create_event))
        .route("/events/:id", put(update_event).delete(delete_event))
        .route("/gallery", post(create_gallery_image))
        .route("/gallery/:id", put(update_gallery_image).delete(delete_gallery_image))
        .route("/testimonials", post(create_testimonial))
        .route("/testimonials/:id", put(update_testimonial).delete(delete_testimonial))
        .route("/careers", post(create_career))
        .route("/careers/:id", put(update_career).delete(delete_career))
        .route("/impact", post(create_impact_stat))
        .route("/impact/:id", put(update_impact_stat).delete(delete_impact_stat))
        .route("/team", post(create_team_member))
        .route("/team/:id", put(update_team_member).delete(delete_team_member))
        .route("/blog", post(create_blog_post))
        .route("/blog/:id", put(update_blog_post).delete(delete_blog_post))
        .route("/donations", get(list_donations))
        .route("/donations/:id", get(get_donation))
        .route("/volunteers", get(list_volunteers))
        .route("/volunteers/:id", put(update_volunteer_status).delete(delete_volunteer))
        .route("/contact", get(list_contact_messages))
        .route("/contact/:id", put(update_contact_status).delete(delete_contact_message))
        .route("/newsletter", get(list_newsletter_subscriptions))
        .route("/languages", post(create_language))
        .route("/languages/:id", put(update_language).delete(delete_language))
        .route("/translations", get(list_translations).post(create_translation))
        .route("/translations/:id", put(update_translation).delete(delete_translation))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    Router::new()
        .nest("/api", public.merge(admin))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Admin guard: a static bearer token compared in constant time.
async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(security::bearer_token);

    match token {
        Some(t) if security::token_matches(t, &state.config.admin_token) => {
            Ok(next.run(request).await)
        }
        _ => Err(ApiError::Unauthorized),
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

#[derive(Debug, Deserialize)]
struct LangQuery {
    lang: Option<String>,
}

/// Localize a batch of records in place when a language was requested.
async fn localize_records<T: Localize>(
    db: &Database,
    records: &mut [T],
    lang: Option<&str>,
) -> Result<(), ApiError> {
    if let Some(lang) = lang {
        for record in records.iter_mut() {
            i18n::localize(db, record, lang).await?;
        }
    }
    Ok(())
}

// ==================== Projects ====================

async fn list_projects(
    State(state): State<AppState>,
    Query(q): Query<LangQuery>,
) -> Result<Json<Vec<Project>>, ApiError> {
    let mut projects = state.db.list_projects().await?;
    localize_records(&state.db, &mut projects, q.lang.as_deref()).await?;
    Ok(Json(projects))
}

async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(q): Query<LangQuery>,
) -> Result<Json<Project>, ApiError> {
    let mut project = state
        .db
        .get_project(id)
        .await?
        .ok_or(ApiError::NotFound("project"))?;
    localize_records(&state.db, std::slice::from_mut(&mut project), q.lang.as_deref()).await?;
    Ok(Json(project))
}

async fn create_project(
    State(state): State<AppState>,
    Json(payload): Json<ProjectPayload>,
) -> Result<(StatusCode, Json<Project>), ApiError> {
    let project = state.db.create_project(&payload).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

async fn update_project(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<ProjectPayload>,
) -> Result<Json<Project>, ApiError> {
    let project = state
        .db
        .update_project(id, &payload)
        .await?
        .ok_or(ApiError::NotFound("project"))?;
    Ok(Json(project))
}

async fn delete_project(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    if state.db.delete_project(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("project"))
    }
}

// ==================== Events ====================

async fn list_events(
    State(state): State<AppState>,
    Query(q): Query<LangQuery>,
) -> Result<Json<Vec<Event>>, ApiError> {
    let mut events = state.db.list_events().await?;
    localize_records(&state.db, &mut events, q.lang.as_deref()).await?;
    Ok(Json(events))
}

async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(q): Query<LangQuery>,
) -> Result<Json<Event>, ApiError> {
    let mut event = state
        .db
        .get_event(id)
        .await?
        .ok_or(ApiError::NotFound("event"))?;
    localize_records(&state.db, std::slice::from_mut(&mut event), q.lang.as_deref()).await?;
    Ok(Json(event))
}

async fn create_event(
    State(state): State<AppState>,
    Json(payload): Json<EventPayload>,
) -> Result<(StatusCode, Json<Event>), ApiError> {
    let event = state.db.create_event(&payload).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

async fn update_event(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<EventPayload>,
) -> Result<Json<Event>, ApiError> {
    let event = state
        .db
        .update_event(id, &payload)
        .await?
        .ok_or(ApiError::NotFound("event"))?;
    Ok(Json(event))
}

async fn delete_event(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    if state.db.delete_event(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("event"))
    }
}

// ==================== Gallery ====================

#[derive(Debug, Deserialize)]
struct GalleryQuery {
    lang: Option<String>,
    category: Option<String>,
    featured: Option<bool>,
}

async fn list_gallery(
    State(state): State<AppState>,
    Query(q): Query<GalleryQuery>,
) -> Result<Json<Vec<GalleryImage>>, ApiError> {
    if let Some(category) = q.category.as_deref() {
        if !GALLERY_CATEGORIES.contains(&category) {
            return Err(ApiError::validation(format!(
                "unknown gallery category '{}'",
                category
            )));
        }
    }

    let mut images = state
        .db
        .list_gallery_images(q.category.as_deref(), q.featured)
        .await?;
    localize_records(&state.db, &mut images, q.lang.as_deref()).await?;
    Ok(Json(images))
}

async fn get_gallery_image(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(q): Query<LangQuery>,
) -> Result<Json<GalleryImage>, ApiError> {
    let mut image = state
        .db
        .get_gallery_image(id)
        .await?
        .ok_or(ApiError::NotFound("gallery image"))?;
    localize_records(&state.db, std::slice::from_mut(&mut image), q.lang.as_deref()).await?;
    Ok(Json(image))
}

fn validate_gallery_image(payload: &GalleryImagePayload) -> Result<(), ApiError> {
    if !GALLERY_CATEGORIES.contains(&payload.category.as_str()) {
        return Err(ApiError::validation(format!(
            "unknown gallery category '{}'",
            payload.category
        )));
    }
    Ok(())
}

async fn create_gallery_image(
    State(state): State<AppState>,
    Json(payload): Json<GalleryImagePayload>,
) -> Result<(StatusCode, Json<GalleryImage>), ApiError> {
    validate_gallery_image(&payload)?;
    let image = state.db.create_gallery_image(&payload).await?;
    Ok((StatusCode::CREATED, Json(image)))
}

async fn update_gallery_image(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<GalleryImagePayload>,
) -> Result<Json<GalleryImage>, ApiError> {
    validate_gallery_image(&payload)?;
    let image = state
        .db
        .update_gallery_image(id, &payload)
        .await?
        .ok_or(ApiError::NotFound("gallery image"))?;
    Ok(Json(image))
}

async fn delete_gallery_image(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    if state.db.delete_gallery_image(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("gallery image"))
    }
}

// ==================== Testimonials ====================

async fn list_testimonials(
    State(state): State<AppState>,
    Query(q): Query<LangQuery>,
) -> Result<Json<Vec<Testimonial>>, ApiError> {
    let mut testimonials = state.db.list_testimonials().await?;
    localize_records(&state.db, &mut testimonials, q.lang.as_deref()).await?;
    Ok(Json(testimonials))
}

async fn create_testimonial(
    State(state): State<AppState>,
    Json(payload): Json<TestimonialPayload>,
) -> Result<(StatusCode, Json<Testimonial>), ApiError> {
    let testimonial = state.db.create_testimonial(&payload).await?;
    Ok((StatusCode::CREATED, Json(testimonial)))
}

async fn update_testimonial(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<TestimonialPayload>,
) -> Result<Json<Testimonial>, ApiError> {
    let testimonial = state
        .db
        .update_testimonial(id, &payload)
        .await?
        .ok_or(ApiError::NotFound("testimonial"))?;
    Ok(Json(testimonial))
}

async fn delete_testimonial(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    if state.db.delete_testimonial(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("testimonial"))
    }
}

// ==================== Careers ====================

async fn list_careers(
    State(state): State<AppState>,
    Query(q): Query<LangQuery>,
) -> Result<Json<Vec<Career>>, ApiError> {
    let mut careers = state.db.list_careers().await?;
    localize_records(&state.db, &mut careers, q.lang.as_deref()).await?;
    Ok(Json(careers))
}

async fn get_career(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(q): Query<LangQuery>,
) -> Result<Json<Career>, ApiError> {
    let mut career = state
        .db
        .get_career(id)
        .await?
        .ok_or(ApiError::NotFound("career"))?;
    localize_records(&state.db, std::slice::from_mut(&mut career), q.lang.as_deref()).await?;
    Ok(Json(career))
}

async fn create_career(
    State(state): State<AppState>,
    Json(payload): Json<CareerPayload>,
) -> Result<(StatusCode, Json<Career>), ApiError> {
    let career = state.db.create_career(&payload).await?;
    Ok((StatusCode::CREATED, Json(career)))
}

async fn update_career(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<CareerPayload>,
) -> Result<Json<Career>, ApiError> {
    let career = state
        .db
        .update_career(id, &payload)
        .await?
        .ok_or(ApiError::NotFound("career"))?;
    Ok(Json(career))
}

async fn delete_career(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    if state.db.delete_career(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("career"))
    }
}

// ==================== Impact stats ====================

async fn list_impact_stats(
    State(state): State<AppState>,
    Query(q): Query<LangQuery>,
) -> Result<Json<Vec<ImpactStat>>, ApiError> {
    let mut stats = state.db.list_impact_stats().await?;
    localize_records(&state.db, &mut stats, q.lang.as_deref()).await?;
    Ok(Json(stats))
}

async fn create_impact_stat(
    State(state): State<AppState>,
    Json(payload): Json<ImpactStatPayload>,
) -> Result<(StatusCode, Json<ImpactStat>), ApiError> {
    let stat = state.db.create_impact_stat(&payload).await?;
    Ok((StatusCode::CREATED, Json(stat)))
}

async fn update_impact_stat(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<ImpactStatPayload>,
) -> Result<Json<ImpactStat>, ApiError> {
    let stat = state
        .db
        .update_impact_stat(id, &payload)
        .await?
        .ok_or(ApiError::NotFound("impact stat"))?;
    Ok(Json(stat))
}

async fn delete_impact_stat(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    if state.db.delete_impact_stat(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("impact stat"))
    }
}

// ==================== Team members ====================

async fn list_team_members(
    State(state): State<AppState>,
    Query(q): Query<LangQuery>,
) -> Result<Json<Vec<TeamMember>>, ApiError> {
    let mut members = state.db.list_team_members().await?;
    localize_records(&state.db, &mut members, q.lang.as_deref()).await?;
    Ok(Json(members))
}

async fn create_team_member(
    State(state): State<AppState>,
    Json(payload): Json<TeamMemberPayload>,
) -> Result<(StatusCode, Json<TeamMember>), ApiError> {
    let member = state.db.create_team_member(&payload).await?;
    Ok((StatusCode::CREATED, Json(member)))
}

async fn update_team_member(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<TeamMemberPayload>,
) -> Result<Json<TeamMember>, ApiError> {
    let member = state
        .db
        .update_team_member(id, &payload)
        .await?
        .ok_or(ApiError::NotFound("team member"))?;
    Ok(Json(member))
}

async fn delete_team_member(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    if state.db.delete_team_member(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("team member"))
    }
}

// ==================== Blog ====================

async fn list_blog_posts(
    State(state): State<AppState>,
    Query(q): Query<LangQuery>,
) -> Result<Json<Vec<BlogPost>>, ApiError> {
    let mut posts = state.db.list_blog_posts(true).await?;
    localize_records(&state.db, &mut posts, q.lang.as_deref()).await?;
    Ok(Json(posts))
}

async fn get_blog_post(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(q): Query<LangQuery>,
) -> Result<Json<BlogPost>, ApiError> {
    let mut post = state
        .db
        .get_blog_post(id)
        .await?
        .ok_or(ApiError::NotFound("blog post"))?;
    localize_records(&state.db, std::slice::from_mut(&mut post), q.lang.as_deref()).await?;
    Ok(Json(post))
}

/// Final slug for a post: the explicit one when given, else derived from the
/// title.
fn blog_slug(payload: &BlogPostPayload) -> Result<String, ApiError> {
    let slug = match payload.slug.as_deref().filter(|s| !s.is_empty()) {
        Some(explicit) => slugify(explicit),
        None => slugify(&payload.title),
    };
    if slug.is_empty() {
        return Err(ApiError::validation("cannot derive a slug from the title"));
    }
    Ok(slug)
}

async fn create_blog_post(
    State(state): State<AppState>,
    Json(payload): Json<BlogPostPayload>,
) -> Result<(StatusCode, Json<BlogPost>), ApiError> {
    let slug = blog_slug(&payload)?;
    let post = state
        .db
        .create_blog_post(&slug, &payload)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::conflict(format!("slug '{}' is already in use", slug))
            } else {
                e.into()
            }
        })?;
    Ok((StatusCode::CREATED, Json(post)))
}

async fn update_blog_post(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<BlogPostPayload>,
) -> Result<Json<BlogPost>, ApiError> {
    let slug = blog_slug(&payload)?;
    let post = state
        .db
        .update_blog_post(id, &slug, &payload)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::conflict(format!("slug '{}' is already in use", slug))
            } else {
                e.into()
            }
        })?
        .ok_or(ApiError::NotFound("blog post"))?;
    Ok(Json(post))
}

async fn delete_blog_post(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    if state.db.delete_blog_post(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("blog post"))
    }
}

// ==================== Donations & payments ====================

fn validate_donation(payload: &DonationPayload) -> Result<(), ApiError> {
    if payload.donor.trim().is_empty() {
        return Err(ApiError::validation("donor name is required"));
    }
    if !is_valid_email(&payload.email) {
        return Err(ApiError::validation("invalid email address"));
    }
    if !payload.amount.is_finite() || payload.amount <= 0.0 {
        return Err(ApiError::validation("amount must be positive"));
    }
    Ok(())
}

async fn create_donation(
    State(state): State<AppState>,
    Json(payload): Json<DonationPayload>,
) -> Result<(StatusCode, Json<Donation>), ApiError> {
    validate_donation(&payload)?;
    let donation = state.db.create_donation(&payload).await?;
    info!("Donation #{} recorded for {}", donation.id, donation.purpose);
    Ok((StatusCode::CREATED, Json(donation)))
}

async fn list_donations(State(state): State<AppState>) -> Result<Json<Vec<Donation>>, ApiError> {
    Ok(Json(state.db.list_donations().await?))
}

async fn get_donation(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Donation>, ApiError> {
    let donation = state
        .db
        .get_donation(id)
        .await?
        .ok_or(ApiError::NotFound("donation"))?;
    Ok(Json(donation))
}

#[derive(Debug, Deserialize)]
struct PaymentOrderRequest {
    donation_id: i32,
}

async fn create_payment_order(
    State(state): State<AppState>,
    Json(request): Json<PaymentOrderRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let donation = state
        .db
        .get_donation(request.donation_id)
        .await?
        .ok_or(ApiError::NotFound("donation"))?;

    let receipt = format!("don_{}", donation.id);
    let order = state
        .payments
        .create_order(donation.amount, &state.config.currency, &receipt)
        .await
        .map_err(|e| ApiError::Gateway(e.to_string()))?;

    state.db.attach_payment_order(donation.id, &order.id).await?;
    info!("Payment order {} created for donation #{}", order.id, donation.id);

    Ok(Json(json!({
        "id": order.id,
        "amount": order.amount,
        "currency": order.currency,
    })))
}

#[derive(Debug, Deserialize)]
struct PaymentConfirmRequest {
    razorpay_order_id: String,
    razorpay_payment_id: String,
}

async fn confirm_payment(
    State(state): State<AppState>,
    Json(request): Json<PaymentConfirmRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let verified = state
        .payments
        .verify_payment(&request.razorpay_payment_id, &request.razorpay_order_id)
        .await
        .map_err(|e| ApiError::Gateway(e.to_string()))?;

    if !verified {
        return Err(ApiError::validation("payment could not be verified"));
    }

    let donation = state
        .db
        .complete_donation_by_order(&request.razorpay_order_id)
        .await?
        .ok_or(ApiError::NotFound("donation"))?;

    state.notifier.dispatch(NotificationEvent::DonationCompleted {
        donor: donation.donor.clone(),
        email: donation.email.clone(),
        phone: donation.phone.clone(),
        amount: donation.amount,
        receipt_id: request.razorpay_order_id,
    });

    Ok(Json(json!({ "status": "success" })))
}

// ==================== Volunteers ====================

fn validate_volunteer(payload: &VolunteerPayload) -> Result<(), ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::validation("name is required"));
    }
    if !is_valid_email(&payload.email) {
        return Err(ApiError::validation("invalid email address"));
    }
    if payload.phone.trim().is_empty() {
        return Err(ApiError::validation("phone number is required"));
    }
    Ok(())
}

async fn create_volunteer(
    State(state): State<AppState>,
    Json(payload): Json<VolunteerPayload>,
) -> Result<(StatusCode, Json<Volunteer>), ApiError> {
    validate_volunteer(&payload)?;
    let volunteer = state.db.create_volunteer(&payload).await?;

    state.notifier.dispatch(NotificationEvent::VolunteerSignup {
        name: volunteer.name.clone(),
        email: volunteer.email.clone(),
        phone: Some(volunteer.phone.clone()),
        area: volunteer.area.clone(),
    });

    Ok((StatusCode::CREATED, Json(volunteer)))
}

async fn list_volunteers(State(state): State<AppState>) -> Result<Json<Vec<Volunteer>>, ApiError> {
    Ok(Json(state.db.list_volunteers().await?))
}

async fn update_volunteer_status(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<StatusPayload>,
) -> Result<Json<Volunteer>, ApiError> {
    if !VOLUNTEER_STATUSES.contains(&payload.status.as_str()) {
        return Err(ApiError::validation(format!(
            "unknown volunteer status '{}'",
            payload.status
        )));
    }
    let volunteer = state
        .db
        .set_volunteer_status(id, &payload.status)
        .await?
        .ok_or(ApiError::NotFound("volunteer"))?;
    Ok(Json(volunteer))
}

async fn delete_volunteer(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    if state.db.delete_volunteer(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("volunteer"))
    }
}

// ==================== Contact messages ====================

fn validate_contact(payload: &ContactMessagePayload) -> Result<(), ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::validation("name is required"));
    }
    if !is_valid_email(&payload.email) {
        return Err(ApiError::validation("invalid email address"));
    }
    if payload.message.trim().is_empty() {
        return Err(ApiError::validation("message is required"));
    }
    Ok(())
}

async fn create_contact_message(
    State(state): State<AppState>,
    Json(payload): Json<ContactMessagePayload>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    validate_contact(&payload)?;
    let message = state.db.create_contact_message(&payload).await?;

    state.notifier.dispatch(NotificationEvent::ContactReceived {
        name: message.name.clone(),
        email: message.email.clone(),
    });

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Message sent successfully" })),
    ))
}

async fn list_contact_messages(
    State(state): State<AppState>,
) -> Result<Json<Vec<ContactMessage>>, ApiError> {
    Ok(Json(state.db.list_contact_messages().await?))
}

async fn update_contact_status(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<StatusPayload>,
) -> Result<Json<ContactMessage>, ApiError> {
    if !CONTACT_STATUSES.contains(&payload.status.as_str()) {
        return Err(ApiError::validation(format!(
            "unknown contact status '{}'",
            payload.status
        )));
    }
    let message = state
        .db
        .set_contact_status(id, &payload.status)
        .await?
        .ok_or(ApiError::NotFound("contact message"))?;
    Ok(Json(message))
}

async fn delete_contact_message(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    if state.db.delete_contact_message(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("contact message"))
    }
}

// ==================== Newsletter ====================

async fn subscribe_newsletter(
    State(state): State<AppState>,
    Json(payload): Json<SubscribePayload>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    if !is_valid_email(&payload.email) {
        return Err(ApiError::validation("invalid email address"));
    }

    let subscription = state.db.subscribe_newsletter(&payload).await.map_err(|e| {
        if is_unique_violation(&e) {
            ApiError::conflict("email is already subscribed")
        } else {
            e.into()
        }
    })?;

    state.notifier.dispatch(NotificationEvent::NewsletterSubscribed {
        email: subscription.email.clone(),
    });

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Successfully subscribed to newsletter" })),
    ))
}

async fn unsubscribe_newsletter(
    State(state): State<AppState>,
    Json(payload): Json<SubscribePayload>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if state.db.unsubscribe_newsletter(&payload.email).await? {
        Ok(Json(json!({ "message": "Unsubscribed" })))
    } else {
        Err(ApiError::NotFound("subscription"))
    }
}

async fn list_newsletter_subscriptions(
    State(state): State<AppState>,
) -> Result<Json<Vec<NewsletterSubscription>>, ApiError> {
    Ok(Json(state.db.list_newsletter_subscriptions().await?))
}

// ==================== Languages ====================

async fn list_languages(State(state): State<AppState>) -> Result<Json<Vec<Language>>, ApiError> {
    Ok(Json(state.db.list_languages().await?))
}

async fn create_language(
    State(state): State<AppState>,
    Json(payload): Json<LanguagePayload>,
) -> Result<(StatusCode, Json<Language>), ApiError> {
    let language = state.db.create_language(&payload).await.map_err(|e| {
        if is_unique_violation(&e) {
            ApiError::conflict(format!("language code '{}' already exists", payload.code))
        } else {
            e.into()
        }
    })?;
    Ok((StatusCode::CREATED, Json(language)))
}

async fn update_language(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<LanguagePayload>,
) -> Result<Json<Language>, ApiError> {
    let language = state
        .db
        .update_language(id, &payload)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::conflict(format!("language code '{}' already exists", payload.code))
            } else {
                e.into()
            }
        })?
        .ok_or(ApiError::NotFound("language"))?;
    Ok(Json(language))
}

async fn delete_language(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    if state.db.delete_language(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("language"))
    }
}

// ==================== Translations ====================

async fn list_translations(
    State(state): State<AppState>,
) -> Result<Json<Vec<TranslationEntry>>, ApiError> {
    Ok(Json(state.db.list_translations().await?))
}

fn map_translation_error(e: sqlx::Error) -> ApiError {
    if is_unique_violation(&e) {
        ApiError::conflict(
            "a translation already exists for this language, content type, field, and record",
        )
    } else if is_foreign_key_violation(&e) {
        ApiError::validation("unknown language code")
    } else {
        e.into()
    }
}

async fn create_translation(
    State(state): State<AppState>,
    Json(payload): Json<TranslationPayload>,
) -> Result<(StatusCode, Json<TranslationEntry>), ApiError> {
    let entry = state
        .db
        .create_translation(&payload)
        .await
        .map_err(map_translation_error)?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn update_translation(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<TranslationPayload>,
) -> Result<Json<TranslationEntry>, ApiError> {
    let entry = state
        .db
        .update_translation(id, &payload)
        .await
        .map_err(map_translation_error)?
        .ok_or(ApiError::NotFound("translation"))?;
    Ok(Json(entry))
}

async fn delete_translation(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    if state.db.delete_translation(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("translation"))
    }
}

#[derive(Debug, Deserialize)]
struct ResolveQuery {
    content_type: String,
    field: String,
    record_id: i32,
    lang: String,
}

/// The simple text lookup: returns the stored translation, or `null` so the
/// caller can fall back to the record's own field value. A miss is not an
/// error.
async fn resolve_translation(
    State(state): State<AppState>,
    Query(q): Query<ResolveQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let text = i18n::resolve(&state.db, &q.content_type, &q.field, q.record_id, &q.lang).await?;
    Ok(Json(json!({ "translated": text.is_some(), "text": text })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn donation(email: &str, amount: f64) -> DonationPayload {
        DonationPayload {
            donor: "Asha".to_string(),
            email: email.to_string(),
            phone: None,
            amount,
            purpose: "education".to_string(),
        }
    }

    #[test]
    fn test_validate_donation() {
        assert!(validate_donation(&donation("asha@example.org", 100.0)).is_ok());
        assert!(validate_donation(&donation("not-an-email", 100.0)).is_err());
        assert!(validate_donation(&donation("asha@example.org", 0.0)).is_err());
        assert!(validate_donation(&donation("asha@example.org", -5.0)).is_err());
        assert!(validate_donation(&donation("asha@example.org", f64::NAN)).is_err());

        let mut nameless = donation("asha@example.org", 100.0);
        nameless.donor = "  ".to_string();
        assert!(validate_donation(&nameless).is_err());
    }

    #[test]
    fn test_validate_volunteer() {
        let valid = VolunteerPayload {
            name: "Ravi".to_string(),
            email: "ravi@example.org".to_string(),
            phone: "+919900112233".to_string(),
            area: "education".to_string(),
        };
        assert!(validate_volunteer(&valid).is_ok());

        let mut no_phone = valid.clone();
        no_phone.phone = "".to_string();
        assert!(validate_volunteer(&no_phone).is_err());

        let mut bad_email = valid.clone();
        bad_email.email = "nope".to_string();
        assert!(validate_volunteer(&bad_email).is_err());
    }

    #[test]
    fn test_validate_contact() {
        let valid = ContactMessagePayload {
            name: "Meera".to_string(),
            email: "meera@example.org".to_string(),
            subject: None,
            message: "Hello".to_string(),
        };
        assert!(validate_contact(&valid).is_ok());

        let mut empty_message = valid.clone();
        empty_message.message = "   ".to_string();
        assert!(validate_contact(&empty_message).is_err());
    }

    #[test]
    fn test_validate_gallery_image() {
        let mut payload = GalleryImagePayload {
            title: "Opening day".to_string(),
            description: "".to_string(),
            image_url: "https://cdn.example.org/1.jpg".to_string(),
            category: "events".to_string(),
            is_featured: false,
        };
        assert!(validate_gallery_image(&payload).is_ok());

        payload.category = "misc".to_string();
        assert!(validate_gallery_image(&payload).is_err());
    }

    #[test]
    fn test_blog_slug_derivation() {
        let mut payload = BlogPostPayload {
            title: "Field Notes, June".to_string(),
            slug: None,
            excerpt: "".to_string(),
            content: "...".to_string(),
            cover_image_url: None,
            published: true,
        };

        assert_eq!(blog_slug(&payload).unwrap(), "field-notes-june");

        payload.slug = Some("Custom Slug!".to_string());
        assert_eq!(blog_slug(&payload).unwrap(), "custom-slug");

        payload.slug = None;
        payload.title = "!!!".to_string();
        assert!(blog_slug(&payload).is_err());
    }
}
