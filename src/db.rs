use anyhow::{Context, Result};
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::i18n::TranslationLookup;
use crate::models::{
    BlogPost, BlogPostPayload, Career, CareerPayload, ContactMessage, ContactMessagePayload,
    Donation, DonationPayload, Event, EventPayload, GalleryImage, GalleryImagePayload, ImpactStat,
    ImpactStatPayload, Language, LanguagePayload, NewsletterSubscription, Project, ProjectPayload,
    SubscribePayload, Testimonial, TestimonialPayload, TeamMember, TeamMemberPayload,
    TranslationEntry, TranslationPayload, Volunteer, VolunteerPayload,
};

/// Idempotent schema, applied at startup.
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS projects (
        id SERIAL PRIMARY KEY,
        title TEXT NOT NULL,
        description TEXT NOT NULL,
        category TEXT NOT NULL,
        image_url TEXT,
        start_date DATE NOT NULL,
        end_date DATE,
        status TEXT NOT NULL,
        impact_numbers JSONB NOT NULL DEFAULT '{}',
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE TABLE IF NOT EXISTS events (
        id SERIAL PRIMARY KEY,
        title TEXT NOT NULL,
        description TEXT NOT NULL,
        date TIMESTAMPTZ NOT NULL,
        location TEXT NOT NULL,
        image_url TEXT,
        status TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE TABLE IF NOT EXISTS gallery_images (
        id SERIAL PRIMARY KEY,
        title TEXT NOT NULL,
        description TEXT NOT NULL,
        image_url TEXT NOT NULL,
        category TEXT NOT NULL,
        is_featured BOOLEAN NOT NULL DEFAULT FALSE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE TABLE IF NOT EXISTS testimonials (
        id SERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        role TEXT NOT NULL,
        content TEXT NOT NULL,
        image_url TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE TABLE IF NOT EXISTS careers (
        id SERIAL PRIMARY KEY,
        title TEXT NOT NULL,
        description TEXT NOT NULL,
        requirements TEXT NOT NULL,
        location TEXT NOT NULL,
        job_type TEXT NOT NULL,
        status TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE TABLE IF NOT EXISTS impact_stats (
        id SERIAL PRIMARY KEY,
        title TEXT NOT NULL,
        number INTEGER NOT NULL,
        description TEXT NOT NULL,
        icon TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE TABLE IF NOT EXISTS team_members (
        id SERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        role TEXT NOT NULL,
        bio TEXT NOT NULL DEFAULT '',
        photo_url TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE TABLE IF NOT EXISTS blog_posts (
        id SERIAL PRIMARY KEY,
        title TEXT NOT NULL,
        slug TEXT NOT NULL UNIQUE,
        excerpt TEXT NOT NULL DEFAULT '',
        content TEXT NOT NULL,
        cover_image_url TEXT,
        published BOOLEAN NOT NULL DEFAULT FALSE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE TABLE IF NOT EXISTS donations (
        id SERIAL PRIMARY KEY,
        donor TEXT NOT NULL,
        email TEXT NOT NULL,
        phone TEXT,
        amount DOUBLE PRECISION NOT NULL,
        purpose TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'Pending',
        payment_order_id TEXT,
        date DATE NOT NULL DEFAULT CURRENT_DATE
    )",
    "CREATE TABLE IF NOT EXISTS volunteers (
        id SERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT NOT NULL,
        phone TEXT NOT NULL,
        area TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'Pending',
        join_date DATE NOT NULL DEFAULT CURRENT_DATE
    )",
    "CREATE TABLE IF NOT EXISTS contact_messages (
        id SERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT NOT NULL,
        subject TEXT,
        message TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'new',
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE TABLE IF NOT EXISTS newsletter_subscriptions (
        id SERIAL PRIMARY KEY,
        email TEXT NOT NULL UNIQUE,
        subscribed_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        is_active BOOLEAN NOT NULL DEFAULT TRUE
    )",
    "CREATE TABLE IF NOT EXISTS languages (
        id SERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        code TEXT NOT NULL UNIQUE,
        is_default BOOLEAN NOT NULL DEFAULT FALSE
    )",
    "CREATE TABLE IF NOT EXISTS translations (
        id SERIAL PRIMARY KEY,
        language_code TEXT NOT NULL REFERENCES languages(code) ON DELETE CASCADE,
        content_type TEXT NOT NULL,
        field_name TEXT NOT NULL,
        record_id INTEGER NOT NULL,
        translated_text TEXT NOT NULL,
        UNIQUE (language_code, content_type, field_name, record_id)
    )",
];

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Open the connection pool.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .context("Failed to connect to PostgreSQL")?;

        Ok(Self { pool })
    }

    /// Create any missing tables.
    pub async fn migrate(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .context("Failed to apply schema statement")?;
        }
        Ok(())
    }

    // ==================== Projects ====================

    pub async fn list_projects(&self) -> sqlx::Result<Vec<Project>> {
        sqlx::query_as::<_, Project>("SELECT * FROM projects ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await
    }

    pub async fn get_project(&self, id: i32) -> sqlx::Result<Option<Project>> {
        sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn create_project(&self, p: &ProjectPayload) -> sqlx::Result<Project> {
        sqlx::query_as::<_, Project>(
            "INSERT INTO projects (title, description, category, image_url, start_date, end_date, status, impact_numbers)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING *",
        )
        .bind(&p.title)
        .bind(&p.description)
        .bind(&p.category)
        .bind(&p.image_url)
        .bind(p.start_date)
        .bind(p.end_date)
        .bind(&p.status)
        .bind(&p.impact_numbers)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn update_project(&self, id: i32, p: &ProjectPayload) -> sqlx::Result<Option<Project>> {
        sqlx::query_as::<_, Project>(
            "UPDATE projects
             SET title = $2, description = $3, category = $4, image_url = $5,
                 start_date = $6, end_date = $7, status = $8, impact_numbers = $9
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(&p.title)
        .bind(&p.description)
        .bind(&p.category)
        .bind(&p.image_url)
        .bind(p.start_date)
        .bind(p.end_date)
        .bind(&p.status)
        .bind(&p.impact_numbers)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn delete_project(&self, id: i32) -> sqlx::Result<bool> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ==================== Events ====================

    pub async fn list_events(&self) -> sqlx::Result<Vec<Event>> {
        sqlx::query_as::<_, Event>("SELECT * FROM events ORDER BY date DESC")
            .fetch_all(&self.pool)
            .await
    }

    pub async fn get_event(&self, id: i32) -> sqlx::Result<Option<Event>> {
        sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn create_event(&self, e: &EventPayload) -> sqlx::Result<Event> {
        sqlx::query_as::<_, Event>(
            "INSERT INTO events (title, description, date, location, image_url, status)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING *",
        )
        .bind(&e.title)
        .bind(&e.description)
        .bind(e.date)
        .bind(&e.location)
        .bind(&e.image_url)
        .bind(&e.status)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn update_event(&self, id: i32, e: &EventPayload) -> sqlx::Result<Option<Event>> {
        sqlx::query_as::<_, Event>(
            "UPDATE events
             SET title = $2, description = $3, date = $4, location = $5, image_url = $6, status = $7
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(&e.title)
        .bind(&e.description)
        .bind(e.date)
        .bind(&e.location)
        .bind(&e.image_url)
        .bind(&e.status)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn delete_event(&self, id: i32) -> sqlx::Result<bool> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ==================== Gallery ====================

    /// List gallery images, optionally filtered by category and featured flag.
    pub async fn list_gallery_images(
        &self,
        category: Option<&str>,
        featured: Option<bool>,
    ) -> sqlx::Result<Vec<GalleryImage>> {
        sqlx::query_as::<_, GalleryImage>(
            "SELECT * FROM gallery_images
             WHERE ($1::text IS NULL OR category = $1)
               AND ($2::bool IS NULL OR is_featured = $2)
             ORDER BY created_at DESC",
        )
        .bind(category)
        .bind(featured)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn get_gallery_image(&self, id: i32) -> sqlx::Result<Option<GalleryImage>> {
        sqlx::query_as::<_, GalleryImage>("SELECT * FROM gallery_images WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn create_gallery_image(&self, g: &GalleryImagePayload) -> sqlx::Result<GalleryImage> {
        sqlx::query_as::<_, GalleryImage>(
            "INSERT INTO gallery_images (title, description, image_url, category, is_featured)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING *",
        )
        .bind(&g.title)
        .bind(&g.description)
        .bind(&g.image_url)
        .bind(&g.category)
        .bind(g.is_featured)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn update_gallery_image(
        &self,
        id: i32,
        g: &GalleryImagePayload,
    ) -> sqlx::Result<Option<GalleryImage>> {
        sqlx::query_as::<_, GalleryImage>(
            "UPDATE gallery_images
             SET title = $2, description = $3, image_url = $4, category = $5, is_featured = $6
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(&g.title)
        .bind(&g.description)
        .bind(&g.image_url)
        .bind(&g.category)
        .bind(g.is_featured)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn delete_gallery_image(&self, id: i32) -> sqlx::Result<bool> {
        let result = sqlx::query("DELETE FROM gallery_images WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ==================== Testimonials ====================

    pub async fn list_testimonials(&self) -> sqlx::Result<Vec<Testimonial>> {
        sqlx::query_as::<_, Testimonial>("SELECT * FROM testimonials ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await
    }

    pub async fn create_testimonial(&self, t: &TestimonialPayload) -> sqlx::Result<Testimonial> {
        sqlx::query_as::<_, Testimonial>(
            "INSERT INTO testimonials (name, role, content, image_url)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(&t.name)
        .bind(&t.role)
        .bind(&t.content)
        .bind(&t.image_url)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn update_testimonial(
        &self,
        id: i32,
        t: &TestimonialPayload,
    ) -> sqlx::Result<Option<Testimonial>> {
        sqlx::query_as::<_, Testimonial>(
            "UPDATE testimonials SET name = $2, role = $3, content = $4, image_url = $5
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(&t.name)
        .bind(&t.role)
        .bind(&t.content)
        .bind(&t.image_url)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn delete_testimonial(&self, id: i32) -> sqlx::Result<bool> {
        let result = sqlx::query("DELETE FROM testimonials WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ==================== Careers ====================

    pub async fn list_careers(&self) -> sqlx::Result<Vec<Career>> {
        sqlx::query_as::<_, Career>("SELECT * FROM careers ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await
    }

    pub async fn get_career(&self, id: i32) -> sqlx::Result<Option<Career>> {
        sqlx::query_as::<_, Career>("SELECT * FROM careers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn create_career(&self, c: &CareerPayload) -> sqlx::Result<Career> {
        sqlx::query_as::<_, Career>(
            "INSERT INTO careers (title, description, requirements, location, job_type, status)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING *",
        )
        .bind(&c.title)
        .bind(&c.description)
        .bind(&c.requirements)
        .bind(&c.location)
        .bind(&c.job_type)
        .bind(&c.status)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn update_career(&self, id: i32, c: &CareerPayload) -> sqlx::Result<Option<Career>> {
        sqlx::query_as::<_, Career>(
            "UPDATE careers
             SET title = $2, description = $3, requirements = $4, location = $5, job_type = $6, status = $7
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(&c.title)
        .bind(&c.description)
        .bind(&c.requirements)
        .bind(&c.location)
        .bind(&c.job_type)
        .bind(&c.status)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn delete_career(&self, id: i32) -> sqlx::Result<bool> {
        let result = sqlx::query("DELETE FROM careers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ==================== Impact stats ====================

    pub async fn list_impact_stats(&self) -> sqlx::Result<Vec<ImpactStat>> {
        sqlx::query_as::<_, ImpactStat>("SELECT * FROM impact_stats ORDER BY id")
            .fetch_all(&self.pool)
            .await
    }

    pub async fn create_impact_stat(&self, s: &ImpactStatPayload) -> sqlx::Result<ImpactStat> {
        sqlx::query_as::<_, ImpactStat>(
            "INSERT INTO impact_stats (title, number, description, icon)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(&s.title)
        .bind(s.number)
        .bind(&s.description)
        .bind(&s.icon)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn update_impact_stat(
        &self,
        id: i32,
        s: &ImpactStatPayload,
    ) -> sqlx::Result<Option<ImpactStat>> {
        sqlx::query_as::<_, ImpactStat>(
            "UPDATE impact_stats SET title = $2, number = $3, description = $4, icon = $5
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(&s.title)
        .bind(s.number)
        .bind(&s.description)
        .bind(&s.icon)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn delete_impact_stat(&self, id: i32) -> sqlx::Result<bool> {
        let result = sqlx::query("DELETE FROM impact_stats WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ==================== Team members ====================

    pub async fn list_team_members(&self) -> sqlx::Result<Vec<TeamMember>> {
        sqlx::query_as::<_, TeamMember>("SELECT * FROM team_members ORDER BY id")
            .fetch_all(&self.pool)
            .await
    }

    pub async fn create_team_member(&self, m: &TeamMemberPayload) -> sqlx::Result<TeamMember> {
        sqlx::query_as::<_, TeamMember>(
            "INSERT INTO team_members (name, role, bio, photo_url)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(&m.name)
        .bind(&m.role)
        .bind(&m.bio)
        .bind(&m.photo_url)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn update_team_member(
        &self,
        id: i32,
        m: &TeamMemberPayload,
    ) -> sqlx::Result<Option<TeamMember>> {
        sqlx::query_as::<_, TeamMember>(
            "UPDATE team_members SET name = $2, role = $3, bio = $4, photo_url = $5
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(&m.name)
        .bind(&m.role)
        .bind(&m.bio)
        .bind(&m.photo_url)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn delete_team_member(&self, id: i32) -> sqlx::Result<bool> {
        let result = sqlx::query("DELETE FROM team_members WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ==================== Blog posts ====================

    pub async fn list_blog_posts(&self, published_only: bool) -> sqlx::Result<Vec<BlogPost>> {
        sqlx::query_as::<_, BlogPost>(
            "SELECT * FROM blog_posts
             WHERE published OR NOT $1::bool
             ORDER BY created_at DESC",
        )
        .bind(published_only)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn get_blog_post(&self, id: i32) -> sqlx::Result<Option<BlogPost>> {
        sqlx::query_as::<_, BlogPost>("SELECT * FROM blog_posts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Create a blog post; `slug` is expected to be final (derived by the caller).
    pub async fn create_blog_post(&self, slug: &str, b: &BlogPostPayload) -> sqlx::Result<BlogPost> {
        sqlx::query_as::<_, BlogPost>(
            "INSERT INTO blog_posts (title, slug, excerpt, content, cover_image_url, published)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING *",
        )
        .bind(&b.title)
        .bind(slug)
        .bind(&b.excerpt)
        .bind(&b.content)
        .bind(&b.cover_image_url)
        .bind(b.published)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn update_blog_post(
        &self,
        id: i32,
        slug: &str,
        b: &BlogPostPayload,
    ) -> sqlx::Result<Option<BlogPost>> {
        sqlx::query_as::<_, BlogPost>(
            "UPDATE blog_posts
             SET title = $2, slug = $3, excerpt = $4, content = $5, cover_image_url = $6, published = $7
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(&b.title)
        .bind(slug)
        .bind(&b.excerpt)
        .bind(&b.content)
        .bind(&b.cover_image_url)
        .bind(b.published)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn delete_blog_post(&self, id: i32) -> sqlx::Result<bool> {
        let result = sqlx::query("DELETE FROM blog_posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ==================== Donations ====================

    pub async fn list_donations(&self) -> sqlx::Result<Vec<Donation>> {
        sqlx::query_as::<_, Donation>("SELECT * FROM donations ORDER BY date DESC, id DESC")
            .fetch_all(&self.pool)
            .await
    }

    pub async fn get_donation(&self, id: i32) -> sqlx::Result<Option<Donation>> {
        sqlx::query_as::<_, Donation>("SELECT * FROM donations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn create_donation(&self, d: &DonationPayload) -> sqlx::Result<Donation> {
        sqlx::query_as::<_, Donation>(
            "INSERT INTO donations (donor, email, phone, amount, purpose)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING *",
        )
        .bind(&d.donor)
        .bind(&d.email)
        .bind(&d.phone)
        .bind(d.amount)
        .bind(&d.purpose)
        .fetch_one(&self.pool)
        .await
    }

    /// Record the gateway order id handed back when payment starts.
    pub async fn attach_payment_order(
        &self,
        id: i32,
        order_id: &str,
    ) -> sqlx::Result<Option<Donation>> {
        sqlx::query_as::<_, Donation>(
            "UPDATE donations SET payment_order_id = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Mark the donation behind a verified gateway order as completed.
    pub async fn complete_donation_by_order(
        &self,
        order_id: &str,
    ) -> sqlx::Result<Option<Donation>> {
        sqlx::query_as::<_, Donation>(
            "UPDATE donations SET status = 'Completed' WHERE payment_order_id = $1 RETURNING *",
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await
    }

    // ==================== Volunteers ====================

    pub async fn list_volunteers(&self) -> sqlx::Result<Vec<Volunteer>> {
        sqlx::query_as::<_, Volunteer>("SELECT * FROM volunteers ORDER BY join_date DESC, id DESC")
            .fetch_all(&self.pool)
            .await
    }

    pub async fn create_volunteer(&self, v: &VolunteerPayload) -> sqlx::Result<Volunteer> {
        sqlx::query_as::<_, Volunteer>(
            "INSERT INTO volunteers (name, email, phone, area)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(&v.name)
        .bind(&v.email)
        .bind(&v.phone)
        .bind(&v.area)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn set_volunteer_status(
        &self,
        id: i32,
        status: &str,
    ) -> sqlx::Result<Option<Volunteer>> {
        sqlx::query_as::<_, Volunteer>(
            "UPDATE volunteers SET status = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn delete_volunteer(&self, id: i32) -> sqlx::Result<bool> {
        let result = sqlx::query("DELETE FROM volunteers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ==================== Contact messages ====================

    pub async fn list_contact_messages(&self) -> sqlx::Result<Vec<ContactMessage>> {
        sqlx::query_as::<_, ContactMessage>(
            "SELECT * FROM contact_messages ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
    }

    pub async fn create_contact_message(
        &self,
        c: &ContactMessagePayload,
    ) -> sqlx::Result<ContactMessage> {
        sqlx::query_as::<_, ContactMessage>(
            "INSERT INTO contact_messages (name, email, subject, message)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(&c.name)
        .bind(&c.email)
        .bind(&c.subject)
        .bind(&c.message)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn set_contact_status(
        &self,
        id: i32,
        status: &str,
    ) -> sqlx::Result<Option<ContactMessage>> {
        sqlx::query_as::<_, ContactMessage>(
            "UPDATE contact_messages SET status = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn delete_contact_message(&self, id: i32) -> sqlx::Result<bool> {
        let result = sqlx::query("DELETE FROM contact_messages WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ==================== Newsletter ====================

    /// Insert a subscription. A duplicate email surfaces as a
    /// unique-constraint violation for the handler to map to 409.
    pub async fn subscribe_newsletter(
        &self,
        s: &SubscribePayload,
    ) -> sqlx::Result<NewsletterSubscription> {
        sqlx::query_as::<_, NewsletterSubscription>(
            "INSERT INTO newsletter_subscriptions (email) VALUES ($1) RETURNING *",
        )
        .bind(&s.email)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn list_newsletter_subscriptions(
        &self,
    ) -> sqlx::Result<Vec<NewsletterSubscription>> {
        sqlx::query_as::<_, NewsletterSubscription>(
            "SELECT * FROM newsletter_subscriptions WHERE is_active ORDER BY subscribed_at DESC",
        )
        .fetch_all(&self.pool)
        .await
    }

    /// Soft unsubscribe; keeps the row so a resubscribe is a conflict the
    /// handler can distinguish from a fresh signup.
    pub async fn unsubscribe_newsletter(&self, email: &str) -> sqlx::Result<bool> {
        let result = sqlx::query(
            "UPDATE newsletter_subscriptions SET is_active = FALSE WHERE email = $1 AND is_active",
        )
        .bind(email)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    // ==================== Languages ====================

    pub async fn list_languages(&self) -> sqlx::Result<Vec<Language>> {
        sqlx::query_as::<_, Language>("SELECT * FROM languages ORDER BY code")
            .fetch_all(&self.pool)
            .await
    }

    /// Create a language. Setting `is_default` clears the flag on every other
    /// row in the same transaction, so at most one default exists.
    pub async fn create_language(&self, l: &LanguagePayload) -> sqlx::Result<Language> {
        let mut tx = self.pool.begin().await?;

        if l.is_default {
            sqlx::query("UPDATE languages SET is_default = FALSE WHERE is_default")
                .execute(&mut *tx)
                .await?;
        }

        let language = sqlx::query_as::<_, Language>(
            "INSERT INTO languages (name, code, is_default) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(&l.name)
        .bind(&l.code)
        .bind(l.is_default)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(language)
    }

    pub async fn update_language(
        &self,
        id: i32,
        l: &LanguagePayload,
    ) -> sqlx::Result<Option<Language>> {
        let mut tx = self.pool.begin().await?;

        if l.is_default {
            sqlx::query("UPDATE languages SET is_default = FALSE WHERE is_default AND id <> $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        let language = sqlx::query_as::<_, Language>(
            "UPDATE languages SET name = $2, code = $3, is_default = $4 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(&l.name)
        .bind(&l.code)
        .bind(l.is_default)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(language)
    }

    pub async fn delete_language(&self, id: i32) -> sqlx::Result<bool> {
        let result = sqlx::query("DELETE FROM languages WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ==================== Translations ====================

    pub async fn list_translations(&self) -> sqlx::Result<Vec<TranslationEntry>> {
        sqlx::query_as::<_, TranslationEntry>(
            "SELECT * FROM translations ORDER BY content_type, record_id, field_name, language_code",
        )
        .fetch_all(&self.pool)
        .await
    }

    /// Insert a translation entry. A duplicate of the four-part key surfaces
    /// as a unique-constraint violation; an unknown language code as a
    /// foreign-key violation.
    pub async fn create_translation(
        &self,
        t: &TranslationPayload,
    ) -> sqlx::Result<TranslationEntry> {
        sqlx::query_as::<_, TranslationEntry>(
            "INSERT INTO translations (language_code, content_type, field_name, record_id, translated_text)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING *",
        )
        .bind(&t.language_code)
        .bind(&t.content_type)
        .bind(&t.field_name)
        .bind(t.record_id)
        .bind(&t.translated_text)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn update_translation(
        &self,
        id: i32,
        t: &TranslationPayload,
    ) -> sqlx::Result<Option<TranslationEntry>> {
        sqlx::query_as::<_, TranslationEntry>(
            "UPDATE translations
             SET language_code = $2, content_type = $3, field_name = $4, record_id = $5, translated_text = $6
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(&t.language_code)
        .bind(&t.content_type)
        .bind(&t.field_name)
        .bind(t.record_id)
        .bind(&t.translated_text)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn delete_translation(&self, id: i32) -> sqlx::Result<bool> {
        let result = sqlx::query("DELETE FROM translations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

impl TranslationLookup for Database {
    async fn lookup(
        &self,
        content_type: &str,
        field: &str,
        record_id: i32,
        language_code: &str,
    ) -> Result<Option<String>> {
        sqlx::query_scalar::<_, String>(
            "SELECT translated_text FROM translations
             WHERE content_type = $1 AND field_name = $2 AND record_id = $3 AND language_code = $4",
        )
        .bind(content_type)
        .bind(field)
        .bind(record_id)
        .bind(language_code)
        .fetch_optional(&self.pool)
        .await
        .context("Translation lookup failed")
    }
}

// Database tests need a running PostgreSQL instance (DATABASE_URL), so they
// are ignored by default: `cargo test -- --ignored` with a database up.
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::is_unique_violation;
    use crate::i18n;

    async fn connect_test_db() -> Database {
        let url = std::env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set for database tests");
        let db = Database::connect(&url).await.expect("Failed to connect");
        db.migrate().await.expect("Failed to migrate");
        db
    }

    async fn reset_language(db: &Database, code: &str) {
        sqlx::query("DELETE FROM languages WHERE code = $1")
            .bind(code)
            .execute(&db.pool)
            .await
            .expect("cleanup failed");
    }

    #[tokio::test]
    #[ignore = "requires a PostgreSQL instance"]
    async fn test_duplicate_translation_rejected() {
        let db = connect_test_db().await;
        reset_language(&db, "xx").await;
        db.create_language(&LanguagePayload {
            name: "Testish".to_string(),
            code: "xx".to_string(),
            is_default: false,
        })
        .await
        .expect("Should create language");

        let entry = TranslationPayload {
            language_code: "xx".to_string(),
            content_type: "Project".to_string(),
            field_name: "title".to_string(),
            record_id: 424242,
            translated_text: "Projekt".to_string(),
        };

        db.create_translation(&entry).await.expect("First insert should succeed");
        let duplicate = db.create_translation(&entry).await;

        assert!(duplicate.is_err());
        assert!(is_unique_violation(&duplicate.unwrap_err()));

        reset_language(&db, "xx").await; // cascades to the entry
    }

    #[tokio::test]
    #[ignore = "requires a PostgreSQL instance"]
    async fn test_translation_lookup_roundtrip() {
        let db = connect_test_db().await;
        reset_language(&db, "xy").await;
        db.create_language(&LanguagePayload {
            name: "Testish2".to_string(),
            code: "xy".to_string(),
            is_default: false,
        })
        .await
        .expect("Should create language");

        db.create_translation(&TranslationPayload {
            language_code: "xy".to_string(),
            content_type: "Project".to_string(),
            field_name: "title".to_string(),
            record_id: 7,
            translated_text: "Projet Alpha".to_string(),
        })
        .await
        .expect("Should create translation");

        let hit = i18n::resolve(&db, "Project", "title", 7, "xy")
            .await
            .expect("lookup should not fail");
        assert_eq!(hit, Some("Projet Alpha".to_string()));

        let miss = i18n::resolve(&db, "Project", "title", 7, "zz")
            .await
            .expect("lookup should not fail");
        assert_eq!(miss, None);

        reset_language(&db, "xy").await;
    }

    #[tokio::test]
    #[ignore = "requires a PostgreSQL instance"]
    async fn test_single_default_language() {
        let db = connect_test_db().await;
        reset_language(&db, "x1").await;
        reset_language(&db, "x2").await;

        db.create_language(&LanguagePayload {
            name: "First".to_string(),
            code: "x1".to_string(),
            is_default: true,
        })
        .await
        .expect("Should create first language");

        db.create_language(&LanguagePayload {
            name: "Second".to_string(),
            code: "x2".to_string(),
            is_default: true,
        })
        .await
        .expect("Should create second language");

        let defaults: Vec<Language> = db
            .list_languages()
            .await
            .expect("Should list languages")
            .into_iter()
            .filter(|l| l.is_default)
            .collect();

        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults[0].code, "x2");

        reset_language(&db, "x1").await;
        reset_language(&db, "x2").await;
    }

    #[tokio::test]
    #[ignore = "requires a PostgreSQL instance"]
    async fn test_newsletter_duplicate_rejected() {
        let db = connect_test_db().await;
        let email = "dup-check@test.invalid";
        sqlx::query("DELETE FROM newsletter_subscriptions WHERE email = $1")
            .bind(email)
            .execute(&db.pool)
            .await
            .expect("cleanup failed");

        let payload = SubscribePayload { email: email.to_string() };
        db.subscribe_newsletter(&payload).await.expect("First subscribe should succeed");

        let duplicate = db.subscribe_newsletter(&payload).await;
        assert!(duplicate.is_err());
        assert!(is_unique_violation(&duplicate.unwrap_err()));
    }
}
