use sqlx::{query, PgPool};

use crate::error::Error;

/// Creates the tables on startup when they are missing.
pub async fn init_schema(pool: &PgPool) -> Result<(), Error> {
    query(
        r#"CREATE TABLE IF NOT EXISTS users (
            id UUID PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            password TEXT NOT NULL,
            salt TEXT NOT NULL,
            metadata TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )"#,
    )
    .execute(pool)
    .await?;

    query(
        r#"CREATE TABLE IF NOT EXISTS organizations (
            id UUID PRIMARY KEY REFERENCES users (id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            contact_person TEXT NOT NULL DEFAULT '',
            email TEXT NOT NULL,
            contact_number TEXT NOT NULL DEFAULT '',
            address TEXT NOT NULL DEFAULT '',
            role TEXT NOT NULL DEFAULT 'donor',
            profile_image TEXT
        )"#,
    )
    .execute(pool)
    .await?;

    query(
        r#"CREATE TABLE IF NOT EXISTS donations (
            id UUID PRIMARY KEY,
            organization_id UUID NOT NULL REFERENCES organizations (id) ON DELETE CASCADE,
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            quantity TEXT NOT NULL,
            location TEXT NOT NULL,
            distance TEXT,
            pickup_time TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'active',
            image_url TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )"#,
    )
    .execute(pool)
    .await?;

    query(
        r#"CREATE TABLE IF NOT EXISTS requests (
            id UUID PRIMARY KEY,
            user_id UUID NOT NULL REFERENCES users (id) ON DELETE CASCADE,
            description TEXT NOT NULL,
            people_count INTEGER NOT NULL,
            pickup_date TEXT NOT NULL,
            pickup_time TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'active',
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )"#,
    )
    .execute(pool)
    .await?;

    query("CREATE INDEX IF NOT EXISTS donations_organization_id_idx ON donations (organization_id)")
        .execute(pool)
        .await?;
    query("CREATE INDEX IF NOT EXISTS donations_status_idx ON donations (status)")
        .execute(pool)
        .await?;
    query("CREATE INDEX IF NOT EXISTS requests_user_id_idx ON requests (user_id)")
        .execute(pool)
        .await?;

    Ok(())
}
